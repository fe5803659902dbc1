use crate::error::AppError;
use crate::socket::backoff::BackoffPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const PRIMARY_URL_ENV: &str = "TRADING_BACKEND_URL";
pub const FALLBACK_URLS_ENV: &str = "TRADING_BACKEND_FALLBACK_URLS";
pub const DEFAULT_PRIMARY_URL: &str = "http://127.0.0.1:3000";
pub const DEFAULT_SOCKET_PATH: &str = "/ws";
pub const DEFAULT_CLIENT_TYPE: &str = "trading_socket_client";
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 20_000;
pub const DEFAULT_HANDSHAKE_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_HEARTBEAT_INTERVAL_MS: u64 = 15_000;
pub const DEFAULT_HEARTBEAT_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_ENDPOINT_RETRY_DELAY_MS: u64 = 5_000;
pub const DEFAULT_DRAIN_STAGGER_MS: u64 = 200;
pub const DEFAULT_RESEND_DELAY_MS: u64 = 1_000;
pub const DEFAULT_CONNECT_ON_START: bool = true;
pub const DEFAULT_AUTO_CONNECT: bool = true;
pub const MIN_TIMEOUT_MS: u64 = 100;
pub const MAX_TIMEOUT_MS: u64 = 120_000;
pub const MIN_HEARTBEAT_INTERVAL_MS: u64 = 1_000;
pub const MAX_HEARTBEAT_INTERVAL_MS: u64 = 300_000;
pub const MAX_DELAY_MS: u64 = 60_000;

/// Orders worth less than this (price x amount, in USD) are rejected locally.
pub const MIN_ORDER_VALUE_USD: f64 = 5.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    AwaitingHandshakeAck,
    Connected,
    Reconnecting,
    Failed,
}

impl ConnectionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::AwaitingHandshakeAck => "awaiting_handshake_ack",
            Self::Connected => "connected",
            Self::Reconnecting => "reconnecting",
            Self::Failed => "failed",
        }
    }

    /// States in which a connection attempt is already underway or scheduled.
    pub fn is_in_flight(self) -> bool {
        matches!(
            self,
            Self::Connecting | Self::AwaitingHandshakeAck | Self::Reconnecting
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SuggestionTimeframe {
    #[serde(rename = "1min")]
    Min1,
    #[serde(rename = "5min")]
    Min5,
    #[serde(rename = "15min")]
    Min15,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1d")]
    D1,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Conservative,
    Moderate,
    Aggressive,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RiskPreferences {
    pub max_risk_percentage: f64,
    pub preferred_timeframe: String,
}

/// A request for trading suggestions. Equality is field-by-field and doubles as the
/// dedup key for the pending queue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionsRequest {
    pub token_mint: String,
    pub timeframe: SuggestionTimeframe,
    pub risk_level: RiskLevel,
    pub user_balance: f64,
    pub preferences: RiskPreferences,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub address: String,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    #[serde(rename = "logoURI", default, skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

/// Caller-side description of an order before it is turned into wire data.
#[derive(Debug, Clone)]
pub struct OrderTicket {
    pub base: Token,
    pub quote: Token,
    pub current_price: f64,
    /// Buy price for buy orders, sell price for sell orders.
    pub limit_price: f64,
    /// Amount to spend (buy) or to sell (sell), in input-token units.
    pub amount: f64,
    pub wallet_address: String,
    pub take_profit_price: Option<f64>,
    pub stop_loss_price: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderData {
    pub input_mint: String,
    pub output_mint: String,
    pub maker: String,
    pub payer: String,
    pub current_price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buy_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sell_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub take_profit_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_loss_price: Option<f64>,
    pub amount_to_sell: f64,
    pub input_decimals: u8,
    pub output_decimals: u8,
}

impl CreateOrderData {
    pub fn from_ticket(side: OrderSide, ticket: &OrderTicket) -> Self {
        // Buys spend the quote token to receive the base token; sells do the reverse.
        let (input, output) = match side {
            OrderSide::Buy => (&ticket.quote, &ticket.base),
            OrderSide::Sell => (&ticket.base, &ticket.quote),
        };
        let (buy_price, sell_price) = match side {
            OrderSide::Buy => (Some(ticket.limit_price), None),
            OrderSide::Sell => (None, Some(ticket.limit_price)),
        };

        Self {
            input_mint: input.address.clone(),
            output_mint: output.address.clone(),
            maker: ticket.wallet_address.clone(),
            payer: ticket.wallet_address.clone(),
            current_price: ticket.current_price,
            buy_price,
            sell_price,
            take_profit_price: ticket.take_profit_price,
            stop_loss_price: ticket.stop_loss_price,
            amount_to_sell: ticket.amount,
            input_decimals: input.decimals,
            output_decimals: output.decimals,
        }
    }

    pub fn side(&self) -> OrderSide {
        if self.sell_price.is_some() {
            OrderSide::Sell
        } else {
            OrderSide::Buy
        }
    }

    pub fn notional(&self) -> f64 {
        self.current_price * self.amount_to_sell
    }
}

/// Rejects orders below [`MIN_ORDER_VALUE_USD`]. Non-finite values never pass.
pub fn validate_minimum_order_value(order: &CreateOrderData) -> Result<(), AppError> {
    let value = order.notional();
    if value.is_finite() && value >= MIN_ORDER_VALUE_USD {
        return Ok(());
    }

    Err(AppError::OrderBelowMinimum {
        value,
        minimum: MIN_ORDER_VALUE_USD,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientReady {
    pub client_type: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientReadyAck {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct HeartbeatPayload {
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionTicket {
    pub order: String,
    pub transaction: String,
    pub request_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CalculatedOrder {
    #[serde(rename = "type")]
    pub order_type: String,
    pub making_amount: String,
    pub taking_amount: String,
    pub target_price: f64,
    pub expected_output_amount: f64,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreatedOrder {
    pub order_id: String,
    /// `BUY`, `SELL`, `TAKE_PROFIT` or `STOP_LOSS`.
    pub order_type: String,
    #[serde(rename = "jupiterResponse", default, skip_serializing_if = "Option::is_none")]
    pub execution: Option<ExecutionTicket>,
    pub calculated_order: CalculatedOrder,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub total_orders: u32,
    pub total_input_amount: f64,
    pub total_expected_output: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_reward_ratio: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderCalculations {
    pub summary: OrderSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderCreatedData {
    pub orders: Vec<CreatedOrder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculations: Option<OrderCalculations>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<OrderCreatedData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderStatusUpdate {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filled: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderStatusResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<OrderStatusUpdate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderCancelledResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum SuggestedAction {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TradingSuggestion {
    pub confidence: f64,
    pub action: SuggestedAction,
    pub entry_price: f64,
    pub take_profit_price: f64,
    pub stop_loss_price: f64,
    pub position_size: f64,
    pub risk_reward_ratio: f64,
    pub reasoning: String,
    pub timeframe: String,
    pub risk_level: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum MarketTrend {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum VolatilityBand {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketAnalysis {
    pub trend: MarketTrend,
    pub strength: f64,
    pub support: f64,
    pub resistance: f64,
    pub volatility: VolatilityBand,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Grade {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalIndicators {
    pub price_change: f64,
    pub confidence: Grade,
    pub liquidity: Grade,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionsData {
    pub current_price: f64,
    pub suggestions: Vec<TradingSuggestion>,
    pub market_analysis: MarketAnalysis,
    pub technical_indicators: TechnicalIndicators,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SuggestionsResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<SuggestionsData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Read-only view of the connection handed to observers and returned by the handle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatusSnapshot {
    pub state: ConnectionState,
    pub connected: bool,
    pub server_url: String,
    /// Candidate endpoints in rotation order, including manual overrides.
    pub servers: Vec<String>,
    pub connection_attempts: u32,
    pub retry_count: u32,
    pub pending_requests: usize,
    pub auto_connect: bool,
    pub reason: Option<String>,
}

impl ConnectionStatusSnapshot {
    pub fn idle(servers: &[String], auto_connect: bool) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            connected: false,
            server_url: servers.first().cloned().unwrap_or_default(),
            servers: servers.to_vec(),
            connection_attempts: 0,
            retry_count: 0,
            pending_requests: 0,
            auto_connect,
            reason: Some("socket idle".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SocketArgs {
    pub primary_url: Option<String>,
    pub fallback_urls: Option<Vec<String>>,
    pub socket_path: Option<String>,
    pub client_type: Option<String>,
    pub connect_timeout_ms: Option<u64>,
    pub handshake_timeout_ms: Option<u64>,
    pub heartbeat_interval_ms: Option<u64>,
    pub heartbeat_timeout_ms: Option<u64>,
    pub endpoint_retry_delay_ms: Option<u64>,
    pub drain_stagger_ms: Option<u64>,
    pub resend_delay_ms: Option<u64>,
    pub connect_on_start: Option<bool>,
    pub auto_connect: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct SocketConfig {
    /// Primary endpoint first, then fallbacks. Never empty.
    endpoints: Vec<String>,
    pub socket_path: String,
    pub client_type: String,
    pub connect_timeout: Duration,
    pub handshake_timeout: Duration,
    pub heartbeat_interval: Duration,
    pub heartbeat_timeout: Duration,
    pub endpoint_retry_delay: Duration,
    pub drain_stagger: Duration,
    pub resend_delay: Duration,
    pub connect_on_start: bool,
    pub auto_connect: bool,
    pub initial_policy: BackoffPolicy,
    pub recovery_policy: BackoffPolicy,
}

fn resolve_env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn split_url_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}

pub(crate) fn normalize_endpoint(raw: &str) -> Result<String, AppError> {
    let url = raw.trim().trim_end_matches('/').to_string();
    let has_scheme = ["http://", "https://", "ws://", "wss://"]
        .iter()
        .any(|scheme| url.starts_with(scheme));
    if !has_scheme || url.split("://").nth(1).map_or(true, str::is_empty) {
        return Err(AppError::InvalidArgument(format!(
            "endpoint '{raw}' must be an http(s) or ws(s) URL"
        )));
    }
    Ok(url)
}

fn ranged_ms(
    name: &str,
    value: Option<u64>,
    default: u64,
    min: u64,
    max: u64,
) -> Result<Duration, AppError> {
    let value = value.unwrap_or(default);
    if !(min..=max).contains(&value) {
        return Err(AppError::InvalidArgument(format!(
            "{name} must be between {min} and {max}"
        )));
    }
    Ok(Duration::from_millis(value))
}

impl SocketArgs {
    /// Reads the endpoint list from the environment; everything else stays at defaults.
    pub fn from_env() -> Self {
        Self {
            primary_url: resolve_env_value(PRIMARY_URL_ENV),
            fallback_urls: resolve_env_value(FALLBACK_URLS_ENV).map(|raw| split_url_list(&raw)),
            ..Self::default()
        }
    }

    pub fn normalize(self) -> Result<SocketConfig, AppError> {
        let primary = normalize_endpoint(
            self.primary_url.as_deref().unwrap_or(DEFAULT_PRIMARY_URL),
        )?;
        let mut endpoints = vec![primary];
        for fallback in self.fallback_urls.unwrap_or_default() {
            let url = normalize_endpoint(&fallback)?;
            if !endpoints.contains(&url) {
                endpoints.push(url);
            }
        }

        let socket_path = self
            .socket_path
            .unwrap_or_else(|| DEFAULT_SOCKET_PATH.to_string())
            .trim()
            .to_string();
        if !socket_path.starts_with('/') {
            return Err(AppError::InvalidArgument(
                "socketPath must start with '/'".to_string(),
            ));
        }

        let client_type = self
            .client_type
            .unwrap_or_else(|| DEFAULT_CLIENT_TYPE.to_string())
            .trim()
            .to_string();
        if client_type.is_empty() {
            return Err(AppError::InvalidArgument(
                "clientType must be non-empty".to_string(),
            ));
        }

        let connect_timeout = ranged_ms(
            "connectTimeoutMs",
            self.connect_timeout_ms,
            DEFAULT_CONNECT_TIMEOUT_MS,
            MIN_TIMEOUT_MS,
            MAX_TIMEOUT_MS,
        )?;
        let handshake_timeout = ranged_ms(
            "handshakeTimeoutMs",
            self.handshake_timeout_ms,
            DEFAULT_HANDSHAKE_TIMEOUT_MS,
            MIN_TIMEOUT_MS,
            MAX_TIMEOUT_MS,
        )?;
        let heartbeat_interval = ranged_ms(
            "heartbeatIntervalMs",
            self.heartbeat_interval_ms,
            DEFAULT_HEARTBEAT_INTERVAL_MS,
            MIN_HEARTBEAT_INTERVAL_MS,
            MAX_HEARTBEAT_INTERVAL_MS,
        )?;
        let heartbeat_timeout = ranged_ms(
            "heartbeatTimeoutMs",
            self.heartbeat_timeout_ms,
            DEFAULT_HEARTBEAT_TIMEOUT_MS,
            MIN_TIMEOUT_MS,
            MAX_TIMEOUT_MS,
        )?;
        if heartbeat_timeout >= heartbeat_interval {
            return Err(AppError::InvalidArgument(
                "heartbeatTimeoutMs must be shorter than heartbeatIntervalMs".to_string(),
            ));
        }
        let endpoint_retry_delay = ranged_ms(
            "endpointRetryDelayMs",
            self.endpoint_retry_delay_ms,
            DEFAULT_ENDPOINT_RETRY_DELAY_MS,
            0,
            MAX_DELAY_MS,
        )?;
        let drain_stagger = ranged_ms(
            "drainStaggerMs",
            self.drain_stagger_ms,
            DEFAULT_DRAIN_STAGGER_MS,
            0,
            MAX_DELAY_MS,
        )?;
        let resend_delay = ranged_ms(
            "resendDelayMs",
            self.resend_delay_ms,
            DEFAULT_RESEND_DELAY_MS,
            0,
            MAX_DELAY_MS,
        )?;

        Ok(SocketConfig {
            endpoints,
            socket_path,
            client_type,
            connect_timeout,
            handshake_timeout,
            heartbeat_interval,
            heartbeat_timeout,
            endpoint_retry_delay,
            drain_stagger,
            resend_delay,
            connect_on_start: self.connect_on_start.unwrap_or(DEFAULT_CONNECT_ON_START),
            auto_connect: self.auto_connect.unwrap_or(DEFAULT_AUTO_CONNECT),
            initial_policy: BackoffPolicy::INITIAL_CONNECT,
            recovery_policy: BackoffPolicy::CONNECTION_RECOVERY,
        })
    }
}

impl SocketConfig {
    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(address: &str, decimals: u8) -> Token {
        Token {
            address: address.to_string(),
            symbol: address.to_ascii_uppercase(),
            name: address.to_string(),
            decimals,
            logo_uri: None,
        }
    }

    fn ticket(current_price: f64, amount: f64) -> OrderTicket {
        OrderTicket {
            base: token("sol", 9),
            quote: token("usdc", 6),
            current_price,
            limit_price: 140.0,
            amount,
            wallet_address: "wallet-1".to_string(),
            take_profit_price: Some(160.0),
            stop_loss_price: None,
        }
    }

    #[test]
    fn normalizes_default_args() {
        let config = SocketArgs::default()
            .normalize()
            .expect("defaults should be valid");

        assert_eq!(config.endpoints, vec![DEFAULT_PRIMARY_URL.to_string()]);
        assert_eq!(config.socket_path, DEFAULT_SOCKET_PATH);
        assert_eq!(config.client_type, DEFAULT_CLIENT_TYPE);
        assert_eq!(
            config.handshake_timeout,
            Duration::from_millis(DEFAULT_HANDSHAKE_TIMEOUT_MS)
        );
        assert_eq!(
            config.heartbeat_interval,
            Duration::from_millis(DEFAULT_HEARTBEAT_INTERVAL_MS)
        );
        assert_eq!(config.drain_stagger, Duration::from_millis(200));
        assert_eq!(config.resend_delay, Duration::from_millis(1_000));
        assert!(config.connect_on_start);
        assert!(config.auto_connect);
    }

    #[test]
    fn fallbacks_follow_primary_without_duplicates() {
        let config = SocketArgs {
            primary_url: Some("https://primary.example/".to_string()),
            fallback_urls: Some(vec![
                "https://backup.example".to_string(),
                "https://primary.example".to_string(),
            ]),
            ..SocketArgs::default()
        }
        .normalize()
        .expect("urls should be valid");

        assert_eq!(
            config.endpoints,
            vec![
                "https://primary.example".to_string(),
                "https://backup.example".to_string()
            ]
        );
    }

    #[test]
    fn rejects_endpoint_without_scheme() {
        let result = SocketArgs {
            primary_url: Some("localhost:3000".to_string()),
            ..SocketArgs::default()
        }
        .normalize();

        assert!(result.is_err());
    }

    #[test]
    fn blank_primary_is_rejected_so_endpoints_are_never_empty() {
        let result = SocketArgs {
            primary_url: Some("   ".to_string()),
            fallback_urls: Some(vec!["https://backup.example".to_string()]),
            ..SocketArgs::default()
        }
        .normalize();
        assert!(result.is_err());

        let config = SocketArgs {
            fallback_urls: Some(Vec::new()),
            ..SocketArgs::default()
        }
        .normalize()
        .expect("defaults should be valid");
        assert_eq!(config.endpoints().to_vec(), vec![DEFAULT_PRIMARY_URL.to_string()]);
    }

    #[test]
    fn rejects_heartbeat_timeout_longer_than_interval() {
        let result = SocketArgs {
            heartbeat_interval_ms: Some(2_000),
            heartbeat_timeout_ms: Some(5_000),
            ..SocketArgs::default()
        }
        .normalize();

        assert!(result.is_err());
    }

    #[test]
    fn splits_comma_separated_fallbacks() {
        assert_eq!(
            split_url_list(" http://a:1 , ,http://b:2"),
            vec!["http://a:1".to_string(), "http://b:2".to_string()]
        );
    }

    #[test]
    fn buy_order_spends_quote_for_base() {
        let order = CreateOrderData::from_ticket(OrderSide::Buy, &ticket(150.0, 0.5));

        assert_eq!(order.input_mint, "usdc");
        assert_eq!(order.output_mint, "sol");
        assert_eq!(order.input_decimals, 6);
        assert_eq!(order.output_decimals, 9);
        assert_eq!(order.buy_price, Some(140.0));
        assert_eq!(order.sell_price, None);
        assert_eq!(order.side(), OrderSide::Buy);
        assert_eq!(order.maker, order.payer);
    }

    #[test]
    fn sell_order_spends_base_for_quote() {
        let order = CreateOrderData::from_ticket(OrderSide::Sell, &ticket(150.0, 0.5));

        assert_eq!(order.input_mint, "sol");
        assert_eq!(order.output_mint, "usdc");
        assert_eq!(order.sell_price, Some(140.0));
        assert_eq!(order.side(), OrderSide::Sell);
    }

    #[test]
    fn minimum_order_value_gate() {
        let below = CreateOrderData::from_ticket(OrderSide::Buy, &ticket(1.0, 4.99));
        let error = validate_minimum_order_value(&below).expect_err("4.99 is below minimum");
        assert_eq!(
            error.to_string(),
            "Order value ($4.99) is below minimum of $5"
        );

        let exact = CreateOrderData::from_ticket(OrderSide::Buy, &ticket(1.0, 5.0));
        assert!(validate_minimum_order_value(&exact).is_ok());

        let broken = CreateOrderData::from_ticket(OrderSide::Buy, &ticket(f64::NAN, 10.0));
        assert!(validate_minimum_order_value(&broken).is_err());
    }

    #[test]
    fn suggestions_request_uses_wire_names() {
        let request = SuggestionsRequest {
            token_mint: "mint".to_string(),
            timeframe: SuggestionTimeframe::Min15,
            risk_level: RiskLevel::Aggressive,
            user_balance: 10.0,
            preferences: RiskPreferences {
                max_risk_percentage: 2.0,
                preferred_timeframe: "1h".to_string(),
            },
        };
        let encoded = simd_json::serde::to_string(&request).expect("request should encode");

        assert!(encoded.contains(r#""tokenMint":"mint""#));
        assert!(encoded.contains(r#""timeframe":"15min""#));
        assert!(encoded.contains(r#""riskLevel":"aggressive""#));
        assert!(encoded.contains(r#""maxRiskPercentage":2"#));
    }

    #[test]
    fn in_flight_states() {
        assert!(ConnectionState::Connecting.is_in_flight());
        assert!(ConnectionState::AwaitingHandshakeAck.is_in_flight());
        assert!(ConnectionState::Reconnecting.is_in_flight());
        assert!(!ConnectionState::Connected.is_in_flight());
        assert!(!ConnectionState::Failed.is_in_flight());
        assert!(!ConnectionState::Disconnected.is_in_flight());
    }
}
