use crate::error::AppError;
use crate::socket::health::{probe_endpoint, ConnectionTestResult};
use crate::socket::manager::{Command, ConnectionActor};
use crate::socket::observers::ObserverRegistry;
use crate::socket::orders::TradingOrder;
use crate::socket::transport::{Connector, WebSocketConnector};
use crate::socket::types::{
    normalize_endpoint, ConnectionStatusSnapshot, OrderCancelledResponse, OrderResponse,
    OrderSide, OrderStatusResponse, OrderTicket, SocketConfig, SuggestionsRequest,
    SuggestionsResponse,
};
use crate::state::{shared_status, SharedStatus, SocketTaskHandle};
use parking_lot::Mutex;
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

/// Cloneable handle to a running connection manager.
///
/// Operations never fail: they report through their boolean result and the error
/// observer. Getters read the last published status snapshot without waiting on the
/// manager task.
#[derive(Clone)]
pub struct TradingSocket {
    commands: mpsc::UnboundedSender<Command>,
    status: SharedStatus,
    observers: Arc<ObserverRegistry>,
    http_client: Client,
    task: Arc<Mutex<Option<SocketTaskHandle>>>,
}

impl TradingSocket {
    /// Spawns a manager that talks WebSocket to the configured endpoints.
    pub fn spawn(config: SocketConfig) -> Self {
        let connector = Arc::new(WebSocketConnector::new(config.socket_path.clone()));
        Self::with_connector(config, connector, ObserverRegistry::default())
    }

    /// Observers registered here see events from the very first connection attempt.
    pub fn with_connector(
        config: SocketConfig,
        connector: Arc<dyn Connector>,
        observers: ObserverRegistry,
    ) -> Self {
        let observers = Arc::new(observers);
        let status = shared_status(config.endpoints(), config.auto_connect);
        let (commands, command_rx) = mpsc::unbounded_channel();
        let cancellation_token = CancellationToken::new();

        let actor = ConnectionActor::new(
            config,
            connector,
            Arc::clone(&observers),
            Arc::clone(&status),
        );
        let join_handle = tokio::spawn(actor.run(command_rx, cancellation_token.clone()));

        Self {
            commands,
            status,
            observers,
            http_client: Client::new(),
            task: Arc::new(Mutex::new(Some(SocketTaskHandle {
                cancellation_token,
                join_handle,
            }))),
        }
    }

    /// Resolves `true` once connected, `false` when the current cycle is exhausted.
    /// Returns `false` immediately while another attempt is in flight.
    pub async fn connect(&self) -> bool {
        self.request(|reply| Command::Connect { reply }, false).await
    }

    /// Tears the connection down. A permanent disconnect also disables auto-connect and
    /// forgets pending requests.
    pub async fn disconnect(&self, permanent: bool) {
        self.request(|reply| Command::Disconnect { permanent, reply }, ())
            .await;
    }

    /// Sends the request if connected. Otherwise queues it, starts connecting when
    /// auto-connect allows, and returns `false`.
    pub async fn get_trading_suggestions(&self, request: SuggestionsRequest) -> bool {
        self.request(
            |reply| Command::GetTradingSuggestions { request, reply },
            false,
        )
        .await
    }

    pub async fn create_buy_order(&self, ticket: OrderTicket) -> bool {
        self.create_order(OrderSide::Buy, ticket).await
    }

    pub async fn create_sell_order(&self, ticket: OrderTicket) -> bool {
        self.create_order(OrderSide::Sell, ticket).await
    }

    async fn create_order(&self, side: OrderSide, ticket: OrderTicket) -> bool {
        self.request(
            |reply| Command::CreateOrder {
                side,
                ticket,
                reply,
            },
            false,
        )
        .await
    }

    pub async fn get_order_status(&self, order_id: impl Into<String>) -> bool {
        let order_id = order_id.into();
        self.request(|reply| Command::GetOrderStatus { order_id, reply }, false)
            .await
    }

    pub async fn cancel_order(&self, order_id: impl Into<String>) -> bool {
        let order_id = order_id.into();
        self.request(|reply| Command::CancelOrder { order_id, reply }, false)
            .await
    }

    pub async fn set_auto_connect(&self, enabled: bool) {
        self.request(|reply| Command::SetAutoConnect { enabled, reply }, ())
            .await;
    }

    /// Points the manager at `url` for the next attempt and resets both counters.
    pub async fn set_server_url(&self, url: &str) -> Result<(), AppError> {
        let url = normalize_endpoint(url)?;
        self.request(|reply| Command::SetServerUrl { url, reply }, ())
            .await;
        Ok(())
    }

    /// Empties the queue and forgets the remembered request.
    pub async fn clear_pending_requests(&self) {
        self.request(|reply| Command::ClearPendingRequests { reply }, ())
            .await;
    }

    pub async fn last_suggestions_request(&self) -> Option<SuggestionsRequest> {
        self.request(|reply| Command::LastSuggestionsRequest { reply }, None)
            .await
    }

    pub async fn orders(&self) -> Vec<TradingOrder> {
        self.request(|reply| Command::Orders { reply }, Vec::new())
            .await
    }

    pub async fn test_connection(&self) -> ConnectionTestResult {
        let url = self.server_url();
        probe_endpoint(&self.http_client, &url).await
    }

    pub fn status(&self) -> ConnectionStatusSnapshot {
        self.status.read().clone()
    }

    pub fn is_connected(&self) -> bool {
        self.status.read().connected
    }

    pub fn server_url(&self) -> String {
        self.status.read().server_url.clone()
    }

    /// Configured endpoints plus any manual override appended since.
    pub fn available_servers(&self) -> Vec<String> {
        self.status.read().servers.clone()
    }

    pub fn connection_attempts(&self) -> u32 {
        self.status.read().connection_attempts
    }

    pub fn pending_requests_count(&self) -> usize {
        self.status.read().pending_requests
    }

    pub fn has_pending_suggestions_requests(&self) -> bool {
        self.pending_requests_count() > 0
    }

    pub fn is_auto_connect_enabled(&self) -> bool {
        self.status.read().auto_connect
    }

    pub fn on_connection_change(
        &self,
        callback: impl Fn(&ConnectionStatusSnapshot) + Send + Sync + 'static,
    ) {
        self.observers.set_connection_change(Arc::new(callback));
    }

    pub fn on_order_created(&self, callback: impl Fn(&OrderResponse) + Send + Sync + 'static) {
        self.observers.set_order_created(Arc::new(callback));
    }

    pub fn on_order_status(
        &self,
        callback: impl Fn(&OrderStatusResponse) + Send + Sync + 'static,
    ) {
        self.observers.set_order_status(Arc::new(callback));
    }

    pub fn on_order_cancelled(
        &self,
        callback: impl Fn(&OrderCancelledResponse) + Send + Sync + 'static,
    ) {
        self.observers.set_order_cancelled(Arc::new(callback));
    }

    pub fn on_trading_suggestions(
        &self,
        callback: impl Fn(&SuggestionsResponse) + Send + Sync + 'static,
    ) {
        self.observers.set_trading_suggestions(Arc::new(callback));
    }

    pub fn on_error(&self, callback: impl Fn(Option<&str>) + Send + Sync + 'static) {
        self.observers.set_error(Arc::new(callback));
    }

    /// Stops the manager task. Later operations resolve to their failure value.
    pub async fn shutdown(&self) {
        let handle = self.task.lock().take();
        if let Some(handle) = handle {
            handle.cancellation_token.cancel();
            let _ = handle.join_handle.await;
        }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
        stopped: T,
    ) -> T {
        let (reply, response) = oneshot::channel();
        if self.commands.send(build(reply)).is_err() {
            return stopped;
        }
        response.await.unwrap_or(stopped)
    }
}
