pub mod error;
pub mod socket;
mod state;

pub use error::AppError;
pub use socket::client::TradingSocket;
pub use socket::types::{SocketArgs, SocketConfig};

use socket::observers::ObserverRegistry;
use socket::transport::WebSocketConnector;
use socket::types::{
    ConnectionStatusSnapshot, OrderCancelledResponse, OrderResponse, OrderStatusResponse,
    SuggestionsResponse,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Connects to the configured backend, logs everything it pushes and runs until Ctrl-C.
pub async fn run() -> Result<(), AppError> {
    init_tracing();

    let config = SocketArgs::from_env().normalize()?;
    info!(endpoints = ?config.endpoints(), auto_connect = config.auto_connect, "starting trading socket");
    let connects_on_start = config.connect_on_start && config.auto_connect;

    let connector = Arc::new(WebSocketConnector::new(config.socket_path.clone()));
    let socket = TradingSocket::with_connector(config, connector, logging_observers());

    let probe = socket.test_connection().await;
    if probe.success {
        info!(url = %probe.url, "trading backend reachable");
    } else {
        warn!(url = %probe.url, error = ?probe.error, "trading backend health probe failed");
    }
    if !connects_on_start && !socket.connect().await {
        warn!("initial connection failed");
    }

    tokio::signal::ctrl_c().await?;
    info!("shutting down trading socket");
    socket.disconnect(true).await;
    socket.shutdown().await;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn logging_observers() -> ObserverRegistry {
    let observers = ObserverRegistry::default();
    observers.set_connection_change(Arc::new(|status: &ConnectionStatusSnapshot| {
        info!(
            state = status.state.as_str(),
            server = %status.server_url,
            attempts = status.connection_attempts,
            retries = status.retry_count,
            pending = status.pending_requests,
            reason = status.reason.as_deref().unwrap_or_default(),
            "connection status"
        );
    }));
    observers.set_error(Arc::new(|message: Option<&str>| {
        if let Some(message) = message {
            warn!(error = message, "trading socket error");
        }
    }));
    observers.set_order_created(Arc::new(|response: &OrderResponse| {
        let orders = response.data.as_ref().map_or(0, |data| data.orders.len());
        info!(success = response.success, orders, error = ?response.error, "order created");
    }));
    observers.set_order_status(Arc::new(|response: &OrderStatusResponse| {
        info!(success = response.success, update = ?response.data, "order status");
    }));
    observers.set_order_cancelled(Arc::new(|response: &OrderCancelledResponse| {
        info!(success = response.success, order_id = ?response.order_id, "order cancelled");
    }));
    observers.set_trading_suggestions(Arc::new(|response: &SuggestionsResponse| {
        let suggestions = response
            .data
            .as_ref()
            .map_or(0, |data| data.suggestions.len());
        info!(success = response.success, suggestions, "trading suggestions");
    }));
    observers
}
