use crate::socket::types::ConnectionStatusSnapshot;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Latest published connection status, readable without going through the actor.
pub type SharedStatus = Arc<RwLock<ConnectionStatusSnapshot>>;

pub struct SocketTaskHandle {
    pub cancellation_token: CancellationToken,
    pub join_handle: JoinHandle<()>,
}

pub fn shared_status(servers: &[String], auto_connect: bool) -> SharedStatus {
    Arc::new(RwLock::new(ConnectionStatusSnapshot::idle(
        servers,
        auto_connect,
    )))
}
