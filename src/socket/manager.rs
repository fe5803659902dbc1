//! Connection lifecycle owner.
//!
//! A single [`ConnectionActor`] task owns the transport, every timer and all mutable
//! connection state. Callers talk to it through [`Command`]s, so transitions are
//! serialized without locks. Timers are plain deadlines polled by the actor loop;
//! clearing a deadline is the cancellation.

use crate::error::AppError;
use crate::socket::backoff::{ReconnectKind, ReconnectScheduler};
use crate::socket::heartbeat::{HeartbeatAction, HeartbeatMonitor};
use crate::socket::observers::ObserverRegistry;
use crate::socket::orders::{OrderLedger, TradingOrder};
use crate::socket::pool::ServerPool;
use crate::socket::protocol::{ClientEvent, ServerEvent};
use crate::socket::queue::{DrainSchedule, RequestQueue};
use crate::socket::transport::{Connector, DisconnectReason, TransportEvent, TransportLink};
use crate::socket::types::{
    validate_minimum_order_value, ClientReady, ConnectionState, ConnectionStatusSnapshot,
    CreateOrderData, HeartbeatPayload, OrderSide, OrderTicket, SocketConfig, SuggestionsRequest,
};
use crate::state::SharedStatus;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const NOT_CONNECTED_ORDER_MESSAGE: &str = "Not connected to server. Please check connection.";
pub const NOT_CONNECTED_MESSAGE: &str = "Not connected to server";
pub const AUTO_CONNECT_GAVE_UP_MESSAGE: &str = "Failed to auto-connect after multiple attempts";

type OpenOutcome = (u64, Result<TransportLink, AppError>);

pub enum Command {
    Connect {
        reply: oneshot::Sender<bool>,
    },
    Disconnect {
        permanent: bool,
        reply: oneshot::Sender<()>,
    },
    GetTradingSuggestions {
        request: SuggestionsRequest,
        reply: oneshot::Sender<bool>,
    },
    CreateOrder {
        side: OrderSide,
        ticket: OrderTicket,
        reply: oneshot::Sender<bool>,
    },
    GetOrderStatus {
        order_id: String,
        reply: oneshot::Sender<bool>,
    },
    CancelOrder {
        order_id: String,
        reply: oneshot::Sender<bool>,
    },
    SetAutoConnect {
        enabled: bool,
        reply: oneshot::Sender<()>,
    },
    SetServerUrl {
        url: String,
        reply: oneshot::Sender<()>,
    },
    ClearPendingRequests {
        reply: oneshot::Sender<()>,
    },
    LastSuggestionsRequest {
        reply: oneshot::Sender<Option<SuggestionsRequest>>,
    },
    Orders {
        reply: oneshot::Sender<Vec<TradingOrder>>,
    },
}

pub struct ConnectionActor {
    config: SocketConfig,
    connector: Arc<dyn Connector>,
    observers: Arc<ObserverRegistry>,
    status: SharedStatus,
    pool: ServerPool,
    state: ConnectionState,
    reason: Option<String>,
    auto_connect: bool,
    manual_disconnect: bool,
    ever_connected: bool,
    endpoint_attempts: u32,
    retry_count: u32,
    generation: u64,
    opening: Option<JoinHandle<()>>,
    link: Option<TransportLink>,
    connect_deadline: Option<Instant>,
    ack_deadline: Option<Instant>,
    heartbeat: HeartbeatMonitor,
    reconnect: ReconnectScheduler,
    queue: RequestQueue,
    drain: DrainSchedule,
    last_request: Option<SuggestionsRequest>,
    resend_at: Option<Instant>,
    waiters: Vec<oneshot::Sender<bool>>,
    ledger: OrderLedger,
    open_tx: mpsc::UnboundedSender<OpenOutcome>,
    open_rx: mpsc::UnboundedReceiver<OpenOutcome>,
}

impl ConnectionActor {
    pub fn new(
        config: SocketConfig,
        connector: Arc<dyn Connector>,
        observers: Arc<ObserverRegistry>,
        status: SharedStatus,
    ) -> Self {
        let (open_tx, open_rx) = mpsc::unbounded_channel();
        let pool = ServerPool::new(config.endpoints().to_vec());
        let heartbeat = HeartbeatMonitor::new(config.heartbeat_interval, config.heartbeat_timeout);
        let drain = DrainSchedule::new(config.drain_stagger);
        let auto_connect = config.auto_connect;

        Self {
            config,
            connector,
            observers,
            status,
            pool,
            state: ConnectionState::Disconnected,
            reason: Some("socket idle".to_string()),
            auto_connect,
            manual_disconnect: false,
            ever_connected: false,
            endpoint_attempts: 0,
            retry_count: 0,
            generation: 0,
            opening: None,
            link: None,
            connect_deadline: None,
            ack_deadline: None,
            heartbeat,
            reconnect: ReconnectScheduler::default(),
            queue: RequestQueue::default(),
            drain,
            last_request: None,
            resend_at: None,
            waiters: Vec::new(),
            ledger: OrderLedger::default(),
            open_tx,
            open_rx,
        }
    }

    pub async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        cancel_token: CancellationToken,
    ) {
        self.sync_status();
        if self.config.connect_on_start && self.auto_connect {
            info!(endpoint = %self.pool.current(), "auto-connecting trading socket");
            self.begin_connect();
        }

        loop {
            let deadline = self.next_deadline();
            tokio::select! {
                _ = cancel_token.cancelled() => break,
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some((generation, outcome)) = self.open_rx.recv() => {
                    self.on_open_outcome(generation, outcome);
                }
                event = next_transport_event(&mut self.link) => self.on_transport_event(event),
                _ = sleep_until_deadline(deadline) => self.fire_due_timers(Instant::now()),
            }
        }

        self.shut_down();
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Connect { reply } => self.connect(reply),
            Command::Disconnect { permanent, reply } => {
                self.disconnect(permanent);
                let _ = reply.send(());
            }
            Command::GetTradingSuggestions { request, reply } => {
                let sent = self.get_trading_suggestions(request);
                let _ = reply.send(sent);
            }
            Command::CreateOrder {
                side,
                ticket,
                reply,
            } => {
                let sent = self.create_order(side, &ticket);
                let _ = reply.send(sent);
            }
            Command::GetOrderStatus { order_id, reply } => {
                let sent = self.send_order_request(ClientEvent::GetOrderStatus(order_id));
                let _ = reply.send(sent);
            }
            Command::CancelOrder { order_id, reply } => {
                let sent = self.send_order_request(ClientEvent::CancelOrder(order_id));
                let _ = reply.send(sent);
            }
            Command::SetAutoConnect { enabled, reply } => {
                self.set_auto_connect(enabled);
                let _ = reply.send(());
            }
            Command::SetServerUrl { url, reply } => {
                self.set_server_url(&url);
                let _ = reply.send(());
            }
            Command::ClearPendingRequests { reply } => {
                self.queue.clear();
                self.last_request = None;
                self.resend_at = None;
                self.sync_status();
                let _ = reply.send(());
            }
            Command::LastSuggestionsRequest { reply } => {
                let _ = reply.send(self.last_request.clone());
            }
            Command::Orders { reply } => {
                let _ = reply.send(self.ledger.orders().to_vec());
            }
        }
    }

    fn connect(&mut self, reply: oneshot::Sender<bool>) {
        if self.state.is_in_flight() {
            debug!(state = self.state.as_str(), "connect ignored, attempt already in flight");
            let _ = reply.send(false);
            return;
        }
        if self.state == ConnectionState::Connected {
            let _ = reply.send(true);
            return;
        }

        self.waiters.push(reply);
        self.begin_connect();
    }

    fn begin_connect(&mut self) {
        self.manual_disconnect = false;
        self.start_attempt();
    }

    fn start_attempt(&mut self) {
        self.abort_opening();
        self.link = None;
        self.generation = self.generation.wrapping_add(1);
        self.endpoint_attempts = self.endpoint_attempts.saturating_add(1);

        let endpoint = self.pool.current().to_string();
        self.connect_deadline = Some(Instant::now() + self.config.connect_timeout);
        info!(
            endpoint = %endpoint,
            attempt = self.endpoint_attempts,
            pool_size = self.pool.len(),
            "opening trading socket"
        );
        self.transition(
            ConnectionState::Connecting,
            Some(format!("connecting to {endpoint}")),
        );

        let generation = self.generation;
        let open = self.connector.open(&endpoint);
        let outcomes = self.open_tx.clone();
        self.opening = Some(tokio::spawn(async move {
            let _ = outcomes.send((generation, open.await));
        }));
    }

    fn on_open_outcome(&mut self, generation: u64, outcome: Result<TransportLink, AppError>) {
        if generation != self.generation || self.state != ConnectionState::Connecting {
            debug!(generation, "discarding stale connection attempt");
            return;
        }
        self.opening = None;
        self.connect_deadline = None;

        let link = match outcome {
            Ok(link) => link,
            Err(error) => {
                self.on_attempt_failed(error.to_string());
                return;
            }
        };

        let ready = ClientEvent::ClientReady(ClientReady {
            client_type: self.config.client_type.clone(),
            timestamp: now_unix_ms(),
        });
        if let Err(error) = link.send(ready) {
            self.on_attempt_failed(error.to_string());
            return;
        }

        self.link = Some(link);
        self.ack_deadline = Some(Instant::now() + self.config.handshake_timeout);
        self.transition(
            ConnectionState::AwaitingHandshakeAck,
            Some("awaiting handshake ack".to_string()),
        );
    }

    fn on_attempt_failed(&mut self, detail: String) {
        let endpoint = self.pool.current().to_string();
        warn!(endpoint = %endpoint, %detail, "trading socket connection attempt failed");

        self.abort_opening();
        self.link = None;
        self.connect_deadline = None;
        self.ack_deadline = None;
        self.transition(ConnectionState::Failed, Some(detail));

        let pool_size = self.pool.len();
        if (self.endpoint_attempts as usize) < pool_size {
            self.report_error(&format!(
                "Connection failed to {endpoint}. Trying next server... ({}/{pool_size})",
                self.endpoint_attempts
            ));
            let next = self.pool.advance().to_string();
            self.schedule_reconnect(
                self.config.endpoint_retry_delay,
                ReconnectKind::NextEndpoint,
                format!("trying next endpoint {next}"),
            );
            return;
        }

        self.report_error(&format!(
            "Failed to connect to trading server after trying all {pool_size} endpoints. \
             Please ensure the server is running and accessible."
        ));
        self.endpoint_attempts = 0;
        self.pool.advance();
        self.sync_status();
        self.resolve_waiters(false);

        if !self.auto_connect || self.manual_disconnect {
            return;
        }

        let policy = if self.ever_connected {
            self.config.recovery_policy
        } else {
            self.config.initial_policy
        };
        if !policy.allows(self.retry_count.saturating_add(1)) {
            warn!(failed_cycles = self.retry_count + 1, "giving up on auto-connect");
            self.report_error(AUTO_CONNECT_GAVE_UP_MESSAGE);
            return;
        }

        let delay = policy.delay(self.retry_count);
        self.retry_count = self.retry_count.saturating_add(1);
        self.schedule_reconnect(
            delay,
            ReconnectKind::Backoff,
            format!("retry {} in {}ms", self.retry_count, delay.as_millis()),
        );
    }

    fn on_connected(&mut self) {
        let now = Instant::now();
        self.ack_deadline = None;
        self.endpoint_attempts = 0;
        self.retry_count = 0;
        self.ever_connected = true;
        self.reconnect.cancel();
        self.heartbeat.start(now);

        let drained = self.queue.take_all();
        let last_was_drained = self
            .last_request
            .as_ref()
            .is_some_and(|last| drained.contains(last));
        if !drained.is_empty() {
            info!(count = drained.len(), "draining queued suggestions requests");
        }
        self.drain.begin(now, drained);
        self.resend_at = match self.last_request {
            Some(_) if !last_was_drained => Some(now + self.config.resend_delay),
            _ => None,
        };

        let endpoint = self.pool.current().to_string();
        info!(endpoint = %endpoint, "trading socket connected");
        self.transition(
            ConnectionState::Connected,
            Some(format!("connected to {endpoint}")),
        );
        self.observers.error(None);
        self.resolve_waiters(true);
        self.send_due_drain(now);
    }

    fn on_connection_lost(&mut self, reason: DisconnectReason) {
        warn!(endpoint = %self.pool.current(), %reason, "trading socket connection lost");
        self.heartbeat.stop();
        self.drop_unsent_drain();
        self.resend_at = None;
        self.link = None;

        if self.manual_disconnect || !self.auto_connect || !reason.is_recognized() {
            self.transition(
                ConnectionState::Disconnected,
                Some(format!("disconnected ({reason})")),
            );
            return;
        }

        self.report_error(&format!(
            "Connection lost ({}). Reconnecting...",
            reason.label()
        ));
        let delay = self.config.recovery_policy.delay(self.retry_count);
        self.retry_count = self.retry_count.saturating_add(1);
        self.schedule_reconnect(
            delay,
            ReconnectKind::Backoff,
            format!("connection lost ({})", reason.label()),
        );
    }

    fn schedule_reconnect(&mut self, delay: Duration, kind: ReconnectKind, reason: String) {
        if !self.reconnect.schedule(Instant::now(), delay, kind) {
            debug!(?kind, "reconnect already pending");
            return;
        }
        info!(delay_ms = delay.as_millis() as u64, ?kind, "reconnect scheduled");
        self.transition(ConnectionState::Reconnecting, Some(reason));
    }

    fn on_reconnect_due(&mut self, kind: ReconnectKind) {
        let proceed = match kind {
            ReconnectKind::NextEndpoint => !self.manual_disconnect,
            ReconnectKind::Backoff => self.auto_connect && !self.manual_disconnect,
        };
        if proceed {
            self.start_attempt();
        } else {
            self.transition(
                ConnectionState::Disconnected,
                Some("reconnect skipped".to_string()),
            );
        }
    }

    fn on_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Frame(frame) => self.on_server_event(frame),
            TransportEvent::Closed(reason) => match self.state {
                ConnectionState::AwaitingHandshakeAck => {
                    self.on_attempt_failed(format!("transport closed during handshake ({reason})"));
                }
                ConnectionState::Connected => self.on_connection_lost(reason),
                _ => self.link = None,
            },
        }
    }

    fn on_server_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::ClientReadyAck(ack) => {
                if self.state != ConnectionState::AwaitingHandshakeAck {
                    debug!(state = self.state.as_str(), "ignoring unexpected handshake ack");
                    return;
                }
                if ack.success {
                    self.on_connected();
                } else {
                    let detail = ack.error.as_deref().unwrap_or("no reason given");
                    self.on_attempt_failed(format!("handshake rejected: {detail}"));
                }
            }
            ServerEvent::Pong(_) => {
                if !self.heartbeat.on_pong() {
                    debug!("pong without outstanding ping");
                }
            }
            ServerEvent::OrderCreated(response) => {
                let added = self.ledger.apply_created(&response, now_unix_ms());
                info!(success = response.success, added, "order created");
                self.observers.order_created(&response);
            }
            ServerEvent::OrderStatus(response) => {
                let updated = self.ledger.apply_status(&response);
                debug!(success = response.success, updated, "order status");
                self.observers.order_status(&response);
            }
            ServerEvent::OrderCancelled(response) => {
                let updated = self.ledger.apply_cancelled(&response);
                info!(success = response.success, updated, "order cancelled");
                self.observers.order_cancelled(&response);
            }
            ServerEvent::TradingSuggestions(response) => {
                let count = response
                    .data
                    .as_ref()
                    .map_or(0, |data| data.suggestions.len());
                info!(success = response.success, count, "trading suggestions received");
                self.observers.trading_suggestions(&response);
            }
            ServerEvent::PriceChecked(payload) => debug!(?payload, "price checked"),
            ServerEvent::MonitoringStatus(payload) => debug!(?payload, "monitoring status"),
        }
    }

    fn fire_due_timers(&mut self, now: Instant) {
        if self.connect_deadline.is_some_and(|deadline| deadline <= now) {
            self.connect_deadline = None;
            self.on_attempt_failed(AppError::Timeout("connection attempt").to_string());
        }
        if self.ack_deadline.is_some_and(|deadline| deadline <= now) {
            self.ack_deadline = None;
            self.on_attempt_failed(AppError::Timeout("handshake ack").to_string());
        }

        match self.heartbeat.poll(now) {
            HeartbeatAction::Idle => {}
            HeartbeatAction::SendPing => {
                self.emit(ClientEvent::Ping(HeartbeatPayload {
                    timestamp: now_unix_ms(),
                }));
            }
            HeartbeatAction::Dead => self.on_connection_lost(DisconnectReason::PingTimeout),
        }

        self.send_due_drain(now);

        if self.resend_at.is_some_and(|at| at <= now) {
            self.resend_at = None;
            if let Some(request) = self.last_request.clone() {
                info!(token_mint = %request.token_mint, "re-issuing last suggestions request");
                self.emit(ClientEvent::GetTradingSuggestions(request));
            }
        }

        if let Some(kind) = self.reconnect.take_due(now) {
            self.on_reconnect_due(kind);
        }
    }

    fn send_due_drain(&mut self, now: Instant) {
        for request in self.drain.take_due(now) {
            self.emit(ClientEvent::GetTradingSuggestions(request));
        }
    }

    fn get_trading_suggestions(&mut self, request: SuggestionsRequest) -> bool {
        self.last_request = Some(request.clone());
        // A newer request supersedes any pending re-send of the previous one.
        self.resend_at = None;

        if self.state == ConnectionState::Connected {
            if self.drain.is_active() {
                self.drain.append(Instant::now(), request);
                return true;
            }
            return self.emit(ClientEvent::GetTradingSuggestions(request));
        }

        if self.queue.enqueue(request) {
            info!(pending = self.queue.len(), "queued suggestions request until connected");
        }
        if self.auto_connect
            && matches!(
                self.state,
                ConnectionState::Disconnected | ConnectionState::Failed
            )
        {
            self.begin_connect();
        } else {
            self.sync_status();
        }
        false
    }

    fn create_order(&mut self, side: OrderSide, ticket: &OrderTicket) -> bool {
        if self.state != ConnectionState::Connected {
            self.report_error(NOT_CONNECTED_ORDER_MESSAGE);
            return false;
        }

        let order = CreateOrderData::from_ticket(side, ticket);
        if let Err(error) = validate_minimum_order_value(&order) {
            self.report_error(&error.to_string());
            return false;
        }

        info!(?side, notional = order.notional(), "submitting order");
        self.emit(ClientEvent::CreateOrder(order))
    }

    fn send_order_request(&mut self, event: ClientEvent) -> bool {
        if self.state != ConnectionState::Connected {
            self.report_error(NOT_CONNECTED_MESSAGE);
            return false;
        }
        self.emit(event)
    }

    fn disconnect(&mut self, permanent: bool) {
        info!(permanent, "disconnecting trading socket");
        if permanent {
            self.auto_connect = false;
        }
        self.manual_disconnect = true;

        self.connect_deadline = None;
        self.ack_deadline = None;
        self.heartbeat.stop();
        self.reconnect.cancel();
        self.resend_at = None;
        self.drop_unsent_drain();
        if permanent {
            self.queue.clear();
            self.last_request = None;
        }

        self.abort_opening();
        self.link = None;
        self.endpoint_attempts = 0;
        self.retry_count = 0;

        let reason = if permanent {
            "disconnected permanently"
        } else {
            "disconnected by client"
        };
        self.transition(ConnectionState::Disconnected, Some(reason.to_string()));
        self.resolve_waiters(false);
    }

    fn set_auto_connect(&mut self, enabled: bool) {
        self.auto_connect = enabled;
        info!(enabled, "auto-connect updated");

        if enabled
            && !self.manual_disconnect
            && matches!(
                self.state,
                ConnectionState::Disconnected | ConnectionState::Failed
            )
        {
            self.begin_connect();
            return;
        }
        if !enabled && self.reconnect.kind() == Some(ReconnectKind::Backoff) {
            self.reconnect.cancel();
            self.transition(
                ConnectionState::Disconnected,
                Some("auto-connect disabled".to_string()),
            );
            return;
        }
        self.sync_status();
    }

    fn set_server_url(&mut self, url: &str) {
        self.pool.select(url);
        self.endpoint_attempts = 0;
        self.retry_count = 0;
        info!(endpoint = %url, "server endpoint overridden");
        self.sync_status();
    }

    /// A drain is attempted once. Sends it had not reached yet are dropped; the
    /// remembered last request is re-issued on the next connection instead.
    fn drop_unsent_drain(&mut self) {
        let abandoned = self.drain.cancel();
        if abandoned > 0 {
            debug!(abandoned, "dropping unsent drained suggestions requests");
        }
    }

    fn emit(&mut self, event: ClientEvent) -> bool {
        let Some(link) = self.link.as_ref() else {
            warn!(event = event.name(), "no transport to send on");
            return false;
        };
        match link.send(event) {
            Ok(()) => true,
            Err(error) => {
                warn!(%error, "failed to send trading socket event");
                false
            }
        }
    }

    fn report_error(&self, message: &str) {
        warn!(error = message, "trading socket error");
        self.observers.error(Some(message));
    }

    fn resolve_waiters(&mut self, connected: bool) {
        for waiter in self.waiters.drain(..) {
            let _ = waiter.send(connected);
        }
    }

    fn abort_opening(&mut self) {
        if let Some(handle) = self.opening.take() {
            handle.abort();
        }
    }

    fn next_deadline(&self) -> Option<Instant> {
        [
            self.connect_deadline,
            self.ack_deadline,
            self.heartbeat.deadline(),
            self.reconnect.deadline(),
            self.drain.deadline(),
            self.resend_at,
        ]
        .into_iter()
        .flatten()
        .min()
    }

    fn snapshot(&self) -> ConnectionStatusSnapshot {
        ConnectionStatusSnapshot {
            state: self.state,
            connected: self.state == ConnectionState::Connected,
            server_url: self.pool.current().to_string(),
            servers: self.pool.endpoints().to_vec(),
            connection_attempts: self.endpoint_attempts,
            retry_count: self.retry_count,
            pending_requests: self.queue.len(),
            auto_connect: self.auto_connect,
            reason: self.reason.clone(),
        }
    }

    /// Publishes the snapshot without notifying observers.
    fn sync_status(&self) {
        *self.status.write() = self.snapshot();
    }

    fn transition(&mut self, state: ConnectionState, reason: Option<String>) {
        if self.state != state {
            debug!(from = self.state.as_str(), to = state.as_str(), "connection state change");
        }
        self.state = state;
        self.reason = reason;

        let snapshot = self.snapshot();
        *self.status.write() = snapshot.clone();
        self.observers.connection_changed(&snapshot);
    }

    fn shut_down(&mut self) {
        self.abort_opening();
        self.link = None;
        self.connect_deadline = None;
        self.ack_deadline = None;
        self.heartbeat.stop();
        self.reconnect.cancel();
        self.drain.cancel();
        self.resend_at = None;
        self.resolve_waiters(false);
        self.transition(
            ConnectionState::Disconnected,
            Some("socket stopped".to_string()),
        );
    }
}

async fn next_transport_event(link: &mut Option<TransportLink>) -> TransportEvent {
    match link {
        Some(link) => link
            .inbound
            .recv()
            .await
            .unwrap_or(TransportEvent::Closed(DisconnectReason::TransportClose)),
        None => std::future::pending().await,
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn now_unix_ms() -> i64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(duration) => duration.as_millis().min(i64::MAX as u128) as i64,
        Err(_) => 0,
    }
}
