use crate::error::AppError;
use crate::socket::pool::socket_url;
use crate::socket::protocol::{decode_server_event, encode_client_event, ClientEvent, ServerEvent};
use futures_util::future::BoxFuture;
use futures_util::{FutureExt, SinkExt, StreamExt};
use std::fmt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async_with_config, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, warn};

pub type TradingWsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Why an established transport went away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    ServerDisconnect,
    PingTimeout,
    TransportClose,
    TransportError(String),
    Other(String),
}

impl DisconnectReason {
    /// The reasons that are announced to observers before reconnecting.
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    /// Short form without details, as shown to users.
    pub fn label(&self) -> &str {
        match self {
            Self::ServerDisconnect => "server disconnect",
            Self::PingTimeout => "ping timeout",
            Self::TransportClose => "transport close",
            Self::TransportError(_) => "transport error",
            Self::Other(detail) => detail,
        }
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ServerDisconnect => f.write_str("server disconnect"),
            Self::PingTimeout => f.write_str("ping timeout"),
            Self::TransportClose => f.write_str("transport close"),
            Self::TransportError(detail) => write!(f, "transport error: {detail}"),
            Self::Other(detail) => f.write_str(detail),
        }
    }
}

#[derive(Debug)]
pub enum TransportEvent {
    Frame(ServerEvent),
    Closed(DisconnectReason),
}

/// An open transport. Dropping it tears the connection down.
pub struct TransportLink {
    pub outbound: mpsc::UnboundedSender<ClientEvent>,
    pub inbound: mpsc::UnboundedReceiver<TransportEvent>,
    _teardown: DropGuard,
}

impl TransportLink {
    pub fn new(
        outbound: mpsc::UnboundedSender<ClientEvent>,
        inbound: mpsc::UnboundedReceiver<TransportEvent>,
        teardown: CancellationToken,
    ) -> Self {
        Self {
            outbound,
            inbound,
            _teardown: teardown.drop_guard(),
        }
    }

    pub fn send(&self, event: ClientEvent) -> Result<(), AppError> {
        self.outbound
            .send(event)
            .map_err(|error| AppError::TransportClosed(format!("{} not sent", error.0.name())))
    }
}

impl fmt::Debug for TransportLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportLink")
            .field("closed", &self.outbound.is_closed())
            .finish()
    }
}

/// Opens transports to an endpoint.
pub trait Connector: Send + Sync + 'static {
    fn open(&self, endpoint: &str) -> BoxFuture<'static, Result<TransportLink, AppError>>;
}

/// Connects to `{endpoint}{socket_path}` over WebSocket.
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    socket_path: String,
}

impl WebSocketConnector {
    pub fn new(socket_path: impl Into<String>) -> Self {
        Self {
            socket_path: socket_path.into(),
        }
    }
}

impl Connector for WebSocketConnector {
    fn open(&self, endpoint: &str) -> BoxFuture<'static, Result<TransportLink, AppError>> {
        let url = socket_url(endpoint, &self.socket_path);
        async move {
            let stream = connect_trading_stream(&url).await?;
            Ok(spawn_pump(stream))
        }
        .boxed()
    }
}

pub async fn connect_trading_stream(url: &str) -> Result<TradingWsStream, AppError> {
    let ws_config = WebSocketConfig {
        max_message_size: Some(16 << 20),
        max_frame_size: Some(4 << 20),
        ..Default::default()
    };

    let (stream, _) = connect_async_with_config(url, Some(ws_config), true).await?;
    Ok(stream)
}

fn spawn_pump(stream: TradingWsStream) -> TransportLink {
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let teardown = CancellationToken::new();

    tokio::spawn(run_pump(stream, outbound_rx, inbound_tx, teardown.clone()));

    TransportLink::new(outbound_tx, inbound_rx, teardown)
}

async fn run_pump(
    stream: TradingWsStream,
    mut outbound: mpsc::UnboundedReceiver<ClientEvent>,
    inbound: mpsc::UnboundedSender<TransportEvent>,
    teardown: CancellationToken,
) {
    let (mut sink, mut source) = stream.split();

    let closed_by = loop {
        tokio::select! {
            _ = teardown.cancelled() => break None,
            next = outbound.recv() => {
                let Some(event) = next else {
                    break None;
                };
                let text = match encode_client_event(&event) {
                    Ok(text) => text,
                    Err(error) => {
                        warn!(event = event.name(), %error, "dropping unencodable frame");
                        continue;
                    }
                };
                if let Err(error) = sink.send(Message::Text(text)).await {
                    break Some(DisconnectReason::TransportError(error.to_string()));
                }
            }
            frame = source.next() => match frame {
                None => break Some(DisconnectReason::TransportClose),
                Some(Ok(Message::Text(text))) => {
                    let mut payload = text.into_bytes();
                    forward_frame(&inbound, payload.as_mut_slice());
                }
                Some(Ok(Message::Binary(mut payload))) => {
                    forward_frame(&inbound, payload.as_mut_slice());
                }
                Some(Ok(Message::Close(_))) => break Some(DisconnectReason::ServerDisconnect),
                Some(Ok(_)) => {}
                Some(Err(error)) => break Some(DisconnectReason::TransportError(error.to_string())),
            },
        }
    };

    match closed_by {
        Some(reason) => {
            debug!(%reason, "trading socket transport closed");
            let _ = inbound.send(TransportEvent::Closed(reason));
        }
        None => {
            let _ = sink.send(Message::Close(None)).await;
            let _ = sink.close().await;
        }
    }
}

fn forward_frame(inbound: &mpsc::UnboundedSender<TransportEvent>, payload: &mut [u8]) {
    match decode_server_event(payload) {
        Ok(event) => {
            let _ = inbound.send(TransportEvent::Frame(event));
        }
        Err(error) => warn!(%error, "ignoring undecodable server frame"),
    }
}
