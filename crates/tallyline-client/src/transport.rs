//! WebSocket transport for the client.
//!
//! Provides [`ConnectedGateway`] which handles WebSocket I/O for line
//! transport. This is a thin layer that just sends/receives raw lines -
//! protocol logic remains in the Sans-IO [`Engine`](crate::Engine).

use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Socket error after the connection was established.
    #[error("socket error: {0}")]
    Socket(String),
}

/// One inbound transport notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// One raw protocol line, delimiter stripped.
    Line(String),
    /// The peer closed the socket.
    Closed,
    /// The socket failed mid-session.
    Failed(String),
}

/// Handle to an open gateway connection.
///
/// Provides channels for line transport. Lines are sent/received via the
/// channels, and an internal task handles the WebSocket I/O.
pub struct ConnectedGateway {
    /// Send raw lines to the gateway (delimiter appended here).
    pub to_gateway: mpsc::Sender<String>,
    /// Inbound lines and terminal socket notifications.
    pub from_gateway: mpsc::Receiver<TransportEvent>,
    /// Abort handle to stop the connection task.
    abort_handle: tokio::task::AbortHandle,
}

impl ConnectedGateway {
    /// Drop the socket without a close handshake.
    pub fn stop(&self) {
        self.abort_handle.abort();
    }
}

/// Dial the chat gateway over WebSocket.
///
/// Returns a [`ConnectedGateway`] with channels for line transport.
pub async fn connect(url: &str) -> Result<ConnectedGateway, TransportError> {
    let (stream, _response) = connect_async(url)
        .await
        .map_err(|e| TransportError::Connection(format!("dial failed: {e}")))?;

    let (to_gateway_tx, to_gateway_rx) = mpsc::channel::<String>(32);
    let (from_gateway_tx, from_gateway_rx) = mpsc::channel::<TransportEvent>(64);

    let handle = tokio::spawn(run_connection(stream, to_gateway_rx, from_gateway_tx));

    Ok(ConnectedGateway {
        to_gateway: to_gateway_tx,
        from_gateway: from_gateway_rx,
        abort_handle: handle.abort_handle(),
    })
}

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Run the connection, bridging between channels and the WebSocket.
async fn run_connection(
    stream: WsStream,
    mut to_gateway: mpsc::Receiver<String>,
    from_gateway: mpsc::Sender<TransportEvent>,
) {
    let (mut sink, mut source) = stream.split();

    loop {
        tokio::select! {
            outbound = to_gateway.recv() => {
                let Some(line) = outbound else {
                    // Engine side dropped the sender; close quietly.
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                };
                if let Err(e) = sink.send(Message::Text(format!("{line}\r\n").into())).await {
                    warn!("gateway send failed: {e}");
                    let _ = from_gateway.send(TransportEvent::Failed(e.to_string())).await;
                    break;
                }
            },
            inbound = source.next() => {
                match inbound {
                    // The gateway batches lines in one text frame.
                    Some(Ok(Message::Text(text))) => {
                        for line in text.split("\r\n").filter(|l| !l.is_empty()) {
                            if from_gateway
                                .send(TransportEvent::Line(line.to_owned()))
                                .await
                                .is_err()
                            {
                                return;
                            }
                        }
                    },
                    Some(Ok(Message::Close(frame))) => {
                        debug!("gateway closed the socket: {frame:?}");
                        let _ = from_gateway.send(TransportEvent::Closed).await;
                        break;
                    },
                    Some(Ok(_)) => {},
                    Some(Err(e)) => {
                        warn!("gateway socket error: {e}");
                        let _ = from_gateway.send(TransportEvent::Failed(e.to_string())).await;
                        break;
                    },
                    None => {
                        let _ = from_gateway.send(TransportEvent::Closed).await;
                        break;
                    },
                }
            },
        }
    }
}
