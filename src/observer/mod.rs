use crate::hub::{BroadcastHub, Membership, SessionId, SessionState};
use axum::extract::ws::{Message, WebSocket};
use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Why an observer session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// Client sent a Close frame or dropped the connection
    ClientClosed,
    /// Reading from or writing to the socket failed
    TransportError(String),
    /// A single send exceeded the configured bound
    SendTimeout,
    /// Hub removed the session (too slow, or shutdown)
    HubClosed,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::ClientClosed => write!(f, "client closed"),
            CloseReason::TransportError(e) => write!(f, "transport error: {}", e),
            CloseReason::SendTimeout => write!(f, "send timed out"),
            CloseReason::HubClosed => write!(f, "closed by hub"),
        }
    }
}

/// One connected map client.
///
/// A pure pass-through: every change event the hub queues for this session is
/// written to the socket as a text frame, unfiltered and unacknowledged. The
/// client fetches its baseline separately via GET /api/vehicles.
pub struct ObserverSession {
    membership: Membership,
    send_timeout: Duration,
    connected_at: DateTime<Utc>,
}

impl ObserverSession {
    /// Register with the hub once the transport handshake has completed
    pub fn start(hub: &BroadcastHub, send_timeout: Duration) -> Self {
        Self {
            membership: hub.join(),
            send_timeout,
            connected_at: Utc::now(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.membership.id()
    }

    pub fn state(&self) -> SessionState {
        self.membership.state()
    }

    pub fn connected_at(&self) -> DateTime<Utc> {
        self.connected_at
    }

    /// Pump events to `socket` until either side closes.
    ///
    /// The session leaves the hub before this returns.
    pub async fn run(mut self, mut socket: WebSocket) -> CloseReason {
        let session_id = self.id();
        info!(session_id = %session_id, "Observer session active");

        let reason = loop {
            tokio::select! {
                incoming = socket.recv() => {
                    match incoming {
                        Some(Ok(Message::Close(_))) | None => break CloseReason::ClientClosed,
                        Some(Ok(Message::Ping(data))) => {
                            if let Err(reason) = self.send(&mut socket, Message::Pong(data)).await {
                                break reason;
                            }
                        }
                        Some(Ok(_)) => {
                            // No client -> server messages are defined
                            debug!(session_id = %session_id, "Ignoring client frame");
                        }
                        Some(Err(e)) => break CloseReason::TransportError(e.to_string()),
                    }
                }

                event = self.membership.recv() => {
                    match event {
                        Some(frame) => {
                            let msg = Message::Text(frame.to_string());
                            if let Err(reason) = self.send(&mut socket, msg).await {
                                break reason;
                            }
                        }
                        None => {
                            let _ = timeout(self.send_timeout, socket.send(Message::Close(None))).await;
                            break CloseReason::HubClosed;
                        }
                    }
                }
            }
        };

        self.membership.close();

        let connected_secs = (Utc::now() - self.connected_at).num_seconds();
        match &reason {
            CloseReason::ClientClosed | CloseReason::HubClosed => info!(
                session_id = %session_id,
                reason = %reason,
                connected_secs = connected_secs,
                "Observer session closed"
            ),
            _ => warn!(
                session_id = %session_id,
                reason = %reason,
                connected_secs = connected_secs,
                "Observer session closed"
            ),
        }

        reason
    }

    async fn send(&self, socket: &mut WebSocket, msg: Message) -> Result<(), CloseReason> {
        match timeout(self.send_timeout, socket.send(msg)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(CloseReason::TransportError(e.to_string())),
            Err(_) => Err(CloseReason::SendTimeout),
        }
    }
}
