//! Broadcast hub: fan-out of change events to connected observers.
//!
//! Membership is an owned concurrent map of session id -> handle. Each member
//! has its own bounded queue; publishing never awaits, so a slow observer can
//! only fill its own queue. A full queue, a dropped receiver, or a session not
//! in `Active` state counts as an implicit leave.

mod metrics;
mod session;

pub use metrics::HubStats;
pub use session::{SessionState, SessionStatus};

use crate::position::ChangeEvent;
use dashmap::DashMap;
use metrics::HubMetrics;
use std::fmt;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Observer session identifier
pub type SessionId = Uuid;

/// A serialized change event. Shared so every observer gets identical bytes.
pub type Frame = Arc<str>;

/// Default per-observer queue depth
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Hub-side view of one member
struct ObserverHandle {
    status: Arc<SessionStatus>,
    tx: mpsc::Sender<Frame>,
}

struct HubInner {
    members: DashMap<SessionId, ObserverHandle>,
    /// Serializes publishes so every observer sees the same emission order
    publish_lock: Mutex<()>,
    queue_capacity: usize,
    metrics: HubMetrics,
}

/// Why a member was removed during fan-out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EvictReason {
    NotActive,
    QueueFull,
    ReceiverGone,
}

impl fmt::Display for EvictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvictReason::NotActive => write!(f, "session not active"),
            EvictReason::QueueFull => write!(f, "observer queue full"),
            EvictReason::ReceiverGone => write!(f, "observer receiver dropped"),
        }
    }
}

/// The process-wide broadcast hub. Cloneable; store in app state.
#[derive(Clone)]
pub struct BroadcastHub {
    inner: Arc<HubInner>,
}

impl BroadcastHub {
    /// Create a hub whose members each buffer up to `queue_capacity` events
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            inner: Arc::new(HubInner {
                members: DashMap::new(),
                publish_lock: Mutex::new(()),
                queue_capacity: queue_capacity.max(1),
                metrics: HubMetrics::default(),
            }),
        }
    }

    /// Register a new observer.
    ///
    /// The session moves Connecting -> Active and starts receiving events
    /// published from now on. Earlier events are never replayed.
    pub fn join(&self) -> Membership {
        let id = Uuid::new_v4();
        let status = Arc::new(SessionStatus::new());
        let (tx, rx) = mpsc::channel(self.inner.queue_capacity);

        status.activate();
        self.inner.members.insert(
            id,
            ObserverHandle {
                status: Arc::clone(&status),
                tx,
            },
        );
        self.inner.metrics.record_join();

        info!(
            session_id = %id,
            observers = self.inner.members.len(),
            "Observer joined"
        );

        Membership {
            id,
            status,
            events: rx,
            hub: self.clone(),
        }
    }

    /// Remove an observer. Idempotent: unknown ids are a no-op.
    ///
    /// Returns true if the session was a member.
    pub fn leave(&self, id: SessionId) -> bool {
        match self.inner.members.remove(&id) {
            Some((_, handle)) => {
                handle.status.close();
                info!(
                    session_id = %id,
                    observers = self.inner.members.len(),
                    "Observer left"
                );
                true
            }
            None => false,
        }
    }

    fn evict(&self, id: SessionId, reason: EvictReason) {
        if let Some((_, handle)) = self.inner.members.remove(&id) {
            handle.status.close();
            self.inner.metrics.record_eviction();
            warn!(
                session_id = %id,
                reason = %reason,
                observers = self.inner.members.len(),
                "Observer evicted"
            );
        }
    }

    /// Deliver `event` to every current member.
    ///
    /// Never blocks on an observer. Members that cannot accept the event are
    /// removed; delivery to the rest continues. Returns the number of
    /// observers the event was queued for.
    pub fn publish(&self, event: &ChangeEvent) -> usize {
        let frame: Frame = match serde_json::to_string(event) {
            Ok(json) => Arc::from(json),
            Err(e) => {
                error!(entity_id = %event.entity_id, error = %e, "Failed to encode change event");
                return 0;
            }
        };

        let _order = self
            .inner
            .publish_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut delivered = 0;
        let mut dead = Vec::new();

        // Removal happens after iteration; DashMap shard locks are held while iterating
        for entry in self.inner.members.iter() {
            let handle = entry.value();
            if !handle.status.is_active() {
                dead.push((*entry.key(), EvictReason::NotActive));
                continue;
            }
            match handle.tx.try_send(Arc::clone(&frame)) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => dead.push((*entry.key(), EvictReason::QueueFull)),
                Err(TrySendError::Closed(_)) => {
                    dead.push((*entry.key(), EvictReason::ReceiverGone))
                }
            }
        }

        for (id, reason) in dead {
            self.evict(id, reason);
        }

        self.inner.metrics.record_publish(delivered);
        debug!(
            entity_id = %event.entity_id,
            delivered = delivered,
            "Change event published"
        );

        delivered
    }

    /// Close every session (process shutdown)
    pub fn close_all(&self) {
        let ids: Vec<SessionId> = self.inner.members.iter().map(|e| *e.key()).collect();
        let count = ids.len();
        for id in ids {
            self.leave(id);
        }
        info!(closed = count, "All observer sessions closed");
    }

    /// Number of currently registered observers
    pub fn observer_count(&self) -> usize {
        self.inner.members.len()
    }

    pub fn stats(&self) -> HubStats {
        self.inner.metrics.snapshot(self.inner.members.len())
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

/// An observer's registration with the hub.
///
/// Yields the events published while it is a member. Dropping it leaves the
/// hub.
pub struct Membership {
    id: SessionId,
    status: Arc<SessionStatus>,
    events: mpsc::Receiver<Frame>,
    hub: BroadcastHub,
}

impl Membership {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.status.get()
    }

    /// Next event for this observer, or None once the session is closed.
    ///
    /// Cancel-safe. Events still queued when the session closes are dropped.
    pub async fn recv(&mut self) -> Option<Frame> {
        if !self.status.is_active() {
            return None;
        }
        let frame = self.events.recv().await?;
        if !self.status.is_active() {
            return None;
        }
        Some(frame)
    }

    /// Non-blocking variant of `recv`
    pub fn try_recv(&mut self) -> Option<Frame> {
        if !self.status.is_active() {
            return None;
        }
        self.events.try_recv().ok()
    }

    /// Leave the hub now; further delivery stops immediately
    pub fn close(&mut self) {
        self.hub.leave(self.id);
        self.status.close();
    }
}

impl Drop for Membership {
    fn drop(&mut self) {
        self.close();
    }
}
