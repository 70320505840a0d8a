use serde::Serialize;
use std::sync::atomic::{AtomicU8, Ordering};

/// Observer session lifecycle state
///
/// `Connecting -> Active -> Closed`. `Closed` is terminal; a reconnecting
/// client gets a new session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Connecting,
    Active,
    Closed,
}

impl SessionState {
    fn as_u8(self) -> u8 {
        match self {
            SessionState::Connecting => 0,
            SessionState::Active => 1,
            SessionState::Closed => 2,
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => SessionState::Connecting,
            1 => SessionState::Active,
            _ => SessionState::Closed,
        }
    }
}

/// Shared, atomically updated session state.
///
/// Held by both the hub (checked before every delivery) and the session
/// itself (checked before yielding a queued event).
#[derive(Debug)]
pub struct SessionStatus {
    state: AtomicU8,
}

impl SessionStatus {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(SessionState::Connecting.as_u8()),
        }
    }

    pub fn get(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_active(&self) -> bool {
        self.get() == SessionState::Active
    }

    /// Connecting -> Active. Returns false if the session was not connecting.
    pub fn activate(&self) -> bool {
        self.state
            .compare_exchange(
                SessionState::Connecting.as_u8(),
                SessionState::Active.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Any state -> Closed. Returns true if this call performed the transition.
    pub fn close(&self) -> bool {
        let previous = self.state.swap(SessionState::Closed.as_u8(), Ordering::AcqRel);
        previous != SessionState::Closed.as_u8()
    }
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self::new()
    }
}
