//! Session lifecycle state shared between the receive task and the main flow.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle of a [`Session`](super::Session).
///
/// Moves forward only: `Connecting → Open → Closing → Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    Connecting = 0,
    Open = 1,
    Closing = 2,
    Closed = 3,
}

impl SessionState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Connecting,
            1 => Self::Open,
            2 => Self::Closing,
            _ => Self::Closed,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => write!(f, "Connecting"),
            Self::Open => write!(f, "Open"),
            Self::Closing => write!(f, "Closing"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}

/// Cloneable view of a session's state.
///
/// Both the receive task and the shutdown path mark the session closed;
/// [`SessionStatus::close`] tells exactly one of them that it won.
#[derive(Debug, Clone)]
pub struct SessionStatus {
    state: Arc<AtomicU8>,
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStatus {
    pub fn new() -> Self {
        Self {
            state: Arc::new(AtomicU8::new(SessionState::Connecting as u8)),
        }
    }

    pub fn get(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_closed(&self) -> bool {
        self.get() == SessionState::Closed
    }

    /// `Connecting → Open`.
    pub(crate) fn open(&self) -> bool {
        self.advance(SessionState::Connecting, SessionState::Open)
    }

    /// `Open → Closing`. Returns `false` if the session already left `Open`.
    pub(crate) fn begin_closing(&self) -> bool {
        self.advance(SessionState::Open, SessionState::Closing)
    }

    /// Moves to `Closed` from any state.
    ///
    /// Safe to call any number of times; returns `true` only for the call that
    /// performed the transition.
    pub fn close(&self) -> bool {
        self.state.swap(SessionState::Closed as u8, Ordering::AcqRel) != SessionState::Closed as u8
    }

    fn advance(&self, from: SessionState, to: SessionState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}
