//! Call session tracking
//!
//! One call session is live at a time. It is created when a dial command
//! succeeds or when an unprompted "call connected" push event arrives, and is
//! reset to `Idle` only after the `Ended` state has been observed for the
//! configured grace period.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current state of the live call session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallState {
    /// No call in progress
    Idle,
    /// A dial command was accepted; waiting for the provider to connect
    Dialing,
    /// The provider reported the call as connected
    Connected,
    /// The remote party answered; qualifications are offered
    Answered,
    /// A qualification has been recorded for the call
    Qualified,
    /// The call has ended; the session resets to Idle after the grace period
    Ended,
}

impl CallState {
    /// Check if a call session exists at all
    pub fn is_live(&self) -> bool {
        !matches!(self, CallState::Idle)
    }

    /// Check if the call can still be hung up
    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            CallState::Dialing | CallState::Connected | CallState::Answered
        )
    }
}

impl std::fmt::Display for CallState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallState::Idle => write!(f, "Idle"),
            CallState::Dialing => write!(f, "Dialing"),
            CallState::Connected => write!(f, "Connected"),
            CallState::Answered => write!(f, "Answered"),
            CallState::Qualified => write!(f, "Qualified"),
            CallState::Ended => write!(f, "Ended"),
        }
    }
}

/// Information about the live call session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallInfo {
    /// Current state of the call
    pub state: CallState,
    /// Provider-issued call identifier, used for hangup; cleared when the
    /// call ends
    pub call_id: Option<String>,
    /// Provider-issued telephony identifier, required for qualification;
    /// kept through the grace window so a late qualification can still be
    /// issued
    pub telephony_id: Option<String>,
    /// Number being dialed / connected
    pub phone_number: String,
    /// When the dial was issued or the call first announced
    pub created_at: Option<DateTime<Utc>>,
    /// When the provider reported the call as connected
    pub connected_at: Option<DateTime<Utc>>,
    /// When the remote party answered
    pub answered_at: Option<DateTime<Utc>>,
    /// When the call ended
    pub ended_at: Option<DateTime<Utc>>,
}

impl CallInfo {
    /// A fresh, idle call slot
    pub fn idle() -> Self {
        Self {
            state: CallState::Idle,
            call_id: None,
            telephony_id: None,
            phone_number: String::new(),
            created_at: None,
            connected_at: None,
            answered_at: None,
            ended_at: None,
        }
    }

    /// Reset the slot back to idle, dropping everything about the old call
    pub fn reset(&mut self) {
        *self = Self::idle();
    }
}

impl Default for CallInfo {
    fn default() -> Self {
        Self::idle()
    }
}
