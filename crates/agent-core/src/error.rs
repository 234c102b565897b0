//! Error types and handling for the agent-core library
//!
//! Errors are categorized to match the recovery strategy they allow:
//!
//! - **Validation errors** - a public operation was called with missing or
//!   malformed input, or in a state that does not satisfy its precondition.
//!   Recoverable; the message is shown and no state changes.
//! - **Command errors** - the remote command surface returned a failure or the
//!   transport failed. Recoverable; state is held at its pre-command value so
//!   the user can retry the operation.
//!
//! Guard-ignored push events are deliberately NOT represented here: an event
//! whose precondition the current state violates is dropped and logged, never
//! surfaced as an error.

use thiserror::Error;

/// Result type alias for agent-core operations
pub type AgentResult<T> = Result<T, AgentError>;

/// Error types for agent session operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    /// Missing or malformed input to a public operation
    #[error("Invalid input: {field} - {reason}")]
    InvalidInput { field: String, reason: String },

    /// The agent lifecycle state does not satisfy the operation's precondition
    #[error("Invalid agent state: expected {expected}, got {actual}")]
    InvalidAgentState { expected: String, actual: String },

    /// The call lifecycle state does not satisfy the operation's precondition
    #[error("Invalid call state: expected {expected}, got {actual}")]
    InvalidCallState { expected: String, actual: String },

    /// No agent token has been submitted yet
    #[error("No credentials: submit an agent token first")]
    MissingCredentials,

    /// The operation needs a live call with a known call id
    #[error("No active call")]
    NoActiveCall,

    /// Qualifying requires the provider's telephony id for the current call
    #[error("No telephony id recorded for the current call")]
    MissingTelephonyId,

    /// The qualification id is not in the set offered for the current call
    #[error("Unknown qualification: {id}")]
    UnknownQualification { id: i64 },

    /// A remote command returned a failure or the transport failed
    #[error("Command {command} failed: {reason}")]
    CommandFailed { command: String, reason: String },

    /// The extension registration surface could not be opened
    #[error("Extension portal failed: {reason}")]
    PortalFailed { reason: String },
}

impl AgentError {
    /// Create an invalid input error
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CommandFailed {
            command: command.into(),
            reason: reason.into(),
        }
    }

    /// Create a portal failed error
    pub fn portal_failed(reason: impl Into<String>) -> Self {
        Self::PortalFailed {
            reason: reason.into(),
        }
    }

    /// Check if this error is a local precondition/validation failure
    /// (as opposed to a remote command failure)
    pub fn is_validation(&self) -> bool {
        !matches!(
            self,
            AgentError::CommandFailed { .. } | AgentError::PortalFailed { .. }
        )
    }

    /// Get error category for metrics/logging
    pub fn category(&self) -> &'static str {
        match self {
            AgentError::InvalidInput { .. } => "validation",
            AgentError::InvalidAgentState { .. }
            | AgentError::InvalidCallState { .. }
            | AgentError::MissingCredentials
            | AgentError::NoActiveCall
            | AgentError::MissingTelephonyId
            | AgentError::UnknownQualification { .. } => "precondition",
            AgentError::CommandFailed { .. } => "command",
            AgentError::PortalFailed { .. } => "portal",
        }
    }
}
