//! Agent-core: session coordination layer for the dialdesk click-to-call client
//!
//! This crate is the client-side controller a UI layer drives and observes. It
//! reconciles the telephony provider's two asynchronous surfaces - the push
//! notification channel announcing call-lifecycle events and the one-shot
//! command surface (login, dial, hangup, qualify, list campaigns) - into a
//! single consistent agent/call session state.
//!
//! ## Layer separation
//! ```text
//! UI layer -> agent-core -> {CommandClient impl, push channel transport}
//! ```
//!
//! Agent-core focuses on:
//! - Guarded, order-tolerant state transitions for the agent and call lifecycle
//! - Qualification staging and the post-call grace window
//! - Read-only session snapshots and human-readable status messages
//! - Precondition validation for every UI-initiated operation
//!
//! Transport concerns (HTTP mechanics, socket reconnection, the popup window
//! that registers the softphone extension) belong to the collaborators
//! injected at construction time, not to this crate.

pub mod agent;
pub mod call;
pub mod error;
pub mod events;
pub mod provider;
pub mod qualification;
pub mod session;

// Public API exports
pub use agent::{AgentState, Campaign, CampaignId};
pub use call::{CallInfo, CallState};
pub use error::{AgentError, AgentResult};
pub use events::{CallAnnouncement, EventVocabulary, PushEvent, Severity, StatusMessage};
pub use provider::{CampaignEntry, CommandClient, ExtensionPortal};
pub use qualification::{Qualification, QualificationBuffer, QualificationId};
pub use session::{SessionConfig, SessionManager, SessionSnapshot};

/// Agent-core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
