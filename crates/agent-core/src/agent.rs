//! Agent lifecycle state and campaign identity
//!
//! The agent state models the path from a cold start to a dialing-capable
//! session: credentials are entered, the softphone extension is registered
//! through the provider's popup surface, the push channel reports the
//! extension as connected, and finally the agent logs into a campaign.
//!
//! Registration completion is never learned from the popup itself - only the
//! `connected` push event advances the state past `ExtensionOpened`.

use serde::{Deserialize, Serialize};

/// Identifier of a campaign as issued by the provider
pub type CampaignId = String;

/// Current state of the agent session
///
/// # State transitions
///
/// Typical flow:
/// `Disconnected` → `ExtensionOpened` → `Connected` → `LoggedIn`
///
/// A channel disconnect resets the state to `Disconnected` from anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentState {
    /// No extension registered and no push channel established
    Disconnected,

    /// The provider's extension-registration surface has been opened;
    /// waiting for the push channel to report the extension as connected
    ExtensionOpened,

    /// The extension is registered and the push channel is live;
    /// the agent can log into a campaign
    Connected,

    /// The agent is logged into a campaign and can dial
    LoggedIn,
}

impl AgentState {
    /// Whether the agent can issue a campaign login from this state
    pub fn can_login(&self) -> bool {
        matches!(self, AgentState::Connected | AgentState::ExtensionOpened)
    }

    /// Whether the agent is logged into a campaign
    pub fn is_logged_in(&self) -> bool {
        matches!(self, AgentState::LoggedIn)
    }
}

impl std::fmt::Display for AgentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentState::Disconnected => write!(f, "Disconnected"),
            AgentState::ExtensionOpened => write!(f, "ExtensionOpened"),
            AgentState::Connected => write!(f, "Connected"),
            AgentState::LoggedIn => write!(f, "LoggedIn"),
        }
    }
}

/// The campaign the agent is currently logged into
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    /// Provider-issued campaign identifier
    pub id: CampaignId,
    /// Display name; falls back to the raw id when the directory
    /// lookup could not resolve one
    pub name: String,
}

impl Campaign {
    /// Campaign known only by id (name resolution failed or was skipped)
    pub fn unresolved(id: CampaignId) -> Self {
        let name = id.clone();
        Self { id, name }
    }
}
