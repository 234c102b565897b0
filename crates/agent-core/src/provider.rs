//! Interfaces to the provider-side collaborators
//!
//! The state machine never talks to the network itself. It is handed a
//! [`CommandClient`] for the one-shot request/response surface and an
//! [`ExtensionPortal`] for the popup that registers the softphone extension.
//! Both are deliberately thin: commands are single-attempt with no retry,
//! timeout, or backoff policy - a failure is surfaced verbatim as a status
//! message and the user acts again.

use async_trait::async_trait;

use crate::agent::CampaignId;
use crate::error::AgentResult;
use crate::qualification::QualificationId;

/// One entry of the provider's campaign/group listing
///
/// The listing mixes groups and campaigns; the state machine keeps only
/// entries whose `kind` is `"campaign"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignEntry {
    pub id: CampaignId,
    pub name: String,
    /// Provider-side entry type (`"campaign"`, `"group"`, ...)
    pub kind: String,
}

impl CampaignEntry {
    pub fn is_campaign(&self) -> bool {
        self.kind == "campaign"
    }
}

/// The provider's request/response command surface
///
/// Every operation is a single attempt: implementations must not retry on
/// their own. Failures come back as [`crate::AgentError::CommandFailed`] with
/// a human-readable reason.
#[async_trait]
pub trait CommandClient: Send + Sync {
    /// Log the agent into a campaign in manual mode
    async fn login(&self, token: &str, campaign_id: &str) -> AgentResult<()>;

    /// Dial a number from the logged-in campaign
    async fn dial(&self, token: &str, phone_number: &str) -> AgentResult<()>;

    /// Hang up the call identified by the provider call id
    async fn hangup(&self, token: &str, call_id: &str) -> AgentResult<()>;

    /// Apply a qualification to the call identified by its telephony id
    async fn qualify(
        &self,
        token: &str,
        telephony_id: &str,
        qualification_id: QualificationId,
    ) -> AgentResult<()>;

    /// List the groups and campaigns visible to the agent
    async fn list_campaigns(&self, token: &str) -> AgentResult<Vec<CampaignEntry>>;
}

/// The extension-registration surface
///
/// Opaque to the core: opening it yields only a boolean "was it opened"
/// signal. Actual registration completion is learned exclusively through the
/// `connected` push event.
pub trait ExtensionPortal: Send + Sync {
    /// Open the provider's extension-registration surface for this token.
    /// Returns whether the surface could be opened.
    fn open(&self, token: &str) -> bool;
}
