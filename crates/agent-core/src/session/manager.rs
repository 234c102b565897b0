//! Session manager: state ownership and the UI-initiated operations
//!
//! All mutation funnels through one async mutex, so applications may share
//! the manager freely behind an `Arc`; each state application is synchronous
//! mutation plus at most one outgoing command or timer. Command issuance
//! never holds the lock across the await - push events keep flowing while a
//! command is outstanding, and response application re-checks guards so that
//! either ordering of a response and a racing push event is safe.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::agent::{AgentState, Campaign};
use crate::call::{CallInfo, CallState};
use crate::error::{AgentError, AgentResult};
use crate::events::StatusMessage;
use crate::provider::{CampaignEntry, CommandClient, ExtensionPortal};
use crate::qualification::{Qualification, QualificationBuffer, QualificationId};

use super::config::SessionConfig;

/// Mutable session state, owned exclusively by the manager
#[derive(Debug)]
pub(crate) struct SessionInner {
    pub(crate) agent_state: AgentState,
    pub(crate) api_token: String,
    pub(crate) campaign: Option<Campaign>,
    /// Campaign listing fetched when the channel connects; consumed to
    /// resolve campaign names and cleared once the agent has entered one
    pub(crate) campaign_directory: Vec<CampaignEntry>,
    /// Whether a login has been observed since the agent session was created;
    /// a call session may only be created after one
    pub(crate) logged_in_seen: bool,
    pub(crate) call: CallInfo,
    pub(crate) chosen: Option<Qualification>,
    pub(crate) buffer: QualificationBuffer,
    pub(crate) status: StatusMessage,
}

impl SessionInner {
    fn new() -> Self {
        Self {
            agent_state: AgentState::Disconnected,
            api_token: String::new(),
            campaign: None,
            campaign_directory: Vec::new(),
            logged_in_seen: false,
            call: CallInfo::idle(),
            chosen: None,
            buffer: QualificationBuffer::new(),
            status: StatusMessage::default(),
        }
    }

    /// End the live call: the grace period starts after this
    pub(crate) fn end_call(&mut self) {
        self.call.state = CallState::Ended;
        if self.call.ended_at.is_none() {
            self.call.ended_at = Some(Utc::now());
        }
        self.call.call_id = None;
        self.chosen = None;
    }
}

/// Read-only projection of the session for the UI layer
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    /// Agent lifecycle state
    pub agent_state: AgentState,
    /// Campaign the agent is logged into, if any
    pub campaign: Option<Campaign>,
    /// The live call session
    pub call: CallInfo,
    /// Qualifications currently offered to the agent
    pub qualifications: Vec<Qualification>,
    /// The qualification recorded for the current call, if any
    pub chosen_qualification: Option<Qualification>,
    /// Explanation of the last transition
    pub status: StatusMessage,
}

/// The session state machine
///
/// Consumes command responses and push events, applies guarded transitions,
/// and exposes a read-only snapshot. One instance models one agent
/// workstation; state is ephemeral and never persisted.
pub struct SessionManager {
    id: Uuid,
    pub(crate) config: SessionConfig,
    pub(crate) commands: Arc<dyn CommandClient>,
    portal: Arc<dyn ExtensionPortal>,
    pub(crate) inner: Arc<Mutex<SessionInner>>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("id", &self.id)
            .field("config", &self.config)
            .finish()
    }
}

impl SessionManager {
    /// Create a session manager with its provider collaborators
    pub fn new(
        config: SessionConfig,
        commands: Arc<dyn CommandClient>,
        portal: Arc<dyn ExtensionPortal>,
    ) -> Self {
        let id = Uuid::new_v4();
        tracing::debug!(session = %id, "created agent session");
        Self {
            id,
            config,
            commands,
            portal,
            inner: Arc::new(Mutex::new(SessionInner::new())),
        }
    }

    /// Local identifier of this session, used in diagnostics
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Store the agent token
    ///
    /// No state transition; the token is required by every other operation.
    ///
    /// # Errors
    ///
    /// * `AgentError::InvalidInput` - the token is empty
    pub async fn submit_credentials(&self, token: &str) -> AgentResult<()> {
        if token.trim().is_empty() {
            let err = AgentError::invalid_input("token", "an agent token is required");
            self.record_failure(&err).await;
            return Err(err);
        }
        let mut inner = self.inner.lock().await;
        inner.api_token = token.trim().to_string();
        Ok(())
    }

    /// Open the provider's extension-registration surface
    ///
    /// On success the agent state moves to `ExtensionOpened`; actual
    /// registration completion arrives later as the `connected` push event.
    ///
    /// # Errors
    ///
    /// * `AgentError::InvalidAgentState` - the agent is not `Disconnected`
    /// * `AgentError::MissingCredentials` - no token submitted yet
    /// * `AgentError::PortalFailed` - the surface could not be opened
    pub async fn register_extension(&self) -> AgentResult<()> {
        let token = {
            let inner = self.inner.lock().await;
            if inner.agent_state != AgentState::Disconnected {
                let actual = inner.agent_state.to_string();
                drop(inner);
                let err = AgentError::InvalidAgentState {
                    expected: AgentState::Disconnected.to_string(),
                    actual,
                };
                self.record_failure(&err).await;
                return Err(err);
            }
            if inner.api_token.is_empty() {
                drop(inner);
                let err = AgentError::MissingCredentials;
                self.record_failure(&err).await;
                return Err(err);
            }
            inner.api_token.clone()
        };

        if !self.portal.open(&token) {
            let err = AgentError::portal_failed("the registration window could not be opened");
            self.record_failure(&err).await;
            return Err(err);
        }

        let mut inner = self.inner.lock().await;
        inner.agent_state = AgentState::ExtensionOpened;
        inner.status = StatusMessage::info(
            "Extension window opened. Complete the registration and come back.",
        );
        tracing::info!(session = %self.id, "extension registration surface opened");
        Ok(())
    }

    /// Log the agent into a campaign
    ///
    /// # Errors
    ///
    /// * `AgentError::InvalidInput` - the campaign id is empty
    /// * `AgentError::InvalidAgentState` - not `Connected`/`ExtensionOpened`
    /// * `AgentError::MissingCredentials` - no token submitted yet
    /// * `AgentError::CommandFailed` - the login command failed; state held
    pub async fn login(&self, campaign_id: &str) -> AgentResult<()> {
        let campaign_id = campaign_id.trim();
        if campaign_id.is_empty() {
            let err = AgentError::invalid_input("campaign_id", "a campaign id is required");
            self.record_failure(&err).await;
            return Err(err);
        }
        let token = {
            let inner = self.inner.lock().await;
            if !inner.agent_state.can_login() {
                let actual = inner.agent_state.to_string();
                drop(inner);
                let err = AgentError::InvalidAgentState {
                    expected: "Connected or ExtensionOpened".to_string(),
                    actual,
                };
                self.record_failure(&err).await;
                return Err(err);
            }
            if inner.api_token.is_empty() {
                drop(inner);
                let err = AgentError::MissingCredentials;
                self.record_failure(&err).await;
                return Err(err);
            }
            inner.api_token.clone()
        };

        match self.commands.login(&token, campaign_id).await {
            Ok(()) => {
                let mut inner = self.inner.lock().await;
                inner.agent_state = AgentState::LoggedIn;
                inner.logged_in_seen = true;
                let campaign = inner
                    .campaign_directory
                    .iter()
                    .find(|entry| entry.id == campaign_id)
                    .map(|entry| Campaign {
                        id: entry.id.clone(),
                        name: entry.name.clone(),
                    })
                    .unwrap_or_else(|| Campaign::unresolved(campaign_id.to_string()));
                inner.status =
                    StatusMessage::success(format!("Logged in to campaign {}.", campaign.name));
                tracing::info!(session = %self.id, campaign = %campaign.id, "campaign login succeeded");
                inner.campaign = Some(campaign);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(session = %self.id, error = %err, "campaign login failed");
                self.record_failure(&err).await;
                Err(err)
            }
        }
    }

    /// Dial a number
    ///
    /// # Errors
    ///
    /// * `AgentError::InvalidInput` - the phone number is empty
    /// * `AgentError::InvalidAgentState` - the agent is not logged in
    /// * `AgentError::InvalidCallState` - a call is already in progress
    /// * `AgentError::CommandFailed` - the dial command failed; state held
    pub async fn dial(&self, phone_number: &str) -> AgentResult<()> {
        let phone_number = phone_number.trim();
        if phone_number.is_empty() {
            let err = AgentError::invalid_input("phone_number", "a phone number is required");
            self.record_failure(&err).await;
            return Err(err);
        }
        let token = {
            let inner = self.inner.lock().await;
            if inner.agent_state != AgentState::LoggedIn {
                let actual = inner.agent_state.to_string();
                drop(inner);
                let err = AgentError::InvalidAgentState {
                    expected: AgentState::LoggedIn.to_string(),
                    actual,
                };
                self.record_failure(&err).await;
                return Err(err);
            }
            if inner.call.state != CallState::Idle {
                let actual = inner.call.state.to_string();
                drop(inner);
                let err = AgentError::InvalidCallState {
                    expected: CallState::Idle.to_string(),
                    actual,
                };
                self.record_failure(&err).await;
                return Err(err);
            }
            inner.api_token.clone()
        };

        match self.commands.dial(&token, phone_number).await {
            Ok(()) => {
                let mut inner = self.inner.lock().await;
                // the connected announcement may have raced the response in;
                // never regress a further-along call
                if inner.call.state == CallState::Idle {
                    inner.call.state = CallState::Dialing;
                    inner.call.created_at = Some(Utc::now());
                }
                if inner.call.phone_number.is_empty() {
                    inner.call.phone_number = phone_number.to_string();
                }
                inner.status = StatusMessage::success(format!("Dialing {phone_number}."));
                tracing::info!(session = %self.id, phone = %phone_number, "dial accepted");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(session = %self.id, error = %err, "dial failed");
                self.record_failure(&err).await;
                Err(err)
            }
        }
    }

    /// Hang up the live call
    ///
    /// # Errors
    ///
    /// * `AgentError::NoActiveCall` - no provider call id is known
    /// * `AgentError::CommandFailed` - the hangup command failed; state held
    pub async fn hangup(&self) -> AgentResult<()> {
        let (token, call_id) = {
            let inner = self.inner.lock().await;
            match inner.call.call_id.clone() {
                Some(call_id) => (inner.api_token.clone(), call_id),
                None => {
                    drop(inner);
                    let err = AgentError::NoActiveCall;
                    self.record_failure(&err).await;
                    return Err(err);
                }
            }
        };

        match self.commands.hangup(&token, &call_id).await {
            Ok(()) => {
                let mut inner = self.inner.lock().await;
                inner.end_call();
                inner.buffer.hide();
                self.arm_grace_reset(&mut inner);
                inner.status = StatusMessage::info("Call ended.");
                tracing::info!(session = %self.id, call = %call_id, "hangup succeeded");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(session = %self.id, call = %call_id, error = %err, "hangup failed");
                self.record_failure(&err).await;
                Err(err)
            }
        }
    }

    /// Qualify the answered call
    ///
    /// The qualification id must be one of the qualifications currently
    /// offered. On success the chosen qualification is recorded and the
    /// offered set is cleared.
    ///
    /// # Errors
    ///
    /// * `AgentError::InvalidCallState` - the call is not `Answered`
    /// * `AgentError::MissingTelephonyId` - hard precondition, not retryable
    /// * `AgentError::UnknownQualification` - id not in the offered set
    /// * `AgentError::CommandFailed` - the qualify command failed; state held
    pub async fn qualify(&self, qualification_id: QualificationId) -> AgentResult<()> {
        let (token, telephony_id, qualification) = {
            let inner = self.inner.lock().await;
            if inner.call.state != CallState::Answered {
                let actual = inner.call.state.to_string();
                drop(inner);
                let err = AgentError::InvalidCallState {
                    expected: CallState::Answered.to_string(),
                    actual,
                };
                self.record_failure(&err).await;
                return Err(err);
            }
            let Some(telephony_id) = inner.call.telephony_id.clone() else {
                drop(inner);
                let err = AgentError::MissingTelephonyId;
                self.record_failure(&err).await;
                return Err(err);
            };
            let Some(qualification) = inner.buffer.find_visible(qualification_id).cloned() else {
                drop(inner);
                let err = AgentError::UnknownQualification {
                    id: qualification_id,
                };
                self.record_failure(&err).await;
                return Err(err);
            };
            (inner.api_token.clone(), telephony_id, qualification)
        };

        match self
            .commands
            .qualify(&token, &telephony_id, qualification_id)
            .await
        {
            Ok(()) => {
                let mut inner = self.inner.lock().await;
                // last write wins against a racing provider-side
                // qualification; anything else (e.g. the grace reset already
                // returned the slot to idle) drops the response
                if matches!(
                    inner.call.state,
                    CallState::Answered | CallState::Qualified
                ) {
                    inner.call.state = CallState::Qualified;
                    inner.chosen = Some(qualification.clone());
                    inner.buffer.clear();
                    if inner.call.ended_at.is_some() {
                        self.arm_grace_reset(&mut inner);
                    }
                    inner.status = StatusMessage::success(format!(
                        "Call qualified as {}.",
                        qualification.name
                    ));
                    tracing::info!(
                        session = %self.id,
                        qualification = qualification.id,
                        "call qualified"
                    );
                } else {
                    tracing::debug!(
                        session = %self.id,
                        state = %inner.call.state,
                        "qualify response arrived for a reset call, dropped"
                    );
                }
                Ok(())
            }
            Err(err) => {
                tracing::warn!(session = %self.id, error = %err, "qualify failed");
                self.record_failure(&err).await;
                Err(err)
            }
        }
    }

    /// Read-only snapshot of the whole session
    pub async fn snapshot(&self) -> SessionSnapshot {
        let inner = self.inner.lock().await;
        SessionSnapshot {
            agent_state: inner.agent_state,
            campaign: inner.campaign.clone(),
            call: inner.call.clone(),
            qualifications: inner.buffer.visible().to_vec(),
            chosen_qualification: inner.chosen.clone(),
            status: inner.status.clone(),
        }
    }

    /// Current agent lifecycle state
    pub async fn agent_state(&self) -> AgentState {
        self.inner.lock().await.agent_state
    }

    /// Arm the one-shot grace timer that returns the call slot to idle.
    /// Cancels any pending timer first; the spawned task re-checks its epoch
    /// under the lock so a stale fire is a no-op.
    pub(crate) fn arm_grace_reset(&self, inner: &mut SessionInner) {
        let epoch = inner.buffer.begin_reset();
        let shared = Arc::clone(&self.inner);
        let delay = self.config.grace_delay;
        let session = self.id;
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut inner = shared.lock().await;
            if !inner.buffer.is_current(epoch) {
                return;
            }
            inner.buffer.clear();
            inner.call.reset();
            inner.chosen = None;
            tracing::debug!(session = %session, "grace period elapsed, call session reset");
        });
        inner.buffer.install_reset(task);
    }

    /// Record a failure into the status line without touching any other state
    pub(crate) async fn record_failure(&self, err: &AgentError) {
        let mut inner = self.inner.lock().await;
        inner.status = StatusMessage::error(err.to_string());
    }
}
