//! Push-event reconciliation
//!
//! Events arrive in arbitrary and possibly duplicated order; every arm is
//! guarded, and an event whose precondition the current state violates is
//! dropped with a debug log rather than failed. Transitions are applied
//! in arrival order under the session lock; the only command issued from
//! here (the campaign-list fetch on `connected`) runs with the lock
//! released.

use chrono::Utc;
use serde_json::Value;

use crate::agent::{AgentState, Campaign};
use crate::call::CallState;
use crate::events::{CallAnnouncement, PushEvent, StatusMessage};
use crate::qualification::Qualification;

use super::manager::{SessionInner, SessionManager};

impl SessionManager {
    /// Decode and apply a wire-level push event
    ///
    /// Unknown event names are dropped; the vocabulary in the session
    /// configuration decides what is known.
    pub async fn handle_wire_event(&self, name: &str, payload: Option<&Value>) {
        match PushEvent::decode(name, payload, &self.config.vocabulary) {
            Some(event) => self.handle_push_event(event).await,
            None => {
                tracing::debug!(session = %self.id(), event = %name, "unknown push event, dropped");
            }
        }
    }

    /// Apply a push event to the session
    ///
    /// Never fails: guard violations are ignored, and a failed follow-up
    /// command (the campaign-list fetch) degrades to a log line and a
    /// name-resolution fallback later on.
    pub async fn handle_push_event(&self, event: PushEvent) {
        match event {
            PushEvent::Connected => self.on_channel_connected().await,
            PushEvent::AgentEnteredManual { campaign_id } => {
                let mut inner = self.inner.lock().await;
                self.on_agent_entered_manual(&mut inner, campaign_id);
            }
            PushEvent::CallWasConnected(announcement) => {
                let mut inner = self.inner.lock().await;
                self.on_call_connected(&mut inner, announcement);
            }
            PushEvent::ManualCallWasAnswered => {
                let mut inner = self.inner.lock().await;
                self.on_call_answered(&mut inner);
            }
            PushEvent::ManualCallWasQualified { qualification } => {
                let mut inner = self.inner.lock().await;
                self.on_call_qualified(&mut inner, qualification);
            }
            PushEvent::CallEnded => {
                let mut inner = self.inner.lock().await;
                self.on_call_ended(&mut inner);
            }
            PushEvent::Disconnected => {
                let mut inner = self.inner.lock().await;
                self.on_channel_disconnected(&mut inner);
            }
        }
    }

    /// `connected`: the extension is registered and the channel is live.
    /// Idempotent; ignored once the agent is logged in. Triggers the
    /// campaign-list fetch so later logins can resolve campaign names.
    async fn on_channel_connected(&self) {
        let token = {
            let mut inner = self.inner.lock().await;
            if inner.agent_state == AgentState::LoggedIn {
                tracing::debug!(session = %self.id(), "connected event while logged in, ignored");
                return;
            }
            inner.agent_state = AgentState::Connected;
            inner.status = StatusMessage::success("Extension connected. Ready to log in.");
            tracing::info!(session = %self.id(), "push channel connected");
            inner.api_token.clone()
        };

        if token.is_empty() {
            return;
        }
        // lock released: other events keep flowing while the fetch runs
        match self.commands.list_campaigns(&token).await {
            Ok(entries) => {
                let campaigns: Vec<_> =
                    entries.into_iter().filter(|e| e.is_campaign()).collect();
                let mut inner = self.inner.lock().await;
                if inner.agent_state == AgentState::Connected {
                    tracing::debug!(
                        session = %self.id(),
                        count = campaigns.len(),
                        "campaign directory fetched"
                    );
                    inner.campaign_directory = campaigns;
                }
            }
            Err(err) => {
                tracing::warn!(session = %self.id(), error = %err, "campaign list fetch failed");
            }
        }
    }

    /// `agent-entered-manual`: the provider confirmed the campaign login
    fn on_agent_entered_manual(&self, inner: &mut SessionInner, campaign_id: Option<String>) {
        inner.agent_state = AgentState::LoggedIn;
        inner.logged_in_seen = true;

        match campaign_id {
            Some(id) => {
                let resolved = inner
                    .campaign_directory
                    .iter()
                    .find(|entry| entry.id == id)
                    .map(|entry| Campaign {
                        id: entry.id.clone(),
                        name: entry.name.clone(),
                    })
                    .or_else(|| inner.campaign.clone().filter(|c| c.id == id));
                match resolved {
                    Some(campaign) => {
                        inner.status = StatusMessage::success(format!(
                            "Logged in to campaign {}. Ready to dial.",
                            campaign.name
                        ));
                        inner.campaign = Some(campaign);
                    }
                    None => {
                        inner.status = StatusMessage::success("Login succeeded. Ready to dial.");
                        inner.campaign = Some(Campaign::unresolved(id));
                    }
                }
            }
            None => {
                inner.status = StatusMessage::success("Login succeeded. Ready to dial.");
            }
        }
        // the directory has served its purpose
        inner.campaign_directory.clear();
        tracing::info!(session = %self.id(), "agent entered manual mode");
    }

    /// `call-was-connected`: capture identifiers and stage the offered
    /// qualifications; they stay invisible until the call is answered
    fn on_call_connected(&self, inner: &mut SessionInner, announcement: CallAnnouncement) {
        if !inner.logged_in_seen && !inner.call.state.is_live() {
            tracing::debug!(session = %self.id(), "ignoring call connect before any login");
            return;
        }

        // a stale grace timer from the previous call must not clear this one
        inner.buffer.cancel_reset();

        // a connect in a post-call state announces the next call: start from
        // a fresh slot instead of inheriting the finished call's identifiers
        if matches!(inner.call.state, CallState::Ended | CallState::Qualified) {
            inner.call.reset();
            inner.chosen = None;
        }

        if inner.call.created_at.is_none() {
            inner.call.created_at = Some(Utc::now());
        }
        inner.call.state = CallState::Connected;
        inner.call.connected_at = Some(Utc::now());
        if let Some(call_id) = announcement.call_id {
            inner.call.call_id = Some(call_id);
        }
        if let Some(telephony_id) = announcement.telephony_id {
            inner.call.telephony_id = Some(telephony_id);
        }
        if let Some(phone) = announcement.phone {
            inner.call.phone_number = phone;
        }
        inner.buffer.stage(announcement.qualifications);

        inner.status = if inner.call.phone_number.is_empty() {
            StatusMessage::success("Call connected.")
        } else {
            StatusMessage::success(format!("Calling {}.", inner.call.phone_number))
        };
        tracing::info!(
            session = %self.id(),
            call = inner.call.call_id.as_deref().unwrap_or("-"),
            "call connected"
        );
    }

    /// `manual-call-was-answered`: the staged qualification set becomes
    /// visible. May arrive after `call-ended` for a rapid answer-then-hangup
    /// sequence, in which case it preempts the pending reset so the
    /// qualification opportunity survives.
    fn on_call_answered(&self, inner: &mut SessionInner) {
        if !inner.logged_in_seen && !inner.call.state.is_live() {
            tracing::debug!(session = %self.id(), "ignoring call answer before any login");
            return;
        }
        if inner.call.state == CallState::Qualified {
            tracing::debug!(session = %self.id(), "ignoring answer for an already qualified call");
            return;
        }

        inner.buffer.cancel_reset();
        inner.call.state = CallState::Answered;
        inner.call.answered_at = Some(Utc::now());
        inner.buffer.reveal();
        inner.status = StatusMessage::success("Call answered.");
        tracing::info!(session = %self.id(), "call answered");
    }

    /// `manual-call-was-qualified`: the call was qualified on the provider
    /// side, racing any locally issued qualify command
    fn on_call_qualified(&self, inner: &mut SessionInner, qualification: Option<Qualification>) {
        if inner.call.state != CallState::Answered {
            tracing::debug!(
                session = %self.id(),
                state = %inner.call.state,
                "ignoring provider qualification outside the answered state"
            );
            return;
        }

        let chosen = match qualification {
            Some(qual) if qual.name.is_empty() => inner
                .buffer
                .find_visible(qual.id)
                .cloned()
                .unwrap_or(Qualification {
                    name: qual.id.to_string(),
                    id: qual.id,
                }),
            Some(qual) => qual,
            None => Qualification::unidentified(),
        };

        inner.call.state = CallState::Qualified;
        inner.buffer.clear();
        inner.status =
            StatusMessage::success(format!("Call qualified as {}.", chosen.name));
        tracing::info!(session = %self.id(), qualification = chosen.id, "provider qualified the call");
        inner.chosen = Some(chosen);

        // a call that already ended has nothing left to wait for
        if inner.call.ended_at.is_some() {
            self.arm_grace_reset(inner);
        }
    }

    /// `call-ended`: enter the grace window. Identifiers needed for a late
    /// qualification (`telephony_id`) and the staged set are preserved; the
    /// offered set is hidden because the call is no longer answered.
    fn on_call_ended(&self, inner: &mut SessionInner) {
        if !inner.call.state.is_live() {
            tracing::debug!(session = %self.id(), "ignoring call end with no live call");
            return;
        }

        inner.end_call();
        inner.buffer.hide();
        self.arm_grace_reset(inner);
        inner.status = StatusMessage::info("Call ended.");
        tracing::info!(session = %self.id(), "call ended, grace period started");
    }

    /// `disconnected`: the agent session is destroyed; the call and its
    /// qualification context are left as-is on a best-effort basis
    fn on_channel_disconnected(&self, inner: &mut SessionInner) {
        inner.agent_state = AgentState::Disconnected;
        inner.campaign = None;
        inner.campaign_directory.clear();
        inner.logged_in_seen = false;
        inner.status = StatusMessage::error("Disconnected from the server.");
        tracing::info!(session = %self.id(), "push channel disconnected");
    }
}
