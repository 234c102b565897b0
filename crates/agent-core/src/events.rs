//! Push events, wire vocabulary, and status messages
//!
//! The provider's push channel delivers named events with opaque JSON
//! payloads, in arbitrary and possibly duplicated order. This module turns a
//! wire-level `(name, payload)` pair into the [`PushEvent`] sum type that the
//! session state machine matches exhaustively.
//!
//! The exact wire names vary across provider versions, so they are carried in
//! an [`EventVocabulary`] rather than hard-coded; the default vocabulary uses
//! the current names and also accepts the legacy `agent-is-connected` alias.
//! Payload decoding is similarly tolerant: fields are looked up both on the
//! nested `call` object and on the payload root.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agent::CampaignId;
use crate::qualification::{Qualification, QualificationId};

/// Severity of a status message, for UI styling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Success,
    Error,
}

/// Human-readable explanation of the last transition, overwritten on every
/// transition; derived state, never persisted
///
/// # Examples
///
/// ```rust
/// use dialdesk_agent_core::{Severity, StatusMessage};
///
/// let status = StatusMessage::success("Call answered.");
/// assert_eq!(status.severity, Severity::Success);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub text: String,
    pub severity: Severity,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            severity: Severity::Info,
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            severity: Severity::Success,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            severity: Severity::Error,
        }
    }
}

impl Default for StatusMessage {
    fn default() -> Self {
        Self::info("")
    }
}

/// What the provider announced about a connected call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallAnnouncement {
    /// Provider call identifier, used for hangup
    pub call_id: Option<String>,
    /// Provider telephony identifier, used for qualification
    pub telephony_id: Option<String>,
    /// The connected number
    pub phone: Option<String>,
    /// Qualifications valid for this call; staged, not yet visible
    pub qualifications: Vec<Qualification>,
}

/// A decoded push-channel event
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    /// The softphone extension is registered and the channel is live
    Connected,
    /// The agent entered a campaign in manual mode
    AgentEnteredManual { campaign_id: Option<CampaignId> },
    /// A call was connected (prompted by a dial or not)
    CallWasConnected(CallAnnouncement),
    /// The remote party answered the manual call
    ManualCallWasAnswered,
    /// The call was qualified on the provider side (e.g. native softphone
    /// controls); the qualification may be missing from the payload
    ManualCallWasQualified {
        qualification: Option<Qualification>,
    },
    /// The call ended
    CallEnded,
    /// The push channel lost its connection
    Disconnected,
}

/// Wire names for the push events, configurable per provider version
///
/// Each canonical event accepts a list of aliases; `decode` matches the
/// incoming name against all of them.
#[derive(Debug, Clone)]
pub struct EventVocabulary {
    pub connected: Vec<String>,
    pub agent_entered_manual: Vec<String>,
    pub call_was_connected: Vec<String>,
    pub manual_call_was_answered: Vec<String>,
    pub manual_call_was_qualified: Vec<String>,
    pub call_ended: Vec<String>,
    pub disconnected: Vec<String>,
}

impl Default for EventVocabulary {
    fn default() -> Self {
        Self {
            // `agent-is-connected` is the legacy name still emitted by older
            // provider deployments
            connected: vec!["connected".into(), "agent-is-connected".into()],
            agent_entered_manual: vec!["agent-entered-manual".into()],
            call_was_connected: vec!["call-was-connected".into()],
            manual_call_was_answered: vec!["manual-call-was-answered".into()],
            manual_call_was_qualified: vec!["manual-call-was-qualified".into()],
            call_ended: vec!["call-ended".into()],
            disconnected: vec!["disconnected".into()],
        }
    }
}

impl EventVocabulary {
    fn matches(names: &[String], name: &str) -> bool {
        names.iter().any(|n| n == name)
    }
}

impl PushEvent {
    /// Decode a wire-level event into a [`PushEvent`], or `None` if the name
    /// is not in the vocabulary
    pub fn decode(name: &str, payload: Option<&Value>, vocab: &EventVocabulary) -> Option<Self> {
        if EventVocabulary::matches(&vocab.connected, name) {
            Some(PushEvent::Connected)
        } else if EventVocabulary::matches(&vocab.agent_entered_manual, name) {
            Some(PushEvent::AgentEnteredManual {
                campaign_id: payload.and_then(decode_campaign_id),
            })
        } else if EventVocabulary::matches(&vocab.call_was_connected, name) {
            Some(PushEvent::CallWasConnected(
                payload.map(decode_announcement).unwrap_or_default(),
            ))
        } else if EventVocabulary::matches(&vocab.manual_call_was_answered, name) {
            Some(PushEvent::ManualCallWasAnswered)
        } else if EventVocabulary::matches(&vocab.manual_call_was_qualified, name) {
            Some(PushEvent::ManualCallWasQualified {
                qualification: payload.and_then(decode_qualification),
            })
        } else if EventVocabulary::matches(&vocab.call_ended, name) {
            Some(PushEvent::CallEnded)
        } else if EventVocabulary::matches(&vocab.disconnected, name) {
            Some(PushEvent::Disconnected)
        } else {
            None
        }
    }
}

/// The object call fields live on: the nested `call` object when present,
/// the payload root otherwise
fn call_object(payload: &Value) -> &Value {
    payload.get("call").filter(|v| v.is_object()).unwrap_or(payload)
}

/// Read a field that may be a JSON string or number as a string
fn string_field(obj: &Value, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn id_field(obj: &Value, key: &str) -> Option<QualificationId> {
    match obj.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn decode_announcement(payload: &Value) -> CallAnnouncement {
    let call = call_object(payload);
    CallAnnouncement {
        call_id: string_field(call, "id"),
        telephony_id: string_field(call, "telephony_id")
            .or_else(|| string_field(payload, "telephony_id")),
        phone: string_field(call, "phone"),
        qualifications: call
            .get("qualifications")
            .or_else(|| payload.get("qualifications"))
            .and_then(Value::as_array)
            .map(|entries| entries.iter().filter_map(decode_qualification_entry).collect())
            .unwrap_or_default(),
    }
}

fn decode_qualification_entry(entry: &Value) -> Option<Qualification> {
    Some(Qualification {
        id: id_field(entry, "id")?,
        name: string_field(entry, "name").unwrap_or_default(),
    })
}

fn decode_campaign_id(payload: &Value) -> Option<CampaignId> {
    string_field(payload, "campaign_id")
        .or_else(|| payload.get("campaign").and_then(|c| string_field(c, "id")))
}

fn decode_qualification(payload: &Value) -> Option<Qualification> {
    if let Some(obj) = payload.get("qualification") {
        if let Some(qual) = decode_qualification_entry(obj) {
            return Some(qual);
        }
    }
    // some payload variants carry only the id
    id_field(payload, "qualification_id").map(|id| Qualification {
        id,
        name: String::new(),
    })
}
