//! End-to-end session flow against the wire-level event surface
//!
//! Drives the full register → login → dial → answer → qualify → reset
//! lifecycle through `handle_wire_event`, the same entry point a push
//! channel transport uses.

mod common;

use std::time::Duration;

use serde_json::json;
use tracing_test::traced_test;

use dialdesk_agent_core::{AgentError, AgentState, CallState, CampaignEntry, Severity};

use common::{manager_with_grace_ms, ScriptedCommands};

const GRACE_MS: u64 = 40;

#[tokio::test]
async fn full_manual_call_lifecycle() {
    let commands = ScriptedCommands::new();
    *commands.campaigns.lock().unwrap() = vec![
        CampaignEntry {
            id: "c1".to_string(),
            name: "Outbound Sales".to_string(),
            kind: "campaign".to_string(),
        },
        CampaignEntry {
            id: "g7".to_string(),
            name: "Agents Group".to_string(),
            kind: "group".to_string(),
        },
    ];
    let manager = manager_with_grace_ms(commands.clone(), GRACE_MS);

    // register the extension and wait for the channel
    manager.submit_credentials("t1").await.unwrap();
    manager.register_extension().await.unwrap();
    assert_eq!(manager.agent_state().await, AgentState::ExtensionOpened);

    manager.handle_wire_event("connected", None).await;
    assert_eq!(manager.agent_state().await, AgentState::Connected);
    assert!(commands.issued().contains(&"list_campaigns".to_string()));

    // scenario A: login resolves the campaign name
    manager.login("c1").await.unwrap();
    let snapshot = manager.snapshot().await;
    assert_eq!(snapshot.agent_state, AgentState::LoggedIn);
    assert_eq!(snapshot.campaign.as_ref().unwrap().name, "Outbound Sales");

    // scenario B: dial, then the provider announces the connected call;
    // qualifications are staged but not yet visible
    manager.dial("5551234").await.unwrap();
    assert_eq!(manager.snapshot().await.call.state, CallState::Dialing);

    manager
        .handle_wire_event(
            "call-was-connected",
            Some(&json!({
                "call": {
                    "id": 42,
                    "phone": "5551234",
                    "telephony_id": "T1",
                    "qualifications": [
                        {"id": 1, "name": "Sale"},
                        {"id": 2, "name": "NoAnswer"}
                    ]
                }
            })),
        )
        .await;
    let snapshot = manager.snapshot().await;
    assert_eq!(snapshot.call.state, CallState::Connected);
    assert_eq!(snapshot.call.call_id.as_deref(), Some("42"));
    assert_eq!(snapshot.call.telephony_id.as_deref(), Some("T1"));
    assert!(snapshot.qualifications.is_empty());

    // scenario C: answering reveals the staged set
    manager.handle_wire_event("manual-call-was-answered", None).await;
    let snapshot = manager.snapshot().await;
    assert_eq!(snapshot.call.state, CallState::Answered);
    assert_eq!(snapshot.qualifications.len(), 2);
    assert_eq!(snapshot.qualifications[0].name, "Sale");

    // scenario D: a successful qualify records the choice and clears the set
    manager.qualify(1).await.unwrap();
    let snapshot = manager.snapshot().await;
    assert_eq!(snapshot.call.state, CallState::Qualified);
    assert_eq!(snapshot.chosen_qualification.as_ref().unwrap().id, 1);
    assert_eq!(snapshot.chosen_qualification.as_ref().unwrap().name, "Sale");
    assert!(snapshot.qualifications.is_empty());

    // scenario E: the call ends, and after the grace delay the slot is idle
    manager.handle_wire_event("call-ended", None).await;
    let snapshot = manager.snapshot().await;
    assert_eq!(snapshot.call.state, CallState::Ended);
    assert!(snapshot.call.call_id.is_none());
    assert!(snapshot.chosen_qualification.is_none());

    tokio::time::sleep(Duration::from_millis(GRACE_MS * 4)).await;
    let snapshot = manager.snapshot().await;
    assert_eq!(snapshot.call.state, CallState::Idle);
    assert!(snapshot.qualifications.is_empty());
    assert!(snapshot.call.telephony_id.is_none());

    // the agent can dial again
    manager.dial("5555678").await.unwrap();
    assert_eq!(manager.snapshot().await.call.state, CallState::Dialing);
}

#[tokio::test]
async fn scenario_f_unknown_qualification_is_rejected() {
    let commands = ScriptedCommands::new();
    let manager = manager_with_grace_ms(commands, GRACE_MS);
    manager.submit_credentials("t1").await.unwrap();
    manager.register_extension().await.unwrap();
    manager.handle_wire_event("connected", None).await;
    manager.login("c1").await.unwrap();
    manager.dial("5551234").await.unwrap();
    manager
        .handle_wire_event(
            "call-was-connected",
            Some(&json!({
                "call": {
                    "id": 42,
                    "telephony_id": "T1",
                    "qualifications": [{"id": 1, "name": "Sale"}]
                }
            })),
        )
        .await;
    manager.handle_wire_event("manual-call-was-answered", None).await;

    let before = manager.snapshot().await;
    let err = manager.qualify(99).await.unwrap_err();
    assert_eq!(err, AgentError::UnknownQualification { id: 99 });

    let after = manager.snapshot().await;
    assert_eq!(after.call, before.call);
    assert_eq!(after.qualifications, before.qualifications);
    assert_eq!(after.status.severity, Severity::Error);
}

#[tokio::test]
async fn connected_is_idempotent() {
    let commands = ScriptedCommands::new();
    let manager = manager_with_grace_ms(commands, GRACE_MS);
    manager.submit_credentials("t1").await.unwrap();
    manager.register_extension().await.unwrap();

    manager.handle_wire_event("connected", None).await;
    let once = manager.snapshot().await;

    manager.handle_wire_event("connected", None).await;
    let twice = manager.snapshot().await;

    assert_eq!(once.agent_state, twice.agent_state);
    assert_eq!(once.call, twice.call);
    assert_eq!(once.status, twice.status);
}

#[tokio::test]
async fn the_legacy_connected_alias_is_accepted() {
    let commands = ScriptedCommands::new();
    let manager = manager_with_grace_ms(commands, GRACE_MS);
    manager.submit_credentials("t1").await.unwrap();
    manager.register_extension().await.unwrap();

    manager.handle_wire_event("agent-is-connected", None).await;
    assert_eq!(manager.agent_state().await, AgentState::Connected);
}

#[tokio::test]
#[traced_test]
async fn call_events_before_any_login_are_ignored() {
    let commands = ScriptedCommands::new();
    let manager = manager_with_grace_ms(commands, GRACE_MS);
    manager.submit_credentials("t1").await.unwrap();
    manager.register_extension().await.unwrap();
    manager.handle_wire_event("connected", None).await;

    // no login has ever happened: a call cannot come into existence
    manager
        .handle_wire_event(
            "call-was-connected",
            Some(&json!({"call": {"id": 1, "telephony_id": "T1"}})),
        )
        .await;
    manager.handle_wire_event("manual-call-was-answered", None).await;

    let snapshot = manager.snapshot().await;
    assert_eq!(snapshot.call.state, CallState::Idle);
    assert!(snapshot.qualifications.is_empty());
    assert!(logs_contain("ignoring call connect before any login"));
}

#[tokio::test]
async fn unknown_events_are_dropped() {
    let commands = ScriptedCommands::new();
    let manager = manager_with_grace_ms(commands, GRACE_MS);
    manager.submit_credentials("t1").await.unwrap();
    manager.register_extension().await.unwrap();

    let before = manager.snapshot().await;
    manager
        .handle_wire_event("agent-coffee-break", Some(&json!({"minutes": 5})))
        .await;
    assert_eq!(manager.snapshot().await, before);
}

#[tokio::test]
async fn disconnect_destroys_the_agent_session_but_not_the_live_call() {
    let commands = ScriptedCommands::new();
    let manager = manager_with_grace_ms(commands, GRACE_MS);
    manager.submit_credentials("t1").await.unwrap();
    manager.register_extension().await.unwrap();
    manager.handle_wire_event("connected", None).await;
    manager.login("c1").await.unwrap();
    manager.dial("5551234").await.unwrap();
    manager
        .handle_wire_event(
            "call-was-connected",
            Some(&json!({"call": {"id": 42, "telephony_id": "T1",
                "qualifications": [{"id": 1, "name": "Sale"}]}})),
        )
        .await;

    manager.handle_wire_event("disconnected", None).await;
    let snapshot = manager.snapshot().await;
    assert_eq!(snapshot.agent_state, AgentState::Disconnected);
    assert!(snapshot.campaign.is_none());
    assert_eq!(snapshot.status.severity, Severity::Error);
    // best-effort: the live call is untouched
    assert_eq!(snapshot.call.state, CallState::Connected);

    // and its remaining lifecycle events still apply
    manager.handle_wire_event("manual-call-was-answered", None).await;
    let snapshot = manager.snapshot().await;
    assert_eq!(snapshot.call.state, CallState::Answered);
    assert_eq!(snapshot.qualifications.len(), 1);
}

#[tokio::test]
async fn agent_entered_manual_resolves_the_campaign_from_the_directory() {
    let commands = ScriptedCommands::new();
    *commands.campaigns.lock().unwrap() = vec![CampaignEntry {
        id: "12".to_string(),
        name: "Renewals".to_string(),
        kind: "campaign".to_string(),
    }];
    let manager = manager_with_grace_ms(commands, GRACE_MS);
    manager.submit_credentials("t1").await.unwrap();
    manager.register_extension().await.unwrap();
    manager.handle_wire_event("connected", None).await;

    // the provider confirms the login before (or without) a local response
    manager
        .handle_wire_event("agent-entered-manual", Some(&json!({"campaign_id": 12})))
        .await;

    let snapshot = manager.snapshot().await;
    assert_eq!(snapshot.agent_state, AgentState::LoggedIn);
    assert_eq!(snapshot.campaign.as_ref().unwrap().name, "Renewals");
    assert_eq!(snapshot.status.severity, Severity::Success);
}

#[tokio::test]
async fn agent_entered_manual_falls_back_when_the_campaign_is_unknown() {
    let commands = ScriptedCommands::new();
    let manager = manager_with_grace_ms(commands, GRACE_MS);
    manager.submit_credentials("t1").await.unwrap();
    manager.register_extension().await.unwrap();
    manager.handle_wire_event("connected", None).await;

    manager
        .handle_wire_event("agent-entered-manual", Some(&json!({"campaign_id": "c9"})))
        .await;

    let snapshot = manager.snapshot().await;
    assert_eq!(snapshot.agent_state, AgentState::LoggedIn);
    assert_eq!(snapshot.campaign.as_ref().unwrap().name, "c9");
    assert!(snapshot.status.text.contains("Login succeeded"));
}
