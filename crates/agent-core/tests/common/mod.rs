//! Shared test doubles for the integration tests
#![allow(dead_code)] // not every test binary uses every helper

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::oneshot;

use dialdesk_agent_core::{
    AgentError, AgentResult, CampaignEntry, CommandClient, ExtensionPortal, SessionConfig,
    SessionManager,
};

/// Command client whose results are scripted by the test.
///
/// Individual commands can be gated on a oneshot channel so a test can hold a
/// response open while push events race past it.
#[derive(Default)]
pub struct ScriptedCommands {
    pub issued: Mutex<Vec<String>>,
    pub failing: Mutex<HashSet<String>>,
    pub campaigns: Mutex<Vec<CampaignEntry>>,
    pub dial_gate: Mutex<Option<oneshot::Receiver<()>>>,
    pub qualify_gate: Mutex<Option<oneshot::Receiver<()>>>,
}

impl ScriptedCommands {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_on(&self, command: &str) {
        self.failing.lock().unwrap().insert(command.to_string());
    }

    /// Hold the next dial response until the returned sender fires
    pub fn gate_dial(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.dial_gate.lock().unwrap() = Some(rx);
        tx
    }

    /// Hold the next qualify response until the returned sender fires
    pub fn gate_qualify(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.qualify_gate.lock().unwrap() = Some(rx);
        tx
    }

    pub fn issued(&self) -> Vec<String> {
        self.issued.lock().unwrap().clone()
    }

    fn finish(&self, command: &str, detail: String) -> AgentResult<()> {
        self.issued.lock().unwrap().push(detail);
        if self.failing.lock().unwrap().contains(command) {
            Err(AgentError::command_failed(command, "scripted failure"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CommandClient for ScriptedCommands {
    async fn login(&self, _token: &str, campaign_id: &str) -> AgentResult<()> {
        self.finish("login", format!("login {campaign_id}"))
    }

    async fn dial(&self, _token: &str, phone_number: &str) -> AgentResult<()> {
        let gate = self.dial_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        self.finish("dial", format!("dial {phone_number}"))
    }

    async fn hangup(&self, _token: &str, call_id: &str) -> AgentResult<()> {
        self.finish("hangup", format!("hangup {call_id}"))
    }

    async fn qualify(
        &self,
        _token: &str,
        telephony_id: &str,
        qualification_id: i64,
    ) -> AgentResult<()> {
        let gate = self.qualify_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        self.finish("qualify", format!("qualify {telephony_id} {qualification_id}"))
    }

    async fn list_campaigns(&self, _token: &str) -> AgentResult<Vec<CampaignEntry>> {
        self.issued.lock().unwrap().push("list_campaigns".to_string());
        if self.failing.lock().unwrap().contains("list_campaigns") {
            Err(AgentError::command_failed("list_campaigns", "scripted failure"))
        } else {
            Ok(self.campaigns.lock().unwrap().clone())
        }
    }
}

/// Portal that always opens
pub struct AcceptingPortal;

impl ExtensionPortal for AcceptingPortal {
    fn open(&self, _token: &str) -> bool {
        true
    }
}

/// Manager with a short grace delay so the tests observe the window quickly
pub fn manager_with_grace_ms(commands: Arc<ScriptedCommands>, grace_ms: u64) -> Arc<SessionManager> {
    let config = SessionConfig::new().with_grace_delay(std::time::Duration::from_millis(grace_ms));
    Arc::new(SessionManager::new(config, commands, Arc::new(AcceptingPortal)))
}
