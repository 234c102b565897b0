//! The reqwest-backed command client

use async_trait::async_trait;
use serde_json::{json, Value};
use url::Url;

use dialdesk_agent_core::{
    AgentError, AgentResult, CampaignEntry, CommandClient, QualificationId,
};

/// Single-attempt HTTP client for the provider's command surface
///
/// Authentication is the agent token passed as the `api_token` query
/// parameter on every request, the way the provider's API expects it.
pub struct HttpCommandClient {
    http: reqwest::Client,
    base: Url,
}

impl HttpCommandClient {
    /// Create a client against the given provider base URL
    /// (e.g. `https://app.example.com`)
    pub fn new(base: Url) -> Self {
        Self {
            http: reqwest::Client::new(),
            base,
        }
    }

    /// Create a client reusing an existing `reqwest::Client` (connection
    /// pooling, proxies and TLS settings are the caller's concern)
    pub fn with_http(base: Url, http: reqwest::Client) -> Self {
        Self { http, base }
    }

    fn endpoint(&self, path: &str, token: &str) -> AgentResult<Url> {
        let mut url = self
            .base
            .join(path)
            .map_err(|e| AgentError::command_failed(path, format!("bad endpoint: {e}")))?;
        url.query_pairs_mut().clear().append_pair("api_token", token);
        Ok(url)
    }

    async fn post(&self, command: &'static str, url: Url, body: Option<Value>) -> AgentResult<()> {
        let mut request = self.http.post(url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        tracing::debug!(command, "issuing provider command");
        match request.send().await {
            Ok(response) if response.status().is_success() => Ok(()),
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                let detail = body.trim();
                let reason = if detail.is_empty() {
                    status.to_string()
                } else {
                    format!("{status}: {detail}")
                };
                Err(AgentError::command_failed(command, reason))
            }
            Err(err) => Err(AgentError::command_failed(command, err.to_string())),
        }
    }
}

#[async_trait]
impl CommandClient for HttpCommandClient {
    async fn login(&self, token: &str, campaign_id: &str) -> AgentResult<()> {
        let url = self.endpoint("api/v1/agent/login", token)?;
        self.post(
            "login",
            url,
            Some(json!({ "campaign": campaign_id, "mode": "manual" })),
        )
        .await
    }

    async fn dial(&self, token: &str, phone_number: &str) -> AgentResult<()> {
        let url = self.endpoint("api/v1/agent/manual_call/dial", token)?;
        self.post("dial", url, Some(json!({ "phone": phone_number })))
            .await
    }

    async fn hangup(&self, token: &str, call_id: &str) -> AgentResult<()> {
        let url = self.endpoint(&format!("api/v1/agent/call/{call_id}/hangup"), token)?;
        self.post("hangup", url, None).await
    }

    async fn qualify(
        &self,
        token: &str,
        telephony_id: &str,
        qualification_id: QualificationId,
    ) -> AgentResult<()> {
        let url = self.endpoint(
            &format!("api/v1/agent/manual_call/{telephony_id}/qualify"),
            token,
        )?;
        self.post(
            "qualify",
            url,
            Some(json!({ "qualification_id": qualification_id })),
        )
        .await
    }

    async fn list_campaigns(&self, token: &str) -> AgentResult<Vec<CampaignEntry>> {
        let url = self.endpoint("api/v1/groups-and-campaigns", token)?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AgentError::command_failed("list_campaigns", e.to_string()))?;
        if !response.status().is_success() {
            return Err(AgentError::command_failed(
                "list_campaigns",
                response.status().to_string(),
            ));
        }
        let value: Value = response
            .json()
            .await
            .map_err(|e| AgentError::command_failed("list_campaigns", e.to_string()))?;
        Ok(parse_campaign_listing(&value))
    }
}

/// Extract campaign entries from the listing response, which comes either as
/// a bare array or wrapped in a `data` envelope depending on the provider
/// version. Malformed entries are skipped.
fn parse_campaign_listing(value: &Value) -> Vec<CampaignEntry> {
    let entries = value
        .as_array()
        .or_else(|| value.get("data").and_then(Value::as_array));
    let Some(entries) = entries else {
        tracing::warn!("campaign listing had an unexpected shape");
        return Vec::new();
    };
    entries.iter().filter_map(parse_campaign_entry).collect()
}

fn parse_campaign_entry(entry: &Value) -> Option<CampaignEntry> {
    let id = match entry.get("id")? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    Some(CampaignEntry {
        id,
        name: entry
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        kind: entry
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    })
}
