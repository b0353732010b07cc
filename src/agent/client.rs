// ABOUTME: Client for a Bedrock-style agent runtime — one POST per prompt, streamed reply.
// ABOUTME: Owns the session id; aggregates content fragments and optional trace records.

use futures::StreamExt;
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::agent::stream::{EventDecoder, StreamEvent};
use crate::error::{ChatError, Result};

/// The aggregated outcome of one agent invocation. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// All content fragments concatenated in arrival order.
    pub completion: String,
    /// The session id the invocation was issued under.
    pub session_id: String,
    /// Trace records in arrival order; `Some` iff tracing was requested.
    pub trace: Option<Vec<serde_json::Value>>,
}

/// Client for invoking a hosted agent and correlating calls into one session.
pub struct AgentClient {
    agent_id: String,
    agent_alias_id: String,
    session_id: String,
    endpoint: String,
    api_key: Option<String>,
    http: reqwest::Client,
}

impl AgentClient {
    /// Create a client bound to an agent, alias, and region, with a fresh session id.
    pub fn new(agent_id: &str, agent_alias_id: &str, region: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()?;
        Ok(Self {
            agent_id: agent_id.to_string(),
            agent_alias_id: agent_alias_id.to_string(),
            session_id: Uuid::new_v4().to_string(),
            endpoint: format!("https://bedrock-agent-runtime.{region}.amazonaws.com"),
            api_key: None,
            http,
        })
    }

    /// Use an externally supplied session id instead of a generated one.
    pub fn with_session_id(mut self, session_id: &str) -> Self {
        self.session_id = session_id.to_string();
        self
    }

    /// Override the runtime endpoint (gateways, tests).
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }

    /// Attach a static bearer API key to every request.
    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = Some(api_key.to_string());
        self
    }

    /// The active session id. No side effects.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Replace the session id with a freshly generated one and return it.
    ///
    /// Purely local: no request is made, and results from completed
    /// invocations keep the id they were issued under.
    pub fn rotate_session(&mut self) -> String {
        self.session_id = Uuid::new_v4().to_string();
        self.session_id.clone()
    }

    /// Send one prompt to the agent and aggregate its streamed reply.
    ///
    /// Exactly one request is issued per call; there is no retry. Content
    /// fragments are concatenated in arrival order. Trace records are
    /// collected only when `enable_trace` is set; otherwise the result's
    /// trace field is `None`.
    pub async fn invoke(
        &self,
        prompt: &str,
        enable_trace: bool,
        end_session: bool,
    ) -> Result<Invocation> {
        let url = format!(
            "{}/agents/{}/agentAliases/{}/sessions/{}/text",
            self.endpoint, self.agent_id, self.agent_alias_id, self.session_id
        );
        let body = serde_json::json!({
            "inputText": prompt,
            "enableTrace": enable_trace,
            "endSession": end_session,
        });

        debug!(session_id = %self.session_id, enable_trace, "invoking agent");

        let mut request = self.http.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(remote_error(status, &body));
        }

        let mut completion = String::new();
        let mut trace_records = Vec::new();
        let mut decoder = EventDecoder::new();
        let mut byte_stream = response.bytes_stream();

        while let Some(chunk) = byte_stream.next().await {
            let chunk = chunk?;
            for event in decoder.feed(&chunk)? {
                collect(event, enable_trace, &mut completion, &mut trace_records);
            }
        }
        for event in decoder.finish()? {
            collect(event, enable_trace, &mut completion, &mut trace_records);
        }

        debug!(
            session_id = %self.session_id,
            completion_len = completion.len(),
            trace_records = trace_records.len(),
            "invocation complete"
        );

        Ok(Invocation {
            completion,
            session_id: self.session_id.clone(),
            trace: enable_trace.then_some(trace_records),
        })
    }
}

/// Fold one stream event into the aggregation state.
fn collect(
    event: StreamEvent,
    enable_trace: bool,
    completion: &mut String,
    trace_records: &mut Vec<serde_json::Value>,
) {
    match event {
        StreamEvent::Chunk(text) => completion.push_str(&text),
        StreamEvent::Trace(value) => {
            if enable_trace {
                trace_records.push(value);
            } else {
                warn!("agent sent a trace record although tracing was not requested");
            }
        }
    }
}

/// Error body shape the runtime uses for failed invocations.
#[derive(Debug, Deserialize)]
struct WireError {
    #[serde(alias = "__type", alias = "code")]
    error_code: Option<String>,
    message: Option<String>,
}

/// Map a non-success response to an invocation error carrying the remote code.
fn remote_error(status: reqwest::StatusCode, body: &str) -> ChatError {
    let parsed: WireError = serde_json::from_str(body).unwrap_or(WireError {
        error_code: None,
        message: None,
    });
    let code = parsed
        .error_code
        .unwrap_or_else(|| status.as_u16().to_string());
    let message = parsed.message.unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("remote call failed")
            .to_string()
    });
    ChatError::invocation(code, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_client_generates_a_session_id() {
        let client = AgentClient::new("AGENT123", "TSTALIASID", "us-west-2").unwrap();
        assert!(!client.session_id().is_empty());
    }

    #[test]
    fn supplied_session_id_is_used_verbatim() {
        let client = AgentClient::new("AGENT123", "TSTALIASID", "us-west-2")
            .unwrap()
            .with_session_id("custom-session-id");
        assert_eq!(client.session_id(), "custom-session-id");
    }

    #[test]
    fn rotate_session_changes_the_id_locally() {
        let mut client = AgentClient::new("AGENT123", "TSTALIASID", "us-west-2").unwrap();
        let before = client.session_id().to_string();
        let rotated = client.rotate_session();
        assert_ne!(rotated, before);
        assert_eq!(client.session_id(), rotated);
    }

    #[test]
    fn endpoint_defaults_to_region_and_is_overridable() {
        let client = AgentClient::new("AGENT123", "TSTALIASID", "eu-central-1").unwrap();
        assert_eq!(
            client.endpoint,
            "https://bedrock-agent-runtime.eu-central-1.amazonaws.com"
        );

        let client = client.with_endpoint("http://localhost:9999/");
        assert_eq!(client.endpoint, "http://localhost:9999");
    }

    #[test]
    fn remote_error_prefers_body_code_and_message() {
        let err = remote_error(
            reqwest::StatusCode::FORBIDDEN,
            r#"{"__type":"AccessDeniedException","message":"Access denied"}"#,
        );
        match err {
            ChatError::Invocation { code, message } => {
                assert_eq!(code, "AccessDeniedException");
                assert_eq!(message, "Access denied");
            }
            other => panic!("expected Invocation, got {other:?}"),
        }
    }

    #[test]
    fn remote_error_falls_back_to_status() {
        let err = remote_error(reqwest::StatusCode::SERVICE_UNAVAILABLE, "not json");
        match err {
            ChatError::Invocation { code, .. } => assert_eq!(code, "503"),
            other => panic!("expected Invocation, got {other:?}"),
        }
    }
}
