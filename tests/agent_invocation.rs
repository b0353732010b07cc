// ABOUTME: Integration tests for AgentClient against a mock agent runtime.
// ABOUTME: Verifies aggregation, trace tri-state, error mapping, and session continuity.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bedrock_agent_chat::agent::AgentClient;
use bedrock_agent_chat::error::ChatError;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Build a reply-stream body from content fragments and trace payloads.
fn event_body(fragments: &[&str], traces: &[serde_json::Value]) -> String {
    let mut body = String::new();
    for fragment in fragments {
        body.push_str(&format!(
            "{{\"chunk\":{{\"bytes\":\"{}\"}}}}\n",
            BASE64.encode(fragment)
        ));
    }
    for trace in traces {
        body.push_str(&format!("{{\"trace\":{trace}}}\n"));
    }
    body
}

fn client_for(server: &MockServer) -> AgentClient {
    AgentClient::new("AGENT123", "TSTALIASID", "us-west-2")
        .unwrap()
        .with_endpoint(&server.uri())
}

#[tokio::test]
async fn aggregates_fragments_in_arrival_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(
            r"^/agents/AGENT123/agentAliases/TSTALIASID/sessions/[^/]+/text$",
        ))
        .and(body_partial_json(json!({
            "inputText": "Hello",
            "enableTrace": false,
            "endSession": false,
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(event_body(&["Hel", "lo Wor", "ld!"], &[])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let invocation = client.invoke("Hello", false, false).await.unwrap();

    assert_eq!(invocation.completion, "Hello World!");
    assert_eq!(invocation.session_id, client.session_id());
    assert!(invocation.trace.is_none());
}

#[tokio::test]
async fn fragment_boundaries_do_not_change_the_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"/sessions/whole/text$"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(event_body(&["Hello World!"], &[])),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path_regex(r"/sessions/split/text$"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(event_body(&["Hello", " ", "World!"], &[])),
        )
        .mount(&server)
        .await;

    let whole = client_for(&server)
        .with_session_id("whole")
        .invoke("hi", false, false)
        .await
        .unwrap();
    let split = client_for(&server)
        .with_session_id("split")
        .invoke("hi", false, false)
        .await
        .unwrap();

    assert_eq!(whole.completion, split.completion);
}

#[tokio::test]
async fn trace_is_collected_when_requested() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"enableTrace": true})))
        .respond_with(ResponseTemplate::new(200).set_body_string(event_body(
            &["Response"],
            &[json!({"traceId": "test-trace"})],
        )))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let invocation = client.invoke("Test", true, false).await.unwrap();

    assert_eq!(invocation.completion, "Response");
    let trace = invocation.trace.expect("trace requested");
    assert_eq!(trace.len(), 1);
    assert_eq!(trace[0], json!({"traceId": "test-trace"}));
}

#[tokio::test]
async fn trace_is_present_but_empty_when_requested_without_events() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(event_body(&["ok"], &[])))
        .mount(&server)
        .await;

    let invocation = client_for(&server).invoke("Test", true, false).await.unwrap();
    assert_eq!(invocation.trace, Some(vec![]));
}

#[tokio::test]
async fn trace_is_absent_when_not_requested() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(event_body(
            &["ok"],
            &[json!({"traceId": "unsolicited"})],
        )))
        .mount(&server)
        .await;

    let invocation = client_for(&server).invoke("Test", false, false).await.unwrap();
    assert!(invocation.trace.is_none());
}

#[tokio::test]
async fn remote_failure_carries_the_error_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "__type": "AccessDeniedException",
            "message": "Access denied",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .invoke("Test", false, false)
        .await
        .unwrap_err();

    assert!(err.to_string().starts_with("failed to invoke agent"));
    match err {
        ChatError::Invocation { code, message } => {
            assert_eq!(code, "AccessDeniedException");
            assert_eq!(message, "Access denied");
        }
        other => panic!("expected Invocation, got {other:?}"),
    }
}

#[tokio::test]
async fn session_survives_a_failed_invocation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"/sessions/sticky-session/text$"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path_regex(r"/sessions/sticky-session/text$"))
        .respond_with(ResponseTemplate::new(200).set_body_string(event_body(&["recovered"], &[])))
        .mount(&server)
        .await;

    let client = client_for(&server).with_session_id("sticky-session");

    assert!(client.invoke("first", false, false).await.is_err());
    assert_eq!(client.session_id(), "sticky-session");

    let invocation = client.invoke("second", false, false).await.unwrap();
    assert_eq!(invocation.completion, "recovered");
    assert_eq!(invocation.session_id, "sticky-session");
}

#[tokio::test]
async fn rotated_session_id_is_used_on_the_next_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"/sessions/[0-9a-f-]{36}/text$"))
        .respond_with(ResponseTemplate::new(200).set_body_string(event_body(&["ok"], &[])))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = client_for(&server).with_session_id("not-a-uuid");
    let rotated = client.rotate_session();
    assert_ne!(rotated, "not-a-uuid");

    let invocation = client.invoke("hi", false, false).await.unwrap();
    assert_eq!(invocation.session_id, rotated);
}
