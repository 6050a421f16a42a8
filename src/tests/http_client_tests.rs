use serde_json::json;
use std::time::Duration;

use super::test_server::TestServer;
use crate::rewriter::{
    Backend, ChatClient, ChatPrompt, Endpoint, HttpChatClient, RewriteError, RewriteOutcome,
    Rewriter, Tone,
};
use crate::settings::Settings;

fn endpoint(server: &TestServer) -> Endpoint {
    Endpoint {
        base_url: format!("{}/v1", server.url()),
        model: "test-model".to_string(),
        api_key: "sk-test".to_string(),
    }
}

fn prompt() -> ChatPrompt {
    ChatPrompt {
        system: "system text".to_string(),
        user: "user text".to_string(),
        temperature: 0.5,
    }
}

#[tokio::test]
async fn test_successful_completion_sends_expected_request() {
    let server = TestServer::chat_completion("  Rewritten text  ").await;
    let client = HttpChatClient::new().unwrap();

    let content = client.complete(&endpoint(&server), &prompt()).await.unwrap();
    assert_eq!(content, "Rewritten text");

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.method, "POST");
    assert_eq!(request.path, "/v1/chat/completions");
    assert_eq!(request.authorization.as_deref(), Some("Bearer sk-test"));

    let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
    assert_eq!(body["model"], "test-model");
    assert_eq!(body["temperature"], 0.5);
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][0]["content"], "system text");
    assert_eq!(body["messages"][1]["role"], "user");
    assert_eq!(body["messages"][1]["content"], "user text");
}

#[tokio::test]
async fn test_api_error_message_is_extracted_from_json_body() {
    let server = TestServer::json(
        401,
        json!({ "error": { "message": "Invalid API Key", "type": "invalid_request_error" } }),
    )
    .await;
    let client = HttpChatClient::new().unwrap();

    match client.complete(&endpoint(&server), &prompt()).await {
        Err(RewriteError::Api { status, message }) => {
            assert_eq!(status, 401);
            assert_eq!(message, "Invalid API Key");
        }
        other => panic!("expected api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_api_error_with_plain_text_body() {
    let server = TestServer::start(500, "text/plain", "upstream exploded".to_string()).await;
    let client = HttpChatClient::new().unwrap();

    match client.complete(&endpoint(&server), &prompt()).await {
        Err(RewriteError::Api { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "upstream exploded");
        }
        other => panic!("expected api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_api_error_with_empty_body_uses_status_reason() {
    let server = TestServer::start(429, "text/plain", String::new()).await;
    let client = HttpChatClient::new().unwrap();

    match client.complete(&endpoint(&server), &prompt()).await {
        Err(RewriteError::Api { status, message }) => {
            assert_eq!(status, 429);
            assert_eq!(message, "Too Many Requests");
        }
        other => panic!("expected api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_no_choices_is_empty_response() {
    let server = TestServer::json(200, json!({ "choices": [] })).await;
    let client = HttpChatClient::new().unwrap();

    let result = client.complete(&endpoint(&server), &prompt()).await;
    assert!(matches!(result, Err(RewriteError::EmptyResponse)));
}

#[tokio::test]
async fn test_null_content_is_empty_response() {
    let server = TestServer::json(
        200,
        json!({ "choices": [{ "message": { "role": "assistant", "content": null } }] }),
    )
    .await;
    let client = HttpChatClient::new().unwrap();

    let result = client.complete(&endpoint(&server), &prompt()).await;
    assert!(matches!(result, Err(RewriteError::EmptyResponse)));
}

#[tokio::test]
async fn test_non_json_success_body_is_malformed() {
    let server = TestServer::start(200, "text/html", "<html>oops</html>".to_string()).await;
    let client = HttpChatClient::new().unwrap();

    let result = client.complete(&endpoint(&server), &prompt()).await;
    assert!(matches!(result, Err(RewriteError::MalformedResponse(_))));
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = HttpChatClient::with_timeout(Duration::from_secs(2)).unwrap();
    let endpoint = Endpoint {
        base_url: format!("http://{}/v1", addr),
        model: "m".to_string(),
        api_key: "k".to_string(),
    };

    let result = client.complete(&endpoint, &prompt()).await;
    assert!(matches!(result, Err(RewriteError::Transport(_))));
}

#[tokio::test]
async fn test_full_pipeline_over_http() {
    let server = TestServer::chat_completion(
        "First option.\n---ALTERNATIVE---\nSecond option.\n---ALTERNATIVE---\nThird option.",
    )
    .await;

    let mut settings = Settings::default();
    settings.api_keys.set(Backend::OpenAi, Some("sk-pipeline".to_string()));
    settings.temperature = 0.3;

    let rewriter = Rewriter::new(HttpChatClient::new().unwrap(), settings)
        .with_base_url(Backend::OpenAi, format!("{}/v1", server.url()));

    let outcome = rewriter
        .rewrite_text("some text to fix", Tone::parse("concise"), 3, Backend::OpenAi)
        .await;

    assert_eq!(
        outcome,
        RewriteOutcome::Alternatives(vec![
            "First option.".to_string(),
            "Second option.".to_string(),
            "Third option.".to_string(),
        ])
    );

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].authorization.as_deref(), Some("Bearer sk-pipeline"));
    let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(body["model"], "gpt-4");
    assert!(body["messages"][1]["content"]
        .as_str()
        .unwrap()
        .contains("some text to fix"));
}

#[tokio::test]
async fn test_full_pipeline_reports_api_failure_as_single_string() {
    let server = TestServer::json(
        403,
        json!({ "error": { "message": "Model access denied" } }),
    )
    .await;

    let mut settings = Settings::default();
    settings.api_keys.set(Backend::Groq, Some("gsk-x".to_string()));
    let rewriter = Rewriter::new(HttpChatClient::new().unwrap(), settings)
        .with_base_url(Backend::Groq, server.url());

    let outcome = rewriter
        .rewrite_text("text", Tone::default(), 3, Backend::Groq)
        .await;

    assert_eq!(
        outcome.into_choices(),
        vec!["Error: API returned 403: Model access denied".to_string()]
    );
}
