use std::time::Duration;

use askme_core::{
    ChatEngine, ChatMessage, ChatRole, EngineConfig, ExchangeError, OpenAIClient, SubmitOutcome,
};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "test_key";

fn engine_for(server: &MockServer) -> ChatEngine {
    let config = EngineConfig::new(API_KEY)
        .with_endpoint(format!("{}/v1/chat/completions", server.uri()));
    ChatEngine::new(OpenAIClient::new(config).unwrap())
}

fn reply(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [
            { "index": 0, "message": { "role": "assistant", "content": content }, "finish_reason": "stop" }
        ]
    }))
}

#[tokio::test]
async fn test_reply_is_compiled_and_appended() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer test_key"))
        .and(body_json(json!({
            "model": "gpt-4o-mini",
            "messages": [{ "role": "user", "content": "Hi" }]
        })))
        .respond_with(reply("**Hello!**"))
        .expect(1)
        .mount(&server)
        .await;

    let engine = engine_for(&server);
    let outcome = engine.submit("Hi").await;

    let expected = ChatMessage::assistant("<ul><p><strong>Hello!</strong></p></ul>");
    assert_eq!(outcome, SubmitOutcome::Replied(expected.clone()));
    assert_eq!(engine.history(), vec![ChatMessage::user("Hi"), expected]);
    assert!(!engine.is_pending());
    assert_eq!(engine.last_error(), None);
}

#[tokio::test]
async fn test_pending_while_in_flight_and_busy_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(reply("done").set_delay(Duration::from_millis(500)))
        .expect(1)
        .mount(&server)
        .await;

    let engine = engine_for(&server);
    let background = engine.clone();
    let task = tokio::spawn(async move { background.submit("Hi").await });

    while !engine.is_pending() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(engine.history(), vec![ChatMessage::user("Hi")]);

    assert_eq!(engine.submit("again").await, SubmitOutcome::Busy);
    assert_eq!(engine.history().len(), 1);

    let outcome = task.await.unwrap();
    assert!(matches!(outcome, SubmitOutcome::Replied(_)));
    assert!(!engine.is_pending());
    assert_eq!(engine.history().len(), 2);
}

#[tokio::test]
async fn test_unauthorized_without_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let engine = engine_for(&server);
    let outcome = engine.submit("Hi").await;

    assert_eq!(
        outcome,
        SubmitOutcome::Failed(ExchangeError::Server {
            status: 401,
            message: "Unauthorized".to_string(),
        })
    );
    assert_eq!(engine.last_error().as_deref(), Some("Status: 401 - Unauthorized"));
    assert_eq!(engine.history(), vec![ChatMessage::user("Hi")]);
    assert!(!engine.is_pending());
}

#[tokio::test]
async fn test_server_message_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": { "message": "Rate limit reached", "type": "requests" }
        })))
        .mount(&server)
        .await;

    let engine = engine_for(&server);
    engine.submit("Hi").await;

    assert_eq!(engine.last_error().as_deref(), Some("Status: 429 - Rate limit reached"));
}

#[tokio::test]
async fn test_no_response_when_nothing_listens() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let config = EngineConfig::new(API_KEY)
        .with_endpoint(format!("http://127.0.0.1:{port}/v1/chat/completions"));
    let engine = ChatEngine::new(OpenAIClient::new(config).unwrap());

    let outcome = engine.submit("Hi").await;

    assert_eq!(outcome, SubmitOutcome::Failed(ExchangeError::NoResponse));
    assert_eq!(
        engine.last_error().as_deref(),
        Some("Error: No response received from the server.")
    );
    assert_eq!(engine.history().len(), 1);
}

#[tokio::test]
async fn test_empty_choices_is_setup_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let engine = engine_for(&server);
    let outcome = engine.submit("Hi").await;

    assert_eq!(
        outcome,
        SubmitOutcome::Failed(ExchangeError::RequestSetup(
            "reply contained no choices".to_string()
        ))
    );
    assert_eq!(engine.history().len(), 1);
}

#[tokio::test]
async fn test_non_json_success_is_setup_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let engine = engine_for(&server);
    let outcome = engine.submit("Hi").await;

    assert!(matches!(outcome, SubmitOutcome::Failed(ExchangeError::RequestSetup(_))));
    assert!(engine.last_error().unwrap().starts_with("Error: "));
}

#[tokio::test]
async fn test_success_clears_previous_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(reply("- ok"))
        .mount(&server)
        .await;

    let engine = engine_for(&server);

    engine.submit("first").await;
    assert_eq!(
        engine.last_error().as_deref(),
        Some("Status: 500 - Internal Server Error")
    );

    engine.submit("second").await;
    assert_eq!(engine.last_error(), None);

    let roles: Vec<ChatRole> = engine.history().iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![ChatRole::User, ChatRole::User, ChatRole::Assistant]);
    assert_eq!(engine.history()[2].content, "<ul><li>ok</li></ul>");
}

#[tokio::test]
async fn test_history_is_sent_as_context() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(reply("1. one"))
        .mount(&server)
        .await;

    let engine = engine_for(&server);
    engine.submit("count").await;
    engine.submit("more").await;

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);

    let second: Value = requests[1].body_json().unwrap();
    assert_eq!(
        second["messages"],
        json!([
            { "role": "user", "content": "count" },
            { "role": "assistant", "content": "<ul><li>one</li></ul>" },
            { "role": "user", "content": "more" }
        ])
    );
}

#[tokio::test]
async fn test_connect_timeout_is_no_response() {
    // Non-routable address: the connect either hangs until the timeout or is refused
    let config = EngineConfig::new(API_KEY)
        .with_endpoint("http://10.255.255.1:81/v1/chat/completions")
        .with_connect_timeout(Duration::from_millis(200));
    let engine = ChatEngine::new(OpenAIClient::new(config).unwrap());

    let outcome = tokio::time::timeout(Duration::from_secs(10), engine.submit("Hi"))
        .await
        .unwrap();

    assert_eq!(outcome, SubmitOutcome::Failed(ExchangeError::NoResponse));
    assert!(!engine.is_pending());
    assert_eq!(engine.history(), vec![ChatMessage::user("Hi")]);
}
