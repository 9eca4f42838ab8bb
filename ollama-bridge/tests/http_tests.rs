//! End-to-end tests through the reqwest transport against a local mock server.

use std::time::Duration;

use futures::StreamExt;
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ollama_bridge::types::chat::{ChatMessage, ChatRequest};
use ollama_bridge::types::generate::GenerateRequest;
use ollama_bridge::{ClientConfig, Error, OllamaClient, Result};

fn client_for(server: &MockServer) -> Result<OllamaClient> {
    OllamaClient::builder().base_url(server.uri()).build()
}

fn ndjson(lines: &[Value]) -> String {
    lines
        .iter()
        .map(|line| format!("{}\n", line))
        .collect::<String>()
}

#[tokio::test]
async fn test_list_models_from_server() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"models": [{"name": "qwen3:latest"}]})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server)?;
    let models = client.list_models().await?;
    assert_eq!(models.len(), 1);
    assert_eq!(models[0].name, "qwen3:latest");

    let again = client.list_models().await?;
    assert_eq!(models, again);
    Ok(())
}

#[tokio::test]
async fn test_generate_stream_from_server() -> Result<()> {
    let server = MockServer::start().await;
    let body = ndjson(&[
        json!({"response": "Hel", "done": false}),
        json!({"response": "lo", "done": false}),
        json!({"response": "", "done": true}),
        json!({"response": "after done", "done": false}),
    ]);
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({"model": "qwen3", "stream": true})))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/x-ndjson"))
        .mount(&server)
        .await;

    let client = client_for(&server)?;
    let tokens = client
        .generate_stream(GenerateRequest::new("qwen3", "Say hello"))
        .await?
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .collect::<Result<Vec<_>>>()?;

    assert_eq!(tokens, vec!["Hel", "lo"]);
    Ok(())
}

#[tokio::test]
async fn test_generate_transmits_default_ceiling() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"response": "42", "done": true})),
        )
        .mount(&server)
        .await;

    let client = OllamaClient::builder()
        .config(ClientConfig {
            base_url: server.uri(),
            request_timeout: Duration::from_secs(5),
            max_tokens: 1024,
        })
        .build()?;

    assert_eq!(client.generate(GenerateRequest::new("qwen3", "a")).await?, "42");
    assert_eq!(
        client
            .generate(GenerateRequest::new("qwen3", "b").max_tokens(8))
            .await?,
        "42"
    );

    let received = server.received_requests().await.unwrap_or_default();
    let bodies = received
        .iter()
        .map(|r| serde_json::from_slice::<Value>(&r.body).unwrap())
        .collect::<Vec<_>>();
    assert_eq!(bodies.len(), 2);
    assert_eq!(bodies[0]["max_tokens"], json!(1024));
    assert_eq!(bodies[0]["stream"], json!(false));
    assert_eq!(bodies[1]["max_tokens"], json!(8));
    Ok(())
}

#[tokio::test]
async fn test_chat_500_is_service_unavailable() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal failure"))
        .mount(&server)
        .await;

    let client = client_for(&server)?;
    let err = client
        .chat(ChatRequest::new("qwen3").add_message(ChatMessage::user("Hi")))
        .await
        .unwrap_err();

    match err {
        Error::ServiceUnavailable(msg) => {
            assert!(msg.contains("HTTP 500"), "unexpected message: {}", msg);
            assert!(msg.contains("internal failure"));
        }
        other => panic!("Expected ServiceUnavailable, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_chat_stream_from_server() -> Result<()> {
    let server = MockServer::start().await;
    let body = ndjson(&[
        json!({"message": {"role": "assistant", "content": "Hi"}, "done": false}),
        json!({"message": {"role": "assistant", "content": "!"}, "done": false}),
        json!({"message": {"role": "assistant", "content": ""}, "done": true, "eval_count": 2}),
    ]);
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({"stream": true})))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/x-ndjson"))
        .mount(&server)
        .await;

    let client = client_for(&server)?;
    let events = client
        .chat_stream(ChatRequest::new("qwen3").add_message(ChatMessage::user("Hello")))
        .await?
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .collect::<Result<Vec<_>>>()?;

    assert_eq!(events.len(), 3);
    assert_eq!(events[1].content(), Some("!"));
    assert!(events[2].is_done());
    assert_eq!(events[2].get("eval_count"), Some(&json!(2)));
    Ok(())
}

#[tokio::test]
async fn test_non_json_body_is_malformed() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_string("definitely not json"))
        .mount(&server)
        .await;

    let client = client_for(&server)?;
    assert!(matches!(
        client.list_models().await,
        Err(Error::MalformedResponse(_))
    ));
    Ok(())
}

#[tokio::test]
async fn test_slow_server_times_out() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"models": []}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let timeout = Duration::from_millis(200);
    let client = OllamaClient::builder()
        .base_url(server.uri())
        .request_timeout(timeout)
        .build()?;

    match client.list_models().await {
        Err(Error::Timeout(d)) => assert_eq!(d, timeout),
        other => panic!("Expected Timeout, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_connection_refused_is_service_unavailable() -> Result<()> {
    // reserve a free port, then close it so nothing is listening
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .and_then(|listener| listener.local_addr())
        .expect("bind ephemeral port");

    let client = OllamaClient::builder()
        .base_url(format!("http://{}", addr))
        .request_timeout(Duration::from_secs(5))
        .build()?;

    match client.list_models().await {
        Err(Error::ServiceUnavailable(msg)) => {
            assert!(msg.contains(&addr.to_string()), "unexpected message: {}", msg);
        }
        other => panic!("Expected ServiceUnavailable, got {:?}", other),
    }
    Ok(())
}
