//! Streaming endpoint integration tests

use serde_json::Value;

use super::common::*;
use openmockllm::personas::Persona;

#[tokio::test]
async fn test_vllm_streaming_is_sse() {
    let server = TestServer::spawn(Persona::Vllm).await;

    let response = server
        .post(
            "/v1/chat/completions",
            chat_request("openmockllm", "Stream it", Some(50), true),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);

    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(content_type.contains("text/event-stream"));
}

#[tokio::test]
async fn test_vllm_stream_chunk_sequence() {
    let server = TestServer::spawn(Persona::Vllm).await;

    let response = server
        .post(
            "/v1/chat/completions",
            chat_request("openmockllm", "Stream it", Some(60), true),
        )
        .await;
    let body = response.text().await.unwrap();
    let data = sse_data_lines(&body);

    // Terminated by the sentinel, with nothing after it
    assert_eq!(data.last().map(String::as_str), Some("[DONE]"));
    assert_eq!(data.iter().filter(|d| *d == "[DONE]").count(), 1);

    let chunks: Vec<Value> = data
        .iter()
        .filter(|d| *d != "[DONE]")
        .map(|d| serde_json::from_str(d).unwrap())
        .collect();
    assert!(chunks.len() >= 3, "expected role + content + finish chunks");

    // First chunk announces the assistant role
    assert_eq!(chunks[0]["choices"][0]["delta"]["role"], "assistant");

    // Exactly one finish chunk, and it is the last JSON chunk
    let finishes: Vec<usize> = chunks
        .iter()
        .enumerate()
        .filter(|(_, c)| !c["choices"][0]["finish_reason"].is_null())
        .map(|(i, _)| i)
        .collect();
    assert_eq!(finishes, vec![chunks.len() - 1]);
    assert_eq!(chunks[chunks.len() - 1]["choices"][0]["finish_reason"], "stop");

    // All chunks share the same id and object type
    for chunk in &chunks {
        assert_eq!(chunk["object"], "chat.completion.chunk");
        assert_eq!(chunk["id"], chunks[0]["id"]);
    }
}

#[tokio::test]
async fn test_stream_content_matches_unary() {
    // Same seed, fresh server per branch: content is decided before
    // streaming begins, so both branches produce identical text.
    let mut config = fast_config(Persona::Vllm);
    config.seed = Some(1234);

    let unary_server = TestServer::spawn_with_config(config.clone()).await;
    let unary: Value = unary_server
        .post(
            "/v1/chat/completions",
            chat_request("openmockllm", "Compare branches", Some(80), false),
        )
        .await
        .json()
        .await
        .unwrap();
    let unary_text = unary["choices"][0]["message"]["content"]
        .as_str()
        .unwrap()
        .to_string();

    let stream_server = TestServer::spawn_with_config(config).await;
    let body = stream_server
        .post(
            "/v1/chat/completions",
            chat_request("openmockllm", "Compare branches", Some(80), true),
        )
        .await
        .text()
        .await
        .unwrap();

    let streamed = sse_content(&sse_data_lines(&body));
    assert_eq!(streamed, unary_text);
}

#[tokio::test]
async fn test_mistral_streaming() {
    let server = TestServer::spawn(Persona::Mistral).await;

    let response = server
        .post(
            "/v1/chat/completions",
            chat_request("openmockllm", "Stream en français", Some(40), true),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);

    let body = response.text().await.unwrap();
    let data = sse_data_lines(&body);

    assert_eq!(data.last().map(String::as_str), Some("[DONE]"));

    let first: Value = serde_json::from_str(&data[0]).unwrap();
    assert_eq!(first["choices"][0]["delta"]["role"], "assistant");

    assert!(!sse_content(&data).is_empty());
}

#[tokio::test]
async fn test_streaming_context_too_long_fails_before_chunks() {
    let mut config = fast_config(Persona::Vllm);
    config.model.max_context_tokens = 10;
    let server = TestServer::spawn_with_config(config).await;

    let response = server
        .post(
            "/v1/chat/completions",
            chat_request("openmockllm", &"long prompt ".repeat(50), None, true),
        )
        .await;

    // The violation is reported as a plain error response, not a stream
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["type"], "context_length_exceeded");
}

#[tokio::test]
async fn test_stream_with_latency_paces_chunks() {
    let mut config = fast_config(Persona::Vllm);
    config.timing.enabled = true;
    config.timing.reference_ttft = 0.02;
    config.timing.reference_tokens_per_second = 2000.0;
    let server = TestServer::spawn_with_config(config).await;

    let start = std::time::Instant::now();
    let response = server
        .post(
            "/v1/chat/completions",
            chat_request("openmockllm", "Paced", Some(30), true),
        )
        .await;
    let body = response.text().await.unwrap();
    let elapsed = start.elapsed();

    assert_eq!(
        sse_data_lines(&body).last().map(String::as_str),
        Some("[DONE]")
    );
    // At least the TTFT must have elapsed
    assert!(elapsed >= std::time::Duration::from_millis(1));
}
