//! vLLM persona endpoint tests

use serde_json::{json, Value};

use super::common::*;
use openmockllm::personas::Persona;

#[tokio::test]
async fn test_chat_completion_basic() {
    let server = TestServer::spawn(Persona::Vllm).await;

    let response = server
        .post(
            "/v1/chat/completions",
            chat_request("openmockllm", "Hello!", None, false),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["object"], "chat.completion");
    assert_eq!(body["choices"][0]["message"]["role"], "assistant");
    assert_eq!(body["choices"][0]["finish_reason"], "stop");

    let content = body["choices"][0]["message"]["content"].as_str().unwrap();
    assert!(!content.is_empty());

    assert!(body["usage"]["prompt_tokens"].as_u64().unwrap() >= 1);
    assert!(body["usage"]["completion_tokens"].as_u64().unwrap() >= 1);
    assert_eq!(
        body["usage"]["total_tokens"].as_u64().unwrap(),
        body["usage"]["prompt_tokens"].as_u64().unwrap()
            + body["usage"]["completion_tokens"].as_u64().unwrap()
    );
}

#[tokio::test]
async fn test_chat_completion_without_model_field() {
    let server = TestServer::spawn(Persona::Vllm).await;

    let response = server
        .post(
            "/v1/chat/completions",
            json!({"messages": [{"role": "user", "content": "Hi"}]}),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn test_model_mismatch_is_404() {
    let server = TestServer::spawn(Persona::Vllm).await;

    let response = server
        .post(
            "/v1/chat/completions",
            chat_request("gpt-4", "Hello!", None, false),
        )
        .await;
    assert_eq!(response.status().as_u16(), 404);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], "model_not_found");
}

#[tokio::test]
async fn test_context_too_long_is_400() {
    let mut config = fast_config(Persona::Vllm);
    config.model.max_context_tokens = 40;
    let server = TestServer::spawn_with_config(config).await;

    let long_prompt = "many words ".repeat(100);
    let response = server
        .post(
            "/v1/chat/completions",
            chat_request("openmockllm", &long_prompt, Some(10), false),
        )
        .await;
    assert_eq!(response.status().as_u16(), 400);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["type"], "context_length_exceeded");
}

#[tokio::test]
async fn test_multipart_message_content() {
    let server = TestServer::spawn(Persona::Vllm).await;

    let response = server
        .post(
            "/v1/chat/completions",
            json!({
                "model": "openmockllm",
                "messages": [{
                    "role": "user",
                    "content": [
                        {"type": "text", "text": "Describe "},
                        {"type": "image_url"},
                        {"type": "text", "text": "this image"}
                    ]
                }]
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn test_embeddings_shape() {
    let server = TestServer::spawn(Persona::Vllm).await;

    let response = server
        .post(
            "/v1/embeddings",
            json!({"model": "openmockllm", "input": ["first", "second"]}),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["object"], "list");

    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["index"], 0);
    assert_eq!(data[1]["index"], 1);
    assert_eq!(data[0]["embedding"].as_array().unwrap().len(), 1024);
    assert!(body["usage"]["prompt_tokens"].as_u64().unwrap() >= 2);
}

#[tokio::test]
async fn test_embeddings_custom_dimensions_and_base64() {
    let server = TestServer::spawn(Persona::Vllm).await;

    let response = server
        .post(
            "/v1/embeddings",
            json!({
                "input": "encode me",
                "dimensions": 64,
                "encoding_format": "base64"
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);

    let body: Value = response.json().await.unwrap();
    let encoded = body["data"][0]["embedding"].as_str().unwrap();

    // 64 little-endian f32 values = 256 bytes
    use base64::Engine as _;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .unwrap();
    assert_eq!(bytes.len(), 64 * 4);
}

#[tokio::test]
async fn test_models_listing() {
    let server = TestServer::spawn(Persona::Vllm).await;

    let response = server.get("/v1/models").await;
    assert_eq!(response.status().as_u16(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"][0]["id"], "openmockllm");

    let response = server.get("/v1/models/openmockllm").await;
    assert_eq!(response.status().as_u16(), 200);

    let response = server.get("/v1/models/other-model").await;
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn test_health_and_version() {
    let server = TestServer::spawn(Persona::Vllm).await;

    assert_eq!(server.get("/health").await.status().as_u16(), 200);

    let version: Value = server.get("/version").await.json().await.unwrap();
    assert!(version["version"].as_str().is_some());
}

#[tokio::test]
async fn test_api_key_enforcement() {
    let mut config = fast_config(Persona::Vllm);
    config.security.api_key = Some("sk-secret".to_string());
    let server = TestServer::spawn_with_config(config).await;

    // Health stays open
    assert_eq!(server.get("/health").await.status().as_u16(), 200);

    // API routes need the key
    let denied = server
        .post(
            "/v1/chat/completions",
            chat_request("openmockllm", "Hi", None, false),
        )
        .await;
    assert_eq!(denied.status().as_u16(), 401);

    let allowed = server
        .client
        .post(server.url("/v1/chat/completions"))
        .bearer_auth("sk-secret")
        .json(&chat_request("openmockllm", "Hi", None, false))
        .send()
        .await
        .unwrap();
    assert_eq!(allowed.status().as_u16(), 200);
}

#[tokio::test]
async fn test_admin_stats_reflect_traffic() {
    let server = TestServer::spawn(Persona::Vllm).await;

    server
        .post(
            "/v1/chat/completions",
            chat_request("openmockllm", "One", Some(20), false),
        )
        .await;
    server
        .post(
            "/v1/chat/completions",
            chat_request("openmockllm", "Two", Some(20), false),
        )
        .await;

    let stats: Value = server.get("/admin/stats").await.json().await.unwrap();
    assert_eq!(stats["total_requests"].as_u64().unwrap(), 2);
    assert_eq!(stats["inflight_requests"].as_u64().unwrap(), 0);
    assert!(stats["total_completion_tokens"].as_u64().unwrap() > 0);
}
