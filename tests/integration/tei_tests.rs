//! TEI persona endpoint tests

use serde_json::{json, Value};

use super::common::*;
use openmockllm::personas::Persona;

#[tokio::test]
async fn test_embeddings_single_input() {
    let server = TestServer::spawn(Persona::Tei).await;

    let response = server
        .post("/v1/embeddings", json!({"input": "embed this"}))
        .await;
    assert_eq!(response.status().as_u16(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["object"], "list");
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["embedding"].as_array().unwrap().len(), 1024);

    // TEI reports zero usage for mock embeddings
    assert_eq!(body["usage"]["prompt_tokens"], 0);
    assert_eq!(body["usage"]["total_tokens"], 0);
}

#[tokio::test]
async fn test_embeddings_batch() {
    let server = TestServer::spawn(Persona::Tei).await;

    let inputs: Vec<String> = (0..8).map(|i| format!("text {}", i)).collect();
    let response = server.post("/v1/embeddings", json!({ "input": inputs })).await;
    assert_eq!(response.status().as_u16(), 200);

    let body: Value = response.json().await.unwrap();
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 8);
    for (i, item) in data.iter().enumerate() {
        assert_eq!(item["index"].as_u64().unwrap() as usize, i);
    }
}

#[tokio::test]
async fn test_empty_batch_is_400() {
    let server = TestServer::spawn(Persona::Tei).await;

    let response = server
        .post("/v1/embeddings", json!({"input": []}))
        .await;
    assert_eq!(response.status().as_u16(), 400);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error_type"], "empty");
}

#[tokio::test]
async fn test_oversized_batch_is_413() {
    let mut config = fast_config(Persona::Tei);
    config.model.max_client_batch_size = 4;
    let server = TestServer::spawn_with_config(config).await;

    let inputs: Vec<String> = (0..5).map(|i| format!("text {}", i)).collect();
    let response = server.post("/v1/embeddings", json!({ "input": inputs })).await;
    assert_eq!(response.status().as_u16(), 413);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error_type"], "validation");
}

#[tokio::test]
async fn test_rerank_scores_sorted() {
    let server = TestServer::spawn(Persona::Tei).await;

    let response = server
        .post(
            "/rerank",
            json!({
                "query": "what is rust",
                "texts": ["alpha", "beta", "gamma", "delta"]
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);

    let ranks: Vec<Value> = response.json().await.unwrap();
    assert_eq!(ranks.len(), 4);

    let scores: Vec<f64> = ranks.iter().map(|r| r["score"].as_f64().unwrap()).collect();
    for window in scores.windows(2) {
        assert!(window[0] >= window[1]);
    }

    // Text omitted unless requested
    assert!(ranks[0].get("text").is_none());
}

#[tokio::test]
async fn test_rerank_return_text() {
    let server = TestServer::spawn(Persona::Tei).await;

    let response = server
        .post(
            "/rerank",
            json!({
                "query": "q",
                "texts": ["only one"],
                "return_text": true
            }),
        )
        .await;

    let ranks: Vec<Value> = response.json().await.unwrap();
    assert_eq!(ranks[0]["text"], "only one");
    assert_eq!(ranks[0]["index"], 0);
}

#[tokio::test]
async fn test_rerank_empty_batch() {
    let server = TestServer::spawn(Persona::Tei).await;

    let response = server
        .post("/rerank", json!({"query": "q", "texts": []}))
        .await;
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn test_info_card() {
    let mut config = fast_config(Persona::Tei);
    config.model.name = "bge-large-en-v1.5".to_string();
    config.model.max_client_batch_size = 16;
    let server = TestServer::spawn_with_config(config).await;

    let body: Value = server.get("/info").await.json().await.unwrap();
    assert_eq!(body["model_id"], "bge-large-en-v1.5");
    assert_eq!(body["model_dtype"], "float16");
    assert_eq!(body["model_type"]["embedding"]["pooling"], "cls");
    assert_eq!(body["max_client_batch_size"], 16);
}

#[tokio::test]
async fn test_health_is_plain_200() {
    let server = TestServer::spawn(Persona::Tei).await;
    let response = server.get("/health").await;
    assert_eq!(response.status().as_u16(), 200);
}
