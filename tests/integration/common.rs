//! Common test utilities for integration tests
//!
//! Provides test server spawning, request builders, and assertions.

use std::net::SocketAddr;
use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};
use tokio::sync::oneshot;

use openmockllm::config::MockConfig;
use openmockllm::personas::Persona;
use openmockllm::server::{create_router, AppState};

/// Test server wrapper
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    pub base_url: String,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawn a server for a persona with latency simulation off
    pub async fn spawn(persona: Persona) -> Self {
        Self::spawn_with_config(fast_config(persona)).await
    }

    /// Spawn a test server with custom configuration
    pub async fn spawn_with_config(mut config: MockConfig) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        config.server.host = "127.0.0.1".to_string();
        config.server.port = addr.port();

        let state = AppState::new(config).unwrap();
        let app = create_router(state);

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .unwrap();
        });

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap();

        let base_url = format!("http://{}", addr);

        // Wait for the server to come up
        for _ in 0..50 {
            if client
                .get(format!("{}/health", base_url))
                .send()
                .await
                .is_ok()
            {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        Self {
            addr,
            client,
            base_url,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    pub async fn post(&self, path: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// A config with simulation latency disabled, so tests run fast
pub fn fast_config(persona: Persona) -> MockConfig {
    let mut config = MockConfig::default();
    config.persona = persona;
    config.timing.enabled = false;
    config
}

/// Build a chat request body for the vLLM/Mistral surfaces
pub fn chat_request(model: &str, message: &str, max_tokens: Option<u32>, stream: bool) -> Value {
    let mut body = json!({
        "model": model,
        "messages": [{"role": "user", "content": message}],
        "stream": stream,
    });
    if let Some(max) = max_tokens {
        body["max_tokens"] = json!(max);
    }
    body
}

/// Extract the `data:` payloads from an SSE body
pub fn sse_data_lines(body: &str) -> Vec<String> {
    body.lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .map(String::from)
        .collect()
}

/// Concatenate the content deltas from parsed SSE chunk payloads
pub fn sse_content(data_lines: &[String]) -> String {
    data_lines
        .iter()
        .filter(|line| *line != "[DONE]")
        .filter_map(|line| serde_json::from_str::<Value>(line).ok())
        .filter_map(|chunk| {
            chunk["choices"][0]["delta"]["content"]
                .as_str()
                .map(String::from)
        })
        .collect()
}
