//! vLLM-style persona (OpenAI-compatible surface)
//!
//! Chat completions (unary and SSE streaming), embeddings, and the model
//! listing endpoints, shaped the way a vLLM server presents them.

use std::convert::Infallible;
use std::time::Instant;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{
    encode_embedding, random_embedding, request_id, EmbeddingVector, EncodingFormat, Usage,
};
use crate::engine::{CompletionParams, StreamChunk};
use crate::error::MockError;
use crate::server::AppState;

/// vLLM persona routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/chat/completions", post(chat_completions))
        .route("/v1/embeddings", post(embeddings))
        .route("/v1/models", get(list_models))
        .route("/v1/models/:model_id", get(get_model))
        .route("/health", get(health))
        .route("/version", get(version))
}

// ============== Wire schemas ==============

/// Chat message content: a plain string or a list of typed parts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentPart {
    #[serde(rename = "type")]
    pub part_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl MessageContent {
    /// Normalize to a plain text prompt; non-text parts contribute nothing
    pub fn text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Parts(parts) => parts
                .iter()
                .filter(|p| p.part_type == "text")
                .filter_map(|p| p.text.as_deref())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: MessageContent,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionRequest {
    #[serde(default)]
    pub model: Option<String>,
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub stream: bool,
}

#[derive(Debug, Serialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<ChatChoice>,
    pub usage: Usage,
}

#[derive(Debug, Serialize)]
pub struct ChatChoice {
    pub index: u32,
    pub message: AssistantMessage,
    pub finish_reason: String,
}

#[derive(Debug, Serialize)]
pub struct AssistantMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ChatCompletionChunk {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<ChunkChoice>,
}

#[derive(Debug, Serialize)]
pub struct ChunkChoice {
    pub index: u32,
    pub delta: ChunkDelta,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct ChunkDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ChatCompletionChunk {
    fn new(id: &str, model: &str, created: i64, delta: ChunkDelta, finish: Option<&str>) -> Self {
        Self {
            id: id.to_string(),
            object: "chat.completion.chunk".to_string(),
            created,
            model: model.to_string(),
            choices: vec![ChunkChoice {
                index: 0,
                delta,
                finish_reason: finish.map(String::from),
            }],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingsRequest {
    #[serde(default)]
    pub model: Option<String>,
    pub input: EmbeddingInput,
    #[serde(default)]
    pub encoding_format: Option<EncodingFormat>,
    #[serde(default)]
    pub dimensions: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EmbeddingInput {
    Single(String),
    Multiple(Vec<String>),
}

impl EmbeddingInput {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::Single(text) => vec![text],
            Self::Multiple(texts) => texts,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EmbeddingsResponse {
    pub object: String,
    pub data: Vec<EmbeddingObject>,
    pub model: String,
    pub usage: Usage,
}

#[derive(Debug, Serialize)]
pub struct EmbeddingObject {
    pub object: String,
    pub index: usize,
    pub embedding: EmbeddingVector,
}

#[derive(Debug, Serialize)]
pub struct ModelList {
    pub object: String,
    pub data: Vec<ModelCard>,
}

#[derive(Debug, Serialize)]
pub struct ModelCard {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub owned_by: String,
}

// ============== Handlers ==============

/// POST /v1/chat/completions
pub async fn chat_completions(
    State(state): State<AppState>,
    Json(request): Json<ChatCompletionRequest>,
) -> Result<Response, MockError> {
    let started = Instant::now();
    let id = request_id("chatcmpl");

    check_model(&state, request.model.as_deref())?;

    let prompt = request
        .messages
        .iter()
        .map(|m| m.content.text())
        .collect::<Vec<_>>()
        .join("\n\n");

    let params = CompletionParams::new(prompt)
        .with_max_output_tokens(request.max_tokens)
        .with_verbosity(request.temperature.unwrap_or(0.7).clamp(0.0, 1.0))
        .with_max_context_tokens(Some(state.config.model.max_context_tokens));

    let model = state.config.model.name.clone();
    let created = chrono::Utc::now().timestamp();

    info!(
        request_id = %id,
        stream = request.stream,
        inflight = state.engine.inflight(),
        "chat completion request"
    );

    if request.stream {
        let chunks = state.engine.complete_stream(&params)?;
        let stream = chunks.map(move |chunk| {
            let event = match chunk {
                StreamChunk::Role => chunk_event(&ChatCompletionChunk::new(
                    &id,
                    &model,
                    created,
                    ChunkDelta {
                        role: Some("assistant".to_string()),
                        content: Some(String::new()),
                    },
                    None,
                )),
                StreamChunk::Content { text } => chunk_event(&ChatCompletionChunk::new(
                    &id,
                    &model,
                    created,
                    ChunkDelta {
                        role: None,
                        content: Some(text),
                    },
                    None,
                )),
                StreamChunk::Finish { reason } => chunk_event(&ChatCompletionChunk::new(
                    &id,
                    &model,
                    created,
                    ChunkDelta {
                        role: None,
                        content: Some(String::new()),
                    },
                    Some(reason.as_str()),
                )),
                StreamChunk::Done => Event::default().data("[DONE]"),
            };
            Ok::<_, Infallible>(event)
        });

        Ok(Sse::new(stream)
            .keep_alive(KeepAlive::new())
            .into_response())
    } else {
        let completion = state.engine.complete(&params).await?;

        info!(
            request_id = %id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            inflight = state.engine.inflight(),
            "chat completion served"
        );

        let response = ChatCompletionResponse {
            id,
            object: "chat.completion".to_string(),
            created,
            model,
            choices: vec![ChatChoice {
                index: 0,
                message: AssistantMessage {
                    role: "assistant".to_string(),
                    content: completion.text.clone(),
                },
                finish_reason: "stop".to_string(),
            }],
            usage: Usage::new(
                completion.prompt_tokens as u32,
                completion.completion_tokens as u32,
            ),
        };

        Ok(Json(response).into_response())
    }
}

/// POST /v1/embeddings
pub async fn embeddings(
    State(state): State<AppState>,
    Json(request): Json<EmbeddingsRequest>,
) -> Result<Json<EmbeddingsResponse>, MockError> {
    check_model(&state, request.model.as_deref())?;

    let inputs = request.input.into_vec();
    if inputs.is_empty() {
        return Err(MockError::EmptyBatch);
    }

    let dimension = request
        .dimensions
        .unwrap_or(state.config.model.embedding_dimension);
    let format = request.encoding_format.unwrap_or_default();

    let mut total_tokens = 0u32;
    let data = inputs
        .iter()
        .enumerate()
        .map(|(index, input)| {
            total_tokens += state.engine.estimator().estimate(input) as u32;
            EmbeddingObject {
                object: "embedding".to_string(),
                index,
                embedding: encode_embedding(random_embedding(dimension), format),
            }
        })
        .collect();

    Ok(Json(EmbeddingsResponse {
        object: "list".to_string(),
        data,
        model: state.config.model.name.clone(),
        usage: Usage::new(total_tokens, 0),
    }))
}

/// GET /v1/models
pub async fn list_models(State(state): State<AppState>) -> Json<ModelList> {
    Json(ModelList {
        object: "list".to_string(),
        data: vec![model_card(&state)],
    })
}

/// GET /v1/models/:model_id
pub async fn get_model(
    State(state): State<AppState>,
    Path(model_id): Path<String>,
) -> Result<Json<ModelCard>, MockError> {
    check_model(&state, Some(model_id.as_str()))?;
    Ok(Json(model_card(&state)))
}

/// GET /health
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}

/// GET /version
pub async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "version": env!("CARGO_PKG_VERSION") }))
}

fn model_card(state: &AppState) -> ModelCard {
    ModelCard {
        id: state.config.model.name.clone(),
        object: "model".to_string(),
        created: chrono::Utc::now().timestamp(),
        owned_by: state.config.model.owned_by.clone(),
    }
}

fn check_model(state: &AppState, requested: Option<&str>) -> Result<(), MockError> {
    match requested {
        Some(model) if model != state.config.model.name => {
            Err(MockError::ModelMismatch(model.to_string()))
        }
        _ => Ok(()),
    }
}

fn chunk_event(chunk: &ChatCompletionChunk) -> Event {
    Event::default().data(serde_json::to_string(chunk).unwrap_or_default())
}
