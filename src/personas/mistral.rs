//! Mistral-style persona
//!
//! Same engine mapping as the vLLM persona behind Mistral's wire shapes:
//! string-content messages, a required model field, and chunked SSE without
//! the OpenAI `object` envelope fields.

use std::convert::Infallible;

use axum::extract::State;
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

/// Mistral persona routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/chat/completions", post(chat_completions))
        .route("/v1/embeddings", post(embeddings))
        .route("/v1/models", get(list_models))
        .route("/health", get(health))
}

// ============== Wire schemas ==============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
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
    pub message: ChatMessage,
    pub finish_reason: String,
}

#[derive(Debug, Serialize)]
pub struct CompletionChunk {
    pub id: String,
    pub model: String,
    pub created: i64,
    pub choices: Vec<ChunkChoice>,
}

#[derive(Debug, Serialize)]
pub struct ChunkChoice {
    pub index: u32,
    pub delta: DeltaMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct DeltaMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingsRequest {
    pub model: String,
    pub input: EmbeddingInput,
    #[serde(default)]
    pub encoding_format: Option<EncodingFormat>,
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
    pub id: String,
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
    check_model(&state, &request.model)?;

    let id = request_id("chatcmpl");
    let prompt = request
        .messages
        .iter()
        .map(|m| m.content.as_str())
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
        "mistral chat request"
    );

    if request.stream {
        let chunks = state.engine.complete_stream(&params)?;
        let stream = chunks.map(move |chunk| {
            let event = match chunk {
                StreamChunk::Role => chunk_event(&CompletionChunk {
                    id: id.clone(),
                    model: model.clone(),
                    created,
                    choices: vec![ChunkChoice {
                        index: 0,
                        delta: DeltaMessage {
                            role: Some("assistant".to_string()),
                            content: Some(String::new()),
                        },
                        finish_reason: None,
                    }],
                }),
                StreamChunk::Content { text } => chunk_event(&CompletionChunk {
                    id: id.clone(),
                    model: model.clone(),
                    created,
                    choices: vec![ChunkChoice {
                        index: 0,
                        delta: DeltaMessage {
                            role: None,
                            content: Some(text),
                        },
                        finish_reason: None,
                    }],
                }),
                StreamChunk::Finish { reason } => chunk_event(&CompletionChunk {
                    id: id.clone(),
                    model: model.clone(),
                    created,
                    choices: vec![ChunkChoice {
                        index: 0,
                        delta: DeltaMessage {
                            role: None,
                            content: Some(String::new()),
                        },
                        finish_reason: Some(reason.as_str().to_string()),
                    }],
                }),
                StreamChunk::Done => Event::default().data("[DONE]"),
            };
            Ok::<_, Infallible>(event)
        });

        Ok(Sse::new(stream)
            .keep_alive(KeepAlive::new())
            .into_response())
    } else {
        let completion = state.engine.complete(&params).await?;

        let response = ChatCompletionResponse {
            id,
            object: "chat.completion".to_string(),
            created,
            model,
            choices: vec![ChatChoice {
                index: 0,
                message: ChatMessage {
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
    check_model(&state, &request.model)?;

    let inputs = request.input.into_vec();
    if inputs.is_empty() {
        return Err(MockError::EmptyBatch);
    }

    let dimension = state.config.model.embedding_dimension;
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
        id: request_id("embd"),
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
        data: vec![ModelCard {
            id: state.config.model.name.clone(),
            object: "model".to_string(),
            created: chrono::Utc::now().timestamp(),
            owned_by: state.config.model.owned_by.clone(),
        }],
    })
}

/// GET /health
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

fn check_model(state: &AppState, requested: &str) -> Result<(), MockError> {
    if requested != state.config.model.name {
        return Err(MockError::ModelMismatch(requested.to_string()));
    }
    Ok(())
}

fn chunk_event(chunk: &CompletionChunk) -> Event {
    Event::default().data(serde_json::to_string(chunk).unwrap_or_default())
}
