//! Text-Embeddings-Inference-style persona
//!
//! Embeddings, reranking, and the `/info` card, shaped the way a TEI server
//! presents them. TEI reports errors as a flat `{error, error_type}` object
//! rather than the OpenAI envelope, so this persona carries its own error
//! wrapper.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use super::{
    encode_embedding, random_embedding, random_rerank_scores, EmbeddingVector, EncodingFormat,
    Usage,
};
use crate::error::MockError;
use crate::server::AppState;

/// TEI persona routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/embeddings", post(openai_embed))
        .route("/rerank", post(rerank))
        .route("/info", get(info))
        .route("/health", get(health))
}

/// TEI-flavored error envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct TeiErrorBody {
    pub error: String,
    pub error_type: String,
}

/// Wraps engine errors into the TEI wire shape
#[derive(Debug)]
pub struct TeiError(pub MockError);

impl From<MockError> for TeiError {
    fn from(err: MockError) -> Self {
        Self(err)
    }
}

impl IntoResponse for TeiError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        let body = TeiErrorBody {
            error: self.0.to_string(),
            error_type: match self.0 {
                MockError::EmptyBatch => "empty".to_string(),
                MockError::BatchTooLarge { .. } => "validation".to_string(),
                MockError::AuthenticationFailed(_) => "authentication".to_string(),
                _ => "backend".to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

// ============== Wire schemas ==============

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAICompatRequest {
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
pub struct OpenAICompatResponse {
    pub object: String,
    pub data: Vec<OpenAICompatEmbedding>,
    pub model: String,
    pub usage: Usage,
}

#[derive(Debug, Serialize)]
pub struct OpenAICompatEmbedding {
    pub object: String,
    pub index: usize,
    pub embedding: EmbeddingVector,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RerankRequest {
    pub query: String,
    pub texts: Vec<String>,
    #[serde(default)]
    pub return_text: bool,
}

#[derive(Debug, Serialize)]
pub struct Rank {
    pub index: usize,
    pub score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Info {
    pub model_id: String,
    pub model_sha: Option<String>,
    pub model_dtype: String,
    pub model_type: ModelType,
    pub max_concurrent_requests: usize,
    pub max_input_length: usize,
    pub max_batch_tokens: usize,
    pub max_client_batch_size: usize,
    pub max_batch_requests: Option<usize>,
    pub auto_truncate: bool,
    pub tokenization_workers: usize,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct ModelType {
    pub embedding: EmbeddingModelType,
}

#[derive(Debug, Serialize)]
pub struct EmbeddingModelType {
    pub pooling: String,
}

// ============== Handlers ==============

/// POST /v1/embeddings
pub async fn openai_embed(
    State(state): State<AppState>,
    Json(request): Json<OpenAICompatRequest>,
) -> Result<Json<OpenAICompatResponse>, TeiError> {
    let inputs = request.input.into_vec();
    validate_batch(&state, inputs.len())?;

    let dimension = request
        .dimensions
        .unwrap_or(state.config.model.embedding_dimension);
    let format = request.encoding_format.unwrap_or_default();

    let data = inputs
        .iter()
        .enumerate()
        .map(|(index, _)| OpenAICompatEmbedding {
            object: "embedding".to_string(),
            index,
            embedding: encode_embedding(random_embedding(dimension), format),
        })
        .collect();

    Ok(Json(OpenAICompatResponse {
        object: "list".to_string(),
        data,
        model: request
            .model
            .unwrap_or_else(|| state.config.model.name.clone()),
        usage: Usage::new(0, 0),
    }))
}

/// POST /rerank
pub async fn rerank(
    State(state): State<AppState>,
    Json(request): Json<RerankRequest>,
) -> Result<Json<Vec<Rank>>, TeiError> {
    validate_batch(&state, request.texts.len())?;

    let ranked = random_rerank_scores(request.texts.len())
        .into_iter()
        .map(|(index, score)| Rank {
            index,
            score,
            text: request.return_text.then(|| request.texts[index].clone()),
        })
        .collect();

    Ok(Json(ranked))
}

/// GET /info
pub async fn info(State(state): State<AppState>) -> Json<Info> {
    Json(Info {
        model_id: state.config.model.name.clone(),
        model_sha: None,
        model_dtype: "float16".to_string(),
        model_type: ModelType {
            embedding: EmbeddingModelType {
                pooling: "cls".to_string(),
            },
        },
        max_concurrent_requests: 128,
        max_input_length: 512,
        max_batch_tokens: 16_384,
        max_client_batch_size: state.config.model.max_client_batch_size,
        max_batch_requests: None,
        auto_truncate: false,
        tokenization_workers: 4,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

fn validate_batch(state: &AppState, size: usize) -> Result<(), TeiError> {
    if size == 0 {
        return Err(MockError::EmptyBatch.into());
    }

    let max = state.config.model.max_client_batch_size;
    if size > max {
        return Err(MockError::BatchTooLarge { size, max }.into());
    }

    Ok(())
}
