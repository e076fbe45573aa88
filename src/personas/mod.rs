//! API personas
//!
//! Each persona is a thin adapter that maps one imitated backend's wire
//! schema (vLLM/OpenAI, Mistral, Text-Embeddings-Inference) onto the single
//! mock engine. Exactly one persona is mounted per server process.

pub mod mistral;
pub mod tei;
pub mod vllm;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// The API surface this process imitates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Persona {
    #[default]
    Vllm,
    Mistral,
    Tei,
}

impl std::fmt::Display for Persona {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vllm => write!(f, "vllm"),
            Self::Mistral => write!(f, "mistral"),
            Self::Tei => write!(f, "tei"),
        }
    }
}

impl std::str::FromStr for Persona {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "vllm" => Ok(Self::Vllm),
            "mistral" => Ok(Self::Mistral),
            "tei" => Ok(Self::Tei),
            _ => Err(format!("Unknown persona: {} (expected vllm, mistral, or tei)", s)),
        }
    }
}

/// Token usage information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl Usage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Wire format for an embedding vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EncodingFormat {
    #[default]
    Float,
    Base64,
}

/// An embedding, either as raw floats or packed little-endian base64
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum EmbeddingVector {
    Float(Vec<f32>),
    Base64(String),
}

/// Generate a mock embedding: uniform values in [0, 1), no semantics
pub fn random_embedding(dimension: usize) -> Vec<f32> {
    let mut rng = rand::thread_rng();
    (0..dimension).map(|_| rng.gen::<f32>()).collect()
}

/// Encode an embedding for the requested wire format
pub fn encode_embedding(values: Vec<f32>, format: EncodingFormat) -> EmbeddingVector {
    match format {
        EncodingFormat::Float => EmbeddingVector::Float(values),
        EncodingFormat::Base64 => {
            let mut bytes = Vec::with_capacity(values.len() * 4);
            for value in values {
                bytes.extend_from_slice(&value.to_le_bytes());
            }
            EmbeddingVector::Base64(BASE64.encode(bytes))
        }
    }
}

/// Mock rerank scores for a batch: random relevance, sorted descending
pub fn random_rerank_scores(count: usize) -> Vec<(usize, f32)> {
    let mut rng = rand::thread_rng();
    let mut scores: Vec<(usize, f32)> = (0..count).map(|i| (i, rng.gen::<f32>())).collect();
    scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scores
}

/// A request id like `chatcmpl-5f2b…` with a 32-hex suffix
pub fn request_id(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4().simple())
}
