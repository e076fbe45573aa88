//! Token estimation
//!
//! Approximate subword token counting built on tiktoken-rs. The count is an
//! approximation for any specific model family, but it is deterministic for a
//! fixed encoding and input, and monotonic with text length.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tiktoken_rs::{cl100k_base, o200k_base, p50k_base, r50k_base, CoreBPE};

use crate::error::{MockError, MockResult};

/// Supported tiktoken encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TokenizerScheme {
    #[default]
    Cl100kBase,
    O200kBase,
    P50kBase,
    R50kBase,
}

impl std::fmt::Display for TokenizerScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cl100kBase => write!(f, "cl100k_base"),
            Self::O200kBase => write!(f, "o200k_base"),
            Self::P50kBase => write!(f, "p50k_base"),
            Self::R50kBase => write!(f, "r50k_base"),
        }
    }
}

impl FromStr for TokenizerScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cl100k_base" => Ok(Self::Cl100kBase),
            "o200k_base" => Ok(Self::O200kBase),
            "p50k_base" => Ok(Self::P50kBase),
            "r50k_base" => Ok(Self::R50kBase),
            _ => Err(format!("Unknown tokenizer scheme: {}", s)),
        }
    }
}

/// Token estimator that caches the BPE for repeated use
pub struct TokenEstimator {
    bpe: CoreBPE,
    scheme: TokenizerScheme,
}

impl TokenEstimator {
    /// Build an estimator for the given encoding
    pub fn new(scheme: TokenizerScheme) -> MockResult<Self> {
        let bpe = match scheme {
            TokenizerScheme::Cl100kBase => cl100k_base(),
            TokenizerScheme::O200kBase => o200k_base(),
            TokenizerScheme::P50kBase => p50k_base(),
            TokenizerScheme::R50kBase => r50k_base(),
        }
        .map_err(|e| MockError::Tokenizer(e.to_string()))?;

        Ok(Self { bpe, scheme })
    }

    /// The encoding this estimator uses
    pub fn scheme(&self) -> TokenizerScheme {
        self.scheme
    }

    /// Estimate the token count of a text. Empty text is zero tokens.
    pub fn estimate(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        self.bpe.encode_ordinary(text).len()
    }

    /// Split a text into token-sized fragments whose concatenation
    /// reproduces the input exactly. Used for token-granularity streaming.
    pub fn split_tokens(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }
        let ids = self.bpe.encode_ordinary(text);
        let mut fragments = Vec::with_capacity(ids.len());
        let mut cursor = 0;
        for end in 1..=ids.len() {
            // Decode prefixes so multi-byte characters split across token
            // boundaries stay attached to the fragment that completes them.
            if let Ok(prefix) = self.bpe.decode(ids[..end].to_vec()) {
                if prefix.len() > cursor {
                    fragments.push(prefix[cursor..].to_string());
                    cursor = prefix.len();
                }
            }
        }
        if cursor < text.len() {
            fragments.push(text[cursor..].to_string());
        }
        fragments
    }
}

impl Default for TokenEstimator {
    fn default() -> Self {
        Self::new(TokenizerScheme::default()).expect("cl100k_base is always available")
    }
}
