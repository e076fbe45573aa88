//! Configuration module for OpenMockLLM
//!
//! Provides hierarchical configuration with support for:
//! - YAML/TOML/JSON config files
//! - Environment variable overrides
//! - Validation

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::engine::{StreamGranularity, SynthesisConfig};
use crate::error::{MockError, MockResult};
use crate::latency::TimingConfig;
use crate::personas::Persona;
use crate::tokens::TokenizerScheme;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MockConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// The single model this process pretends to serve
    pub model: ModelConfig,
    /// Content synthesis settings
    pub synthesis: SynthesisConfig,
    /// Latency simulation settings
    pub timing: TimingConfig,
    /// Security settings
    pub security: SecurityConfig,
    /// Telemetry settings
    pub telemetry: TelemetryConfig,
    /// Which API surface to imitate
    pub persona: Persona,
    /// Tokenizer encoding used for estimation
    pub tokenizer: TokenizerScheme,
    /// Seed for deterministic behavior (None = random)
    pub seed: Option<u64>,
}

impl MockConfig {
    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> MockResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| MockError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Self = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
                .map_err(|e| MockError::Config(format!("YAML parse error: {}", e)))?,
            Some("toml") => toml::from_str(&content)
                .map_err(|e| MockError::Config(format!("TOML parse error: {}", e)))?,
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| MockError::Config(format!("JSON parse error: {}", e)))?,
            _ => {
                return Err(MockError::Config(
                    "Unsupported config file format. Use .yaml, .toml, or .json".to_string(),
                ))
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    pub fn from_env() -> MockResult<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `OPENMOCKLLM_*` environment overrides in place
    pub fn apply_env(&mut self) -> MockResult<()> {
        if let Ok(port) = std::env::var("OPENMOCKLLM_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| MockError::Config("Invalid port number".to_string()))?;
        }

        if let Ok(host) = std::env::var("OPENMOCKLLM_HOST") {
            self.server.host = host;
        }

        if let Ok(persona) = std::env::var("OPENMOCKLLM_PERSONA") {
            self.persona = persona.parse().map_err(MockError::Config)?;
        }

        if let Ok(model) = std::env::var("OPENMOCKLLM_MODEL_NAME") {
            self.model.name = model;
        }

        if let Ok(seed) = std::env::var("OPENMOCKLLM_SEED") {
            self.seed = Some(
                seed.parse()
                    .map_err(|_| MockError::Config("Invalid seed value".to_string()))?,
            );
        }

        if let Ok(val) = std::env::var("OPENMOCKLLM_LATENCY_ENABLED") {
            self.timing.enabled = val.parse().unwrap_or(true);
        }

        if let Ok(key) = std::env::var("OPENMOCKLLM_API_KEY") {
            self.security.api_key = Some(key);
        }

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> MockResult<()> {
        self.server.validate()?;
        self.model.validate()?;
        self.synthesis.validate()?;
        self.timing.validate()?;
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
    /// Enable CORS
    pub cors_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            request_timeout_secs: 300,
            cors_enabled: true,
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> MockResult<()> {
        if self.port == 0 {
            return Err(MockError::Validation {
                message: "Port cannot be 0".to_string(),
                param: Some("server.port".to_string()),
            });
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> MockResult<std::net::SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| MockError::Config(format!("Invalid bind address {}:{}", self.host, self.port)))
    }
}

/// The identity and limits of the imitated model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model name returned by the API and checked against requests
    pub name: String,
    /// Reported owner
    pub owned_by: String,
    /// Maximum prompt size in estimated tokens
    pub max_context_tokens: usize,
    /// Dimension of mock embedding vectors
    pub embedding_dimension: usize,
    /// Maximum inputs per embedding/rerank request
    pub max_client_batch_size: usize,
    /// Fragmentation of streamed content
    pub stream_granularity: StreamGranularity,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "openmockllm".to_string(),
            owned_by: "OpenMockLLM".to_string(),
            max_context_tokens: 128_000,
            embedding_dimension: 1024,
            max_client_batch_size: 32,
            stream_granularity: StreamGranularity::default(),
        }
    }
}

impl ModelConfig {
    pub fn validate(&self) -> MockResult<()> {
        if self.name.is_empty() {
            return Err(MockError::Validation {
                message: "model name cannot be empty".to_string(),
                param: Some("model.name".to_string()),
            });
        }
        if self.max_context_tokens == 0 {
            return Err(MockError::Validation {
                message: "max_context_tokens must be greater than 0".to_string(),
                param: Some("model.max_context_tokens".to_string()),
            });
        }
        if self.embedding_dimension == 0 {
            return Err(MockError::Validation {
                message: "embedding_dimension must be greater than 0".to_string(),
                param: Some("model.embedding_dimension".to_string()),
            });
        }
        if self.max_client_batch_size == 0 {
            return Err(MockError::Validation {
                message: "max_client_batch_size must be greater than 0".to_string(),
                param: Some("model.max_client_batch_size".to_string()),
            });
        }
        Ok(())
    }
}

/// Security configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SecurityConfig {
    /// Bearer key required on API routes when set
    pub api_key: Option<String>,
}

/// Telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Log level
    pub log_level: String,
    /// Enable JSON logging
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}
