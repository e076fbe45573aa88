//! CLI module for OpenMockLLM
//!
//! Provides the command-line interface with subcommands for:
//! - Starting the mock server
//! - Managing configuration
//! - Health checking remote instances

mod commands;

pub use commands::*;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::engine::{ProseLocale, StreamGranularity};
use crate::personas::Persona;
use crate::tokens::TokenizerScheme;
use crate::VERSION;

/// OpenMockLLM: mock LLM inference server for testing and load generation
#[derive(Parser, Debug)]
#[command(name = "openmockllm")]
#[command(version = VERSION)]
#[command(about = "Mock LLM inference server imitating vLLM, Mistral, and TEI APIs")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file path (YAML, TOML, or JSON)
    #[arg(short, long, global = true, env = "OPENMOCKLLM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "OPENMOCKLLM_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Enable JSON log output
    #[arg(long, global = true, env = "OPENMOCKLLM_JSON_LOGS")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the mock server
    #[command(alias = "s")]
    Serve(ServeCommand),

    /// Configuration management
    #[command(alias = "cfg")]
    Config(ConfigCommand),

    /// Health check a running instance
    Health(HealthCommand),

    /// Show version information
    Version,
}

/// Start the mock server
#[derive(Parser, Debug)]
pub struct ServeCommand {
    /// API surface to imitate (vllm, mistral, or tei)
    #[arg(long, env = "OPENMOCKLLM_PERSONA")]
    pub persona: Option<Persona>,

    /// Port to listen on
    #[arg(short, long, env = "OPENMOCKLLM_PORT")]
    pub port: Option<u16>,

    /// Host to bind to
    #[arg(long, env = "OPENMOCKLLM_HOST")]
    pub host: Option<String>,

    /// Model name to report and require
    #[arg(long, env = "OPENMOCKLLM_MODEL_NAME")]
    pub model_name: Option<String>,

    /// Reported model owner
    #[arg(long)]
    pub owned_by: Option<String>,

    /// Maximum context length in estimated tokens
    #[arg(long)]
    pub max_context: Option<usize>,

    /// Dimension of mock embedding vectors
    #[arg(long)]
    pub embedding_dimension: Option<usize>,

    /// Maximum inputs per embedding/rerank request
    #[arg(long)]
    pub max_batch_size: Option<usize>,

    /// Require this Bearer key on API routes
    #[arg(long, env = "OPENMOCKLLM_API_KEY")]
    pub api_key: Option<String>,

    /// Tokenizer encoding (cl100k_base, o200k_base, p50k_base, r50k_base)
    #[arg(long, env = "OPENMOCKLLM_TOKENIZER")]
    pub tokenizer: Option<TokenizerScheme>,

    /// Locale of the synthesized prose (en, fr)
    #[arg(long)]
    pub prose_locale: Option<ProseLocale>,

    /// Fixed seed for the prose generator
    #[arg(long)]
    pub prose_seed: Option<u64>,

    /// Fragmentation of streamed content (word, token)
    #[arg(long)]
    pub stream_granularity: Option<StreamGranularity>,

    /// Disable latency simulation
    #[arg(long, env = "OPENMOCKLLM_NO_LATENCY")]
    pub no_latency: bool,

    /// Fixed seed for deterministic behavior
    #[arg(long, env = "OPENMOCKLLM_SEED")]
    pub seed: Option<u64>,
}

/// Configuration management
#[derive(Parser, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show {
        /// Output format (yaml, toml, json)
        #[arg(short, long, default_value = "yaml")]
        format: String,
    },

    /// Validate a configuration file
    Validate {
        /// Configuration file to validate
        file: PathBuf,
    },

    /// Write a default configuration file
    Init {
        /// Output file path
        #[arg(short, long, default_value = "openmockllm.yaml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

/// Health check a running instance
#[derive(Parser, Debug)]
pub struct HealthCommand {
    /// Base URL of the instance
    #[arg(short, long, default_value = "http://localhost:8000")]
    pub url: String,

    /// Timeout in seconds
    #[arg(short, long, default_value = "5")]
    pub timeout: u64,
}
