//! # OpenMockLLM
//!
//! Offline mock LLM inference server for testing and load generation.
//!
//! OpenMockLLM imitates the HTTP surface of several real LLM-serving APIs
//! (vLLM/OpenAI-style, Mistral-style, Text-Embeddings-Inference-style)
//! without running any model. It returns plausible content, plausible token
//! accounting, and plausible timing, in both unary and streamed modes.
//!
//! ## Features
//!
//! - **Three personas**: vLLM, Mistral, and TEI compatible surfaces over one engine
//! - **Realistic latency**: Gaussian TTFT/ITL models shaped by in-flight load
//! - **Token accounting**: tiktoken-based estimation with swappable encodings
//! - **Deterministic mode**: seed-based RNG for reproducible tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use openmockllm::{run_server, MockConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = MockConfig::default();
//!     run_server(config).await
//! }
//! ```

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod latency;
pub mod personas;
pub mod security;
pub mod server;
pub mod telemetry;
pub mod tokens;

pub use config::MockConfig;
pub use engine::MockEngine;
pub use error::{MockError, MockResult};
pub use server::run_server;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default server port
pub const DEFAULT_PORT: u16 = 8000;
