//! OpenMockLLM CLI
//!
//! Mock LLM inference server for testing and load generation.

use clap::Parser;

use openmockllm::cli::{execute, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    execute(cli).await
}
