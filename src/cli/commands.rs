//! CLI command implementations

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};

use super::{Cli, Commands, ConfigAction, ConfigCommand, HealthCommand, ServeCommand};
use crate::config::MockConfig;
use crate::server::run_server;
use crate::telemetry::init_telemetry;

/// Execute the parsed command line
pub async fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve(ref cmd) => serve(&cli, cmd).await,
        Commands::Config(ref cmd) => config_command(cli.config.as_deref(), cmd),
        Commands::Health(ref cmd) => health(cmd).await,
        Commands::Version => {
            println!("openmockllm {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn serve(cli: &Cli, cmd: &ServeCommand) -> anyhow::Result<()> {
    let mut config = load_config(cli.config.as_deref())?;
    config.apply_env()?;
    apply_serve_overrides(&mut config, cmd);

    config.telemetry.log_level = cli.log_level.clone();
    if cli.json_logs {
        config.telemetry.json_logs = true;
    }

    config.validate()?;
    init_telemetry(&config.telemetry);

    run_server(config).await
}

fn apply_serve_overrides(config: &mut MockConfig, cmd: &ServeCommand) {
    if let Some(persona) = cmd.persona {
        config.persona = persona;
    }
    if let Some(port) = cmd.port {
        config.server.port = port;
    }
    if let Some(host) = &cmd.host {
        config.server.host = host.clone();
    }
    if let Some(name) = &cmd.model_name {
        config.model.name = name.clone();
    }
    if let Some(owned_by) = &cmd.owned_by {
        config.model.owned_by = owned_by.clone();
    }
    if let Some(max_context) = cmd.max_context {
        config.model.max_context_tokens = max_context;
    }
    if let Some(dimension) = cmd.embedding_dimension {
        config.model.embedding_dimension = dimension;
    }
    if let Some(batch) = cmd.max_batch_size {
        config.model.max_client_batch_size = batch;
    }
    if let Some(key) = &cmd.api_key {
        config.security.api_key = Some(key.clone());
    }
    if let Some(tokenizer) = cmd.tokenizer {
        config.tokenizer = tokenizer;
    }
    if let Some(locale) = cmd.prose_locale {
        config.synthesis.locale = locale;
    }
    if let Some(seed) = cmd.prose_seed {
        config.synthesis.seed = Some(seed);
    }
    if let Some(granularity) = cmd.stream_granularity {
        config.model.stream_granularity = granularity;
    }
    if cmd.no_latency {
        config.timing.enabled = false;
    }
    if let Some(seed) = cmd.seed {
        config.seed = Some(seed);
    }
}

fn config_command(path: Option<&Path>, cmd: &ConfigCommand) -> anyhow::Result<()> {
    match &cmd.action {
        ConfigAction::Show { format } => {
            let config = load_config(path)?;
            let rendered = render_config(&config, format)?;
            println!("{}", rendered);
            Ok(())
        }
        ConfigAction::Validate { file } => {
            MockConfig::from_file(file)
                .with_context(|| format!("Invalid configuration: {}", file.display()))?;
            println!("{} is valid", file.display());
            Ok(())
        }
        ConfigAction::Init { output, force } => init_config(output, *force),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<MockConfig> {
    match path {
        Some(path) => MockConfig::from_file(path)
            .with_context(|| format!("Failed to load {}", path.display())),
        None => Ok(MockConfig::default()),
    }
}

fn render_config(config: &MockConfig, format: &str) -> anyhow::Result<String> {
    match format {
        "yaml" => Ok(serde_yaml::to_string(config)?),
        "toml" => Ok(toml::to_string_pretty(config)?),
        "json" => Ok(serde_json::to_string_pretty(config)?),
        other => bail!("Unsupported format: {} (expected yaml, toml, or json)", other),
    }
}

fn init_config(output: &PathBuf, force: bool) -> anyhow::Result<()> {
    if output.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            output.display()
        );
    }

    let config = MockConfig::default();
    let rendered = match output.extension().and_then(|e| e.to_str()) {
        Some("toml") => toml::to_string_pretty(&config)?,
        Some("json") => serde_json::to_string_pretty(&config)?,
        _ => serde_yaml::to_string(&config)?,
    };

    std::fs::write(output, rendered)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("Wrote {}", output.display());
    Ok(())
}

async fn health(cmd: &HealthCommand) -> anyhow::Result<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(cmd.timeout))
        .build()?;

    let url = format!("{}/health", cmd.url.trim_end_matches('/'));
    let response = client
        .get(&url)
        .send()
        .await
        .with_context(|| format!("Failed to reach {}", url))?;

    if response.status().is_success() {
        println!("{} is healthy", cmd.url);
        Ok(())
    } else {
        bail!("{} returned {}", cmd.url, response.status());
    }
}
