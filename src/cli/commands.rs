//! CLI command implementations

use anyhow::{bail, Result};
use std::fs;
use std::path::Path;
use std::time::Instant;

use crate::analysis::ChatClient;
use crate::auth::PasswordHasher;
use crate::cli::{error, field, info, success, warn};
use crate::config::{self, loader::CONFIG_FILENAME, Config, LlmProvider};

/// Initialize a new contract-analyzer.toml configuration file
pub async fn init() -> Result<()> {
    let config_path = Path::new(CONFIG_FILENAME);

    if config_path.exists() {
        warn(&format!("{} already exists", CONFIG_FILENAME));
        return Ok(());
    }

    let content = config::loader::default_config_content();
    fs::write(config_path, content)?;

    success(&format!("Created {}", CONFIG_FILENAME));
    info("Set SECRET_KEY and DATABASE_URL (or use a .env file), then run 'contract-analyzer serve'");

    Ok(())
}

/// Start the HTTP API server
pub async fn serve(config_path: Option<&Path>, host: Option<String>, port: Option<u16>) -> Result<()> {
    let config = load_config(config_path)?;

    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    info(&format!("Starting server at http://{}:{}", host, port));

    crate::api::run_server(config, &host, port).await?;
    Ok(())
}

/// Hash a password with bcrypt
pub async fn hash_password(config_path: Option<&Path>, password: &str, cost: Option<u32>) -> Result<()> {
    let cost = match cost {
        Some(cost) => cost,
        None => load_config(config_path)
            .map(|c| c.auth.bcrypt_cost)
            .unwrap_or(bcrypt::DEFAULT_COST),
    };

    let hasher = PasswordHasher::new(cost);
    let password = password.to_string();
    let digest = tokio::task::spawn_blocking(move || hasher.hash(&password)).await??;

    println!("{}", digest);
    Ok(())
}

/// Send one prompt to the configured LLM and print the reply
pub async fn check_llm(config_path: Option<&Path>, prompt: &str) -> Result<()> {
    let config = load_config(config_path)?;
    let llm = &config.llm;

    if llm.provider == LlmProvider::Mock {
        warn("llm.provider is \"mock\"; no external model is called");
        return Ok(());
    }
    if !llm.is_enabled() {
        error("llm.api_key is empty; contract uploads will be refused");
        bail!("LLM is not configured");
    }

    let client = ChatClient::from_config(llm)?;
    field("base_url", &llm.base_url);
    field("model", client.model());

    let start = Instant::now();
    match client.complete("You are a helpful assistant.", prompt).await {
        Ok(reply) => {
            success(&format!(
                "LLM replied in {} ms",
                start.elapsed().as_millis()
            ));
            println!("{}", reply.trim());
            Ok(())
        }
        Err(e) => {
            error(&format!("LLM request failed: {}", e));
            Err(e.into())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => config::load_config_from_path(path),
        None => config::load_config(),
    }
    .map_err(|e| anyhow::anyhow!("{}", e))?;

    Ok(config)
}
