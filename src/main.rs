use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use contract_analyzer::cli::{self, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Pick up SECRET_KEY, DATABASE_URL and friends from a local .env
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "contract_analyzer=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Init => cli::commands::init().await,
        Commands::Serve { host, port } => cli::commands::serve(config_path, host, port).await,
        Commands::HashPassword { password, cost } => {
            cli::commands::hash_password(config_path, &password, cost).await
        }
        Commands::CheckLlm { prompt } => cli::commands::check_llm(config_path, &prompt).await,
    }
}
