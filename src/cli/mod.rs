//! CLI interface for the contract analyzer

pub mod commands;
mod output;

pub use output::*;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "contract-analyzer")]
#[command(author = "Krakaw")]
#[command(version)]
#[command(about = "Upload contracts and extract their key terms with an LLM", long_about = None)]
pub struct Cli {
    /// Path to the configuration file (searched upwards from the current directory by default)
    #[arg(short, long, global = true, env = "CONTRACT_ANALYZER_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new contract-analyzer.toml configuration file
    Init,

    /// Start the HTTP API server
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print the bcrypt digest of a password
    HashPassword {
        /// Password to hash
        password: String,

        /// Work factor (defaults to auth.bcrypt_cost)
        #[arg(long)]
        cost: Option<u32>,
    },

    /// Send a test prompt to the configured LLM
    CheckLlm {
        /// Prompt to send
        #[arg(long, default_value = "Reply with the single word: ready")]
        prompt: String,
    },
}
