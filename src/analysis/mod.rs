//! Contract analysis: turning extracted text into structured terms

mod llm;
mod mock;

pub use llm::{extract_json_object, ChatClient, LlmAnalyzer};
pub use mock::MockAnalyzer;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use crate::config::{LlmConfig, LlmProvider};
use crate::error::Result;

/// Key terms pulled out of a contract
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContractAnalysis {
    #[serde(default, deserialize_with = "list_field")]
    pub parties: Vec<String>,

    #[serde(default, deserialize_with = "list_field")]
    pub monetary_values: Vec<String>,

    #[serde(default, deserialize_with = "list_field")]
    pub obligations: Vec<String>,

    /// Subject matter, term and other notable details
    #[serde(default, deserialize_with = "text_field")]
    pub additional_data: String,

    #[serde(default, deserialize_with = "text_field")]
    pub termination_clauses: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrList {
    Text(String),
    List(Vec<String>),
}

/// Accept either a list of strings or a single string
fn list_field<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<String>, D::Error> {
    Ok(match Option::<TextOrList>::deserialize(deserializer)? {
        Some(TextOrList::List(items)) => items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Some(TextOrList::Text(text)) if !text.trim().is_empty() => vec![text.trim().to_string()],
        _ => Vec::new(),
    })
}

/// Accept either a string or a list of strings joined with "; "
fn text_field<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    Ok(match Option::<TextOrList>::deserialize(deserializer)? {
        Some(TextOrList::Text(text)) => text.trim().to_string(),
        Some(TextOrList::List(items)) => items
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("; "),
        None => String::new(),
    })
}

#[async_trait]
pub trait ContractAnalyzer: Send + Sync {
    async fn analyze(&self, contract_text: &str) -> Result<ContractAnalysis>;
}

/// Build the analyzer for this configuration, or `None` when analysis is disabled
pub fn build_analyzer(config: &LlmConfig) -> Result<Option<Arc<dyn ContractAnalyzer>>> {
    if !config.is_enabled() {
        tracing::warn!("No LLM API key configured; contract uploads will be refused");
        return Ok(None);
    }

    match config.provider {
        LlmProvider::Mock => {
            tracing::info!("Using the mock contract analyzer");
            Ok(Some(Arc::new(MockAnalyzer)))
        }
        LlmProvider::OpenAi => {
            tracing::info!(model = %config.model, base_url = %config.base_url, "LLM analysis enabled");
            let client = ChatClient::from_config(config)?;
            Ok(Some(Arc::new(LlmAnalyzer::new(client))))
        }
    }
}
