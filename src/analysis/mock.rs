//! Canned analyzer for development and tests

use async_trait::async_trait;

use super::{ContractAnalysis, ContractAnalyzer};
use crate::error::Result;

/// How much of the contract text is echoed back in `additional_data`
const EXCERPT_CHARS: usize = 500;

/// Returns the same analysis for every contract, plus an excerpt of its text
#[derive(Debug, Clone, Copy, Default)]
pub struct MockAnalyzer;

#[async_trait]
impl ContractAnalyzer for MockAnalyzer {
    async fn analyze(&self, contract_text: &str) -> Result<ContractAnalysis> {
        tracing::debug!("Analyzing contract with the mock analyzer");

        let excerpt: String = contract_text.chars().take(EXCERPT_CHARS).collect();

        Ok(ContractAnalysis {
            parties: vec!["Company X".to_string(), "Client Y".to_string()],
            monetary_values: vec!["$100,000.00".to_string(), "$50,000.00".to_string()],
            obligations: vec![
                "Deliver the service within 12 months.".to_string(),
                "Pay in 5 equal monthly installments.".to_string(),
            ],
            additional_data: format!(
                "Object: IT consulting services. Term: 01/01/2024 to 12/31/2024.\n{}",
                excerpt
            ),
            termination_clauses:
                "Either party may terminate the contract with 30 days prior notice.".to_string(),
        })
    }
}
