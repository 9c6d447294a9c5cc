//! OpenAI-compatible chat completions client and the analyzer built on it

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ContractAnalysis, ContractAnalyzer};
use crate::config::LlmConfig;
use crate::error::{Error, Result};

const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Client for `POST {base_url}/chat/completions`
#[derive(Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f64,
}

impl ChatClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(Error::Config("llm.api_key is empty".to_string()));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one system + user exchange and return the reply text
    pub async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let start = Instant::now();

        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.temperature,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let snippet: String = body.chars().take(800).collect();
            return Err(Error::Analysis(format!(
                "LLM API returned {}: {}",
                status.as_u16(),
                snippet
            )));
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| Error::Analysis(format!("unexpected LLM API response: {}", e)))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .ok_or_else(|| Error::Analysis("LLM response had no message content".to_string()))?;

        tracing::debug!(
            model = %self.model,
            latency_ms = start.elapsed().as_millis() as u64,
            "LLM completion received"
        );

        Ok(content)
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatMessageOut>,
}

#[derive(Debug, Deserialize)]
struct ChatMessageOut {
    content: Option<String>,
}

/// Build the extraction prompt for a contract
pub(crate) fn build_prompt(contract_text: &str) -> String {
    format!(
        r#"Extract the following information from the contract below and return it exactly in this JSON format:
{{
    "parties": ["party 1", "party 2"],
    "monetary_values": ["$1,000.00", "$50,000.00"],
    "obligations": ["obligation 1", "obligation 2"],
    "additional_data": "text describing the object and term of the contract",
    "termination_clauses": "text with the termination clauses"
}}

Contract:
{}"#,
        contract_text
    )
}

/// The slice from the first `{` to the last `}`, if there is one
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Analyzer that asks an LLM to fill in [`ContractAnalysis`]
#[derive(Clone)]
pub struct LlmAnalyzer {
    client: ChatClient,
}

impl LlmAnalyzer {
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ContractAnalyzer for LlmAnalyzer {
    async fn analyze(&self, contract_text: &str) -> Result<ContractAnalysis> {
        let reply = self
            .client
            .complete(SYSTEM_PROMPT, &build_prompt(contract_text))
            .await?;

        let json = extract_json_object(&reply)
            .ok_or_else(|| Error::Analysis("LLM reply contained no JSON object".to_string()))?;

        serde_json::from_str(json)
            .map_err(|e| Error::Analysis(format!("LLM reply was not valid analysis JSON: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_object() {
        let reply = "Sure! Here is the data:\n```json\n{\"parties\": [\"A\"]}\n```";
        assert_eq!(extract_json_object(reply), Some("{\"parties\": [\"A\"]}"));
    }

    #[test]
    fn test_extract_json_object_nested() {
        let reply = "{\"a\": {\"b\": 1}} trailing";
        assert_eq!(extract_json_object(reply), Some("{\"a\": {\"b\": 1}}"));
    }

    #[test]
    fn test_extract_json_object_missing() {
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("} backwards {"), None);
    }

    #[test]
    fn test_prompt_embeds_contract_and_shape() {
        let prompt = build_prompt("THE CONTRACT TEXT");
        assert!(prompt.ends_with("THE CONTRACT TEXT"));
        assert!(prompt.contains("\"termination_clauses\""));
        assert!(prompt.contains("\"monetary_values\""));
    }

    #[test]
    fn test_reply_parses_into_analysis() {
        let reply = r#"Here you go: {"parties": ["Acme", "Globex"], "monetary_values": ["$10"], "obligations": ["Ship"], "additional_data": "12 months", "termination_clauses": ["30 days notice"]}"#;
        let analysis: ContractAnalysis =
            serde_json::from_str(extract_json_object(reply).unwrap()).unwrap();
        assert_eq!(analysis.parties, vec!["Acme", "Globex"]);
        assert_eq!(analysis.termination_clauses, "30 days notice");
    }

    #[test]
    fn test_client_requires_key() {
        assert!(ChatClient::from_config(&LlmConfig::default()).is_err());
    }

    #[test]
    fn test_completion_response_parsing() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"hi"}}]}"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        let content = parsed.choices[0].message.as_ref().unwrap().content.as_deref();
        assert_eq!(content, Some("hi"));
    }
}
