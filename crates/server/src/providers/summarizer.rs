//! Summarization HTTP client.
//!
//! Calls a chat-completions endpoint and asks for a JSON object with
//! the summary and action items, then parses that object out of the
//! first choice.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::db::models::Summary;
use crate::providers::{StageError, Summarizer};

const SYSTEM_PROMPT: &str = "You are a helpful recording summarization assistant. \
    Analyze the following transcript and provide TWO separate sections:\n\
    1. SUMMARY: A concise summary including key topics, main ideas, and important takeaways.\n\
    2. ACTION_ITEMS: A list of actionable items based on the recording content.\n\n\
    Format your response as a JSON object with two keys: 'summary' and 'action_items'.";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    response_format: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: String,
}

/// HTTP client for the summarization service.
#[derive(Clone)]
pub struct HttpSummarizer {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl HttpSummarizer {
    /// Create a new summarizer client.
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl Summarizer for HttpSummarizer {
    async fn invoke(&self, transcript: &str) -> Result<Summary, StageError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: transcript,
                },
            ],
            temperature: 0.7,
            response_format: json!({"type": "json_object"}),
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StageError::Rejected(format!(
                "summarizer returned {}: {}",
                status, body
            )));
        }

        let chat: ChatResponse = response.json().await?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                StageError::Malformed("summarizer response carried no choices".to_string())
            })?;

        let summary: Summary = serde_json::from_str(&content).map_err(|e| {
            StageError::Malformed(format!("summarizer content is not a summary object: {}", e))
        })?;

        Ok(summary)
    }
}
