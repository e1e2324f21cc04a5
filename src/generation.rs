use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tokio::task::JoinSet;

use crate::config::GenerationConfig;
use crate::error::{Error, Result};
use crate::kpi::hashtags::normalize_hashtags;
use crate::tasks::{GeneratedContent, GenerationOutcome, GenerationRequest};
use crate::RawHashtags;

/// Chat-completions client that turns generation requests into post drafts.
#[derive(Clone)]
pub struct GenerationClient {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
    temperature: f64,
    timeout: Duration,
}

impl GenerationClient {
    /// Returns `None` when no API key is configured.
    pub fn from_config(config: &GenerationConfig) -> Option<Self> {
        let api_key = config.api_key.clone()?;
        let timeout = Duration::from_millis(config.timeout_ms.max(1));
        let client = reqwest::Client::builder().timeout(timeout).build().ok()?;
        Some(Self {
            client,
            api_key,
            api_base: config.api_base.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            timeout,
        })
    }

    pub async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedContent> {
        let url = format!("{}/chat/completions", self.api_base.trim_end_matches('/'));
        let body = ChatRequest {
            model: self.model.clone(),
            temperature: self.temperature,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: "You write social media posts and answer with JSON only.".to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.prompt.clone(),
                },
            ],
        };

        let response = self
            .client
            .post(url)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|err| Error::Generation(format!("request failed: {}", err)))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let detail = error_body.trim();
            if detail.is_empty() {
                return Err(Error::Generation(format!("API error: {}", status)));
            }
            return Err(Error::Generation(format!("API error: {} {}", status, detail)));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|err| Error::Generation(format!("response parse failed: {}", err)))?;

        let content = body
            .choices
            .first()
            .ok_or_else(|| Error::Generation("response missing choices".to_string()))?
            .message
            .content
            .trim()
            .to_string();

        parse_generated(&content)
    }

    /// Resolves every request concurrently. Each call is bounded by the
    /// client timeout; a failed or slow call only fails its own request.
    pub async fn resolve_all(
        &self,
        requests: &[GenerationRequest],
    ) -> HashMap<String, GenerationOutcome> {
        let mut set = JoinSet::new();
        for request in requests.iter().cloned() {
            let client = self.clone();
            set.spawn(async move {
                let outcome = match tokio::time::timeout(client.timeout, client.generate(&request)).await {
                    Ok(Ok(generated)) => GenerationOutcome::Generated(generated),
                    Ok(Err(err)) => GenerationOutcome::Failed {
                        reason: err.to_string(),
                    },
                    Err(_) => GenerationOutcome::Failed {
                        reason: format!("timed out after {} ms", client.timeout.as_millis()),
                    },
                };
                (request.id, outcome)
            });
        }

        let mut outcomes = HashMap::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((id, outcome)) => {
                    if let GenerationOutcome::Failed { reason } = &outcome {
                        tracing::warn!(request_id = %id, %reason, "generation request failed");
                    }
                    outcomes.insert(id, outcome);
                }
                Err(err) => tracing::warn!(error = %err, "generation task panicked"),
            }
        }
        outcomes
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: String,
}

#[derive(Deserialize)]
struct GeneratedWire {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: String,
    #[serde(default)]
    hashtags: Option<RawHashtags>,
}

/// Parses the model's JSON answer, tolerating surrounding prose.
pub fn parse_generated(text: &str) -> Result<GeneratedContent> {
    let json = extract_json(text)
        .ok_or_else(|| Error::Generation("response missing JSON".to_string()))?;
    let wire: GeneratedWire = serde_json::from_str(&json)
        .map_err(|err| Error::Generation(format!("JSON parse failed: {}", err)))?;

    let content = wire.content.trim().to_string();
    if content.is_empty() {
        return Err(Error::Generation("response has empty content".to_string()));
    }

    Ok(GeneratedContent {
        title: wire
            .title
            .map(|title| title.trim().to_string())
            .filter(|title| !title.is_empty()),
        content,
        hashtags: wire
            .hashtags
            .as_ref()
            .map(normalize_hashtags)
            .unwrap_or_default(),
    })
}

fn extract_json(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if start >= end {
        return None;
    }
    Some(text[start..=end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fenced_json_with_string_hashtags() {
        let text = "```json\n{\"title\": \"Morning\", \"content\": \"Coffee first.\", \"hashtags\": \"#coffee #morning\"}\n```";
        let generated = parse_generated(text).expect("parse");
        assert_eq!(generated.title.as_deref(), Some("Morning"));
        assert_eq!(generated.content, "Coffee first.");
        assert_eq!(generated.hashtags, vec!["coffee", "morning"]);
    }

    #[test]
    fn rejects_missing_or_empty_content() {
        assert!(parse_generated("no json here").is_err());
        assert!(parse_generated("{\"content\": \"  \"}").is_err());
    }
}
