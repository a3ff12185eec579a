//! Groq chat-completions narrator (OpenAI-compatible API)

use super::{parse_intent_json, parse_suggestions, prompts, Narrator};
use crate::config::AppConfig;
use crate::error::NarrationError;
use crate::models::{DataQualityWarning, Intent, MetricKind, MetricResult, SummaryStats};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const LOG_BODY_CHARS: usize = 200;

#[derive(Debug, Serialize)]
struct GroqRequest {
    model: String,
    messages: Vec<GroqMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GroqMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct GroqResponse {
    #[serde(default)]
    choices: Vec<GroqChoice>,
    usage: Option<GroqUsage>,
}

#[derive(Debug, Deserialize)]
struct GroqChoice {
    message: GroqMessage,
}

#[derive(Debug, Deserialize)]
struct GroqUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

/// Sampling settings for one kind of call
#[derive(Debug, Clone, Copy)]
struct CallProfile {
    label: &'static str,
    temperature: f64,
    max_tokens: u32,
}

const INTENT: CallProfile = CallProfile {
    label: "intent",
    temperature: 0.1,
    max_tokens: 1024,
};
const SUMMARY: CallProfile = CallProfile {
    label: "summary",
    temperature: 0.5,
    max_tokens: 1024,
};
const LEADERSHIP: CallProfile = CallProfile {
    label: "leadership",
    temperature: 0.4,
    max_tokens: 1500,
};
const SUGGESTIONS: CallProfile = CallProfile {
    label: "suggestions",
    temperature: 0.7,
    max_tokens: 256,
};

#[derive(Clone)]
pub struct GroqNarrator {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
    timeout: Duration,
}

impl std::fmt::Debug for GroqNarrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroqNarrator")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GroqNarrator {
    /// `api_url` is the API base, e.g. `https://api.groq.com/openai/v1`
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        api_url: &str,
        timeout: Duration,
    ) -> Result<Self, NarrationError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(NarrationError::unreachable("Groq API key cannot be empty"));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NarrationError::unreachable(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            model: model.into(),
            endpoint: format!("{}/chat/completions", api_url.trim_end_matches('/')),
            timeout,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, NarrationError> {
        Self::new(
            config.groq_api_key.clone(),
            config.groq_model.clone(),
            &config.groq_api_url,
            config.llm_timeout,
        )
    }

    fn transport_error(&self, error: reqwest::Error) -> NarrationError {
        if error.is_timeout() {
            NarrationError::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            NarrationError::unreachable(error.to_string())
        }
    }

    /// One system + user exchange; returns the first choice's content
    async fn chat(
        &self,
        profile: CallProfile,
        system: &str,
        user: String,
    ) -> Result<String, NarrationError> {
        let start = Instant::now();
        let request = GroqRequest {
            model: self.model.clone(),
            messages: vec![
                GroqMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                GroqMessage {
                    role: "user".to_string(),
                    content: user,
                },
            ],
            max_tokens: Some(profile.max_tokens),
            temperature: Some(profile.temperature),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                call = profile.label,
                status = status.as_u16(),
                body = %body.chars().take(LOG_BODY_CHARS).collect::<String>(),
                "Groq API error"
            );
            return Err(NarrationError::unreachable(format!(
                "HTTP {}",
                status.as_u16()
            )));
        }

        let payload: GroqResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                self.transport_error(e)
            } else {
                NarrationError::malformed(format!("invalid JSON body: {}", e))
            }
        })?;

        let content = payload
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| NarrationError::malformed("Empty response from Groq"))?;

        if let Some(usage) = payload.usage {
            debug!(
                call = profile.label,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Groq token usage"
            );
        }
        info!(
            call = profile.label,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Groq call completed"
        );
        Ok(content.trim().to_string())
    }

    fn non_empty(text: String) -> Result<String, NarrationError> {
        if text.is_empty() {
            Err(NarrationError::malformed("model returned empty text"))
        } else {
            Ok(text)
        }
    }
}

#[async_trait]
impl Narrator for GroqNarrator {
    async fn classify_intent(
        &self,
        question: &str,
        sectors: &[String],
    ) -> Result<Intent, NarrationError> {
        let reply = self
            .chat(
                INTENT,
                prompts::INTENT_SYSTEM,
                prompts::intent_prompt(question, sectors),
            )
            .await?;
        parse_intent_json(&reply, question)
    }

    async fn narrate_summary(
        &self,
        question: &str,
        metrics: &[MetricResult],
        warnings: &[DataQualityWarning],
        stats: &SummaryStats,
    ) -> Result<String, NarrationError> {
        let reply = self
            .chat(
                SUMMARY,
                prompts::SUMMARY_SYSTEM,
                prompts::summary_prompt(question, metrics, warnings, stats),
            )
            .await?;
        Self::non_empty(reply)
    }

    async fn narrate_leadership(
        &self,
        metrics: &[MetricResult],
        warnings: &[DataQualityWarning],
        stats: &SummaryStats,
    ) -> Result<String, NarrationError> {
        let reply = self
            .chat(
                LEADERSHIP,
                prompts::LEADERSHIP_SYSTEM,
                prompts::leadership_prompt(metrics, warnings, stats),
            )
            .await?;
        Self::non_empty(reply)
    }

    async fn suggest_follow_ups(
        &self,
        question: &str,
        kind: MetricKind,
        sectors: &[String],
    ) -> Vec<String> {
        let reply = match self
            .chat(
                SUGGESTIONS,
                prompts::SUGGESTIONS_SYSTEM,
                prompts::suggestions_prompt(question, kind, sectors),
            )
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Follow-up suggestions unavailable");
                return Vec::new();
            }
        };

        parse_suggestions(&reply).unwrap_or_else(|| {
            warn!("Follow-up suggestions were not a JSON array of strings");
            Vec::new()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_base_url() {
        let narrator = GroqNarrator::new(
            "key",
            "model",
            "https://api.groq.com/openai/v1/",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            narrator.endpoint,
            "https://api.groq.com/openai/v1/chat/completions"
        );
    }

    #[test]
    fn test_empty_key_rejected() {
        assert!(GroqNarrator::new("", "model", "http://x", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_debug_redacts_key() {
        let narrator =
            GroqNarrator::new("secret-key", "m", "http://x", Duration::from_secs(1)).unwrap();
        assert!(!format!("{:?}", narrator).contains("secret-key"));
    }

    #[test]
    fn test_request_serialises_openai_shape() {
        let request = GroqRequest {
            model: "m".to_string(),
            messages: vec![GroqMessage {
                role: "user".to_string(),
                content: "hi".to_string(),
            }],
            max_tokens: Some(256),
            temperature: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["max_tokens"], 256);
        assert!(json.get("temperature").is_none());
    }
}
