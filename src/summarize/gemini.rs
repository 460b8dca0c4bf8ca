use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{GenerationBackend, Message, Role};
use crate::config::GeminiConfig;
use crate::InsightsError;

/// Google Gemini `generateContent` backend
pub struct GeminiBackend {
    http: Client,
    api_key: String,
    model: String,
    endpoint: String,
    temperature: f32,
}

impl GeminiBackend {
    pub fn from_config(config: &GeminiConfig) -> crate::Result<Self> {
        let api_key = config.api_key.as_deref().unwrap_or_default().trim().to_string();
        if api_key.is_empty() {
            anyhow::bail!(
                "Gemini API key is missing. Set gemini.api_key in config or GOOGLE_API_KEY."
            );
        }

        Ok(Self {
            http: Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()
                .context("Failed to build Gemini HTTP client")?,
            api_key,
            model: config.model.trim().to_string(),
            endpoint: config.endpoint.trim().trim_end_matches('/').to_string(),
            temperature: config.temperature,
        })
    }

    fn request_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    fn request_body(&self, messages: &[Message]) -> GenerateContentRequest {
        let system_parts: Vec<Part> = messages
            .iter()
            .filter(|message| message.role == Role::System)
            .map(|message| Part {
                text: message.content.clone(),
            })
            .collect();

        let contents = messages
            .iter()
            .filter(|message| message.role == Role::Human)
            .map(|message| Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: message.content.clone(),
                }],
            })
            .collect();

        GenerateContentRequest {
            system_instruction: (!system_parts.is_empty()).then(|| Content {
                role: None,
                parts: system_parts,
            }),
            contents,
            generation_config: GenerationConfig {
                temperature: self.temperature,
            },
        }
    }
}

#[async_trait]
impl GenerationBackend for GeminiBackend {
    async fn generate(&self, messages: &[Message]) -> Result<String, InsightsError> {
        let body = self.request_body(messages);

        tracing::debug!(
            "Sending {} messages to Gemini model {} (temperature {})",
            messages.len(),
            self.model,
            self.temperature
        );

        let response = self
            .http
            .post(self.request_url())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(backend_error)?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<ErrorResponse>()
                .await
                .map(|e| e.error.message)
                .unwrap_or_else(|_| status.to_string());

            return Err(InsightsError::BackendUnavailable(format!(
                "Gemini returned {}: {}",
                status, detail
            )));
        }

        let payload: GenerateContentResponse = response.json().await.map_err(|e| {
            InsightsError::BackendUnavailable(format!("failed to parse Gemini response: {}", e))
        })?;

        payload.into_text().ok_or_else(|| {
            InsightsError::BackendUnavailable("Gemini response did not contain any text".to_string())
        })
    }

    fn model_name(&self) -> String {
        self.model.clone()
    }
}

fn backend_error(err: reqwest::Error) -> InsightsError {
    if err.is_timeout() {
        InsightsError::BackendUnavailable("request to Gemini timed out".to_string())
    } else {
        InsightsError::BackendUnavailable(format!("Gemini request failed: {}", err))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, parts concatenated
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().map(|part| part.text).collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}
