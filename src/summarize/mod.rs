use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod gemini;
pub mod prompts;

pub use gemini::GeminiBackend;
pub use prompts::INSIGHTS_PROMPT;

use crate::config::GeminiConfig;
use crate::extractors::TranscriptText;
use crate::InsightsError;

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    Human,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::Human => write!(f, "human"),
        }
    }
}

/// A role tagged message sent to the generation backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// Instruction followed by the transcript to summarize
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRequest {
    messages: Vec<Message>,
}

impl SummaryRequest {
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }
}

/// Wrap a transcript into the two message exchange, system instruction first.
///
/// The transcript is passed through untouched; length limits are left to the backend.
pub fn build_request(transcript: TranscriptText) -> SummaryRequest {
    SummaryRequest {
        messages: vec![
            Message {
                role: Role::System,
                content: INSIGHTS_PROMPT.to_string(),
            },
            Message {
                role: Role::Human,
                content: transcript.into_string(),
            },
        ],
    }
}

/// Narrative produced by the generation backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub text: String,
}

impl fmt::Display for SummaryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Trait for remote language generation services
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Send the ordered messages and return the generated text
    async fn generate(&self, messages: &[Message]) -> Result<String, InsightsError>;

    /// Model identifier used for logging
    fn model_name(&self) -> String;
}

/// Sends summary requests to a generation backend
pub struct SummarizationClient {
    backend: Box<dyn GenerationBackend>,
}

impl SummarizationClient {
    pub fn new(backend: Box<dyn GenerationBackend>) -> Self {
        Self { backend }
    }

    /// Create a client talking to Gemini
    pub fn from_config(config: &GeminiConfig) -> crate::Result<Self> {
        Ok(Self::new(Box::new(GeminiBackend::from_config(config)?)))
    }

    /// Run one generation call; failures are not retried
    pub async fn summarize(&self, request: &SummaryRequest) -> Result<SummaryResult, InsightsError> {
        tracing::info!("Requesting summary from {}", self.backend.model_name());

        let text = self.backend.generate(request.messages()).await?;
        if text.trim().is_empty() {
            return Err(InsightsError::BackendUnavailable(
                "backend returned an empty response".to_string(),
            ));
        }

        Ok(SummaryResult { text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request_puts_instruction_first() {
        let request = build_request(TranscriptText::from_raw("hello world"));
        let messages = request.messages();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[0].content, INSIGHTS_PROMPT);
        assert_eq!(messages[1].role, Role::Human);
        assert_eq!(messages[1].content, "hello world");
    }

    #[test]
    fn test_build_request_is_deterministic() {
        let transcript = "so today we look at the market";
        assert_eq!(
            build_request(TranscriptText::from_raw(transcript)),
            build_request(TranscriptText::from_raw(transcript))
        );
    }

    #[test]
    fn test_build_request_does_not_truncate() {
        let long = "word ".repeat(100_000);
        let request = build_request(TranscriptText::from_raw(long.clone()));
        assert_eq!(request.messages()[1].content, long);
    }

    #[tokio::test]
    async fn test_summarize_returns_text_verbatim() {
        let mut backend = MockGenerationBackend::new();
        backend.expect_model_name().return_const("test-model".to_string());
        backend
            .expect_generate()
            .withf(|messages| messages.len() == 2 && messages[0].role == Role::System)
            .times(1)
            .returning(|_| Ok("  ## Key Points\n- growth  ".to_string()));

        let client = SummarizationClient::new(Box::new(backend));
        let result = client
            .summarize(&build_request(TranscriptText::from_raw("text")))
            .await
            .unwrap();

        assert_eq!(result.text, "  ## Key Points\n- growth  ");
    }

    #[tokio::test]
    async fn test_summarize_rejects_empty_response() {
        let mut backend = MockGenerationBackend::new();
        backend.expect_model_name().return_const("test-model".to_string());
        backend.expect_generate().returning(|_| Ok("   ".to_string()));

        let client = SummarizationClient::new(Box::new(backend));
        let err = client
            .summarize(&build_request(TranscriptText::from_raw("text")))
            .await
            .unwrap_err();

        assert!(matches!(err, InsightsError::BackendUnavailable(_)));
    }

    #[tokio::test]
    async fn test_summarize_does_not_retry() {
        let mut backend = MockGenerationBackend::new();
        backend.expect_model_name().return_const("test-model".to_string());
        backend
            .expect_generate()
            .times(1)
            .returning(|_| Err(InsightsError::BackendUnavailable("quota exceeded".to_string())));

        let client = SummarizationClient::new(Box::new(backend));
        let err = client
            .summarize(&build_request(TranscriptText::from_raw("text")))
            .await
            .unwrap_err();

        assert_eq!(err, InsightsError::BackendUnavailable("quota exceeded".to_string()));
    }
}
