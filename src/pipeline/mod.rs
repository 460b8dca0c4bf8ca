use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::extractors::youtube::YoutubeCaptionProvider;
use crate::extractors::{self, CaptionProvider, TranscriptText};
use crate::summarize::{self, SummarizationClient, SummaryResult};
use crate::InsightsError;

/// How the caller's input string should be read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    Url,
    RawText,
}

/// Input accepted by the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineInput {
    /// Transcript text supplied directly by the caller
    RawText(String),
    /// YouTube link to fetch the transcript from
    VideoUrl(String),
}

impl PipelineInput {
    pub fn new(raw: impl Into<String>, mode: InputMode) -> Self {
        match mode {
            InputMode::Url => PipelineInput::VideoUrl(raw.into()),
            InputMode::RawText => PipelineInput::RawText(raw.into()),
        }
    }

    fn as_str(&self) -> &str {
        match self {
            PipelineInput::RawText(text) | PipelineInput::VideoUrl(text) => text,
        }
    }

    /// Reject blank text or references before any stage runs
    pub fn ensure_not_blank(&self) -> Result<(), InsightsError> {
        if self.as_str().trim().is_empty() {
            return Err(InsightsError::EmptyInput);
        }
        Ok(())
    }
}

/// Transcript to summary pipeline
pub struct InsightsPipeline {
    captions: Box<dyn CaptionProvider>,
    client: Option<SummarizationClient>,
    languages: Vec<String>,
}

impl InsightsPipeline {
    /// Create a pipeline backed by YouTube captions and Gemini
    pub fn new(config: &Config) -> crate::Result<Self> {
        let captions = YoutubeCaptionProvider::new(config.transcript.timeout())?;
        let client = SummarizationClient::from_config(&config.gemini)?;

        Ok(Self::with_components(
            Box::new(captions),
            client,
            config.transcript.languages.clone(),
        ))
    }

    /// Create a pipeline that can only fetch transcripts; needs no Gemini key
    pub fn transcript_only(config: &Config) -> crate::Result<Self> {
        let captions = YoutubeCaptionProvider::new(config.transcript.timeout())?;

        Ok(Self {
            captions: Box::new(captions),
            client: None,
            languages: config.transcript.languages.clone(),
        })
    }

    pub fn with_components(
        captions: Box<dyn CaptionProvider>,
        client: SummarizationClient,
        languages: Vec<String>,
    ) -> Self {
        Self {
            captions,
            client: Some(client),
            languages,
        }
    }

    /// Override the caption language preference list
    pub fn with_languages(mut self, languages: Vec<String>) -> Self {
        if !languages.is_empty() {
            self.languages = languages;
        }
        self
    }

    /// Run the whole pipeline and return the generated narrative
    pub async fn run(&self, input: PipelineInput) -> Result<SummaryResult, InsightsError> {
        input.ensure_not_blank()?;

        let client = self.client.as_ref().ok_or_else(|| {
            InsightsError::BackendUnavailable("no generation backend configured".to_string())
        })?;

        let transcript = self.transcript(input).await?;
        tracing::info!("Transcript ready ({} characters)", transcript.as_str().len());

        let request = summarize::build_request(transcript);
        let summary = client.summarize(&request).await?;

        tracing::info!("Summary generated ({} characters)", summary.text.len());
        Ok(summary)
    }

    /// `run` taking the input string and its mode separately
    pub async fn run_with_mode(
        &self,
        raw: &str,
        mode: InputMode,
    ) -> Result<SummaryResult, InsightsError> {
        self.run(PipelineInput::new(raw, mode)).await
    }

    /// Produce the transcript for an input without summarizing it
    pub async fn transcript(&self, input: PipelineInput) -> Result<TranscriptText, InsightsError> {
        input.ensure_not_blank()?;

        match input {
            PipelineInput::RawText(text) => {
                tracing::info!("Using caller supplied transcript");
                Ok(TranscriptText::from_raw(text))
            }
            PipelineInput::VideoUrl(url) => {
                let reference = extractors::normalize(&url)?;
                tracing::info!("Normalized reference: {}", reference);

                extractors::fetch_transcript(self.captions.as_ref(), &reference, &self.languages).await
            }
        }
    }
}
