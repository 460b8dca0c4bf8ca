//! YT Insights - A Rust CLI tool for summarizing YouTube videos
//!
//! This library fetches the caption track of a YouTube video, or accepts a raw transcript,
//! and asks Google Gemini for a long-form insight summary of the content.

pub mod cli;
pub mod config;
pub mod extractors;
pub mod output;
pub mod pipeline;
pub mod summarize;

pub use cli::{Cli, Commands, OutputFormat};
pub use config::Config;
pub use extractors::{CaptionProvider, TranscriptSegment, TranscriptText, VideoReference};
pub use pipeline::{InputMode, InsightsPipeline, PipelineInput};
pub use summarize::{GenerationBackend, SummarizationClient, SummaryRequest, SummaryResult};

/// Result type used by the application glue (config, CLI, output)
pub type Result<T> = anyhow::Result<T>;

/// Failure kinds reported by the pipeline stages
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum InsightsError {
    #[error("Invalid video reference: {0}")]
    InvalidReferenceFormat(String),

    #[error("Transcripts are disabled for video {0}")]
    TranscriptsDisabled(String),

    #[error("No transcript found for video {video_id} in [{}] (available: [{}])", .requested.join(", "), .available.join(", "))]
    TranscriptNotFound {
        video_id: String,
        requested: Vec<String>,
        available: Vec<String>,
    },

    #[error("Video {video_id} is unavailable: {reason}")]
    VideoUnavailable { video_id: String, reason: String },

    #[error("Transcript fetch failed: {0}")]
    TranscriptFetchFailed(String),

    #[error("Please enter a transcript or a video URL")]
    EmptyInput,

    #[error("Generation backend unavailable: {0}")]
    BackendUnavailable(String),
}
