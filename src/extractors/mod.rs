use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod reference;
pub mod youtube;

pub use reference::{extract_video_id, normalize, VideoReference};

use crate::InsightsError;

/// One caption cue as returned by the captioning service; timing is dropped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub text: String,
}

impl TranscriptSegment {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Full transcript of a video, segments joined by a single space
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptText(String);

impl TranscriptText {
    /// Join segment texts in order with a single space
    pub fn from_segments(segments: &[TranscriptSegment]) -> Self {
        let text = segments
            .iter()
            .map(|segment| segment.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        Self(text)
    }

    /// Wrap caller supplied transcript text as-is
    pub fn from_raw(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for TranscriptText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trait for retrieving caption segments from a captioning service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CaptionProvider: Send + Sync {
    /// Fetch the segments of the first track available in `languages` order
    async fn fetch_segments(
        &self,
        video_id: &str,
        languages: &[String],
    ) -> Result<Vec<TranscriptSegment>, InsightsError>;

    /// Get the name of the captioning service
    fn platform_name(&self) -> &'static str;
}

/// Fetch the transcript of a canonical reference as one text blob
pub async fn fetch_transcript(
    provider: &dyn CaptionProvider,
    reference: &VideoReference,
    languages: &[String],
) -> Result<TranscriptText, InsightsError> {
    let video_id = reference.video_id()?;

    tracing::info!(
        "Fetching {} transcript for video {} (languages: {})",
        provider.platform_name(),
        video_id,
        languages.join(", ")
    );

    let segments = provider.fetch_segments(video_id, languages).await?;
    tracing::debug!("Received {} transcript segments", segments.len());

    let text = TranscriptText::from_segments(&segments);
    if text.is_blank() {
        return Err(InsightsError::TranscriptFetchFailed(format!(
            "caption track for video {} contained no text",
            video_id
        )));
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    fn langs(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_segments_are_joined_with_single_space() {
        let segments = vec![TranscriptSegment::new("hello"), TranscriptSegment::new("world")];
        assert_eq!(TranscriptText::from_segments(&segments).as_str(), "hello world");
    }

    #[test]
    fn test_no_segments_yield_empty_text() {
        assert!(TranscriptText::from_segments(&[]).is_blank());
    }

    #[tokio::test]
    async fn test_fetch_transcript_passes_id_and_languages() {
        let mut provider = MockCaptionProvider::new();
        provider.expect_platform_name().return_const("YouTube");
        provider
            .expect_fetch_segments()
            .with(eq("abc123"), eq(langs(&["de", "en"])))
            .times(1)
            .returning(|_, _| {
                Ok(vec![
                    TranscriptSegment::new("first"),
                    TranscriptSegment::new("second"),
                    TranscriptSegment::new("third"),
                ])
            });

        let reference = normalize("https://youtu.be/abc123?t=5").unwrap();
        let text = fetch_transcript(&provider, &reference, &langs(&["de", "en"]))
            .await
            .unwrap();

        assert_eq!(text.as_str(), "first second third");
    }

    #[tokio::test]
    async fn test_fetch_transcript_rejects_blank_track() {
        for segments in [vec![], vec![TranscriptSegment::new(""), TranscriptSegment::new("  ")]] {
            let mut provider = MockCaptionProvider::new();
            provider.expect_platform_name().return_const("YouTube");
            provider
                .expect_fetch_segments()
                .times(1)
                .returning(move |_, _| Ok(segments.clone()));

            let reference = normalize("https://youtu.be/abc123").unwrap();
            let err = fetch_transcript(&provider, &reference, &langs(&["en"]))
                .await
                .unwrap_err();

            assert!(matches!(err, InsightsError::TranscriptFetchFailed(_)));
        }
    }

    #[tokio::test]
    async fn test_fetch_transcript_propagates_provider_error() {
        let mut provider = MockCaptionProvider::new();
        provider.expect_platform_name().return_const("YouTube");
        provider
            .expect_fetch_segments()
            .returning(|id, _| Err(InsightsError::TranscriptsDisabled(id.to_string())));

        let reference = normalize("https://www.youtube.com/watch?v=abc123").unwrap();
        let err = fetch_transcript(&provider, &reference, &langs(&["en"]))
            .await
            .unwrap_err();

        assert_eq!(err, InsightsError::TranscriptsDisabled("abc123".to_string()));
    }
}
