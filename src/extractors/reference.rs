use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::InsightsError;

/// Host of YouTube share links (`https://youtu.be/<id>?si=...`)
const SHORT_LINK_HOST: &str = "youtu.be";

/// Query marker carrying the video id in canonical watch URLs
const WATCH_MARKER: &str = "watch?v=";

const CANONICAL_PREFIX: &str = "https://www.youtube.com/watch?v=";

/// A video reference in canonical `watch?v=` form
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoReference(String);

impl VideoReference {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Platform id carried by this reference
    pub fn video_id(&self) -> Result<&str, InsightsError> {
        extract_video_id(&self.0)
    }
}

impl fmt::Display for VideoReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for VideoReference {
    type Err = InsightsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        normalize(s)
    }
}

/// Normalize a user supplied reference into canonical form.
///
/// Share links are rewritten to `https://www.youtube.com/watch?v=<id>`, dropping
/// their query string. References that already contain `watch?v=` are returned
/// unchanged once their id has been checked. Nothing here touches the network.
pub fn normalize(raw: &str) -> Result<VideoReference, InsightsError> {
    let raw = raw.trim();

    if let Some(token) = short_link_token(raw) {
        validate_token(raw, &token)?;

        let canonical = format!("{}{}", CANONICAL_PREFIX, token);
        tracing::debug!("Rewrote short link {} to {}", raw, canonical);
        return Ok(VideoReference(canonical));
    }

    if raw.contains(WATCH_MARKER) {
        extract_video_id(raw)?;
        return Ok(VideoReference(raw.to_string()));
    }

    Err(InsightsError::InvalidReferenceFormat(format!(
        "'{}' is neither a youtu.be link nor a youtube.com/watch?v= URL",
        raw
    )))
}

/// Trailing path segment of a `youtu.be` link, `None` for any other host
fn short_link_token(raw: &str) -> Option<String> {
    let candidate = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    };

    let url = Url::parse(&candidate).ok()?;
    let host = url.host_str()?;
    if host != SHORT_LINK_HOST && host != "www.youtu.be" {
        return None;
    }

    Some(url.path().rsplit('/').next().unwrap_or_default().to_string())
}

/// Pull the video id out of a canonical reference, stopping at the next `&`
pub fn extract_video_id(reference: &str) -> Result<&str, InsightsError> {
    let idx = reference.find(WATCH_MARKER).ok_or_else(|| {
        InsightsError::InvalidReferenceFormat(format!("'{}' has no {} marker", reference, WATCH_MARKER))
    })?;

    let rest = &reference[idx + WATCH_MARKER.len()..];
    let token = rest.split(['&', '#']).next().unwrap_or_default();
    validate_token(reference, token)?;

    Ok(token)
}

fn validate_token(reference: &str, token: &str) -> Result<(), InsightsError> {
    if token.is_empty() {
        return Err(InsightsError::InvalidReferenceFormat(format!(
            "'{}' does not contain a video id",
            reference
        )));
    }

    if !token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(InsightsError::InvalidReferenceFormat(format!(
            "'{}' is not a valid video id",
            token
        )));
    }

    Ok(())
}
