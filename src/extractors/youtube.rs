use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{ACCEPT_LANGUAGE, COOKIE};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use url::Url;

use super::{CaptionProvider, TranscriptSegment};
use crate::InsightsError;

const WATCH_URL: &str = "https://www.youtube.com/watch?v=";
const INNERTUBE_PLAYER_URL: &str = "https://www.youtube.com/youtubei/v1/player";
const INNERTUBE_CLIENT_NAME: &str = "ANDROID";
const INNERTUBE_CLIENT_VERSION: &str = "20.10.38";

const CONSENT_FORM_MARKER: &str = r#"action="https://consent.youtube.com/s""#;
const RECAPTCHA_MARKER: &str = r#"class="g-recaptcha""#;

/// YouTube caption extractor talking to the InnerTube API
pub struct YoutubeCaptionProvider {
    client: Client,
}

impl YoutubeCaptionProvider {
    pub fn new(timeout: Duration) -> crate::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build YouTube HTTP client")?;

        Ok(Self { client })
    }

    /// Load the watch page, accepting the EU consent form once if it shows up
    async fn fetch_watch_page(&self, video_id: &str) -> Result<String, InsightsError> {
        let url = format!("{}{}", WATCH_URL, video_id);
        let html = self.get_text(&url, None).await?;

        if !html.contains(CONSENT_FORM_MARKER) {
            return Ok(html);
        }

        let consent_value = extract_between(&html, r#"name="v" value=""#, "\"").ok_or_else(|| {
            InsightsError::TranscriptFetchFailed("failed to accept the YouTube consent form".to_string())
        })?;

        tracing::debug!("Accepting YouTube consent form for video {}", video_id);
        let cookie = format!("CONSENT=YES+{}", consent_value);
        let html = self.get_text(&url, Some(&cookie)).await?;

        if html.contains(CONSENT_FORM_MARKER) {
            return Err(InsightsError::TranscriptFetchFailed(
                "YouTube kept asking for cookie consent".to_string(),
            ));
        }

        Ok(html)
    }

    async fn fetch_player_response(
        &self,
        video_id: &str,
        api_key: &str,
    ) -> Result<PlayerResponse, InsightsError> {
        tracing::debug!("Requesting InnerTube player response for video {}", video_id);

        let body = json!({
            "context": {
                "client": {
                    "clientName": INNERTUBE_CLIENT_NAME,
                    "clientVersion": INNERTUBE_CLIENT_VERSION,
                }
            },
            "videoId": video_id,
        });

        let response = self
            .client
            .post(INNERTUBE_PLAYER_URL)
            .query(&[("key", api_key)])
            .header(ACCEPT_LANGUAGE, "en-US")
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        check_status(response)?
            .json::<PlayerResponse>()
            .await
            .map_err(|e| InsightsError::TranscriptFetchFailed(format!("invalid player response: {}", e)))
    }

    async fn fetch_track(&self, track: &CaptionTrack) -> Result<Vec<TranscriptSegment>, InsightsError> {
        if track.base_url.contains("&exp=xpe") {
            return Err(InsightsError::TranscriptFetchFailed(
                "caption track requires a proof-of-origin token".to_string(),
            ));
        }

        let url = json3_url(&track.base_url)?;
        tracing::debug!("Downloading {} caption track", track.language_code);

        let body = self.get_text(url.as_str(), None).await?;
        parse_json3(&body)
    }

    async fn get_text(&self, url: &str, cookie: Option<&str>) -> Result<String, InsightsError> {
        let mut request = self.client.get(url).header(ACCEPT_LANGUAGE, "en-US");
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie);
        }

        let response = request.send().await.map_err(transport_error)?;
        check_status(response)?.text().await.map_err(transport_error)
    }
}

#[async_trait]
impl CaptionProvider for YoutubeCaptionProvider {
    async fn fetch_segments(
        &self,
        video_id: &str,
        languages: &[String],
    ) -> Result<Vec<TranscriptSegment>, InsightsError> {
        let html = self.fetch_watch_page(video_id).await?;
        let api_key = innertube_api_key(&html)?;

        let player = self.fetch_player_response(video_id, &api_key).await?;
        let tracks = caption_tracks(video_id, player)?;
        let track = select_track(video_id, &tracks, languages)?;

        tracing::info!(
            "Using {} caption track{} for video {}",
            track.language_code,
            if track.is_generated() { " (auto-generated)" } else { "" },
            video_id
        );

        self.fetch_track(track).await
    }

    fn platform_name(&self) -> &'static str {
        "YouTube"
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerResponse {
    #[serde(default)]
    playability_status: Option<PlayabilityStatus>,
    #[serde(default)]
    captions: Option<Captions>,
}

#[derive(Debug, Deserialize)]
struct PlayabilityStatus {
    status: String,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Captions {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    tracklist: Option<CaptionTracklist>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTracklist {
    #[serde(default)]
    caption_tracks: Vec<CaptionTrack>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    language_code: String,
    #[serde(default)]
    kind: Option<String>,
}

impl CaptionTrack {
    fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }
}

/// YouTube `fmt=json3` timed text payload
#[derive(Debug, Deserialize)]
struct TimedText {
    #[serde(default)]
    events: Vec<TimedTextEvent>,
}

#[derive(Debug, Deserialize)]
struct TimedTextEvent {
    #[serde(default)]
    segs: Vec<TimedTextSeg>,
}

#[derive(Debug, Deserialize)]
struct TimedTextSeg {
    #[serde(default)]
    utf8: String,
}

fn transport_error(err: reqwest::Error) -> InsightsError {
    if err.is_timeout() {
        InsightsError::TranscriptFetchFailed("request to YouTube timed out".to_string())
    } else {
        InsightsError::TranscriptFetchFailed(err.to_string())
    }
}

fn check_status(response: Response) -> Result<Response, InsightsError> {
    if response.status() == StatusCode::TOO_MANY_REQUESTS {
        return Err(InsightsError::TranscriptFetchFailed(
            "too many requests, YouTube is rate limiting this IP".to_string(),
        ));
    }

    response.error_for_status().map_err(transport_error)
}

fn extract_between<'a>(haystack: &'a str, start: &str, end: &str) -> Option<&'a str> {
    let from = haystack.find(start)? + start.len();
    let len = haystack[from..].find(end)?;
    Some(&haystack[from..from + len])
}

fn innertube_api_key(html: &str) -> Result<String, InsightsError> {
    if let Some(key) = extract_between(html, r#""INNERTUBE_API_KEY":""#, "\"") {
        return Ok(key.to_string());
    }

    if html.contains(RECAPTCHA_MARKER) {
        return Err(InsightsError::TranscriptFetchFailed(
            "YouTube is blocking requests from this IP".to_string(),
        ));
    }

    Err(InsightsError::TranscriptFetchFailed(
        "could not find the InnerTube API key on the watch page".to_string(),
    ))
}

/// Check playability and pull the caption tracks out of a player response
fn caption_tracks(video_id: &str, player: PlayerResponse) -> Result<Vec<CaptionTrack>, InsightsError> {
    if let Some(playability) = player.playability_status {
        if playability.status != "OK" {
            let reason = playability.reason.unwrap_or_else(|| playability.status.clone());

            if playability.status == "LOGIN_REQUIRED" && reason.contains("not a bot") {
                return Err(InsightsError::TranscriptFetchFailed(
                    "YouTube requires sign-in to confirm this is not a bot".to_string(),
                ));
            }

            return Err(InsightsError::VideoUnavailable {
                video_id: video_id.to_string(),
                reason,
            });
        }
    }

    let tracks = player
        .captions
        .and_then(|captions| captions.tracklist)
        .map(|tracklist| tracklist.caption_tracks)
        .unwrap_or_default();

    if tracks.is_empty() {
        return Err(InsightsError::TranscriptsDisabled(video_id.to_string()));
    }

    Ok(tracks)
}

/// Pick the first track in language preference order, manual tracks first
fn select_track<'a>(
    video_id: &str,
    tracks: &'a [CaptionTrack],
    languages: &[String],
) -> Result<&'a CaptionTrack, InsightsError> {
    for language in languages {
        let found = tracks
            .iter()
            .filter(|track| track.language_code == *language)
            .min_by_key(|track| track.is_generated());

        if let Some(track) = found {
            return Ok(track);
        }
    }

    Err(InsightsError::TranscriptNotFound {
        video_id: video_id.to_string(),
        requested: languages.to_vec(),
        available: tracks
            .iter()
            .map(|track| {
                if track.is_generated() {
                    format!("{} (auto)", track.language_code)
                } else {
                    track.language_code.clone()
                }
            })
            .collect(),
    })
}

/// Rewrite a caption track URL to request the json3 format
fn json3_url(base_url: &str) -> Result<Url, InsightsError> {
    let mut url = Url::parse(base_url)
        .map_err(|e| InsightsError::TranscriptFetchFailed(format!("invalid caption track URL: {}", e)))?;

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "fmt")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(pairs)
        .append_pair("fmt", "json3");

    Ok(url)
}

fn parse_json3(body: &str) -> Result<Vec<TranscriptSegment>, InsightsError> {
    if body.trim().is_empty() {
        return Err(InsightsError::TranscriptFetchFailed(
            "YouTube returned an empty caption track".to_string(),
        ));
    }

    let timed: TimedText = serde_json::from_str(body)
        .map_err(|e| InsightsError::TranscriptFetchFailed(format!("invalid caption payload: {}", e)))?;

    let segments = timed
        .events
        .into_iter()
        .filter_map(|event| {
            let raw: String = event.segs.iter().map(|seg| seg.utf8.as_str()).collect();
            let text = raw.split_whitespace().collect::<Vec<_>>().join(" ");
            (!text.is_empty()).then(|| TranscriptSegment::new(text))
        })
        .collect();

    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn langs(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    fn player(value: serde_json::Value) -> PlayerResponse {
        serde_json::from_value(value).unwrap()
    }

    fn track(language: &str, kind: Option<&str>) -> CaptionTrack {
        CaptionTrack {
            base_url: format!("https://www.youtube.com/api/timedtext?v=abc&lang={}", language),
            language_code: language.to_string(),
            kind: kind.map(str::to_string),
        }
    }

    #[test]
    fn test_innertube_api_key_is_extracted() {
        let html = r#"<script>ytcfg.set({"INNERTUBE_API_KEY":"AIzaTestKey","OTHER":"x"});</script>"#;
        assert_eq!(innertube_api_key(html).unwrap(), "AIzaTestKey");
    }

    #[test]
    fn test_recaptcha_page_is_reported_as_blocked() {
        let html = r#"<div class="g-recaptcha" data-sitekey="x"></div>"#;
        let err = innertube_api_key(html).unwrap_err();
        assert!(err.to_string().contains("blocking requests"));
    }

    #[test]
    fn test_caption_tracks_are_listed() {
        let response = player(serde_json::json!({
            "playabilityStatus": { "status": "OK" },
            "captions": {
                "playerCaptionsTracklistRenderer": {
                    "captionTracks": [
                        { "baseUrl": "https://www.youtube.com/api/timedtext?v=abc&lang=en", "languageCode": "en", "kind": "asr" },
                        { "baseUrl": "https://www.youtube.com/api/timedtext?v=abc&lang=de", "languageCode": "de" }
                    ]
                }
            }
        }));

        let tracks = caption_tracks("abc", response).unwrap();
        assert_eq!(tracks.len(), 2);
        assert!(tracks[0].is_generated());
        assert!(!tracks[1].is_generated());
    }

    #[test]
    fn test_missing_captions_mean_disabled() {
        let response = player(serde_json::json!({ "playabilityStatus": { "status": "OK" } }));
        assert_eq!(
            caption_tracks("abc", response).unwrap_err(),
            InsightsError::TranscriptsDisabled("abc".to_string())
        );
    }

    #[test]
    fn test_unplayable_video_is_unavailable() {
        let response = player(serde_json::json!({
            "playabilityStatus": { "status": "ERROR", "reason": "This video is unavailable" }
        }));

        assert_eq!(
            caption_tracks("abc", response).unwrap_err(),
            InsightsError::VideoUnavailable {
                video_id: "abc".to_string(),
                reason: "This video is unavailable".to_string(),
            }
        );
    }

    #[test]
    fn test_bot_check_is_a_fetch_failure() {
        let response = player(serde_json::json!({
            "playabilityStatus": { "status": "LOGIN_REQUIRED", "reason": "Sign in to confirm you’re not a bot" }
        }));

        assert!(matches!(
            caption_tracks("abc", response),
            Err(InsightsError::TranscriptFetchFailed(_))
        ));
    }

    #[test]
    fn test_select_track_follows_language_order() {
        let tracks = vec![track("en", None), track("de", None)];
        let selected = select_track("abc", &tracks, &langs(&["fr", "de", "en"])).unwrap();
        assert_eq!(selected.language_code, "de");
    }

    #[test]
    fn test_select_track_prefers_manual_over_generated() {
        let tracks = vec![track("en", Some("asr")), track("en", None)];
        let selected = select_track("abc", &tracks, &langs(&["en"])).unwrap();
        assert!(!selected.is_generated());
    }

    #[test]
    fn test_select_track_falls_back_to_generated() {
        let tracks = vec![track("en", Some("asr"))];
        let selected = select_track("abc", &tracks, &langs(&["en"])).unwrap();
        assert!(selected.is_generated());
    }

    #[test]
    fn test_select_track_reports_available_languages() {
        let tracks = vec![track("en", Some("asr")), track("hi", None)];
        let err = select_track("abc", &tracks, &langs(&["fr"])).unwrap_err();

        assert_eq!(
            err,
            InsightsError::TranscriptNotFound {
                video_id: "abc".to_string(),
                requested: langs(&["fr"]),
                available: langs(&["en (auto)", "hi"]),
            }
        );
    }

    #[test]
    fn test_json3_url_replaces_format() {
        let url = json3_url("https://www.youtube.com/api/timedtext?v=abc&fmt=srv3&lang=en").unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert!(pairs.contains(&("v".to_string(), "abc".to_string())));
        assert!(pairs.contains(&("lang".to_string(), "en".to_string())));
        assert!(pairs.contains(&("fmt".to_string(), "json3".to_string())));
        assert!(!pairs.contains(&("fmt".to_string(), "srv3".to_string())));
    }

    #[test]
    fn test_parse_json3_keeps_order_and_skips_blank_events() {
        let body = r#"{
            "wireMagic": "pb3",
            "events": [
                { "tStartMs": 0, "dDurationMs": 1000, "segs": [ { "utf8": "hello" } ] },
                { "tStartMs": 900, "aAppend": 1, "segs": [ { "utf8": "\n" } ] },
                { "tStartMs": 1000, "dDurationMs": 800 },
                { "tStartMs": 1000, "dDurationMs": 1200, "segs": [ { "utf8": "big" }, { "utf8": " wide\nworld" } ] }
            ]
        }"#;

        let segments = parse_json3(body).unwrap();
        assert_eq!(
            segments,
            vec![TranscriptSegment::new("hello"), TranscriptSegment::new("big wide world")]
        );
    }

    #[test]
    fn test_parse_json3_rejects_empty_body() {
        assert!(matches!(
            parse_json3("  "),
            Err(InsightsError::TranscriptFetchFailed(_))
        ));
    }
}
