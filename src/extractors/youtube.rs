use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::process::Stdio;
use tokio::process::Command;

use super::CaptionSource;
use crate::QuizError;

/// Known YouTube URL shapes, tried in order
static VIDEO_ID_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/)([^&\n?#]+)",
        r"youtube\.com/watch\?.*v=([^&\n?#]+)",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// Phrases yt-dlp prints when the video itself cannot be served
const UNAVAILABLE_MARKERS: &[&str] = &[
    "Video unavailable",
    "This video is unavailable",
    "Private video",
    "This video has been removed",
    "This video is private",
];

/// Extract the video identifier from any supported YouTube URL shape
pub fn extract_video_id(url: &str) -> Option<String> {
    VIDEO_ID_PATTERNS
        .iter()
        .find_map(|re| re.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Canonical watch URL for a video id
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

/// Caption source backed by yt-dlp metadata and the json3 caption format
pub struct YtDlpCaptionSource {
    yt_dlp_path: String,
    client: Client,
}

impl YtDlpCaptionSource {
    pub fn new(yt_dlp_path: impl Into<String>) -> Self {
        Self {
            yt_dlp_path: yt_dlp_path.into(),
            client: Client::new(),
        }
    }

    /// Check if yt-dlp is available
    pub async fn check_availability(&self) -> bool {
        crate::utils::check_command_available(&self.yt_dlp_path).await
    }

    /// Get video information using yt-dlp
    async fn get_video_info(&self, video_id: &str) -> Result<Value, QuizError> {
        let url = watch_url(video_id);
        tracing::debug!("Extracting video info for: {}", url);

        let output = Command::new(&self.yt_dlp_path)
            .args(["--dump-json", "--skip-download", "--no-playlist", &url])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                QuizError::CaptionRetrieval(format!("failed to run {}: {}", self.yt_dlp_path, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_ytdlp_failure(&stderr));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| QuizError::CaptionRetrieval(format!("unreadable video info: {}", e)))
    }

    /// Download a caption file in json3 format
    async fn download_track(&self, track_url: &str) -> Result<String, QuizError> {
        let response = self
            .client
            .get(track_url)
            .send()
            .await
            .map_err(|e| QuizError::CaptionRetrieval(e.to_string()))?;

        if !response.status().is_success() {
            return Err(QuizError::CaptionRetrieval(format!(
                "caption download failed: HTTP {}",
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| QuizError::CaptionRetrieval(e.to_string()))
    }
}

#[async_trait]
impl CaptionSource for YtDlpCaptionSource {
    async fn fetch_snippets(&self, video_id: &str, language: &str) -> Result<Vec<String>, QuizError> {
        let info = self.get_video_info(video_id).await?;
        let track_url = select_caption_track(&info, language)?;

        tracing::debug!("Downloading {} caption track for {}", language, video_id);
        let body = self.download_track(&track_url).await?;

        parse_json3_snippets(&body)
    }

    fn source_name(&self) -> &'static str {
        "yt-dlp"
    }
}

impl Default for YtDlpCaptionSource {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

/// Map yt-dlp's error output to a caption failure
pub fn classify_ytdlp_failure(stderr: &str) -> QuizError {
    if UNAVAILABLE_MARKERS.iter().any(|marker| stderr.contains(marker)) {
        return QuizError::VideoUnavailable;
    }

    let detail = stderr
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with("ERROR:"))
        .or_else(|| stderr.lines().map(str::trim).find(|line| !line.is_empty()))
        .unwrap_or("yt-dlp exited with an error");

    QuizError::CaptionRetrieval(detail.to_string())
}

#[derive(Debug, Deserialize)]
struct CaptionFormat {
    ext: String,
    url: String,
}

/// Pick the json3 caption URL for `language` from yt-dlp's video info.
///
/// Manual subtitles win over automatic captions; an exact language code wins
/// over a regional variant such as `en-US`.
pub fn select_caption_track(info: &Value, language: &str) -> Result<String, QuizError> {
    let manual = info.get("subtitles").and_then(Value::as_object);
    let automatic = info.get("automatic_captions").and_then(Value::as_object);

    let track_maps: Vec<_> = [manual, automatic]
        .into_iter()
        .flatten()
        .filter(|map| !map.is_empty())
        .collect();

    if track_maps.is_empty() {
        return Err(QuizError::CaptionsDisabled);
    }

    let regional_prefix = format!("{}-", language);
    let formats = track_maps.iter().find_map(|map| {
        map.get(language).or_else(|| {
            map.iter()
                .find(|(code, _)| code.starts_with(&regional_prefix))
                .map(|(_, formats)| formats)
        })
    });

    let Some(formats) = formats else {
        let mut available: Vec<&str> = track_maps
            .iter()
            .flat_map(|map| map.keys().map(String::as_str))
            .collect();
        available.sort_unstable();
        available.dedup();
        return Err(QuizError::NoTranscript(format!(
            "no transcript in '{}' (available: {})",
            language,
            available.join(", ")
        )));
    };

    let formats: Vec<CaptionFormat> = serde_json::from_value(formats.clone())
        .map_err(|e| QuizError::CaptionRetrieval(format!("unexpected caption listing: {}", e)))?;

    formats
        .into_iter()
        .find(|format| format.ext == "json3")
        .map(|format| format.url)
        .ok_or_else(|| {
            QuizError::CaptionRetrieval(format!("no json3 caption format offered for '{}'", language))
        })
}

#[derive(Debug, Deserialize)]
struct Json3Document {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
struct Json3Event {
    #[serde(default)]
    segs: Vec<Json3Segment>,
}

#[derive(Debug, Deserialize)]
struct Json3Segment {
    #[serde(default)]
    utf8: String,
}

/// Decode a json3 caption file into one snippet per caption event
pub fn parse_json3_snippets(body: &str) -> Result<Vec<String>, QuizError> {
    let document: Json3Document = serde_json::from_str(body)
        .map_err(|e| QuizError::CaptionRetrieval(format!("unreadable caption data: {}", e)))?;

    Ok(document
        .events
        .into_iter()
        .map(|event| {
            event
                .segs
                .iter()
                .map(|seg| seg.utf8.as_str())
                .collect::<String>()
                .replace('\n', " ")
        })
        .filter(|snippet| !snippet.trim().is_empty())
        .collect())
}
