//! Environment checks behind `quizgen check`.
//!
//! Each check yields a [`CheckReport`]; a failing check never stops the others.

use std::time::{Duration, Instant};

use crate::config::{ApiKey, Config};
use crate::extractors::{self, CaptionSource, YtDlpCaptionSource};
use crate::generate::{ChatReply, ChatRequest, ChatTransport, HttpTransport, TransportError};
use crate::utils::truncate_chars;

/// Video known to carry English captions
pub const SAMPLE_VIDEO_ID: &str = "dQw4w9WgXcQ";

const PING_TIMEOUT: Duration = Duration::from_secs(15);
const PING_MAX_TOKENS: u32 = 50;
const MIN_KEY_CHARS: usize = 10;

/// Outcome of one check
#[derive(Debug, Clone, PartialEq)]
pub struct CheckReport {
    pub name: &'static str,
    pub passed: bool,
    pub detail: String,
    pub hint: Option<String>,
}

impl CheckReport {
    fn pass(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            passed: true,
            detail: detail.into(),
            hint: None,
        }
    }

    fn fail(name: &'static str, detail: impl Into<String>, hint: Option<&str>) -> Self {
        Self {
            name,
            passed: false,
            detail: detail.into(),
            hint: hint.map(str::to_string),
        }
    }
}

/// Verify the credential is present, not a placeholder, and plausibly long
pub fn check_api_key(raw: Option<&str>) -> (CheckReport, Option<ApiKey>) {
    const NAME: &str = "API Key Configuration";

    match ApiKey::resolve(raw) {
        Ok(key) if key.len() < MIN_KEY_CHARS => (
            CheckReport::fail(
                NAME,
                format!("API key is only {} characters long", key.len()),
                Some("Make sure you've replaced the placeholder with your actual API key"),
            ),
            None,
        ),
        Ok(key) => {
            let report = CheckReport::pass(NAME, format!("API key found (length: {} characters)", key.len()));
            (report, Some(key))
        }
        Err(e) => {
            let hint = e.tip();
            (CheckReport::fail(NAME, e.to_string(), hint), None)
        }
    }
}

/// Verify the caption tool can be executed
pub async fn check_caption_tool(config: &Config) -> CheckReport {
    const NAME: &str = "Caption Tool";

    let source = YtDlpCaptionSource::new(config.source.yt_dlp_path.clone());
    if source.check_availability().await {
        CheckReport::pass(NAME, format!("{} is available", config.source.yt_dlp_path))
    } else {
        CheckReport::fail(
            NAME,
            format!("{} - not installed or not runnable", config.source.yt_dlp_path),
            Some("Install it: https://github.com/yt-dlp/yt-dlp"),
        )
    }
}

/// Turn the reply to a short test request into a report
pub fn interpret_ping(result: Result<ChatReply, TransportError>, elapsed: Duration) -> CheckReport {
    const NAME: &str = "API Connection";

    match result {
        Ok(reply) if reply.status == 200 => CheckReport::pass(
            NAME,
            format!("API connection successful ({:.2} seconds)", elapsed.as_secs_f64()),
        ),
        Ok(reply) if reply.status == 401 => CheckReport::fail(
            NAME,
            "Authentication failed",
            Some("Check if your API key is correct and active"),
        ),
        Ok(reply) if reply.status == 429 => {
            CheckReport::fail(NAME, "Rate limit exceeded", Some("Try again later"))
        }
        Ok(reply) => CheckReport::fail(
            NAME,
            format!(
                "API request failed (Status: {}): {}",
                reply.status,
                truncate_chars(reply.body.trim(), 200)
            ),
            None,
        ),
        Err(TransportError::Timeout) => {
            CheckReport::fail(NAME, "Request timed out", Some("Check your internet connection"))
        }
        Err(TransportError::Connection(_)) => {
            CheckReport::fail(NAME, "Connection error", Some("Check your internet connection"))
        }
        Err(e) => CheckReport::fail(NAME, format!("Unexpected error: {}", e), None),
    }
}

/// Send one short request through `transport`
pub async fn check_api_connection(transport: &dyn ChatTransport, model: &str) -> CheckReport {
    let request = ChatRequest::user(model, "Hello, this is a test message.", 0.7, PING_MAX_TOKENS);

    let started = Instant::now();
    let result = transport.send(&request).await;

    interpret_ping(result, started.elapsed())
}

/// Fetch captions of a known video end to end
pub async fn check_caption_retrieval(source: &dyn CaptionSource, language: &str) -> CheckReport {
    const NAME: &str = "Caption Retrieval";

    match extractors::fetch_transcript(source, SAMPLE_VIDEO_ID, language).await {
        Ok(text) => {
            let sample: String = text.text.chars().take(50).collect();
            CheckReport::pass(
                NAME,
                format!("Fetched {} characters, sample: '{}...'", text.char_count(), sample),
            )
        }
        Err(e) => CheckReport::fail(NAME, e.to_string(), e.tip()),
    }
}

/// Run every check in order; `offline` skips the ones that need the network
pub async fn run_checks(config: &Config, raw_api_key: Option<&str>, offline: bool) -> Vec<CheckReport> {
    let mut reports = Vec::new();

    let (key_report, api_key) = check_api_key(raw_api_key);
    reports.push(key_report);

    reports.push(check_caption_tool(config).await);

    if offline {
        tracing::info!("Skipping network checks");
        return reports;
    }

    match api_key {
        Some(key) => match HttpTransport::new(config.api.endpoint.clone(), key, PING_TIMEOUT) {
            Ok(transport) => {
                let model = config.api.models.first().map(String::as_str).unwrap_or("deepseek-chat");
                reports.push(check_api_connection(&transport, model).await);
            }
            Err(e) => reports.push(CheckReport::fail("API Connection", e.to_string(), None)),
        },
        None => reports.push(CheckReport::fail(
            "API Connection",
            "Cannot test API connection without a valid API key",
            None,
        )),
    }

    let captions = YtDlpCaptionSource::new(config.source.yt_dlp_path.clone());
    reports.push(check_caption_retrieval(&captions, &config.source.caption_language).await);

    reports
}

/// Count of passed checks
pub fn passed_count(reports: &[CheckReport]) -> usize {
    reports.iter().filter(|r| r.passed).count()
}
