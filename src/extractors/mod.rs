use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod document;
pub mod youtube;

pub use document::{extract_document, DocumentKind};
pub use youtube::{extract_video_id, YtDlpCaptionSource};

use crate::QuizError;

/// Caption snippets that carry no speech
const NOISE_TOKENS: &[&str] = &["[Music]", "[Applause]", "[Laughter]"];

/// Where a piece of source text came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceOrigin {
    Captions { video_id: String },
    Pdf,
    Docx,
    PlainText,
}

impl SourceOrigin {
    pub fn describe(&self) -> &'static str {
        match self {
            SourceOrigin::Captions { .. } => "Transcript",
            SourceOrigin::Pdf | SourceOrigin::Docx | SourceOrigin::PlainText => "Document",
        }
    }
}

/// Flat text extracted for one generation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceText {
    pub text: String,
    pub origin: SourceOrigin,
}

impl SourceText {
    pub fn new(text: impl Into<String>, origin: SourceOrigin) -> Self {
        Self {
            text: text.into(),
            origin,
        }
    }

    /// Length in characters
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Supplies raw caption snippets for a video
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CaptionSource: Send + Sync {
    /// Fetch the caption snippets of `video_id` in `language`, in playback order
    async fn fetch_snippets(&self, video_id: &str, language: &str) -> Result<Vec<String>, QuizError>;

    /// Get the name of this source
    fn source_name(&self) -> &'static str;
}

/// Fetch captions and flatten them into source text
pub async fn fetch_transcript(
    source: &dyn CaptionSource,
    video_id: &str,
    language: &str,
) -> Result<SourceText, QuizError> {
    tracing::info!("Fetching {} captions for video {} via {}", language, video_id, source.source_name());

    let snippets = source.fetch_snippets(video_id, language).await?;
    let text = clean_snippets(&snippets);

    if text.is_empty() {
        return Err(QuizError::NoTranscript(
            "Transcript fetched but empty after cleaning.".to_string(),
        ));
    }

    Ok(SourceText::new(
        text,
        SourceOrigin::Captions {
            video_id: video_id.to_string(),
        },
    ))
}

/// Drop empty and non-speech snippets, then join the rest with single spaces
pub fn clean_snippets<S: AsRef<str>>(snippets: &[S]) -> String {
    snippets
        .iter()
        .map(|s| s.as_ref())
        .filter(|s| !s.is_empty() && !NOISE_TOKENS.contains(s))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    #[test]
    fn test_clean_snippets_drops_noise() {
        let snippets = ["[Music]", " hello ", "", "world", "[Applause]", "  ", "[Laughter]"];
        assert_eq!(clean_snippets(&snippets), "hello world");
    }

    #[test]
    fn test_clean_snippets_keeps_noise_inside_speech() {
        let snippets = ["so [Music] plays", "end"];
        assert_eq!(clean_snippets(&snippets), "so [Music] plays end");
    }

    #[tokio::test]
    async fn test_fetch_transcript_joins_snippets() {
        let mut source = MockCaptionSource::new();
        source
            .expect_fetch_snippets()
            .with(eq("abc123"), eq("en"))
            .times(1)
            .returning(|_, _| Ok(vec!["first line".to_string(), "[Music]".to_string(), "second".to_string()]));
        source.expect_source_name().return_const("mock");

        let text = fetch_transcript(&source, "abc123", "en").await.unwrap();
        assert_eq!(text.text, "first line second");
        assert_eq!(
            text.origin,
            SourceOrigin::Captions {
                video_id: "abc123".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_fetch_transcript_empty_after_cleaning() {
        let mut source = MockCaptionSource::new();
        source
            .expect_fetch_snippets()
            .returning(|_, _| Ok(vec!["[Music]".to_string(), "[Applause]".to_string()]));
        source.expect_source_name().return_const("mock");

        let err = fetch_transcript(&source, "abc123", "en").await.unwrap_err();
        assert!(matches!(err, QuizError::NoTranscript(_)));
    }

    #[tokio::test]
    async fn test_fetch_transcript_passes_source_errors_through() {
        let mut source = MockCaptionSource::new();
        source
            .expect_fetch_snippets()
            .returning(|_, _| Err(QuizError::CaptionsDisabled));
        source.expect_source_name().return_const("mock");

        let err = fetch_transcript(&source, "abc123", "en").await.unwrap_err();
        assert!(matches!(err, QuizError::CaptionsDisabled));
    }
}
