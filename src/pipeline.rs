use crate::config::Config;
use crate::extractors::{self, CaptionSource, SourceText, YtDlpCaptionSource};
use crate::generate::{GeneratedQuiz, QuizClient};
use crate::quiz::QuizDocument;
use crate::QuizError;

/// Result of one generation action, handed to rendering and export by the caller
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOutcome {
    pub source: SourceText,
    pub quiz: QuizDocument,
    pub model: String,
}

/// extract → generate, one user action at a time
pub struct QuizPipeline {
    caption_language: String,
    captions: Box<dyn CaptionSource>,
    client: QuizClient,
}

impl QuizPipeline {
    /// Create a pipeline with the yt-dlp caption source
    pub fn new(config: &Config, client: QuizClient) -> Self {
        Self::with_caption_source(
            config,
            client,
            Box::new(YtDlpCaptionSource::new(config.source.yt_dlp_path.clone())),
        )
    }

    pub fn with_caption_source(config: &Config, client: QuizClient, captions: Box<dyn CaptionSource>) -> Self {
        Self {
            caption_language: config.source.caption_language.clone(),
            captions,
            client,
        }
    }

    /// Captions of a YouTube video as source text
    pub async fn extract_from_youtube(&self, url: &str) -> Result<SourceText, QuizError> {
        let video_id = extractors::extract_video_id(url).ok_or_else(|| QuizError::InvalidUrl(url.to_string()))?;
        extractors::fetch_transcript(self.captions.as_ref(), &video_id, &self.caption_language).await
    }

    /// Run the quiz client over already extracted text
    pub async fn generate(&self, source: SourceText) -> Result<GenerationOutcome, QuizError> {
        tracing::info!("Generating quiz from {} characters of {}", source.char_count(), source.origin.describe().to_lowercase());

        let GeneratedQuiz { quiz, model } = self.client.generate(&source.text).await?;

        Ok(GenerationOutcome { source, quiz, model })
    }

    /// Full action for a YouTube URL
    pub async fn from_youtube(&self, url: &str) -> Result<GenerationOutcome, QuizError> {
        let source = self.extract_from_youtube(url).await?;
        self.generate(source).await
    }

    /// Full action for an uploaded document
    pub async fn from_document(&self, bytes: &[u8], declared_type: &str) -> Result<GenerationOutcome, QuizError> {
        let source = extractors::extract_document(bytes, declared_type)?;
        self.generate(source).await
    }
}
