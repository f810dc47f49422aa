//! quizgen - A Rust CLI tool that turns source text into multiple-choice quizzes
//!
//! This library extracts text from YouTube captions or uploaded documents (PDF, DOCX, TXT),
//! asks a chat-completion API to write a quiz about it, and renders/exports the result
//! as JSON and as a paginated PDF report.

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod extractors;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod quiz;
pub mod utils;

pub use cli::{Cli, Commands};
pub use config::{ApiKey, Config};
pub use extractors::{CaptionSource, SourceOrigin, SourceText};
pub use generate::{GeneratorSettings, QuizClient};
pub use pipeline::{GenerationOutcome, QuizPipeline};
pub use quiz::{Question, QuizDocument};

/// Result type used throughout the application layer
pub type Result<T> = anyhow::Result<T>;

/// Error types specific to quiz generation
#[derive(thiserror::Error, Debug)]
pub enum QuizError {
    #[error("Invalid YouTube URL. Please check the format.")]
    InvalidUrl(String),

    #[error("Captions are disabled for this video.")]
    CaptionsDisabled,

    #[error("The video is unavailable.")]
    VideoUnavailable,

    #[error("No transcript found: {0}")]
    NoTranscript(String),

    #[error("Could not retrieve transcript: {0}")]
    CaptionRetrieval(String),

    #[error("Unsupported file type: {0}. Please upload PDF, DOCX, or TXT files.")]
    UnsupportedFileType(String),

    #[error("Error processing document: {0}")]
    DocumentExtraction(String),

    #[error("API key not found. Please set DEEPSEEK_API_KEY or pass --api-key.")]
    MissingApiKey,

    #[error("Invalid API key detected. Please replace the placeholder with a real API key.")]
    PlaceholderApiKey,

    #[error("API authentication failed with model {model}. Please verify your API key is correct and active.")]
    Authentication { model: String },

    #[error("All models failed ({}). Please check your API key and account status, then try again.", .attempts.join("; "))]
    GenerationExhausted { attempts: Vec<String> },

    #[error("Failed to create {artifact}: {reason}")]
    Export { artifact: String, reason: String },
}

impl QuizError {
    /// Short hint shown under the error message, if one helps
    pub fn tip(&self) -> Option<&'static str> {
        match self {
            QuizError::CaptionsDisabled
            | QuizError::NoTranscript(_)
            | QuizError::CaptionRetrieval(_) => {
                Some("Make sure the video has captions/subtitles enabled")
            }
            QuizError::MissingApiKey => Some("Create a .env file with DEEPSEEK_API_KEY=your_key_here"),
            QuizError::PlaceholderApiKey | QuizError::Authentication { .. } => {
                Some("Run `quizgen check` to verify your API key")
            }
            QuizError::UnsupportedFileType(_) => Some("Use --content-type to declare the file type explicitly"),
            _ => None,
        }
    }
}
