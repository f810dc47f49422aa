use serde::Deserialize;
use std::fmt;
use std::time::Duration;

pub mod policy;
pub mod transport;

pub use policy::{candidate_list, classify_status, ModelCandidate, StatusAction};
pub use transport::{ChatReply, ChatRequest, ChatTransport, HttpTransport, TransportError};

use crate::config::{ApiKey, Config};
use crate::quiz::QuizDocument;
use crate::utils::truncate_chars;
use crate::QuizError;

/// Everything the quiz client needs, resolved up front
#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    pub endpoint: String,
    pub api_key: ApiKey,
    pub candidates: Vec<ModelCandidate>,
    pub max_tokens: u32,
    pub timeout: Duration,
    pub max_prompt_chars: usize,
}

impl GeneratorSettings {
    pub fn from_config(config: &Config, api_key: ApiKey) -> Self {
        Self {
            endpoint: config.api.endpoint.clone(),
            api_key,
            candidates: candidate_list(&config.api),
            max_tokens: config.api.max_tokens,
            timeout: Duration::from_secs(config.api.timeout_secs),
            max_prompt_chars: config.source.max_prompt_chars,
        }
    }
}

/// A parsed quiz and the model that wrote it
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedQuiz {
    pub quiz: QuizDocument,
    pub model: String,
}

/// Why a single candidate did not produce a quiz
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptFailure {
    Status { status: u16, body: String },
    Transport(TransportError),
    MalformedEnvelope(String),
    NoJsonObject,
    InvalidQuiz(String),
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptFailure::Status { status, body } => {
                write!(f, "HTTP {}", status)?;
                let snippet = truncate_chars(body.trim(), 200);
                if !snippet.is_empty() {
                    write!(f, " ({})", snippet)?;
                }
                Ok(())
            }
            AttemptFailure::Transport(e) => write!(f, "{}", e),
            AttemptFailure::MalformedEnvelope(e) => write!(f, "unexpected response shape: {}", e),
            AttemptFailure::NoJsonObject => write!(f, "response contained no JSON object"),
            AttemptFailure::InvalidQuiz(e) => write!(f, "JSON decode error: {}", e),
        }
    }
}

enum AttemptError {
    Fatal,
    Retryable(AttemptFailure),
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Build the generation prompt around the (already truncated) source text
pub fn build_prompt(source_excerpt: &str) -> String {
    format!(
        r#"Generate as many multiple-choice questions as possible from this text. Create comprehensive coverage of all key topics, concepts, and details mentioned. Aim for maximum questions while maintaining quality.

Text: {}

Output JSON with as many questions as you can create:
{{
  "quiz": [
    {{"question": "...", "options": ["A", "B", "C", "D"], "answer": "B"}}
  ]
}}

Generate as many questions as the content allows - aim for maximum coverage!"#,
        source_excerpt
    )
}

/// Slice from the first `{` to the last `}`, if any
pub fn extract_json_object(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    (end > start).then(|| &content[start..=end])
}

/// Decode a 200 response body into a quiz
pub fn parse_quiz_reply(body: &str) -> Result<QuizDocument, AttemptFailure> {
    let completion: ChatCompletion =
        serde_json::from_str(body).map_err(|e| AttemptFailure::MalformedEnvelope(e.to_string()))?;

    let content = completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| AttemptFailure::MalformedEnvelope("no message content".to_string()))?;

    let json = extract_json_object(&content).ok_or(AttemptFailure::NoJsonObject)?;

    let quiz: QuizDocument =
        serde_json::from_str(json).map_err(|e| AttemptFailure::InvalidQuiz(e.to_string()))?;

    if quiz.is_empty() {
        return Err(AttemptFailure::InvalidQuiz("quiz contains no questions".to_string()));
    }

    Ok(quiz)
}

/// Chat-completion client that walks the candidate list until one yields a quiz
pub struct QuizClient {
    settings: GeneratorSettings,
    transport: Box<dyn ChatTransport>,
}

impl QuizClient {
    /// Create a client talking HTTPS to the configured endpoint
    pub fn new(settings: GeneratorSettings) -> crate::Result<Self> {
        let transport = HttpTransport::new(
            settings.endpoint.clone(),
            settings.api_key.clone(),
            settings.timeout,
        )?;

        Ok(Self::with_transport(settings, Box::new(transport)))
    }

    pub fn with_transport(settings: GeneratorSettings, transport: Box<dyn ChatTransport>) -> Self {
        Self { settings, transport }
    }

    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    /// Generate a quiz from source text
    pub async fn generate(&self, source_text: &str) -> Result<GeneratedQuiz, QuizError> {
        let excerpt = truncate_chars(source_text, self.settings.max_prompt_chars);
        let prompt = build_prompt(excerpt);

        let total = self.settings.candidates.len();
        let mut failures = Vec::with_capacity(total);

        for (index, candidate) in self.settings.candidates.iter().enumerate() {
            tracing::info!(
                "Trying model {}/{}: {} (temperature {})",
                index + 1,
                total,
                candidate.model,
                candidate.temperature
            );

            match self.attempt(candidate, &prompt).await {
                Ok(quiz) => {
                    tracing::info!(
                        "Model {} produced {} questions",
                        candidate.model,
                        quiz.len()
                    );
                    return Ok(GeneratedQuiz {
                        quiz,
                        model: candidate.model.clone(),
                    });
                }
                Err(AttemptError::Fatal) => {
                    tracing::error!("Authentication failed with model {}", candidate.model);
                    return Err(QuizError::Authentication {
                        model: candidate.model.clone(),
                    });
                }
                Err(AttemptError::Retryable(failure)) => {
                    tracing::warn!("Model {} failed: {}", candidate.model, failure);
                    failures.push(format!("{}: {}", candidate.model, failure));
                }
            }
        }

        Err(QuizError::GenerationExhausted { attempts: failures })
    }

    async fn attempt(&self, candidate: &ModelCandidate, prompt: &str) -> Result<QuizDocument, AttemptError> {
        let request = ChatRequest::user(
            &candidate.model,
            prompt,
            candidate.temperature,
            self.settings.max_tokens,
        );

        let reply = self
            .transport
            .send(&request)
            .await
            .map_err(|e| AttemptError::Retryable(AttemptFailure::Transport(e)))?;

        match candidate.action_for(reply.status) {
            StatusAction::Succeed => parse_quiz_reply(&reply.body).map_err(AttemptError::Retryable),
            StatusAction::Abort => Err(AttemptError::Fatal),
            StatusAction::Retry => Err(AttemptError::Retryable(AttemptFailure::Status {
                status: reply.status,
                body: reply.body,
            })),
        }
    }
}
