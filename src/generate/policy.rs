use crate::config::ApiConfig;

/// What to do with an HTTP status from the chat-completion endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusAction {
    /// Parse the body
    Succeed,
    /// Move on to the next candidate
    Retry,
    /// Stop the whole generation
    Abort,
}

/// Classify a response status; only a bad credential stops the fallback loop
pub fn classify_status(status: u16) -> StatusAction {
    match status {
        200 => StatusAction::Succeed,
        401 => StatusAction::Abort,
        _ => StatusAction::Retry,
    }
}

/// One model/temperature pair to request generation from
#[derive(Debug, Clone, PartialEq)]
pub struct ModelCandidate {
    pub model: String,
    pub temperature: f32,
    /// Final retry after the ordered list; its failures, 401 included, end in a composite error
    pub last_chance: bool,
}

impl ModelCandidate {
    pub fn new(model: impl Into<String>, temperature: f32) -> Self {
        Self {
            model: model.into(),
            temperature,
            last_chance: false,
        }
    }

    pub fn last_chance(model: impl Into<String>, temperature: f32) -> Self {
        Self {
            last_chance: true,
            ..Self::new(model, temperature)
        }
    }

    /// What a response status means for this candidate
    pub fn action_for(&self, status: u16) -> StatusAction {
        match classify_status(status) {
            StatusAction::Abort if self.last_chance => StatusAction::Retry,
            action => action,
        }
    }
}

/// Configured models in order, then the last-chance retry
pub fn candidate_list(api: &ApiConfig) -> Vec<ModelCandidate> {
    api.models
        .iter()
        .map(|model| ModelCandidate::new(model.as_str(), api.temperature))
        .chain(std::iter::once(ModelCandidate::last_chance(
            api.fallback_model.as_str(),
            api.fallback_temperature,
        )))
        .collect()
}
