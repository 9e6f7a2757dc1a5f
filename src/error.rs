//! Error types for the rehearsal core.

use thiserror::Error;

/// Result alias used by the turn-taking core.
pub type RehearsalResult<T> = Result<T, RehearsalError>;

/// Which external collaborator a transport failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collaborator {
    Transcriber,
    Generator,
}

impl std::fmt::Display for Collaborator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transcriber => write!(f, "transcription"),
            Self::Generator => write!(f, "reply generation"),
        }
    }
}

/// Failures the orchestrator knows how to classify.
///
/// Capture and transport failures end the current turn and reach the user.
/// Synthesis and playback failures are absorbed by the narration fallback.
#[derive(Error, Debug)]
pub enum RehearsalError {
    #[error("Capture unavailable: {0}")]
    CaptureUnavailable(String),

    #[error("{stage} failed: {message}")]
    Transport {
        stage: Collaborator,
        message: String,
    },

    #[error("Speech synthesis failed: {0}")]
    Synthesis(String),

    #[error("Audio playback failed: {0}")]
    Playback(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl RehearsalError {
    /// Wrap a collaborator error as a transport failure for `stage`.
    pub fn transport(stage: Collaborator, err: impl std::fmt::Display) -> Self {
        Self::Transport {
            stage,
            message: err.to_string(),
        }
    }

    /// Short machine-readable tag used in `error` events.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CaptureUnavailable(_) => "capture_unavailable",
            Self::Transport { .. } => "transport_failure",
            Self::Synthesis(_) => "synthesis_failure",
            Self::Playback(_) => "playback_failure",
            Self::Config(_) => "config",
        }
    }
}

impl From<cpal::DevicesError> for RehearsalError {
    fn from(err: cpal::DevicesError) -> Self {
        RehearsalError::CaptureUnavailable(err.to_string())
    }
}

impl From<cpal::DefaultStreamConfigError> for RehearsalError {
    fn from(err: cpal::DefaultStreamConfigError) -> Self {
        RehearsalError::CaptureUnavailable(err.to_string())
    }
}

impl From<cpal::BuildStreamError> for RehearsalError {
    fn from(err: cpal::BuildStreamError) -> Self {
        RehearsalError::CaptureUnavailable(err.to_string())
    }
}

impl From<cpal::PlayStreamError> for RehearsalError {
    fn from(err: cpal::PlayStreamError) -> Self {
        RehearsalError::CaptureUnavailable(err.to_string())
    }
}
