//! IPC protocol types for the UI shell.
//!
//! Events use `{"event": "<name>", "data": {...}}` (core -> UI, stdout).
//! Commands use `{"command": "<name>", ...}` (UI -> core, stdin).

pub mod bridge;

use serde::{Deserialize, Serialize};

use crate::orchestrator::TurnPhase;
use crate::persona::ScenarioProfile;
use crate::transcript::Utterance;

// ---------------------------------------------------------------------------
// Events: core -> UI (stdout)
// ---------------------------------------------------------------------------

/// Where a reply came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplySource {
    Generator,
    Canned,
}

/// All events emitted to the UI as JSON lines.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data")]
#[serde(rename_all = "snake_case")]
pub enum RehearsalEvent {
    Starting {},
    Ready {},
    Scenario {
        profile: ScenarioProfile,
        summary: String,
    },
    StateChange {
        state: TurnPhase,
    },
    RecordingStart {},
    RecordingStop {
        reason: String,
    },
    Transcription {
        text: String,
    },
    TurnDropped {
        reason: String,
    },
    Utterance(Utterance),
    Response {
        text: String,
        source: ReplySource,
    },
    SpeakingStart {
        text: String,
    },
    SpeakingEnd {},
    NarrationFallback {
        text: String,
        reason: String,
    },
    Transcript {
        utterances: Vec<Utterance>,
    },
    ContinuousMode {
        enabled: bool,
    },
    Error {
        kind: String,
        message: String,
    },
    Pong {},
    Stopping {},
}

impl RehearsalEvent {
    pub fn error(kind: &str, message: impl Into<String>) -> Self {
        Self::Error {
            kind: kind.to_string(),
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Commands: UI -> core (stdin)
// ---------------------------------------------------------------------------

/// All commands accepted from the UI as JSON lines.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "command")]
#[serde(rename_all = "snake_case")]
pub enum UiCommand {
    ToggleRecording {},
    StartRecording {},
    StopRecording {},
    SetContinuous { enabled: bool },
    NewConversation {},
    GetTranscript {},
    GetScenario {},
    Ping {},
    Shutdown {},
}
