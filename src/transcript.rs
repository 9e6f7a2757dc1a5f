//! Append-only conversation log.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Who said an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    /// The user rehearsing the call.
    Agent,
    /// The simulated homeowner.
    Counterpart,
}

impl Speaker {
    /// Label used in prompts and logs.
    pub fn prompt_label(self) -> &'static str {
        match self {
            Self::Agent => "Agent",
            Self::Counterpart => "Homeowner",
        }
    }

    /// Label shown in the transcript view.
    pub fn display_label(self) -> &'static str {
        match self {
            Self::Agent => "You",
            Self::Counterpart => "Homeowner",
        }
    }
}

/// One line of dialogue. Never modified after it is appended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Utterance {
    pub speaker: Speaker,
    pub text: String,
    pub sequence: u64,
    pub at: DateTime<Utc>,
}

impl std::fmt::Display for Utterance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.speaker.prompt_label(), self.text)
    }
}

/// Ordered history of a single conversation.
///
/// Sequence numbers start at 1 and increase by one per append.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    utterances: Vec<Utterance>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new utterance and return it.
    pub fn append(&mut self, speaker: Speaker, text: impl Into<String>) -> &Utterance {
        let sequence = self.utterances.len() as u64 + 1;
        self.utterances.push(Utterance {
            speaker,
            text: text.into(),
            sequence,
            at: Utc::now(),
        });
        &self.utterances[self.utterances.len() - 1]
    }

    pub fn utterances(&self) -> &[Utterance] {
        &self.utterances
    }

    pub fn iter(&self) -> impl Iterator<Item = &Utterance> {
        self.utterances.iter()
    }

    /// Utterances spoken by `speaker`, in conversation order.
    pub fn by(&self, speaker: Speaker) -> impl Iterator<Item = &Utterance> {
        self.utterances.iter().filter(move |u| u.speaker == speaker)
    }

    pub fn len(&self) -> usize {
        self.utterances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utterances.is_empty()
    }

    /// A transcript holding only the first `len` utterances.
    #[cfg(test)]
    pub fn prefix(&self, len: usize) -> Transcript {
        Transcript {
            utterances: self.utterances[..len.min(self.utterances.len())].to_vec(),
        }
    }

    /// Drop all history (used when a new scenario is generated).
    pub fn clear(&mut self) {
        self.utterances.clear();
    }
}
