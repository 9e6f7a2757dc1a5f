//! Persona consistency tracking.
//!
//! The homeowner's committed positions are re-derived from the transcript on
//! every turn rather than mutated in place, so any prefix of a conversation
//! can be replayed to see exactly what the persona had committed to by then.

pub mod canned;
pub mod scenario;
pub mod stage;

use std::collections::BTreeSet;

use serde::Serialize;

use crate::transcript::{Speaker, Transcript};

pub use scenario::{Archetype, ScenarioProfile};
pub use stage::{derive_stage, ConversationStage};

/// The homeowner's opinion of the online valuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuationStance {
    #[default]
    Unset,
    High,
    Low,
    AboutRight,
}

/// A worry the homeowner has voiced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcernTag {
    MarketConditions,
    InterestRates,
    Timeline,
}

impl ConcernTag {
    fn describe(self) -> &'static str {
        match self {
            Self::MarketConditions => "the market",
            Self::InterestRates => "interest rates",
            Self::Timeline => "your timeline",
        }
    }
}

/// Everything the homeowner has committed to so far.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PersonaState {
    pub valuation_stance: ValuationStance,
    pub disclosed_upgrades: bool,
    pub raised_concerns: BTreeSet<ConcernTag>,
}

const HIGH_WORDS: &[&str] = &["high", "higher", "highest"];
const HIGH_PHRASES: &[&str] = &["too much"];
const LOW_WORDS: &[&str] = &["low", "lower", "lowest", "lowball", "lowballed"];
const LOW_PHRASES: &[&str] = &["worth more"];
const ABOUT_RIGHT_PHRASES: &[&str] = &["about right", "in the ballpark", "reasonable"];
const UPGRADE_STEMS: &[&str] = &["upgrade", "renovat"];
const CONCERN_CUES: &[(&str, ConcernTag)] = &[
    ("market", ConcernTag::MarketConditions),
    ("interest rate", ConcernTag::InterestRates),
    ("timeline", ConcernTag::Timeline),
];

/// Derive the persona state from the homeowner's side of the transcript.
///
/// Stance is first-stated-wins; upgrades and concerns only accumulate.
pub fn derive(transcript: &Transcript) -> PersonaState {
    transcript
        .by(Speaker::Counterpart)
        .fold(PersonaState::default(), |mut state, utterance| {
            let text = utterance.text.to_lowercase();

            if state.valuation_stance == ValuationStance::Unset {
                state.valuation_stance = detect_stance(&text);
            }
            if UPGRADE_STEMS.iter().any(|stem| text.contains(stem)) {
                state.disclosed_upgrades = true;
            }
            for (cue, tag) in CONCERN_CUES {
                if text.contains(cue) {
                    state.raised_concerns.insert(*tag);
                }
            }
            state
        })
}

fn detect_stance(text: &str) -> ValuationStance {
    if mentions(text, HIGH_WORDS, HIGH_PHRASES) {
        ValuationStance::High
    } else if mentions(text, LOW_WORDS, LOW_PHRASES) {
        ValuationStance::Low
    } else if mentions(text, &[], ABOUT_RIGHT_PHRASES) {
        ValuationStance::AboutRight
    } else {
        ValuationStance::Unset
    }
}

fn mentions(text: &str, words: &[&str], phrases: &[&str]) -> bool {
    phrases.iter().any(|p| text.contains(p))
        || text
            .split(|c: char| !c.is_alphanumeric())
            .any(|token| words.contains(&token))
}

/// Instructions handed to the reply generator each turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsistencyDirective {
    pub stance: ValuationStance,
    pub disclosed_upgrades: bool,
    pub concerns: BTreeSet<ConcernTag>,
    pub allow_upgrade_justification: bool,
}

impl From<&PersonaState> for ConsistencyDirective {
    fn from(state: &PersonaState) -> Self {
        Self {
            stance: state.valuation_stance,
            disclosed_upgrades: state.disclosed_upgrades,
            concerns: state.raised_concerns.clone(),
            allow_upgrade_justification: state.valuation_stance != ValuationStance::High,
        }
    }
}

impl ConsistencyDirective {
    /// Build the directive for the current transcript.
    pub fn for_transcript(transcript: &Transcript) -> Self {
        Self::from(&derive(transcript))
    }

    /// Render as prompt lines.
    pub fn render(&self) -> String {
        let mut lines = vec!["Stay consistent with everything you have already said:".to_string()];

        lines.push(match self.stance {
            ValuationStance::Unset => {
                "- You have not yet said what you think of the online valuation.".to_string()
            }
            ValuationStance::High => {
                "- You said the online valuation seemed too high. Keep that opinion.".to_string()
            }
            ValuationStance::Low => {
                "- You said the online valuation seemed too low. Keep that opinion.".to_string()
            }
            ValuationStance::AboutRight => {
                "- You said the online valuation seemed about right. Keep that opinion."
                    .to_string()
            }
        });

        if self.disclosed_upgrades {
            lines.push(
                "- You mentioned upgrades or renovations to the home. Do not deny them."
                    .to_string(),
            );
        }

        if self.allow_upgrade_justification {
            if self.stance == ValuationStance::Low {
                lines.push(
                    "- You may point to your upgrades as a reason the home is worth more."
                        .to_string(),
                );
            }
        } else {
            lines.push(
                "- Do NOT argue the home is worth more because of upgrades or renovations."
                    .to_string(),
            );
        }

        if !self.concerns.is_empty() {
            let concerns: Vec<&str> = self.concerns.iter().map(|c| c.describe()).collect();
            lines.push(format!(
                "- Concerns you have raised: {}. Do not drop them.",
                concerns.join(", ")
            ));
        }

        lines.join("\n")
    }
}
