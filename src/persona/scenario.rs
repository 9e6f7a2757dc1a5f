//! Per-conversation scenario: who the homeowner is and what they own.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use uuid::Uuid;

/// Fixed behavioral profile the homeowner keeps for a whole conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Archetype {
    Eager,
    Hesitant,
    Analytical,
    Busy,
    Skeptical,
}

impl Archetype {
    pub const ALL: [Archetype; 5] = [
        Self::Eager,
        Self::Hesitant,
        Self::Analytical,
        Self::Busy,
        Self::Skeptical,
    ];

    pub fn description(self) -> &'static str {
        match self {
            Self::Eager => "Enthusiastic about selling, asks lots of questions",
            Self::Hesitant => "Needs more convincing, concerned about market",
            Self::Analytical => "Focuses on data and numbers",
            Self::Busy => "Limited time, needs quick answers",
            Self::Skeptical => "Questions everything, needs proof",
        }
    }
}

impl std::fmt::Display for Archetype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Eager => "Eager",
            Self::Hesitant => "Hesitant",
            Self::Analytical => "Analytical",
            Self::Busy => "Busy",
            Self::Skeptical => "Skeptical",
        };
        f.write_str(name)
    }
}

/// Why the homeowner looked up their home value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Motivation {
    Retirement,
    JobRelocation,
    GrowingFamily,
    Downsizing,
    Investment,
}

impl Motivation {
    const ALL: [Motivation; 5] = [
        Self::Retirement,
        Self::JobRelocation,
        Self::GrowingFamily,
        Self::Downsizing,
        Self::Investment,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Retirement => "Retirement",
            Self::JobRelocation => "Job Relocation",
            Self::GrowingFamily => "Growing Family",
            Self::Downsizing => "Downsizing",
            Self::Investment => "Investment",
        }
    }
}

const HOME_TYPES: &[&str] = &["Single Family", "Townhouse", "Condo", "Multi-Family"];
const TIMELINES: &[&str] = &["ASAP", "3-6 months", "6-12 months", "Just exploring"];

/// Immutable facts for one conversation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioProfile {
    pub conversation_id: Uuid,
    pub archetype: Archetype,
    pub home_type: &'static str,
    pub bedrooms: u8,
    pub bathrooms: u8,
    pub purchase_year: u16,
    pub motivation: Motivation,
    pub timeline: &'static str,
}

impl ScenarioProfile {
    /// Roll a fresh scenario.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            conversation_id: Uuid::new_v4(),
            archetype: *Archetype::ALL.choose(rng).unwrap_or(&Archetype::Eager),
            home_type: HOME_TYPES.choose(rng).copied().unwrap_or("Single Family"),
            bedrooms: rng.gen_range(2..=5),
            bathrooms: rng.gen_range(1..=3),
            purchase_year: rng.gen_range(2010..=2022),
            motivation: *Motivation::ALL.choose(rng).unwrap_or(&Motivation::Retirement),
            timeline: TIMELINES.choose(rng).copied().unwrap_or("Just exploring"),
        }
    }

    /// One-paragraph summary used in the generator's system prompt.
    pub fn property_summary(&self) -> String {
        format!(
            "{}bed/{}bath {}, purchased in {}. Reason for checking the value: {}. Timeline: {}.",
            self.bedrooms,
            self.bathrooms,
            self.home_type,
            self.purchase_year,
            self.motivation.label(),
            self.timeline,
        )
    }
}
