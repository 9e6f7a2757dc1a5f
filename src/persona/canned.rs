//! Static replies used when the reply generator is unreachable.

use rand::seq::SliceRandom;
use rand::Rng;

use super::scenario::{Archetype, Motivation, ScenarioProfile};
use super::stage::ConversationStage;
use super::{ConcernTag, PersonaState, ValuationStance};

/// Said when no table entry fits.
pub const CLARIFICATION: &str = "I'm sorry, could you repeat that?";

/// What the homeowner would do with the information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Sell,
    Buy,
    Refinance,
}

impl Intent {
    /// Intent implied by the scenario, unless rates have come up.
    pub fn for_scenario(profile: &ScenarioProfile, state: &PersonaState) -> Self {
        if state.raised_concerns.contains(&ConcernTag::InterestRates) {
            Self::Refinance
        } else if profile.motivation == Motivation::Investment {
            Self::Buy
        } else {
            Self::Sell
        }
    }
}

fn greeting(archetype: Archetype) -> &'static [&'static str] {
    match archetype {
        Archetype::Eager => &[
            "I'm doing great, thanks for asking! Yes, I did check my home value!",
            "Wonderful, thanks! I was just looking at that valuation.",
        ],
        Archetype::Hesitant => &[
            "I'm fine... yes, I did look at that.",
            "Oh, yes, I got that email...",
        ],
        Archetype::Analytical => &[
            "Hello, yes, I received the automated valuation report.",
            "Yes, I reviewed the comparative market analysis.",
        ],
        Archetype::Busy => &[
            "Hi - yes, quick question about that actually.",
            "Yes, got it - pretty interesting numbers.",
        ],
        Archetype::Skeptical => &[
            "Yeah, I got it. Not sure how accurate those online things are though.",
            "Yes, though I'm wondering about the methodology.",
        ],
    }
}

fn valuation(archetype: Archetype, stance: ValuationStance) -> Option<&'static str> {
    use ValuationStance::*;
    let line = match (archetype, stance) {
        (_, Unset) => return None,
        (Archetype::Eager, High) => "It seemed a bit optimistic compared to what I expected!",
        (Archetype::Eager, Low) => {
            "Actually, I thought it might be worth more given all our upgrades."
        }
        (Archetype::Eager, AboutRight) => {
            "It was pretty close to what I expected, which was nice to see!"
        }
        (Archetype::Hesitant, High) => "I'm not really sure... maybe a little high?",
        (Archetype::Hesitant, Low) => "It seemed low, but I know the market's been changing...",
        (Archetype::Hesitant, AboutRight) => "I guess it was around what I expected...",
        (Archetype::Analytical, High) => {
            "Based on recent sales data, it appears to be overvalued by approximately 5-7%."
        }
        (Archetype::Analytical, Low) => {
            "The algorithm may not account for our recent $50,000 in improvements."
        }
        (Archetype::Analytical, AboutRight) => {
            "The valuation aligns with my research on comparable properties."
        }
        (Archetype::Busy, High) => "Bit high maybe? Hard to tell these days.",
        (Archetype::Busy, Low) => "Seemed low - we've done lots of updates.",
        (Archetype::Busy, AboutRight) => "Looked reasonable, yeah.",
        (Archetype::Skeptical, High) => "These online tools always seem to be on the high side.",
        (Archetype::Skeptical, Low) => "I've seen similar homes sell for more.",
        (Archetype::Skeptical, AboutRight) => {
            "It's in the ballpark, but these automated values aren't always reliable."
        }
    };
    Some(line)
}

fn purpose(archetype: Archetype, intent: Intent) -> &'static str {
    use Intent::*;
    match (archetype, intent) {
        (Archetype::Eager, Sell) => "We're actually thinking about upgrading to a bigger home!",
        (Archetype::Eager, Buy) => "We're looking to invest in another property!",
        (Archetype::Eager, Refinance) => {
            "Wanted to see if refinancing makes sense with these rates."
        }
        (Archetype::Hesitant, Sell) => "Just keeping an eye on things... might sell eventually.",
        (Archetype::Hesitant, Buy) => "Maybe looking to buy something else down the line.",
        (Archetype::Hesitant, Refinance) => "Considering refinancing, but not sure yet.",
        (Archetype::Analytical, Sell) => {
            "Analyzing the market to determine optimal selling timing."
        }
        (Archetype::Analytical, Buy) => {
            "Evaluating potential investment opportunities in the area."
        }
        (Archetype::Analytical, Refinance) => {
            "Calculating the cost-benefit ratio of refinancing options."
        }
        (Archetype::Busy, Sell) => "Might need to sell soon for work.",
        (Archetype::Busy, Buy) => "Quick investment opportunity came up.",
        (Archetype::Busy, Refinance) => "Checking rates for a possible refi.",
        (Archetype::Skeptical, Sell) => "Wanted to verify these high prices I keep hearing about.",
        (Archetype::Skeptical, Buy) => "Checking if buying makes sense in this market.",
        (Archetype::Skeptical, Refinance) => {
            "Heard about some rates, but seems too good to be true."
        }
    }
}

/// Pick a canned reply for `(stage, archetype)`.
///
/// Valuation replies follow the stance the homeowner already committed to,
/// so the fallback cannot contradict the conversation so far.
pub fn canned_reply<R: Rng + ?Sized>(
    stage: ConversationStage,
    profile: &ScenarioProfile,
    state: &PersonaState,
    rng: &mut R,
) -> &'static str {
    let archetype = profile.archetype;
    match stage {
        ConversationStage::InitialGreeting => greeting(archetype)
            .choose(rng)
            .copied()
            .unwrap_or(CLARIFICATION),
        ConversationStage::ValuationReaction => {
            valuation(archetype, state.valuation_stance).unwrap_or(CLARIFICATION)
        }
        ConversationStage::Purpose => purpose(archetype, Intent::for_scenario(profile, state)),
    }
}
