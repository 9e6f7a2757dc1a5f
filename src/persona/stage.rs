//! Conversation stage detection from the agent's side of the call.

use serde::Serialize;

use crate::transcript::{Speaker, Transcript};

/// Where the call is, as judged from what the agent last asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStage {
    #[default]
    InitialGreeting,
    ValuationReaction,
    Purpose,
}

impl std::fmt::Display for ConversationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InitialGreeting => write!(f, "initial_greeting"),
            Self::ValuationReaction => write!(f, "valuation_reaction"),
            Self::Purpose => write!(f, "purpose"),
        }
    }
}

/// Fold the agent's utterances into the current stage.
///
/// An utterance that matches no cue leaves the stage unchanged.
pub fn derive_stage(transcript: &Transcript) -> ConversationStage {
    transcript
        .by(Speaker::Agent)
        .fold(ConversationStage::default(), |stage, utterance| {
            classify(&utterance.text.to_lowercase()).unwrap_or(stage)
        })
}

fn classify(text: &str) -> Option<ConversationStage> {
    if is_greeting(text) {
        Some(ConversationStage::InitialGreeting)
    } else if ["thoughts on", "too high", "too low"]
        .iter()
        .any(|cue| text.contains(cue))
    {
        Some(ConversationStage::ValuationReaction)
    } else if ["purpose of", "looking to buy", "looking to sell"]
        .iter()
        .any(|cue| text.contains(cue))
    {
        Some(ConversationStage::Purpose)
    } else {
        None
    }
}

// "Hi, this is Dana at Lakeside Realty" introduces the caller.
fn is_greeting(text: &str) -> bool {
    text.contains("how are you")
        || (text.contains("this is")
            && text.split(|c: char| !c.is_alphanumeric()).any(|w| w == "at"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(lines: &[&str]) -> Transcript {
        let mut t = Transcript::new();
        for line in lines {
            t.append(Speaker::Agent, *line);
            t.append(Speaker::Counterpart, "mm-hm");
        }
        t
    }

    #[test]
    fn greeting_resolves_to_initial_stage() {
        assert_eq!(
            derive_stage(&agent(&["hi, how are you"])),
            ConversationStage::InitialGreeting
        );
        assert_eq!(
            derive_stage(&agent(&["Hi, this is Dana at Lakeside Realty"])),
            ConversationStage::InitialGreeting
        );
    }

    #[test]
    fn empty_transcript_starts_at_greeting() {
        assert_eq!(derive_stage(&Transcript::new()), ConversationStage::InitialGreeting);
    }

    #[test]
    fn stages_follow_latest_matching_question() {
        let t = agent(&[
            "hi, how are you",
            "what were your thoughts on the valuation?",
            "okay, interesting",
        ]);
        assert_eq!(derive_stage(&t), ConversationStage::ValuationReaction);

        let t = agent(&[
            "hi, how are you",
            "what were your thoughts on the valuation?",
            "are you looking to sell this year?",
        ]);
        assert_eq!(derive_stage(&t), ConversationStage::Purpose);
    }

    #[test]
    fn this_is_without_at_is_not_a_greeting() {
        let t = agent(&["this is a great neighborhood", "what's the purpose of the check?"]);
        assert_eq!(derive_stage(&t), ConversationStage::Purpose);
        assert_eq!(classify("this is what i mean, that's all"), None);
    }
}
