//! System prompt and chat history formatting for the homeowner persona.

use serde::Serialize;

use super::ReplyRequest;
use crate::transcript::Speaker;

/// One chat-completions message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    fn new(role: &'static str, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

const ROLE_PREAMBLE: &str = "\
You are strictly playing the role of a HOMEOWNER who recently checked their home's value online. \
A real estate agent is calling you to follow up about this.

YOU ARE THE HOMEOWNER RECEIVING THE CALL, NOT THE AGENT MAKING THE CALL.";

const RULES: &str = "\
If the agent asks about your thoughts on the home value, say whether it seemed high, low, or \
about right, in keeping with your personality.
If the agent asks about your plans, be realistic about your timeline and mention any concerns.

NEVER:
- Ask how you can help the agent
- Try to sell anything
- Offer to show homes
- Act like a real estate professional

Keep replies to one to three spoken sentences.";

/// Build the system prompt for one turn.
pub fn system_prompt(request: &ReplyRequest<'_>) -> String {
    let profile = request.profile;
    format!(
        "{ROLE_PREAMBLE}\n\n\
         Your personality type is: {} ({})\n\
         Your home: {}\n\
         Current stage of the call: {}\n\n\
         {}\n\n\
         {RULES}",
        profile.archetype,
        profile.archetype.description(),
        profile.property_summary(),
        request.stage,
        request.directive.render(),
    )
}

/// System prompt followed by the conversation as alternating messages.
///
/// Agent lines go out as `user`, homeowner lines as `assistant`.
pub fn build_messages(request: &ReplyRequest<'_>) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(request.transcript.len() + 1);
    messages.push(ChatMessage::new("system", system_prompt(request)));
    for utterance in request.transcript.iter() {
        let role = match utterance.speaker {
            Speaker::Agent => "user",
            Speaker::Counterpart => "assistant",
        };
        messages.push(ChatMessage::new(role, utterance.text.clone()));
    }
    messages
}

/// Trim whitespace and wrapping quotes the model sometimes adds.
pub fn clean_reply(text: &str) -> String {
    let trimmed = text.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(trimmed);
    let unlabeled = unquoted
        .strip_prefix("Homeowner:")
        .unwrap_or(unquoted);
    unlabeled.trim().to_string()
}
