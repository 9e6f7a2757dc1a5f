//! Reply generation: the homeowner's next line.

pub mod openai;
pub mod prompt;

use futures_util::future::BoxFuture;

use crate::config::RehearsalConfig;
use crate::persona::{ConsistencyDirective, ConversationStage, ScenarioProfile};
use crate::transcript::Transcript;

/// Everything the generator sees for one turn.
#[derive(Debug, Clone, Copy)]
pub struct ReplyRequest<'a> {
    pub transcript: &'a Transcript,
    pub directive: &'a ConsistencyDirective,
    pub profile: &'a ScenarioProfile,
    pub stage: ConversationStage,
}

/// Produces the counterpart's reply to the latest agent utterance.
pub trait ReplyGenerator: Send + Sync {
    fn generate<'a>(&'a self, request: ReplyRequest<'a>) -> BoxFuture<'a, anyhow::Result<String>>;

    fn name(&self) -> String;
}

/// Create the reply generator from config.
pub fn create_generator(config: &RehearsalConfig) -> anyhow::Result<Box<dyn ReplyGenerator>> {
    let key = config
        .openai_api_key
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("Reply generation requires an OpenAI API key"))?;
    Ok(Box::new(openai::OpenAiChat::new(key, config.chat_model())))
}
