//! OpenAI chat completions backend.
//!
//! POST `https://api.openai.com/v1/chat/completions` with the persona system
//! prompt and the conversation so far.

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::prompt::{build_messages, clean_reply, ChatMessage};
use super::{ReplyGenerator, ReplyRequest};

const CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 150;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenAiChat {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiChat {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
        }
    }

    async fn complete(&self, request: ReplyRequest<'_>) -> anyhow::Result<String> {
        let messages = build_messages(&request);
        debug!(
            model = %self.model,
            messages = messages.len(),
            stage = %request.stage,
            "Chat completion request"
        );

        let body = ChatRequest {
            model: &self.model,
            messages: &messages,
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let resp = self
            .client
            .post(CHAT_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("OpenAI chat request failed: {}", e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("OpenAI chat API error {}: {}", status, body);
        }

        let parsed: ChatResponse = resp.json().await?;
        let reply = first_reply(parsed)?;
        info!(chars = reply.len(), "Reply generated");
        Ok(reply)
    }
}

fn first_reply(response: ChatResponse) -> anyhow::Result<String> {
    let text = response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|t| clean_reply(&t))
        .unwrap_or_default();
    if text.is_empty() {
        anyhow::bail!("OpenAI chat returned an empty reply");
    }
    Ok(text)
}

impl ReplyGenerator for OpenAiChat {
    fn generate<'a>(&'a self, request: ReplyRequest<'a>) -> BoxFuture<'a, anyhow::Result<String>> {
        Box::pin(self.complete(request))
    }

    fn name(&self) -> String {
        format!("OpenAI chat ({})", self.model)
    }
}
