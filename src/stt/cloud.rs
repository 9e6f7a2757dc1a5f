//! OpenAI Whisper API transcription.

use futures_util::future::BoxFuture;
use reqwest::multipart;
use tracing::debug;

use super::Transcriber;
use crate::audio::AudioClip;

const TRANSCRIPTIONS_URL: &str = "https://api.openai.com/v1/audio/transcriptions";

pub struct OpenAiStt {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiStt {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: "whisper-1".to_string(),
            client: reqwest::Client::new(),
        }
    }

    async fn request(&self, clip: &AudioClip) -> anyhow::Result<String> {
        let wav = clip.to_wav();
        debug!(
            bytes = wav.len(),
            secs = clip.duration_secs(),
            "Sending audio to OpenAI Whisper API"
        );

        let file_part = multipart::Part::bytes(wav)
            .file_name("audio.wav")
            .mime_str("audio/wav")?;

        let form = multipart::Form::new()
            .text("model", self.model.clone())
            .part("file", file_part);

        let resp = self
            .client
            .post(TRANSCRIPTIONS_URL)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("OpenAI STT API error {}: {}", status, body);
        }

        let json: serde_json::Value = resp.json().await?;
        parse_transcription(&json)
    }
}

fn parse_transcription(json: &serde_json::Value) -> anyhow::Result<String> {
    json["text"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("OpenAI STT response has no text field"))
}

impl Transcriber for OpenAiStt {
    fn transcribe<'a>(&'a self, clip: &'a AudioClip) -> BoxFuture<'a, anyhow::Result<String>> {
        Box::pin(self.request(clip))
    }

    fn name(&self) -> String {
        "OpenAI Whisper".to_string()
    }
}
