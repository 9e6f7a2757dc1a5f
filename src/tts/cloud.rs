//! Cloud TTS adapters: ElevenLabs and OpenAI.

use futures_util::future::BoxFuture;
use tracing::info;

use super::mp3::decode_mp3;
use super::SpeechSynthesizer;
use crate::audio::AudioClip;

/// Stock ElevenLabs voice used when none is configured.
pub const DEFAULT_ELEVENLABS_VOICE: &str = "pNInz6obpgDQGcFmaJgB";

/// Sample rate of OpenAI's raw `pcm` response format.
const OPENAI_PCM_RATE: u32 = 24_000;

// ---------------------------------------------------------------------------
// ElevenLabs TTS
// ---------------------------------------------------------------------------

/// POST `https://api.elevenlabs.io/v1/text-to-speech/{voice_id}`, MP3 back.
pub struct ElevenLabsTts {
    api_key: String,
    voice_id: String,
    client: reqwest::Client,
}

impl ElevenLabsTts {
    pub fn new(api_key: &str, voice_id: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            voice_id: voice_id.to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn request_body(text: &str) -> serde_json::Value {
        serde_json::json!({
            "text": text,
            "model_id": "eleven_monolingual_v1",
            "voice_settings": {
                "stability": 0.75,
                "similarity_boost": 0.75,
            }
        })
    }

    async fn speak(&self, text: &str) -> anyhow::Result<AudioClip> {
        info!(voice = %self.voice_id, text_len = text.len(), "ElevenLabs TTS request");

        let url = format!(
            "https://api.elevenlabs.io/v1/text-to-speech/{}",
            self.voice_id
        );
        let resp = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .header("Accept", "audio/mpeg")
            .json(&Self::request_body(text))
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("ElevenLabs TTS request failed: {}", e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("ElevenLabs TTS API error {}: {}", status, body);
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to read ElevenLabs response: {}", e))?;

        let clip = decode_mp3(&bytes)?;
        info!(
            samples = clip.samples.len(),
            rate = clip.sample_rate,
            "ElevenLabs TTS synthesis complete"
        );
        Ok(clip)
    }
}

impl SpeechSynthesizer for ElevenLabsTts {
    fn synthesize<'a>(&'a self, text: &'a str) -> BoxFuture<'a, anyhow::Result<AudioClip>> {
        Box::pin(self.speak(text))
    }

    fn name(&self) -> String {
        format!("ElevenLabs ({})", self.voice_id)
    }
}

// ---------------------------------------------------------------------------
// OpenAI TTS
// ---------------------------------------------------------------------------

/// POST `https://api.openai.com/v1/audio/speech`, raw 24 kHz 16-bit PCM back.
pub struct OpenAiTts {
    api_key: String,
    voice: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiTts {
    pub fn new(api_key: &str, voice: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            voice: voice.to_string(),
            model: "tts-1".to_string(),
            client: reqwest::Client::new(),
        }
    }

    async fn speak(&self, text: &str) -> anyhow::Result<AudioClip> {
        info!(voice = %self.voice, text_len = text.len(), "OpenAI TTS request");

        let body = serde_json::json!({
            "model": self.model,
            "input": text,
            "voice": self.voice,
            "response_format": "pcm",
        });

        let resp = self
            .client
            .post("https://api.openai.com/v1/audio/speech")
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("OpenAI TTS request failed: {}", e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("OpenAI TTS API error {}: {}", status, body);
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to read OpenAI TTS response: {}", e))?;

        let clip = AudioClip::new(pcm16_to_f32(&bytes), OPENAI_PCM_RATE);
        if clip.is_empty() {
            anyhow::bail!("OpenAI TTS returned no audio");
        }
        info!(samples = clip.samples.len(), "OpenAI TTS synthesis complete");
        Ok(clip)
    }
}

/// Little-endian i16 PCM to f32; a trailing odd byte is ignored.
fn pcm16_to_f32(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect()
}

impl SpeechSynthesizer for OpenAiTts {
    fn synthesize<'a>(&'a self, text: &'a str) -> BoxFuture<'a, anyhow::Result<AudioClip>> {
        Box::pin(self.speak(text))
    }

    fn name(&self) -> String {
        format!("OpenAI TTS ({})", self.voice)
    }
}
