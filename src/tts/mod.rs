//! Text-to-Speech, playback, and the on-device narration fallback.
//!
//! Cloud synthesizers return an `AudioClip`; `AudioOutput` plays it; when
//! either step fails the reply is handed to a `Narrator` instead.

pub mod cloud;
pub mod mp3;
pub mod narration;
pub mod playback;

use futures_util::future::BoxFuture;
use tracing::warn;

use crate::audio::AudioClip;
use crate::config::RehearsalConfig;

pub use narration::{CommandNarrator, Narrator};
pub use playback::{AudioOutput, RodioOutput};

/// Synthesizes reply text to audio (dyn-compatible).
pub trait SpeechSynthesizer: Send + Sync {
    fn synthesize<'a>(&'a self, text: &'a str) -> BoxFuture<'a, anyhow::Result<AudioClip>>;

    /// Display name for this engine (e.g. "ElevenLabs (pNInz6obpgDQGcFmaJgB)").
    fn name(&self) -> String;
}

/// Stands in when no cloud voice is configured. Every call fails, so each
/// reply is spoken by the narrator.
pub struct UnavailableSynthesizer {
    reason: String,
}

impl UnavailableSynthesizer {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl SpeechSynthesizer for UnavailableSynthesizer {
    fn synthesize<'a>(&'a self, _text: &'a str) -> BoxFuture<'a, anyhow::Result<AudioClip>> {
        Box::pin(async move { anyhow::bail!("{}", self.reason) })
    }

    fn name(&self) -> String {
        "Narration only".into()
    }
}

/// Create a synthesizer from config.
///
/// `ttsAdapter` is one of: "elevenlabs", "openai". A missing API key is not
/// fatal: replies fall back to on-device narration.
pub fn create_synthesizer(config: &RehearsalConfig) -> anyhow::Result<Box<dyn SpeechSynthesizer>> {
    let voice = config.tts_voice.as_deref();
    let adapter = config.tts_adapter();
    let key = match adapter {
        "elevenlabs" => config.elevenlabs_api_key.as_deref(),
        "openai" => config.openai_api_key.as_deref(),
        other => anyhow::bail!("Unknown TTS adapter: {}", other),
    };
    let Some(key) = key else {
        warn!(adapter, "No API key for speech synthesis, replies will be narrated");
        return Ok(Box::new(UnavailableSynthesizer::new(format!(
            "{adapter} TTS has no API key"
        ))));
    };

    match adapter {
        "openai" => Ok(Box::new(cloud::OpenAiTts::new(
            key,
            voice.unwrap_or("alloy"),
        ))),
        _ => Ok(Box::new(cloud::ElevenLabsTts::new(
            key,
            voice.unwrap_or(cloud::DEFAULT_ELEVENLABS_VOICE),
        ))),
    }
}
