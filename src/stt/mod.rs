//! Speech-to-Text.
//!
//! A dyn-compatible `Transcriber` trait plus the cloud backend selected by
//! config.

pub mod cloud;

use futures_util::future::BoxFuture;

use crate::audio::AudioClip;
use crate::config::RehearsalConfig;

/// Turns one finalized clip into text.
pub trait Transcriber: Send + Sync {
    fn transcribe<'a>(&'a self, clip: &'a AudioClip) -> BoxFuture<'a, anyhow::Result<String>>;

    /// Display name (e.g. "OpenAI Whisper").
    fn name(&self) -> String;
}

/// Create a transcriber from config. `sttAdapter` is currently only "openai".
pub fn create_transcriber(config: &RehearsalConfig) -> anyhow::Result<Box<dyn Transcriber>> {
    match config.stt_adapter() {
        "openai" => {
            let key = config
                .openai_api_key
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("OpenAI STT requires an API key"))?;
            Ok(Box::new(cloud::OpenAiStt::new(key)))
        }
        other => anyhow::bail!("Unknown STT adapter: {}", other),
    }
}
