//! Audio playback via rodio.
//!
//! `OutputStream` is not `Send`, so each clip opens the default output
//! device on a blocking task and plays to completion there.

use futures_util::future::BoxFuture;
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, Sink};
use tracing::debug;

use crate::audio::AudioClip;

/// Plays a synthesized clip; resolves when playback has finished.
pub trait AudioOutput: Send + Sync {
    fn play<'a>(&'a self, clip: &'a AudioClip) -> BoxFuture<'a, anyhow::Result<()>>;
}

/// Default output device.
pub struct RodioOutput {
    volume: f32,
}

impl RodioOutput {
    /// `volume` is clamped to 0.0 (silent) ..= 1.0 (full).
    pub fn new(volume: f32) -> Self {
        Self {
            volume: volume.clamp(0.0, 1.0),
        }
    }

    fn play_blocking(samples: Vec<f32>, sample_rate: u32, volume: f32) -> anyhow::Result<()> {
        let (_stream, handle) = OutputStream::try_default()
            .map_err(|e| anyhow::anyhow!("Failed to open audio output: {}", e))?;
        let sink = Sink::try_new(&handle)
            .map_err(|e| anyhow::anyhow!("Failed to create audio sink: {}", e))?;

        sink.set_volume(volume);
        sink.append(SamplesBuffer::new(1, sample_rate, samples));
        sink.sleep_until_end();
        Ok(())
    }
}

impl AudioOutput for RodioOutput {
    fn play<'a>(&'a self, clip: &'a AudioClip) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async move {
            if clip.is_empty() {
                return Ok(());
            }
            debug!(
                secs = clip.duration_secs(),
                volume = self.volume,
                "Playing synthesized reply"
            );
            let samples = clip.samples.clone();
            let rate = clip.sample_rate;
            let volume = self.volume;
            tokio::task::spawn_blocking(move || Self::play_blocking(samples, rate, volume))
                .await
                .map_err(|e| anyhow::anyhow!("Playback task failed: {}", e))?
        })
    }
}
