//! Microphone capture via cpal.
//!
//! Opens the default (or named) input device at its native rate, down-mixes
//! and resamples to 16 kHz mono f32, and forwards 1280-sample chunks over a
//! bounded channel. Any stream error closes the channel so the recording
//! session sees the loss.

use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{StreamConfig, StreamError};
use tokio::sync::mpsc;
use tracing::{error, info};

use super::{CaptureDevice, CaptureStream, CHUNK_SAMPLES, TARGET_SAMPLE_RATE};
use crate::error::{RehearsalError, RehearsalResult};

/// Chunks buffered between the audio thread and the session (~5 s).
const CHANNEL_CHUNKS: usize = 64;

/// List available input device names.
pub fn list_devices() -> Vec<String> {
    let host = cpal::default_host();
    let mut names = Vec::new();
    if let Ok(devices) = host.input_devices() {
        for dev in devices {
            if let Ok(name) = dev.name() {
                names.push(name);
            }
        }
    }
    names
}

/// Keeps a `cpal::Stream` alive inside a `Send` capture handle.
struct SendStream(#[allow(dead_code)] cpal::Stream);

// SAFETY: the stream is only held so it stays alive and is dropped from the
// owning task. Its callbacks run on cpal's own thread.
unsafe impl Send for SendStream {}

struct ResolvedInput {
    device: cpal::Device,
    stream_config: StreamConfig,
    native_rate: u32,
}

fn resolve_device(device_name: Option<&str>) -> RehearsalResult<ResolvedInput> {
    let host = cpal::default_host();

    let device = match device_name {
        Some(name) => host
            .input_devices()?
            .find(|d| d.name().map(|n| n == name).unwrap_or(false))
            .ok_or_else(|| {
                RehearsalError::CaptureUnavailable(format!("Input device not found: {name}"))
            })?,
        None => host.default_input_device().ok_or_else(|| {
            RehearsalError::CaptureUnavailable("No default input device available".into())
        })?,
    };

    let dev_name = device.name().unwrap_or_else(|_| "unknown".into());
    let default_config = device.default_input_config()?;
    let native_rate = default_config.sample_rate().0;
    let channels = default_config.channels();

    info!(
        device = %dev_name,
        native_rate,
        channels,
        "Selected input device (resampling to {}Hz mono)",
        TARGET_SAMPLE_RATE,
    );

    Ok(ResolvedInput {
        device,
        stream_config: StreamConfig {
            channels,
            sample_rate: cpal::SampleRate(native_rate),
            buffer_size: cpal::BufferSize::Default,
        },
        native_rate,
    })
}

/// Linear resampler over mono f32.
fn resample_linear(input: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate {
        return input.to_vec();
    }
    let ratio = from_rate as f64 / to_rate as f64;
    let out_len = ((input.len() as f64) / ratio).floor() as usize;
    (0..out_len)
        .map(|i| {
            let src_idx = i as f64 * ratio;
            let idx0 = src_idx.floor() as usize;
            let frac = (src_idx - idx0 as f64) as f32;
            let s0 = input.get(idx0).copied().unwrap_or(0.0);
            let s1 = input.get(idx0 + 1).copied().unwrap_or(s0);
            s0 + frac * (s1 - s0)
        })
        .collect()
}

/// Average interleaved frames down to mono.
fn to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let ch = channels as usize;
    samples
        .chunks_exact(ch)
        .map(|frame| frame.iter().sum::<f32>() / ch as f32)
        .collect()
}

/// Turns arbitrary callback buffers into fixed 16 kHz mono chunks.
struct ChunkAssembler {
    native_rate: u32,
    channels: u16,
    pending: Vec<f32>,
}

impl ChunkAssembler {
    fn new(native_rate: u32, channels: u16) -> Self {
        Self {
            native_rate,
            channels,
            pending: Vec::with_capacity(CHUNK_SAMPLES * 2),
        }
    }

    fn push(&mut self, data: &[f32]) -> Vec<Vec<f32>> {
        let mono = to_mono(data, self.channels);
        let resampled = resample_linear(&mono, self.native_rate, TARGET_SAMPLE_RATE);
        self.pending.extend_from_slice(&resampled);

        let mut out = Vec::new();
        while self.pending.len() >= CHUNK_SAMPLES {
            out.push(self.pending.drain(..CHUNK_SAMPLES).collect());
        }
        out
    }
}

/// The system microphone.
pub struct CpalMicrophone {
    device_name: Option<String>,
}

impl CpalMicrophone {
    /// `None` uses the system default input.
    pub fn new(device_name: Option<String>) -> Self {
        Self { device_name }
    }
}

impl CaptureDevice for CpalMicrophone {
    fn open(&mut self) -> RehearsalResult<CaptureStream> {
        let input = resolve_device(self.device_name.as_deref())?;
        let (tx, rx) = mpsc::channel(CHANNEL_CHUNKS);

        let data_tx = Arc::new(Mutex::new(Some(tx)));
        let err_tx = Arc::clone(&data_tx);
        let mut assembler = ChunkAssembler::new(input.native_rate, input.stream_config.channels);

        let stream = input.device.build_input_stream(
            &input.stream_config,
            move |data: &[f32], _info: &cpal::InputCallbackInfo| {
                let chunks = assembler.push(data);
                let Ok(guard) = data_tx.lock() else { return };
                let Some(tx) = guard.as_ref() else { return };
                for chunk in chunks {
                    // Full channel: the session is behind, drop the chunk.
                    let _ = tx.try_send(chunk);
                }
            },
            move |err: StreamError| {
                error!("Audio input stream error: {}", err);
                // Any stream error ends delivery; closing the channel tells the session.
                if let Ok(mut guard) = err_tx.lock() {
                    guard.take();
                }
            },
            None,
        )?;

        stream.play()?;
        info!("Audio capture started");

        let guard: Box<dyn Send> = Box::new(SendStream(stream));
        Ok(CaptureStream::new(rx, Some(guard)))
    }
}
