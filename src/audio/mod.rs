//! Audio capture, clip encoding, and the recording session.

pub mod capture;
pub mod session;
pub mod state;

use tokio::sync::mpsc;

use crate::error::RehearsalResult;

pub use capture::{list_devices, CpalMicrophone};
pub use session::{RecordingSession, StopReason};
pub use state::{CaptureState, CaptureStateMachine};

/// Capture sample rate for the whole pipeline.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Chunk size in samples (80 ms at 16 kHz).
pub const CHUNK_SAMPLES: usize = 1280;

/// A finalized stretch of mono f32 audio.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioClip {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Encode as a 16-bit PCM mono WAV blob.
    pub fn to_wav(&self) -> Vec<u8> {
        let num_samples = self.samples.len() as u32;
        let bytes_per_sample: u16 = 2;
        let num_channels: u16 = 1;
        let data_size = num_samples * bytes_per_sample as u32;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&self.sample_rate.to_le_bytes());
        let byte_rate = self.sample_rate * num_channels as u32 * bytes_per_sample as u32;
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&(num_channels * bytes_per_sample).to_le_bytes());
        buf.extend_from_slice(&(bytes_per_sample * 8).to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &sample in &self.samples {
            let pcm = (sample.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&pcm.to_le_bytes());
        }

        buf
    }
}

/// A live input stream: 16 kHz mono chunks until the device goes away.
///
/// The channel closing means the stream was lost.
pub struct CaptureStream {
    pub chunks: mpsc::Receiver<Vec<f32>>,
    _guard: Option<Box<dyn Send>>,
}

impl CaptureStream {
    /// Wrap a chunk receiver, keeping `guard` alive as long as the stream.
    pub fn new(chunks: mpsc::Receiver<Vec<f32>>, guard: Option<Box<dyn Send>>) -> Self {
        Self {
            chunks,
            _guard: guard,
        }
    }

    /// Discard chunks that queued up while nobody was recording.
    ///
    /// Returns `false` if the stream turned out to be closed.
    pub fn drain_stale(&mut self) -> bool {
        loop {
            match self.chunks.try_recv() {
                Ok(_) => continue,
                Err(mpsc::error::TryRecvError::Empty) => return true,
                Err(mpsc::error::TryRecvError::Disconnected) => return false,
            }
        }
    }
}

/// Something that can open a microphone stream.
pub trait CaptureDevice: Send {
    fn open(&mut self) -> RehearsalResult<CaptureStream>;
}
