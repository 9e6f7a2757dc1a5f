//! Frequency-domain level meter.
//!
//! Each captured chunk is windowed, transformed, and reduced to the average
//! bin magnitude on an 8-bit decibel scale (-100 dB → 0, -30 dB → 255).
//! A chunk is voiced when that average, normalized to [0, 1], exceeds the
//! configured threshold.

use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

/// Samples per transform; only the most recent `FFT_SIZE` samples of a
/// chunk are analysed.
pub const FFT_SIZE: usize = 1024;

const MIN_DB: f32 = -100.0;
const MAX_DB: f32 = -30.0;

/// One classification per sampling tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelReading {
    pub level: f32,
    pub voiced: bool,
}

/// Classifies audio chunks as voiced or silent while listening.
pub struct AudioLevelMonitor {
    threshold: f32,
    listening: bool,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    scratch: Vec<Complex<f32>>,
}

impl AudioLevelMonitor {
    pub fn new(threshold: f32) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        Self {
            threshold,
            listening: false,
            fft: planner.plan_fft_forward(FFT_SIZE),
            window: blackman(FFT_SIZE),
            scratch: vec![Complex::new(0.0, 0.0); FFT_SIZE],
        }
    }

    pub fn start_listening(&mut self) {
        self.listening = true;
    }

    /// After this call `sample` returns `None` until listening restarts.
    pub fn stop_listening(&mut self) {
        self.listening = false;
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Classify one chunk. Returns `None` when not listening.
    pub fn sample(&mut self, chunk: &[f32]) -> Option<LevelReading> {
        if !self.listening {
            return None;
        }
        let level = self.level_of(chunk);
        Some(LevelReading {
            level,
            voiced: level > self.threshold,
        })
    }

    fn level_of(&mut self, chunk: &[f32]) -> f32 {
        let tail = &chunk[chunk.len().saturating_sub(FFT_SIZE)..];
        for (i, slot) in self.scratch.iter_mut().enumerate() {
            let sample = tail.get(i).copied().unwrap_or(0.0);
            *slot = Complex::new(sample * self.window[i], 0.0);
        }
        self.fft.process(&mut self.scratch);

        let bins = FFT_SIZE / 2;
        let total: f32 = self.scratch[..bins]
            .iter()
            .map(|bin| {
                let magnitude = bin.norm() / FFT_SIZE as f32;
                let db = 20.0 * magnitude.max(1e-12).log10();
                ((db - MIN_DB) / (MAX_DB - MIN_DB) * 255.0).clamp(0.0, 255.0)
            })
            .sum();

        (total / bins as f32 / 255.0).clamp(0.0, 1.0)
    }
}

fn blackman(n: usize) -> Vec<f32> {
    use std::f32::consts::PI;
    (0..n)
        .map(|i| {
            let x = i as f32 / n as f32;
            0.42 - 0.5 * (2.0 * PI * x).cos() + 0.08 * (4.0 * PI * x).cos()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_VOICED_THRESHOLD;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn noise(amplitude: f32, len: usize) -> Vec<f32> {
        let mut rng = StdRng::seed_from_u64(99);
        (0..len)
            .map(|_| rng.gen_range(-amplitude..amplitude))
            .collect()
    }

    fn listening_monitor() -> AudioLevelMonitor {
        let mut m = AudioLevelMonitor::new(DEFAULT_VOICED_THRESHOLD);
        m.start_listening();
        m
    }

    #[test]
    fn digital_silence_is_not_voiced() {
        let mut m = listening_monitor();
        let r = m.sample(&vec![0.0; 1280]).unwrap();
        assert_eq!(r.level, 0.0);
        assert!(!r.voiced);
    }

    #[test]
    fn speech_level_signal_is_voiced() {
        let mut m = listening_monitor();
        let r = m.sample(&noise(0.3, 1280)).unwrap();
        assert!(r.voiced, "level {}", r.level);
        assert!(r.level <= 1.0);
    }

    #[test]
    fn faint_room_noise_is_tolerated() {
        let mut m = listening_monitor();
        let r = m.sample(&noise(0.0002, 1280)).unwrap();
        assert!(!r.voiced, "level {}", r.level);
    }

    #[test]
    fn short_chunks_are_zero_padded() {
        let mut m = listening_monitor();
        let r = m.sample(&noise(0.3, 256)).unwrap();
        assert!(r.level > 0.0);
    }

    #[test]
    fn no_readings_after_listening_stops() {
        let mut m = listening_monitor();
        assert!(m.sample(&noise(0.3, 1280)).is_some());
        m.stop_listening();
        assert!(m.sample(&noise(0.3, 1280)).is_none());
    }

    #[test]
    fn window_tapers_to_zero_at_edges() {
        let w = blackman(FFT_SIZE);
        assert!(w[0].abs() < 1e-6);
        assert!((w[FFT_SIZE / 2] - 1.0).abs() < 1e-3);
    }
}
