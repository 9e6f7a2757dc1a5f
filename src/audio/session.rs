//! One armed period of microphone capture, ended by silence, a user stop,
//! or the input stream going away.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{AudioClip, CaptureDevice, CaptureState, CaptureStateMachine, CaptureStream};
use super::TARGET_SAMPLE_RATE;
use crate::error::{RehearsalError, RehearsalResult};
use crate::vad::{sleep_until_deadline, AudioLevelMonitor, SilenceTimer};

/// A live input delivers a chunk every 80 ms; this long without one means
/// the stream has gone away even if it was never closed.
pub const STREAM_STALL_TIMEOUT: Duration = Duration::from_secs(1);

/// Why a recording ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Manual,
    Silence,
    StreamLost,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Manual => write!(f, "manual"),
            Self::Silence => write!(f, "silence"),
            Self::StreamLost => write!(f, "stream_lost"),
        }
    }
}

/// Result of one armed period. `clip` is `None` when nothing was buffered.
#[derive(Debug)]
pub struct Recording {
    pub clip: Option<AudioClip>,
    pub reason: StopReason,
}

/// Owns the capture device and turns its chunks into one clip per turn.
pub struct RecordingSession {
    device: Box<dyn CaptureDevice>,
    state: CaptureStateMachine,
    monitor: AudioLevelMonitor,
    timer: SilenceTimer,
    stream: Option<CaptureStream>,
    keep_warm: bool,
}

impl RecordingSession {
    pub fn new(
        device: Box<dyn CaptureDevice>,
        monitor: AudioLevelMonitor,
        timer: SilenceTimer,
    ) -> Self {
        Self {
            device,
            state: CaptureStateMachine::new(),
            monitor,
            timer,
            stream: None,
            keep_warm: false,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state.current()
    }

    /// Whether a stream is held open between turns.
    #[cfg(test)]
    pub fn is_warm(&self) -> bool {
        self.stream.is_some() && self.state.current() == CaptureState::Idle
    }

    /// Keep the stream open between turns. Turning this off while idle
    /// releases the device immediately.
    pub fn set_keep_warm(&mut self, keep_warm: bool) {
        self.keep_warm = keep_warm;
        if !keep_warm && self.state.current() == CaptureState::Idle && self.stream.is_some() {
            debug!("Releasing warm capture stream");
            self.stream = None;
        }
    }

    /// Idle → Armed: acquire the device (or reuse the warm stream).
    ///
    /// On failure the session is back in `Idle` and nothing is retried.
    pub fn arm(&mut self) -> RehearsalResult<()> {
        if !self.state.arm() {
            return Err(RehearsalError::CaptureUnavailable(format!(
                "recording session is {}",
                self.state.current()
            )));
        }

        if let Some(stream) = self.stream.as_mut() {
            if !stream.drain_stale() {
                warn!("Warm capture stream closed between turns, reopening");
                self.stream = None;
            }
        }

        if self.stream.is_none() {
            match self.device.open() {
                Ok(stream) => self.stream = Some(stream),
                Err(e) => {
                    self.state.reset();
                    return Err(e);
                }
            }
        }

        self.timer.arm();
        self.monitor.start_listening();
        debug!(
            threshold = self.monitor.threshold(),
            grace_ms = self.timer.grace().as_millis() as u64,
            "Capture armed"
        );
        Ok(())
    }

    /// Armed → … → Idle: buffer chunks until the turn ends.
    pub async fn record(&mut self, stop: &CancellationToken) -> RehearsalResult<Recording> {
        let Some(stream) = self.stream.as_mut() else {
            self.state.reset();
            return Err(RehearsalError::CaptureUnavailable(
                "recording session is not armed".into(),
            ));
        };

        let mut buffer: Vec<f32> = Vec::new();
        let mut last_chunk_at = Instant::now();
        let reason = loop {
            let deadline = self.timer.deadline();
            tokio::select! {
                biased;
                _ = stop.cancelled() => break StopReason::Manual,
                _ = sleep_until_deadline(deadline) => {
                    if self.timer.poll(Instant::now()) {
                        break StopReason::Silence;
                    }
                }
                chunk = stream.chunks.recv() => match chunk {
                    Some(chunk) => {
                        self.state.begin_recording();
                        let now = Instant::now();
                        last_chunk_at = now;
                        if let Some(reading) = self.monitor.sample(&chunk) {
                            self.timer.observe(reading.voiced, now);
                        }
                        buffer.extend_from_slice(&chunk);
                        if self.timer.poll(now) {
                            break StopReason::Silence;
                        }
                    }
                    None => break StopReason::StreamLost,
                },
                _ = tokio::time::sleep_until(last_chunk_at + STREAM_STALL_TIMEOUT) => {
                    warn!(
                        stalled_ms = STREAM_STALL_TIMEOUT.as_millis() as u64,
                        "Capture stream stopped delivering audio"
                    );
                    break StopReason::StreamLost;
                }
            }
        };

        Ok(self.finalize(buffer, reason))
    }

    fn finalize(&mut self, buffer: Vec<f32>, reason: StopReason) -> Recording {
        if !self.state.finalize() {
            debug!(%reason, "Recording already finalized");
        }
        self.monitor.stop_listening();
        self.timer.cancel();

        if reason == StopReason::StreamLost || !self.keep_warm {
            self.stream = None;
        }
        self.state.finish();

        let clip = (!buffer.is_empty()).then(|| AudioClip::new(buffer, TARGET_SAMPLE_RATE));
        info!(
            %reason,
            samples = clip.as_ref().map_or(0, |c| c.samples.len()),
            "Recording finalized"
        );
        Recording { clip, reason }
    }

    /// Drop the stream and return to `Idle` (shutdown, aborted turn).
    pub fn release(&mut self) {
        self.monitor.stop_listening();
        self.timer.cancel();
        self.stream = None;
        self.state.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{speech, silence, FakeMicrophone};

    fn session(mic: FakeMicrophone) -> RecordingSession {
        RecordingSession::new(
            Box::new(mic),
            AudioLevelMonitor::new(crate::config::DEFAULT_VOICED_THRESHOLD),
            SilenceTimer::new(Duration::from_millis(1500)),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn silence_after_speech_ends_the_turn() {
        let mic = FakeMicrophone::once(vec![speech(), speech(), speech(), silence()]);
        let mut s = session(mic);
        s.arm().unwrap();

        let started = Instant::now();
        let rec = s.record(&CancellationToken::new()).await.unwrap();

        assert_eq!(rec.reason, StopReason::Silence);
        assert!(rec.clip.unwrap().samples.len() >= 4 * crate::audio::CHUNK_SAMPLES);
        assert!(Instant::now() - started >= Duration::from_millis(1500));
        assert_eq!(s.state(), CaptureState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_with_nothing_buffered_yields_no_clip() {
        let mut s = session(FakeMicrophone::once(vec![]));
        s.arm().unwrap();
        let stop = CancellationToken::new();
        stop.cancel();

        let rec = s.record(&stop).await.unwrap();
        assert_eq!(rec.reason, StopReason::Manual);
        assert!(rec.clip.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn manual_stop_keeps_what_was_said() {
        let mic = FakeMicrophone::once(vec![speech(); 50]);
        let mut s = session(mic);
        s.arm().unwrap();

        let stop = CancellationToken::new();
        let trigger = stop.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            trigger.cancel();
        });

        let rec = s.record(&stop).await.unwrap();
        assert_eq!(rec.reason, StopReason::Manual);
        let clip = rec.clip.unwrap();
        assert!(!clip.is_empty());
        assert!(clip.samples.len() < 50 * crate::audio::CHUNK_SAMPLES);
    }

    #[tokio::test(start_paused = true)]
    async fn lost_stream_finalizes_like_a_stop() {
        let mic = FakeMicrophone::once(vec![speech(), speech()]).then_close();
        let mut s = session(mic);
        s.arm().unwrap();

        let rec = s.record(&CancellationToken::new()).await.unwrap();
        assert_eq!(rec.reason, StopReason::StreamLost);
        assert_eq!(rec.clip.unwrap().samples.len(), 2 * crate::audio::CHUNK_SAMPLES);
        assert!(!s.is_warm());
    }

    #[tokio::test(start_paused = true)]
    async fn stream_that_goes_quiet_ends_the_turn() {
        let mic = FakeMicrophone::once(vec![speech(), speech()]).then_stall();
        let mut s = session(mic);
        s.arm().unwrap();

        let started = Instant::now();
        let rec = tokio::time::timeout(Duration::from_secs(60), s.record(&CancellationToken::new()))
            .await
            .expect("record must not hang on a stalled stream")
            .unwrap();

        assert_eq!(rec.reason, StopReason::StreamLost);
        assert_eq!(rec.clip.unwrap().samples.len(), 2 * crate::audio::CHUNK_SAMPLES);
        assert!(Instant::now() - started >= STREAM_STALL_TIMEOUT);
        assert_eq!(s.state(), CaptureState::Idle);
        assert!(!s.is_warm());
    }

    #[tokio::test(start_paused = true)]
    async fn stream_that_never_delivers_yields_no_clip() {
        let mut s = session(FakeMicrophone::once(vec![]).then_stall());
        s.arm().unwrap();

        let rec = s.record(&CancellationToken::new()).await.unwrap();
        assert_eq!(rec.reason, StopReason::StreamLost);
        assert!(rec.clip.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn steady_silence_is_not_a_stall() {
        let mic = FakeMicrophone::once(vec![silence()]);
        let mut s = session(mic);
        s.arm().unwrap();

        let stop = CancellationToken::new();
        let trigger = stop.clone();
        tokio::spawn(async move {
            tokio::time::sleep(STREAM_STALL_TIMEOUT * 5).await;
            trigger.cancel();
        });

        let rec = s.record(&stop).await.unwrap();
        assert_eq!(rec.reason, StopReason::Manual);
        assert!(rec.clip.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn unavailable_device_leaves_session_idle() {
        let mut s = session(FakeMicrophone::unavailable());
        let err = s.arm().unwrap_err();
        assert_eq!(err.kind(), "capture_unavailable");
        assert_eq!(s.state(), CaptureState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn cannot_arm_while_armed() {
        let mut s = session(FakeMicrophone::once(vec![]));
        s.arm().unwrap();
        assert!(s.arm().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn warm_stream_is_reused_and_released_on_toggle_off() {
        let mic = FakeMicrophone::once(vec![speech(), silence()]);
        let opens = mic.opens();
        let mut s = session(mic);
        s.set_keep_warm(true);

        s.arm().unwrap();
        s.record(&CancellationToken::new()).await.unwrap();
        assert!(s.is_warm());

        s.arm().unwrap();
        let stop = CancellationToken::new();
        stop.cancel();
        s.record(&stop).await.unwrap();
        assert_eq!(opens.load(std::sync::atomic::Ordering::SeqCst), 1);

        s.set_keep_warm(false);
        assert!(!s.is_warm());
    }

    #[tokio::test(start_paused = true)]
    async fn cold_session_releases_after_each_turn() {
        let mic = FakeMicrophone::once(vec![speech(), silence()]);
        let opens = mic.opens();
        let mut s = session(mic);

        s.arm().unwrap();
        s.record(&CancellationToken::new()).await.unwrap();
        assert!(!s.is_warm());

        s.arm().unwrap();
        assert_eq!(opens.load(std::sync::atomic::Ordering::SeqCst), 2);
        s.release();
        assert_eq!(s.state(), CaptureState::Idle);
    }
}
