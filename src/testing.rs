//! In-crate fakes for the capture device and every collaborator.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::BoxFuture;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc;

use crate::audio::{AudioClip, CaptureDevice, CaptureStream, CHUNK_SAMPLES};
use crate::error::{RehearsalError, RehearsalResult};
use crate::llm::{ReplyGenerator, ReplyRequest};
use crate::stt::Transcriber;
use crate::tts::{AudioOutput, Narrator, SpeechSynthesizer};

const CHUNK_INTERVAL: Duration = Duration::from_millis(80);

/// A chunk loud enough to classify as voiced.
pub fn speech() -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(5);
    (0..CHUNK_SAMPLES).map(|_| rng.gen_range(-0.3..0.3)).collect()
}

/// A chunk of digital silence.
pub fn silence() -> Vec<f32> {
    vec![0.0; CHUNK_SAMPLES]
}

#[derive(Clone, Copy)]
enum AfterScript {
    Live,
    Stall,
    Close,
    Repeat(Duration),
}

/// Feeds a fixed script of chunks, one every 80 ms, on each `open`.
///
/// Like a live microphone it keeps delivering silence once the script is
/// done, unless told to stall or close.
pub struct FakeMicrophone {
    script: Vec<Vec<f32>>,
    after: AfterScript,
    available: bool,
    opens: Arc<AtomicUsize>,
}

impl FakeMicrophone {
    /// Play the script once, then deliver silence.
    pub fn once(script: Vec<Vec<f32>>) -> Self {
        Self {
            script,
            after: AfterScript::Live,
            available: true,
            opens: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Replay the script forever with `gap` of silence in between.
    pub fn repeating(script: Vec<Vec<f32>>, gap: Duration) -> Self {
        Self {
            after: AfterScript::Repeat(gap),
            ..Self::once(script)
        }
    }

    /// A device that cannot be opened.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::once(Vec::new())
        }
    }

    /// Close the stream after the script (device unplugged).
    pub fn then_close(mut self) -> Self {
        self.after = AfterScript::Close;
        self
    }

    /// Stop delivering chunks after the script but keep the stream open.
    pub fn then_stall(mut self) -> Self {
        self.after = AfterScript::Stall;
        self
    }

    pub fn opens(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.opens)
    }
}

impl CaptureDevice for FakeMicrophone {
    fn open(&mut self) -> RehearsalResult<CaptureStream> {
        if !self.available {
            return Err(RehearsalError::CaptureUnavailable(
                "no microphone attached".into(),
            ));
        }
        self.opens.fetch_add(1, Ordering::SeqCst);

        let (tx, rx) = mpsc::channel(256);
        let script = self.script.clone();
        let after = self.after;
        tokio::spawn(async move {
            loop {
                for chunk in &script {
                    if tx.send(chunk.clone()).await.is_err() {
                        return;
                    }
                    tokio::time::sleep(CHUNK_INTERVAL).await;
                }
                let quiet_for = match after {
                    AfterScript::Live => Duration::MAX,
                    AfterScript::Stall => {
                        tx.closed().await;
                        return;
                    }
                    AfterScript::Close => return,
                    AfterScript::Repeat(gap) => gap,
                };
                let mut fed = Duration::ZERO;
                while fed < quiet_for {
                    if tx.send(silence()).await.is_err() {
                        return;
                    }
                    tokio::time::sleep(CHUNK_INTERVAL).await;
                    fed += CHUNK_INTERVAL;
                }
            }
        });

        Ok(CaptureStream::new(rx, None))
    }
}

/// Returns queued transcripts in order, then repeats the last one.
pub struct FakeTranscriber {
    replies: Mutex<VecDeque<Result<String, String>>>,
    last: Mutex<Result<String, String>>,
    pub calls: Arc<AtomicUsize>,
}

impl FakeTranscriber {
    pub fn saying(lines: &[&str]) -> Self {
        let replies: VecDeque<_> = lines.iter().map(|l| Ok(l.to_string())).collect();
        Self::from_queue(replies)
    }

    pub fn failing(message: &str) -> Self {
        Self::from_queue(VecDeque::from([Err(message.to_string())]))
    }

    fn from_queue(replies: VecDeque<Result<String, String>>) -> Self {
        let last = replies.back().cloned().unwrap_or_else(|| Ok(String::new()));
        Self {
            replies: Mutex::new(replies),
            last: Mutex::new(last),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl Transcriber for FakeTranscriber {
    fn transcribe<'a>(&'a self, _clip: &'a AudioClip) -> BoxFuture<'a, anyhow::Result<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.last.lock().unwrap().clone());
        Box::pin(async move { next.map_err(|e| anyhow::anyhow!(e)) })
    }

    fn name(&self) -> String {
        "fake transcriber".into()
    }
}

/// Replies with a fixed line, or fails every time.
pub struct FakeGenerator {
    reply: Result<String, String>,
    pub calls: Arc<AtomicUsize>,
    pub seen: Arc<Mutex<Vec<String>>>,
}

impl FakeGenerator {
    pub fn replying(line: &str) -> Self {
        Self {
            reply: Ok(line.to_string()),
            calls: Arc::new(AtomicUsize::new(0)),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: Err("503 service unavailable".into()),
            ..Self::replying("")
        }
    }
}

impl ReplyGenerator for FakeGenerator {
    fn generate<'a>(&'a self, request: ReplyRequest<'a>) -> BoxFuture<'a, anyhow::Result<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(request.directive.render());
        let reply = self.reply.clone();
        Box::pin(async move { reply.map_err(|e| anyhow::anyhow!(e)) })
    }

    fn name(&self) -> String {
        "fake generator".into()
    }
}

pub struct FakeSynthesizer {
    fail: bool,
    silent: bool,
    pub calls: Arc<AtomicUsize>,
}

impl FakeSynthesizer {
    pub fn working() -> Self {
        Self {
            fail: false,
            silent: false,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::working()
        }
    }

    /// Succeeds with a zero-length clip.
    pub fn silent() -> Self {
        Self {
            silent: true,
            ..Self::working()
        }
    }
}

impl SpeechSynthesizer for FakeSynthesizer {
    fn synthesize<'a>(&'a self, text: &'a str) -> BoxFuture<'a, anyhow::Result<AudioClip>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let fail = self.fail;
        let samples = if self.silent { 0 } else { text.len() * 100 };
        Box::pin(async move {
            if fail {
                anyhow::bail!("connection reset by peer");
            }
            Ok(AudioClip::new(vec![0.1; samples], 24_000))
        })
    }

    fn name(&self) -> String {
        "fake synthesizer".into()
    }
}

/// Takes half a second per clip.
pub struct FakeOutput {
    fail: bool,
    pub plays: Arc<AtomicUsize>,
}

impl FakeOutput {
    pub fn working() -> Self {
        Self {
            fail: false,
            plays: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::working()
        }
    }
}

impl AudioOutput for FakeOutput {
    fn play<'a>(&'a self, _clip: &'a AudioClip) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async move {
            if self.fail {
                anyhow::bail!("no output device");
            }
            tokio::time::sleep(Duration::from_millis(500)).await;
            self.plays.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }
}

#[derive(Default)]
pub struct FakeNarrator {
    pub narrated: Arc<Mutex<Vec<String>>>,
}

impl Narrator for FakeNarrator {
    fn narrate<'a>(&'a self, text: &'a str) -> BoxFuture<'a, anyhow::Result<()>> {
        self.narrated.lock().unwrap().push(text.to_string());
        Box::pin(async { Ok(()) })
    }
}
