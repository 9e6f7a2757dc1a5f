//! Turn sequencing.
//!
//! One turn is `capture → transcribe → derive persona state → generate
//! reply → append → synthesize → play`. In continuous mode the next capture
//! is armed once playback (or the narration fallback) has finished, unless
//! the user stopped explicitly.

mod controls;

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::audio::RecordingSession;
use crate::error::{Collaborator, RehearsalError};
use crate::ipc::{RehearsalEvent, ReplySource, UiCommand};
use crate::llm::{ReplyGenerator, ReplyRequest};
use crate::persona::canned::canned_reply;
use crate::persona::{self, derive_stage, ConsistencyDirective, ScenarioProfile};
use crate::stt::Transcriber;
use crate::transcript::{Speaker, Transcript};
use crate::tts::{AudioOutput, Narrator, SpeechSynthesizer};

pub use controls::TurnControls;

/// The external services a turn talks to.
pub struct Collaborators {
    pub transcriber: Box<dyn Transcriber>,
    pub generator: Box<dyn ReplyGenerator>,
    pub synthesizer: Box<dyn SpeechSynthesizer>,
    pub output: Box<dyn AudioOutput>,
    pub narrator: Box<dyn Narrator>,
}

/// What the orchestrator is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    Idle,
    Recording,
    Transcribing,
    Generating,
    Speaking,
}

/// How a turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Reply appended and spoken (possibly by narration).
    Completed,
    /// Transcript empty or trivial; nothing appended.
    Dropped,
    /// Capture ended with nothing buffered.
    NoAudio,
    /// Capture or transcription failed; nothing appended.
    Failed,
}

impl TurnOutcome {
    fn allows_rearm(self) -> bool {
        matches!(self, Self::Completed | Self::Dropped)
    }
}

enum IdleAction {
    Wait,
    StartTurn,
    Shutdown,
}

pub struct TurnOrchestrator {
    session: RecordingSession,
    collaborators: Collaborators,
    transcript: Transcript,
    profile: ScenarioProfile,
    phase: TurnPhase,
    min_transcript_chars: usize,
    rng: StdRng,
    controls: Arc<TurnControls>,
    events: mpsc::UnboundedSender<RehearsalEvent>,
}

impl TurnOrchestrator {
    pub fn new(
        session: RecordingSession,
        collaborators: Collaborators,
        min_transcript_chars: usize,
        events: mpsc::UnboundedSender<RehearsalEvent>,
    ) -> Self {
        Self::with_rng(
            session,
            collaborators,
            min_transcript_chars,
            events,
            StdRng::from_entropy(),
        )
    }

    pub fn with_rng(
        session: RecordingSession,
        collaborators: Collaborators,
        min_transcript_chars: usize,
        events: mpsc::UnboundedSender<RehearsalEvent>,
        mut rng: StdRng,
    ) -> Self {
        let profile = ScenarioProfile::generate(&mut rng);
        info!(
            archetype = %profile.archetype,
            conversation = %profile.conversation_id,
            "Scenario generated"
        );
        Self {
            session,
            collaborators,
            transcript: Transcript::new(),
            profile,
            phase: TurnPhase::Idle,
            min_transcript_chars,
            rng,
            controls: Arc::new(TurnControls::new(false)),
            events,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    #[cfg(test)]
    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    fn emit(&self, event: RehearsalEvent) {
        // The receiver only goes away at shutdown.
        let _ = self.events.send(event);
    }

    fn set_phase(&mut self, phase: TurnPhase) {
        if self.phase != phase {
            debug!(from = ?self.phase, to = ?phase, "Turn phase");
            self.phase = phase;
            self.emit(RehearsalEvent::StateChange { state: phase });
        }
    }

    fn report(&self, err: &RehearsalError) {
        error!(kind = err.kind(), "{}", err);
        self.emit(RehearsalEvent::error(err.kind(), err.to_string()));
    }

    fn append(&mut self, speaker: Speaker, text: String) {
        let utterance = self.transcript.append(speaker, text).clone();
        info!(
            seq = utterance.sequence,
            speaker = utterance.speaker.display_label(),
            "{}",
            utterance.text
        );
        self.emit(RehearsalEvent::Utterance(utterance));
    }

    /// Turn continuous mode on or off. Takes effect from the next turn end;
    /// turning it off releases a warm capture stream.
    pub fn set_continuous(&mut self, enabled: bool) {
        self.controls.set_continuous(enabled);
        self.session.set_keep_warm(enabled);
        info!(enabled, "Continuous mode");
        self.emit(RehearsalEvent::ContinuousMode { enabled });
    }

    /// Discard the transcript and roll a new scenario.
    pub fn new_conversation(&mut self) {
        if !self.transcript.is_empty() {
            debug!(utterances = self.transcript.len(), "Discarding transcript");
        }
        self.transcript.clear();
        self.profile = ScenarioProfile::generate(&mut self.rng);
        info!(
            archetype = %self.profile.archetype,
            conversation = %self.profile.conversation_id,
            "New conversation"
        );
        self.announce_scenario();
        self.emit(RehearsalEvent::Transcript {
            utterances: Vec::new(),
        });
    }

    pub fn announce_scenario(&self) {
        self.emit(RehearsalEvent::Scenario {
            profile: self.profile.clone(),
            summary: self.profile.property_summary(),
        });
    }

    /// Run one turn to completion. `stop` ends capture early.
    pub async fn run_turn(&mut self, stop: CancellationToken) -> TurnOutcome {
        let outcome = self.turn_steps(stop).await;
        self.set_phase(TurnPhase::Idle);
        debug!(?outcome, "Turn finished");
        outcome
    }

    async fn turn_steps(&mut self, stop: CancellationToken) -> TurnOutcome {
        self.set_phase(TurnPhase::Recording);
        if let Err(e) = self.session.arm() {
            self.report(&e);
            return TurnOutcome::Failed;
        }
        self.emit(RehearsalEvent::RecordingStart {});

        let recording = match self.session.record(&stop).await {
            Ok(r) => r,
            Err(e) => {
                self.session.release();
                self.report(&e);
                return TurnOutcome::Failed;
            }
        };
        self.emit(RehearsalEvent::RecordingStop {
            reason: recording.reason.to_string(),
        });
        let Some(clip) = recording.clip else {
            info!("No audio captured, turn discarded");
            self.emit(RehearsalEvent::TurnDropped {
                reason: "no_audio".into(),
            });
            return TurnOutcome::NoAudio;
        };

        self.set_phase(TurnPhase::Transcribing);
        let text = match self.collaborators.transcriber.transcribe(&clip).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                self.report(&RehearsalError::transport(Collaborator::Transcriber, e));
                return TurnOutcome::Failed;
            }
        };
        self.emit(RehearsalEvent::Transcription { text: text.clone() });
        if text.chars().count() < self.min_transcript_chars {
            debug!(text = %text, "Transcript too short, dropping turn");
            self.emit(RehearsalEvent::TurnDropped {
                reason: "trivial_transcript".into(),
            });
            return TurnOutcome::Dropped;
        }
        self.append(Speaker::Agent, text);

        self.set_phase(TurnPhase::Generating);
        let (reply, source) = self.reply().await;
        self.append(Speaker::Counterpart, reply.clone());
        self.emit(RehearsalEvent::Response {
            text: reply.clone(),
            source,
        });

        self.set_phase(TurnPhase::Speaking);
        self.speak(&reply).await;
        TurnOutcome::Completed
    }

    async fn reply(&mut self) -> (String, ReplySource) {
        let stage = derive_stage(&self.transcript);
        let state = persona::derive(&self.transcript);
        let directive = ConsistencyDirective::from(&state);
        debug!(%stage, stance = ?state.valuation_stance, upgrades = state.disclosed_upgrades, "Persona state");

        let request = ReplyRequest {
            transcript: &self.transcript,
            directive: &directive,
            profile: &self.profile,
            stage,
        };
        match self.collaborators.generator.generate(request).await {
            Ok(text) => (text, ReplySource::Generator),
            Err(e) => {
                let err = RehearsalError::transport(Collaborator::Generator, e);
                warn!(error = %err, "Falling back to canned reply");
                let line = canned_reply(stage, &self.profile, &state, &mut self.rng);
                (line.to_string(), ReplySource::Canned)
            }
        }
    }

    async fn speak(&mut self, reply: &str) {
        self.emit(RehearsalEvent::SpeakingStart {
            text: reply.to_string(),
        });

        let failure = match self.collaborators.synthesizer.synthesize(reply).await {
            Ok(clip) if clip.is_empty() => {
                Some(RehearsalError::Synthesis("synthesizer returned no audio".into()))
            }
            Ok(clip) => match self.collaborators.output.play(&clip).await {
                Ok(()) => None,
                Err(e) => Some(RehearsalError::Playback(e.to_string())),
            },
            Err(e) => Some(RehearsalError::Synthesis(e.to_string())),
        };

        if let Some(err) = failure {
            warn!(error = %err, "Speaking reply through on-device narration");
            self.emit(RehearsalEvent::NarrationFallback {
                text: reply.to_string(),
                reason: err.kind().to_string(),
            });
            if let Err(e) = self.collaborators.narrator.narrate(reply).await {
                error!("Narration failed: {}", e);
                self.emit(RehearsalEvent::error(
                    "narration_failure",
                    format!("Narration failed: {}", e),
                ));
            }
        }

        self.emit(RehearsalEvent::SpeakingEnd {});
    }

    fn handle_idle(&mut self, cmd: UiCommand) -> IdleAction {
        match cmd {
            UiCommand::ToggleRecording {} | UiCommand::StartRecording {} => {
                return IdleAction::StartTurn
            }
            UiCommand::StopRecording {} => debug!("Stop requested with no turn in flight"),
            UiCommand::SetContinuous { enabled } => self.set_continuous(enabled),
            UiCommand::NewConversation {} => self.new_conversation(),
            UiCommand::GetTranscript {} => self.emit(RehearsalEvent::Transcript {
                utterances: self.transcript.utterances().to_vec(),
            }),
            UiCommand::GetScenario {} => self.announce_scenario(),
            UiCommand::Ping {} => self.emit(RehearsalEvent::Pong {}),
            UiCommand::Shutdown {} => return IdleAction::Shutdown,
        }
        IdleAction::Wait
    }

    /// Commands that arrive mid-turn. Anything that would touch the
    /// transcript or scenario waits for the turn to end.
    fn handle_in_flight(
        cmd: UiCommand,
        controls: &TurnControls,
        events: &mpsc::UnboundedSender<RehearsalEvent>,
        deferred: &mut Vec<UiCommand>,
    ) {
        match cmd {
            UiCommand::ToggleRecording {} | UiCommand::StopRecording {} => {
                info!("Stop requested during turn");
                controls.request_stop();
            }
            UiCommand::StartRecording {} => {
                let _ = events.send(RehearsalEvent::error(
                    "busy",
                    "A turn is already in progress",
                ));
            }
            UiCommand::Ping {} => {
                let _ = events.send(RehearsalEvent::Pong {});
            }
            other => deferred.push(other),
        }
    }

    /// Serve commands until shutdown or until the command channel closes.
    pub async fn run(&mut self, mut commands: mpsc::UnboundedReceiver<UiCommand>) {
        self.announce_scenario();
        let mut rearm = false;

        loop {
            if rearm {
                debug!("Re-arming capture for the next turn");
            } else {
                match commands.recv().await {
                    Some(cmd) => match self.handle_idle(cmd) {
                        IdleAction::Wait => continue,
                        IdleAction::StartTurn => self.controls.clear_manual_stop(),
                        IdleAction::Shutdown => break,
                    },
                    None => {
                        info!("Command channel closed, shutting down");
                        break;
                    }
                }
            }

            let stop = self.controls.fresh_capture_token();
            let controls = Arc::clone(&self.controls);
            let events = self.events.clone();
            let mut deferred = Vec::new();
            let mut commands_open = true;

            let finished = {
                let turn = self.run_turn(stop);
                tokio::pin!(turn);
                loop {
                    tokio::select! {
                        biased;
                        outcome = &mut turn => break Some(outcome),
                        cmd = commands.recv(), if commands_open => match cmd {
                            Some(UiCommand::Shutdown {}) => break None,
                            Some(cmd) => {
                                Self::handle_in_flight(cmd, &controls, &events, &mut deferred)
                            }
                            None => {
                                commands_open = false;
                                controls.request_stop();
                            }
                        },
                    }
                }
            };

            let Some(outcome) = finished else {
                info!("Shutdown requested during turn");
                break;
            };
            if !commands_open {
                info!("Command channel closed, shutting down");
                break;
            }
            for cmd in deferred {
                self.handle_idle(cmd);
            }
            rearm = outcome.allows_rearm()
                && self.controls.is_continuous()
                && !self.controls.manual_stop();
        }

        self.session.release();
        self.set_phase(TurnPhase::Idle);
        self.emit(RehearsalEvent::Stopping {});
    }
}
