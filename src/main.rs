//! Call rehearsal: a voice practice partner for real estate follow-up calls.
//!
//! Talks to the UI shell via JSON-line IPC on stdin/stdout. The user plays
//! the agent; the core captures their speech, transcribes it, and answers as
//! a simulated homeowner whose stated opinions stay consistent for the whole
//! conversation.

mod audio;
mod config;
mod error;
mod ipc;
mod llm;
mod logging;
mod orchestrator;
mod persona;
mod stt;
#[cfg(test)]
mod testing;
mod transcript;
mod tts;
mod vad;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use audio::{list_devices, CpalMicrophone, RecordingSession};
use config::{read_rehearsal_config, RehearsalConfig};
use error::{RehearsalError, RehearsalResult};
use ipc::bridge::{emit_event, spawn_stdin_reader};
use ipc::RehearsalEvent;
use orchestrator::{Collaborators, TurnOrchestrator};
use tts::{CommandNarrator, RodioOutput};
use vad::{AudioLevelMonitor, SilenceTimer};

/// Build every external collaborator from config.
fn build_collaborators(config: &RehearsalConfig) -> RehearsalResult<Collaborators> {
    let to_config_error = |e: anyhow::Error| RehearsalError::Config(e.to_string());

    let transcriber = stt::create_transcriber(config).map_err(to_config_error)?;
    let generator = llm::create_generator(config).map_err(to_config_error)?;
    let synthesizer = tts::create_synthesizer(config).map_err(to_config_error)?;
    info!(
        stt = %transcriber.name(),
        llm = %generator.name(),
        tts = %synthesizer.name(),
        "Collaborators ready"
    );

    Ok(Collaborators {
        transcriber,
        generator,
        synthesizer,
        output: Box::new(RodioOutput::new(config.tts_volume())),
        narrator: Box::new(CommandNarrator::from_command_line(
            config.narration_command.as_deref(),
        )),
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    logging::init(&config::paths::get_log_dir());

    // Emit starting event immediately so the UI knows we're alive.
    emit_event(&RehearsalEvent::Starting {});

    let config = read_rehearsal_config().with_env_credentials();
    info!(
        stt = config.stt_adapter(),
        tts = config.tts_adapter(),
        model = config.chat_model(),
        grace_ms = config.silence_grace().as_millis() as u64,
        threshold = config.voiced_threshold(),
        continuous = config.continuous_mode(),
        "Configuration loaded"
    );
    debug!(devices = ?list_devices(), "Available input devices");

    let collaborators = match build_collaborators(&config) {
        Ok(c) => c,
        Err(e) => {
            error!("{}", e);
            emit_event(&RehearsalEvent::error(e.kind(), e.to_string()));
            emit_event(&RehearsalEvent::Stopping {});
            return;
        }
    };

    let session = RecordingSession::new(
        Box::new(CpalMicrophone::new(config.input_device.clone())),
        AudioLevelMonitor::new(config.voiced_threshold()),
        SilenceTimer::new(config.silence_grace()),
    );

    // Events funnel through one task so stdout lines never interleave.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<RehearsalEvent>();
    let forwarder = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            emit_event(&event);
        }
    });

    let mut orchestrator = TurnOrchestrator::new(
        session,
        collaborators,
        config.min_transcript_chars(),
        event_tx.clone(),
    );
    if config.continuous_mode() {
        orchestrator.set_continuous(true);
    }

    let commands = spawn_stdin_reader();
    let _ = event_tx.send(RehearsalEvent::Ready {});
    info!("Rehearsal core ready");

    orchestrator.run(commands).await;

    drop(orchestrator);
    drop(event_tx);
    if let Err(e) = forwarder.await {
        error!("Event forwarder failed: {}", e);
    }
    info!("Rehearsal core shut down");
}
