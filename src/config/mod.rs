//! Configuration reading and data directory paths.

pub mod paths;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use paths::get_data_dir;

/// Default grace period of continuous silence before a turn ends.
pub const DEFAULT_SILENCE_GRACE_MS: u64 = 1500;

/// Default voiced threshold: 10 on the 8-bit analyser magnitude scale.
pub const DEFAULT_VOICED_THRESHOLD: f32 = 10.0 / 255.0;

/// Transcripts shorter than this (after trimming) are dropped.
pub const DEFAULT_MIN_TRANSCRIPT_CHARS: usize = 2;

/// rehearsal_config.json shape (written by the UI settings panel).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RehearsalConfig {
    #[serde(default)]
    pub input_device: Option<String>,
    #[serde(default)]
    pub silence_grace_ms: Option<u64>,
    #[serde(default)]
    pub voiced_threshold: Option<f32>,
    #[serde(default)]
    pub min_transcript_chars: Option<usize>,
    #[serde(default)]
    pub continuous_mode: Option<bool>,
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default)]
    pub elevenlabs_api_key: Option<String>,
    #[serde(default)]
    pub stt_adapter: Option<String>,
    #[serde(default)]
    pub tts_adapter: Option<String>,
    #[serde(default)]
    pub tts_voice: Option<String>,
    #[serde(default)]
    pub chat_model: Option<String>,
    #[serde(default)]
    pub tts_volume: Option<f32>,
    #[serde(default)]
    pub narration_command: Option<String>,
}

impl RehearsalConfig {
    pub fn silence_grace(&self) -> Duration {
        Duration::from_millis(self.silence_grace_ms.unwrap_or(DEFAULT_SILENCE_GRACE_MS))
    }

    pub fn voiced_threshold(&self) -> f32 {
        self.voiced_threshold
            .unwrap_or(DEFAULT_VOICED_THRESHOLD)
            .clamp(0.0, 1.0)
    }

    pub fn min_transcript_chars(&self) -> usize {
        self.min_transcript_chars
            .unwrap_or(DEFAULT_MIN_TRANSCRIPT_CHARS)
    }

    pub fn continuous_mode(&self) -> bool {
        self.continuous_mode.unwrap_or(false)
    }

    pub fn stt_adapter(&self) -> &str {
        self.stt_adapter.as_deref().unwrap_or("openai")
    }

    pub fn tts_adapter(&self) -> &str {
        self.tts_adapter.as_deref().unwrap_or("elevenlabs")
    }

    pub fn chat_model(&self) -> &str {
        self.chat_model.as_deref().unwrap_or("gpt-4")
    }

    pub fn tts_volume(&self) -> f32 {
        self.tts_volume.unwrap_or(1.0).clamp(0.0, 1.0)
    }

    /// Fill missing credentials from `OPENAI_API_KEY` / `ELEVENLABS_API_KEY`.
    pub fn with_env_credentials(mut self) -> Self {
        self.apply_credentials(
            std::env::var("OPENAI_API_KEY").ok(),
            std::env::var("ELEVENLABS_API_KEY").ok(),
        );
        self
    }

    fn apply_credentials(&mut self, openai: Option<String>, elevenlabs: Option<String>) {
        if self.openai_api_key.is_none() {
            self.openai_api_key = openai.filter(|k| !k.trim().is_empty());
        }
        if self.elevenlabs_api_key.is_none() {
            self.elevenlabs_api_key = elevenlabs.filter(|k| !k.trim().is_empty());
        }
    }
}

/// Read rehearsal_config.json from the data directory.
pub fn read_rehearsal_config() -> RehearsalConfig {
    load_config_from(&get_config_path())
}

/// Read a config file, falling back to defaults when absent or malformed.
pub fn load_config_from(path: &Path) -> RehearsalConfig {
    read_json_file(path).unwrap_or_default()
}

/// Path to rehearsal_config.json.
pub fn get_config_path() -> PathBuf {
    get_data_dir().join("rehearsal_config.json")
}

/// Generic helper: read a JSON file and deserialize it.
fn read_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Option<T> {
    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(val) => Some(val),
            Err(e) => {
                warn!("Failed to parse {}: {}", path.display(), e);
                None
            }
        },
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to read {}: {}", path.display(), e);
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("nope.json"));
        assert_eq!(cfg.silence_grace(), Duration::from_millis(1500));
        assert_eq!(cfg.min_transcript_chars(), 2);
        assert!(!cfg.continuous_mode());
        assert_eq!(cfg.chat_model(), "gpt-4");
        assert!((cfg.voiced_threshold() - 10.0 / 255.0).abs() < f32::EPSILON);
    }

    #[test]
    fn camel_case_fields_are_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rehearsal_config.json");
        let mut f = std::fs::File::create(&path).unwrap();
        write!(
            f,
            r#"{{"silenceGraceMs": 900, "continuousMode": true, "ttsAdapter": "openai", "ttsVolume": 3.0}}"#
        )
        .unwrap();

        let cfg = load_config_from(&path);
        assert_eq!(cfg.silence_grace(), Duration::from_millis(900));
        assert!(cfg.continuous_mode());
        assert_eq!(cfg.tts_adapter(), "openai");
        assert_eq!(cfg.tts_volume(), 1.0);
    }

    #[test]
    fn malformed_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rehearsal_config.json");
        std::fs::write(&path, "{not json").unwrap();
        let cfg = load_config_from(&path);
        assert!(cfg.openai_api_key.is_none());
    }

    #[test]
    fn env_credentials_only_fill_gaps() {
        let mut cfg = RehearsalConfig {
            openai_api_key: Some("from-file".into()),
            ..Default::default()
        };
        cfg.apply_credentials(Some("from-env".into()), Some("  ".into()));
        assert_eq!(cfg.openai_api_key.as_deref(), Some("from-file"));
        assert!(cfg.elevenlabs_api_key.is_none());
    }
}
