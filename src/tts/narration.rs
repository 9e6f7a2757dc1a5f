//! On-device narration: the last resort when synthesis or playback fails.

use futures_util::future::BoxFuture;
use tokio::process::Command;
use tracing::{debug, info};

/// Speaks text through the platform's own speech engine.
pub trait Narrator: Send + Sync {
    /// Resolves once the text has been spoken.
    fn narrate<'a>(&'a self, text: &'a str) -> BoxFuture<'a, anyhow::Result<()>>;
}

/// Runs a speech command with the text as its last argument.
pub struct CommandNarrator {
    program: String,
    args: Vec<String>,
}

impl CommandNarrator {
    /// `say` on macOS, `espeak-ng` elsewhere.
    pub fn platform_default() -> Self {
        if cfg!(target_os = "macos") {
            Self::new("say", Vec::new())
        } else {
            Self::new("espeak-ng", Vec::new())
        }
    }

    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Parse a configured command line like `"espeak-ng -v en-us"`.
    ///
    /// Blank input falls back to the platform default.
    pub fn from_command_line(line: Option<&str>) -> Self {
        let mut parts = line.unwrap_or_default().split_whitespace().map(str::to_string);
        match parts.next() {
            Some(program) => Self::new(program, parts.collect()),
            None => Self::platform_default(),
        }
    }

    #[cfg(test)]
    pub fn program(&self) -> &str {
        &self.program
    }

    async fn run(&self, text: &str) -> anyhow::Result<()> {
        debug!(program = %self.program, text_len = text.len(), "Narrating reply");
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to run {}: {}", self.program, e))?;

        if !status.success() {
            anyhow::bail!("{} exited with {}", self.program, status);
        }
        info!(program = %self.program, "Narration complete");
        Ok(())
    }
}

impl Narrator for CommandNarrator {
    fn narrate<'a>(&'a self, text: &'a str) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(self.run(text))
    }
}
