//! IPC bridge: stdin reader and stdout event emitter.
//!
//! A blocking stdin reader thread forwards deserialized commands through an
//! mpsc channel; events go out as one JSON line each.

use std::io::{self, BufRead, Write};

use tokio::sync::mpsc;
use tracing::{debug, error};

use super::{RehearsalEvent, UiCommand};

/// Emit an event as a JSON line on stdout and flush.
pub fn emit_event(event: &RehearsalEvent) {
    let json = match serde_json::to_string(event) {
        Ok(j) => j,
        Err(e) => {
            error!("Failed to serialize event: {}", e);
            return;
        }
    };
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    // Pipe may be closed; the reader side notices that on its own.
    let _ = writeln!(handle, "{}", json);
    let _ = handle.flush();
}

/// Accept `{"type": ...}` as an alias for `{"command": ...}`.
fn normalize_command_json(input: &str) -> String {
    if let Ok(mut obj) = serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(input)
    {
        if !obj.contains_key("command") {
            if let Some(type_val) = obj.remove("type") {
                obj.insert("command".to_string(), type_val);
                if let Ok(json) = serde_json::to_string(&obj) {
                    return json;
                }
            }
        }
    }
    input.to_string()
}

/// Parse one stdin line. `Ok(None)` for blank lines.
pub fn parse_command_line(line: &str) -> Result<Option<UiCommand>, serde_json::Error> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(&normalize_command_json(trimmed)).map(Some)
}

/// Spawn a blocking thread that reads JSON lines from stdin and forwards
/// them as `UiCommand`s. Malformed lines produce an `error` event and are
/// skipped.
///
/// The thread exits when stdin closes (parent process gone) or the
/// receiver is dropped.
pub fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<UiCommand> {
    let (tx, rx) = mpsc::unbounded_channel();

    std::thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let text = match line {
                Ok(text) => text,
                Err(e) => {
                    error!("stdin read error: {}", e);
                    break;
                }
            };
            match parse_command_line(&text) {
                Ok(Some(cmd)) => {
                    debug!(?cmd, "Received command");
                    if tx.send(cmd).is_err() {
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    error!("Invalid JSON command: {} (input: {})", e, text.trim());
                    emit_event(&RehearsalEvent::error(
                        "invalid_command",
                        format!("Invalid JSON command: {}", e),
                    ));
                }
            }
        }
        debug!("stdin reader thread exiting");
    });

    rx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_field_is_accepted_as_command() {
        let cmd = parse_command_line(r#"{"type":"ping"}"#).unwrap();
        assert_eq!(cmd, Some(UiCommand::Ping {}));
    }

    #[test]
    fn blank_lines_are_skipped() {
        assert_eq!(parse_command_line("   ").unwrap(), None);
    }

    #[test]
    fn malformed_lines_are_errors() {
        assert!(parse_command_line("{not json").is_err());
        assert!(parse_command_line(r#"{"command":"set_continuous"}"#).is_err());
    }
}
