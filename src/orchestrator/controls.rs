//! Flags the command loop flips while a turn is in flight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tokio_util::sync::CancellationToken;

/// Shared between the running turn and the command handler.
#[derive(Debug)]
pub struct TurnControls {
    continuous: AtomicBool,
    manual_stop: AtomicBool,
    capture_stop: Mutex<CancellationToken>,
}

impl TurnControls {
    pub fn new(continuous: bool) -> Self {
        Self {
            continuous: AtomicBool::new(continuous),
            manual_stop: AtomicBool::new(false),
            capture_stop: Mutex::new(CancellationToken::new()),
        }
    }

    pub fn is_continuous(&self) -> bool {
        self.continuous.load(Ordering::Acquire)
    }

    pub fn set_continuous(&self, enabled: bool) {
        self.continuous.store(enabled, Ordering::Release);
    }

    /// Set by an explicit stop; suppresses the automatic re-arm.
    pub fn manual_stop(&self) -> bool {
        self.manual_stop.load(Ordering::Acquire)
    }

    /// Only a user-initiated start clears the manual stop.
    pub fn clear_manual_stop(&self) {
        self.manual_stop.store(false, Ordering::Release);
    }

    /// Explicit user stop: end capture if still recording.
    pub fn request_stop(&self) {
        self.manual_stop.store(true, Ordering::Release);
        self.capture_stop
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .cancel();
    }

    /// Install a fresh stop token for the next capture and return it.
    pub fn fresh_capture_token(&self) -> CancellationToken {
        let token = CancellationToken::new();
        *self.capture_stop.lock().unwrap_or_else(|e| e.into_inner()) = token.clone();
        token
    }
}
