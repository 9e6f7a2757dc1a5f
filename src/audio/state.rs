//! Atomic capture state machine.
//!
//! `Idle → Armed → Recording → Finalizing → Idle`, every edge a
//! compare-and-swap so a racing second trigger observes the wrong state and
//! backs off instead of producing a second clip.

use std::sync::atomic::{AtomicU8, Ordering};

/// Recording lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CaptureState {
    /// No device held for a turn.
    Idle = 0,
    /// Device acquired, waiting for the first chunk.
    Armed = 1,
    /// Chunks are being buffered and classified.
    Recording = 2,
    /// Turn ended; the clip is being assembled.
    Finalizing = 3,
}

impl CaptureState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Armed,
            2 => Self::Recording,
            3 => Self::Finalizing,
            _ => Self::Idle,
        }
    }
}

impl std::fmt::Display for CaptureState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Armed => write!(f, "armed"),
            Self::Recording => write!(f, "recording"),
            Self::Finalizing => write!(f, "finalizing"),
        }
    }
}

#[derive(Debug)]
pub struct CaptureStateMachine {
    state: AtomicU8,
}

impl CaptureStateMachine {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(CaptureState::Idle as u8),
        }
    }

    pub fn current(&self) -> CaptureState {
        CaptureState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn transition(&self, from: CaptureState, to: CaptureState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Idle → Armed.
    pub fn arm(&self) -> bool {
        self.transition(CaptureState::Idle, CaptureState::Armed)
    }

    /// Armed → Recording.
    pub fn begin_recording(&self) -> bool {
        self.transition(CaptureState::Armed, CaptureState::Recording)
    }

    /// Recording (or Armed, when no chunk ever arrived) → Finalizing.
    ///
    /// Returns `false` for every trigger after the first.
    pub fn finalize(&self) -> bool {
        self.transition(CaptureState::Recording, CaptureState::Finalizing)
            || self.transition(CaptureState::Armed, CaptureState::Finalizing)
    }

    /// Finalizing → Idle.
    pub fn finish(&self) -> bool {
        self.transition(CaptureState::Finalizing, CaptureState::Idle)
    }

    /// Force back to Idle (device failure, teardown).
    pub fn reset(&self) {
        self.state.store(CaptureState::Idle as u8, Ordering::Release);
    }
}

impl Default for CaptureStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_cycle() {
        let sm = CaptureStateMachine::new();
        assert_eq!(sm.current(), CaptureState::Idle);
        assert!(sm.arm());
        assert!(sm.begin_recording());
        assert_eq!(sm.current(), CaptureState::Recording);
        assert!(sm.finalize());
        assert!(sm.finish());
        assert_eq!(sm.current(), CaptureState::Idle);
    }

    #[test]
    fn second_finalize_is_ignored() {
        let sm = CaptureStateMachine::new();
        sm.arm();
        sm.begin_recording();
        assert!(sm.finalize());
        assert!(!sm.finalize());
        assert_eq!(sm.current(), CaptureState::Finalizing);
    }

    #[test]
    fn cannot_arm_twice() {
        let sm = CaptureStateMachine::new();
        assert!(sm.arm());
        assert!(!sm.arm());
    }

    #[test]
    fn finalize_from_armed_when_nothing_arrived() {
        let sm = CaptureStateMachine::new();
        sm.arm();
        assert!(sm.finalize());
        assert!(!sm.begin_recording());
    }

    #[test]
    fn reset_returns_to_idle() {
        let sm = CaptureStateMachine::new();
        sm.arm();
        sm.begin_recording();
        sm.reset();
        assert_eq!(sm.current(), CaptureState::Idle);
        assert_eq!(sm.current().to_string(), "idle");
    }
}
