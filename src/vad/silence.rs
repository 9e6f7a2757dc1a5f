//! Debounces silent readings into a single end-of-turn signal.

use std::time::Duration;

use tokio::time::Instant;

/// Countdown that starts when speech gives way to silence.
///
/// Fires at most once per armed period. Silence before the first voiced
/// reading never starts the countdown.
#[derive(Debug)]
pub struct SilenceTimer {
    grace: Duration,
    armed: bool,
    last_voiced: Option<bool>,
    silence_since: Option<Instant>,
}

impl SilenceTimer {
    /// A disarmed timer.
    pub fn new(grace: Duration) -> Self {
        Self {
            grace,
            armed: false,
            last_voiced: None,
            silence_since: None,
        }
    }

    pub fn grace(&self) -> Duration {
        self.grace
    }

    /// Arm for a new turn, discarding any pending countdown.
    pub fn arm(&mut self) {
        self.cancel();
        self.armed = true;
    }

    /// Disarm without firing.
    pub fn cancel(&mut self) {
        self.armed = false;
        self.last_voiced = None;
        self.silence_since = None;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Feed one classification taken at `now`.
    pub fn observe(&mut self, voiced: bool, now: Instant) {
        if !self.armed {
            return;
        }
        if voiced {
            self.silence_since = None;
        } else if self.last_voiced == Some(true) {
            self.silence_since = Some(now);
        }
        self.last_voiced = Some(voiced);
    }

    /// When the pending countdown elapses, if one is running.
    pub fn deadline(&self) -> Option<Instant> {
        if !self.is_armed() {
            return None;
        }
        self.silence_since.map(|since| since + self.grace)
    }

    /// Returns `true` exactly once when the countdown has elapsed, then
    /// disarms until the next `arm`.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline() {
            Some(deadline) if now >= deadline => {
                self.cancel();
                true
            }
            _ => false,
        }
    }
}

/// Sleep until `deadline`, or forever when there is none.
pub async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const TICK: Duration = Duration::from_millis(80);
    const GRACE: Duration = Duration::from_millis(1500);

    /// Feed readings one tick apart and return the tick indices at which the
    /// timer fired.
    fn run(readings: &[bool]) -> Vec<usize> {
        let start = Instant::now();
        let mut timer = SilenceTimer::new(GRACE);
        timer.arm();
        let mut fired = Vec::new();
        for (i, &voiced) in readings.iter().enumerate() {
            let now = start + TICK * i as u32;
            timer.observe(voiced, now);
            if timer.poll(now) {
                fired.push(i);
            }
        }
        fired
    }

    /// Reference: first tick where a silent run that began right after a
    /// voiced tick has lasted at least the grace period.
    fn expected(readings: &[bool]) -> Option<usize> {
        let mut run_start = None;
        for (i, &voiced) in readings.iter().enumerate() {
            if voiced {
                run_start = None;
            } else if i > 0 && readings[i - 1] {
                run_start = Some(i);
            }
            if let Some(s) = run_start {
                if TICK * (i - s) as u32 >= GRACE {
                    return Some(i);
                }
            }
        }
        None
    }

    #[test]
    fn fires_once_after_grace() {
        let mut readings = vec![true; 5];
        readings.extend(vec![false; 40]);
        let fired = run(&readings);
        // 1500 ms / 80 ms rounds up to 19 ticks after the first silent tick.
        assert_eq!(fired, vec![5 + 19]);
    }

    #[test]
    fn speech_cancels_the_countdown() {
        let mut readings = vec![true; 3];
        readings.extend(vec![false; 15]);
        readings.push(true);
        readings.extend(vec![false; 10]);
        assert!(run(&readings).is_empty());
    }

    #[test]
    fn leading_silence_never_fires() {
        assert!(run(&[false; 100]).is_empty());
    }

    #[test]
    fn matches_reference_for_random_sequences() {
        let mut rng = StdRng::seed_from_u64(2024);
        for _ in 0..500 {
            let len = rng.gen_range(0..120);
            let bias = rng.gen_range(0.05..0.95);
            let readings: Vec<bool> = (0..len).map(|_| rng.gen_bool(bias)).collect();
            let fired = run(&readings);
            assert!(fired.len() <= 1, "fired twice for {readings:?}");
            assert_eq!(fired.first().copied(), expected(&readings), "{readings:?}");
        }
    }

    #[test]
    fn cancel_prevents_a_late_fire() {
        let start = Instant::now();
        let mut timer = SilenceTimer::new(GRACE);
        timer.arm();
        timer.observe(true, start);
        timer.observe(false, start + TICK);
        assert!(timer.deadline().is_some());

        timer.cancel();
        assert!(!timer.poll(start + Duration::from_secs(10)));
        assert!(timer.deadline().is_none());
    }

    #[test]
    fn rearm_discards_pending_countdown() {
        let start = Instant::now();
        let mut timer = SilenceTimer::new(GRACE);
        timer.arm();
        timer.observe(true, start);
        timer.observe(false, start + TICK);
        timer.arm();
        assert!(timer.deadline().is_none());
        assert!(!timer.poll(start + Duration::from_secs(10)));
    }

    #[test]
    fn disarmed_after_firing() {
        let start = Instant::now();
        let mut timer = SilenceTimer::new(GRACE);
        timer.arm();
        timer.observe(true, start);
        timer.observe(false, start + TICK);
        assert!(timer.poll(start + TICK + GRACE));
        assert!(!timer.is_armed());

        timer.observe(true, start + GRACE * 2);
        timer.observe(false, start + GRACE * 3);
        assert!(!timer.poll(start + GRACE * 10));
    }

    #[tokio::test(start_paused = true)]
    async fn sleeps_until_the_deadline() {
        let start = Instant::now();
        let mut timer = SilenceTimer::new(GRACE);
        timer.arm();
        timer.observe(true, start);
        timer.observe(false, start);
        sleep_until_deadline(timer.deadline()).await;
        assert!(timer.poll(Instant::now()));
        assert!(Instant::now() >= start + GRACE);
    }
}
