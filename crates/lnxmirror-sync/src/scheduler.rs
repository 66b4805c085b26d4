//! Mirror scheduler - re-runs a mirror pass at a fixed period
//!
//! The [`MirrorScheduler`] owns no mirroring state; it only decides *when* a
//! pass runs. Ticks are laid out on a fixed grid (`start + k * period`), so
//! a pass that overruns its period is followed immediately by the next one
//! instead of pushing every later tick back.
//!
//! ## Flow
//!
//! ```text
//! interval.tick() ──→ cancelled? ──yes──→ return tick count
//!        ▲                │ no
//!        └──── pass(n) ◄──┘
//! ```
//!
//! The pass closure runs inline and blocking, so cancellation can only be
//! observed between passes, never in the middle of one.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::MirrorError;

// ============================================================================
// MirrorScheduler struct
// ============================================================================

/// Drives a mirror pass every `period` until cancelled
#[derive(Debug, Clone)]
pub struct MirrorScheduler {
    /// Distance between two scheduled tick starts
    period: Duration,
    /// Cancelled by the signal handler (or a test) to stop the loop
    shutdown: CancellationToken,
}

impl MirrorScheduler {
    /// Creates a new `MirrorScheduler`
    ///
    /// # Errors
    /// Returns [`MirrorError::InvalidPeriod`] for a zero period.
    pub fn new(period: Duration, shutdown: CancellationToken) -> Result<Self, MirrorError> {
        if period.is_zero() {
            return Err(MirrorError::InvalidPeriod);
        }
        Ok(Self { period, shutdown })
    }

    /// Convenience constructor taking whole seconds
    pub fn from_secs(seconds: u64, shutdown: CancellationToken) -> Result<Self, MirrorError> {
        Self::new(Duration::from_secs(seconds), shutdown)
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Token that stops [`run`](Self::run) at the next tick boundary
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    // ========================================================================
    // MirrorScheduler::run()
    // ========================================================================

    /// Main loop
    ///
    /// The first tick fires immediately. `pass` receives the 1-based tick
    /// number. Returns the number of ticks executed once the shutdown token
    /// is cancelled.
    pub async fn run<F>(&self, mut pass: F) -> u64
    where
        F: FnMut(u64),
    {
        info!(period_secs = self.period.as_secs_f64(), "Mirror scheduler starting");

        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Burst);

        let mut ticks: u64 = 0;

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    info!("Shutdown requested, stopping scheduler");
                    break;
                }
                _ = interval.tick() => {}
            }

            // A token cancelled while the tick was already due still wins.
            if self.shutdown.is_cancelled() {
                info!("Shutdown requested, stopping scheduler");
                break;
            }

            ticks += 1;
            debug!(tick = ticks, "Running scheduled mirror pass");
            pass(ticks);
        }

        info!(ticks, "Mirror scheduler stopped");
        ticks
    }
}

// ============================================================================
// Unit tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tokio::time::Instant;

    use super::*;

    #[test]
    fn test_zero_period_rejected() {
        let result = MirrorScheduler::new(Duration::ZERO, CancellationToken::new());
        assert!(matches!(result, Err(MirrorError::InvalidPeriod)));
        assert!(MirrorScheduler::from_secs(0, CancellationToken::new()).is_err());
    }

    #[test]
    fn test_from_secs() {
        let scheduler = MirrorScheduler::from_secs(5, CancellationToken::new()).unwrap();
        assert_eq!(scheduler.period(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_start_runs_nothing() {
        let token = CancellationToken::new();
        token.cancel();
        let scheduler = MirrorScheduler::from_secs(5, token).unwrap();

        let mut calls = 0;
        let ticks = scheduler.run(|_| calls += 1).await;
        assert_eq!(ticks, 0);
        assert_eq!(calls, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_is_immediate_then_periodic() {
        let token = CancellationToken::new();
        let scheduler = MirrorScheduler::from_secs(5, token.clone()).unwrap();
        let start = Instant::now();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let recorder = seen.clone();
        let ticks = scheduler
            .run(move |n| {
                recorder.lock().unwrap().push(start.elapsed().as_secs());
                if n == 3 {
                    token.cancel();
                }
            })
            .await;

        assert_eq!(ticks, 3);
        assert_eq!(*seen.lock().unwrap(), vec![0, 5, 10]);
    }

    // Real clock: a blocking pass cannot advance paused tokio time.
    #[tokio::test]
    async fn test_overrun_does_not_drift() {
        let token = CancellationToken::new();
        let scheduler = MirrorScheduler::new(Duration::from_millis(200), token.clone()).unwrap();
        let start = std::time::Instant::now();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let recorder = seen.clone();
        let ticks = scheduler
            .run(move |n| {
                recorder.lock().unwrap().push(start.elapsed());
                if n == 1 {
                    // 300ms pass against a 200ms period.
                    std::thread::sleep(Duration::from_millis(300));
                }
                if n == 3 {
                    token.cancel();
                }
            })
            .await;

        assert_eq!(ticks, 3);
        let seen = seen.lock().unwrap();
        // Tick 2 was due at 200ms and fires as soon as pass 1 ends; tick 3
        // stays on the grid at 400ms instead of drifting to 500ms.
        assert!(seen[1] >= Duration::from_millis(300));
        assert!(seen[2] >= Duration::from_millis(390));
        assert!(seen[2] < Duration::from_millis(480), "tick 3 drifted: {:?}", seen[2]);
    }
}
