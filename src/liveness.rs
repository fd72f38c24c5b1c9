// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Liveness Tracker
//!
//! Counts consecutive attestation backend failures across all requests. A
//! wedged tappd shows up as a run of failed calls; once the run reaches the
//! configured threshold the tracker trips and asks the process to exit so
//! the external supervisor restarts it.
//!
//! ## States
//!
//! - **Healthy**: `failures < threshold`
//! - **Tripped**: terminal; the shutdown trigger has fired
//!
//! Any successful backend call resets the count to zero. The trigger fires
//! at most once, however many failures keep arriving afterwards.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, warn};

/// Default consecutive-failure threshold.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 10;

/// Delay before exiting so the in-flight error response can flush.
pub const EXIT_DELAY: Duration = Duration::from_millis(100);

/// Exit status reported to the supervisor when the tracker trips.
pub const EXIT_CODE: i32 = 1;

/// One-shot process shutdown capability.
pub trait ShutdownTrigger: Send + Sync {
    fn trigger(&self, reason: &str);
}

/// Exits the process after [`EXIT_DELAY`].
///
/// Must be called from within a Tokio runtime.
#[derive(Debug, Clone)]
pub struct DelayedExit {
    delay: Duration,
    code: i32,
}

impl DelayedExit {
    pub fn new(delay: Duration, code: i32) -> Self {
        Self { delay, code }
    }
}

impl Default for DelayedExit {
    fn default() -> Self {
        Self::new(EXIT_DELAY, EXIT_CODE)
    }
}

impl ShutdownTrigger for DelayedExit {
    fn trigger(&self, reason: &str) {
        error!(
            reason,
            delay_ms = self.delay.as_millis() as u64,
            exit_code = self.code,
            "Liveness tracker tripped, exiting for restart"
        );

        let delay = self.delay;
        let code = self.code;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            std::process::exit(code);
        });
    }
}

/// Consecutive-failure circuit breaker.
pub struct LivenessTracker {
    failures: AtomicU32,
    tripped: AtomicBool,
    threshold: u32,
    shutdown: Arc<dyn ShutdownTrigger>,
}

impl LivenessTracker {
    /// Create a tracker. A zero threshold is replaced by the default.
    pub fn new(threshold: u32, shutdown: Arc<dyn ShutdownTrigger>) -> Self {
        let threshold = if threshold == 0 {
            DEFAULT_FAILURE_THRESHOLD
        } else {
            threshold
        };

        Self {
            failures: AtomicU32::new(0),
            tripped: AtomicBool::new(false),
            threshold,
            shutdown,
        }
    }

    /// A backend call succeeded.
    pub fn record_success(&self) {
        self.failures.store(0, Ordering::SeqCst);
    }

    /// A backend call failed in `context`.
    pub fn record_failure(&self, context: &str, err: &dyn std::error::Error) {
        let failures = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                Some(n.saturating_add(1))
            })
            .map_or(u32::MAX, |previous| previous.saturating_add(1));

        warn!(
            context,
            error = %err,
            failures,
            threshold = self.threshold,
            "Attestation backend call failed"
        );

        if failures >= self.threshold
            && self
                .tripped
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
        {
            let reason = format!(
                "{failures} consecutive backend failures (threshold {}), last in {context}: {err}",
                self.threshold
            );
            self.shutdown.trigger(&reason);
        }
    }

    pub fn failures(&self) -> u32 {
        self.failures.load(Ordering::SeqCst)
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn is_tripped(&self) -> bool {
        self.tripped.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingShutdown;

    #[derive(Debug, thiserror::Error)]
    #[error("backend down")]
    struct Down;

    fn tracker(threshold: u32) -> (Arc<LivenessTracker>, Arc<RecordingShutdown>) {
        let shutdown = Arc::new(RecordingShutdown::default());
        let tracker = Arc::new(LivenessTracker::new(threshold, shutdown.clone()));
        (tracker, shutdown)
    }

    #[test]
    fn below_threshold_keeps_running() {
        let (tracker, shutdown) = tracker(10);
        for _ in 0..9 {
            tracker.record_failure("test", &Down);
        }
        assert_eq!(tracker.failures(), 9);
        assert!(!tracker.is_tripped());
        assert_eq!(shutdown.count(), 0);
    }

    #[test]
    fn reaching_threshold_triggers_once() {
        let (tracker, shutdown) = tracker(10);
        for _ in 0..10 {
            tracker.record_failure("test", &Down);
        }
        assert!(tracker.is_tripped());
        assert_eq!(shutdown.count(), 1);

        for _ in 0..25 {
            tracker.record_failure("test", &Down);
        }
        assert_eq!(shutdown.count(), 1);
        assert!(shutdown.last_reason().unwrap().contains("threshold 10"));
    }

    #[test]
    fn success_resets_the_run() {
        let (tracker, shutdown) = tracker(10);
        for _ in 0..9 {
            tracker.record_failure("test", &Down);
        }
        tracker.record_success();
        assert_eq!(tracker.failures(), 0);

        for _ in 0..9 {
            tracker.record_failure("test", &Down);
        }
        assert!(!tracker.is_tripped());
        assert_eq!(shutdown.count(), 0);
    }

    #[test]
    fn threshold_of_one_trips_on_first_failure() {
        let (tracker, shutdown) = tracker(1);
        tracker.record_failure("test", &Down);
        assert_eq!(shutdown.count(), 1);
    }

    #[test]
    fn zero_threshold_falls_back_to_default() {
        let (tracker, _) = tracker(0);
        assert_eq!(tracker.threshold(), DEFAULT_FAILURE_THRESHOLD);
    }

    #[test]
    fn counter_saturates_instead_of_wrapping() {
        let (tracker, _) = tracker(10);
        tracker.failures.store(u32::MAX, Ordering::SeqCst);
        tracker.record_failure("test", &Down);
        assert_eq!(tracker.failures(), u32::MAX);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_failures_trigger_exactly_once() {
        let (tracker, shutdown) = tracker(10);

        let handles: Vec<_> = (0..100)
            .map(|_| {
                let tracker = tracker.clone();
                tokio::spawn(async move { tracker.record_failure("concurrent", &Down) })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(tracker.failures(), 100);
        assert_eq!(shutdown.count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_successes_and_failures_stay_consistent() {
        // Fewer failures than the threshold: no interleaving may trip.
        let (tracker, shutdown) = tracker(10);
        let failures = 9;

        let handles: Vec<_> = (0..60)
            .map(|i| {
                let tracker = tracker.clone();
                tokio::spawn(async move {
                    if i % 6 == 0 && i / 6 < failures {
                        tracker.record_failure("racing", &Down);
                    } else {
                        tracker.record_success();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(tracker.failures() <= failures as u32);
        assert!(!tracker.is_tripped());
        assert_eq!(shutdown.count(), 0);

        tracker.record_success();
        assert_eq!(tracker.failures(), 0);
    }
}
