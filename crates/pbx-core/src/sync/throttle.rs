//! Cooldown between automatic reconciliation passes

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Gate that admits at most one reconciliation per cooldown window.
///
/// The last-run timestamp is a single atomic, claimed with compare-and-swap,
/// so concurrent callers (or several engines sharing one throttle) cannot
/// both pass inside the same window.
#[derive(Debug)]
pub struct ReconcileThrottle {
    cooldown: Duration,
    /// Milliseconds since the epoch; zero means never.
    last_run: AtomicU64,
}

impl Default for ReconcileThrottle {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

impl ReconcileThrottle {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_run: AtomicU64::new(0),
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Claim the current window. Returns false while the cooldown is running.
    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(Utc::now())
    }

    pub fn try_acquire_at(&self, now: DateTime<Utc>) -> bool {
        // Keep zero reserved for "never run"
        let now_ms = u64::try_from(now.timestamp_millis()).unwrap_or(0).max(1);
        let last = self.last_run.load(Ordering::SeqCst);
        let cooldown_ms = u64::try_from(self.cooldown.as_millis()).unwrap_or(u64::MAX);
        if last != 0 && now_ms.saturating_sub(last) < cooldown_ms {
            return false;
        }
        self.last_run
            .compare_exchange(last, now_ms, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// When the last admitted pass started.
    pub fn last_run(&self) -> Option<DateTime<Utc>> {
        match self.last_run.load(Ordering::SeqCst) {
            0 => None,
            ms => DateTime::from_timestamp_millis(i64::try_from(ms).ok()?),
        }
    }

    /// Forget the last run so the next call passes.
    pub fn reset(&self) {
        self.last_run.store(0, Ordering::SeqCst);
    }
}
