//! Shared run-control block: slowdown factor, transaction counter, and
//! the cooperative stop flag.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// Sentinel meaning no transaction target is armed.
const NO_TARGET: u64 = u64::MAX;

/// Mutable state shared between the phase controller and every session
/// worker for the lifetime of one run.
///
/// The slowdown factor is written only by the controller and read by
/// workers before every think-time sleep. The transaction counter is
/// bumped by workers on every completed transition and re-armed by the
/// controller at phase entry; crossing the armed target wakes the
/// controller instead of being polled. Stopping is cooperative: workers
/// check the token once per loop iteration, so one mid-sleep worker
/// completes at most one more transition after `stop`.
pub struct RunControl {
    /// f32 bits of the think-time multiplier.
    slowdown: AtomicU32,
    transactions: AtomicU64,
    target: AtomicU64,
    target_reached: Notify,
    stop: CancellationToken,
}

impl RunControl {
    pub fn new() -> Self {
        Self {
            slowdown: AtomicU32::new(1.0f32.to_bits()),
            transactions: AtomicU64::new(0),
            target: AtomicU64::new(NO_TARGET),
            target_reached: Notify::new(),
            stop: CancellationToken::new(),
        }
    }

    /// Current think-time multiplier.
    pub fn slowdown(&self) -> f32 {
        f32::from_bits(self.slowdown.load(Ordering::Relaxed))
    }

    /// Set the think-time multiplier for the phase being entered.
    /// Negative and non-finite values are treated as zero.
    pub fn set_slowdown(&self, factor: f32) {
        let factor = if factor.is_finite() && factor > 0.0 {
            factor
        } else {
            0.0
        };
        self.slowdown.store(factor.to_bits(), Ordering::Relaxed);
    }

    /// Zero the transaction counter and arm an optional completion
    /// target for the phase being entered.
    pub fn arm_target(&self, target: Option<u64>) {
        self.target
            .store(target.unwrap_or(NO_TARGET), Ordering::SeqCst);
        self.transactions.store(0, Ordering::SeqCst);
    }

    /// Record one completed transition. Wakes [`RunControl::target_reached`]
    /// waiters when the armed target is crossed.
    pub fn record_transaction(&self) {
        let n = self.transactions.fetch_add(1, Ordering::SeqCst) + 1;
        if n >= self.target.load(Ordering::SeqCst) {
            self.target_reached.notify_waiters();
        }
    }

    /// Transitions completed since the counter was last armed.
    pub fn transactions(&self) -> u64 {
        self.transactions.load(Ordering::SeqCst)
    }

    /// Resolves once the armed transaction target has been crossed.
    /// Pends forever while no target is armed.
    pub async fn target_reached(&self) {
        loop {
            let notified = self.target_reached.notified();
            tokio::pin!(notified);
            // Register with the notifier before checking the counter: an
            // unpolled Notified future does not see notify_waiters, so a
            // crossing between the check and the await would be lost.
            notified.as_mut().enable();
            let target = self.target.load(Ordering::SeqCst);
            if target != NO_TARGET && self.transactions.load(Ordering::SeqCst) >= target {
                return;
            }
            notified.await;
        }
    }

    /// Flip the stop flag. Idempotent.
    pub fn stop(&self) {
        self.stop.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.is_cancelled()
    }
}

impl Default for RunControl {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn slowdown_round_trips_and_clamps() {
        let control = RunControl::new();
        assert_eq!(control.slowdown(), 1.0);

        control.set_slowdown(12.5);
        assert_eq!(control.slowdown(), 12.5);

        control.set_slowdown(-3.0);
        assert_eq!(control.slowdown(), 0.0);

        control.set_slowdown(f32::NAN);
        assert_eq!(control.slowdown(), 0.0);
    }

    #[test]
    fn arm_target_resets_the_counter() {
        let control = RunControl::new();
        control.record_transaction();
        control.record_transaction();
        assert_eq!(control.transactions(), 2);

        control.arm_target(Some(10));
        assert_eq!(control.transactions(), 0);
    }

    #[tokio::test]
    async fn target_reached_wakes_when_the_counter_crosses() {
        let control = Arc::new(RunControl::new());
        control.arm_target(Some(3));

        let waiter = {
            let control = Arc::clone(&control);
            tokio::spawn(async move { control.target_reached().await })
        };

        for _ in 0..3 {
            control.record_transaction();
        }

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("target notification never arrived")
            .unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn a_single_final_crossing_is_never_lost() {
        // One crossing, fired from another thread while the waiter is
        // between its counter check and its await. No later transaction
        // will re-notify, so the waiter must have registered before the
        // check.
        for _ in 0..200 {
            let control = Arc::new(RunControl::new());
            control.arm_target(Some(1));

            let waiter = {
                let control = Arc::clone(&control);
                tokio::spawn(async move { control.target_reached().await })
            };
            let bumper = {
                let control = Arc::clone(&control);
                std::thread::spawn(move || control.record_transaction())
            };

            tokio::time::timeout(Duration::from_secs(2), waiter)
                .await
                .expect("final crossing was lost")
                .unwrap();
            bumper.join().unwrap();
        }
    }

    #[tokio::test]
    async fn target_reached_resolves_if_already_crossed() {
        let control = RunControl::new();
        control.arm_target(Some(2));
        control.record_transaction();
        control.record_transaction();

        // The crossing happened before anyone awaited; the condition
        // check must cover it.
        tokio::time::timeout(Duration::from_secs(1), control.target_reached())
            .await
            .expect("already-crossed target did not resolve");
    }

    #[tokio::test]
    async fn no_target_never_resolves() {
        let control = RunControl::new();
        control.arm_target(None);
        for _ in 0..100 {
            control.record_transaction();
        }

        let result =
            tokio::time::timeout(Duration::from_millis(50), control.target_reached()).await;
        assert!(result.is_err());
    }

    #[test]
    fn stop_is_sticky() {
        let control = RunControl::new();
        assert!(!control.is_stopped());
        control.stop();
        control.stop();
        assert!(control.is_stopped());
    }
}
