//! Thread-safe per-state visit counters.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Live visit counters, one atomic slot per destination state.
///
/// Hundreds of workers increment concurrently without ever serializing
/// through a lock. `snapshot_and_reset` is called only by the phase
/// controller at phase boundaries; increments that straddle a snapshot
/// can land on either side of it, which is acceptable for a load
/// generator.
pub struct Stats {
    counts: Vec<AtomicU64>,
}

impl Stats {
    pub fn new(state_count: usize) -> Self {
        Self {
            counts: (0..state_count).map(|_| AtomicU64::new(0)).collect(),
        }
    }

    pub fn state_count(&self) -> usize {
        self.counts.len()
    }

    /// Credit one visit to `state`.
    pub fn increment(&self, state: usize) {
        self.counts[state].fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the current counts without resetting them.
    pub fn snapshot(&self) -> StateCounts {
        StateCounts {
            counts: self.counts.iter().map(|c| c.load(Ordering::Relaxed)).collect(),
        }
    }

    /// Take the current counts and zero the live slots.
    pub fn snapshot_and_reset(&self) -> StateCounts {
        StateCounts {
            counts: self.counts.iter().map(|c| c.swap(0, Ordering::Relaxed)).collect(),
        }
    }
}

/// An immutable snapshot of per-state visit counts.
///
/// Snapshots merge element-wise; merging is commutative, associative,
/// and never decreases a counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateCounts {
    counts: Vec<u64>,
}

impl StateCounts {
    pub fn zeroed(state_count: usize) -> Self {
        Self {
            counts: vec![0; state_count],
        }
    }

    pub fn get(&self, state: usize) -> u64 {
        self.counts[state]
    }

    /// Element-wise add `other` into `self`.
    pub fn merge(&mut self, other: &StateCounts) {
        debug_assert_eq!(self.counts.len(), other.counts.len());
        for (slot, &value) in self.counts.iter_mut().zip(&other.counts) {
            *slot += value;
        }
    }

    /// Total visits across all states.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Visits per second for one state over `elapsed`.
    pub fn rate(&self, state: usize, elapsed: Duration) -> f64 {
        per_second(self.counts[state], elapsed)
    }

    /// Total visits per second over `elapsed`.
    pub fn total_rate(&self, elapsed: Duration) -> f64 {
        per_second(self.total(), elapsed)
    }

    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.counts.iter().copied()
    }
}

fn per_second(count: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        count as f64 / secs
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn counts(values: &[u64]) -> StateCounts {
        StateCounts {
            counts: values.to_vec(),
        }
    }

    #[test]
    fn merge_is_associative_and_commutative() {
        let a = counts(&[1, 2, 3]);
        let b = counts(&[10, 0, 5]);
        let c = counts(&[0, 7, 1]);

        let mut left = a.clone();
        left.merge(&b);
        left.merge(&c);

        let mut right_inner = b.clone();
        right_inner.merge(&c);
        let mut right = a.clone();
        right.merge(&right_inner);

        assert_eq!(left, right);

        let mut ab = a.clone();
        ab.merge(&b);
        let mut ba = b.clone();
        ba.merge(&a);
        assert_eq!(ab, ba);
    }

    #[test]
    fn merge_never_decreases_a_counter() {
        let mut base = counts(&[5, 0, 9]);
        let before = base.clone();
        base.merge(&counts(&[0, 3, 1]));
        for (b, a) in before.iter().zip(base.iter()) {
            assert!(a >= b);
        }
    }

    #[test]
    fn snapshot_and_reset_zeroes_the_live_counts() {
        let stats = Stats::new(3);
        stats.increment(0);
        stats.increment(2);
        stats.increment(2);

        let snap = stats.snapshot_and_reset();
        assert_eq!(snap.get(0), 1);
        assert_eq!(snap.get(2), 2);
        assert_eq!(stats.snapshot().total(), 0);
    }

    #[test]
    fn concurrent_increments_lose_nothing_within_a_stable_phase() {
        let stats = Arc::new(Stats::new(4));
        let workers = 8;
        let per_worker = 2500u64;

        let handles: Vec<_> = (0..workers)
            .map(|w| {
                let stats = Arc::clone(&stats);
                std::thread::spawn(move || {
                    for i in 0..per_worker {
                        stats.increment((w + i as usize) % 4);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(stats.snapshot().total(), workers as u64 * per_worker);
    }

    #[test]
    fn rate_is_count_over_elapsed_seconds() {
        let snap = counts(&[30, 70]);
        let elapsed = Duration::from_secs(10);
        assert_eq!(snap.rate(0, elapsed), 3.0);
        assert_eq!(snap.total_rate(elapsed), 10.0);
        assert_eq!(snap.total_rate(Duration::ZERO), 0.0);
    }
}
