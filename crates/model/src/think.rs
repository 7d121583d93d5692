//! Think-time sampling.

use rand::Rng;
use std::time::Duration;

/// Mean of the negative-exponential think-time distribution, in ms.
const NEG_EXP_MEAN_MS: f64 = 7000.0;

/// Draws below this cutoff produce a (near) zero delay instead of an
/// unboundedly large one (TPC-W clause 5.3.2.1).
const NEG_EXP_CUTOFF: f64 = 4.54e-5;

/// How a session's think time between pages is produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ThinkTime {
    /// Use the per-state wait configured in the transition table.
    #[default]
    Fixed,

    /// Sample a negative-exponential delay with a ~7 second mean,
    /// ignoring the per-state waits.
    NegativeExponential,
}

impl ThinkTime {
    /// Produce one unscaled think time for a destination whose configured
    /// wait is `wait_ms`. The harness applies the slowdown factor.
    pub fn sample<R: Rng + ?Sized>(&self, wait_ms: u32, rng: &mut R) -> Duration {
        match self {
            ThinkTime::Fixed => Duration::from_millis(u64::from(wait_ms)),
            ThinkTime::NegativeExponential => {
                let r: f64 = rng.gen();
                let ms = if r < NEG_EXP_CUTOFF {
                    0.0
                } else {
                    -NEG_EXP_MEAN_MS * r.ln() + 0.5
                };
                Duration::from_millis(ms as u64)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn fixed_uses_the_configured_wait() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(
            ThinkTime::Fixed.sample(2500, &mut rng),
            Duration::from_millis(2500)
        );
        assert_eq!(ThinkTime::Fixed.sample(0, &mut rng), Duration::ZERO);
    }

    #[test]
    fn negative_exponential_ignores_the_wait_and_is_deterministic() {
        let mut a = ChaCha8Rng::seed_from_u64(7);
        let mut b = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..100 {
            let x = ThinkTime::NegativeExponential.sample(1, &mut a);
            let y = ThinkTime::NegativeExponential.sample(9999, &mut b);
            assert_eq!(x, y);
        }
    }

    #[test]
    fn negative_exponential_mean_is_near_seven_seconds() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let n = 20_000u32;
        let total: u64 = (0..n)
            .map(|_| {
                ThinkTime::NegativeExponential
                    .sample(0, &mut rng)
                    .as_millis() as u64
            })
            .sum();
        let mean = total as f64 / f64::from(n);
        assert!((5500.0..8500.0).contains(&mean), "mean was {mean}");
    }
}
