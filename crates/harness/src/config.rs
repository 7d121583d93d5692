//! Run configuration for the harness.

use crate::error::HarnessError;
use std::time::Duration;

/// One ramp or measurement phase: how long it lasts, how much think
/// times are stretched, and an optional early-exit transaction count.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseConfig {
    /// Wall-clock length of the phase.
    pub duration: Duration,
    /// Think-time multiplier while the phase runs. `1.0` is nominal
    /// load; larger values slow every session down.
    pub slowdown: f32,
    /// End the phase early once this many transitions complete.
    pub max_transactions: Option<u64>,
}

impl PhaseConfig {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            slowdown: 1.0,
            max_transactions: None,
        }
    }

    pub fn with_slowdown(mut self, slowdown: f32) -> Self {
        self.slowdown = slowdown;
        self
    }

    pub fn with_max_transactions(mut self, max: u64) -> Self {
        self.max_transactions = Some(max);
        self
    }
}

/// Full configuration for one benchmark run.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Number of concurrent emulated users.
    pub sessions: usize,
    /// Delay between consecutive worker launches, spreading the initial
    /// request burst.
    pub start_stagger: Duration,
    /// Ramp phases run at reduced load around the measured window.
    pub up_ramp: PhaseConfig,
    pub steady: PhaseConfig,
    pub down_ramp: PhaseConfig,
    /// Start a fresh session when one reaches End of Session. Disabled,
    /// the run drains as sessions finish.
    pub restart_sessions: bool,
    /// Base RNG seed; worker `i` derives its own stream from it.
    pub seed: u64,
    /// How long to wait for each worker to exit after the down-ramp.
    pub shutdown_timeout: Duration,
}

impl HarnessConfig {
    pub fn new(sessions: usize) -> Self {
        Self {
            sessions,
            start_stagger: Duration::from_millis(5),
            up_ramp: PhaseConfig::new(Duration::from_secs(60)).with_slowdown(10.0),
            steady: PhaseConfig::new(Duration::from_secs(300)),
            down_ramp: PhaseConfig::new(Duration::from_secs(60)).with_slowdown(10.0),
            restart_sessions: true,
            seed: 0,
            shutdown_timeout: Duration::from_secs(2),
        }
    }

    pub fn with_start_stagger(mut self, stagger: Duration) -> Self {
        self.start_stagger = stagger;
        self
    }

    pub fn with_up_ramp(mut self, phase: PhaseConfig) -> Self {
        self.up_ramp = phase;
        self
    }

    pub fn with_steady(mut self, phase: PhaseConfig) -> Self {
        self.steady = phase;
        self
    }

    pub fn with_down_ramp(mut self, phase: PhaseConfig) -> Self {
        self.down_ramp = phase;
        self
    }

    pub fn with_restart_sessions(mut self, restart: bool) -> Self {
        self.restart_sessions = restart;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Reject configurations that cannot produce a meaningful run.
    pub fn validate(&self) -> Result<(), HarnessError> {
        if self.sessions == 0 {
            return Err(HarnessError::Config("session count must be at least 1".into()));
        }
        if self.steady.duration.is_zero() && self.steady.max_transactions.is_none() {
            return Err(HarnessError::Config(
                "steady phase needs a duration or a transaction target".into(),
            ));
        }
        for (name, phase) in [
            ("up-ramp", &self.up_ramp),
            ("steady", &self.steady),
            ("down-ramp", &self.down_ramp),
        ] {
            if !phase.slowdown.is_finite() || phase.slowdown < 0.0 {
                return Err(HarnessError::Config(format!(
                    "{name} slowdown must be a finite non-negative number"
                )));
            }
        }
        Ok(())
    }
}
