//! Phase controller: spawns the worker pool and sequences the up-ramp,
//! steady-state, and down-ramp phases of one run.

use crate::config::{HarnessConfig, PhaseConfig};
use crate::control::RunControl;
use crate::error::HarnessError;
use crate::issuer::RequestIssuer;
use crate::report::{BenchReport, PhaseEnd, PhaseSummary};
use crate::stats::{StateCounts, Stats};
use crate::worker::SessionWorker;
use auctionbench_model::TransitionTable;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// The three phases of a run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    UpRamp,
    Steady,
    DownRamp,
}

impl Phase {
    pub fn name(self) -> &'static str {
        match self {
            Phase::UpRamp => "up-ramp",
            Phase::Steady => "steady",
            Phase::DownRamp => "down-ramp",
        }
    }
}

/// Owns one benchmark run end to end: spawn workers, walk the phases,
/// stop the pool, assemble the report.
pub struct Harness {
    config: HarnessConfig,
    table: Arc<TransitionTable>,
    issuer: Arc<dyn RequestIssuer>,
    stats: Arc<Stats>,
    control: Arc<RunControl>,
}

impl Harness {
    pub fn new(
        config: HarnessConfig,
        table: Arc<TransitionTable>,
        issuer: Arc<dyn RequestIssuer>,
    ) -> Result<Self, HarnessError> {
        config.validate()?;
        let stats = Arc::new(Stats::new(table.state_count()));
        Ok(Self {
            config,
            table,
            issuer,
            stats,
            control: Arc::new(RunControl::new()),
        })
    }

    /// Run the full up-ramp / steady / down-ramp sequence and return
    /// the assembled report.
    pub async fn run(self) -> BenchReport {
        let start = Instant::now();
        // Ramp slowdown must be in force before the first request.
        self.control.set_slowdown(self.config.up_ramp.slowdown);

        let mut workers = JoinSet::new();
        for id in 0..self.config.sessions {
            let worker = SessionWorker::new(
                id,
                Arc::clone(&self.table),
                Arc::clone(&self.stats),
                Arc::clone(&self.control),
                Arc::clone(&self.issuer),
                self.config.restart_sessions,
                self.config.seed,
            );
            workers.spawn(worker.run());
            if !self.config.start_stagger.is_zero() {
                tokio::time::sleep(self.config.start_stagger).await;
            }
        }
        info!(
            sessions = self.config.sessions,
            table = %self.table.name(),
            "worker pool started"
        );

        let up_ramp = self.run_phase(Phase::UpRamp, &self.config.up_ramp).await;
        let steady = self.run_phase(Phase::Steady, &self.config.steady).await;
        let down_ramp = self.run_phase(Phase::DownRamp, &self.config.down_ramp).await;

        self.control.stop();
        self.shutdown(workers).await;
        let tail = self.stats.snapshot_and_reset();

        let mut overall = StateCounts::zeroed(self.table.state_count());
        for counts in [&up_ramp.counts, &steady.counts, &down_ramp.counts, &tail] {
            overall.merge(counts);
        }

        BenchReport {
            state_names: self.table.names().to_vec(),
            sessions: self.config.sessions,
            up_ramp,
            steady,
            down_ramp,
            tail,
            overall,
            overall_elapsed_secs: start.elapsed().as_secs_f64(),
        }
    }

    /// Run one phase to its time or transaction bound and collect the
    /// counts credited during it.
    async fn run_phase(&self, phase: Phase, config: &PhaseConfig) -> PhaseSummary {
        let start = Instant::now();
        self.control.set_slowdown(config.slowdown);
        self.control.arm_target(config.max_transactions);
        info!(
            phase = phase.name(),
            slowdown = config.slowdown,
            duration_secs = config.duration.as_secs_f64(),
            max_transactions = config.max_transactions,
            "phase started"
        );

        let end = tokio::select! {
            _ = time_limit(config) => PhaseEnd::TimeElapsed,
            _ = self.control.target_reached() => PhaseEnd::TargetReached,
        };

        let counts = self.stats.snapshot_and_reset();
        let transactions = self.control.transactions();
        let elapsed = start.elapsed();
        info!(
            phase = phase.name(),
            elapsed_secs = elapsed.as_secs_f64(),
            visits = counts.total(),
            transactions,
            "phase complete"
        );
        PhaseSummary {
            name: phase.name(),
            elapsed_secs: elapsed.as_secs_f64(),
            end,
            transactions,
            counts,
        }
    }

    /// Join the worker pool, abandoning stragglers after the configured
    /// grace period.
    async fn shutdown(&self, mut workers: JoinSet<()>) {
        let deadline = Instant::now() + self.config.shutdown_timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match tokio::time::timeout(remaining, workers.join_next()).await {
                Ok(None) => return,
                Ok(Some(Ok(()))) => {}
                Ok(Some(Err(error))) => warn!(%error, "worker task failed"),
                Err(_) => {
                    warn!(
                        stragglers = workers.len(),
                        "shutdown grace period expired, abandoning remaining workers"
                    );
                    workers.detach_all();
                    return;
                }
            }
        }
    }
}

/// A zero duration means the phase is bounded only by its transaction
/// target.
async fn time_limit(config: &PhaseConfig) {
    if config.duration.is_zero() {
        std::future::pending::<()>().await;
    } else {
        tokio::time::sleep(config.duration).await;
    }
}
