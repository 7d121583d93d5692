//! Session workers: one task per simulated user.

use crate::control::RunControl;
use crate::issuer::RequestIssuer;
use crate::stats::Stats;
use auctionbench_model::{Outcome, SessionState, TransitionTable};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// A single emulated user walking the transition table.
///
/// The worker owns its [`SessionState`] and RNG outright; the table,
/// stats, run control, and issuer are shared by reference. Each loop
/// iteration draws one step, sleeps the scaled think time, issues the
/// request, and credits the stats. Request failures are logged and
/// never abort the worker.
pub struct SessionWorker {
    id: usize,
    table: Arc<TransitionTable>,
    stats: Arc<Stats>,
    control: Arc<RunControl>,
    issuer: Arc<dyn RequestIssuer>,
    restart_sessions: bool,
    rng: ChaCha8Rng,
    session: SessionState,
}

impl SessionWorker {
    /// Create a worker. Worker `id` perturbs the base seed so each
    /// worker draws an independent, reproducible stream.
    pub fn new(
        id: usize,
        table: Arc<TransitionTable>,
        stats: Arc<Stats>,
        control: Arc<RunControl>,
        issuer: Arc<dyn RequestIssuer>,
        restart_sessions: bool,
        seed: u64,
    ) -> Self {
        Self {
            id,
            table,
            stats,
            control,
            issuer,
            restart_sessions,
            rng: ChaCha8Rng::seed_from_u64(seed.wrapping_add(id as u64)),
            session: SessionState::new(),
        }
    }

    /// Run sessions until the stop flag flips, or until the first End
    /// of Session when sessions are not restarted.
    pub async fn run(mut self) {
        self.start_session();

        loop {
            if self.control.is_stopped() {
                break;
            }
            if self.table.is_terminal(self.session.current()) {
                if !self.restart_sessions {
                    break;
                }
                debug!(worker = self.id, "session complete, starting a new one");
                self.start_session();
            }

            let step = self.table.next(&mut self.session, &mut self.rng);
            let think = scale(step.think, self.control.slowdown());
            if think.is_zero() {
                // Keep zero-wait tables cooperative.
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(think).await;
            }

            match step.outcome {
                Outcome::Goto(state) | Outcome::Back(state) => {
                    if !self.table.is_terminal(state) {
                        if let Err(error) = self.issuer.issue(state).await {
                            warn!(
                                worker = self.id,
                                page = %self.table.state_name(state),
                                %error,
                                "request failed"
                            );
                        }
                    }
                    self.stats.increment(state);
                    self.control.record_transaction();
                }
                // Stay earns no credit; the underflow is already warned
                // about by the model.
                Outcome::Stay | Outcome::BackUnderflow => {}
            }
        }

        debug!(worker = self.id, "worker finished");
    }

    fn start_session(&mut self) {
        self.session.reset();
        self.stats.increment(self.session.current());
    }
}

fn scale(think: Duration, factor: f32) -> Duration {
    if !factor.is_finite() || factor <= 0.0 {
        return Duration::ZERO;
    }
    // mul_f32 panics on overflow; saturate instead.
    Duration::try_from_secs_f64(think.as_secs_f64() * f64::from(factor))
        .unwrap_or(Duration::MAX)
}
