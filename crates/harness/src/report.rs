//! End-of-run report: per-phase and overall per-page throughput.

use crate::stats::StateCounts;
use serde::Serialize;
use std::time::Duration;

/// Why a phase ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseEnd {
    /// The configured duration elapsed.
    TimeElapsed,
    /// The transaction target was crossed first.
    TargetReached,
}

/// Counts collected over one phase.
#[derive(Debug, Clone, Serialize)]
pub struct PhaseSummary {
    pub name: &'static str,
    /// Wall-clock seconds the phase actually ran.
    pub elapsed_secs: f64,
    pub end: PhaseEnd,
    pub transactions: u64,
    pub counts: StateCounts,
}

impl PhaseSummary {
    pub fn elapsed(&self) -> Duration {
        Duration::from_secs_f64(self.elapsed_secs)
    }
}

/// The full run: three phase summaries plus the tail counts collected
/// while workers shut down, and the overall merge of all four.
#[derive(Debug, Clone, Serialize)]
pub struct BenchReport {
    pub state_names: Vec<String>,
    pub sessions: usize,
    pub up_ramp: PhaseSummary,
    pub steady: PhaseSummary,
    pub down_ramp: PhaseSummary,
    /// Visits credited between the end of the down-ramp and the last
    /// worker exiting.
    pub tail: StateCounts,
    pub overall: StateCounts,
    pub overall_elapsed_secs: f64,
}

impl BenchReport {
    /// Render the report as a plain-text table on stdout.
    pub fn print(&self) {
        println!();
        println!("=== auctionbench report ({} sessions) ===", self.sessions);
        for phase in [&self.up_ramp, &self.steady, &self.down_ramp] {
            println!(
                "{:<9} {:>8.1}s  {:>10} visits  {:>8.1}/s  ({})",
                phase.name,
                phase.elapsed_secs,
                phase.counts.total(),
                phase.counts.total_rate(phase.elapsed()),
                match phase.end {
                    PhaseEnd::TimeElapsed => "time elapsed",
                    PhaseEnd::TargetReached => "target reached",
                },
            );
        }
        println!();

        let steady_elapsed = self.steady.elapsed();
        let overall_elapsed = Duration::from_secs_f64(self.overall_elapsed_secs);
        println!(
            "{:<28} {:>10} {:>10} {:>10} {:>10}",
            "page", "steady", "steady/s", "overall", "overall/s"
        );
        for (state, name) in self.state_names.iter().enumerate() {
            println!(
                "{:<28} {:>10} {:>10.2} {:>10} {:>10.2}",
                name,
                self.steady.counts.get(state),
                self.steady.counts.rate(state, steady_elapsed),
                self.overall.get(state),
                self.overall.rate(state, overall_elapsed),
            );
        }
        println!(
            "{:<28} {:>10} {:>10.2} {:>10} {:>10.2}",
            "total",
            self.steady.counts.total(),
            self.steady.counts.total_rate(steady_elapsed),
            self.overall.total(),
            self.overall.total_rate(overall_elapsed),
        );
    }

    /// Serialize the report for machine consumption.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(name: &'static str, totals: &[u64]) -> PhaseSummary {
        let stats = crate::stats::Stats::new(totals.len());
        for (state, &n) in totals.iter().enumerate() {
            for _ in 0..n {
                stats.increment(state);
            }
        }
        let counts = stats.snapshot();
        PhaseSummary {
            name,
            elapsed_secs: 10.0,
            end: PhaseEnd::TimeElapsed,
            transactions: totals.iter().sum(),
            counts,
        }
    }

    #[test]
    fn report_serializes_to_json() {
        let steady = summary("steady", &[3, 7]);
        let report = BenchReport {
            state_names: vec!["Home".into(), "Browse".into()],
            sessions: 4,
            up_ramp: summary("up-ramp", &[1, 0]),
            steady: steady.clone(),
            down_ramp: summary("down-ramp", &[0, 1]),
            tail: StateCounts::zeroed(2),
            overall: steady.counts.clone(),
            overall_elapsed_secs: 30.0,
        };

        let json = report.to_json().unwrap();
        assert!(json.contains("\"steady\""));
        assert!(json.contains("\"time_elapsed\""));
        report.print();
    }
}
