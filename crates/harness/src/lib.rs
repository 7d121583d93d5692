//! auctionbench harness
//!
//! Drives synthetic concurrent user sessions against an auction web
//! application and measures per-page throughput. Each session is a tokio
//! task walking the transition table from `auctionbench-model`; a phase
//! controller sequences an up-ramp, a steady-state measurement window,
//! and a down-ramp, snapshotting the shared statistics at each boundary.
//!
//! # Architecture
//!
//! - **Stats**: lock-free per-state visit counters, snapshotted and
//!   merged at phase boundaries.
//! - **RunControl**: the only cross-session shared state: slowdown
//!   factor, transaction counter with a completion target, stop token.
//! - **SessionWorker**: one task per simulated user; think, request,
//!   credit, repeat until End of Session or stop.
//! - **Harness**: spawns the workers, walks the phases, renders the
//!   report.
//!
//! # Example
//!
//! ```ignore
//! use auctionbench_harness::{Harness, HarnessConfig, NoopIssuer, PhaseConfig};
//! use auctionbench_model::{ThinkTime, TransitionTable};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let table = Arc::new(TransitionTable::load("tables/browse_only.txt", ThinkTime::Fixed)?);
//! let config = HarnessConfig::new(100)
//!     .with_steady(PhaseConfig::new(Duration::from_secs(300)));
//! let harness = Harness::new(config, table, Arc::new(NoopIssuer))?;
//! let report = harness.run().await;
//! report.print();
//! ```

pub mod config;
pub mod control;
pub mod error;
pub mod issuer;
pub mod phase;
pub mod report;
pub mod stats;
pub mod worker;

pub use config::{HarnessConfig, PhaseConfig};
pub use control::RunControl;
pub use error::HarnessError;
pub use issuer::{Backend, HttpIssuer, IssueError, NoopIssuer, RequestIssuer};
pub use phase::{Harness, Phase};
pub use report::{BenchReport, PhaseEnd, PhaseSummary};
pub use stats::{StateCounts, Stats};
pub use worker::SessionWorker;
