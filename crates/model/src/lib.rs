//! Page-transition model for the auctionbench session emulator.
//!
//! A benchmark run walks simulated users through the pages of an auction
//! web site according to a probability matrix loaded from a tab-separated
//! table export. This crate owns the table itself, the per-session
//! navigation state, and think-time sampling. It performs no I/O beyond
//! loading the table and no waiting: the harness crate decides when to
//! sleep and what to request.
//!
//! Everything here is deterministic given an injected [`rand::Rng`], which
//! keeps the stochastic walk reproducible under a seeded generator.
//!
//! # Example
//!
//! ```ignore
//! use auctionbench_model::{SessionState, ThinkTime, TransitionTable};
//!
//! let table = TransitionTable::load("tables/browse_only.txt", ThinkTime::Fixed)?;
//! let mut session = SessionState::new();
//! let mut rng = rand::thread_rng();
//!
//! while !table.is_terminal(session.current()) {
//!     let step = table.next(&mut session, &mut rng);
//!     // sleep step.think, issue the request, credit the stats ...
//! }
//! ```

pub mod session;
pub mod table;
pub mod think;

pub use session::SessionState;
pub use table::{Outcome, Step, TableError, TransitionTable, HOME_STATE};
pub use think::ThinkTime;
