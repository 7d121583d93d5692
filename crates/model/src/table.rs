//! The transition-probability table and the stochastic next-state step.

use crate::session::SessionState;
use crate::think::ThinkTime;
use rand::Rng;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Initial state for every session (the Home page).
pub const HOME_STATE: usize = 0;

/// Errors raised while loading a transition table.
///
/// Row and column indices are zero-based positions within the
/// probability matrix, not file line numbers.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("missing {what} in table header")]
    Header { what: &'static str },

    #[error("table has no page columns")]
    NoColumns,

    #[error("table ended after {rows} state rows, expected {expected}")]
    MissingRows { rows: usize, expected: usize },

    #[error("missing {what} at row {row}, column {column}")]
    MissingField {
        what: &'static str,
        row: usize,
        column: usize,
    },

    #[error("malformed {what} {value:?} at row {row}, column {column}")]
    Malformed {
        what: &'static str,
        value: String,
        row: usize,
        column: usize,
    },
}

/// Outcome of one stochastic step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The row's probabilities summed to less than the draw; the session
    /// stays on its current page and earns no stat credit.
    Stay,

    /// Normal move to a page, or to the End of Session terminal.
    Goto(usize),

    /// A Back draw resolved through the history to a previously
    /// visited page.
    Back(usize),

    /// A Back draw with nothing in the history. The table is
    /// inconsistent; the session stays put.
    BackUnderflow,
}

impl Outcome {
    /// The page to credit for this step, if any.
    pub fn credited_state(&self) -> Option<usize> {
        match *self {
            Outcome::Goto(state) | Outcome::Back(state) => Some(state),
            Outcome::Stay | Outcome::BackUnderflow => None,
        }
    }
}

/// One resolved step: the outcome plus the unscaled think time the
/// caller should sleep before acting on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub outcome: Outcome,
    pub think: Duration,
}

/// Immutable page-transition model, shared by reference across every
/// session worker.
///
/// `probabilities[from][to]` is the chance of moving from page `from`
/// to destination `to`. Destinations outnumber origin pages by two: the
/// `Back` pseudo-target at `state_count() - 2` resolves through the
/// session history, and the `End of Session` terminal sits at
/// `state_count() - 1`. Rows are not required to sum to 1; the missing
/// mass becomes an explicit [`Outcome::Stay`].
#[derive(Debug, Clone)]
pub struct TransitionTable {
    name: String,
    /// One entry per destination state, including the Back and End rows.
    names: Vec<String>,
    /// Indexed `[from][to]`; `from` ranges over origin pages only.
    probabilities: Vec<Vec<f32>>,
    /// Per-destination wait in milliseconds.
    wait_ms: Vec<u32>,
    think_time: ThinkTime,
}

impl TransitionTable {
    /// Load a table from a tab-separated text export.
    ///
    /// The format is: a title line (`<tag>\t<table name>`), a blank
    /// line, a `To >>>` marker line, a column-header line naming the
    /// origin pages, then one line per destination state
    /// (`<name>\t<p from each origin>...\t<wait ms>`) ending with the
    /// `End of Session` row. Anything after that row is ignored.
    pub fn load(path: impl AsRef<Path>, think_time: ThinkTime) -> Result<Self, TableError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| TableError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&contents, think_time)
    }

    /// Parse a table from its text contents. See [`TransitionTable::load`].
    pub fn parse(contents: &str, think_time: ThinkTime) -> Result<Self, TableError> {
        let mut lines = contents.lines();

        let title = lines.next().ok_or(TableError::Header { what: "title line" })?;
        let name = title
            .split('\t')
            .nth(1)
            .ok_or(TableError::Header { what: "table name" })?
            .trim()
            .to_string();

        lines.next().ok_or(TableError::Header { what: "blank line" })?;
        lines.next().ok_or(TableError::Header { what: "'To >>>' marker" })?;
        let headers = lines.next().ok_or(TableError::Header { what: "column headers" })?;

        // First header cell is the "From" corner label.
        let origin_count = headers.split('\t').count().saturating_sub(1);
        if origin_count == 0 {
            return Err(TableError::NoColumns);
        }

        // Two destination rows beyond the origin pages: Back, then End
        // of Session.
        let state_count = origin_count + 2;
        let mut names = Vec::with_capacity(state_count);
        let mut wait_ms = Vec::with_capacity(state_count);
        // File rows are destinations; collect `[to][from]` and
        // transpose below.
        let mut by_destination: Vec<Vec<f32>> = Vec::with_capacity(state_count);

        for row in 0..state_count {
            let line = lines.next().ok_or(TableError::MissingRows {
                rows: row,
                expected: state_count,
            })?;
            let mut fields = line.split('\t');
            let state_name = match fields.next() {
                Some(s) if !s.trim().is_empty() => s.trim().to_string(),
                _ => {
                    return Err(TableError::MissingRows {
                        rows: row,
                        expected: state_count,
                    })
                }
            };

            let mut probs = Vec::with_capacity(origin_count);
            for column in 0..origin_count {
                let raw = fields.next().ok_or(TableError::MissingField {
                    what: "probability",
                    row,
                    column,
                })?;
                let p: f32 = raw.trim().parse().map_err(|_| TableError::Malformed {
                    what: "probability",
                    value: raw.to_string(),
                    row,
                    column,
                })?;
                probs.push(p);
            }

            let raw_wait = fields.next().ok_or(TableError::MissingField {
                what: "wait time",
                row,
                column: origin_count,
            })?;
            let wait: u32 = raw_wait.trim().parse().map_err(|_| TableError::Malformed {
                what: "wait time",
                value: raw_wait.to_string(),
                row,
                column: origin_count,
            })?;

            names.push(state_name);
            wait_ms.push(wait);
            by_destination.push(probs);
        }

        let mut probabilities = vec![vec![0.0f32; state_count]; origin_count];
        for (to, row) in by_destination.iter().enumerate() {
            for (from, &p) in row.iter().enumerate() {
                probabilities[from][to] = p;
            }
        }

        Ok(Self {
            name,
            names,
            probabilities,
            wait_ms,
            think_time,
        })
    }

    /// The table name declared on the title line.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Total number of destination states, including Back and End.
    pub fn state_count(&self) -> usize {
        self.names.len()
    }

    /// Number of real pages (states a session can be on).
    pub fn origin_count(&self) -> usize {
        self.names.len() - 2
    }

    /// Index of the Back pseudo-target.
    pub fn back_index(&self) -> usize {
        self.names.len() - 2
    }

    /// Index of the End of Session terminal.
    pub fn end_index(&self) -> usize {
        self.names.len() - 1
    }

    /// True iff `state` is the End of Session terminal.
    pub fn is_terminal(&self, state: usize) -> bool {
        state == self.end_index()
    }

    /// Name of a destination state.
    pub fn state_name(&self, state: usize) -> &str {
        &self.names[state]
    }

    /// All destination-state names, in index order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Configured wait for a destination state, in milliseconds.
    pub fn wait_ms(&self, state: usize) -> u32 {
        self.wait_ms[state]
    }

    /// Probability of moving from `from` to `to`.
    pub fn probability(&self, from: usize, to: usize) -> f32 {
        self.probabilities[from][to]
    }

    /// Draw one step for `session` and compute its think time.
    ///
    /// The caller sleeps `step.think` (scaled by the run's slowdown
    /// factor), issues the request, and credits its stats; none of that
    /// happens here.
    pub fn next<R: Rng + ?Sized>(&self, session: &mut SessionState, rng: &mut R) -> Step {
        let outcome = self.step_with_draw(session, rng.gen::<f32>());
        // Stay and underflow keep the current page's wait so a
        // malformed row cannot hot-spin a worker.
        let dest = outcome.credited_state().unwrap_or(session.current());
        let think = self.think_time.sample(self.wait_ms[dest], rng);
        Step { outcome, think }
    }

    /// The deterministic part of [`TransitionTable::next`]: resolve one
    /// step given the uniform draw in `[0, 1)`.
    ///
    /// Walks the current page's probabilities left to right; the first
    /// destination whose cumulative sum exceeds `draw` wins. A Back win
    /// pops the history; a normal move pushes the prior page onto the
    /// history only if the new page can itself transition to Back,
    /// and otherwise clears it (no Back can ever return past an
    /// unconditional dead end).
    pub fn step_with_draw(&self, session: &mut SessionState, draw: f32) -> Outcome {
        let from = session.current();
        debug_assert!(from < self.origin_count(), "session on a non-page state");

        let mut cumulative = 0.0f32;
        let mut target = None;
        for (to, &p) in self.probabilities[from].iter().enumerate() {
            cumulative += p;
            if draw < cumulative {
                target = Some(to);
                break;
            }
        }
        let Some(target) = target else {
            return Outcome::Stay;
        };

        if target == self.back_index() {
            return match session.pop_history() {
                Some(previous) => {
                    session.set_current(previous);
                    Outcome::Back(previous)
                }
                None => {
                    warn!(
                        page = %self.names[from],
                        "back requested with empty history"
                    );
                    Outcome::BackUnderflow
                }
            };
        }

        if target != self.end_index() {
            if self.probabilities[target][self.back_index()] == 0.0 {
                session.clear_history();
            } else {
                session.push_history(from);
            }
        }
        session.set_current(target);
        Outcome::Goto(target)
    }
}
