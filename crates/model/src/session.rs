//! Per-session navigation state.

use crate::table::HOME_STATE;

/// Mutable state owned by exactly one session worker: the page the
/// simulated user is currently on, and the back-button history behind it.
///
/// Never shared across workers, so no synchronization is needed here.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    current: usize,
    history: Vec<usize>,
}

impl SessionState {
    /// Create a fresh session sitting on the Home page.
    pub fn new() -> Self {
        Self {
            current: HOME_STATE,
            history: Vec::new(),
        }
    }

    /// Reset to the Home page, dropping any history. The caller is
    /// responsible for crediting the Home visit in its stats.
    pub fn reset(&mut self) {
        self.current = HOME_STATE;
        self.history.clear();
    }

    /// The page the session is currently on.
    pub fn current(&self) -> usize {
        self.current
    }

    /// How many pages a browser "Back" could still return through.
    pub fn history_depth(&self) -> usize {
        self.history.len()
    }

    pub(crate) fn set_current(&mut self, state: usize) {
        self.current = state;
    }

    pub(crate) fn push_history(&mut self, state: usize) {
        self.history.push(state);
    }

    pub(crate) fn pop_history(&mut self) -> Option<usize> {
        self.history.pop()
    }

    pub(crate) fn clear_history(&mut self) {
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_returns_home_and_clears_history() {
        let mut session = SessionState::new();
        session.set_current(3);
        session.push_history(0);
        session.push_history(2);
        assert_eq!(session.history_depth(), 2);

        session.reset();
        assert_eq!(session.current(), HOME_STATE);
        assert_eq!(session.history_depth(), 0);
    }

    #[test]
    fn history_is_a_stack() {
        let mut session = SessionState::new();
        session.push_history(1);
        session.push_history(4);
        assert_eq!(session.pop_history(), Some(4));
        assert_eq!(session.pop_history(), Some(1));
        assert_eq!(session.pop_history(), None);
    }
}
