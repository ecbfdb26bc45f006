//! Inclusive time-key range kept in the output.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::TimeKey;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("session start {start} is after session end {end}")]
    Inverted { start: TimeKey, end: TimeKey },
}

/// Closed interval `[start, end]` of time keys. Immutable for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionWindow {
    start: TimeKey,
    end: TimeKey,
}

impl SessionWindow {
    pub fn new(start: TimeKey, end: TimeKey) -> Result<Self, SessionError> {
        if start > end {
            return Err(SessionError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    /// Window that admits every key.
    pub fn unbounded() -> Self {
        Self {
            start: TimeKey::MIN,
            end: TimeKey::MAX,
        }
    }

    pub fn start(&self) -> TimeKey {
        self.start
    }

    pub fn end(&self) -> TimeKey {
        self.end
    }

    /// Both ends inclusive.
    pub fn contains(&self, key: TimeKey) -> bool {
        key >= self.start && key <= self.end
    }

    /// True when `key` is past the end of the window.
    pub fn is_after(&self, key: TimeKey) -> bool {
        key > self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_are_inclusive() {
        let w = SessionWindow::new(TimeKey(20240305091500), TimeKey(20240305153000)).unwrap();
        assert!(w.contains(TimeKey(20240305091500)));
        assert!(w.contains(TimeKey(20240305153000)));
        assert!(!w.contains(TimeKey(20240305091459)));
        assert!(!w.contains(TimeKey(20240305153001)));
        assert!(w.is_after(TimeKey(20240305153001)));
        assert!(!w.is_after(TimeKey(20240305153000)));
    }

    #[test]
    fn single_instant_window() {
        let w = SessionWindow::new(TimeKey(5), TimeKey(5)).unwrap();
        assert!(w.contains(TimeKey(5)));
        assert!(!w.contains(TimeKey(4)));
    }

    #[test]
    fn inverted_window_rejected() {
        let err = SessionWindow::new(TimeKey(10), TimeKey(9)).unwrap_err();
        assert_eq!(
            err,
            SessionError::Inverted {
                start: TimeKey(10),
                end: TimeKey(9)
            }
        );
    }

    #[test]
    fn unbounded_admits_everything() {
        let w = SessionWindow::unbounded();
        assert!(w.contains(TimeKey(0)));
        assert!(w.contains(TimeKey(99_999_999_999_999)));
    }
}
