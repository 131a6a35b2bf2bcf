#![forbid(unsafe_code)]

//! Inactivity rotator.
//!
//! # State Machine
//!
//! ```text
//!   Idle ──input──▶ Armed{deadline} ──input──▶ Armed{now + timeout}
//!                        │
//!                   deadline passes
//!                        ▼
//!                    Quiescent ──input──▶ Armed{now + timeout}
//! ```
//!
//! The rotator starts `Idle`: nothing arms it at load, so a page nobody
//! touches never rotates. After firing it stays `Quiescent` until the next
//! input; rotation is a single step, not a periodic cycle.

use std::time::Duration;

/// Rotator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotatorState {
    /// Never armed.
    Idle,
    /// Waiting for `deadline`.
    Armed { deadline: Duration },
    /// Fired; waiting for input.
    Quiescent,
}

/// Timer that requests one rotation step after `timeout` without input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InactivityRotator {
    timeout: Duration,
    state: RotatorState,
}

impl InactivityRotator {
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            state: RotatorState::Idle,
        }
    }

    #[must_use]
    pub const fn state(&self) -> RotatorState {
        self.state
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Restart the timer. Called for every raw input event, undebounced.
    pub fn on_input(&mut self, now: Duration) {
        self.state = RotatorState::Armed {
            deadline: now.saturating_add(self.timeout),
        };
    }

    /// Pending deadline, if armed.
    #[must_use]
    pub const fn deadline(&self) -> Option<Duration> {
        match self.state {
            RotatorState::Armed { deadline } => Some(deadline),
            _ => None,
        }
    }

    /// Fire if the deadline has passed, moving to `Quiescent`.
    pub fn take_due(&mut self, now: Duration) -> bool {
        match self.state {
            RotatorState::Armed { deadline } if deadline <= now => {
                self.state = RotatorState::Quiescent;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn starts_idle_and_never_fires() {
        let mut rotator = InactivityRotator::new(ms(5000));
        assert_eq!(rotator.state(), RotatorState::Idle);
        assert_eq!(rotator.deadline(), None);
        assert!(!rotator.take_due(ms(1_000_000)));
    }

    #[test]
    fn input_arms_and_rearms() {
        let mut rotator = InactivityRotator::new(ms(5000));
        rotator.on_input(ms(100));
        assert_eq!(rotator.deadline(), Some(ms(5100)));
        rotator.on_input(ms(4000));
        assert_eq!(rotator.deadline(), Some(ms(9000)));
        assert!(!rotator.take_due(ms(5100)));
    }

    #[test]
    fn fires_once_then_quiescent() {
        let mut rotator = InactivityRotator::new(ms(5000));
        rotator.on_input(ms(0));
        assert!(rotator.take_due(ms(5000)));
        assert_eq!(rotator.state(), RotatorState::Quiescent);
        assert!(!rotator.take_due(ms(10_000)));
        assert!(!rotator.take_due(ms(60_000)));

        rotator.on_input(ms(60_000));
        assert_eq!(
            rotator.state(),
            RotatorState::Armed {
                deadline: ms(65_000)
            }
        );
    }
}
