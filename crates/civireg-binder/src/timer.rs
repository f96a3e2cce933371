// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;
use tokio::time::Instant;

/// Opaque handle for one armed quiet period. A token fires only if no
/// re-arm or cancel happened after it was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerToken(u64);

/// Cancellable debounce timer owned by a binder session. Arming supersedes
/// any outstanding token, so a fetch scheduled behind an old token can
/// never fire after newer input arrived; cancellation on supersession is a
/// first-class operation here, not a side effect of dropping the session.
#[derive(Debug)]
pub struct DebounceTimer {
    quiet: Duration,
    next_token: u64,
    armed: Option<(u64, Instant)>,
}

impl DebounceTimer {
    #[must_use]
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            next_token: 0,
            armed: None,
        }
    }

    #[must_use]
    pub const fn quiet_period(&self) -> Duration {
        self.quiet
    }

    /// Starts (or restarts) the quiet period and invalidates any
    /// previously issued token.
    pub fn arm(&mut self) -> TimerToken {
        self.next_token += 1;
        self.armed = Some((self.next_token, Instant::now() + self.quiet));
        TimerToken(self.next_token)
    }

    pub fn cancel(&mut self) {
        self.armed = None;
    }

    #[must_use]
    pub fn is_current(&self, token: TimerToken) -> bool {
        matches!(self.armed, Some((current, _)) if current == token.0)
    }

    /// Deadline for a still-current token; `None` when the token was
    /// superseded or cancelled.
    #[must_use]
    pub fn deadline(&self, token: TimerToken) -> Option<Instant> {
        match self.armed {
            Some((current, deadline)) if current == token.0 => Some(deadline),
            _ => None,
        }
    }
}
