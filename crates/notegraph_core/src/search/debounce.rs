//! Debounce for search-as-you-type.
//!
//! Only the latest query survives (last write wins); it is released once the
//! input has been quiet for the configured delay. The clock is injected so the
//! behaviour is testable without sleeping.

use std::time::{Duration, Instant};

pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(180);

#[derive(Debug, Clone)]
pub struct SearchDebouncer {
    delay: Duration,
    pending: Option<(String, Instant)>,
    last_released: Option<String>,
}

impl Default for SearchDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_DEBOUNCE)
    }
}

impl SearchDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
            last_released: None,
        }
    }

    /// Records a keystroke, replacing any pending query.
    pub fn push(&mut self, query: impl Into<String>, now: Instant) {
        self.pending = Some((query.into(), now));
    }

    /// Releases the pending query once it has been quiet for `delay`.
    ///
    /// A query identical to the last released one is swallowed.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        let (_, pushed_at) = self.pending.as_ref()?;
        if now.saturating_duration_since(*pushed_at) < self.delay {
            return None;
        }
        let (query, _) = self.pending.take()?;
        if self.last_released.as_deref() == Some(query.as_str()) {
            return None;
        }
        self.last_released = Some(query.clone());
        Some(query)
    }

    /// Time left before the pending query is released, if any.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.pending
            .as_ref()
            .map(|(_, pushed_at)| self.delay.saturating_sub(now.saturating_duration_since(*pushed_at)))
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
