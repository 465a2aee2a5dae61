//! Time-bounded sample window.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;

/// A value recorded at an instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample<T> {
    pub at: Instant,
    pub value: T,
}

/// Keeps the samples pushed within the last `window`.
///
/// The newest sample older than `window` is retained as long as no younger
/// one exists, so a window shorter than the sampling period still compares
/// two consecutive samples.
#[derive(Debug, Clone)]
pub struct WindowCollector<T> {
    window: Duration,
    samples: VecDeque<Sample<T>>,
}

impl<T: Copy> WindowCollector<T> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            samples: VecDeque::new(),
        }
    }

    /// Evict expired samples, then append `value` taken at `at`.
    pub fn push(&mut self, at: Instant, value: T) {
        while self.samples.len() > 1
            && self
                .samples
                .front()
                .is_some_and(|oldest| at.saturating_duration_since(oldest.at) >= self.window)
        {
            self.samples.pop_front();
        }
        self.samples.push_back(Sample { at, value });
    }

    pub fn first(&self) -> Option<Sample<T>> {
        self.samples.front().copied()
    }

    pub fn last(&self) -> Option<Sample<T>> {
        self.samples.back().copied()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
