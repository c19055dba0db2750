//! Bounded Fibonacci backoff schedule for rate-limited fetches

use std::time::Duration;

/// A bounded Fibonacci delay schedule
///
/// Parameterized by how many initial terms to skip and how many to keep,
/// rather than slicing an infinite sequence. With `skip = 6, len = 3` the
/// schedule is 13, 21, 34 — long enough that a rate-limited host has
/// actually cooled down before the next attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FibonacciBackoff {
    skip: usize,
    len: usize,
}

impl FibonacciBackoff {
    /// Create a schedule skipping the first `skip` Fibonacci terms and
    /// yielding the next `len`
    pub const fn new(skip: usize, len: usize) -> Self {
        Self { skip, len }
    }

    /// The raw schedule terms, in order
    pub fn terms(&self) -> Vec<u64> {
        let mut terms = Vec::with_capacity(self.len);
        let (mut a, mut b) = (1u64, 1u64);
        for i in 0..self.skip + self.len {
            if i >= self.skip {
                terms.push(a);
            }
            let next = a + b;
            a = b;
            b = next;
        }
        terms
    }

    /// The schedule scaled by a time unit (seconds in production; tests pass
    /// `Duration::ZERO` or milliseconds to avoid waiting)
    pub fn delays(&self, unit: Duration) -> Vec<Duration> {
        self.terms().into_iter().map(|t| unit * t as u32).collect()
    }
}
