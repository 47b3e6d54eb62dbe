//! Review carousel index arithmetic.

use std::time::Duration;

/// How often the carousel advances on its own.
pub const AUTO_ADVANCE: Duration = Duration::from_secs(8);

/// Position within a list of reviews.
///
/// Indices wrap in both directions. An empty carousel stays at 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewCarousel {
    len: usize,
    index: usize,
}

impl ReviewCarousel {
    #[must_use]
    pub const fn new(len: usize) -> Self {
        Self { len, index: 0 }
    }

    /// Start at `index`, wrapped into range.
    #[must_use]
    pub const fn at(len: usize, index: usize) -> Self {
        let index = if len == 0 { 0 } else { index % len };
        Self { len, index }
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.index
    }

    #[must_use]
    pub const fn len(self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.len == 0
    }

    /// `(i + 1) mod n`.
    #[must_use]
    pub const fn next(self) -> Self {
        Self::at(self.len, self.index + 1)
    }

    /// `(i - 1 + n) mod n`.
    #[must_use]
    pub const fn previous(self) -> Self {
        if self.len == 0 {
            return self;
        }
        Self::at(self.len, self.index + self.len - 1)
    }

    /// Apply `steps` timer ticks.
    #[must_use]
    pub const fn advance(self, steps: usize) -> Self {
        if self.len == 0 {
            return self;
        }
        Self::at(self.len, self.index + steps % self.len)
    }
}
