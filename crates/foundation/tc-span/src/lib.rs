//! Source spans attached to syntax nodes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// A byte offset span in the source text the parser read
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct Span {
    /// Inclusive start offset
    pub start: u32,
    /// Exclusive end offset
    pub end: u32,
}

impl Span {
    /// Span used for synthesized nodes that have no source text
    pub const DUMMY: Self = Self { start: 0, end: 0 };

    /// Create a span from two offsets
    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end, "span start {start} is past its end {end}");
        Self { start, end }
    }

    /// Byte range covered by this span
    pub fn range(&self) -> Range<usize> {
        self.start as usize..self.end as usize
    }

    /// Smallest span covering both `self` and `other`
    #[must_use]
    pub fn to(self, other: Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}..{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_join() {
        let joined = Span::new(4, 9).to(Span::new(1, 6));
        assert_eq!(joined, Span::new(1, 9));
        assert_eq!(joined.range(), 1..9);
    }

    #[test]
    fn test_dummy_is_empty() {
        assert!(Span::DUMMY.range().is_empty());
        assert_eq!(Span::DUMMY.to_string(), "0..0");
    }
}
