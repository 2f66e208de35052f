//! Traits used by the mobamplot library.
//!

use crate::Position;

/// The [`GenericRange`] trait defines common functionality for all range types,
/// e.g. [`Segment`] and [`Roi`].
///
/// [`Segment`]: crate::ranges::Segment
/// [`Roi`]: crate::ranges::Roi
pub trait GenericRange: Clone {
    fn start(&self) -> Position;
    fn end(&self) -> Position;
    fn width(&self) -> Position {
        self.end().saturating_sub(self.start())
    }

    /// Return the 0-indexed, right-exclusive range covered by both this range and
    /// `other`; `None` if they share no basepairs.
    fn overlap_range<R: GenericRange>(&self, other: &R) -> Option<(Position, Position)> {
        let overlap_start = std::cmp::max(self.start(), other.start());
        let overlap_end = std::cmp::min(self.end(), other.end());

        if overlap_start < overlap_end {
            Some((overlap_start, overlap_end))
        } else {
            None
        }
    }

    /// Whether `position` lies in `[start, end)`.
    fn contains(&self, position: Position) -> bool {
        self.start() <= position && position < self.end()
    }
}
