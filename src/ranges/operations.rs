//! Range Operations.
//!
//! - [`spliced_positions()`]: the genomic position behind each count vector index.
//! - [`SplicedLayout`]: map genomic coordinates onto count vector indices.

use crate::{traits::GenericRange, Position};

use super::{Roi, Segment};

/// Return the genomic position of every count vector index of `roi`, in ascending order.
pub fn spliced_positions(roi: &Roi) -> Vec<Position> {
    positions_of_segments(&roi.segments)
}

/// Return the genomic positions covered by `segments`, in order.
pub fn positions_of_segments(segments: &[Segment]) -> Vec<Position> {
    segments
        .iter()
        .flat_map(|segment| segment.start..segment.end)
        .collect()
}

/// The segments of a region along with the count vector offset at which each
/// segment begins.
#[derive(Clone, Debug)]
pub struct SplicedLayout {
    segments: Vec<Segment>,
    offsets: Vec<usize>,
    length: usize,
}

impl SplicedLayout {
    pub fn new(roi: &Roi) -> Self {
        let mut offsets = Vec::with_capacity(roi.segments.len());
        let mut length = 0;
        for segment in &roi.segments {
            offsets.push(length);
            length += segment.width() as usize;
        }
        Self {
            segments: roi.segments.clone(),
            offsets,
            length,
        }
    }

    /// The count vector length.
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// The count vector index of genomic `position`, or `None` if it falls outside
    /// every segment (e.g. in an intron).
    pub fn index_of(&self, position: Position) -> Option<usize> {
        // segments are sorted, so find the last one starting at or before position
        let i = self
            .segments
            .partition_point(|segment| segment.start <= position);
        if i == 0 {
            return None;
        }
        let segment = &self.segments[i - 1];
        if segment.contains(position) {
            Some(self.offsets[i - 1] + (position - segment.start) as usize)
        } else {
            None
        }
    }

    /// The count vector index ranges `[from, to)` that the genomic block
    /// `[start, end)` overlaps.
    pub fn overlapping_indices(&self, start: Position, end: Position) -> Vec<(usize, usize)> {
        let block = Segment::new(start, end);
        self.segments
            .iter()
            .zip(self.offsets.iter())
            .filter_map(|(segment, offset)| {
                segment.overlap_range(&block).map(|(s, e)| {
                    let from = offset + (s - segment.start) as usize;
                    (from, from + (e - s) as usize)
                })
            })
            .collect()
    }
}
