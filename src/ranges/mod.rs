//! Region of interest types: [`Segment`], [`Roi`], and the ordered [`RoiSet`].
//!
//! An [`Roi`] spans `[start, end)` on one sequence and is made up of one or more
//! [`Segment`]s (e.g. the exons of a BED12 feature). Count vectors are laid out over
//! the concatenated segments, so their length is [`Roi::spliced_length()`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{error::MobamplotError, traits::GenericRange, Position};

pub mod operations;

/// A 0-indexed, right-exclusive sub-range of an [`Roi`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub start: Position,
    pub end: Position,
}

impl Segment {
    /// Create a new 0-indexed right-exclusive segment.
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

impl GenericRange for Segment {
    fn start(&self) -> Position {
        self.start
    }
    fn end(&self) -> Position {
        self.end
    }
}

/// Nucleotide strand enum type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strand {
    Forward,
    Reverse,
}

impl Strand {
    /// Parse a BED strand column; `.` is a missing strand.
    pub fn parse_bed(symbol: &str) -> Result<Option<Strand>, MobamplotError> {
        match symbol {
            "+" => Ok(Some(Strand::Forward)),
            "-" => Ok(Some(Strand::Reverse)),
            "." => Ok(None),
            _ => Err(MobamplotError::InvalidStrand(symbol.to_string())),
        }
    }
}

/// A named region of interest.
#[derive(Clone, Debug, PartialEq)]
pub struct Roi {
    pub name: String,
    pub seqname: String,
    pub start: Position,
    pub end: Position,
    pub strand: Option<Strand>,
    pub segments: Vec<Segment>,
}

impl Roi {
    /// Create a new unspliced region, with a single segment spanning `[start, end)`.
    pub fn new(
        name: impl Into<String>,
        seqname: impl Into<String>,
        start: Position,
        end: Position,
    ) -> Result<Self, MobamplotError> {
        Self::with_segments(name, seqname, start, end, None, vec![Segment::new(start, end)])
    }

    /// Create a new region from its segments, validating them.
    pub fn with_segments(
        name: impl Into<String>,
        seqname: impl Into<String>,
        start: Position,
        end: Position,
        strand: Option<Strand>,
        segments: Vec<Segment>,
    ) -> Result<Self, MobamplotError> {
        let name = name.into();
        validate_span(&name, start, end)?;
        validate_segments(&name, start, end, &segments)?;
        Ok(Self {
            name,
            seqname: seqname.into(),
            start,
            end,
            strand,
            segments,
        })
    }

    /// The number of basepairs covered by the segments; this is the
    /// length of every count vector for this region.
    pub fn spliced_length(&self) -> usize {
        self.segments.iter().map(|s| s.width() as usize).sum()
    }

    /// Whether this region consists of more than one segment.
    pub fn is_spliced(&self) -> bool {
        self.segments.len() > 1
    }
}

impl GenericRange for Roi {
    fn start(&self) -> Position {
        self.start
    }
    fn end(&self) -> Position {
        self.end
    }
}

/// Check that a region spans at least one basepair.
pub fn validate_span(roi: &str, start: Position, end: Position) -> Result<(), MobamplotError> {
    if end <= start {
        return Err(MobamplotError::DegenerateRoi {
            roi: roi.to_string(),
            start,
            end,
        });
    }
    Ok(())
}

/// Validates that segments are non-empty, sorted, non-overlapping, and lie
/// within `[start, end)`.
pub fn validate_segments(
    roi: &str,
    start: Position,
    end: Position,
    segments: &[Segment],
) -> Result<(), MobamplotError> {
    let invalid = |message: String| MobamplotError::InvalidSegments {
        roi: roi.to_string(),
        message,
    };

    if segments.is_empty() {
        return Err(invalid("no segments".to_string()));
    }

    let mut last_end = start;
    for segment in segments {
        if segment.start >= segment.end {
            return Err(invalid(format!(
                "segment [{}, {}) is empty",
                segment.start, segment.end
            )));
        }
        if segment.start < last_end {
            return Err(invalid(format!(
                "segment [{}, {}) overlaps or precedes the previous segment",
                segment.start, segment.end
            )));
        }
        if segment.end > end {
            return Err(invalid(format!(
                "segment [{}, {}) extends past the region end {}",
                segment.start, segment.end, end
            )));
        }
        last_end = segment.end;
    }
    Ok(())
}

/// An ordered set of regions, keyed by (unique) region name, in file order.
#[derive(Clone, Debug, Default)]
pub struct RoiSet {
    rois: IndexMap<String, Roi>,
}

impl RoiSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a region, raising [`MobamplotError::DuplicateRoiName`] if one with
    /// the same name was already added.
    pub fn push(&mut self, roi: Roi) -> Result<(), MobamplotError> {
        if self.rois.contains_key(&roi.name) {
            return Err(MobamplotError::DuplicateRoiName(roi.name));
        }
        self.rois.insert(roi.name.clone(), roi);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Roi> {
        self.rois.get(name)
    }

    pub fn len(&self) -> usize {
        self.rois.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rois.is_empty()
    }

    /// Iterate over regions in file order.
    pub fn iter(&self) -> impl Iterator<Item = &Roi> {
        self.rois.values()
    }
}

impl<'a> IntoIterator for &'a RoiSet {
    type Item = &'a Roi;
    type IntoIter = indexmap::map::Values<'a, String, Roi>;

    fn into_iter(self) -> Self::IntoIter {
        self.rois.values()
    }
}
