//! Fixed-width binning of count vectors.
//!
//! Two bin layouts are supported over a region's span `[start, end)`. Both
//! place left edges at `start, start + w, start + 2w, ...` while they are
//! less than `end`:
//!
//!  - [`Bins::line()`]: every bin is `[left, next_left)`, except the final one
//!    which is closed, `[left, end - 1]`.
//!  - [`Bins::histogram()`]: every bin is `[left, min(left + w, end))`.
//!
//! Each bin is drawn at the mean of its two edges, with the mean count of
//! the positions inside it. A bin with no positions (e.g. an intron of a
//! spliced region) has a mean of zero.

use crate::data::operations::mean;
use crate::error::MobamplotError;
use crate::ranges::operations::positions_of_segments;
use crate::store::StoredRoi;
use crate::Position;

/// One bin. Interior bins are right-exclusive; the final bin of a line
/// layout is right-inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bin {
    pub left: Position,
    pub right: Position,
    pub closed: bool,
}

impl Bin {
    pub fn contains(&self, position: Position) -> bool {
        position >= self.left
            && (position < self.right || (self.closed && position == self.right))
    }

    /// The x coordinate of this bin: the mean of its two edges.
    pub fn center(&self) -> f64 {
        (self.left as f64 + self.right as f64) / 2.0
    }
}

/// A left-to-right partition of a region's span into bins.
#[derive(Clone, Debug, PartialEq)]
pub struct Bins {
    start: Position,
    end: Position,
    width: Position,
    bins: Vec<Bin>,
}

impl Bins {
    fn left_edges(
        roi: &str,
        start: Position,
        end: Position,
        width: Position,
    ) -> Result<Vec<Position>, MobamplotError> {
        if width == 0 {
            return Err(MobamplotError::InvalidBinWidth(width));
        }
        if end <= start {
            return Err(MobamplotError::DegenerateRoi {
                roi: roi.to_string(),
                start,
                end,
            });
        }
        Ok((start as u64..end as u64)
            .step_by(width as usize)
            .map(|left| left as Position)
            .collect())
    }

    /// The bins used for line plots of region `roi`.
    pub fn line(
        roi: &str,
        start: Position,
        end: Position,
        width: Position,
    ) -> Result<Self, MobamplotError> {
        let lefts = Self::left_edges(roi, start, end, width)?;
        let last = lefts.len() - 1;
        let bins = lefts
            .iter()
            .enumerate()
            .map(|(i, &left)| {
                if i == last {
                    Bin {
                        left,
                        right: end - 1,
                        closed: true,
                    }
                } else {
                    Bin {
                        left,
                        right: lefts[i + 1],
                        closed: false,
                    }
                }
            })
            .collect();
        Ok(Self {
            start,
            end,
            width,
            bins,
        })
    }

    /// The bins used for histograms of region `roi`.
    pub fn histogram(
        roi: &str,
        start: Position,
        end: Position,
        width: Position,
    ) -> Result<Self, MobamplotError> {
        let bins = Self::left_edges(roi, start, end, width)?
            .into_iter()
            .map(|left| Bin {
                left,
                right: (left as u64 + width as u64).min(end as u64) as Position,
                closed: false,
            })
            .collect();
        Ok(Self {
            start,
            end,
            width,
            bins,
        })
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn width(&self) -> Position {
        self.width
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bin> {
        self.bins.iter()
    }

    pub fn centers(&self) -> Vec<f64> {
        self.bins.iter().map(Bin::center).collect()
    }

    /// The bin holding `position`, or `None` if it lies outside `[start, end)`.
    pub fn index_of(&self, position: Position) -> Option<usize> {
        if position < self.start || position >= self.end {
            return None;
        }
        Some(((position - self.start) / self.width) as usize)
    }

    /// The mean count of each bin. `positions[i]` is the genomic position
    /// of `counts[i]`; positions outside the span are ignored.
    pub fn mean_counts(&self, positions: &[Position], counts: &[u32]) -> Vec<f64> {
        let mut grouped: Vec<Vec<u32>> = vec![Vec::new(); self.bins.len()];
        for (&position, &count) in positions.iter().zip(counts) {
            if let Some(i) = self.index_of(position) {
                grouped[i].push(count);
            }
        }
        grouped
            .iter()
            .map(|values| mean(values).unwrap_or(0.0))
            .collect()
    }
}

/// One sample's y values.
#[derive(Clone, Debug, PartialEq)]
pub struct Series {
    pub sample_id: String,
    pub y: Vec<f64>,
}

/// The x and y values drawn for one region.
#[derive(Clone, Debug, PartialEq)]
pub struct PlotData {
    pub x: Vec<f64>,
    /// The `(left, right)` edges of the bin (or position) behind each x value.
    pub edges: Vec<(Position, Position)>,
    pub series: Vec<Series>,
    /// The bin width, if the values are binned.
    pub bin_width: Option<Position>,
}

impl PlotData {
    /// The raw per-position counts, for histograms that are binned by the viewer.
    pub fn histogram(stored: &StoredRoi) -> Self {
        let positions = positions_of_segments(&stored.segments);
        let x = positions.iter().map(|&p| p as f64).collect();
        let edges = positions.iter().map(|&p| (p, p + 1)).collect();
        let series = stored
            .matrix
            .iter()
            .map(|(id, counts)| Series {
                sample_id: id.to_string(),
                y: counts.iter().map(|&c| c as f64).collect(),
            })
            .collect();
        Self {
            x,
            edges,
            series,
            bin_width: None,
        }
    }

    /// Bin centers and per-sample means, for line plots.
    pub fn line(stored: &StoredRoi, width: Position) -> Result<Self, MobamplotError> {
        let bins = Bins::line(&stored.name, stored.start, stored.end, width)?;
        Ok(Self::binned(stored, &bins))
    }

    /// Histogram bins computed here rather than by the viewer, for static figures.
    pub fn histogram_binned(stored: &StoredRoi, width: Position) -> Result<Self, MobamplotError> {
        let bins = Bins::histogram(&stored.name, stored.start, stored.end, width)?;
        Ok(Self::binned(stored, &bins))
    }

    fn binned(stored: &StoredRoi, bins: &Bins) -> Self {
        let positions = positions_of_segments(&stored.segments);
        let series = stored
            .matrix
            .iter()
            .map(|(id, counts)| Series {
                sample_id: id.to_string(),
                y: bins.mean_counts(&positions, counts),
            })
            .collect();
        Self {
            x: bins.centers(),
            edges: bins.iter().map(|b| (b.left, b.right)).collect(),
            series,
            bin_width: Some(bins.width()),
        }
    }

    /// The largest y value over every series, `0.0` if there are none.
    pub fn max_y(&self) -> f64 {
        self.series
            .iter()
            .flat_map(|s| s.y.iter().copied())
            .filter(|y| y.is_finite())
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::CountMatrix;
    use crate::ranges::{Roi, Segment};

    fn stored(roi: &Roi, columns: Vec<(&str, Vec<u32>)>) -> StoredRoi {
        let ids: Vec<String> = columns.iter().map(|(id, _)| id.to_string()).collect();
        let vectors = columns.into_iter().map(|(_, v)| v).collect();
        StoredRoi {
            name: roi.name.clone(),
            seqname: roi.seqname.clone(),
            start: roi.start,
            end: roi.end,
            segments: roi.segments.clone(),
            matrix: CountMatrix::from_vectors(roi, &ids, vectors).unwrap(),
        }
    }

    #[test]
    fn test_line_bins_partition_span() {
        let bins = Bins::line("r", 1000, 2000, 300).unwrap();
        let edges: Vec<_> = bins.iter().map(|b| (b.left, b.right, b.closed)).collect();
        assert_eq!(
            edges,
            vec![
                (1000, 1300, false),
                (1300, 1600, false),
                (1600, 1900, false),
                (1900, 1999, true)
            ]
        );

        // every position in [start, end) is in exactly one bin
        for position in 1000..2000 {
            let n = bins.iter().filter(|b| b.contains(position)).count();
            assert_eq!(n, 1, "position {}", position);
        }
        assert!(!bins.iter().any(|b| b.contains(2000)));
    }

    #[test]
    fn test_histogram_bins_clip_to_end() {
        let bins = Bins::histogram("r", 0, 250, 100).unwrap();
        let edges: Vec<_> = bins.iter().map(|b| (b.left, b.right)).collect();
        assert_eq!(edges, vec![(0, 100), (100, 200), (200, 250)]);
        assert_eq!(bins.centers(), vec![50.0, 150.0, 225.0]);
    }

    #[test]
    fn test_single_position_span() {
        let bins = Bins::line("r", 41, 42, 200).unwrap();
        assert_eq!(bins.len(), 1);
        let bin = bins.iter().next().unwrap();
        assert!(bin.contains(41));
        assert_eq!(bins.mean_counts(&[41], &[7]), vec![7.0]);
    }

    #[test]
    fn test_width_one_reproduces_vector() {
        let counts: Vec<u32> = vec![3, 0, 1, 9, 4, 4, 0, 2];
        let positions: Vec<Position> = (100..108).collect();
        let bins = Bins::line("r", 100, 108, 1).unwrap();
        let means = bins.mean_counts(&positions, &counts);
        let expected: Vec<f64> = counts.iter().map(|&c| c as f64).collect();
        assert_eq!(means, expected);
    }

    #[test]
    fn test_spike_at_150th_position() {
        let mut counts = vec![0u32; 200];
        counts[149] = 10;
        let positions: Vec<Position> = (0..200).collect();
        let bins = Bins::line("r", 0, 200, 50).unwrap();
        assert_eq!(bins.len(), 4);
        let means = bins.mean_counts(&positions, &counts);
        assert_eq!(means, vec![0.0, 0.0, 0.2, 0.0]);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(
            Bins::line("r", 0, 100, 0),
            Err(MobamplotError::InvalidBinWidth(0))
        ));
        assert!(matches!(
            Bins::histogram("r", 100, 100, 10),
            Err(MobamplotError::DegenerateRoi { start: 100, end: 100, .. })
        ));
    }

    #[test]
    fn test_empty_bins_have_zero_mean() {
        let roi = Roi::with_segments(
            "tx1",
            "chr1",
            0,
            30,
            None,
            vec![Segment::new(0, 10), Segment::new(20, 30)],
        )
        .unwrap();
        let data = stored(&roi, vec![("s1", vec![2; 20])]);
        let plot = PlotData::line(&data, 10).unwrap();
        assert_eq!(plot.series[0].y, vec![2.0, 0.0, 2.0]);
        assert_eq!(plot.bin_width, Some(10));
    }

    #[test]
    fn test_plot_data_keeps_sample_order() {
        let roi = Roi::new("geneA", "chr1", 10, 14).unwrap();
        let data = stored(
            &roi,
            vec![("young", vec![1, 1, 1, 1]), ("old", vec![0, 4, 0, 0])],
        );
        let hist = PlotData::histogram(&data);
        assert_eq!(hist.x, vec![10.0, 11.0, 12.0, 13.0]);
        assert_eq!(hist.series[0].sample_id, "young");
        assert_eq!(hist.series[1].y, vec![0.0, 4.0, 0.0, 0.0]);
        assert_eq!(hist.max_y(), 4.0);
        assert_eq!(hist.bin_width, None);

        let line = PlotData::line(&data, 2).unwrap();
        assert_eq!(line.x, vec![11.0, 12.5]);
        assert_eq!(line.edges, vec![(10, 12), (12, 13)]);
        assert_eq!(line.series[1].y, vec![2.0, 0.0]);
    }
}
