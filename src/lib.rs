//! # mobamplot
//!
//! Extract per-nucleotide read count vectors from indexed BAM files over a
//! set of regions of interest (ROIs), store them in a single container file
//! keyed by ROI name, and render per-ROI figures of read density across
//! samples.
//!
//! The pipeline runs in these steps:
//!
//!  1. [`io::parsers::bed::read_rois()`] parses a BED4/6/12 file into a [`ranges::RoiSet`].
//!  2. A [`coverage::CoverageSource`] (e.g. [`coverage::BamCoverage`]) produces a count
//!     vector for every (ROI, sample) pair.
//!  3. [`data::CountMatrix`] binds the vectors of one ROI to their sample IDs.
//!  4. [`store::CountStoreWriter`] appends one dataset per ROI to the container.
//!  5. [`data::binning`] re-bins stored data, and [`render`] draws it.
//!
//! The two command-level entry points are [`commands::extract_counts()`] and
//! [`commands::plot_counts()`].

pub mod commands;
pub mod coverage;
pub mod data;
pub mod error;
pub mod io;
pub mod ranges;
pub mod render;
pub mod reporting;
pub mod samples;
pub mod store;
pub mod test_utilities;
pub mod traits;

pub use error::MobamplotError;

/// Genomic coordinates are 0-based, and stored as `u32`.
pub type Position = u32;

/// Signed offsets from positions, e.g. for padding figure axes.
pub type PositionOffset = i64;

pub mod prelude {
    pub use crate::commands::{extract_counts, plot_counts, ExtractOptions, PlotOptions};
    pub use crate::coverage::{BamCoverage, CoverageOptions, CoverageSource, MappingRule, Strandedness};
    pub use crate::data::binning::{Bin, Bins, PlotData};
    pub use crate::data::CountMatrix;
    pub use crate::error::MobamplotError;
    pub use crate::io::parsers::bed::{read_rois, RoiIterator};
    pub use crate::ranges::{Roi, RoiSet, Segment, Strand};
    pub use crate::render::OutputFormat;
    pub use crate::reporting::{LogProgress, NoProgress, Progress};
    pub use crate::samples::{resolve_samples, AlignmentSelection, Sample};
    pub use crate::store::{counts_path, CountStoreReader, CountStoreWriter, StoredRoi};
    pub use crate::traits::GenericRange;
}
