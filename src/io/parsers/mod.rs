//! Parsing iterators for region of interest files.
//!
//! Regions are read off disk with a *parsing iterator*, [`RoiIterator`], which
//! works on both plaintext and gzip-compressed files. Each row of a BED file is
//! yielded as a validated [`Roi`], or an error naming the offending line.
//!
//! Under the hood, this uses the [`csv`] crate's flexible record reader, since
//! BED4, BED6, and BED12 rows have different numbers of columns.
//!
//! [`Roi`]: crate::ranges::Roi

pub mod bed;
pub mod tsv;
pub mod utils;

pub use bed::{read_rois, RoiIterator};
