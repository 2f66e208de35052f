//! The [`MobamplotError`] `enum` definition and error messages.
//!
use crate::Position;
use std::num::ParseIntError;
use std::path::PathBuf;
use thiserror::Error;

/// The [`MobamplotError`] defines the standard set of errors that should
/// be passed to the user.
#[derive(Debug, Error)]
pub enum MobamplotError {
    // IO related errors
    #[error("File reading error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Could not open alignment file '{path}': {source}")]
    AlignmentSourceError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Error reading records for region '{roi}' from sample '{sample}': {source}")]
    AlignmentRecordError {
        roi: String,
        sample: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Counts container '{0}' is invalid: {1}")]
    ContainerFormat(PathBuf, String),
    #[error("Counts container serialization error: {0}")]
    Bincode(#[from] bincode::Error),
    #[error("Figure serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Figure drawing error: {0}")]
    PlottingError(String),
    #[error("TSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    // BED parsing related errors
    #[error("Integer parsing error: {0}")]
    ParseIntError(#[from] ParseIntError),
    #[error("BED file has too few columns ({0}); chrom, chromStart, chromEnd, and name are required.\nLine {1}: {2}")]
    BedTooFewColumns(usize, u64, String),
    #[error("BED parsing error on line {line}: {message}")]
    BedParseError { line: u64, message: String },
    #[error("Invalid BED strand '{0}': must be either '+', '-', or '.'")]
    InvalidStrand(String),
    #[error("Region name '{0}' occurs more than once in the BED file")]
    DuplicateRoiName(String),

    // Configuration errors
    #[error("Number of BAM IDs must match number of BAMs.\nnumber of BAM IDs: {ids}  number of BAMs: {bams}")]
    SampleCountMismatch { ids: usize, bams: usize },
    #[error("Sample ID '{0}' is used for more than one BAM file")]
    DuplicateSampleId(String),
    #[error("No BAM files found in '{0}'")]
    NoAlignmentFiles(PathBuf),
    #[error("Missing required argument: {0}")]
    MissingArgument(String),
    #[error("Invalid bin size {0}: must be greater than zero")]
    InvalidBinWidth(Position),

    // Data shape errors
    #[error("Region '{roi}' is degenerate: end ({end}) must be greater than start ({start})")]
    DegenerateRoi {
        roi: String,
        start: Position,
        end: Position,
    },
    #[error("Region '{roi}' has an invalid block structure: {message}")]
    InvalidSegments { roi: String, message: String },
    #[error("Count vector for sample '{sample}' in region '{roi}' has length {found}, expected {expected}")]
    RaggedCountMatrix {
        roi: String,
        sample: String,
        expected: usize,
        found: usize,
    },
    #[error("Region '{roi}' ({seqname}:{start}-{end}) is outside the reference sequences of sample '{sample}'")]
    RoiOutOfBounds {
        roi: String,
        sample: String,
        seqname: String,
        start: Position,
        end: Position,
    },
    #[error("Dataset '{dataset}' is missing the '{attr}' attribute")]
    MissingAttribute { dataset: String, attr: String },
    #[error("Dataset '{dataset}' has an invalid '{attr}' attribute: {message}")]
    InvalidAttribute {
        dataset: String,
        attr: String,
        message: String,
    },
    #[error("Dataset '{0}' has already been written to this container")]
    DuplicateDataset(String),

    // Command line tool related errors
    #[error("Command line argument error: {0}")]
    ArgumentError(#[from] clap::error::Error),
}
