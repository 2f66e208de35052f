//! BED region of interest parsing.
//!
//! The BED (Browser Extensible Format) is a TSV format in bioinformatics.
//! It has a fairly strict [specification](https://samtools.github.io/hts-specs/BEDv1.pdf),
//! but in practice it is quite permissive.
//!
//! Regions of interest need a name, so at least the first four BED columns (BED4)
//! must be present. The strand (column 6) and the block columns of BED12
//! (columns 10-12) are used if present; other columns are ignored. Each row must
//! be well-formed: a single malformed row fails the whole parse, rather than
//! being skipped.

use csv::{StringRecord, StringRecordsIntoIter};
use std::io::Read;
use std::path::PathBuf;

use crate::error::MobamplotError;
use crate::ranges::{Roi, RoiSet, Segment, Strand};
use crate::Position;

use super::tsv::build_tsv_reader;

const STRAND_COLUMN: usize = 5;
const BLOCK_COUNT_COLUMN: usize = 9;
const BLOCK_SIZES_COLUMN: usize = 10;
const BLOCK_STARTS_COLUMN: usize = 11;

/// An iterator over the regions of interest in a BED4+ file.
pub struct RoiIterator {
    records: StringRecordsIntoIter<Box<dyn Read>>,
}

impl std::fmt::Debug for RoiIterator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoiIterator").finish_non_exhaustive()
    }
}

impl RoiIterator {
    /// Creates a parsing iterator over a (possibly gzip-compressed) BED file.
    pub fn new(filepath: impl Into<PathBuf>) -> Result<Self, MobamplotError> {
        let reader = build_tsv_reader(filepath)?;
        Ok(Self {
            records: reader.into_records(),
        })
    }
}

impl Iterator for RoiIterator {
    type Item = Result<Roi, MobamplotError>;

    fn next(&mut self) -> Option<Self::Item> {
        for result in self.records.by_ref() {
            let record = match result {
                Ok(record) => record,
                Err(e) => return Some(Err(e.into())),
            };
            if is_header_record(&record) {
                continue;
            }
            return Some(parse_roi(&record));
        }
        None
    }
}

/// UCSC `track` and `browser` lines, and blank lines.
fn is_header_record(record: &StringRecord) -> bool {
    match record.get(0) {
        None => true,
        Some(first) => {
            let first = first.trim();
            (record.len() == 1 && first.is_empty())
                || first.starts_with("track")
                || first.starts_with("browser")
        }
    }
}

fn line_number(record: &StringRecord) -> u64 {
    record.position().map_or(0, |p| p.line())
}

fn parse_error(record: &StringRecord, message: impl Into<String>) -> MobamplotError {
    MobamplotError::BedParseError {
        line: line_number(record),
        message: message.into(),
    }
}

fn parse_position(record: &StringRecord, index: usize, column: &str) -> Result<Position, MobamplotError> {
    let field = record.get(index).unwrap_or("").trim();
    field.parse::<Position>().map_err(|e| {
        parse_error(
            record,
            format!("could not parse {} '{}': {}", column, field, e),
        )
    })
}

/// Parse a comma-separated BED12 list such as `"10,20,30,"` (trailing comma allowed).
fn parse_list(record: &StringRecord, index: usize, column: &str) -> Result<Vec<Position>, MobamplotError> {
    let field = record.get(index).unwrap_or("").trim();
    field
        .split(',')
        .filter(|x| !x.is_empty())
        .map(|x| {
            x.trim().parse::<Position>().map_err(|e| {
                parse_error(record, format!("could not parse {} entry '{}': {}", column, x, e))
            })
        })
        .collect()
}

/// Parses one BED4+ record into a [`Roi`].
pub fn parse_roi(record: &StringRecord) -> Result<Roi, MobamplotError> {
    if record.len() < 4 {
        return Err(MobamplotError::BedTooFewColumns(
            record.len(),
            line_number(record),
            record.iter().collect::<Vec<_>>().join("\t"),
        ));
    }

    let seqname = record[0].trim().to_string();
    let start = parse_position(record, 1, "chromStart")?;
    let end = parse_position(record, 2, "chromEnd")?;
    let name = record[3].trim().to_string();
    if name.is_empty() {
        return Err(parse_error(record, "region name is empty"));
    }

    let strand = match record.get(STRAND_COLUMN) {
        Some(symbol) => Strand::parse_bed(symbol.trim())?,
        None => None,
    };

    let segments = if record.len() > BLOCK_STARTS_COLUMN {
        parse_blocks(record, &name, start)?
    } else if record.len() > BLOCK_COUNT_COLUMN {
        return Err(parse_error(
            record,
            format!(
                "region '{}' has {} columns; BED12 block columns must all be present",
                name,
                record.len()
            ),
        ));
    } else {
        vec![Segment::new(start, end)]
    };

    Roi::with_segments(name, seqname, start, end, strand, segments)
}

/// Convert the BED12 `blockCount`, `blockSizes`, and `blockStarts` columns into
/// absolute segments.
fn parse_blocks(
    record: &StringRecord,
    name: &str,
    start: Position,
) -> Result<Vec<Segment>, MobamplotError> {
    let block_count = parse_position(record, BLOCK_COUNT_COLUMN, "blockCount")? as usize;
    let sizes = parse_list(record, BLOCK_SIZES_COLUMN, "blockSizes")?;
    let starts = parse_list(record, BLOCK_STARTS_COLUMN, "blockStarts")?;

    if sizes.len() != block_count || starts.len() != block_count {
        return Err(MobamplotError::InvalidSegments {
            roi: name.to_string(),
            message: format!(
                "blockCount is {} but there are {} block sizes and {} block starts",
                block_count,
                sizes.len(),
                starts.len()
            ),
        });
    }

    starts
        .iter()
        .zip(sizes.iter())
        .map(|(&offset, &size)| {
            let block_start = start.checked_add(offset);
            let block_end = block_start.and_then(|s| s.checked_add(size));
            match (block_start, block_end) {
                (Some(block_start), Some(block_end)) => Ok(Segment::new(block_start, block_end)),
                _ => Err(MobamplotError::InvalidSegments {
                    roi: name.to_string(),
                    message: format!(
                        "block at offset {} with size {} exceeds the coordinate range",
                        offset, size
                    ),
                }),
            }
        })
        .collect()
}

/// Read all regions of interest from a BED file, in file order.
///
/// This fails on the first malformed record, or if a region name occurs
/// more than once.
pub fn read_rois(filepath: impl Into<PathBuf>) -> Result<RoiSet, MobamplotError> {
    let mut rois = RoiSet::new();
    for roi in RoiIterator::new(filepath)? {
        rois.push(roi?)?;
    }
    Ok(rois)
}
