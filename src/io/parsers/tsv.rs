//! Essential TSV parsing functionality, which wraps the [`csv`] crate's reader.

use csv::{Reader, ReaderBuilder};
use std::io::Read;
use std::path::PathBuf;

use crate::error::MobamplotError;
use crate::io::InputStream;

/// Build a TSV reader which ignores comment lines, works on gzip-compressed
/// files, and allows a ragged number of columns per row (e.g. BED4 rows mixed
/// with BED6 rows).
///
/// # Developers Notes
///
/// Quoting is disabled, since BED fields never quote and a stray `"` in a
/// feature name should be kept as-is.
pub fn build_tsv_reader(
    filepath: impl Into<PathBuf>,
) -> Result<Reader<Box<dyn Read>>, MobamplotError> {
    let input = InputStream::new(filepath);
    let stream: Box<dyn Read> = Box::new(input.reader()?);

    let reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .comment(Some(b'#'))
        .from_reader(stream);
    Ok(reader)
}
