//! The counts container: a single file holding one dataset per region.
//!
//! # Format
//!
//! ```text
//! b"MOBAMCV" | version: u8 | ContainerHeader | Dataset | Dataset | ...
//! ```
//!
//! The header and every [`Dataset`] are encoded with [`bincode`]. Datasets are
//! appended as each region is finished, so a run that fails partway through
//! leaves a readable container of the regions before the failure.
//!
//! A [`Dataset`] is named after its region and carries the attributes `ID`,
//! `chrom`, `chromStart`, `chromEnd`, and `segments`, along with a [`Table`]
//! with one named `u32` column per sample.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::data::CountMatrix;
use crate::error::MobamplotError;
use crate::io::parsers::utils::get_base_stem;
use crate::ranges::operations::positions_of_segments;
use crate::ranges::{Roi, Segment};
use crate::Position;

pub const MAGIC: &[u8; 7] = b"MOBAMCV";
pub const FORMAT_VERSION: u8 = 1;
pub const COUNTS_EXTENSION: &str = "cvd";

pub const ATTR_ID: &str = "ID";
pub const ATTR_CHROM: &str = "chrom";
pub const ATTR_CHROM_START: &str = "chromStart";
pub const ATTR_CHROM_END: &str = "chromEnd";
pub const ATTR_SEGMENTS: &str = "segments";

/// The container path for a BED file: `<outfolder>/<bed file stem>.cvd`.
pub fn counts_path(outfolder: impl AsRef<Path>, bedfile: impl AsRef<Path>) -> PathBuf {
    outfolder
        .as_ref()
        .join(format!("{}.{}", get_base_stem(bedfile), COUNTS_EXTENSION))
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerHeader {
    /// The program and version that wrote the container.
    pub generator: String,
    /// The BED file the regions were read from, if known.
    pub source: Option<String>,
}

impl ContainerHeader {
    pub fn new(source: Option<String>) -> Self {
        Self {
            generator: format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            source,
        }
    }
}

/// A dataset attribute value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    Str(String),
    Int(i64),
    Intervals(Vec<Segment>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    U32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub dtype: ColumnType,
}

/// A table of named `u32` columns, stored row-major.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<ColumnSpec>,
    pub nrows: usize,
    pub values: Vec<u32>,
}

impl Table {
    pub fn from_matrix(matrix: &CountMatrix) -> Self {
        let columns: Vec<ColumnSpec> = matrix
            .sample_ids()
            .map(|id| ColumnSpec {
                name: id.to_string(),
                dtype: ColumnType::U32,
            })
            .collect();
        let vectors: Vec<&[u32]> = matrix.iter().map(|(_, v)| v).collect();
        let mut values = Vec::with_capacity(matrix.nrows() * columns.len());
        for row in 0..matrix.nrows() {
            values.extend(vectors.iter().map(|v| v[row]));
        }
        Self {
            columns,
            nrows: matrix.nrows(),
            values,
        }
    }

    /// The values of column `index`, in row order.
    pub fn column_values(&self, index: usize) -> Vec<u32> {
        let ncols = self.columns.len();
        (0..self.nrows)
            .map(|row| self.values[row * ncols + index])
            .collect()
    }
}

/// One region's counts and metadata, as persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub name: String,
    pub attrs: IndexMap<String, AttrValue>,
    pub table: Table,
}

impl Dataset {
    pub fn new(roi: &Roi, matrix: &CountMatrix) -> Self {
        let mut attrs = IndexMap::new();
        attrs.insert(ATTR_ID.to_string(), AttrValue::Str(roi.name.clone()));
        attrs.insert(ATTR_CHROM.to_string(), AttrValue::Str(roi.seqname.clone()));
        attrs.insert(ATTR_CHROM_START.to_string(), AttrValue::Int(roi.start as i64));
        attrs.insert(ATTR_CHROM_END.to_string(), AttrValue::Int(roi.end as i64));
        attrs.insert(
            ATTR_SEGMENTS.to_string(),
            AttrValue::Intervals(roi.segments.clone()),
        );
        Self {
            name: roi.name.clone(),
            attrs,
            table: Table::from_matrix(matrix),
        }
    }

    fn attr(&self, attr: &str) -> Result<&AttrValue, MobamplotError> {
        self.attrs
            .get(attr)
            .ok_or_else(|| MobamplotError::MissingAttribute {
                dataset: self.name.clone(),
                attr: attr.to_string(),
            })
    }

    fn invalid(&self, attr: &str, message: impl Into<String>) -> MobamplotError {
        MobamplotError::InvalidAttribute {
            dataset: self.name.clone(),
            attr: attr.to_string(),
            message: message.into(),
        }
    }

    pub fn str_attr(&self, attr: &str) -> Result<&str, MobamplotError> {
        match self.attr(attr)? {
            AttrValue::Str(value) => Ok(value),
            _ => Err(self.invalid(attr, "expected a string")),
        }
    }

    pub fn position_attr(&self, attr: &str) -> Result<Position, MobamplotError> {
        match self.attr(attr)? {
            AttrValue::Int(value) => {
                Position::try_from(*value).map_err(|e| self.invalid(attr, e.to_string()))
            }
            _ => Err(self.invalid(attr, "expected an integer")),
        }
    }

    /// Decode this dataset, checking that its table matches its segments.
    pub fn into_stored(self) -> Result<StoredRoi, MobamplotError> {
        let id = self.str_attr(ATTR_ID)?;
        if id != self.name {
            return Err(self.invalid(
                ATTR_ID,
                format!("'{}' does not match the dataset name", id),
            ));
        }
        let seqname = self.str_attr(ATTR_CHROM)?.to_string();
        let start = self.position_attr(ATTR_CHROM_START)?;
        let end = self.position_attr(ATTR_CHROM_END)?;
        let segments = match self.attrs.get(ATTR_SEGMENTS) {
            Some(AttrValue::Intervals(segments)) => segments.clone(),
            Some(_) => return Err(self.invalid(ATTR_SEGMENTS, "expected a list of intervals")),
            None => vec![Segment::new(start, end)],
        };
        crate::ranges::validate_span(&self.name, start, end)?;
        crate::ranges::validate_segments(&self.name, start, end, &segments)?;

        let expected = positions_of_segments(&segments).len();
        let ncols = self.table.columns.len();
        if self.table.values.len() != self.table.nrows * ncols {
            return Err(self.invalid(
                "table",
                format!(
                    "{} values for {} rows and {} columns",
                    self.table.values.len(),
                    self.table.nrows,
                    ncols
                ),
            ));
        }

        let mut columns = IndexMap::with_capacity(ncols);
        for (index, spec) in self.table.columns.iter().enumerate() {
            if self.table.nrows != expected {
                return Err(MobamplotError::RaggedCountMatrix {
                    roi: self.name.clone(),
                    sample: spec.name.clone(),
                    expected,
                    found: self.table.nrows,
                });
            }
            if columns
                .insert(spec.name.clone(), self.table.column_values(index))
                .is_some()
            {
                return Err(MobamplotError::DuplicateSampleId(spec.name.clone()));
            }
        }

        Ok(StoredRoi {
            name: self.name,
            seqname,
            start,
            end,
            segments,
            matrix: CountMatrix::from_columns(columns, expected),
        })
    }
}

/// A region and its count matrix, read back from a container.
#[derive(Clone, Debug, PartialEq)]
pub struct StoredRoi {
    pub name: String,
    pub seqname: String,
    pub start: Position,
    pub end: Position,
    pub segments: Vec<Segment>,
    pub matrix: CountMatrix,
}

/// Appends datasets to a new container.
pub struct CountStoreWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    written: HashSet<String>,
}

impl CountStoreWriter {
    /// Create (or truncate) the container at `path` and write its header.
    pub fn create(
        path: impl Into<PathBuf>,
        header: &ContainerHeader,
    ) -> Result<Self, MobamplotError> {
        let path = path.into();
        let mut writer = BufWriter::new(File::create(&path)?);
        writer.write_all(MAGIC)?;
        writer.write_all(&[FORMAT_VERSION])?;
        bincode::serialize_into(&mut writer, header)?;
        writer.flush()?;
        Ok(Self {
            path,
            writer,
            written: HashSet::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append the dataset of `roi`. Each region name can be written once.
    pub fn write(&mut self, roi: &Roi, matrix: &CountMatrix) -> Result<(), MobamplotError> {
        if !self.written.insert(roi.name.clone()) {
            return Err(MobamplotError::DuplicateDataset(roi.name.clone()));
        }
        let dataset = Dataset::new(roi, matrix);
        bincode::serialize_into(&mut self.writer, &dataset)?;
        self.writer.flush()?;
        Ok(())
    }

    /// The number of datasets written so far.
    pub fn len(&self) -> usize {
        self.written.len()
    }

    pub fn is_empty(&self) -> bool {
        self.written.is_empty()
    }

    /// Flush and close the container, returning its path.
    pub fn finish(mut self) -> Result<PathBuf, MobamplotError> {
        self.writer.flush()?;
        Ok(self.path)
    }
}

/// Reads the datasets of a container in the order they were written.
pub struct CountStoreReader {
    path: PathBuf,
    reader: BufReader<File>,
    header: ContainerHeader,
}

impl std::fmt::Debug for CountStoreReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CountStoreReader")
            .field("path", &self.path)
            .field("header", &self.header)
            .finish_non_exhaustive()
    }
}

impl CountStoreReader {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, MobamplotError> {
        let path = path.into();
        let mut reader = BufReader::new(File::open(&path)?);

        let mut magic = [0u8; 7];
        let mut version = [0u8; 1];
        if reader.read_exact(&mut magic).is_err() || &magic != MAGIC {
            return Err(MobamplotError::ContainerFormat(
                path,
                "not a mobamplot counts container".to_string(),
            ));
        }
        reader.read_exact(&mut version)?;
        if version[0] != FORMAT_VERSION {
            return Err(MobamplotError::ContainerFormat(
                path,
                format!(
                    "unsupported format version {} (expected {})",
                    version[0], FORMAT_VERSION
                ),
            ));
        }
        let header: ContainerHeader = bincode::deserialize_from(&mut reader)?;
        log::debug!("opened counts container {} ({})", path.display(), header.generator);
        Ok(Self {
            path,
            reader,
            header,
        })
    }

    pub fn header(&self) -> &ContainerHeader {
        &self.header
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_dataset(&mut self) -> Option<Result<Dataset, MobamplotError>> {
        let at_end = match self.reader.fill_buf() {
            Ok(buffer) => buffer.is_empty(),
            Err(e) => return Some(Err(e.into())),
        };
        if at_end {
            return None;
        }
        Some(
            bincode::deserialize_from(&mut self.reader).map_err(|e| {
                MobamplotError::ContainerFormat(self.path.clone(), e.to_string())
            }),
        )
    }

    /// Read every remaining dataset.
    pub fn read_all(self) -> Result<Vec<StoredRoi>, MobamplotError> {
        self.collect()
    }
}

impl Iterator for CountStoreReader {
    type Item = Result<StoredRoi, MobamplotError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_dataset()
            .map(|result| result.and_then(Dataset::into_stored))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(roi: &Roi, columns: &[(&str, Vec<u32>)]) -> CountMatrix {
        let ids: Vec<String> = columns.iter().map(|(id, _)| id.to_string()).collect();
        let vectors = columns.iter().map(|(_, v)| v.clone()).collect();
        CountMatrix::from_vectors(roi, &ids, vectors).unwrap()
    }

    #[test]
    fn test_counts_path() {
        assert_eq!(
            counts_path("out", "data/H3K27ac_peaks.bed"),
            PathBuf::from("out/H3K27ac_peaks.cvd")
        );
        assert_eq!(
            counts_path("out", "rois.bed.gz"),
            PathBuf::from("out/rois.cvd")
        );
    }

    #[test]
    fn test_table_is_row_major() {
        let roi = Roi::new("geneA", "chr1", 0, 3).unwrap();
        let m = matrix(&roi, &[("a", vec![1, 2, 3]), ("b", vec![10, 20, 30])]);
        let table = Table::from_matrix(&m);
        assert_eq!(table.values, vec![1, 10, 2, 20, 3, 30]);
        assert_eq!(table.column_values(1), vec![10, 20, 30]);
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rois.cvd");

        let gene_a = Roi::new("geneA", "chr1", 1000, 1005).unwrap();
        let gene_b = Roi::with_segments(
            "geneB",
            "chr2",
            50,
            60,
            None,
            vec![Segment::new(50, 52), Segment::new(58, 60)],
        )
        .unwrap();
        let m_a = matrix(&gene_a, &[("young", vec![0, 1, 2, 3, 4]), ("old", vec![5; 5])]);
        let m_b = matrix(&gene_b, &[("young", vec![7, 0, 0, 7]), ("old", vec![0; 4])]);

        let mut writer =
            CountStoreWriter::create(&path, &ContainerHeader::new(Some("rois.bed".into())))
                .unwrap();
        writer.write(&gene_a, &m_a).unwrap();
        writer.write(&gene_b, &m_b).unwrap();
        assert_eq!(writer.len(), 2);
        assert_eq!(writer.finish().unwrap(), path);

        let reader = CountStoreReader::open(&path).unwrap();
        assert_eq!(reader.header().source.as_deref(), Some("rois.bed"));
        let stored = reader.read_all().unwrap();
        assert_eq!(stored.len(), 2);

        assert_eq!(stored[0].name, "geneA");
        assert_eq!(stored[0].seqname, "chr1");
        assert_eq!((stored[0].start, stored[0].end), (1000, 1005));
        assert_eq!(stored[0].matrix, m_a);
        assert_eq!(stored[0].matrix.column("old"), Some(&[5, 5, 5, 5, 5][..]));

        assert_eq!(stored[1].segments, gene_b.segments);
        assert_eq!(stored[1].matrix.column("young"), Some(&[7, 0, 0, 7][..]));
    }

    #[test]
    fn test_duplicate_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let roi = Roi::new("geneA", "chr1", 0, 2).unwrap();
        let m = matrix(&roi, &[("s", vec![1, 1])]);
        let mut writer =
            CountStoreWriter::create(dir.path().join("x.cvd"), &ContainerHeader::default())
                .unwrap();
        writer.write(&roi, &m).unwrap();
        assert!(matches!(
            writer.write(&roi, &m),
            Err(MobamplotError::DuplicateDataset(_))
        ));
    }

    #[test]
    fn test_rejects_foreign_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counts.h5");
        std::fs::write(&path, b"\x89HDF\r\n\x1a\n").unwrap();
        assert!(matches!(
            CountStoreReader::open(&path),
            Err(MobamplotError::ContainerFormat(_, _))
        ));
    }

    #[test]
    fn test_missing_attribute() {
        let roi = Roi::new("geneA", "chr1", 0, 2).unwrap();
        let mut dataset = Dataset::new(&roi, &matrix(&roi, &[("s", vec![1, 1])]));
        dataset.attrs.shift_remove(ATTR_CHROM);
        assert!(matches!(
            dataset.into_stored(),
            Err(MobamplotError::MissingAttribute { .. })
        ));
    }

    #[test]
    fn test_id_must_match_name() {
        let roi = Roi::new("geneA", "chr1", 0, 2).unwrap();
        let m = matrix(&roi, &[("s", vec![1, 1])]);

        let mut missing = Dataset::new(&roi, &m);
        missing.attrs.shift_remove(ATTR_ID);
        match missing.into_stored() {
            Err(MobamplotError::MissingAttribute { attr, .. }) => assert_eq!(attr, ATTR_ID),
            other => panic!("expected MissingAttribute, got {:?}", other),
        }

        let mut renamed = Dataset::new(&roi, &m);
        renamed
            .attrs
            .insert(ATTR_ID.to_string(), AttrValue::Str("geneB".to_string()));
        match renamed.into_stored() {
            Err(MobamplotError::InvalidAttribute { dataset, attr, .. }) => {
                assert_eq!(dataset, "geneA");
                assert_eq!(attr, ATTR_ID);
            }
            other => panic!("expected InvalidAttribute, got {:?}", other),
        }
    }
}
