//! Test cases and test utility functions.
//!

use indexmap::IndexMap;
use noodles::bam::{self, bai};
use noodles::csi::binning_index::{index::reference_sequence::bin::Chunk, Indexer};
use noodles::sam::{
    self,
    alignment::{
        io::Write as _,
        record::{
            cigar::{op::Kind, Op},
            Flags,
        },
        record_buf::Cigar,
        Record as _, RecordBuf,
    },
    header::record::value::{map::ReferenceSequence, Map},
};
use rand::{thread_rng, Rng};
use std::fs::File;
use std::io::{self, Write};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::coverage::{count_fragments, AlignedFragment, CoverageOptions, CoverageSource};
use crate::error::MobamplotError;
use crate::ranges::{Roi, Strand};
use crate::reporting::Progress;
use crate::Position;

// Stochastic test defaults
//
// The tradeoff is catching stochastic errors vs test time.
pub const NRANDOM_ROIS: usize = 200;

// region length
pub const MIN_LEN: Position = 1;
pub const MAX_LEN: Position = 5000;

// number of chromosome sequences
pub const NCHROM: usize = 22;

// chromosome length used for random regions
pub const CHROM_LEN: Position = 1_000_000;

// largest random per-position count
pub const MAX_COUNT: u32 = 50;

/// Build a random range start/end on a sequence of `chrom_len`.
/// 0-indexed, right exclusive
pub fn random_range(chrom_len: Position) -> (Position, Position) {
    let mut rng = thread_rng();
    let len = rng.gen_range(MIN_LEN..MAX_LEN);
    let start = rng.gen_range(0..chrom_len - len + 1);
    (start, start + len)
}

/// Sample a random chromosome
pub fn random_chrom() -> String {
    let mut rng = thread_rng();
    format!("chr{}", rng.gen_range(1..NCHROM + 1))
}

/// Build a random unspliced [`Roi`].
pub fn random_roi(name: &str) -> Result<Roi, MobamplotError> {
    let (start, end) = random_range(CHROM_LEN);
    Roi::new(name, random_chrom(), start, end)
}

/// Build a random count vector of length `len`.
pub fn random_count_vector(len: usize) -> Vec<u32> {
    let mut rng = thread_rng();
    (0..len).map(|_| rng.gen_range(0..=MAX_COUNT)).collect()
}

/// Write `contents` to a temporary `.bed` file.
pub fn temp_bedfile(contents: &str) -> io::Result<NamedTempFile> {
    let mut file = tempfile::Builder::new().suffix(".bed").tempfile()?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    Ok(file)
}

/// A read to be written to a test BAM file.
#[derive(Clone, Debug)]
pub struct BamRead {
    /// Index of the reference sequence in the header.
    pub reference: usize,
    /// 0-based alignment start.
    pub start: Position,
    pub cigar: Vec<(Kind, usize)>,
    pub flags: Flags,
}

impl BamRead {
    /// A mapped forward-strand read.
    pub fn new(reference: usize, start: Position, cigar: &[(Kind, usize)]) -> Self {
        Self {
            reference,
            start,
            cigar: cigar.to_vec(),
            flags: Flags::empty(),
        }
    }

    pub fn with_flags(mut self, flags: Flags) -> Self {
        self.flags = flags;
        self
    }

    fn to_record(&self) -> io::Result<RecordBuf> {
        let start = noodles::core::Position::new(self.start as usize + 1)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "invalid read start"))?;
        let cigar: Cigar = self
            .cigar
            .iter()
            .map(|&(kind, len)| Op::new(kind, len))
            .collect();
        Ok(RecordBuf::builder()
            .set_flags(self.flags)
            .set_reference_sequence_id(self.reference)
            .set_alignment_start(start)
            .set_cigar(cigar)
            .build())
    }
}

/// The index path noodles looks for next to `bam`: `<bam>.bai`.
pub fn bai_path(bam: impl AsRef<Path>) -> PathBuf {
    let mut path = bam.as_ref().as_os_str().to_owned();
    path.push(".bai");
    PathBuf::from(path)
}

/// Write a coordinate-sorted BAM file with the given reference sequences
/// and reads to `path`, and index it to `<path>.bai`.
pub fn write_indexed_bam(
    path: impl AsRef<Path>,
    references: &[(&str, usize)],
    reads: &[BamRead],
) -> io::Result<()> {
    let path = path.as_ref();
    let mut builder = sam::Header::builder();
    for &(name, length) in references {
        let length = NonZeroUsize::new(length).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "reference length must be positive")
        })?;
        builder = builder.add_reference_sequence(name, Map::<ReferenceSequence>::new(length));
    }
    let header = builder.build();

    let mut sorted = reads.to_vec();
    sorted.sort_by_key(|read| (read.reference, read.start));

    let mut writer = bam::io::Writer::new(File::create(path)?);
    writer.write_header(&header)?;
    for read in &sorted {
        writer.write_alignment_record(&header, &read.to_record()?)?;
    }
    writer.try_finish()?;
    drop(writer);

    index_bam(path)
}

fn index_bam(path: &Path) -> io::Result<()> {
    let mut reader = bam::io::reader::Builder.build_from_path(path)?;
    let header = reader.read_header()?;

    let mut record = bam::Record::default();
    let mut indexer = Indexer::default();
    let mut chunk_start = reader.get_ref().virtual_position();
    while reader.read_record(&mut record)? != 0 {
        let chunk_end = reader.get_ref().virtual_position();
        let context = match (
            record.reference_sequence_id().transpose()?,
            record.alignment_start().transpose()?,
            record.alignment_end().transpose()?,
        ) {
            (Some(id), Some(start), Some(end)) => {
                Some((id, start, end, !record.flags().is_unmapped()))
            }
            _ => None,
        };
        indexer.add_record(context, Chunk::new(chunk_start, chunk_end))?;
        chunk_start = chunk_end;
    }

    let index: bai::Index = indexer.build(header.reference_sequences().len());
    bai::write(bai_path(path), &index)
}

/// A [`CoverageSource`] over in-memory reads, standing in for an indexed BAM file.
#[derive(Clone, Debug)]
pub struct MemoryCoverage {
    sample_id: String,
    seqlens: IndexMap<String, Position>,
    reads: Vec<(String, AlignedFragment)>,
    options: CoverageOptions,
}

impl MemoryCoverage {
    pub fn new(sample_id: &str, seqlens: &[(&str, Position)]) -> Self {
        Self {
            sample_id: sample_id.to_string(),
            seqlens: seqlens
                .iter()
                .map(|(name, len)| (name.to_string(), *len))
                .collect(),
            reads: Vec::new(),
            options: CoverageOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CoverageOptions) -> Self {
        self.options = options;
        self
    }

    /// Add an unspliced read covering `[start, end)` on `seqname`.
    pub fn add_read(&mut self, seqname: &str, strand: Strand, start: Position, end: Position) {
        self.reads.push((
            seqname.to_string(),
            AlignedFragment::contiguous(strand, start, end),
        ));
    }
}

impl CoverageSource for MemoryCoverage {
    fn sample_id(&self) -> &str {
        &self.sample_id
    }

    fn count_vector(&mut self, roi: &Roi) -> Result<Vec<u32>, MobamplotError> {
        let in_bounds = self
            .seqlens
            .get(&roi.seqname)
            .map_or(false, |&len| roi.end <= len);
        if !in_bounds {
            return Err(MobamplotError::RoiOutOfBounds {
                roi: roi.name.clone(),
                sample: self.sample_id.clone(),
                seqname: roi.seqname.clone(),
                start: roi.start,
                end: roi.end,
            });
        }
        let reads = self
            .reads
            .iter()
            .filter(|(seqname, _)| *seqname == roi.seqname)
            .map(|(_, fragment)| fragment);
        Ok(count_fragments(roi, reads, &self.options))
    }
}

/// A [`Progress`] that records every event.
#[derive(Clone, Debug, Default)]
pub struct RecordingProgress {
    pub started: Vec<(usize, String)>,
    pub finished: Option<usize>,
}

impl Progress for RecordingProgress {
    fn roi_started(&mut self, index: usize, roi: &Roi) {
        self.started.push((index, roi.name.clone()));
    }

    fn finished(&mut self, total: usize) {
        self.finished = Some(total);
    }
}
