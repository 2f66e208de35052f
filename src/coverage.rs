//! Per-nucleotide read counts over regions of interest.
//!
//! A [`CoverageSource`] yields one count vector for a region, laid out over the region's
//! concatenated segments (see [`SplicedLayout`]). [`BamCoverage`] is the source
//! backed by an indexed BAM file. Record decoding and index queries are done by
//! [`noodles`], and this module turns each record into an [`AlignedFragment`] and
//! adds it onto the vector according to a [`MappingRule`].

use clap::ValueEnum;
use noodles::bam;
use noodles::bgzf;
use noodles::sam;
use noodles::sam::alignment::record::cigar::op::Kind;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::MobamplotError;
use crate::io::noodles::{to_noodles_region, zero_based};
use crate::ranges::operations::SplicedLayout;
use crate::ranges::{Roi, Segment, Strand};
use crate::samples::Sample;
use crate::Position;

/// Which reference positions an aligned read is counted at.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum MappingRule {
    /// Every aligned reference base (CIGAR `M`, `=`, `X`, and `D`); spliced-out
    /// (`N`) bases are not counted.
    #[default]
    Coverage,
    /// Only the 5'-most aligned base of the read.
    FivePrime,
    /// Only the 3'-most aligned base of the read.
    ThreePrime,
}

/// Whether reads must be on the same strand as the region to be counted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Strandedness {
    /// Only count reads on the region's strand. Regions without a strand
    /// count reads on both strands.
    #[default]
    Stranded,
    /// Count reads on both strands.
    Unstranded,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct CoverageOptions {
    pub mapping: MappingRule,
    pub strandedness: Strandedness,
}

/// An aligned read, reduced to its strand and the reference blocks it covers.
///
/// Blocks are 0-based, right-exclusive, and sorted. Adjacent `M`/`=`/`X`/`D`
/// operations are merged into one block; `N` operations split blocks.
#[derive(Clone, Debug, PartialEq)]
pub struct AlignedFragment {
    pub strand: Strand,
    pub blocks: Vec<Segment>,
}

impl AlignedFragment {
    pub fn new(strand: Strand, blocks: Vec<Segment>) -> Self {
        Self { strand, blocks }
    }

    /// An unspliced fragment covering `[start, end)`.
    pub fn contiguous(strand: Strand, start: Position, end: Position) -> Self {
        Self::new(strand, vec![Segment::new(start, end)])
    }

    /// The reference position of the 5' end of this fragment.
    pub fn five_prime(&self) -> Option<Position> {
        match self.strand {
            Strand::Forward => self.blocks.first().map(|b| b.start),
            Strand::Reverse => self.blocks.last().map(|b| b.end - 1),
        }
    }

    /// The reference position of the 3' end of this fragment.
    pub fn three_prime(&self) -> Option<Position> {
        match self.strand {
            Strand::Forward => self.blocks.last().map(|b| b.end - 1),
            Strand::Reverse => self.blocks.first().map(|b| b.start),
        }
    }
}

/// Add a single fragment onto the count vector `counts` of the region laid out by `layout`.
pub fn add_fragment(
    counts: &mut [u32],
    layout: &SplicedLayout,
    roi_strand: Option<Strand>,
    fragment: &AlignedFragment,
    options: &CoverageOptions,
) {
    if options.strandedness == Strandedness::Stranded {
        if let Some(strand) = roi_strand {
            if strand != fragment.strand {
                return;
            }
        }
    }

    let mut increment = |index: usize| counts[index] = counts[index].saturating_add(1);

    match options.mapping {
        MappingRule::Coverage => {
            for block in &fragment.blocks {
                for (from, to) in layout.overlapping_indices(block.start, block.end) {
                    (from..to).for_each(&mut increment);
                }
            }
        }
        MappingRule::FivePrime => {
            if let Some(index) = fragment.five_prime().and_then(|p| layout.index_of(p)) {
                increment(index);
            }
        }
        MappingRule::ThreePrime => {
            if let Some(index) = fragment.three_prime().and_then(|p| layout.index_of(p)) {
                increment(index);
            }
        }
    }
}

/// Build the count vector of `roi` from a set of fragments.
pub fn count_fragments<'a, I>(roi: &Roi, fragments: I, options: &CoverageOptions) -> Vec<u32>
where
    I: IntoIterator<Item = &'a AlignedFragment>,
{
    let layout = SplicedLayout::new(roi);
    let mut counts = vec![0; layout.len()];
    for fragment in fragments {
        add_fragment(&mut counts, &layout, roi.strand, fragment, options);
    }
    counts
}

/// A source of per-nucleotide counts for one sample.
pub trait CoverageSource {
    /// The sample ID this source's counts are stored under.
    fn sample_id(&self) -> &str;

    /// Produce the count vector for `roi`. Its length must equal
    /// [`Roi::spliced_length()`].
    fn count_vector(&mut self, roi: &Roi) -> Result<Vec<u32>, MobamplotError>;
}

type BamReader = bam::io::IndexedReader<bgzf::Reader<File>>;

/// Counts from an indexed (`.bai`) BAM file.
pub struct BamCoverage {
    sample_id: String,
    path: PathBuf,
    reader: BamReader,
    header: sam::Header,
    options: CoverageOptions,
}

impl std::fmt::Debug for BamCoverage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BamCoverage")
            .field("sample_id", &self.sample_id)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl BamCoverage {
    /// Open the BAM file and its index, and read the header. Errors here
    /// name the file, and are raised before any region is processed.
    pub fn open(sample: &Sample, options: CoverageOptions) -> Result<Self, MobamplotError> {
        let source_error = |source: io::Error| MobamplotError::AlignmentSourceError {
            path: sample.path.clone(),
            source,
        };
        let mut reader = bam::io::indexed_reader::Builder::default()
            .build_from_path(&sample.path)
            .map_err(source_error)?;
        let header = reader.read_header().map_err(source_error)?;
        log::debug!(
            "opened {} ({} reference sequences) as sample '{}'",
            sample.path.display(),
            header.reference_sequences().len(),
            sample.id
        );
        Ok(Self {
            sample_id: sample.id.clone(),
            path: sample.path.clone(),
            reader,
            header,
            options,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The length of reference sequence `seqname` according to the BAM header.
    pub fn reference_length(&self, seqname: &str) -> Option<usize> {
        self.header
            .reference_sequences()
            .iter()
            .find(|(name, _)| name.as_slice() == seqname.as_bytes())
            .map(|(_, reference_sequence)| reference_sequence.length().get())
    }

    fn out_of_bounds(&self, roi: &Roi) -> MobamplotError {
        MobamplotError::RoiOutOfBounds {
            roi: roi.name.clone(),
            sample: self.sample_id.clone(),
            seqname: roi.seqname.clone(),
            start: roi.start,
            end: roi.end,
        }
    }
}

impl CoverageSource for BamCoverage {
    fn sample_id(&self) -> &str {
        &self.sample_id
    }

    fn count_vector(&mut self, roi: &Roi) -> Result<Vec<u32>, MobamplotError> {
        let length = self
            .reference_length(&roi.seqname)
            .ok_or_else(|| self.out_of_bounds(roi))?;
        if roi.end as usize > length {
            return Err(self.out_of_bounds(roi));
        }
        let region =
            to_noodles_region(&roi.seqname, roi.start, roi.end).ok_or_else(|| {
                MobamplotError::DegenerateRoi {
                    roi: roi.name.clone(),
                    start: roi.start,
                    end: roi.end,
                }
            })?;

        let record_error = |source: io::Error| MobamplotError::AlignmentRecordError {
            roi: roi.name.clone(),
            sample: self.sample_id.clone(),
            source,
        };

        let layout = SplicedLayout::new(roi);
        let mut counts = vec![0; layout.len()];
        let query = self
            .reader
            .query(&self.header, &region)
            .map_err(record_error)?;
        for result in query {
            let record = result.map_err(record_error)?;
            if let Some(fragment) = fragment_from_record(&record).map_err(record_error)? {
                add_fragment(&mut counts, &layout, roi.strand, &fragment, &self.options);
            }
        }
        Ok(counts)
    }
}

/// Reduce a BAM record to an [`AlignedFragment`]. Unmapped, secondary,
/// supplementary, and QC-failed records give `None`.
pub fn fragment_from_record(record: &bam::Record) -> io::Result<Option<AlignedFragment>> {
    let flags = record.flags();
    if flags.is_unmapped() || flags.is_secondary() || flags.is_supplementary() || flags.is_qc_fail()
    {
        return Ok(None);
    }

    let Some(alignment_start) = record.alignment_start().transpose()? else {
        return Ok(None);
    };
    let mut position = to_position(zero_based(alignment_start))?;

    let mut blocks: Vec<Segment> = Vec::new();
    for result in record.cigar().iter() {
        let op = result?;
        let len = to_position(op.len() as u64)?;
        match op.kind() {
            Kind::Match | Kind::SequenceMatch | Kind::SequenceMismatch | Kind::Deletion => {
                match blocks.last_mut() {
                    Some(block) if block.end == position => block.end += len,
                    _ => blocks.push(Segment::new(position, position + len)),
                }
                position += len;
            }
            Kind::Skip => position += len,
            _ => {}
        }
    }

    if blocks.is_empty() {
        return Ok(None);
    }

    let strand = if flags.is_reverse_complemented() {
        Strand::Reverse
    } else {
        Strand::Forward
    };
    Ok(Some(AlignedFragment::new(strand, blocks)))
}

fn to_position(value: u64) -> io::Result<Position> {
    Position::try_from(value).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
