//! Tests of counting from indexed BAM files written on the fly.

use mobamplot::{
    commands::{extract_counts, plot_counts, ExtractOptions, PlotOptions},
    prelude::*,
    render::RenderOptions,
    store::counts_path,
    test_utilities::{temp_bedfile, write_indexed_bam, BamRead},
    Position,
};
use noodles::sam::alignment::record::{cigar::op::Kind, Flags};
use std::path::Path;

const REFERENCES: [(&str, usize); 2] = [("chr1", 1000), ("chr2", 500)];

fn reads() -> Vec<BamRead> {
    vec![
        // 50M at 90
        BamRead::new(0, 90, &[(Kind::Match, 50)]),
        // 5M10N5M at 150, reverse strand
        BamRead::new(0, 150, &[(Kind::Match, 5), (Kind::Skip, 10), (Kind::Match, 5)])
            .with_flags(Flags::REVERSE_COMPLEMENTED),
        // 5M2D3M at 180
        BamRead::new(
            0,
            180,
            &[(Kind::Match, 5), (Kind::Deletion, 2), (Kind::Match, 3)],
        ),
        BamRead::new(0, 100, &[(Kind::Match, 20)]).with_flags(Flags::SECONDARY),
        BamRead::new(0, 120, &[(Kind::Match, 10)]).with_flags(Flags::QC_FAIL),
        BamRead::new(0, 130, &[(Kind::Match, 10)]).with_flags(Flags::SUPPLEMENTARY),
        BamRead::new(1, 100, &[(Kind::Match, 30)]),
    ]
}

fn write_bam(path: &Path) {
    write_indexed_bam(path, &REFERENCES, &reads()).unwrap();
}

/// Expected coverage over chr1:100-200: [100, 140), [150, 155), [165, 170),
/// and [180, 190).
fn expected_coverage() -> Vec<u32> {
    (100..200)
        .map(|p: Position| {
            u32::from(
                (100..140).contains(&p)
                    || (150..155).contains(&p)
                    || (165..170).contains(&p)
                    || (180..190).contains(&p),
            )
        })
        .collect()
}

fn open(path: &Path, options: CoverageOptions) -> BamCoverage {
    BamCoverage::open(&Sample::new("s1", path), options).unwrap()
}

#[test]
fn test_bam_coverage_vector() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("s1.bam");
    write_bam(&path);

    let mut source = open(&path, CoverageOptions::default());
    assert_eq!(source.reference_length("chr1"), Some(1000));
    let roi = Roi::new("geneA", "chr1", 100, 200).unwrap();
    let counts = source.count_vector(&roi).unwrap();
    assert_eq!(counts.len(), 100);
    assert_eq!(counts, expected_coverage());

    let chr2 = Roi::new("geneB", "chr2", 90, 140).unwrap();
    let counts = source.count_vector(&chr2).unwrap();
    assert_eq!(counts.iter().sum::<u32>(), 30);
    assert_eq!(counts[10], 1);
    assert_eq!(counts[40], 0);
}

#[test]
fn test_bam_stranded_region() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("s1.bam");
    write_bam(&path);

    let roi = Roi::with_segments(
        "geneA",
        "chr1",
        100,
        200,
        Some(Strand::Reverse),
        vec![Segment::new(100, 200)],
    )
    .unwrap();

    let mut stranded = open(&path, CoverageOptions::default());
    let counts = stranded.count_vector(&roi).unwrap();
    let expected: Vec<u32> = (100..200)
        .map(|p: Position| u32::from((150..155).contains(&p) || (165..170).contains(&p)))
        .collect();
    assert_eq!(counts, expected);

    let unstranded = CoverageOptions {
        strandedness: Strandedness::Unstranded,
        ..Default::default()
    };
    let counts = open(&path, unstranded).count_vector(&roi).unwrap();
    assert_eq!(counts, expected_coverage());
}

#[test]
fn test_bam_five_prime_on_spliced_region() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("s1.bam");
    write_bam(&path);

    let roi = Roi::with_segments(
        "tx1",
        "chr1",
        100,
        200,
        None,
        vec![Segment::new(100, 120), Segment::new(160, 200)],
    )
    .unwrap();

    let mut coverage = open(&path, CoverageOptions::default());
    let counts = coverage.count_vector(&roi).unwrap();
    assert_eq!(counts.len(), 60);
    assert!(counts[..20].iter().all(|&c| c == 1));
    // the reverse read's second block, [165, 170), after 20 positions of the first segment
    assert_eq!(&counts[25..30], &[1; 5]);
    assert_eq!(counts[24], 0);

    let five_prime = CoverageOptions {
        mapping: MappingRule::FivePrime,
        ..Default::default()
    };
    let counts = open(&path, five_prime).count_vector(&roi).unwrap();
    // reverse read ends at 169, the 5M2D3M read starts at 180; the 50M read
    // starts outside the region
    let mut expected = vec![0; 60];
    expected[20 + 9] = 1;
    expected[20 + 20] = 1;
    assert_eq!(counts, expected);
}

#[test]
fn test_bam_out_of_bounds() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("s1.bam");
    write_bam(&path);
    let mut source = open(&path, CoverageOptions::default());

    for roi in [
        Roi::new("past_end", "chr1", 990, 1010).unwrap(),
        Roi::new("unknown", "chrUn", 0, 10).unwrap(),
    ] {
        match source.count_vector(&roi) {
            Err(MobamplotError::RoiOutOfBounds { roi: name, sample, .. }) => {
                assert_eq!(name, roi.name);
                assert_eq!(sample, "s1");
            }
            other => panic!("expected RoiOutOfBounds, got {:?}", other),
        }
    }
}

fn extract_options(dir: &Path, bedfile: &Path) -> ExtractOptions {
    let bams = dir.join("bams");
    std::fs::create_dir(&bams).unwrap();
    write_bam(&bams.join("young.bam"));
    write_indexed_bam(
        bams.join("old.bam"),
        &REFERENCES,
        &[BamRead::new(0, 195, &[(Kind::Match, 10)])],
    )
    .unwrap();

    ExtractOptions {
        bedfile: bedfile.to_path_buf(),
        alignments: AlignmentSelection::Folder(bams),
        sample_ids: None,
        outfolder: dir.join("out"),
        coverage: CoverageOptions::default(),
    }
}

#[test]
fn test_extract_counts_from_bam_folder() {
    let dir = tempfile::tempdir().unwrap();
    let bedfile = temp_bedfile("chr1\t100\t200\tgeneA\nchr2\t0\t50\tgeneB\n").unwrap();
    let options = extract_options(dir.path(), bedfile.path());

    let output = extract_counts(&options, &mut NoProgress).unwrap();
    assert_eq!(output.value, counts_path(dir.path().join("out"), bedfile.path()));

    let stored = CountStoreReader::open(&output.value)
        .unwrap()
        .read_all()
        .unwrap();
    assert_eq!(stored.len(), 2);
    // folder files are sorted by path
    assert_eq!(
        stored[0].matrix.sample_ids().collect::<Vec<_>>(),
        vec!["old", "young"]
    );
    assert_eq!(
        stored[0].matrix.column("young"),
        Some(expected_coverage().as_slice())
    );
    let old = stored[0].matrix.column("old").unwrap();
    assert_eq!(old.iter().sum::<u32>(), 5);
    assert_eq!(&old[95..], &[1; 5]);
    assert!(stored[1].matrix.column("old").unwrap().iter().all(|&c| c == 0));
}

#[test]
fn test_plot_extracts_then_renders() {
    let dir = tempfile::tempdir().unwrap();
    let bedfile = temp_bedfile("chr1\t100\t200\tgeneA\n").unwrap();
    let extract = extract_options(dir.path(), bedfile.path());
    let figures = dir.path().join("out");

    let options = PlotOptions {
        counts: None,
        extract: Some(extract),
        outfolder: figures.clone(),
        render_options: RenderOptions::default(),
    };
    let output = plot_counts(&options, &mut NoProgress).unwrap();
    assert_eq!(output.value, vec![figures.join("geneA.hist.html")]);
    assert!(counts_path(&figures, bedfile.path()).exists());
    let html = std::fs::read_to_string(&output.value[0]).unwrap();
    assert!(html.contains("Gene: geneA"));
}
