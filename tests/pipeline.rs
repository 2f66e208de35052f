//! End-to-end tests of the extract, store, bin, and render pipeline, with
//! in-memory coverage sources standing in for BAM files.

use mobamplot::{
    commands::extract_with_sources,
    prelude::*,
    render::{render_roi, PlotStyle, RenderOptions},
    store::{ContainerHeader, CountStoreReader, CountStoreWriter},
    test_utilities::{
        random_count_vector, random_roi, temp_bedfile, MemoryCoverage, RecordingProgress,
        NRANDOM_ROIS,
    },
};
use std::path::PathBuf;

#[test]
fn test_example_fixture() {
    let rois = read_rois("tests_data/example.bed").unwrap();
    let names: Vec<_> = rois.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["geneA", "geneB", "tx1"]);

    let tx1 = rois.get("tx1").unwrap();
    assert_eq!(tx1.strand, Some(Strand::Forward));
    assert_eq!(
        tx1.segments,
        vec![
            Segment::new(100, 200),
            Segment::new(400, 600),
            Segment::new(800, 900)
        ]
    );
    assert_eq!(tx1.spliced_length(), 400);
}

#[test]
fn test_single_roi_two_samples() {
    let bedfile = temp_bedfile("chr1\t1000\t2000\tgeneA\n").unwrap();
    let rois = read_rois(bedfile.path()).unwrap();

    let bams = vec![
        PathBuf::from("/data/Yng_H3K27ac_1-1.bam"),
        PathBuf::from("/data/Old_H3K27ac_1-1.bam"),
    ];
    let samples = resolve_samples(&bams, None).unwrap();
    let seqlens = [("chr1", 248_956_422)];
    let mut sources: Vec<MemoryCoverage> = samples
        .iter()
        .map(|s| MemoryCoverage::new(&s.id, &seqlens))
        .collect();
    sources[0].add_read("chr1", Strand::Forward, 900, 1100);
    sources[1].add_read("chr1", Strand::Reverse, 1950, 2050);

    let dir = tempfile::tempdir().unwrap();
    let path = counts_path(dir.path(), bedfile.path());
    let writer = CountStoreWriter::create(&path, &ContainerHeader::default()).unwrap();
    let mut progress = RecordingProgress::default();
    let output = extract_with_sources(&rois, &mut sources, writer, &mut progress).unwrap();
    assert_eq!(output.value, path);
    assert_eq!(progress.finished, Some(1));

    let stored = CountStoreReader::open(&path).unwrap().read_all().unwrap();
    assert_eq!(stored.len(), 1);
    let gene = &stored[0];
    assert_eq!(gene.name, "geneA");
    assert_eq!(gene.seqname, "chr1");
    assert_eq!((gene.start, gene.end), (1000, 2000));
    assert_eq!(gene.matrix.nrows(), 1000);
    assert_eq!(
        gene.matrix.sample_ids().collect::<Vec<_>>(),
        vec!["Yng_H3K27ac_1-1", "Old_H3K27ac_1-1"]
    );

    let young = gene.matrix.column("Yng_H3K27ac_1-1").unwrap();
    assert_eq!(young.iter().sum::<u32>(), 100);
    assert_eq!(young[99], 1);
    assert_eq!(young[100], 0);
    let old = gene.matrix.column("Old_H3K27ac_1-1").unwrap();
    assert_eq!(old.iter().sum::<u32>(), 50);
    assert_eq!(old[950], 1);
}

#[test]
fn test_per_source_coverage_options() {
    let bedfile = temp_bedfile("chr1\t0\t100\tgeneR\t0\t-\n").unwrap();
    let rois = read_rois(bedfile.path()).unwrap();

    let seqlens = [("chr1", 1000)];
    let mut stranded = MemoryCoverage::new("stranded", &seqlens);
    let mut starts = MemoryCoverage::new("starts", &seqlens).with_options(CoverageOptions {
        mapping: MappingRule::FivePrime,
        strandedness: Strandedness::Unstranded,
    });
    for source in [&mut stranded, &mut starts] {
        source.add_read("chr1", Strand::Forward, 10, 20);
        source.add_read("chr1", Strand::Reverse, 40, 50);
    }

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("strands.cvd");
    let writer = CountStoreWriter::create(&path, &ContainerHeader::default()).unwrap();
    extract_with_sources(&rois, &mut [stranded, starts], writer, &mut NoProgress).unwrap();

    let stored = CountStoreReader::open(&path).unwrap().read_all().unwrap();
    let matrix = &stored[0].matrix;
    // only the reverse read matches a '-' region by default
    let counts = matrix.column("stranded").unwrap();
    assert_eq!(counts.iter().sum::<u32>(), 10);
    assert!(counts[40..50].iter().all(|&c| c == 1));
    // 5' ends of both reads
    let counts = matrix.column("starts").unwrap();
    assert_eq!(counts.iter().sum::<u32>(), 2);
    assert_eq!((counts[10], counts[49]), (1, 1));
}

#[test]
fn test_random_rois_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("random.cvd");
    let mut writer = CountStoreWriter::create(&path, &ContainerHeader::default()).unwrap();
    let ids = vec!["s1".to_string(), "s2".to_string(), "s3".to_string()];

    let mut written = Vec::new();
    for i in 0..NRANDOM_ROIS {
        let roi = random_roi(&format!("roi{}", i)).unwrap();
        let vectors = (0..ids.len())
            .map(|_| random_count_vector(roi.spliced_length()))
            .collect();
        let matrix = CountMatrix::from_vectors(&roi, &ids, vectors).unwrap();
        writer.write(&roi, &matrix).unwrap();
        written.push((roi, matrix));
    }
    writer.finish().unwrap();

    let stored = CountStoreReader::open(&path).unwrap().read_all().unwrap();
    assert_eq!(stored.len(), written.len());
    for (stored, (roi, matrix)) in stored.iter().zip(&written) {
        assert_eq!(stored.name, roi.name);
        assert_eq!(stored.seqname, roi.seqname);
        assert_eq!((stored.start, stored.end), (roi.start, roi.end));
        assert_eq!(&stored.matrix, matrix);
        for (id, counts) in stored.matrix.iter() {
            assert_eq!(counts.len(), roi.spliced_length());
            assert_eq!(matrix.column(id), Some(counts));
        }
    }
}

#[test]
fn test_line_bins_of_stored_roi() {
    let bedfile = temp_bedfile("chr3\t0\t200\tspike\n").unwrap();
    let rois = read_rois(bedfile.path()).unwrap();
    let mut source = MemoryCoverage::new("s1", &[("chr3", 10_000)]);
    for _ in 0..10 {
        source.add_read("chr3", Strand::Forward, 149, 150);
    }

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("spike.cvd");
    let writer = CountStoreWriter::create(&path, &ContainerHeader::default()).unwrap();
    extract_with_sources(&rois, &mut [source], writer, &mut NoProgress).unwrap();

    let stored = CountStoreReader::open(&path).unwrap().read_all().unwrap();
    let plot = PlotData::line(&stored[0], 50).unwrap();
    assert_eq!(plot.x.len(), 4);
    assert_eq!(plot.series[0].y, vec![0.0, 0.0, 0.2, 0.0]);

    let options = RenderOptions {
        style: PlotStyle::Line,
        format: OutputFormat::Svg,
        binsize: 50,
        view: false,
    };
    let figure = render_roi(&stored[0], dir.path(), &options).unwrap();
    assert_eq!(figure, dir.path().join("spike.line.bin50.svg"));
    let svg = std::fs::read_to_string(figure).unwrap();
    assert!(svg.contains("Gene: spike"));
}
