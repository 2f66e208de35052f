//! Command functions: the `extract` and `plot` stages of the pipeline.
//!
//! Both stages are plain library calls. When plotting is asked to extract
//! first, it calls [`extract_counts()`] in-process and plots the container
//! it returns.

use std::path::{Path, PathBuf};

use crate::{
    coverage::{BamCoverage, CoverageOptions, CoverageSource},
    data::CountMatrix,
    error::MobamplotError,
    io::parsers::bed::read_rois,
    ranges::RoiSet,
    render::{render_roi, RenderOptions},
    reporting::{CommandOutput, Progress, Report},
    samples::{resolve_samples, AlignmentSelection},
    store::{counts_path, ContainerHeader, CountStoreReader, CountStoreWriter},
};

/// Settings of the extraction stage.
#[derive(Clone, Debug)]
pub struct ExtractOptions {
    pub bedfile: PathBuf,
    pub alignments: AlignmentSelection,
    /// Sample IDs, one per BAM file, in BAM order. Derived from the file
    /// names if not given.
    pub sample_ids: Option<Vec<String>>,
    pub outfolder: PathBuf,
    pub coverage: CoverageOptions,
}

/// Settings of the plotting stage.
#[derive(Clone, Debug)]
pub struct PlotOptions {
    /// The counts container to plot. Ignored if `extract` is set.
    pub counts: Option<PathBuf>,
    /// Extract counts first, and plot the container this writes.
    pub extract: Option<ExtractOptions>,
    pub outfolder: PathBuf,
    pub render_options: RenderOptions,
}

/// Create the output folder if it does not exist yet.
pub fn prepare_outfolder(outfolder: &Path) -> Result<(), MobamplotError> {
    if !outfolder.is_dir() {
        std::fs::create_dir_all(outfolder)?;
        log::info!("Output folder does not exist. Created folder.");
    }
    let shown = outfolder
        .canonicalize()
        .unwrap_or_else(|_| outfolder.to_path_buf());
    log::info!("Saving output files to: {}", shown.display());
    Ok(())
}

/// Count reads over every region of `rois` in every source, appending one
/// dataset per region to `writer`.
///
/// Regions are processed in file order and sources in the order given. The
/// first error stops the run; datasets written before it remain in the
/// container.
pub fn extract_with_sources<S: CoverageSource>(
    rois: &RoiSet,
    sources: &mut [S],
    mut writer: CountStoreWriter,
    progress: &mut dyn Progress,
) -> Result<CommandOutput<PathBuf>, MobamplotError> {
    let sample_ids: Vec<String> = sources.iter().map(|s| s.sample_id().to_string()).collect();
    let mut report = Report::new();
    let mut empty_rois = 0;

    for (index, roi) in rois.iter().enumerate() {
        progress.roi_started(index, roi);
        let vectors = sources
            .iter_mut()
            .map(|source| source.count_vector(roi))
            .collect::<Result<Vec<_>, _>>()?;
        let matrix = CountMatrix::from_vectors(roi, &sample_ids, vectors)?;
        if matrix.max_count() == 0 {
            empty_rois += 1;
        }
        writer.write(roi, &matrix)?;
    }
    progress.finished(rois.len());

    if empty_rois > 0 {
        report.add_issue(format!(
            "{} of {} regions had no reads in any sample",
            empty_rois,
            rois.len()
        ));
    }
    let path = writer.finish()?;
    Ok(CommandOutput::new(path, report))
}

/// Extract count vectors from BAM files over the regions of a BED file, and
/// write them to `<outfolder>/<bed stem>.cvd`. Returns the container path.
///
/// Sample IDs are checked and every BAM file is opened before the output
/// folder or container is created.
pub fn extract_counts(
    options: &ExtractOptions,
    progress: &mut dyn Progress,
) -> Result<CommandOutput<PathBuf>, MobamplotError> {
    let paths = options.alignments.paths()?;
    let samples = resolve_samples(&paths, options.sample_ids.as_deref())?;
    let rois = read_rois(&options.bedfile)?;
    log::info!(
        "Read {} regions of interest from {}",
        rois.len(),
        options.bedfile.display()
    );

    let mut sources = samples
        .iter()
        .map(|sample| BamCoverage::open(sample, options.coverage))
        .collect::<Result<Vec<_>, _>>()?;

    prepare_outfolder(&options.outfolder)?;
    let path = counts_path(&options.outfolder, &options.bedfile);
    let header = ContainerHeader::new(Some(options.bedfile.display().to_string()));
    let writer = CountStoreWriter::create(&path, &header)?;
    log::info!("Writing counts to {}", path.display());

    extract_with_sources(&rois, &mut sources, writer, progress)
}

/// Draw one figure per region of a counts container, optionally extracting
/// the container first. Returns the paths of the figures written.
pub fn plot_counts(
    options: &PlotOptions,
    progress: &mut dyn Progress,
) -> Result<CommandOutput<Vec<PathBuf>>, MobamplotError> {
    let mut report = Report::new();

    let counts = match &options.extract {
        Some(extract) => {
            let output = extract_counts(extract, progress)?;
            for issue in output.report.entries() {
                report.add_issue(issue.clone());
            }
            output.value
        }
        None => options
            .counts
            .clone()
            .ok_or_else(|| MobamplotError::MissingArgument("--hdf5".to_string()))?,
    };

    // checked before any output is written
    if options.render_options.binsize == 0 {
        return Err(MobamplotError::InvalidBinWidth(0));
    }

    let reader = CountStoreReader::open(&counts)?;
    prepare_outfolder(&options.outfolder)?;

    let mut figures = Vec::new();
    for stored in reader {
        let stored = stored?;
        figures.push(render_roi(&stored, &options.outfolder, &options.render_options)?);
    }
    log::info!("Figure completed. Wrote {} figures.", figures.len());
    Ok(CommandOutput::new(figures, report))
}
