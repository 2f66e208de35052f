use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use mobamplot::{
    commands::{extract_counts, plot_counts, ExtractOptions, PlotOptions},
    coverage::{CoverageOptions, MappingRule, Strandedness},
    prelude::MobamplotError,
    render::{OutputFormat, PlotStyle, RenderOptions, DEFAULT_BINSIZE},
    reporting::{LogProgress, Report},
    samples::{resolve_samples, AlignmentSelection},
    Position,
};

const INFO: &str = "\
mobamplot: per-nucleotide read density across samples over regions of interest
usage: mobamplot [--help] <subcommand>

Subcommands:

  extract: count reads from indexed BAM files over the regions of a BED file,
           and store the count vectors in a single container file.

  plot:    draw one figure per region from a counts container.

";

#[derive(Parser)]
#[clap(name = "mobamplot")]
#[clap(about = INFO)]
struct Cli {
    /// increase log verbosity (-d for debug, -dd for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    debug: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// BAM files for extraction: a folder or an explicit list.
#[derive(Args)]
#[group(required = true, multiple = false)]
struct RequiredBams {
    /// a folder of indexed BAM files (every *.bam is used)
    #[arg(long)]
    bamfolder: Option<PathBuf>,

    /// one or more indexed BAM files
    #[arg(long, num_args = 1..)]
    bamfiles: Option<Vec<PathBuf>>,
}

/// BAM files for in-process extraction with --callFunc.
#[derive(Args)]
#[group(required = false, multiple = false)]
struct OptionalBams {
    /// a folder of indexed BAM files (every *.bam is used)
    #[arg(long)]
    bamfolder: Option<PathBuf>,

    /// one or more indexed BAM files
    #[arg(long, num_args = 1..)]
    bamfiles: Option<Vec<PathBuf>>,
}

fn selection(bamfolder: &Option<PathBuf>, bamfiles: &Option<Vec<PathBuf>>) -> Option<AlignmentSelection> {
    match (bamfolder, bamfiles) {
        (Some(folder), _) => Some(AlignmentSelection::Folder(folder.clone())),
        (None, Some(files)) => Some(AlignmentSelection::Files(files.clone())),
        (None, None) => None,
    }
}

#[derive(Subcommand)]
enum Commands {
    Extract {
        /// a BED4, BED6, or BED12 file of named regions of interest
        #[arg(required = true)]
        bedfile: PathBuf,

        #[command(flatten)]
        bams: RequiredBams,

        /// the folder to write the counts container to (the current directory if not specified)
        #[arg(long)]
        outfolder: Option<PathBuf>,

        /// a sample ID for each BAM file, in the same order (file names are used if not specified)
        #[arg(long = "bamIDs", num_args = 1..)]
        bam_ids: Option<Vec<String>>,

        /// which reference positions a read is counted at
        #[arg(long, value_enum, default_value_t = MappingRule::Coverage)]
        mapping: MappingRule,

        /// count reads on both strands, even for regions with a strand
        #[arg(long)]
        unstranded: bool,
    },
    Plot {
        /// a BED4, BED6, or BED12 file of regions (needed with --callFunc)
        #[arg(long)]
        bedfile: Option<PathBuf>,

        /// the counts container to plot
        #[arg(long = "hdf5", visible_alias = "counts")]
        hdf5: Option<PathBuf>,

        #[command(flatten)]
        bams: OptionalBams,

        /// the folder to write figures to (the current directory if not specified)
        #[arg(long)]
        outfolder: Option<PathBuf>,

        /// draw figures (always on; accepted for compatibility)
        #[arg(long)]
        plot: bool,

        /// open every figure in the default viewer
        #[arg(long)]
        viewplot: bool,

        /// bin size in basepairs
        #[arg(long, default_value_t = DEFAULT_BINSIZE, value_parser = clap::value_parser!(u32).range(1..))]
        binsize: Position,

        /// figure file format
        #[arg(long, value_enum, default_value_t = OutputFormat::Html)]
        format: OutputFormat,

        /// draw a filled line of bin means instead of a histogram
        #[arg(long)]
        line: bool,

        /// a sample ID for each BAM file, in the same order (file names are used if not specified)
        #[arg(long = "bamIDs", num_args = 1..)]
        bam_ids: Option<Vec<String>>,

        /// extract counts from the BAM files first, and plot the container this writes
        #[arg(long = "callFunc", visible_alias = "call-func")]
        call_func: bool,

        /// which reference positions a read is counted at (with --callFunc)
        #[arg(long, value_enum, default_value_t = MappingRule::Coverage)]
        mapping: MappingRule,

        /// count reads on both strands, even for regions with a strand (with --callFunc)
        #[arg(long)]
        unstranded: bool,
    },
}

fn init_logging(debug: u8) {
    let level = match debug {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    // RUST_LOG, if set, takes precedence
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .format_target(false)
        .parse_default_env()
        .init();
}

fn coverage_options(mapping: MappingRule, unstranded: bool) -> CoverageOptions {
    CoverageOptions {
        mapping,
        strandedness: if unstranded {
            Strandedness::Unstranded
        } else {
            Strandedness::Stranded
        },
    }
}

fn outfolder_or_cwd(outfolder: &Option<PathBuf>) -> Result<PathBuf, MobamplotError> {
    match outfolder {
        Some(folder) => Ok(folder.clone()),
        None => {
            log::info!("No output folder specified.");
            Ok(std::env::current_dir()?)
        }
    }
}

fn log_report(report: &Report) {
    for issue in report.entries() {
        log::warn!("{}", issue);
    }
}

fn run() -> Result<(), MobamplotError> {
    let cli = Cli::parse();
    init_logging(cli.debug);
    let mut progress = LogProgress::new();

    match &cli.command {
        Some(Commands::Extract {
            bedfile,
            bams,
            outfolder,
            bam_ids,
            mapping,
            unstranded,
        }) => {
            let alignments = selection(&bams.bamfolder, &bams.bamfiles).ok_or_else(|| {
                MobamplotError::MissingArgument("--bamfolder or --bamfiles".to_string())
            })?;
            let options = ExtractOptions {
                bedfile: bedfile.clone(),
                alignments,
                sample_ids: bam_ids.clone(),
                outfolder: outfolder_or_cwd(outfolder)?,
                coverage: coverage_options(*mapping, *unstranded),
            };
            let output = extract_counts(&options, &mut progress)?;
            log_report(&output.report);
            log::info!("Counts written to {}", output.value.display());
        }
        Some(Commands::Plot {
            bedfile,
            hdf5,
            bams,
            outfolder,
            plot: _,
            viewplot,
            binsize,
            format,
            line,
            bam_ids,
            call_func,
            mapping,
            unstranded,
        }) => {
            let alignments = selection(&bams.bamfolder, &bams.bamfiles);
            let extract = if *call_func {
                let bedfile = bedfile
                    .clone()
                    .ok_or_else(|| MobamplotError::MissingArgument("--bedfile".to_string()))?;
                let alignments = alignments.ok_or_else(|| {
                    MobamplotError::MissingArgument("--bamfolder or --bamfiles".to_string())
                })?;
                Some(ExtractOptions {
                    bedfile,
                    alignments,
                    sample_ids: bam_ids.clone(),
                    outfolder: outfolder_or_cwd(outfolder)?,
                    coverage: coverage_options(*mapping, *unstranded),
                })
            } else {
                if hdf5.is_none() {
                    return Err(MobamplotError::MissingArgument("--hdf5".to_string()));
                }
                // sample IDs are only used by extraction, but a mismatch is still reported
                if let (Some(selection), Some(ids)) = (&alignments, bam_ids) {
                    resolve_samples(&selection.paths()?, Some(ids.as_slice()))?;
                }
                None
            };

            let options = PlotOptions {
                counts: hdf5.clone(),
                extract,
                outfolder: outfolder_or_cwd(outfolder)?,
                render_options: RenderOptions {
                    style: if *line {
                        PlotStyle::Line
                    } else {
                        PlotStyle::Histogram
                    },
                    format: *format,
                    binsize: *binsize,
                    view: *viewplot,
                },
            };
            let output = plot_counts(&options, &mut progress)?;
            log_report(&output.report);
        }
        None => {
            println!("{}\n", INFO);
            std::process::exit(1);
        }
    }
    Ok(())
}

fn main() {
    match run() {
        Ok(_) => {}
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
