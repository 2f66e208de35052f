//! Per-region figures of read density across samples.
//!
//! Every region gets one figure with one panel per sample. Figures are either
//! interactive HTML pages ([`html`]) or static SVG documents drawn with
//! `plotters` ([`svg`]); both
//! share the geometry computed by [`figure::FigureLayout`].

use clap::ValueEnum;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::data::binning::PlotData;
use crate::error::MobamplotError;
use crate::store::StoredRoi;
use crate::Position;

pub mod figure;
pub mod html;
pub mod svg;

pub use figure::FigureLayout;

/// The default bin size, in basepairs.
pub const DEFAULT_BINSIZE: Position = 200;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Interactive plotly.js page.
    #[default]
    Html,
    /// Static vector image.
    Svg,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Html => "html",
            OutputFormat::Svg => "svg",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlotStyle {
    /// Binned averages drawn as bars. Interactive figures can be rebinned.
    #[default]
    Histogram,
    /// Binned averages drawn as a filled line.
    Line,
}

#[derive(Clone, Debug)]
pub struct RenderOptions {
    pub style: PlotStyle,
    pub format: OutputFormat,
    pub binsize: Position,
    /// Open every written figure with the platform's default viewer.
    pub view: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            style: PlotStyle::default(),
            format: OutputFormat::default(),
            binsize: DEFAULT_BINSIZE,
            view: false,
        }
    }
}

/// Replace characters that are unsafe in file names.
pub fn sanitize_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if sanitized.is_empty() || sanitized.chars().all(|c| c == '.') {
        format!("_{}", sanitized)
    } else {
        sanitized
    }
}

/// Escape text for inclusion in HTML or SVG markup.
pub fn escape_markup(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// The figure path of region `roi_name`: `<roi>.hist.<ext>` or
/// `<roi>.line.bin<binsize>.<ext>`.
pub fn figure_path(outfolder: impl AsRef<Path>, roi_name: &str, options: &RenderOptions) -> PathBuf {
    let name = sanitize_name(roi_name);
    let ext = options.format.extension();
    let filename = match options.style {
        PlotStyle::Histogram => format!("{}.hist.{}", name, ext),
        PlotStyle::Line => format!("{}.line.bin{}.{}", name, options.binsize, ext),
    };
    outfolder.as_ref().join(filename)
}

/// The values drawn for `stored` with these options.
pub fn plot_data(stored: &StoredRoi, options: &RenderOptions) -> Result<PlotData, MobamplotError> {
    if options.binsize == 0 {
        return Err(MobamplotError::InvalidBinWidth(options.binsize));
    }
    match (options.style, options.format) {
        (PlotStyle::Line, _) => PlotData::line(stored, options.binsize),
        (PlotStyle::Histogram, OutputFormat::Html) => Ok(PlotData::histogram(stored)),
        (PlotStyle::Histogram, OutputFormat::Svg) => {
            PlotData::histogram_binned(stored, options.binsize)
        }
    }
}

/// Draw the figure of one region into `outfolder`, returning its path.
pub fn render_roi(
    stored: &StoredRoi,
    outfolder: impl AsRef<Path>,
    options: &RenderOptions,
) -> Result<PathBuf, MobamplotError> {
    let data = plot_data(stored, options)?;
    let layout = FigureLayout::new(stored, &data);
    let path = figure_path(outfolder, &stored.name, options);

    let mut writer = BufWriter::new(File::create(&path)?);
    match options.format {
        OutputFormat::Html => {
            let figure = html::figure_json(&layout, &data, options.style, options.binsize);
            html::write_html(&mut writer, &layout.title, &figure)?;
        }
        OutputFormat::Svg => svg::write_svg(&mut writer, &layout, &data, options.style)?,
    }
    writer.flush()?;
    log::debug!("wrote figure for '{}' to {}", stored.name, path.display());

    if options.view {
        open_in_viewer(&path);
    }
    Ok(path)
}

fn viewer_command(path: &Path) -> Command {
    if cfg!(target_os = "macos") {
        let mut command = Command::new("open");
        command.arg(path);
        command
    } else if cfg!(target_os = "windows") {
        let mut command = Command::new("cmd");
        command.args(["/C", "start", ""]).arg(path);
        command
    } else {
        let mut command = Command::new("xdg-open");
        command.arg(path);
        command
    }
}

/// Open `path` with the platform's default viewer. Failure is only logged.
pub fn open_in_viewer(path: &Path) {
    match viewer_command(path).spawn() {
        Ok(_) => log::debug!("opened {}", path.display()),
        Err(e) => log::warn!("could not open {} in a viewer: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::CountMatrix;
    use crate::ranges::Roi;

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("geneA"), "geneA");
        assert_eq!(sanitize_name("chr1:100-200/x"), "chr1_100-200_x");
        assert_eq!(sanitize_name(".."), "_..");
    }

    #[test]
    fn test_figure_paths() {
        let hist = RenderOptions::default();
        assert_eq!(
            figure_path("out", "geneA", &hist),
            PathBuf::from("out/geneA.hist.html")
        );
        let line = RenderOptions {
            style: PlotStyle::Line,
            format: OutputFormat::Svg,
            binsize: 50,
            view: false,
        };
        assert_eq!(
            figure_path("out", "geneA", &line),
            PathBuf::from("out/geneA.line.bin50.svg")
        );
    }

    #[test]
    fn test_escape_markup() {
        assert_eq!(escape_markup("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
    }

    #[test]
    fn test_render_writes_one_file_per_roi() {
        let dir = tempfile::tempdir().unwrap();
        let roi = Roi::new("geneA", "chr1", 0, 300).unwrap();
        let matrix = CountMatrix::from_vectors(&roi, &["s1".to_string()], vec![vec![2; 300]])
            .unwrap();
        let stored = StoredRoi {
            name: roi.name.clone(),
            seqname: roi.seqname.clone(),
            start: roi.start,
            end: roi.end,
            segments: roi.segments.clone(),
            matrix,
        };

        for format in [OutputFormat::Html, OutputFormat::Svg] {
            let options = RenderOptions {
                format,
                ..Default::default()
            };
            let path = render_roi(&stored, dir.path(), &options).unwrap();
            assert!(path.exists());
        }
        let written = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(written, 2);

        let zero = RenderOptions {
            binsize: 0,
            ..Default::default()
        };
        assert!(matches!(
            render_roi(&stored, dir.path(), &zero),
            Err(MobamplotError::InvalidBinWidth(0))
        ));
    }
}
