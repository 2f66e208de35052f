//! Static figures drawn with `plotters` on its SVG backend.
//!
//! Panels are stacked top to bottom in sample order and share the layout of
//! the interactive figure: axis ranges, region ticks, and the 1kb scale bar.

use std::io::Write;

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::figure::FigureLayout;
use super::PlotStyle;
use crate::data::binning::PlotData;
use crate::error::MobamplotError;

pub const WIDTH: u32 = 800;
pub const HEIGHT: u32 = 1200;

const FONT: &str = "sans-serif";
const FILL: RGBColor = RGBColor(0, 0, 255);
const Y_LABEL_AREA: u32 = 60;
// room under each panel for the region ticks
const TICK_AREA: u32 = 30;

fn plotting_error<E: std::fmt::Display>(err: E) -> MobamplotError {
    MobamplotError::PlottingError(err.to_string())
}

fn format_tick(value: f64) -> String {
    let text = format!("{:.3}", value);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    layout: &FigureLayout,
    data: &PlotData,
    style: PlotStyle,
    series: usize,
) -> Result<(), MobamplotError> {
    let (x0, x1) = layout.x_range;
    let mut builder = ChartBuilder::on(area);
    builder
        .margin(10)
        .margin_bottom(TICK_AREA)
        .y_label_area_size(Y_LABEL_AREA);
    if style == PlotStyle::Histogram {
        builder.caption(&layout.panel_titles[series], (FONT, 16));
    }
    let mut chart = builder
        .build_cartesian_2d(x0..x1, 0.0..layout.y_max)
        .map_err(plotting_error)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .y_labels(5)
        .y_label_formatter(&|y: &f64| format_tick(*y))
        .y_desc("Reads")
        .label_style((FONT, 11))
        .draw()
        .map_err(plotting_error)?;

    let y = &data.series[series].y;
    match style {
        PlotStyle::Histogram => {
            chart
                .draw_series(data.edges.iter().zip(y).filter(|(_, y)| **y > 0.0).map(
                    |(&(left, right), &y)| {
                        Rectangle::new([(left as f64, 0.0), (right as f64, y)], FILL.filled())
                    },
                ))
                .map_err(plotting_error)?;
        }
        PlotStyle::Line => {
            chart
                .draw_series(
                    AreaSeries::new(
                        data.x.iter().copied().zip(y.iter().copied()),
                        0.0,
                        FILL.filled(),
                    )
                    .border_style(FILL.stroke_width(1)),
                )
                .map_err(plotting_error)?;
        }
    }

    // baseline and region ticks
    chart
        .draw_series(std::iter::once(PathElement::new(
            vec![(x0, 0.0), (x1, 0.0)],
            BLACK.stroke_width(1),
        )))
        .map_err(plotting_error)?;
    let tick_style = TextStyle::from((FONT, 11).into_font()).pos(Pos::new(HPos::Center, VPos::Top));
    chart
        .draw_series(layout.x_ticks.iter().map(|tick| {
            EmptyElement::at((tick.value as f64, 0.0))
                + PathElement::new(vec![(0, 0), (0, 5)], BLACK.stroke_width(1))
                + Text::new(tick.label.clone(), (0, 8), tick_style.clone())
        }))
        .map_err(plotting_error)?;

    let bar = &layout.scale_bar;
    chart
        .draw_series(std::iter::once(Rectangle::new(
            [(bar.x0.max(x0), bar.y0), (bar.x1, bar.y1)],
            BLACK.filled(),
        )))
        .map_err(plotting_error)?;
    let label_style = TextStyle::from((FONT, 12).into_font()).pos(Pos::new(HPos::Center, VPos::Bottom));
    chart
        .draw_series(std::iter::once(Text::new(
            bar.label.clone(),
            (bar.label_x, bar.label_y),
            label_style,
        )))
        .map_err(plotting_error)?;
    Ok(())
}

/// Draw the title and one panel per sample onto `root`.
pub fn draw_figure<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    layout: &FigureLayout,
    data: &PlotData,
    style: PlotStyle,
) -> Result<(), MobamplotError> {
    root.fill(&WHITE).map_err(plotting_error)?;
    let body = root
        .titled(&layout.title, (FONT, 22))
        .map_err(plotting_error)?;
    if layout.npanels() == 0 {
        return Ok(());
    }
    for (series, area) in body.split_evenly((layout.npanels(), 1)).iter().enumerate() {
        draw_panel(area, layout, data, style, series)?;
    }
    Ok(())
}

/// Render the figure as an SVG document.
pub fn render_svg(
    layout: &FigureLayout,
    data: &PlotData,
    style: PlotStyle,
) -> Result<String, MobamplotError> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (WIDTH, HEIGHT)).into_drawing_area();
        draw_figure(&root, layout, data, style)?;
        root.present().map_err(plotting_error)?;
    }
    Ok(svg)
}

/// Write the SVG document to `writer`.
pub fn write_svg<W: Write>(
    writer: &mut W,
    layout: &FigureLayout,
    data: &PlotData,
    style: PlotStyle,
) -> Result<(), MobamplotError> {
    writer.write_all(render_svg(layout, data, style)?.as_bytes())?;
    Ok(())
}
