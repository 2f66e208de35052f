//! Figure geometry shared by the HTML and SVG renderers.

use crate::data::binning::PlotData;
use crate::store::StoredRoi;
use crate::{Position, PositionOffset};

/// Padding on either side of the region on the x axis, in basepairs.
pub const AXIS_PADDING: PositionOffset = 300;

/// Length of the scale bar, in basepairs.
pub const SCALE_BAR_LENGTH: PositionOffset = 1000;

/// The number of y axis tick steps between zero and the axis maximum.
pub const Y_TICK_STEPS: f64 = 20.0;

/// The y axis maximum when every value is zero.
pub const MIN_Y_MAX: f64 = 0.5;

#[derive(Clone, Debug, PartialEq)]
pub struct AxisTick {
    pub value: Position,
    pub label: String,
}

/// The 1kb bar drawn in the upper right of every panel.
#[derive(Clone, Debug, PartialEq)]
pub struct ScaleBar {
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
    pub label: String,
    pub label_x: f64,
    pub label_y: f64,
}

/// Layout of a figure with one panel per sample.
#[derive(Clone, Debug, PartialEq)]
pub struct FigureLayout {
    pub title: String,
    pub x_range: (f64, f64),
    pub y_max: f64,
    pub y_dtick: f64,
    pub x_ticks: Vec<AxisTick>,
    pub scale_bar: ScaleBar,
    pub panel_titles: Vec<String>,
}

/// Round `max` up to the nearest 0.5.
pub fn y_axis_max(max: f64) -> f64 {
    let y_max = 0.5 * (2.0 * max).ceil();
    if y_max > 0.0 {
        y_max
    } else {
        MIN_Y_MAX
    }
}

impl FigureLayout {
    pub fn new(stored: &StoredRoi, data: &PlotData) -> Self {
        let start = stored.start as PositionOffset;
        let end = stored.end as PositionOffset;
        let y_max = y_axis_max(data.max_y());

        let x_ticks = [stored.start, stored.end]
            .into_iter()
            .map(|value| AxisTick {
                value,
                label: format!("{}: {}", stored.seqname, value),
            })
            .collect();

        let scale_bar = ScaleBar {
            x0: (end - SCALE_BAR_LENGTH) as f64,
            x1: end as f64,
            y0: y_max * 0.903,
            y1: y_max * 0.923,
            label: "1kb".to_string(),
            label_x: (end - SCALE_BAR_LENGTH / 2) as f64,
            label_y: y_max * 0.923,
        };

        Self {
            title: format!("Gene: {}", stored.name),
            x_range: ((start - AXIS_PADDING) as f64, (end + AXIS_PADDING) as f64),
            y_max,
            y_dtick: y_max / Y_TICK_STEPS,
            x_ticks,
            scale_bar,
            panel_titles: data.series.iter().map(|s| s.sample_id.clone()).collect(),
        }
    }

    pub fn npanels(&self) -> usize {
        self.panel_titles.len()
    }
}
