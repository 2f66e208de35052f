//! Interactive figures: a plotly.js figure embedded in a standalone HTML page.

use serde_json::{json, Value};
use std::io::Write;

use super::figure::FigureLayout;
use super::PlotStyle;
use crate::data::binning::PlotData;
use crate::error::MobamplotError;
use crate::Position;

pub const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// Trace color, as used for every panel.
pub const TRACE_COLOR: &str = "#0000ff";

/// Bin sizes offered by the histogram slider.
pub fn slider_bin_sizes() -> Vec<Position> {
    (10..200).step_by(10).collect()
}

/// Axis names of panel `index` (1-based), e.g. `("x2", "y2")`.
fn axis_refs(index: usize) -> (String, String) {
    if index == 1 {
        ("x".to_string(), "y".to_string())
    } else {
        (format!("x{}", index), format!("y{}", index))
    }
}

/// Layout keys of panel `index` (1-based), e.g. `("xaxis2", "yaxis2")`.
fn axis_keys(index: usize) -> (String, String) {
    if index == 1 {
        ("xaxis".to_string(), "yaxis".to_string())
    } else {
        (format!("xaxis{}", index), format!("yaxis{}", index))
    }
}

fn histogram_trace(data: &PlotData, series: usize, index: usize, binsize: Position) -> Value {
    let (xref, yref) = axis_refs(index);
    let start = data.edges.first().map_or(0, |e| e.0);
    let end = data.edges.last().map_or(0, |e| e.1.saturating_sub(1));
    json!({
        "type": "histogram",
        "x": data.x,
        "y": data.series[series].y,
        "histfunc": "avg",
        "autobinx": false,
        "xbins": { "start": start, "end": end, "size": binsize },
        "name": data.series[series].sample_id,
        "xaxis": xref,
        "yaxis": yref,
        "marker": { "color": TRACE_COLOR },
    })
}

fn line_trace(data: &PlotData, series: usize, index: usize) -> Value {
    let (xref, yref) = axis_refs(index);
    json!({
        "type": "scatter",
        "x": data.x,
        "y": data.series[series].y,
        "fill": "tozeroy",
        "fillcolor": TRACE_COLOR,
        "mode": "lines",
        "opacity": 1,
        "line": { "color": TRACE_COLOR, "shape": "linear" },
        "name": data.series[series].sample_id,
        "xaxis": xref,
        "yaxis": yref,
    })
}

fn slider() -> Value {
    let steps: Vec<Value> = slider_bin_sizes()
        .into_iter()
        .map(|size| {
            json!({
                "method": "restyle",
                "args": ["xbins.size", size],
                "label": size.to_string(),
            })
        })
        .collect();
    json!([{
        "currentvalue": { "prefix": "Bin Size: " },
        "pad": { "t": 15 },
        "steps": steps,
    }])
}

/// Build the plotly figure (`{"data": [...], "layout": {...}}`).
pub fn figure_json(
    layout: &FigureLayout,
    data: &PlotData,
    style: PlotStyle,
    binsize: Position,
) -> Value {
    let npanels = data.series.len();
    let traces: Vec<Value> = (0..npanels)
        .map(|i| match style {
            PlotStyle::Histogram => histogram_trace(data, i, i + 1, binsize),
            PlotStyle::Line => line_trace(data, i, i + 1),
        })
        .collect();

    let x_axis = json!({
        "range": [layout.x_range.0, layout.x_range.1],
        "showline": true,
        "tickmode": "array",
        "tickvals": layout.x_ticks.iter().map(|t| t.value).collect::<Vec<_>>(),
        "ticktext": layout.x_ticks.iter().map(|t| t.label.as_str()).collect::<Vec<_>>(),
        "ticks": "outside",
        "zeroline": true,
        "zerolinewidth": 2,
        "mirror": true,
    });
    let y_axis = json!({
        "title": { "text": "Reads" },
        "range": [0.0, layout.y_max],
        "tick0": 0,
        "dtick": layout.y_dtick,
        "ticks": "outside",
        "showgrid": false,
        "showline": true,
        "zeroline": true,
        "zerolinewidth": 2,
        "mirror": true,
    });

    let mut plot_layout = json!({
        "title": { "text": layout.title, "font": { "size": 18 } },
        "showlegend": false,
        "autosize": true,
        "legend": { "bordercolor": "rgba(0,0,0,1)", "orientation": "h" },
        "grid": {
            "rows": npanels,
            "columns": 1,
            "pattern": "independent",
            "roworder": "top to bottom",
            "ygap": 0.25,
        },
    });

    let bar = &layout.scale_bar;
    let mut shapes = Vec::with_capacity(npanels);
    let mut annotations = Vec::with_capacity(2 * npanels);
    if let Value::Object(map) = &mut plot_layout {
        for index in 1..=npanels {
            let (xkey, ykey) = axis_keys(index);
            let (xref, yref) = axis_refs(index);
            map.insert(xkey, x_axis.clone());
            map.insert(ykey, y_axis.clone());

            shapes.push(json!({
                "type": "rect",
                "layer": "above",
                "xref": xref,
                "yref": yref,
                "x0": bar.x0,
                "x1": bar.x1,
                "y0": bar.y0,
                "y1": bar.y1,
                "fillcolor": "rgba(0,0,0,1)",
            }));
            annotations.push(json!({
                "text": bar.label,
                "x": bar.label_x,
                "y": bar.label_y,
                "xref": xref,
                "yref": yref,
                "showarrow": false,
                "xanchor": "center",
                "yanchor": "bottom",
            }));
            if style == PlotStyle::Histogram {
                annotations.push(json!({
                    "text": layout.panel_titles[index - 1],
                    "x": 0.5,
                    "y": 1.0,
                    "xref": format!("{} domain", xref),
                    "yref": format!("{} domain", yref),
                    "showarrow": false,
                    "xanchor": "center",
                    "yanchor": "bottom",
                }));
            }
        }
        map.insert("shapes".to_string(), Value::Array(shapes));
        map.insert("annotations".to_string(), Value::Array(annotations));
        if style == PlotStyle::Histogram {
            map.insert("sliders".to_string(), slider());
        }
    }

    json!({ "data": traces, "layout": plot_layout })
}

/// Write `figure` as a standalone HTML page that loads plotly.js.
pub fn write_html<W: Write>(
    writer: &mut W,
    title: &str,
    figure: &Value,
) -> Result<(), MobamplotError> {
    // keep "</script>" in labels from closing the script element
    let json = serde_json::to_string(figure)?.replace("</", "<\\/");
    writeln!(writer, "<!DOCTYPE html>")?;
    writeln!(writer, "<html>")?;
    writeln!(writer, "<head>")?;
    writeln!(writer, "<meta charset=\"utf-8\">")?;
    writeln!(writer, "<title>{}</title>", super::escape_markup(title))?;
    writeln!(writer, "<script src=\"{}\"></script>", PLOTLY_CDN)?;
    writeln!(writer, "</head>")?;
    writeln!(writer, "<body>")?;
    writeln!(
        writer,
        "<div id=\"figure\" style=\"width:100%;height:100vh;\"></div>"
    )?;
    writeln!(writer, "<script>")?;
    writeln!(writer, "var figure = {};", json)?;
    writeln!(
        writer,
        "Plotly.newPlot(\"figure\", figure.data, figure.layout, {{responsive: true}});"
    )?;
    writeln!(writer, "</script>")?;
    writeln!(writer, "</body>")?;
    writeln!(writer, "</html>")?;
    Ok(())
}
