//! Chart templates rendered to standalone HTML with plotly.

use std::fs;
use std::path::Path;

use plotly::common::{ErrorData, ErrorType, Mode, Title};
use plotly::layout::{Axis, Layout};
use plotly::{Bar, Plot, Scatter};
use serde::Serialize;
use tracing::debug;

use crate::error::ReportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    /// Lines with markers; error bars when a series carries them.
    Lines,
    Bars,
}

#[derive(Debug, Clone, PartialEq)]
pub enum XValues {
    Numeric(Vec<f64>),
    Labels(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub x: XValues,
    pub y: Vec<f64>,
    pub error: Option<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub kind: ChartKind,
    pub series: Vec<Series>,
}

pub fn build_plot(chart: &Chart) -> Plot {
    let mut plot = Plot::new();
    for series in &chart.series {
        match (chart.kind, &series.x) {
            (ChartKind::Lines, XValues::Numeric(x)) => {
                plot.add_trace(line_trace(x.clone(), series));
            }
            (ChartKind::Lines, XValues::Labels(x)) => {
                plot.add_trace(line_trace(x.clone(), series));
            }
            (ChartKind::Bars, x) => {
                let trace = Bar::new(labels(x), series.y.clone()).name(series.name.as_str());
                plot.add_trace(trace);
            }
        }
    }
    let layout = Layout::new()
        .title(Title::from(chart.title.as_str()))
        .x_axis(Axis::new().title(Title::from(chart.x_label.as_str())))
        .y_axis(Axis::new().title(Title::from(chart.y_label.as_str())));
    plot.set_layout(layout);
    plot
}

/// Lines with markers. Labelled x values give a categorical axis.
fn line_trace<X>(x: Vec<X>, series: &Series) -> Box<Scatter<X, f64>>
where
    X: Serialize + Clone + 'static,
{
    let trace = Scatter::new(x, series.y.clone())
        .mode(Mode::LinesMarkers)
        .name(series.name.as_str());
    match &series.error {
        Some(error) => trace.error_y(ErrorData::new(ErrorType::Data).array(error.clone())),
        None => trace,
    }
}

fn labels(x: &XValues) -> Vec<String> {
    match x {
        XValues::Numeric(values) => values.iter().map(|v| v.to_string()).collect(),
        XValues::Labels(labels) => labels.clone(),
    }
}

pub fn write_chart(chart: &Chart, path: &Path) -> Result<(), ReportError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ReportError::io(parent, source))?;
    }
    debug!(path = %path.display(), series = chart.series.len(), "writing chart");
    let html = build_plot(chart).to_html();
    fs::write(path, html).map_err(|source| ReportError::io(path, source))
}
