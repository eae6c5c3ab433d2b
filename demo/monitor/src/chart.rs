//! Exposure profile chart model.
//!
//! The chart object is created once, on the first non-empty exposure series,
//! and afterwards updated in place so that state held by the plotting layer
//! (zoom, animation) survives refreshes.

use crate::format::{format_axis_tick, format_year_label};
use crate::model::ExposureTimeSeries;
use serde::Serialize;

/// Fixed styling of one plotted series
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesStyle {
    pub label: &'static str,
    pub border_color: &'static str,
    pub background_color: &'static str,
    pub fill: bool,
    pub tension: f64,
}

/// PFE, EE, EPE, ENE, in plotting order
pub const SERIES_STYLES: [SeriesStyle; 4] = [
    SeriesStyle {
        label: "PFE (95%)",
        border_color: "#f59e0b",
        background_color: "rgba(245, 158, 11, 0.1)",
        fill: false,
        tension: 0.4,
    },
    SeriesStyle {
        label: "EE",
        border_color: "#0ea5e9",
        background_color: "rgba(14, 165, 233, 0.1)",
        fill: false,
        tension: 0.4,
    },
    SeriesStyle {
        label: "EPE",
        border_color: "#22c55e",
        background_color: "rgba(34, 197, 94, 0.1)",
        fill: false,
        tension: 0.4,
    },
    SeriesStyle {
        label: "ENE",
        border_color: "#ef4444",
        background_color: "rgba(239, 68, 68, 0.1)",
        fill: false,
        tension: 0.4,
    },
];

/// Whether an update built the chart or refreshed it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartAction {
    Created,
    Updated,
}

/// Tick budget of the value axis
pub const MAX_VALUE_TICKS: usize = 11;

/// One value-axis tick and its abbreviated label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueTick {
    pub value: f64,
    pub label: String,
}

/// Chart payload sent across the render boundary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartUpdate {
    pub action: ChartAction,
    pub labels: Vec<String>,
    pub pfe: Vec<f64>,
    pub ee: Vec<f64>,
    pub epe: Vec<f64>,
    pub ene: Vec<f64>,
    pub value_ticks: Vec<ValueTick>,
}

/// One plotted series
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub style: SeriesStyle,
    pub values: Vec<f64>,
}

/// The renderable chart: four series over one shared label axis
#[derive(Debug, Clone, PartialEq)]
pub struct ExposureChart {
    labels: Vec<String>,
    series: [ChartSeries; 4],
}

impl ExposureChart {
    fn new(data: ChartData) -> Self {
        let [pfe, ee, epe, ene] = data.values;
        let [pfe_style, ee_style, epe_style, ene_style] = SERIES_STYLES;
        Self {
            labels: data.labels,
            series: [
                ChartSeries { style: pfe_style, values: pfe },
                ChartSeries { style: ee_style, values: ee },
                ChartSeries { style: epe_style, values: epe },
                ChartSeries { style: ene_style, values: ene },
            ],
        }
    }

    fn replace_data(&mut self, data: ChartData) {
        self.labels = data.labels;
        for (series, values) in self.series.iter_mut().zip(data.values) {
            series.values = values;
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn series(&self) -> &[ChartSeries; 4] {
        &self.series
    }

    /// Lowest and highest plotted value across all four series
    pub fn data_range(&self) -> Option<[f64; 2]> {
        self.series
            .iter()
            .flat_map(|series| series.values.iter().copied())
            .fold(None, |range, value| match range {
                None => Some([value, value]),
                Some([min, max]) => Some([min.min(value), max.max(value)]),
            })
    }

    /// Auto-scaled value axis: at most `max_ticks` ticks on round steps
    /// enclosing [`Self::data_range`]
    pub fn value_axis(&self, max_ticks: usize) -> Vec<ValueTick> {
        let Some([min, max]) = self.data_range() else {
            return Vec::new();
        };
        nice_ticks(min, max, max_ticks)
            .into_iter()
            .map(|value| ValueTick {
                value,
                label: format_axis_tick(value),
            })
            .collect()
    }

    fn to_update(&self, action: ChartAction) -> ChartUpdate {
        let [pfe, ee, epe, ene] = &self.series;
        ChartUpdate {
            action,
            labels: self.labels.clone(),
            pfe: pfe.values.clone(),
            ee: ee.values.clone(),
            epe: epe.values.clone(),
            ene: ene.values.clone(),
            value_ticks: self.value_axis(MAX_VALUE_TICKS),
        }
    }
}

/// Tick values on the round step covering `(max - min) / (max_ticks - 1)`
fn nice_ticks(min: f64, max: f64, max_ticks: usize) -> Vec<f64> {
    let (min, max) = if min == max {
        let offset = if max == 0.0 { 1.0 } else { (max * 0.05).abs() };
        (min - offset, max + offset)
    } else {
        (min, max)
    };
    let max_spaces = max_ticks.max(2) as f64 - 1.0;

    let mut spacing = nice_step((max - min) / max_spaces);
    let spaces = (max / spacing).ceil() - (min / spacing).floor();
    if spaces > max_spaces {
        spacing = nice_step(spaces * spacing / max_spaces);
    }

    let first = (min / spacing).floor() as i64;
    let last = (max / spacing).ceil() as i64;
    // Fractional steps carry representation noise, e.g. 3 * 0.2
    let precision = 10f64.powi((-spacing.log10().floor()).max(0.0) as i32);
    (first..=last)
        .map(|step| (step as f64 * spacing * precision).round() / precision)
        .collect()
}

/// Round `range` up to 1, 2, 5 or 10 times a power of ten
fn nice_step(range: f64) -> f64 {
    let rounded = range.round();
    let range = if (range - rounded).abs() <= range / 1000.0 {
        rounded
    } else {
        range
    };
    let magnitude = 10f64.powf(range.log10().floor());
    let fraction = range / magnitude;
    let nice = if fraction <= 1.0 {
        1.0
    } else if fraction <= 2.0 {
        2.0
    } else if fraction <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

/// Axis labels and the four value vectors, extracted in one pass
struct ChartData {
    labels: Vec<String>,
    values: [Vec<f64>; 4],
}

impl From<&ExposureTimeSeries> for ChartData {
    fn from(series: &ExposureTimeSeries) -> Self {
        let n = series.len();
        let mut labels = Vec::with_capacity(n);
        let mut values: [Vec<f64>; 4] = std::array::from_fn(|_| Vec::with_capacity(n));
        for point in series.points() {
            labels.push(format_year_label(point.time));
            values[0].push(point.pfe);
            values[1].push(point.ee);
            values[2].push(point.epe);
            values[3].push(point.ene);
        }
        Self { labels, values }
    }
}

/// Owner of the single exposure chart object
#[derive(Debug, Default)]
pub struct ChartSeriesModel {
    chart: Option<ExposureChart>,
    redraws: u64,
    creations: u32,
}

impl ChartSeriesModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a new exposure series.
    ///
    /// Returns `None` only when no chart exists yet and the series is empty.
    /// Otherwise the chart is created or updated in place and one redraw is
    /// issued.
    pub fn apply(&mut self, series: &ExposureTimeSeries) -> Option<ChartUpdate> {
        let data = ChartData::from(series);
        let action = match self.chart.as_mut() {
            Some(chart) => {
                chart.replace_data(data);
                ChartAction::Updated
            }
            None if series.is_empty() => return None,
            None => {
                self.chart = Some(ExposureChart::new(data));
                self.creations += 1;
                ChartAction::Created
            }
        };
        self.redraws += 1;
        self.chart.as_ref().map(|chart| chart.to_update(action))
    }

    pub fn chart(&self) -> Option<&ExposureChart> {
        self.chart.as_ref()
    }

    pub fn redraws(&self) -> u64 {
        self.redraws
    }

    /// Times the chart object was built; stays at 1 once created
    pub fn creations(&self) -> u32 {
        self.creations
    }
}
