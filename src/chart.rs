//! Screen charts: partition a filtered view by screen and build one
//! concentration/response chart per screen with a shared compound legend.

use std::collections::{BTreeMap, BTreeSet};

use eframe::egui::Color32;
use serde::{Deserialize, Serialize};

use crate::color::ColorMap;
use crate::data::model::{MeasurementTable, ReadOut};

/// Which spread column is drawn as error bars.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorBars {
    #[default]
    Sem,
    Stdev,
    None,
}

impl ErrorBars {
    pub const ALL: [ErrorBars; 3] = [ErrorBars::Sem, ErrorBars::Stdev, ErrorBars::None];

    pub fn label(self) -> &'static str {
        match self {
            ErrorBars::Sem => "SEM",
            ErrorBars::Stdev => "STDEV",
            ErrorBars::None => "None",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChartOptions {
    pub error_bars: ErrorBars,
    /// Plot log10(concentration); non-positive concentrations are skipped.
    pub log_concentration: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartPoint {
    pub x: f64,
    pub y: f64,
    /// Half-height of the error bar, if it should be drawn.
    pub error: Option<f64>,
}

/// Points of one (compound, read-out, measurement) combination in a screen.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub compound: String,
    pub read_out: ReadOut,
    pub measurement_name: String,
    pub color: Color32,
    /// Sorted by `x`.
    pub points: Vec<ChartPoint>,
}

impl ChartSeries {
    /// Hover label; read-out and measurement only when they disambiguate.
    pub fn label(&self, show_read_out: bool, show_measurement: bool) -> String {
        let mut label = self.compound.clone();
        if show_read_out {
            label.push_str(&format!(" · {}", self.read_out));
        }
        if show_measurement {
            label.push_str(&format!(" · {}", self.measurement_name));
        }
        label
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScreenChart {
    pub screen: String,
    pub series: Vec<ChartSeries>,
    /// Legend compounds with no drawable point in this screen.
    pub missing_compounds: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub compound: String,
    pub color: Color32,
}

/// Output of one render pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    /// The selection matched no rows, or none of them can be drawn.
    NoData,
    Charts {
        charts: Vec<ScreenChart>,
        legend: Vec<LegendEntry>,
        /// More than one read-out / measurement name among the rows.
        mixed_read_outs: bool,
        mixed_measurements: bool,
    },
}

type SeriesKey = (usize, ReadOut, usize);

/// Build one chart per screen from `rows` of `table`.
pub fn render(
    table: &MeasurementTable,
    rows: &[usize],
    colors: &ColorMap,
    options: ChartOptions,
) -> Rendered {
    if rows.is_empty() {
        return Rendered::NoData;
    }

    // screen code → series key → points
    let mut screens: BTreeMap<usize, BTreeMap<SeriesKey, Vec<ChartPoint>>> = BTreeMap::new();
    let mut legend_codes: BTreeSet<usize> = BTreeSet::new();
    let mut read_outs: BTreeSet<ReadOut> = BTreeSet::new();
    let mut measurements: BTreeSet<usize> = BTreeSet::new();

    for &row in rows {
        let rec = table.record(row);
        let compound = table.compound.code(row);
        let measurement = table.measurement_name.code(row);
        legend_codes.insert(compound);
        read_outs.insert(rec.read_out);
        measurements.insert(measurement);

        // The screen gets a chart even if none of its rows is drawable.
        let screen = screens.entry(table.screen.code(row)).or_default();

        let x = if options.log_concentration {
            if rec.concentration <= 0.0 {
                continue;
            }
            rec.concentration.log10()
        } else {
            rec.concentration
        };
        if !x.is_finite() || !rec.average.is_finite() {
            continue;
        }
        let error = match options.error_bars {
            ErrorBars::Sem => Some(rec.sem),
            ErrorBars::Stdev => Some(rec.stdev),
            ErrorBars::None => None,
        }
        .filter(|e| e.is_finite());

        screen
            .entry((compound, rec.read_out, measurement))
            .or_default()
            .push(ChartPoint {
                x,
                y: rec.average,
                error,
            });
    }

    if screens.values().all(|series| series.is_empty()) {
        return Rendered::NoData;
    }

    let legend: Vec<LegendEntry> = legend_codes
        .iter()
        .map(|&code| {
            let compound = table.compound.categories()[code].clone();
            let color = colors.color_for(&compound);
            LegendEntry { compound, color }
        })
        .collect();

    let charts = screens
        .into_iter()
        .map(|(screen_code, series_map)| {
            let present: BTreeSet<usize> = series_map.keys().map(|&(c, _, _)| c).collect();
            let missing_compounds = legend_codes
                .iter()
                .filter(|c| !present.contains(c))
                .map(|&c| table.compound.categories()[c].clone())
                .collect();

            let series = series_map
                .into_iter()
                .map(|((compound, read_out, measurement), mut points)| {
                    points.sort_by(|a, b| a.x.total_cmp(&b.x));
                    let compound = table.compound.categories()[compound].clone();
                    ChartSeries {
                        color: colors.color_for(&compound),
                        compound,
                        read_out,
                        measurement_name: table.measurement_name.categories()[measurement]
                            .clone(),
                        points,
                    }
                })
                .collect();

            ScreenChart {
                screen: table.screen.categories()[screen_code].clone(),
                series,
                missing_compounds,
            }
        })
        .collect();

    Rendered::Charts {
        charts,
        legend,
        mixed_read_outs: read_outs.len() > 1,
        mixed_measurements: measurements.len() > 1,
    }
}
