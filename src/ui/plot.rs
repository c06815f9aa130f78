use eframe::egui::{Color32, RichText, Ui};
use egui_plot::{Line, Plot, PlotPoints, Points};

use crate::chart::{LegendEntry, Rendered, ScreenChart};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Screen charts (central panel)
// ---------------------------------------------------------------------------

/// Render the shared legend and one chart per screen.
pub fn screen_charts(ui: &mut Ui, state: &AppState) {
    let Some(view) = &state.view else {
        ui.centered_and_justified(|ui: &mut Ui| {
            let text = if state.status_message.is_some() {
                "Could not load data. Open another file  (File → Open…)"
            } else {
                "Open a file to view screens  (File → Open…)"
            };
            ui.heading(text);
        });
        return;
    };

    let (charts, legend, mixed_read_outs, mixed_measurements) = match &view.rendered {
        Rendered::NoData => {
            ui.add_space(24.0);
            ui.vertical_centered(|ui: &mut Ui| {
                ui.heading("No matching data");
                ui.label("Nothing to plot for the current selection. Adjust the filters on the left.");
            });
            return;
        }
        Rendered::Charts {
            charts,
            legend,
            mixed_read_outs,
            mixed_measurements,
        } => (charts, legend, *mixed_read_outs, *mixed_measurements),
    };

    shared_legend(ui, legend);
    ui.add_space(4.0);

    let per_row = state.charts_per_row.max(1);
    for row in charts.chunks(per_row) {
        ui.columns(per_row, |cols: &mut [Ui]| {
            for (col, chart) in cols.iter_mut().zip(row) {
                screen_chart(
                    col,
                    chart,
                    state.chart_height,
                    state.chart_options.log_concentration,
                    mixed_read_outs,
                    mixed_measurements,
                );
            }
        });
        ui.add_space(8.0);
    }
}

/// One legend for every chart: compound → colour.
fn shared_legend(ui: &mut Ui, legend: &[LegendEntry]) {
    ui.horizontal_wrapped(|ui: &mut Ui| {
        ui.strong("Compounds:");
        for entry in legend {
            ui.label(RichText::new("■").color(entry.color));
            ui.label(&entry.compound);
            ui.add_space(8.0);
        }
    });
}

fn screen_chart(
    ui: &mut Ui,
    chart: &ScreenChart,
    height: f32,
    log_x: bool,
    show_read_out: bool,
    show_measurement: bool,
) {
    ui.strong(format!("Screen {}", chart.screen));
    if !chart.missing_compounds.is_empty() {
        ui.label(
            RichText::new(format!("no data for: {}", chart.missing_compounds.join(", ")))
                .small()
                .weak(),
        );
    }

    let x_label = if log_x {
        "log₁₀ concentration"
    } else {
        "concentration"
    };

    Plot::new(("screen_plot", &chart.screen))
        .height(height)
        .x_axis_label(x_label)
        .y_axis_label("average")
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(false)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for series in &chart.series {
                let name = series.label(show_read_out, show_measurement);
                let xy: Vec<[f64; 2]> = series.points.iter().map(|p| [p.x, p.y]).collect();

                plot_ui.line(
                    Line::new(PlotPoints::from(xy.clone()))
                        .name(&name)
                        .color(series.color)
                        .width(1.5),
                );
                plot_ui.points(
                    Points::new(PlotPoints::from(xy))
                        .name(&name)
                        .color(series.color)
                        .radius(3.0),
                );

                for p in &series.points {
                    let Some(err) = p.error else { continue };
                    let bar: PlotPoints = vec![[p.x, p.y - err], [p.x, p.y + err]].into();
                    plot_ui.line(
                        Line::new(bar)
                            .name(&name)
                            .color(fade(series.color))
                            .width(1.0),
                    );
                }
            }
        });
}

/// Error bars are drawn slightly transparent.
fn fade(c: Color32) -> Color32 {
    Color32::from_rgba_unmultiplied(c.r(), c.g(), c.b(), 160)
}
