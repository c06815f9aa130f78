use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::chart::{ChartOptions, ErrorBars};
use crate::data::model::ReadOut;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter and appearance widgets
// ---------------------------------------------------------------------------

/// Render the left control panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Dashboard Controls");
    ui.separator();

    let Some(ds) = &state.dataset else {
        ui.label("No dataset loaded.");
        return;
    };

    // Clone what we need so we can mutate state inside the loop.
    let table = ds.table();
    let read_outs = table.read_outs();
    let compounds: Vec<(String, Color32)> = table
        .compound
        .categories()
        .iter()
        .map(|c| (c.clone(), ds.colors.color_for(c)))
        .collect();
    let measurement_names = table.measurement_name.categories().to_vec();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Read-out ----
            ui.strong("Read-out");
            let current_read_out = state
                .filters
                .read_outs
                .as_ref()
                .and_then(|set| set.iter().next().copied());
            egui::ComboBox::from_id_salt("read_out")
                .selected_text(current_read_out.map_or("All", ReadOut::as_str))
                .show_ui(ui, |ui: &mut Ui| {
                    if ui.selectable_label(current_read_out.is_none(), "All").clicked() {
                        state.set_read_out(None);
                    }
                    for r in &read_outs {
                        if ui
                            .selectable_label(current_read_out == Some(*r), r.as_str())
                            .clicked()
                        {
                            state.set_read_out(Some(*r));
                        }
                    }
                });
            ui.add_space(6.0);

            // ---- Measurement ----
            ui.strong("Measurement");
            let current_name = state
                .filters
                .measurement_names
                .as_ref()
                .and_then(|set| set.iter().next().cloned());
            egui::ComboBox::from_id_salt("measurement_name")
                .selected_text(current_name.as_deref().unwrap_or("All"))
                .show_ui(ui, |ui: &mut Ui| {
                    if ui.selectable_label(current_name.is_none(), "All").clicked() {
                        state.set_measurement_name(None);
                    }
                    for name in &measurement_names {
                        if ui
                            .selectable_label(current_name.as_ref() == Some(name), name)
                            .clicked()
                        {
                            state.set_measurement_name(Some(name.clone()));
                        }
                    }
                });
            ui.separator();

            // ---- Compounds (multiselect) ----
            let n_selected = compounds
                .iter()
                .filter(|(c, _)| state.compound_selected(c))
                .count();
            let header_text = format!("Compounds  ({n_selected}/{})", compounds.len());
            egui::CollapsingHeader::new(RichText::new(header_text).strong())
                .id_salt("compounds")
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    ui.horizontal(|ui: &mut Ui| {
                        if ui.small_button("All").clicked() {
                            state.select_all_compounds();
                        }
                        if ui.small_button("None").clicked() {
                            state.select_no_compounds();
                        }
                    });

                    for (compound, color) in &compounds {
                        let mut checked = state.compound_selected(compound);
                        let text = RichText::new(compound).color(*color);
                        if ui.checkbox(&mut checked, text).changed() {
                            state.toggle_compound(compound);
                        }
                    }
                });
            ui.separator();

            appearance(ui, state);
        });
}

/// Error bars, axis scale and layout controls.
fn appearance(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Appearance");

    let mut options: ChartOptions = state.chart_options;
    egui::ComboBox::from_label("Error bars")
        .selected_text(options.error_bars.label())
        .show_ui(ui, |ui: &mut Ui| {
            for kind in ErrorBars::ALL {
                ui.selectable_value(&mut options.error_bars, kind, kind.label());
            }
        });
    ui.checkbox(&mut options.log_concentration, "Log₁₀ concentration");
    state.set_chart_options(options);

    ui.add(egui::Slider::new(&mut state.chart_height, 150.0..=800.0).text("Chart height"));
    ui.add(egui::Slider::new(&mut state.charts_per_row, 1..=4).text("Charts per row"));
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui
                .add_enabled(state.dataset.is_some(), egui::Button::new("Reload"))
                .clicked()
            {
                if let Err(e) = state.reload() {
                    log::debug!("reload failed: {e}");
                }
                ui.close_menu();
            }
        });

        ui.separator();

        if let (Some(ds), Some(view)) = (&state.dataset, &state.view) {
            ui.label(format!(
                "{} rows loaded, {} visible",
                ds.table().len(),
                view.rows.len()
            ));
            ui.separator();
            ui.label(RichText::new(ds.path.display().to_string()).weak());
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open screen data")
        .add_filter("Supported files", &["csv", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        if let Err(e) = state.open(&path) {
            log::debug!("open of {} failed: {e}", path.display());
        }
    }
}
