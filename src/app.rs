use eframe::egui::{self, ScrollArea, Ui};

use crate::state::AppState;
use crate::ui::{panels, plot, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct DashboardApp {
    pub state: AppState,
}

impl DashboardApp {
    /// Build the app and try the configured data file once.
    pub fn new(mut state: AppState) -> Self {
        let path = state.config.data_path.clone();
        if state.open(&path).is_err() {
            log::warn!(
                "Starting without data; use File → Open… (tried {})",
                path.display()
            );
        }
        Self { state }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: charts, summary, preview ----
        egui::CentralPanel::default().show(ctx, |ui| {
            if self.state.view.is_none() {
                plot::screen_charts(ui, &self.state);
                return;
            }
            ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui: &mut Ui| {
                    ui.heading("Compound Screens");
                    ui.separator();
                    plot::screen_charts(ui, &self.state);

                    ui.separator();
                    if let Some(view) = &self.state.view {
                        table::data_summary(ui, &view.summary);
                    }

                    ui.separator();
                    table::data_preview(ui, &mut self.state);
                });
        });
    }
}
