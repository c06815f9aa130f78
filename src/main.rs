mod app;
mod chart;
mod color;
mod config;
mod data;
mod state;
mod ui;

use app::DashboardApp;
use config::DashboardConfig;
use eframe::egui;
use state::AppState;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = DashboardConfig::from_env()?;
    log::info!("Configuration: {config:?}");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([640.0, 420.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Compound Screen Dashboard",
        options,
        Box::new(move |_cc| Ok(Box::new(DashboardApp::new(AppState::new(config))))),
    )
    .map_err(|e| anyhow::anyhow!("running UI: {e}"))
}
