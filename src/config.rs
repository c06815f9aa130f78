//! Dashboard configuration.
//!
//! Values come from an optional `dashboard.json` (or the file named by
//! `DASHBOARD_CONFIG`). Every field has a default, so a missing file or a
//! partial file is fine. The data path can be overridden by the first
//! command-line argument or by `DASHBOARD_DATA`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::chart::ErrorBars;

pub const CONFIG_ENV: &str = "DASHBOARD_CONFIG";
pub const DATA_ENV: &str = "DASHBOARD_DATA";
pub const DEFAULT_CONFIG_FILE: &str = "dashboard.json";
pub const DEFAULT_DATA_FILE: &str = "data/screens.csv";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Data file opened at startup.
    pub data_path: PathBuf,

    /// Compound pre-selected after a load, when the data has it.
    pub default_compound: String,

    pub error_bars: ErrorBars,

    pub log_concentration: bool,

    /// Height of each screen chart in points.
    pub chart_height: f32,

    pub charts_per_row: usize,

    /// Raw-data preview page size (10, 25, 50 or 100).
    pub rows_per_page: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_FILE),
            default_compound: "Levosimendan".to_string(),
            error_bars: ErrorBars::Sem,
            log_concentration: false,
            chart_height: 320.0,
            charts_per_row: 2,
            rows_per_page: 25,
        }
    }
}

impl DashboardConfig {
    /// Parse a JSON config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config.sanitized())
    }

    /// Resolve the effective configuration.
    ///
    /// Precedence for the data path: `cli_path`, then `DASHBOARD_DATA`, then
    /// the config file, then the built-in default.
    pub fn resolve(
        cli_path: Option<PathBuf>,
        config_env: Option<String>,
        data_env: Option<String>,
    ) -> Result<Self> {
        let mut config = match config_env {
            Some(file) => Self::from_file(Path::new(&file))?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        if let Some(path) = data_env.filter(|p| !p.is_empty()) {
            config.data_path = PathBuf::from(path);
        }
        if let Some(path) = cli_path {
            config.data_path = path;
        }
        Ok(config)
    }

    /// Read process arguments and environment.
    pub fn from_env() -> Result<Self> {
        Self::resolve(
            std::env::args_os().nth(1).map(PathBuf::from),
            std::env::var(CONFIG_ENV).ok(),
            std::env::var(DATA_ENV).ok(),
        )
    }

    fn sanitized(mut self) -> Self {
        self.chart_height = self.chart_height.clamp(150.0, 1200.0);
        self.charts_per_row = self.charts_per_row.clamp(1, 4);
        if !crate::data::summary::ROWS_PER_PAGE_CHOICES.contains(&self.rows_per_page) {
            log::warn!(
                "rows_per_page {} not one of {:?}, using 25",
                self.rows_per_page,
                crate::data::summary::ROWS_PER_PAGE_CHOICES
            );
            self.rows_per_page = 25;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_json(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let file = write_json(r#"{ "default_compound": "Dofetilide", "error_bars": "stdev" }"#);
        let config = DashboardConfig::from_file(file.path()).unwrap();

        assert_eq!(config.default_compound, "Dofetilide");
        assert_eq!(config.error_bars, ErrorBars::Stdev);
        assert_eq!(config.data_path, PathBuf::from(DEFAULT_DATA_FILE));
        assert_eq!(config.rows_per_page, 25);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let file = write_json(r#"{ "charts_per_row": 12, "rows_per_page": 7, "chart_height": 5.0 }"#);
        let config = DashboardConfig::from_file(file.path()).unwrap();
        assert_eq!(config.charts_per_row, 4);
        assert_eq!(config.rows_per_page, 25);
        assert_eq!(config.chart_height, 150.0);
    }

    #[test]
    fn invalid_json_is_an_error() {
        let file = write_json("{ not json");
        let err = DashboardConfig::from_file(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("parsing config"));
    }

    #[test]
    fn data_path_precedence() {
        let file = write_json(r#"{ "data_path": "from_file.csv" }"#);
        let config_env = Some(file.path().to_string_lossy().into_owned());

        let from_file = DashboardConfig::resolve(None, config_env.clone(), None).unwrap();
        assert_eq!(from_file.data_path, PathBuf::from("from_file.csv"));

        let from_env =
            DashboardConfig::resolve(None, config_env.clone(), Some("env.csv".into())).unwrap();
        assert_eq!(from_env.data_path, PathBuf::from("env.csv"));

        let from_cli = DashboardConfig::resolve(
            Some(PathBuf::from("cli.csv")),
            config_env,
            Some("env.csv".into()),
        )
        .unwrap();
        assert_eq!(from_cli.data_path, PathBuf::from("cli.csv"));
    }
}
