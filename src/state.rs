use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::chart::{self, ChartOptions, Rendered};
use crate::color::ColorMap;
use crate::config::DashboardConfig;
use crate::data::error::DataLoadError;
use crate::data::filter::{FilterCache, FilterSpec};
use crate::data::loader::DatasetCache;
use crate::data::model::{MeasurementTable, ReadOut};
use crate::data::summary::ViewSummary;

// ---------------------------------------------------------------------------
// Loaded dataset and its derived views
// ---------------------------------------------------------------------------

/// A ready dataset: the shared table plus everything derived from it.
pub struct LoadedDataset {
    pub path: PathBuf,
    pub filters: FilterCache,
    pub colors: ColorMap,
}

impl LoadedDataset {
    fn new(path: PathBuf, table: Arc<MeasurementTable>) -> Self {
        Self {
            path,
            colors: ColorMap::for_compounds(&table),
            filters: FilterCache::new(table),
        }
    }

    pub fn table(&self) -> &MeasurementTable {
        self.filters.table()
    }
}

/// Result of the last filter → render pass.
pub struct View {
    pub rows: Arc<[usize]>,
    pub rendered: Rendered,
    pub summary: ViewSummary,
}

/// Raw-data preview controls.
#[derive(Debug, Clone)]
pub struct PreviewState {
    pub visible: bool,
    pub search: String,
    pub rows_per_page: usize,
    /// 1-based.
    pub page: usize,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
///
/// `dataset == None` is the "awaiting load" state; once a table is loaded
/// every control change recomputes `view` from the cached table.
pub struct AppState {
    pub config: DashboardConfig,

    cache: DatasetCache,

    /// Loaded dataset (None until a file loads successfully).
    pub dataset: Option<LoadedDataset>,

    /// Current selection.
    pub filters: FilterSpec,

    pub chart_options: ChartOptions,

    pub chart_height: f32,
    pub charts_per_row: usize,

    pub preview: PreviewState,

    /// Derived from `dataset` + `filters` + `chart_options`.
    pub view: Option<View>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            chart_options: ChartOptions {
                error_bars: config.error_bars,
                log_concentration: config.log_concentration,
            },
            chart_height: config.chart_height,
            charts_per_row: config.charts_per_row,
            preview: PreviewState {
                visible: false,
                search: String::new(),
                rows_per_page: config.rows_per_page,
                page: 1,
            },
            config,
            cache: DatasetCache::default(),
            dataset: None,
            filters: FilterSpec::default(),
            view: None,
            status_message: None,
        }
    }

    /// Load `path` through the cache and make it the active dataset.
    ///
    /// On failure the previous dataset (if any) is dropped and the error is
    /// kept in `status_message`.
    pub fn open(&mut self, path: &Path) -> Result<(), DataLoadError> {
        match self.cache.get_or_load(path) {
            Ok(table) => {
                self.filters = FilterSpec::initial(&table, &self.config.default_compound);
                self.dataset = Some(LoadedDataset::new(path.to_path_buf(), table));
                self.preview.page = 1;
                self.status_message = None;
                self.recompute();
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to load data: {e}");
                self.status_message = Some(format!("Error: {e}"));
                self.dataset = None;
                self.view = None;
                Err(e)
            }
        }
    }

    /// Re-read the active file from disk.
    pub fn reload(&mut self) -> Result<(), DataLoadError> {
        let Some(path) = self.dataset.as_ref().map(|d| d.path.clone()) else {
            return Ok(());
        };
        self.cache.invalidate(&path);
        self.open(&path)
    }

    /// Rerun filter → render after any control change.
    pub fn recompute(&mut self) {
        let Some(ds) = &mut self.dataset else {
            self.view = None;
            return;
        };
        let rows = ds.filters.rows(&self.filters);
        log::debug!("{} distinct selections cached", ds.filters.len());
        let table = ds.filters.table();
        let rendered = chart::render(table, &rows, &ds.colors, self.chart_options);
        let summary = ViewSummary::of(table, &rows);
        self.view = Some(View {
            rows,
            rendered,
            summary,
        });
    }

    // -- Filter mutations --

    pub fn set_read_out(&mut self, read_out: Option<ReadOut>) {
        self.filters.read_outs = read_out.map(|r| BTreeSet::from([r]));
        self.recompute();
    }

    pub fn set_measurement_name(&mut self, name: Option<String>) {
        self.filters.measurement_names = name.map(|n| BTreeSet::from([n]));
        self.recompute();
    }

    /// Toggle a compound in the multiselect.
    pub fn toggle_compound(&mut self, compound: &str) {
        let Some(ds) = &self.dataset else {
            return;
        };
        let selected = self.filters.compounds.get_or_insert_with(|| {
            ds.table().compound.categories().iter().cloned().collect()
        });
        if !selected.remove(compound) {
            selected.insert(compound.to_string());
        }
        if selected.len() == ds.table().compound.categories().len() {
            self.filters.compounds = None;
        }
        self.recompute();
    }

    /// Select all compounds (no restriction).
    pub fn select_all_compounds(&mut self) {
        self.filters.compounds = None;
        self.recompute();
    }

    /// Deselect all compounds.
    pub fn select_no_compounds(&mut self) {
        self.filters.compounds = Some(BTreeSet::new());
        self.recompute();
    }

    pub fn compound_selected(&self, compound: &str) -> bool {
        self.filters
            .compounds
            .as_ref()
            .map_or(true, |set| set.contains(compound))
    }

    pub fn set_chart_options(&mut self, options: ChartOptions) {
        if options != self.chart_options {
            self.chart_options = options;
            self.recompute();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const CSV: &str = "\
screen,read_out,compound,concentration,measurement_name,SEM,STDEV,average
S1,calcium,Levosimendan,1,peak,0.5,1,10
S1,voltage,Levosimendan,1,peak,0.5,1,11
S2,calcium,Dofetilide,1,peak,0.5,1,12
S2,calcium,Levosimendan,1,peak,0.5,1,13
";

    fn csv_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(CSV.as_bytes()).unwrap();
        file
    }

    fn charts(state: &AppState) -> usize {
        match &state.view.as_ref().unwrap().rendered {
            Rendered::NoData => 0,
            Rendered::Charts { charts, .. } => charts.len(),
        }
    }

    #[test]
    fn open_preselects_default_compound() {
        let file = csv_file();
        let mut state = AppState::new(DashboardConfig::default());
        state.open(file.path()).unwrap();

        assert_eq!(
            state.filters.compounds,
            Some(BTreeSet::from(["Levosimendan".to_string()]))
        );
        assert_eq!(state.view.as_ref().unwrap().rows.len(), 3);
        assert!(state.compound_selected("Levosimendan"));
        assert!(!state.compound_selected("Dofetilide"));
    }

    #[test]
    fn failed_open_surfaces_message() {
        let mut state = AppState::new(DashboardConfig::default());
        assert!(state.open(Path::new("/no/such/file.csv")).is_err());
        assert!(state.dataset.is_none());
        assert!(state.view.is_none());
        assert!(state.status_message.as_deref().unwrap().starts_with("Error:"));
    }

    #[test]
    fn controls_recompute_the_view() {
        let file = csv_file();
        let mut state = AppState::new(DashboardConfig::default());
        state.open(file.path()).unwrap();
        assert_eq!(charts(&state), 2);

        state.set_read_out(Some(ReadOut::Voltage));
        assert_eq!(charts(&state), 1);

        state.select_no_compounds();
        assert_eq!(charts(&state), 0);
        assert!(matches!(state.view.as_ref().unwrap().rendered, Rendered::NoData));

        state.select_all_compounds();
        state.set_read_out(None);
        assert_eq!(state.view.as_ref().unwrap().rows.len(), 4);
    }

    #[test]
    fn toggling_every_compound_back_on_clears_the_restriction() {
        let file = csv_file();
        let mut state = AppState::new(DashboardConfig::default());
        state.open(file.path()).unwrap();

        state.toggle_compound("Dofetilide");
        assert_eq!(state.filters.compounds, None);

        state.toggle_compound("Levosimendan");
        assert_eq!(
            state.filters.compounds,
            Some(BTreeSet::from(["Dofetilide".to_string()]))
        );
    }

    #[test]
    fn reload_keeps_dataset() {
        let file = csv_file();
        let mut state = AppState::new(DashboardConfig::default());
        state.reload().unwrap();
        state.open(file.path()).unwrap();
        state.reload().unwrap();
        assert_eq!(state.dataset.as_ref().unwrap().table().len(), 4);
    }

    #[test]
    fn reload_of_vanished_file_reports_error() {
        let file = csv_file();
        let path = file.path().to_path_buf();
        let mut state = AppState::new(DashboardConfig::default());
        state.open(&path).unwrap();

        drop(file);
        let err = state.reload().unwrap_err();
        assert!(matches!(err, DataLoadError::Io { .. }));
        assert!(state.dataset.is_none());
        assert!(state.view.is_none());
        assert!(state.status_message.as_deref().unwrap().starts_with("Error:"));
    }
}
