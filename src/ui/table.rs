use eframe::egui::{self, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::MeasurementTable;
use crate::data::summary::{search_rows, Page, ViewSummary, ROWS_PER_PAGE_CHOICES};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Data summary
// ---------------------------------------------------------------------------

fn fmt_num(v: f64) -> String {
    if v.is_nan() {
        "–".to_string()
    } else {
        format!("{v:.4}")
    }
}

/// Row / screen / compound counts and a describe-style table.
pub fn data_summary(ui: &mut Ui, summary: &ViewSummary) {
    ui.heading("Data Summary");
    ui.label(format!(
        "Rows: {}    Screens: {}    Compounds: {}",
        summary.rows, summary.screens, summary.compounds
    ));

    egui::Grid::new("numeric_summary")
        .striped(true)
        .num_columns(9)
        .show(ui, |ui: &mut Ui| {
            for h in ["", "count", "mean", "std", "min", "25%", "50%", "75%", "max"] {
                ui.strong(h);
            }
            ui.end_row();

            for c in &summary.columns {
                ui.strong(c.name);
                ui.label(c.count.to_string());
                for v in [c.mean, c.std, c.min, c.q25, c.median, c.q75, c.max] {
                    ui.label(fmt_num(v));
                }
                ui.end_row();
            }
        });
}

// ---------------------------------------------------------------------------
// Raw data preview
// ---------------------------------------------------------------------------

/// Searchable, paginated view of the filtered rows.
pub fn data_preview(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Data Preview");
    ui.checkbox(&mut state.preview.visible, "Show raw data");
    if !state.preview.visible {
        return;
    }

    let (Some(ds), Some(view)) = (&state.dataset, &state.view) else {
        return;
    };
    let table = ds.table();
    let preview = &mut state.preview;

    ui.horizontal(|ui: &mut Ui| {
        ui.label("Search in data:");
        if ui.text_edit_singleline(&mut preview.search).changed() {
            preview.page = 1;
        }
        ui.separator();
        egui::ComboBox::from_label("Rows per page")
            .selected_text(preview.rows_per_page.to_string())
            .show_ui(ui, |ui: &mut Ui| {
                for n in ROWS_PER_PAGE_CHOICES {
                    if ui
                        .selectable_value(&mut preview.rows_per_page, n, n.to_string())
                        .changed()
                    {
                        preview.page = 1;
                    }
                }
            });
    });

    let matches = search_rows(table, &view.rows, &preview.search);
    if matches.is_empty() {
        ui.label("No data matches your search criteria.");
        return;
    }

    let page = Page::locate(matches.len(), preview.rows_per_page, preview.page);
    preview.page = page.number;
    ui.horizontal(|ui: &mut Ui| {
        ui.label("Page:");
        ui.add(egui::DragValue::new(&mut preview.page).range(1..=page.total_pages));
        ui.label(format!("of {}", page.total_pages));
    });

    rows_table(ui, table, &matches[page.start..page.end]);
    ui.label(format!(
        "Showing {}-{} of {} rows",
        page.start + 1,
        page.end,
        matches.len()
    ));
}

fn rows_table(ui: &mut Ui, table: &MeasurementTable, rows: &[usize]) {
    const HEADERS: [&str; 8] = [
        "screen",
        "read-out",
        "compound",
        "concentration",
        "measurement_name",
        "SEM",
        "STDEV",
        "average",
    ];

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .vscroll(false)
        .columns(Column::auto().at_least(60.0), HEADERS.len())
        .header(20.0, |mut header| {
            for h in HEADERS {
                header.col(|ui: &mut Ui| {
                    ui.strong(h);
                });
            }
        })
        .body(|body| {
            body.rows(18.0, rows.len(), |mut row| {
                let rec = table.record(rows[row.index()]);
                let cells = [
                    rec.screen.to_string(),
                    rec.read_out.to_string(),
                    rec.compound.to_string(),
                    fmt_num(rec.concentration),
                    rec.measurement_name.to_string(),
                    fmt_num(rec.sem),
                    fmt_num(rec.stdev),
                    fmt_num(rec.average),
                ];
                for cell in cells {
                    row.col(|ui: &mut Ui| {
                        ui.label(cell);
                    });
                }
            });
        });
}
