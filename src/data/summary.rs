use std::collections::BTreeSet;

use super::model::{MeasurementTable, NumericColumn};

// ---------------------------------------------------------------------------
// Numeric summary of a view (count, mean, std, quartiles)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub name: &'static str,
    /// Non-NaN values.
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n − 1); NaN for fewer than two values.
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// Linear-interpolated quantile of sorted values.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

fn summarize(name: &'static str, column: &NumericColumn, rows: &[usize]) -> ColumnSummary {
    let mut values: Vec<f64> = rows
        .iter()
        .map(|&r| column.get(r))
        .filter(|v| !v.is_nan())
        .collect();
    values.sort_by(f64::total_cmp);

    let count = values.len();
    let mean = if count == 0 {
        f64::NAN
    } else {
        values.iter().sum::<f64>() / count as f64
    };
    let std = if count < 2 {
        f64::NAN
    } else {
        let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (count - 1) as f64).sqrt()
    };

    ColumnSummary {
        name,
        count,
        mean,
        std,
        min: values.first().copied().unwrap_or(f64::NAN),
        q25: quantile(&values, 0.25),
        median: quantile(&values, 0.5),
        q75: quantile(&values, 0.75),
        max: values.last().copied().unwrap_or(f64::NAN),
    }
}

/// Headline numbers for the "Data Summary" block.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSummary {
    pub rows: usize,
    pub screens: usize,
    pub compounds: usize,
    pub columns: Vec<ColumnSummary>,
}

impl ViewSummary {
    pub fn of(table: &MeasurementTable, rows: &[usize]) -> Self {
        let screens: BTreeSet<usize> = rows.iter().map(|&r| table.screen.code(r)).collect();
        let compounds: BTreeSet<usize> = rows.iter().map(|&r| table.compound.code(r)).collect();
        ViewSummary {
            rows: rows.len(),
            screens: screens.len(),
            compounds: compounds.len(),
            columns: vec![
                summarize("concentration", &table.concentration, rows),
                summarize("average", &table.average, rows),
                summarize("SEM", &table.sem, rows),
                summarize("STDEV", &table.stdev, rows),
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// Raw data preview: search + pagination
// ---------------------------------------------------------------------------

pub const ROWS_PER_PAGE_CHOICES: [usize; 4] = [10, 25, 50, 100];

/// Rows whose screen, read-out, compound or measurement name contains
/// `term`, ignoring case. An empty term keeps every row.
pub fn search_rows(table: &MeasurementTable, rows: &[usize], term: &str) -> Vec<usize> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return rows.to_vec();
    }
    rows.iter()
        .copied()
        .filter(|&r| {
            let rec = table.record(r);
            [rec.screen, rec.read_out.as_str(), rec.compound, rec.measurement_name]
                .iter()
                .any(|s| s.to_lowercase().contains(&term))
        })
        .collect()
}

/// One page of a row list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// 1-based page number after clamping.
    pub number: usize,
    pub total_pages: usize,
    /// Half-open row range into the searched list.
    pub start: usize,
    pub end: usize,
}

impl Page {
    /// Clamp `requested` (1-based) into the valid page range.
    pub fn locate(total_rows: usize, rows_per_page: usize, requested: usize) -> Self {
        let per_page = rows_per_page.max(1);
        let total_pages = total_rows.div_ceil(per_page).max(1);
        let number = requested.clamp(1, total_pages);
        let start = ((number - 1) * per_page).min(total_rows);
        let end = (start + per_page).min(total_rows);
        Page {
            number,
            total_pages,
            start,
            end,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::tests::sample_table;

    #[test]
    fn quantiles_interpolate_like_a_dataframe() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&sorted, 0.0), 1.0);
        assert_eq!(quantile(&sorted, 0.5), 2.5);
        assert_eq!(quantile(&sorted, 0.25), 1.75);
        assert!(quantile(&[], 0.5).is_nan());
    }

    #[test]
    fn summary_counts_screens_and_compounds() {
        let table = sample_table();
        let rows: Vec<usize> = (0..table.len()).collect();
        let summary = ViewSummary::of(&table, &rows);

        assert_eq!(summary.rows, 24);
        assert_eq!(summary.screens, 2);
        assert_eq!(summary.compounds, 2);

        let average = &summary.columns[1];
        assert_eq!(average.name, "average");
        assert_eq!(average.count, 24);
        assert_eq!(average.min, 10.0);
        assert_eq!(average.max, 12.0);
        assert!((average.mean - 11.0).abs() < 1e-12);
    }

    #[test]
    fn summary_of_empty_view_is_nan() {
        let table = sample_table();
        let summary = ViewSummary::of(&table, &[]);
        assert_eq!(summary.rows, 0);
        assert!(summary.columns.iter().all(|c| c.count == 0 && c.mean.is_nan()));
    }

    #[test]
    fn search_is_case_insensitive() {
        let table = sample_table();
        let rows: Vec<usize> = (0..table.len()).collect();

        let hits = search_rows(&table, &rows, "LEVO");
        assert_eq!(hits.len(), 12);
        assert!(hits.iter().all(|&r| table.record(r).compound == "Levosimendan"));

        assert_eq!(search_rows(&table, &rows, "  ").len(), rows.len());
        assert!(search_rows(&table, &rows, "nothing-like-this").is_empty());
    }

    #[test]
    fn pages_are_clamped() {
        let page = Page::locate(53, 25, 1);
        assert_eq!((page.start, page.end, page.total_pages), (0, 25, 3));

        let last = Page::locate(53, 25, 99);
        assert_eq!((last.number, last.start, last.end), (3, 50, 53));

        let empty = Page::locate(0, 10, 0);
        assert_eq!((empty.number, empty.start, empty.end, empty.total_pages), (1, 0, 0, 1));
    }
}
