use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use super::model::{CategoricalColumn, MeasurementTable, ReadOut};

// ---------------------------------------------------------------------------
// Filter predicate: which values are selected per field
// ---------------------------------------------------------------------------

/// Per-field selection state.
///
/// `None` on a field means "no restriction". `Some(set)` keeps rows whose
/// value is in the set, so an empty set hides everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FilterSpec {
    pub read_outs: Option<BTreeSet<ReadOut>>,
    pub compounds: Option<BTreeSet<String>>,
    pub measurement_names: Option<BTreeSet<String>>,
}

impl FilterSpec {
    /// Initial selection for a freshly loaded table: `preferred_compound`
    /// alone when the table has it, otherwise everything.
    pub fn initial(table: &MeasurementTable, preferred_compound: &str) -> Self {
        let compounds = table
            .compound
            .code_of(preferred_compound)
            .map(|_| BTreeSet::from([preferred_compound.to_string()]));
        FilterSpec {
            compounds,
            ..FilterSpec::default()
        }
    }
}

/// Selected dictionary codes of one categorical column, as a lookup mask.
fn code_mask(column: &CategoricalColumn, selected: &Option<BTreeSet<String>>) -> Option<Vec<bool>> {
    selected.as_ref().map(|values| {
        let mut mask = vec![false; column.categories().len()];
        for v in values {
            if let Some(code) = column.code_of(v) {
                mask[code] = true;
            }
        }
        mask
    })
}

/// Keep the rows of `rows` that pass every active constraint of `spec`.
pub fn refine(table: &MeasurementTable, rows: &[usize], spec: &FilterSpec) -> Vec<usize> {
    let compounds = code_mask(&table.compound, &spec.compounds);
    let names = code_mask(&table.measurement_name, &spec.measurement_names);

    rows.iter()
        .copied()
        .filter(|&row| {
            if let Some(read_outs) = &spec.read_outs {
                if !read_outs.contains(&table.read_out[row]) {
                    return false;
                }
            }
            if let Some(mask) = &compounds {
                if !mask[table.compound.code(row)] {
                    return false;
                }
            }
            if let Some(mask) = &names {
                if !mask[table.measurement_name.code(row)] {
                    return false;
                }
            }
            true
        })
        .collect()
}

/// Return indices of rows that pass all active filters.
pub fn filtered_indices(table: &MeasurementTable, spec: &FilterSpec) -> Vec<usize> {
    let all: Vec<usize> = (0..table.len()).collect();
    refine(table, &all, spec)
}

// ---------------------------------------------------------------------------
// FilterCache – memoized views of one table
// ---------------------------------------------------------------------------

/// Distinct selections kept before the memo starts over.
pub const MAX_CACHED_VIEWS: usize = 256;

/// Memoizes [`filtered_indices`] per distinct [`FilterSpec`] for one table.
///
/// Compound subsets are unbounded in number, so the memo is cleared once it
/// holds `limit` selections.
#[derive(Debug)]
pub struct FilterCache {
    table: Arc<MeasurementTable>,
    views: HashMap<FilterSpec, Arc<[usize]>>,
    limit: usize,
}

impl FilterCache {
    pub fn new(table: Arc<MeasurementTable>) -> Self {
        Self::with_limit(table, MAX_CACHED_VIEWS)
    }

    pub fn with_limit(table: Arc<MeasurementTable>, limit: usize) -> Self {
        FilterCache {
            table,
            views: HashMap::new(),
            limit: limit.max(1),
        }
    }

    pub fn table(&self) -> &Arc<MeasurementTable> {
        &self.table
    }

    pub fn rows(&mut self, spec: &FilterSpec) -> Arc<[usize]> {
        if let Some(rows) = self.views.get(spec) {
            return Arc::clone(rows);
        }
        let rows: Arc<[usize]> = filtered_indices(&self.table, spec).into();
        log::debug!("filtered {} → {} rows for {spec:?}", self.table.len(), rows.len());
        if self.views.len() >= self.limit {
            log::debug!("filter memo full ({} selections), clearing", self.views.len());
            self.views.clear();
        }
        self.views.insert(spec.clone(), Arc::clone(&rows));
        rows
    }

    /// Number of distinct selections computed so far.
    pub fn len(&self) -> usize {
        self.views.len()
    }
}
