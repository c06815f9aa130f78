use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// ReadOut – measurement modality
// ---------------------------------------------------------------------------

/// Measurement modality of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReadOut {
    Calcium,
    Voltage,
}

impl ReadOut {
    pub const ALL: [ReadOut; 2] = [ReadOut::Calcium, ReadOut::Voltage];

    pub fn as_str(self) -> &'static str {
        match self {
            ReadOut::Calcium => "calcium",
            ReadOut::Voltage => "voltage",
        }
    }
}

impl fmt::Display for ReadOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReadOut {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "calcium" => Ok(ReadOut::Calcium),
            "voltage" => Ok(ReadOut::Voltage),
            other => Err(format!("unknown read-out '{other}' (expected calcium or voltage)")),
        }
    }
}

// ---------------------------------------------------------------------------
// CategoricalColumn – dictionary-encoded strings
// ---------------------------------------------------------------------------

/// Category codes stored at the narrowest width that fits the dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Codes {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl Codes {
    fn len(&self) -> usize {
        match self {
            Codes::U8(v) => v.len(),
            Codes::U16(v) => v.len(),
            Codes::U32(v) => v.len(),
        }
    }

    fn get(&self, row: usize) -> usize {
        match self {
            Codes::U8(v) => v[row] as usize,
            Codes::U16(v) => v[row] as usize,
            Codes::U32(v) => v[row] as usize,
        }
    }

    fn width_bytes(&self) -> usize {
        match self {
            Codes::U8(_) => 1,
            Codes::U16(_) => 2,
            Codes::U32(_) => 4,
        }
    }
}

/// A string column encoded as a sorted dictionary plus per-row codes.
///
/// Codes follow the sorted order of the dictionary, so two columns built
/// from the same values are always equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoricalColumn {
    categories: Vec<String>,
    codes: Codes,
}

impl CategoricalColumn {
    pub fn from_values<S: AsRef<str>>(values: &[S]) -> Self {
        let mut index: BTreeMap<&str, usize> = BTreeMap::new();
        for v in values {
            index.insert(v.as_ref(), 0);
        }
        for (code, slot) in index.values_mut().enumerate() {
            *slot = code;
        }
        let categories: Vec<String> = index.keys().map(|s| s.to_string()).collect();
        let raw = values.iter().map(|v| index[v.as_ref()]);

        let codes = if categories.len() <= u8::MAX as usize + 1 {
            Codes::U8(raw.map(|c| c as u8).collect())
        } else if categories.len() <= u16::MAX as usize + 1 {
            Codes::U16(raw.map(|c| c as u16).collect())
        } else {
            Codes::U32(raw.map(|c| c as u32).collect())
        };

        CategoricalColumn { categories, codes }
    }

    /// Sorted distinct values.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn code(&self, row: usize) -> usize {
        self.codes.get(row)
    }

    pub fn value(&self, row: usize) -> &str {
        &self.categories[self.codes.get(row)]
    }

    /// Dictionary code of `value`, if it occurs in the column.
    pub fn code_of(&self, value: &str) -> Option<usize> {
        self.categories
            .binary_search_by(|c| c.as_str().cmp(value))
            .ok()
    }

    pub fn codes(&self) -> &Codes {
        &self.codes
    }

    fn memory_bytes(&self) -> usize {
        let dict: usize = self.categories.iter().map(|c| c.len()).sum();
        dict + self.codes.len() * self.codes.width_bytes()
    }
}

// ---------------------------------------------------------------------------
// NumericColumn – floats at the narrowest exact width
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum NumericColumn {
    F32(Vec<f32>),
    F64(Vec<f64>),
}

/// Bit-level equality, so NaN cells compare equal to themselves.
impl PartialEq for NumericColumn {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (NumericColumn::F32(a), NumericColumn::F32(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
            }
            (NumericColumn::F64(a), NumericColumn::F64(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
            }
            _ => false,
        }
    }
}

impl NumericColumn {
    /// Store as `f32` when every value survives the round trip exactly.
    pub fn from_values(values: Vec<f64>) -> Self {
        let fits = values
            .iter()
            .all(|&v| v.is_nan() || (v as f32) as f64 == v);
        if fits {
            NumericColumn::F32(values.into_iter().map(|v| v as f32).collect())
        } else {
            NumericColumn::F64(values)
        }
    }

    pub fn get(&self, row: usize) -> f64 {
        match self {
            NumericColumn::F32(v) => v[row] as f64,
            NumericColumn::F64(v) => v[row],
        }
    }

    fn memory_bytes(&self) -> usize {
        match self {
            NumericColumn::F32(v) => v.len() * 4,
            NumericColumn::F64(v) => v.len() * 8,
        }
    }
}

// ---------------------------------------------------------------------------
// MeasurementRecord – borrowed view of one row
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasurementRecord<'a> {
    pub screen: &'a str,
    pub read_out: ReadOut,
    pub compound: &'a str,
    pub concentration: f64,
    pub measurement_name: &'a str,
    pub sem: f64,
    pub stdev: f64,
    pub average: f64,
}

// ---------------------------------------------------------------------------
// MeasurementTable – the complete loaded dataset
// ---------------------------------------------------------------------------

/// Column-oriented, immutable measurement table.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementTable {
    pub screen: CategoricalColumn,
    pub read_out: Vec<ReadOut>,
    pub compound: CategoricalColumn,
    pub concentration: NumericColumn,
    pub measurement_name: CategoricalColumn,
    pub sem: NumericColumn,
    pub stdev: NumericColumn,
    pub average: NumericColumn,
}

/// Row-oriented input used while building a table.
#[derive(Debug, Clone, Default)]
pub struct RawColumns {
    pub screen: Vec<String>,
    pub read_out: Vec<ReadOut>,
    pub compound: Vec<String>,
    pub concentration: Vec<f64>,
    pub measurement_name: Vec<String>,
    pub sem: Vec<f64>,
    pub stdev: Vec<f64>,
    pub average: Vec<f64>,
}

impl RawColumns {
    pub fn len(&self) -> usize {
        self.screen.len()
    }
}

impl MeasurementTable {
    /// Encode raw columns. All columns must have the same length.
    pub fn from_raw(raw: RawColumns) -> Self {
        debug_assert!(
            [
                raw.read_out.len(),
                raw.compound.len(),
                raw.concentration.len(),
                raw.measurement_name.len(),
                raw.sem.len(),
                raw.stdev.len(),
                raw.average.len(),
            ]
            .iter()
            .all(|&n| n == raw.screen.len()),
            "column length mismatch"
        );

        MeasurementTable {
            screen: CategoricalColumn::from_values(&raw.screen),
            read_out: raw.read_out,
            compound: CategoricalColumn::from_values(&raw.compound),
            concentration: NumericColumn::from_values(raw.concentration),
            measurement_name: CategoricalColumn::from_values(&raw.measurement_name),
            sem: NumericColumn::from_values(raw.sem),
            stdev: NumericColumn::from_values(raw.stdev),
            average: NumericColumn::from_values(raw.average),
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.read_out.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.read_out.is_empty()
    }

    pub fn record(&self, row: usize) -> MeasurementRecord<'_> {
        MeasurementRecord {
            screen: self.screen.value(row),
            read_out: self.read_out[row],
            compound: self.compound.value(row),
            concentration: self.concentration.get(row),
            measurement_name: self.measurement_name.value(row),
            sem: self.sem.get(row),
            stdev: self.stdev.get(row),
            average: self.average.get(row),
        }
    }

    /// Read-outs that actually occur, in enum order.
    pub fn read_outs(&self) -> Vec<ReadOut> {
        ReadOut::ALL
            .into_iter()
            .filter(|r| self.read_out.contains(r))
            .collect()
    }

    /// Approximate heap footprint of the encoded columns.
    pub fn memory_bytes(&self) -> usize {
        self.screen.memory_bytes()
            + self.read_out.len()
            + self.compound.memory_bytes()
            + self.concentration.memory_bytes()
            + self.measurement_name.memory_bytes()
            + self.sem.memory_bytes()
            + self.stdev.memory_bytes()
            + self.average.memory_bytes()
    }
}
