use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::error::DataLoadError;
use super::model::{MeasurementTable, RawColumns, ReadOut};

type Result<T> = std::result::Result<T, DataLoadError>;

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// Required columns, in canonical (normalised) spelling.
const SCREEN: &str = "screen";
const READ_OUT: &str = "read_out";
const COMPOUND: &str = "compound";
const CONCENTRATION: &str = "concentration";
const MEASUREMENT_NAME: &str = "measurement_name";
const SEM: &str = "sem";
const STDEV: &str = "stdev";
const AVERAGE: &str = "average";

/// Positions of the required columns in a header.
#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    screen: usize,
    read_out: usize,
    compound: usize,
    concentration: usize,
    measurement_name: usize,
    sem: usize,
    stdev: usize,
    average: usize,
}

/// `Read-Out`, `read out` and `read_out` all name the same column.
fn normalize_header(h: &str) -> String {
    h.trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

impl ColumnIndex {
    fn locate<'a>(path: &Path, headers: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let names: Vec<String> = headers.into_iter().map(normalize_header).collect();
        let find = |column: &'static str| {
            names
                .iter()
                .position(|n| n == column)
                .ok_or_else(|| DataLoadError::MissingColumn {
                    path: path.to_path_buf(),
                    column,
                })
        };
        Ok(ColumnIndex {
            screen: find(SCREEN)?,
            read_out: find(READ_OUT)?,
            compound: find(COMPOUND)?,
            concentration: find(CONCENTRATION)?,
            measurement_name: find(MEASUREMENT_NAME)?,
            sem: find(SEM)?,
            stdev: find(STDEV)?,
            average: find(AVERAGE)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a measurement table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row plus one measurement per line (primary format)
/// * `.parquet` – same column names, string and numeric columns
pub fn load_file(path: &Path) -> Result<MeasurementTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path),
        "parquet" | "pq" => load_parquet(path),
        other => Err(DataLoadError::UnsupportedFormat(other.to_string())),
    }
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| DataLoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<MeasurementTable> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(open(path)?);

    let headers = reader
        .headers()
        .map_err(|e| DataLoadError::malformed(path, format!("reading header: {e}")))?
        .clone();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(DataLoadError::malformed(path, "missing header row"));
    }
    let idx = ColumnIndex::locate(path, headers.iter())?;

    let mut raw = RawColumns::default();
    for (row_no, result) in reader.records().enumerate() {
        // Header is line 1, first record line 2.
        let line = row_no + 2;
        let record =
            result.map_err(|e| DataLoadError::malformed(path, format!("line {line}: {e}")))?;
        let cell = |i: usize| record.get(i).unwrap_or("");

        let read_out = cell(idx.read_out)
            .parse::<ReadOut>()
            .map_err(|e| DataLoadError::malformed(path, format!("line {line}: {e}")))?;
        let number = |i: usize, column: &str| {
            parse_number(cell(i)).ok_or_else(|| {
                DataLoadError::malformed(
                    path,
                    format!("line {line}, column {column}: '{}' is not a number", cell(i)),
                )
            })
        };

        let concentration = number(idx.concentration, CONCENTRATION)?;
        let sem = number(idx.sem, SEM)?;
        let stdev = number(idx.stdev, STDEV)?;
        let average = number(idx.average, AVERAGE)?;

        raw.screen.push(cell(idx.screen).to_string());
        raw.read_out.push(read_out);
        raw.compound.push(cell(idx.compound).to_string());
        raw.concentration.push(concentration);
        raw.measurement_name.push(cell(idx.measurement_name).to_string());
        raw.sem.push(sem);
        raw.stdev.push(stdev);
        raw.average.push(average);
    }

    Ok(MeasurementTable::from_raw(raw))
}

/// Empty cells become NaN, as a dataframe reader would do.
fn parse_number(s: &str) -> Option<f64> {
    if s.is_empty() {
        return Some(f64::NAN);
    }
    s.parse::<f64>().ok()
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file carrying the same columns as the CSV layout.
///
/// String columns may be Utf8 or LargeUtf8; numeric columns Float32,
/// Float64, Int32 or Int64. Null numbers load as NaN.
fn load_parquet(path: &Path) -> Result<MeasurementTable> {
    let malformed = |e: String| DataLoadError::malformed(path, e);

    let builder = ParquetRecordBatchReaderBuilder::try_new(open(path)?)
        .map_err(|e| malformed(e.to_string()))?;
    let reader = builder.build().map_err(|e| malformed(e.to_string()))?;

    let mut raw = RawColumns::default();
    for batch_result in reader {
        let batch = batch_result.map_err(|e| malformed(e.to_string()))?;
        let schema = batch.schema();
        let idx = ColumnIndex::locate(path, schema.fields().iter().map(|f| f.name().as_str()))?;
        let offset = raw.len();

        for row in 0..batch.num_rows() {
            let at = offset + row;
            let text = |i: usize, column: &str| {
                string_at(batch.column(i), row).ok_or_else(|| {
                    DataLoadError::malformed(path, format!("row {at}, column {column}: expected a string"))
                })
            };
            let number = |i: usize, column: &str| {
                float_at(batch.column(i), row).ok_or_else(|| {
                    DataLoadError::malformed(path, format!("row {at}, column {column}: expected a number"))
                })
            };

            let read_out = text(idx.read_out, READ_OUT)?
                .parse::<ReadOut>()
                .map_err(|e| DataLoadError::malformed(path, format!("row {at}: {e}")))?;

            raw.screen.push(text(idx.screen, SCREEN)?);
            raw.read_out.push(read_out);
            raw.compound.push(text(idx.compound, COMPOUND)?);
            raw.concentration.push(number(idx.concentration, CONCENTRATION)?);
            raw.measurement_name.push(text(idx.measurement_name, MEASUREMENT_NAME)?);
            raw.sem.push(number(idx.sem, SEM)?);
            raw.stdev.push(number(idx.stdev, STDEV)?);
            raw.average.push(number(idx.average, AVERAGE)?);
        }
    }

    Ok(MeasurementTable::from_raw(raw))
}

// -- Arrow helpers --

fn string_at(col: &ArrayRef, row: usize) -> Option<String> {
    if col.is_null(row) {
        return None;
    }
    match col.data_type() {
        DataType::Utf8 => Some(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => Some(col.as_string::<i64>().value(row).to_string()),
        _ => None,
    }
}

fn float_at(col: &ArrayRef, row: usize) -> Option<f64> {
    if col.is_null(row) {
        return match col.data_type() {
            DataType::Float32 | DataType::Float64 | DataType::Int32 | DataType::Int64 => {
                Some(f64::NAN)
            }
            _ => None,
        };
    }
    match col.data_type() {
        DataType::Float64 => Some(col.as_primitive::<Float64Type>().value(row)),
        DataType::Float32 => Some(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Int64 => Some(col.as_primitive::<Int64Type>().value(row) as f64),
        DataType::Int32 => Some(col.as_primitive::<Int32Type>().value(row) as f64),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// DatasetCache – one read per file per process
// ---------------------------------------------------------------------------

/// Memoizes loaded tables by path.
#[derive(Debug, Default)]
pub struct DatasetCache {
    tables: HashMap<PathBuf, Arc<MeasurementTable>>,
}

impl DatasetCache {
    fn key(path: &Path) -> PathBuf {
        std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
    }

    /// Return the cached table for `path`, reading it on first use.
    pub fn get_or_load(&mut self, path: &Path) -> Result<Arc<MeasurementTable>> {
        let key = Self::key(path);
        if let Some(table) = self.tables.get(&key) {
            log::debug!("dataset cache hit: {}", key.display());
            return Ok(Arc::clone(table));
        }

        log::debug!("dataset cache miss: {}", key.display());
        let table = Arc::new(load_file(path)?);
        log::info!(
            "Loaded {} rows ({} screens, {} compounds, ~{} KiB) from {}",
            table.len(),
            table.screen.categories().len(),
            table.compound.categories().len(),
            table.memory_bytes() / 1024,
            path.display()
        );
        self.tables.insert(key, Arc::clone(&table));
        Ok(table)
    }

    /// Drop the cached table so the next load re-reads the file.
    pub fn invalidate(&mut self, path: &Path) -> bool {
        self.tables.remove(&Self::key(path)).is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::data::model::{Codes, NumericColumn};

    const SAMPLE: &str = "\
screen,read-out,compound,concentration,measurement_name,SEM,STDEV,average
S1,calcium,Levosimendan,0.5,amplitude,0.25,0.5,10
S1,voltage,Levosimendan,1,amplitude,0.25,0.5,12
S2,Calcium,Dofetilide,0.5,amplitude,,1,7.5
";

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_csv_with_coercions() {
        let file = write_csv(SAMPLE);
        let table = load_file(file.path()).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.screen.categories(), ["S1", "S2"]);
        assert_eq!(table.compound.categories(), ["Dofetilide", "Levosimendan"]);
        assert!(matches!(table.compound.codes(), Codes::U8(_)));
        assert!(matches!(table.average, NumericColumn::F32(_)));

        let rec = table.record(2);
        assert_eq!(rec.screen, "S2");
        assert_eq!(rec.read_out, ReadOut::Calcium);
        assert!(rec.sem.is_nan());
        assert_eq!(rec.average, 7.5);
    }

    #[test]
    fn loading_twice_gives_identical_tables() {
        let file = write_csv(SAMPLE);
        let a = load_file(file.path()).unwrap();
        let b = load_file(file.path()).unwrap();
        assert!(a.sem.get(2).is_nan());
        assert_eq!(a, b);
    }

    #[test]
    fn header_only_is_an_empty_table() {
        let file = write_csv("screen,read_out,compound,concentration,measurement_name,sem,stdev,average\n");
        let table = load_file(file.path()).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_file(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, DataLoadError::Io { .. }));
    }

    #[test]
    fn missing_column_is_reported() {
        let file = write_csv("screen,read_out,compound\nS1,calcium,A\n");
        let err = load_file(file.path()).unwrap_err();
        assert!(matches!(
            err,
            DataLoadError::MissingColumn { column: "concentration", .. }
        ));
    }

    #[test]
    fn bad_values_are_malformed() {
        let bad_read_out = write_csv(&SAMPLE.replace("voltage", "sodium"));
        let err = load_file(bad_read_out.path()).unwrap_err();
        assert!(matches!(err, DataLoadError::Malformed { .. }));
        assert!(err.to_string().contains("line 3"));

        let bad_number = write_csv(&SAMPLE.replace(",7.5", ",lots"));
        let err = load_file(bad_number.path()).unwrap_err();
        assert!(err.to_string().contains("column average"));
    }

    #[test]
    fn empty_file_is_malformed() {
        let file = write_csv("");
        let err = load_file(file.path()).unwrap_err();
        assert!(matches!(err, DataLoadError::Malformed { .. }));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = load_file(Path::new("data.xlsx")).unwrap_err();
        assert!(matches!(err, DataLoadError::UnsupportedFormat(ext) if ext == "xlsx"));
    }

    #[test]
    fn loads_parquet_with_mixed_column_types() {
        use arrow::array::{Float32Array, Float64Array, Int64Array, LargeStringArray, StringArray};
        use arrow::datatypes::{Field, Schema};
        use arrow::record_batch::RecordBatch;
        use parquet::arrow::ArrowWriter;

        let schema = Arc::new(Schema::new(vec![
            Field::new("Screen", DataType::Utf8, false),
            Field::new("read-out", DataType::LargeUtf8, false),
            Field::new("compound", DataType::Utf8, false),
            Field::new("concentration", DataType::Int64, false),
            Field::new("measurement_name", DataType::Utf8, false),
            Field::new("SEM", DataType::Float64, true),
            Field::new("STDEV", DataType::Float32, false),
            Field::new("average", DataType::Float64, false),
        ]));
        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(vec!["S1", "S2"])),
            Arc::new(LargeStringArray::from(vec!["calcium", "Voltage"])),
            Arc::new(StringArray::from(vec!["Levosimendan", "Dofetilide"])),
            Arc::new(Int64Array::from(vec![1, 10])),
            Arc::new(StringArray::from(vec!["peak", "peak"])),
            Arc::new(Float64Array::from(vec![Some(0.25), None])),
            Arc::new(Float32Array::from(vec![0.5, 1.5])),
            Arc::new(Float64Array::from(vec![10.0, 12.5])),
        ];
        let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();

        let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(File::create(file.path()).unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let table = load_file(file.path()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.screen.categories(), ["S1", "S2"]);

        let first = table.record(0);
        assert_eq!(first.read_out, ReadOut::Calcium);
        assert_eq!(first.concentration, 1.0);
        assert_eq!(first.sem, 0.25);

        let second = table.record(1);
        assert_eq!(second.read_out, ReadOut::Voltage);
        assert_eq!(second.compound, "Dofetilide");
        assert_eq!(second.concentration, 10.0);
        assert!(second.sem.is_nan());
        assert_eq!(second.stdev, 1.5);
        assert_eq!(second.average, 12.5);

        assert_eq!(load_file(file.path()).unwrap(), table);
    }

    #[test]
    fn parquet_with_wrong_column_type_is_malformed() {
        use arrow::array::{Float64Array, StringArray};
        use arrow::datatypes::{Field, Schema};
        use arrow::record_batch::RecordBatch;
        use parquet::arrow::ArrowWriter;

        let names = [
            "screen",
            "read_out",
            "compound",
            "concentration",
            "measurement_name",
            "sem",
            "stdev",
            "average",
        ];
        // `concentration` as text.
        let schema = Arc::new(Schema::new(
            names
                .iter()
                .enumerate()
                .map(|(i, n)| {
                    let ty = if i < 5 { DataType::Utf8 } else { DataType::Float64 };
                    Field::new(*n, ty, false)
                })
                .collect::<Vec<_>>(),
        ));
        let columns: Vec<ArrayRef> = (0..names.len())
            .map(|i| -> ArrayRef {
                match i {
                    1 => Arc::new(StringArray::from(vec!["calcium"])),
                    3 => Arc::new(StringArray::from(vec!["high"])),
                    i if i < 5 => Arc::new(StringArray::from(vec!["x"])),
                    _ => Arc::new(Float64Array::from(vec![1.0])),
                }
            })
            .collect();
        let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();

        let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(File::create(file.path()).unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let err = load_file(file.path()).unwrap_err();
        assert!(matches!(err, DataLoadError::Malformed { .. }));
        assert!(err.to_string().contains("column concentration"));
    }

    #[test]
    fn cache_returns_same_table_until_invalidated() {
        let file = write_csv(SAMPLE);
        let mut cache = DatasetCache::default();

        let first = cache.get_or_load(file.path()).unwrap();
        let second = cache.get_or_load(file.path()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        assert!(cache.invalidate(file.path()));
        let third = cache.get_or_load(file.path()).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(*first, *third);
    }
}
