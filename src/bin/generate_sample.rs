//! Write a deterministic sample screen dataset.
//!
//! `generate_sample [--parquet]` writes `sample_screens.csv` and, with
//! `--parquet`, the same rows to `sample_screens.parquet`.

use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const CSV_PATH: &str = "sample_screens.csv";
const PARQUET_PATH: &str = "sample_screens.parquet";

const SCREENS: [&str; 3] = ["SCR-001", "SCR-002", "SCR-003"];
/// µM
const CONCENTRATIONS: [f64; 7] = [0.01, 0.03, 0.1, 0.3, 1.0, 3.0, 10.0];
const REPLICATES: usize = 4;

/// (name, EC50 in µM, maximal relative effect)
const COMPOUNDS: [(&str, f64, f64); 6] = [
    ("Levosimendan", 0.3, 0.8),
    ("Dofetilide", 0.05, 0.6),
    ("Nifedipine", 0.1, -0.9),
    ("Isoproterenol", 0.02, 1.2),
    ("E-4031", 0.08, 0.5),
    ("Verapamil", 0.5, -0.7),
];

/// (read-out, measurement name, baseline)
const MEASUREMENTS: [(&str, &str, f64); 4] = [
    ("calcium", "peak_amplitude", 1.0),
    ("calcium", "beat_rate", 60.0),
    ("voltage", "apd90", 350.0),
    ("voltage", "beat_rate", 60.0),
];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Hill equation with slope 1: fraction of the maximal effect at `conc`.
fn hill(conc: f64, ec50: f64) -> f64 {
    conc / (conc + ec50)
}

struct Row {
    screen: &'static str,
    read_out: &'static str,
    compound: &'static str,
    concentration: f64,
    measurement_name: &'static str,
    sem: f64,
    stdev: f64,
    average: f64,
}

fn generate(rng: &mut SimpleRng) -> Vec<Row> {
    let mut rows = Vec::new();
    for (s, &screen) in SCREENS.iter().enumerate() {
        // Plate-to-plate shift in potency.
        let shift = 1.0 + 0.15 * s as f64;
        for &(compound, ec50, emax) in &COMPOUNDS {
            for &(read_out, measurement_name, baseline) in &MEASUREMENTS {
                for &concentration in &CONCENTRATIONS {
                    let expected = baseline * (1.0 + emax * hill(concentration, ec50 * shift));
                    let replicates: Vec<f64> = (0..REPLICATES)
                        .map(|_| rng.gauss(expected, 0.05 * baseline))
                        .collect();

                    let n = replicates.len() as f64;
                    let average = replicates.iter().sum::<f64>() / n;
                    let var = replicates.iter().map(|v| (v - average).powi(2)).sum::<f64>() / (n - 1.0);
                    let stdev = var.sqrt();

                    rows.push(Row {
                        screen,
                        read_out,
                        compound,
                        concentration,
                        measurement_name,
                        sem: stdev / n.sqrt(),
                        stdev,
                        average,
                    });
                }
            }
        }
    }
    rows
}

fn write_csv(rows: &[Row]) -> Result<()> {
    let mut writer = csv::Writer::from_path(CSV_PATH).context("creating CSV")?;
    writer.write_record([
        "screen",
        "read_out",
        "compound",
        "concentration",
        "measurement_name",
        "SEM",
        "STDEV",
        "average",
    ])?;
    for r in rows {
        writer.write_record([
            r.screen.to_string(),
            r.read_out.to_string(),
            r.compound.to_string(),
            r.concentration.to_string(),
            r.measurement_name.to_string(),
            format!("{:.6}", r.sem),
            format!("{:.6}", r.stdev),
            format!("{:.6}", r.average),
        ])?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

fn write_parquet(rows: &[Row]) -> Result<()> {
    let strings = |f: fn(&Row) -> &str| -> ArrayRef {
        Arc::new(StringArray::from(rows.iter().map(f).collect::<Vec<_>>()))
    };
    let floats = |f: fn(&Row) -> f64| -> ArrayRef {
        Arc::new(Float64Array::from(rows.iter().map(f).collect::<Vec<_>>()))
    };

    let schema = Arc::new(Schema::new(vec![
        Field::new("screen", DataType::Utf8, false),
        Field::new("read_out", DataType::Utf8, false),
        Field::new("compound", DataType::Utf8, false),
        Field::new("concentration", DataType::Float64, false),
        Field::new("measurement_name", DataType::Utf8, false),
        Field::new("SEM", DataType::Float64, false),
        Field::new("STDEV", DataType::Float64, false),
        Field::new("average", DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            strings(|r| r.screen),
            strings(|r| r.read_out),
            strings(|r| r.compound),
            floats(|r| r.concentration),
            strings(|r| r.measurement_name),
            floats(|r| r.sem),
            floats(|r| r.stdev),
            floats(|r| r.average),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(PARQUET_PATH).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let with_parquet = std::env::args().skip(1).any(|a| a == "--parquet");

    let mut rng = SimpleRng::new(42);
    let rows = generate(&mut rng);

    write_csv(&rows)?;
    println!("Wrote {} rows to {CSV_PATH}", rows.len());

    if with_parquet {
        write_parquet(&rows)?;
        println!("Wrote {} rows to {PARQUET_PATH}", rows.len());
    }
    Ok(())
}
