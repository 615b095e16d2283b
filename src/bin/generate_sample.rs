use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde_json::{json, Value as JsonValue};

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
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
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

/// Store: (id, name, baseline, daily drift, noise)
const STORES: [(i64, &str, f64, f64, f64); 3] = [
    (1, "North", 120.0, 1.5, 8.0),
    (2, "South", 80.0, -0.6, 5.0),
    (3, "East", 60.0, 0.0, 12.0),
];

/// Range: (key, name, days)
const RANGES: [(&str, &str, usize); 3] = [
    ("7d", "Last 7 days", 7),
    ("30d", "Last 30 days", 30),
    ("90d", "Last 90 days", 90),
];

fn generate_series(days: usize, base: f64, drift: f64, noise: f64, rng: &mut SimpleRng) -> Vec<(String, f64)> {
    (0..days)
        .map(|i| {
            let value = base + drift * i as f64 + rng.gauss(0.0, noise);
            (format!("day {}", i + 1), value.max(0.0).round())
        })
        .collect()
}

fn write_csv(path: &Path, series: &[(String, f64)]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    writer.write_record(["label", "value"])?;
    for (label, value) in series {
        let value = value.to_string();
        writer.write_record([label.as_str(), value.as_str()])?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

fn write_parquet(path: &Path, series: &[(String, f64)]) -> Result<()> {
    let labels = StringArray::from(series.iter().map(|(l, _)| l.as_str()).collect::<Vec<_>>());
    let values = Float64Array::from(series.iter().map(|(_, v)| *v).collect::<Vec<_>>());

    let schema = Arc::new(Schema::new(vec![
        Field::new("label", DataType::Utf8, false),
        Field::new("value", DataType::Float64, false),
    ]));
    let batch = RecordBatch::try_new(schema.clone(), vec![Arc::new(labels), Arc::new(values)])
        .context("building record batch")?;

    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let out_dir = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sample_fixture"));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut rng = SimpleRng::new(42);
    let mut entries: Vec<JsonValue> = Vec::new();

    for &(store_id, store, base, drift, noise) in &STORES {
        for &(key, _, days) in &RANGES {
            let series = generate_series(days, base, drift, noise, &mut rng);
            let entry = match key {
                // Short ranges inline, longer ones in files to exercise the loaders.
                "7d" => {
                    let observations: Vec<JsonValue> = series
                        .iter()
                        .map(|(label, value)| json!({ "label": label, "value": value }))
                        .collect();
                    json!({ "range": key, "relation_id": store_id, "observations": observations })
                }
                "30d" => {
                    let file = format!("{}_{key}.csv", store.to_lowercase());
                    write_csv(&out_dir.join(&file), &series)?;
                    json!({ "range": key, "relation_id": store_id, "file": file, "delay_ms": 150 })
                }
                _ => {
                    let file = format!("{}_{key}.parquet", store.to_lowercase());
                    write_parquet(&out_dir.join(&file), &series)?;
                    json!({ "range": key, "relation_id": store_id, "file": file, "delay_ms": 600 })
                }
            };
            entries.push(entry);
        }
    }

    let ranges: Vec<JsonValue> = RANGES
        .iter()
        .map(|(key, name, _)| json!({ "key": key, "name": name }))
        .collect();
    let stores: Vec<JsonValue> = STORES
        .iter()
        .map(|(id, name, ..)| json!({ "id": id, "name": name }))
        .collect();

    let fixture = json!({
        "widget": {
            "name": "Orders per day",
            "graphql_query": "ordersPerDay",
            "ranges": ranges,
            "relation": {
                "graphql_query": "stores",
                "foreign_key": "store_id",
                "display_using": "name"
            },
            "show_standard_deviation": true
        },
        "relations": { "stores": stores },
        "series": entries
    });

    let fixture_path = out_dir.join("fixture.json");
    let text = serde_json::to_string_pretty(&fixture).context("serialising fixture")?;
    std::fs::write(&fixture_path, text)
        .with_context(|| format!("writing {}", fixture_path.display()))?;

    println!(
        "Wrote {} series for {} stores to {}",
        STORES.len() * RANGES.len(),
        STORES.len(),
        fixture_path.display()
    );
    Ok(())
}
