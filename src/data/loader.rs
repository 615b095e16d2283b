use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, AsArray, Float32Array, Float64Array, Int32Array, Int64Array, StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::Observation;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load an observation series from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.json`    – `[{ "label": "...", "value": 1.0 }, ...]`, optionally
///                wrapped in a JSON string (the shape query payloads use)
/// * `.csv`     – header row with `label` and `value` columns
/// * `.parquet` – `label` (Utf8) and `value` (numeric) columns
pub fn load_series_file(path: &Path) -> Result<Vec<Observation>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

fn load_json(path: &Path) -> Result<Vec<Observation>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_series_json(&text)
}

/// Parse a series payload from JSON text.
pub fn parse_series_json(text: &str) -> Result<Vec<Observation>> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;
    series_from_json(&root)
}

/// Accepts an array of `{label, value}` records, or a string holding one.
pub fn series_from_json(root: &JsonValue) -> Result<Vec<Observation>> {
    if let Some(encoded) = root.as_str() {
        return parse_series_json(encoded).context("decoding string-encoded series");
    }

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    records
        .iter()
        .enumerate()
        .map(|(i, rec)| {
            let obj = rec
                .as_object()
                .with_context(|| format!("Row {i} is not a JSON object"))?;
            let label = match obj.get("label") {
                Some(JsonValue::String(s)) => s.clone(),
                Some(JsonValue::Null) | None => String::new(),
                Some(other) => other.to_string(),
            };
            let value = json_number(obj.get("value"))
                .with_context(|| format!("Row {i}: missing or non-numeric 'value'"))?;
            let value = finite(value).with_context(|| format!("Row {i}"))?;
            Ok(Observation { label, value })
        })
        .collect()
}

/// Numbers, and numeric strings as some backends serialise decimals.
fn json_number(val: Option<&JsonValue>) -> Option<f64> {
    match val? {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// `f64::from_str` accepts "NaN" and "inf"; a series never holds them.
fn finite(value: f64) -> Result<f64> {
    if !value.is_finite() {
        bail!("'value' is not finite: {value}");
    }
    Ok(value)
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<Vec<Observation>> {
    let reader = csv::Reader::from_path(path).context("opening CSV")?;
    read_csv(reader)
}

fn read_csv<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Vec<Observation>> {
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let label_idx = headers
        .iter()
        .position(|h| h == "label")
        .context("CSV missing 'label' column")?;
    let value_idx = headers
        .iter()
        .position(|h| h == "value")
        .context("CSV missing 'value' column")?;

    let mut series = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let label = record.get(label_idx).unwrap_or("").to_string();
        let raw = record.get(value_idx).unwrap_or("").trim();
        let value = raw
            .parse::<f64>()
            .with_context(|| format!("CSV row {row_no}: '{raw}' is not a number"))?;
        let value = finite(value).with_context(|| format!("CSV row {row_no}"))?;

        series.push(Observation { label, value });
    }

    Ok(series)
}

// ---------------------------------------------------------------------------
// Parquet
// ---------------------------------------------------------------------------

/// Expected schema:
/// - `label`: Utf8 or LargeUtf8 (other types are rendered with `Debug`)
/// - `value`: Float64, Float32, Int64 or Int32; null values are rejected
fn load_parquet(path: &Path) -> Result<Vec<Observation>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut series = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let label_idx = schema
            .index_of("label")
            .map_err(|_| anyhow::anyhow!("Parquet file missing 'label' column"))?;
        let value_idx = schema
            .index_of("value")
            .map_err(|_| anyhow::anyhow!("Parquet file missing 'value' column"))?;

        let label_col = batch.column(label_idx);
        let value_col = batch.column(value_idx);

        for row in 0..batch.num_rows() {
            let label = extract_label(label_col, row);
            let value = extract_value(value_col, row)
                .and_then(finite)
                .with_context(|| format!("Row {row}: failed to read 'value'"))?;
            series.push(Observation { label, value });
        }
    }

    Ok(series)
}

fn extract_label(col: &Arc<dyn Array>, row: usize) -> String {
    if col.is_null(row) {
        return String::new();
    }
    match col.data_type() {
        DataType::Utf8 => col
            .as_any()
            .downcast_ref::<StringArray>()
            .map(|s| s.value(row).to_string())
            .unwrap_or_default(),
        DataType::LargeUtf8 => col.as_string::<i64>().value(row).to_string(),
        other => format!("{other:?}"),
    }
}

fn extract_value(col: &Arc<dyn Array>, row: usize) -> Result<f64> {
    if col.is_null(row) {
        bail!("null value");
    }
    let any = col.as_any();
    let value = match col.data_type() {
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map(|a| a.value(row)),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map(|a| a.value(row) as f64),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map(|a| a.value(row) as f64),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map(|a| a.value(row) as f64),
        other => bail!("Expected a numeric 'value' column, got {other:?}"),
    };
    value.context("column type does not match its declared data type")
}
