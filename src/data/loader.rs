use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Float64Type, TimeUnit, TimestampMillisecondType};
use calamine::{Data, DataType as _, Range, Reader, open_workbook_auto};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{RawRow, RawTime, RawValue};
use crate::config::ReportConfig;
use crate::error::ReportError;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load the time and value columns of a measurement table.  Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx` / `.xlsm` / `.xlsb` / `.xls` / `.ods` – first worksheet, header in the first row
/// * `.csv`     – header row, one measurement per line
/// * `.json`    – `[{ "Time": "...", "Total Dizbalance": 1.5, ... }, ...]`
/// * `.parquet` – `Time` as text or timestamp, value column numeric or text
///
/// Value cells are not converted here: a row whose time later fails to parse
/// may hold anything in its value cell (totals, notes) without failing the load.
pub fn load_file(path: &Path, config: &ReportConfig) -> Result<Vec<RawRow>, ReportError> {
    let rows = load_by_extension(path, config).map_err(|e| {
        log::error!("Failed to load {}: {e:#}", path.display());
        ReportError::Load(e)
    })?;
    log::info!("Loaded {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

fn load_by_extension(path: &Path, config: &ReportConfig) -> Result<Vec<RawRow>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => load_spreadsheet(path, config),
        "csv" => load_csv(path, config),
        "json" => load_json(path, config),
        "parquet" | "pq" => load_parquet(path, config),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

/// Find the time and value column positions in a header row.
fn locate_columns(headers: &[String], config: &ReportConfig) -> Result<(usize, usize)> {
    let find = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .with_context(|| format!("missing '{name}' column (found: {headers:?})"))
    };
    Ok((find(&config.time_column)?, find(&config.value_column)?))
}

// ---------------------------------------------------------------------------
// Spreadsheet loader
// ---------------------------------------------------------------------------

fn load_spreadsheet(path: &Path, config: &ReportConfig) -> Result<Vec<RawRow>> {
    let mut workbook = open_workbook_auto(path).context("opening workbook")?;
    let range = workbook
        .worksheet_range_at(0)
        .context("workbook has no worksheets")?
        .context("reading first worksheet")?;
    rows_from_range(&range, config)
}

/// Convert a worksheet range into rows. The first row is the header.
pub(crate) fn rows_from_range(range: &Range<Data>, config: &ReportConfig) -> Result<Vec<RawRow>> {
    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .context("worksheet is empty")?
        .iter()
        .map(|c| c.to_string().trim().to_string())
        .collect();
    let (time_idx, value_idx) = locate_columns(&headers, config)?;

    Ok(rows
        .map(|row| RawRow {
            time: row.get(time_idx).map(cell_time).unwrap_or(RawTime::Missing),
            total: row.get(value_idx).map(cell_value).unwrap_or(RawValue::Missing),
        })
        .collect())
}

fn cell_time(cell: &Data) -> RawTime {
    match cell {
        Data::Empty => RawTime::Missing,
        Data::String(s) => RawTime::Text(s.clone()),
        Data::DateTime(_) | Data::DateTimeIso(_) => cell
            .as_datetime()
            .map(RawTime::Moment)
            .unwrap_or_else(|| RawTime::Text(cell.to_string())),
        other => RawTime::Text(other.to_string()),
    }
}

fn cell_value(cell: &Data) -> RawValue {
    match cell {
        Data::Empty => RawValue::Missing,
        Data::Float(v) => RawValue::Number(*v),
        Data::Int(v) => RawValue::Number(*v as f64),
        Data::String(s) => RawValue::from_text(s),
        other => RawValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one measurement per line.
/// Columns other than the time and value columns are ignored.
fn load_csv(path: &Path, config: &ReportConfig) -> Result<Vec<RawRow>> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();
    let (time_idx, value_idx) = locate_columns(&headers, config)?;

    let mut rows = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {}", row_no + 1))?;

        let time = match record.get(time_idx).map(str::trim) {
            None | Some("") => RawTime::Missing,
            Some(s) => RawTime::Text(s.to_string()),
        };
        let total = RawValue::from_text(record.get(value_idx).unwrap_or(""));

        rows.push(RawRow { time, total });
    }

    Ok(rows)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "Time": "2024.01.01 00:00", "Total Dizbalance": 10.0 },
///   ...
/// ]
/// ```
///
/// Numeric `Time` values are read as epoch milliseconds, which is how pandas
/// serializes datetime columns.
fn load_json(path: &Path, config: &ReportConfig) -> Result<Vec<RawRow>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    if let Some(first) = records.first().and_then(JsonValue::as_object) {
        for name in [&config.time_column, &config.value_column] {
            if !first.contains_key(name) {
                bail!("missing '{name}' column");
            }
        }
    }

    records
        .iter()
        .enumerate()
        .map(|(i, rec)| {
            let obj = rec
                .as_object()
                .with_context(|| format!("Row {i} is not a JSON object"))?;
            Ok(RawRow {
                time: json_time(obj.get(&config.time_column)),
                total: json_value(obj.get(&config.value_column)),
            })
        })
        .collect()
}

fn json_time(val: Option<&JsonValue>) -> RawTime {
    match val {
        None | Some(JsonValue::Null) => RawTime::Missing,
        Some(JsonValue::String(s)) => RawTime::Text(s.clone()),
        Some(JsonValue::Number(n)) => n
            .as_i64()
            .and_then(chrono::DateTime::from_timestamp_millis)
            .map(|t| RawTime::Moment(t.naive_utc()))
            .unwrap_or_else(|| RawTime::Text(n.to_string())),
        Some(other) => RawTime::Text(other.to_string()),
    }
}

fn json_value(val: Option<&JsonValue>) -> RawValue {
    match val {
        None | Some(JsonValue::Null) => RawValue::Missing,
        Some(JsonValue::Number(n)) => n
            .as_f64()
            .map(RawValue::Number)
            .unwrap_or_else(|| RawValue::Text(n.to_string())),
        Some(JsonValue::String(s)) => RawValue::from_text(s),
        Some(other) => RawValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of measurements.
///
/// Expected schema:
/// - `Time`: Utf8 / LargeUtf8 text, or a Timestamp / Date column
/// - `Total Dizbalance`: any numeric type (cast to Float64), or text
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path, config: &ReportConfig) -> Result<Vec<RawRow>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let time_idx = schema
            .index_of(&config.time_column)
            .map_err(|_| anyhow!("Parquet file missing '{}' column", config.time_column))?;
        let value_idx = schema
            .index_of(&config.value_column)
            .map_err(|_| anyhow!("Parquet file missing '{}' column", config.value_column))?;

        let times = time_cells(batch.column(time_idx))
            .with_context(|| format!("reading '{}'", config.time_column))?;
        let values = value_cells(batch.column(value_idx))
            .with_context(|| format!("reading '{}'", config.value_column))?;

        rows.extend(
            times
                .into_iter()
                .zip(values)
                .map(|(time, total)| RawRow { time, total }),
        );
    }

    Ok(rows)
}

// -- Parquet / Arrow helpers --

fn time_cells(col: &ArrayRef) -> Result<Vec<RawTime>> {
    match col.data_type() {
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => {
            let text = arrow::compute::cast(col, &DataType::Utf8).context("casting to Utf8")?;
            Ok(text
                .as_string::<i32>()
                .iter()
                .map(|v| match v {
                    Some(s) => RawTime::Text(s.to_string()),
                    None => RawTime::Missing,
                })
                .collect())
        }
        DataType::Timestamp(_, _) | DataType::Date32 | DataType::Date64 => {
            let stamps = arrow::compute::cast(
                col,
                &DataType::Timestamp(TimeUnit::Millisecond, None),
            )
            .context("casting to millisecond timestamps")?;
            let stamps = stamps.as_primitive::<TimestampMillisecondType>();
            Ok((0..stamps.len())
                .map(|row| {
                    if stamps.is_null(row) {
                        return RawTime::Missing;
                    }
                    stamps
                        .value_as_datetime(row)
                        .map(RawTime::Moment)
                        .unwrap_or(RawTime::Missing)
                })
                .collect())
        }
        other => bail!("Expected text or timestamp column, got {other:?}"),
    }
}

fn value_cells(col: &ArrayRef) -> Result<Vec<RawValue>> {
    match col.data_type() {
        t if t.is_numeric() => {
            let values =
                arrow::compute::cast(col, &DataType::Float64).context("casting to Float64")?;
            Ok(values
                .as_primitive::<Float64Type>()
                .iter()
                .map(|v| v.map(RawValue::Number).unwrap_or(RawValue::Missing))
                .collect())
        }
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => {
            let text = arrow::compute::cast(col, &DataType::Utf8).context("casting to Utf8")?;
            Ok(text
                .as_string::<i32>()
                .iter()
                .map(|v| v.map(RawValue::from_text).unwrap_or(RawValue::Missing))
                .collect())
        }
        other => bail!("Expected numeric or text column, got {other:?}"),
    }
}
