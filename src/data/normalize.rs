use anyhow::anyhow;
use chrono::NaiveDateTime;

use super::model::{Dataset, RawRow, RawTime, RawValue, Record};
use crate::error::{ReportError, Result};

// ---------------------------------------------------------------------------
// Time normalization
// ---------------------------------------------------------------------------

/// Parse the time column and drop rows that do not fit `format`.
///
/// Text cells are trimmed and parsed with `format` (a `chrono` pattern such
/// as `%Y.%m.%d %H:%M`). Typed date-times pass through. Missing and
/// unparsable cells are dropped and counted in [`Dataset::dropped`]; an
/// empty result is not an error.
///
/// Value cells are converted only for rows that keep their time, so a footer
/// such as `Итого | n/a` is dropped silently. Text in a kept row's value cell
/// is a [`ReportError::Load`].
pub fn normalize(rows: Vec<RawRow>, format: &str) -> Result<Dataset> {
    let total_rows = rows.len();
    let mut records = Vec::with_capacity(total_rows);
    for (index, row) in rows.into_iter().enumerate() {
        let Some(time) = parse_time(&row.time, format) else {
            continue;
        };
        let total = match row.total {
            RawValue::Number(v) => Some(v),
            RawValue::Missing => None,
            RawValue::Text(text) => {
                // +2: one-based, after the header row.
                return Err(ReportError::Load(anyhow!(
                    "data row {}: '{text}' is not a number",
                    index + 2
                )));
            }
        };
        records.push(Record {
            time,
            total,
            smoothed: None,
        });
    }

    let dropped = total_rows - records.len();
    if dropped > 0 {
        log::warn!("Dropped {dropped} of {total_rows} rows with unparsable time");
    } else {
        log::debug!("All {total_rows} rows have a valid time");
    }

    Ok(Dataset { records, dropped })
}

/// Interpret one time cell, or `None` if it should be dropped.
pub fn parse_time(raw: &RawTime, format: &str) -> Option<NaiveDateTime> {
    match raw {
        RawTime::Text(s) => NaiveDateTime::parse_from_str(s.trim(), format).ok(),
        RawTime::Moment(t) => Some(*t),
        RawTime::Missing => None,
    }
}
