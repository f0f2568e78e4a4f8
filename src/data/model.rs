use chrono::NaiveDateTime;

// ---------------------------------------------------------------------------
// RawTime – a single cell of the time column as the loader saw it
// ---------------------------------------------------------------------------

/// The time cell before normalization.
///
/// Spreadsheets and parquet files may already store a typed date-time; those
/// are kept as [`RawTime::Moment`] and are not re-parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum RawTime {
    Text(String),
    Moment(NaiveDateTime),
    Missing,
}

// ---------------------------------------------------------------------------
// RawValue – a single cell of the value column
// ---------------------------------------------------------------------------

/// The value cell before normalization. Text that is not a number is kept
/// as-is; it only matters if the row survives time parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Number(f64),
    Text(String),
    Missing,
}

impl RawValue {
    /// Classify a text cell: blank is missing, numeric text is a number.
    pub fn from_text(s: &str) -> Self {
        let t = s.trim();
        if t.is_empty() {
            return RawValue::Missing;
        }
        match t.parse::<f64>() {
            Ok(v) => RawValue::Number(v),
            Err(_) => RawValue::Text(t.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// RawRow – one row of the source table
// ---------------------------------------------------------------------------

/// One row of the source table, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub time: RawTime,
    pub total: RawValue,
}

#[cfg(test)]
impl RawRow {
    pub fn text(time: &str, total: f64) -> Self {
        Self {
            time: RawTime::Text(time.to_string()),
            total: RawValue::Number(total),
        }
    }
}

// ---------------------------------------------------------------------------
// Record / Dataset – rows that survived time normalization
// ---------------------------------------------------------------------------

/// A row with a valid timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub time: NaiveDateTime,
    pub total: Option<f64>,
    /// Centered moving average; `None` until smoothed, and for boundary rows.
    pub smoothed: Option<f64>,
}

/// Cleaned rows in file (chronological) order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub records: Vec<Record>,
    /// Rows discarded by the normalizer.
    pub dropped: usize,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// `(time, smoothed)` pairs for rows that have a smoothed value.
    pub fn smoothed_points(&self) -> impl Iterator<Item = (NaiveDateTime, f64)> + '_ {
        self.records
            .iter()
            .filter_map(|r| r.smoothed.map(|v| (r.time, v)))
    }

    /// Earliest and latest timestamp, if any rows remain.
    pub fn time_span(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let min = self.records.iter().map(|r| r.time).min()?;
        let max = self.records.iter().map(|r| r.time).max()?;
        Some((min, max))
    }
}
