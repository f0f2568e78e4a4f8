//! Centered rolling mean.
//!
//! For window `W` the row at index `i` averages `[i - W/2, i + W - W/2)`.
//! With an even `W` that is one more value before the row than after it:
//! the trailing side is favored. A row only gets a value when the whole
//! window lies inside the data and every value in it is present, so the
//! first `W/2` and the last `W - W/2 - 1` rows stay `None`.

use super::model::Dataset;
use crate::error::{ReportError, Result};

/// Return a copy of `dataset` with `smoothed` filled for a window of `window` rows.
pub fn smooth(dataset: &Dataset, window: usize) -> Result<Dataset> {
    if window == 0 {
        return Err(ReportError::InvalidWindow(window));
    }

    let values: Vec<Option<f64>> = dataset.records.iter().map(|r| r.total).collect();
    let means = centered_mean(&values, window);

    let mut out = dataset.clone();
    for (record, mean) in out.records.iter_mut().zip(means) {
        record.smoothed = mean;
    }

    log::debug!(
        "Smoothed {} rows with window {window}, {} have a value",
        out.len(),
        out.records.iter().filter(|r| r.smoothed.is_some()).count()
    );
    Ok(out)
}

/// Centered mean of `values` over `window` entries. `window` must be non-zero.
pub fn centered_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let half = window / 2;

    (0..n)
        .map(|i| {
            let start = i.checked_sub(half)?;
            let end = i + window - half;
            if end > n {
                return None;
            }
            let sum = values[start..end]
                .iter()
                .copied()
                .sum::<Option<f64>>()?;
            Some(sum / window as f64)
        })
        .collect()
}
