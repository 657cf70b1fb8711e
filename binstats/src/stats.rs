//! Robust central-tendency and spread statistics

use serde::{Deserialize, Serialize};

use crate::{BinError, Result};

/// Lower percentile used for the scatter around the median.
pub const LOWER_PERCENTILE: f64 = 0.16;
/// Upper percentile used for the scatter around the median.
pub const UPPER_PERCENTILE: f64 = 0.84;

/// Calculate median of a slice of f64 values
///
/// This function computes the median while filtering out NaN values but including
/// infinite values (±inf). For even-length data, returns the average of the two
/// middle values.
///
/// # Arguments
///
/// * `values` - Slice of f64 values to compute median from
///
/// # Returns
///
/// * `Ok(median)` - The median value
/// * `Err(BinError::InsufficientData)` - If no valid values remain after filtering NaN
pub fn median(values: &[f64]) -> Result<f64> {
    let mut valid_values: Vec<f64> = values.iter().filter(|v| !v.is_nan()).copied().collect();

    if valid_values.is_empty() {
        return Err(BinError::InsufficientData(format!(
            "cannot compute median: {} total values, 0 valid (all NaN)",
            values.len()
        )));
    }

    valid_values.sort_by(f64::total_cmp);
    Ok(median_sorted(&valid_values))
}

/// Median of an already sorted, non-empty slice.
fn median_sorted(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Nearest-rank percentile of an already sorted slice.
///
/// The rank is `floor(q * n)`, clamped to the last element, so a single
/// value is its own percentile for every `q`. Returns `None` when the
/// slice is empty.
pub fn percentile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let rank = (q.clamp(0.0, 1.0) * sorted.len() as f64).floor() as usize;
    Some(sorted[rank.min(sorted.len() - 1)])
}

/// Median with its distance to the 16th and 84th percentiles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spread {
    pub median: f64,
    /// `median - p16`, never negative
    pub lower: f64,
    /// `p84 - median`, never negative
    pub upper: f64,
}

impl Spread {
    /// Compute the spread of a sample; NaN entries are dropped.
    ///
    /// A one-element sample has zero scatter on both sides.
    pub fn of(values: &[f64]) -> Result<Self> {
        let mut sorted: Vec<f64> = values.iter().filter(|v| !v.is_nan()).copied().collect();
        if sorted.is_empty() {
            return Err(BinError::InsufficientData(
                "cannot compute spread of an empty sample".to_string(),
            ));
        }
        sorted.sort_by(f64::total_cmp);
        Ok(Self::of_sorted(&sorted))
    }

    fn of_sorted(sorted: &[f64]) -> Self {
        let median = median_sorted(sorted);
        // Both ranks exist for a non-empty slice
        let p16 = percentile_sorted(sorted, LOWER_PERCENTILE).unwrap_or(median);
        let p84 = percentile_sorted(sorted, UPPER_PERCENTILE).unwrap_or(median);
        Self {
            median,
            lower: (median - p16).abs(),
            upper: (p84 - median).abs(),
        }
    }
}
