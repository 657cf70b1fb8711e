//! Median of a dependent variable in bins of an independent one.
//!
//! For every bin `[edge, edge + width)` of a [`BinGrid`] the points whose `x`
//! falls in the bin are collected and their `y` values reduced to a
//! [`Spread`]. Bins holding fewer than `min_count` points report the empty
//! sentinel: zero median, zero scatter and a zero count.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::grid::BinGrid;
use crate::stats::Spread;
use crate::{BinError, Result};

/// Which statistic a row of [`BinnedMedians::to_array`] holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatisticKind {
    Median,
    LowerScatter,
    UpperScatter,
}

impl StatisticKind {
    pub const ALL: [StatisticKind; 3] = [
        StatisticKind::Median,
        StatisticKind::LowerScatter,
        StatisticKind::UpperScatter,
    ];

    pub fn index(self) -> usize {
        match self {
            StatisticKind::Median => 0,
            StatisticKind::LowerScatter => 1,
            StatisticKind::UpperScatter => 2,
        }
    }
}

/// Reduced statistics for one bin.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BinnedMedian {
    pub median: f64,
    pub lower_scatter: f64,
    pub upper_scatter: f64,
    /// Number of points that fell in the bin
    pub count: usize,
}

impl BinnedMedian {
    /// Whether this bin carries the empty sentinel.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn get(&self, kind: StatisticKind) -> f64 {
        match kind {
            StatisticKind::Median => self.median,
            StatisticKind::LowerScatter => self.lower_scatter,
            StatisticKind::UpperScatter => self.upper_scatter,
        }
    }
}

/// Per-bin medians over one grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinnedMedians {
    pub centers: Vec<f64>,
    pub bins: Vec<BinnedMedian>,
}

impl BinnedMedians {
    /// All-sentinel result for a grid, used before a snapshot is filled.
    pub fn empty(grid: &BinGrid) -> Self {
        Self {
            centers: grid.centers(),
            bins: vec![BinnedMedian::default(); grid.len()],
        }
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// `(center, bin)` pairs for bins that hold data.
    pub fn filled(&self) -> impl Iterator<Item = (f64, &BinnedMedian)> + '_ {
        self.centers
            .iter()
            .copied()
            .zip(self.bins.iter())
            .filter(|(_, bin)| !bin.is_empty())
    }

    /// Statistics as a `[kind, bin]` array; empty bins hold zeros.
    pub fn to_array(&self) -> Array2<f64> {
        Array2::from_shape_fn((StatisticKind::ALL.len(), self.bins.len()), |(k, i)| {
            self.bins[i].get(StatisticKind::ALL[k])
        })
    }
}

/// Reduce paired `x`/`y` arrays into per-bin medians with scatter.
///
/// Pairs where either value is not finite are skipped. `min_count` is the
/// smallest bin population that yields a statistic; it is raised to 1.
pub fn binned_medians(
    x: &[f64],
    y: &[f64],
    grid: &BinGrid,
    min_count: usize,
) -> Result<BinnedMedians> {
    if x.len() != y.len() {
        return Err(BinError::LengthMismatch {
            x_len: x.len(),
            y_len: y.len(),
        });
    }

    let mut members: Vec<Vec<f64>> = vec![Vec::new(); grid.len()];
    for (&xv, &yv) in x.iter().zip(y) {
        if !xv.is_finite() || !yv.is_finite() {
            continue;
        }
        if let Some(idx) = grid.interval_index(xv) {
            members[idx].push(yv);
        }
    }

    let min_count = min_count.max(1);
    let mut bins = Vec::with_capacity(grid.len());
    for values in &members {
        if values.len() < min_count {
            bins.push(BinnedMedian::default());
            continue;
        }
        let spread = Spread::of(values)?;
        bins.push(BinnedMedian {
            median: spread.median,
            lower_scatter: spread.lower,
            upper_scatter: spread.upper,
            count: values.len(),
        });
    }

    Ok(BinnedMedians {
        centers: grid.centers(),
        bins,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_three_points_two_bins() {
        let grid = BinGrid::from_bounds(10.0, 15.0, 1.0).unwrap();
        let result =
            binned_medians(&[11.0, 11.0, 12.0], &[9.0, 9.0, 10.0], &grid, 1).unwrap();

        assert_eq!(result.len(), 5);
        assert_eq!(result.bins[1].median, 9.0);
        assert_eq!(result.bins[1].lower_scatter, 0.0);
        assert_eq!(result.bins[1].upper_scatter, 0.0);
        assert_eq!(result.bins[2].median, 10.0);
        assert_eq!(result.bins[2].upper_scatter, 0.0);
        for idx in [0, 3, 4] {
            assert!(result.bins[idx].is_empty());
            assert_eq!(result.bins[idx].median, 0.0);
        }
    }

    #[test]
    fn test_min_count_marks_sparse_bins_empty() {
        let grid = BinGrid::from_bounds(0.0, 2.0, 1.0).unwrap();
        let x = [0.1, 0.2, 0.3, 1.5];
        let y = [1.0, 2.0, 3.0, 4.0];
        let result = binned_medians(&x, &y, &grid, 2).unwrap();
        assert_eq!(result.bins[0].count, 3);
        assert_relative_eq!(result.bins[0].median, 2.0);
        assert!(result.bins[1].is_empty());
    }

    #[test]
    fn test_non_finite_pairs_skipped() {
        let grid = BinGrid::from_bounds(0.0, 1.0, 1.0).unwrap();
        let x = [0.5, f64::NAN, 0.5, 0.5];
        let y = [1.0, 5.0, f64::NEG_INFINITY, 3.0];
        let result = binned_medians(&x, &y, &grid, 1).unwrap();
        assert_eq!(result.bins[0].count, 2);
        assert_relative_eq!(result.bins[0].median, 2.0);
    }

    #[test]
    fn test_length_mismatch() {
        let grid = BinGrid::from_bounds(0.0, 1.0, 0.5).unwrap();
        let err = binned_medians(&[0.1, 0.2], &[1.0], &grid, 1).unwrap_err();
        assert!(matches!(err, BinError::LengthMismatch { x_len: 2, y_len: 1 }));
    }

    #[test]
    fn test_array_layout_and_filled() {
        let grid = BinGrid::from_bounds(0.0, 3.0, 1.0).unwrap();
        let result = binned_medians(&[1.2], &[4.0], &grid, 1).unwrap();
        let array = result.to_array();
        assert_eq!(array.dim(), (3, 3));
        assert_eq!(array[[StatisticKind::Median.index(), 1]], 4.0);
        assert_eq!(array[[StatisticKind::Median.index(), 0]], 0.0);

        let filled: Vec<_> = result.filled().collect();
        assert_eq!(filled.len(), 1);
        assert_relative_eq!(filled[0].0, 1.5);
    }
}
