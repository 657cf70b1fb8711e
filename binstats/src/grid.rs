//! Fixed, monotonically increasing bin grids.
//!
//! A grid is derived from a `(low, high, width)` triple the same way for
//! every analysis: edges start at `low` and step by `width`, and the number
//! of edges is `floor((high - low) / width)`. Histograms close the grid with
//! one extra edge at `high`.

use serde::{Deserialize, Serialize};

use crate::{BinError, Result};

/// Relative slack applied before flooring the bin count, so that exact
/// multiples which round just below an integer (5.0 / 0.2) keep their last bin.
const COUNT_TOLERANCE: f64 = 1e-9;

/// Configured `(low, high, width)` triple for a bin grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinSpec {
    /// Lower bound of the first bin
    pub low: f64,
    /// Upper bound of the grid, used as the closing histogram edge
    pub high: f64,
    /// Bin width
    pub width: f64,
}

impl BinSpec {
    pub fn new(low: f64, high: f64, width: f64) -> Self {
        Self { low, high, width }
    }

    /// Check that the triple describes at least one finite bin.
    pub fn validate(&self) -> Result<()> {
        if !self.low.is_finite() || !self.high.is_finite() || !self.width.is_finite() {
            return Err(BinError::InvalidSpec(format!(
                "bounds and width must be finite, got ({}, {}, {})",
                self.low, self.high, self.width
            )));
        }
        if self.width <= 0.0 {
            return Err(BinError::InvalidSpec(format!(
                "width must be positive, got {}",
                self.width
            )));
        }
        if self.high <= self.low {
            return Err(BinError::InvalidSpec(format!(
                "high ({}) must be greater than low ({})",
                self.high, self.low
            )));
        }
        if self.bin_count() == 0 {
            return Err(BinError::InvalidSpec(format!(
                "width {} is wider than the range {}..{}",
                self.width, self.low, self.high
            )));
        }
        Ok(())
    }

    /// Number of bins, `floor((high - low) / width)`.
    pub fn bin_count(&self) -> usize {
        let ratio = (self.high - self.low) / self.width;
        if !ratio.is_finite() || ratio <= 0.0 {
            return 0;
        }
        (ratio + ratio * COUNT_TOLERANCE).floor() as usize
    }
}

/// Bin edges and centers derived from a [`BinSpec`].
#[derive(Debug, Clone, PartialEq)]
pub struct BinGrid {
    spec: BinSpec,
    edges: Vec<f64>,
}

impl BinGrid {
    /// Build the grid for a validated spec.
    pub fn new(spec: BinSpec) -> Result<Self> {
        spec.validate()?;
        let edges = (0..spec.bin_count())
            .map(|i| spec.low + i as f64 * spec.width)
            .collect();
        Ok(Self { spec, edges })
    }

    pub fn from_bounds(low: f64, high: f64, width: f64) -> Result<Self> {
        Self::new(BinSpec::new(low, high, width))
    }

    pub fn spec(&self) -> BinSpec {
        self.spec
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn width(&self) -> f64 {
        self.spec.width
    }

    pub fn low(&self) -> f64 {
        self.spec.low
    }

    pub fn high(&self) -> f64 {
        self.spec.high
    }

    /// Lower edge of every bin.
    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Bin centers, `edge + width / 2`.
    pub fn centers(&self) -> Vec<f64> {
        self.edges
            .iter()
            .map(|&edge| edge + self.spec.width / 2.0)
            .collect()
    }

    /// Grid edges plus the closing edge at `high`.
    pub fn histogram_edges(&self) -> Vec<f64> {
        let mut edges = Vec::with_capacity(self.edges.len() + 1);
        edges.extend_from_slice(&self.edges);
        edges.push(self.spec.high);
        edges
    }

    /// Index of the bin `[edge, edge + width)` containing `x`.
    ///
    /// Used by the binned medians, where every bin has the nominal width
    /// and the right edge is always open.
    pub fn interval_index(&self, x: f64) -> Option<usize> {
        if x.is_nan() || x < self.spec.low {
            return None;
        }
        let idx = self.edges.partition_point(|&edge| edge <= x).checked_sub(1)?;
        if x < self.edges[idx] + self.spec.width {
            Some(idx)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bin_count_matches_floor() {
        let spec = BinSpec::new(10.0, 15.0, 0.2);
        assert_eq!(spec.bin_count(), 25);

        let spec = BinSpec::new(0.0, 1.0, 0.3);
        assert_eq!(spec.bin_count(), 3);

        let spec = BinSpec::new(-30.0, -10.0, 0.5);
        assert_eq!(spec.bin_count(), 40);
    }

    #[test]
    fn test_centers_offset_by_half_width() {
        let grid = BinGrid::from_bounds(10.0, 15.0, 1.0).unwrap();
        assert_eq!(grid.len(), 5);
        for (edge, center) in grid.edges().iter().zip(grid.centers()) {
            assert_relative_eq!(center, edge + 0.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_histogram_edges_close_at_high() {
        let grid = BinGrid::from_bounds(0.0, 1.0, 0.3).unwrap();
        let edges = grid.histogram_edges();
        assert_eq!(edges.len(), 4);
        assert_eq!(*edges.last().unwrap(), 1.0);
    }

    #[test]
    fn test_invalid_specs_rejected() {
        assert!(BinGrid::from_bounds(0.0, 1.0, 0.0).is_err());
        assert!(BinGrid::from_bounds(0.0, 1.0, -0.1).is_err());
        assert!(BinGrid::from_bounds(1.0, 1.0, 0.1).is_err());
        assert!(BinGrid::from_bounds(0.0, 1.0, 2.0).is_err());
        assert!(BinGrid::from_bounds(f64::NAN, 1.0, 0.1).is_err());
    }

    #[test]
    fn test_interval_index_half_open() {
        let grid = BinGrid::from_bounds(10.0, 15.0, 1.0).unwrap();
        assert_eq!(grid.interval_index(10.0), Some(0));
        assert_eq!(grid.interval_index(11.0), Some(1));
        assert_eq!(grid.interval_index(11.999), Some(1));
        assert_eq!(grid.interval_index(14.5), Some(4));
        assert_eq!(grid.interval_index(15.0), None);
        assert_eq!(grid.interval_index(9.99), None);
        assert_eq!(grid.interval_index(f64::NAN), None);
    }
}
