//! Fixed-edge histograms
//!
//! Counting follows the usual numerical convention: every bin is half-open
//! `[lo, hi)` except the last, which also takes values equal to its upper
//! edge. Values outside the edges and NaN are ignored.

use crate::grid::BinGrid;
use crate::{BinError, Result};

/// Histogram over explicit, strictly increasing bin edges
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// Bin edges (boundaries between bins)
    bin_edges: Vec<f64>,
    /// Counts in each bin
    counts: Vec<u64>,
    /// Total number of values that landed in a bin
    total_count: u64,
}

impl Histogram {
    /// Create a new histogram with specified bin edges
    pub fn new(bin_edges: Vec<f64>) -> Result<Self> {
        if bin_edges.len() < 2 {
            return Err(BinError::HistogramError(
                "Histogram must have at least 2 bin edges".to_string(),
            ));
        }

        for pair in bin_edges.windows(2) {
            match pair[0].partial_cmp(&pair[1]) {
                Some(std::cmp::Ordering::Less) => {}
                _ => {
                    return Err(BinError::HistogramError(
                        "Histogram bin edges must be in ascending order".to_string(),
                    ));
                }
            }
        }

        let num_bins = bin_edges.len() - 1;
        Ok(Self {
            bin_edges,
            counts: vec![0; num_bins],
            total_count: 0,
        })
    }

    /// Histogram over a grid's edges closed at the grid's upper bound.
    pub fn from_grid(grid: &BinGrid) -> Self {
        let bin_edges = grid.histogram_edges();
        let num_bins = bin_edges.len() - 1;
        Self {
            bin_edges,
            counts: vec![0; num_bins],
            total_count: 0,
        }
    }

    /// Add a value to the histogram
    pub fn add(&mut self, value: f64) {
        if let Some(idx) = self.find_bin(value) {
            self.counts[idx] += 1;
            self.total_count += 1;
        }
    }

    /// Add multiple values to the histogram
    pub fn add_all<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = f64>,
    {
        for value in values {
            self.add(value);
        }
    }

    /// Add every value strictly below `threshold`.
    pub fn add_below<I>(&mut self, values: I, threshold: f64)
    where
        I: IntoIterator<Item = f64>,
    {
        self.add_all(values.into_iter().filter(|&v| v < threshold));
    }

    /// Fold another histogram with identical edges into this one.
    pub fn merge(&mut self, other: &Histogram) -> Result<()> {
        if self.bin_edges != other.bin_edges {
            return Err(BinError::HistogramError(
                "cannot merge histograms with different bin edges".to_string(),
            ));
        }
        for (count, extra) in self.counts.iter_mut().zip(&other.counts) {
            *count += extra;
        }
        self.total_count += other.total_count;
        Ok(())
    }

    /// Find the bin index for a value
    fn find_bin(&self, value: f64) -> Option<usize> {
        let first = self.bin_edges[0];
        let last = self.bin_edges[self.bin_edges.len() - 1];
        if value.is_nan() || value < first || value > last {
            return None;
        }

        // The last bin is closed on the right
        if value == last {
            return Some(self.counts.len() - 1);
        }

        self.bin_edges
            .partition_point(|&edge| edge <= value)
            .checked_sub(1)
    }

    /// Get the counts in each bin
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Get the bin edges
    pub fn bin_edges(&self) -> &[f64] {
        &self.bin_edges
    }

    /// Get the total count
    pub fn total_count(&self) -> u64 {
        self.total_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_histogram_creation() {
        let bin_edges = vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let hist = Histogram::new(bin_edges).unwrap();
        assert_eq!(hist.counts.len(), 5);
        assert_eq!(hist.total_count, 0);
    }

    #[test]
    fn test_histogram_adding_values() {
        let bin_edges = vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let mut hist = Histogram::new(bin_edges).unwrap();

        hist.add(0.5);
        hist.add(1.5);
        hist.add(1.7);
        hist.add(2.2);
        hist.add(4.9);

        assert_eq!(hist.counts, vec![1, 2, 1, 0, 1]);
        assert_eq!(hist.total_count, 5);
    }

    #[test]
    fn test_histogram_edge_values() {
        let bin_edges = vec![0.0, 1.0, 2.0];
        let mut hist = Histogram::new(bin_edges).unwrap();

        // Interior edges go to the bin on their right
        hist.add(1.0);
        // Final edge is inside the last bin
        hist.add(2.0);
        hist.add(0.0);

        assert_eq!(hist.counts, vec![1, 2]);
    }

    #[test]
    fn test_histogram_out_of_range() {
        let mut hist = Histogram::new(vec![0.0, 1.0, 2.0]).unwrap();
        hist.add_all([-0.1, 2.1, f64::NAN, f64::INFINITY, f64::NEG_INFINITY]);
        assert_eq!(hist.counts, vec![0, 0]);
        assert_eq!(hist.total_count, 0);
    }

    #[test]
    fn test_histogram_invalid_edges() {
        assert!(Histogram::new(vec![1.0]).is_err());
        assert!(Histogram::new(vec![0.0, 2.0, 1.0]).is_err());
        assert!(Histogram::new(vec![0.0, 1.0, 1.0]).is_err());
    }

    #[test]
    fn test_add_below_threshold_is_strict() {
        let grid = BinGrid::from_bounds(-5.0, 0.0, 1.0).unwrap();
        let mut hist = Histogram::from_grid(&grid);
        hist.add_below([-4.5, -1.0, -0.5, -1.5], -1.0);
        assert_eq!(hist.counts(), &[1, 0, 0, 1, 0]);
    }

    #[test]
    fn test_merge_requires_same_edges() {
        let mut a = Histogram::new(vec![0.0, 1.0, 2.0]).unwrap();
        let mut b = Histogram::new(vec![0.0, 1.0, 2.0]).unwrap();
        let c = Histogram::new(vec![0.0, 0.5, 2.0]).unwrap();
        a.add(0.2);
        b.add(1.2);
        b.add(0.3);

        a.merge(&b).unwrap();
        assert_eq!(a.counts(), &[2, 1]);
        assert_eq!(a.total_count(), 3);
        assert!(a.merge(&c).is_err());
    }
}
