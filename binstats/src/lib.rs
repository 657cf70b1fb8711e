//! Binned statistics over large per-object numeric arrays.
//!
//! This crate holds the numeric core shared by the catalog analyses: fixed
//! bin grids built from a `(low, high, width)` triple, fixed-edge histograms
//! that accumulate across repeated calls, and binned medians with
//! percentile scatter.
//!
//! # Modules
//!
//! ## Bin grids (`grid`)
//! - **Edges**: `low + i * width` for `i < floor((high - low) / width)`
//! - **Centers**: `edge + width / 2`
//! - **Histogram edges**: grid edges closed by one extra edge at `high`
//!
//! ## Histograms (`histogram`)
//! Counting with half-open bins, the final bin closed on the right. Counts
//! from separate calls add, so subvolumes can be accumulated in any order.
//!
//! ## Robust statistics (`stats`, `binned`)
//! Median, nearest-rank percentiles, and per-bin median with 16th/84th
//! percentile scatter.
//!
//! # Example
//!
//! ```
//! use binstats::{BinGrid, Histogram};
//!
//! let grid = BinGrid::from_bounds(0.0, 5.0, 1.0).unwrap();
//! let mut hist = Histogram::from_grid(&grid);
//! hist.add_all([0.5, 1.5, 1.7, 5.0]);
//! assert_eq!(hist.counts(), &[1, 2, 0, 0, 1]);
//! ```

use thiserror::Error;

/// Errors raised while building grids or reducing arrays into bins.
#[derive(Debug, Error)]
pub enum BinError {
    /// Bin specification cannot produce a usable grid.
    #[error("invalid bin specification: {0}")]
    InvalidSpec(String),

    /// Histogram edges are too few or not strictly increasing.
    #[error("histogram error: {0}")]
    HistogramError(String),

    /// Paired arrays passed to a binned reduction differ in length.
    #[error("array length mismatch: x has {x_len} entries, y has {y_len}")]
    LengthMismatch {
        /// Length of the independent variable array.
        x_len: usize,
        /// Length of the dependent variable array.
        y_len: usize,
    },

    /// A statistic was requested over a sample with no usable values.
    #[error("insufficient data: {0}")]
    InsufficientData(String),
}

/// Result type for binning operations.
pub type Result<T> = std::result::Result<T, BinError>;

pub mod binned;
pub mod grid;
pub mod histogram;
pub mod stats;

pub use binned::{binned_medians, BinnedMedian, BinnedMedians, StatisticKind};
pub use grid::{BinGrid, BinSpec};
pub use histogram::Histogram;
pub use stats::{median, percentile_sorted, Spread};
