//! Observational comparison tables
//!
//! Published measurements are read from plain-text tables and turned into
//! points with asymmetric error bars in log space. Tables that combine
//! several redshifts carry a group column; subsets are selected by that
//! column's value.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::text::read_text_table;
use crate::error::{GalformError, Result};

/// K-band Vega to AB magnitude offset
pub const VEGA_TO_AB_K: f64 = 1.85;

/// How the y column and its errors are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueScale {
    /// Linear densities, converted to `log10` on load
    #[default]
    Linear,
    /// Already `log10`; errors are taken as given
    Log10,
}

/// Zero-based column positions of one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationColumns {
    pub x: usize,
    /// Upper edge of an x range; x becomes the range midpoint
    #[serde(default)]
    pub x_upper: Option<usize>,
    pub y: usize,
    /// Upper error, also used as the lower error when `err_down` is absent
    #[serde(default)]
    pub err_up: Option<usize>,
    #[serde(default)]
    pub err_down: Option<usize>,
    /// Redshift (or other grouping) of each row
    #[serde(default)]
    pub group: Option<usize>,
}

/// Where to find one observational data set and how to read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationSource {
    pub label: String,
    pub path: PathBuf,
    pub columns: ObservationColumns,
    #[serde(default)]
    pub scale: ValueScale,
    /// Added to every x, e.g. [`VEGA_TO_AB_K`]
    #[serde(default)]
    pub x_offset: f64,
}

/// A measurement with error bars measured from `y`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObservationPoint {
    pub x: f64,
    pub y: f64,
    /// Distance below `y`; `None` when the lower bound is not positive
    pub err_down: Option<f64>,
    pub err_up: Option<f64>,
    pub group: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationTable {
    pub label: String,
    pub points: Vec<ObservationPoint>,
}

fn column(row: &[f64], idx: usize, path: &Path) -> Result<f64> {
    row.get(idx).copied().ok_or_else(|| GalformError::MissingColumn {
        table: path.display().to_string(),
        column: format!("column {idx}"),
    })
}

fn optional(row: &[f64], idx: Option<usize>, path: &Path) -> Result<Option<f64>> {
    idx.map(|i| column(row, i, path)).transpose()
}

impl ObservationTable {
    /// Read a table described by `source`, relative to `dir` when the path is relative.
    pub fn load<P: AsRef<Path>>(dir: P, source: &ObservationSource) -> Result<Self> {
        let path = dir.as_ref().join(&source.path);
        let table = read_text_table(&path)?;
        let cols = source.columns;

        let mut points = Vec::with_capacity(table.rows.len());
        for row in &table.rows {
            let x_low = column(row, cols.x, &path)?;
            let x = match optional(row, cols.x_upper, &path)? {
                Some(x_high) => (x_low + x_high) / 2.0,
                None => x_low,
            } + source.x_offset;
            let value = column(row, cols.y, &path)?;
            let up = optional(row, cols.err_up, &path)?;
            let down = optional(row, cols.err_down, &path)?.or(up);
            let group = optional(row, cols.group, &path)?;

            let point = match source.scale {
                ValueScale::Log10 => ObservationPoint {
                    x,
                    y: value,
                    err_down: down,
                    err_up: up,
                    group,
                },
                ValueScale::Linear => {
                    if value.is_nan() || value <= 0.0 {
                        debug!(
                            "Dropping non-positive value {value} at x={x} from {}",
                            path.display()
                        );
                        continue;
                    }
                    let y = value.log10();
                    let err_down = down
                        .map(|d| value - d)
                        .filter(|&lower| lower > 0.0)
                        .map(|lower| y - lower.log10());
                    let err_up = up.map(|u| (value + u).log10() - y);
                    ObservationPoint {
                        x,
                        y,
                        err_down,
                        err_up,
                        group,
                    }
                }
            };
            points.push(point);
        }

        Ok(Self {
            label: source.label.clone(),
            points,
        })
    }

    /// Rows whose group lies within `tolerance` of `group`.
    pub fn select_group(&self, group: f64, tolerance: f64) -> ObservationTable {
        ObservationTable {
            label: self.label.clone(),
            points: self
                .points
                .iter()
                .filter(|p| p.group.is_some_and(|g| (g - group).abs() <= tolerance))
                .copied()
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
