//! Snapshot redshift lookup.
//!
//! Simulation outputs are addressed by snapshot index, while analyses are
//! configured by redshift. A [`RedshiftTable`] holds the `(snapshot, redshift)`
//! pairs of a run and resolves each requested redshift to the snapshot whose
//! redshift is closest, rejecting requests that no snapshot matches within a
//! tolerance.

use std::path::Path;

use crate::catalog::text::read_text_table;
use crate::error::{GalformError, Result};

/// Largest accepted distance between a requested and a tabulated redshift.
pub const DEFAULT_TOLERANCE: f64 = 0.05;

/// Mapping between snapshot indices and their redshifts.
#[derive(Debug, Clone, PartialEq)]
pub struct RedshiftTable {
    /// `(redshift, snapshot)` sorted by ascending redshift
    entries: Vec<(f64, u32)>,
    tolerance: f64,
}

impl RedshiftTable {
    /// Build a table from `(snapshot, redshift)` pairs.
    ///
    /// # Errors
    ///
    /// * `InvalidConfig` if no pairs are given, a redshift is not finite or
    ///   negative, or a snapshot index repeats.
    pub fn from_pairs(pairs: &[(u32, f64)]) -> Result<Self> {
        if pairs.is_empty() {
            return Err(GalformError::InvalidConfig(
                "redshift table has no snapshots".to_string(),
            ));
        }

        let mut entries = Vec::with_capacity(pairs.len());
        for &(snapshot, z) in pairs {
            if !z.is_finite() || z < 0.0 {
                return Err(GalformError::InvalidConfig(format!(
                    "snapshot {snapshot} has invalid redshift {z}"
                )));
            }
            if entries.iter().any(|&(_, s)| s == snapshot) {
                return Err(GalformError::InvalidConfig(format!(
                    "snapshot {snapshot} listed twice in redshift table"
                )));
            }
            entries.push((z, snapshot));
        }
        entries.sort_by(|a, b| a.0.total_cmp(&b.0));

        Ok(Self {
            entries,
            tolerance: DEFAULT_TOLERANCE,
        })
    }

    /// Load `snapshot redshift` rows from a text file.
    ///
    /// Comment lines starting with `#` and blank lines are skipped; each data
    /// row must hold exactly two numbers, the first a non-negative integer.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use galform::redshift::RedshiftTable;
    ///
    /// let table = RedshiftTable::from_file("run/redshift_list").unwrap();
    /// let snapshot = table.snapshot_for(0.5).unwrap();
    /// println!("z=0.5 is snapshot {snapshot}");
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let table = read_text_table(path)?;
        if table.width() != 2 {
            return Err(GalformError::Parse {
                path: path.to_path_buf(),
                line: 1,
                message: format!(
                    "expected 'snapshot redshift' rows, found {} columns",
                    table.width()
                ),
            });
        }

        let pairs = table
            .rows
            .iter()
            .zip(&table.line_numbers)
            .map(|(row, &line)| {
                let snapshot = row[0];
                if !(snapshot >= 0.0 && snapshot.fract() == 0.0 && snapshot <= f64::from(u32::MAX)) {
                    return Err(GalformError::Parse {
                        path: path.to_path_buf(),
                        line,
                        message: format!("snapshot index {snapshot} is not a non-negative integer"),
                    });
                }
                Ok((snapshot as u32, row[1]))
            })
            .collect::<Result<Vec<(u32, f64)>>>()?;
        Self::from_pairs(&pairs)
    }

    /// Replace the matching tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Redshift of a snapshot, if tabulated.
    pub fn redshift_of(&self, snapshot: u32) -> Option<f64> {
        self.entries
            .iter()
            .find(|&&(_, s)| s == snapshot)
            .map(|&(z, _)| z)
    }

    /// Snapshot whose redshift is closest to `redshift`.
    ///
    /// Uses a binary search over the sorted redshifts and compares the two
    /// neighbours of the insertion point. Ties go to the lower redshift.
    pub fn snapshot_for(&self, redshift: f64) -> Result<u32> {
        let not_found = || GalformError::RedshiftNotFound {
            redshift,
            tolerance: self.tolerance,
        };
        if redshift.is_nan() || self.entries.is_empty() {
            return Err(not_found());
        }

        // partition_point returns the index of the first redshift > target
        let idx = self.entries.partition_point(|&(z, _)| z <= redshift);
        let below = idx.checked_sub(1).map(|i| self.entries[i]);
        let above = self.entries.get(idx).copied();

        let nearest = match (below, above) {
            (Some(lo), Some(hi)) => {
                if (redshift - lo.0) <= (hi.0 - redshift) {
                    lo
                } else {
                    hi
                }
            }
            (Some(lo), None) => lo,
            (None, Some(hi)) => hi,
            (None, None) => return Err(not_found()),
        };

        if (nearest.0 - redshift).abs() > self.tolerance {
            return Err(not_found());
        }
        Ok(nearest.1)
    }

    /// Resolve every requested redshift, failing on the first miss.
    pub fn snapshots_for(&self, redshifts: &[f64]) -> Result<Vec<u32>> {
        redshifts.iter().map(|&z| self.snapshot_for(z)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn table() -> RedshiftTable {
        RedshiftTable::from_pairs(&[(199, 0.0), (174, 0.508), (156, 1.003), (131, 2.0), (113, 3.01)])
            .unwrap()
    }

    #[test]
    fn test_nearest_snapshot() {
        let table = table();
        assert_eq!(table.snapshot_for(0.0).unwrap(), 199);
        assert_eq!(table.snapshot_for(0.5).unwrap(), 174);
        assert_eq!(table.snapshot_for(1.0).unwrap(), 156);
        assert_eq!(table.snapshot_for(3.0).unwrap(), 113);
        assert_eq!(
            table.snapshots_for(&[0.5, 1.0, 2.0, 3.0]).unwrap(),
            vec![174, 156, 131, 113]
        );
    }

    #[test]
    fn test_out_of_tolerance() {
        let table = table();
        assert!(matches!(
            table.snapshot_for(4.0),
            Err(GalformError::RedshiftNotFound { .. })
        ));
        assert!(table.snapshot_for(1.5).is_err());
        assert!(table.clone().with_tolerance(1.0).snapshot_for(4.0).is_ok());
        assert!(table.snapshot_for(f64::NAN).is_err());
    }

    #[test]
    fn test_empty_and_duplicate_rejected() {
        assert!(RedshiftTable::from_pairs(&[]).is_err());
        assert!(RedshiftTable::from_pairs(&[(1, 0.0), (1, 0.5)]).is_err());
        assert!(RedshiftTable::from_pairs(&[(1, -0.5)]).is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("redshift_list");
        std::fs::write(&path, "# snapshot redshift\n199 0.0\n156 1.0\n").unwrap();
        let table = RedshiftTable::from_file(&path).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.redshift_of(156), Some(1.0));
        assert_eq!(table.snapshot_for(0.98).unwrap(), 156);

        for bad in ["199 0.0\n-3 1.0\n", "199 0.0\n# gap\n156.5 1.0\n", "nan 0.5\n"] {
            std::fs::write(&path, bad).unwrap();
            assert!(matches!(
                RedshiftTable::from_file(&path),
                Err(GalformError::Parse { .. })
            ));
        }
        std::fs::write(&path, "199 0.0\n# gap\n156.5 1.0\n").unwrap();
        assert!(matches!(
            RedshiftTable::from_file(&path),
            Err(GalformError::Parse { line: 3, .. })
        ));

        std::fs::write(&path, "# nothing here\n").unwrap();
        assert!(matches!(
            RedshiftTable::from_file(&path),
            Err(GalformError::EmptyInput(_))
        ));
    }
}
