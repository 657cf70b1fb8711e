//! Luminosity function accumulation
//!
//! Counts are accumulated into one `[snapshot, component, band, bin]` array
//! per attenuation variant. Every subvolume of a snapshot adds its counts to
//! the snapshot's slot; once the snapshot is complete the slot is divided by
//! the snapshot volume. [`LuminosityAccumulator::finalize`] then converts the
//! densities to `log10` per magnitude per Mpc^3 and freezes the result.
//!
//! ```text
//! accumulate (subvolume 0..n) ──> normalize(volume) ──> ... next snapshot
//!                                                       │
//!                                          finalize(h0) ▼
//!                                            LuminosityFunctions
//! ```

use ndarray::{s, Array4, ArrayView3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use binstats::{BinGrid, Histogram};

use crate::catalog::{Attenuation, Component, GalaxyTable, Photometry};
use crate::cosmology::{validate_h0, volume_correction};
use crate::error::{GalformError, Result};
use crate::selection::with_stellar_mass;

/// Snapshot targeted by one accumulator slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSlot {
    pub redshift: f64,
    pub snapshot: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    Accumulating,
    Normalized,
}

fn attenuation_index(attenuation: Attenuation) -> usize {
    match attenuation {
        Attenuation::Dust => 0,
        Attenuation::NoDust => 1,
    }
}

/// Running luminosity function counts for one run.
#[derive(Debug, Clone)]
pub struct LuminosityAccumulator {
    grid: BinGrid,
    slots: Vec<SnapshotSlot>,
    bands: Vec<String>,
    threshold: f64,
    /// One array per attenuation variant, indexed `[slot, component, band, bin]`
    values: [Array4<f64>; 2],
    state: Vec<SlotState>,
}

impl LuminosityAccumulator {
    /// Allocate zeroed counts for `slots.len()` snapshots and the given bands.
    pub fn new(grid: BinGrid, slots: Vec<SnapshotSlot>, bands: Vec<String>, threshold: f64) -> Self {
        let shape = (slots.len(), Component::ALL.len(), bands.len(), grid.len());
        let state = vec![SlotState::Accumulating; slots.len()];
        Self {
            grid,
            slots,
            bands,
            threshold,
            values: [Array4::zeros(shape), Array4::zeros(shape)],
            state,
        }
    }

    pub fn grid(&self) -> &BinGrid {
        &self.grid
    }

    pub fn slots(&self) -> &[SnapshotSlot] {
        &self.slots
    }

    pub fn bands(&self) -> &[String] {
        &self.bands
    }

    fn check_slot(&self, index: usize, expected: SlotState, action: &str) -> Result<()> {
        match self.state.get(index) {
            None => Err(GalformError::AccumulatorState {
                index,
                message: format!("no such slot (accumulator has {})", self.slots.len()),
            }),
            Some(&state) if state != expected => Err(GalformError::AccumulatorState {
                index,
                message: format!("cannot {action}, slot is {state:?}"),
            }),
            Some(_) => Ok(()),
        }
    }

    /// Add one subvolume's photometry to a slot.
    ///
    /// `galaxies` must hold the stellar mass columns of the same subvolume;
    /// the photometry is expected to list exactly the galaxies with positive
    /// stellar mass.
    pub fn accumulate(
        &mut self,
        index: usize,
        galaxies: &GalaxyTable,
        attenuation: Attenuation,
        photometry: &Photometry,
    ) -> Result<()> {
        self.check_slot(index, SlotState::Accumulating, "accumulate")?;

        let selected = with_stellar_mass(galaxies)?.count();
        if photometry.len() != selected {
            return Err(GalformError::PhotometryMismatch {
                photometry: photometry.len(),
                galaxies: selected,
            });
        }
        if photometry.bands() != self.bands.as_slice() {
            return Err(GalformError::BandMismatch {
                expected: self.bands.clone(),
                found: photometry.bands().to_vec(),
            });
        }

        let values = &mut self.values[attenuation_index(attenuation)];
        for component in Component::ALL {
            for band in 0..self.bands.len() {
                let mut histogram = Histogram::from_grid(&self.grid);
                histogram.add_below(
                    photometry.magnitudes(component, band).iter().copied(),
                    self.threshold,
                );
                let mut lane = values.slice_mut(s![index, component.index(), band, ..]);
                for (value, &count) in lane.iter_mut().zip(histogram.counts()) {
                    *value += count as f64;
                }
            }
        }

        debug!(
            "Accumulated {} galaxies ({attenuation}) into slot {index}",
            photometry.len()
        );
        Ok(())
    }

    /// Divide a completed slot by the snapshot's total volume.
    ///
    /// # Errors
    ///
    /// * `NonPositiveVolume` if `volume` is not a positive finite number.
    /// * `AccumulatorState` if the slot was already normalized.
    pub fn normalize(&mut self, index: usize, volume: f64) -> Result<()> {
        self.check_slot(index, SlotState::Accumulating, "normalize")?;
        if !(volume.is_finite() && volume > 0.0) {
            return Err(GalformError::NonPositiveVolume {
                snapshot: self.slots[index].snapshot,
                volume,
            });
        }

        for values in self.values.iter_mut() {
            values
                .slice_mut(s![index, .., .., ..])
                .mapv_inplace(|v| v / volume);
        }
        self.state[index] = SlotState::Normalized;
        Ok(())
    }

    /// Counts (or densities once normalized) of one slot, `[component, band, bin]`.
    pub fn counts(&self, index: usize, attenuation: Attenuation) -> Result<ArrayView3<'_, f64>> {
        if index >= self.slots.len() {
            return Err(GalformError::AccumulatorState {
                index,
                message: format!("no such slot (accumulator has {})", self.slots.len()),
            });
        }
        Ok(self.values[attenuation_index(attenuation)].slice(s![index, .., .., ..]))
    }

    /// Convert every slot to log density and freeze the result.
    ///
    /// Bins with a positive density become
    /// `log10(v) + 3 log10(h0) - log10(width)`; the rest keep their value and
    /// are marked as holding no data.
    ///
    /// # Errors
    ///
    /// * `InvalidHubble` if `h0` is not a positive finite number.
    /// * `AccumulatorState` if any slot has not been normalized.
    pub fn finalize(self, h0: f64) -> Result<LuminosityFunctions> {
        validate_h0(h0, "luminosity function log step")?;
        if let Some(index) = self
            .state
            .iter()
            .position(|&state| state != SlotState::Normalized)
        {
            return Err(GalformError::AccumulatorState {
                index,
                message: "cannot finalize before every slot is normalized".to_string(),
            });
        }

        let offset = volume_correction(h0) - self.grid.width().log10();
        let has_data = self.values.clone().map(|values| values.mapv(|v| v > 0.0));
        let values = self.values.map(|mut values| {
            values.mapv_inplace(|v| if v > 0.0 { v.log10() + offset } else { v });
            values
        });

        Ok(LuminosityFunctions {
            centers: self.grid.centers(),
            slots: self.slots,
            bands: self.bands,
            values,
            has_data,
        })
    }
}

/// Frozen log densities for every slot, component and band.
#[derive(Debug, Clone)]
pub struct LuminosityFunctions {
    centers: Vec<f64>,
    slots: Vec<SnapshotSlot>,
    bands: Vec<String>,
    values: [Array4<f64>; 2],
    has_data: [Array4<bool>; 2],
}

impl LuminosityFunctions {
    pub fn centers(&self) -> &[f64] {
        &self.centers
    }

    pub fn slots(&self) -> &[SnapshotSlot] {
        &self.slots
    }

    pub fn bands(&self) -> &[String] {
        &self.bands
    }

    /// Full `[slot, component, band, bin]` array for one attenuation variant.
    pub fn array(&self, attenuation: Attenuation) -> &Array4<f64> {
        &self.values[attenuation_index(attenuation)]
    }

    /// Named record for one slot, component, band and attenuation.
    pub fn get(
        &self,
        index: usize,
        component: Component,
        band: &str,
        attenuation: Attenuation,
    ) -> Result<LuminosityFunction> {
        let slot = *self.slots.get(index).ok_or_else(|| GalformError::AccumulatorState {
            index,
            message: format!("no such slot (result has {})", self.slots.len()),
        })?;
        let band_idx = self
            .bands
            .iter()
            .position(|b| b == band)
            .ok_or_else(|| GalformError::UnknownBand(band.to_string()))?;

        let at = attenuation_index(attenuation);
        let lane = s![index, component.index(), band_idx, ..];
        Ok(LuminosityFunction {
            redshift: slot.redshift,
            snapshot: slot.snapshot,
            component,
            band: band.to_string(),
            attenuation,
            centers: self.centers.clone(),
            log_density: self.values[at].slice(lane).to_vec(),
            has_data: self.has_data[at].slice(lane).to_vec(),
        })
    }

    /// Every record of one slot, in component then band order.
    pub fn records(&self, index: usize, attenuation: Attenuation) -> Result<Vec<LuminosityFunction>> {
        let mut records = Vec::with_capacity(Component::ALL.len() * self.bands.len());
        for component in Component::ALL {
            for band in &self.bands {
                records.push(self.get(index, component, band, attenuation)?);
            }
        }
        Ok(records)
    }
}

/// Log density per magnitude for one (snapshot, component, band, attenuation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LuminosityFunction {
    pub redshift: f64,
    pub snapshot: u32,
    pub component: Component,
    pub band: String,
    pub attenuation: Attenuation,
    /// Bin centers in AB magnitudes
    pub centers: Vec<f64>,
    /// `log10(Φ / mag^-1 Mpc^-3)`; meaningful only where `has_data`
    pub log_density: Vec<f64>,
    pub has_data: Vec<bool>,
}

impl LuminosityFunction {
    /// `(magnitude, log density)` pairs of the bins holding galaxies.
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.centers
            .iter()
            .zip(&self.log_density)
            .zip(&self.has_data)
            .filter_map(|((&x, &y), &keep)| keep.then_some((x, y)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::columns;
    use approx::assert_relative_eq;
    use ndarray::Array3;

    fn grid() -> BinGrid {
        BinGrid::from_bounds(-24.0, -18.0, 1.0).unwrap()
    }

    fn slots() -> Vec<SnapshotSlot> {
        vec![
            SnapshotSlot {
                redshift: 0.5,
                snapshot: 174,
            },
            SnapshotSlot {
                redshift: 1.0,
                snapshot: 156,
            },
        ]
    }

    /// Every component carries the same magnitudes.
    fn photometry(mags: &[f64]) -> Photometry {
        let array = Array3::from_shape_fn((5, 1, mags.len()), |(_, _, g)| mags[g]);
        Photometry::new(vec!["K".to_string()], array).unwrap()
    }

    fn galaxies(n_massive: usize, n_empty: usize) -> GalaxyTable {
        let disk = std::iter::repeat(1e9)
            .take(n_massive)
            .chain(std::iter::repeat(0.0).take(n_empty))
            .collect::<Vec<_>>();
        GalaxyTable::new()
            .with_column(columns::MSTARS_DISK, disk.clone())
            .unwrap()
            .with_column(columns::MSTARS_BULGE, vec![0.0; disk.len()])
            .unwrap()
    }

    fn accumulator() -> LuminosityAccumulator {
        LuminosityAccumulator::new(grid(), slots(), vec!["K".to_string()], -1.0)
    }

    #[test]
    fn test_subvolumes_sum_into_slot() {
        let mut acc = accumulator();
        let a = photometry(&[-23.5, -23.2, -18.0, -0.5]);
        let b = photometry(&[-23.9, f64::NAN, -30.0]);
        acc.accumulate(0, &galaxies(4, 2), Attenuation::Dust, &a).unwrap();
        acc.accumulate(0, &galaxies(3, 0), Attenuation::Dust, &b).unwrap();

        let counts = acc.counts(0, Attenuation::Dust).unwrap();
        let total = counts.slice(s![Component::Total.index(), 0, ..]).to_vec();
        // -18.0 sits on the closing edge and lands in the last bin
        assert_eq!(total, vec![3.0, 0.0, 0.0, 0.0, 0.0, 1.0]);
        assert!(acc.counts(1, Attenuation::Dust).unwrap().iter().all(|&v| v == 0.0));
        assert!(acc.counts(0, Attenuation::NoDust).unwrap().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_photometry_mismatch() {
        let mut acc = accumulator();
        let err = acc
            .accumulate(0, &galaxies(2, 0), Attenuation::Dust, &photometry(&[-20.0]))
            .unwrap_err();
        assert!(matches!(
            err,
            GalformError::PhotometryMismatch {
                photometry: 1,
                galaxies: 2
            }
        ));
    }

    #[test]
    fn test_band_mismatch() {
        let mut acc = LuminosityAccumulator::new(grid(), slots(), vec!["r".to_string()], -1.0);
        let err = acc
            .accumulate(0, &galaxies(1, 0), Attenuation::Dust, &photometry(&[-20.0]))
            .unwrap_err();
        assert!(matches!(err, GalformError::BandMismatch { .. }));
    }

    #[test]
    fn test_zero_volume_is_an_error() {
        let mut acc = accumulator();
        acc.accumulate(0, &galaxies(1, 0), Attenuation::Dust, &photometry(&[-20.0]))
            .unwrap();
        let err = acc.normalize(0, 0.0).unwrap_err();
        assert!(matches!(
            err,
            GalformError::NonPositiveVolume {
                snapshot: 174,
                volume
            } if volume == 0.0
        ));
        assert!(acc.normalize(0, -5.0).is_err());
        // counts are untouched by the failed calls
        assert_eq!(acc.counts(0, Attenuation::Dust).unwrap().sum(), 5.0);
    }

    #[test]
    fn test_normalize_divides_and_locks_slot() {
        let mut acc = accumulator();
        acc.accumulate(0, &galaxies(2, 0), Attenuation::NoDust, &photometry(&[-20.5, -20.2]))
            .unwrap();
        acc.normalize(0, 4.0).unwrap();
        let value = acc.counts(0, Attenuation::NoDust).unwrap()[[Component::Disk.index(), 0, 3]];
        assert_relative_eq!(value, 0.5);

        assert!(matches!(
            acc.accumulate(0, &galaxies(0, 0), Attenuation::Dust, &photometry(&[])),
            Err(GalformError::AccumulatorState { index: 0, .. })
        ));
        assert!(acc.normalize(0, 4.0).is_err());
    }

    #[test]
    fn test_counts_of_unknown_slot() {
        let acc = accumulator();
        assert!(matches!(
            acc.counts(2, Attenuation::Dust),
            Err(GalformError::AccumulatorState { index: 2, .. })
        ));
    }

    #[test]
    fn test_finalize_rejects_invalid_h0() {
        for h0 in [0.0, -1.0, f64::NAN] {
            let mut acc = accumulator();
            acc.accumulate(0, &galaxies(1, 0), Attenuation::Dust, &photometry(&[-20.0]))
                .unwrap();
            acc.normalize(0, 10.0).unwrap();
            acc.normalize(1, 10.0).unwrap();
            assert!(matches!(
                acc.finalize(h0),
                Err(GalformError::InvalidHubble { .. })
            ));
        }
    }

    #[test]
    fn test_finalize_requires_all_slots() {
        let mut acc = accumulator();
        acc.normalize(0, 1.0).unwrap();
        assert!(matches!(
            acc.finalize(0.7),
            Err(GalformError::AccumulatorState { index: 1, .. })
        ));
    }

    #[test]
    fn test_finalize_log_density() {
        let mut acc = accumulator();
        acc.accumulate(0, &galaxies(2, 0), Attenuation::Dust, &photometry(&[-20.5, -20.2]))
            .unwrap();
        acc.normalize(0, 1000.0).unwrap();
        acc.normalize(1, 1000.0).unwrap();

        let h0 = 0.677;
        let lfs = acc.finalize(h0).unwrap();
        let lf = lfs.get(0, Component::Total, "K", Attenuation::Dust).unwrap();
        assert_eq!(lf.snapshot, 174);
        assert_eq!(lf.band, "K");

        let expected = (2.0f64 / 1000.0).log10() + 3.0 * h0.log10() - 1.0f64.log10();
        assert_relative_eq!(lf.log_density[3], expected, epsilon = 1e-12);
        for (idx, value) in lf.log_density.iter().enumerate() {
            if idx != 3 {
                assert_eq!(*value, 0.0);
                assert!(!lf.has_data[idx]);
            }
        }
        assert_eq!(lf.points(), vec![(-20.5, expected)]);

        let empty = lfs.get(1, Component::Disk, "K", Attenuation::NoDust).unwrap();
        assert!(empty.points().is_empty());
        assert!(empty.log_density.iter().all(|v| !v.is_nan()));

        assert!(lfs.get(0, Component::Total, "u", Attenuation::Dust).is_err());
        assert!(lfs.get(5, Component::Total, "K", Attenuation::Dust).is_err());
        assert_eq!(lfs.records(0, Attenuation::Dust).unwrap().len(), 5);
    }
}
