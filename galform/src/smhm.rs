//! Stellar and baryon mass versus halo mass
//!
//! For central galaxies with stellar mass, three quantities are reduced to
//! binned medians over `log10(M_halo / h^-1)`:
//!
//! * stellar mass, `log10(M_disk + M_bulge) - log10(h0)`
//! * all baryons relative to the cosmic fraction,
//!   `log10(M_bar) - log10(M_halo) - log10(Ωb / (ΩM - Ωb))`
//! * the same restricted to baryons resident in the halo (no reheated gas)
//!
//! Medians are not additive, so the subvolumes of a snapshot are concatenated
//! before a slot is filled.

use ndarray::Array3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use binstats::{binned_medians, BinGrid, BinnedMedians, StatisticKind};

use crate::catalog::{columns, GalaxyTable};
use crate::cosmology::{validate_h0, Cosmology};
use crate::error::{GalformError, Result};
use crate::luminosity::SnapshotSlot;
use crate::selection::centrals_with_stellar_mass;

/// Galaxy columns read for the halo-mass relations.
pub const REQUIRED_COLUMNS: [&str; 9] = [
    columns::MSTARS_DISK,
    columns::MSTARS_BULGE,
    columns::M_BH,
    columns::MGAS_DISK,
    columns::MGAS_BULGE,
    columns::MHOT,
    columns::MREHEATED,
    columns::MVIR_HOSTHALO,
    columns::TYPE,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HaloMassRelation {
    StellarMass,
    Baryons,
    HaloBaryons,
}

impl HaloMassRelation {
    pub const ALL: [HaloMassRelation; 3] = [
        HaloMassRelation::StellarMass,
        HaloMassRelation::Baryons,
        HaloMassRelation::HaloBaryons,
    ];
}

/// Per-galaxy x and y values of the three relations.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HaloMassSample {
    pub log_halo_mass: Vec<f64>,
    pub stellar_mass: Vec<f64>,
    pub baryons: Vec<f64>,
    pub halo_baryons: Vec<f64>,
}

impl HaloMassSample {
    /// Derive the relation values of the selected central galaxies.
    pub fn from_table(table: &GalaxyTable, h0: f64, cosmology: &Cosmology) -> Result<Self> {
        let selection = centrals_with_stellar_mass(table)?;
        let disk = table.column(columns::MSTARS_DISK)?;
        let bulge = table.column(columns::MSTARS_BULGE)?;
        let bh = table.column(columns::M_BH)?;
        let gas_disk = table.column(columns::MGAS_DISK)?;
        let gas_bulge = table.column(columns::MGAS_BULGE)?;
        let hot = table.column(columns::MHOT)?;
        let reheated = table.column(columns::MREHEATED)?;
        let halo = table.column(columns::MVIR_HOSTHALO)?;

        let log_h0 = h0.log10();
        let baryon_ratio = cosmology.baryon_ratio_log();
        let resident = |i: usize| disk[i] + bulge[i] + bh[i] + gas_disk[i] + gas_bulge[i] + hot[i];

        Ok(Self {
            log_halo_mass: selection.map(|i| halo[i].log10() - log_h0),
            stellar_mass: selection.map(|i| (disk[i] + bulge[i]).log10() - log_h0),
            baryons: selection.map(|i| {
                (resident(i) + reheated[i]).log10() - halo[i].log10() - baryon_ratio
            }),
            halo_baryons: selection.map(|i| resident(i).log10() - halo[i].log10() - baryon_ratio),
        })
    }

    pub fn len(&self) -> usize {
        self.log_halo_mass.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log_halo_mass.is_empty()
    }

    pub fn values(&self, relation: HaloMassRelation) -> &[f64] {
        match relation {
            HaloMassRelation::StellarMass => &self.stellar_mass,
            HaloMassRelation::Baryons => &self.baryons,
            HaloMassRelation::HaloBaryons => &self.halo_baryons,
        }
    }
}

/// Binned medians of the three relations for one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRelations {
    pub slot: SnapshotSlot,
    pub stellar_mass: BinnedMedians,
    pub baryons: BinnedMedians,
    pub halo_baryons: BinnedMedians,
}

impl SnapshotRelations {
    pub fn get(&self, relation: HaloMassRelation) -> &BinnedMedians {
        match relation {
            HaloMassRelation::StellarMass => &self.stellar_mass,
            HaloMassRelation::Baryons => &self.baryons,
            HaloMassRelation::HaloBaryons => &self.halo_baryons,
        }
    }

    /// Plot-ready points of one relation, empty bins dropped.
    pub fn series(&self, relation: HaloMassRelation) -> MedianSeries {
        MedianSeries {
            redshift: self.slot.redshift,
            snapshot: self.slot.snapshot,
            relation,
            points: self
                .get(relation)
                .filled()
                .map(|(x, bin)| MedianPoint {
                    x,
                    median: bin.median,
                    lower_scatter: bin.lower_scatter,
                    upper_scatter: bin.upper_scatter,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MedianPoint {
    pub x: f64,
    pub median: f64,
    pub lower_scatter: f64,
    pub upper_scatter: f64,
}

/// One relation at one redshift, restricted to bins with data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedianSeries {
    pub redshift: f64,
    pub snapshot: u32,
    pub relation: HaloMassRelation,
    pub points: Vec<MedianPoint>,
}

/// Per-snapshot halo-mass relations, filled once per slot.
#[derive(Debug, Clone)]
pub struct SmhmAccumulator {
    grid: BinGrid,
    min_count: usize,
    cosmology: Cosmology,
    slots: Vec<SnapshotSlot>,
    filled: Vec<Option<SnapshotRelations>>,
}

impl SmhmAccumulator {
    pub fn new(grid: BinGrid, slots: Vec<SnapshotSlot>, min_count: usize, cosmology: Cosmology) -> Self {
        let filled = vec![None; slots.len()];
        Self {
            grid,
            min_count,
            cosmology,
            slots,
            filled,
        }
    }

    pub fn grid(&self) -> &BinGrid {
        &self.grid
    }

    pub fn slots(&self) -> &[SnapshotSlot] {
        &self.slots
    }

    /// Compute the medians of one snapshot from all its galaxies.
    pub fn fill(&mut self, index: usize, galaxies: &GalaxyTable, h0: f64) -> Result<()> {
        let slot = *self.slots.get(index).ok_or_else(|| GalformError::AccumulatorState {
            index,
            message: format!("no such slot (accumulator has {})", self.slots.len()),
        })?;
        if self.filled[index].is_some() {
            return Err(GalformError::AccumulatorState {
                index,
                message: "slot already filled".to_string(),
            });
        }

        validate_h0(h0, &format!("snapshot {}", slot.snapshot))?;
        let sample = HaloMassSample::from_table(galaxies, h0, &self.cosmology)?;
        debug!(
            "Snapshot {}: {} of {} galaxies are centrals with stellar mass",
            slot.snapshot,
            sample.len(),
            galaxies.len()
        );

        let reduce = |relation| {
            binned_medians(
                &sample.log_halo_mass,
                sample.values(relation),
                &self.grid,
                self.min_count,
            )
        };
        let relations = SnapshotRelations {
            slot,
            stellar_mass: reduce(HaloMassRelation::StellarMass)?,
            baryons: reduce(HaloMassRelation::Baryons)?,
            halo_baryons: reduce(HaloMassRelation::HaloBaryons)?,
        };
        self.filled[index] = Some(relations);
        Ok(())
    }

    /// Freeze the results once every slot is filled.
    pub fn finish(self) -> Result<SmhmResults> {
        let mut snapshots = Vec::with_capacity(self.filled.len());
        for (index, relations) in self.filled.into_iter().enumerate() {
            snapshots.push(relations.ok_or_else(|| GalformError::AccumulatorState {
                index,
                message: "cannot finish before every slot is filled".to_string(),
            })?);
        }
        Ok(SmhmResults {
            centers: self.grid.centers(),
            snapshots,
        })
    }
}

/// Halo-mass relations of every requested snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmhmResults {
    pub centers: Vec<f64>,
    pub snapshots: Vec<SnapshotRelations>,
}

impl SmhmResults {
    /// `[slot, statistic, bin]` array of one relation; empty bins hold zeros.
    pub fn to_array(&self, relation: HaloMassRelation) -> Array3<f64> {
        let n_bins = self.centers.len();
        Array3::from_shape_fn(
            (self.snapshots.len(), StatisticKind::ALL.len(), n_bins),
            |(slot, kind, bin)| {
                self.snapshots[slot].get(relation).bins[bin].get(StatisticKind::ALL[kind])
            },
        )
    }

    pub fn series(&self, relation: HaloMassRelation) -> Vec<MedianSeries> {
        self.snapshots
            .iter()
            .map(|snapshot| snapshot.series(relation))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn table(rows: &[[f64; 9]]) -> GalaxyTable {
        let mut table = GalaxyTable::new();
        for (col, name) in REQUIRED_COLUMNS.iter().enumerate() {
            table
                .insert_column(*name, rows.iter().map(|r| r[col]).collect())
                .unwrap();
        }
        table
    }

    fn slot() -> SnapshotSlot {
        SnapshotSlot {
            redshift: 0.0,
            snapshot: 199,
        }
    }

    #[test]
    fn test_sample_values() {
        // disk, bulge, bh, gas_disk, gas_bulge, hot, reheated, halo, type
        let rows = [
            [6e9, 4e9, 1e7, 2e9, 1e8, 5e10, 3e9, 1e12, 0.0],
            [1e9, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1e11, 1.0],
            [0.0, 0.0, 0.0, 1e9, 0.0, 0.0, 0.0, 1e11, 0.0],
            [1e9, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        ];
        let h0 = 0.6751;
        let cosmo = Cosmology::default();
        let sample = HaloMassSample::from_table(&table(&rows), h0, &cosmo).unwrap();
        assert_eq!(sample.len(), 1);

        assert_relative_eq!(sample.log_halo_mass[0], 12.0 - h0.log10(), epsilon = 1e-12);
        assert_relative_eq!(sample.stellar_mass[0], 1e10f64.log10() - h0.log10(), epsilon = 1e-12);

        let resident: f64 = 6e9 + 4e9 + 1e7 + 2e9 + 1e8 + 5e10;
        let ratio = (0.0491f64 / (0.3121 - 0.0491)).log10();
        assert_relative_eq!(
            sample.halo_baryons[0],
            resident.log10() - 12.0 - ratio,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            sample.baryons[0],
            (resident + 3e9).log10() - 12.0 - ratio,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_fill_and_export() {
        let grid = BinGrid::from_bounds(10.0, 15.0, 0.2).unwrap();
        let mut acc = SmhmAccumulator::new(grid, vec![slot()], 1, Cosmology::default());
        let rows = [
            [1e10, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.05e12, 0.0],
            [2e10, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.05e12, -1.0],
        ];
        acc.fill(0, &table(&rows), 1.0).unwrap();
        assert!(acc.fill(0, &table(&rows), 1.0).is_err());
        assert!(acc.fill(3, &table(&rows), 1.0).is_err());

        let results = acc.finish().unwrap();
        let array = results.to_array(HaloMassRelation::StellarMass);
        assert_eq!(array.dim(), (1, 3, 25));

        // log10(1.05e12) falls in [12.0, 12.2), bin 10
        let bin = &results.snapshots[0].stellar_mass.bins[10];
        assert_eq!(bin.count, 2);
        assert_relative_eq!(array[[0, 0, 10]], bin.median);
        assert_eq!(array[[0, 0, 9]], 0.0);

        let series = results.series(HaloMassRelation::StellarMass);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].points.len(), 1);
        assert_relative_eq!(series[0].points[0].x, 12.1, epsilon = 1e-9);
    }

    #[test]
    fn test_fill_rejects_invalid_h0() {
        let grid = BinGrid::from_bounds(10.0, 15.0, 0.2).unwrap();
        let mut acc = SmhmAccumulator::new(grid, vec![slot()], 1, Cosmology::default());
        let rows = [[1e10, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.05e12, 0.0]];
        for h0 in [f64::NAN, 0.0, -0.7] {
            assert!(matches!(
                acc.fill(0, &table(&rows), h0),
                Err(GalformError::InvalidHubble { .. })
            ));
        }
        // The slot is still open after the rejected calls
        acc.fill(0, &table(&rows), 0.7).unwrap();
    }

    #[test]
    fn test_finish_requires_every_slot() {
        let grid = BinGrid::from_bounds(10.0, 15.0, 0.2).unwrap();
        let acc = SmhmAccumulator::new(grid, vec![slot(), slot()], 1, Cosmology::default());
        assert!(matches!(
            acc.finish(),
            Err(GalformError::AccumulatorState { index: 0, .. })
        ));
    }
}
