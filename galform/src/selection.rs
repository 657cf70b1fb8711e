//! Galaxy selections shared by the analyses.
//!
//! Galaxies without stellar mass never enter a statistic. The halo-mass
//! relations further keep only central galaxies with a positive host halo
//! mass, so every logarithm taken downstream is defined.

use crate::catalog::{columns, GalaxyTable};
use crate::error::Result;

/// Boolean row mask over a [`GalaxyTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    mask: Vec<bool>,
}

impl Selection {
    pub fn from_mask(mask: Vec<bool>) -> Self {
        Self { mask }
    }

    /// Number of selected rows.
    pub fn count(&self) -> usize {
        self.mask.iter().filter(|&&keep| keep).count()
    }

    /// Number of rows the mask covers.
    pub fn len(&self) -> usize {
        self.mask.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mask.is_empty()
    }

    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    /// Selected entries of `values`, in table order.
    pub fn apply(&self, values: &[f64]) -> Vec<f64> {
        values
            .iter()
            .zip(&self.mask)
            .filter_map(|(&v, &keep)| keep.then_some(v))
            .collect()
    }

    /// Selected entries of a derived per-galaxy quantity.
    pub fn map<F>(&self, mut f: F) -> Vec<f64>
    where
        F: FnMut(usize) -> f64,
    {
        self.mask
            .iter()
            .enumerate()
            .filter_map(|(i, &keep)| keep.then(|| f(i)))
            .collect()
    }
}

/// Galaxies with `mstars_disk + mstars_bulge > 0`.
///
/// Photometry tables list exactly these galaxies, in catalog order.
pub fn with_stellar_mass(table: &GalaxyTable) -> Result<Selection> {
    let disk = table.column(columns::MSTARS_DISK)?;
    let bulge = table.column(columns::MSTARS_BULGE)?;
    Ok(Selection::from_mask(
        disk.iter().zip(bulge).map(|(d, b)| d + b > 0.0).collect(),
    ))
}

/// Central galaxies (`type <= 0`) with stellar mass and a positive host halo mass.
pub fn centrals_with_stellar_mass(table: &GalaxyTable) -> Result<Selection> {
    let disk = table.column(columns::MSTARS_DISK)?;
    let bulge = table.column(columns::MSTARS_BULGE)?;
    let kind = table.column(columns::TYPE)?;
    let halo = table.column(columns::MVIR_HOSTHALO)?;

    let mask = (0..table.len())
        .map(|i| kind[i] <= 0.0 && disk[i] + bulge[i] > 0.0 && halo[i] > 0.0)
        .collect();
    Ok(Selection::from_mask(mask))
}
