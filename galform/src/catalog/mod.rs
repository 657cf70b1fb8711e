//! Snapshot catalogs
//!
//! A snapshot is split into subvolumes; for each one a [`CatalogSource`]
//! returns the run information, a table of named per-galaxy columns and,
//! for luminosity functions, the photometry of the galaxies with positive
//! stellar mass. Tables from the subvolumes of one snapshot can be
//! concatenated with [`GalaxyTable::extend`] and [`Photometry::extend`].

pub mod memory;
pub mod text;

pub use memory::MemoryCatalog;
pub use text::TextCatalog;

use std::collections::BTreeMap;
use std::fmt;

use ndarray::{concatenate, Array3, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{GalformError, Result};

/// Galaxy column names used by the analyses.
pub mod columns {
    pub const MSTARS_DISK: &str = "mstars_disk";
    pub const MSTARS_BULGE: &str = "mstars_bulge";
    pub const MVIR_HOSTHALO: &str = "mvir_hosthalo";
    pub const MVIR_SUBHALO: &str = "mvir_subhalo";
    pub const TYPE: &str = "type";
    pub const MEAN_STELLAR_AGE: &str = "mean_stellar_age";
    pub const SFR_DISK: &str = "sfr_disk";
    pub const SFR_BURST: &str = "sfr_burst";
    pub const ID_GALAXY: &str = "id_galaxy";
    pub const M_BH: &str = "m_bh";
    pub const MGAS_DISK: &str = "mgas_disk";
    pub const MGAS_BULGE: &str = "mgas_bulge";
    pub const MHOT: &str = "mhot";
    pub const MREHEATED: &str = "mreheated";
}

/// Morphological component of a galaxy's light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    /// Bulge built by disk instabilities
    BulgeDiskInstability,
    /// Bulge built by galaxy mergers
    BulgeMerger,
    /// Both bulge channels
    BulgeTotal,
    Disk,
    Total,
}

impl Component {
    pub const ALL: [Component; 5] = [
        Component::BulgeDiskInstability,
        Component::BulgeMerger,
        Component::BulgeTotal,
        Component::Disk,
        Component::Total,
    ];

    /// Position in [`Component::ALL`] and in photometry arrays.
    pub fn index(self) -> usize {
        match self {
            Component::BulgeDiskInstability => 0,
            Component::BulgeMerger => 1,
            Component::BulgeTotal => 2,
            Component::Disk => 3,
            Component::Total => 4,
        }
    }

    /// Dataset name used by the photometry tables.
    pub fn dataset(self) -> &'static str {
        match self {
            Component::BulgeDiskInstability => "bulge_d",
            Component::BulgeMerger => "bulge_m",
            Component::BulgeTotal => "bulge_t",
            Component::Disk => "disk",
            Component::Total => "total",
        }
    }

    pub fn from_dataset(name: &str) -> Option<Self> {
        Component::ALL.into_iter().find(|c| c.dataset() == name)
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dataset())
    }
}

/// Whether magnitudes include dust attenuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attenuation {
    Dust,
    NoDust,
}

impl Attenuation {
    pub const ALL: [Attenuation; 2] = [Attenuation::Dust, Attenuation::NoDust];

    pub fn dataset(self) -> &'static str {
        match self {
            Attenuation::Dust => "ab_dust",
            Attenuation::NoDust => "ab_nodust",
        }
    }
}

impl fmt::Display for Attenuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dataset())
    }
}

/// Run-level values reported with every subvolume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunInfo {
    /// Dimensionless Hubble parameter
    pub h0: f64,
    /// Comoving volume of the subvolume in (Mpc/h)^3
    pub volume: f64,
}

/// Named per-galaxy columns of equal length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GalaxyTable {
    rows: usize,
    columns: BTreeMap<String, Vec<f64>>,
}

impl GalaxyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column; the first column fixes the row count.
    pub fn insert_column(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        let name = name.into();
        if !self.columns.is_empty() && values.len() != self.rows {
            return Err(GalformError::ColumnLength {
                column: name,
                expected: self.rows,
                found: values.len(),
            });
        }
        self.rows = values.len();
        self.columns.insert(name, values);
        Ok(())
    }

    pub fn with_column(mut self, name: impl Into<String>, values: Vec<f64>) -> Result<Self> {
        self.insert_column(name, values)?;
        Ok(self)
    }

    pub fn column(&self, name: &str) -> Result<&[f64]> {
        self.columns
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| GalformError::MissingColumn {
                table: "galaxies".to_string(),
                column: name.to_string(),
            })
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Copy of the table restricted to `names`.
    pub fn select(&self, names: &[&str]) -> Result<Self> {
        let mut selected = GalaxyTable::new();
        for &name in names {
            selected.insert_column(name, self.column(name)?.to_vec())?;
        }
        // A table with no columns still reports its rows
        selected.rows = self.rows;
        Ok(selected)
    }

    /// Number of galaxies.
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Append the rows of another table holding the same columns.
    pub fn extend(&mut self, other: &GalaxyTable) -> Result<()> {
        if self.columns.is_empty() {
            *self = other.clone();
            return Ok(());
        }
        for name in self.columns.keys() {
            if !other.columns.contains_key(name) {
                return Err(GalformError::MissingColumn {
                    table: "appended galaxies".to_string(),
                    column: name.clone(),
                });
            }
        }
        for (name, values) in self.columns.iter_mut() {
            values.extend_from_slice(&other.columns[name]);
        }
        self.rows += other.rows;
        Ok(())
    }
}

/// AB magnitudes indexed by `[component, band, galaxy]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Photometry {
    bands: Vec<String>,
    magnitudes: Array3<f64>,
}

impl Photometry {
    /// Wrap a magnitude array whose band axis matches `bands`.
    pub fn new(bands: Vec<String>, magnitudes: Array3<f64>) -> Result<Self> {
        let (n_components, n_bands, _) = magnitudes.dim();
        if n_components != Component::ALL.len() {
            return Err(GalformError::InvalidConfig(format!(
                "photometry needs {} components, got {n_components}",
                Component::ALL.len()
            )));
        }
        if n_bands != bands.len() {
            return Err(GalformError::InvalidConfig(format!(
                "photometry has {n_bands} band planes but {} band names",
                bands.len()
            )));
        }
        Ok(Self { bands, magnitudes })
    }

    pub fn bands(&self) -> &[String] {
        &self.bands
    }

    pub fn band_index(&self, band: &str) -> Result<usize> {
        self.bands
            .iter()
            .position(|b| b == band)
            .ok_or_else(|| GalformError::UnknownBand(band.to_string()))
    }

    /// Number of galaxies.
    pub fn len(&self) -> usize {
        self.magnitudes.dim().2
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Magnitudes of every galaxy for one component and band.
    pub fn magnitudes(&self, component: Component, band: usize) -> ArrayView1<'_, f64> {
        self.magnitudes
            .index_axis(Axis(0), component.index())
            .index_axis_move(Axis(0), band)
    }

    /// Append the galaxies of another table with the same bands.
    pub fn extend(&mut self, other: &Photometry) -> Result<()> {
        if self.bands != other.bands {
            return Err(GalformError::BandMismatch {
                expected: self.bands.clone(),
                found: other.bands.clone(),
            });
        }
        self.magnitudes = concatenate(Axis(2), &[self.magnitudes.view(), other.magnitudes.view()])
            .map_err(|e| GalformError::InvalidConfig(format!("cannot append photometry: {e}")))?;
        Ok(())
    }
}

/// Loader seam for per-subvolume catalog data.
///
/// Implementations fail on any missing or empty input; callers abort the
/// snapshot on the first error.
pub trait CatalogSource {
    /// Run information and the requested galaxy columns of one subvolume.
    fn read_galaxies(
        &self,
        snapshot: u32,
        subvolume: u32,
        columns: &[&str],
    ) -> Result<(RunInfo, GalaxyTable)>;

    /// Photometry of the galaxies with positive stellar mass, in catalog order.
    fn read_photometry(
        &self,
        snapshot: u32,
        subvolume: u32,
        attenuation: Attenuation,
    ) -> Result<Photometry>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn test_table_rejects_ragged_columns() {
        let table = GalaxyTable::new()
            .with_column(columns::MSTARS_DISK, vec![1.0, 2.0])
            .unwrap();
        let err = table
            .with_column(columns::MSTARS_BULGE, vec![1.0])
            .unwrap_err();
        assert!(matches!(err, GalformError::ColumnLength { expected: 2, found: 1, .. }));
    }

    #[test]
    fn test_table_extend_concatenates() {
        let mut a = GalaxyTable::new().with_column("x", vec![1.0]).unwrap();
        let b = GalaxyTable::new().with_column("x", vec![2.0, 3.0]).unwrap();
        a.extend(&b).unwrap();
        assert_eq!(a.len(), 3);
        assert_eq!(a.column("x").unwrap(), &[1.0, 2.0, 3.0]);

        let c = GalaxyTable::new().with_column("y", vec![0.0]).unwrap();
        assert!(a.extend(&c).is_err());
    }

    #[test]
    fn test_missing_column_is_error() {
        let table = GalaxyTable::new().with_column("x", vec![1.0]).unwrap();
        assert!(matches!(
            table.column("y"),
            Err(GalformError::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_photometry_views_and_extend() {
        let bands = vec!["r".to_string(), "K".to_string()];
        let mags = Array3::from_shape_fn((5, 2, 3), |(c, b, g)| (c * 100 + b * 10 + g) as f64);
        let mut phot = Photometry::new(bands.clone(), mags.clone()).unwrap();
        assert_eq!(phot.len(), 3);
        assert_eq!(phot.band_index("K").unwrap(), 1);
        let view = phot.magnitudes(Component::Disk, 1);
        assert_eq!(view.to_vec(), vec![310.0, 311.0, 312.0]);

        let other = Photometry::new(bands, mags).unwrap();
        phot.extend(&other).unwrap();
        assert_eq!(phot.len(), 6);

        let wrong = Photometry::new(vec!["u".into(), "g".into()], Array3::zeros((5, 2, 1))).unwrap();
        assert!(matches!(
            phot.extend(&wrong),
            Err(GalformError::BandMismatch { .. })
        ));
    }

    #[test]
    fn test_component_dataset_round_trip() {
        for component in Component::ALL {
            assert_eq!(Component::from_dataset(component.dataset()), Some(component));
        }
        assert_eq!(Component::Total.index(), 4);
    }
}
