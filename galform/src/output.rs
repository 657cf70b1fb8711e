//! Plot-ready data products and where they are written.
//!
//! Each analysis produces one evolution product holding a panel per
//! redshift. Panels carry only bins with data, the analytic comparison
//! curves, and the observational points of the matching redshift group.
//! Products are written as pretty-printed JSON under the output directory,
//! nested under the attenuation variant when one is in use.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::catalog::{Attenuation, Component};
use crate::error::{GalformError, Result};
use crate::luminosity::LuminosityFunctions;
use crate::observations::ObservationTable;
use crate::relations::{AbundanceMatching, ComparisonCurve};
use crate::smhm::{HaloMassRelation, MedianSeries, SmhmResults};

pub const LUMINOSITY_EVOLUTION_FILE: &str = "Kband_luminosity_function_evolution.json";
pub const SMHM_FILE: &str = "SMHM_z.json";
pub const BMHM_FILE: &str = "BMHM_z.json";

/// Redshift distance within which observations join a panel
pub const OBSERVATION_GROUP_TOLERANCE: f64 = 0.01;

/// Output directory, optionally nested under an attenuation variant.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputLayout {
    root: PathBuf,
    variant: Option<String>,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            variant: None,
        }
    }

    pub fn with_variant(mut self, variant: Option<String>) -> Self {
        self.variant = variant;
        self
    }

    /// Directory products are written to.
    pub fn dir(&self) -> PathBuf {
        match &self.variant {
            Some(variant) => self.root.join(variant),
            None => self.root.clone(),
        }
    }

    pub fn path(&self, file_name: &str) -> PathBuf {
        self.dir().join(file_name)
    }

    /// Serialize `product` to `<dir>/<file_name>`, creating the directory.
    pub fn write_json<T: Serialize>(&self, file_name: &str, product: &T) -> Result<PathBuf> {
        let dir = self.dir();
        std::fs::create_dir_all(&dir).map_err(|e| GalformError::write(&dir, e))?;
        let path = dir.join(file_name);
        let json = serde_json::to_string_pretty(product)?;
        std::fs::write(&path, json).map_err(|e| GalformError::write(&path, e))?;
        info!("Wrote {}", path.display());
        Ok(path)
    }
}

/// Read a product back, mostly for inspection and tests.
pub fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let json = std::fs::read_to_string(path).map_err(|e| GalformError::read(path, e))?;
    Ok(serde_json::from_str(&json)?)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LuminositySeries {
    pub label: String,
    pub component: Component,
    pub attenuation: Attenuation,
    /// `(magnitude, log10 density)` of bins with galaxies
    pub points: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LuminosityPanel {
    pub redshift: f64,
    pub snapshot: u32,
    pub model: Vec<LuminositySeries>,
    pub observations: Vec<ObservationTable>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LuminosityEvolution {
    pub band: String,
    pub panels: Vec<LuminosityPanel>,
}

/// Series drawn for every luminosity function panel.
const LUMINOSITY_SERIES: [(&str, Component, Attenuation); 4] = [
    ("total", Component::Total, Attenuation::Dust),
    ("total intrinsic", Component::Total, Attenuation::NoDust),
    ("disks", Component::Disk, Attenuation::Dust),
    ("bulges", Component::BulgeTotal, Attenuation::Dust),
];

fn matching_observations(observations: &[ObservationTable], redshift: f64) -> Vec<ObservationTable> {
    observations
        .iter()
        .map(|table| table.select_group(redshift, OBSERVATION_GROUP_TOLERANCE))
        .filter(|table| !table.is_empty())
        .collect()
}

impl LuminosityEvolution {
    /// Assemble one panel per snapshot for `band`.
    pub fn build(
        functions: &LuminosityFunctions,
        band: &str,
        observations: &[ObservationTable],
    ) -> Result<Self> {
        let mut panels = Vec::with_capacity(functions.slots().len());
        for (index, slot) in functions.slots().iter().enumerate() {
            let mut model = Vec::with_capacity(LUMINOSITY_SERIES.len());
            for (label, component, attenuation) in LUMINOSITY_SERIES {
                let lf = functions.get(index, component, band, attenuation)?;
                model.push(LuminositySeries {
                    label: label.to_string(),
                    component,
                    attenuation,
                    points: lf.points(),
                });
            }
            panels.push(LuminosityPanel {
                redshift: slot.redshift,
                snapshot: slot.snapshot,
                model,
                observations: matching_observations(observations, slot.redshift),
            });
        }
        Ok(Self {
            band: band.to_string(),
            panels,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmhmPanel {
    pub redshift: f64,
    pub snapshot: u32,
    pub model: MedianSeries,
    pub comparisons: Vec<ComparisonCurve>,
}

/// Stellar mass versus halo mass at every redshift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmhmEvolution {
    pub panels: Vec<SmhmPanel>,
}

impl SmhmEvolution {
    pub fn build(results: &SmhmResults) -> Self {
        let panels = results
            .snapshots
            .iter()
            .map(|snapshot| SmhmPanel {
                redshift: snapshot.slot.redshift,
                snapshot: snapshot.slot.snapshot,
                model: snapshot.series(HaloMassRelation::StellarMass),
                comparisons: AbundanceMatching::ALL
                    .iter()
                    .map(|fit| fit.curve(snapshot.slot.redshift, &results.centers))
                    .collect(),
            })
            .collect();
        Self { panels }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaryonPanel {
    pub redshift: f64,
    pub snapshot: u32,
    pub baryons: MedianSeries,
    pub halo_baryons: MedianSeries,
}

/// Baryon fractions relative to the cosmic value at every redshift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaryonEvolution {
    pub panels: Vec<BaryonPanel>,
}

impl BaryonEvolution {
    pub fn build(results: &SmhmResults) -> Self {
        let panels = results
            .snapshots
            .iter()
            .map(|snapshot| BaryonPanel {
                redshift: snapshot.slot.redshift,
                snapshot: snapshot.slot.snapshot,
                baryons: snapshot.series(HaloMassRelation::Baryons),
                halo_baryons: snapshot.series(HaloMassRelation::HaloBaryons),
            })
            .collect();
        Self { panels }
    }
}
