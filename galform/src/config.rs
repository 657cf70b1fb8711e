use std::path::Path;

use binstats::BinSpec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cosmology::{Cosmology, REFERENCE_H0};
use crate::error::{GalformError, Result};

fn default_lf_bins() -> BinSpec {
    let offset = 5.0 * REFERENCE_H0.log10();
    BinSpec::new(-30.0 + offset, -10.0 + offset, 0.5)
}

fn default_lf_redshifts() -> Vec<f64> {
    vec![0.5, 1.0, 2.0, 3.0]
}

fn default_magnitude_threshold() -> f64 {
    -1.0
}

fn default_plot_band() -> String {
    "K".to_string()
}

fn default_smhm_bins() -> BinSpec {
    BinSpec::new(10.0, 15.0, 0.2)
}

fn default_smhm_redshifts() -> Vec<f64> {
    vec![0.0, 0.5, 1.0, 2.0, 3.0, 4.0]
}

fn default_min_count() -> usize {
    1
}

fn default_subvolumes() -> Vec<u32> {
    vec![0]
}

fn validate_redshifts(name: &str, redshifts: &[f64]) -> Result<()> {
    if redshifts.is_empty() {
        return Err(GalformError::InvalidConfig(format!(
            "{name}: at least one redshift is required"
        )));
    }
    if let Some(z) = redshifts.iter().find(|z| !z.is_finite() || **z < 0.0) {
        return Err(GalformError::InvalidConfig(format!(
            "{name}: invalid redshift {z}"
        )));
    }
    Ok(())
}

fn validate_bins(name: &str, bins: &BinSpec) -> Result<()> {
    bins.validate()
        .map_err(|e| GalformError::InvalidConfig(format!("{name}: {e}")))
}

/// Luminosity function settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LuminosityConfig {
    /// AB magnitude grid
    #[serde(default = "default_lf_bins")]
    pub bins: BinSpec,
    #[serde(default = "default_lf_redshifts")]
    pub redshifts: Vec<f64>,
    /// Only magnitudes strictly brighter than this are counted
    #[serde(default = "default_magnitude_threshold")]
    pub magnitude_threshold: f64,
    /// Band written to the evolution data product
    #[serde(default = "default_plot_band")]
    pub plot_band: String,
    /// Attenuation model of the photometry, e.g. "eagle-rr14"
    #[serde(default)]
    pub sed_variant: Option<String>,
}

impl Default for LuminosityConfig {
    fn default() -> Self {
        Self {
            bins: default_lf_bins(),
            redshifts: default_lf_redshifts(),
            magnitude_threshold: default_magnitude_threshold(),
            plot_band: default_plot_band(),
            sed_variant: None,
        }
    }
}

impl LuminosityConfig {
    pub fn validate(&self) -> Result<()> {
        validate_bins("luminosity bins", &self.bins)?;
        validate_redshifts("luminosity redshifts", &self.redshifts)?;
        if !self.magnitude_threshold.is_finite() {
            return Err(GalformError::InvalidConfig(format!(
                "magnitude threshold must be finite, got {}",
                self.magnitude_threshold
            )));
        }
        if self.plot_band.is_empty() {
            return Err(GalformError::InvalidConfig(
                "plot band must be named".to_string(),
            ));
        }
        Ok(())
    }
}

/// Stellar and baryon mass versus halo mass settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmhmConfig {
    /// log10 halo mass grid
    #[serde(default = "default_smhm_bins")]
    pub bins: BinSpec,
    #[serde(default = "default_smhm_redshifts")]
    pub redshifts: Vec<f64>,
    /// Smallest bin population reported as a statistic
    #[serde(default = "default_min_count")]
    pub min_count: usize,
}

impl Default for SmhmConfig {
    fn default() -> Self {
        Self {
            bins: default_smhm_bins(),
            redshifts: default_smhm_redshifts(),
            min_count: default_min_count(),
        }
    }
}

impl SmhmConfig {
    pub fn validate(&self) -> Result<()> {
        validate_bins("halo mass bins", &self.bins)?;
        validate_redshifts("halo mass redshifts", &self.redshifts)?;
        if self.min_count == 0 {
            return Err(GalformError::InvalidConfig(
                "min_count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Full run configuration, loaded from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Subvolumes summed for every snapshot
    #[serde(default = "default_subvolumes")]
    pub subvolumes: Vec<u32>,
    #[serde(default)]
    pub luminosity: LuminosityConfig,
    #[serde(default)]
    pub smhm: SmhmConfig,
    #[serde(default)]
    pub cosmology: Cosmology,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            subvolumes: default_subvolumes(),
            luminosity: LuminosityConfig::default(),
            smhm: SmhmConfig::default(),
            cosmology: Cosmology::default(),
        }
    }
}

impl AnalysisConfig {
    /// Read and validate a JSON configuration file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| GalformError::read(path, e))?;
        let config: AnalysisConfig = serde_json::from_str(&json)?;
        config.validate()?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.subvolumes.is_empty() {
            return Err(GalformError::InvalidConfig(
                "at least one subvolume is required".to_string(),
            ));
        }
        self.luminosity.validate()?;
        self.smhm.validate()?;
        self.cosmology.validate()
    }
}
