//! Cosmological parameters and the corrections derived from them.

use serde::{Deserialize, Serialize};

use crate::error::{GalformError, Result};

/// Baryon density parameter of the reference cosmology
pub const OMEGA_B: f64 = 0.0491;

/// Matter density parameter of the reference cosmology
pub const OMEGA_M: f64 = 0.3121;

/// Little-h the default magnitude grid is quoted in
pub const REFERENCE_H0: f64 = 0.677;

fn default_omega_b() -> f64 {
    OMEGA_B
}

fn default_omega_m() -> f64 {
    OMEGA_M
}

/// Density parameters used by the baryon-fraction relations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cosmology {
    #[serde(default = "default_omega_b")]
    pub omega_b: f64,
    #[serde(default = "default_omega_m")]
    pub omega_m: f64,
}

impl Default for Cosmology {
    fn default() -> Self {
        Self {
            omega_b: OMEGA_B,
            omega_m: OMEGA_M,
        }
    }
}

impl Cosmology {
    pub fn validate(&self) -> Result<()> {
        if !(self.omega_b > 0.0 && self.omega_m > self.omega_b) {
            return Err(GalformError::InvalidConfig(format!(
                "need 0 < omega_b < omega_m, got omega_b={} omega_m={}",
                self.omega_b, self.omega_m
            )));
        }
        Ok(())
    }

    /// `log10(Ωb / (ΩM − Ωb))`, the cosmic baryon-to-dark-matter ratio.
    pub fn baryon_ratio_log(&self) -> f64 {
        (self.omega_b / (self.omega_m - self.omega_b)).log10()
    }
}

/// Reject an h0 that is not a positive finite number.
pub fn validate_h0(h0: f64, context: &str) -> Result<()> {
    if !(h0.is_finite() && h0 > 0.0) {
        return Err(GalformError::InvalidHubble {
            h0,
            context: context.to_string(),
        });
    }
    Ok(())
}

/// `3 log10(h0)`, converting densities per (Mpc/h)^3 to per Mpc^3.
pub fn volume_correction(h0: f64) -> f64 {
    3.0 * h0.log10()
}
