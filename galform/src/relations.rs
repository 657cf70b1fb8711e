//! Published stellar-mass–halo-mass fits
//!
//! Closed-form abundance-matching relations used as comparison curves:
//!
//! * Moster, Naab & White (2013), MNRAS 428, 3121, eqs. 2 and 11–14
//! * Behroozi, Wechsler & Conroy (2013), ApJ 770, 57, eqs. 3–4
//!
//! Both take `log10` halo masses and return `log10` stellar masses. The
//! coefficients are the published best-fit values and are evaluated in the
//! published operation order.

use serde::{Deserialize, Serialize};

/// Which published fit a curve follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbundanceMatching {
    Moster2013,
    Behroozi2013,
}

impl AbundanceMatching {
    pub const ALL: [AbundanceMatching; 2] =
        [AbundanceMatching::Moster2013, AbundanceMatching::Behroozi2013];

    pub fn label(self) -> &'static str {
        match self {
            AbundanceMatching::Moster2013 => "Moster+13",
            AbundanceMatching::Behroozi2013 => "Behroozi+13",
        }
    }

    pub fn log_stellar_mass(self, z: f64, log_halo_mass: f64) -> f64 {
        match self {
            AbundanceMatching::Moster2013 => moster2013(z, log_halo_mass),
            AbundanceMatching::Behroozi2013 => behroozi2013(z, log_halo_mass),
        }
    }

    /// Evaluate over a grid of `log10` halo masses.
    pub fn curve(self, z: f64, log_halo_masses: &[f64]) -> ComparisonCurve {
        ComparisonCurve {
            model: self,
            redshift: z,
            log_halo_mass: log_halo_masses.to_vec(),
            log_stellar_mass: log_halo_masses
                .iter()
                .map(|&m| self.log_stellar_mass(z, m))
                .collect(),
        }
    }
}

/// An analytic relation sampled on a halo mass grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonCurve {
    pub model: AbundanceMatching,
    pub redshift: f64,
    pub log_halo_mass: Vec<f64>,
    pub log_stellar_mass: Vec<f64>,
}

// Moster+2013 best fit
const M10: f64 = 11.590;
const M11: f64 = 1.195;
const N10: f64 = 0.0351;
const N11: f64 = -0.0247;
const BETA10: f64 = 1.376;
const BETA11: f64 = -0.826;
const GAMMA10: f64 = 0.608;
const GAMMA11: f64 = 0.329;

/// Moster+2013 double power law.
///
/// `m = M_h · 2N [(M_h/M1)^-β + (M_h/M1)^γ]^-1`, with every parameter
/// evolving linearly in `z / (z + 1)`.
pub fn moster2013(z: f64, log_halo_mass: f64) -> f64 {
    let evolution = z / (z + 1.0);
    let m1 = 10f64.powf(M10 + M11 * evolution);
    let n = N10 + N11 * evolution;
    let beta = BETA10 + BETA11 * evolution;
    let gamma = GAMMA10 + GAMMA11 * evolution;

    let mh = 10f64.powf(log_halo_mass);
    let m = mh * 2.0 * n * ((mh / m1).powf(-beta) + (mh / m1).powf(gamma)).powi(-1);
    m.log10()
}

/// Behroozi+2013 five-parameter fit with scale-factor evolution.
pub fn behroozi2013(z: f64, log_halo_mass: f64) -> f64 {
    let a = 1.0 / (1.0 + z);
    let nu = (-4.0 * a * a).exp();
    let log_epsilon = -1.777 + (-0.006 * (a - 1.0)) * nu;
    let m1 = 11.514 + (-1.793 * (a - 1.0) - 0.251 * z) * nu;
    let alpha = -1.412 + 0.731 * nu * (a - 1.0);
    let delta = 3.508 + (2.608 * (a - 1.0) - 0.043 * z) * nu;
    let gamma = 0.316 + (1.319 * (a - 1.0) + 0.279 * z) * nu;

    let x = log_halo_mass - m1;
    let fx = -(10f64.powf(alpha * x) + 1.0).log10()
        + delta * (1.0 + x.exp()).log10().powf(gamma) / (1.0 + 10f64.powf(-x).exp());
    let f0 = -0.3 + delta * 2f64.log10().powf(gamma) / (1.0 + 1f64.exp());

    log_epsilon + m1 + fx - f0
}
