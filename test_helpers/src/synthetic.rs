//! Seeded synthetic galaxy catalogs
//!
//! NOTE: This is NOT intended to be a realistic galaxy population. It only
//! produces catalogs with the right columns, plausible magnitudes and a mix
//! of centrals, satellites and massless galaxies, so the analyses can be
//! exercised end to end without simulation output.

use galform::catalog::columns;
use galform::{Attenuation, Component, GalaxyTable, MemoryCatalog, Photometry, RunInfo};
use ndarray::Array3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal, Uniform};

/// Configuration for one synthetic subvolume
#[derive(Debug, Clone)]
pub struct SyntheticCatalogConfig {
    pub n_galaxies: usize,
    pub h0: f64,
    pub volume: f64,
    /// Fraction of galaxies with zero stellar mass
    pub massless_fraction: f64,
    /// Fraction of galaxies flagged as satellites
    pub satellite_fraction: f64,
    pub bands: Vec<String>,
    pub seed: u64,
}

impl Default for SyntheticCatalogConfig {
    fn default() -> Self {
        Self {
            n_galaxies: 100,
            h0: 0.677,
            volume: 1000.0,
            massless_fraction: 0.1,
            satellite_fraction: 0.3,
            bands: vec!["r".to_string(), "K".to_string()],
            seed: 42,
        }
    }
}

/// One generated subvolume: galaxy columns plus photometry of the galaxies
/// with stellar mass, with and without dust.
#[derive(Debug, Clone)]
pub struct SyntheticSubvolume {
    pub run: RunInfo,
    pub galaxies: GalaxyTable,
    pub dust: Photometry,
    pub nodust: Photometry,
}

impl SyntheticSubvolume {
    pub fn photometry(&self, attenuation: Attenuation) -> &Photometry {
        match attenuation {
            Attenuation::Dust => &self.dust,
            Attenuation::NoDust => &self.nodust,
        }
    }
}

/// Magnitude of a light fraction `f` of a galaxy with total magnitude `total`.
fn component_magnitude(total: f64, fraction: f64) -> f64 {
    if fraction > 0.0 {
        total - 2.5 * fraction.log10()
    } else {
        // No light in this component; far fainter than any bin
        99.0
    }
}

/// Create a synthetic subvolume with configurable parameters
pub fn synthetic_subvolume(config: &SyntheticCatalogConfig) -> SyntheticSubvolume {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let log_halo = Normal::new(11.8, 0.7).expect("valid halo mass distribution");
    let log_efficiency = Normal::new(-1.8, 0.3).expect("valid efficiency distribution");
    let color_scatter = Normal::new(0.0, 0.3).expect("valid color distribution");
    let unit = Uniform::new(0.0, 1.0);

    let n = config.n_galaxies;
    let mut cols: Vec<Vec<f64>> = vec![Vec::with_capacity(n); 11];
    let mut massive_light = Vec::new();

    for _ in 0..n {
        let halo = 10f64.powf(log_halo.sample(&mut rng));
        let massless = unit.sample(&mut rng) < config.massless_fraction;
        let stellar = if massless {
            0.0
        } else {
            halo * 10f64.powf(log_efficiency.sample(&mut rng))
        };
        let disk_fraction: f64 = rng.gen_range(0.0..1.0);
        let merger_share: f64 = rng.gen_range(0.0..1.0);
        let kind = if unit.sample(&mut rng) < config.satellite_fraction {
            rng.gen_range(1..=2) as f64
        } else {
            0.0
        };
        let gas = stellar * rng.gen_range(0.1..2.0);
        let hot = halo * rng.gen_range(0.01..0.1);

        let disk = stellar * disk_fraction;
        let bulge = stellar - disk;
        cols[0].push(disk);
        cols[1].push(bulge);
        cols[2].push(stellar * 1e-3);
        cols[3].push(gas * 0.8);
        cols[4].push(gas * 0.2);
        cols[5].push(hot);
        cols[6].push(hot * rng.gen_range(0.0..0.5));
        cols[7].push(halo);
        cols[8].push(halo * rng.gen_range(0.5..1.0));
        cols[9].push(kind);
        cols[10].push(rng.gen_range(1.0..12.0));

        if stellar > 0.0 {
            let k_total = -2.5 * stellar.log10() + 3.5 + color_scatter.sample(&mut rng);
            let dust = rng.gen_range(0.0..1.0);
            massive_light.push((k_total, disk_fraction, merger_share, dust));
        }
    }

    let names = [
        columns::MSTARS_DISK,
        columns::MSTARS_BULGE,
        columns::M_BH,
        columns::MGAS_DISK,
        columns::MGAS_BULGE,
        columns::MHOT,
        columns::MREHEATED,
        columns::MVIR_HOSTHALO,
        columns::MVIR_SUBHALO,
        columns::TYPE,
        columns::MEAN_STELLAR_AGE,
    ];
    let mut galaxies = GalaxyTable::new();
    for (name, values) in names.into_iter().zip(cols) {
        galaxies
            .insert_column(name, values)
            .expect("synthetic columns share a length");
    }
    galaxies
        .insert_column(columns::ID_GALAXY, (0..n).map(|i| i as f64).collect())
        .expect("synthetic columns share a length");

    let n_bands = config.bands.len();
    let n_massive = massive_light.len();
    let mut intrinsic = Array3::zeros((Component::ALL.len(), n_bands, n_massive));
    let mut attenuated = Array3::zeros((Component::ALL.len(), n_bands, n_massive));
    for (galaxy, &(k_total, disk_fraction, merger_share, dust)) in massive_light.iter().enumerate() {
        let bulge_fraction = 1.0 - disk_fraction;
        for band in 0..n_bands {
            // Bluer bands are fainter and more attenuated
            let shift = (n_bands - 1 - band) as f64 * 0.8;
            let total = k_total + shift;
            let fractions = [
                (Component::BulgeDiskInstability, bulge_fraction * (1.0 - merger_share)),
                (Component::BulgeMerger, bulge_fraction * merger_share),
                (Component::BulgeTotal, bulge_fraction),
                (Component::Disk, disk_fraction),
                (Component::Total, 1.0),
            ];
            for (component, fraction) in fractions {
                let mag = component_magnitude(total, fraction);
                intrinsic[[component.index(), band, galaxy]] = mag;
                attenuated[[component.index(), band, galaxy]] = mag + dust * (1.0 + shift);
            }
        }
    }

    SyntheticSubvolume {
        run: RunInfo {
            h0: config.h0,
            volume: config.volume,
        },
        galaxies,
        dust: Photometry::new(config.bands.clone(), attenuated).expect("matching band axis"),
        nodust: Photometry::new(config.bands.clone(), intrinsic).expect("matching band axis"),
    }
}

/// Generate `subvolumes` subvolumes of `snapshot` and store them in `catalog`.
///
/// Each subvolume uses the configured seed offset by its index, so runs are
/// reproducible. Returns the generated subvolumes.
pub fn populate_catalog(
    catalog: &mut MemoryCatalog,
    snapshot: u32,
    subvolumes: u32,
    config: &SyntheticCatalogConfig,
) -> Vec<SyntheticSubvolume> {
    (0..subvolumes)
        .map(|subvolume| {
            let generated = synthetic_subvolume(&SyntheticCatalogConfig {
                seed: config.seed + u64::from(subvolume) + 1000 * u64::from(snapshot),
                ..config.clone()
            });
            catalog.insert_galaxies(snapshot, subvolume, generated.run, generated.galaxies.clone());
            for attenuation in Attenuation::ALL {
                catalog
                    .insert_photometry(
                        snapshot,
                        subvolume,
                        attenuation,
                        generated.photometry(attenuation).clone(),
                    )
                    .expect("subvolume was just inserted");
            }
            generated
        })
        .collect()
}
