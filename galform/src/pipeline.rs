//! Run drivers
//!
//! Both analyses walk the requested redshifts in order, resolve each to a
//! snapshot, and read every configured subvolume of it from a
//! [`CatalogSource`]. The first read failure aborts the run: a snapshot
//! missing any subvolume would bias its statistics.

use std::path::PathBuf;

use tracing::{debug, info, warn};

use binstats::BinGrid;

use crate::catalog::{columns, Attenuation, CatalogSource, GalaxyTable};
use crate::config::{AnalysisConfig, LuminosityConfig, SmhmConfig};
use crate::cosmology::{validate_h0, Cosmology};
use crate::error::{GalformError, Result};
use crate::luminosity::{LuminosityAccumulator, LuminosityFunctions, SnapshotSlot};
use crate::observations::ObservationTable;
use crate::output::{
    BaryonEvolution, LuminosityEvolution, OutputLayout, SmhmEvolution, BMHM_FILE,
    LUMINOSITY_EVOLUTION_FILE, SMHM_FILE,
};
use crate::redshift::RedshiftTable;
use crate::smhm::{SmhmAccumulator, SmhmResults, REQUIRED_COLUMNS};

/// Galaxy columns read for the luminosity functions.
pub const LUMINOSITY_COLUMNS: [&str; 2] = [columns::MSTARS_DISK, columns::MSTARS_BULGE];

fn resolve_slots(redshifts: &RedshiftTable, targets: &[f64]) -> Result<Vec<SnapshotSlot>> {
    let snapshots = redshifts.snapshots_for(targets)?;
    Ok(targets
        .iter()
        .zip(snapshots)
        .map(|(&redshift, snapshot)| SnapshotSlot { redshift, snapshot })
        .collect())
}

fn require_subvolumes(subvolumes: &[u32]) -> Result<()> {
    if subvolumes.is_empty() {
        return Err(GalformError::InvalidConfig(
            "at least one subvolume is required".to_string(),
        ));
    }
    Ok(())
}

/// Tracks the h0 reported by successive subvolumes.
#[derive(Debug, Default)]
struct HubbleParameter(Option<f64>);

impl HubbleParameter {
    fn observe(&mut self, h0: f64, snapshot: u32, subvolume: u32) -> Result<()> {
        validate_h0(h0, &format!("snapshot {snapshot} subvolume {subvolume}"))?;
        match self.0 {
            Some(previous) if previous != h0 => warn!(
                "Snapshot {snapshot} subvolume {subvolume} reports h0={h0}, previous {previous}"
            ),
            Some(_) => {}
            None => self.0 = Some(h0),
        }
        Ok(())
    }
}

/// Accumulate, normalize and log-transform luminosity functions.
pub fn run_luminosity_functions<S: CatalogSource + ?Sized>(
    source: &S,
    redshifts: &RedshiftTable,
    subvolumes: &[u32],
    config: &LuminosityConfig,
) -> Result<LuminosityFunctions> {
    config.validate()?;
    require_subvolumes(subvolumes)?;
    let grid = BinGrid::new(config.bins)?;
    let slots = resolve_slots(redshifts, &config.redshifts)?;
    info!(
        "Luminosity functions: {} snapshots, {} subvolumes, {} magnitude bins",
        slots.len(),
        subvolumes.len(),
        grid.len()
    );

    let mut accumulator: Option<LuminosityAccumulator> = None;
    let mut h0 = HubbleParameter::default();

    for (index, slot) in slots.iter().enumerate() {
        let mut volume = 0.0;
        for &subvolume in subvolumes {
            let (run, galaxies) =
                source.read_galaxies(slot.snapshot, subvolume, &LUMINOSITY_COLUMNS)?;
            h0.observe(run.h0, slot.snapshot, subvolume)?;
            volume += run.volume;

            for attenuation in Attenuation::ALL {
                let photometry = source.read_photometry(slot.snapshot, subvolume, attenuation)?;
                // The band set is only known once the first photometry arrives
                let acc = accumulator.get_or_insert_with(|| {
                    debug!("Bands: {:?}", photometry.bands());
                    LuminosityAccumulator::new(
                        grid.clone(),
                        slots.clone(),
                        photometry.bands().to_vec(),
                        config.magnitude_threshold,
                    )
                });
                acc.accumulate(index, &galaxies, attenuation, &photometry)?;
            }
        }

        if let Some(acc) = accumulator.as_mut() {
            acc.normalize(index, volume)?;
        }
        info!(
            "z={} snapshot {}: normalized by volume {volume}",
            slot.redshift, slot.snapshot
        );
    }

    let accumulator = accumulator.ok_or_else(|| {
        GalformError::InvalidConfig("no photometry was read".to_string())
    })?;
    let h0 = h0.0.ok_or_else(|| GalformError::InvalidConfig("no run information".to_string()))?;
    accumulator.finalize(h0)
}

/// Binned medians of the halo-mass relations for every requested redshift.
pub fn run_smhm<S: CatalogSource + ?Sized>(
    source: &S,
    redshifts: &RedshiftTable,
    subvolumes: &[u32],
    config: &SmhmConfig,
    cosmology: &Cosmology,
) -> Result<SmhmResults> {
    config.validate()?;
    cosmology.validate()?;
    require_subvolumes(subvolumes)?;
    let grid = BinGrid::new(config.bins)?;
    let slots = resolve_slots(redshifts, &config.redshifts)?;
    info!(
        "Halo mass relations: {} snapshots, {} subvolumes, {} mass bins",
        slots.len(),
        subvolumes.len(),
        grid.len()
    );

    let mut accumulator = SmhmAccumulator::new(grid, slots.clone(), config.min_count, *cosmology);
    for (index, slot) in slots.iter().enumerate() {
        let mut galaxies = GalaxyTable::new();
        let mut h0 = HubbleParameter::default();
        for &subvolume in subvolumes {
            let (run, table) = source.read_galaxies(slot.snapshot, subvolume, &REQUIRED_COLUMNS)?;
            h0.observe(run.h0, slot.snapshot, subvolume)?;
            galaxies.extend(&table)?;
        }
        let h0 = h0.0.ok_or_else(|| GalformError::InvalidConfig("no run information".to_string()))?;
        accumulator.fill(index, &galaxies, h0)?;
        info!(
            "z={} snapshot {}: {} galaxies",
            slot.redshift,
            slot.snapshot,
            galaxies.len()
        );
    }
    accumulator.finish()
}

/// Paths of the products written by [`run_all`].
#[derive(Debug, Clone, PartialEq)]
pub struct WrittenProducts {
    pub luminosity: PathBuf,
    pub smhm: PathBuf,
    pub bmhm: PathBuf,
}

/// Run both analyses and write their products.
///
/// Luminosity products go under the SED variant directory when one is
/// configured; the halo-mass products go to the output root.
pub fn run_all<S: CatalogSource + ?Sized>(
    source: &S,
    redshifts: &RedshiftTable,
    config: &AnalysisConfig,
    observations: &[ObservationTable],
    output_dir: impl Into<PathBuf>,
) -> Result<WrittenProducts> {
    config.validate()?;
    let root = OutputLayout::new(output_dir);

    let functions =
        run_luminosity_functions(source, redshifts, &config.subvolumes, &config.luminosity)?;
    let evolution =
        LuminosityEvolution::build(&functions, &config.luminosity.plot_band, observations)?;
    let luminosity = root
        .clone()
        .with_variant(config.luminosity.sed_variant.clone())
        .write_json(LUMINOSITY_EVOLUTION_FILE, &evolution)?;

    let results = run_smhm(
        source,
        redshifts,
        &config.subvolumes,
        &config.smhm,
        &config.cosmology,
    )?;
    let smhm = root.write_json(SMHM_FILE, &SmhmEvolution::build(&results))?;
    let bmhm = root.write_json(BMHM_FILE, &BaryonEvolution::build(&results))?;

    Ok(WrittenProducts {
        luminosity,
        smhm,
        bmhm,
    })
}
