//! In-memory catalog source, used for synthetic runs and tests.

use std::collections::HashMap;

use super::{Attenuation, CatalogSource, GalaxyTable, Photometry, RunInfo};
use crate::error::{GalformError, Result};

#[derive(Debug, Clone)]
struct StoredSubvolume {
    run: RunInfo,
    galaxies: GalaxyTable,
    photometry: HashMap<Attenuation, Photometry>,
}

/// Catalog held entirely in memory, keyed by `(snapshot, subvolume)`.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    subvolumes: HashMap<(u32, u32), StoredSubvolume>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the galaxies of one subvolume, replacing anything already there.
    pub fn insert_galaxies(
        &mut self,
        snapshot: u32,
        subvolume: u32,
        run: RunInfo,
        galaxies: GalaxyTable,
    ) {
        self.subvolumes.insert(
            (snapshot, subvolume),
            StoredSubvolume {
                run,
                galaxies,
                photometry: HashMap::new(),
            },
        );
    }

    /// Attach photometry to a stored subvolume.
    pub fn insert_photometry(
        &mut self,
        snapshot: u32,
        subvolume: u32,
        attenuation: Attenuation,
        photometry: Photometry,
    ) -> Result<()> {
        let stored = self
            .subvolumes
            .get_mut(&(snapshot, subvolume))
            .ok_or(GalformError::MissingSubvolume {
                snapshot,
                subvolume,
            })?;
        stored.photometry.insert(attenuation, photometry);
        Ok(())
    }

    fn stored(&self, snapshot: u32, subvolume: u32) -> Result<&StoredSubvolume> {
        self.subvolumes
            .get(&(snapshot, subvolume))
            .ok_or(GalformError::MissingSubvolume {
                snapshot,
                subvolume,
            })
    }
}

impl CatalogSource for MemoryCatalog {
    fn read_galaxies(
        &self,
        snapshot: u32,
        subvolume: u32,
        columns: &[&str],
    ) -> Result<(RunInfo, GalaxyTable)> {
        let stored = self.stored(snapshot, subvolume)?;
        Ok((stored.run, stored.galaxies.select(columns)?))
    }

    fn read_photometry(
        &self,
        snapshot: u32,
        subvolume: u32,
        attenuation: Attenuation,
    ) -> Result<Photometry> {
        self.stored(snapshot, subvolume)?
            .photometry
            .get(&attenuation)
            .cloned()
            .ok_or_else(|| GalformError::MissingColumn {
                table: format!("photometry of snapshot {snapshot} subvolume {subvolume}"),
                column: attenuation.dataset().to_string(),
            })
    }
}
