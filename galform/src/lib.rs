//! Derived statistics of semi-analytic galaxy catalogs
//!
//! Two analyses compare a galaxy-formation model with observations across
//! redshift:
//!
//! * luminosity functions per morphological component and band, with and
//!   without dust attenuation ([`luminosity`])
//! * stellar and baryon mass versus halo mass as binned medians with
//!   16th/84th percentile scatter ([`smhm`]), shown against published
//!   abundance-matching fits ([`relations`])
//!
//! Catalogs are read through the [`catalog::CatalogSource`] trait, one
//! (snapshot, subvolume) at a time. The [`pipeline`] drivers resolve
//! redshifts to snapshots, accumulate every subvolume, normalize and hand
//! back named result records; [`output`] turns those into plot-ready JSON.
//!
//! ```no_run
//! use galform::catalog::TextCatalog;
//! use galform::config::AnalysisConfig;
//! use galform::pipeline::run_all;
//! use galform::redshift::RedshiftTable;
//!
//! let config = AnalysisConfig::load_from_file("analysis.json").unwrap();
//! let redshifts = RedshiftTable::from_file("model/redshift_list").unwrap();
//! let mut catalog = TextCatalog::new("model");
//! if let Some(variant) = &config.luminosity.sed_variant {
//!     catalog = catalog.with_sed_variant(variant.clone());
//! }
//! run_all(&catalog, &redshifts, &config, &[], "plots").unwrap();
//! ```

pub mod catalog;
pub mod config;
pub mod cosmology;
pub mod error;
pub mod luminosity;
pub mod observations;
pub mod output;
pub mod pipeline;
pub mod redshift;
pub mod relations;
pub mod selection;
pub mod smhm;

pub use catalog::{
    Attenuation, CatalogSource, Component, GalaxyTable, MemoryCatalog, Photometry, RunInfo,
    TextCatalog,
};
pub use config::{AnalysisConfig, LuminosityConfig, SmhmConfig};
pub use cosmology::Cosmology;
pub use error::{GalformError, Result};
pub use luminosity::{LuminosityAccumulator, LuminosityFunction, LuminosityFunctions, SnapshotSlot};
pub use pipeline::{run_all, run_luminosity_functions, run_smhm};
pub use redshift::RedshiftTable;
pub use smhm::{HaloMassRelation, SmhmAccumulator, SmhmResults};
