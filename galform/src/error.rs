use std::path::PathBuf;

use binstats::BinError;
use thiserror::Error;

/// Errors produced while loading catalogs and aggregating statistics.
#[derive(Error, Debug)]
pub enum GalformError {
    /// An input file could not be opened or read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// An output file could not be written.
    #[error("failed to write {path}: {source}")]
    Write {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// An input file exists but holds no data rows.
    #[error("input file {0} has no data")]
    EmptyInput(PathBuf),

    /// A text table line could not be parsed.
    #[error("{path}:{line}: {message}")]
    Parse {
        /// File being parsed.
        path: PathBuf,
        /// One-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// The loader has no data for a requested subvolume.
    #[error("snapshot {snapshot} subvolume {subvolume} is not available")]
    MissingSubvolume {
        /// Snapshot index.
        snapshot: u32,
        /// Subvolume index.
        subvolume: u32,
    },

    /// A required catalog column is absent.
    #[error("column '{column}' missing from {table}")]
    MissingColumn {
        /// Table description.
        table: String,
        /// Requested column name.
        column: String,
    },

    /// Columns of one table disagree on the number of galaxies.
    #[error("column '{column}' has {found} rows, expected {expected}")]
    ColumnLength {
        /// Offending column.
        column: String,
        /// Row count of the table.
        expected: usize,
        /// Row count of the column.
        found: usize,
    },

    /// Photometry rows do not line up with the selected galaxies.
    #[error("photometry has {photometry} rows but {galaxies} galaxies have positive stellar mass")]
    PhotometryMismatch {
        /// Rows in the photometry table.
        photometry: usize,
        /// Galaxies passing the stellar mass cut.
        galaxies: usize,
    },

    /// Photometry from different subvolumes or snapshots disagrees on bands.
    #[error("band set {found:?} does not match {expected:?}")]
    BandMismatch {
        /// Bands the accumulator was sized for.
        expected: Vec<String>,
        /// Bands that arrived.
        found: Vec<String>,
    },

    /// A band name is not present in the photometry.
    #[error("band '{0}' not present in photometry")]
    UnknownBand(String),

    /// Cosmological volume was zero or negative when normalizing counts.
    #[error("non-positive volume {volume} for snapshot {snapshot}")]
    NonPositiveVolume {
        /// Snapshot index.
        snapshot: u32,
        /// Offending volume.
        volume: f64,
    },

    /// The Hubble parameter is not a positive finite number.
    #[error("invalid h0 {h0} ({context})")]
    InvalidHubble {
        /// Offending value.
        h0: f64,
        /// Where the value came from.
        context: String,
    },

    /// An accumulator was driven out of order.
    #[error("snapshot slot {index}: {message}")]
    AccumulatorState {
        /// Slot in the accumulator.
        index: usize,
        /// What was attempted.
        message: String,
    },

    /// No snapshot is close enough to a requested redshift.
    #[error("no snapshot within {tolerance} of redshift {redshift}")]
    RedshiftNotFound {
        /// Requested redshift.
        redshift: f64,
        /// Maximum accepted distance.
        tolerance: f64,
    },

    /// Configuration validation failure.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Bin(#[from] BinError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for catalog analyses.
pub type Result<T> = std::result::Result<T, GalformError>;

impl GalformError {
    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GalformError::Read {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GalformError::Write {
            path: path.into(),
            source,
        }
    }
}
