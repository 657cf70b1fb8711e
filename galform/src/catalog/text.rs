//! Plain-text column tables
//!
//! Provides reading and writing of whitespace (or comma) separated numeric
//! tables. Lines starting with `#` are comments; in named tables the first
//! comment line lists the column names. The same reader backs the
//! observational tables, which carry no header and are addressed by column
//! position.
//!
//! [`TextCatalog`] lays a snapshot catalog out on disk as
//!
//! ```text
//! <root>/<snapshot>/<subvolume>/run_info.txt            h0 / volume key-value pairs
//! <root>/<snapshot>/<subvolume>/galaxies.txt            named galaxy columns
//! <root>/<snapshot>/<subvolume>/sed[_<variant>]_ab_dust.txt
//! <root>/<snapshot>/<subvolume>/sed[_<variant>]_ab_nodust.txt
//! ```
//!
//! with photometry columns named `<component>:<band>`, e.g. `total:K`.

use std::path::{Path, PathBuf};

use ndarray::Array3;
use tracing::debug;

use super::{Attenuation, CatalogSource, Component, GalaxyTable, Photometry, RunInfo};
use crate::error::{GalformError, Result};

/// One parsed text table: optional header names and rows of numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct TextTable {
    pub header: Option<Vec<String>>,
    pub rows: Vec<Vec<f64>>,
    /// One-based file line of every row
    pub line_numbers: Vec<usize>,
}

impl TextTable {
    /// Values of column `idx` across all rows.
    pub fn column(&self, idx: usize) -> Option<Vec<f64>> {
        self.rows.iter().map(|row| row.get(idx).copied()).collect()
    }

    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }
}

fn split_fields(line: &str) -> impl Iterator<Item = &str> {
    line.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| GalformError::read(path, e))
}

fn write_lines(path: &Path, lines: &[String]) -> Result<()> {
    let mut contents = lines.join("\n");
    contents.push('\n');
    std::fs::write(path, contents).map_err(|e| GalformError::write(path, e))
}

/// Parse a numeric text table.
///
/// Every data row must have the same number of fields. A file with no data
/// rows is an [`GalformError::EmptyInput`].
pub fn read_text_table<P: AsRef<Path>>(path: P) -> Result<TextTable> {
    let path = path.as_ref();
    let contents = read_file(path)?;
    let mut header = None;
    let mut rows: Vec<Vec<f64>> = Vec::new();
    let mut line_numbers = Vec::new();

    for (line_num, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(comment) = line.strip_prefix('#') {
            if header.is_none() && rows.is_empty() {
                let names: Vec<String> = split_fields(comment).map(str::to_string).collect();
                if !names.is_empty() {
                    header = Some(names);
                }
            }
            continue;
        }

        let row = split_fields(line)
            .map(|field| {
                field.parse::<f64>().map_err(|_| GalformError::Parse {
                    path: path.to_path_buf(),
                    line: line_num + 1,
                    message: format!("'{field}' is not a number"),
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        if let Some(first) = rows.first() {
            if row.len() != first.len() {
                return Err(GalformError::Parse {
                    path: path.to_path_buf(),
                    line: line_num + 1,
                    message: format!("{} fields, expected {}", row.len(), first.len()),
                });
            }
        }
        rows.push(row);
        line_numbers.push(line_num + 1);
    }

    if rows.is_empty() {
        return Err(GalformError::EmptyInput(path.to_path_buf()));
    }

    debug!("Read {} rows from {}", rows.len(), path.display());
    Ok(TextTable {
        header,
        rows,
        line_numbers,
    })
}

fn require_header(table: &TextTable, path: &Path) -> Result<Vec<String>> {
    let header = table.header.clone().ok_or_else(|| GalformError::Parse {
        path: path.to_path_buf(),
        line: 1,
        message: "missing '# name ...' header line".to_string(),
    })?;
    if header.len() != table.width() {
        return Err(GalformError::Parse {
            path: path.to_path_buf(),
            line: 1,
            message: format!(
                "header names {} columns but rows have {}",
                header.len(),
                table.width()
            ),
        });
    }
    Ok(header)
}

/// Read a table whose header names every column.
pub fn read_named_table<P: AsRef<Path>>(path: P) -> Result<GalaxyTable> {
    let path = path.as_ref();
    let table = read_text_table(path)?;
    let header = require_header(&table, path)?;

    let mut galaxies = GalaxyTable::new();
    for (idx, name) in header.into_iter().enumerate() {
        let values = table.column(idx).unwrap_or_default();
        galaxies.insert_column(name, values)?;
    }
    Ok(galaxies)
}

/// Write a galaxy table with a header line.
pub fn write_named_table<P: AsRef<Path>>(table: &GalaxyTable, path: P) -> Result<()> {
    let names: Vec<&str> = table.column_names().collect();
    let columns = names
        .iter()
        .map(|name| table.column(name))
        .collect::<Result<Vec<&[f64]>>>()?;

    let mut lines = Vec::with_capacity(table.len() + 1);
    lines.push(format!("# {}", names.join(" ")));
    for row in 0..table.len() {
        let fields: Vec<String> = columns.iter().map(|c| format!("{:e}", c[row])).collect();
        lines.push(fields.join(" "));
    }
    write_lines(path.as_ref(), &lines)
}

/// Read `h0` and `volume` from `key value` lines.
pub fn read_run_info<P: AsRef<Path>>(path: P) -> Result<RunInfo> {
    let path = path.as_ref();
    let contents = read_file(path)?;
    let mut h0 = None;
    let mut volume = None;

    for (line_num, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = split_fields(line);
        let (Some(key), Some(value), None) = (fields.next(), fields.next(), fields.next()) else {
            return Err(GalformError::Parse {
                path: path.to_path_buf(),
                line: line_num + 1,
                message: "expected 'key value'".to_string(),
            });
        };
        let value: f64 = value.parse().map_err(|_| GalformError::Parse {
            path: path.to_path_buf(),
            line: line_num + 1,
            message: format!("'{value}' is not a number"),
        })?;
        match key {
            "h0" => h0 = Some(value),
            "volume" => volume = Some(value),
            other => debug!("Ignoring run info key '{other}' in {}", path.display()),
        }
    }

    let missing = |key: &str| GalformError::MissingColumn {
        table: path.display().to_string(),
        column: key.to_string(),
    };
    Ok(RunInfo {
        h0: h0.ok_or_else(|| missing("h0"))?,
        volume: volume.ok_or_else(|| missing("volume"))?,
    })
}

pub fn write_run_info<P: AsRef<Path>>(run: &RunInfo, path: P) -> Result<()> {
    let lines = [format!("h0 {}", run.h0), format!("volume {}", run.volume)];
    write_lines(path.as_ref(), &lines)
}

/// Read photometry with columns named `<component>:<band>`.
///
/// Bands keep the order of their first appearance in the header; every
/// component must be present for every band.
pub fn read_photometry_table<P: AsRef<Path>>(path: P) -> Result<Photometry> {
    let path = path.as_ref();
    let table = read_text_table(path)?;
    let header = require_header(&table, path)?;

    let mut bands: Vec<String> = Vec::new();
    let mut slots = Vec::with_capacity(header.len());
    for (idx, name) in header.iter().enumerate() {
        let (component, band) = name
            .split_once(':')
            .and_then(|(c, b)| Component::from_dataset(c).map(|c| (c, b)))
            .ok_or_else(|| GalformError::Parse {
                path: path.to_path_buf(),
                line: 1,
                message: format!("column '{name}' is not '<component>:<band>'"),
            })?;
        let band_idx = match bands.iter().position(|b| b == band) {
            Some(i) => i,
            None => {
                bands.push(band.to_string());
                bands.len() - 1
            }
        };
        slots.push((idx, component, band_idx));
    }

    let mut magnitudes = Array3::from_elem(
        (Component::ALL.len(), bands.len(), table.rows.len()),
        f64::NAN,
    );
    let mut seen = vec![false; Component::ALL.len() * bands.len()];
    for &(idx, component, band_idx) in &slots {
        seen[component.index() * bands.len() + band_idx] = true;
        for (galaxy, row) in table.rows.iter().enumerate() {
            magnitudes[[component.index(), band_idx, galaxy]] = row[idx];
        }
    }
    if let Some(missing) = seen.iter().position(|&s| !s) {
        let component = Component::ALL[missing / bands.len()];
        let band = &bands[missing % bands.len()];
        return Err(GalformError::MissingColumn {
            table: path.display().to_string(),
            column: format!("{component}:{band}"),
        });
    }

    Photometry::new(bands, magnitudes)
}

pub fn write_photometry_table<P: AsRef<Path>>(photometry: &Photometry, path: P) -> Result<()> {
    let mut names = Vec::new();
    for component in Component::ALL {
        for band in photometry.bands() {
            names.push(format!("{component}:{band}"));
        }
    }

    let mut lines = Vec::with_capacity(photometry.len() + 1);
    lines.push(format!("# {}", names.join(" ")));
    for galaxy in 0..photometry.len() {
        let mut fields = Vec::with_capacity(names.len());
        for component in Component::ALL {
            for band in 0..photometry.bands().len() {
                fields.push(format!("{:e}", photometry.magnitudes(component, band)[galaxy]));
            }
        }
        lines.push(fields.join(" "));
    }
    write_lines(path.as_ref(), &lines)
}

/// Snapshot catalog stored as text tables under one root directory.
#[derive(Debug, Clone)]
pub struct TextCatalog {
    root: PathBuf,
    sed_variant: Option<String>,
}

impl TextCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            sed_variant: None,
        }
    }

    /// Read photometry produced with a named attenuation model.
    pub fn with_sed_variant(mut self, variant: impl Into<String>) -> Self {
        self.sed_variant = Some(variant.into());
        self
    }

    pub fn subvolume_dir(&self, snapshot: u32, subvolume: u32) -> PathBuf {
        self.root
            .join(snapshot.to_string())
            .join(subvolume.to_string())
    }

    pub fn galaxies_path(&self, snapshot: u32, subvolume: u32) -> PathBuf {
        self.subvolume_dir(snapshot, subvolume).join("galaxies.txt")
    }

    pub fn run_info_path(&self, snapshot: u32, subvolume: u32) -> PathBuf {
        self.subvolume_dir(snapshot, subvolume).join("run_info.txt")
    }

    pub fn photometry_path(&self, snapshot: u32, subvolume: u32, attenuation: Attenuation) -> PathBuf {
        let name = match &self.sed_variant {
            Some(variant) => format!("sed_{variant}_{}.txt", attenuation.dataset()),
            None => format!("sed_{}.txt", attenuation.dataset()),
        };
        self.subvolume_dir(snapshot, subvolume).join(name)
    }

    /// Write one subvolume in the layout this catalog reads.
    pub fn write_subvolume(
        &self,
        snapshot: u32,
        subvolume: u32,
        run: &RunInfo,
        galaxies: &GalaxyTable,
        photometry: &[(Attenuation, &Photometry)],
    ) -> Result<()> {
        let dir = self.subvolume_dir(snapshot, subvolume);
        std::fs::create_dir_all(&dir)?;
        write_run_info(run, self.run_info_path(snapshot, subvolume))?;
        write_named_table(galaxies, self.galaxies_path(snapshot, subvolume))?;
        for (attenuation, phot) in photometry {
            write_photometry_table(phot, self.photometry_path(snapshot, subvolume, *attenuation))?;
        }
        Ok(())
    }
}

impl CatalogSource for TextCatalog {
    fn read_galaxies(
        &self,
        snapshot: u32,
        subvolume: u32,
        columns: &[&str],
    ) -> Result<(RunInfo, GalaxyTable)> {
        let run = read_run_info(self.run_info_path(snapshot, subvolume))?;
        let table = read_named_table(self.galaxies_path(snapshot, subvolume))?;
        Ok((run, table.select(columns)?))
    }

    fn read_photometry(
        &self,
        snapshot: u32,
        subvolume: u32,
        attenuation: Attenuation,
    ) -> Result<Photometry> {
        read_photometry_table(self.photometry_path(snapshot, subvolume, attenuation))
    }
}
