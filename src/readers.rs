//! Readers for FOCI experiment output
//!
//! FOCI runs write one directory per experiment under an `esm_experiments` root. Raw model
//! output lives in `outdata/<model>/`, diagnostics derived by the monitoring scripts
//! (overturning, section transports, barotropic streamfunction) in `derived/nemo/`.

use crate::config::ReaderConfig;
use crate::errors::{FociError, Result};
use crate::grid::{Coordinate, Dataset, LabeledArray};
use crate::netcdf_io::{open_multifile_dataset, resolve_files};
use crate::time::TimeAxis;
use log::{debug, info};
use std::fmt;
use std::path::Path;

/// Component model of a FOCI run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Model {
    OpenIfs,
    Echam,
    Nemo,
}

impl Model {
    fn dir(self) -> &'static str {
        match self {
            Self::OpenIfs => "oifs",
            Self::Echam => "echam",
            Self::Nemo => "nemo",
        }
    }

    /// Dimension the output files are split along
    pub fn time_dim(self) -> &'static str {
        match self {
            Self::Echam => "time",
            Self::OpenIfs | Self::Nemo => "time_counter",
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::OpenIfs => "OpenIFS",
            Self::Echam => "ECHAM",
            Self::Nemo => "NEMO",
        };
        f.write_str(name)
    }
}

/// One experiment and the years to keep from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Experiment {
    /// Experiment ID, e.g. `FOCI_GJK029`
    pub id: String,
    /// Inclusive year range, `None` for everything
    pub years: Option<(i32, i32)>,
}

impl Experiment {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            years: None,
        }
    }

    pub fn with_years(mut self, start: i32, end: i32) -> Self {
        self.years = Some((start, end));
        self
    }
}

/// Which output stream of a model to read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFiles {
    /// Grid or stream tag, e.g. `grid_T`, `icemod`, `regular_sfc`, `BOT`
    pub grid: String,
    /// Output frequency tag, e.g. `1m`, `5d`, `mm`; `1y` selects the yearly means
    pub freq: String,
    /// AGRIF nest prefix such as `1_` (NEMO only)
    pub agrif_prefix: String,
}

impl ModelFiles {
    pub fn defaults(model: Model) -> Self {
        let (grid, freq) = match model {
            Model::OpenIfs => ("regular_sfc", "1m"),
            Model::Echam => ("BOT", "mm"),
            Model::Nemo => ("grid_T", "1m"),
        };
        Self {
            grid: grid.to_string(),
            freq: freq.to_string(),
            agrif_prefix: String::new(),
        }
    }

    pub fn with_grid(mut self, grid: impl Into<String>) -> Self {
        self.grid = grid.into();
        self
    }

    pub fn with_freq(mut self, freq: impl Into<String>) -> Self {
        self.freq = freq.into();
        self
    }

    fn yearly(&self) -> bool {
        self.freq == "1y"
    }
}

/// Glob pattern for one experiment's output files
pub fn file_pattern(model: Model, esm_dir: &Path, exp: &str, files: &ModelFiles) -> String {
    let root = esm_dir.join(exp).join("outdata");
    let root = root.display();
    let (grid, freq, agrif) = (&files.grid, &files.freq, &files.agrif_prefix);
    match model {
        Model::OpenIfs if files.yearly() => format!("{}/oifs/ym/{}*1y*{}.nc", root, exp, grid),
        Model::Echam if files.yearly() => format!("{}/echam/ym/{}*1y*{}.nc", root, exp, grid),
        Model::Nemo if files.yearly() => format!("{}/nemo/ym/{}{}*1y*{}.nc", root, agrif, exp, grid),
        Model::OpenIfs => format!("{}/{}/{}*{}*{}.nc", root, model.dir(), exp, freq, grid),
        Model::Echam => format!("{}/{}/{}*{}*{}*.nc", root, model.dir(), exp, grid, freq),
        Model::Nemo => format!("{}/{}/{}{}*{}*{}.nc", root, model.dir(), agrif, exp, freq, grid),
    }
}

/// Keep the time steps whose calendar year lies in `[start, end]`
///
/// # Errors
///
/// Returns an error if no variable carries a decodable time coordinate on `time_dim`.
pub fn select_years(ds: &Dataset, time_dim: &str, start: i32, end: i32) -> Result<Dataset> {
    let coord = ds
        .iter()
        .find_map(|v| v.coords().get(time_dim))
        .ok_or_else(|| FociError::CoordinateNotFound {
            var: "<dataset>".to_string(),
            coord: time_dim.to_string(),
        })?;
    let years = TimeAxis::from_coordinate(coord)?.years();
    let keep: Vec<usize> = (0..years.len())
        .filter(|&t| (start..=end).contains(&years[t]))
        .collect();
    debug!("Keeping {} of {} time steps in {}-{}", keep.len(), years.len(), start, end);

    ds.map_with_dim(time_dim, |v| v.select_indices(time_dim, &keep))
}

fn read_experiment(pattern: &str, exp: &Experiment, config: &ReaderConfig) -> Result<Dataset> {
    let files = resolve_files(pattern)?;
    let ds = open_multifile_dataset(&files, config)?;
    let time_dim = config
        .rename_time_to
        .as_deref()
        .unwrap_or(config.concat_dim.as_str());
    match exp.years {
        Some((start, end)) => select_years(&ds, time_dim, start, end),
        None => Ok(ds),
    }
}

/// Read model output for several experiments
///
/// Files are concatenated along the model's time dimension, which is always called
/// `time` afterwards.
///
/// # Errors
///
/// Returns an error if an experiment has no matching files or they cannot be read.
pub fn read_model(
    model: Model,
    experiments: &[Experiment],
    esm_dir: &Path,
    files: &ModelFiles,
    config: &ReaderConfig,
) -> Result<Vec<Dataset>> {
    let mut config = config.clone();
    config.concat_dim = model.time_dim().to_string();
    config.rename_time_to = match model {
        Model::Echam => None,
        Model::OpenIfs | Model::Nemo => Some("time".to_string()),
    };

    experiments
        .iter()
        .map(|exp| {
            let pattern = file_pattern(model, esm_dir, &exp.id, files);
            info!("Reading {} output: {}", model, pattern);
            read_experiment(&pattern, exp, &config)
        })
        .collect()
}

fn derived_pattern(esm_dir: &Path, exp: &str, suffix: &str) -> String {
    format!(
        "{}/{}*{}.nc",
        esm_dir.join(exp).join("derived").join("nemo").display(),
        exp,
        suffix
    )
}

fn nemo_derived_config(config: &ReaderConfig) -> ReaderConfig {
    let mut config = config.clone();
    config.concat_dim = "time_counter".to_string();
    config.rename_time_to = Some("time".to_string());
    config
}

/// Read the overturning streamfunction and the AMOC maxima at 25N and 45N
///
/// The streamfunction gets a `lat` coordinate on `y` taken from the first column of
/// `nav_lat`; the maxima are returned as `amoc25` and `amoc45`.
///
/// # Errors
///
/// Returns an error if files are missing or the three sources do not align in time.
pub fn read_amoc(experiments: &[Experiment], esm_dir: &Path, config: &ReaderConfig) -> Result<Vec<Dataset>> {
    let config = nemo_derived_config(config);

    experiments
        .iter()
        .map(|exp| {
            let moc = read_experiment(&derived_pattern(esm_dir, &exp.id, "moc"), exp, &config)?;
            let lat = moc.get("nav_lat")?.isel("x", 0)?;
            let lat = Coordinate::new("y", lat.to_series()?)
                .with_attr("units", "degrees_north")
                .with_attr("standard_name", "latitude");
            let moc = moc.map_with_dim("y", |v| v.clone().with_coord("lat", lat.clone()))?;

            let mut parts = vec![moc];
            for (suffix, name) in [("amoc_max_25.000N", "amoc25"), ("amoc_max_45.000N", "amoc45")] {
                let mut ds = read_experiment(&derived_pattern(esm_dir, &exp.id, suffix), exp, &config)?;
                ds.rename_var("AMOC_MAX", name)?;
                // grid variables of these files clash with the streamfunction's
                let amoc_max = ds
                    .remove(name)
                    .ok_or_else(|| FociError::VariableNotFound { var: name.to_string() })?;
                parts.push(Dataset::from_arrays([amoc_max])?);
            }
            Dataset::merge(parts)
        })
        .collect()
}

/// Sections with transports computed by the monitoring scripts
pub const TRANSPORT_SECTIONS: [&str; 18] = [
    "AFR_AUSTR",
    "AM_AFR",
    "AUS_AA",
    "AUSTR_AM",
    "BAFFIN",
    "BERING",
    "CAMPBELL",
    "CUBA_FLORIDA",
    "DAVIS",
    "DENMARK_STRAIT",
    "DRAKE",
    "FLORIDA_BAHAMAS",
    "FRAM",
    "ICELAND_SCOTLAND",
    "ITF",
    "KERGUELEN",
    "MOZAMBIQUE_CHANNEL",
    "SOUTH_AFR",
];

fn section_transport(ds: &Dataset, section: &str) -> Result<LabeledArray> {
    let name = ds
        .names()
        .find(|n| n.contains("vtrp"))
        .ok_or_else(|| FociError::VariableNotFound {
            var: format!("vtrp* ({})", section),
        })?;
    Ok(ds.get(name)?.isel("x", 0)?.isel("y", 0)?.renamed(section))
}

/// Read the volume transport time series through [`TRANSPORT_SECTIONS`]
///
/// Each section file carries its own grid variables, so only the transport is kept,
/// named after the section.
///
/// # Errors
///
/// Returns an error if a section file is missing or has no `vtrp` variable.
pub fn read_transports(experiments: &[Experiment], esm_dir: &Path, config: &ReaderConfig) -> Result<Vec<Dataset>> {
    let config = nemo_derived_config(config);

    experiments
        .iter()
        .map(|exp| {
            let series = TRANSPORT_SECTIONS
                .iter()
                .map(|section| {
                    let pattern = derived_pattern(esm_dir, &exp.id, &format!("{}_transports", section));
                    section_transport(&read_experiment(&pattern, exp, &config)?, section)
                })
                .collect::<Result<Vec<_>>>()?;
            Dataset::merge(series.into_iter().map(|s| Dataset::from_arrays([s])).collect::<Result<Vec<_>>>()?)
        })
        .collect()
}

/// Read the barotropic streamfunction
///
/// # Errors
///
/// Returns an error if the files are missing or cannot be read.
pub fn read_psi(experiments: &[Experiment], esm_dir: &Path, config: &ReaderConfig) -> Result<Vec<Dataset>> {
    let config = nemo_derived_config(config);
    experiments
        .iter()
        .map(|exp| read_experiment(&derived_pattern(esm_dir, &exp.id, "psi"), exp, &config))
        .collect()
}
