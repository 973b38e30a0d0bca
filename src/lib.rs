//! foci_tools: post-processing diagnostics for FOCI climate model output
//!
//! Reads OpenIFS, ECHAM and NEMO NetCDF output from FOCI experiments and derives the
//! standard monitoring diagnostics from it.
//!
//! ## Key Features
//!
//! - **Area-weighted means**: cosine-latitude weighting on regular grids, cell areas on
//!   the curvilinear NEMO grid, masked and zonal variants
//! - **Sea ice**: area, extent, volume and mean thickness per hemisphere
//! - **ENSO**: NINO1+2, NINO3, NINO3.4 and ONI indices with event classification
//! - **AMOC**: overturning strength at a chosen latitude
//! - **Readers**: multi-file datasets read in parallel, experiment directory layouts,
//!   NEMO mesh metrics
//!
//! ## Module Organization
//!
//! - [`grid`]: labeled arrays and datasets, broadcasting by dimension name
//! - [`statistics`]: missing-aware reductions and weighted means
//! - [`seaice`], [`climate_indices`], [`streamfunctions`]: the diagnostics
//! - [`netcdf_io`], [`readers`], [`mesh`]: NetCDF input and output
//! - [`time`]: CF time decoding for non-standard calendars
//! - [`config`], [`parallel`]: explicit settings
//! - [`errors`]: centralized error handling
//!
//! ## Usage
//!
//! ```rust,no_run
//! use foci_tools::prelude::*;
//! use std::path::Path;
//!
//! let files = resolve_files("/esm/FOCI_GJK029/outdata/nemo/*1m*icemod.nc").unwrap();
//! let ds = open_multifile_dataset(&files, &ReaderConfig::default()).unwrap();
//! let mesh = read_nemo_mesh(Path::new("/esm/mesh_mask.nc")).unwrap();
//!
//! let seaice = seaice_diagnostics(&ds, mesh.get("areacello").unwrap(), &SeaIceConfig::default()).unwrap();
//! println!("{}", seaice.get("ar_sia").unwrap());
//! ```

pub mod climate_indices;
pub mod config;
pub mod errors;
pub mod grid;
pub mod logging;
pub mod mesh;
pub mod metadata;
pub mod netcdf_io;
pub mod parallel;
pub mod readers;
pub mod seaice;
pub mod statistics;
pub mod streamfunctions;
pub mod time;

pub use errors::*;

pub mod prelude {
    //! Commonly used imports for convenience
    pub use crate::climate_indices::{
        compute_nino_index, EnsoEvents, EventThresholds, NinoConfig, NinoIndex, NinoResult,
    };
    pub use crate::config::{GridDims, NemoDims, ReaderConfig, SeaIceConfig};
    pub use crate::errors::{FociError, Result};
    pub use crate::grid::{Coordinate, Dataset, LabeledArray};
    pub use crate::mesh::{compute_dz_tilde, read_nemo_mesh};
    pub use crate::netcdf_io::{open_dataset, open_multifile_dataset, resolve_files, write_dataset, NetCDFWriter};
    pub use crate::parallel::ParallelConfig;
    pub use crate::readers::{read_amoc, read_model, read_psi, read_transports, Experiment, Model, ModelFiles};
    pub use crate::seaice::{ice_volumes, seaice_areas, seaice_diagnostics, Hemisphere};
    pub use crate::statistics::{area_mean, area_mean_nemo, weighted_mean, zonal_mean_nemo, StatOperation};
    pub use crate::streamfunctions::{compute_amoc_strength, AmocConfig, AmocStrength};
}
