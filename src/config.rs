//! Explicit configuration structures
//!
//! Dimension and variable names differ between OpenIFS, ECHAM and NEMO output. Each
//! diagnostic takes its names from one of these structs instead of module-level
//! defaults; the `Default` impls hold the names the FOCI model output uses.

use crate::parallel::ParallelConfig;
use indexmap::IndexMap;

/// Dimension names of a regular longitude/latitude grid (OpenIFS, ECHAM)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridDims {
    pub lon: String,
    pub lat: String,
}

impl Default for GridDims {
    fn default() -> Self {
        Self {
            lon: "lon".to_string(),
            lat: "lat".to_string(),
        }
    }
}

/// Dimension names of the curvilinear NEMO grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NemoDims {
    pub x: String,
    pub y: String,
    /// Two-dimensional latitude field on T points
    pub lat: String,
}

impl Default for NemoDims {
    fn default() -> Self {
        Self {
            x: "x".to_string(),
            y: "y".to_string(),
            lat: "nav_lat".to_string(),
        }
    }
}

/// Variable names used by the sea-ice diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeaIceConfig {
    /// Ice concentration (fraction 0-1)
    pub concentration: String,
    /// Cell-mean ice thickness (m)
    pub thickness: String,
    pub dims: NemoDims,
}

impl Default for SeaIceConfig {
    fn default() -> Self {
        Self {
            concentration: "ileadfra".to_string(),
            thickness: "iicethic".to_string(),
            dims: NemoDims::default(),
        }
    }
}

/// Settings for reading multi-file model output
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Dimension the files are concatenated along
    pub concat_dim: String,
    /// New name for `concat_dim` after reading, if any
    pub rename_time_to: Option<String>,
    /// Chunk length per dimension (`-1` = whole dimension)
    pub chunks: IndexMap<String, isize>,
    pub parallel: ParallelConfig,
    /// Decode time-difference variables (tracer ages) into days
    pub decode_timedelta: bool,
}

impl ReaderConfig {
    /// Reader settings for files concatenated along `dim`
    pub fn along(dim: &str) -> Self {
        let mut chunks = IndexMap::new();
        chunks.insert(dim.to_string(), 1);
        Self {
            concat_dim: dim.to_string(),
            chunks,
            ..Self::default()
        }
    }
}

impl Default for ReaderConfig {
    fn default() -> Self {
        let mut chunks = IndexMap::new();
        chunks.insert("time_counter".to_string(), 1);
        chunks.insert("lat".to_string(), -1);
        chunks.insert("lon".to_string(), -1);
        Self {
            concat_dim: "time_counter".to_string(),
            rename_time_to: Some("time".to_string()),
            chunks,
            parallel: ParallelConfig::default(),
            decode_timedelta: true,
        }
    }
}
