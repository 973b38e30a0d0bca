//! Overturning streamfunction diagnostics

use crate::errors::{FociError, Result};
use crate::grid::LabeledArray;
use log::info;
use ndarray::ArrayView1;

/// Where to read the AMOC strength from a `zomsfatl`-like field
#[derive(Debug, Clone, PartialEq)]
pub struct AmocConfig {
    /// Requested latitude (degrees north)
    pub target_lat: f64,
    /// Latitude coordinate attached to `y_dim`
    pub lat_coord: String,
    pub x_dim: String,
    pub y_dim: String,
    pub depth_dim: String,
}

impl Default for AmocConfig {
    fn default() -> Self {
        Self {
            target_lat: 26.5,
            lat_coord: "lat".to_string(),
            x_dim: "x".to_string(),
            y_dim: "y".to_string(),
            depth_dim: "depthw".to_string(),
        }
    }
}

/// AMOC time series and the grid row it was taken from
#[derive(Debug, Clone)]
pub struct AmocStrength {
    pub series: LabeledArray,
    /// Latitude of the selected row, which differs from the requested one on coarse grids
    pub latitude_used: f64,
    pub j_index: usize,
}

/// Index of the value closest to `target`
///
/// Ties go to the lowest index; missing values are never selected.
pub fn nearest_index(values: ArrayView1<f64>, target: f64) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .fold(None, |best: Option<(usize, f64)>, (j, &v)| {
            let dist = (v - target).abs();
            match best {
                Some((_, d)) if d <= dist => best,
                _ => Some((j, dist)),
            }
        })
        .map(|(j, _)| j)
}

/// Maximum of the overturning streamfunction over depth at the row nearest to a latitude
///
/// The overturning field is stored zonally integrated with `x` of length one, so
/// `x = 0` is taken. No interpolation is done between rows.
///
/// # Errors
///
/// Returns an error if the latitude coordinate is missing, not attached to the
/// meridional dimension, or entirely missing, or if a dimension is absent.
pub fn compute_amoc_strength(da_amoc: &LabeledArray, config: &AmocConfig) -> Result<AmocStrength> {
    let lat = da_amoc.coord(&config.lat_coord)?;
    if lat.dim != config.y_dim {
        return Err(FociError::Generic(format!(
            "Latitude coordinate '{}' lies on '{}', expected '{}'",
            config.lat_coord, lat.dim, config.y_dim
        )));
    }

    let j = nearest_index(lat.values.view(), config.target_lat).ok_or_else(|| {
        FociError::Generic(format!(
            "Latitude coordinate '{}' of '{}' has no valid values",
            config.lat_coord, da_amoc.name
        ))
    })?;
    let latitude_used = lat.values[j];
    info!(
        "AMOC latitude used: {:.3} (requested {:.3}, j = {})",
        latitude_used, config.target_lat, j
    );

    let mut series = da_amoc
        .isel(&config.x_dim, 0)?
        .isel(&config.y_dim, j)?
        .max_over(&[config.depth_dim.as_str()])?;
    if series.coords().contains_key(&config.lat_coord) {
        series = series.drop_coord(&config.lat_coord)?;
    }
    let series = series.with_attr("latitude", format!("{:.3}", latitude_used));

    Ok(AmocStrength {
        series,
        latitude_used,
        j_index: j,
    })
}
