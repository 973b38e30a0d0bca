//! Area-weighted spatial means
//!
//! The weighted mean over a set of dimensions is
//! `sum(data * weight) / sum(weight)`, where both sums only run over cells whose data
//! is present. Masked cells therefore contribute to neither numerator nor denominator,
//! and a window without any valid cell yields a missing value.

use crate::config::{GridDims, NemoDims};
use crate::errors::{FociError, Result};
use crate::grid::LabeledArray;
use log::debug;
use std::f64::consts::TAU;

/// Weighted mean of `data` over `dims`
///
/// `weights` is broadcast against `data` by dimension name. Weights only need to be
/// well defined on cells where `data` is present.
///
/// # Errors
///
/// Returns [`FociError::InvalidWeights`] if a weight on a valid cell is negative or
/// not finite, and a dimension error if a reduction dimension is absent.
pub fn weighted_mean<S: AsRef<str>>(
    data: &LabeledArray,
    weights: &LabeledArray,
    dims: &[S],
) -> Result<LabeledArray> {
    for d in dims {
        data.axis(d.as_ref())?;
    }

    let active = data.zip_with(weights, |v, w| if v.is_nan() { 0.0 } else { w })?;
    if let Some(bad) = active.data().iter().find(|w| !w.is_finite() || **w < 0.0) {
        return Err(FociError::InvalidWeights {
            message: format!(
                "weight {} in '{}' on a valid cell of '{}'",
                bad, weights.name, data.name
            ),
        });
    }

    let weighted = data.zip_with(weights, |v, w| v * w)?;
    let numerator = weighted.sum_over(dims)?;
    let denominator = active.sum_over(dims)?;

    numerator.zip_with(&denominator, |n, s| if s > 0.0 { n / s } else { f64::NAN })
}

/// Area mean of data on a regular longitude/latitude grid
///
/// Coordinates are taken in degrees. The array is copied, converted to radians and
/// sorted so that longitude runs over `[0, 2pi)` and latitude from south to north before
/// weighting by `cos(latitude)`. The caller's array is left untouched.
///
/// # Errors
///
/// Returns an error if either dimension or its coordinate is missing.
pub fn area_mean(data: &LabeledArray, dims: &GridDims) -> Result<LabeledArray> {
    let (lon, lat) = (dims.lon.as_str(), dims.lat.as_str());
    data.axis(lon)?;
    data.axis(lat)?;

    let sorted = data
        .map_coord(lon, |v| v.to_radians().rem_euclid(TAU))?
        .map_coord(lat, f64::to_radians)?
        .sortby(lon)?
        .sortby(lat)?;

    let lat_coord = sorted.coord(lat)?;
    let weights = LabeledArray::new(
        "weights",
        &[lat_coord.dim.as_str()],
        lat_coord.values.mapv(|phi| phi.cos().max(0.0)).into_dyn(),
    )?;

    debug!(
        "Area mean of '{}' over {} x {} cells",
        data.name,
        sorted.len_of(lon)?,
        sorted.len_of(lat)?
    );

    weighted_mean(&sorted, &weights, &[lon, lat])
}

/// Area mean of NEMO data
///
/// Cells where `mask` is not 1 are set missing before weighting with `cell_area`
/// (m2 by convention, any consistent unit works).
///
/// # Errors
///
/// Returns an error if the grids do not align or a weight on a wet cell is invalid.
pub fn area_mean_nemo(
    data: &LabeledArray,
    mask: &LabeledArray,
    cell_area: &LabeledArray,
    dims: &NemoDims,
) -> Result<LabeledArray> {
    let masked = data.where_cond(mask, |m| m == 1.0)?;
    weighted_mean(&masked, cell_area, &[dims.x.as_str(), dims.y.as_str()])
}

/// Zonal (along-`x`) weighted mean of NEMO data
///
/// Returns the mean field together with the mean of the latitude field along `x`, to
/// be used as the meridional axis of the result.
///
/// # Errors
///
/// Returns an error if the grids do not align or a weight on a wet cell is invalid.
pub fn zonal_mean_nemo(
    data: &LabeledArray,
    mask: &LabeledArray,
    cell_area: &LabeledArray,
    latitude: &LabeledArray,
    dims: &NemoDims,
) -> Result<(LabeledArray, LabeledArray)> {
    let masked = data.where_cond(mask, |m| m == 1.0)?;
    let data_mean = weighted_mean(&masked, cell_area, &[dims.x.as_str()])?;
    let lat_mean = latitude.mean_over(&[dims.x.as_str()])?;
    Ok((data_mean, lat_mean))
}
