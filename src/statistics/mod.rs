//! Reductions over labeled grids
//!
//! # Organization
//!
//! - [`operations`]: missing-aware window reducers (sum, mean, max, std)
//! - [`weighted`]: area-weighted spatial means on lon/lat and NEMO grids

pub mod operations;
pub mod weighted;

pub use operations::{nanmax, nanmean, nanstd, nansum, StatOperation};
pub use weighted::{area_mean, area_mean_nemo, weighted_mean, zonal_mean_nemo};
