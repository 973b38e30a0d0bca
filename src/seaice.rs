//! Hemispheric sea-ice diagnostics from NEMO/LIM output
//!
//! Output variables are prefixed `ar_` (Arctic, latitude > 0) and `an_` (Antarctic,
//! latitude < 0):
//!
//! | name            | quantity                                         | units      |
//! |-----------------|--------------------------------------------------|------------|
//! | `ar_sia/an_sia` | sum of concentration x cell area                 | 1e6 km2    |
//! | `ar_sie/an_sie` | as area, only where concentration > 0.15         | 1e6 km2    |
//! | `ar_siv/an_siv` | sum of cell-mean thickness x cell area           | km3        |
//! | `ar_sit/an_sit` | area-weighted mean thickness where conc. >= 0.15 | m          |
//!
//! The extent filter is strict (`>`) while the thickness filter is inclusive (`>=`).
//! Both reproduce published FOCI diagnostics and are kept as they are.

use crate::config::SeaIceConfig;
use crate::errors::Result;
use crate::grid::{Dataset, LabeledArray};
use crate::statistics::weighted_mean;
use log::debug;

/// m2 to 1e6 km2
pub const AREA_SCALE: f64 = 1e-12;

/// m3 to km3
pub const VOLUME_SCALE: f64 = 1e-9;

/// Concentration threshold for extent and mean thickness
pub const CONCENTRATION_THRESHOLD: f64 = 0.15;

/// Hemisphere selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hemisphere {
    North,
    South,
}

impl Hemisphere {
    pub const BOTH: [Hemisphere; 2] = [Hemisphere::North, Hemisphere::South];

    /// Variable-name prefix of this hemisphere
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::North => "ar",
            Self::South => "an",
        }
    }

    /// True for latitudes strictly inside the hemisphere (the equator belongs to neither)
    #[must_use]
    pub fn contains(self, lat: f64) -> bool {
        match self {
            Self::North => lat > 0.0,
            Self::South => lat < 0.0,
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::North => "Northern hemisphere",
            Self::South => "Southern hemisphere",
        }
    }
}

/// Sea-ice area and extent for both hemispheres
///
/// Returns `ar_sia`, `an_sia`, `ar_sie`, `an_sie` as time series. A hemisphere without
/// ice has zero area and extent, not missing values.
///
/// # Errors
///
/// Returns an error if the concentration or latitude variable is missing, if grids do
/// not align, or if the per-hemisphere results disagree on their time coordinate.
pub fn seaice_areas(ds: &Dataset, cell_area: &LabeledArray, config: &SeaIceConfig) -> Result<Dataset> {
    let sic = ds.get(&config.concentration)?;
    let lat = ds.get(&config.dims.lat)?;
    let xy = [config.dims.x.as_str(), config.dims.y.as_str()];

    let mut areas = Vec::new();
    let mut extents = Vec::new();
    for hemi in Hemisphere::BOTH {
        let in_hemi = sic.where_cond(lat, |l| hemi.contains(l))?;

        let area = in_hemi
            .mul(cell_area)?
            .sum_over(&xy)?
            .scale(AREA_SCALE)
            .renamed(format!("{}_sia", hemi.prefix()));
        areas.push(annotate(area, "1e6 km2", &format!("{} sea-ice area", hemi.label())));

        let extent = in_hemi
            .where_self(|c| c > CONCENTRATION_THRESHOLD)
            .mul(cell_area)?
            .sum_over(&xy)?
            .scale(AREA_SCALE)
            .renamed(format!("{}_sie", hemi.prefix()));
        extents.push(annotate(extent, "1e6 km2", &format!("{} sea-ice extent", hemi.label())));
    }

    debug!("Computed sea-ice area and extent from '{}'", sic.name);
    merge_results(areas.into_iter().chain(extents))
}

/// Sea-ice volume and mean thickness for both hemispheres
///
/// Returns `ar_siv`, `an_siv`, `ar_sit`, `an_sit`. The thickness variable holds the
/// cell-mean thickness: half a cell covered by 2 m of ice reads 1 m.
///
/// # Errors
///
/// Returns an error if a required variable is missing, if grids do not align, or if
/// the results disagree on their time coordinate.
pub fn ice_volumes(ds: &Dataset, cell_area: &LabeledArray, config: &SeaIceConfig) -> Result<Dataset> {
    let sit = ds.get(&config.thickness)?;
    let sic = ds.get(&config.concentration)?;
    let lat = ds.get(&config.dims.lat)?;
    let xy = [config.dims.x.as_str(), config.dims.y.as_str()];

    let mut volumes = Vec::new();
    let mut thicknesses = Vec::new();
    for hemi in Hemisphere::BOTH {
        let in_hemi = sit.where_cond(lat, |l| hemi.contains(l))?;

        let volume = in_hemi
            .mul(cell_area)?
            .sum_over(&xy)?
            .scale(VOLUME_SCALE)
            .renamed(format!("{}_siv", hemi.prefix()));
        volumes.push(annotate(volume, "km3", &format!("{} sea-ice volume", hemi.label())));

        let covered = in_hemi.where_cond(sic, |c| c >= CONCENTRATION_THRESHOLD)?;
        let thickness =
            weighted_mean(&covered, cell_area, &xy)?.renamed(format!("{}_sit", hemi.prefix()));
        thicknesses.push(annotate(
            thickness,
            "m",
            &format!("{} mean sea-ice thickness", hemi.label()),
        ));
    }

    debug!("Computed sea-ice volume and thickness from '{}'", sit.name);
    merge_results(volumes.into_iter().chain(thicknesses))
}

/// All sea-ice diagnostics in one dataset
///
/// # Errors
///
/// See [`seaice_areas`] and [`ice_volumes`].
pub fn seaice_diagnostics(
    ds: &Dataset,
    cell_area: &LabeledArray,
    config: &SeaIceConfig,
) -> Result<Dataset> {
    Dataset::merge([
        seaice_areas(ds, cell_area, config)?,
        ice_volumes(ds, cell_area, config)?,
    ])
}

fn annotate(mut array: LabeledArray, units: &str, long_name: &str) -> LabeledArray {
    array.attrs.clear();
    array.with_attr("units", units).with_attr("long_name", long_name)
}

fn merge_results(results: impl IntoIterator<Item = LabeledArray>) -> Result<Dataset> {
    let parts = results
        .into_iter()
        .map(|a| Dataset::from_arrays([a]))
        .collect::<Result<Vec<_>>>()?;
    Dataset::merge(parts)
}
