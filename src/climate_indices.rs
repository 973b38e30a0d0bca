//! ENSO indices from monthly sea-surface temperature
//!
//! Regions and smoothing follow the NCAR Climate Data Guide definitions
//! (<https://climatedataguide.ucar.edu/climate-data/nino-sst-indices-nino-12-3-34-4-oni-and-tni>):
//!
//! | index   | longitude  | latitude  | running mean | events      |
//! |---------|------------|-----------|--------------|-------------|
//! | NINO1+2 | 270-280 E  | 10S-0     | 5 months     | configured  |
//! | NINO3   | 210-270 E  | 5S-5N     | 5 months     | configured  |
//! | NINO3.4 | 190-240 E  | 5S-5N     | 5 months     | +-0.4 K     |
//! | ONI     | 190-240 E  | 5S-5N     | 3 months     | +-0.5 K     |
//!
//! Besides the normalized index the estimator returns the El Nino and La Nina months,
//! which makes compositing straightforward.

use crate::config::GridDims;
use crate::errors::{FociError, Result};
use crate::grid::LabeledArray;
use crate::statistics::{area_mean, nanmean, nanstd};
use crate::time::TimeAxis;
use log::{debug, info, warn};
use ndarray::Array1;
use std::fmt;
use std::str::FromStr;

/// Supported ENSO indices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NinoIndex {
    Nino12,
    Nino3,
    Nino34,
    Oni,
}

/// Longitude/latitude box in degrees (longitude east, 0-360)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NinoRegion {
    pub lon: (f64, f64),
    pub lat: (f64, f64),
}

/// Thresholds on the smoothed anomaly (K) that mark event months
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventThresholds {
    /// El Nino when the smoothed anomaly is `>=` this value
    pub positive: f64,
    /// La Nina when the smoothed anomaly is `<=` this value
    pub negative: f64,
}

impl EventThresholds {
    /// Symmetric thresholds `+cut` / `-cut`
    pub fn symmetric(cut: f64) -> Self {
        Self {
            positive: cut,
            negative: -cut,
        }
    }
}

impl NinoIndex {
    pub const ALL: [NinoIndex; 4] = [Self::Nino12, Self::Nino3, Self::Nino34, Self::Oni];

    #[must_use]
    pub const fn region(self) -> NinoRegion {
        match self {
            Self::Nino12 => NinoRegion {
                lon: (270.0, 280.0),
                lat: (-10.0, 0.0),
            },
            Self::Nino3 => NinoRegion {
                lon: (210.0, 270.0),
                lat: (-5.0, 5.0),
            },
            Self::Nino34 | Self::Oni => NinoRegion {
                lon: (190.0, 240.0),
                lat: (-5.0, 5.0),
            },
        }
    }

    /// Length of the centered running mean in months
    #[must_use]
    pub const fn running_mean_window(self) -> usize {
        match self {
            Self::Oni => 3,
            _ => 5,
        }
    }

    /// Published event thresholds; NINO1+2 and NINO3 have none
    #[must_use]
    pub fn default_thresholds(self) -> Option<EventThresholds> {
        match self {
            Self::Nino34 => Some(EventThresholds::symmetric(0.4)),
            Self::Oni => Some(EventThresholds::symmetric(0.5)),
            Self::Nino12 | Self::Nino3 => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Nino12 => "NINO1+2",
            Self::Nino3 => "NINO3",
            Self::Nino34 => "NINO3.4",
            Self::Oni => "ONI",
        }
    }
}

impl fmt::Display for NinoIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NinoIndex {
    type Err = FociError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|i| i.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| FociError::UnknownIndex { name: s.to_string() })
    }
}

/// Settings for [`compute_nino_index`]
#[derive(Debug, Clone)]
pub struct NinoConfig {
    pub index: NinoIndex,
    pub time_dim: String,
    pub grid: GridDims,
    /// Overrides the published thresholds; required for NINO1+2 and NINO3 events
    pub thresholds: Option<EventThresholds>,
    pub classify_events: bool,
    /// Minimum valid samples per calendar month for the climatology
    pub min_samples_per_month: usize,
}

impl NinoConfig {
    pub fn new(index: NinoIndex) -> Self {
        Self {
            index,
            time_dim: "time".to_string(),
            grid: GridDims::default(),
            thresholds: None,
            classify_events: true,
            min_samples_per_month: 1,
        }
    }

    /// Thresholds to classify with, `None` when classification is off
    ///
    /// # Errors
    ///
    /// Returns [`FociError::MissingConfiguration`] when events are requested for an
    /// index without published thresholds and none were configured.
    pub fn resolve_thresholds(&self) -> Result<Option<EventThresholds>> {
        if !self.classify_events {
            return Ok(None);
        }
        self.thresholds
            .or_else(|| self.index.default_thresholds())
            .map(Some)
            .ok_or_else(|| FociError::MissingConfiguration {
                message: format!(
                    "{} has no published event thresholds; set them explicitly or disable event classification",
                    self.index
                ),
            })
    }
}

/// Time indices of event months
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnsoEvents {
    /// El Nino months
    pub positive: Vec<usize>,
    /// La Nina months
    pub negative: Vec<usize>,
}

impl EnsoEvents {
    /// El Nino months as a boolean series of length `len`
    pub fn positive_mask(&self, len: usize) -> Vec<bool> {
        to_mask(&self.positive, len)
    }

    /// La Nina months as a boolean series of length `len`
    pub fn negative_mask(&self, len: usize) -> Vec<bool> {
        to_mask(&self.negative, len)
    }
}

fn to_mask(indices: &[usize], len: usize) -> Vec<bool> {
    let mut mask = vec![false; len];
    for &i in indices.iter().filter(|&&i| i < len) {
        mask[i] = true;
    }
    mask
}

/// Output of [`compute_nino_index`]
#[derive(Debug, Clone)]
pub struct NinoResult {
    /// Normalized index (zero mean, unit standard deviation)
    pub index: LabeledArray,
    /// Smoothed regional anomaly in K, before normalization
    pub smoothed: LabeledArray,
    pub events: Option<EnsoEvents>,
}

/// Subtract the calendar-month climatology at every grid point
///
/// Months whose climatology has fewer than `min_samples` valid values become missing
/// for every year.
///
/// # Errors
///
/// Returns an error if the time dimension, its coordinate or its units are missing.
pub fn monthly_anomalies(data: &LabeledArray, time_dim: &str, min_samples: usize) -> Result<LabeledArray> {
    let time = TimeAxis::from_coordinate(data.coord(time_dim)?)?;
    let months = time.months();

    let mut climatology: Vec<Option<LabeledArray>> = vec![None; 12];
    for month in 1..=12u32 {
        let members: Vec<usize> = (0..months.len()).filter(|&t| months[t] == month).collect();
        if members.is_empty() {
            continue;
        }
        let clim = data
            .select_indices(time_dim, &members)?
            .reduce_over(&[time_dim], |w| {
                let valid = w.iter().filter(|v| !v.is_nan()).count();
                if valid < min_samples.max(1) {
                    f64::NAN
                } else {
                    nanmean(w)
                }
            })?;
        climatology[month as usize - 1] = Some(clim);
    }

    let steps = months
        .iter()
        .enumerate()
        .map(|(t, &m)| {
            let clim = climatology[m as usize - 1].as_ref().ok_or_else(|| {
                FociError::Generic(format!("no climatology for month {}", m))
            })?;
            data.select_indices(time_dim, &[t])?.zip_with(clim, |v, c| v - c)
        })
        .collect::<Result<Vec<_>>>()?;

    LabeledArray::concat(&steps, time_dim)
}

/// Centered running mean
///
/// The first and last `window / 2` values are missing, as is every value whose window
/// contains a missing value.
pub fn running_mean(series: &Array1<f64>, window: usize) -> Array1<f64> {
    let n = series.len();
    let half = window / 2;
    Array1::from_shape_fn(n, |i| {
        if window == 0 || i < half || i + (window - 1 - half) >= n {
            return f64::NAN;
        }
        let start = i - half;
        let w = series.slice(ndarray::s![start..start + window]);
        if w.iter().any(|v| v.is_nan()) {
            f64::NAN
        } else {
            w.sum() / window as f64
        }
    })
}

/// Classify event months on a smoothed anomaly series
///
/// Missing values count as zero, so undefined edge months are never events.
pub fn classify_events(smoothed: &Array1<f64>, thresholds: EventThresholds) -> EnsoEvents {
    let filled: Vec<f64> = smoothed.iter().map(|&v| if v.is_nan() { 0.0 } else { v }).collect();
    EnsoEvents {
        positive: (0..filled.len()).filter(|&t| filled[t] >= thresholds.positive).collect(),
        negative: (0..filled.len()).filter(|&t| filled[t] <= thresholds.negative).collect(),
    }
}

/// Remove the mean and divide by the population standard deviation
///
/// Missing values are ignored in both statistics and stay missing.
pub fn normalize(series: &Array1<f64>) -> Array1<f64> {
    let mean = nanmean(series.view());
    let std = nanstd(series.view());
    series.mapv(|v| (v - mean) / std)
}

/// Compute an ENSO index from a monthly SST field
///
/// # Errors
///
/// Returns an error if thresholds are required but not configured, if the time axis
/// cannot be decoded, or if the field lacks the configured dimensions.
pub fn compute_nino_index(sst: &LabeledArray, config: &NinoConfig) -> Result<NinoResult> {
    let thresholds = config.resolve_thresholds()?;
    let index = config.index;
    let region = index.region();
    let (lon, lat) = (config.grid.lon.as_str(), config.grid.lat.as_str());

    let anomalies = monthly_anomalies(sst, &config.time_dim, config.min_samples_per_month)?;

    let (lon0, lon1) = region.lon;
    let boxed = anomalies
        .sel_where(lon, |v| {
            let v = v.rem_euclid(360.0);
            v >= lon0 && v <= lon1
        })?
        .sel_range(lat, region.lat.0, region.lat.1)?;
    if boxed.len_of(lon)? == 0 || boxed.len_of(lat)? == 0 {
        warn!("The {} region contains no grid points of '{}'", index, sst.name);
    }
    debug!(
        "{} region: {} x {} points",
        index,
        boxed.len_of(lon)?,
        boxed.len_of(lat)?
    );

    let regional = area_mean(&boxed, &config.grid)?;
    let raw = regional.to_series()?;

    let smoothed = running_mean(&raw, index.running_mean_window());
    let events = thresholds.map(|t| classify_events(&smoothed, t));
    if let Some(ev) = &events {
        info!(
            "{}: {} El Nino months, {} La Nina months",
            index,
            ev.positive.len(),
            ev.negative.len()
        );
    }
    let normalized = normalize(&smoothed);

    let smoothed = regional
        .with_data(smoothed.into_dyn())?
        .renamed(format!("{}_anomaly", index))
        .with_attr("units", "K");
    let normalized = regional
        .with_data(normalized.into_dyn())?
        .renamed(index.as_str())
        .with_attr("units", "1")
        .with_attr("long_name", format!("normalized {} index", index));

    Ok(NinoResult {
        index: normalized,
        smoothed,
        events,
    })
}
