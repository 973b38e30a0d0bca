//! Unit tests for the foci_tools diagnostics on in-memory grids

use foci_tools::{
    climate_indices::{classify_events, monthly_anomalies, normalize, running_mean},
    errors::FociError,
    grid::{Coordinate, Dataset, LabeledArray},
    mesh::compute_dz_tilde,
    metadata::summarize_variable,
    parallel::ParallelConfig,
    prelude::*,
    readers::{file_pattern, select_years},
    statistics::{nanmean, nanstd},
    streamfunctions::nearest_index,
    time::TimeAxis,
};
use ndarray::{arr1, Array1, ArrayD, IxDyn};
use std::path::Path;

const TOL: f64 = 1e-10;

fn lonlat_field(lon: &[f64], lat: &[f64], f: impl Fn(f64, f64) -> f64) -> LabeledArray {
    let data = ArrayD::from_shape_fn(IxDyn(&[lat.len(), lon.len()]), |ix| f(lon[ix[1]], lat[ix[0]]));
    LabeledArray::new("field", &["lat", "lon"], data)
        .unwrap()
        .with_dim_coord("lat", lat.to_vec())
        .unwrap()
        .with_dim_coord("lon", lon.to_vec())
        .unwrap()
}

fn scalar_value(a: &LabeledArray) -> f64 {
    assert_eq!(a.ndim(), 0, "expected a scalar, got dims {:?}", a.dims());
    a.data().iter().copied().next().unwrap()
}

#[test]
fn test_error_types() {
    let var_err = FociError::VariableNotFound {
        var: "sst".to_string(),
    };
    assert!(format!("{}", var_err).contains("Variable 'sst' not found"));

    let dim_err = FociError::DimensionNotFound {
        var: "sst".to_string(),
        dim: "time".to_string(),
    };
    assert!(format!("{}", dim_err).contains("Dimension 'time' not found in variable 'sst'"));

    let generic = FociError::Generic("Test error".to_string());
    assert_eq!(format!("{}", generic), "Test error");
}

#[test]
fn test_parallel_config() {
    let default_config = ParallelConfig::default();
    assert!(default_config.num_threads.is_none());
    assert!(default_config.effective_threads() >= 1);

    let config_2 = ParallelConfig::with_threads(2);
    assert_eq!(config_2.num_threads, Some(2));
    let pool = config_2.build_pool().expect("pool");
    assert_eq!(pool.current_num_threads(), 2);

    assert!(ParallelConfig::all_cores().num_threads.unwrap() > 0);
}

#[test]
fn test_area_mean_constant_field() {
    let lon = [0.0, 90.0, 180.0, 270.0];
    let ascending = lonlat_field(&lon, &[-60.0, 0.0, 60.0], |_, _| 5.0);
    let descending = lonlat_field(&lon, &[60.0, 0.0, -60.0], |_, _| 5.0);

    let dims = GridDims::default();
    assert!((scalar_value(&area_mean(&ascending, &dims).unwrap()) - 5.0).abs() < TOL);
    assert!((scalar_value(&area_mean(&descending, &dims).unwrap()) - 5.0).abs() < TOL);
}

#[test]
fn test_area_mean_two_by_two() {
    // cos(0) = 1 and cos(60) = 0.5, so (1 * 2 + 3 * 0.5 * 2) / (2 + 1) = 5/3
    let field = lonlat_field(&[0.0, 180.0], &[0.0, 60.0], |_, lat| if lat > 30.0 { 3.0 } else { 1.0 });
    let mean = scalar_value(&area_mean(&field, &GridDims::default()).unwrap());
    assert!((mean - 5.0 / 3.0).abs() < TOL);
}

#[test]
fn test_area_mean_keeps_time_axis() {
    let data = ArrayD::from_shape_fn(IxDyn(&[2, 2, 3]), |ix| (ix[0] + 1) as f64);
    let field = LabeledArray::new("tas", &["time", "lat", "lon"], data)
        .unwrap()
        .with_dim_coord("lat", vec![-45.0, 45.0])
        .unwrap()
        .with_dim_coord("lon", vec![-120.0, 0.0, 120.0])
        .unwrap();

    let mean = area_mean(&field, &GridDims::default()).unwrap();
    assert_eq!(mean.dims(), &["time".to_string()]);
    let series = mean.to_series().unwrap();
    assert!((series[0] - 1.0).abs() < TOL);
    assert!((series[1] - 2.0).abs() < TOL);
}

#[test]
fn test_area_mean_does_not_modify_input() {
    let field = lonlat_field(&[-90.0, 90.0], &[30.0, -30.0], |lon, _| lon);
    let before = field.clone();
    area_mean(&field, &GridDims::default()).unwrap();

    assert_eq!(field.coord("lon").unwrap().values, arr1(&[-90.0, 90.0]));
    assert_eq!(field.coord("lat").unwrap().values, arr1(&[30.0, -30.0]));
    assert!(field.same_values(&before));
}

#[test]
fn test_weighted_mean_scale_invariance() {
    let data = LabeledArray::from_shape_vec("v", &["y", "x"], &[2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
    let w = LabeledArray::from_shape_vec("w", &["y", "x"], &[2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();

    let m1 = scalar_value(&weighted_mean(&data, &w, &["x", "y"]).unwrap());
    let m2 = scalar_value(&weighted_mean(&data, &w.scale(7.0), &["x", "y"]).unwrap());
    assert!((m1 - 3.0).abs() < TOL);
    assert!((m1 - m2).abs() < TOL);
}

#[test]
fn test_weighted_mean_masked_cells() {
    let data = LabeledArray::from_shape_vec("v", &["y", "x"], &[1, 3], vec![1.0, f64::NAN, 3.0]).unwrap();
    // NaN weight sits on a masked cell and is ignored
    let w = LabeledArray::from_shape_vec("w", &["y", "x"], &[1, 3], vec![1.0, f64::NAN, 1.0]).unwrap();
    let mean = scalar_value(&weighted_mean(&data, &w, &["x", "y"]).unwrap());
    assert!((mean - 2.0).abs() < TOL);

    let empty = data.map(|_| f64::NAN);
    let mean = scalar_value(&weighted_mean(&empty, &w, &["x", "y"]).unwrap());
    assert!(mean.is_nan());
}

#[test]
fn test_weighted_mean_invalid_weights() {
    let data = LabeledArray::from_shape_vec("v", &["x"], &[2], vec![1.0, 2.0]).unwrap();
    let negative = LabeledArray::from_shape_vec("w", &["x"], &[2], vec![1.0, -1.0]).unwrap();
    let result = weighted_mean(&data, &negative, &["x"]);
    assert!(matches!(result, Err(FociError::InvalidWeights { .. })));

    let infinite = LabeledArray::from_shape_vec("w", &["x"], &[2], vec![f64::INFINITY, 1.0]).unwrap();
    assert!(weighted_mean(&data, &infinite, &["x"]).is_err());

    let missing_dim = weighted_mean(&data, &data, &["time"]);
    assert!(matches!(missing_dim, Err(FociError::DimensionNotFound { .. })));
}

#[test]
fn test_area_mean_nemo_mask() {
    let data = LabeledArray::from_shape_vec("sst", &["y", "x"], &[2, 2], vec![10.0, 20.0, 30.0, 1e20]).unwrap();
    let mask = LabeledArray::from_shape_vec("tmask", &["y", "x"], &[2, 2], vec![1.0, 1.0, 1.0, 0.0]).unwrap();
    let area = LabeledArray::from_shape_vec("areacello", &["y", "x"], &[2, 2], vec![1.0, 1.0, 2.0, 5.0]).unwrap();

    let mean = area_mean_nemo(&data, &mask, &area, &NemoDims::default()).unwrap();
    assert!((scalar_value(&mean) - (10.0 + 20.0 + 60.0) / 4.0).abs() < TOL);
}

#[test]
fn test_zonal_mean_nemo() {
    let data = LabeledArray::from_shape_vec("t", &["y", "x"], &[2, 2], vec![1.0, 3.0, 5.0, 7.0]).unwrap();
    let mask = data.map(|_| 1.0);
    let area = data.map(|_| 1.0);
    let lat = LabeledArray::from_shape_vec("nav_lat", &["y", "x"], &[2, 2], vec![10.0, 12.0, 20.0, 22.0]).unwrap();

    let (zonal, lat_mean) = zonal_mean_nemo(&data, &mask, &area, &lat, &NemoDims::default()).unwrap();
    assert_eq!(zonal.to_series().unwrap(), arr1(&[2.0, 6.0]));
    assert_eq!(lat_mean.to_series().unwrap(), arr1(&[11.0, 21.0]));
}

fn seaice_dataset(sic: Vec<f64>, sit: Vec<f64>) -> (Dataset, LabeledArray) {
    let time = Coordinate::new("time", vec![0.0]).with_attr("units", "days since 2000-01-01");
    let sic = LabeledArray::from_shape_vec("ileadfra", &["time", "y", "x"], &[1, 2, 2], sic)
        .unwrap()
        .with_coord("time", time.clone())
        .unwrap();
    let sit = LabeledArray::from_shape_vec("iicethic", &["time", "y", "x"], &[1, 2, 2], sit)
        .unwrap()
        .with_coord("time", time)
        .unwrap();
    let lat = LabeledArray::from_shape_vec("nav_lat", &["y", "x"], &[2, 2], vec![60.0, 60.0, -60.0, -60.0]).unwrap();
    let area = LabeledArray::from_shape_vec("areacello", &["y", "x"], &[2, 2], vec![1e12; 4]).unwrap();
    (Dataset::from_arrays([sic, sit, lat]).unwrap(), area)
}

fn first(ds: &Dataset, name: &str) -> f64 {
    ds.get(name).unwrap().to_series().unwrap()[0]
}

#[test]
fn test_seaice_area_and_extent() {
    let (ds, area) = seaice_dataset(vec![0.1, 0.5, 0.15, 1.0], vec![0.2, 1.0, 0.3, 2.0]);
    let out = seaice_diagnostics(&ds, &area, &SeaIceConfig::default()).unwrap();

    assert!((first(&out, "ar_sia") - 0.6).abs() < 1e-9);
    assert!((first(&out, "ar_sie") - 0.5).abs() < 1e-9);
    assert!((first(&out, "an_sia") - 1.15).abs() < 1e-9);
    // exactly 0.15 is not part of the extent
    assert!((first(&out, "an_sie") - 1.0).abs() < 1e-9);

    for h in ["ar", "an"] {
        assert!(first(&out, &format!("{}_sie", h)) <= first(&out, &format!("{}_sia", h)));
    }
    assert_eq!(out.get("ar_sia").unwrap().units(), Some("1e6 km2"));
}

#[test]
fn test_seaice_volume_and_thickness() {
    let (ds, area) = seaice_dataset(vec![0.1, 0.5, 0.15, 1.0], vec![0.2, 1.0, 0.3, 2.0]);
    let out = ice_volumes(&ds, &area, &SeaIceConfig::default()).unwrap();

    assert!((first(&out, "ar_siv") - 1200.0).abs() < 1e-6);
    assert!((first(&out, "an_siv") - 2300.0).abs() < 1e-6);
    // 0.1 concentration is excluded from the mean thickness, 0.15 is included
    assert!((first(&out, "ar_sit") - 1.0).abs() < 1e-9);
    assert!((first(&out, "an_sit") - 1.15).abs() < 1e-9);
    assert_eq!(out.get("ar_siv").unwrap().units(), Some("km3"));
    assert_eq!(out.get("an_sit").unwrap().units(), Some("m"));
}

#[test]
fn test_seaice_without_ice() {
    let (ds, area) = seaice_dataset(vec![0.0; 4], vec![0.0; 4]);
    let out = seaice_diagnostics(&ds, &area, &SeaIceConfig::default()).unwrap();

    for name in ["ar_sia", "an_sia", "ar_sie", "an_sie", "ar_siv", "an_siv"] {
        assert_eq!(first(&out, name), 0.0, "{} should be zero", name);
    }
    assert!(first(&out, "ar_sit").is_nan());
}

#[test]
fn test_seaice_missing_variable() {
    let (ds, area) = seaice_dataset(vec![0.0; 4], vec![0.0; 4]);
    let config = SeaIceConfig {
        concentration: "siconc".to_string(),
        ..SeaIceConfig::default()
    };
    let result = seaice_areas(&ds, &area, &config);
    assert!(matches!(result, Err(FociError::VariableNotFound { .. })));
}

#[test]
fn test_ice_volumes_rejects_misaligned_time() {
    let (ds, area) = seaice_dataset(vec![0.5; 4], vec![1.0; 4]);
    let shifted = Coordinate::new("time", vec![5000.0]).with_attr("units", "days since 2000-01-01");
    let sit = ds.get("iicethic").unwrap().clone().with_coord("time", shifted).unwrap();
    let ds = Dataset::from_arrays([
        ds.get("ileadfra").unwrap().clone(),
        sit,
        ds.get("nav_lat").unwrap().clone(),
    ])
    .unwrap();

    let result = ice_volumes(&ds, &area, &SeaIceConfig::default());
    assert!(matches!(result, Err(FociError::MergeConflict { .. })));
}

#[test]
fn test_elementwise_ops_check_coordinates() {
    let a = LabeledArray::from_shape_vec("a", &["time"], &[2], vec![1.0, 2.0])
        .unwrap()
        .with_dim_coord("time", vec![0.0, 1.0])
        .unwrap();
    let b = LabeledArray::from_shape_vec("b", &["time"], &[2], vec![3.0, 4.0])
        .unwrap()
        .with_dim_coord("time", vec![0.0, 2.0])
        .unwrap();
    assert!(matches!(a.mul(&b), Err(FociError::MergeConflict { .. })));

    // matching coordinates combine, one-sided ones are carried over
    let c = LabeledArray::from_shape_vec("c", &["time"], &[2], vec![5.0, 6.0])
        .unwrap()
        .with_dim_coord("time", vec![0.0, 1.0])
        .unwrap();
    assert_eq!(a.mul(&c).unwrap().to_series().unwrap(), arr1(&[5.0, 12.0]));
    let bare = LabeledArray::from_shape_vec("d", &["time"], &[2], vec![2.0, 2.0]).unwrap();
    let product = a.mul(&bare).unwrap();
    assert_eq!(product.coord("time").unwrap().values, arr1(&[0.0, 1.0]));

    let too_long = Coordinate::new("time", vec![0.0, 1.0, 2.0]);
    assert!(matches!(bare.with_coord("time", too_long), Err(FociError::ShapeMismatch { left: 2, right: 3, .. })));
}

/// Monthly SST on a 360-day calendar: seasonal cycle plus an interannual signal
fn monthly_sst(n_months: usize, lon: &[f64]) -> LabeledArray {
    let lat = [-2.0, 2.0];
    let data = ArrayD::from_shape_fn(IxDyn(&[n_months, lat.len(), lon.len()]), |ix| {
        let t = ix[0] as f64;
        let seasonal = 2.0 * (2.0 * std::f64::consts::PI * (ix[0] % 12) as f64 / 12.0).cos();
        26.0 + seasonal + 1.5 * (0.37 * t).sin() + 0.01 * t
    });
    let time: Vec<f64> = (0..n_months).map(|k| 15.0 + 30.0 * k as f64).collect();
    let time = Coordinate::new("time", time)
        .with_attr("units", "days since 2000-01-01")
        .with_attr("calendar", "360_day");
    LabeledArray::new("sst", &["time", "lat", "lon"], data)
        .unwrap()
        .with_coord("time", time)
        .unwrap()
        .with_dim_coord("lat", lat.to_vec())
        .unwrap()
        .with_dim_coord("lon", lon.to_vec())
        .unwrap()
}

#[test]
fn test_monthly_anomalies_need_enough_samples() {
    // Jan 2000 .. Feb 2001 on a 360-day calendar, first January missing
    let mut values = vec![20.0; 14];
    values[0] = f64::NAN;
    values[1] = 4.0;
    values[12] = 30.0;
    values[13] = 16.0;
    let time: Vec<f64> = (0..14).map(|k| 15.0 + 30.0 * k as f64).collect();
    let time = Coordinate::new("time", time)
        .with_attr("units", "days since 2000-01-01")
        .with_attr("calendar", "360_day");
    let sst = LabeledArray::from_shape_vec("sst", &["time"], &[14], values)
        .unwrap()
        .with_coord("time", time)
        .unwrap();

    let anomalies = monthly_anomalies(&sst, "time", 2).unwrap().to_series().unwrap();
    assert_eq!(anomalies.len(), 14);
    // one valid January is not enough for a climatology
    assert!(anomalies[0].is_nan() && anomalies[12].is_nan());
    assert!((anomalies[1] + 6.0).abs() < TOL);
    assert!((anomalies[13] - 6.0).abs() < TOL);
    // March to December have a single sample each
    assert!(anomalies[2].is_nan());

    let relaxed = monthly_anomalies(&sst, "time", 1).unwrap().to_series().unwrap();
    assert!(relaxed[0].is_nan());
    assert!(relaxed[12].abs() < TOL);
    assert!(relaxed[2].abs() < TOL);
}

#[test]
fn test_nino34_is_normalized() {
    // -160..-140 E is 200..220 E, inside the NINO3.4 box
    let sst = monthly_sst(60, &[-160.0, -150.0, -140.0]);
    let result = compute_nino_index(&sst, &NinoConfig::new(NinoIndex::Nino34)).unwrap();

    let index = result.index.to_series().unwrap();
    assert_eq!(index.len(), 60);
    assert!(index[0].is_nan() && index[1].is_nan() && index[59].is_nan());
    assert!(nanmean(index.view()).abs() < 1e-9);
    assert!((nanstd(index.view()) - 1.0).abs() < 1e-9);

    assert_eq!(result.index.name, "NINO3.4");
    assert_eq!(result.smoothed.units(), Some("K"));
    let events = result.events.unwrap();
    assert!(events.positive.iter().all(|p| !events.negative.contains(p)));
}

#[test]
fn test_nino_region_without_points_is_missing() {
    // 0..20 E lies outside every NINO box
    let sst = monthly_sst(24, &[0.0, 10.0, 20.0]);
    let mut config = NinoConfig::new(NinoIndex::Nino34);
    config.classify_events = false;
    let result = compute_nino_index(&sst, &config).unwrap();
    assert!(result.index.to_series().unwrap().iter().all(|v| v.is_nan()));
    assert!(result.events.is_none());
}

#[test]
fn test_nino3_requires_thresholds() {
    let sst = monthly_sst(24, &[220.0, 230.0]);
    let result = compute_nino_index(&sst, &NinoConfig::new(NinoIndex::Nino3));
    assert!(matches!(result, Err(FociError::MissingConfiguration { .. })));

    let mut config = NinoConfig::new(NinoIndex::Nino3);
    config.thresholds = Some(EventThresholds::symmetric(0.5));
    assert!(compute_nino_index(&sst, &config).is_ok());
}

#[test]
fn test_nino_index_names() {
    assert_eq!("nino3.4".parse::<NinoIndex>().unwrap(), NinoIndex::Nino34);
    assert_eq!("ONI".parse::<NinoIndex>().unwrap(), NinoIndex::Oni);
    assert!(matches!("NINO4".parse::<NinoIndex>(), Err(FociError::UnknownIndex { .. })));

    assert_eq!(NinoIndex::Oni.running_mean_window(), 3);
    assert_eq!(NinoIndex::Nino12.running_mean_window(), 5);
    assert_eq!(NinoIndex::Nino3.default_thresholds(), None);
}

#[test]
fn test_event_thresholds() {
    let smoothed = arr1(&[0.4, 0.39, -0.4, -0.39, f64::NAN]);
    let events = classify_events(&smoothed, EventThresholds::symmetric(0.4));
    assert_eq!(events.positive, vec![0]);
    assert_eq!(events.negative, vec![2]);
    assert_eq!(events.positive_mask(5), vec![true, false, false, false, false]);
}

#[test]
fn test_running_mean_edges() {
    let series = arr1(&[1.0, 2.0, 3.0, 4.0, 5.0]);

    let oni = running_mean(&series, 3);
    assert!(oni[0].is_nan() && oni[4].is_nan());
    assert_eq!(oni.slice(ndarray::s![1..4]).to_vec(), vec![2.0, 3.0, 4.0]);

    let five = running_mean(&series, 5);
    assert_eq!(five.iter().filter(|v| !v.is_nan()).count(), 1);
    assert_eq!(five[2], 3.0);

    let gap = running_mean(&arr1(&[1.0, f64::NAN, 3.0, 4.0, 5.0]), 3);
    assert!(gap[1].is_nan() && gap[2].is_nan());
    assert_eq!(gap[3], 4.0);
}

#[test]
fn test_normalize() {
    let n = normalize(&arr1(&[1.0, 2.0, 3.0, f64::NAN]));
    assert!(n[3].is_nan());
    assert!((n[0] + n[2]).abs() < TOL);
    assert!((nanstd(n.view()) - 1.0).abs() < TOL);
}

fn moc_field(lat: Vec<f64>) -> LabeledArray {
    let ny = lat.len();
    let data = ArrayD::from_shape_fn(IxDyn(&[2, 3, ny, 1]), |ix| {
        (ix[2] + 1) as f64 * 10.0 + ix[1] as f64 + ix[0] as f64 * 100.0
    });
    LabeledArray::new("zomsfatl", &["time", "depthw", "y", "x"], data)
        .unwrap()
        .with_coord("lat", Coordinate::new("y", lat))
        .unwrap()
}

#[test]
fn test_amoc_nearest_row() {
    let amoc = compute_amoc_strength(&moc_field(vec![10.0, 20.0, 30.0, 40.0]), &AmocConfig::default()).unwrap();

    assert_eq!(amoc.j_index, 2);
    assert_eq!(amoc.latitude_used, 30.0);
    assert_eq!(amoc.series.dims(), &["time".to_string()]);
    assert_eq!(amoc.series.to_series().unwrap(), arr1(&[32.0, 132.0]));
}

#[test]
fn test_amoc_latitude_checks() {
    assert_eq!(nearest_index(arr1(&[10.0, 20.0]).view(), 15.0), Some(0));
    assert_eq!(nearest_index(arr1(&[f64::NAN, 20.0]).view(), 0.0), Some(1));
    assert_eq!(nearest_index(Array1::<f64>::zeros(0).view(), 0.0), None);

    let no_lat = moc_field(vec![10.0, 20.0]).drop_coord("lat").unwrap();
    assert!(compute_amoc_strength(&no_lat, &AmocConfig::default()).is_err());
}

#[test]
fn test_time_decoding_calendars() {
    let day360 = TimeAxis::decode(&[0.0, 30.0, 359.0, 360.0], "days since 2000-01-01", "360_day").unwrap();
    assert_eq!(day360.months(), vec![1, 2, 12, 1]);
    assert_eq!(day360.years(), vec![2000, 2000, 2000, 2001]);

    let noleap = TimeAxis::decode(&[58.0, 59.0], "days since 2001-01-01", "noleap").unwrap();
    assert_eq!(noleap.dates[0].to_string(), "2001-02-28");
    assert_eq!(noleap.dates[1].to_string(), "2001-03-01");

    let seconds = TimeAxis::decode(&[86400.0 * 31.0], "seconds since 1850-01-01 00:00:00", "gregorian").unwrap();
    assert_eq!(seconds.dates[0].to_string(), "1850-02-01");

    // standard dates before 1582 follow the proleptic rules: 1500 has no 29 February
    let early = TimeAxis::decode(&[2.0], "days since 1500-02-27", "standard").unwrap();
    assert_eq!(early.dates[0].to_string(), "1500-03-01");

    assert!(TimeAxis::decode(&[0.0], "days since 2000-01-01", "julian_mars").is_err());
    assert!(TimeAxis::decode(&[0.0], "fortnights since 2000-01-01", "noleap").is_err());
}

#[test]
fn test_time_decoding_long_runs() {
    let axis = TimeAxis::decode(&[365.0 * 2000.0], "days since 1850-01-01", "noleap").unwrap();
    assert_eq!(axis.years(), vec![3850]);
    assert_eq!(axis.months(), vec![1]);
}

#[test]
fn test_select_years() {
    let time = Coordinate::new("time", vec![0.0, 365.0, 730.0])
        .with_attr("units", "days since 1850-01-01")
        .with_attr("calendar", "noleap");
    let series = LabeledArray::from_shape_vec("amoc25", &["time"], &[3], vec![17.0, 18.0, 19.0])
        .unwrap()
        .with_coord("time", time)
        .unwrap();
    let ds = Dataset::from_arrays([series]).unwrap();

    let picked = select_years(&ds, "time", 1851, 1852).unwrap();
    assert_eq!(picked.get("amoc25").unwrap().to_series().unwrap(), arr1(&[18.0, 19.0]));
}

#[test]
fn test_merge_conflicting_time() {
    let a = LabeledArray::from_shape_vec("a", &["time"], &[2], vec![1.0, 2.0])
        .unwrap()
        .with_dim_coord("time", vec![0.0, 1.0])
        .unwrap();
    let b = LabeledArray::from_shape_vec("b", &["time"], &[2], vec![3.0, 4.0])
        .unwrap()
        .with_dim_coord("time", vec![0.0, 2.0])
        .unwrap();

    let result = Dataset::merge([
        Dataset::from_arrays([a.clone()]).unwrap(),
        Dataset::from_arrays([b]).unwrap(),
    ]);
    assert!(matches!(result, Err(FociError::MergeConflict { .. })));

    // identical copies merge into one variable
    let merged = Dataset::merge([
        Dataset::from_arrays([a.clone()]).unwrap(),
        Dataset::from_arrays([a]).unwrap(),
    ])
    .unwrap();
    assert_eq!(merged.len(), 1);
}

#[test]
fn test_duplicate_variable() {
    let a = LabeledArray::scalar("a", 1.0);
    let mut ds = Dataset::from_arrays([a.clone()]).unwrap();
    assert!(matches!(ds.insert(a), Err(FociError::DuplicateVariable { .. })));
}

#[test]
fn test_broadcast_by_name() {
    let a = LabeledArray::from_shape_vec("a", &["time", "x"], &[2, 3], vec![1.0; 6]).unwrap();
    let b = LabeledArray::from_shape_vec("b", &["x", "y"], &[3, 2], vec![2.0; 6]).unwrap();
    let c = a.mul(&b).unwrap();
    assert_eq!(c.dims(), &["time".to_string(), "x".to_string(), "y".to_string()]);
    assert_eq!(c.shape(), &[2, 3, 2]);

    let wrong = LabeledArray::from_shape_vec("w", &["x"], &[4], vec![1.0; 4]).unwrap();
    assert!(matches!(a.mul(&wrong), Err(FociError::ShapeMismatch { .. })));
}

#[test]
fn test_compute_dz_tilde() {
    let dz0 = LabeledArray::from_shape_vec("dzt", &["deptht", "y", "x"], &[2, 1, 2], vec![10.0, 10.0, 20.0, 20.0]).unwrap();
    let depth0 = LabeledArray::from_shape_vec("deptho", &["y", "x"], &[1, 2], vec![100.0, 50.0]).unwrap();
    let area = LabeledArray::from_shape_vec("areacello", &["y", "x"], &[1, 2], vec![2.0, 2.0]).unwrap();
    let ssh = LabeledArray::from_shape_vec("zos", &["time", "y", "x"], &[1, 1, 2], vec![0.0, 50.0]).unwrap();

    let (dz, volcello, masscello) = compute_dz_tilde(&ssh, &dz0, &depth0, &area).unwrap();
    let dims: Vec<&str> = dz.dims().iter().map(String::as_str).collect();
    assert_eq!(dims, vec!["time", "deptht", "y", "x"]);
    assert_eq!(dz.data()[IxDyn(&[0, 0, 0, 0])], 10.0);
    assert_eq!(dz.data()[IxDyn(&[0, 1, 0, 1])], 40.0);
    assert_eq!(volcello.data()[IxDyn(&[0, 1, 0, 1])], 80.0);
    assert_eq!(masscello.data()[IxDyn(&[0, 0, 0, 0])], 10.0 * 1026.0);
}

#[test]
fn test_file_patterns() {
    let esm = Path::new("/esm");
    let nemo = ModelFiles {
        agrif_prefix: "1_".to_string(),
        ..ModelFiles::defaults(Model::Nemo).with_grid("icemod")
    };
    assert_eq!(
        file_pattern(Model::Nemo, esm, "FOCI1", &nemo),
        "/esm/FOCI1/outdata/nemo/1_FOCI1*1m*icemod.nc"
    );
    assert_eq!(
        file_pattern(Model::Nemo, esm, "FOCI1", &nemo.clone().with_freq("1y")),
        "/esm/FOCI1/outdata/nemo/ym/1_FOCI1*1y*icemod.nc"
    );
    assert_eq!(
        file_pattern(Model::OpenIfs, esm, "FOCI1", &ModelFiles::defaults(Model::OpenIfs)),
        "/esm/FOCI1/outdata/oifs/FOCI1*1m*regular_sfc.nc"
    );
    assert_eq!(
        file_pattern(Model::Echam, esm, "FOCI1", &ModelFiles::defaults(Model::Echam)),
        "/esm/FOCI1/outdata/echam/FOCI1*BOT*mm*.nc"
    );
    assert_eq!(
        file_pattern(Model::Echam, esm, "FOCI1", &ModelFiles::defaults(Model::Echam).with_freq("1y")),
        "/esm/FOCI1/outdata/echam/ym/FOCI1*1y*BOT.nc"
    );
}

#[test]
fn test_variable_summary() {
    let a = LabeledArray::from_shape_vec("t", &["x"], &[4], vec![1.0, f64::NAN, 3.0, 5.0])
        .unwrap()
        .with_attr("units", "K");
    let s = summarize_variable(&a);
    assert_eq!((s.valid, s.total), (3, 4));
    assert_eq!((s.min, s.max, s.mean), (1.0, 5.0, 3.0));
    assert_eq!(s.units.as_deref(), Some("K"));
}

#[test]
fn test_reductions_skip_missing() {
    let a = LabeledArray::from_shape_vec("a", &["time", "x"], &[2, 3], vec![1.0, 2.0, 3.0, f64::NAN, f64::NAN, f64::NAN]).unwrap();

    let sum = a.sum_over(&["x"]).unwrap().to_series().unwrap();
    assert_eq!(sum.to_vec(), vec![6.0, 0.0]);

    let mean = a.mean_over(&["x"]).unwrap().to_series().unwrap();
    assert_eq!(mean[0], 2.0);
    assert!(mean[1].is_nan());

    let std = a.std_over(&["x"]).unwrap().to_series().unwrap();
    assert!((std[0] - (2.0f64 / 3.0).sqrt()).abs() < TOL);
    assert!(std[1].is_nan());

    let filled = a.fill_missing(0.0);
    assert_eq!(filled.max_over(&["x"]).unwrap().to_series().unwrap().to_vec(), vec![3.0, 0.0]);
}

#[test]
fn test_event_masks() {
    let events = classify_events(&arr1(&[-0.6, 0.0, 0.7]), EventThresholds::symmetric(0.5));
    assert_eq!(events.negative_mask(3), vec![true, false, false]);
    assert_eq!(events.positive_mask(3), vec![false, false, true]);
}
