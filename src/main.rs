//! Entry point for the focitools application.
//! Handles CLI parsing, file loading, and dispatches the diagnostics.

use clap::Parser;
use foci_tools::prelude::*;
use foci_tools::{logging, metadata, netcdf_io};
use log::{info, LevelFilter};
use std::path::PathBuf;

mod cli;

use cli::{Args, Command, InputArgs};

fn reader_config(input: &InputArgs, threads: Option<usize>) -> ReaderConfig {
    let mut config = ReaderConfig::along(&input.concat_dim);
    config.parallel = ParallelConfig::new(threads);
    config
}

fn load(input: &InputArgs, threads: Option<usize>) -> Result<Dataset> {
    let mut files: Vec<PathBuf> = Vec::new();
    for pattern in &input.files {
        files.extend(netcdf_io::resolve_files(pattern)?);
    }
    files.sort();
    files.dedup();
    open_multifile_dataset(&files, &reader_config(input, threads))
}

/// Drop the vertical axis of a 3-D mask when the data is a surface field
fn surface_mask(mask: &LabeledArray, data: &LabeledArray) -> Result<LabeledArray> {
    match mask.dims().iter().find(|d| !data.has_dim(d)) {
        Some(depth) => mask.isel(depth, 0),
        None => Ok(mask.clone()),
    }
}

/// Attach `lat` to the streamfunction from the first column of `nav_lat` when missing
fn with_latitude(ds: &Dataset, variable: &str) -> Result<LabeledArray> {
    let moc = ds.get(variable)?;
    if moc.coords().contains_key("lat") || !ds.contains("nav_lat") {
        return Ok(moc.clone());
    }
    let lat = ds.get("nav_lat")?.isel("x", 0)?.to_series()?;
    moc.clone()
        .with_coord("lat", Coordinate::new("y", lat).with_attr("units", "degrees_north"))
}

fn run(args: Args) -> Result<Dataset> {
    let threads = args.threads;
    let ds = load(args.command.input(), threads)?;
    info!("Loaded {} variables", ds.len());

    match args.command {
        Command::AreaMean {
            variable,
            mesh,
            lon,
            lat,
            ..
        } => {
            let data = ds.get(&variable)?;
            let mean = match mesh {
                Some(path) => {
                    let mesh = read_nemo_mesh(&path)?;
                    let mask = surface_mask(mesh.get("tmask")?, data)?;
                    area_mean_nemo(data, &mask, mesh.get("areacello")?, &NemoDims::default())?
                }
                None => area_mean(data, &GridDims { lon, lat })?,
            };
            Dataset::from_arrays([mean.renamed(format!("{}_area_mean", variable))])
        }
        Command::Seaice {
            mesh,
            concentration,
            thickness,
            ..
        } => {
            let mesh = read_nemo_mesh(&mesh)?;
            let config = SeaIceConfig {
                concentration,
                thickness,
                ..SeaIceConfig::default()
            };
            seaice_diagnostics(&ds, mesh.get("areacello")?, &config)
        }
        Command::Nino {
            variable,
            index,
            threshold,
            no_events,
            ..
        } => {
            let mut config = NinoConfig::new(index.parse()?);
            config.thresholds = threshold.map(EventThresholds::symmetric);
            config.classify_events = !no_events;
            let result = compute_nino_index(ds.get(&variable)?, &config)?;
            if let Some(events) = &result.events {
                println!("El Nino months: {:?}", events.positive);
                println!("La Nina months: {:?}", events.negative);
            }
            Dataset::from_arrays([result.index, result.smoothed])
        }
        Command::Amoc {
            variable,
            latitude,
            depth_dim,
            ..
        } => {
            let config = AmocConfig {
                target_lat: latitude,
                depth_dim,
                ..AmocConfig::default()
            };
            let amoc = compute_amoc_strength(&with_latitude(&ds, &variable)?, &config)?;
            println!("AMOC latitude used: {:.3}", amoc.latitude_used);
            Dataset::from_arrays([amoc.series.renamed("amoc")])
        }
        Command::Describe { .. } => {
            metadata::print_summary(&ds);
            Ok(Dataset::new())
        }
    }
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    logging::init_logging(level)?;

    let output = args.output_netcdf.clone();
    let results = run(args)?;
    if results.is_empty() {
        return Ok(());
    }

    match output {
        Some(path) => {
            write_dataset(&results, &path)?;
            println!("Saved result to {}", path.display());
        }
        None => {
            for array in results.into_arrays() {
                println!("{}", array);
            }
        }
    }

    Ok(())
}
