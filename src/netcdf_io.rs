//! NetCDF reading and writing
//!
//! Reading turns each numeric variable into a [`LabeledArray`] of `f64`, with fill
//! values mapped to `NaN`, packing (`scale_factor`/`add_offset`) undone and 1-D
//! dimension variables attached as coordinates. Multi-file datasets are read in
//! parallel and concatenated along one dimension.

use crate::config::ReaderConfig;
use crate::errors::{FociError, Result};
use crate::grid::{Attributes, Coordinate, Dataset, LabeledArray};
use crate::time::timedelta_unit_days;
use chrono::Utc;
use indexmap::IndexMap;
use log::{debug, info, warn};
use ndarray::{Array1, ArrayD, IxDyn};
use netcdf::types::NcVariableType;
use netcdf::{create, AttributeValue, Variable};
use rayon::prelude::*;
use std::ops::Range;
use std::{fs, path::Path, path::PathBuf};

/// Expand a glob pattern into a sorted list of files
///
/// # Errors
///
/// Returns an error for an invalid pattern or when nothing matches.
pub fn resolve_files(pattern: &str) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = glob::glob(pattern)?
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Skipping unreadable path: {}", e);
                None
            }
        })
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(FociError::NoFilesFound {
            pattern: pattern.to_string(),
        });
    }
    debug!("{} files match '{}'", files.len(), pattern);
    Ok(files)
}

fn attribute_as_f64(value: &AttributeValue) -> Option<f64> {
    match value {
        AttributeValue::Double(v) => Some(*v),
        AttributeValue::Float(v) => Some(f64::from(*v)),
        AttributeValue::Int(v) => Some(f64::from(*v)),
        AttributeValue::Short(v) => Some(f64::from(*v)),
        AttributeValue::Schar(v) => Some(f64::from(*v)),
        AttributeValue::Uchar(v) => Some(f64::from(*v)),
        AttributeValue::Ushort(v) => Some(f64::from(*v)),
        AttributeValue::Uint(v) => Some(f64::from(*v)),
        AttributeValue::Doubles(v) => v.first().copied(),
        AttributeValue::Floats(v) => v.first().map(|x| f64::from(*x)),
        AttributeValue::Ints(v) => v.first().map(|x| f64::from(*x)),
        AttributeValue::Shorts(v) => v.first().map(|x| f64::from(*x)),
        _ => None,
    }
}

fn attribute_as_string(value: &AttributeValue) -> Option<String> {
    match value {
        AttributeValue::Str(s) => Some(s.clone()),
        AttributeValue::Strs(v) => Some(v.join(" ")),
        other => attribute_as_f64(other).map(|v| v.to_string()),
    }
}

/// Read a whole variable, in blocks along its first dimension when a chunk length is
/// configured for it
fn read_values(var: &Variable, shape: &[usize], first_chunk: Option<usize>) -> Result<Vec<f64>> {
    let chunk = match (first_chunk, shape.first()) {
        (Some(c), Some(&n)) if c > 0 && c < n && (1..=4).contains(&shape.len()) => c,
        _ => return Ok(var.get_values::<f64, _>(..)?),
    };

    let mut values = Vec::with_capacity(shape.iter().product());
    let mut start = 0;
    while start < shape[0] {
        let end = (start + chunk).min(shape[0]);
        let mut ranges: Vec<Range<usize>> = vec![start..end];
        ranges.extend(shape[1..].iter().map(|&n| 0..n));

        let block = match ranges.len() {
            1 => var.get_values::<f64, _>(ranges[0].clone())?,
            2 => var.get_values::<f64, _>((ranges[0].clone(), ranges[1].clone()))?,
            3 => var.get_values::<f64, _>((
                ranges[0].clone(),
                ranges[1].clone(),
                ranges[2].clone(),
            ))?,
            _ => var.get_values::<f64, _>((
                ranges[0].clone(),
                ranges[1].clone(),
                ranges[2].clone(),
                ranges[3].clone(),
            ))?,
        };
        values.extend(block);
        start = end;
    }
    Ok(values)
}

fn read_variable(var: &Variable, chunks: &IndexMap<String, isize>) -> Result<LabeledArray> {
    let name = var.name().to_string();
    let dims: Vec<String> = var
        .dimensions()
        .iter()
        .map(|d| d.name().to_string())
        .collect();
    let shape: Vec<usize> = var
        .dimensions()
        .iter()
        .map(netcdf::Dimension::len)
        .collect();

    let first_chunk = dims
        .first()
        .and_then(|d| chunks.get(d))
        .and_then(|&c| usize::try_from(c).ok());
    let mut values = read_values(var, &shape, first_chunk)?;

    let mut attrs = Attributes::new();
    let mut fill = Vec::new();
    let mut scale = 1.0;
    let mut offset = 0.0;
    for attr in var.attributes() {
        let value = attr.value()?;
        match attr.name() {
            "_FillValue" | "missing_value" => fill.extend(attribute_as_f64(&value)),
            "scale_factor" => scale = attribute_as_f64(&value).unwrap_or(1.0),
            "add_offset" => offset = attribute_as_f64(&value).unwrap_or(0.0),
            other => {
                if let Some(s) = attribute_as_string(&value) {
                    attrs.insert(other.to_string(), s);
                }
            }
        }
    }

    for v in &mut values {
        if fill.iter().any(|f| f == v) {
            *v = f64::NAN;
        } else {
            *v = *v * scale + offset;
        }
    }

    let mut array = LabeledArray::new(name, &dims, ArrayD::from_shape_vec(IxDyn(&shape), values)?)?;
    array.attrs = attrs;
    Ok(array)
}

/// Read one NetCDF file
///
/// # Errors
///
/// Returns an error if the file cannot be opened or a variable cannot be read.
pub fn open_dataset(path: &Path) -> Result<Dataset> {
    open_dataset_chunked(path, &IndexMap::new())
}

fn open_dataset_chunked(path: &Path, chunks: &IndexMap<String, isize>) -> Result<Dataset> {
    let file = netcdf::open(path)?;

    let mut arrays = Vec::new();
    let mut dim_coords: IndexMap<String, LabeledArray> = IndexMap::new();
    for var in file.variables() {
        match var.vartype() {
            NcVariableType::Int(_) | NcVariableType::Float(_) => {}
            other => {
                warn!(
                    "Skipping variable '{}' of unsupported type {:?} in {}",
                    var.name(),
                    other,
                    path.display()
                );
                continue;
            }
        }

        let array = read_variable(&var, chunks)?;
        if array.dims().len() == 1 && array.dims()[0] == array.name {
            dim_coords.insert(array.name.clone(), array);
        } else {
            arrays.push(array);
        }
    }

    let mut ds = Dataset::new();
    for mut array in arrays {
        for dim in array.dims().to_vec() {
            if let Some(c) = dim_coords.get(&dim) {
                let coord = Coordinate {
                    dim: dim.clone(),
                    values: c.data().iter().copied().collect(),
                    attrs: c.attrs.clone(),
                };
                array = array.with_coord(dim, coord)?;
            }
        }
        ds.insert(array)?;
    }

    for attr in file.attributes() {
        if let Some(s) = attribute_as_string(&attr.value()?) {
            ds.attrs.insert(attr.name().to_string(), s);
        }
    }

    debug!("Read {} variables from {}", ds.len(), path.display());
    Ok(ds)
}

/// Read a multi-file dataset
///
/// Files are read in parallel on a pool sized by `config.parallel`, ordered by path and
/// joined along `config.concat_dim`. Variables without that dimension (grid
/// descriptions such as `nav_lat`) are taken from the first file.
///
/// # Errors
///
/// Returns an error if `files` is empty, a file cannot be read, or the files do not
/// line up along the concatenation dimension.
pub fn open_multifile_dataset(files: &[PathBuf], config: &ReaderConfig) -> Result<Dataset> {
    let mut files = files.to_vec();
    files.sort();
    if files.is_empty() {
        return Err(FociError::NoFilesFound {
            pattern: "<empty file list>".to_string(),
        });
    }

    let pool = config.parallel.build_pool()?;
    info!(
        "Reading {} files on {} threads",
        files.len(),
        pool.current_num_threads()
    );
    let parts = pool.install(|| {
        files
            .par_iter()
            .map(|f| open_dataset_chunked(f, &config.chunks))
            .collect::<Result<Vec<Dataset>>>()
    })?;

    let dim = config.concat_dim.as_str();
    let mut merged = Dataset::new();
    merged.attrs = parts[0].attrs.clone();
    for template in parts[0].iter() {
        if template.has_dim(dim) {
            let pieces = parts
                .iter()
                .map(|p| p.get(&template.name).cloned())
                .collect::<Result<Vec<_>>>()?;
            merged.insert(LabeledArray::concat(&pieces, dim)?)?;
        } else {
            merged.insert(template.clone())?;
        }
    }

    let merged = if config.decode_timedelta {
        decode_timedeltas(&merged)?
    } else {
        merged
    };

    Ok(match &config.rename_time_to {
        Some(new) => merged.rename_dim(dim, new),
        None => merged,
    })
}

/// Convert variables with bare time units (`seconds`, `days`, ...) to days
fn decode_timedeltas(ds: &Dataset) -> Result<Dataset> {
    let mut out = Dataset::new();
    out.attrs = ds.attrs.clone();
    for array in ds.iter() {
        let factor = array.units().and_then(timedelta_unit_days);
        let array = match factor {
            Some(f) => array.scale(f).with_attr("units", "days"),
            None => array.clone(),
        };
        out.insert(array)?;
    }
    Ok(out)
}

/// Writes datasets of diagnostics to NetCDF
pub struct NetCDFWriter<'a> {
    output_path: &'a Path,
}

impl<'a> NetCDFWriter<'a> {
    /// Create a new NetCDF writer
    pub fn new(output_path: &'a Path) -> Self {
        Self { output_path }
    }

    /// Write every variable and coordinate of `ds`, replacing an existing file
    ///
    /// # Errors
    ///
    /// Returns an error if two variables disagree on a dimension length or the file
    /// cannot be written.
    pub fn write_dataset(&self, ds: &Dataset) -> Result<()> {
        let mut dims: IndexMap<String, usize> = IndexMap::new();
        let mut coords: IndexMap<String, Coordinate> = IndexMap::new();
        for array in ds.iter() {
            for (d, &n) in array.dims().iter().zip(array.shape()) {
                match dims.get(d) {
                    Some(&m) if m != n => {
                        return Err(FociError::ShapeMismatch {
                            dim: d.clone(),
                            left: m,
                            right: n,
                        })
                    }
                    Some(_) => {}
                    None => {
                        dims.insert(d.clone(), n);
                    }
                }
            }
            for (name, coord) in array.coords() {
                if !ds.contains(name) {
                    coords.entry(name.clone()).or_insert_with(|| coord.clone());
                }
            }
        }

        if self.output_path.exists() {
            fs::remove_file(self.output_path)?;
        }
        let mut file = create(self.output_path)?;

        for (d, &n) in &dims {
            file.add_dimension(d, n)?;
        }

        for (name, coord) in &coords {
            let mut var = file.add_variable::<f64>(name, &[coord.dim.as_str()])?;
            for (k, v) in &coord.attrs {
                var.put_attribute(k, v.as_str())?;
            }
            let values: Array1<f64> = coord.values.clone();
            var.put(values.view(), ..)?;
        }

        for array in ds.iter() {
            let dim_refs: Vec<&str> = array.dims().iter().map(String::as_str).collect();
            let mut var = file.add_variable::<f64>(&array.name, &dim_refs)?;
            var.put_attribute("_FillValue", f64::NAN)?;
            for (k, v) in &array.attrs {
                var.put_attribute(k, v.as_str())?;
            }
            var.put(array.data().view(), ..)?;
        }

        for (k, v) in &ds.attrs {
            file.add_attribute(k, v.as_str())?;
        }
        file.add_attribute(
            "history",
            format!("Created by foci_tools on {}", Utc::now().to_rfc3339()),
        )?;

        info!("Wrote {} variables to {}", ds.len(), self.output_path.display());
        Ok(())
    }
}

/// Write a dataset to a new NetCDF file
///
/// # Errors
///
/// See [`NetCDFWriter::write_dataset`].
pub fn write_dataset(ds: &Dataset, output_path: &Path) -> Result<()> {
    NetCDFWriter::new(output_path).write_dataset(ds)
}
