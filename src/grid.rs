//! Labeled grid arrays and datasets
//!
//! [`LabeledArray`] is the working data structure of every diagnostic: an
//! `ndarray::ArrayD<f64>` with named dimensions and coordinate vectors. Operations never
//! mutate in place; each returns a new array. Missing values are `NaN`.
//!
//! Binary operations broadcast by dimension *name*, so a `(y, x)` cell-area field can
//! multiply a `(time, y, x)` concentration field regardless of axis order.

use crate::errors::{FociError, Result};
use crate::statistics::operations::StatOperation;
use indexmap::IndexMap;
use ndarray::{Array1, Array2, ArrayD, ArrayView1, Axis, IxDyn, Zip};
use std::fmt;

/// String attributes attached to arrays, coordinates and datasets
pub type Attributes = IndexMap<String, String>;

/// A 1-D coordinate vector attached to one dimension
#[derive(Debug, Clone, PartialEq)]
pub struct Coordinate {
    pub dim: String,
    pub values: Array1<f64>,
    pub attrs: Attributes,
}

impl Coordinate {
    pub fn new(dim: impl Into<String>, values: impl Into<Array1<f64>>) -> Self {
        Self {
            dim: dim.into(),
            values: values.into(),
            attrs: Attributes::new(),
        }
    }

    #[must_use]
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn units(&self) -> Option<&str> {
        self.attrs.get("units").map(String::as_str)
    }

    /// Same dimension and values, with missing values comparing equal
    pub fn same_values(&self, other: &Coordinate) -> bool {
        self.dim == other.dim
            && self.len() == other.len()
            && self
                .values
                .iter()
                .zip(other.values.iter())
                .all(|(a, b)| a == b || (a.is_nan() && b.is_nan()))
    }
}

/// An n-dimensional array with named dimensions and coordinates
#[derive(Debug, Clone)]
pub struct LabeledArray {
    pub name: String,
    dims: Vec<String>,
    data: ArrayD<f64>,
    coords: IndexMap<String, Coordinate>,
    pub attrs: Attributes,
}

impl LabeledArray {
    /// Create a labeled array from data and dimension names
    ///
    /// # Errors
    ///
    /// Returns an error if the number of names differs from the number of axes or if a
    /// dimension name is repeated.
    pub fn new<S: AsRef<str>>(name: impl Into<String>, dims: &[S], data: ArrayD<f64>) -> Result<Self> {
        let name = name.into();
        let dims: Vec<String> = dims.iter().map(|d| d.as_ref().to_string()).collect();

        if dims.len() != data.ndim() {
            return Err(FociError::Generic(format!(
                "Variable '{}' has {} dimension names but {} axes",
                name,
                dims.len(),
                data.ndim()
            )));
        }
        for (i, d) in dims.iter().enumerate() {
            if dims[..i].contains(d) {
                return Err(FociError::Generic(format!(
                    "Dimension '{}' appears twice in variable '{}'",
                    d, name
                )));
            }
        }

        Ok(Self {
            name,
            dims,
            data,
            coords: IndexMap::new(),
            attrs: Attributes::new(),
        })
    }

    /// Create a labeled array from a flat row-major vector
    ///
    /// # Errors
    ///
    /// Returns an error if `values` does not fill `shape`.
    pub fn from_shape_vec<S: AsRef<str>>(
        name: impl Into<String>,
        dims: &[S],
        shape: &[usize],
        values: Vec<f64>,
    ) -> Result<Self> {
        let data = ArrayD::from_shape_vec(IxDyn(shape), values)?;
        Self::new(name, dims, data)
    }

    /// Zero-dimensional array holding one value
    pub fn scalar(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            dims: Vec::new(),
            data: ArrayD::from_elem(IxDyn(&[]), value),
            coords: IndexMap::new(),
            attrs: Attributes::new(),
        }
    }

    /// Attach a coordinate
    ///
    /// # Errors
    ///
    /// Returns an error if the coordinate's dimension is absent or has a different length.
    pub fn with_coord(mut self, name: impl Into<String>, coord: Coordinate) -> Result<Self> {
        let len = self.len_of(&coord.dim)?;
        let right = coord.len();
        if len != right {
            return Err(FociError::ShapeMismatch {
                dim: coord.dim,
                left: len,
                right,
            });
        }
        self.coords.insert(name.into(), coord);
        Ok(self)
    }

    /// Attach a dimension coordinate (coordinate named after its dimension)
    ///
    /// # Errors
    ///
    /// See [`LabeledArray::with_coord`].
    pub fn with_dim_coord(self, dim: &str, values: impl Into<Array1<f64>>) -> Result<Self> {
        self.with_coord(dim, Coordinate::new(dim, values))
    }

    #[must_use]
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    pub fn data(&self) -> &ArrayD<f64> {
        &self.data
    }

    pub fn into_data(self) -> ArrayD<f64> {
        self.data
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn ndim(&self) -> usize {
        self.data.ndim()
    }

    pub fn coords(&self) -> &IndexMap<String, Coordinate> {
        &self.coords
    }

    pub fn units(&self) -> Option<&str> {
        self.attrs.get("units").map(String::as_str)
    }

    pub fn has_dim(&self, dim: &str) -> bool {
        self.dims.iter().any(|d| d == dim)
    }

    /// Axis index of a named dimension
    ///
    /// # Errors
    ///
    /// Returns [`FociError::DimensionNotFound`] if the dimension is absent.
    pub fn axis(&self, dim: &str) -> Result<usize> {
        self.dims
            .iter()
            .position(|d| d == dim)
            .ok_or_else(|| FociError::DimensionNotFound {
                var: self.name.clone(),
                dim: dim.to_string(),
            })
    }

    /// Length of a named dimension
    ///
    /// # Errors
    ///
    /// Returns [`FociError::DimensionNotFound`] if the dimension is absent.
    pub fn len_of(&self, dim: &str) -> Result<usize> {
        Ok(self.data.shape()[self.axis(dim)?])
    }

    /// Look up a coordinate by name
    ///
    /// # Errors
    ///
    /// Returns [`FociError::CoordinateNotFound`] if no such coordinate is attached.
    pub fn coord(&self, name: &str) -> Result<&Coordinate> {
        self.coords
            .get(name)
            .ok_or_else(|| FociError::CoordinateNotFound {
                var: self.name.clone(),
                coord: name.to_string(),
            })
    }

    /// Values of a 1-D array as a vector (time series, coordinate-like variables)
    ///
    /// # Errors
    ///
    /// Returns an error if the array is not one-dimensional.
    pub fn to_series(&self) -> Result<Array1<f64>> {
        if self.ndim() != 1 {
            return Err(FociError::Generic(format!(
                "Variable '{}' has {} dimensions, expected 1",
                self.name,
                self.ndim()
            )));
        }
        Ok(self.data.iter().copied().collect())
    }

    /// Same labels, new values
    ///
    /// # Errors
    ///
    /// Returns an error if `data` does not have this array's shape.
    pub fn with_data(&self, data: ArrayD<f64>) -> Result<Self> {
        if data.shape() != self.shape() {
            return Err(FociError::Generic(format!(
                "New data for '{}' has shape {:?}, expected {:?}",
                self.name,
                data.shape(),
                self.shape()
            )));
        }
        Ok(Self {
            name: self.name.clone(),
            dims: self.dims.clone(),
            data,
            coords: self.coords.clone(),
            attrs: self.attrs.clone(),
        })
    }

    /// Join arrays along an existing dimension
    ///
    /// All parts must have the same dimensions in the same order. Coordinates on the
    /// joined dimension are concatenated; other coordinates come from the first part.
    ///
    /// # Errors
    ///
    /// Returns an error if `parts` is empty, the dimension is missing, or the parts do
    /// not line up.
    pub fn concat(parts: &[LabeledArray], dim: &str) -> Result<Self> {
        let first = parts
            .first()
            .ok_or_else(|| FociError::Generic(format!("Nothing to concatenate along '{}'", dim)))?;
        let axis = first.axis(dim)?;

        if let Some(odd) = parts.iter().find(|p| p.dims != first.dims) {
            return Err(FociError::MergeConflict {
                name: first.name.clone(),
                message: format!(
                    "cannot concatenate dimensions {:?} with {:?}",
                    first.dims, odd.dims
                ),
            });
        }

        let views: Vec<_> = parts.iter().map(|p| p.data.view()).collect();
        let data = ndarray::concatenate(Axis(axis), &views)?;

        let mut coords = IndexMap::new();
        for (name, coord) in &first.coords {
            let mut coord = coord.clone();
            if coord.dim == dim {
                let mut values = Vec::new();
                for p in parts {
                    values.extend(p.coord(name)?.values.iter().copied());
                }
                coord.values = Array1::from(values);
            }
            coords.insert(name.clone(), coord);
        }

        Ok(Self {
            name: first.name.clone(),
            dims: first.dims.clone(),
            data,
            coords,
            attrs: first.attrs.clone(),
        })
    }

    /// Apply a function element-wise
    #[must_use]
    pub fn map<F: Fn(f64) -> f64>(&self, f: F) -> Self {
        Self {
            name: self.name.clone(),
            dims: self.dims.clone(),
            data: self.data.mapv(f),
            coords: self.coords.clone(),
            attrs: self.attrs.clone(),
        }
    }

    /// Multiply every element by a constant
    #[must_use]
    pub fn scale(&self, factor: f64) -> Self {
        self.map(|v| v * factor)
    }

    /// Combine two arrays element-wise, broadcasting by dimension name
    ///
    /// The result carries the dimensions of `self` followed by any dimensions only
    /// present in `other`.
    ///
    /// # Errors
    ///
    /// Returns [`FociError::ShapeMismatch`] if a shared dimension differs in length and
    /// [`FociError::MergeConflict`] if a coordinate present on both arrays differs.
    pub fn zip_with<F: Fn(f64, f64) -> f64>(&self, other: &LabeledArray, f: F) -> Result<Self> {
        let (dims, shape) = self.union_dims(other)?;

        let mut coords = self.coords.clone();
        for (name, coord) in &other.coords {
            match coords.get(name) {
                Some(mine) if !mine.same_values(coord) => {
                    return Err(FociError::MergeConflict {
                        name: self.name.clone(),
                        message: format!("coordinate '{}' differs from the one on '{}'", name, other.name),
                    });
                }
                Some(_) => {}
                None => {
                    coords.insert(name.clone(), coord.clone());
                }
            }
        }

        let left = self.broadcast_to(&dims, &shape)?;
        let right = other.broadcast_to(&dims, &shape)?;
        let data = Zip::from(&left).and(&right).map_collect(|&a, &b| f(a, b));

        Ok(Self {
            name: self.name.clone(),
            dims,
            data,
            coords,
            attrs: self.attrs.clone(),
        })
    }

    /// Element-wise product
    ///
    /// # Errors
    ///
    /// See [`LabeledArray::zip_with`].
    pub fn mul(&self, other: &LabeledArray) -> Result<Self> {
        self.zip_with(other, |a, b| a * b)
    }

    /// Keep values where `pred(cond)` holds, replace the rest with `NaN`
    ///
    /// # Errors
    ///
    /// See [`LabeledArray::zip_with`].
    pub fn where_cond<F: Fn(f64) -> bool>(&self, cond: &LabeledArray, pred: F) -> Result<Self> {
        self.zip_with(cond, |v, c| if pred(c) { v } else { f64::NAN })
    }

    /// Keep values where `pred(self)` holds, replace the rest with `NaN`
    #[must_use]
    pub fn where_self<F: Fn(f64) -> bool>(&self, pred: F) -> Self {
        self.map(|v| if pred(v) { v } else { f64::NAN })
    }

    /// Replace missing values with a constant
    #[must_use]
    pub fn fill_missing(&self, value: f64) -> Self {
        self.map(|v| if v.is_nan() { value } else { v })
    }

    /// Select a single index along a dimension, dropping that dimension
    ///
    /// Coordinates on the dropped dimension are removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the dimension is absent or the index out of range.
    pub fn isel(&self, dim: &str, index: usize) -> Result<Self> {
        let axis = self.axis(dim)?;
        let len = self.data.shape()[axis];
        if index >= len {
            return Err(FociError::Generic(format!(
                "Index {} out of range for dimension '{}' of length {} in '{}'",
                index, dim, len, self.name
            )));
        }

        let data = self.data.index_axis(Axis(axis), index).to_owned();
        let mut dims = self.dims.clone();
        dims.remove(axis);

        Ok(Self {
            name: self.name.clone(),
            dims,
            data,
            coords: self.coords_without_dims(&[dim]),
            attrs: self.attrs.clone(),
        })
    }

    /// Select a set of indices along a dimension, keeping the dimension
    ///
    /// # Errors
    ///
    /// Returns an error if the dimension is absent or an index is out of range.
    pub fn select_indices(&self, dim: &str, indices: &[usize]) -> Result<Self> {
        let axis = self.axis(dim)?;
        let len = self.data.shape()[axis];
        if let Some(&bad) = indices.iter().find(|&&i| i >= len) {
            return Err(FociError::Generic(format!(
                "Index {} out of range for dimension '{}' of length {} in '{}'",
                bad, dim, len, self.name
            )));
        }

        let data = self.data.select(Axis(axis), indices);
        let coords = self
            .coords
            .iter()
            .map(|(name, coord)| {
                let mut coord = coord.clone();
                if coord.dim == dim {
                    coord.values = indices.iter().map(|&i| coord.values[i]).collect();
                }
                (name.clone(), coord)
            })
            .collect();

        Ok(Self {
            name: self.name.clone(),
            dims: self.dims.clone(),
            data,
            coords,
            attrs: self.attrs.clone(),
        })
    }

    /// Select indices whose coordinate value satisfies a predicate
    ///
    /// # Errors
    ///
    /// Returns an error if the coordinate is absent.
    pub fn sel_where<F: Fn(f64) -> bool>(&self, coord: &str, pred: F) -> Result<Self> {
        let c = self.coord(coord)?;
        let dim = c.dim.clone();
        let indices: Vec<usize> = c
            .values
            .iter()
            .enumerate()
            .filter(|(_, &v)| pred(v))
            .map(|(i, _)| i)
            .collect();
        self.select_indices(&dim, &indices)
    }

    /// Select the closed coordinate interval between `a` and `b`
    ///
    /// The bounds may be given in either order and the coordinate may be stored
    /// ascending or descending.
    ///
    /// # Errors
    ///
    /// Returns an error if the coordinate is absent.
    pub fn sel_range(&self, coord: &str, a: f64, b: f64) -> Result<Self> {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        self.sel_where(coord, |v| v >= lo && v <= hi)
    }

    /// Reorder a dimension so that its coordinate ascends
    ///
    /// # Errors
    ///
    /// Returns an error if the coordinate is absent.
    pub fn sortby(&self, coord: &str) -> Result<Self> {
        let c = self.coord(coord)?;
        let mut order: Vec<usize> = (0..c.len()).collect();
        order.sort_by(|&i, &j| c.values[i].total_cmp(&c.values[j]));
        let dim = c.dim.clone();
        self.select_indices(&dim, &order)
    }

    /// Transform the values of one coordinate
    ///
    /// # Errors
    ///
    /// Returns an error if the coordinate is absent.
    pub fn map_coord<F: Fn(f64) -> f64>(&self, coord: &str, f: F) -> Result<Self> {
        let mut out = self.clone();
        let c = out
            .coords
            .get_mut(coord)
            .ok_or_else(|| FociError::CoordinateNotFound {
                var: self.name.clone(),
                coord: coord.to_string(),
            })?;
        c.values.mapv_inplace(f);
        Ok(out)
    }

    /// Remove a coordinate
    ///
    /// # Errors
    ///
    /// Returns an error if the coordinate is absent.
    pub fn drop_coord(&self, coord: &str) -> Result<Self> {
        let mut out = self.clone();
        if out.coords.shift_remove(coord).is_none() {
            return Err(FociError::CoordinateNotFound {
                var: self.name.clone(),
                coord: coord.to_string(),
            });
        }
        Ok(out)
    }

    /// Rename a dimension together with its dimension coordinate
    ///
    /// Renaming a dimension the array does not have is a no-op.
    #[must_use]
    pub fn rename_dim(&self, old: &str, new: &str) -> Self {
        let mut out = self.clone();
        for d in &mut out.dims {
            if d == old {
                *d = new.to_string();
            }
        }
        out.coords = self
            .coords
            .iter()
            .map(|(name, coord)| {
                let mut coord = coord.clone();
                if coord.dim == old {
                    coord.dim = new.to_string();
                }
                let name = if name == old { new.to_string() } else { name.clone() };
                (name, coord)
            })
            .collect();
        out
    }

    /// Drop all dimensions of length one
    #[must_use]
    pub fn squeeze(&self) -> Self {
        let singleton: Vec<String> = self
            .dims
            .iter()
            .zip(self.shape())
            .filter(|(_, &n)| n == 1)
            .map(|(d, _)| d.clone())
            .collect();

        let mut out = self.clone();
        for d in singleton {
            let axis = out.dims.iter().position(|x| *x == d).unwrap_or(0);
            out.data = out.data.index_axis_move(Axis(axis), 0);
            out.dims.remove(axis);
            out.coords = out.coords_without_dims(&[d.as_str()]);
        }
        out
    }

    /// Reorder dimensions
    ///
    /// # Errors
    ///
    /// Returns an error unless `order` is a permutation of the array's dimensions.
    pub fn transpose<S: AsRef<str>>(&self, order: &[S]) -> Result<Self> {
        if order.len() != self.dims.len() {
            return Err(FociError::Generic(format!(
                "Transpose of '{}' needs {} dimensions, got {}",
                self.name,
                self.dims.len(),
                order.len()
            )));
        }
        let perm = order
            .iter()
            .map(|d| self.axis(d.as_ref()))
            .collect::<Result<Vec<usize>>>()?;

        let data = self.data.view().permuted_axes(perm).as_standard_layout().into_owned();
        Ok(Self {
            name: self.name.clone(),
            dims: order.iter().map(|d| d.as_ref().to_string()).collect(),
            data,
            coords: self.coords.clone(),
            attrs: self.attrs.clone(),
        })
    }

    /// Sum over dimensions, skipping missing values
    ///
    /// An all-missing window sums to zero.
    ///
    /// # Errors
    ///
    /// Returns an error if a dimension is absent.
    pub fn sum_over<S: AsRef<str>>(&self, dims: &[S]) -> Result<Self> {
        self.reduce_over(dims, StatOperation::Sum.reducer())
    }

    /// Mean over dimensions, skipping missing values
    ///
    /// # Errors
    ///
    /// Returns an error if a dimension is absent.
    pub fn mean_over<S: AsRef<str>>(&self, dims: &[S]) -> Result<Self> {
        self.reduce_over(dims, StatOperation::Mean.reducer())
    }

    /// Maximum over dimensions, skipping missing values
    ///
    /// # Errors
    ///
    /// Returns an error if a dimension is absent.
    pub fn max_over<S: AsRef<str>>(&self, dims: &[S]) -> Result<Self> {
        self.reduce_over(dims, StatOperation::Max.reducer())
    }

    /// Population standard deviation over dimensions, skipping missing values
    ///
    /// # Errors
    ///
    /// Returns an error if a dimension is absent.
    pub fn std_over<S: AsRef<str>>(&self, dims: &[S]) -> Result<Self> {
        self.reduce_over(dims, StatOperation::Std.reducer())
    }

    /// Collapse the named dimensions with a reducer applied to each window
    ///
    /// # Errors
    ///
    /// Returns an error if a dimension is absent.
    pub fn reduce_over<S, F>(&self, dims: &[S], reducer: F) -> Result<Self>
    where
        S: AsRef<str>,
        F: Fn(ArrayView1<f64>) -> f64,
    {
        let mut reduced: Vec<usize> = Vec::with_capacity(dims.len());
        for d in dims {
            let axis = self.axis(d.as_ref())?;
            if !reduced.contains(&axis) {
                reduced.push(axis);
            }
        }
        let kept: Vec<usize> = (0..self.ndim()).filter(|a| !reduced.contains(a)).collect();

        let shape = self.shape();
        let kept_shape: Vec<usize> = kept.iter().map(|&a| shape[a]).collect();
        let kept_size: usize = kept_shape.iter().product();
        let window: usize = reduced.iter().map(|&a| shape[a]).product();

        let perm: Vec<usize> = kept.iter().chain(reduced.iter()).copied().collect();
        let flat: Vec<f64> = self.data.view().permuted_axes(perm).iter().copied().collect();
        let rows = Array2::from_shape_vec((kept_size, window), flat)?;
        let values: Vec<f64> = rows.rows().into_iter().map(&reducer).collect();

        let names: Vec<&str> = dims.iter().map(AsRef::as_ref).collect();
        Ok(Self {
            name: self.name.clone(),
            dims: kept.iter().map(|&a| self.dims[a].clone()).collect(),
            data: ArrayD::from_shape_vec(IxDyn(&kept_shape), values)?,
            coords: self.coords_without_dims(&names),
            attrs: self.attrs.clone(),
        })
    }

    /// Materialize this array on a target dimension layout
    ///
    /// Every dimension of `self` must occur in `dims` with the same length; the others
    /// are broadcast.
    ///
    /// # Errors
    ///
    /// Returns an error if a dimension is missing from the target or differs in length.
    pub fn broadcast_to(&self, dims: &[String], shape: &[usize]) -> Result<ArrayD<f64>> {
        let mut positions = Vec::with_capacity(self.dims.len());
        for (i, d) in self.dims.iter().enumerate() {
            let pos = dims
                .iter()
                .position(|t| t == d)
                .ok_or_else(|| FociError::DimensionNotFound {
                    var: format!("broadcast target of '{}'", self.name),
                    dim: d.clone(),
                })?;
            if shape[pos] != self.shape()[i] {
                return Err(FociError::ShapeMismatch {
                    dim: d.clone(),
                    left: shape[pos],
                    right: self.shape()[i],
                });
            }
            positions.push(pos);
        }

        let mut perm: Vec<usize> = (0..self.dims.len()).collect();
        perm.sort_by_key(|&i| positions[i]);
        let mut view = self.data.view().permuted_axes(perm);
        for (i, d) in dims.iter().enumerate() {
            if !self.has_dim(d) {
                view = view.insert_axis(Axis(i));
            }
        }

        view.broadcast(IxDyn(shape))
            .map(|b| b.to_owned())
            .ok_or_else(|| {
                FociError::Generic(format!(
                    "Cannot broadcast '{}' with shape {:?} to {:?}",
                    self.name,
                    self.shape(),
                    shape
                ))
            })
    }

    fn union_dims(&self, other: &LabeledArray) -> Result<(Vec<String>, Vec<usize>)> {
        let mut dims = self.dims.clone();
        let mut shape = self.shape().to_vec();
        for (d, &n) in other.dims.iter().zip(other.shape()) {
            match dims.iter().position(|x| x == d) {
                Some(i) if shape[i] != n => {
                    return Err(FociError::ShapeMismatch {
                        dim: d.clone(),
                        left: shape[i],
                        right: n,
                    })
                }
                Some(_) => {}
                None => {
                    dims.push(d.clone());
                    shape.push(n);
                }
            }
        }
        Ok((dims, shape))
    }

    fn coords_without_dims(&self, dims: &[&str]) -> IndexMap<String, Coordinate> {
        self.coords
            .iter()
            .filter(|(_, c)| !dims.contains(&c.dim.as_str()))
            .map(|(n, c)| (n.clone(), c.clone()))
            .collect()
    }

    /// True if both arrays have the same dimensions and values (`NaN` equals `NaN`)
    pub fn same_values(&self, other: &LabeledArray) -> bool {
        self.dims == other.dims
            && self.shape() == other.shape()
            && self
                .data
                .iter()
                .zip(other.data.iter())
                .all(|(a, b)| a == b || (a.is_nan() && b.is_nan()))
    }
}

impl fmt::Display for LabeledArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dims: Vec<String> = self
            .dims
            .iter()
            .zip(self.shape())
            .map(|(d, n)| format!("{}[{}]", d, n))
            .collect();
        write!(f, "{} ({})", self.name, dims.join(", "))?;
        if let Some(units) = self.units() {
            write!(f, " [{}]", units)?;
        }
        Ok(())
    }
}

/// An ordered collection of uniquely named arrays
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    vars: IndexMap<String, LabeledArray>,
    pub attrs: Attributes,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dataset from arrays, keyed by their names
    ///
    /// # Errors
    ///
    /// Returns [`FociError::DuplicateVariable`] if two arrays share a name.
    pub fn from_arrays(arrays: impl IntoIterator<Item = LabeledArray>) -> Result<Self> {
        let mut ds = Self::new();
        for a in arrays {
            ds.insert(a)?;
        }
        Ok(ds)
    }

    /// Add an array under its own name
    ///
    /// # Errors
    ///
    /// Returns [`FociError::DuplicateVariable`] if the name is taken.
    pub fn insert(&mut self, array: LabeledArray) -> Result<()> {
        if self.vars.contains_key(&array.name) {
            return Err(FociError::DuplicateVariable { name: array.name });
        }
        self.vars.insert(array.name.clone(), array);
        Ok(())
    }

    /// Look up a variable
    ///
    /// # Errors
    ///
    /// Returns [`FociError::VariableNotFound`] if absent.
    pub fn get(&self, name: &str) -> Result<&LabeledArray> {
        self.vars.get(name).ok_or_else(|| FociError::VariableNotFound {
            var: name.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<LabeledArray> {
        self.vars.shift_remove(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LabeledArray> {
        self.vars.values()
    }

    pub fn into_arrays(self) -> impl Iterator<Item = LabeledArray> {
        self.vars.into_values()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Rename a variable
    ///
    /// # Errors
    ///
    /// Returns an error if `old` is absent or `new` is taken.
    pub fn rename_var(&mut self, old: &str, new: &str) -> Result<()> {
        if self.vars.contains_key(new) {
            return Err(FociError::DuplicateVariable { name: new.to_string() });
        }
        let index = self
            .vars
            .get_index_of(old)
            .ok_or_else(|| FociError::VariableNotFound { var: old.to_string() })?;
        let (_, array) = self
            .vars
            .shift_remove_index(index)
            .ok_or_else(|| FociError::VariableNotFound { var: old.to_string() })?;
        let (new_index, _) = self.vars.insert_full(new.to_string(), array.renamed(new));
        self.vars.move_index(new_index, index);
        Ok(())
    }

    /// Rename a dimension in every variable
    #[must_use]
    pub fn rename_dim(&self, old: &str, new: &str) -> Self {
        Self {
            vars: self
                .vars
                .iter()
                .map(|(n, v)| (n.clone(), v.rename_dim(old, new)))
                .collect(),
            attrs: self.attrs.clone(),
        }
    }

    /// Apply a transformation to every variable that has a given dimension
    ///
    /// # Errors
    ///
    /// Propagates the first error returned by `f`.
    pub fn map_with_dim<F>(&self, dim: &str, f: F) -> Result<Self>
    where
        F: Fn(&LabeledArray) -> Result<LabeledArray>,
    {
        let mut vars = IndexMap::new();
        for (n, v) in &self.vars {
            let v = if v.has_dim(dim) { f(v)? } else { v.clone() };
            vars.insert(n.clone(), v);
        }
        Ok(Self {
            vars,
            attrs: self.attrs.clone(),
        })
    }

    /// Merge datasets into one
    ///
    /// Identical variables present in several inputs are kept once. The merge fails
    /// fast when two inputs hold different data under one name, when a shared
    /// dimension differs in length, or when a shared coordinate differs in value.
    ///
    /// # Errors
    ///
    /// Returns [`FociError::MergeConflict`] on any ambiguous alignment.
    pub fn merge(datasets: impl IntoIterator<Item = Dataset>) -> Result<Self> {
        let mut merged = Self::new();
        for ds in datasets {
            for (k, v) in ds.attrs {
                merged.attrs.entry(k).or_insert(v);
            }
            for (name, array) in ds.vars {
                match merged.vars.get(&name) {
                    Some(existing) if existing.same_values(&array) => {}
                    Some(_) => {
                        return Err(FociError::MergeConflict {
                            name,
                            message: "variable present in several inputs with different values"
                                .to_string(),
                        })
                    }
                    None => {
                        merged.check_alignment(&array)?;
                        merged.vars.insert(name, array);
                    }
                }
            }
        }
        Ok(merged)
    }

    fn check_alignment(&self, array: &LabeledArray) -> Result<()> {
        for existing in self.vars.values() {
            for (d, &n) in array.dims().iter().zip(array.shape()) {
                if let Ok(m) = existing.len_of(d) {
                    if m != n {
                        return Err(FociError::MergeConflict {
                            name: array.name.clone(),
                            message: format!(
                                "dimension '{}' has length {} but '{}' has length {}",
                                d, n, existing.name, m
                            ),
                        });
                    }
                }
            }
            for (cname, coord) in array.coords() {
                if let Some(other) = existing.coords().get(cname) {
                    if !other.same_values(coord) {
                        return Err(FociError::MergeConflict {
                            name: array.name.clone(),
                            message: format!(
                                "coordinate '{}' differs from the one on '{}'",
                                cname, existing.name
                            ),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}
