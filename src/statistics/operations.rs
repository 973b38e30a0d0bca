//! Core reduction operations
//!
//! All reducers skip missing (`NaN`) values, matching how model output marks land and
//! masked cells. A window with no valid values sums to zero but has a missing mean,
//! maximum and standard deviation.

use ndarray::ArrayView1;

/// Supported reductions over one window of values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatOperation {
    /// Arithmetic mean
    Mean,
    /// Sum of values
    Sum,
    /// Maximum value
    Max,
    /// Population standard deviation
    Std,
}

impl StatOperation {
    /// Get the string representation of the operation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Sum => "sum",
            Self::Max => "maximum",
            Self::Std => "std",
        }
    }

    /// The window reducer implementing this operation
    #[must_use]
    pub fn reducer(self) -> fn(ArrayView1<f64>) -> f64 {
        match self {
            Self::Mean => nanmean,
            Self::Sum => nansum,
            Self::Max => nanmax,
            Self::Std => nanstd,
        }
    }

    /// Reduce one window of values
    #[must_use]
    pub fn apply(self, values: ArrayView1<f64>) -> f64 {
        (self.reducer())(values)
    }
}

/// Sum of non-missing values; zero when everything is missing
pub fn nansum(values: ArrayView1<f64>) -> f64 {
    values.iter().filter(|v| !v.is_nan()).sum()
}

/// Mean of non-missing values; missing when everything is missing
pub fn nanmean(values: ArrayView1<f64>) -> f64 {
    let (sum, count) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, n), &v| (s + v, n + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// Maximum of non-missing values; missing when everything is missing
pub fn nanmax(values: ArrayView1<f64>) -> f64 {
    values
        .iter()
        .filter(|v| !v.is_nan())
        .fold(None, |acc: Option<f64>, &v| Some(acc.map_or(v, |m| m.max(v))))
        .unwrap_or(f64::NAN)
}

/// Population standard deviation (`ddof = 0`) of non-missing values
pub fn nanstd(values: ArrayView1<f64>) -> f64 {
    let mean = nanmean(values);
    if mean.is_nan() {
        return f64::NAN;
    }
    let (sq, count) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, n), &v| (s + (v - mean).powi(2), n + 1));
    (sq / count as f64).sqrt()
}
