//! Dataset inspection and variable summaries

use crate::grid::{Dataset, LabeledArray};
use crate::statistics::StatOperation;
use ndarray::Array1;

/// Quick statistics of one variable, missing values excluded
#[derive(Debug, Clone, PartialEq)]
pub struct VariableSummary {
    pub name: String,
    pub dims: Vec<(String, usize)>,
    pub units: Option<String>,
    pub valid: usize,
    pub total: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std: f64,
}

/// Computes quick statistics (min/mean/max/std) on a variable.
pub fn summarize_variable(array: &LabeledArray) -> VariableSummary {
    let values: Array1<f64> = array.data().iter().copied().filter(|v| !v.is_nan()).collect();
    let (min, max) = if values.is_empty() {
        (f64::NAN, f64::NAN)
    } else {
        values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
    };

    VariableSummary {
        name: array.name.clone(),
        dims: array
            .dims()
            .iter()
            .cloned()
            .zip(array.shape().iter().copied())
            .collect(),
        units: array.units().map(str::to_string),
        valid: values.len(),
        total: array.data().len(),
        min,
        max,
        mean: StatOperation::Mean.apply(values.view()),
        std: StatOperation::Std.apply(values.view()),
    }
}

/// Summaries of every variable in a dataset
pub fn summarize_dataset(ds: &Dataset) -> Vec<VariableSummary> {
    ds.iter().map(summarize_variable).collect()
}

/// Prints global attributes, variables and their statistics.
pub fn print_summary(ds: &Dataset) {
    println!("\n===== Global Attributes =====");
    for (k, v) in &ds.attrs {
        println!("- {}: {}", k, v);
    }

    println!("\n===== Variables =====");
    for s in summarize_dataset(ds) {
        let dims: Vec<String> = s.dims.iter().map(|(d, n)| format!("{}[{}]", d, n)).collect();
        let units = s.units.as_deref().unwrap_or("-");
        println!("- {} ({}) [{}]", s.name, dims.join(", "), units);
        let stats = [
            (StatOperation::Max, s.max),
            (StatOperation::Mean, s.mean),
            (StatOperation::Std, s.std),
        ]
        .iter()
        .map(|(op, v)| format!("{} {:.4}", op.as_str(), v))
        .collect::<Vec<_>>()
        .join("  ");
        println!("    valid {}/{}  minimum {:.4}  {}", s.valid, s.total, s.min, stats);
    }
}
