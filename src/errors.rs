//! Centralized error handling for foci_tools
//!
//! Every fallible operation in the crate returns [`Result`]. Missing data is never an
//! error: it is carried as `NaN` inside the arrays. The variants below are reserved for
//! configuration problems and for inputs that cannot be reduced meaningfully.

use std::fmt;

/// Main error type for foci_tools operations
#[derive(Debug)]
pub enum FociError {
    /// NetCDF file operation errors
    NetCDFError(netcdf::Error),

    /// I/O operation errors
    IoError(std::io::Error),

    /// Array shape or dimension error
    ArrayError(ndarray::ShapeError),

    /// Invalid glob pattern
    PatternError(glob::PatternError),

    /// Variable not found in a dataset
    VariableNotFound { var: String },

    /// Dimension not found in a variable
    DimensionNotFound { var: String, dim: String },

    /// Coordinate not found in a variable
    CoordinateNotFound { var: String, coord: String },

    /// Two arrays cannot be combined along a shared dimension
    ShapeMismatch { dim: String, left: usize, right: usize },

    /// Weights are negative or non-finite on a cell that takes part in a reduction
    InvalidWeights { message: String },

    /// Results cannot be merged without ambiguous alignment
    MergeConflict { name: String, message: String },

    /// A variable name occurs twice in one dataset
    DuplicateVariable { name: String },

    /// Unsupported climate index name
    UnknownIndex { name: String },

    /// A required configuration value was not supplied
    MissingConfiguration { message: String },

    /// CF time units or calendar could not be interpreted
    TimeDecodeError { message: String },

    /// A file pattern matched nothing
    NoFilesFound { pattern: String },

    /// Thread pool configuration error
    ThreadPoolError(String),

    /// Generic error
    Generic(String),
}

impl fmt::Display for FociError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FociError::NetCDFError(e) => write!(f, "NetCDF error: {}", e),
            FociError::IoError(e) => write!(f, "I/O error: {}", e),
            FociError::ArrayError(e) => write!(f, "Array error: {}", e),
            FociError::PatternError(e) => write!(f, "Invalid file pattern: {}", e),
            FociError::VariableNotFound { var } => write!(f, "Variable '{}' not found", var),
            FociError::DimensionNotFound { var, dim } => {
                write!(f, "Dimension '{}' not found in variable '{}'", dim, var)
            }
            FociError::CoordinateNotFound { var, coord } => {
                write!(f, "Coordinate '{}' not found in variable '{}'", coord, var)
            }
            FociError::ShapeMismatch { dim, left, right } => write!(
                f,
                "Dimension '{}' has length {} on one operand and {} on the other",
                dim, left, right
            ),
            FociError::InvalidWeights { message } => write!(f, "Invalid weights: {}", message),
            FociError::MergeConflict { name, message } => {
                write!(f, "Cannot merge '{}': {}", name, message)
            }
            FociError::DuplicateVariable { name } => {
                write!(f, "Variable '{}' already exists in dataset", name)
            }
            FociError::UnknownIndex { name } => write!(
                f,
                "Unknown climate index '{}' (expected NINO1+2, NINO3, NINO3.4 or ONI)",
                name
            ),
            FociError::MissingConfiguration { message } => {
                write!(f, "Missing configuration: {}", message)
            }
            FociError::TimeDecodeError { message } => write!(f, "Time decoding error: {}", message),
            FociError::NoFilesFound { pattern } => {
                write!(f, "No files found matching '{}'", pattern)
            }
            FociError::ThreadPoolError(msg) => write!(f, "Thread pool error: {}", msg),
            FociError::Generic(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for FociError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FociError::NetCDFError(e) => Some(e),
            FociError::IoError(e) => Some(e),
            FociError::ArrayError(e) => Some(e),
            FociError::PatternError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<netcdf::Error> for FociError {
    fn from(error: netcdf::Error) -> Self {
        FociError::NetCDFError(error)
    }
}

impl From<std::io::Error> for FociError {
    fn from(error: std::io::Error) -> Self {
        FociError::IoError(error)
    }
}

impl From<ndarray::ShapeError> for FociError {
    fn from(error: ndarray::ShapeError) -> Self {
        FociError::ArrayError(error)
    }
}

impl From<glob::PatternError> for FociError {
    fn from(error: glob::PatternError) -> Self {
        FociError::PatternError(error)
    }
}

impl From<String> for FociError {
    fn from(error: String) -> Self {
        FociError::Generic(error)
    }
}

impl From<&str> for FociError {
    fn from(error: &str) -> Self {
        FociError::Generic(error.to_string())
    }
}

/// Result type alias for foci_tools operations
pub type Result<T> = std::result::Result<T, FociError>;
