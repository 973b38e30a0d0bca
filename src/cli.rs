//! Defines command-line interface options using `clap` for the focitools application.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// Post-processing diagnostics for FOCI model output
#[derive(Parser, Debug)]
#[command(
    version,
    name = "focitools",
    about = "Area means, sea-ice, ENSO and AMOC diagnostics for FOCI output"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to save results as NetCDF. If not set, prints to terminal.
    #[arg(long, global = true)]
    pub output_netcdf: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, default_value_t = false, global = true)]
    pub verbose: bool,

    /// Number of threads used to read files. Defaults to number of CPU cores.
    #[arg(short = 't', long, global = true)]
    pub threads: Option<usize>,
}

/// Input files shared by all subcommands
#[derive(ClapArgs, Debug, Clone)]
pub struct InputArgs {
    /// Input files or glob patterns (quote patterns to keep the shell from expanding them)
    #[arg(required = true)]
    pub files: Vec<String>,

    /// Dimension the files are concatenated along
    #[arg(long, default_value = "time_counter")]
    pub concat_dim: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Area-weighted mean of a variable
    AreaMean {
        #[command(flatten)]
        input: InputArgs,

        /// Variable to average
        #[arg(short = 'V', long)]
        variable: String,

        /// NEMO mesh_mask file; when given, cell areas and the T mask of the curvilinear grid are used
        #[arg(long)]
        mesh: Option<PathBuf>,

        /// Longitude dimension of a regular grid
        #[arg(long, default_value = "lon")]
        lon: String,

        /// Latitude dimension of a regular grid
        #[arg(long, default_value = "lat")]
        lat: String,
    },

    /// Sea-ice area, extent, volume and thickness per hemisphere
    Seaice {
        #[command(flatten)]
        input: InputArgs,

        /// NEMO mesh_mask file providing the cell areas
        #[arg(long)]
        mesh: PathBuf,

        /// Ice concentration variable
        #[arg(long, default_value = "ileadfra")]
        concentration: String,

        /// Ice thickness variable
        #[arg(long, default_value = "iicethic")]
        thickness: String,
    },

    /// ENSO index from monthly SST
    Nino {
        #[command(flatten)]
        input: InputArgs,

        /// SST variable
        #[arg(short = 'V', long, default_value = "sst")]
        variable: String,

        /// NINO1+2, NINO3, NINO3.4 or ONI
        #[arg(long, default_value = "NINO3.4")]
        index: String,

        /// Symmetric event threshold in K, overriding the published one
        #[arg(long)]
        threshold: Option<f64>,

        /// Skip El Nino/La Nina classification
        #[arg(long, default_value_t = false)]
        no_events: bool,
    },

    /// AMOC strength at a latitude
    Amoc {
        #[command(flatten)]
        input: InputArgs,

        /// Overturning streamfunction variable
        #[arg(short = 'V', long, default_value = "zomsfatl")]
        variable: String,

        /// Target latitude in degrees north
        #[arg(long, default_value_t = 26.5, allow_hyphen_values = true)]
        latitude: f64,

        /// Depth dimension of the streamfunction
        #[arg(long, default_value = "depthw")]
        depth_dim: String,
    },

    /// Print variables with quick statistics (min/mean/max/std)
    Describe {
        #[command(flatten)]
        input: InputArgs,
    },
}

impl Command {
    pub fn input(&self) -> &InputArgs {
        match self {
            Self::AreaMean { input, .. }
            | Self::Seaice { input, .. }
            | Self::Nino { input, .. }
            | Self::Amoc { input, .. }
            | Self::Describe { input } => input,
        }
    }
}
