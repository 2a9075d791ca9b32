//! Command-line interface definitions and argument parsing

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::features::FeatureVector;

/// Flood clustering dashboard for pre-computed K-Means results
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory holding the dashboard artifacts
    #[arg(long, env = "FLOODSCOPE_DATA_DIR", default_value = ".", global = true)]
    pub data_dir: PathBuf,

    /// Clustered event dataset (CSV), overrides the file in --data-dir
    #[arg(long, env = "FLOODSCOPE_EVENTS", global = true)]
    pub events: Option<PathBuf>,

    /// Per-region aggregate dataset (CSV), overrides the file in --data-dir
    #[arg(long, env = "FLOODSCOPE_REGIONS", global = true)]
    pub regions: Option<PathBuf>,

    /// Fitted feature scaler (JSON), overrides the file in --data-dir
    #[arg(long, env = "FLOODSCOPE_SCALER", global = true)]
    pub scaler: Option<PathBuf>,

    /// Fitted K-Means centroids (JSON), overrides the file in --data-dir
    #[arg(long, env = "FLOODSCOPE_MODEL", global = true)]
    pub model: Option<PathBuf>,

    /// Cluster label that means "severe flood". Must match how the model was
    /// labelled when it was trained.
    #[arg(long, env = "FLOODSCOPE_SEVERE_CLUSTER", default_value = "0", global = true)]
    pub severe_cluster: usize,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Category distribution, cluster scatter, cluster comparison and profile summary
    Overview {
        /// Directory the overview charts are written to
        #[arg(short, long, default_value = "overview")]
        output_dir: PathBuf,
    },

    /// Regions with the highest share of severe floods
    Regions {
        /// Number of regions to show
        #[arg(short = 'n', long, default_value = "10",
              value_parser = clap::value_parser!(u32).range(5..=20))]
        top: u32,

        /// Output path for the bar chart
        #[arg(short, long, default_value = "region_severity.png")]
        output: PathBuf,
    },

    /// Predict the flood category of a hypothetical event
    Predict(PredictArgs),
}

/// Bounded prediction inputs
#[derive(clap::Args, Debug, Clone)]
pub struct PredictArgs {
    /// Water height in cm
    #[arg(long, default_value = "50", value_parser = clap::value_parser!(u32).range(0..=300))]
    pub height: u32,

    /// Number of affected neighborhood units (RT)
    #[arg(long, default_value = "1", value_parser = clap::value_parser!(u32).range(0..=100))]
    pub units: u32,

    /// Number of affected households (KK)
    #[arg(long, default_value = "10", value_parser = clap::value_parser!(u32).range(0..=5000))]
    pub households: u32,

    /// Number of affected people
    #[arg(long, default_value = "50", value_parser = clap::value_parser!(u32).range(0..=10000))]
    pub people: u32,

    /// Highest number of evacuees
    #[arg(long, default_value = "0", value_parser = clap::value_parser!(u32).range(0..=1000))]
    pub evacuees: u32,

    /// All five values as "height,rt,kk,people,evacuees", clamped to the input bounds.
    /// Takes precedence over the individual flags.
    /// Example: --values "120,4,300,1200,80"
    #[arg(long, allow_hyphen_values = true)]
    pub values: Option<FeatureVector>,
}

impl PredictArgs {
    /// The feature vector to predict, always within the input bounds
    pub fn feature_vector(&self) -> FeatureVector {
        match self.values {
            Some(values) => values.clamped(),
            None => FeatureVector::new(
                f64::from(self.height),
                f64::from(self.units),
                f64::from(self.households),
                f64::from(self.people),
                f64::from(self.evacuees),
            ),
        }
    }
}
