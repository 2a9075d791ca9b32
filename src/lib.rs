//! floodscope: a dashboard for pre-computed flood clustering results
//!
//! This library loads a clustered flood event dataset, per-region severity
//! aggregates and a fitted K-Means model with its feature scaler, and uses them
//! to summarize clusters, rank regions and predict the category of new events.

pub mod cli;
pub mod config;
pub mod context;
pub mod data;
pub mod error;
pub mod features;
pub mod model;
pub mod predict;
pub mod viz;

// Re-export public items for easier access
pub use cli::Args;
pub use config::ArtifactPaths;
pub use context::DashboardContext;
pub use data::{EventDataset, EventRecord, RegionAggregate, RegionTable, TopRegions};
pub use error::{ArtifactError, ArtifactKind};
pub use features::{Feature, FeatureVector, FEATURE_COUNT};
pub use model::{ClusterAssigner, DistanceMetric, KMeansModel, StandardScaler};
pub use predict::{CategoryLabel, LabelMapping, PredictionService};

/// Common result type used throughout the application
pub type Result<T> = anyhow::Result<T>;
