//! Typed load errors for the dashboard artifacts

use std::path::PathBuf;

use thiserror::Error;

/// Which artifact a load error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Events,
    Regions,
    Scaler,
    Model,
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ArtifactKind::Events => "event dataset",
            ArtifactKind::Regions => "region aggregate dataset",
            ArtifactKind::Scaler => "feature scaler",
            ArtifactKind::Model => "cluster model",
        };
        f.write_str(name)
    }
}

/// Failures that abort startup. None of these are recovered from.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("{kind} not found at {}", path.display())]
    Missing { kind: ArtifactKind, path: PathBuf },

    #[error("{kind} is missing required column `{column}`")]
    MissingColumn { kind: ArtifactKind, column: String },

    #[error("{kind} has an empty value in column `{column}` at row {row}")]
    MissingValue {
        kind: ArtifactKind,
        column: String,
        row: usize,
    },

    #[error("unknown flood category `{0}`")]
    UnknownCategory(String),

    #[error("{kind} has {found} features, expected {expected}")]
    FeatureCount {
        kind: ArtifactKind,
        expected: usize,
        found: usize,
    },

    #[error("scaler feature order {found:?} does not match {expected:?}")]
    FeatureOrder {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("cluster model has no centroids")]
    NoClusters,

    #[error("severe cluster {label} is not a label of a model with {n_clusters} clusters")]
    SevereClusterOutOfRange { label: usize, n_clusters: usize },
}
