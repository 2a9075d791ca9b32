//! Artifact locations resolved from CLI flags and environment

use std::path::{Path, PathBuf};

use crate::cli::Args;
use crate::error::{ArtifactError, ArtifactKind};

pub const EVENTS_FILE: &str = "data_banjir_clustered.csv";
pub const REGIONS_FILE: &str = "agregasi_kelurahan.csv";
pub const SCALER_FILE: &str = "scaler.json";
pub const MODEL_FILE: &str = "kmeans_model.json";

/// Paths of the four read-only dashboard artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub events: PathBuf,
    pub regions: PathBuf,
    pub scaler: PathBuf,
    pub model: PathBuf,
}

impl ArtifactPaths {
    /// Default file names inside one directory
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            events: dir.join(EVENTS_FILE),
            regions: dir.join(REGIONS_FILE),
            scaler: dir.join(SCALER_FILE),
            model: dir.join(MODEL_FILE),
        }
    }

    /// `--data-dir` defaults with per-file overrides applied
    pub fn from_args(args: &Args) -> Self {
        let defaults = Self::in_dir(&args.data_dir);
        Self {
            events: args.events.clone().unwrap_or(defaults.events),
            regions: args.regions.clone().unwrap_or(defaults.regions),
            scaler: args.scaler.clone().unwrap_or(defaults.scaler),
            model: args.model.clone().unwrap_or(defaults.model),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ArtifactKind, &Path)> {
        [
            (ArtifactKind::Events, self.events.as_path()),
            (ArtifactKind::Regions, self.regions.as_path()),
            (ArtifactKind::Scaler, self.scaler.as_path()),
            (ArtifactKind::Model, self.model.as_path()),
        ]
        .into_iter()
    }

    /// First artifact that does not exist on disk
    pub fn check_present(&self) -> Result<(), ArtifactError> {
        match self.iter().find(|(_, path)| !path.is_file()) {
            Some((kind, path)) => Err(ArtifactError::Missing {
                kind,
                path: path.to_path_buf(),
            }),
            None => Ok(()),
        }
    }
}
