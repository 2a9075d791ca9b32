//! Category prediction for a single hypothetical flood event

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::error::{ArtifactError, ArtifactKind};
use crate::features::{FeatureVector, FEATURE_COUNT};
use crate::model::{ClusterAssigner, StandardScaler};

/// Severity bucket shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CategoryLabel {
    SevereFlood,
    MinorFlood,
}

impl CategoryLabel {
    pub const ALL: [CategoryLabel; 2] = [CategoryLabel::SevereFlood, CategoryLabel::MinorFlood];

    pub fn as_str(self) -> &'static str {
        match self {
            CategoryLabel::SevereFlood => "severe flood",
            CategoryLabel::MinorFlood => "minor flood",
        }
    }

    /// Spelling used in the clustered event dataset
    pub fn dataset_name(self) -> &'static str {
        match self {
            CategoryLabel::SevereFlood => "Banjir Berat",
            CategoryLabel::MinorFlood => "Banjir Ringan",
        }
    }

    pub fn is_severe(self) -> bool {
        self == CategoryLabel::SevereFlood
    }
}

impl fmt::Display for CategoryLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryLabel {
    type Err = ArtifactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        CategoryLabel::ALL
            .into_iter()
            .find(|label| {
                normalized == label.as_str() || normalized == label.dataset_name().to_lowercase()
            })
            .ok_or_else(|| ArtifactError::UnknownCategory(s.to_string()))
    }
}

/// Static lookup from cluster label to category. Which label means "severe"
/// is deployment knowledge and is not checked against the centroids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelMapping {
    pub severe_cluster: usize,
}

impl Default for LabelMapping {
    fn default() -> Self {
        Self { severe_cluster: 0 }
    }
}

impl LabelMapping {
    pub fn new(severe_cluster: usize) -> Self {
        Self { severe_cluster }
    }

    pub fn category_for(&self, cluster: usize) -> CategoryLabel {
        if cluster == self.severe_cluster {
            CategoryLabel::SevereFlood
        } else {
            CategoryLabel::MinorFlood
        }
    }
}

/// Scaler + clustering model + label mapping, loaded once and never mutated
pub struct PredictionService {
    scaler: StandardScaler,
    model: Box<dyn ClusterAssigner>,
    labels: LabelMapping,
}

impl fmt::Debug for PredictionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredictionService")
            .field("scaler", &self.scaler)
            .field("n_clusters", &self.model.n_clusters())
            .field("labels", &self.labels)
            .finish()
    }
}

impl PredictionService {
    /// Fails when the scaler and model disagree on the number of features or
    /// the severe label does not exist in the model.
    pub fn new(
        scaler: StandardScaler,
        model: Box<dyn ClusterAssigner>,
        labels: LabelMapping,
    ) -> crate::Result<Self> {
        if scaler.n_features() != FEATURE_COUNT {
            return Err(ArtifactError::FeatureCount {
                kind: ArtifactKind::Scaler,
                expected: FEATURE_COUNT,
                found: scaler.n_features(),
            }
            .into());
        }

        if model.n_features() != FEATURE_COUNT {
            return Err(ArtifactError::FeatureCount {
                kind: ArtifactKind::Model,
                expected: FEATURE_COUNT,
                found: model.n_features(),
            }
            .into());
        }

        if labels.severe_cluster >= model.n_clusters() {
            return Err(ArtifactError::SevereClusterOutOfRange {
                label: labels.severe_cluster,
                n_clusters: model.n_clusters(),
            }
            .into());
        }

        debug!(
            n_clusters = model.n_clusters(),
            severe_cluster = labels.severe_cluster,
            "prediction service ready"
        );

        Ok(Self {
            scaler,
            model,
            labels,
        })
    }

    pub fn n_clusters(&self) -> usize {
        self.model.n_clusters()
    }

    pub fn labels(&self) -> LabelMapping {
        self.labels
    }

    /// Cluster label of the nearest centroid for raw input
    pub fn assign(&self, features: &FeatureVector) -> usize {
        let normalized = self.scaler.transform(features);
        self.model.assign(normalized.view())
    }

    pub fn predict(&self, features: &FeatureVector) -> CategoryLabel {
        let cluster = self.assign(features);
        let category = self.labels.category_for(cluster);
        debug!(%features, cluster, %category, "predicted flood category");
        category
    }
}
