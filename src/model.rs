//! Pre-fitted feature scaler and K-Means centroids loaded from the model bundle

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Context;
use linfa_nn::distance::{Distance, L1Dist, L2Dist, LInfDist};
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::error::{ArtifactError, ArtifactKind};
use crate::features::{feature_columns, FeatureVector, FEATURE_COUNT};

/// Standardization with stored per-feature mean and scale
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl StandardScaler {
    /// Build a scaler from fitted parameters. Zero scale entries become 1.0 so
    /// constant features map to zero instead of NaN.
    pub fn new(mean: Array1<f64>, scale: Array1<f64>) -> crate::Result<Self> {
        if mean.len() != scale.len() {
            anyhow::bail!(
                "Scaler mean has {} entries but scale has {}",
                mean.len(),
                scale.len()
            );
        }

        let scale = scale.mapv(|s| if s == 0.0 { 1.0 } else { s });
        Ok(Self { mean, scale })
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    pub fn scale(&self) -> &Array1<f64> {
        &self.scale
    }

    pub fn transform(&self, features: &FeatureVector) -> Array1<f64> {
        (features.to_array() - &self.mean) / &self.scale
    }

    /// Load a fitted scaler exported as JSON
    pub fn load(path: &Path) -> crate::Result<Self> {
        let artifact: ScalerArtifact = read_json(path, ArtifactKind::Scaler)?;

        if let Some(names) = &artifact.feature_names {
            let expected: Vec<String> = feature_columns().iter().map(|c| c.to_string()).collect();
            if names != &expected {
                return Err(ArtifactError::FeatureOrder {
                    expected,
                    found: names.clone(),
                }
                .into());
            }
        }

        if artifact.mean.len() != FEATURE_COUNT {
            return Err(ArtifactError::FeatureCount {
                kind: ArtifactKind::Scaler,
                expected: FEATURE_COUNT,
                found: artifact.mean.len(),
            }
            .into());
        }

        Self::new(Array1::from(artifact.mean), Array1::from(artifact.scale))
            .with_context(|| format!("Invalid scaler in {}", path.display()))
    }
}

/// On-disk scaler layout. Accepts scikit-learn attribute names.
#[derive(Debug, Serialize, Deserialize)]
pub struct ScalerArtifact {
    #[serde(default, alias = "feature_names_in_")]
    pub feature_names: Option<Vec<String>>,
    #[serde(alias = "mean_")]
    pub mean: Vec<f64>,
    #[serde(alias = "scale_")]
    pub scale: Vec<f64>,
}

/// Distance the centroids were fitted with
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    #[default]
    Euclidean,
    Manhattan,
    Chebyshev,
}

impl DistanceMetric {
    /// Rank-preserving distance, enough for nearest-centroid comparison
    pub fn rdistance(self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        match self {
            DistanceMetric::Euclidean => L2Dist.rdistance(a, b),
            DistanceMetric::Manhattan => L1Dist.rdistance(a, b),
            DistanceMetric::Chebyshev => LInfDist.rdistance(a, b),
        }
    }
}

/// Capability of a fitted clustering model: map a normalized vector to a label
pub trait ClusterAssigner: Send + Sync {
    fn n_clusters(&self) -> usize;

    fn n_features(&self) -> usize;

    fn assign(&self, normalized: ArrayView1<f64>) -> usize;
}

/// Fitted K-Means centroids in normalized space
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansModel {
    /// Cluster centroids, one row per cluster
    pub centroids: Array2<f64>,
    pub metric: DistanceMetric,
}

impl KMeansModel {
    pub fn new(centroids: Array2<f64>, metric: DistanceMetric) -> crate::Result<Self> {
        if centroids.nrows() == 0 {
            return Err(ArtifactError::NoClusters.into());
        }
        Ok(Self { centroids, metric })
    }

    /// Load fitted centroids exported as JSON
    pub fn load(path: &Path) -> crate::Result<Self> {
        let artifact: KMeansArtifact = read_json(path, ArtifactKind::Model)?;

        let n_clusters = artifact.centroids.len();
        let mut data = Vec::with_capacity(n_clusters * FEATURE_COUNT);
        for centroid in &artifact.centroids {
            if centroid.len() != FEATURE_COUNT {
                return Err(ArtifactError::FeatureCount {
                    kind: ArtifactKind::Model,
                    expected: FEATURE_COUNT,
                    found: centroid.len(),
                }
                .into());
            }
            data.extend_from_slice(centroid);
        }

        let centroids = Array2::from_shape_vec((n_clusters, FEATURE_COUNT), data)?;
        Self::new(centroids, artifact.metric)
    }
}

impl ClusterAssigner for KMeansModel {
    fn n_clusters(&self) -> usize {
        self.centroids.nrows()
    }

    fn n_features(&self) -> usize {
        self.centroids.ncols()
    }

    /// Nearest centroid; ties go to the lowest cluster index
    fn assign(&self, normalized: ArrayView1<f64>) -> usize {
        let mut min_distance = f64::INFINITY;
        let mut closest_cluster = 0;

        for (cluster_idx, centroid) in self.centroids.outer_iter().enumerate() {
            let distance = self.metric.rdistance(normalized, centroid);
            if distance < min_distance {
                min_distance = distance;
                closest_cluster = cluster_idx;
            }
        }

        closest_cluster
    }
}

/// On-disk centroid layout. Accepts the scikit-learn attribute name.
#[derive(Debug, Serialize, Deserialize)]
pub struct KMeansArtifact {
    #[serde(alias = "cluster_centers_")]
    pub centroids: Vec<Vec<f64>>,
    #[serde(default)]
    pub metric: DistanceMetric,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, kind: ArtifactKind) -> crate::Result<T> {
    if !path.is_file() {
        return Err(ArtifactError::Missing {
            kind,
            path: path.to_path_buf(),
        }
        .into());
    }

    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse {} from {}", kind, path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_json(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", contents).unwrap();
        file
    }

    #[test]
    fn test_transform_standardizes() {
        let scaler = StandardScaler::new(
            array![100.0, 10.0, 500.0, 1000.0, 50.0],
            array![50.0, 5.0, 250.0, 500.0, 25.0],
        )
        .unwrap();

        let scaled = scaler.transform(&FeatureVector::new(150.0, 5.0, 500.0, 2000.0, 0.0));
        assert_eq!(scaled.to_vec(), vec![1.0, -1.0, 0.0, 2.0, -2.0]);
    }

    #[test]
    fn test_zero_scale_is_finite() {
        let scaler = StandardScaler::new(
            array![0.0, 0.0, 0.0, 0.0, 3.0],
            array![1.0, 1.0, 1.0, 1.0, 0.0],
        )
        .unwrap();

        let scaled = scaler.transform(&FeatureVector::new(0.0, 0.0, 0.0, 0.0, 3.0));
        assert!(scaled.iter().all(|v| v.is_finite()));
        assert_eq!(scaled[4], 0.0);
    }

    #[test]
    fn test_scaler_rejects_mismatched_lengths() {
        assert!(StandardScaler::new(array![0.0, 1.0], array![1.0]).is_err());
    }

    #[test]
    fn test_assign_nearest_centroid() {
        let model = KMeansModel::new(
            array![[1.0, 1.0, 1.0, 1.0, 1.0], [-1.0, -1.0, -1.0, -1.0, -1.0]],
            DistanceMetric::Euclidean,
        )
        .unwrap();

        assert_eq!(model.assign(array![0.9, 1.2, 0.8, 1.0, 1.1].view()), 0);
        assert_eq!(model.assign(array![-0.5, -2.0, -1.0, 0.0, -1.0].view()), 1);
        // Equidistant points go to the first centroid
        assert_eq!(model.assign(array![0.0, 0.0, 0.0, 0.0, 0.0].view()), 0);
    }

    #[test]
    fn test_metric_changes_assignment() {
        let centroids = array![[3.0, 0.0, 0.0, 0.0, 0.0], [1.5, 1.5, 0.0, 0.0, 0.0]];
        let point = array![0.0, 0.0, 0.0, 0.0, 0.0];

        let euclidean = KMeansModel::new(centroids.clone(), DistanceMetric::Euclidean).unwrap();
        let manhattan = KMeansModel::new(centroids.clone(), DistanceMetric::Manhattan).unwrap();
        let chebyshev = KMeansModel::new(centroids, DistanceMetric::Chebyshev).unwrap();

        // L2: 3.0 vs ~2.12, L1: 3.0 vs 3.0 (tie), Linf: 3.0 vs 1.5
        assert_eq!(euclidean.assign(point.view()), 1);
        assert_eq!(manhattan.assign(point.view()), 0);
        assert_eq!(chebyshev.assign(point.view()), 1);
    }

    #[test]
    fn test_empty_model_rejected() {
        let err = KMeansModel::new(Array2::zeros((0, 5)), DistanceMetric::Euclidean).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ArtifactError>(),
            Some(ArtifactError::NoClusters)
        ));
    }

    #[test]
    fn test_load_sklearn_attribute_names() {
        let scaler_file = write_json(
            r#"{"feature_names_in_": ["ketinggian_air_cm", "jumlah_terdampak_rt",
                "jumlah_terdampak_kk", "jumlah_terdampak_jiwa", "jumlah_pengungsi_tertinggi"],
                "mean_": [1, 2, 3, 4, 5], "scale_": [1, 1, 1, 1, 1]}"#,
        );
        let model_file = write_json(
            r#"{"cluster_centers_": [[0, 0, 0, 0, 0], [1, 1, 1, 1, 1]]}"#,
        );

        let scaler = StandardScaler::load(scaler_file.path()).unwrap();
        assert_eq!(scaler.mean().to_vec(), vec![1.0, 2.0, 3.0, 4.0, 5.0]);

        let model = KMeansModel::load(model_file.path()).unwrap();
        assert_eq!(model.n_clusters(), 2);
        assert_eq!(model.metric, DistanceMetric::Euclidean);
    }

    #[test]
    fn test_load_rejects_wrong_feature_order() {
        let scaler_file = write_json(
            r#"{"feature_names": ["jumlah_terdampak_rt", "ketinggian_air_cm",
                "jumlah_terdampak_kk", "jumlah_terdampak_jiwa", "jumlah_pengungsi_tertinggi"],
                "mean": [1, 2, 3, 4, 5], "scale": [1, 1, 1, 1, 1]}"#,
        );

        let err = StandardScaler::load(scaler_file.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ArtifactError>(),
            Some(ArtifactError::FeatureOrder { .. })
        ));
    }

    #[test]
    fn test_load_rejects_wrong_width() {
        let scaler_file = write_json(r#"{"mean": [1, 2, 3], "scale": [1, 1, 1]}"#);
        let model_file = write_json(r#"{"centroids": [[0, 0, 0, 0]], "metric": "manhattan"}"#);

        let err = StandardScaler::load(scaler_file.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ArtifactError>(),
            Some(ArtifactError::FeatureCount { found: 3, .. })
        ));

        let err = KMeansModel::load(model_file.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ArtifactError>(),
            Some(ArtifactError::FeatureCount { found: 4, .. })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = KMeansModel::load(&dir.path().join("kmeans_model.json")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ArtifactError>(),
            Some(ArtifactError::Missing {
                kind: ArtifactKind::Model,
                ..
            })
        ));
    }
}
