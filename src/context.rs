//! Immutable dashboard state, built once at startup and passed by reference

use tracing::info;

use crate::config::ArtifactPaths;
use crate::data::{EventDataset, RegionTable};
use crate::model::{ClusterAssigner, KMeansModel, StandardScaler};
use crate::predict::{LabelMapping, PredictionService};

/// Everything the dashboard views need. Nothing in here changes after load.
#[derive(Debug)]
pub struct DashboardContext {
    pub events: EventDataset,
    pub regions: RegionTable,
    pub predictor: PredictionService,
}

impl DashboardContext {
    pub fn new(events: EventDataset, regions: RegionTable, predictor: PredictionService) -> Self {
        Self {
            events,
            regions,
            predictor,
        }
    }

    /// Load all four artifacts. Any missing or malformed file aborts the load,
    /// so a partially loaded context never exists.
    pub fn load(paths: &ArtifactPaths, labels: LabelMapping) -> crate::Result<Self> {
        paths.check_present()?;

        let scaler = StandardScaler::load(&paths.scaler)?;
        let model = KMeansModel::load(&paths.model)?;
        info!(
            n_clusters = model.n_clusters(),
            metric = ?model.metric,
            "loaded cluster model"
        );
        // Not verified against the centroids. A retrained model may renumber clusters.
        info!(
            severe_cluster = labels.severe_cluster,
            "using label mapping {} => severe flood",
            labels.severe_cluster
        );
        let predictor = PredictionService::new(scaler, Box::new(model), labels)?;

        let events = EventDataset::load(&paths.events)?;
        let regions = RegionTable::load(&paths.regions)?;
        info!(
            events = events.len(),
            regions = regions.len(),
            "loaded flood datasets"
        );

        Ok(Self::new(events, regions, predictor))
    }
}
