//! Loading of the clustered event dataset and the per-region aggregates using Polars

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context as _;
use polars::prelude::*;
use tracing::debug;

use crate::error::{ArtifactError, ArtifactKind};
use crate::features::{Feature, FeatureVector, FEATURE_COUNT};
use crate::predict::CategoryLabel;

/// Precomputed category of each event
pub const CATEGORY_COLUMN: &str = "kategori_banjir";
/// Region name in the aggregate file
pub const REGION_COLUMN: &str = "kelurahan";
/// Share of severe floods per region, in percent
pub const SEVERE_PCT_COLUMN: &str = "persentase_banjir_berat";

const COUNT_COLUMN: &str = "jumlah_kejadian";

/// A historical flood event with its already-assigned category
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub features: FeatureVector,
    pub category: CategoryLabel,
}

/// Number of events per category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCount {
    pub category: CategoryLabel,
    pub count: usize,
}

/// Mean feature values of one category
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterProfile {
    pub category: CategoryLabel,
    pub means: [f64; FEATURE_COUNT],
}

/// Clustered event dataset
#[derive(Debug, Clone)]
pub struct EventDataset {
    frame: DataFrame,
    records: Vec<EventRecord>,
}

impl EventDataset {
    pub fn load(path: &Path) -> crate::Result<Self> {
        let frame = read_csv(path, ArtifactKind::Events)?;
        let dataset = Self::from_frame(frame)?;
        debug!(path = %path.display(), events = dataset.len(), "loaded event dataset");
        Ok(dataset)
    }

    /// Validate the frame and normalize its category column to the dataset spelling
    pub fn from_frame(mut frame: DataFrame) -> crate::Result<Self> {
        let columns = Feature::ALL
            .iter()
            .map(|feature| f64_values(&frame, feature.column(), ArtifactKind::Events))
            .collect::<crate::Result<Vec<_>>>()?;
        let categories = str_values(&frame, CATEGORY_COLUMN, ArtifactKind::Events)?;

        let records = categories
            .iter()
            .enumerate()
            .map(|(row, name)| {
                let category: CategoryLabel = name.parse()?;
                let values = Feature::ALL.map(|feature| columns[feature.index()][row]);
                Ok(EventRecord {
                    features: FeatureVector::from_array(values),
                    category,
                })
            })
            .collect::<crate::Result<Vec<_>>>()?;

        let canonical: Vec<&str> = records.iter().map(|r| r.category.dataset_name()).collect();
        frame.with_column(Series::new(CATEGORY_COLUMN, canonical))?;

        Ok(Self { frame, records })
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Event count per category, largest first
    pub fn category_counts(&self) -> crate::Result<Vec<CategoryCount>> {
        let grouped = self
            .frame
            .clone()
            .lazy()
            .group_by([col(CATEGORY_COLUMN)])
            .agg([len().alias(COUNT_COLUMN)])
            .collect()?;

        let names = str_values(&grouped, CATEGORY_COLUMN, ArtifactKind::Events)?;
        let counts = f64_values(&grouped, COUNT_COLUMN, ArtifactKind::Events)?;

        let mut totals: BTreeMap<CategoryLabel, usize> = BTreeMap::new();
        for (name, count) in names.iter().zip(counts) {
            *totals.entry(name.parse()?).or_default() += count as usize;
        }

        let mut result: Vec<CategoryCount> = totals
            .into_iter()
            .map(|(category, count)| CategoryCount { category, count })
            .collect();
        result.sort_by(|a, b| b.count.cmp(&a.count).then(a.category.cmp(&b.category)));
        Ok(result)
    }

    /// Mean of every feature per category
    pub fn cluster_profiles(&self) -> crate::Result<Vec<ClusterProfile>> {
        let means: Vec<Expr> = Feature::ALL
            .iter()
            .map(|feature| col(feature.column()).cast(DataType::Float64).mean())
            .collect();

        let grouped = self
            .frame
            .clone()
            .lazy()
            .group_by([col(CATEGORY_COLUMN)])
            .agg(means)
            .collect()?;

        let names = str_values(&grouped, CATEGORY_COLUMN, ArtifactKind::Events)?;
        let columns = Feature::ALL
            .iter()
            .map(|feature| f64_values(&grouped, feature.column(), ArtifactKind::Events))
            .collect::<crate::Result<Vec<_>>>()?;

        let mut profiles = names
            .iter()
            .enumerate()
            .map(|(row, name)| {
                Ok(ClusterProfile {
                    category: name.parse()?,
                    means: Feature::ALL.map(|feature| columns[feature.index()][row]),
                })
            })
            .collect::<crate::Result<Vec<_>>>()?;
        profiles.sort_by_key(|profile| profile.category);
        Ok(profiles)
    }

    /// Values of one feature grouped by category, for per-cluster comparison
    pub fn values_by_category(&self, feature: Feature) -> Vec<(CategoryLabel, Vec<f64>)> {
        CategoryLabel::ALL
            .into_iter()
            .map(|category| {
                let values = self
                    .records
                    .iter()
                    .filter(|record| record.category == category)
                    .map(|record| record.features.get(feature))
                    .collect();
                (category, values)
            })
            .filter(|(_, values): &(CategoryLabel, Vec<f64>)| !values.is_empty())
            .collect()
    }
}

/// Per-region summary statistics
#[derive(Debug, Clone, PartialEq)]
pub struct RegionAggregate {
    pub region: String,
    pub severe_flood_pct: f64,
}

/// The highest-severity regions, with every column of the aggregate file
#[derive(Debug, Clone)]
pub struct TopRegions {
    pub frame: DataFrame,
    pub entries: Vec<RegionAggregate>,
}

/// Pre-aggregated region dataset
#[derive(Debug, Clone)]
pub struct RegionTable {
    frame: DataFrame,
}

impl RegionTable {
    pub fn load(path: &Path) -> crate::Result<Self> {
        let frame = read_csv(path, ArtifactKind::Regions)?;
        let table = Self::from_frame(frame)?;
        debug!(path = %path.display(), regions = table.len(), "loaded region aggregates");
        Ok(table)
    }

    /// Validate the frame and store the percentage column as floats
    pub fn from_frame(mut frame: DataFrame) -> crate::Result<Self> {
        str_values(&frame, REGION_COLUMN, ArtifactKind::Regions)?;
        let percentages = f64_values(&frame, SEVERE_PCT_COLUMN, ArtifactKind::Regions)?;
        frame.with_column(Series::new(SEVERE_PCT_COLUMN, percentages))?;
        Ok(Self { frame })
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// `n` regions with the highest severe-flood percentage, highest first.
    /// Ties keep file order.
    pub fn top_regions(&self, n: usize) -> crate::Result<TopRegions> {
        let frame = self
            .frame
            .clone()
            .lazy()
            .sort(
                [SEVERE_PCT_COLUMN],
                SortMultipleOptions::default()
                    .with_order_descending(true)
                    .with_maintain_order(true),
            )
            .limit(n as IdxSize)
            .collect()?;

        let regions = str_values(&frame, REGION_COLUMN, ArtifactKind::Regions)?;
        let percentages = f64_values(&frame, SEVERE_PCT_COLUMN, ArtifactKind::Regions)?;
        let entries = regions
            .into_iter()
            .zip(percentages)
            .map(|(region, severe_flood_pct)| RegionAggregate {
                region,
                severe_flood_pct,
            })
            .collect();

        Ok(TopRegions { frame, entries })
    }
}

fn read_csv(path: &Path, kind: ArtifactKind) -> crate::Result<DataFrame> {
    if !path.is_file() {
        return Err(ArtifactError::Missing {
            kind,
            path: path.to_path_buf(),
        }
        .into());
    }

    LazyCsvReader::new(path)
        .with_has_header(true)
        .with_infer_schema_length(None)
        .finish()
        .and_then(|frame| frame.collect())
        .with_context(|| format!("Failed to read {} from {}", kind, path.display()))
}

fn required_column<'a>(
    frame: &'a DataFrame,
    column: &str,
    kind: ArtifactKind,
) -> crate::Result<&'a Series> {
    frame.column(column).map_err(|_| {
        anyhow::Error::from(ArtifactError::MissingColumn {
            kind,
            column: column.to_string(),
        })
    })
}

fn f64_values(frame: &DataFrame, column: &str, kind: ArtifactKind) -> crate::Result<Vec<f64>> {
    let series = required_column(frame, column, kind)?.cast(&DataType::Float64)?;
    series
        .f64()?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            value.ok_or_else(|| {
                anyhow::Error::from(ArtifactError::MissingValue {
                    kind,
                    column: column.to_string(),
                    row,
                })
            })
        })
        .collect()
}

fn str_values(frame: &DataFrame, column: &str, kind: ArtifactKind) -> crate::Result<Vec<String>> {
    let series = required_column(frame, column, kind)?.cast(&DataType::String)?;
    series
        .str()?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            value.map(str::to_string).ok_or_else(|| {
                anyhow::Error::from(ArtifactError::MissingValue {
                    kind,
                    column: column.to_string(),
                    row,
                })
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_event_csv() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "kelurahan,ketinggian_air_cm,jumlah_terdampak_rt,jumlah_terdampak_kk,jumlah_terdampak_jiwa,jumlah_pengungsi_tertinggi,cluster,kategori_banjir").unwrap();
        writeln!(file, "Kampung Melayu,150,12,900,3000,400,0,Banjir Berat").unwrap();
        writeln!(file, "Bidara Cina,110,8,500,1800,200,0,Banjir Berat").unwrap();
        writeln!(file, "Cawang,30,1,20,60,0,1,Banjir Ringan").unwrap();
        writeln!(file, "Pejaten Timur,20,2,40,100,10,1,Banjir Ringan").unwrap();
        writeln!(file, "Rawajati,40,3,60,140,20,1,banjir ringan").unwrap();
        file
    }

    fn create_region_csv() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "kelurahan,total_kejadian,jumlah_banjir_berat,persentase_banjir_berat").unwrap();
        writeln!(file, "Cawang,10,2,20.0").unwrap();
        writeln!(file, "Kampung Melayu,12,9,75.0").unwrap();
        writeln!(file, "Bidara Cina,8,4,50.0").unwrap();
        writeln!(file, "Rawajati,5,1,20.0").unwrap();
        writeln!(file, "Pejaten Timur,6,0,0.0").unwrap();
        writeln!(file, "Bukit Duri,4,3,75.0").unwrap();
        file
    }

    #[test]
    fn test_load_events() {
        let file = create_event_csv();
        let events = EventDataset::load(file.path()).unwrap();

        assert_eq!(events.len(), 5);
        assert_eq!(
            events.records()[0],
            EventRecord {
                features: FeatureVector::new(150.0, 12.0, 900.0, 3000.0, 400.0),
                category: CategoryLabel::SevereFlood,
            }
        );
        assert_eq!(events.records()[4].category, CategoryLabel::MinorFlood);
    }

    #[test]
    fn test_category_counts() {
        let file = create_event_csv();
        let events = EventDataset::load(file.path()).unwrap();

        let counts = events.category_counts().unwrap();
        assert_eq!(
            counts,
            vec![
                CategoryCount {
                    category: CategoryLabel::MinorFlood,
                    count: 3
                },
                CategoryCount {
                    category: CategoryLabel::SevereFlood,
                    count: 2
                },
            ]
        );
        assert_eq!(counts.iter().map(|c| c.count).sum::<usize>(), events.len());
    }

    #[test]
    fn test_cluster_profiles() {
        let file = create_event_csv();
        let events = EventDataset::load(file.path()).unwrap();

        let profiles = events.cluster_profiles().unwrap();
        assert_eq!(profiles.len(), 2);

        assert_eq!(profiles[0].category, CategoryLabel::SevereFlood);
        assert!((profiles[0].means[0] - 130.0).abs() < 1e-9);
        assert!((profiles[0].means[3] - 2400.0).abs() < 1e-9);

        assert_eq!(profiles[1].category, CategoryLabel::MinorFlood);
        assert!((profiles[1].means[0] - 30.0).abs() < 1e-9);
        assert!((profiles[1].means[4] - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_values_by_category() {
        let file = create_event_csv();
        let events = EventDataset::load(file.path()).unwrap();

        let groups = events.values_by_category(Feature::WaterHeight);
        assert_eq!(groups[0], (CategoryLabel::SevereFlood, vec![150.0, 110.0]));
        assert_eq!(groups[1], (CategoryLabel::MinorFlood, vec![30.0, 20.0, 40.0]));
    }

    #[test]
    fn test_unknown_category_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "ketinggian_air_cm,jumlah_terdampak_rt,jumlah_terdampak_kk,jumlah_terdampak_jiwa,jumlah_pengungsi_tertinggi,kategori_banjir").unwrap();
        writeln!(file, "10,1,1,1,0,Banjir Sedang").unwrap();

        let err = EventDataset::load(file.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ArtifactError>(),
            Some(ArtifactError::UnknownCategory(_))
        ));
    }

    #[test]
    fn test_missing_feature_column_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "ketinggian_air_cm,jumlah_terdampak_rt,kategori_banjir").unwrap();
        writeln!(file, "10,1,Banjir Ringan").unwrap();

        let err = EventDataset::load(file.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ArtifactError>(),
            Some(ArtifactError::MissingColumn { column, .. }) if column == "jumlah_terdampak_kk"
        ));
    }

    #[test]
    fn test_top_regions_sorted_descending() {
        let file = create_region_csv();
        let regions = RegionTable::load(file.path()).unwrap();

        let top = regions.top_regions(4).unwrap();
        let names: Vec<&str> = top.entries.iter().map(|r| r.region.as_str()).collect();

        assert_eq!(names, vec!["Kampung Melayu", "Bukit Duri", "Bidara Cina", "Cawang"]);
        assert_eq!(top.frame.height(), 4);
        assert_eq!(top.frame.width(), 4);
    }

    #[test]
    fn test_top_regions_shorter_than_requested() {
        let file = create_region_csv();
        let regions = RegionTable::load(file.path()).unwrap();

        let top = regions.top_regions(20).unwrap();
        assert_eq!(top.entries.len(), regions.len());
        assert_eq!(top.entries.last().unwrap().severe_flood_pct, 0.0);
    }

    #[test]
    fn test_missing_percentage_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "kelurahan,persentase_banjir_berat").unwrap();
        writeln!(file, "Cawang,20.0").unwrap();
        writeln!(file, "Rawajati,").unwrap();

        let err = RegionTable::load(file.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ArtifactError>(),
            Some(ArtifactError::MissingValue { row: 1, .. })
        ));
    }

    #[test]
    fn test_late_decimal_percentage() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "kelurahan,persentase_banjir_berat").unwrap();
        for i in 0..150 {
            writeln!(file, "Kelurahan {},{}", i, i % 50).unwrap();
        }
        writeln!(file, "Late,62.5").unwrap();

        let regions = RegionTable::load(file.path()).unwrap();
        assert_eq!(regions.len(), 151);

        let top = regions.top_regions(5).unwrap();
        assert_eq!(top.entries[0].region, "Late");
        assert_eq!(top.entries[0].severe_flood_pct, 62.5);
        assert_eq!(top.entries[1].severe_flood_pct, 49.0);
    }

    #[test]
    fn test_late_decimal_feature_value() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "ketinggian_air_cm,jumlah_terdampak_rt,jumlah_terdampak_kk,jumlah_terdampak_jiwa,jumlah_pengungsi_tertinggi,kategori_banjir").unwrap();
        for i in 0..120 {
            writeln!(file, "{},1,{},{},0,Banjir Ringan", i % 60, i, i * 3).unwrap();
        }
        writeln!(file, "182.5,14,1100.5,3600,520,Banjir Berat").unwrap();

        let events = EventDataset::load(file.path()).unwrap();
        assert_eq!(events.len(), 121);

        let last = &events.records()[120];
        assert_eq!(last.features, FeatureVector::new(182.5, 14.0, 1100.5, 3600.0, 520.0));
        assert_eq!(last.category, CategoryLabel::SevereFlood);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = RegionTable::load(&dir.path().join("agregasi_kelurahan.csv")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ArtifactError>(),
            Some(ArtifactError::Missing {
                kind: ArtifactKind::Regions,
                ..
            })
        ));
    }
}
