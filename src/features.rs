//! Flood event features in the order the scaler and model were fitted with

use std::fmt;
use std::str::FromStr;

use ndarray::Array1;

/// Number of model inputs
pub const FEATURE_COUNT: usize = 5;

/// One model input. Declaration order is the fitted column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    WaterHeight,
    AffectedUnits,
    AffectedHouseholds,
    AffectedPeople,
    PeakEvacuees,
}

impl Feature {
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Feature::WaterHeight,
        Feature::AffectedUnits,
        Feature::AffectedHouseholds,
        Feature::AffectedPeople,
        Feature::PeakEvacuees,
    ];

    /// Column name in the event dataset and in the fitted scaler
    pub fn column(self) -> &'static str {
        match self {
            Feature::WaterHeight => "ketinggian_air_cm",
            Feature::AffectedUnits => "jumlah_terdampak_rt",
            Feature::AffectedHouseholds => "jumlah_terdampak_kk",
            Feature::AffectedPeople => "jumlah_terdampak_jiwa",
            Feature::PeakEvacuees => "jumlah_pengungsi_tertinggi",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Feature::WaterHeight => "Water Height (cm)",
            Feature::AffectedUnits => "Affected Neighborhood Units (RT)",
            Feature::AffectedHouseholds => "Affected Households (KK)",
            Feature::AffectedPeople => "Affected People",
            Feature::PeakEvacuees => "Peak Evacuees",
        }
    }

    /// Inclusive input bounds accepted by the prediction form
    pub fn bounds(self) -> (f64, f64) {
        match self {
            Feature::WaterHeight => (0.0, 300.0),
            Feature::AffectedUnits => (0.0, 100.0),
            Feature::AffectedHouseholds => (0.0, 5000.0),
            Feature::AffectedPeople => (0.0, 10000.0),
            Feature::PeakEvacuees => (0.0, 1000.0),
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Column names in fitted order
pub fn feature_columns() -> [&'static str; FEATURE_COUNT] {
    Feature::ALL.map(Feature::column)
}

/// A single flood observation or hypothetical prediction input
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    pub water_height_cm: f64,
    pub affected_units: f64,
    pub affected_households: f64,
    pub affected_people: f64,
    pub peak_evacuees: f64,
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self::new(50.0, 1.0, 10.0, 50.0, 0.0)
    }
}

impl FeatureVector {
    pub fn new(
        water_height_cm: f64,
        affected_units: f64,
        affected_households: f64,
        affected_people: f64,
        peak_evacuees: f64,
    ) -> Self {
        Self {
            water_height_cm,
            affected_units,
            affected_households,
            affected_people,
            peak_evacuees,
        }
    }

    pub fn from_array(values: [f64; FEATURE_COUNT]) -> Self {
        let [height, units, households, people, evacuees] = values;
        Self::new(height, units, households, people, evacuees)
    }

    pub fn get(&self, feature: Feature) -> f64 {
        match feature {
            Feature::WaterHeight => self.water_height_cm,
            Feature::AffectedUnits => self.affected_units,
            Feature::AffectedHouseholds => self.affected_households,
            Feature::AffectedPeople => self.affected_people,
            Feature::PeakEvacuees => self.peak_evacuees,
        }
    }

    pub fn to_values(&self) -> [f64; FEATURE_COUNT] {
        Feature::ALL.map(|feature| self.get(feature))
    }

    /// Feature values as a row vector in fitted order
    pub fn to_array(&self) -> Array1<f64> {
        Array1::from(self.to_values().to_vec())
    }

    /// Clamp every field into its input bounds
    pub fn clamped(&self) -> Self {
        Self::from_array(Feature::ALL.map(|feature| {
            let (low, high) = feature.bounds();
            self.get(feature).clamp(low, high)
        }))
    }

    pub fn is_within_bounds(&self) -> bool {
        Feature::ALL.iter().all(|&feature| {
            let (low, high) = feature.bounds();
            (low..=high).contains(&self.get(feature))
        })
    }
}

impl fmt::Display for FeatureVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "height={}cm, rt={}, kk={}, people={}, evacuees={}",
            self.water_height_cm,
            self.affected_units,
            self.affected_households,
            self.affected_people,
            self.peak_evacuees
        )
    }
}

/// Parse values from a comma-separated string
/// Expected format: "height,rt,kk,people,evacuees"
impl FromStr for FeatureVector {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != FEATURE_COUNT {
            anyhow::bail!(
                "Feature values must be in format 'height,rt,kk,people,evacuees', got {} values",
                parts.len()
            );
        }

        let mut values = [0.0; FEATURE_COUNT];
        for ((slot, part), feature) in values.iter_mut().zip(&parts).zip(Feature::ALL) {
            let value: f64 = part
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid {} value: {}", feature.column(), part))?;
            if !value.is_finite() {
                anyhow::bail!("Invalid {} value: {}", feature.column(), part);
            }
            *slot = value;
        }

        Ok(Self::from_array(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_feature_values() {
        let features: FeatureVector = "120, 4,300,1200,80".parse().unwrap();
        assert_eq!(features, FeatureVector::new(120.0, 4.0, 300.0, 1200.0, 80.0));

        assert!("1,2,3".parse::<FeatureVector>().is_err());
        assert!("1,2,three,4,5".parse::<FeatureVector>().is_err());
        assert!("1,2,3,4,NaN".parse::<FeatureVector>().is_err());
    }

    #[test]
    fn test_array_follows_fitted_order() {
        let features = FeatureVector::new(1.0, 2.0, 3.0, 4.0, 5.0);
        assert_eq!(features.to_array().to_vec(), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(
            feature_columns(),
            [
                "ketinggian_air_cm",
                "jumlah_terdampak_rt",
                "jumlah_terdampak_kk",
                "jumlah_terdampak_jiwa",
                "jumlah_pengungsi_tertinggi",
            ]
        );
    }

    #[test]
    fn test_clamped() {
        let features = FeatureVector::new(450.0, -3.0, 10.0, 20000.0, 1000.0);
        let clamped = features.clamped();

        assert_eq!(clamped, FeatureVector::new(300.0, 0.0, 10.0, 10000.0, 1000.0));
        assert!(!features.is_within_bounds());
        assert!(clamped.is_within_bounds());
        assert!(FeatureVector::default().is_within_bounds());
    }
}
