//! Range checks for the six model features.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One of the six inputs the risk model was fit on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    MathScore,
    ReadingScore,
    WritingScore,
    Attendance,
    Behavior,
    Literacy,
}

impl Feature {
    /// Fixed model order. Must match the order the classifier was fit with.
    pub const ALL: [Feature; 6] = [
        Feature::MathScore,
        Feature::ReadingScore,
        Feature::WritingScore,
        Feature::Attendance,
        Feature::Behavior,
        Feature::Literacy,
    ];

    /// Column / JSON field name.
    pub fn column(self) -> &'static str {
        match self {
            Feature::MathScore => "math_score",
            Feature::ReadingScore => "reading_score",
            Feature::WritingScore => "writing_score",
            Feature::Attendance => "attendance",
            Feature::Behavior => "behavior",
            Feature::Literacy => "literacy",
        }
    }

    /// Inclusive bounds.
    pub fn bounds(self) -> (f64, f64) {
        match self {
            Feature::MathScore | Feature::ReadingScore | Feature::WritingScore => (0.0, 100.0),
            Feature::Attendance => (0.0, 100.0),
            Feature::Behavior => (1.0, 5.0),
            Feature::Literacy => (1.0, 10.0),
        }
    }

    /// Whether the feature only takes whole numbers.
    pub fn is_integer(self) -> bool {
        !matches!(self, Feature::Attendance)
    }

    fn label(self) -> &'static str {
        match self {
            Feature::MathScore => "Math score",
            Feature::ReadingScore => "Reading score",
            Feature::WritingScore => "Writing score",
            Feature::Attendance => "Attendance",
            Feature::Behavior => "Behavior rating",
            Feature::Literacy => "Literacy level",
        }
    }

    fn unit(self) -> &'static str {
        match self {
            Feature::Attendance => "%",
            _ => "",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StudentAssessmentInput {
    pub math_score: i64,
    pub reading_score: i64,
    pub writing_score: i64,
    pub attendance: f64,
    pub behavior: i64,
    pub literacy: i64,
}

impl StudentAssessmentInput {
    pub fn value(&self, feature: Feature) -> f64 {
        match feature {
            Feature::MathScore => self.math_score as f64,
            Feature::ReadingScore => self.reading_score as f64,
            Feature::WritingScore => self.writing_score as f64,
            Feature::Attendance => self.attendance,
            Feature::Behavior => self.behavior as f64,
            Feature::Literacy => self.literacy as f64,
        }
    }

    /// Collects every out-of-range field. An empty result means the input
    /// may be handed to the model.
    pub fn validate(&self) -> Vec<ValidationError> {
        Feature::ALL
            .iter()
            .filter_map(|&feature| {
                let value = self.value(feature);
                let (min, max) = feature.bounds();
                // NaN fails the range check as well.
                if (min..=max).contains(&value) {
                    None
                } else {
                    Some(ValidationError { feature, value })
                }
            })
            .collect()
    }

    /// Validates and, on success, produces the feature vector in model order.
    pub fn into_features(self) -> Result<FeatureVector, Vec<ValidationError>> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(errors);
        }
        let mut values = [0.0; 6];
        for (slot, feature) in values.iter_mut().zip(Feature::ALL) {
            *slot = self.value(feature);
        }
        Ok(FeatureVector(values))
    }
}

/// Six features in [`Feature::ALL`] order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; 6]);

impl FeatureVector {
    pub fn new(values: [f64; 6]) -> Self {
        FeatureVector(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Error)]
#[error(
    "{} must be between {} and {}{}",
    .feature.label(),
    .feature.bounds().0,
    .feature.bounds().1,
    .feature.unit()
)]
pub struct ValidationError {
    pub feature: Feature,
    pub value: f64,
}
