use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::validation::{Feature, FeatureVector};

/// Probability returned while no trained artifact is available.
pub const SAMPLE_PROBABILITY: f64 = 0.35;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model artifact not found at {}", .0.display())]
    Missing(PathBuf),

    #[error("failed to read model artifact {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("model artifact is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("model was fit on features {found:?}, expected {expected:?}")]
    FeatureMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("invalid model parameters: {0}")]
    InvalidParameters(String),
}

/// On-disk bundle: feature scaler plus logistic classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub feature_names: Vec<String>,
    pub scaler: ScalerParams,
    pub classifier: ClassifierParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalerParams {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierParams {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_threshold() -> f64 {
    0.5
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// 1 when the student is predicted to be at risk.
    pub label: u8,
    /// Positive-class probability.
    pub probability: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionSource {
    Model,
    Sample,
}

/// Anything that can score a validated feature vector.
pub trait RiskPredictor {
    fn predict(&self, features: &FeatureVector) -> Prediction;

    fn source(&self) -> PredictionSource;
}

/// Standard-scaled logistic regression loaded from a [`ModelArtifact`].
#[derive(Debug, Clone)]
pub struct RiskModel {
    mean: Array1<f64>,
    scale: Array1<f64>,
    coefficients: Array1<f64>,
    intercept: f64,
    threshold: f64,
}

impl RiskModel {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let raw = fs::read_to_string(path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                ModelError::Missing(path.to_path_buf())
            } else {
                ModelError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        let artifact: ModelArtifact = serde_json::from_str(&raw)?;
        Self::from_artifact(artifact)
    }

    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self, ModelError> {
        let expected: Vec<String> = Feature::ALL.iter().map(|f| f.column().to_string()).collect();
        if artifact.feature_names != expected {
            return Err(ModelError::FeatureMismatch {
                expected,
                found: artifact.feature_names,
            });
        }

        let n = Feature::ALL.len();
        for (name, len) in [
            ("scaler.mean", artifact.scaler.mean.len()),
            ("scaler.scale", artifact.scaler.scale.len()),
            ("classifier.coefficients", artifact.classifier.coefficients.len()),
        ] {
            if len != n {
                return Err(ModelError::InvalidParameters(format!(
                    "{name} has {len} entries, expected {n}"
                )));
            }
        }
        if artifact
            .scaler
            .scale
            .iter()
            .any(|s| !s.is_finite() || *s <= 0.0)
        {
            return Err(ModelError::InvalidParameters(
                "scaler.scale entries must be positive".to_string(),
            ));
        }
        let threshold = artifact.classifier.threshold;
        if !(threshold > 0.0 && threshold < 1.0) {
            return Err(ModelError::InvalidParameters(format!(
                "threshold {threshold} is outside (0, 1)"
            )));
        }

        Ok(Self {
            mean: Array1::from_vec(artifact.scaler.mean),
            scale: Array1::from_vec(artifact.scaler.scale),
            coefficients: Array1::from_vec(artifact.classifier.coefficients),
            intercept: artifact.classifier.intercept,
            threshold,
        })
    }

    pub fn predict(&self, features: &FeatureVector) -> Prediction {
        let x = Array1::from_vec(features.as_slice().to_vec());
        let scaled = (&x - &self.mean) / &self.scale;
        let z = scaled.dot(&self.coefficients) + self.intercept;
        let probability = sigmoid(z);

        Prediction {
            label: u8::from(probability >= self.threshold),
            probability,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// The model as seen by the rest of the service: either the loaded
/// artifact or a fixed sample response when loading failed.
#[derive(Debug, Clone)]
pub enum RiskModelAdapter {
    Trained(RiskModel),
    Sample,
}

impl RiskModelAdapter {
    /// Loads the artifact, falling back to [`RiskModelAdapter::Sample`] when
    /// it is missing or unusable.
    pub fn load_or_sample(path: &Path) -> Self {
        match RiskModel::load(path) {
            Ok(model) => {
                info!("Loaded risk model from {}", path.display());
                RiskModelAdapter::Trained(model)
            }
            Err(e) => {
                warn!("Using sample predictions: {e}");
                RiskModelAdapter::Sample
            }
        }
    }

    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            source: self.source(),
            algorithm: "Logistic Regression (standard-scaled)",
            features: Feature::ALL.iter().map(|f| f.column()).collect(),
            threshold: match self {
                RiskModelAdapter::Trained(model) => Some(model.threshold()),
                RiskModelAdapter::Sample => None,
            },
        }
    }
}

impl RiskPredictor for RiskModelAdapter {
    fn predict(&self, features: &FeatureVector) -> Prediction {
        match self {
            RiskModelAdapter::Trained(model) => model.predict(features),
            RiskModelAdapter::Sample => Prediction {
                label: 0,
                probability: SAMPLE_PROBABILITY,
            },
        }
    }

    fn source(&self) -> PredictionSource {
        match self {
            RiskModelAdapter::Trained(_) => PredictionSource::Model,
            RiskModelAdapter::Sample => PredictionSource::Sample,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub source: PredictionSource,
    pub algorithm: &'static str,
    pub features: Vec<&'static str>,
    pub threshold: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(coefficients: Vec<f64>, intercept: f64) -> ModelArtifact {
        ModelArtifact {
            feature_names: Feature::ALL.iter().map(|f| f.column().to_string()).collect(),
            scaler: ScalerParams {
                mean: vec![0.0; 6],
                scale: vec![1.0; 6],
            },
            classifier: ClassifierParams {
                coefficients,
                intercept,
                threshold: 0.5,
            },
        }
    }

    #[test]
    fn zero_weights_give_even_odds() {
        let model = RiskModel::from_artifact(artifact(vec![0.0; 6], 0.0)).unwrap();
        let prediction = model.predict(&FeatureVector::new([50.0, 50.0, 50.0, 50.0, 3.0, 5.0]));
        assert!((prediction.probability - 0.5).abs() < 1e-12);
        assert_eq!(prediction.label, 1);
    }

    #[test]
    fn negative_weights_lower_risk_for_stronger_students() {
        let model =
            RiskModel::from_artifact(artifact(vec![-0.05, -0.05, -0.05, -0.02, -0.3, -0.2], 8.0))
                .unwrap();
        let strong = model.predict(&FeatureVector::new([95.0, 92.0, 90.0, 98.0, 5.0, 9.0]));
        let weak = model.predict(&FeatureVector::new([20.0, 25.0, 30.0, 40.0, 1.0, 2.0]));
        assert!(strong.probability < weak.probability);
        assert_eq!(strong.label, 0);
        assert_eq!(weak.label, 1);
    }

    #[test]
    fn rejects_reordered_features() {
        let mut bundle = artifact(vec![0.0; 6], 0.0);
        bundle.feature_names.swap(0, 1);
        assert!(matches!(
            RiskModel::from_artifact(bundle),
            Err(ModelError::FeatureMismatch { .. })
        ));
    }

    #[test]
    fn rejects_zero_scale() {
        let mut bundle = artifact(vec![0.0; 6], 0.0);
        bundle.scaler.scale[3] = 0.0;
        assert!(matches!(
            RiskModel::from_artifact(bundle),
            Err(ModelError::InvalidParameters(_))
        ));
    }

    #[test]
    fn rejects_short_coefficients() {
        let bundle = artifact(vec![0.0; 5], 0.0);
        assert!(matches!(
            RiskModel::from_artifact(bundle),
            Err(ModelError::InvalidParameters(_))
        ));
    }

    #[test]
    fn missing_artifact_falls_back_to_sample() {
        let adapter = RiskModelAdapter::load_or_sample(Path::new("does/not/exist.json"));
        assert_eq!(adapter.source(), PredictionSource::Sample);
        let prediction = adapter.predict(&FeatureVector::new([75.0, 80.0, 70.0, 85.0, 3.0, 6.0]));
        assert_eq!(prediction.probability, SAMPLE_PROBABILITY);
        assert_eq!(prediction.label, 0);
    }

    #[test]
    fn missing_artifact_is_reported_as_missing() {
        let err = RiskModel::load(Path::new("does/not/exist.json")).unwrap_err();
        assert!(matches!(err, ModelError::Missing(_)));
    }

    #[test]
    fn bundled_artifact_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("models/risk_model.json");
        let model = RiskModel::load(&path).unwrap();
        let p = model
            .predict(&FeatureVector::new([75.0, 80.0, 70.0, 85.0, 3.0, 6.0]))
            .probability;
        assert!((0.0..=1.0).contains(&p));
    }
}
