//! One pass of validate → predict → classify → recommend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::i18n::{text, Language, TextKey};
use crate::model::{PredictionSource, RiskPredictor};
use crate::risk::{classify, recommend, RiskTier};
use crate::validation::{StudentAssessmentInput, ValidationError};

/// Per-request state handed through the pipeline instead of session globals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub language: Language,
    pub username: Option<String>,
}

impl RequestContext {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            username: None,
        }
    }

    pub fn with_user(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentRequest {
    #[serde(flatten)]
    pub input: StudentAssessmentInput,
    #[serde(default)]
    pub student_name: Option<String>,
    #[serde(default)]
    pub grade_level: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl From<StudentAssessmentInput> for AssessmentRequest {
    fn from(input: StudentAssessmentInput) -> Self {
        Self {
            input,
            student_name: None,
            grade_level: None,
            notes: None,
        }
    }
}

/// What gets persisted when a user saves an assessment. The tier is never
/// stored; it is recomputed from `probability` on every read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub student_name: Option<String>,
    #[serde(default)]
    pub grade_level: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub prediction: u8,
    pub probability: f64,
    #[serde(flatten)]
    pub input: StudentAssessmentInput,
}

impl PredictionResult {
    pub fn risk_tier(&self) -> RiskTier {
        classify(self.probability)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Assessment {
    pub result: PredictionResult,
    pub risk_tier: RiskTier,
    pub risk_label: &'static str,
    pub recommendations: &'static [&'static str],
    pub source: PredictionSource,
    /// Set when the answer came from the sample fallback, not a trained model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<&'static str>,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{} input field(s) out of range", .0.len())]
    Invalid(Vec<ValidationError>),
}

pub fn assess<P>(
    ctx: &RequestContext,
    model: &P,
    request: AssessmentRequest,
) -> Result<Assessment, PipelineError>
where
    P: RiskPredictor + ?Sized,
{
    let features = request.input.into_features().map_err(PipelineError::Invalid)?;
    let prediction = model.predict(&features);
    let risk_tier = classify(prediction.probability);
    let source = model.source();

    debug!(
        user = ctx.username.as_deref().unwrap_or("anonymous"),
        probability = prediction.probability,
        tier = %risk_tier,
        "assessment complete"
    );

    let result = PredictionResult {
        timestamp: Utc::now(),
        student_name: request.student_name.filter(|s| !s.trim().is_empty()),
        grade_level: request.grade_level.filter(|s| !s.trim().is_empty()),
        notes: request.notes.filter(|s| !s.trim().is_empty()),
        prediction: prediction.label,
        probability: prediction.probability,
        input: request.input,
    };

    Ok(Assessment {
        result,
        risk_tier,
        risk_label: risk_tier.localized(ctx.language),
        recommendations: recommend(risk_tier),
        source,
        notice: match source {
            PredictionSource::Sample => Some(text(TextKey::SampleModelNotice, ctx.language)),
            PredictionSource::Model => None,
        },
    })
}
