//! EduScan learning-risk assessment service.
//!
//! The core is a linear pipeline: [`validation`] checks the six student
//! metrics, [`model`] turns them into an at-risk probability, [`risk`]
//! buckets the probability into a tier and resolves recommendations.
//! [`store`] persists results as whole-file JSON arrays. Everything else
//! (batch CSV handling, parent observations, dashboard statistics,
//! classroom activity suggestions, credentials, the HTTP surface) is built around that pipeline.

pub mod api;
pub mod auth;
pub mod batch;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod i18n;
pub mod model;
pub mod observations;
pub mod pipeline;
pub mod resources;
pub mod risk;
pub mod store;
pub mod validation;

pub use error::ApiError;
pub use model::{Prediction, PredictionSource, RiskModel, RiskModelAdapter, RiskPredictor};
pub use pipeline::{assess, Assessment, AssessmentRequest, PredictionResult, RequestContext};
pub use risk::{classify, recommend, RiskTier};
pub use validation::{FeatureVector, StudentAssessmentInput, ValidationError};
