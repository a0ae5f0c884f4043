//! HTTP-facing error type. Each module keeps its own error enum; this one
//! decides the status code and body the client sees.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

use crate::auth::AuthError;
use crate::batch::BatchError;
use crate::observations::ObservationError;
use crate::pipeline::PipelineError;
use crate::store::StoreError;
use crate::validation::ValidationError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Please correct the following errors")]
    Validation(Vec<ValidationError>),

    #[error("Please correct the following errors")]
    InvalidObservation(Vec<String>),

    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    details: Vec<String>,
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Invalid(errors) => ApiError::Validation(errors),
        }
    }
}

impl From<ObservationError> for ApiError {
    fn from(err: ObservationError) -> Self {
        match err {
            ObservationError::Invalid(errors) => ApiError::InvalidObservation(errors),
            dup @ ObservationError::Duplicate { .. } => ApiError::Conflict(dup.to_string()),
            ObservationError::Store(e) => ApiError::Store(e),
        }
    }
}

impl ApiError {
    fn details(&self) -> Vec<String> {
        match self {
            ApiError::Validation(errors) => errors.iter().map(|e| e.to_string()).collect(),
            ApiError::InvalidObservation(errors) => errors.clone(),
            ApiError::Batch(BatchError::MissingColumns(missing)) => missing.clone(),
            _ => Vec::new(),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::InvalidObservation(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::Batch(BatchError::MissingColumns(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Batch(BatchError::Csv(_)) | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Batch(BatchError::Io(_)) | ApiError::Store(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
            details: self.details(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::Feature;

    #[test]
    fn validation_errors_list_every_message() {
        let err = ApiError::Validation(vec![
            ValidationError {
                feature: Feature::Attendance,
                value: 150.0,
            },
            ValidationError {
                feature: Feature::Behavior,
                value: 0.0,
            },
        ]);
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            err.details(),
            vec![
                "Attendance must be between 0 and 100%".to_string(),
                "Behavior rating must be between 1 and 5".to_string(),
            ]
        );
    }

    #[test]
    fn auth_errors_are_unauthorized() {
        let err = ApiError::from(AuthError::InvalidCredentials);
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.to_string(), "Invalid username or password");
    }

    #[test]
    fn forbidden_is_its_own_status() {
        let err = ApiError::Forbidden("teachers only".to_string());
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert!(err.details().is_empty());
    }

    #[test]
    fn missing_columns_are_listed() {
        let err = ApiError::from(BatchError::MissingColumns(vec!["behavior".to_string()]));
        assert_eq!(err.details(), vec!["behavior".to_string()]);
        assert_eq!(err.to_string(), "Missing required columns: behavior");
    }
}
