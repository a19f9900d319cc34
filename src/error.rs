//! Typed errors and HTTP mapping.
//!
//! Handlers collapse errors per operation before returning them: single-resource
//! reads and deletes turn every failure into `NotFound`, creates turn every
//! failure into `SaveFailed`. See the `AppError::*_for` helpers.

use axum::{
    extract::rejection::BytesRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("not found: {kind} {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("validation: {0}")]
    Validation(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Body(#[from] BytesRejection),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("store: {0}")]
    Store(String),
    #[error("problem saving document")]
    SaveFailed,
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AppError {
    /// Collapse any failure on a single-resource read or delete into `NotFound`.
    pub fn not_found_for(self, kind: &'static str, id: &str) -> AppError {
        match self {
            AppError::NotFound { .. } => {}
            other => tracing::warn!(error = %other, kind, id, "store failure reported as not found"),
        }
        AppError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Like [`AppError::not_found_for`], but validation failures keep their own 422 response.
    pub fn update_failure_for(self, kind: &'static str, id: &str) -> AppError {
        match self {
            AppError::Validation(msg) => AppError::Validation(msg),
            other => other.not_found_for(kind, id),
        }
    }

    /// Log the cause of a failed create and hide it behind the generic server error.
    pub fn save_failure(self) -> AppError {
        tracing::error!(error = %self, "problem saving document to the database");
        AppError::SaveFailed
    }
}

/// JSON:API error object.
#[derive(Serialize, Debug)]
pub struct ErrorObject {
    pub status: String,
    pub title: String,
    pub description: String,
}

/// Error envelope. Not-found responses use the singular `error` key, every other error uses `errors`.
#[derive(Serialize, Debug)]
pub enum ErrorBody {
    #[serde(rename = "error")]
    Single(Vec<ErrorObject>),
    #[serde(rename = "errors")]
    Many(Vec<ErrorObject>),
}

fn error_object(status: StatusCode, title: &str, description: String) -> ErrorObject {
    ErrorObject {
        status: status.as_u16().to_string(),
        title: title.to_string(),
        description,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::NotFound { kind, id } => (
                StatusCode::NOT_FOUND,
                ErrorBody::Single(vec![error_object(
                    StatusCode::NOT_FOUND,
                    "Resource does not exist",
                    format!("We could not find a {} with id: {}", kind, id),
                )]),
            ),
            AppError::Validation(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorBody::Many(vec![error_object(StatusCode::UNPROCESSABLE_ENTITY, "Validation error", msg)]),
            ),
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody::Many(vec![error_object(StatusCode::BAD_REQUEST, "Bad request", msg)]),
            ),
            AppError::Body(rejection) => {
                let status = rejection.status();
                let title = if status == StatusCode::PAYLOAD_TOO_LARGE {
                    "Payload too large"
                } else {
                    "Bad request"
                };
                (
                    status,
                    ErrorBody::Many(vec![error_object(status, title, rejection.body_text())]),
                )
            }
            AppError::SaveFailed => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::Many(vec![error_object(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Server error",
                    "Problem saving document to the database.".into(),
                )]),
            ),
            other => {
                tracing::error!(error = %other, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::Many(vec![error_object(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Server error",
                        "Problem reading from the database.".into(),
                    )]),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
