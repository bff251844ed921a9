//! Typed errors and HTTP mapping.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Registration-time failures: the entity model cannot be turned into a registry.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing reference: {kind} '{id}'")]
    MissingReference { kind: &'static str, id: String },
    #[error("invalid key: entity {entity}: {reason}")]
    InvalidKey { entity: String, reason: String },
    #[error("unmapped field type: {entity}.{field} has type '{type_name}'")]
    UnmappedType {
        entity: String,
        field: String,
        type_name: String,
    },
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
    #[error("duplicate entity set: {0}")]
    DuplicateEntitySet(String),
    #[error("duplicate entity type: {0}")]
    DuplicateEntityType(String),
    #[error("duplicate property: {entity}.{property}")]
    DuplicateProperty { entity: String, property: String },
    #[error("config load: {0}")]
    Load(String),
    #[error("validation: {0}")]
    Validation(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("entity metadata unavailable: {0}")]
    EntityUnavailable(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotImplemented(String),
    #[error("not acceptable: {0}")]
    NotAcceptable(String),
    #[error("method not allowed: {0}")]
    MethodNotAllowed(String),
    #[error("data integrity: {0}")]
    Integrity(String),
    #[error("internal: {0}")]
    Internal(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::EntityUnavailable(_) => StatusCode::NOT_FOUND,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            AppError::NotAcceptable(_) => StatusCode::NOT_ACCEPTABLE,
            AppError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Integrity(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "config_error",
            AppError::EntityUnavailable(_) => "entity_unavailable",
            AppError::NotFound(_) => "not_found",
            AppError::BadRequest(_) => "bad_request",
            AppError::NotImplemented(_) => "not_implemented",
            AppError::NotAcceptable(_) => "not_acceptable",
            AppError::MethodNotAllowed(_) => "method_not_allowed",
            AppError::Integrity(_) => "data_integrity",
            AppError::Internal(_) => "internal_error",
            AppError::Db(_) => "database_error",
        }
    }
}

/// OData JSON error payload: `{"error": {"code": ..., "message": ...}}`.
#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, status = %status, "request rejected");
        }
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code().to_string(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = (status, Json(body)).into_response();
        response.headers_mut().insert(
            crate::response::ODATA_VERSION_HEADER,
            HeaderValue::from_static(crate::response::ODATA_VERSION),
        );
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        response
    }
}
