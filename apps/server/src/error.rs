//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Mostrador                              │
//! │                                                                         │
//! │  handler ──► Result<T, ApiError>                                        │
//! │                 ▲                                                       │
//! │                 ├── DbError::NotFound ──────────────► 404 NOT_FOUND     │
//! │                 ├── ValidationError / bad JSON ─────► 400 VALIDATION_   │
//! │                 │   UniqueViolation, FK violation        FAILED         │
//! │                 │   system movement type, product with movements        │
//! │                 ├── CoreError::SaleMovementType- ───► 500 CONFIGURATION_│
//! │                 │   Missing                              MISSING        │
//! │                 └── anything else from the store ───► 500 STORE_ERROR   │
//! │                                                                         │
//! │  Body: { "error": "Cliente no encontrado", "code": "NOT_FOUND" }        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use mostrador_core::{CoreError, ValidationError};
use mostrador_db::DbError;

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationFailed,

    /// The store is missing required setup data (500)
    ConfigurationMissing,

    /// Database operation failed (500)
    StoreError,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationFailed => StatusCode::BAD_REQUEST,
            ErrorCode::ConfigurationMissing | ErrorCode::StoreError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// API error returned from handlers.
///
/// ## Serialization
/// ```json
/// {
///   "error": "Faltan campos requeridos: identificacion_cliente, productos",
///   "code": "VALIDATION_FAILED"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Spanish message for display
    #[serde(rename = "error")]
    pub message: String,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationFailed, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { .. } => ApiError::new(ErrorCode::NotFound, err.to_string()),
            DbError::Domain(core) => core.into(),
            DbError::UniqueViolation { .. } => ApiError::validation(err.to_string()),
            DbError::ForeignKeyViolation { ref message } => {
                tracing::warn!(message = %message, "Foreign key violation");
                ApiError::validation("El registro está referenciado por otros datos")
            }
            other => {
                tracing::error!(error = %other, "Store operation failed");
                ApiError::new(ErrorCode::StoreError, other.to_string())
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::SaleMovementTypeMissing => {
                tracing::error!("No sale movement type configured");
                ApiError::new(ErrorCode::ConfigurationMissing, err.to_string())
            }
            CoreError::SystemMovementType(_)
            | CoreError::ProductHasMovements(_)
            | CoreError::Validation(_) => {
                ApiError::validation(err.to_string())
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(format!("Cuerpo JSON inválido: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::validation(format!("Parámetros inválidos: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::validation(format!("Ruta inválida: {}", rejection.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mostrador_db::error::entity;

    #[test]
    fn test_not_found_keeps_spanish_message() {
        let err: ApiError = DbError::not_found(entity::CLIENTE, "123").into();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Cliente no encontrado");
    }

    #[test]
    fn test_validation_maps_to_400() {
        let err: ApiError = DbError::from(ValidationError::required("nombre, flujo")).into();
        assert_eq!(err.code.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Faltan campos requeridos: nombre, flujo");
    }

    #[test]
    fn test_missing_sale_type_is_configuration() {
        let err: ApiError = DbError::Domain(CoreError::SaleMovementTypeMissing).into();
        assert_eq!(err.code, ErrorCode::ConfigurationMissing);
        assert_eq!(err.code.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_store_error_passes_message_through() {
        let err: ApiError = DbError::QueryFailed("disk I/O error".into()).into();
        assert_eq!(err.code, ErrorCode::StoreError);
        assert!(err.message.contains("disk I/O error"));
    }

    #[test]
    fn test_body_shape() {
        let body = serde_json::to_value(ApiError::validation("x")).unwrap();
        assert_eq!(body, serde_json::json!({"error": "x", "code": "VALIDATION_FAILED"}));
    }
}
