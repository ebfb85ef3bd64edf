//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Kiosk Server                       │
//! │                                                                         │
//! │  Handler: Result<Json<T>, ApiError>                                    │
//! │         │                                                               │
//! │         ├── DbError::NotFound ────────────────► 404 NOT_FOUND          │
//! │         ├── DbError::Domain(CoreError) ─┐                              │
//! │         ├── CoreError ──────────────────┴──► 400 / 404 / 409 / 422     │
//! │         ├── ServiceError (Resend, PostHog) ───► 500 / 502              │
//! │         └── anything internal ────────────────► 500, real cause logged │
//! │                                                                         │
//! │  Body: { "code": "INVALID_TRANSITION", "message": "Order M004 ..." }   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::services::ServiceError;
use kiosk_core::{CoreError, ValidationError};
use kiosk_db::DbError;

/// Error body returned by every failing endpoint.
///
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Order not found: 5c0e..."
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Cart operation failed (400)
    CartError,

    /// Missing or bad credentials (401)
    Unauthorized,

    /// Duplicate value (409)
    Conflict,

    /// Status change the workflow forbids (409)
    InvalidTransition,

    /// Business rule violation (422)
    BusinessLogic,

    /// Database operation failed (500)
    DatabaseError,

    /// A required setting (API key, recipients) is missing (500)
    ConfigurationError,

    /// Email or analytics provider failed (502)
    UpstreamError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError | ErrorCode::CartError => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Conflict | ErrorCode::InvalidTransition => StatusCode::CONFLICT,
            ErrorCode::BusinessLogic => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::UpstreamError => StatusCode::BAD_GATEWAY,
            ErrorCode::DatabaseError | ErrorCode::ConfigurationError | ErrorCode::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    pub fn business(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::BusinessLogic, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ConfigurationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => {
                ApiError::new(ErrorCode::Conflict, format!("{} '{}' already exists", field, value))
            }
            DbError::Domain(core) => ApiError::from(core),
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::new(ErrorCode::ValidationError, "Invalid reference")
            }
            DbError::PoolExhausted => ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted"),
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(id) => ApiError::not_found("Product", &id),
            CoreError::OrderNotFound(id) => ApiError::not_found("Order", &id),
            CoreError::LineNotInCart(key) => {
                ApiError::new(ErrorCode::CartError, format!("Item not in cart: {}", key))
            }
            CoreError::CartTooLarge { .. } | CoreError::EmptyOrder => {
                ApiError::new(ErrorCode::CartError, err.to_string())
            }
            CoreError::QuantityTooLarge { .. } => ApiError::validation(err.to_string()),
            CoreError::InvalidTransition { .. } => {
                ApiError::new(ErrorCode::InvalidTransition, err.to_string())
            }
            CoreError::ProductUnavailable(_)
            | CoreError::MilkRequired { .. }
            | CoreError::MilkNotAllowed { .. } => ApiError::business(err.to_string()),
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotConfigured(what) => ApiError::configuration(format!("{} not configured", what)),
            ServiceError::Upstream { provider, status, detail } => {
                tracing::error!(provider, status, detail = %detail, "Upstream call failed");
                ApiError::new(ErrorCode::UpstreamError, format!("{} error ({})", provider, status))
            }
            ServiceError::Request(e) => {
                tracing::error!(error = %e, "Outbound request failed");
                ApiError::new(ErrorCode::UpstreamError, "Upstream request failed")
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use kiosk_core::OrderStatus;

    #[test]
    fn test_core_errors_map_to_codes() {
        let err = ApiError::from(CoreError::InvalidTransition {
            order_number: "M004".to_string(),
            from: OrderStatus::Completed,
            to: OrderStatus::Preparing,
        });
        assert_eq!(err.code, ErrorCode::InvalidTransition);
        assert_eq!(err.code.status(), StatusCode::CONFLICT);

        let err = ApiError::from(CoreError::MilkRequired {
            product: "matchaLatte".to_string(),
        });
        assert_eq!(err.code.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let err = ApiError::from(CoreError::EmptyOrder);
        assert_eq!(err.code, ErrorCode::CartError);
    }

    #[test]
    fn test_db_domain_errors_unwrap() {
        let err = ApiError::from(DbError::Domain(CoreError::ProductNotFound("99".to_string())));
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Product not found: 99");
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let err = ApiError::from(DbError::QueryFailed("near \"SELEC\": syntax error".to_string()));
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(!err.message.contains("SELEC"));
    }

    #[test]
    fn test_missing_key_is_configuration_error() {
        let err = ApiError::from(ServiceError::NotConfigured("RESEND_API_KEY"));
        assert_eq!(err.message, "RESEND_API_KEY not configured");
        assert_eq!(err.code.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(ApiError::not_found("Order", "abc")).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Order not found: abc");
    }
}
