//! # Error Handling
//!
//! Two layers of errors live here:
//!
//! - [`QueryError`]: the compiler's taxonomy. Most variants describe a single
//!   filter, search field or sort directive that could not be compiled. Those
//!   degrade (the input is skipped) unless strict mode is enabled. Payload-level
//!   problems such as an unparseable `filters` string always fail the request.
//! - [`ApiError`]: the sanitized, HTTP-facing error. Internal details are logged
//!   through `tracing` and never sent to clients.
//!
//! ```rust,ignore
//! async fn list_users(
//!     State(db): State<DatabaseConnection>,
//!     Query(params): Query<TableQuery>,
//! ) -> Result<Json<ResultEnvelope<user::Model>>, ApiError> {
//!     params.validate(&options)?;
//!     let composed = apply_table_query(user::Entity::find(), &registry, "users", &params, &options)?;
//!     Ok(Json(fetch_page(&db, composed).await?))
//! }
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;
use std::fmt;

use crate::validation::ValidationErrors;

/// Errors raised while turning table parameters into query constraints.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// The `filters` payload could not be decoded at all.
    #[error("invalid filter format: {0}")]
    InvalidFilterFormat(String),

    /// The field is not a declared column (or not a valid identifier).
    #[error("unknown field '{field}'")]
    UnknownField { field: String },

    /// A hop of a relation path is not declared on the entity it starts from.
    #[error("unknown relation '{relation}' on '{entity}'")]
    UnknownRelation { relation: String, entity: String },

    /// The match mode is outside the supported operator table.
    #[error("unsupported operator '{operator}' for field '{field}'")]
    UnsupportedOperator { field: String, operator: String },

    /// The value shape does not fit the operator.
    #[error("invalid value for field '{field}': {reason}")]
    InvalidFilterValue { field: String, reason: String },

    /// The sort field cannot be compiled into an ordering key.
    #[error("cannot sort by '{field}': {reason}")]
    SortTargetInvalid { field: String, reason: String },

    /// The root entity was never registered.
    #[error("entity '{0}' is not registered")]
    UnknownEntity(String),
}

impl QueryError {
    /// Whether this error only affects one input and may be skipped in tolerant mode.
    #[must_use]
    pub const fn is_degradable(&self) -> bool {
        !matches!(self, Self::InvalidFilterFormat(_) | Self::UnknownEntity(_))
    }

    /// The request field this error refers to, if any.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::UnknownField { field }
            | Self::UnsupportedOperator { field, .. }
            | Self::InvalidFilterValue { field, .. }
            | Self::SortTargetInvalid { field, .. } => Some(field),
            Self::UnknownRelation { relation, .. } => Some(relation),
            Self::InvalidFilterFormat(_) | Self::UnknownEntity(_) => None,
        }
    }
}

/// API error type with automatic logging and sanitized responses
#[derive(Debug)]
pub enum ApiError {
    /// 422 Unprocessable Entity - Validation failed
    ValidationFailed {
        /// User-facing validation errors
        errors: Vec<String>,
    },

    /// 500 Internal Server Error - Database error (details logged, not exposed)
    Database {
        /// User-facing generic message
        message: String,
        /// Internal error (logged, not sent to user)
        internal: DbErr,
    },

    /// 500 Internal Server Error - Generic internal error
    Internal {
        /// User-facing generic message
        message: String,
        /// Internal error details (logged, not sent to user)
        internal: Option<String>,
    },
}

impl ApiError {
    /// Create a 422 Validation Failed error
    #[must_use]
    pub const fn validation_failed(errors: Vec<String>) -> Self {
        Self::ValidationFailed { errors }
    }

    /// Create a 500 Internal Server Error from a database error
    ///
    /// The database error details are logged but NOT sent to the user.
    #[must_use]
    pub fn database(err: DbErr) -> Self {
        Self::Database {
            message: "A database error occurred".to_string(),
            internal: err,
        }
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Database { .. } | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the user-facing error message (sanitized)
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Database { message, .. }
            | Self::Internal { message, .. } => message.clone(),
            Self::ValidationFailed { errors } => {
                if errors.len() == 1 {
                    errors[0].clone()
                } else {
                    format!("Validation failed: {}", errors.join(", "))
                }
            }
        }
    }

    fn log_internal(&self) {
        match self {
            Self::Database { internal, .. } => {
                tracing::error!(error = ?internal, "Database error occurred");
            }
            Self::Internal {
                internal: Some(details),
                ..
            } => {
                tracing::error!(details = %details, "Internal error occurred");
            }
            _ => {
                tracing::debug!(
                    error = %self.user_message(),
                    status = %self.status_code(),
                    "API error"
                );
            }
        }
    }
}

/// Error response sent to users (sanitized)
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<String>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log_internal();

        let status = self.status_code();
        let response = match &self {
            Self::ValidationFailed { errors } => ErrorResponse {
                error: "Validation failed".to_string(),
                details: Some(errors.clone()),
            },
            _ => ErrorResponse {
                error: self.user_message(),
                details: None,
            },
        };

        (status, Json(response)).into_response()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for ApiError {}

/// `UnknownEntity` is a wiring mistake on the server side and becomes a 500;
/// everything else the client sent is reported as a validation failure.
impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::UnknownEntity(_) => Self::Internal {
                message: "The requested resource is not queryable".to_string(),
                internal: Some(err.to_string()),
            },
            other => Self::ValidationFailed {
                errors: vec![other.to_string()],
            },
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self::ValidationFailed {
            errors: errors.errors().iter().map(ToString::to_string).collect(),
        }
    }
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        Self::database(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationError;

    #[test]
    fn test_validation_failed_single_error() {
        let err = ApiError::validation_failed(vec!["sortOrder: Must be one of asc, desc, 1, -1".to_string()]);
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.user_message(), "sortOrder: Must be one of asc, desc, 1, -1");
    }

    #[test]
    fn test_validation_failed_multiple_errors() {
        let err = ApiError::validation_failed(vec!["page invalid".to_string(), "rows invalid".to_string()]);
        assert_eq!(err.user_message(), "Validation failed: page invalid, rows invalid");
    }

    #[test]
    fn test_invalid_filter_format_is_validation_failure() {
        let api_err: ApiError = QueryError::InvalidFilterFormat("expected value".to_string()).into();
        assert_eq!(api_err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(api_err.user_message().contains("invalid filter format"));
    }

    #[test]
    fn test_unknown_entity_is_internal() {
        let api_err: ApiError = QueryError::UnknownEntity("ghosts".to_string()).into();
        assert_eq!(api_err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api_err.user_message().contains("ghosts"));
    }

    #[test]
    fn test_validation_errors_conversion() {
        let mut errors = ValidationErrors::new();
        errors.add(ValidationError::new("page", "Must be at least 1"));
        let api_err: ApiError = errors.into();
        assert_eq!(api_err.user_message(), "page: Must be at least 1");
    }

    #[test]
    fn test_database_error_is_sanitized() {
        let api_err: ApiError = DbErr::Custom("no such table: secrets".to_string()).into();
        assert_eq!(api_err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api_err.user_message(), "A database error occurred");
    }

    #[test]
    fn test_into_response_status() {
        let response = ApiError::validation_failed(vec!["rows: Must be at least 1".to_string()]).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let response = ApiError::from(QueryError::UnknownEntity("ghosts".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_degradable_classification() {
        assert!(QueryError::UnknownField { field: "x".into() }.is_degradable());
        assert!(
            QueryError::SortTargetInvalid {
                field: "posts.title".into(),
                reason: "multi-valued".into()
            }
            .is_degradable()
        );
        assert!(!QueryError::InvalidFilterFormat("bad".into()).is_degradable());
        assert!(!QueryError::UnknownEntity("x".into()).is_degradable());
    }

    #[test]
    fn test_error_field_accessor() {
        let err = QueryError::UnsupportedOperator {
            field: "status".into(),
            operator: "bogus".into(),
        };
        assert_eq!(err.field(), Some("status"));
        assert_eq!(err.to_string(), "unsupported operator 'bogus' for field 'status'");
    }
}
