use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type. Every handler returns this; the transport
/// mapping lives in one place.
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed or rule-violating input. Carries the offending field so
    /// the response body can point at it.
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("{0} not found")]
    NotFound(&'static str),

    /// Missing or invalid credentials.
    #[error("authentication credentials were not provided or are invalid")]
    Unauthorized,

    /// Authenticated but lacking rights. Distinct from not-found:
    /// existence is not hidden from unauthorized actors.
    #[error("you do not have permission to perform this action")]
    PermissionDenied,

    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("database error: {0}")]
    Db(#[from] sea_orm::DbErr),
}

impl AppError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// The one-review-per-title error, produced both by the pre-check and
    /// by translation of the storage unique-violation under a race.
    pub fn duplicate_review() -> Self {
        Self::validation("title", "only one review per title is allowed")
    }

    /// Maps an insert failure to `duplicate` when the storage layer
    /// reports a unique-constraint violation, so a lost race surfaces as
    /// the same validation error the pre-check would have produced.
    pub fn on_conflict(err: sea_orm::DbErr, duplicate: AppError) -> AppError {
        let message = err.to_string().to_lowercase();
        if message.contains("unique") || message.contains("constraint") {
            duplicate
        } else {
            AppError::Db(err)
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::PermissionDenied => StatusCode::FORBIDDEN,
            Self::Token(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();

        match &self {
            AppError::Validation { .. } | AppError::NotFound(_) => {
                tracing::debug!(%message, "Client error");
            }
            AppError::Unauthorized | AppError::PermissionDenied => {
                tracing::info!(%message, "Auth error");
            }
            _ => {
                tracing::error!(%message, error = ?self, "Server error");
            }
        }

        // Validation errors key the message by the offending field, the
        // rest use a single detail string.
        let body = match &self {
            AppError::Validation { field, message } => Json(json!({ *field: [message] })),
            _ => Json(json!({ "detail": message })),
        };

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::DbErr;

    #[test]
    fn unique_violation_translates_to_duplicate() {
        let err = DbErr::Exec(sea_orm::RuntimeErr::Internal(
            "UNIQUE constraint failed: reviews.title_id, reviews.author_id".to_string(),
        ));
        let translated = AppError::on_conflict(err, AppError::duplicate_review());
        assert!(matches!(translated, AppError::Validation { field: "title", .. }));
    }

    #[test]
    fn other_db_errors_pass_through() {
        let err = DbErr::Exec(sea_orm::RuntimeErr::Internal("disk I/O error".to_string()));
        let translated = AppError::on_conflict(err, AppError::duplicate_review());
        assert!(matches!(translated, AppError::Db(_)));
    }

    #[test]
    fn status_codes_distinguish_denied_from_missing() {
        assert_eq!(
            AppError::PermissionDenied.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::NotFound("review").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(AppError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
    }
}
