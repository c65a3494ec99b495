use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    details: Vec<ValidationDetail>,
}

#[derive(Debug, Serialize)]
pub struct ValidationDetail {
    pub field: String,
    pub message: String,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            ApiError::ServiceUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = self.status_and_code();
        let message = match self {
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                "An internal error occurred".to_string()
            }
            ApiError::NotFound(msg)
            | ApiError::Validation(msg)
            | ApiError::ServiceUnavailable(msg) => msg,
        };

        let body = ErrorBody {
            error,
            message,
            details: Vec::new(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".into()),
            sqlx::Error::PoolTimedOut => {
                ApiError::ServiceUnavailable("Database temporarily unavailable".into())
            }
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details: Vec<ValidationDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| ValidationDetail {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid {}", field)),
                })
            })
            .collect();

        let message = match details.as_slice() {
            [single] => single.message.clone(),
            many => format!("{} validation errors", many.len()),
        };
        ApiError::Validation(message)
    }
}

impl From<validator::ValidationError> for ApiError {
    fn from(error: validator::ValidationError) -> Self {
        ApiError::Validation(
            error
                .message
                .map(|m| m.to_string())
                .unwrap_or_else(|| error.code.to_string()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ApiError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (
                ApiError::ServiceUnavailable("x".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[test]
    fn test_api_error_display() {
        assert_eq!(
            ApiError::NotFound("business".into()).to_string(),
            "Not found: business"
        );
        assert_eq!(
            ApiError::Validation("bad slot".into()).to_string(),
            "Validation error: bad slot"
        );
    }

    #[test]
    fn test_from_sqlx_errors() {
        assert!(matches!(
            ApiError::from(sqlx::Error::RowNotFound),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from(sqlx::Error::PoolTimedOut),
            ApiError::ServiceUnavailable(_)
        ));
        assert!(matches!(
            ApiError::from(sqlx::Error::PoolClosed),
            ApiError::Internal(_)
        ));
    }

    #[derive(Validate)]
    struct Probe {
        #[validate(range(min = 1, max = 10, message = "Out of range"))]
        value: i32,
    }

    #[test]
    fn test_from_validation_errors_single_message() {
        let errors = Probe { value: 42 }.validate().unwrap_err();
        match ApiError::from(errors) {
            ApiError::Validation(msg) => assert_eq!(msg, "Out of range"),
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_from_single_validation_error() {
        let error = shared::validation::validate_slot_name("Bad Slot!").unwrap_err();
        assert!(matches!(ApiError::from(error), ApiError::Validation(_)));
    }
}
