//! API error types with the JSON error envelope.
//!
//! Every failed request answers `{ "success": false, "message": ... }`;
//! validation failures additionally carry an `errors` array with one entry
//! per violated field, `message` being the first of them.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::auth::TokenError;
use crate::db::DatabaseError;
use crate::validation::FieldError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthorized,
    #[error("Token expired")]
    TokenExpired,
    #[error("Forbidden")]
    Forbidden,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Validation failed")]
    Validation(Vec<FieldError>),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, errors) = match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Authentication required".to_string(),
                None,
            ),
            ApiError::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                "Token expired, log in again".to_string(),
                None,
            ),
            ApiError::Forbidden => (
                StatusCode::FORBIDDEN,
                "You do not have permission to do that".to_string(),
                None,
            ),
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, detail, None),
            ApiError::Conflict(detail) => (StatusCode::CONFLICT, detail, None),
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, detail, None),
            ApiError::Validation(errors) => {
                let message = errors
                    .first()
                    .map(|e| e.message.clone())
                    .unwrap_or_else(|| "Validation failed".to_string());
                (StatusCode::BAD_REQUEST, message, Some(errors))
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorBody {
            success: false,
            message,
            errors,
        };
        (status, Json(body)).into_response()
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { entity_type, id } => {
                ApiError::NotFound(format!("{entity_type} {id} not found"))
            }
            DatabaseError::Duplicate(detail) => ApiError::Conflict(detail),
            DatabaseError::RevisionConflict { expected, found } => ApiError::Conflict(format!(
                "settings changed since you loaded them (expected revision {expected}, now {found})"
            )),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => ApiError::TokenExpired,
            TokenError::Signing(detail) => ApiError::Internal(detail),
            _ => ApiError::Unauthorized,
        }
    }
}

impl From<Vec<FieldError>> for ApiError {
    fn from(errors: Vec<FieldError>) -> Self {
        ApiError::Validation(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), 4096).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn unauthorized_envelope() {
        let response = ApiError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Authentication required");
        assert!(json.get("errors").is_none());
    }

    #[tokio::test]
    async fn validation_carries_all_errors_and_first_message() {
        let errors = vec![
            FieldError::new("name", "name is required"),
            FieldError::new("price", "price must be greater than zero"),
        ];
        let response = ApiError::Validation(errors).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert_eq!(json["message"], "name is required");
        assert_eq!(json["errors"].as_array().unwrap().len(), 2);
        assert_eq!(json["errors"][1]["field"], "price");
    }

    #[tokio::test]
    async fn duplicate_maps_to_409() {
        let err: ApiError = DatabaseError::Duplicate("username already taken".into()).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let json = body_json(response).await;
        assert_eq!(json["message"], "username already taken");
    }

    #[tokio::test]
    async fn not_found_maps_to_404() {
        let err: ApiError = DatabaseError::NotFound {
            entity_type: "patient".into(),
            id: "p1".into(),
        }
        .into();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn revision_conflict_maps_to_409() {
        let err: ApiError = DatabaseError::RevisionConflict {
            expected: 3,
            found: 5,
        }
        .into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let json = body_json(response).await;
        assert!(json["message"].as_str().unwrap().contains("revision 3"));
    }

    #[tokio::test]
    async fn internal_hides_detail() {
        let response = ApiError::Internal("db on fire".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["message"], "An internal error occurred");
    }

    #[tokio::test]
    async fn expired_token_is_401() {
        let err: ApiError = TokenError::Expired.into();
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }
}
