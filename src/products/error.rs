use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

/// Error types for catalog operations
#[derive(Debug, thiserror::Error)]
pub enum ProductError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Product not found")]
    NotFound,

    #[error("Image not found")]
    ImageNotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid image upload: {0}")]
    InvalidImage(String),

    #[error("Storage error: {0}")]
    StorageError(String),
}

impl From<sqlx::Error> for ProductError {
    fn from(err: sqlx::Error) -> Self {
        ProductError::DatabaseError(err.to_string())
    }
}

impl IntoResponse for ProductError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ProductError::DatabaseError(msg) => {
                error!("Database error in catalog: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            ProductError::NotFound => (StatusCode::NOT_FOUND, "Product not found".to_string()),
            ProductError::ImageNotFound => (StatusCode::NOT_FOUND, "Image not found".to_string()),
            ProductError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            ProductError::InvalidImage(msg) => (StatusCode::BAD_REQUEST, msg),
            ProductError::StorageError(msg) => {
                error!("Storage error in catalog: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
