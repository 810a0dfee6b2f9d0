use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use crate::outfits::service::RecommendError;
use crate::overlay::export::ExportError;
use crate::overlay::LoadError;
use crate::tools::instagram::PublishError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{message}")]
    NotConfigured { message: String, status: StatusCode },
    #[error("{message}")]
    Upstream {
        message: String,
        detail: Option<String>,
    },
    #[error("{0}")]
    Decode(String),
    #[error("Instagram publish failed")]
    Publish(Value),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Publish(_) => StatusCode::BAD_REQUEST,
            ApiError::NotConfigured { status, .. } => *status,
            ApiError::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Decode(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    pub fn openai_missing(message: &str) -> Self {
        ApiError::NotConfigured {
            message: message.to_string(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> Value {
        match self {
            ApiError::Upstream {
                message,
                detail: Some(detail),
            } => json!({ "error": message, "detail": detail }),
            ApiError::Publish(upstream) => json!({ "error": upstream }),
            other => json!({ "error": other.to_string() }),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

impl From<RecommendError> for ApiError {
    fn from(err: RecommendError) -> Self {
        match err {
            RecommendError::NotConfigured => ApiError::openai_missing(&err.to_string()),
            other => ApiError::Upstream {
                message: other.to_string(),
                detail: other.detail(),
            },
        }
    }
}

impl From<LoadError> for ApiError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::NotAnImage(_) | LoadError::Empty | LoadError::InvalidBase64(_) => {
                ApiError::Validation(err.to_string())
            }
            LoadError::Fetch(_) | LoadError::Decode(_) => ApiError::Decode(err.to_string()),
        }
    }
}

impl From<ExportError> for ApiError {
    fn from(err: ExportError) -> Self {
        ApiError::Upstream {
            message: "Failed to export image".to_string(),
            detail: Some(err.to_string()),
        }
    }
}

impl From<PublishError> for ApiError {
    fn from(err: PublishError) -> Self {
        match err {
            PublishError::NotConfigured => ApiError::NotConfigured {
                message: err.to_string(),
                status: StatusCode::BAD_REQUEST,
            },
            other => ApiError::Publish(other.upstream_body()),
        }
    }
}
