use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Error response with a `{"detail": ...}` body
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: detail.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("{} {}", self.status.as_u16(), self.detail);
        }
        (self.status, Json(serde_json::json!({ "detail": self.detail }))).into_response()
    }
}

impl From<masker_core::Error> for ApiError {
    fn from(e: masker_core::Error) -> Self {
        let status = match &e {
            masker_core::Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            masker_core::Error::Upstream(_) | masker_core::Error::Unavailable(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let detail = match e {
            masker_core::Error::InvalidInput(detail) => detail,
            other => other.to_string(),
        };
        Self { status, detail }
    }
}

impl From<masker_docs::Error> for ApiError {
    fn from(e: masker_docs::Error) -> Self {
        if let masker_docs::Error::Mask(inner) = e {
            return inner.into();
        }

        let status = if e.is_invalid_input() {
            StatusCode::BAD_REQUEST
        } else if e.is_upstream() {
            StatusCode::BAD_GATEWAY
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        let detail = match e {
            masker_docs::Error::InvalidInput(detail) => detail,
            other => other.to_string(),
        };
        Self { status, detail }
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
