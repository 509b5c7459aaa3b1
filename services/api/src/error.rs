use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use velo_common::error::VeloError;

pub struct ApiError(pub VeloError);

impl From<VeloError> for ApiError {
    fn from(err: VeloError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            VeloError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            VeloError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            VeloError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            VeloError::RateLimited(msg) => (StatusCode::TOO_MANY_REQUESTS, msg.clone()),
            VeloError::UpstreamServer(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            // Config/unknown failures get a generic body; details go to the
            // log only so upstream internals never reach a client
            other => {
                tracing::error!(error = %other, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_owned())
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, Json(body)).into_response()
    }
}
