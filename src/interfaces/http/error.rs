use crate::error::LmsError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

impl LmsError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            LmsError::Authentication(_) => StatusCode::UNAUTHORIZED,
            LmsError::MalformedPayload(_) | LmsError::ValidationError(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for LmsError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if self.is_retryable() {
            error!(error = %self, "Webhook processing failed, provider will retry");
        }

        (status, Json(json!({ "success": false, "message": self.to_string() }))).into_response()
    }
}
