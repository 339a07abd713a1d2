use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use dealflow_infra::DealError;

pub fn deal_error_to_response(err: DealError) -> axum::response::Response {
    let retryable = err.is_retryable();
    let (status, code) = match &err {
        DealError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
        DealError::InvariantViolation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation"),
        DealError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        DealError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
        DealError::AlreadyExists(_) => (StatusCode::CONFLICT, "already_exists"),
        DealError::ScopeViolation(_) => (StatusCode::FORBIDDEN, "scope_violation"),
        DealError::Persistence(_) => (StatusCode::SERVICE_UNAVAILABLE, "store_error"),
        DealError::Deserialize(_) => (StatusCode::INTERNAL_SERVER_ERROR, "deserialize_error"),
        DealError::Serialize(_) => (StatusCode::INTERNAL_SERVER_ERROR, "serialize_error"),
        DealError::Publish(_) => (StatusCode::INTERNAL_SERVER_ERROR, "publish_error"),
    };
    if status.is_server_error() {
        tracing::error!(error = %err, "deal operation failed");
    }
    error_body(status, code, err.to_string(), retryable)
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> axum::response::Response {
    error_body(status, code, message.into(), false)
}

fn error_body(status: StatusCode, code: &'static str, message: String, retryable: bool) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message,
            "retryable": retryable,
        })),
    )
        .into_response()
}
