use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use publish_scopes_infra::PublishError;

/// Every pipeline failure looks the same to the caller.
///
/// The underlying error text stays in the service logs.
pub fn publish_error_to_response(_err: &PublishError) -> axum::response::Response {
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "login_failed",
        "permissions could not be resolved",
    )
}

pub fn timeout_response() -> axum::response::Response {
    json_error(
        StatusCode::GATEWAY_TIMEOUT,
        "timeout",
        "permission resolution exceeded its execution budget",
    )
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
