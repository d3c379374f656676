use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::Instrument;

use publish_scopes_auth::RecordedClaims;
use publish_scopes_infra::PublishOutcome;
use publish_scopes_observability::{InvocationId, invocation_span};

use crate::app::AppState;
use crate::app::dto::{PostLoginEvent, PostLoginResponse};
use crate::app::errors;

/// Run the permission pipeline for one login and return the token mutations.
pub async fn post_login(
    State(state): State<AppState>,
    payload: Result<Json<PostLoginEvent>, JsonRejection>,
) -> Response {
    let Json(event) = match payload {
        Ok(p) => p,
        Err(rejection) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_event", rejection.body_text());
        }
    };

    let ctx = match event.into_context(state.credentials.clone(), state.debug) {
        Ok(ctx) => ctx,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_event", e.to_string()),
    };

    let span = invocation_span(InvocationId::new(), ctx.user_id.as_str());
    let mut claims = RecordedClaims::new();

    let result = tokio::time::timeout(state.timeout, state.publisher.publish(&ctx, &mut claims))
        .instrument(span.clone())
        .await;

    span.in_scope(|| match result {
        Err(_elapsed) => {
            tracing::warn!(timeout_ms = state.timeout.as_millis() as u64, "post-login timed out");
            errors::timeout_response()
        }
        Ok(Err(e)) => {
            tracing::warn!(kind = e.kind(), error = %e, "post-login failed");
            errors::publish_error_to_response(&e)
        }
        Ok(Ok(PublishOutcome::Skipped)) => Json(PostLoginResponse::default()).into_response(),
        Ok(Ok(PublishOutcome::Published(_))) => Json(PostLoginResponse::from(claims)).into_response(),
    })
}
