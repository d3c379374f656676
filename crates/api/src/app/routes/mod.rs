use axum::{Router, routing::post};

use crate::app::AppState;

pub mod actions;
pub mod system;

/// Router for all hook endpoints (secret-protected).
pub fn router() -> Router<AppState> {
    Router::new().route("/actions/post-login", post(actions::post_login))
}
