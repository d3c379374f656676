//! Router construction for the post-login hook service.

use std::sync::Arc;
use std::time::Duration;

use axum::{Router, routing::get};
use tower::ServiceBuilder;

use publish_scopes_infra::directory::{DirectoryCredentials, DirectoryFactory};
use publish_scopes_infra::{DebugFlag, ScopePublisher, ServiceConfig};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;

pub type SharedPublisher = Arc<ScopePublisher<Arc<dyn DirectoryFactory>>>;

/// Per-process state shared by every hook invocation.
#[derive(Clone)]
pub struct AppState {
    pub publisher: SharedPublisher,
    pub credentials: DirectoryCredentials,
    pub debug: DebugFlag,
    /// Execution budget for one invocation, directory calls included.
    pub timeout: Duration,
}

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(config: &ServiceConfig, directory: Arc<dyn DirectoryFactory>) -> Router {
    let publisher =
        ScopePublisher::new(directory).with_claim_name(config.claim_name.clone());

    let state = AppState {
        publisher: Arc::new(publisher),
        credentials: config.credentials.clone(),
        debug: config.debug,
        timeout: config.timeout,
    };

    let hook_auth = middleware::HookAuthState::new(config.hook_secret());

    // Hook routes: require the shared hook secret.
    let hooks = routes::router().with_state(state).layer(
        ServiceBuilder::new().layer(axum::middleware::from_fn_with_state(
            hook_auth,
            middleware::hook_auth_middleware,
        )),
    );

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(hooks)
}
