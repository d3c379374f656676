use std::sync::Arc;

use publish_scopes_infra::ServiceConfig;
use publish_scopes_infra::directory::ManagementClientFactory;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    publish_scopes_observability::init();

    let config = ServiceConfig::from_env()?;
    let directory = Arc::new(ManagementClientFactory::new()?);

    let app = publish_scopes_api::app::build_app(&config, directory);

    let listener = tokio::net::TcpListener::bind(config.bind).await?;

    tracing::info!(
        claim = %config.claim_name,
        debug = config.debug.is_enabled(),
        "listening on {}",
        listener.local_addr()?
    );

    axum::serve(listener, app).await?;
    Ok(())
}
