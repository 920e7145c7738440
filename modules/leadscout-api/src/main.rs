use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use leadscout_api::{router, AppState};
use leadscout_common::Config;
use leadscout_scout::build_services;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive("leadscout=info".parse()?)
        .add_directive("provider_client=info".parse()?);
    if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config = Config::from_env()?;
    config.log_redacted();

    let services = build_services(&config)
        .await
        .context("Failed to build lead discovery services")?;
    let state = Arc::new(AppState::from_services(&services));
    let app = router(state);

    let addr = format!("{}:{}", config.api_host, config.api_port);
    info!("Lead discovery API starting on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    services.shutdown().await;
    Ok(())
}
