use anyhow::Context;

mod backend;
mod config;
mod routes;
mod telemetry;

use config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::load().context("Failed to load configuration")?;
    telemetry::init(config.log_format);

    let pipeline = backend::build_pipeline(&config).context("Failed to build pipeline")?;

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .with_context(|| {
            format!("Failed to create upload directory {}", config.upload_dir.display())
        })?;

    let state = routes::AppState::new(pipeline, &config);
    let app = routes::router(state, config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    tracing::info!(
        addr = %config.bind_addr,
        upload_dir = %config.upload_dir.display(),
        regions = config.regions.len(),
        "labeldate server listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
