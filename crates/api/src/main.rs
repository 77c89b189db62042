use anyhow::Result;
use sift_api::{build_app, Settings};
use sift_observability::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("sift_api");

    let settings = Settings::from_env();
    let app = build_app(&settings)?;

    let listener = tokio::net::TcpListener::bind(&settings.bind).await?;
    tracing::info!(
        bind = %settings.bind,
        model = %settings.analyzer.model,
        inference = settings.workers_ai.is_some(),
        "sift analysis api started"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
