use anyhow::Context;
use foodgram_server::config::Config;
use foodgram_server::media::MediaStore;
use foodgram_server::telemetry::init_telemetry;
use foodgram_server::{api, app, db, AppState};
use std::env;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Check for --openapi flag to dump spec and exit
    if env::args().any(|arg| arg == "--openapi") {
        println!("{}", api::openapi().to_pretty_json()?);
        return Ok(());
    }

    init_telemetry();

    let config = Config::load()?;

    let pool = db::create_pool(&config.database_url)?;

    std::fs::create_dir_all(&config.media_root).with_context(|| {
        format!(
            "failed to create media directory {}",
            config.media_root.display()
        )
    })?;

    let state = AppState {
        pool: Arc::new(pool),
        media: Arc::new(MediaStore::new(&config.media_root, &config.media_url)),
        session_ttl_days: config.session_ttl_days,
    };

    let router = app(state, &config.media_url);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);
    tracing::info!("OpenAPI spec available at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, router).await?;
    Ok(())
}
