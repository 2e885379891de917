use std::path::Path;
use std::sync::Arc;

use sylva_query::config::Settings;
use sylva_query::interface::GraphRegistry;
use sylva_query::server;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!(error = %e, "sylva-query stopped");
        eprintln!("{e}");
        std::process::exit(1);
    }
}

async fn run() -> sylva_query::Result<()> {
    let config_path = std::env::var("SYLVA_CONFIG").ok();
    let settings = Settings::load(config_path.as_deref())?;

    // RUST_LOG wins over the configured filter
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log.filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let registry = Arc::new(GraphRegistry::new(settings.query.max_length));
    let loaded = registry.load_directory(Path::new(&settings.schemas.directory))?;
    info!(graphs = loaded, directory = %settings.schemas.directory, "schemas loaded");

    let listener = tokio::net::TcpListener::bind(&settings.server.bind).await?;
    info!(bind = %settings.server.bind, "listening");
    axum::serve(listener, server::router(registry)).await?;
    Ok(())
}
