use std::path::Path;

use axum::Router;
use tower_http::services::ServeDir;

use crate::project::ServeSettings;

/// Static file router for a web root. `.br` and `.gz` siblings are served in
/// place of the original when the client accepts that encoding.
pub fn router(root: &Path) -> Router {
    let files = ServeDir::new(root)
        .append_index_html_on_directories(true)
        .precompressed_br()
        .precompressed_gzip();
    Router::new().fallback_service(files)
}

pub async fn run(settings: ServeSettings) -> anyhow::Result<()> {
    let addr = format!("{}:{}", settings.host, settings.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("Serving {} at http://{addr}/", settings.root.display());

    axum::serve(listener, router(&settings.root))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to install CTRL+C handler: {e}");
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown signal received");
}
