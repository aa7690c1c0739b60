use anyhow::{Context, Result};
use authority_explorer::config::Config;
use authority_explorer::dashboard::Dashboard;
use authority_explorer::data::{Dataset, DatasetKind};
use authority_explorer::logging::{log_lifecycle, log_load_failed};
use authority_explorer::server;
use std::path::Path;

fn load(kind: DatasetKind, path: &Path) -> Result<Dataset> {
    Dataset::load(kind, path).map_err(|err| {
        log_load_failed(kind.slug(), &err.to_string());
        anyhow::Error::new(err)
    })
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    let addr = cfg.socket_addr()?;

    // Both tables are read once; a missing or malformed file aborts startup.
    let merged = load(DatasetKind::Merged, &cfg.merged_csv)?;
    let oflog = load(DatasetKind::Oflog, &cfg.oflog_csv)?;
    let dashboard = Dashboard::new(merged, oflog);

    let app = server::router(dashboard, &cfg.assets_dir);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {}", addr))?;
    log_lifecycle("startup", &format!("listening on http://{}", addr));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    log_lifecycle("shutdown", "server stopped");
    Ok(())
}
