use std::path::PathBuf;

use grid_server::routes;
use grid_server::startup::{build_state, load_config, seed_store};
use grid_store::MemoryStore;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config_path = PathBuf::from(
        std::env::var("GRID_TABLE_CONFIG").unwrap_or_else(|_| "/etc/grid/table.json".into()),
    );
    let addr = std::env::var("GRID_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into());

    let config = load_config(&config_path).unwrap_or_else(|e| {
        eprintln!("{e}");
        std::process::exit(1);
    });

    let store = MemoryStore::new();
    if let Ok(seed) = std::env::var("GRID_SEED") {
        if let Err(e) = seed_store(&store, &config.collection, &PathBuf::from(seed)) {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }

    let collection = config.collection.clone();
    let shutdown = CancellationToken::new();
    let state = build_state(config, store, shutdown.clone()).unwrap_or_else(|e| {
        eprintln!("{e}");
        std::process::exit(1);
    });
    let app = routes::router().with_state(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            eprintln!("failed to bind {addr}: {e}");
            std::process::exit(1);
        });

    tracing::info!("grid-server listening on {addr} (table: {collection})");
    let serve = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal(shutdown));
    if let Err(e) = serve.await {
        tracing::error!(error = %e, "server error");
        std::process::exit(1);
    }
    tracing::info!("shutdown complete");
}

async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
    shutdown.cancel();
}
