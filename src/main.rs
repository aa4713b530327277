//! Storehub server entry point.

use anyhow::Result;
use dotenv::dotenv;
use storehub_backend::{build_router, AppState, Config};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_tracing();

    // Fails here, before anything binds, when JWT_SECRET is missing.
    let config = Config::from_env()?;

    let state = AppState::from_config(&config)?;
    info!(db_path = %config.db_path, "Stores initialized");

    let router = build_router(state);
    storehub_backend::app::serve(router, config.port).await
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storehub_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
