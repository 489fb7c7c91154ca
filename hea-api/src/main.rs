//! hea-api - Home Energy Audit backend service
//!
//! Authenticates users via Google identity tokens, stores user profiles,
//! accepts leakage task submissions with photo evidence, and runs an
//! asynchronous (mocked) leak analysis per submission.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use hea_api::services::GoogleTokenVerifier;
use hea_api::AppState;

#[derive(Debug, Parser)]
#[command(name = "hea-api", about = "Home Energy Audit backend service")]
struct Args {
    /// Data directory (overrides HEA_DATA_DIR and the config file)
    #[arg(long)]
    data_dir: Option<String>,

    /// Socket address to bind (overrides the config file)
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    info!("Starting hea-api (Home Energy Audit backend)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = hea_common::config::resolve(args.data_dir.as_deref(), args.bind.as_deref());
    hea_common::config::ensure_data_dir(&config.data_dir)?;

    let db_path = config.database_path();
    info!("Database: {}", db_path.display());

    let db = hea_common::db::init_pool(&db_path).await?;
    hea_api::db::init_schema(&db).await?;
    info!("Database connection established");

    let state = AppState::new(
        db,
        Arc::new(GoogleTokenVerifier::new()),
        Duration::from_millis(config.analysis_delay_ms),
    );

    let app = hea_api::build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!("Listening on http://{}", config.bind_address);
    info!("Health check: http://{}/health", config.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
