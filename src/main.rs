use std::net::SocketAddr;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use vidshare::config::{Cli, Config};
use vidshare::state::AppState;
use vidshare::{db, media, routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse CLI args and load config
    let cli = Cli::parse();
    let data_dir = Config::data_dir(&cli);
    std::fs::create_dir_all(&data_dir)?;
    tracing::info!("Data directory: {}", data_dir.display());

    let config = Config::load(&cli)?;

    // Media and upload spool directories
    std::fs::create_dir_all(config.media_path())?;
    std::fs::create_dir_all(config.temp_path())?;

    // Initialize database
    let pool = db::create_pool(&config.db_path())?;
    db::run_migrations(&pool)?;

    let store = media::from_config(&config)?;
    tracing::info!("Media provider: {:?}", config.media.provider);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let state = AppState::new(pool, config, store);
    let app = routes::app(state)?;

    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
