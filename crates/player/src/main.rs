//! Argonvale Player - composition root binary.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use argonvale_player::config::PlayerConfig;
use argonvale_player::infrastructure::file_maps::FileZoneMapSource;
use argonvale_player::infrastructure::http_client::HttpApiClient;
use argonvale_player::infrastructure::storage::DesktopPositionStore;
use argonvale_player::ports::outbound::ZoneMapPort;
use argonvale_player::runner::{run, RunnerDeps};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is normal outside development.
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "argonvale_player=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Argonvale Player");

    let config = PlayerConfig::from_env()?;
    tracing::debug!(ws = %config.ws_url, api = %config.api_url, "configuration loaded");

    // HTTP
    let api = Arc::new(HttpApiClient::new(config.api_url.clone(), config.token.clone()));

    let maps: Arc<dyn ZoneMapPort> = match &config.maps_dir {
        Some(dir) => {
            tracing::info!(dir = %dir.display(), "reading zone maps from disk");
            Arc::new(FileZoneMapSource::new(dir))
        }
        None => api.clone(),
    };

    run(RunnerDeps {
        config,
        messages: api,
        maps,
        positions: Arc::new(DesktopPositionStore::new()),
    })
    .await
}
