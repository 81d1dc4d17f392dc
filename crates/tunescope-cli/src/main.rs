// SPDX-License-Identifier: GPL-3.0-or-later
mod args;
mod check;
mod explore;
mod rate_limits;
mod report;
mod request_log;
mod samples;

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use args::{Args, Command};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tunescope_config::{load as load_config, load_dotenv, SpotifyConfig};
use tunescope_spotify::{Credentials, SpotifyClient};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse(std::env::args().skip(1))?;

    let dotenv_path = load_dotenv();
    let config = load_config(args.config_path.as_deref())?;
    init_tracing(&config.telemetry.log_level);

    if let Some(path) = dotenv_path {
        info!(target: "cli", path = %path.display(), "loaded .env");
    }
    info!(target: "cli", command = ?args.command, "configuration loaded");

    match args.command {
        Command::Check => check::run(&config.spotify).await,
        Command::Explore => {
            let client = authenticated_client(&config.spotify).await?;
            explore::Explorer::new(&client, &config.exploration).run().await;
            Ok(())
        }
        Command::RateLimits => {
            let client = authenticated_client(&config.spotify).await?;
            rate_limits::RateLimitAnalyzer::new(&client, &config.exploration)
                .run()
                .await
        }
    }
}

fn init_tracing(default_level: &str) {
    let fmt_layer = fmt::layer().with_target(true).with_level(true);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

/// Build an unauthenticated client from configuration.
pub(crate) fn build_client(config: &SpotifyConfig) -> Result<SpotifyClient> {
    let (client_id, client_secret) = config
        .credentials()
        .ok_or_else(|| anyhow!("missing Spotify credentials"))
        .context("set SPOTIFY_CLIENT_ID and SPOTIFY_CLIENT_SECRET")?;

    let client = SpotifyClient::builder(Credentials::new(client_id, client_secret))
        .token_url(&config.token_url)
        .base_url(&config.api_base_url)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

async fn authenticated_client(config: &SpotifyConfig) -> Result<SpotifyClient> {
    let mut client = build_client(config)?;
    client
        .authenticate()
        .await
        .context("cannot proceed without access token")?;
    info!(target: "cli", "access token obtained");
    Ok(client)
}
