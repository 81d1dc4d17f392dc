// SPDX-License-Identifier: GPL-3.0-or-later
use std::path::{Path, PathBuf};

use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Conventional environment variables holding the application credentials.
pub const CLIENT_ID_VAR: &str = "SPOTIFY_CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "SPOTIFY_CLIENT_SECRET";

const ENV_PREFIX: &str = "TUNESCOPE_";
const CREDENTIAL_KEYS: [&str; 2] = ["spotify.client_id", "spotify.client_secret"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub token_url: String,
    pub api_base_url: String,
    pub timeout_secs: u64,
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            token_url: "https://accounts.spotify.com/api/token".to_string(),
            api_base_url: "https://api.spotify.com/v1".to_string(),
            timeout_secs: 30,
        }
    }
}

impl SpotifyConfig {
    /// Client id and secret, when both are set and non-blank.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let id = self.client_id.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        let secret = self
            .client_secret
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())?;
        Some((id, secret))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplorationConfig {
    /// Pause between narrated exploration sections.
    pub request_delay_ms: u64,
    /// Pause between rate-limit probe requests.
    pub probe_delay_ms: u64,
    pub market: String,
    /// Where request logs and sample payloads are written.
    pub output_dir: PathBuf,
    pub save_samples: bool,
    pub featured_playlist_id: String,
}

impl Default for ExplorationConfig {
    fn default() -> Self {
        Self {
            request_delay_ms: 1000,
            probe_delay_ms: 500,
            market: "US".to_string(),
            output_dir: PathBuf::from("."),
            save_samples: false,
            // Today's Top Hits
            featured_playlist_id: "37i9dQZF1DXcBWIGoYBM5M".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub spotify: SpotifyConfig,
    pub telemetry: TelemetryConfig,
    pub exploration: ExplorationConfig,
}

/// Load a `.env` file from the working directory (or a parent), if any.
///
/// Existing environment variables are never overridden.
pub fn load_dotenv() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

/// Load configuration from defaults, optional TOML file, `SPOTIFY_CLIENT_ID`/
/// `SPOTIFY_CLIENT_SECRET`, and environment overrides (prefix: TUNESCOPE_).
pub fn load(config_path: Option<&Path>) -> Result<AppConfig> {
    let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

    if let Some(path) = config_path {
        figment = figment.merge(Toml::file(path));
    }

    // Credentials are merged as plain strings: generated ids can look numeric.
    let [id_key, secret_key] = CREDENTIAL_KEYS;
    figment = merge_raw_env(figment, CLIENT_ID_VAR, id_key);
    figment = merge_raw_env(figment, CLIENT_SECRET_VAR, secret_key);

    figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__").ignore(&CREDENTIAL_KEYS));
    figment = merge_raw_env(figment, &format!("{ENV_PREFIX}SPOTIFY__CLIENT_ID"), id_key);
    figment = merge_raw_env(figment, &format!("{ENV_PREFIX}SPOTIFY__CLIENT_SECRET"), secret_key);

    Ok(figment.extract()?)
}

fn merge_raw_env(figment: Figment, var: &str, key: &str) -> Figment {
    match std::env::var(var) {
        Ok(value) => figment.merge(Serialized::default(key, value)),
        Err(_) => figment,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults() {
        Jail::expect_with(|_jail| {
            let config = load(None).map_err(|e| e.to_string())?;

            assert_eq!(config.spotify.token_url, "https://accounts.spotify.com/api/token");
            assert_eq!(config.spotify.api_base_url, "https://api.spotify.com/v1");
            assert_eq!(config.spotify.timeout_secs, 30);
            assert_eq!(config.telemetry.log_level, "info");
            assert_eq!(config.exploration.request_delay_ms, 1000);
            assert_eq!(config.exploration.probe_delay_ms, 500);
            assert!(!config.exploration.save_samples);
            Ok(())
        });
    }

    #[test]
    fn test_spotify_env_credentials() {
        Jail::expect_with(|jail| {
            jail.set_env(CLIENT_ID_VAR, "0123456789");
            jail.set_env(CLIENT_SECRET_VAR, "shh");

            let config = load(None).map_err(|e| e.to_string())?;

            assert_eq!(config.spotify.client_id.as_deref(), Some("0123456789"));
            assert_eq!(config.spotify.credentials(), Some(("0123456789", "shh")));
            Ok(())
        });
    }

    #[test]
    fn test_prefixed_credentials_stay_strings() {
        Jail::expect_with(|jail| {
            jail.set_env(CLIENT_ID_VAR, "from-spotify-var");
            jail.set_env("TUNESCOPE_SPOTIFY__CLIENT_ID", "0123456789");
            jail.set_env("TUNESCOPE_SPOTIFY__CLIENT_SECRET", "000042");

            let config = load(None).map_err(|e| e.to_string())?;

            assert_eq!(config.spotify.client_id.as_deref(), Some("0123456789"));
            assert_eq!(config.spotify.client_secret.as_deref(), Some("000042"));
            Ok(())
        });
    }

    #[test]
    fn test_toml_file_and_prefixed_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "tunescope.toml",
                r#"
                [spotify]
                client_id = "from-file"
                client_secret = "file-secret"
                timeout_secs = 5

                [exploration]
                market = "GB"
                save_samples = true
                "#,
            )?;
            jail.set_env("TUNESCOPE_EXPLORATION__MARKET", "SE");

            let config = load(Some(Path::new("tunescope.toml"))).map_err(|e| e.to_string())?;

            assert_eq!(config.spotify.client_id.as_deref(), Some("from-file"));
            assert_eq!(config.spotify.timeout_secs, 5);
            assert_eq!(config.exploration.market, "SE");
            assert!(config.exploration.save_samples);
            Ok(())
        });
    }

    #[test]
    fn test_blank_credentials_are_missing() {
        let config = SpotifyConfig {
            client_id: Some("id".to_string()),
            client_secret: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(config.credentials(), None);
        assert_eq!(SpotifyConfig::default().credentials(), None);
    }
}
