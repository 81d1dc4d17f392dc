// SPDX-License-Identifier: GPL-3.0-or-later
//! Credential and connectivity check.

use anyhow::{bail, Result};
use tunescope_config::{SpotifyConfig, CLIENT_ID_VAR, CLIENT_SECRET_VAR};

use crate::report::{describe_failure, format_count, items_at, mask, str_at, u64_at};

/// Console lines describing which credentials are configured.
pub fn credential_report(config: &SpotifyConfig) -> Vec<String> {
    let describe = |label: &str, var: &str, value: Option<&str>| match value
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        Some(value) => format!("{label} found: {}", mask(value)),
        None => format!("{label} not found! Set {var} or add it to your .env file"),
    };

    vec![
        describe("Client ID", CLIENT_ID_VAR, config.client_id.as_deref()),
        describe(
            "Client Secret",
            CLIENT_SECRET_VAR,
            config.client_secret.as_deref(),
        ),
    ]
}

pub async fn run(config: &SpotifyConfig) -> Result<()> {
    println!("Testing Spotify API setup...");
    for line in credential_report(config) {
        println!("{line}");
    }

    if config.credentials().is_none() {
        bail!("cannot test connection - missing credentials");
    }

    println!("Attempting to connect to Spotify API...");
    let mut client = crate::build_client(config)?;

    if let Err(error) = client.authenticate().await {
        println!("Failed to connect to Spotify API: {error}");
        println!("Troubleshooting tips:");
        println!("- Double-check your Client ID and Client Secret");
        println!("- Make sure there are no extra spaces in your .env file");
        println!("- Verify your Spotify app is created properly");
        return Err(error.into());
    }
    println!("SUCCESS: Connected to Spotify API!");

    println!("Testing artist search...");
    match client
        .get(
            "/search",
            &[("q", "Taylor Swift"), ("type", "artist"), ("limit", "1")],
        )
        .await
    {
        Ok(data) => {
            let artist = items_at(&data, "/artists/items").into_iter().next();
            match artist {
                Some(artist) => {
                    println!("Successfully retrieved artist data!");
                    println!("Artist: {}", str_at(artist, "/name").unwrap_or("Unknown"));
                    println!(
                        "Followers: {}",
                        format_count(u64_at(artist, "/followers/total").unwrap_or(0))
                    );
                }
                None => println!("Search succeeded but returned no artists"),
            }
            println!("Everything is working!");
            Ok(())
        }
        Err(error) => {
            println!("{}", describe_failure(&error));
            Err(error.into())
        }
    }
}
