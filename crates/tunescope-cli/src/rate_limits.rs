// SPDX-License-Identifier: GPL-3.0-or-later
//! Rate-limit probing and response-structure analysis.

use std::time::Duration;

use chrono::Local;
use serde_json::Value;
use tracing::warn;
use tunescope_config::ExplorationConfig;
use tunescope_spotify::SpotifyClient;

use crate::report::{banner, describe_failure, format_count, items_at, preview, str_at, u64_at};
use crate::request_log::{LogSummary, RequestLog};

const WIDTH: usize = 70;

/// Artist searches issued while probing, with what each one is for.
pub const PROBE_QUERIES: [(&str, &str); 5] = [
    ("Taylor Swift", "Popular artist search"),
    ("The Beatles", "Classic artist search"),
    ("Billie Eilish", "Modern artist search"),
    ("Drake", "Hip-hop artist search"),
    ("Adele", "Another popular artist"),
];

const ARTIST_FIELDS: [(&str, &str); 6] = [
    ("id", "Unique Spotify identifier"),
    ("name", "Artist name"),
    ("popularity", "Score 0-100 of current popularity"),
    ("followers", "Number of followers (nested object)"),
    ("genres", "List of associated genres"),
    ("images", "Artist photos/artwork"),
];

const PLAYLIST_FIELDS: [(&str, &str); 7] = [
    ("id", "Unique playlist identifier"),
    ("name", "Playlist name"),
    ("description", "Playlist description"),
    ("followers", "Number of followers"),
    ("tracks", "Track count and link to tracks"),
    ("owner", "Playlist creator info"),
    ("public", "Whether playlist is public"),
];

const TRACK_FIELDS: [(&str, &str); 8] = [
    ("id", "Unique track identifier"),
    ("name", "Song title"),
    ("popularity", "Score 0-100 of current popularity"),
    ("artists", "List of artists (with their own data)"),
    ("album", "Album information (nested object)"),
    ("duration_ms", "Song length in milliseconds"),
    ("explicit", "Whether song has explicit content"),
    ("preview_url", "Link to 30-second preview"),
];

pub struct RateLimitAnalyzer<'a> {
    client: &'a SpotifyClient,
    config: &'a ExplorationConfig,
    pub log: RequestLog,
}

impl<'a> RateLimitAnalyzer<'a> {
    pub fn new(client: &'a SpotifyClient, config: &'a ExplorationConfig) -> Self {
        Self {
            client,
            config,
            log: RequestLog::new(),
        }
    }

    /// Probe, analyse, print the strategy and save the request log.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        let delay = Duration::from_millis(self.config.request_delay_ms);

        self.probe().await;
        tokio::time::sleep(delay).await;

        self.analyze_structure().await;
        tokio::time::sleep(delay).await;

        print_strategy();

        if let Some(path) = self.log.save(&self.config.output_dir, Local::now())? {
            println!(
                "\nRequest log with {} entries saved to '{}'",
                self.log.entries().len(),
                path.display()
            );
        }

        banner("ANALYSIS COMPLETE!", WIDTH);
        Ok(())
    }

    /// GET through the tracked path, logging every exchange that got a
    /// response.
    async fn tracked(
        &mut self,
        description: &str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Option<Value> {
        let tracked = self.client.get_tracked(path, query).await;

        if let Some(record) = tracked.record {
            self.log.push(description, record);
        }

        match tracked.outcome {
            Ok(body) => Some(body),
            Err(error) => {
                warn!(target: "cli", %path, %error, "tracked request failed");
                println!("   {}", describe_failure(&error));
                None
            }
        }
    }

    pub async fn probe(&mut self) -> Option<LogSummary> {
        banner("UNDERSTANDING SPOTIFY RATE LIMITS", WIDTH);
        println!("\nMaking several search requests to observe patterns...");

        let pause = Duration::from_millis(self.config.probe_delay_ms);
        for (query, description) in PROBE_QUERIES {
            let data = self
                .tracked(
                    description,
                    "/search",
                    &[("q", query), ("type", "artist"), ("limit", "1")],
                )
                .await;

            if let Some(artist) = data
                .as_ref()
                .and_then(|data| items_at(data, "/artists/items").into_iter().next())
            {
                println!(
                    "   Found: {} ({} followers)",
                    str_at(artist, "/name").unwrap_or("Unknown"),
                    format_count(u64_at(artist, "/followers/total").unwrap_or(0))
                );
            }

            tokio::time::sleep(pause).await;
        }

        let summary = self.log.summary();
        println!("\nRequest Analysis:");
        match summary {
            Some(summary) => {
                println!("   Total requests made: {}", summary.total);
                println!("   Successful requests: {}", summary.successful);
                println!("   Success rate: {:.1}%", summary.success_rate());
                println!("   Average response time: {:.1}ms", summary.average_response_ms);
                if summary.rate_limited > 0 {
                    println!("   Rate limited {} times", summary.rate_limited);
                } else {
                    println!("   No rate limiting encountered");
                }
            }
            None => println!("   No responses received"),
        }
        summary
    }

    pub async fn analyze_structure(&mut self) {
        banner("ANALYZING DATA STRUCTURE", WIDTH);

        println!("\n1. ARTIST DATA STRUCTURE:");
        if let Some(data) = self
            .tracked(
                "Artist structure analysis",
                "/search",
                &[("q", "Taylor Swift"), ("type", "artist"), ("limit", "1")],
            )
            .await
        {
            if let Some(artist) = items_at(&data, "/artists/items").into_iter().next() {
                print_fields(artist, &ARTIST_FIELDS);
            }
        }

        println!("\n2. PLAYLIST DATA STRUCTURE:");
        if let Some(data) = self
            .tracked(
                "Playlist structure analysis",
                "/search",
                &[("q", "Today's Top Hits"), ("type", "playlist"), ("limit", "1")],
            )
            .await
        {
            if let Some(playlist) = items_at(&data, "/playlists/items").into_iter().next() {
                print_fields(playlist, &PLAYLIST_FIELDS);
            }
        }

        println!("\n3. TRACK DATA STRUCTURE:");
        if let Some(data) = self
            .tracked(
                "Track structure analysis",
                "/search",
                &[("q", "Anti-Hero Taylor Swift"), ("type", "track"), ("limit", "1")],
            )
            .await
        {
            if let Some(track) = items_at(&data, "/tracks/items").into_iter().next() {
                print_fields(track, &TRACK_FIELDS);
            }
        }
    }
}

fn print_fields(object: &Value, fields: &[(&str, &str)]) {
    println!("   Key fields available:");
    for (field, description) in fields {
        if let Some(line) = describe_field(object, field) {
            println!("   - {field}: {line} - {description}");
        }
    }
}

/// Short rendering of one field of an artist, playlist or track object.
/// `None` when the field is absent or null.
pub fn describe_field(object: &Value, field: &str) -> Option<String> {
    let value = object.get(field).filter(|value| !value.is_null())?;

    let line = match field {
        "followers" => format!(
            "{} followers",
            format_count(u64_at(value, "/total").unwrap_or(0))
        ),
        "tracks" => format!("{} tracks", u64_at(value, "/total").unwrap_or(0)),
        "owner" => str_at(value, "/display_name").unwrap_or("Unknown").to_string(),
        "images" => format!("{} images available", items_at(value, "").len()),
        "description" => format!("'{}'", preview(value.as_str().unwrap_or(""), 50)),
        "artists" => {
            let names: Vec<&str> = items_at(value, "")
                .into_iter()
                .filter_map(|artist| str_at(artist, "/name"))
                .collect();
            format!("{names:?}")
        }
        "album" => format!(
            "'{}' ({})",
            str_at(value, "/name").unwrap_or("Unknown"),
            str_at(value, "/release_date").unwrap_or("unknown date")
        ),
        "duration_ms" => format!("{:.1} seconds", value.as_f64().unwrap_or(0.0) / 1000.0),
        _ => match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        },
    };
    Some(line)
}

pub fn print_strategy() {
    banner("DATA COLLECTION STRATEGY", WIDTH);

    println!("\n1. RATE LIMIT STRATEGY:");
    for line in [
        "Make requests every 0.5-1 seconds",
        "Batch requests in groups (e.g., 50 requests, then pause)",
        "Check for 429 status codes and respect Retry-After headers",
        "Log all requests to monitor usage patterns",
    ] {
        println!("   - {line}");
    }

    println!("\n2. DATA COLLECTION PRIORITY ORDER:");
    let steps = [
        ("Categories", "Get all available playlist categories", "Low effort, high value"),
        ("Playlists by Category", "Find popular playlists in each category", "Core data source"),
        ("Playlist Details", "Get full details for each playlist", "Essential metadata"),
        ("Track Lists", "Get all tracks from selected playlists", "Primary analysis data"),
        ("Artist Info", "Get details for artists in your dataset", "Enrichment data"),
        ("Audio Features", "Get musical characteristics", "Analysis gold mine"),
    ];
    for (i, (name, description, value)) in steps.iter().enumerate() {
        println!("   {}. {name}: {description} ({value})", i + 1);
    }

    println!("\n3. RECOMMENDED SAMPLE SIZES:");
    for (kind, size, rationale) in [
        ("Categories", "All available (~20)", "Complete coverage"),
        ("Playlists per category", "10-20 popular ones", "Good representation"),
        ("Tracks per playlist", "All tracks", "Complete playlist picture"),
        ("Total playlists", "200-400", "Manageable but comprehensive"),
        ("Total tracks", "5,000-10,000", "Statistically significant"),
    ] {
        println!("   - {kind}: {size} ({rationale})");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tunescope_spotify::Credentials;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_describe_field() {
        let track = json!({
            "name": "Anti-Hero",
            "duration_ms": 200690,
            "explicit": false,
            "preview_url": null,
            "artists": [{ "name": "Taylor Swift" }],
            "album": { "name": "Midnights", "release_date": "2022-10-21" }
        });

        assert_eq!(describe_field(&track, "name").as_deref(), Some("Anti-Hero"));
        assert_eq!(
            describe_field(&track, "duration_ms").as_deref(),
            Some("200.7 seconds")
        );
        assert_eq!(describe_field(&track, "explicit").as_deref(), Some("false"));
        assert_eq!(describe_field(&track, "preview_url"), None);
        assert_eq!(
            describe_field(&track, "artists").as_deref(),
            Some(r#"["Taylor Swift"]"#)
        );
        assert_eq!(
            describe_field(&track, "album").as_deref(),
            Some("'Midnights' (2022-10-21)")
        );

        let artist = json!({ "followers": { "total": 12345 }, "images": [{}, {}] });
        assert_eq!(
            describe_field(&artist, "followers").as_deref(),
            Some("12,345 followers")
        );
        assert_eq!(
            describe_field(&artist, "images").as_deref(),
            Some("2 images available")
        );
    }

    #[tokio::test]
    async fn test_probe_logs_every_response() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "access_token": "abc" })),
            )
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .and(query_param("q", "Drake"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "3"))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("X-RateLimit-Remaining", "10")
                    .set_body_json(json!({
                        "artists": { "items": [{ "name": "Someone", "followers": { "total": 5 } }] }
                    })),
            )
            .mount(&mock_server)
            .await;

        let mut client = SpotifyClient::builder(Credentials::new("id", "secret"))
            .token_url(format!("{}/api/token", mock_server.uri()))
            .base_url(format!("{}/v1", mock_server.uri()))
            .build()
            .unwrap();
        client.authenticate().await.unwrap();

        let config = ExplorationConfig {
            probe_delay_ms: 0,
            ..Default::default()
        };
        let mut analyzer = RateLimitAnalyzer::new(&client, &config);

        let summary = analyzer.probe().await.unwrap();

        assert_eq!(summary.total, PROBE_QUERIES.len());
        assert_eq!(summary.successful, 4);
        assert_eq!(summary.rate_limited, 1);

        let entries = analyzer.log.entries();
        assert_eq!(entries[3].description, "Hip-hop artist search");
        assert_eq!(
            entries[3].record.rate_limit_headers.retry_after.as_deref(),
            Some("3")
        );
        assert_eq!(
            entries[0].record.rate_limit_headers.remaining.as_deref(),
            Some("10")
        );
    }
}
