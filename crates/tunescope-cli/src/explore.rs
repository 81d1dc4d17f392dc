// SPDX-License-Identifier: GPL-3.0-or-later
//! Guided walk through the catalog endpoints.

use std::time::Duration;

use serde_json::Value;
use tracing::{info, warn};
use tunescope_config::ExplorationConfig;
use tunescope_spotify::SpotifyClient;

use crate::report::{
    banner, describe_failure, f64_at, format_count, items_at, joined_at, names_at, preview,
    str_at, u64_at,
};
use crate::samples::save_sample;

const WIDTH: usize = 60;

/// What earlier sections discovered for later ones.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExplorationState {
    /// Set by the search section; the artist section needs it.
    pub artist_id: Option<String>,
}

pub struct Explorer<'a> {
    client: &'a SpotifyClient,
    config: &'a ExplorationConfig,
    pub state: ExplorationState,
}

impl<'a> Explorer<'a> {
    pub fn new(client: &'a SpotifyClient, config: &'a ExplorationConfig) -> Self {
        Self {
            client,
            config,
            state: ExplorationState::default(),
        }
    }

    /// Run every section in order, pausing between them.
    pub async fn run(&mut self) {
        let delay = Duration::from_millis(self.config.request_delay_ms);

        self.search().await;
        tokio::time::sleep(delay).await;

        self.artist().await;
        tokio::time::sleep(delay).await;

        self.playlist().await;
        tokio::time::sleep(delay).await;

        self.audio_features().await;
        tokio::time::sleep(delay).await;

        self.categories().await;

        banner("EXPLORATION COMPLETE!", WIDTH);
    }

    /// GET and report failures; saves the payload when samples are enabled.
    async fn fetch(&self, sample_name: &str, path: &str, query: &[(&str, &str)]) -> Option<Value> {
        match self.client.get(path, query).await {
            Ok(body) => {
                if self.config.save_samples {
                    match save_sample(&self.config.output_dir, sample_name, &body) {
                        Ok(saved) => println!("   Sample data saved to '{}'", saved.display()),
                        Err(error) => warn!(target: "cli", %error, "failed to save sample"),
                    }
                }
                Some(body)
            }
            Err(error) => {
                warn!(target: "cli", %path, %error, "request failed");
                println!("   {}", describe_failure(&error));
                None
            }
        }
    }

    pub async fn search(&mut self) {
        banner("EXPLORING SEARCH ENDPOINT", WIDTH);

        println!("\n1. Searching for 'Taylor Swift' (artist)...");
        let artists = self
            .fetch(
                "search_artist",
                "/search",
                &[("q", "Taylor Swift"), ("type", "artist"), ("limit", "1")],
            )
            .await;

        if let Some(artist) = artists
            .as_ref()
            .and_then(|data| items_at(data, "/artists/items").into_iter().next())
        {
            println!("   Found: {}", str_at(artist, "/name").unwrap_or("Unknown"));
            println!(
                "   Followers: {}",
                format_count(u64_at(artist, "/followers/total").unwrap_or(0))
            );
            println!("   Genres: {}", joined_at(artist, "/genres", 3));

            if let Some(id) = str_at(artist, "/id") {
                println!("   Spotify ID: {id}");
                self.state.artist_id = Some(id.to_string());
            }
        }

        println!("\n2. Searching for 'Top Hits' playlists...");
        let playlists = self
            .fetch(
                "search_playlist",
                "/search",
                &[("q", "top hits"), ("type", "playlist"), ("limit", "3")],
            )
            .await;

        if let Some(data) = playlists {
            let items = items_at(&data, "/playlists/items");
            println!("   Found {} playlists:", items.len());
            for (i, playlist) in items.into_iter().enumerate() {
                println!("   {}. {}", i + 1, str_at(playlist, "/name").unwrap_or("Unknown"));
                println!(
                    "      Followers: {}",
                    format_count(u64_at(playlist, "/followers/total").unwrap_or(0))
                );
                println!(
                    "      Tracks: {}",
                    u64_at(playlist, "/tracks/total").unwrap_or(0)
                );
                println!(
                    "      Description: {}",
                    preview(
                        str_at(playlist, "/description").unwrap_or("No description"),
                        50
                    )
                );
            }
        }
    }

    pub async fn artist(&mut self) {
        banner("EXPLORING ARTIST ENDPOINT", WIDTH);

        let Some(artist_id) = self.state.artist_id.clone() else {
            println!("Need to run search endpoint first to get artist ID");
            return;
        };

        println!("\n1. Getting detailed artist information...");
        if let Some(artist) = self
            .fetch("artist", &format!("/artists/{artist_id}"), &[])
            .await
        {
            println!("   Artist: {}", str_at(&artist, "/name").unwrap_or("Unknown"));
            println!(
                "   Followers: {}",
                format_count(u64_at(&artist, "/followers/total").unwrap_or(0))
            );
            println!(
                "   Popularity Score: {}/100",
                u64_at(&artist, "/popularity").unwrap_or(0)
            );
            println!("   Genres: {}", joined_at(&artist, "/genres", usize::MAX));
        }

        println!("\n2. Getting artist's top tracks...");
        if let Some(data) = self
            .fetch(
                "top_tracks",
                &format!("/artists/{artist_id}/top-tracks"),
                &[("market", self.config.market.as_str())],
            )
            .await
        {
            let tracks = items_at(&data, "/tracks");
            println!("   Found {} top tracks:", tracks.len());
            for (i, track) in tracks.into_iter().take(5).enumerate() {
                println!("   {}. {}", i + 1, str_at(track, "/name").unwrap_or("Unknown"));
                println!(
                    "      Album: {}",
                    str_at(track, "/album/name").unwrap_or("Unknown Album")
                );
                println!(
                    "      Popularity: {}/100",
                    u64_at(track, "/popularity").unwrap_or(0)
                );
            }
        }
    }

    pub async fn playlist(&mut self) {
        banner("EXPLORING PLAYLIST ENDPOINT", WIDTH);
        let playlist_id = self.config.featured_playlist_id.clone();

        println!("\n1. Getting playlist details...");
        if let Some(playlist) = self
            .fetch("playlist", &format!("/playlists/{playlist_id}"), &[])
            .await
        {
            println!("   Playlist: {}", str_at(&playlist, "/name").unwrap_or("Unknown"));
            println!(
                "   Followers: {}",
                format_count(u64_at(&playlist, "/followers/total").unwrap_or(0))
            );
            println!(
                "   Total Tracks: {}",
                u64_at(&playlist, "/tracks/total").unwrap_or(0)
            );
            println!(
                "   Description: {}",
                preview(str_at(&playlist, "/description").unwrap_or(""), 100)
            );
            println!(
                "   Owner: {}",
                str_at(&playlist, "/owner/display_name").unwrap_or("Unknown")
            );
        }

        println!("\n2. Getting playlist tracks (first 5)...");
        if let Some(data) = self
            .fetch(
                "playlist_tracks",
                &format!("/playlists/{playlist_id}/tracks"),
                &[("limit", "5")],
            )
            .await
        {
            println!("   Found tracks:");
            let tracks = items_at(&data, "/items")
                .into_iter()
                .filter_map(|item| item.get("track").filter(|track| !track.is_null()));
            for (i, track) in tracks.enumerate() {
                println!(
                    "   {}. {} by {}",
                    i + 1,
                    str_at(track, "/name").unwrap_or("Unknown Track"),
                    names_at(track, "/artists")
                );
                println!(
                    "      Popularity: {}/100",
                    u64_at(track, "/popularity").unwrap_or(0)
                );
                println!(
                    "      Album: {}",
                    str_at(track, "/album/name").unwrap_or("Unknown Album")
                );
            }
        }
    }

    pub async fn audio_features(&mut self) {
        banner("EXPLORING AUDIO FEATURES ENDPOINT", WIDTH);

        println!("\n1. Getting a track to analyze...");
        let Some(search) = self
            .fetch(
                "search_track",
                "/search",
                &[("q", "Anti-Hero Taylor Swift"), ("type", "track"), ("limit", "1")],
            )
            .await
        else {
            return;
        };

        let Some(track) = items_at(&search, "/tracks/items").into_iter().next() else {
            println!("   No track found");
            return;
        };
        let Some(track_id) = str_at(track, "/id") else {
            return;
        };

        println!(
            "   Found track: {} by {}",
            str_at(track, "/name").unwrap_or("Unknown"),
            str_at(track, "/artists/0/name").unwrap_or("Unknown")
        );

        println!("\n2. Getting audio features...");
        let Some(features) = self
            .fetch("audio_features", &format!("/audio-features/{track_id}"), &[])
            .await
        else {
            return;
        };

        println!("   Audio Features Analysis:");
        for (label, key) in [
            ("Danceability", "danceability"),
            ("Energy", "energy"),
            ("Speechiness", "speechiness"),
            ("Acousticness", "acousticness"),
            ("Valence (mood)", "valence"),
        ] {
            if let Some(value) = f64_at(&features, &format!("/{key}")) {
                println!("      {label}: {value:.3} (0-1 scale)");
            }
        }
        if let Some(loudness) = f64_at(&features, "/loudness") {
            println!("      Loudness: {loudness:.1} dB");
        }
        if let Some(tempo) = f64_at(&features, "/tempo") {
            println!("      Tempo: {tempo:.1} BPM");
        }
        if let Some(duration_ms) = f64_at(&features, "/duration_ms") {
            println!("      Duration: {:.1} seconds", duration_ms / 1000.0);
        }

        println!("\n   What this means for your analysis:");
        for line in interpret_features(&features) {
            println!("      - {line}");
        }
    }

    pub async fn categories(&mut self) {
        banner("EXPLORING CATEGORIES ENDPOINT", WIDTH);

        println!("\n1. Getting available playlist categories...");
        let Some(data) = self
            .fetch("categories", "/browse/categories", &[("limit", "20")])
            .await
        else {
            return;
        };

        let categories = items_at(&data, "/categories/items");
        println!("   Found {} categories:", categories.len());
        for (i, category) in categories.into_iter().enumerate() {
            println!(
                "   {:2}. {} (ID: {})",
                i + 1,
                str_at(category, "/name").unwrap_or("Unknown"),
                str_at(category, "/id").unwrap_or("?")
            );
        }

        println!("\n2. Getting playlists from 'Pop' category...");
        if let Some(pop) = self
            .fetch(
                "pop_playlists",
                "/browse/categories/pop/playlists",
                &[("limit", "5")],
            )
            .await
        {
            println!("   Pop playlists:");
            for (i, playlist) in items_at(&pop, "/playlists/items").into_iter().enumerate() {
                println!("   {}. {}", i + 1, str_at(playlist, "/name").unwrap_or("Unknown"));
                println!(
                    "      {} followers",
                    format_count(u64_at(playlist, "/followers/total").unwrap_or(0))
                );
            }
        }

        info!(target: "cli", "categories explored");
    }
}

/// Plain-language reading of a track's audio features.
pub fn interpret_features(features: &Value) -> Vec<&'static str> {
    let mut notes = Vec::new();
    let score = |key: &str| features.get(key).and_then(Value::as_f64).unwrap_or(0.0);

    if score("danceability") > 0.7 {
        notes.push("High danceability - good for party playlists");
    }
    if score("energy") > 0.7 {
        notes.push("High energy - good for workout playlists");
    }
    if score("valence") > 0.6 {
        notes.push("Positive mood - good for happy/upbeat playlists");
    } else {
        notes.push("Lower valence - might be more emotional/sad");
    }
    notes
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tunescope_spotify::Credentials;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn authenticated_client(mock_server: &MockServer) -> SpotifyClient {
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "access_token": "abc" })),
            )
            .mount(mock_server)
            .await;

        let mut client = SpotifyClient::builder(Credentials::new("id", "secret"))
            .token_url(format!("{}/api/token", mock_server.uri()))
            .base_url(format!("{}/v1", mock_server.uri()))
            .build()
            .unwrap();
        client.authenticate().await.unwrap();
        client
    }

    #[test]
    fn test_interpret_features() {
        let upbeat = json!({ "danceability": 0.8, "energy": 0.75, "valence": 0.9 });
        assert_eq!(
            interpret_features(&upbeat),
            vec![
                "High danceability - good for party playlists",
                "High energy - good for workout playlists",
                "Positive mood - good for happy/upbeat playlists",
            ]
        );

        let mellow = json!({ "danceability": 0.3, "energy": 0.2, "valence": 0.1 });
        assert_eq!(
            interpret_features(&mellow),
            vec!["Lower valence - might be more emotional/sad"]
        );
    }

    #[tokio::test]
    async fn test_search_remembers_artist_id() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .and(query_param("type", "artist"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "artists": { "items": [{
                    "id": "06HL4z0CvFAxyc27GXpf02",
                    "name": "Taylor Swift",
                    "genres": ["pop"],
                    "followers": { "total": 1000 }
                }] }
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .and(query_param("type", "playlist"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "playlists": { "items": [null, { "name": "Top Hits" }] }
            })))
            .mount(&mock_server)
            .await;

        let client = authenticated_client(&mock_server).await;
        let config = ExplorationConfig::default();
        let mut explorer = Explorer::new(&client, &config);

        explorer.search().await;

        assert_eq!(
            explorer.state.artist_id.as_deref(),
            Some("06HL4z0CvFAxyc27GXpf02")
        );
    }

    #[tokio::test]
    async fn test_artist_section_requires_search_first() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let client = authenticated_client(&mock_server).await;
        let config = ExplorationConfig::default();
        let mut explorer = Explorer::new(&client, &config);

        explorer.artist().await;
        assert_eq!(explorer.state, ExplorationState::default());
    }

    #[tokio::test]
    async fn test_failed_section_saves_nothing_and_continues() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/browse/categories"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let client = authenticated_client(&mock_server).await;
        let config = ExplorationConfig {
            save_samples: true,
            output_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let mut explorer = Explorer::new(&client, &config);

        explorer.categories().await;
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_successful_fetch_saves_sample() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/browse/categories"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "categories": { "items": [{ "id": "pop", "name": "Pop" }] }
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/browse/categories/pop/playlists"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let client = authenticated_client(&mock_server).await;
        let config = ExplorationConfig {
            save_samples: true,
            output_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let mut explorer = Explorer::new(&client, &config);

        explorer.categories().await;
        assert!(dir.path().join("sample_data_categories.json").exists());
        assert!(!dir.path().join("sample_data_pop_playlists.json").exists());
    }
}
