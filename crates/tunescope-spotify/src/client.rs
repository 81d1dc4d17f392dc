// SPDX-License-Identifier: GPL-3.0-or-later

use crate::error::{AuthError, BuildError, RequestError};
use crate::models::{
    BearerToken, Credentials, RateLimitHeaders, RequestRecord, SessionState, TokenResponse,
    TrackedResponse,
};
use chrono::Local;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};
use url::Url;

pub const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const SPOTIFY_API_BASE: &str = "https://api.spotify.com/v1";
const USER_AGENT: &str = concat!("tunescope/", env!("CARGO_PKG_VERSION"));

/// Upper bound on the body excerpt carried by [`RequestError::Upstream`].
pub const BODY_SNIPPET_LEN: usize = 100;

/// Token holder for one client instance. Starts empty and is only filled
/// by a successful [`SpotifyClient::authenticate`].
#[derive(Debug, Clone)]
struct Session {
    token: Option<BearerToken>,
    base_url: String,
}

/// Spotify Web API client using the client-credentials grant.
///
/// Calls are issued one at a time; the client never retries, sleeps or
/// re-authenticates on its own.
#[derive(Debug, Clone)]
pub struct SpotifyClient {
    client: Client,
    credentials: Credentials,
    token_url: String,
    session: Session,
}

impl SpotifyClient {
    /// Create a client against the public Spotify endpoints.
    pub fn new(credentials: Credentials) -> Result<Self, BuildError> {
        Self::builder(credentials).build()
    }

    /// Create a client builder for custom configuration.
    pub fn builder(credentials: Credentials) -> SpotifyClientBuilder {
        SpotifyClientBuilder::new(credentials)
    }

    pub fn state(&self) -> SessionState {
        if self.session.token.is_some() {
            SessionState::Authenticated
        } else {
            SessionState::Unauthenticated
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.state() == SessionState::Authenticated
    }

    pub fn base_url(&self) -> &str {
        &self.session.base_url
    }

    /// Exchange the stored credentials for a bearer token.
    ///
    /// On any failure the session is left as it was, so the call can simply
    /// be repeated.
    ///
    /// # Example
    /// ```no_run
    /// # use tunescope_spotify::{Credentials, SpotifyClient};
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut client = SpotifyClient::new(Credentials::new("id", "secret"))?;
    /// client.authenticate().await?;
    /// let artist = client.get("/artists/06HL4z0CvFAxyc27GXpf02", &[]).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn authenticate(&mut self) -> Result<(), AuthError> {
        debug!(target: "spotify", url = %self.token_url, "requesting access token");

        let response = self
            .client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.credentials.client_id()),
                ("client_secret", self.credentials.client_secret()),
            ])
            .send()
            .await
            .map_err(|e| AuthError::Transport {
                message: e.to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| AuthError::Transport {
            message: e.to_string(),
        })?;

        if status != StatusCode::OK {
            warn!(target: "spotify", %status, "token request rejected");
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse =
            serde_json::from_str(&body).map_err(|e| AuthError::InvalidResponse {
                message: e.to_string(),
            })?;

        debug!(
            target: "spotify",
            token_type = token.token_type.as_deref().unwrap_or("unknown"),
            expires_in = ?token.expires_in,
            "access token obtained"
        );

        self.session.token = Some(BearerToken::new(token.access_token));
        Ok(())
    }

    /// GET a protected endpoint and return the parsed JSON body.
    ///
    /// # Arguments
    /// * `path` - Path relative to the API base, e.g. `/search`. May already
    ///   carry a query string.
    /// * `query` - Extra query parameters, URL-encoded by the client.
    pub async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, RequestError> {
        let (_, response) = self.send(path, query).await?;
        Self::read_outcome(response).await
    }

    /// Like [`get`](Self::get), also reporting timing and rate-limit headers
    /// for the exchange.
    pub async fn get_tracked(&self, path: &str, query: &[(&str, &str)]) -> TrackedResponse {
        let timestamp = Local::now();
        let started = Instant::now();

        let (endpoint, response) = match self.send(path, query).await {
            Ok(sent) => sent,
            Err(error) => {
                return TrackedResponse {
                    record: None,
                    outcome: Err(error),
                }
            }
        };

        let status_code = response.status().as_u16();
        let rate_limit_headers = RateLimitHeaders::from_headers(response.headers());
        let outcome = Self::read_outcome(response).await;
        let response_time_ms = started.elapsed().as_secs_f64() * 1000.0;

        TrackedResponse {
            record: Some(RequestRecord {
                endpoint,
                status_code,
                response_time_ms,
                timestamp,
                rate_limit_headers,
            }),
            outcome,
        }
    }

    /// Build the URL, attach the token and send. Returns the endpoint as
    /// requested (path plus encoded query) alongside the raw response.
    async fn send(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<(String, Response), RequestError> {
        let Some(token) = self.session.token.as_ref() else {
            return Err(RequestError::Unauthenticated);
        };

        let url = self.resource_url(path, query)?;
        let endpoint = endpoint_of(&url, &self.session.base_url);

        trace!(target: "spotify", "GET {}", url);

        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, token.header_value())
            .send()
            .await
            .map_err(|e| RequestError::Transport {
                message: e.to_string(),
            })?;

        debug!(target: "spotify", %endpoint, status = %response.status(), "response received");
        Ok((endpoint, response))
    }

    fn resource_url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, RequestError> {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };

        let mut url = Url::parse(&format!("{}{}", self.session.base_url, path)).map_err(|e| {
            RequestError::InvalidUrl {
                message: e.to_string(),
            }
        })?;

        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        Ok(url)
    }

    async fn read_outcome(response: Response) -> Result<Value, RequestError> {
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = RateLimitHeaders::from_headers(response.headers()).retry_after_secs();
            warn!(target: "spotify", ?retry_after, "rate limited");
            return Err(RequestError::RateLimited { retry_after });
        }

        let body = response.text().await.map_err(|e| RequestError::Transport {
            message: e.to_string(),
        })?;

        if status != StatusCode::OK {
            return Err(RequestError::Upstream {
                status: status.as_u16(),
                body_snippet: snippet(&body, BODY_SNIPPET_LEN),
            });
        }

        trace!(target: "spotify", "response body: {}", body);

        serde_json::from_str(&body).map_err(|e| RequestError::InvalidBody {
            message: format!("Failed to parse response: {}", e),
        })
    }
}

/// Path and query of `url` relative to the API base.
fn endpoint_of(url: &Url, base_url: &str) -> String {
    let full = url.as_str();
    full.strip_prefix(base_url).unwrap_or(full).to_string()
}

/// First `max_chars` characters of `body`, cut on a char boundary.
fn snippet(body: &str, max_chars: usize) -> String {
    match body.char_indices().nth(max_chars) {
        Some((index, _)) => body[..index].to_string(),
        None => body.to_string(),
    }
}

/// Builder for configuring a Spotify client.
#[derive(Debug)]
pub struct SpotifyClientBuilder {
    credentials: Credentials,
    token_url: String,
    base_url: String,
    timeout: Duration,
}

impl SpotifyClientBuilder {
    fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            token_url: SPOTIFY_TOKEN_URL.to_string(),
            base_url: SPOTIFY_API_BASE.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Set a custom token endpoint (useful for testing with mock servers).
    pub fn token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    /// Set a custom resource base URL (useful for testing with mock servers).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set request timeout duration.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the Spotify client. The session starts unauthenticated.
    pub fn build(self) -> Result<SpotifyClient, BuildError> {
        let client = Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(SpotifyClient {
            client,
            credentials: self.credentials,
            token_url: self.token_url,
            session: Session {
                token: None,
                // Trim once so every URL format is clean.
                base_url: self.base_url.trim_end_matches('/').to_string(),
            },
        })
    }
}
