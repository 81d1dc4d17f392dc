// SPDX-License-Identifier: GPL-3.0-or-later

//! Spotify Web API client for exploring catalog data.
//!
//! This crate provides a client that obtains a bearer token through the
//! OAuth client-credentials grant and issues authenticated GET requests,
//! returning parsed JSON or a typed error. Rate-limit responses are
//! detected and surfaced but never retried.

pub mod client;
pub mod error;
pub mod models;

pub use client::{SpotifyClient, SpotifyClientBuilder, SPOTIFY_API_BASE, SPOTIFY_TOKEN_URL};
pub use error::{AuthError, BuildError, RequestError};
pub use models::{Credentials, RateLimitHeaders, RequestRecord, SessionState, TrackedResponse};
