// SPDX-License-Identifier: GPL-3.0-or-later

use std::fmt;

use chrono::{DateTime, Local};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RequestError;

/// Application credentials for the client-credentials grant.
///
/// Immutable once constructed. The secret is never printed by `Debug`.
#[derive(Clone)]
pub struct Credentials {
    client_id: String,
    client_secret: String,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Only call this when building the token request.
    pub(crate) fn client_secret(&self) -> &str {
        &self.client_secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Opaque bearer token returned by the token endpoint.
#[derive(Clone, PartialEq, Eq)]
pub(crate) struct BearerToken(String);

impl BearerToken {
    pub(crate) fn new(token: String) -> Self {
        Self(token)
    }

    pub(crate) fn header_value(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BearerToken([REDACTED])")
    }
}

/// Body of a successful token response. Only `access_token` is required.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Session state of a client instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated,
}

/// Rate-limit related response headers, kept verbatim.
///
/// Serializes under the original header names and omits absent ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitHeaders {
    #[serde(rename = "X-RateLimit-Limit", skip_serializing_if = "Option::is_none", default)]
    pub limit: Option<String>,
    #[serde(rename = "X-RateLimit-Remaining", skip_serializing_if = "Option::is_none", default)]
    pub remaining: Option<String>,
    #[serde(rename = "X-RateLimit-Reset", skip_serializing_if = "Option::is_none", default)]
    pub reset: Option<String>,
    #[serde(rename = "Retry-After", skip_serializing_if = "Option::is_none", default)]
    pub retry_after: Option<String>,
}

impl RateLimitHeaders {
    pub const LIMIT: &'static str = "x-ratelimit-limit";
    pub const REMAINING: &'static str = "x-ratelimit-remaining";
    pub const RESET: &'static str = "x-ratelimit-reset";

    pub fn from_headers(headers: &HeaderMap) -> Self {
        let read = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };

        Self {
            limit: read(Self::LIMIT),
            remaining: read(Self::REMAINING),
            reset: read(Self::RESET),
            retry_after: read(RETRY_AFTER.as_str()),
        }
    }

    /// `Retry-After` as whole seconds. HTTP-date values yield `None`.
    pub fn retry_after_secs(&self) -> Option<u64> {
        self.retry_after
            .as_deref()
            .and_then(|value| value.trim().parse().ok())
    }

    pub fn is_empty(&self) -> bool {
        self.limit.is_none()
            && self.remaining.is_none()
            && self.reset.is_none()
            && self.retry_after.is_none()
    }
}

/// One observed HTTP exchange with a resource endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequestRecord {
    /// Path and encoded query, relative to the API base URL.
    pub endpoint: String,
    pub status_code: u16,
    pub response_time_ms: f64,
    pub timestamp: DateTime<Local>,
    pub rate_limit_headers: RateLimitHeaders,
}

/// Outcome of a tracked GET.
///
/// `record` is `None` when no HTTP response arrived (no token, bad URL,
/// transport failure).
#[derive(Debug)]
pub struct TrackedResponse {
    pub record: Option<RequestRecord>,
    pub outcome: Result<Value, RequestError>,
}

impl TrackedResponse {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}
