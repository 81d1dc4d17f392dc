// SPDX-License-Identifier: GPL-3.0-or-later

use thiserror::Error;

/// Failure to obtain a bearer token from the token endpoint.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token request rejected: {status} - {body}")]
    Rejected { status: u16, body: String },

    #[error("token request failed: {message}")]
    Transport { message: String },

    #[error("invalid token response: {message}")]
    InvalidResponse { message: String },
}

/// Failure of a GET against a protected resource endpoint.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("no access token available, authenticate first")]
    Unauthenticated,

    #[error(
        "rate limited{}",
        .retry_after.map(|secs| format!(", retry after {secs}s")).unwrap_or_default()
    )]
    RateLimited { retry_after: Option<u64> },

    #[error("request failed: {status} - {body_snippet}")]
    Upstream { status: u16, body_snippet: String },

    #[error("HTTP request failed: {message}")]
    Transport { message: String },

    #[error("invalid request URL: {message}")]
    InvalidUrl { message: String },

    #[error("invalid response body: {message}")]
    InvalidBody { message: String },
}

impl RequestError {
    /// HTTP status carried by the error, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            RequestError::RateLimited { .. } => Some(429),
            RequestError::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_display() {
        let with_hint = RequestError::RateLimited {
            retry_after: Some(5),
        };
        assert_eq!(with_hint.to_string(), "rate limited, retry after 5s");
        assert_eq!(with_hint.status(), Some(429));

        let without = RequestError::RateLimited { retry_after: None };
        assert_eq!(without.to_string(), "rate limited");
    }

    #[test]
    fn test_status_only_for_http_errors() {
        let upstream = RequestError::Upstream {
            status: 500,
            body_snippet: "oops".to_string(),
        };
        assert_eq!(upstream.status(), Some(500));
        assert_eq!(RequestError::Unauthenticated.status(), None);
        assert_eq!(
            RequestError::Transport {
                message: "connection reset".to_string()
            }
            .status(),
            None
        );
    }
}
