//! Error types for talking to the backend and decoding share links.

use facet_query::SourceError;
use thiserror::Error;

/// Errors from a search round trip.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No backend URL is configured.
    #[error("no backend url configured; set [backend] url in .facet.toml")]
    NoBackendUrl,

    /// The configured backend URL does not parse.
    #[error("invalid backend url '{url}': {source}")]
    InvalidUrl {
        /// The configured URL.
        url: String,
        /// Parse failure.
        #[source]
        source: url::ParseError,
    },

    /// The HTTP client could not be built.
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),

    /// The request failed before a response arrived.
    #[error("search request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("backend returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// The response body is not a search response.
    #[error("failed to decode search response: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Errors from reading a share link.
#[derive(Debug, Error)]
pub enum ShareError {
    /// The base URL does not parse.
    #[error("invalid url '{url}': {source}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
        /// Parse failure.
        #[source]
        source: url::ParseError,
    },

    /// The link carries no `source` parameter.
    #[error("link has no source parameter")]
    MissingSource,

    /// The `source` parameter is not a query document.
    #[error(transparent)]
    Source(#[from] SourceError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display_includes_body() {
        let err = TransportError::Status {
            status: 503,
            body: "unavailable".into(),
        };
        assert_eq!(err.to_string(), "backend returned 503: unavailable");
    }

    #[test]
    fn source_errors_pass_through() {
        let err = ShareError::from(SourceError::NotAnObject { found: "array" });
        assert_eq!(err.to_string(), "source must be a JSON object, found array");
    }
}
