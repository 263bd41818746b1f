//! Backend transport.
//!
//! The core never talks HTTP itself; it hands a compiled document to a
//! [`Transport`] and gets a raw response back. [`HttpTransport`] is the
//! production implementation. Tests substitute their own.

use std::time::Duration;

use async_trait::async_trait;
use facet_config::{BackendSettings, HttpMethod};
use facet_query::QueryDocument;
use tracing::debug;
use url::Url;

use crate::{error::TransportError, results::RawResponse, share::SOURCE_PARAM};

/// Sends a query document to a search backend.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Runs one search.
    async fn search(&self, doc: &QueryDocument) -> Result<RawResponse, TransportError>;
}

/// Talks to the backend over HTTP.
///
/// With GET, the document travels in the `source` query parameter; with
/// POST, it is the JSON request body.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// Shared client.
    client: reqwest::Client,
    /// Search endpoint.
    url: Url,
    /// Request method.
    method: HttpMethod,
}

impl HttpTransport {
    /// Creates a transport from backend settings.
    pub fn new(settings: &BackendSettings) -> Result<Self, TransportError> {
        let raw = settings.url.as_deref().ok_or(TransportError::NoBackendUrl)?;
        let url = Url::parse(raw).map_err(|source| TransportError::InvalidUrl {
            url: raw.to_string(),
            source,
        })?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(TransportError::Client)?;
        Ok(Self {
            client,
            url,
            method: settings.method,
        })
    }

    /// Returns the endpoint URL.
    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn search(&self, doc: &QueryDocument) -> Result<RawResponse, TransportError> {
        let request = match self.method {
            HttpMethod::Get => {
                let mut url = self.url.clone();
                url.query_pairs_mut().append_pair(SOURCE_PARAM, &doc.to_json());
                self.client.get(url)
            }
            HttpMethod::Post => self.client.post(self.url.clone()).json(&doc.to_value()),
        };
        debug!(url = %self.url, method = ?self.method, "sending search");

        let response = request.send().await.map_err(TransportError::Request)?;
        let status = response.status();
        let body = response.text().await.map_err(TransportError::Request)?;
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }
        serde_json::from_str(&body).map_err(TransportError::Decode)
    }
}
