//! HTTP boundary to the WiggleDB CGI.
//!
//! Every transport or decoding failure is logged here with the status line,
//! response headers and raw body; callers only see a [`BackendError`].

use crate::core::catalog::AttributeCatalog;
use crate::core::query::QueryString;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};
use url::Url;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend answered {status}")]
    Status { status: String, body: String },
    #[error("could not decode reply: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
        body: String,
    },
    #[error("could not read catalog {path}: {source}")]
    CatalogIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Anything that can answer a query string with JSON
#[async_trait]
pub trait Backend: Send + Sync {
    async fn fetch(&self, query: &QueryString) -> Result<Value, BackendError>;

    /// The static attribute catalog
    async fn fetch_catalog(&self) -> Result<AttributeCatalog, BackendError>;
}

/// Where the attribute catalog lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    Remote(Url),
    File(PathBuf),
}

impl CatalogSource {
    /// URLs with an http(s) scheme are fetched, anything else is a path
    pub fn parse(raw: &str) -> Self {
        match Url::parse(raw) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Self::Remote(url),
            _ => Self::File(PathBuf::from(raw)),
        }
    }
}

pub struct HttpBackend {
    client: Client,
    endpoint: Url,
    catalog: CatalogSource,
}

impl HttpBackend {
    pub fn new(endpoint: Url, catalog: CatalogSource, timeout: Option<Duration>) -> anyhow::Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to create HTTP client")?;
        Ok(Self { client, endpoint, catalog })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn get_json(&self, url: Url) -> Result<Value, BackendError> {
        debug!("GET {}", url);
        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            error!(url = %url, error = %e, "Request failed before a reply arrived");
            BackendError::Transport(e)
        })?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await.map_err(|e| {
            error!(url = %url, status = %status, headers = ?headers, error = %e, "Failed to read reply body");
            BackendError::Transport(e)
        })?;

        if !status.is_success() {
            error!(url = %url, status = %status, headers = ?headers, body = %body, "Backend returned an error status");
            return Err(BackendError::Status { status: status.to_string(), body });
        }

        serde_json::from_str(&body).map_err(|source| {
            error!(url = %url, status = %status, headers = ?headers, body = %body, error = %source, "Reply is not valid JSON");
            BackendError::Decode { source, body }
        })
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn fetch(&self, query: &QueryString) -> Result<Value, BackendError> {
        self.get_json(query.to_url(&self.endpoint)).await
    }

    async fn fetch_catalog(&self) -> Result<AttributeCatalog, BackendError> {
        let value = match &self.catalog {
            CatalogSource::Remote(url) => self.get_json(url.clone()).await?,
            CatalogSource::File(path) => {
                let raw = tokio::fs::read_to_string(path).await.map_err(|source| {
                    error!(path = %path.display(), error = %source, "Failed to read attribute catalog");
                    BackendError::CatalogIo { path: path.clone(), source }
                })?;
                serde_json::from_str(&raw).map_err(|source| {
                    error!(path = %path.display(), error = %source, "Attribute catalog is not valid JSON");
                    BackendError::Decode { source, body: raw }
                })?
            }
        };
        serde_json::from_value(value.clone()).map_err(|source| {
            error!(error = %source, "Attribute catalog has an unexpected shape");
            BackendError::Decode { source, body: value.to_string() }
        })
    }
}
