//! Orders API client
//!
//! The orders API returns unstructured text with no fixed schema. Sources
//! hand it over untouched; every character is treated as untrusted input.

use crate::errors::FetchError;
use async_trait::async_trait;
use std::time::Duration;

/// Source of raw order text
#[async_trait]
pub trait OrdersSource: Send + Sync {
    /// Fetch the raw text body
    async fn fetch_raw(&self) -> Result<String, FetchError>;

    /// Human-readable source name for logs
    fn describe(&self) -> String;
}

/// HTTP GET against the orders API
pub struct HttpOrdersSource {
    client: reqwest::Client,
    url: String,
}

impl HttpOrdersSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl OrdersSource for HttpOrdersSource {
    async fn fetch_raw(&self) -> Result<String, FetchError> {
        tracing::debug!(url = %self.url, "Fetching raw orders");

        let response = self.client.get(&self.url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: self.url.clone(),
                status: response.status().as_u16(),
            });
        }

        Ok(response.text().await?)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Fixed text, e.g. read from a file or supplied by a test
pub struct StaticOrdersSource {
    name: String,
    text: String,
}

impl StaticOrdersSource {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    /// Read the whole file up front
    pub fn from_file(path: &std::path::Path) -> Result<Self, FetchError> {
        let text = std::fs::read_to_string(path).map_err(|e| FetchError::Unavailable {
            source_name: path.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(Self::new(path.display().to_string(), text))
    }
}

#[async_trait]
impl OrdersSource for StaticOrdersSource {
    async fn fetch_raw(&self) -> Result<String, FetchError> {
        Ok(self.text.clone())
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}
