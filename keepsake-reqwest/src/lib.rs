//! # keepsake-reqwest
//!
//! [`Transport`] implementation over a [`reqwest::Client`].
//!
//! Addresses are resolved against an optional base URL; absolute addresses
//! are used as they are. Non-success statuses are errors, so an error page
//! never becomes the cached copy of a resource.
//!
//! ```no_run
//! use keepsake::{Client, FsBackend, ResourceAddress};
//! use keepsake_reqwest::ReqwestTransport;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::builder()
//!     .backend(FsBackend::builder().build()?)
//!     .transport(ReqwestTransport::new(reqwest::Client::new()).base_url("https://api.example.com"))
//!     .build();
//!
//! let profile: serde_json::Value = client.get(&ResourceAddress::new("/me")).await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use keepsake_core::{Raw, ResourceAddress, Transport};
use tracing::debug;

/// Fetches resources with HTTP GET.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: Option<String>,
}

impl ReqwestTransport {
    /// Wraps `client`. Addresses must be absolute URLs until a base is set.
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: None,
        }
    }

    /// Resolves relative addresses against `base_url`.
    pub fn base_url(self, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url: Some(base_url),
            ..self
        }
    }

    /// The URL requested for `address`.
    pub fn url_for(&self, address: &ResourceAddress) -> String {
        let address = address.as_str();
        match &self.base_url {
            Some(base) if !address.contains("://") => {
                if address.starts_with('/') {
                    format!("{base}{address}")
                } else {
                    format!("{base}/{address}")
                }
            }
            _ => address.to_owned(),
        }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    type Error = reqwest::Error;

    async fn get(&self, address: &ResourceAddress) -> Result<Raw, Self::Error> {
        let url = self.url_for(address);
        let response = self.client.get(&url).send().await?.error_for_status()?;
        let body = response.bytes().await?;
        debug!(%url, bytes = body.len(), "GET completed");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_resolution() {
        let transport = ReqwestTransport::default().base_url("http://api.local/v1/");

        assert_eq!(
            transport.url_for(&ResourceAddress::new("/articles?page=2")),
            "http://api.local/v1/articles?page=2"
        );
        assert_eq!(
            transport.url_for(&ResourceAddress::new("articles")),
            "http://api.local/v1/articles"
        );
        assert_eq!(
            transport.url_for(&ResourceAddress::new("https://cdn.local/a.json")),
            "https://cdn.local/a.json"
        );
    }

    #[test]
    fn test_without_base_address_is_url() {
        let transport = ReqwestTransport::default();
        assert_eq!(
            transport.url_for(&ResourceAddress::new("http://h/x")),
            "http://h/x"
        );
    }
}
