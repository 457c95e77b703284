use crate::config::HttpConfig;
use crate::error::FetchError;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Thin reqwest wrapper shared by every collaborator. No retries.
#[derive(Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
}

impl HttpClient {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .gzip(true)
            // Yahoo hands out a consent cookie on first contact
            .cookie_store(true);

        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let inner = builder.build().context("Failed to build HTTP client")?;
        Ok(Self { inner })
    }

    pub fn inner(&self) -> &reqwest::Client {
        &self.inner
    }

    /// GET a URL as text; non-2xx statuses are errors.
    pub async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        debug!("GET {}", url);
        let resp = self.inner.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(resp.text().await?)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let body = self.get_text(url).await?;
        serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }
}
