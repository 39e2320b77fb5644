//! Remote sheet source over HTTP.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use tracing::instrument;

use cohortlens_core::traits::SheetSource;

use crate::error::ProviderError;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Fetches sheets with `GET {base_url}/{location}`.
pub struct HttpSource {
    base_url: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(base_url: &str, timeout_secs: u64) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_secs,
            client,
        })
    }

    fn url_for(&self, location: &str) -> String {
        format!("{}/{}", self.base_url, location.trim_start_matches('/'))
    }
}

#[async_trait]
impl SheetSource for HttpSource {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self))]
    async fn fetch(&self, location: &str) -> anyhow::Result<String> {
        let url = self.url_for(location);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::from_transport(e, self.timeout_secs))?;

        let status = response.status().as_u16();
        if status == 404 {
            return Err(ProviderError::SheetNotFound(url).into());
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status,
                message: body,
            }
            .into());
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProviderError::from_transport(e, self.timeout_secs))?;
        String::from_utf8(bytes.to_vec())
            .with_context(|| format!("sheet is not valid UTF-8: {url}"))
    }
}
