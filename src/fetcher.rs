use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info};
use url::Url;

use crate::error::FetchError;

pub struct Fetcher {
    client: Client,
    timeout: Duration,
}

impl Fetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self { client, timeout })
    }

    /// Performs one GET against `url` and returns the body of a 2xx response.
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let url = Self::validate_url(url)?;
        info!("Fetching feed: {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let bytes = response.bytes().await.map_err(|e| self.classify(e))?;
        debug!("Received {} bytes from {}", bytes.len(), url);

        Ok(bytes.to_vec())
    }

    pub fn validate_url(raw: &str) -> Result<Url, FetchError> {
        let invalid = |reason: String| FetchError::InvalidUrl {
            url: raw.to_string(),
            reason,
        };

        let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(invalid(format!("unsupported scheme '{}'", other))),
        }
    }

    fn classify(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Network(err)
        }
    }
}
