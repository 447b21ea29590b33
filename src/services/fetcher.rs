use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {0}")]
    Http(u16),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Downloads remote playlists as text, retrying rate limits and network failures
pub struct PlaylistFetcher {
    client: Client,
    max_retries: u32,
}

impl PlaylistFetcher {
    pub fn new(user_agent: &str, timeout_ms: u64, max_retries: u32) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_millis(timeout_ms))
            .gzip(true)
            .build()?;

        Ok(Self { client, max_retries })
    }

    fn backoff(attempt: u32) -> Duration {
        Duration::from_millis((1u64 << attempt).saturating_mul(500).min(10_000))
    }

    pub async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let mut attempt = 0;

        loop {
            match self.client.get(url).send().await {
                Ok(resp) if resp.status().is_success() => {
                    return Ok(resp.text().await?);
                }
                Ok(resp) => {
                    let status = resp.status();
                    if status == StatusCode::TOO_MANY_REQUESTS && attempt < self.max_retries {
                        let backoff = Self::backoff(attempt);
                        tracing::warn!("fetch_retry" = attempt + 1, "reason" = "429", "backoff_ms" = backoff.as_millis() as u64);
                        sleep(backoff).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(FetchError::Http(status.as_u16()));
                }
                Err(err) => {
                    if attempt < self.max_retries {
                        let backoff = Self::backoff(attempt);
                        tracing::warn!("fetch_retry" = attempt + 1, "reason" = "network", "backoff_ms" = backoff.as_millis() as u64);
                        sleep(backoff).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(err.into());
                }
            }
        }
    }
}
