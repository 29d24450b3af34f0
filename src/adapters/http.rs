use crate::domain::ports::Fetcher;
use crate::utils::error::{Result, ScrapeError};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub timeout_secs: u64,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            timeout_secs: 20,
            retry_attempts: 3,
            retry_delay_ms: 500,
        }
    }
}

/// HTTP page fetcher with exponential backoff on transient failures.
/// 4xx other than 429 is permanent and fails immediately.
pub struct HttpFetcher {
    client: Client,
    options: HttpOptions,
}

impl HttpFetcher {
    pub fn new(options: HttpOptions) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(options.timeout_secs))
            .build()?;

        Ok(Self { client, options })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let mut delay = Duration::from_millis(self.options.retry_delay_ms);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let error = match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response.text().await?);
                    }
                    ScrapeError::HttpStatusError {
                        status: status.as_u16(),
                        url: url.to_string(),
                    }
                }
                Err(e) => ScrapeError::HttpError(e),
            };

            if !error.is_transient() || attempt > self.options.retry_attempts {
                return Err(error);
            }

            tracing::warn!(
                url,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "transient fetch failure, retrying"
            );
            tokio::time::sleep(delay).await;
            delay *= 2;
        }
    }
}
