use anyhow::{anyhow, Context, Result};
use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::config::Config;

/// Where the crawler reads pages from. `Ok(None)` is a missing page.
pub trait PageSource {
    async fn page(&self, url: &str) -> Result<Option<String>>;
}

/// Result of a single GET.
enum Attempt {
    Page(String),
    Missing,
    Retry(anyhow::Error),
    Fail(anyhow::Error),
}

/// HTTP client for wiki pages with retry on 429/5xx and transport errors.
pub struct Fetcher {
    client: reqwest::Client,
    config: Config,
}

impl Fetcher {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Fetch a page body. `Ok(None)` means the page does not exist (404).
    pub async fn get(&self, url: &str) -> Result<Option<String>> {
        let max = self.config.retries;
        let mut attempt = 0;
        loop {
            match self.get_once(url).await {
                Attempt::Page(body) => return Ok(Some(body)),
                Attempt::Missing => {
                    debug!("404 {}", url);
                    return Ok(None);
                }
                Attempt::Fail(e) => return Err(e),
                Attempt::Retry(e) if attempt >= max => return Err(e),
                Attempt::Retry(e) => {
                    let backoff = self.config.backoff(attempt);
                    warn!(
                        "{} (attempt {}/{}), backing off {:.1}s",
                        e,
                        attempt + 1,
                        max,
                        backoff.as_secs_f64()
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn get_once(&self, url: &str) -> Attempt {
        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => return Attempt::Retry(anyhow!("request to {} failed: {}", url, e)),
        };

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Attempt::Missing;
        }
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Attempt::Retry(anyhow!("{} returned {}", url, status));
        }
        if !status.is_success() {
            return Attempt::Fail(anyhow!("{} returned {}", url, status));
        }

        match response.text().await {
            Ok(body) => Attempt::Page(body),
            Err(e) => Attempt::Retry(anyhow!("reading {} failed: {}", url, e)),
        }
    }
}

impl PageSource for Fetcher {
    async fn page(&self, url: &str) -> Result<Option<String>> {
        self.get(url).await
    }
}
