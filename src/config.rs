use std::time::Duration;

use clap::Args;

pub const DEFAULT_BASE_URL: &str = "https://prts.wiki";
/// Wiki page that links every activity.
pub const DEFAULT_HUB_PAGE: &str = "情报处理室";
pub const DEFAULT_DELAY_MS: u64 = 200;
pub const DEFAULT_RETRIES: u32 = 3;
pub const BASE_BACKOFF_MS: u64 = 2000;
/// Upper bound for a single retry wait.
pub const MAX_BACKOFF_MS: u64 = 60_000;

#[derive(Debug, Clone, Args)]
pub struct Config {
    /// Wiki root
    #[arg(long, env = "PRTS_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,
    /// Page listing all activities
    #[arg(long, env = "PRTS_HUB_PAGE", default_value = DEFAULT_HUB_PAGE)]
    pub hub_page: String,
    /// Pause after each story link that was processed, in milliseconds
    #[arg(long, default_value_t = DEFAULT_DELAY_MS)]
    pub delay_ms: u64,
    /// Retries on rate limiting, server errors and transport failures
    #[arg(long, default_value_t = DEFAULT_RETRIES)]
    pub retries: u32,
    /// First retry wait in milliseconds, doubled per attempt
    #[arg(long, default_value_t = BASE_BACKOFF_MS)]
    pub backoff_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            hub_page: DEFAULT_HUB_PAGE.to_string(),
            delay_ms: DEFAULT_DELAY_MS,
            retries: DEFAULT_RETRIES,
            backoff_ms: BASE_BACKOFF_MS,
        }
    }
}

impl Config {
    fn root(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// `{base}/w/{title}` with the title percent-encoded.
    pub fn page_url(&self, title: &str) -> String {
        format!("{}/w/{}", self.root(), urlencoding::encode(title))
    }

    pub fn hub_url(&self) -> String {
        self.page_url(&self.hub_page)
    }

    /// Host part of the base url, e.g. `prts.wiki`.
    pub fn host(&self) -> &str {
        let root = self.root();
        root.split("//").nth(1).unwrap_or(root)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Wait before retry `attempt + 1`, capped at [`MAX_BACKOFF_MS`].
    pub fn backoff(&self, attempt: u32) -> Duration {
        let ms = self
            .backoff_ms
            .saturating_mul(2u64.saturating_pow(attempt))
            .min(MAX_BACKOFF_MS);
        Duration::from_millis(ms)
    }
}
