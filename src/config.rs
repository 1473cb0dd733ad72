use std::ops::RangeInclusive;
use std::sync::OnceLock;
use std::time::Duration;

use rand::Rng;

use crate::model::LOG_PAGE_SIZE;

pub const BASE_URL: &str = "https://psnprofiles.com";

/// Identifies this crate to the site on every request. Callers who want to
/// add contact details do so with [`ScraperConfig::with_user_agent`].
pub const DEFAULT_USER_AGENT: &str = concat!("trophy-scraper/", env!("CARGO_PKG_VERSION"));

const PAGE_DELAY_SECS: RangeInclusive<f64> = 1.0..=2.5;
const TIMEOUT_SECS: RangeInclusive<f64> = 10.0..=15.0;

/// Inter-page delay for this process. Drawn once on first use and reused for
/// every page of every scrape.
pub fn process_page_delay() -> Duration {
    static DELAY: OnceLock<Duration> = OnceLock::new();
    *DELAY.get_or_init(|| Duration::from_secs_f64(rand::rng().random_range(PAGE_DELAY_SECS)))
}

/// Settings for fetching and paginating a trophy profile.
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Site root, without a trailing slash.
    pub base_url: String,
    pub user_agent: String,
    /// Each request gets a timeout drawn uniformly from this range.
    pub timeout_range: RangeInclusive<Duration>,
    /// Pause between two trophy log pages.
    pub page_delay: Duration,
    /// Trophies per log page, used for page estimates.
    pub page_size: u32,
    /// Extra attempts for a log page after a network error. Zero means the
    /// first failure aborts the scrape.
    pub page_retries: u32,
    /// Base backoff between retries, multiplied by the attempt number.
    pub retry_backoff: Duration,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_range: Duration::from_secs_f64(*TIMEOUT_SECS.start())
                ..=Duration::from_secs_f64(*TIMEOUT_SECS.end()),
            page_delay: process_page_delay(),
            page_size: LOG_PAGE_SIZE,
            page_retries: 0,
            retry_backoff: Duration::from_secs(2),
        }
    }
}

impl ScraperConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout_range(mut self, range: RangeInclusive<Duration>) -> Self {
        self.timeout_range = range;
        self
    }

    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    pub fn with_page_retries(mut self, retries: u32, backoff: Duration) -> Self {
        self.page_retries = retries;
        self.retry_backoff = backoff;
        self
    }

    /// URL of a user's profile landing page.
    pub fn profile_url(&self, username: &str) -> String {
        format!("{}/{}", self.base_url, username.trim())
    }

    /// URL of one page of a user's trophy log.
    pub fn log_page_url(&self, username: &str, page: u32) -> String {
        format!("{}/log?page={page}", self.profile_url(username))
    }

    /// Draw a timeout for a single request.
    pub fn request_timeout(&self) -> Duration {
        let (start, end) = (*self.timeout_range.start(), *self.timeout_range.end());
        if start >= end {
            return start;
        }
        rand::rng().random_range(start..=end)
    }
}
