use std::sync::Arc;

use tracing::{info, instrument};

use crate::cache::CacheStore;
use crate::config::ScraperConfig;
use crate::error::{Result, TrophyError};
use crate::model::*;
use crate::observer::{ScrapeObserver, TracingObserver};
use crate::scraper;
use crate::scraper::log::{RemoteLog, ScrapeOutcome};
use crate::stop::StopSignal;

/// The main entry point for scraping PSNProfiles.
///
/// `TrophyClient` wraps a [`reqwest::Client`] together with the scrape
/// settings and the observer that receives scrape events.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> trophy_scraper::Result<()> {
/// use trophy_scraper::{CacheStore, NeverStop, TrophyClient};
///
/// let client = TrophyClient::new()?;
/// let cache = CacheStore::new("data_cache");
/// let profile = client
///     .load_profile("Hakoom", &cache, |page, count| println!("page {page}: {count}"), &NeverStop)
///     .await?;
/// println!("{} trophies", profile.snapshot.trophy_log.len());
/// # Ok(())
/// # }
/// ```
pub struct TrophyClient {
    http: reqwest::Client,
    config: ScraperConfig,
    observer: Arc<dyn ScrapeObserver>,
}

impl TrophyClient {
    /// Create a new client with default settings.
    pub fn new() -> Result<Self> {
        Self::with_config(ScraperConfig::default())
    }

    /// Create a new client with the given settings.
    pub fn with_config(config: ScraperConfig) -> Result<Self> {
        let http = scraper::build_http_client(&config)?;
        Ok(Self::with_client(http, config))
    }

    /// Create a new client using the provided [`reqwest::Client`].
    ///
    /// Use this when you need proxies or other transport settings. The
    /// client should keep cookies, or the site may keep challenging it.
    pub fn with_client(client: reqwest::Client, config: ScraperConfig) -> Self {
        Self {
            http: client,
            config,
            observer: Arc::new(TracingObserver),
        }
    }

    /// Replace the default [`TracingObserver`].
    pub fn with_observer(mut self, observer: Arc<dyn ScrapeObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// Fetch the summary shown on a profile's landing page.
    #[instrument(skip(self))]
    pub async fn fetch_summary(&self, username: &str) -> Result<ProfileSummary> {
        scraper::summary::fetch_summary(&self.http, &self.config, username).await
    }

    /// Scrape every page of a profile's trophy log.
    ///
    /// `on_progress` receives the page number and the number of trophies on
    /// that page. `stop` is checked before each page; when it fires, the
    /// trophies gathered so far are returned.
    #[instrument(skip(self, on_progress, stop))]
    pub async fn scrape_log<P, C>(
        &self,
        username: &str,
        on_progress: P,
        stop: &C,
    ) -> Result<Vec<TrophyRecord>>
    where
        P: FnMut(u32, usize),
        C: StopSignal + ?Sized,
    {
        Ok(self.walk_log(username, on_progress, stop).await?.into_trophies())
    }

    async fn walk_log<P, C>(
        &self,
        username: &str,
        on_progress: P,
        stop: &C,
    ) -> Result<ScrapeOutcome>
    where
        P: FnMut(u32, usize),
        C: StopSignal + ?Sized,
    {
        let source = RemoteLog::new(&self.http, &self.config, username);
        scraper::log::scrape_pages(&source, &self.config, &self.observer, on_progress, stop).await
    }

    /// Load a full profile, from `cache` when possible.
    ///
    /// On a cache miss the summary and the whole trophy log are scraped and
    /// the result is cached. A cancelled scrape returns its partial log
    /// without caching it.
    #[instrument(skip(self, cache, on_progress, stop))]
    pub async fn load_profile<P, C>(
        &self,
        username: &str,
        cache: &CacheStore,
        on_progress: P,
        stop: &C,
    ) -> Result<ProfileLoad>
    where
        P: FnMut(u32, usize),
        C: StopSignal + ?Sized,
    {
        if let Some(snapshot) = cache.load(username).await {
            return Ok(ProfileLoad {
                snapshot,
                source: LoadSource::Cache,
            });
        }

        let profile_summary = self.fetch_summary(username).await?;
        if !profile_summary.has_trophy_totals() {
            return Err(TrophyError::ProfileNotFound {
                username: username.to_string(),
            });
        }
        info!(
            estimated_pages = profile_summary.estimated_pages(self.config.page_size),
            "profile not cached, fetching trophy log"
        );

        let outcome = self.walk_log(username, on_progress, stop).await?;
        let stopped = outcome.is_stopped();
        let snapshot = ProfileSnapshot {
            profile_summary,
            trophy_log: outcome.into_trophies(),
        };

        let source = if stopped {
            LoadSource::Stopped
        } else {
            cache.save(username, &snapshot).await;
            LoadSource::Scraped
        };

        Ok(ProfileLoad { snapshot, source })
    }
}
