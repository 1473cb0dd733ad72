//! Scrape and cache PlayStation trophy profiles from psnprofiles.com.
//!
//! [`TrophyClient`] fetches a profile's summary and walks its paginated
//! trophy log; [`CacheStore`] keeps complete snapshots on disk for a day so
//! repeated lookups skip the network.

pub use cache::{CacheStore, CACHE_EXPIRATION, DEFAULT_CACHE_DIR};
pub use client::TrophyClient;
pub use config::{process_page_delay, ScraperConfig, BASE_URL, DEFAULT_USER_AGENT};
pub use error::{Result, TrophyError};
pub use model::*;
pub use observer::{ScrapeEvent, ScrapeObserver, TracingObserver};
pub use crate::scraper::log::{parse_log_page, scrape_pages, PageSource, ScrapeOutcome};
pub use crate::scraper::summary::parse_summary;
pub use crate::scraper::FetchedPage;
pub use ::scraper::Html;
pub use stop::{NeverStop, StopSignal};

pub mod cache;
mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod observer;
pub(crate) mod scraper;
pub mod stop;
