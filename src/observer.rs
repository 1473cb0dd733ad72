use tracing::{debug, info};

/// Something notable that happened during a trophy log scrape.
#[derive(Debug, Clone, PartialEq)]
pub enum ScrapeEvent {
    Started {
        profile_url: String,
    },
    PageScraped {
        page: u32,
        trophies: usize,
    },
    /// The stop signal fired before the log was exhausted.
    Stopped {
        profile_url: String,
        pages_scraped: u32,
        trophies_found: usize,
    },
    Complete {
        profile_url: String,
        duration_seconds: f64,
        pages_scraped: u32,
        trophies_found: usize,
    },
}

/// Sink for scrape events. Built once by the caller and handed to the client.
pub trait ScrapeObserver: Send + Sync {
    fn log(&self, event: &ScrapeEvent);
}

/// Forwards every event to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ScrapeObserver for TracingObserver {
    fn log(&self, event: &ScrapeEvent) {
        match event {
            ScrapeEvent::Started { profile_url } => {
                info!(%profile_url, "starting full trophy log scrape");
            }
            ScrapeEvent::PageScraped { page, trophies } => {
                debug!(page, trophies, "scraped trophy log page");
            }
            ScrapeEvent::Stopped {
                profile_url,
                pages_scraped,
                trophies_found,
            } => {
                info!(
                    event = "scrape_stopped",
                    %profile_url,
                    pages_scraped,
                    trophies_found,
                    "trophy log scrape stopped"
                );
            }
            ScrapeEvent::Complete {
                profile_url,
                duration_seconds,
                pages_scraped,
                trophies_found,
            } => {
                info!(
                    event = "scrape_complete",
                    %profile_url,
                    duration_seconds = *duration_seconds,
                    pages_scraped,
                    trophies_found,
                    "trophy log scrape complete"
                );
            }
        }
    }
}

impl<T: ScrapeObserver + ?Sized> ScrapeObserver for std::sync::Arc<T> {
    fn log(&self, event: &ScrapeEvent) {
        (**self).log(event)
    }
}
