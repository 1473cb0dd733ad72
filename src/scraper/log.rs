use std::future::Future;
use std::str::FromStr;
use std::time::Instant;

use ::scraper::{ElementRef, Selector};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::ScraperConfig;
use crate::error::Result;
use crate::model::{Grade, TrophyRecord, NOT_AVAILABLE};
use crate::observer::{ScrapeEvent, ScrapeObserver};
use crate::scraper::{self, select_text, FetchedPage, Html};
use crate::stop::StopSignal;

/// Rows with fewer cells are headers, spacers or ads.
const MIN_LOG_CELLS: usize = 10;

/// A paginated trophy log the driver can walk.
pub trait PageSource {
    /// Address of the profile being crawled, used in log events.
    fn profile_url(&self) -> &str;

    /// Fetch one 1-based page of the log.
    fn fetch_log_page(&self, page: u32) -> impl Future<Output = Result<FetchedPage>> + Send;
}

/// The trophy log of one profile on the live site.
pub(crate) struct RemoteLog<'a> {
    client: &'a reqwest::Client,
    config: &'a ScraperConfig,
    username: &'a str,
    profile_url: String,
}

impl<'a> RemoteLog<'a> {
    pub(crate) fn new(
        client: &'a reqwest::Client,
        config: &'a ScraperConfig,
        username: &'a str,
    ) -> Self {
        Self {
            client,
            config,
            username,
            profile_url: config.profile_url(username),
        }
    }
}

impl PageSource for RemoteLog<'_> {
    fn profile_url(&self) -> &str {
        &self.profile_url
    }

    async fn fetch_log_page(&self, page: u32) -> Result<FetchedPage> {
        let url = self.config.log_page_url(self.username, page);
        scraper::fetch_page(
            self.client,
            &url,
            &self.profile_url,
            self.config.request_timeout(),
        )
        .await
    }
}

/// How a trophy log walk ended, with the records it collected.
#[derive(Debug, Clone, PartialEq)]
pub enum ScrapeOutcome {
    /// The log was exhausted.
    Complete(Vec<TrophyRecord>),
    /// The stop signal fired first; the records are a prefix of the log.
    Stopped(Vec<TrophyRecord>),
}

impl ScrapeOutcome {
    pub fn is_stopped(&self) -> bool {
        matches!(self, ScrapeOutcome::Stopped(_))
    }

    pub fn trophies(&self) -> &[TrophyRecord] {
        match self {
            ScrapeOutcome::Complete(trophies) | ScrapeOutcome::Stopped(trophies) => trophies,
        }
    }

    pub fn into_trophies(self) -> Vec<TrophyRecord> {
        match self {
            ScrapeOutcome::Complete(trophies) | ScrapeOutcome::Stopped(trophies) => trophies,
        }
    }
}

/// Walk every page of a trophy log and collect its records in page order.
///
/// Before each fetch `stop` is polled; once it fires the records gathered so
/// far are returned as [`ScrapeOutcome::Stopped`]. The walk ends at the first
/// 404 page or the first page without any readable row. A network error aborts the walk, after
/// `config.page_retries` extra attempts for that page.
pub async fn scrape_pages<S, O, P, C>(
    source: &S,
    config: &ScraperConfig,
    observer: &O,
    mut on_progress: P,
    stop: &C,
) -> Result<ScrapeOutcome>
where
    S: PageSource + ?Sized,
    O: ScrapeObserver + ?Sized,
    P: FnMut(u32, usize),
    C: StopSignal + ?Sized,
{
    let started = Instant::now();
    let profile_url = source.profile_url().to_string();
    observer.log(&ScrapeEvent::Started {
        profile_url: profile_url.clone(),
    });

    let mut trophies = Vec::new();
    let mut page = 1;

    loop {
        if stop.should_stop() {
            observer.log(&ScrapeEvent::Stopped {
                profile_url,
                pages_scraped: page - 1,
                trophies_found: trophies.len(),
            });
            return Ok(ScrapeOutcome::Stopped(trophies));
        }

        let FetchedPage::Document(body) = fetch_with_retries(source, config, page).await? else {
            debug!(page, "no more trophy log pages");
            break;
        };

        let records = parse_log_page(&Html::parse_document(&body))?;
        if records.is_empty() {
            debug!(page, "trophy log page has no rows");
            break;
        }

        let count = records.len();
        trophies.extend(records);
        observer.log(&ScrapeEvent::PageScraped {
            page,
            trophies: count,
        });
        on_progress(page, count);
        page += 1;

        sleep(config.page_delay).await;
    }

    let duration = started.elapsed().as_secs_f64();
    observer.log(&ScrapeEvent::Complete {
        profile_url,
        duration_seconds: (duration * 100.0).round() / 100.0,
        pages_scraped: page - 1,
        trophies_found: trophies.len(),
    });

    Ok(ScrapeOutcome::Complete(trophies))
}

async fn fetch_with_retries<S>(source: &S, config: &ScraperConfig, page: u32) -> Result<FetchedPage>
where
    S: PageSource + ?Sized,
{
    let mut attempt = 0;
    loop {
        match source.fetch_log_page(page).await {
            Err(err) if err.is_network() && attempt < config.page_retries => {
                attempt += 1;
                warn!(page, attempt, error = %err, "retrying trophy log page");
                sleep(config.retry_backoff * attempt).await;
            }
            result => return result,
        }
    }
}

/// Parse one page of a trophy log.
///
/// Rows that are too short or miss a required attribute are skipped; the
/// rest of the page is still returned.
pub fn parse_log_page(document: &Html) -> Result<Vec<TrophyRecord>> {
    let table_selector = Selector::parse("table.zebra")?;
    let Some(table) = document.select(&table_selector).next() else {
        return Ok(Vec::new());
    };

    let selectors = RowSelectors::new()?;
    let row_selector = Selector::parse("tr")?;

    let records = table
        .select(&row_selector)
        .filter_map(|row| {
            let cells: Vec<ElementRef> = row.select(&selectors.cell).collect();
            if cells.len() < MIN_LOG_CELLS {
                return None;
            }
            match parse_log_row(&cells, &selectors) {
                Ok(record) => Some(record),
                Err(reason) => {
                    debug!(reason, "skipping malformed trophy log row");
                    None
                }
            }
        })
        .collect();

    Ok(records)
}

struct RowSelectors {
    cell: Selector,
    img: Selector,
    title: Selector,
    date: Selector,
    time: Selector,
    rarity: Selector,
}

impl RowSelectors {
    fn new() -> Result<Self> {
        Ok(Self {
            cell: Selector::parse("td")?,
            img: Selector::parse("img")?,
            title: Selector::parse("a.title")?,
            date: Selector::parse("span.typo-top-date")?,
            time: Selector::parse("span.typo-bottom-date")?,
            rarity: Selector::parse("span.typo-top")?,
        })
    }
}

/// Cells: 0 game icon, 1 trophy icon, 2 title, 5 date/time, 8 rarity, 9 grade.
fn parse_log_row(
    cells: &[ElementRef],
    selectors: &RowSelectors,
) -> std::result::Result<TrophyRecord, &'static str> {
    let game = img_attr(&cells[0], &selectors.img, "title").ok_or("game icon has no title")?;
    let icon_url = img_attr(&cells[1], &selectors.img, "src").ok_or("trophy icon has no src")?;

    let title = select_text(&cells[2], &selectors.title)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let date = select_text(&cells[5], &selectors.date).unwrap_or_default();
    let time = select_text(&cells[5], &selectors.time).unwrap_or_default();
    let timestamp = format!("{date} {time}").trim().to_string();

    let rarity_percent = select_text(&cells[8], &selectors.rarity)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let grade = cells[9]
        .select(&selectors.img)
        .next()
        .ok_or("grade icon missing")?
        .value()
        .attr("title")
        .ok_or("grade icon has no title")?;
    let grade = Grade::from_str(grade.trim()).map_err(|_| "unknown grade")?;

    Ok(TrophyRecord {
        game,
        icon_url,
        title,
        timestamp,
        rarity_percent,
        grade,
    })
}

/// Attribute of the first `img` in `cell`. A missing image yields the
/// sentinel; an image without the attribute yields `None`.
fn img_attr(cell: &ElementRef, img_selector: &Selector, attr: &str) -> Option<String> {
    match cell.select(img_selector).next() {
        None => Some(NOT_AVAILABLE.to_string()),
        Some(img) => img.value().attr(attr).map(str::to_string),
    }
}
