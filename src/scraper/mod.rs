pub(crate) mod log;
pub(crate) mod summary;

use std::time::Duration;

pub(crate) use ::scraper::Html;
use ::scraper::{ElementRef, Selector};
use itertools::Itertools;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::StatusCode;
use tracing::debug;

use crate::config::ScraperConfig;
use crate::error::{Result, TrophyError};

/// Body of a fetched page, or the site's "nothing here" answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchedPage {
    Document(String),
    /// The server answered 404. On the trophy log this means the previous
    /// page was the last one.
    Exhausted,
}

/// Build a client that looks enough like a browser for the site's bot
/// checks: it keeps cookies between requests and sends the usual `Accept`
/// headers, while still naming itself honestly in `User-Agent`.
pub(crate) fn build_http_client(config: &ScraperConfig) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        ),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.9"),
    );

    reqwest::Client::builder()
        .user_agent(config.user_agent.clone())
        .default_headers(headers)
        .cookie_store(true)
        .gzip(true)
        .brotli(true)
        .build()
        .map_err(TrophyError::Client)
}

/// Fetch a URL and return its body text.
pub(crate) async fn fetch_page(
    client: &reqwest::Client,
    url: &str,
    referer: &str,
    timeout: Duration,
) -> Result<FetchedPage> {
    debug!(url, timeout_ms = timeout.as_millis() as u64, "fetching page");

    let response = client
        .get(url)
        .header(header::REFERER, referer)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| TrophyError::Http {
            url: url.to_owned(),
            source: e,
        })?;

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Ok(FetchedPage::Exhausted);
    }
    if !status.is_success() {
        return Err(TrophyError::UnexpectedStatus {
            url: url.to_owned(),
            status,
        });
    }

    let body = response.text().await.map_err(|e| TrophyError::ResponseBody {
        url: url.to_owned(),
        source: e,
    })?;

    Ok(FetchedPage::Document(body))
}

/// Text content of an element, trimmed at both ends.
pub(crate) fn element_text(element: &ElementRef) -> String {
    element.text().join("").trim().to_string()
}

/// Text of the first element matching `selector` inside `element`, or
/// `None` if nothing matches.
pub(crate) fn select_text(element: &ElementRef, selector: &Selector) -> Option<String> {
    element.select(selector).next().map(|e| element_text(&e))
}
