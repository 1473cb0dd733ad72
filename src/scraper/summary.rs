use std::collections::BTreeMap;

use ::scraper::{ElementRef, Selector};
use strum::IntoEnumIterator;
use tracing::{debug, instrument, warn};

use crate::config::ScraperConfig;
use crate::error::{Result, TrophyError};
use crate::model::{ProfileSummary, TrophyTier, NOT_AVAILABLE};
use crate::scraper::{self, select_text, FetchedPage, Html};

/// Fetch a profile's landing page and parse its summary.
#[instrument(skip(client, config))]
pub(crate) async fn fetch_summary(
    client: &reqwest::Client,
    config: &ScraperConfig,
    username: &str,
) -> Result<ProfileSummary> {
    let url = config.profile_url(username);
    let page = scraper::fetch_page(client, &url, &url, config.request_timeout()).await?;
    let FetchedPage::Document(body) = page else {
        return Err(TrophyError::UnexpectedStatus {
            url,
            status: reqwest::StatusCode::NOT_FOUND,
        });
    };

    let summary = parse_summary(&Html::parse_document(&body))?;
    debug!(
        username = %summary.username,
        tiers = summary.total_trophies.len(),
        stats = summary.stats.len(),
        "parsed profile summary"
    );
    Ok(summary)
}

/// Parse the user bar and stats block of a profile page.
///
/// Returns an empty summary when the user bar is missing, which callers treat
/// as "profile not found".
pub fn parse_summary(document: &Html) -> Result<ProfileSummary> {
    let mut summary = ProfileSummary::default();

    let user_bar_selector = Selector::parse("div#user-bar")?;
    let Some(user_bar) = document.select(&user_bar_selector).next() else {
        return Ok(summary);
    };

    let username_selector = Selector::parse("span.username")?;
    summary.username = select_text(&user_bar, &username_selector)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let avatar_selector = Selector::parse("div.avatar img")?;
    summary.avatar_url = user_bar
        .select(&avatar_selector)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(str::to_string)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    summary.total_trophies = parse_trophy_counts(&user_bar)?;

    let stats_selector = Selector::parse("div.stats")?;
    if let Some(stats) = document.select(&stats_selector).next() {
        summary.stats = parse_stats(&stats)?;
    }

    Ok(summary)
}

fn parse_trophy_counts(user_bar: &ElementRef) -> Result<BTreeMap<TrophyTier, u64>> {
    let mut counts = BTreeMap::new();
    for tier in TrophyTier::iter() {
        let selector = Selector::parse(&format!("li.{tier}"))?;
        let Some(text) = select_text(user_bar, &selector) else {
            continue;
        };
        match parse_count(&text) {
            Some(count) => {
                counts.insert(tier, count);
            }
            None => warn!(%tier, text = %text, "unreadable trophy count"),
        }
    }
    Ok(counts)
}

/// Parse a count like `"1,234"`.
pub(crate) fn parse_count(text: &str) -> Option<u64> {
    text.trim().replace(',', "").parse().ok()
}

/// Each stat looks like `<span class="stat">1,234 <span>Games Played</span></span>`.
fn parse_stats(stats: &ElementRef) -> Result<BTreeMap<String, String>> {
    let stat_selector = Selector::parse("span.stat")?;
    let label_selector = Selector::parse("span")?;

    let mut parsed = BTreeMap::new();
    for stat in stats.select(&stat_selector) {
        let Some(label) = select_text(&stat, &label_selector) else {
            debug!("skipping stat without a label");
            continue;
        };
        let Some(value) = stat
            .children()
            .next()
            .and_then(|node| node.value().as_text())
            .map(|text| text.trim().replace(',', ""))
        else {
            debug!(label = %label, "skipping stat without a leading value");
            continue;
        };
        parsed.insert(label, value);
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILE_PAGE: &str = r#"
        <html><body>
        <div id="user-bar">
            <div class="avatar"><img src="https://i.psnprofiles.com/avatars/m/Gb3a4f.png"></div>
            <span class="username">Hakoom</span>
            <ul class="profile-bar">
                <li class="total">12,345</li>
                <li class="platinum">  210 </li>
                <li class="gold">1,021</li>
                <li class="silver">2,604</li>
                <li class="bronze">8,510</li>
            </ul>
        </div>
        <div class="stats flex">
            <span class="stat">1,402 <span>Games Played</span></span>
            <span class="stat">87.55% <span>Completion</span></span>
            <span class="stat">orphan</span>
        </div>
        </body></html>
    "#;

    #[test]
    fn test_parse_summary() {
        let summary = parse_summary(&Html::parse_document(PROFILE_PAGE)).unwrap();

        assert_eq!(summary.username, "Hakoom");
        assert_eq!(
            summary.avatar_url,
            "https://i.psnprofiles.com/avatars/m/Gb3a4f.png"
        );
        assert_eq!(summary.total_trophies.len(), 5);
        assert_eq!(summary.trophies(TrophyTier::Total), Some(12345));
        assert_eq!(summary.trophies(TrophyTier::Platinum), Some(210));
        assert_eq!(summary.trophies(TrophyTier::Gold), Some(1021));
        assert_eq!(summary.trophies(TrophyTier::Silver), Some(2604));
        assert_eq!(summary.trophies(TrophyTier::Bronze), Some(8510));

        assert_eq!(summary.stats.len(), 2);
        assert_eq!(summary.stats["Games Played"], "1402");
        assert_eq!(summary.stats["Completion"], "87.55%");
    }

    #[test]
    fn test_parse_summary_without_user_bar() {
        let document = Html::parse_document("<html><body><h1>404</h1></body></html>");
        let summary = parse_summary(&document).unwrap();
        assert_eq!(summary, ProfileSummary::default());
        assert!(!summary.has_trophy_totals());
    }

    #[test]
    fn test_parse_summary_degrades_fields() {
        let document = Html::parse_document(
            r#"<div id="user-bar">
                <li class="total">n/a</li>
                <li class="gold">3</li>
            </div>"#,
        );
        let summary = parse_summary(&document).unwrap();
        assert_eq!(summary.username, NOT_AVAILABLE);
        assert_eq!(summary.avatar_url, NOT_AVAILABLE);
        assert_eq!(summary.total_trophies.len(), 1);
        assert_eq!(summary.trophies(TrophyTier::Gold), Some(3));
        assert!(summary.stats.is_empty());
    }

    #[test]
    fn test_stat_without_leading_text_is_skipped() {
        let document = Html::parse_document(
            r#"<div id="user-bar"><li class="total">1</li></div>
            <div class="stats">
                <span class="stat"><b>1,402</b> <span>Games Played</span></span>
                <span class="stat">15 <span>World Rank</span></span>
            </div>"#,
        );
        let summary = parse_summary(&document).unwrap();
        assert_eq!(summary.stats.len(), 1);
        assert_eq!(summary.stats["World Rank"], "15");
        assert!(!summary.stats.contains_key("Games Played"));
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("1,234"), Some(1234));
        assert_eq!(parse_count(" 1,234,567 "), Some(1_234_567));
        assert_eq!(parse_count(""), None);
        assert_eq!(parse_count("-"), None);
    }

    #[tokio::test]
    #[ignore = "hits psnprofiles.com"]
    async fn test_fetch_summary_live() {
        let config = ScraperConfig::default();
        let client = scraper::build_http_client(&config).unwrap();
        let summary = fetch_summary(&client, &config, "ikemenzi").await.unwrap();
        assert!(summary.has_trophy_totals());
        assert!(summary.trophies(TrophyTier::Total).unwrap_or_default() > 0);
    }
}
