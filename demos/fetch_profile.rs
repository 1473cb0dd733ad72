use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use trophy_scraper::{CacheStore, ScraperConfig, TrophyClient, TrophyError, TrophyTier};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trophy_scraper=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let Some(username) = std::env::args().nth(1) else {
        eprintln!("usage: fetch_profile <psn username>");
        std::process::exit(2);
    };

    let config = ScraperConfig::default().with_page_retries(1, Duration::from_secs(5));
    let client = TrophyClient::with_config(config).expect("failed to build http client");
    let cache = CacheStore::open_default()
        .await
        .expect("failed to create cache directory");

    // Ctrl-C stops the scrape at the next page boundary.
    let stop = CancellationToken::new();
    let on_ctrl_c = stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("stopping after the current page...");
            on_ctrl_c.cancel();
        }
    });

    let result = client
        .load_profile(
            &username,
            &cache,
            |page, count| println!("page {page}: {count} trophies"),
            &stop,
        )
        .await;

    match result {
        Ok(profile) => {
            let summary = &profile.snapshot.profile_summary;
            println!(
                "{} ({}): {} trophies listed, {} platinum, {} in log",
                summary.username,
                profile.source,
                summary.trophies(TrophyTier::Total).unwrap_or_default(),
                summary.trophies(TrophyTier::Platinum).unwrap_or_default(),
                profile.snapshot.trophy_log.len(),
            );
            if let Some(latest) = profile.snapshot.trophy_log.first() {
                println!(
                    "latest: {} [{}] in {} at {}",
                    latest.title, latest.grade, latest.game, latest.timestamp
                );
            }
            if profile.is_partial() {
                println!("scraping was stopped, showing partial results");
            }
        }
        Err(TrophyError::ProfileNotFound { username }) => {
            eprintln!("could not find profile '{username}', check the name and try again");
            std::process::exit(1);
        }
        Err(err) => {
            eprintln!("network error, the profile may be private or the name wrong: {err}");
            std::process::exit(1);
        }
    }
}
