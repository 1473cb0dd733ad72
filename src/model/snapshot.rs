use serde::{Deserialize, Serialize};

use super::{ProfileSummary, TrophyRecord};

/// The complete result for one profile: summary plus full trophy log.
///
/// This is the unit stored by [`crate::CacheStore`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    pub profile_summary: ProfileSummary,
    #[serde(default)]
    pub trophy_log: Vec<TrophyRecord>,
}

/// Where the data returned by [`crate::TrophyClient::load_profile`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum LoadSource {
    /// A fresh cache entry was found; no request was made.
    Cache,
    /// The whole trophy log was scraped.
    Scraped,
    /// The scrape was cancelled; the trophy log is partial.
    Stopped,
}

/// A loaded profile together with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileLoad {
    pub snapshot: ProfileSnapshot,
    pub source: LoadSource,
}

impl ProfileLoad {
    /// Whether the trophy log may be missing entries.
    pub fn is_partial(&self) -> bool {
        self.source == LoadSource::Stopped
    }
}
