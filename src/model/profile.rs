use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum_macros::EnumIter;

/// Number of trophies listed per page of a profile's trophy log.
pub const LOG_PAGE_SIZE: u32 = 50;

/// A trophy tier as counted on a profile's user bar.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TrophyTier {
    Total,
    Platinum,
    Gold,
    Silver,
    Bronze,
}

/// Summary data scraped from a profile's landing page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub username: String,
    pub avatar_url: String,
    #[serde(default)]
    pub total_trophies: BTreeMap<TrophyTier, u64>,
    #[serde(default)]
    pub stats: BTreeMap<String, String>,
}

impl ProfileSummary {
    /// Whether any trophy count was found. A summary without counts means the
    /// profile does not exist or is private.
    pub fn has_trophy_totals(&self) -> bool {
        !self.total_trophies.is_empty()
    }

    /// Count for a single tier, if the page listed it.
    pub fn trophies(&self, tier: TrophyTier) -> Option<u64> {
        self.total_trophies.get(&tier).copied()
    }

    /// Advisory number of trophy log pages, for progress display only.
    pub fn estimated_pages(&self, page_size: u32) -> u64 {
        let total = self.trophies(TrophyTier::Total).unwrap_or_default();
        if page_size == 0 {
            return 0;
        }
        total.div_ceil(u64::from(page_size))
    }
}
