use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum_macros::EnumString;

/// Sentinel used for fields that could not be extracted from a page.
pub const NOT_AVAILABLE: &str = "N/A";

const TIMESTAMP_FORMAT: &str = "%d %b %Y %I:%M:%S %p";

/// The grade of a single earned trophy.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    strum_macros::Display,
)]
#[strum(ascii_case_insensitive)]
pub enum Grade {
    Platinum,
    Gold,
    Silver,
    Bronze,
}

/// One entry of a profile's trophy log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrophyRecord {
    pub game: String,
    pub icon_url: String,
    pub title: String,
    /// Date and time as shown on the site, e.g. `"5th Mar 2024 9:14:03 PM"`.
    pub timestamp: String,
    /// Rarity as shown on the site, e.g. `"3.2%"`, or `"N/A"`.
    pub rarity_percent: String,
    pub grade: Grade,
}

impl TrophyRecord {
    /// Parse the site-native timestamp. Returns `None` if it does not match
    /// the expected `5th Mar 2024 9:14:03 PM` shape.
    pub fn earned_at(&self) -> Option<NaiveDateTime> {
        let (day, rest) = self.timestamp.trim().split_once(' ')?;
        let day = day.trim_end_matches(|c: char| c.is_ascii_alphabetic());
        NaiveDateTime::parse_from_str(&format!("{day} {rest}"), TIMESTAMP_FORMAT).ok()
    }

    /// Numeric rarity in percent, if the site reported one.
    pub fn rarity(&self) -> Option<f32> {
        self.rarity_percent
            .trim()
            .trim_end_matches('%')
            .trim()
            .parse()
            .ok()
    }
}
