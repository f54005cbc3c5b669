// Style classification from free-text descriptors.
//
// Maps a prompt such as "1920s jazz piano" onto one of a handful of groove
// categories that the transform engine knows how to play. Matching is a
// case-insensitive substring search against fixed keyword lists, checked in
// the priority order Swing, Funk, Rock, Reggae. Anything unmatched is Neutral.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StyleCategory {
    Swing,
    Rock,
    Funk,
    Reggae,
    Neutral,
}

const SWING_KEYWORDS: &[&str] = &[
    "jazz",
    "swing",
    "blues",
    "shuffle",
    "bebop",
    "dixieland",
    "ragtime",
    "big band",
];

const ROCK_KEYWORDS: &[&str] = &[
    "rock",
    "metal",
    "punk",
    "grunge",
    "hard rock",
    "classic rock",
    "alternative",
];

const FUNK_KEYWORDS: &[&str] = &["funk", "soul", "motown", "r&b", "neo-soul", "disco"];

const REGGAE_KEYWORDS: &[&str] = &["reggae", "ska", "dub", "dancehall"];

/// Categories in match priority order, with their keywords.
const PRIORITY: [(StyleCategory, &[&str]); 4] = [
    (StyleCategory::Swing, SWING_KEYWORDS),
    (StyleCategory::Funk, FUNK_KEYWORDS),
    (StyleCategory::Rock, ROCK_KEYWORDS),
    (StyleCategory::Reggae, REGGAE_KEYWORDS),
];

impl StyleCategory {
    /// Classify a style descriptor. Total: unknown text is `Neutral`.
    pub fn classify(style: &str) -> StyleCategory {
        let lower = style.to_lowercase();
        PRIORITY
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
            .map(|(category, _)| *category)
            .unwrap_or(StyleCategory::Neutral)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StyleCategory::Swing => "swing",
            StyleCategory::Rock => "rock",
            StyleCategory::Funk => "funk",
            StyleCategory::Reggae => "reggae",
            StyleCategory::Neutral => "neutral",
        }
    }
}

impl fmt::Display for StyleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
