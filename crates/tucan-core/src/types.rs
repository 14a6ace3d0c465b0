use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Time zone in which all human-visible timestamps are interpreted.
/// Costa Rica does not observe DST, so local times are never ambiguous.
pub const SITE_TZ: Tz = chrono_tz::America::Costa_Rica;

/// Language the summarizer writes in.
pub const SUMMARY_LANG: &str = "en";
/// Language the translator produces; the channel posts this one.
pub const TRANSLATION_LANG: &str = "ru";
/// Spelled-out form handed to the translator prompt.
pub const TRANSLATION_LANGUAGE: &str = "Russian";

/// Sentinel category for articles that never received a proper one.
/// Kept out of every catalog the agents see.
pub const UNKNOWN_CATEGORY: &str = "__unknown__";
pub const UNKNOWN_CATEGORY_DESCRIPTION: &str = "Internal category used only for database \
     tracking of news articles that have not yet been assigned a proper category";

/// How an article relates to Costa Rica, as decided by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    /// Explicit mention of Costa Rica: locations, people, institutions.
    Directly,
    /// Clear, stated impact on Costa Rica.
    Indirectly,
    /// No mention and no stated connection.
    Na,
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Relation::Directly => "directly",
            Relation::Indirectly => "indirectly",
            Relation::Na => "na",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Relation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "directly" => Ok(Relation::Directly),
            "indirectly" => Ok(Relation::Indirectly),
            "na" => Ok(Relation::Na),
            other => Err(format!("unknown relation: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relation_round_trips_through_strings() {
        for r in [Relation::Directly, Relation::Indirectly, Relation::Na] {
            assert_eq!(r.to_string().parse::<Relation>().unwrap(), r);
        }
        assert!("somewhat".parse::<Relation>().is_err());
    }
}
