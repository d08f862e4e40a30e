//! Cache Category Module
//!
//! Partitions cache entries by data kind; each kind has its own default TTL.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GateError;

// == Category ==
/// Kind of data stored in a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Final credibility reports
    Analysis,
    /// Web search results for a query
    #[serde(rename = "search", alias = "search_results")]
    SearchResults,
    /// Extracted text of a fetched URL
    UrlContent,
    /// Source reputation lookups
    SourceVerification,
    /// Per-user statistics snapshots
    UserStats,
    Default,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Analysis,
        Category::SearchResults,
        Category::UrlContent,
        Category::SourceVerification,
        Category::UserStats,
        Category::Default,
    ];

    /// Name mixed into the key digest and used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Analysis => "analysis",
            Category::SearchResults => "search",
            Category::UrlContent => "url_content",
            Category::SourceVerification => "source_verification",
            Category::UserStats => "user_stats",
            Category::Default => "default",
        }
    }

    /// Built-in TTL in seconds.
    pub fn default_ttl_secs(&self) -> u64 {
        match self {
            Category::Analysis => 7200,
            Category::SearchResults => 1800,
            Category::UrlContent => 3600,
            Category::SourceVerification => 1800,
            Category::UserStats => 300,
            Category::Default => 1800,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "analysis" => Ok(Category::Analysis),
            "search" | "search_results" => Ok(Category::SearchResults),
            "url_content" => Ok(Category::UrlContent),
            "source_verification" => Ok(Category::SourceVerification),
            "user_stats" => Ok(Category::UserStats),
            "default" => Ok(Category::Default),
            other => Err(GateError::UnknownCategory(other.to_string())),
        }
    }
}
