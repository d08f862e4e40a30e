//! Operation kinds that quotas are tracked against.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GateError;

/// Expensive operation a request wants to run.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    TextAnalysis,
    UrlAnalysis,
    ImageAnalysis,
    #[default]
    General,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::TextAnalysis,
        Operation::UrlAnalysis,
        Operation::ImageAnalysis,
        Operation::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::TextAnalysis => "text_analysis",
            Operation::UrlAnalysis => "url_analysis",
            Operation::ImageAnalysis => "image_analysis",
            Operation::General => "general",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| GateError::UnknownOperation(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_operations() {
        for op in Operation::ALL {
            assert_eq!(op.as_str().parse::<Operation>().unwrap(), op);
        }
    }

    #[test]
    fn test_parse_unknown_operation() {
        assert!(matches!(
            "video_analysis".parse::<Operation>(),
            Err(GateError::UnknownOperation(_))
        ));
    }

    #[test]
    fn test_serde_matches_display() {
        let json = serde_json::to_string(&Operation::ImageAnalysis).unwrap();
        assert_eq!(json, format!("\"{}\"", Operation::ImageAnalysis));
    }
}
