//! Log entries and inventory items.
//!
//! Categories are closed enums; anything outside them is rejected when a
//! save file is parsed and when the narrator calls a logging tool.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// A category string that is not part of the expected set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown category '{value}' (expected one of: {expected})")]
pub struct UnknownCategory {
    pub value: String,
    pub expected: String,
}

/// Kind of game-log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameLogCategory {
    #[default]
    Event,
    Discovery,
    Decision,
    Question,
    Item,
    Ambient,
}

impl GameLogCategory {
    pub const ALL: [GameLogCategory; 6] = [
        GameLogCategory::Event,
        GameLogCategory::Discovery,
        GameLogCategory::Decision,
        GameLogCategory::Question,
        GameLogCategory::Item,
        GameLogCategory::Ambient,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GameLogCategory::Event => "event",
            GameLogCategory::Discovery => "discovery",
            GameLogCategory::Decision => "decision",
            GameLogCategory::Question => "question",
            GameLogCategory::Item => "item",
            GameLogCategory::Ambient => "ambient",
        }
    }
}

/// Kind of research-log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResearchCategory {
    #[default]
    Info,
    Symbol,
    Historical,
    Technical,
    Psychological,
    Warning,
}

impl ResearchCategory {
    pub const ALL: [ResearchCategory; 6] = [
        ResearchCategory::Info,
        ResearchCategory::Symbol,
        ResearchCategory::Historical,
        ResearchCategory::Technical,
        ResearchCategory::Psychological,
        ResearchCategory::Warning,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResearchCategory::Info => "info",
            ResearchCategory::Symbol => "symbol",
            ResearchCategory::Historical => "historical",
            ResearchCategory::Technical => "technical",
            ResearchCategory::Psychological => "psychological",
            ResearchCategory::Warning => "warning",
        }
    }
}

macro_rules! category_traits {
    ($ty:ty) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = UnknownCategory;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                <$ty>::ALL
                    .iter()
                    .copied()
                    .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| UnknownCategory {
                        value: s.to_string(),
                        expected: <$ty>::ALL
                            .iter()
                            .map(|c| c.as_str())
                            .collect::<Vec<_>>()
                            .join(", "),
                    })
            }
        }
    };
}

category_traits!(GameLogCategory);
category_traits!(ResearchCategory);

/// Current time as fractional seconds since the Unix epoch.
pub fn now_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

/// One line of the narrative timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameLogEntry {
    pub category: GameLogCategory,
    pub entry: String,
    #[serde(rename = "ts", default = "now_timestamp")]
    pub timestamp: f64,
}

impl GameLogEntry {
    /// Create an entry stamped with the current time.
    pub fn new(category: GameLogCategory, entry: impl Into<String>) -> Self {
        Self {
            category,
            entry: entry.into(),
            timestamp: now_timestamp(),
        }
    }
}

/// One fact gathered by the research agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchLogEntry {
    pub category: ResearchCategory,
    pub entry: String,
    #[serde(rename = "ts", default = "now_timestamp")]
    pub timestamp: f64,
}

impl ResearchLogEntry {
    /// Create an entry stamped with the current time.
    pub fn new(category: ResearchCategory, entry: impl Into<String>) -> Self {
        Self {
            category,
            entry: entry.into(),
            timestamp: now_timestamp(),
        }
    }
}

/// Something the player is carrying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl InventoryItem {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_category_parse_is_case_insensitive() {
        assert_eq!("Ambient".parse::<GameLogCategory>(), Ok(GameLogCategory::Ambient));
        assert_eq!(" warning ".parse::<ResearchCategory>(), Ok(ResearchCategory::Warning));
    }

    #[test]
    fn test_unknown_category_lists_expected_values() {
        let err = "gossip".parse::<GameLogCategory>().unwrap_err();
        assert_eq!(err.value, "gossip");
        assert!(err.expected.contains("discovery"));
        assert!(err.to_string().contains("gossip"));
    }

    #[test]
    fn test_display_matches_serde_name() {
        for category in GameLogCategory::ALL {
            let serialized = serde_json::to_value(category).unwrap();
            assert_eq!(serialized, json!(category.to_string()));
        }
        for category in ResearchCategory::ALL {
            let serialized = serde_json::to_value(category).unwrap();
            assert_eq!(serialized, json!(category.to_string()));
        }
    }

    #[test]
    fn test_entry_serializes_timestamp_as_ts() {
        let entry = GameLogEntry {
            category: GameLogCategory::Discovery,
            entry: "A hidden camera".to_string(),
            timestamp: 1_700_000_000.5,
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            value,
            json!({"category": "discovery", "entry": "A hidden camera", "ts": 1_700_000_000.5})
        );
    }

    #[test]
    fn test_item_description_defaults_to_empty() {
        let item: InventoryItem = serde_json::from_value(json!({"name": "phone"})).unwrap();
        assert_eq!(item, InventoryItem::new("phone", ""));
    }

    #[test]
    fn test_strict_category_on_decode() {
        let result: Result<ResearchLogEntry, _> =
            serde_json::from_value(json!({"category": "rumour", "entry": "x", "ts": 1.0}));
        assert!(result.is_err());
    }

    #[test]
    fn test_new_entries_are_stamped() {
        let before = now_timestamp();
        let entry = ResearchLogEntry::new(ResearchCategory::Info, "fact");
        assert!(entry.timestamp >= before);
    }
}
