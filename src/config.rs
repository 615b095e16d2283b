use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Widget configuration
// ---------------------------------------------------------------------------

/// One selectable time range, e.g. `{ "key": "30d", "name": "Last 30 days" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeOption {
    pub key: String,
    pub name: String,
}

impl RangeOption {
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
        }
    }
}

/// A dependent filter: the candidate list comes from `query`, each candidate
/// is shown by its `display_using` field and passed to the series query as
/// `foreign_key: <id>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDescriptor {
    #[serde(alias = "graphql_query")]
    pub query: String,
    pub foreign_key: String,
    pub display_using: String,
}

/// Everything a trend widget is configured with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetConfig {
    pub name: String,
    #[serde(alias = "graphql_query")]
    pub query: String,
    pub ranges: Vec<RangeOption>,
    #[serde(default)]
    pub relation: Option<RelationDescriptor>,
    #[serde(default = "default_show_band")]
    pub show_standard_deviation: bool,
}

fn default_show_band() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("widget '{0}' has no query identifier")]
    MissingQuery(String),
    #[error("widget '{0}' declares no ranges")]
    NoRanges(String),
    #[error("range key '{0}' is declared more than once")]
    DuplicateRange(String),
    #[error("relation field '{0}' is empty")]
    InvalidRelation(&'static str),
}

impl WidgetConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.query.trim().is_empty() {
            return Err(ConfigError::MissingQuery(self.name.clone()));
        }
        if self.ranges.is_empty() {
            return Err(ConfigError::NoRanges(self.name.clone()));
        }

        let mut seen = BTreeSet::new();
        for range in &self.ranges {
            if !seen.insert(range.key.as_str()) {
                return Err(ConfigError::DuplicateRange(range.key.clone()));
            }
        }

        if let Some(rel) = &self.relation {
            if rel.query.trim().is_empty() {
                return Err(ConfigError::InvalidRelation("graphql_query"));
            }
            if rel.foreign_key.trim().is_empty() {
                return Err(ConfigError::InvalidRelation("foreign_key"));
            }
            if rel.display_using.trim().is_empty() {
                return Err(ConfigError::InvalidRelation("display_using"));
            }
        }
        Ok(())
    }

    /// The range selected when the widget mounts.
    pub fn default_range(&self) -> Option<&RangeOption> {
        self.ranges.first()
    }

    pub fn range(&self, key: &str) -> Option<&RangeOption> {
        self.ranges.iter().find(|r| r.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> WidgetConfig {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_parses_widget_props() {
        let cfg = parse(
            r#"{
                "name": "Revenue",
                "graphql_query": "revenueTrend",
                "ranges": [{"key": "30d", "name": "30 days"}, {"key": "90d", "name": "90 days"}],
                "relation": {"graphql_query": "stores", "foreign_key": "store_id", "display_using": "name"}
            }"#,
        );
        assert_eq!(cfg.query, "revenueTrend");
        assert!(cfg.show_standard_deviation);
        assert_eq!(cfg.default_range().unwrap().key, "30d");
        assert_eq!(cfg.relation.as_ref().unwrap().foreign_key, "store_id");
        assert_eq!(cfg.validate(), Ok(()));
    }

    #[test]
    fn test_rejects_empty_ranges() {
        let cfg = parse(r#"{"name": "X", "query": "x", "ranges": []}"#);
        assert_eq!(cfg.validate(), Err(ConfigError::NoRanges("X".into())));
    }

    #[test]
    fn test_rejects_duplicate_range() {
        let cfg = parse(
            r#"{"name": "X", "query": "x", "show_standard_deviation": false,
                "ranges": [{"key": "a", "name": "A"}, {"key": "a", "name": "B"}]}"#,
        );
        assert!(!cfg.show_standard_deviation);
        assert_eq!(cfg.validate(), Err(ConfigError::DuplicateRange("a".into())));
    }

    #[test]
    fn test_rejects_blank_relation_field() {
        let cfg = parse(
            r#"{"name": "X", "query": "x", "ranges": [{"key": "a", "name": "A"}],
                "relation": {"query": "stores", "foreign_key": " ", "display_using": "name"}}"#,
        );
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::InvalidRelation("foreign_key"))
        );
    }

    #[test]
    fn test_rejects_blank_query() {
        let cfg = parse(r#"{"name": "X", "query": "", "ranges": [{"key": "a", "name": "A"}]}"#);
        assert_eq!(cfg.validate(), Err(ConfigError::MissingQuery("X".into())));
    }
}
