use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

use super::loader;
use super::model::{json_scalar_to_string, Observation, RelationOption};
use super::source::{FetchError, QuerySource, RelationQuery, SeriesQuery};
use crate::config::WidgetConfig;

// ---------------------------------------------------------------------------
// Fixture file layout
// ---------------------------------------------------------------------------

/// Expected JSON document:
///
/// ```json
/// {
///   "widget": { "name": "...", "graphql_query": "...", "ranges": [...], ... },
///   "relations": { "stores": [{ "id": 1, "name": "North" }, ...] },
///   "series": [
///     { "range": "30d", "relation_id": 1, "observations": [{ "label": "...", "value": 1.0 }] },
///     { "range": "90d", "relation_id": 1, "file": "north_90d.parquet", "delay_ms": 400 }
///   ]
/// }
/// ```
///
/// `file` paths are resolved relative to the fixture.
#[derive(Debug, Deserialize)]
struct FixtureFile {
    widget: WidgetConfig,
    #[serde(default)]
    relations: BTreeMap<String, Vec<Map<String, JsonValue>>>,
    #[serde(default)]
    series: Vec<SeriesEntry>,
}

#[derive(Debug, Deserialize)]
struct SeriesEntry {
    range: String,
    #[serde(default)]
    relation_id: Option<JsonValue>,
    #[serde(default)]
    observations: Option<JsonValue>,
    #[serde(default)]
    file: Option<PathBuf>,
    #[serde(default)]
    delay_ms: u64,
}

/// A loaded fixture: the widget it describes plus a source serving its data.
pub struct Fixture {
    pub widget: WidgetConfig,
    pub source: FixtureSource,
}

impl Fixture {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading fixture {}", path.display()))?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::parse(&text, base_dir)
    }

    pub fn parse(text: &str, base_dir: PathBuf) -> Result<Self> {
        let file: FixtureFile = serde_json::from_str(text).context("parsing fixture JSON")?;
        file.widget.validate().context("invalid widget configuration")?;

        let source = FixtureSource {
            query: file.widget.query.clone(),
            relations: file.relations,
            series: file.series,
            base_dir,
        };
        Ok(Self {
            widget: file.widget,
            source,
        })
    }
}

// ---------------------------------------------------------------------------
// FixtureSource – file-backed query boundary
// ---------------------------------------------------------------------------

pub struct FixtureSource {
    query: String,
    relations: BTreeMap<String, Vec<Map<String, JsonValue>>>,
    series: Vec<SeriesEntry>,
    base_dir: PathBuf,
}

impl FixtureSource {
    fn find_series(&self, query: &SeriesQuery) -> Option<&SeriesEntry> {
        let wanted = query.relation_id();
        self.series.iter().find(|entry| {
            let entry_id = entry.relation_id.as_ref().and_then(json_scalar_to_string);
            entry.range == query.range && entry_id.as_deref() == wanted
        })
    }

    fn read_entry(&self, entry: &SeriesEntry) -> Result<Vec<Observation>> {
        match (&entry.observations, &entry.file) {
            (Some(inline), _) => loader::series_from_json(inline),
            (None, Some(file)) => loader::load_series_file(&self.base_dir.join(file)),
            (None, None) => Ok(Vec::new()),
        }
    }
}

impl QuerySource for FixtureSource {
    fn fetch_relations(&self, query: &RelationQuery) -> Result<Vec<RelationOption>, FetchError> {
        let records = self
            .relations
            .get(&query.query)
            .ok_or_else(|| FetchError::NotFound(query.to_graphql()))?;

        records
            .iter()
            .enumerate()
            .map(|(i, rec)| {
                let id = rec
                    .get("id")
                    .and_then(json_scalar_to_string)
                    .ok_or_else(|| FetchError::Malformed(format!("relation {i} has no id")))?;
                let display = rec
                    .get(&query.display_using)
                    .and_then(json_scalar_to_string)
                    .ok_or_else(|| {
                        FetchError::Malformed(format!(
                            "relation {i} has no '{}' field",
                            query.display_using
                        ))
                    })?;
                Ok(RelationOption { id, display })
            })
            .collect()
    }

    fn fetch_series(&self, query: &SeriesQuery) -> Result<Vec<Observation>, FetchError> {
        if query.query != self.query {
            return Err(FetchError::NotFound(query.to_graphql()));
        }
        let entry = self
            .find_series(query)
            .ok_or_else(|| FetchError::NotFound(format!("{} [{}]", query.to_graphql(), query.range)))?;

        if entry.delay_ms > 0 {
            std::thread::sleep(Duration::from_millis(entry.delay_ms));
        }
        self.read_entry(entry)
            .map_err(|e| FetchError::Malformed(format!("{e:#}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RelationDescriptor;

    const FIXTURE: &str = r#"{
        "widget": {
            "name": "Orders",
            "graphql_query": "ordersTrend",
            "ranges": [{"key": "7d", "name": "7 days"}, {"key": "30d", "name": "30 days"}],
            "relation": {"graphql_query": "stores", "foreign_key": "store_id", "display_using": "name"}
        },
        "relations": {"stores": [{"id": 1, "name": "North"}, {"id": "2", "name": "South"}]},
        "series": [
            {"range": "7d", "relation_id": 1, "observations": [{"label": "d1", "value": 1}]},
            {"range": "7d", "relation_id": 2, "observations": "[{\"label\": \"d1\", \"value\": 9}]"},
            {"range": "30d", "relation_id": 1, "file": "missing.csv"}
        ]
    }"#;

    fn fixture() -> Fixture {
        Fixture::parse(FIXTURE, PathBuf::from("/nonexistent")).unwrap()
    }

    fn relation() -> RelationDescriptor {
        RelationDescriptor {
            query: "stores".into(),
            foreign_key: "store_id".into(),
            display_using: "name".into(),
        }
    }

    #[test]
    fn test_relations() {
        let fx = fixture();
        let opts = fx.source.fetch_relations(&RelationQuery::new(&relation())).unwrap();
        assert_eq!(
            opts,
            vec![RelationOption::new("1", "North"), RelationOption::new("2", "South")]
        );
    }

    #[test]
    fn test_series_lookup_by_range_and_relation() {
        let fx = fixture();
        let north = fx
            .source
            .fetch_series(&SeriesQuery::new(&fx.widget, "7d", Some("1")))
            .unwrap();
        let south = fx
            .source
            .fetch_series(&SeriesQuery::new(&fx.widget, "7d", Some("2")))
            .unwrap();
        assert_eq!(north, vec![Observation::new("d1", 1.0)]);
        assert_eq!(south, vec![Observation::new("d1", 9.0)]);
    }

    #[test]
    fn test_missing_series_is_not_found() {
        let fx = fixture();
        let err = fx
            .source
            .fetch_series(&SeriesQuery::new(&fx.widget, "30d", Some("2")))
            .unwrap_err();
        assert!(matches!(err, FetchError::NotFound(_)));
    }

    #[test]
    fn test_unreadable_file_is_malformed() {
        let fx = fixture();
        let err = fx
            .source
            .fetch_series(&SeriesQuery::new(&fx.widget, "30d", Some("1")))
            .unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
    }

    #[test]
    fn test_invalid_widget_is_rejected() {
        let text = r#"{"widget": {"name": "X", "query": "x", "ranges": []}}"#;
        assert!(Fixture::parse(text, PathBuf::new()).is_err());
    }
}
