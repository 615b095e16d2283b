use thiserror::Error;

use super::model::{Observation, RelationOption};
use crate::config::{RelationDescriptor, WidgetConfig};

// ---------------------------------------------------------------------------
// Query descriptors
// ---------------------------------------------------------------------------

/// Request for the related-entity candidate list. Carries no filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationQuery {
    pub query: String,
    pub display_using: String,
}

impl RelationQuery {
    pub fn new(relation: &RelationDescriptor) -> Self {
        Self {
            query: relation.query.clone(),
            display_using: relation.display_using.clone(),
        }
    }

    /// `stores{ id name }`
    pub fn to_graphql(&self) -> String {
        format!("{}{{ id {} }}", self.query, self.display_using)
    }
}

/// The foreign-key filter applied to a series query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationFilter {
    pub foreign_key: String,
    pub id: String,
}

/// Request for one observation series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesQuery {
    pub query: String,
    pub range: String,
    pub relation: Option<RelationFilter>,
}

impl SeriesQuery {
    pub fn new(config: &WidgetConfig, range: &str, relation_id: Option<&str>) -> Self {
        let relation = config
            .relation
            .as_ref()
            .zip(relation_id)
            .map(|(rel, id)| RelationFilter {
                foreign_key: rel.foreign_key.clone(),
                id: id.to_string(),
            });
        Self {
            query: config.query.clone(),
            range: range.to_string(),
            relation,
        }
    }

    pub fn relation_id(&self) -> Option<&str> {
        self.relation.as_ref().map(|r| r.id.as_str())
    }

    /// `orders(range: """30d""" store_id: 4)` when scoped by a relation.
    /// Unscoped queries pass the range as a plain argument instead.
    pub fn to_graphql(&self) -> String {
        match &self.relation {
            Some(rel) => format!(
                r#"{}(range: """{}""" {}: {})"#,
                self.query, self.range, rel.foreign_key, rel.id
            ),
            None => self.query.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Query boundary
// ---------------------------------------------------------------------------

/// Any failure of the query boundary. The pipeline treats every variant the
/// same way; the distinction only matters for logs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("no data for {0}")]
    NotFound(String),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("transport error: {0}")]
    Transport(String),
}

/// Where observation series and relation candidates come from.
///
/// Implementations are called from background threads and may block.
pub trait QuerySource: Send + Sync {
    fn fetch_relations(&self, query: &RelationQuery) -> Result<Vec<RelationOption>, FetchError>;

    fn fetch_series(&self, query: &SeriesQuery) -> Result<Vec<Observation>, FetchError>;
}
