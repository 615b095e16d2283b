use std::sync::Arc;

use crate::config::{ConfigError, WidgetConfig};
use crate::data::model::{Observation, RelationOption};
use crate::data::source::{FetchError, RelationQuery, SeriesQuery};
use crate::engine::aggregate::Aggregator;
use crate::engine::{recompute, TrendResult};

/// Monotonically increasing id attached to every fetch request.
pub type Ticket = u64;

// ---------------------------------------------------------------------------
// Requests and responses crossing the query boundary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchRequest {
    Relations { ticket: Ticket, query: RelationQuery },
    Series { ticket: Ticket, query: SeriesQuery },
}

impl FetchRequest {
    pub fn ticket(&self) -> Ticket {
        match self {
            FetchRequest::Relations { ticket, .. } | FetchRequest::Series { ticket, .. } => *ticket,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchResponse {
    Relations {
        ticket: Ticket,
        result: Result<Vec<RelationOption>, FetchError>,
    },
    Series {
        ticket: Ticket,
        result: Result<Vec<Observation>, FetchError>,
    },
}

impl FetchResponse {
    pub fn ticket(&self) -> Ticket {
        match self {
            FetchResponse::Relations { ticket, .. } | FetchResponse::Series { ticket, .. } => *ticket,
        }
    }
}

/// What happened to a response handed to [`TrendPipeline::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Accepted,
    Failed,
    /// A newer request superseded this one; the response was dropped.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    LoadingRelations,
    AwaitingSelection,
    FetchingSeries,
    Ready,
    Failed,
}

// ---------------------------------------------------------------------------
// TrendPipeline – selection state and fetch / recompute sequencing
// ---------------------------------------------------------------------------

/// Coordinates range / relation selection with series fetches.
///
/// The pipeline performs no I/O: every operation queues [`FetchRequest`]s
/// which the caller drains with [`TrendPipeline::drain_requests`] and later
/// answers through [`TrendPipeline::apply`]. Only the most recently issued
/// series request can change state (last selection wins).
pub struct TrendPipeline {
    config: WidgetConfig,
    aggregator: Aggregator,
    phase: Phase,
    selected_range: String,
    relations: Vec<RelationOption>,
    selected_relation: Option<String>,
    result: Option<Arc<TrendResult>>,
    next_ticket: Ticket,
    live_relations: Option<Ticket>,
    live_series: Option<Ticket>,
    outbox: Vec<FetchRequest>,
}

impl TrendPipeline {
    pub fn new(config: WidgetConfig) -> Result<Self, ConfigError> {
        Self::with_aggregator(config, Aggregator::default())
    }

    pub fn with_aggregator(config: WidgetConfig, aggregator: Aggregator) -> Result<Self, ConfigError> {
        config.validate()?;
        let selected_range = config
            .default_range()
            .map(|r| r.key.clone())
            .ok_or_else(|| ConfigError::NoRanges(config.name.clone()))?;

        Ok(Self {
            config,
            aggregator,
            phase: Phase::Init,
            selected_range,
            relations: Vec::new(),
            selected_relation: None,
            result: None,
            next_ticket: 1,
            live_relations: None,
            live_series: None,
            outbox: Vec::new(),
        })
    }

    // -- accessors --

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn selected_range(&self) -> &str {
        &self.selected_range
    }

    pub fn relations(&self) -> &[RelationOption] {
        &self.relations
    }

    pub fn selected_relation(&self) -> Option<&str> {
        self.selected_relation.as_deref()
    }

    /// The current result, `None` while loading or after a failure.
    pub fn result(&self) -> Option<Arc<TrendResult>> {
        self.result.clone()
    }

    pub fn is_fetching(&self) -> bool {
        self.live_relations.is_some() || self.live_series.is_some()
    }

    /// Take the requests queued since the last call.
    pub fn drain_requests(&mut self) -> Vec<FetchRequest> {
        std::mem::take(&mut self.outbox)
    }

    // -- selection --

    /// Start the widget. Only the first call has an effect.
    pub fn mount(&mut self) {
        if self.phase != Phase::Init {
            return;
        }
        let query = self.config.relation.as_ref().map(RelationQuery::new);
        match query {
            Some(query) => {
                let ticket = self.issue_ticket();
                self.live_relations = Some(ticket);
                self.phase = Phase::LoadingRelations;
                log::info!("{}: loading relations via {}", self.config.name, query.to_graphql());
                self.outbox.push(FetchRequest::Relations { ticket, query });
            }
            None => self.request_series(),
        }
    }

    pub fn select_range(&mut self, key: &str) {
        if self.config.range(key).is_none() {
            log::warn!("{}: ignoring unknown range '{key}'", self.config.name);
            return;
        }
        if self.selected_range == key {
            return;
        }
        self.selected_range = key.to_string();
        self.reload();
    }

    pub fn select_relation(&mut self, id: &str) {
        if self.config.relation.is_none() {
            log::warn!("{}: widget has no relation to select", self.config.name);
            return;
        }
        if !self.relations.iter().any(|r| r.id == id) {
            log::warn!("{}: ignoring unknown relation id '{id}'", self.config.name);
            return;
        }
        if self.selected_relation.as_deref() == Some(id) {
            return;
        }
        self.selected_relation = Some(id.to_string());
        self.reload();
    }

    /// Re-issue the series fetch for the current selection, if one can be
    /// issued yet. With a relation configured that means a relation must be
    /// selected; until then the new range is only recorded.
    fn reload(&mut self) {
        if self.phase == Phase::Init {
            return;
        }
        if self.config.relation.is_some() && self.selected_relation.is_none() {
            return;
        }
        self.request_series();
    }

    fn request_series(&mut self) {
        let ticket = self.issue_ticket();
        let query = SeriesQuery::new(
            &self.config,
            &self.selected_range,
            self.selected_relation.as_deref(),
        );

        if let Some(previous) = self.live_series.replace(ticket) {
            log::debug!("{}: request #{previous} superseded by #{ticket}", self.config.name);
        }
        self.result = None;
        self.phase = Phase::FetchingSeries;

        log::info!("{}: fetching #{ticket} {}", self.config.name, query.to_graphql());
        self.outbox.push(FetchRequest::Series { ticket, query });
    }

    fn issue_ticket(&mut self) -> Ticket {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        ticket
    }

    // -- responses --

    pub fn apply(&mut self, response: FetchResponse) -> Applied {
        match response {
            FetchResponse::Relations { ticket, result } => self.apply_relations(ticket, result),
            FetchResponse::Series { ticket, result } => self.apply_series(ticket, result),
        }
    }

    fn apply_relations(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<RelationOption>, FetchError>,
    ) -> Applied {
        if self.live_relations != Some(ticket) {
            log::debug!("{}: discarding stale relation response #{ticket}", self.config.name);
            return Applied::Stale;
        }
        self.live_relations = None;

        let relations = match result {
            Ok(relations) => relations,
            Err(e) => {
                log::error!("{}: loading relations failed: {e}", self.config.name);
                return Applied::Failed;
            }
        };

        log::info!("{}: loaded {} relations", self.config.name, relations.len());
        self.selected_relation = relations.first().map(|r| r.id.clone());
        self.relations = relations;
        self.phase = Phase::AwaitingSelection;

        if self.selected_relation.is_some() {
            self.request_series();
        } else {
            log::warn!("{}: relation list is empty, nothing to show", self.config.name);
        }
        Applied::Accepted
    }

    fn apply_series(&mut self, ticket: Ticket, result: Result<Vec<Observation>, FetchError>) -> Applied {
        if self.live_series != Some(ticket) {
            log::debug!("{}: discarding stale series response #{ticket}", self.config.name);
            return Applied::Stale;
        }
        self.live_series = None;

        match result {
            Ok(observations) => {
                log::info!(
                    "{}: #{ticket} returned {} observations",
                    self.config.name,
                    observations.len()
                );
                let result = recompute(&self.aggregator, &observations, &self.config);
                self.result = Some(Arc::new(result));
                self.phase = Phase::Ready;
                Applied::Accepted
            }
            Err(e) => {
                log::error!("{}: fetching #{ticket} failed: {e}", self.config.name);
                self.result = None;
                self.phase = Phase::Failed;
                Applied::Failed
            }
        }
    }
}
