use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::data::source::{FetchError, QuerySource};
use crate::pipeline::{FetchRequest, FetchResponse};

// ---------------------------------------------------------------------------
// Background execution of fetch requests
// ---------------------------------------------------------------------------

/// Runs [`FetchRequest`]s against a [`QuerySource`] off the UI thread.
///
/// Each request gets its own thread; responses come back over a channel in
/// completion order, which need not be submission order. Dropping the
/// fetcher drops the receiver, so late responses are discarded on send.
pub struct Fetcher {
    source: Arc<dyn QuerySource>,
    tx: Sender<FetchResponse>,
    rx: Receiver<FetchResponse>,
    in_flight: usize,
}

impl Fetcher {
    pub fn new(source: Arc<dyn QuerySource>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            source,
            tx,
            rx,
            in_flight: 0,
        }
    }

    /// Number of submitted requests whose response has not been received.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn submit(&mut self, request: FetchRequest) {
        let ticket = request.ticket();
        let failure = failed_response(&request);
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();

        let spawned = thread::Builder::new()
            .name(format!("trend-fetch-{ticket}"))
            .spawn(move || {
                let _ = tx.send(execute(source.as_ref(), request));
            });

        self.in_flight += 1;
        if let Err(e) = spawned {
            log::error!("could not spawn fetch thread for #{ticket}: {e}");
            let _ = self.tx.send(failure(FetchError::Transport(e.to_string())));
        }
    }

    /// Responses that have arrived since the last call, without blocking.
    pub fn poll(&mut self) -> Vec<FetchResponse> {
        let responses: Vec<FetchResponse> = self.rx.try_iter().collect();
        self.in_flight = self.in_flight.saturating_sub(responses.len());
        responses
    }

    /// Block until one response arrives or `timeout` elapses.
    pub fn recv_timeout(&mut self, timeout: Duration) -> Option<FetchResponse> {
        let response = self.rx.recv_timeout(timeout).ok()?;
        self.in_flight = self.in_flight.saturating_sub(1);
        Some(response)
    }
}

/// Run one request synchronously.
pub fn execute(source: &dyn QuerySource, request: FetchRequest) -> FetchResponse {
    match request {
        FetchRequest::Relations { ticket, query } => FetchResponse::Relations {
            ticket,
            result: source.fetch_relations(&query),
        },
        FetchRequest::Series { ticket, query } => FetchResponse::Series {
            ticket,
            result: source.fetch_series(&query),
        },
    }
}

/// Builds the error response matching `request`'s kind.
fn failed_response(request: &FetchRequest) -> impl FnOnce(FetchError) -> FetchResponse {
    let ticket = request.ticket();
    let is_series = matches!(request, FetchRequest::Series { .. });
    move |err| {
        if is_series {
            FetchResponse::Series {
                ticket,
                result: Err(err),
            }
        } else {
            FetchResponse::Relations {
                ticket,
                result: Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RangeOption, WidgetConfig};
    use crate::data::model::{Observation, RelationOption};
    use crate::data::source::{RelationQuery, SeriesQuery};

    struct EchoSource;

    impl QuerySource for EchoSource {
        fn fetch_relations(&self, _: &RelationQuery) -> Result<Vec<RelationOption>, FetchError> {
            Err(FetchError::Transport("no relations here".into()))
        }

        fn fetch_series(&self, query: &SeriesQuery) -> Result<Vec<Observation>, FetchError> {
            Ok(vec![Observation::new(query.range.clone(), 1.0)])
        }
    }

    fn series_request(ticket: u64, range: &str) -> FetchRequest {
        let config = WidgetConfig {
            name: "Echo".into(),
            query: "echo".into(),
            ranges: vec![RangeOption::new(range, range)],
            relation: None,
            show_standard_deviation: false,
        };
        FetchRequest::Series {
            ticket,
            query: SeriesQuery::new(&config, range, None),
        }
    }

    #[test]
    fn test_execute_series() {
        match execute(&EchoSource, series_request(3, "7d")) {
            FetchResponse::Series { ticket, result } => {
                assert_eq!(ticket, 3);
                assert_eq!(result.unwrap()[0].label, "7d");
            }
            other => panic!("unexpected response {other:?}"),
        }
    }

    #[test]
    fn test_execute_relations_failure() {
        let request = FetchRequest::Relations {
            ticket: 1,
            query: RelationQuery {
                query: "stores".into(),
                display_using: "name".into(),
            },
        };
        match execute(&EchoSource, request) {
            FetchResponse::Relations { result, .. } => assert!(result.is_err()),
            other => panic!("unexpected response {other:?}"),
        }
    }

    #[test]
    fn test_submit_and_receive() {
        let mut fetcher = Fetcher::new(Arc::new(EchoSource));
        fetcher.submit(series_request(7, "30d"));
        assert_eq!(fetcher.in_flight(), 1);

        let response = fetcher.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(response.ticket(), 7);
        assert_eq!(fetcher.in_flight(), 0);
        assert!(fetcher.poll().is_empty());
    }
}
