use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::color::ChartTheme;
use crate::config::{ConfigError, WidgetConfig};
use crate::data::fixture::Fixture;
use crate::data::source::QuerySource;
use crate::engine::TrendResult;
use crate::pipeline::{Applied, Phase, TrendPipeline};
use crate::worker::Fetcher;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// One mounted widget: its pipeline and the fetcher answering it.
struct Widget {
    pipeline: TrendPipeline,
    fetcher: Fetcher,
}

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Fixture the current widget was loaded from, if any.
    pub fixture_path: Option<PathBuf>,

    widget: Option<Widget>,

    pub theme: ChartTheme,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            fixture_path: None,
            widget: None,
            theme: ChartTheme::default(),
            status_message: None,
        }
    }
}

impl AppState {
    /// Load a fixture file and mount the widget it describes.
    pub fn open_fixture(&mut self, path: &Path) -> Result<()> {
        let fixture = Fixture::load(path)?;
        log::info!(
            "Loaded widget '{}' from {}",
            fixture.widget.name,
            path.display()
        );
        self.install(fixture.widget, Arc::new(fixture.source))
            .context("mounting widget")?;
        self.fixture_path = Some(path.to_path_buf());
        Ok(())
    }

    /// Replace the current widget. The previous fetcher is dropped with it,
    /// so responses still in flight for the old widget go nowhere.
    pub fn install(
        &mut self,
        config: WidgetConfig,
        source: Arc<dyn QuerySource>,
    ) -> Result<(), ConfigError> {
        let mut pipeline = TrendPipeline::new(config)?;
        pipeline.mount();
        self.widget = Some(Widget {
            pipeline,
            fetcher: Fetcher::new(source),
        });
        self.status_message = None;
        self.dispatch();
        Ok(())
    }

    pub fn config(&self) -> Option<&WidgetConfig> {
        self.widget.as_ref().map(|w| w.pipeline.config())
    }

    pub fn pipeline(&self) -> Option<&TrendPipeline> {
        self.widget.as_ref().map(|w| &w.pipeline)
    }

    pub fn result(&self) -> Option<Arc<TrendResult>> {
        self.widget.as_ref().and_then(|w| w.pipeline.result())
    }

    pub fn phase(&self) -> Option<Phase> {
        self.widget.as_ref().map(|w| w.pipeline.phase())
    }

    pub fn is_fetching(&self) -> bool {
        self.widget
            .as_ref()
            .is_some_and(|w| w.pipeline.is_fetching() || w.fetcher.in_flight() > 0)
    }

    pub fn select_range(&mut self, key: &str) {
        if let Some(w) = &mut self.widget {
            w.pipeline.select_range(key);
        }
        self.dispatch();
    }

    pub fn select_relation(&mut self, id: &str) {
        if let Some(w) = &mut self.widget {
            w.pipeline.select_relation(id);
        }
        self.dispatch();
    }

    /// Feed arrived responses into the pipeline. Returns `true` if any
    /// response was accepted or failed, i.e. the view needs a redraw.
    pub fn poll(&mut self) -> bool {
        let Some(w) = &mut self.widget else {
            return false;
        };

        let mut changed = false;
        for response in w.fetcher.poll() {
            match w.pipeline.apply(response) {
                Applied::Accepted => changed = true,
                Applied::Failed => {
                    changed = true;
                    self.status_message = Some("No data".to_string());
                }
                Applied::Stale => {}
            }
        }
        if changed && w.pipeline.phase() == Phase::Ready {
            self.status_message = None;
        }
        self.dispatch();
        changed
    }

    /// Hand queued requests to the fetcher.
    fn dispatch(&mut self) {
        if let Some(w) = &mut self.widget {
            for request in w.pipeline.drain_requests() {
                w.fetcher.submit(request);
            }
        }
    }
}
