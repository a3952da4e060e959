//! Load-time wiring: fetch, normalize, bind, then hand back a hover tracker
//!
//! Everything here runs in the renderer's "ready" continuation. The surface can
//! be torn down while the fetch is in flight, so readiness is checked again
//! before anything is bound.

use anyhow::{Context, Result};
use tracing::info;

use crate::api::{BoundarySource, fetch_boundaries};
use crate::config::FileConfig;
use crate::document::{BoundaryDocument, NormalizeReport, NormalizedDocument, Normalizer};
use crate::hover::{HoverTracker, HoverTransition, PointerEvent};
use crate::layers::{bind, boundary_layers, fill_layer_id};
use crate::renderer::{FeatureStateSink, MapRenderer, RendererError};

/// A boundary source bound to a live renderer
#[derive(Debug)]
pub struct MapSession {
    document: NormalizedDocument,
    report: NormalizeReport,
    tracker: HoverTracker,
}

impl MapSession {
    /// Fetch `source` and bind it to `renderer` using `config`
    pub fn load<R: MapRenderer + ?Sized>(
        renderer: &mut R,
        source: &BoundarySource,
        config: &FileConfig,
    ) -> Result<Self> {
        Self::load_with(renderer, config, || fetch_boundaries(source, &config.fetch))
    }

    /// Same as [`MapSession::load`] with the fetch step supplied by the caller
    pub fn load_with<R, F>(renderer: &mut R, config: &FileConfig, fetch: F) -> Result<Self>
    where
        R: MapRenderer + ?Sized,
        F: FnOnce() -> Result<BoundaryDocument>,
    {
        ensure_ready(renderer).context("Map surface is not ready to load boundaries")?;

        let mut document = fetch()?;

        if config.generate_ids {
            let assigned = document.assign_missing_ids();
            if assigned > 0 {
                info!(assigned, "Assigned feature ids");
            }
        }
        document
            .validate_ids()
            .context("Boundary features need unique ids for hover state")?;

        let mut normalizer = Normalizer::new(
            &config.source_crs,
            &config.source_crs_definition,
            &config.target_crs,
        );
        let (document, report) = normalizer
            .finish(document)
            .context("Failed to normalize boundary coordinates")?;

        ensure_ready(renderer).context("Map surface went away while boundaries were loading")?;

        let source_name = config.source_name.as_str();
        let layers = boundary_layers(source_name, &config.style);
        bind(renderer, source_name, &document, &layers).context("Failed to bind boundaries")?;

        let tracker = HoverTracker::new(source_name, &fill_layer_id(source_name));
        Ok(Self {
            document,
            report,
            tracker,
        })
    }

    pub fn document(&self) -> &NormalizedDocument {
        &self.document
    }

    pub fn report(&self) -> NormalizeReport {
        self.report
    }

    pub fn tracker(&self) -> &HoverTracker {
        &self.tracker
    }

    /// Forward a pointer event to the hover tracker
    pub fn handle<S: FeatureStateSink + ?Sized>(
        &mut self,
        event: &PointerEvent,
        sink: &mut S,
    ) -> Result<HoverTransition, RendererError> {
        self.tracker.handle(event, sink)
    }

    /// Feed recorded pointer events through the tracker in order
    ///
    /// Stops at the first failed write. Transitions before it have already
    /// been applied to `sink`.
    pub fn replay<S: FeatureStateSink + ?Sized>(
        &mut self,
        events: &[PointerEvent],
        sink: &mut S,
    ) -> Result<Vec<HoverTransition>> {
        let mut transitions = Vec::with_capacity(events.len());
        for (index, event) in events.iter().enumerate() {
            let transition = self
                .handle(event, sink)
                .with_context(|| format!("Hover update failed at event {}", index))?;
            transitions.push(transition);
        }
        info!(events = events.len(), "Replayed pointer events");
        Ok(transitions)
    }
}

fn ensure_ready<R: MapRenderer + ?Sized>(renderer: &R) -> Result<(), RendererError> {
    if renderer.is_ready() {
        Ok(())
    } else {
        Err(RendererError::NotReady)
    }
}
