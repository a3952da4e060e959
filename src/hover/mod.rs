//! Pointer hover highlighting
//!
//! [`HoverTracker`] keeps at most one feature flagged `hover = true` on a
//! single layer. It decides every transition from the id it last wrote, never
//! from renderer feedback, so a burst of move events converges on the last one.

use serde::Deserialize;
use tracing::debug;

use crate::document::FeatureId;
use crate::layers::HOVER_STATE;
use crate::renderer::{FeatureStateSink, FeatureTarget, RendererError, flag};

/// Pointer events as delivered by the host, scoped to a layer
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PointerEvent {
    /// Pointer moved; `features` lists the features under it, topmost first
    Move {
        layer: String,
        #[serde(default)]
        features: Vec<FeatureId>,
    },
    /// Pointer left the layer
    Leave { layer: String },
}

impl PointerEvent {
    pub fn layer(&self) -> &str {
        match self {
            PointerEvent::Move { layer, .. } | PointerEvent::Leave { layer } => layer,
        }
    }
}

/// What a single event did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HoverTransition {
    /// Event was for another layer
    Ignored,
    /// No state write was needed
    Unchanged,
    Entered(FeatureId),
    Switched { from: FeatureId, to: FeatureId },
    Left(FeatureId),
}

#[derive(Debug, Clone)]
pub struct HoverTracker {
    source: String,
    layer: String,
    hovered: Option<FeatureId>,
}

impl HoverTracker {
    /// Track hover on `layer`, writing state for features of `source`
    pub fn new(source: &str, layer: &str) -> Self {
        Self {
            source: source.to_string(),
            layer: layer.to_string(),
            hovered: None,
        }
    }

    pub fn layer(&self) -> &str {
        &self.layer
    }

    /// The feature currently flagged, if any
    pub fn hovered(&self) -> Option<&FeatureId> {
        self.hovered.as_ref()
    }

    pub fn handle<S: FeatureStateSink + ?Sized>(
        &mut self,
        event: &PointerEvent,
        sink: &mut S,
    ) -> Result<HoverTransition, RendererError> {
        if event.layer() != self.layer {
            return Ok(HoverTransition::Ignored);
        }

        match event {
            PointerEvent::Move { features, .. } => match features.first() {
                Some(id) => self.enter(id, sink),
                None => self.leave(sink),
            },
            PointerEvent::Leave { .. } => self.leave(sink),
        }
    }

    fn enter<S: FeatureStateSink + ?Sized>(
        &mut self,
        id: &FeatureId,
        sink: &mut S,
    ) -> Result<HoverTransition, RendererError> {
        if self.hovered.as_ref() == Some(id) {
            return Ok(HoverTransition::Unchanged);
        }

        let previous = self.clear(sink)?;
        self.write(id, true, sink)?;
        self.hovered = Some(id.clone());

        debug!(layer = %self.layer, id = %id, "Hover entered");
        Ok(match previous {
            Some(from) => HoverTransition::Switched {
                from,
                to: id.clone(),
            },
            None => HoverTransition::Entered(id.clone()),
        })
    }

    fn leave<S: FeatureStateSink + ?Sized>(
        &mut self,
        sink: &mut S,
    ) -> Result<HoverTransition, RendererError> {
        Ok(match self.clear(sink)? {
            Some(id) => {
                debug!(layer = %self.layer, id = %id, "Hover left");
                HoverTransition::Left(id)
            }
            None => HoverTransition::Unchanged,
        })
    }

    /// Unflag the hovered feature; the reference is dropped only once the write landed
    fn clear<S: FeatureStateSink + ?Sized>(
        &mut self,
        sink: &mut S,
    ) -> Result<Option<FeatureId>, RendererError> {
        match self.hovered.clone() {
            Some(id) => {
                self.write(&id, false, sink)?;
                self.hovered = None;
                Ok(Some(id))
            }
            None => Ok(None),
        }
    }

    fn write<S: FeatureStateSink + ?Sized>(
        &self,
        id: &FeatureId,
        value: bool,
        sink: &mut S,
    ) -> Result<(), RendererError> {
        let target = FeatureTarget::new(&self.source, id.clone());
        sink.set_feature_state(&target, flag(HOVER_STATE, value))
    }
}
