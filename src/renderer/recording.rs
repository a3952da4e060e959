use std::collections::HashMap;

use serde_json::{Map, Value, json};
use tracing::trace;

use super::{FeatureState, FeatureStateSink, FeatureTarget, MapRenderer, RendererError, SourceSpec};
use crate::document::FeatureId;
use crate::layers::LayerSpec;

/// One call to `set_feature_state`, in arrival order
#[derive(Debug, Clone, PartialEq)]
pub struct StateWrite {
    pub target: FeatureTarget,
    pub state: FeatureState,
}

/// In-memory renderer that keeps everything it is given
///
/// Used by the CLI to emit a loadable style and to replay pointer events, and
/// by tests to observe exactly which calls were made. `default()` is a surface
/// that has not signalled ready yet.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    ready: bool,
    sources: Vec<(String, SourceSpec)>,
    layers: Vec<LayerSpec>,
    states: HashMap<FeatureTarget, FeatureState>,
    writes: Vec<StateWrite>,
}

impl RecordingRenderer {
    /// A renderer that is already past its load event
    pub fn ready() -> Self {
        Self {
            ready: true,
            ..Self::default()
        }
    }

    pub fn sources(&self) -> &[(String, SourceSpec)] {
        &self.sources
    }

    pub fn layers(&self) -> &[LayerSpec] {
        &self.layers
    }

    pub fn writes(&self) -> &[StateWrite] {
        &self.writes
    }

    /// Ids whose state currently has `key == true`
    pub fn flagged(&self, source: &str, key: &str) -> Vec<FeatureId> {
        let mut ids: Vec<FeatureId> = self
            .states
            .iter()
            .filter(|(target, state)| {
                target.source == source && state.get(key) == Some(&Value::Bool(true))
            })
            .map(|(target, _)| target.id.clone())
            .collect();
        ids.sort_by_key(|id| id.to_string());
        ids
    }

    /// Style document for a map host: viewport, sources, layers in draw order
    pub fn style_document(&self, style_url: &str, center: [f64; 2], zoom: f64) -> Value {
        let sources: Map<String, Value> = self
            .sources
            .iter()
            .map(|(name, spec)| (name.clone(), json!(spec)))
            .collect();
        json!({
            "style": style_url,
            "center": center,
            "zoom": zoom,
            "sources": sources,
            "layers": self.layers,
        })
    }
}

impl FeatureStateSink for RecordingRenderer {
    fn set_feature_state(
        &mut self,
        target: &FeatureTarget,
        state: FeatureState,
    ) -> Result<(), RendererError> {
        if !self.ready {
            return Err(RendererError::NotReady);
        }
        if !self.sources.iter().any(|(name, _)| *name == target.source) {
            return Err(RendererError::UnknownSource(target.source.clone()));
        }

        trace!(source = %target.source, id = %target.id, ?state, "Feature state");
        let merged = self.states.entry(target.clone()).or_default();
        for (key, value) in &state {
            merged.insert(key.clone(), value.clone());
        }
        self.writes.push(StateWrite {
            target: target.clone(),
            state,
        });
        Ok(())
    }
}

impl MapRenderer for RecordingRenderer {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn add_source(&mut self, name: &str, source: SourceSpec) -> Result<(), RendererError> {
        if !self.ready {
            return Err(RendererError::NotReady);
        }
        if self.sources.iter().any(|(existing, _)| existing == name) {
            return Err(RendererError::DuplicateSource(name.to_string()));
        }
        self.sources.push((name.to_string(), source));
        Ok(())
    }

    fn add_layer(&mut self, layer: LayerSpec) -> Result<(), RendererError> {
        if !self.ready {
            return Err(RendererError::NotReady);
        }
        if !self.sources.iter().any(|(name, _)| *name == layer.source) {
            return Err(RendererError::UnknownSource(layer.source.clone()));
        }
        if self.layers.iter().any(|l| l.id == layer.id) {
            return Err(RendererError::DuplicateLayer(layer.id.clone()));
        }
        self.layers.push(layer);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::flag;

    fn geojson() -> SourceSpec {
        SourceSpec::Geojson {
            data: json!({ "type": "FeatureCollection", "features": [] }),
        }
    }

    #[test]
    fn test_not_ready_rejects_everything() {
        let mut renderer = RecordingRenderer::default();
        assert_eq!(
            renderer.add_source("boundaries", geojson()),
            Err(RendererError::NotReady)
        );
        let target = FeatureTarget::new("boundaries", FeatureId::Number(1));
        assert_eq!(
            renderer.set_feature_state(&target, flag("hover", true)),
            Err(RendererError::NotReady)
        );
    }

    #[test]
    fn test_duplicate_source() {
        let mut renderer = RecordingRenderer::ready();
        renderer.add_source("boundaries", geojson()).unwrap();
        assert_eq!(
            renderer.add_source("boundaries", geojson()),
            Err(RendererError::DuplicateSource("boundaries".to_string()))
        );
    }

    #[test]
    fn test_feature_state_merges() {
        let mut renderer = RecordingRenderer::ready();
        renderer.add_source("boundaries", geojson()).unwrap();
        let id = FeatureId::Number(4);
        let target = FeatureTarget::new("boundaries", id.clone());

        renderer.set_feature_state(&target, flag("hover", true)).unwrap();
        renderer.set_feature_state(&target, flag("selected", true)).unwrap();
        renderer.set_feature_state(&target, flag("hover", false)).unwrap();

        assert_eq!(renderer.writes().len(), 3);
        assert_eq!(renderer.writes()[2].state, flag("hover", false));
        assert_eq!(renderer.flagged("boundaries", "selected"), vec![id]);
        assert!(renderer.flagged("boundaries", "hover").is_empty());
    }

    #[test]
    fn test_state_for_unknown_source() {
        let mut renderer = RecordingRenderer::ready();
        let target = FeatureTarget::new("nowhere", FeatureId::Number(1));
        assert_eq!(
            renderer.set_feature_state(&target, flag("hover", true)),
            Err(RendererError::UnknownSource("nowhere".to_string()))
        );
    }
}
