//! The seam to the map rendering engine
//!
//! The engine itself (tiles, GPU, DOM) lives outside this crate. These traits
//! are the calls the boundary pipeline and the hover tracker make into it.

pub mod recording;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::document::FeatureId;
use crate::layers::LayerSpec;

pub use recording::{RecordingRenderer, StateWrite};

/// Per-feature key/value state, merged into whatever the renderer already holds
pub type FeatureState = Map<String, Value>;

#[derive(Debug, Error, PartialEq)]
pub enum RendererError {
    #[error("Map surface is not ready")]
    NotReady,

    #[error("Source {0:?} is already registered")]
    DuplicateSource(String),

    #[error("Unknown source {0:?}")]
    UnknownSource(String),

    #[error("Layer {0:?} is already registered")]
    DuplicateLayer(String),
}

/// Data source registered with the renderer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceSpec {
    Geojson { data: Value },
}

/// Identifies one rendered feature
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeatureTarget {
    pub source: String,
    pub id: FeatureId,
}

impl FeatureTarget {
    pub fn new(source: &str, id: FeatureId) -> Self {
        Self {
            source: source.to_string(),
            id,
        }
    }
}

/// Anything that accepts feature-state writes
pub trait FeatureStateSink {
    fn set_feature_state(
        &mut self,
        target: &FeatureTarget,
        state: FeatureState,
    ) -> Result<(), RendererError>;
}

/// The subset of a map renderer used once its surface is up
pub trait MapRenderer: FeatureStateSink {
    /// Whether the surface has signalled it is ready for sources and layers
    fn is_ready(&self) -> bool;

    fn add_source(&mut self, name: &str, source: SourceSpec) -> Result<(), RendererError>;

    /// Layers draw in the order they are added; later layers draw on top
    fn add_layer(&mut self, layer: LayerSpec) -> Result<(), RendererError>;
}

/// Build a single-key state object, e.g. `{"hover": true}`
pub fn flag(key: &str, value: bool) -> FeatureState {
    let mut state = FeatureState::new();
    state.insert(key.to_string(), Value::Bool(value));
    state
}
