use thiserror::Error;

use crate::document::FeatureId;
use crate::geometry::ProjectionError;
use crate::renderer::RendererError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed JSON, or geometry outside the accepted shapes
    #[error("Invalid boundary document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Expected a FeatureCollection of Features, found {0:?}")]
    NotFeatureCollection(String),

    #[error("Feature at index {index} has no id")]
    MissingFeatureId { index: usize },

    #[error("Duplicate feature id: {0}")]
    DuplicateFeatureId(FeatureId),

    #[error("Layer {layer} draws from source {layer_source:?}, expected {expected:?}")]
    LayerSource {
        layer: String,
        layer_source: String,
        expected: String,
    },

    #[error(transparent)]
    Projection(#[from] ProjectionError),

    #[error(transparent)]
    Renderer(#[from] RendererError),
}
