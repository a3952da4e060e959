pub mod model;
pub mod normalize;
pub mod slot;

pub use model::{BoundaryDocument, Feature, FeatureId, Geometry, Ring, Shape};
pub use normalize::{NormalizeReport, NormalizedDocument, Normalizer};
pub use slot::{Position, PositionSlot};
