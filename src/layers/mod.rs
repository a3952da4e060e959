pub mod binder;
pub mod boundary;
pub mod spec;

pub use binder::bind;
pub use boundary::{BoundaryStyle, HOVER_STATE, boundary_layers, fill_layer_id, line_layer_id};
pub use spec::{LayerKind, LayerSpec, feature_state_case};
