pub mod boundaries;

pub use boundaries::{BoundarySource, fetch_boundaries};
