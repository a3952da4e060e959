pub mod bounds;
pub mod crs;
pub mod datum;
pub mod ellipsoid;
pub mod error;
pub mod projection;
pub mod tmerc;

pub use bounds::Bounds;
pub use crs::{BRITISH_NATIONAL_GRID, CrsDefinition};
pub use ellipsoid::Ellipsoid;
pub use error::ProjectionError;
pub use projection::{CrsRegistry, NATIONAL_GRID, Transformer, WGS84};
