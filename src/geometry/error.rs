use thiserror::Error;

/// Errors raised while parsing CRS definitions or resolving CRS names
#[derive(Debug, Error, PartialEq)]
pub enum ProjectionError {
    #[error("Unsupported projection: {0}")]
    UnsupportedProjection(String),

    #[error("Missing +proj= in definition: {0}")]
    MissingProjection(String),

    #[error("Unknown ellipsoid: {0}")]
    UnknownEllipsoid(String),

    #[error("Unsupported datum: {0}")]
    UnsupportedDatum(String),

    #[error("Unsupported units: {0} (only meters are supported)")]
    UnsupportedUnits(String),

    #[error("Invalid value for +{name}: {value}")]
    InvalidParameter { name: String, value: String },

    #[error("Unknown CRS: {0}")]
    UnknownCrs(String),

    #[error("CRS {0} is already registered with a different definition")]
    Conflict(String),
}
