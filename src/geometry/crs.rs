use std::collections::HashMap;

use super::datum::{Helmert, geocentric_to_geodetic, geodetic_to_geocentric};
use super::tmerc::{TmParams, TransverseMercator};
use super::{Ellipsoid, ProjectionError};

/// British National Grid (OSGB36 / EPSG:27700) in proj notation
pub const BRITISH_NATIONAL_GRID: &str = "+proj=tmerc +lat_0=49 +lon_0=-2 +k=0.9996012717 \
+x_0=400000 +y_0=-100000 +ellps=airy \
+towgs84=446.448,-125.157,542.06,0.15,0.247,0.842,-20.489 +units=m +no_defs";

#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// Longitude/latitude in degrees
    LonLat,
    TransverseMercator(TmParams),
}

/// A parsed coordinate reference system
///
/// Only the subset of proj's syntax needed for national transverse Mercator
/// grids and geographic lon/lat is understood; anything else is rejected
/// rather than silently approximated.
#[derive(Debug, Clone, PartialEq)]
pub struct CrsDefinition {
    pub projection: Projection,
    pub ellipsoid: Ellipsoid,
    /// Shift to WGS84; `None` means the datum already is WGS84
    pub towgs84: Option<Helmert>,
}

impl CrsDefinition {
    /// Parse a proj-style definition such as [`BRITISH_NATIONAL_GRID`]
    pub fn parse(definition: &str) -> Result<Self, ProjectionError> {
        let params = tokenize(definition);

        let proj = params
            .get("proj")
            .and_then(|v| *v)
            .ok_or_else(|| ProjectionError::MissingProjection(definition.to_string()))?;

        if let Some(Some(units)) = params.get("units")
            && *units != "m"
        {
            return Err(ProjectionError::UnsupportedUnits(units.to_string()));
        }

        let (ellipsoid, datum_shift) = parse_datum(&params)?;

        let projection = match proj {
            "longlat" | "latlong" | "lonlat" | "latlon" => Projection::LonLat,
            "tmerc" => Projection::TransverseMercator(TmParams {
                lat_0: number(&params, "lat_0", 0.0)?,
                lon_0: number(&params, "lon_0", 0.0)?,
                k_0: match params.get("k_0") {
                    Some(_) => number(&params, "k_0", 1.0)?,
                    None => number(&params, "k", 1.0)?,
                },
                x_0: number(&params, "x_0", 0.0)?,
                y_0: number(&params, "y_0", 0.0)?,
            }),
            other => return Err(ProjectionError::UnsupportedProjection(other.to_string())),
        };

        Ok(Self {
            projection,
            ellipsoid,
            towgs84: datum_shift,
        })
    }

    pub fn wgs84() -> Self {
        Self {
            projection: Projection::LonLat,
            ellipsoid: Ellipsoid::WGS84,
            towgs84: None,
        }
    }

    /// Prepare the projection math for repeated use
    pub(crate) fn compile(&self) -> CompiledCrs {
        let tm = match &self.projection {
            Projection::LonLat => None,
            Projection::TransverseMercator(params) => {
                Some(TransverseMercator::new(&self.ellipsoid, *params))
            }
        };
        CompiledCrs {
            definition: self.clone(),
            tm,
        }
    }
}

/// A CRS with its projection coefficients precomputed
#[derive(Debug, Clone)]
pub(crate) struct CompiledCrs {
    definition: CrsDefinition,
    tm: Option<TransverseMercator>,
}

impl CompiledCrs {
    /// Native (x, y) -> (lon, lat) in WGS84
    pub(crate) fn to_wgs84(&self, x: f64, y: f64) -> (f64, f64) {
        let (lon, lat) = match &self.tm {
            Some(tm) => tm.inverse(x, y),
            None => (x, y),
        };
        match &self.definition.towgs84 {
            Some(shift) => {
                let local = geodetic_to_geocentric(&self.definition.ellipsoid, lon, lat, 0.0);
                let shifted = shift.to_wgs84(local);
                let (lon, lat, _) = geocentric_to_geodetic(&Ellipsoid::WGS84, shifted);
                (lon, lat)
            }
            None => (lon, lat),
        }
    }

    /// (lon, lat) in WGS84 -> native (x, y)
    pub(crate) fn from_wgs84(&self, lon: f64, lat: f64) -> (f64, f64) {
        let (lon, lat) = match &self.definition.towgs84 {
            Some(shift) => {
                let wgs = geodetic_to_geocentric(&Ellipsoid::WGS84, lon, lat, 0.0);
                let (lon, lat, _) =
                    geocentric_to_geodetic(&self.definition.ellipsoid, shift.from_wgs84(wgs));
                (lon, lat)
            }
            None => (lon, lat),
        };
        match &self.tm {
            Some(tm) => tm.forward(lon, lat),
            None => (lon, lat),
        }
    }
}

/// Split `+key=value +flag` tokens into a map; flags map to `None`
fn tokenize(definition: &str) -> HashMap<&str, Option<&str>> {
    definition
        .split_whitespace()
        .filter_map(|token| {
            let token = token.strip_prefix('+')?;
            Some(match token.split_once('=') {
                Some((key, value)) => (key, Some(value)),
                None => (token, None),
            })
        })
        .collect()
}

fn number(
    params: &HashMap<&str, Option<&str>>,
    name: &str,
    default: f64,
) -> Result<f64, ProjectionError> {
    match params.get(name) {
        None => Ok(default),
        Some(value) => value
            .and_then(|v| v.parse::<f64>().ok())
            .ok_or_else(|| ProjectionError::InvalidParameter {
                name: name.to_string(),
                value: value.unwrap_or_default().to_string(),
            }),
    }
}

fn parse_datum(
    params: &HashMap<&str, Option<&str>>,
) -> Result<(Ellipsoid, Option<Helmert>), ProjectionError> {
    if let Some(datum) = params.get("datum") {
        return match datum {
            Some("WGS84") => Ok((Ellipsoid::WGS84, None)),
            Some(other) => Err(ProjectionError::UnsupportedDatum(other.to_string())),
            None => Err(ProjectionError::UnsupportedDatum(String::new())),
        };
    }

    let ellipsoid = match params.get("ellps") {
        Some(Some(name)) => Ellipsoid::by_name(name)?,
        Some(None) => return Err(ProjectionError::UnknownEllipsoid(String::new())),
        None => {
            let a = number(params, "a", Ellipsoid::WGS84.a)?;
            if params.contains_key("rf") {
                Ellipsoid::from_inverse_flattening(a, number(params, "rf", 0.0)?)
            } else if params.contains_key("b") {
                Ellipsoid::from_axes(a, number(params, "b", a)?)
            } else {
                Ellipsoid::WGS84
            }
        }
    };

    let shift = match params.get("towgs84") {
        Some(Some(value)) => Some(Helmert::parse(value)?).filter(|h| !h.is_identity()),
        Some(None) => {
            return Err(ProjectionError::InvalidParameter {
                name: "towgs84".to_string(),
                value: String::new(),
            });
        }
        None => None,
    };

    Ok((ellipsoid, shift))
}
