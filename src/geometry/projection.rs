use std::collections::HashMap;

use geo::Coord;
use tracing::debug;

use super::ProjectionError;
use super::crs::{CompiledCrs, CrsDefinition};

/// Name of the built-in geographic target CRS
pub const WGS84: &str = "EPSG:4326";
/// Name under which the national grid is conventionally registered
pub const NATIONAL_GRID: &str = "EPSG:27700";

/// Named CRS definitions, looked up when building a [`Transformer`]
///
/// `EPSG:4326` (alias `WGS84`) is always present. Other names must be
/// registered before use.
#[derive(Debug, Clone)]
pub struct CrsRegistry {
    definitions: HashMap<String, CrsDefinition>,
}

impl Default for CrsRegistry {
    fn default() -> Self {
        let mut definitions = HashMap::new();
        definitions.insert(WGS84.to_string(), CrsDefinition::wgs84());
        definitions.insert("WGS84".to_string(), CrsDefinition::wgs84());
        Self { definitions }
    }
}

impl CrsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate `name` with a proj-style definition
    ///
    /// Registering the same definition again is a no-op. Registering a
    /// different definition under a taken name fails with
    /// [`ProjectionError::Conflict`].
    pub fn register(&mut self, name: &str, definition: &str) -> Result<(), ProjectionError> {
        let parsed = CrsDefinition::parse(definition)?;
        match self.definitions.get(name) {
            Some(existing) if *existing == parsed => Ok(()),
            Some(_) => Err(ProjectionError::Conflict(name.to_string())),
            None => {
                debug!(crs = name, definition, "Registered CRS");
                self.definitions.insert(name.to_string(), parsed);
                Ok(())
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&CrsDefinition> {
        self.definitions.get(name)
    }

    /// Resolve both names once and return a reusable transform between them
    pub fn transformer(&self, source: &str, target: &str) -> Result<Transformer, ProjectionError> {
        let resolve = |name: &str| {
            self.get(name)
                .ok_or_else(|| ProjectionError::UnknownCrs(name.to_string()))
        };
        let source_def = resolve(source)?;
        let target_def = resolve(target)?;

        Ok(Transformer {
            source: source_def.compile(),
            target: target_def.compile(),
            identity: source_def == target_def,
        })
    }

    /// Transform a single position from `source` to `target`
    ///
    /// Convenience wrapper over [`CrsRegistry::transformer`]; prefer building
    /// one transformer when converting many positions.
    pub fn transform(
        &self,
        source: &str,
        target: &str,
        position: Coord<f64>,
    ) -> Result<Coord<f64>, ProjectionError> {
        Ok(self.transformer(source, target)?.transform(position))
    }
}

/// CRS-to-CRS transform with both ends resolved
///
/// Every conversion pivots through WGS84 geodetic coordinates. Geographic
/// coordinates are (longitude, latitude) in degrees.
#[derive(Debug, Clone)]
pub struct Transformer {
    source: CompiledCrs,
    target: CompiledCrs,
    identity: bool,
}

impl Transformer {
    pub fn transform(&self, position: Coord<f64>) -> Coord<f64> {
        if self.identity {
            return position;
        }
        let (lon, lat) = self.source.to_wgs84(position.x, position.y);
        let (x, y) = self.target.from_wgs84(lon, lat);
        Coord { x, y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BRITISH_NATIONAL_GRID;
    use geo::coord;

    fn national_grid() -> CrsRegistry {
        let mut registry = CrsRegistry::new();
        registry
            .register(NATIONAL_GRID, BRITISH_NATIONAL_GRID)
            .unwrap();
        registry
    }

    fn grid_to_wgs84() -> Transformer {
        national_grid().transformer(NATIONAL_GRID, WGS84).unwrap()
    }

    #[test]
    fn test_false_origin_to_wgs84() {
        let p = grid_to_wgs84().transform(coord! { x: 400000.0, y: -100000.0 });
        assert!((p.x - -2.001307468891301).abs() < 1e-6);
        assert!((p.y - 49.00077078291914).abs() < 1e-6);
    }

    #[test]
    fn test_london_to_wgs84() {
        // Trafalgar Square on the national grid
        let p = grid_to_wgs84().transform(coord! { x: 530034.0, y: 180381.0 });
        assert!((p.x - -0.12772400574289086).abs() < 1e-6);
        assert!((p.y - 51.507406927427446).abs() < 1e-6);
    }

    #[test]
    fn test_round_trip_through_wgs84() {
        let back = national_grid().transformer(WGS84, NATIONAL_GRID).unwrap();

        let original = coord! { x: 530034.0, y: 180381.0 };
        let there = grid_to_wgs84().transform(original);
        let p = back.transform(there);
        assert!((p.x - original.x).abs() < 0.01);
        assert!((p.y - original.y).abs() < 0.01);
    }

    #[test]
    fn test_deterministic() {
        let t = grid_to_wgs84();
        let p = coord! { x: 325000.0, y: 673000.0 };
        assert_eq!(t.transform(p), t.transform(p));
    }

    #[test]
    fn test_identity_transform() {
        let registry = CrsRegistry::new();
        let p = coord! { x: -3.4735, y: 54.1171 };
        assert_eq!(registry.transform(WGS84, "WGS84", p).unwrap(), p);
    }

    #[test]
    fn test_register_idempotent() {
        let mut registry = CrsRegistry::new();
        registry
            .register(NATIONAL_GRID, BRITISH_NATIONAL_GRID)
            .unwrap();
        registry
            .register(NATIONAL_GRID, BRITISH_NATIONAL_GRID)
            .unwrap();
        assert!(registry.get(NATIONAL_GRID).is_some());
    }

    #[test]
    fn test_register_conflict() {
        let mut registry = national_grid();
        let utm = "+proj=tmerc +lat_0=0 +lon_0=9 +k=0.9996 +x_0=500000 +ellps=WGS84";
        let err = registry.register(NATIONAL_GRID, utm).unwrap_err();
        assert_eq!(err, ProjectionError::Conflict(NATIONAL_GRID.to_string()));
    }

    #[test]
    fn test_unknown_crs() {
        let registry = CrsRegistry::new();
        assert!(matches!(
            registry.transformer("EPSG:27700", WGS84),
            Err(ProjectionError::UnknownCrs(_))
        ));
    }

    #[test]
    fn test_wgs84_literal_matches_builtin() {
        assert_eq!(
            CrsDefinition::parse("+proj=longlat +datum=WGS84 +no_defs").unwrap(),
            *CrsRegistry::new().get(WGS84).unwrap()
        );
    }
}
