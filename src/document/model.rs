use std::collections::HashSet;
use std::fmt;
use std::io::{Read, Write};

use serde::de::{self, Unexpected, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::slot::{Position, PositionSlot};
use crate::error::{Error, Result};
use crate::geometry::Bounds;

/// A ring is an ordered list of position slots
pub type Ring = Vec<PositionSlot>;

/// Feature identifier, numeric or string, unique within a document
///
/// Numbers may be negative. A float with no fractional part (`2.0`) is read as
/// the integer it spells; any other float is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum FeatureId {
    Number(i64),
    String(String),
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureId::Number(n) => write!(f, "{}", n),
            FeatureId::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for FeatureId {
    fn from(s: &str) -> Self {
        FeatureId::String(s.to_string())
    }
}

impl<'de> Deserialize<'de> for FeatureId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(FeatureIdVisitor)
    }
}

struct FeatureIdVisitor;

impl<'de> Visitor<'de> for FeatureIdVisitor {
    type Value = FeatureId;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an integer or a string feature id")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<FeatureId, E> {
        Ok(FeatureId::Number(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<FeatureId, E> {
        i64::try_from(v)
            .map(FeatureId::Number)
            .map_err(|_| E::invalid_value(Unexpected::Unsigned(v), &self))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<FeatureId, E> {
        let in_range = v >= i64::MIN as f64 && v < i64::MAX as f64;
        if v.fract() == 0.0 && in_range {
            Ok(FeatureId::Number(v as i64))
        } else {
            Err(E::invalid_value(Unexpected::Float(v), &self))
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<FeatureId, E> {
        Ok(FeatureId::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<FeatureId, E> {
        Ok(FeatureId::String(v))
    }
}

/// The polygon shapes a boundary can take
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Shape {
    Polygon(Vec<Ring>),
    MultiPolygon(Vec<Vec<Ring>>),
}

/// A GeoJSON geometry object: its shape plus any `bbox` and foreign members
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(flatten)]
    pub shape: Shape,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Vec<f64>>,
    #[serde(flatten)]
    pub foreign: Map<String, Value>,
}

impl From<Shape> for Geometry {
    fn from(shape: Shape) -> Self {
        Self {
            shape,
            bbox: None,
            foreign: Map::new(),
        }
    }
}

impl Geometry {
    pub fn rings(&self) -> Box<dyn Iterator<Item = &Ring> + '_> {
        match &self.shape {
            Shape::Polygon(rings) => Box::new(rings.iter()),
            Shape::MultiPolygon(polygons) => Box::new(polygons.iter().flatten()),
        }
    }

    pub fn rings_mut(&mut self) -> Box<dyn Iterator<Item = &mut Ring> + '_> {
        match &mut self.shape {
            Shape::Polygon(rings) => Box::new(rings.iter_mut()),
            Shape::MultiPolygon(polygons) => Box::new(polygons.iter_mut().flatten()),
        }
    }

    pub fn positions(&self) -> impl Iterator<Item = &Position> + '_ {
        self.rings().flatten().flat_map(|slot| slot.positions())
    }

    pub fn leaf_count(&self) -> usize {
        self.rings().flatten().map(PositionSlot::leaf_count).sum()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        let mut positions = self.positions();
        let first = positions.next()?;
        let mut bounds = Bounds::from_points(&[first.coord()])?;
        for p in positions {
            bounds.expand(p.coord());
        }
        Some(bounds)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<FeatureId>,
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
    pub geometry: Geometry,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Vec<f64>>,
    /// Members this crate does not interpret, written back unchanged
    #[serde(flatten)]
    pub foreign: Map<String, Value>,
}

/// A polygon feature collection as served to the map
///
/// `crs` is the legacy GeoJSON CRS-declaration header. It is kept as raw JSON
/// because its only use here is to be removed once coordinates are
/// reprojected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryDocument {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crs: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Vec<f64>>,
    pub features: Vec<Feature>,
    #[serde(flatten)]
    pub foreign: Map<String, Value>,
}

impl BoundaryDocument {
    /// Decode a document, rejecting anything that is not a polygon feature collection
    pub fn from_json(json: &str) -> Result<Self> {
        let document: Self = serde_json::from_str(json)?;
        document.check_kind()?;
        Ok(document)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let document: Self = serde_json::from_reader(reader)?;
        document.check_kind()?;
        Ok(document)
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    fn check_kind(&self) -> Result<()> {
        if self.kind != "FeatureCollection" {
            return Err(Error::NotFeatureCollection(self.kind.clone()));
        }
        if let Some(feature) = self.features.iter().find(|f| f.kind != "Feature") {
            return Err(Error::NotFeatureCollection(feature.kind.clone()));
        }
        Ok(())
    }

    /// Give every feature without an id its index in the collection
    ///
    /// Returns how many ids were assigned. Indices already taken by explicit
    /// numeric ids are skipped so ids stay unique.
    pub fn assign_missing_ids(&mut self) -> usize {
        let taken: HashSet<FeatureId> = self
            .features
            .iter()
            .filter_map(|f| f.id.clone())
            .collect();
        let mut next = 0i64;
        let mut assigned = 0;
        for feature in self.features.iter_mut().filter(|f| f.id.is_none()) {
            while taken.contains(&FeatureId::Number(next)) {
                next += 1;
            }
            feature.id = Some(FeatureId::Number(next));
            next += 1;
            assigned += 1;
        }
        assigned
    }

    /// Every feature must carry an id and no id may repeat
    pub fn validate_ids(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for (index, feature) in self.features.iter().enumerate() {
            let id = feature
                .id
                .as_ref()
                .ok_or(Error::MissingFeatureId { index })?;
            if !seen.insert(id) {
                return Err(Error::DuplicateFeatureId(id.clone()));
            }
        }
        Ok(())
    }

    pub fn leaf_count(&self) -> usize {
        self.features.iter().map(|f| f.geometry.leaf_count()).sum()
    }

    /// Extent of every position in the document
    pub fn bounds(&self) -> Option<Bounds> {
        self.features
            .iter()
            .filter_map(|f| f.geometry.bounds())
            .reduce(|mut acc, b| {
                acc.expand(geo::Coord {
                    x: b.min_x,
                    y: b.min_y,
                });
                acc.expand(geo::Coord {
                    x: b.max_x,
                    y: b.max_y,
                });
                acc
            })
    }
}
