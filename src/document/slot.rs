//! Position slots inside a polygon ring
//!
//! A ring is normally a list of `[x, y]` positions, but older encoders wrap
//! positions one level deeper (`[[x, y], [x, y]]` in a single slot). Each slot
//! is resolved once, when the document is decoded, by looking at its first
//! element:
//!
//! - no elements: [`PositionSlot::Empty`]
//! - a number: [`PositionSlot::Position`]
//! - an array: [`PositionSlot::Group`]
//!
//! Any other shape fails decoding, so the walkers in this crate never meet an
//! unclassified slot.

use std::fmt;

use geo::Coord;
use serde::de::{self, SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::geometry::Transformer;

/// A single position: x/y plus any extra ordinates (altitude, measure), which
/// are carried through untouched
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub extra: Vec<f64>,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            extra: Vec::new(),
        }
    }

    pub fn coord(&self) -> Coord<f64> {
        Coord {
            x: self.x,
            y: self.y,
        }
    }

    /// Overwrite x/y with their transformed values
    pub fn transform_in_place(&mut self, transformer: &Transformer) {
        let Coord { x, y } = transformer.transform(self.coord());
        self.x = x;
        self.y = y;
    }

    /// Number of ordinates as written in the document
    pub fn dimensions(&self) -> usize {
        2 + self.extra.len()
    }

    fn from_ordinates<E: de::Error>(ordinates: Vec<f64>) -> Result<Self, E> {
        match ordinates.as_slice() {
            [x, y, rest @ ..] => Ok(Self {
                x: *x,
                y: *y,
                extra: rest.to_vec(),
            }),
            _ => Err(E::invalid_length(
                ordinates.len(),
                &"a position with at least 2 ordinates",
            )),
        }
    }
}

impl Serialize for Position {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.dimensions()))?;
        seq.serialize_element(&self.x)?;
        seq.serialize_element(&self.y)?;
        for value in &self.extra {
            seq.serialize_element(value)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Position {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let ordinates = Vec::<f64>::deserialize(deserializer)?;
        Position::from_ordinates(ordinates)
    }
}

/// One entry of a ring
#[derive(Debug, Clone, PartialEq)]
pub enum PositionSlot {
    /// Zero-length slot; left exactly as found
    Empty,
    Position(Position),
    /// Legacy nesting: a slot holding several positions
    Group(Vec<Position>),
}

impl PositionSlot {
    /// Number of leaf positions in this slot
    pub fn leaf_count(&self) -> usize {
        match self {
            PositionSlot::Empty => 0,
            PositionSlot::Position(_) => 1,
            PositionSlot::Group(inner) => inner.len(),
        }
    }

    pub fn positions(&self) -> &[Position] {
        match self {
            PositionSlot::Empty => &[],
            PositionSlot::Position(p) => std::slice::from_ref(p),
            PositionSlot::Group(inner) => inner,
        }
    }
}

impl From<Position> for PositionSlot {
    fn from(p: Position) -> Self {
        PositionSlot::Position(p)
    }
}

impl Serialize for PositionSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PositionSlot::Empty => serializer.serialize_seq(Some(0))?.end(),
            PositionSlot::Position(p) => p.serialize(serializer),
            PositionSlot::Group(inner) => inner.serialize(serializer),
        }
    }
}

/// First element of a slot, which decides its depth
#[derive(Deserialize)]
#[serde(untagged)]
enum Leading {
    Ordinate(f64),
    Nested(Vec<f64>),
}

struct SlotVisitor;

impl<'de> Visitor<'de> for SlotVisitor {
    type Value = PositionSlot;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a position, a list of positions, or an empty array")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let first = match seq.next_element::<Leading>() {
            Ok(Some(first)) => first,
            Ok(None) => return Ok(PositionSlot::Empty),
            Err(_) => {
                return Err(de::Error::custom(
                    "position slot must start with a number or a numeric array",
                ));
            }
        };

        match first {
            Leading::Ordinate(x) => {
                let mut ordinates = vec![x];
                while let Some(value) = seq.next_element::<f64>()? {
                    ordinates.push(value);
                }
                Position::from_ordinates(ordinates).map(PositionSlot::Position)
            }
            Leading::Nested(ordinates) => {
                let mut inner = vec![Position::from_ordinates::<A::Error>(ordinates)?];
                while let Some(position) = seq.next_element::<Position>()? {
                    inner.push(position);
                }
                Ok(PositionSlot::Group(inner))
            }
        }
    }
}

impl<'de> Deserialize<'de> for PositionSlot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_seq(SlotVisitor)
    }
}
