use geo::{BoundingRect, Coord, MultiPoint};

/// Axis-aligned extent of a set of positions, in whatever CRS they are in
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Create bounds from a set of points
    pub fn from_points(points: &[Coord<f64>]) -> Option<Self> {
        let rect = MultiPoint::from(points.to_vec()).bounding_rect()?;
        Some(Self {
            min_x: rect.min().x,
            max_x: rect.max().x,
            min_y: rect.min().y,
            max_y: rect.max().y,
        })
    }

    /// Expand bounds to include another point
    pub fn expand(&mut self, point: Coord<f64>) {
        self.min_x = self.min_x.min(point.x);
        self.max_x = self.max_x.max(point.x);
        self.min_y = self.min_y.min(point.y);
        self.max_y = self.max_y.max(point.y);
    }

    /// GeoJSON `bbox` ordering: [min_x, min_y, max_x, max_y]
    pub fn to_bbox(&self) -> Vec<f64> {
        vec![self.min_x, self.min_y, self.max_x, self.max_y]
    }

    /// Replacement for an existing `bbox`, keeping its length
    ///
    /// A 3D bbox `[min_x, min_y, min_z, max_x, max_y, max_z]` keeps its z range,
    /// since only x/y are reprojected.
    pub fn rebuild_bbox(&self, previous: &[f64]) -> Vec<f64> {
        let mut bbox = self.to_bbox();
        if let [_, _, min_z, _, _, max_z] = previous {
            bbox.insert(2, *min_z);
            bbox.push(*max_z);
        }
        bbox
    }
}
