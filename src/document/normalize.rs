use serde::Serialize;
use tracing::{debug, info, warn};

use super::model::{BoundaryDocument, Geometry};
use super::slot::PositionSlot;
use crate::geometry::{
    BRITISH_NATIONAL_GRID, Bounds, CrsRegistry, NATIONAL_GRID, ProjectionError, Transformer, WGS84,
};

/// Counters collected while walking a document
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeReport {
    pub features: usize,
    /// Leaf positions transformed, whether plain or inside a legacy group
    pub positions: usize,
    pub empty_slots: usize,
    pub legacy_groups: usize,
}

/// Brings boundary documents from their source CRS into the renderer's CRS
///
/// Normalizing rewrites coordinates in place and is not idempotent: running it
/// twice on the same document reprojects geographic degrees as if they were
/// grid meters. Use [`Normalizer::finish`] to get a [`NormalizedDocument`],
/// which cannot be normalized again.
#[derive(Debug, Clone)]
pub struct Normalizer {
    registry: CrsRegistry,
    source_crs: String,
    source_definition: String,
    target_crs: String,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(NATIONAL_GRID, BRITISH_NATIONAL_GRID, WGS84)
    }
}

impl Normalizer {
    pub fn new(source_crs: &str, source_definition: &str, target_crs: &str) -> Self {
        Self::with_registry(
            CrsRegistry::new(),
            source_crs,
            source_definition,
            target_crs,
        )
    }

    pub fn with_registry(
        registry: CrsRegistry,
        source_crs: &str,
        source_definition: &str,
        target_crs: &str,
    ) -> Self {
        Self {
            registry,
            source_crs: source_crs.to_string(),
            source_definition: source_definition.to_string(),
            target_crs: target_crs.to_string(),
        }
    }

    /// Reproject every position of `document` in place
    ///
    /// All fallible work (CRS registration and lookup) happens before the
    /// first write, so an error leaves the document untouched.
    pub fn normalize(
        &mut self,
        document: &mut BoundaryDocument,
    ) -> Result<NormalizeReport, ProjectionError> {
        self.registry
            .register(&self.source_crs, &self.source_definition)?;
        let transformer = self
            .registry
            .transformer(&self.source_crs, &self.target_crs)?;

        if let Some(header) = document.crs.take() {
            debug!(%header, "Dropped CRS header");
        }

        debug!(leaves = document.leaf_count(), "Reprojecting positions");

        let mut report = NormalizeReport::default();
        for feature in &mut document.features {
            let geometry = &mut feature.geometry;
            normalize_geometry(geometry, &transformer, &mut report);
            let bounds = geometry.bounds();
            refresh_bbox(&mut geometry.bbox, bounds);
            refresh_bbox(&mut feature.bbox, bounds);
            report.features += 1;
        }

        let bounds = document.bounds();
        refresh_bbox(&mut document.bbox, bounds);

        if report.empty_slots > 0 {
            warn!(
                empty_slots = report.empty_slots,
                "Skipped empty position slots"
            );
        }
        info!(
            from = %self.source_crs,
            to = %self.target_crs,
            features = report.features,
            positions = report.positions,
            legacy_groups = report.legacy_groups,
            "Normalized boundary document"
        );

        Ok(report)
    }

    /// Normalize and seal the document for the renderer
    pub fn finish(
        &mut self,
        mut document: BoundaryDocument,
    ) -> Result<(NormalizedDocument, NormalizeReport), ProjectionError> {
        let report = self.normalize(&mut document)?;
        Ok((NormalizedDocument(document), report))
    }
}

/// Recompute a `bbox` that was present on input, keeping its dimension count
fn refresh_bbox(bbox: &mut Option<Vec<f64>>, bounds: Option<Bounds>) {
    if let Some(previous) = bbox.take() {
        *bbox = bounds.map(|b| b.rebuild_bbox(&previous));
    }
}

fn normalize_geometry(
    geometry: &mut Geometry,
    transformer: &Transformer,
    report: &mut NormalizeReport,
) {
    for ring in geometry.rings_mut() {
        for slot in ring.iter_mut() {
            match slot {
                PositionSlot::Empty => report.empty_slots += 1,
                PositionSlot::Position(position) => {
                    position.transform_in_place(transformer);
                    report.positions += 1;
                }
                PositionSlot::Group(inner) => {
                    for position in inner.iter_mut() {
                        position.transform_in_place(transformer);
                    }
                    report.positions += inner.len();
                    report.legacy_groups += 1;
                }
            }
        }
    }
}

/// A document whose coordinates are in the renderer's CRS
///
/// Only [`Normalizer::finish`] constructs one, so holding a
/// `NormalizedDocument` proves normalization ran exactly once.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct NormalizedDocument(BoundaryDocument);

impl NormalizedDocument {
    pub fn document(&self) -> &BoundaryDocument {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{FeatureId, Position, Shape};
    use serde_json::json;

    const TOLERANCE: f64 = 1e-6;

    fn document(coordinates: serde_json::Value) -> BoundaryDocument {
        BoundaryDocument::from_json(
            &json!({
                "type": "FeatureCollection",
                "crs": { "type": "name", "properties": { "name": "urn:ogc:def:crs:EPSG::27700" } },
                "features": [{
                    "type": "Feature",
                    "id": 1,
                    "properties": {},
                    "geometry": { "type": "Polygon", "coordinates": coordinates }
                }]
            })
            .to_string(),
        )
        .unwrap()
    }

    fn slots(doc: &BoundaryDocument) -> Vec<PositionSlot> {
        doc.features[0].geometry.rings().flatten().cloned().collect()
    }

    fn assert_close(p: &Position, lon: f64, lat: f64) {
        assert!(
            (p.x - lon).abs() < TOLERANCE && (p.y - lat).abs() < TOLERANCE,
            "({}, {}) != ({}, {})",
            p.x,
            p.y,
            lon,
            lat
        );
    }

    #[test]
    fn test_false_origin_lands_on_expected_wgs84() {
        let mut doc = document(json!([[[400000, -100000]]]));
        Normalizer::default().normalize(&mut doc).unwrap();

        let slots = slots(&doc);
        assert_close(&slots[0].positions()[0], -2.001307468891301, 49.00077078291914);
    }

    #[test]
    fn test_header_removed() {
        let mut doc = document(json!([[[400000, -100000]]]));
        assert!(doc.crs.is_some());
        Normalizer::default().normalize(&mut doc).unwrap();
        assert!(doc.crs.is_none());
        assert!(!serde_json::to_string(&doc).unwrap().contains("\"crs\""));
    }

    #[test]
    fn test_document_without_header_unaffected() {
        let mut doc = document(json!([[[400000, -100000]]]));
        doc.crs = None;
        let foreign = doc.foreign.clone();
        Normalizer::default().normalize(&mut doc).unwrap();
        assert!(doc.crs.is_none());
        assert_eq!(doc.foreign, foreign);
        assert_eq!(doc.features[0].id, Some(FeatureId::Number(1)));
    }

    #[test]
    fn test_legacy_shape_preserved() {
        let mut doc = document(json!([[
            [[400000, -100000], [530034, 180381]],
            [651409.903, 313177.270]
        ]]));
        let leaves_before = doc.leaf_count();

        let report = Normalizer::default().normalize(&mut doc).unwrap();

        let slots = slots(&doc);
        assert_eq!(doc.leaf_count(), leaves_before);
        assert_eq!(report.positions, 3);
        assert_eq!(report.legacy_groups, 1);

        match &slots[0] {
            PositionSlot::Group(inner) => {
                assert_eq!(inner.len(), 2);
                assert_close(&inner[0], -2.001307468891301, 49.00077078291914);
                assert_close(&inner[1], -0.12772400574289086, 51.507406927427446);
            }
            other => panic!("expected legacy group, got {:?}", other),
        }
        match &slots[1] {
            PositionSlot::Position(p) => {
                assert_close(p, 1.7160519903749951, 52.657978598580556)
            }
            other => panic!("expected plain position, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_slot_left_alone() {
        let mut doc = document(json!([[[400000, -100000], [], [530034, 180381]]]));
        let report = Normalizer::default().normalize(&mut doc).unwrap();

        let slots = slots(&doc);
        assert_eq!(slots[1], PositionSlot::Empty);
        assert_eq!(report.empty_slots, 1);
        assert_eq!(report.positions, 2);
    }

    #[test]
    fn test_extra_ordinates_untouched() {
        let mut doc = document(json!([[[400000, -100000, 12.5]]]));
        Normalizer::default().normalize(&mut doc).unwrap();
        assert_eq!(slots(&doc)[0].positions()[0].extra, vec![12.5]);
    }

    #[test]
    fn test_normalize_twice_is_not_idempotent() {
        let mut doc = document(json!([[[530034, 180381]]]));
        let mut normalizer = Normalizer::default();

        normalizer.normalize(&mut doc).unwrap();
        let once = slots(&doc)[0].positions()[0].clone();

        normalizer.normalize(&mut doc).unwrap();
        let twice = slots(&doc)[0].positions()[0].clone();

        assert_ne!(once, twice);
        // Degrees read back as grid meters land hundreds of kilometres away
        assert!((once.x - twice.x).abs() > 1.0);
    }

    #[test]
    fn test_bbox_recomputed() {
        let mut doc = document(json!([[[400000, -100000], [530034, 180381]]]));
        doc.bbox = Some(vec![400000.0, -100000.0, 530034.0, 180381.0]);
        doc.features[0].bbox = doc.bbox.clone();

        Normalizer::default().normalize(&mut doc).unwrap();

        let bbox = doc.bbox.clone().unwrap();
        assert!((bbox[0] - -2.001307468891301).abs() < TOLERANCE);
        assert!((bbox[3] - 51.507406927427446).abs() < TOLERANCE);
        assert_eq!(doc.features[0].bbox, doc.bbox);
    }

    #[test]
    fn test_bbox_keeps_z_range() {
        let mut doc = document(json!([[[400000, -100000, 10.0], [530034, 180381, 95.0]]]));
        doc.bbox = Some(vec![400000.0, -100000.0, 10.0, 530034.0, 180381.0, 95.0]);
        doc.features[0].bbox = Some(vec![400000.0, -100000.0, 530034.0, 180381.0]);

        Normalizer::default().normalize(&mut doc).unwrap();

        let bbox = doc.bbox.clone().unwrap();
        assert_eq!(bbox.len(), 6);
        assert!((bbox[1] - 49.00077078291914).abs() < TOLERANCE);
        assert_eq!(bbox[2], 10.0);
        assert!((bbox[4] - 51.507406927427446).abs() < TOLERANCE);
        assert_eq!(bbox[5], 95.0);
        assert_eq!(doc.features[0].bbox.as_ref().map(Vec::len), Some(4));
    }

    #[test]
    fn test_geometry_bbox_recomputed() {
        let mut doc = document(json!([[[400000, -100000], [530034, 180381]]]));
        doc.features[0].geometry.bbox = Some(vec![400000.0, -100000.0, 530034.0, 180381.0]);

        Normalizer::default().normalize(&mut doc).unwrap();

        let bbox = doc.features[0].geometry.bbox.clone().unwrap();
        assert!((bbox[0] - -2.001307468891301).abs() < TOLERANCE);
        assert!((bbox[2] - -0.12772400574289086).abs() < TOLERANCE);
        assert!(doc.features[0].bbox.is_none());
        assert!(doc.bbox.is_none());
    }

    #[test]
    fn test_multipolygon_walked() {
        let mut doc = document(json!([]));
        doc.features[0].geometry = Shape::MultiPolygon(vec![
            vec![vec![Position::new(400000.0, -100000.0).into()]],
            vec![vec![Position::new(530034.0, 180381.0).into()]],
        ])
        .into();
        let report = Normalizer::default().normalize(&mut doc).unwrap();
        assert_eq!(report.positions, 2);
        let positions: Vec<_> = doc.features[0].geometry.positions().cloned().collect();
        assert_close(&positions[1], -0.12772400574289086, 51.507406927427446);
    }

    #[test]
    fn test_bad_definition_leaves_document_untouched() {
        let mut doc = document(json!([[[400000, -100000]]]));
        let before = doc.clone();
        let mut normalizer = Normalizer::new("EPSG:27700", "+proj=merc", WGS84);
        assert!(normalizer.normalize(&mut doc).is_err());
        assert_eq!(doc, before);
    }

    #[test]
    fn test_finish_seals_document() {
        let doc = document(json!([[[400000, -100000]]]));
        let (normalized, report) = Normalizer::default().finish(doc).unwrap();
        assert_eq!(report.features, 1);
        assert!(normalized.document().crs.is_none());
        let bounds = normalized.document().bounds().unwrap();
        assert!((bounds.min_y - 49.00077078291914).abs() < TOLERANCE);
    }
}
