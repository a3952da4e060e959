use std::collections::HashSet;

use tracing::info;

use super::boundary::HOVER_STATE;
use super::spec::LayerSpec;
use crate::document::NormalizedDocument;
use crate::error::{Error, Result};
use crate::renderer::{MapRenderer, RendererError, SourceSpec};

/// Register a normalized document as `source_name` and declare `layers` on it
///
/// Layers are added in slice order, which is also draw order. Every layer must
/// draw from `source_name`, and layer ids must be unique; both are checked
/// before anything reaches the renderer.
pub fn bind<R: MapRenderer + ?Sized>(
    renderer: &mut R,
    source_name: &str,
    document: &NormalizedDocument,
    layers: &[LayerSpec],
) -> Result<()> {
    if !renderer.is_ready() {
        return Err(RendererError::NotReady.into());
    }

    let mut ids = HashSet::new();
    for layer in layers {
        if layer.source != source_name {
            return Err(Error::LayerSource {
                layer: layer.id.clone(),
                layer_source: layer.source.clone(),
                expected: source_name.to_string(),
            });
        }
        if !ids.insert(layer.id.as_str()) {
            return Err(RendererError::DuplicateLayer(layer.id.clone()).into());
        }
    }

    let data = serde_json::to_value(document)?;
    renderer.add_source(source_name, SourceSpec::Geojson { data })?;

    for layer in layers {
        renderer.add_layer(layer.clone())?;
    }

    let hover_layers = layers
        .iter()
        .filter(|l| l.reads_feature_state(HOVER_STATE))
        .count();
    info!(
        source = source_name,
        features = document.document().features.len(),
        layers = layers.len(),
        hover_layers,
        "Bound boundary source"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{BoundaryDocument, Normalizer};
    use crate::layers::{BoundaryStyle, boundary_layers};
    use crate::renderer::RecordingRenderer;
    use serde_json::json;

    fn normalized() -> NormalizedDocument {
        let doc = BoundaryDocument::from_json(
            &json!({
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "id": 1,
                    "properties": { "name": "Cumbria" },
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[
                            [325000, 500000],
                            [350000, 500000],
                            [350000, 550000],
                            [325000, 500000]
                        ]]
                    }
                }]
            })
            .to_string(),
        )
        .unwrap();
        Normalizer::default().finish(doc).unwrap().0
    }

    #[test]
    fn test_bind_registers_source_then_layers_in_order() {
        let mut renderer = RecordingRenderer::ready();
        let layers = boundary_layers("boundaries", &BoundaryStyle::default());

        bind(&mut renderer, "boundaries", &normalized(), &layers).unwrap();

        assert_eq!(renderer.sources().len(), 1);
        assert_eq!(renderer.sources()[0].0, "boundaries");
        let ids: Vec<&str> = renderer.layers().iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["boundaries-fills", "boundaries-borders"]);
    }

    #[test]
    fn test_source_carries_geographic_coordinates() {
        let mut renderer = RecordingRenderer::ready();
        bind(&mut renderer, "boundaries", &normalized(), &[]).unwrap();

        let SourceSpec::Geojson { data } = &renderer.sources()[0].1;
        let x = data["features"][0]["geometry"]["coordinates"][0][0][0]
            .as_f64()
            .unwrap();
        assert!((-180.0..=180.0).contains(&x));
        assert!(data.get("crs").is_none());
    }

    #[test]
    fn test_bind_before_ready_fails() {
        let mut renderer = RecordingRenderer::default();
        let err = bind(&mut renderer, "boundaries", &normalized(), &[]).unwrap_err();
        assert!(matches!(err, Error::Renderer(RendererError::NotReady)));
        assert!(renderer.sources().is_empty());
    }

    #[test]
    fn test_layer_from_other_source_rejected() {
        let mut renderer = RecordingRenderer::ready();
        let layers = boundary_layers("elsewhere", &BoundaryStyle::default());
        let err = bind(&mut renderer, "boundaries", &normalized(), &layers).unwrap_err();
        assert!(matches!(err, Error::LayerSource { .. }));
        assert!(renderer.sources().is_empty());
    }

    #[test]
    fn test_duplicate_layer_ids_rejected() {
        let mut renderer = RecordingRenderer::ready();
        let mut layers = boundary_layers("boundaries", &BoundaryStyle::default());
        layers.push(layers[0].clone());
        let err = bind(&mut renderer, "boundaries", &normalized(), &layers).unwrap_err();
        assert!(matches!(
            err,
            Error::Renderer(RendererError::DuplicateLayer(_))
        ));
        assert!(renderer.layers().is_empty());
    }
}
