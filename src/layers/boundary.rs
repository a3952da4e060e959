use serde::Deserialize;
use serde_json::json;

use super::spec::{LayerSpec, feature_state_case};

/// Feature-state key the hover tracker writes and the paint expressions read
pub const HOVER_STATE: &str = "hover";

/// Paint settings for the boundary fill and outline layers
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BoundaryStyle {
    pub fill_color: String,
    pub fill_opacity: f64,
    /// Fill opacity while the pointer is over the feature
    pub hover_fill_opacity: f64,
    pub line_color: String,
    pub line_width: f64,
}

impl Default for BoundaryStyle {
    fn default() -> Self {
        Self {
            fill_color: "#627BC1".to_string(),
            fill_opacity: 0.5,
            hover_fill_opacity: 1.0,
            line_color: "#627BC1".to_string(),
            line_width: 2.0,
        }
    }
}

/// Id of the fill layer built by [`boundary_layers`]; hover tracking attaches here
pub fn fill_layer_id(source: &str) -> String {
    format!("{}-fills", source)
}

pub fn line_layer_id(source: &str) -> String {
    format!("{}-borders", source)
}

/// The fill + outline pair for a boundary source
///
/// Fill comes first so the outline draws on top of it.
pub fn boundary_layers(source: &str, style: &BoundaryStyle) -> Vec<LayerSpec> {
    let fill = LayerSpec::fill(&fill_layer_id(source), source)
        .with_paint("fill-color", json!(style.fill_color))
        .with_paint(
            "fill-opacity",
            feature_state_case(
                HOVER_STATE,
                json!(style.hover_fill_opacity),
                json!(style.fill_opacity),
            ),
        );

    let line = LayerSpec::line(&line_layer_id(source), source)
        .with_paint("line-color", json!(style.line_color))
        .with_paint("line-width", json!(style.line_width));

    vec![fill, line]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::LayerKind;

    #[test]
    fn test_fill_before_line() {
        let layers = boundary_layers("boundaries", &BoundaryStyle::default());
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0].kind, LayerKind::Fill);
        assert_eq!(layers[0].id, "boundaries-fills");
        assert_eq!(layers[1].kind, LayerKind::Line);
        assert_eq!(layers[1].id, "boundaries-borders");
        assert!(layers.iter().all(|l| l.source == "boundaries"));
    }

    #[test]
    fn test_fill_opacity_follows_hover() {
        let layers = boundary_layers("boundaries", &BoundaryStyle::default());
        assert!(layers[0].reads_feature_state(HOVER_STATE));
        assert_eq!(
            layers[0].paint["fill-opacity"],
            json!(["case", ["boolean", ["feature-state", "hover"], false], 1.0, 0.5])
        );
    }

    #[test]
    fn test_style_overrides() {
        let style = BoundaryStyle {
            fill_color: "#ff0000".to_string(),
            line_width: 0.5,
            ..Default::default()
        };
        let layers = boundary_layers("b", &style);
        assert_eq!(layers[0].paint["fill-color"], json!("#ff0000"));
        assert_eq!(layers[1].paint["line-width"], json!(0.5));
    }
}
