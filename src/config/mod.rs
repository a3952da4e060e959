use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::geometry::{BRITISH_NATIONAL_GRID, NATIONAL_GRID, WGS84};
use crate::layers::BoundaryStyle;

fn default_source_crs() -> String {
    NATIONAL_GRID.to_string()
}
fn default_source_crs_definition() -> String {
    BRITISH_NATIONAL_GRID.to_string()
}
fn default_target_crs() -> String {
    WGS84.to_string()
}
fn default_source_name() -> String {
    "boundaries".to_string()
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct FileConfig {
    /// Name the boundary data's projected CRS is registered under
    #[serde(default = "default_source_crs")]
    pub source_crs: String,
    /// Proj-style definition registered for `source_crs`
    #[serde(default = "default_source_crs_definition")]
    pub source_crs_definition: String,
    #[serde(default = "default_target_crs")]
    pub target_crs: String,
    /// Renderer source name; layer ids derive from it
    #[serde(default = "default_source_name")]
    pub source_name: String,
    /// Number features that arrive without an id
    #[serde(default)]
    pub generate_ids: bool,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub style: BoundaryStyle,
    #[serde(default)]
    pub fetch: FetchConfig,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            source_crs: default_source_crs(),
            source_crs_definition: default_source_crs_definition(),
            target_crs: default_target_crs(),
            source_name: default_source_name(),
            generate_ids: false,
            map: MapConfig::default(),
            style: BoundaryStyle::default(),
            fetch: FetchConfig::default(),
        }
    }
}

fn default_map_style() -> String {
    "mapbox://styles/mapbox/streets-v12".to_string()
}
fn default_center() -> [f64; 2] {
    [-3.4735, 54.1171]
}
fn default_zoom() -> f64 {
    4.0
}

/// Initial viewport of the map host
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct MapConfig {
    #[serde(default = "default_map_style")]
    pub style: String,
    /// `[lon, lat]`
    #[serde(default = "default_center")]
    pub center: [f64; 2],
    #[serde(default = "default_zoom")]
    pub zoom: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            style: default_map_style(),
            center: default_center(),
            zoom: default_zoom(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct FetchConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl FileConfig {
    /// First parsable config file on the search path, if any
    pub fn load() -> Option<Self> {
        Self::load_first(&get_config_paths())
    }

    /// Read an explicitly named config file; unlike [`FileConfig::load`] a
    /// missing or broken file is an error
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    fn load_first(paths: &[PathBuf]) -> Option<Self> {
        for path in paths {
            if path.exists()
                && let Ok(contents) = std::fs::read_to_string(path)
            {
                match toml::from_str(&contents) {
                    Ok(config) => return Some(config),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Failed to parse config file");
                    }
                }
            }
        }
        None
    }
}

fn get_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    paths.push(PathBuf::from("boundmap.toml"));
    paths.push(PathBuf::from(".boundmap.toml"));

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("boundmap").join("config.toml"));
        paths.push(config_dir.join("boundmap.toml"));
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".boundmap.toml"));
        paths.push(home.join(".config").join("boundmap").join("config.toml"));
    }

    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert_eq!(config, FileConfig::default());
        assert_eq!(config.source_crs, "EPSG:27700");
        assert_eq!(config.target_crs, "EPSG:4326");
        assert_eq!(config.source_name, "boundaries");
        assert_eq!(config.map.center, [-3.4735, 54.1171]);
        assert_eq!(config.map.zoom, 4.0);
        assert_eq!(config.fetch.timeout_secs, 30);
        assert!(!config.generate_ids);
    }

    #[test]
    fn test_partial_sections() {
        let config: FileConfig = toml::from_str(
            r##"
            source_name = "counties"
            generate_ids = true

            [map]
            zoom = 6.5

            [style]
            fill_color = "#ff8800"
            "##,
        )
        .unwrap();

        assert_eq!(config.source_name, "counties");
        assert!(config.generate_ids);
        assert_eq!(config.map.zoom, 6.5);
        assert_eq!(config.map.style, "mapbox://styles/mapbox/streets-v12");
        assert_eq!(config.style.fill_color, "#ff8800");
        assert_eq!(config.style.fill_opacity, 0.5);
        assert_eq!(config.fetch, FetchConfig::default());
    }

    #[test]
    fn test_from_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("boundmap.toml");
        fs::write(&path, "[fetch]\ntimeout_secs = 5\n").unwrap();

        let config = FileConfig::from_path(&path).unwrap();
        assert_eq!(config.fetch.timeout_secs, 5);
    }

    #[test]
    fn test_from_path_missing_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(FileConfig::from_path(&dir.path().join("nope.toml")).is_err());
    }

    #[test]
    fn test_load_first_skips_broken_files() {
        let dir = TempDir::new().unwrap();
        let broken = dir.path().join("broken.toml");
        let good = dir.path().join("good.toml");
        fs::write(&broken, "source_name = [").unwrap();
        fs::write(&good, "source_name = \"regions\"").unwrap();

        let paths = vec![dir.path().join("missing.toml"), broken, good];
        let config = FileConfig::load_first(&paths).unwrap();
        assert_eq!(config.source_name, "regions");
    }

    #[test]
    fn test_load_first_nothing_found() {
        let dir = TempDir::new().unwrap();
        assert!(FileConfig::load_first(&[dir.path().join("missing.toml")]).is_none());
    }
}
