use std::path::{Path, PathBuf};

use log::info;
use serde::Deserialize;
use thiserror::Error;

use crate::parameters::RenderParameters;
use crate::render_system::accumulate::CompositeMode;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct HighQualityConfig {
    pub total_samples: u32,
    pub samples_per_pass: u32,
    pub output: PathBuf,
    pub composite: CompositeMode,
}

impl Default for HighQualityConfig {
    fn default() -> HighQualityConfig {
        HighQualityConfig {
            total_samples: 1000,
            samples_per_pass: 500,
            output: PathBuf::from("render.png"),
            composite: CompositeMode::Overwrite,
        }
    }
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Config {
    // directory holding the scene files and textures
    pub asset_root: String,
    pub materials_file: String,
    pub spheres_file: String,
    pub quads_file: String,
    // [width, height] of the render target
    pub extent: [u32; 2],
    pub fov_y_degrees: f32,
    pub move_speed: f32,
    pub rotation_speed: f32,
    pub parameters: RenderParameters,
    pub high_quality: HighQualityConfig,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            asset_root: "world".to_string(),
            materials_file: "materials.json".to_string(),
            spheres_file: "spheres.json".to_string(),
            quads_file: "quads.json".to_string(),
            extent: [1920, 1080],
            fov_y_degrees: 62.3458,
            move_speed: 5.0,
            rotation_speed: 0.1,
            parameters: RenderParameters::default(),
            high_quality: HighQualityConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Config, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn materials_path(&self) -> PathBuf {
        Path::new(&self.asset_root).join(&self.materials_file)
    }

    pub fn spheres_path(&self) -> PathBuf {
        Path::new(&self.asset_root).join(&self.spheres_file)
    }

    pub fn quads_path(&self) -> PathBuf {
        Path::new(&self.asset_root).join(&self.quads_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        assert_eq!(Config::from_json("{}").unwrap(), Config::default());
    }

    #[test]
    fn partial_config_overrides_only_given_fields() {
        let config = Config::from_json(
            r#"{
                "asset_root": "scenes/cornell",
                "extent": [640, 480],
                "parameters": {"samples": 4},
                "high_quality": {"samples_per_pass": 100, "composite": "mean"}
            }"#,
        )
        .unwrap();
        assert_eq!(config.extent, [640, 480]);
        assert_eq!(config.parameters.samples, 4);
        assert_eq!(config.parameters.max_bounces, 3);
        assert_eq!(config.high_quality.samples_per_pass, 100);
        assert_eq!(config.high_quality.total_samples, 1000);
        assert_eq!(config.high_quality.composite, CompositeMode::RunningMean);
        assert_eq!(
            config.spheres_path(),
            Path::new("scenes/cornell").join("spheres.json")
        );
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = Config::load(Path::new("/no/such/config.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
