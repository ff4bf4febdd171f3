use std::path::Path;
use serde::{Deserialize, Serialize};

use crate::{
    compositor::SizeMode,
    error::{ConfigError, Result},
    motion::InterpolationMode,
    path::DEFAULT_SAMPLES_PER_SEGMENT,
};

/// Main configuration for the Keyframe-Compositor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Output canvas settings
    pub canvas: CanvasConfig,

    /// Keyframe interpolation settings
    pub animation: AnimationConfig,

    /// Foreground placement and batch handling
    pub foreground: ForegroundConfig,

    /// Parallel rendering settings
    pub processing: ProcessingConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.canvas.validate()?;
        self.animation.validate()?;
        self.foreground.validate()?;
        self.processing.validate()?;
        Ok(())
    }
}

fn invalid(key: &str, value: impl ToString) -> ConfigError {
    ConfigError::InvalidValue { key: key.to_string(), value: value.to_string() }
}

/// Output canvas configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Canvas width in pixels
    pub width: u32,

    /// Canvas height in pixels
    pub height: u32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self { width: 512, height: 512 }
    }
}

impl CanvasConfig {
    fn validate(&self) -> Result<()> {
        if self.width == 0 {
            return Err(invalid("canvas.width", self.width).into());
        }
        if self.height == 0 {
            return Err(invalid("canvas.height", self.height).into());
        }
        Ok(())
    }
}

/// Keyframe interpolation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Number of frames to render
    pub total_frames: u32,

    /// Smooth keyframe paths with a Catmull-Rom spline before traversal
    pub smooth_path: bool,

    /// Spline samples between two authored points
    pub samples_per_segment: usize,

    /// Use the first-point blend of older releases between distinct paths
    pub legacy_interpolation: bool,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            total_frames: 60,
            smooth_path: true,
            samples_per_segment: DEFAULT_SAMPLES_PER_SEGMENT,
            legacy_interpolation: false,
        }
    }
}

impl AnimationConfig {
    fn validate(&self) -> Result<()> {
        if self.total_frames == 0 {
            return Err(invalid("animation.total_frames", self.total_frames).into());
        }
        if self.samples_per_segment == 0 {
            return Err(invalid("animation.samples_per_segment", self.samples_per_segment).into());
        }
        Ok(())
    }

    pub fn interpolation_mode(&self) -> InterpolationMode {
        InterpolationMode::from_flags(self.smooth_path, self.legacy_interpolation)
    }
}

/// Foreground configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForegroundConfig {
    /// Static scale applied to every foreground before per-frame effects
    pub scale: f64,

    /// Anchor foregrounds at their centre rather than their top-left corner
    pub center_anchor: bool,

    /// Size normalization for batch foregrounds
    pub size_mode: SizeMode,

    /// Edge length used by `size_mode = "custom"`
    pub custom_size: u32,
}

impl Default for ForegroundConfig {
    fn default() -> Self {
        Self {
            scale: 1.0,
            center_anchor: true,
            size_mode: SizeMode::Largest,
            custom_size: 512,
        }
    }
}

impl ForegroundConfig {
    fn validate(&self) -> Result<()> {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(invalid("foreground.scale", self.scale).into());
        }
        if self.custom_size == 0 {
            return Err(invalid("foreground.custom_size", self.custom_size).into());
        }
        Ok(())
    }
}

/// Parallel rendering configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Number of frame rendering threads
    pub threads: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self { threads: num_cpus::get() }
    }
}

impl ProcessingConfig {
    fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            return Err(invalid("processing.threads", self.threads).into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.animation.interpolation_mode(), InterpolationMode::Spline);
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test_config.toml");

        let mut original_config = Config::default();
        original_config.canvas.width = 640;
        original_config.foreground.size_mode = SizeMode::Custom;

        original_config.save_to_file(&file_path).unwrap();
        let loaded_config = Config::from_file(&file_path).unwrap();

        assert_eq!(original_config, loaded_config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("partial.toml");
        std::fs::write(&file_path, "[animation]\nsmooth_path = false\n\n[foreground]\nsize_mode = \"first\"\n").unwrap();

        let config = Config::from_file(&file_path).unwrap();

        assert_eq!(config.canvas.width, 512);
        assert_eq!(config.animation.total_frames, 60);
        assert_eq!(config.animation.interpolation_mode(), InterpolationMode::Polyline);
        assert_eq!(config.foreground.size_mode, SizeMode::First);
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_file("/no/such/config.toml").unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_invalid_values() {
        let mut config = Config::default();
        config.canvas.height = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.foreground.scale = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.animation.total_frames = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.processing.threads = 0;
        assert!(config.validate().is_err());
    }
}
