//! Configuration loading

use anyhow::{Context, Result};
use bloom_core::{SourceId, TextStyle};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub font: FontConfig,
    #[serde(default)]
    pub scene: SceneConfig,
    #[serde(default)]
    pub render: RenderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontConfig {
    /// Candidate typeface URLs or paths, tried in order
    #[serde(default = "default_font_sources")]
    pub sources: Vec<String>,
    /// Headline text
    #[serde(default = "default_text")]
    pub text: String,
    #[serde(default = "default_size")]
    pub size: f32,
    /// Extrusion depth of the text
    #[serde(default = "default_depth")]
    pub depth: f32,
    #[serde(default = "default_curve_segments")]
    pub curve_segments: u32,
    /// Per-request HTTP timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Directory for cached font downloads
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            sources: default_font_sources(),
            text: default_text(),
            size: default_size(),
            depth: default_depth(),
            curve_segments: default_curve_segments(),
            timeout_secs: default_timeout(),
            cache_dir: default_cache_dir(),
        }
    }
}

impl FontConfig {
    pub fn candidates(&self) -> Vec<SourceId> {
        self.sources.iter().map(|s| SourceId::new(s.as_str())).collect()
    }

    pub fn text_style(&self) -> TextStyle {
        TextStyle {
            size: self.size,
            depth: self.depth,
            curve_segments: self.curve_segments,
            bevel_enabled: false,
        }
    }

    /// Cache directory, or `None` when caching is switched off
    pub fn cache_dir(&self) -> Option<PathBuf> {
        if self.cache_dir.is_empty() {
            None
        } else {
            Some(PathBuf::from(&self.cache_dir))
        }
    }
}

fn default_font_sources() -> Vec<String> {
    vec![
        "https://threejs.org/examples/fonts/helvetiker_regular.typeface.json".to_string(),
        "https://cdn.jsdelivr.net/npm/three@0.150.0/examples/fonts/helvetiker_regular.typeface.json"
            .to_string(),
        "https://unpkg.com/three@0.150.0/examples/fonts/helvetiker_regular.typeface.json".to_string(),
    ]
}

fn default_text() -> String {
    "I'M BLOOMING".to_string()
}

fn default_size() -> f32 {
    0.4
}

fn default_depth() -> f32 {
    0.1
}

fn default_curve_segments() -> u32 {
    12
}

fn default_timeout() -> u64 {
    30
}

fn default_cache_dir() -> String {
    "./cache/fonts".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneConfig {
    #[serde(default = "default_count")]
    pub sphere_count: usize,
    #[serde(default = "default_count")]
    pub bubble_count: usize,
    /// Seed for the sphere and bubble fields (random when unset)
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            sphere_count: default_count(),
            bubble_count: default_count(),
            seed: None,
        }
    }
}

fn default_count() -> usize {
    20
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Frames to run before exiting (0 runs until interrupted)
    #[serde(default = "default_frames")]
    pub frames: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            frames: default_frames(),
        }
    }
}

fn default_fps() -> u32 {
    60
}

fn default_frames() -> u64 {
    600
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(Config::default())
    }
}

const DEFAULT_CONFIG_HEADER: &str = "\
# Bloom configuration
#
# [font] sources are tried in order until one loads; when all fail the
# headline becomes a placeholder box. Set cache_dir to \"\" to disable the
# offline font cache.
# [scene] seed is optional; a random seed is used when it is absent.
# [render] frames = 0 runs until Ctrl-C.

";

/// Write the default configuration, preceded by a comment header
pub fn save_default_config(path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(&Config::default())?;
    std::fs::write(path, format!("{}{}", DEFAULT_CONFIG_HEADER, content))?;
    Ok(())
}
