//! Sprite configuration.
//!
//! Every field is optional in TOML; anything left out falls back to the
//! values of the stock "fang idle" sheet (4 frames at 250 ms on a 100x100
//! world).

use std::path::{Path, PathBuf};

use glam::{Vec2, Vec3};
use serde::Deserialize;

use crate::animation::OverflowPolicy;
use crate::camera::{Camera, ModelTransform, OrthoBounds};
use crate::error::SpriteError;

const DEFAULT_VERTEX_SHADER: &str = include_str!("shaders/sprite_vert.wgsl");
const DEFAULT_FRAGMENT_SHADER: &str = include_str!("shaders/sprite_frag.wgsl");

/// How initialization reacts to shader compile or link failures.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShaderFailurePolicy {
    /// Abort init with the shader error.
    #[default]
    FailFast,
    /// Log the diagnostics and keep going without a program; nothing is drawn.
    Degraded,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CameraConfig {
    pub bounds: OrthoBounds,
    pub eye: [f32; 3],
    pub target: [f32; 3],
    pub up: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            bounds: OrthoBounds::default(),
            eye: [0.0, 0.0, 90.0],
            target: [0.0, 0.0, 0.0],
            up: [0.0, 1.0, 0.0],
        }
    }
}

/// Optional WGSL overrides; the built-in sprite shaders are used otherwise.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShaderConfig {
    pub vertex_path: Option<PathBuf>,
    pub fragment_path: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String,
}

impl Default for ShaderSources {
    fn default() -> Self {
        Self {
            vertex: DEFAULT_VERTEX_SHADER.to_owned(),
            fragment: DEFAULT_FRAGMENT_SHADER.to_owned(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpriteConfig {
    pub frame_count: usize,
    pub period_ms: u64,
    pub atlas_image_path: PathBuf,
    pub camera: CameraConfig,
    pub sprite_translation: [f32; 2],
    pub sprite_scale: [f32; 2],
    pub quad_half_extent: f32,
    pub clear_color: [f32; 4],
    pub overflow: OverflowPolicy,
    pub shader_failure: ShaderFailurePolicy,
    pub shaders: ShaderConfig,
}

impl Default for SpriteConfig {
    fn default() -> Self {
        Self {
            frame_count: 4,
            period_ms: 250,
            atlas_image_path: PathBuf::from("assets/fang-idle.png"),
            camera: CameraConfig::default(),
            sprite_translation: [50.0, 50.0],
            sprite_scale: [40.0, 50.0],
            quad_half_extent: 0.5,
            clear_color: [0.93, 0.95, 0.98, 1.0],
            overflow: OverflowPolicy::Discard,
            shader_failure: ShaderFailurePolicy::FailFast,
            shaders: ShaderConfig::default(),
        }
    }
}

impl SpriteConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, SpriteError> {
        let config: SpriteConfig =
            toml::from_str(content).map_err(|e| SpriteError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SpriteError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        log::info!("Loaded sprite config from {}", path.display());
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), SpriteError> {
        if self.frame_count == 0 {
            return Err(SpriteError::Config("frame_count must be at least 1".into()));
        }
        if self.period_ms == 0 {
            return Err(SpriteError::Config("period_ms must be positive".into()));
        }
        if self.sprite_scale.iter().any(|s| !s.is_finite())
            || self.sprite_translation.iter().any(|t| !t.is_finite())
        {
            return Err(SpriteError::Config("sprite transform must be finite".into()));
        }
        Ok(())
    }

    /// Frame period in seconds.
    pub fn period(&self) -> f64 {
        self.period_ms as f64 / 1000.0
    }

    pub fn camera(&self) -> Result<Camera, SpriteError> {
        Camera::new(
            self.camera.bounds,
            Vec3::from_array(self.camera.eye),
            Vec3::from_array(self.camera.target),
            Vec3::from_array(self.camera.up),
        )
    }

    pub fn model_transform(&self) -> ModelTransform {
        ModelTransform::new(
            Vec2::from_array(self.sprite_translation),
            Vec2::from_array(self.sprite_scale),
        )
    }

    /// Resolve shader text, reading any override files.
    pub fn shader_sources(&self) -> Result<ShaderSources, SpriteError> {
        let mut sources = ShaderSources::default();
        if let Some(path) = &self.shaders.vertex_path {
            sources.vertex = std::fs::read_to_string(path)?;
        }
        if let Some(path) = &self.shaders.fragment_path {
            sources.fragment = std::fs::read_to_string(path)?;
        }
        Ok(sources)
    }
}
