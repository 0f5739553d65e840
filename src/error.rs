use std::path::PathBuf;

use thiserror::Error;

use crate::backend::{Diagnostics, ShaderStage};

#[derive(Error, Debug)]
pub enum SpriteError {
    #[error("frame index {index} out of range for {frame_count} frames")]
    OutOfRange { index: usize, frame_count: usize },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid camera config: {0}")]
    InvalidCameraConfig(String),

    #[error("failed to load image {path:?}: {reason}")]
    AssetLoad { path: PathBuf, reason: String },

    #[error("{stage:?} shader failed to compile: {diagnostics}")]
    ShaderCompile {
        stage: ShaderStage,
        diagnostics: Diagnostics,
    },

    #[error("shader program failed to link: {0}")]
    ShaderLink(Diagnostics),

    #[error("config error: {0}")]
    Config(String),

    #[error("wgpu error")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("surface error: {0}")]
    Surface(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
