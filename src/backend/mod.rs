//! Narrow graphics capability consumed by [`crate::renderer::Renderer`].
//!
//! The renderer never touches wgpu directly; it issues buffer, shader,
//! texture and draw calls through this trait. [`crate::renderer::WgpuBackend`]
//! is the real implementation and [`recording::RecordingBackend`] records the
//! call sequence for headless use.

use std::fmt;

use glam::Mat4;
use image::RgbaImage;

use crate::error::SpriteError;
use crate::vertex::Vertex;

pub mod recording;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// Compiler or linker output explaining a shader failure.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Diagnostics(pub String);

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Diagnostics {
    fn from(s: String) -> Self {
        Diagnostics(s)
    }
}

/// Reject sheets the device cannot hold before any GPU object is created.
pub fn check_texture_size(
    width: u32,
    height: u32,
    max_dimension: u32,
) -> Result<(), SpriteError> {
    if width == 0 || height == 0 {
        return Err(SpriteError::InvalidInput(format!("sprite sheet is empty ({width}x{height})")));
    }
    if width > max_dimension || height > max_dimension {
        return Err(SpriteError::InvalidInput(format!(
            "sprite sheet {width}x{height} exceeds the device limit of {max_dimension} px"
        )));
    }
    Ok(())
}

pub trait GraphicsBackend {
    /// Create the vertex buffer and fill it with the atlas geometry.
    fn upload_vertices(&mut self, vertices: &[Vertex]) -> Result<(), SpriteError>;

    fn compile_shader(
        &mut self,
        stage: ShaderStage,
        source: &str,
    ) -> Result<ShaderHandle, Diagnostics>;

    fn link_program(
        &mut self,
        vertex: ShaderHandle,
        fragment: ShaderHandle,
    ) -> Result<ProgramHandle, Diagnostics>;

    fn use_program(&mut self, program: ProgramHandle);

    fn create_texture(&mut self, image: &RgbaImage) -> Result<TextureHandle, SpriteError>;

    fn bind_texture(&mut self, texture: TextureHandle);

    fn set_uniform_matrix4(&mut self, matrix: Mat4);

    /// Begin a frame cleared to `color`.
    fn clear(&mut self, color: [f32; 4]);

    fn draw_triangle_strip(&mut self, vertex_offset: u32, vertex_count: u32);

    /// Flush everything recorded since `clear` to the screen.
    fn submit(&mut self) -> Result<(), SpriteError>;

    fn resize(&mut self, _width: u32, _height: u32) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_size_within_limit_is_accepted() {
        assert!(check_texture_size(8192, 1, 8192).is_ok());
        assert!(check_texture_size(64, 16, 8192).is_ok());
    }

    #[test]
    fn oversized_or_empty_sheet_is_rejected() {
        // 4 frames of 4096 px side by side
        assert!(matches!(
            check_texture_size(16384, 4096, 8192),
            Err(SpriteError::InvalidInput(_))
        ));
        assert!(matches!(
            check_texture_size(64, 8193, 8192),
            Err(SpriteError::InvalidInput(_))
        ));
        assert!(matches!(
            check_texture_size(0, 16, 8192),
            Err(SpriteError::InvalidInput(_))
        ));
    }
}
