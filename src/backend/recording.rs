use glam::Mat4;
use image::RgbaImage;

use super::{
    Diagnostics, GraphicsBackend, ProgramHandle, ShaderHandle, ShaderStage, TextureHandle,
    check_texture_size,
};
use crate::error::SpriteError;
use crate::vertex::Vertex;

/// One call made against a [`RecordingBackend`].
#[derive(Clone, Debug, PartialEq)]
pub enum BackendCall {
    UploadVertices(usize),
    CompileShader(ShaderStage),
    LinkProgram(ShaderHandle, ShaderHandle),
    UseProgram(ProgramHandle),
    CreateTexture { width: u32, height: u32 },
    BindTexture(TextureHandle),
    SetUniformMatrix4(Mat4),
    Clear([f32; 4]),
    DrawTriangleStrip { vertex_offset: u32, vertex_count: u32 },
    Submit,
    Resize(u32, u32),
}

/// Headless backend that records every call instead of talking to a GPU.
///
/// Failures can be scripted per stage to exercise shader error handling.
/// Textures are checked against the same size limit a default wgpu device
/// enforces.
#[derive(Debug)]
pub struct RecordingBackend {
    pub calls: Vec<BackendCall>,
    pub vertices: Vec<Vertex>,
    fail_compile: Option<ShaderStage>,
    fail_link: bool,
    fail_submit: bool,
    max_texture_dimension: u32,
    next_handle: u32,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            vertices: Vec::new(),
            fail_compile: None,
            fail_link: false,
            fail_submit: false,
            max_texture_dimension: wgpu::Limits::default().max_texture_dimension_2d,
            next_handle: 0,
        }
    }
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_texture_dimension(mut self, max: u32) -> Self {
        self.max_texture_dimension = max;
        self
    }

    pub fn failing_compile(mut self, stage: ShaderStage) -> Self {
        self.fail_compile = Some(stage);
        self
    }

    pub fn failing_link(mut self) -> Self {
        self.fail_link = true;
        self
    }

    pub fn set_fail_submit(&mut self, fail: bool) {
        self.fail_submit = fail;
    }

    /// Draw calls made so far, as `(vertex_offset, vertex_count)`.
    pub fn draws(&self) -> Vec<(u32, u32)> {
        self.calls
            .iter()
            .filter_map(|c| match *c {
                BackendCall::DrawTriangleStrip {
                    vertex_offset,
                    vertex_count,
                } => Some((vertex_offset, vertex_count)),
                _ => None,
            })
            .collect()
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    fn handle(&mut self) -> u32 {
        let id = self.next_handle;
        self.next_handle += 1;
        id
    }
}

impl GraphicsBackend for RecordingBackend {
    fn upload_vertices(&mut self, vertices: &[Vertex]) -> Result<(), SpriteError> {
        self.vertices = vertices.to_vec();
        self.calls.push(BackendCall::UploadVertices(vertices.len()));
        Ok(())
    }

    fn compile_shader(
        &mut self,
        stage: ShaderStage,
        source: &str,
    ) -> Result<ShaderHandle, Diagnostics> {
        self.calls.push(BackendCall::CompileShader(stage));
        if self.fail_compile == Some(stage) || source.trim().is_empty() {
            return Err(Diagnostics(format!("{stage:?} shader rejected")));
        }
        Ok(ShaderHandle(self.handle()))
    }

    fn link_program(
        &mut self,
        vertex: ShaderHandle,
        fragment: ShaderHandle,
    ) -> Result<ProgramHandle, Diagnostics> {
        self.calls.push(BackendCall::LinkProgram(vertex, fragment));
        if self.fail_link {
            return Err(Diagnostics("link rejected".into()));
        }
        Ok(ProgramHandle(self.handle()))
    }

    fn use_program(&mut self, program: ProgramHandle) {
        self.calls.push(BackendCall::UseProgram(program));
    }

    fn create_texture(&mut self, image: &RgbaImage) -> Result<TextureHandle, SpriteError> {
        check_texture_size(image.width(), image.height(), self.max_texture_dimension)?;
        self.calls.push(BackendCall::CreateTexture {
            width: image.width(),
            height: image.height(),
        });
        Ok(TextureHandle(self.handle()))
    }

    fn bind_texture(&mut self, texture: TextureHandle) {
        self.calls.push(BackendCall::BindTexture(texture));
    }

    fn set_uniform_matrix4(&mut self, matrix: Mat4) {
        self.calls.push(BackendCall::SetUniformMatrix4(matrix));
    }

    fn clear(&mut self, color: [f32; 4]) {
        self.calls.push(BackendCall::Clear(color));
    }

    fn draw_triangle_strip(&mut self, vertex_offset: u32, vertex_count: u32) {
        self.calls.push(BackendCall::DrawTriangleStrip {
            vertex_offset,
            vertex_count,
        });
    }

    fn submit(&mut self) -> Result<(), SpriteError> {
        self.calls.push(BackendCall::Submit);
        if self.fail_submit {
            return Err(SpriteError::Surface("surface lost".into()));
        }
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.calls.push(BackendCall::Resize(width, height));
    }
}
