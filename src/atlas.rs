//! Static geometry for a horizontal sprite sheet.
//!
//! Every frame shares the same on-screen quad; only the U-range of its texture
//! coordinates differs. Frame `i` samples `[i/N, (i+1)/N]` of the sheet.

use crate::error::SpriteError;
use crate::renderer::geometry::strip_quad;
use crate::vertex::Vertex;

/// Vertices making up one frame, in triangle-strip order.
pub const VERTICES_PER_FRAME: usize = 4;

/// Range of the atlas vertex buffer that draws one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameSpan {
    pub vertex_offset: u32,
    pub vertex_count: u32,
}

#[derive(Clone, Debug)]
pub struct FrameAtlas {
    vertices: Vec<Vertex>,
    frame_count: usize,
}

impl FrameAtlas {
    /// Build `frame_count` quads of half-size `quad_half_extent`, 4 vertices each.
    pub fn build(frame_count: usize, quad_half_extent: f32) -> Result<Self, SpriteError> {
        if frame_count == 0 {
            return Err(SpriteError::InvalidInput("atlas needs at least one frame".into()));
        }
        if !quad_half_extent.is_finite() || quad_half_extent <= 0.0 {
            return Err(SpriteError::InvalidInput(format!(
                "quad half extent must be positive, got {quad_half_extent}"
            )));
        }

        let mut vertices = Vec::with_capacity(frame_count * VERTICES_PER_FRAME);
        for i in 0..frame_count {
            let (u0, u1) = strip_edges(i, frame_count);
            vertices.extend_from_slice(&strip_quad(quad_half_extent, u0, u1));
        }

        Ok(Self {
            vertices,
            frame_count,
        })
    }

    pub fn frame(&self, index: usize) -> Result<FrameSpan, SpriteError> {
        self.check_index(index)?;
        Ok(FrameSpan {
            vertex_offset: (index * VERTICES_PER_FRAME) as u32,
            vertex_count: VERTICES_PER_FRAME as u32,
        })
    }

    /// U-range sampled by frame `index`.
    pub fn uv_span(&self, index: usize) -> Result<(f32, f32), SpriteError> {
        self.check_index(index)?;
        Ok(strip_edges(index, self.frame_count))
    }

    pub fn frame_vertices(&self, index: usize) -> Result<&[Vertex], SpriteError> {
        let span = self.frame(index)?;
        let start = span.vertex_offset as usize;
        Ok(&self.vertices[start..start + VERTICES_PER_FRAME])
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    fn check_index(&self, index: usize) -> Result<(), SpriteError> {
        if index >= self.frame_count {
            return Err(SpriteError::OutOfRange {
                index,
                frame_count: self.frame_count,
            });
        }
        Ok(())
    }
}

// Both edges come from the same expression so neighbouring strips share
// bit-identical boundaries, and the last edge is exactly 1.0.
fn strip_edges(index: usize, frame_count: usize) -> (f32, f32) {
    let n = frame_count as f32;
    (index as f32 / n, (index + 1) as f32 / n)
}
