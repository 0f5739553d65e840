// Geometry generation helpers (CPU-side)
//
// This module is intentionally `wgpu`-free.

use crate::vertex::Vertex;

// helper: centered square of half-size `half` as 4 corners in strip order:
// [bottom-left, bottom-right, top-left, top-right]
pub(crate) fn strip_corners(half: f32) -> [[f32; 2]; 4] {
    [
        [-half, -half], // bl
        [half, -half],  // br
        [-half, half],  // tl
        [half, half],   // tr
    ]
}

// helper: one triangle-strip quad sampling the U-range [u0, u1] of the texture.
// Texture row 0 is the image top, so the bottom corners sample v = 1.
pub(crate) fn strip_quad(half: f32, u0: f32, u1: f32) -> [Vertex; 4] {
    let [bl, br, tl, tr] = strip_corners(half);

    [
        Vertex {
            pos: bl,
            uv: [u0, 1.0],
        },
        Vertex {
            pos: br,
            uv: [u1, 1.0],
        },
        Vertex {
            pos: tl,
            uv: [u0, 0.0],
        },
        Vertex {
            pos: tr,
            uv: [u1, 0.0],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_are_strip_ordered() {
        let c = strip_corners(0.5);
        assert_eq!(c[0], [-0.5, -0.5]);
        assert_eq!(c[1], [0.5, -0.5]);
        assert_eq!(c[2], [-0.5, 0.5]);
        assert_eq!(c[3], [0.5, 0.5]);
    }

    #[test]
    fn bottom_corners_sample_bottom_row() {
        let q = strip_quad(1.0, 0.25, 0.5);

        // bottom-left / bottom-right sit below the origin and use v = 1
        assert!(q[0].pos[1] < 0.0 && q[1].pos[1] < 0.0);
        assert_eq!(q[0].uv, [0.25, 1.0]);
        assert_eq!(q[1].uv, [0.5, 1.0]);

        // top-left / top-right use v = 0
        assert!(q[2].pos[1] > 0.0 && q[3].pos[1] > 0.0);
        assert_eq!(q[2].uv, [0.25, 0.0]);
        assert_eq!(q[3].uv, [0.5, 0.0]);

        // left corners take u0, right corners take u1
        assert!(q[0].pos[0] < q[1].pos[0]);
        assert!(q[2].pos[0] < q[3].pos[0]);
    }
}
