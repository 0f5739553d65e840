use glam::{Mat4, Vec2, Vec3};
use serde::Deserialize;

use crate::error::SpriteError;

/// Orthographic view volume in world units.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct OrthoBounds {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for OrthoBounds {
    fn default() -> Self {
        Self {
            left: 0.0,
            right: 100.0,
            bottom: 0.0,
            top: 100.0,
            near: 100.0,
            far: -100.0,
        }
    }
}

/// Fixed orthographic camera.
///
/// The projection and view are computed once in [`Camera::new`]; the
/// product handed to the shader is cached and never recomputed:
/// final = projection * view * model
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    projection: Mat4,
    view: Mat4,
    combined: Mat4,
}

impl Camera {
    pub fn new(
        bounds: OrthoBounds,
        eye: Vec3,
        target: Vec3,
        up: Vec3,
    ) -> Result<Self, SpriteError> {
        validate_bounds(&bounds)?;

        if !(eye.is_finite() && target.is_finite() && up.is_finite()) {
            return Err(SpriteError::InvalidCameraConfig(
                "eye, target and up must be finite".into(),
            ));
        }
        let forward = target - eye;
        if forward.length_squared() <= f32::EPSILON {
            return Err(SpriteError::InvalidCameraConfig("eye and target coincide".into()));
        }
        if up.length_squared() <= f32::EPSILON {
            return Err(SpriteError::InvalidCameraConfig("up vector is zero".into()));
        }
        if forward.normalize().cross(up.normalize()).length_squared() <= 1e-10 {
            return Err(SpriteError::InvalidCameraConfig(
                "up vector is parallel to the view direction".into(),
            ));
        }

        // wgpu clip space: depth in [0, 1]
        let projection = Mat4::orthographic_rh(
            bounds.left,
            bounds.right,
            bounds.bottom,
            bounds.top,
            bounds.near,
            bounds.far,
        );
        let view = Mat4::look_at_rh(eye, target, up);

        Ok(Self {
            projection,
            view,
            combined: projection * view,
        })
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn combined(&self) -> Mat4 {
        self.combined
    }
}

fn validate_bounds(b: &OrthoBounds) -> Result<(), SpriteError> {
    let values = [b.left, b.right, b.bottom, b.top, b.near, b.far];
    if values.iter().any(|v| !v.is_finite()) {
        return Err(SpriteError::InvalidCameraConfig("ortho bounds must be finite".into()));
    }
    if b.left == b.right || b.bottom == b.top || b.near == b.far {
        return Err(SpriteError::InvalidCameraConfig(format!("degenerate ortho bounds {b:?}")));
    }
    Ok(())
}

/// Sprite placement in world space: translate, then scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModelTransform {
    pub translation: Vec2,
    pub scale: Vec2,
}

impl ModelTransform {
    pub fn new(translation: Vec2, scale: Vec2) -> Self {
        Self { translation, scale }
    }

    pub fn matrix(&self) -> Mat4 {
        let t = Mat4::from_translation(self.translation.extend(0.0));
        let s = Mat4::from_scale(self.scale.extend(1.0));
        t * s
    }
}
