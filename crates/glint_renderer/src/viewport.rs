//! Output resolution and the view plane that maps pixels to world rays.

use crate::{Camera, Ray};
use glint_math::{Vec2, Vec3};

/// Fixed output resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    width: u32,
    height: u32,
    size_rcp: Vec2,
    horizontal_linear_fov: f32,
}

impl Viewport {
    /// Create a viewport. Zero dimensions are clamped to 1.
    pub fn new(width: u32, height: u32) -> Self {
        if width == 0 || height == 0 {
            log::warn!("Viewport {}x{} clamped to at least 1x1", width, height);
        }
        let width = width.max(1);
        let height = height.max(1);

        Self {
            width,
            height,
            size_rcp: Vec2::new(1.0 / width as f32, 1.0 / height as f32),
            horizontal_linear_fov: width as f32 / height as f32,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Total number of pixels.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// (1 / width, 1 / height)
    pub fn size_rcp(&self) -> Vec2 {
        self.size_rcp
    }

    /// Horizontal extent of the view plane relative to its vertical extent.
    pub fn horizontal_linear_fov(&self) -> f32 {
        self.horizontal_linear_fov
    }
}

/// World-space view plane one unit in front of the camera.
///
/// Computed once per frame and shared by every task of that frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewPlane {
    pub origin: Vec3,
    pub lower_left: Vec3,
    pub horizontal: Vec3,
    pub vertical: Vec3,
}

impl ViewPlane {
    /// Derive the plane for `camera` seen through `viewport`.
    pub fn new(camera: &Camera, viewport: &Viewport) -> Self {
        let fov = viewport.horizontal_linear_fov();
        Self {
            origin: camera.origin(),
            lower_left: camera.origin() + camera.direction() - camera.right() * fov - camera.up(),
            horizontal: 2.0 * camera.right() * fov,
            vertical: 2.0 * camera.up(),
        }
    }

    /// Ray through normalized plane coordinates, (0, 0) = lower left.
    pub fn ray(&self, u: f32, v: f32) -> Ray {
        let target = self.lower_left + u * self.horizontal + v * self.vertical;
        Ray::new(self.origin, (target - self.origin).normalize())
    }
}
