//! Core path tracing.
//!
//! Implements Monte Carlo path tracing with:
//! - Recursive ray tracing with a bounce cap
//! - Sky gradient background
//! - Anti-aliasing via fixed or random sub-pixel offsets
//! - Gamma correction

use std::sync::Arc;

use crate::{
    config::RenderConfig, gen_f32, hittable::Hittable, Color, Ray, Scene, ViewPlane, Viewport,
};
use glint_math::{Interval, Vec2};
use rand::RngCore;

/// Rotated-grid offsets used for 4x anti-aliasing.
pub const ROTATED_GRID_4X: [Vec2; 4] = [
    Vec2::new(1.0 / 8.0, 5.0 / 8.0),
    Vec2::new(3.0 / 8.0, 1.0 / 8.0),
    Vec2::new(5.0 / 8.0, 7.0 / 8.0),
    Vec2::new(7.0 / 8.0, 3.0 / 8.0),
];

/// Per-ray settings, copied into every task.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceSettings {
    /// Bounces beyond this depth contribute black
    pub max_depth: u32,
    /// Minimum hit distance, keeps bounced rays off their own surface
    pub hit_epsilon: f32,
}

impl From<&RenderConfig> for TraceSettings {
    fn from(config: &RenderConfig) -> Self {
        Self {
            max_depth: config.max_depth,
            hit_epsilon: config.hit_epsilon,
        }
    }
}

/// Sub-pixel sample positions, resolved once when the renderer is built.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleOffsets {
    offsets: Arc<[Vec2]>,
    weight: f32,
}

impl SampleOffsets {
    /// Pick the sample pattern for `count` samples.
    ///
    /// 4 uses the rotated grid, 1 the pixel center, anything else `count`
    /// random offsets drawn once from `rng`.
    pub fn for_count(count: u32, rng: &mut dyn RngCore) -> Self {
        let offsets: Vec<Vec2> = match count {
            0 | 1 => vec![Vec2::splat(0.5)],
            4 => ROTATED_GRID_4X.to_vec(),
            n => (0..n).map(|_| Vec2::new(gen_f32(rng), gen_f32(rng))).collect(),
        };
        Self::from_offsets(offsets)
    }

    /// Use an explicit list of offsets in [0, 1)^2.
    pub fn from_offsets(offsets: Vec<Vec2>) -> Self {
        let offsets: Arc<[Vec2]> = if offsets.is_empty() {
            Arc::from(vec![Vec2::splat(0.5)])
        } else {
            Arc::from(offsets)
        };
        let weight = 1.0 / offsets.len() as f32;
        Self { offsets, weight }
    }

    pub fn offsets(&self) -> &[Vec2] {
        &self.offsets
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// 1 / number of samples.
    pub fn weight(&self) -> f32 {
        self.weight
    }
}

/// Compute the color seen by a ray.
///
/// Traces the ray through the scene, bouncing off surfaces and filtering the
/// light that finally arrives from the sky. `depth` counts the bounces so far.
pub fn ray_color(
    ray: &Ray,
    scene: &Scene,
    depth: u32,
    settings: &TraceSettings,
    rng: &mut dyn RngCore,
) -> Color {
    let Some(rec) = scene.hit(ray, Interval::new(settings.hit_epsilon, f32::MAX)) else {
        return sky_gradient(ray);
    };

    if depth >= settings.max_depth {
        return Color::ZERO;
    }

    let scatter = scene
        .material(rec.material)
        .and_then(|material| material.scatter(ray, &rec, rng));

    match scatter {
        Some(result) => {
            result.attenuation * ray_color(&result.scattered, scene, depth + 1, settings, rng)
        }
        // Absorbed
        None => Color::ZERO,
    }
}

/// Compute sky gradient background.
pub fn sky_gradient(ray: &Ray) -> Color {
    let unit_direction = ray.direction().normalize();
    let a = 0.5 * (unit_direction.y + 1.0);
    let white = Color::new(1.0, 1.0, 1.0);
    let blue = Color::new(0.5, 0.7, 1.0);
    white * (1.0 - a) + blue * a
}

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Convert a display color to a packed RGBA pixel.
///
/// R is stored at bit 0, G at bit 8, B at bit 16 and an opaque alpha at bit 24.
pub fn color_to_rgba(color: Color) -> u32 {
    let r = (255.0 * Interval::UNIT.clamp(color.x)) as u32;
    let g = (255.0 * Interval::UNIT.clamp(color.y)) as u32;
    let b = (255.0 * Interval::UNIT.clamp(color.z)) as u32;
    0xFF_u32 << 24 | b << 16 | g << 8 | r
}

/// Render a single pixel with multi-sampling.
///
/// `(i, j)` is measured from the lower-left corner of the image. Returns the
/// averaged, gamma-corrected color of one refinement iteration.
#[allow(clippy::too_many_arguments)]
pub fn render_pixel(
    i: u32,
    j: u32,
    plane: &ViewPlane,
    viewport: &Viewport,
    samples: &SampleOffsets,
    scene: &Scene,
    settings: &TraceSettings,
    rng: &mut dyn RngCore,
) -> Color {
    let pixel = Vec2::new(i as f32, j as f32);
    let mut color = Color::ZERO;

    for offset in samples.offsets() {
        let uv = (pixel + *offset) * viewport.size_rcp();
        let ray = plane.ray(uv.x, uv.y);
        color += ray_color(&ray, scene, 0, settings, rng);
    }

    color *= samples.weight();
    Color::new(
        linear_to_gamma(color.x),
        linear_to_gamma(color.y),
        linear_to_gamma(color.z),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Material, Sphere, Trackball};
    use glint_math::Vec3;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::f32::consts::PI;

    fn settings() -> TraceSettings {
        TraceSettings::from(&RenderConfig::default())
    }

    #[test]
    fn test_sky_gradient() {
        let up = sky_gradient(&Ray::new(Vec3::ZERO, Vec3::new(0.0, 3.0, 0.0)));
        let down = sky_gradient(&Ray::new(Vec3::ZERO, Vec3::NEG_Y));
        let level = sky_gradient(&Ray::new(Vec3::ZERO, Vec3::X));

        assert!((up - Color::new(0.5, 0.7, 1.0)).length() < 1e-6);
        assert!((down - Color::ONE).length() < 1e-6);
        assert!((level - Color::new(0.75, 0.85, 1.0)).length() < 1e-6);
    }

    #[test]
    fn test_linear_to_gamma() {
        assert_eq!(linear_to_gamma(0.0), 0.0);
        assert_eq!(linear_to_gamma(-1.0), 0.0);
        assert!((linear_to_gamma(1.0) - 1.0).abs() < 0.0001);
        assert!((linear_to_gamma(0.25) - 0.5).abs() < 0.0001);
    }

    #[test]
    fn test_color_to_rgba_layout() {
        assert_eq!(color_to_rgba(Color::ZERO), 0xFF00_0000);
        assert_eq!(color_to_rgba(Color::new(1.0, 0.0, 0.0)), 0xFF00_00FF);
        assert_eq!(color_to_rgba(Color::new(0.0, 1.0, 0.0)), 0xFF00_FF00);
        assert_eq!(color_to_rgba(Color::new(0.0, 0.0, 1.0)), 0xFFFF_0000);
        // Out-of-range channels saturate
        assert_eq!(color_to_rgba(Color::new(4.0, -1.0, 0.5)), 0xFF7F_00FF);
    }

    #[test]
    fn test_sample_offsets() {
        let mut rng = StdRng::seed_from_u64(9);

        let grid = SampleOffsets::for_count(4, &mut rng);
        assert_eq!(grid.offsets(), &ROTATED_GRID_4X);
        assert_eq!(grid.weight(), 0.25);

        let single = SampleOffsets::for_count(1, &mut rng);
        assert_eq!(single.offsets(), &[Vec2::splat(0.5)]);

        let random = SampleOffsets::for_count(9, &mut rng);
        assert_eq!(random.len(), 9);
        assert!(random
            .offsets()
            .iter()
            .all(|o| (0.0..1.0).contains(&o.x) && (0.0..1.0).contains(&o.y)));
    }

    #[test]
    fn test_empty_scene_is_sky() {
        let mut rng = StdRng::seed_from_u64(10);
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.3, 0.4, -1.0));

        assert_eq!(ray_color(&ray, &Scene::new(), 0, &settings(), &mut rng), sky_gradient(&ray));
    }

    #[test]
    fn test_depth_cap_returns_black() {
        let mut rng = StdRng::seed_from_u64(12);
        let mut scene = Scene::new();
        let mirror = scene.add_material(Material::metal(Color::ONE, 0.0));
        scene.add_sphere(Sphere::new(Vec3::new(0.0, 0.0, -2.0), 1.0, mirror)).unwrap();
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);

        let capped = TraceSettings {
            max_depth: 0,
            ..settings()
        };
        assert_eq!(ray_color(&ray, &scene, 0, &capped, &mut rng), Color::ZERO);

        // One bounce reflects straight back into the open sky
        let color = ray_color(&ray, &scene, 0, &settings(), &mut rng);
        assert!((color - sky_gradient(&Ray::new(Vec3::ZERO, Vec3::Z))).length() < 1e-4);
    }

    #[test]
    fn test_hollow_mirror_interior_terminates() {
        // A ray trapped inside a perfect mirror bounces until the depth cap
        let mut rng = StdRng::seed_from_u64(13);
        let mut scene = Scene::new();
        let mirror = scene.add_material(Material::metal(Color::ONE, 0.0));
        scene.add_sphere(Sphere::new(Vec3::ZERO, -1.0, mirror)).unwrap();
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.2, 0.3, -1.0));

        assert_eq!(ray_color(&ray, &scene, 0, &settings(), &mut rng), Color::ZERO);
    }

    #[test]
    fn test_render_pixel_hits_diffuse_sphere() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut scene = Scene::new();
        let grey = scene.add_material(Material::diffuse(Color::splat(0.5)));
        scene.add_sphere(Sphere::new(Vec3::ZERO, 1.0, grey)).unwrap();

        let trackball = Trackball::new(Vec3::ZERO, 3.0, PI / 2.0, PI / 2.0);
        let viewport = Viewport::new(10, 10);
        let plane = ViewPlane::new(trackball.camera(), &viewport);
        let samples = SampleOffsets::for_count(4, &mut rng);

        let color = render_pixel(5, 5, &plane, &viewport, &samples, &scene, &settings(), &mut rng);

        // Darker than the sky behind it, but lit
        assert!(color.length() > 0.0);
        assert!(color.x < 1.0);
    }
}
