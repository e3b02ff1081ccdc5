//! Glint renderer - progressive CPU path tracing.
//!
//! A Monte Carlo path tracer for sphere scenes. Frames are refined
//! progressively: every call to [`Renderer::render`] traces one more sample
//! set per pixel across a fixed pool of worker threads and presents the
//! running average.

mod band;
mod camera;
mod config;
mod error;
mod hittable;
mod material;
mod renderer;
mod scene;
mod sphere;
mod thread_pool;
mod tracer;
mod viewport;

pub use band::{generate_bands, AccumulationBuffer, Band, RenderTask};
pub use camera::{Camera, CameraCommand, Trackball, MIN_RADIUS};
pub use config::{
    RenderConfig, DEFAULT_HIT_EPSILON, DEFAULT_LINES_PER_TASK, DEFAULT_MAX_DEPTH,
    DEFAULT_MAX_ITERATIONS, DEFAULT_POLE_EPSILON, DEFAULT_SAMPLES_PER_PIXEL,
};
pub use error::{PoolError, RenderError, RenderResult, SceneError};
pub use hittable::{HitRecord, Hittable};
pub use material::{
    random_in_unit_sphere, reflect, refract, schlick, Color, Material, MaterialId, ScatterResult,
};
pub use renderer::Renderer;
pub use scene::{Scene, SurfaceId};
pub use sphere::Sphere;
pub use thread_pool::{default_thread_count, ThreadPool};
pub use tracer::{
    color_to_rgba, linear_to_gamma, ray_color, render_pixel, sky_gradient, SampleOffsets,
    TraceSettings, ROTATED_GRID_4X,
};
pub use viewport::{ViewPlane, Viewport};

/// Re-export the math types the public API is written in
pub use glint_math::{Interval, Ray, Vec2, Vec3};

/// Uniform sample in [0, 1).
pub(crate) fn gen_f32(rng: &mut dyn rand::RngCore) -> f32 {
    use rand::Rng;
    rng.gen()
}
