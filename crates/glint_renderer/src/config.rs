//! Render configuration.
//!
//! Every knob has a default so a partial JSON document (or none at all) is a
//! valid configuration. Out-of-range values are clamped by [`RenderConfig::validate`]
//! rather than rejected.

use serde::{Deserialize, Serialize};

/// Default number of scanlines handed to a single render task.
pub const DEFAULT_LINES_PER_TASK: u32 = 12;
/// Default recursion depth cap for the path tracer.
pub const DEFAULT_MAX_DEPTH: u32 = 50;
/// Default number of progressive refinement iterations.
pub const DEFAULT_MAX_ITERATIONS: u32 = 2048;
/// Default samples per pixel (4 selects the rotated-grid pattern).
pub const DEFAULT_SAMPLES_PER_PIXEL: u32 = 4;
/// Default self-intersection bias for bounced rays.
pub const DEFAULT_HIT_EPSILON: f32 = 1e-4;
/// Default distance (radians) the trackball keeps from the poles.
pub const DEFAULT_POLE_EPSILON: f32 = 0.01;

/// Render configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderConfig {
    /// Scanlines per render task; the last task absorbs the remainder
    pub lines_per_task: u32,
    /// Maximum ray bounce depth
    pub max_depth: u32,
    /// Number of refinement iterations after which `render` stops tracing
    pub max_iterations: u32,
    /// Samples per pixel per iteration
    pub samples_per_pixel: u32,
    /// Minimum hit distance along a ray
    pub hit_epsilon: f32,
    /// Elevation clamp margin for the trackball
    pub pole_epsilon: f32,
    /// Worker thread count; `None` uses the available hardware parallelism
    pub threads: Option<usize>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            lines_per_task: DEFAULT_LINES_PER_TASK,
            max_depth: DEFAULT_MAX_DEPTH,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            samples_per_pixel: DEFAULT_SAMPLES_PER_PIXEL,
            hit_epsilon: DEFAULT_HIT_EPSILON,
            pole_epsilon: DEFAULT_POLE_EPSILON,
            threads: None,
        }
    }
}

impl RenderConfig {
    /// Clamp every knob into its usable range.
    pub fn validate(mut self) -> Self {
        if self.lines_per_task == 0 {
            log::warn!("linesPerTask must be at least 1, using 1");
            self.lines_per_task = 1;
        }
        if self.samples_per_pixel == 0 {
            log::warn!("samplesPerPixel must be at least 1, using 1");
            self.samples_per_pixel = 1;
        }
        if !(self.hit_epsilon.is_finite() && self.hit_epsilon >= 0.0) {
            log::warn!(
                "hitEpsilon {} is invalid, using {}",
                self.hit_epsilon,
                DEFAULT_HIT_EPSILON
            );
            self.hit_epsilon = DEFAULT_HIT_EPSILON;
        }
        // Must stay strictly inside (0, pi/2) so the elevation range is non-empty
        let max_pole = std::f32::consts::FRAC_PI_2 - 1e-3;
        if !(self.pole_epsilon.is_finite() && self.pole_epsilon > 0.0 && self.pole_epsilon < max_pole)
        {
            log::warn!(
                "poleEpsilon {} is invalid, using {}",
                self.pole_epsilon,
                DEFAULT_POLE_EPSILON
            );
            self.pole_epsilon = DEFAULT_POLE_EPSILON;
        }
        if self.threads == Some(0) {
            log::warn!("threads must be at least 1, using 1");
            self.threads = Some(1);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RenderConfig::default();

        assert_eq!(config.lines_per_task, 12);
        assert_eq!(config.max_depth, 50);
        assert_eq!(config.max_iterations, 2048);
        assert_eq!(config.samples_per_pixel, 4);
        assert_eq!(config.hit_epsilon, 1e-4);
        assert_eq!(config.pole_epsilon, 0.01);
        assert_eq!(config.threads, None);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: RenderConfig =
            serde_json::from_str(r#"{ "maxIterations": 16, "threads": 3 }"#).unwrap();

        assert_eq!(config.max_iterations, 16);
        assert_eq!(config.threads, Some(3));
        assert_eq!(config.lines_per_task, DEFAULT_LINES_PER_TASK);
        assert_eq!(config.samples_per_pixel, DEFAULT_SAMPLES_PER_PIXEL);
    }

    #[test]
    fn test_validate_clamps() {
        let config = RenderConfig {
            lines_per_task: 0,
            samples_per_pixel: 0,
            hit_epsilon: f32::NAN,
            pole_epsilon: 2.0,
            threads: Some(0),
            ..RenderConfig::default()
        }
        .validate();

        assert_eq!(config.lines_per_task, 1);
        assert_eq!(config.samples_per_pixel, 1);
        assert_eq!(config.hit_epsilon, DEFAULT_HIT_EPSILON);
        assert_eq!(config.pole_epsilon, DEFAULT_POLE_EPSILON);
        assert_eq!(config.threads, Some(1));
    }

    #[test]
    fn test_validate_keeps_valid_values() {
        let config = RenderConfig {
            lines_per_task: 7,
            max_iterations: 0,
            ..RenderConfig::default()
        };

        assert_eq!(config.clone().validate(), config);
    }
}
