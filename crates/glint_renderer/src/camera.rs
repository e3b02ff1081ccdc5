//! Orbiting camera.
//!
//! The [`Trackball`] is the authoritative camera state: a look-at center plus
//! spherical coordinates. The [`Camera`] basis is derived from it and
//! recomputed eagerly on every change, so a read never observes a stale basis.

use glint_math::Vec3;
use std::f32::consts::{PI, TAU};

use crate::config::DEFAULT_POLE_EPSILON;

/// Smallest orbit radius the trackball accepts.
pub const MIN_RADIUS: f32 = 0.05;

/// Right-handed orthonormal camera basis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    origin: Vec3,
    direction: Vec3,
    up: Vec3,
    right: Vec3,
}

impl Camera {
    /// Camera position.
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Unit forward vector.
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            direction: Vec3::NEG_Z,
            up: Vec3::Y,
            right: Vec3::X,
        }
    }
}

/// Discrete camera adjustment delivered by the input layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraCommand {
    /// Change the polar angle (radians).
    Rotate(f32),
    /// Change the elevation angle (radians, measured from the +Y pole).
    Elevate(f32),
    /// Change the orbit radius.
    Zoom(f32),
}

/// Camera orbiting a fixed center.
#[derive(Debug, Clone)]
pub struct Trackball {
    center: Vec3,
    radius: f32,
    /// Polar angle in [0, 2pi)
    polar: f32,
    /// Elevation angle in [pole_epsilon, pi - pole_epsilon]
    elevation: f32,
    pole_epsilon: f32,
    camera: Camera,
}

impl Trackball {
    /// Create a trackball. Out-of-range values are wrapped or clamped.
    pub fn new(center: Vec3, radius: f32, polar: f32, elevation: f32) -> Self {
        let finite_or = |value: f32, fallback: f32| if value.is_finite() { value } else { fallback };
        let mut trackball = Self {
            center: if center.is_finite() { center } else { Vec3::ZERO },
            radius: finite_or(radius, MIN_RADIUS).max(MIN_RADIUS),
            polar: 0.0,
            elevation: finite_or(elevation, PI / 2.0),
            pole_epsilon: DEFAULT_POLE_EPSILON,
            camera: Camera::default(),
        };
        // Both updates wrap/clamp and recompute the basis
        trackball.update_polar_angle(finite_or(polar, 0.0));
        trackball.update_elevation_angle(0.0);
        trackball
    }

    /// Set the margin kept from the poles and re-clamp the elevation.
    pub fn with_pole_epsilon(mut self, pole_epsilon: f32) -> Self {
        let pole_epsilon = if pole_epsilon.is_finite() {
            pole_epsilon
        } else {
            log::warn!(
                "Pole epsilon {} is invalid, using {}",
                pole_epsilon,
                DEFAULT_POLE_EPSILON
            );
            DEFAULT_POLE_EPSILON
        };
        self.pole_epsilon = pole_epsilon.clamp(1e-6, PI / 2.0 - 1e-3);
        self.update_elevation_angle(0.0);
        self
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn set_center(&mut self, center: Vec3) {
        if !center.is_finite() {
            log::warn!("Ignoring non-finite trackball center {:?}", center);
            return;
        }
        self.center = center;
        self.update_camera();
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Set the orbit radius, never below [`MIN_RADIUS`].
    pub fn set_radius(&mut self, radius: f32) {
        if !radius.is_finite() {
            log::warn!("Ignoring non-finite trackball radius {}", radius);
            return;
        }
        self.radius = radius.max(MIN_RADIUS);
        self.update_camera();
    }

    pub fn polar_angle(&self) -> f32 {
        self.polar
    }

    /// Add `change` to the polar angle and wrap it into [0, 2pi).
    pub fn update_polar_angle(&mut self, change: f32) {
        if !change.is_finite() {
            log::warn!("Ignoring non-finite polar angle change {}", change);
            return;
        }
        let mut polar = (self.polar + change).rem_euclid(TAU);
        // rem_euclid can round up to exactly TAU for tiny negative inputs
        if polar >= TAU {
            polar -= TAU;
        }
        self.polar = polar.max(0.0);
        self.update_camera();
    }

    pub fn elevation_angle(&self) -> f32 {
        self.elevation
    }

    /// Add `change` to the elevation angle and keep it away from the poles.
    pub fn update_elevation_angle(&mut self, change: f32) {
        if !change.is_finite() {
            log::warn!("Ignoring non-finite elevation angle change {}", change);
            return;
        }
        self.elevation =
            (self.elevation + change).clamp(self.pole_epsilon, PI - self.pole_epsilon);
        self.update_camera();
    }

    /// Apply an input command.
    pub fn apply(&mut self, command: CameraCommand) {
        match command {
            CameraCommand::Rotate(delta) => self.update_polar_angle(delta),
            CameraCommand::Elevate(delta) => self.update_elevation_angle(delta),
            CameraCommand::Zoom(delta) => self.set_radius(self.radius + delta),
        }
    }

    /// Current camera basis.
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Offset from the center in physics convention (elevation from +Y).
    fn spherical_to_cartesian(&self) -> Vec3 {
        let (sin_el, cos_el) = self.elevation.sin_cos();
        let (sin_pol, cos_pol) = self.polar.sin_cos();
        self.radius * Vec3::new(sin_el * cos_pol, cos_el, sin_el * sin_pol)
    }

    fn update_camera(&mut self) {
        let origin = self.center + self.spherical_to_cartesian();
        let direction = (self.center - origin).normalize();

        // Elevation never reaches the poles, so world up is a valid helper
        let right = direction.cross(Vec3::Y).normalize();
        let up = right.cross(direction);

        self.camera = Camera {
            origin,
            direction,
            up,
            right,
        };
    }
}

impl Default for Trackball {
    fn default() -> Self {
        Self::new(Vec3::ZERO, 2.5, PI / 2.0, PI / 2.5)
    }
}
