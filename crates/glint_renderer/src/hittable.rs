//! Hittable trait and HitRecord for ray-object intersection.

use crate::{MaterialId, Ray};
use glint_math::{Interval, Vec3};

/// Record of a ray-object intersection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitRecord {
    /// Parameter t where the intersection occurs
    pub t: f32,
    /// Point of intersection
    pub p: Vec3,
    /// Unit surface normal, oriented away from the surface's geometric
    /// center scaled by the sign of its radius (inward for hollow shells)
    pub normal: Vec3,
    /// Material at the intersection point
    pub material: MaterialId,
}

/// Trait for objects that can be hit by rays.
pub trait Hittable: Send + Sync {
    /// Test if a ray hits this object strictly inside `ray_t`.
    ///
    /// Returns the record of the nearest accepted intersection.
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord>;
}
