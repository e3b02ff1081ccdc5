//! Scene container: material and surface arenas plus nearest-hit queries.

use crate::{
    error::SceneError,
    hittable::{HitRecord, Hittable},
    Material, MaterialId, Ray, Sphere,
};
use glint_math::Interval;

/// Stable index of a surface in a [`Scene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u32);

/// A collection of spheres and the materials they reference.
///
/// The scene is built once by its owner and then shared read-only with the
/// render workers; nothing in the renderer mutates it.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    materials: Vec<Material>,
    spheres: Vec<Sphere>,
}

impl Scene {
    /// Create a new empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a material to the arena.
    pub fn add_material(&mut self, material: Material) -> MaterialId {
        let id = MaterialId(self.materials.len() as u32);
        self.materials.push(material);
        id
    }

    /// Add a sphere. Its material must already be in the scene.
    pub fn add_sphere(&mut self, sphere: Sphere) -> Result<SurfaceId, SceneError> {
        if self.material(sphere.material()).is_none() {
            return Err(SceneError::UnknownMaterial(sphere.material()));
        }
        let id = SurfaceId(self.spheres.len() as u32);
        self.spheres.push(sphere);
        Ok(id)
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.0 as usize)
    }

    pub fn sphere(&self, id: SurfaceId) -> Option<&Sphere> {
        self.spheres.get(id.0 as usize)
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn spheres(&self) -> &[Sphere] {
        &self.spheres
    }

    /// Get the number of surfaces.
    pub fn len(&self) -> usize {
        self.spheres.len()
    }

    /// Check if the scene has no surfaces.
    pub fn is_empty(&self) -> bool {
        self.spheres.is_empty()
    }
}

impl Hittable for Scene {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        let mut closest: Option<HitRecord> = None;
        let mut closest_so_far = ray_t.max;

        for sphere in &self.spheres {
            if let Some(rec) = sphere.hit(ray, ray_t.with_max(closest_so_far)) {
                closest_so_far = rec.t;
                closest = Some(rec);
            }
        }

        closest
    }
}
