//! Surface materials and how they scatter light.
//!
//! The set of materials is closed, so they are modelled as one enum and
//! dispatched with `match`. Materials live in the scene's material arena and
//! surfaces refer to them by [`MaterialId`].

use std::fmt;

use crate::{gen_f32, hittable::HitRecord, Ray};
use glint_math::Vec3;
use rand::RngCore;

/// Color type alias (linear RGB, typically 0-1)
pub type Color = Vec3;

/// Stable index of a material in a [`Scene`](crate::Scene).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub u32);

impl fmt::Display for MaterialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Result of a successful scatter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterResult {
    /// Color filter applied to the light carried back along `scattered`
    pub attenuation: Color,
    pub scattered: Ray,
}

/// How light interacts with a surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Material {
    /// Lambertian-like diffuse reflector.
    Diffuse { albedo: Color },
    /// Mirror reflection perturbed by `fuzz` in [0, 1].
    Metal { albedo: Color, fuzz: f32 },
    /// Clear refractive medium (glass, water).
    Dielectric { ior: f32 },
}

impl Material {
    /// Create a diffuse material with the given albedo color.
    pub fn diffuse(albedo: Color) -> Self {
        Self::Diffuse { albedo }
    }

    /// Create a metal material.
    ///
    /// - `albedo`: The color of the metal
    /// - `fuzz`: Roughness, 0.0 = perfect mirror, 1.0 = very rough. Values
    ///   outside [0, 1] are clamped.
    pub fn metal(albedo: Color, fuzz: f32) -> Self {
        let clamped = if fuzz.is_nan() { 0.0 } else { fuzz.clamp(0.0, 1.0) };
        if clamped != fuzz {
            log::warn!("Metal fuzz {} clamped to {}", fuzz, clamped);
        }
        Self::Metal {
            albedo,
            fuzz: clamped,
        }
    }

    /// Create a dielectric material.
    ///
    /// - `ior`: Index of refraction (1.0 = air, 1.5 = glass, 2.4 = diamond)
    pub fn dielectric(ior: f32) -> Self {
        Self::Dielectric { ior }
    }

    /// Scatter an incoming ray.
    ///
    /// Returns `None` if the ray is absorbed.
    pub fn scatter(
        &self,
        ray_in: &Ray,
        rec: &HitRecord,
        rng: &mut dyn RngCore,
    ) -> Option<ScatterResult> {
        match *self {
            Material::Diffuse { albedo } => Some(scatter_diffuse(albedo, rec, rng)),
            Material::Metal { albedo, fuzz } => scatter_metal(albedo, fuzz, ray_in, rec, rng),
            Material::Dielectric { ior } => Some(scatter_dielectric(ior, ray_in, rec, rng)),
        }
    }
}

fn scatter_diffuse(albedo: Color, rec: &HitRecord, rng: &mut dyn RngCore) -> ScatterResult {
    let target = rec.p + rec.normal + random_in_unit_sphere(rng);
    let mut direction = target - rec.p;

    // Catch degenerate scatter direction
    if direction.length_squared() < 1e-8 {
        direction = rec.normal;
    }

    ScatterResult {
        attenuation: albedo,
        scattered: Ray::new(rec.p, direction.normalize()),
    }
}

fn scatter_metal(
    albedo: Color,
    fuzz: f32,
    ray_in: &Ray,
    rec: &HitRecord,
    rng: &mut dyn RngCore,
) -> Option<ScatterResult> {
    let reflected = reflect(ray_in.direction(), rec.normal);
    let direction = (reflected + fuzz * random_in_unit_sphere(rng)).normalize_or_zero();

    // Fuzz must not push the ray back through the surface
    if direction.dot(rec.normal) > 0.0 {
        Some(ScatterResult {
            attenuation: albedo,
            scattered: Ray::new(rec.p, direction),
        })
    } else {
        None
    }
}

fn scatter_dielectric(ior: f32, ray_in: &Ray, rec: &HitRecord, rng: &mut dyn RngCore) -> ScatterResult {
    let direction = ray_in.direction();
    let reflected = reflect(direction, rec.normal);
    let d_dot_n = direction.dot(rec.normal);
    let length = direction.length();

    let (outward_normal, ni_over_nt, cosine) = if d_dot_n > 0.0 {
        // Leaving the medium
        (-rec.normal, ior, ior * d_dot_n / length)
    } else {
        (rec.normal, 1.0 / ior, -d_dot_n / length)
    };

    let refracted = refract(direction.normalize(), outward_normal.normalize(), ni_over_nt);
    let reflect_prob = match refracted {
        Some(_) => schlick(cosine, ior),
        None => 1.0,
    };

    let scattered_direction = match refracted {
        Some(refracted) if gen_f32(rng) > reflect_prob => refracted,
        _ => reflected,
    };

    ScatterResult {
        attenuation: Color::ONE,
        scattered: Ray::new(rec.p, scattered_direction.normalize()),
    }
}

/// Schlick's approximation for reflectance
#[inline]
pub fn schlick(cosine: f32, ior: f32) -> f32 {
    let r0 = ((1.0 - ior) / (1.0 + ior)).powi(2);
    r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
}

/// Reflect a vector about a normal.
#[inline]
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Refract a unit vector through a surface with unit normal `n`.
///
/// Returns `None` on total internal reflection.
#[inline]
pub fn refract(uv: Vec3, n: Vec3, ni_over_nt: f32) -> Option<Vec3> {
    let cos_i = uv.dot(n);
    let k = 1.0 - ni_over_nt * ni_over_nt * (1.0 - cos_i * cos_i);
    if k < 0.0 {
        return None;
    }
    let refracted = ni_over_nt * uv - (ni_over_nt * cos_i + k.sqrt()) * n;
    if refracted == Vec3::ZERO {
        None
    } else {
        Some(refracted)
    }
}

/// Rejection-sample a point strictly inside the unit sphere.
pub fn random_in_unit_sphere(rng: &mut dyn RngCore) -> Vec3 {
    loop {
        let p = Vec3::new(
            gen_f32(rng) * 2.0 - 1.0,
            gen_f32(rng) * 2.0 - 1.0,
            gen_f32(rng) * 2.0 - 1.0,
        );
        if p.length_squared() < 1.0 {
            return p;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn record(p: Vec3, normal: Vec3) -> HitRecord {
        HitRecord {
            t: 1.0,
            p,
            normal,
            material: MaterialId(0),
        }
    }

    #[test]
    fn test_random_in_unit_sphere() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..1000 {
            assert!(random_in_unit_sphere(&mut rng).length_squared() < 1.0);
        }
    }

    #[test]
    fn test_diffuse_scatters_into_hemisphere() {
        let mut rng = StdRng::seed_from_u64(2);
        let albedo = Color::new(0.5, 0.5, 0.5);
        let material = Material::diffuse(albedo);
        let ray = Ray::new(Vec3::new(0.0, 2.0, 0.0), Vec3::NEG_Y);
        let rec = record(Vec3::ZERO, Vec3::Y);

        for _ in 0..500 {
            let result = material.scatter(&ray, &rec, &mut rng).expect("diffuse never absorbs");
            assert_eq!(result.attenuation, albedo);
            assert_eq!(result.scattered.origin(), rec.p);
            assert!((result.scattered.direction().length() - 1.0).abs() < 1e-4);
            // normal + point in unit sphere never points below the surface
            assert!(result.scattered.direction().dot(rec.normal) >= 0.0);
        }
    }

    #[test]
    fn test_metal_fuzz_is_clamped() {
        assert_eq!(
            Material::metal(Color::ONE, 3.0),
            Material::Metal { albedo: Color::ONE, fuzz: 1.0 }
        );
        assert_eq!(
            Material::metal(Color::ONE, -0.5),
            Material::Metal { albedo: Color::ONE, fuzz: 0.0 }
        );
        assert_eq!(
            Material::metal(Color::ONE, 0.3),
            Material::Metal { albedo: Color::ONE, fuzz: 0.3 }
        );
    }

    #[test]
    fn test_perfect_mirror() {
        let mut rng = StdRng::seed_from_u64(3);
        let material = Material::metal(Color::new(0.8, 0.8, 0.8), 0.0);
        let ray = Ray::new(Vec3::new(-1.0, 1.0, 0.0), Vec3::new(1.0, -1.0, 0.0));
        let rec = record(Vec3::ZERO, Vec3::Y);

        let result = material.scatter(&ray, &rec, &mut rng).expect("mirror reflects");
        let expected = Vec3::new(1.0, 1.0, 0.0).normalize();
        assert!((result.scattered.direction() - expected).length() < 1e-5);
    }

    #[test]
    fn test_metal_absorbs_into_surface() {
        let mut rng = StdRng::seed_from_u64(4);
        let material = Material::metal(Color::ONE, 1.0);
        // Grazing ray: the reflection barely leaves the surface, so full fuzz
        // pushes a large share of scatters below it
        let ray = Ray::new(Vec3::new(-1.0, 0.01, 0.0), Vec3::new(1.0, -0.01, 0.0));
        let rec = record(Vec3::ZERO, Vec3::Y);

        let mut absorbed = 0;
        for _ in 0..1000 {
            match material.scatter(&ray, &rec, &mut rng) {
                Some(result) => assert!(result.scattered.direction().dot(rec.normal) > 0.0),
                None => absorbed += 1,
            }
        }
        assert!(absorbed > 100, "only {absorbed} of 1000 grazing rays absorbed");
    }

    #[test]
    fn test_refract_straight_through() {
        let refracted = refract(Vec3::NEG_Y, Vec3::Y, 1.0 / 1.5).unwrap();
        assert!((refracted - Vec3::NEG_Y).length() < 1e-6);
    }

    #[test]
    fn test_total_internal_reflection() {
        // Inside glass (1.5 -> 1.0) at a grazing angle
        let uv = Vec3::new(1.0, 0.1, 0.0).normalize();
        assert!(refract(uv, Vec3::NEG_Y, 1.5).is_none());
    }

    #[test]
    fn test_schlick() {
        // Head-on reflectance of glass is r0 = 0.04
        assert!((schlick(1.0, 1.5) - 0.04).abs() < 1e-6);
        // Grazing reflectance approaches 1
        assert!((schlick(0.0, 1.5) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_dielectric_always_scatters() {
        let mut rng = StdRng::seed_from_u64(5);
        let material = Material::dielectric(1.5);
        let rec = record(Vec3::ZERO, Vec3::Y);

        let entering = Ray::new(Vec3::new(-1.0, 1.0, 0.0), Vec3::new(1.0, -1.0, 0.0));
        let exiting = Ray::new(Vec3::new(-1.0, -0.1, 0.0), Vec3::new(1.0, 0.1, 0.0));

        for ray in [entering, exiting] {
            for _ in 0..200 {
                let result = material.scatter(&ray, &rec, &mut rng).expect("glass never absorbs");
                assert_eq!(result.attenuation, Color::ONE);
                assert!((result.scattered.direction().length() - 1.0).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn test_dielectric_total_internal_reflection_always_reflects() {
        let mut rng = StdRng::seed_from_u64(6);
        let material = Material::dielectric(1.5);
        let rec = record(Vec3::ZERO, Vec3::Y);
        // Exiting at a grazing angle: refraction is impossible
        let ray = Ray::new(Vec3::new(-1.0, -0.1, 0.0), Vec3::new(1.0, 0.1, 0.0));
        let expected = reflect(ray.direction(), rec.normal).normalize();

        for _ in 0..100 {
            let result = material.scatter(&ray, &rec, &mut rng).unwrap();
            assert!((result.scattered.direction() - expected).length() < 1e-5);
        }
    }

    #[test]
    fn test_dielectric_head_on_mostly_refracts() {
        let mut rng = StdRng::seed_from_u64(8);
        let material = Material::dielectric(1.5);
        let rec = record(Vec3::ZERO, Vec3::Y);
        let ray = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::NEG_Y);

        let transmitted = (0..1000)
            .filter_map(|_| material.scatter(&ray, &rec, &mut rng))
            .filter(|result| result.scattered.direction().y < 0.0)
            .count();

        // Reflectance is 4% at normal incidence
        assert!(transmitted > 900, "only {transmitted} of 1000 rays refracted");
    }
}
