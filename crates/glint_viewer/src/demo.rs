//! Demo scene: a floor, three large spheres and a scatter of small ones.

use glint_math::Vec3;
use glint_renderer::{Color, Material, Scene, SceneError, Sphere};
use rand::Rng;

/// Spheres 1..4 are the large showcase spheres small spheres must avoid.
const LARGE_SPHERES: std::ops::Range<usize> = 1..4;

fn intersects(center_a: Vec3, radius_a: f32, center_b: Vec3, radius_b: f32) -> bool {
    center_a.distance(center_b) <= radius_a + radius_b
}

/// Build the demo scene, drawing the small-sphere layout from `rng`.
pub fn demo_scene(rng: &mut impl Rng) -> Result<Scene, SceneError> {
    let mut scene = Scene::new();

    let floor = scene.add_material(Material::diffuse(Color::splat(0.5)));
    let mirror = scene.add_material(Material::metal(Color::splat(0.8), 0.01));
    let gold = scene.add_material(Material::metal(Color::new(0.8, 0.6, 0.2), 0.1));
    let glass = scene.add_material(Material::dielectric(1.5));

    scene.add_sphere(Sphere::new(Vec3::new(0.0, -301.0, 0.0), 300.0, floor))?;
    scene.add_sphere(Sphere::new(Vec3::ZERO, 1.0, mirror))?;
    scene.add_sphere(Sphere::new(Vec3::new(2.2, 0.15, 0.0), 1.0, gold))?;
    scene.add_sphere(Sphere::new(Vec3::new(-2.1, 0.1, 0.4), 0.8, glass))?;
    // Negative radius carves a bubble out of the glass sphere
    scene.add_sphere(Sphere::new(Vec3::new(-2.1, 0.1, 0.4), -0.7, glass))?;

    let large: Vec<Sphere> = scene.spheres()[LARGE_SPHERES].to_vec();

    let mut a = -4.5f32;
    while a < 5.0 {
        let mut b = -3.0f32;
        while b < 3.5 {
            let radius = (0.5 * rng.gen::<f32>()).clamp(0.2, 0.3);
            let center = Vec3::new(
                a + 0.9 * rng.gen::<f32>(),
                -1.0 + radius,
                b + 0.9 * rng.gen::<f32>(),
            );
            b += 1.5;

            if large
                .iter()
                .any(|sphere| intersects(center, radius, sphere.center(), sphere.radius()))
            {
                continue;
            }

            let choose: f32 = rng.gen();
            let material = if choose < 0.7 {
                scene.add_material(Material::diffuse(Color::new(
                    rng.gen::<f32>() * rng.gen::<f32>(),
                    rng.gen::<f32>() * rng.gen::<f32>(),
                    rng.gen::<f32>() * rng.gen::<f32>(),
                )))
            } else if choose < 0.95 {
                scene.add_material(Material::metal(
                    Color::new(
                        0.5 * (1.0 + rng.gen::<f32>()),
                        0.5 * (1.0 + rng.gen::<f32>()),
                        0.5 * (1.0 + rng.gen::<f32>()),
                    ),
                    0.4 * rng.gen::<f32>(),
                ))
            } else {
                glass
            };
            scene.add_sphere(Sphere::new(center, radius, material))?;
        }
        a += 1.5;
    }

    log::info!(
        "Demo scene: {} spheres, {} materials",
        scene.len(),
        scene.materials().len()
    );
    Ok(scene)
}
