use glam::Vec3;
use rand::Rng;
use std::f32::consts::TAU;

use crate::sample::SurfaceSample;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChildRecipe {
    pub count: u32,
    /// Maximum distance from the parent in its tangent plane
    pub radius: f32,
}

/// Two unit vectors spanning the plane perpendicular to `normal`
pub fn tangent_basis(normal: Vec3) -> (Vec3, Vec3) {
    let reference = if normal.z.abs() < 0.9 { Vec3::Z } else { Vec3::X };
    let tangent1 = normal.cross(reference).normalize_or_zero();
    let tangent2 = normal.cross(tangent1).normalize_or_zero();
    (tangent1, tangent2)
}

/// One child scattered around `parent`
pub fn spawn_child<R: Rng + ?Sized>(parent: &SurfaceSample, radius: f32, rng: &mut R) -> SurfaceSample {
    let angle = rng.gen_range(0.0..TAU);
    let distance = rng.gen_range(0.2..=1.0) * radius;

    let (tangent1, tangent2) = tangent_basis(parent.normal);
    let offset = (tangent1 * angle.cos() + tangent2 * angle.sin()) * distance;
    let lift = parent.normal * rng.gen_range(-radius * 0.1..=radius * 0.2);

    let variation = Vec3::new(
        rng.gen_range(-0.1..=0.1),
        rng.gen_range(-0.1..=0.1),
        rng.gen_range(-0.05..=0.05),
    );

    SurfaceSample {
        position: parent.position + offset + lift,
        normal: (parent.normal + variation).normalize_or_zero(),
        is_child: true,
        parent_length: None,
        ..parent.clone()
    }
}

/// Appends `count` children per parent after all parents
///
/// `rng_for` supplies the random stream for each parent index.
pub fn expand_children<R, F>(samples: &mut Vec<SurfaceSample>, recipe: &ChildRecipe, mut rng_for: F) -> usize
where
    R: Rng,
    F: FnMut(usize) -> R,
{
    if recipe.count == 0 || recipe.radius <= 0.0 {
        return 0;
    }

    let parents = samples.len();
    samples.reserve(parents * recipe.count as usize);
    for index in 0..parents {
        let mut rng = rng_for(index);
        for _ in 0..recipe.count {
            let child = spawn_child(&samples[index], recipe.radius, &mut rng);
            samples.push(child);
        }
    }

    samples.len() - parents
}
