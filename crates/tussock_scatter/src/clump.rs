use glam::Vec3;
use rand::seq::index;
use rand::Rng;
use tussock_procgen::symmetric;

use crate::sample::SurfaceSample;
use crate::spatial::KdTree;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClumpRecipe {
    /// 0 disables clumping; higher means fewer, tighter clumps
    pub factor: f32,
    pub random: f32,
    pub length_influence: f32,
}

impl Default for ClumpRecipe {
    fn default() -> Self {
        Self {
            factor: 0.0,
            random: 0.5,
            length_influence: 0.5,
        }
    }
}

impl ClumpRecipe {
    pub fn is_active(&self, sample_count: usize) -> bool {
        self.factor > 0.0 && sample_count > 1
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClumpCenter {
    pub sample_index: usize,
    /// Copy of the chosen sample, taken before any position is pulled
    pub sample: SurfaceSample,
}

impl ClumpCenter {
    pub fn parent_length(&self) -> f32 {
        self.sample.parent_length.unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClumpAssignment {
    pub center: usize,
    pub distance: f32,
}

#[derive(Debug, Clone, Default)]
pub struct ClumpMap {
    pub centers: Vec<ClumpCenter>,
    pub assignments: Vec<ClumpAssignment>,
}

impl ClumpMap {
    pub fn center_of(&self, sample: usize) -> Option<&ClumpCenter> {
        let assignment = self.assignments.get(sample)?;
        self.centers.get(assignment.center)
    }
}

/// `max(1, round(count * (1 - factor)))`, never more than `count`
pub fn center_count(sample_count: usize, factor: f32) -> usize {
    if factor <= 0.0 || sample_count <= 1 {
        return 0;
    }
    let wanted = (sample_count as f32 * (1.0 - factor)).round() as usize;
    wanted.clamp(1, sample_count)
}

/// Picks clump centers and assigns every sample to its nearest one
///
/// Returns `None` when clumping is inactive. Centers are drawn without
/// replacement; each gets a parent length drawn around `base_length`.
pub fn assign_clumps<R: Rng + ?Sized>(
    samples: &[SurfaceSample],
    recipe: &ClumpRecipe,
    base_length: f32,
    length_random: f32,
    rng: &mut R,
) -> Option<ClumpMap> {
    if !recipe.is_active(samples.len()) {
        return None;
    }

    let count = center_count(samples.len(), recipe.factor);
    let centers: Vec<ClumpCenter> = index::sample(rng, samples.len(), count)
        .into_vec()
        .into_iter()
        .map(|sample_index| {
            let parent_length = base_length * (1.0 + symmetric(rng, length_random));
            ClumpCenter {
                sample_index,
                sample: SurfaceSample {
                    parent_length: Some(parent_length),
                    ..samples[sample_index].clone()
                },
            }
        })
        .collect();

    let tree = KdTree::build(centers.iter().map(|c| c.sample.position).collect());
    let assignments = samples
        .iter()
        .map(|sample| {
            let (center, distance) = tree.nearest(sample.position).unwrap_or((0, 0.0));
            ClumpAssignment { center, distance }
        })
        .collect();

    log::debug!("Assigned {} samples to {} clump centers", samples.len(), centers.len());

    Some(ClumpMap { centers, assignments })
}

/// Pulls `position` towards its clump center by a jittered factor
pub fn adjust_position<R: Rng + ?Sized>(
    position: Vec3,
    center: Vec3,
    recipe: &ClumpRecipe,
    rng: &mut R,
) -> Vec3 {
    let strength = (recipe.factor + symmetric(rng, recipe.random)).clamp(0.0, 1.0);
    position.lerp(center, strength)
}

/// Blends a strand length towards its clump's parent length
pub fn blend_length(length: f32, parent_length: f32, influence: f32) -> f32 {
    if influence > 0.0 {
        length * (1.0 - influence) + parent_length * influence
    } else {
        length
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn random_samples(count: usize, seed: u64) -> Vec<SurfaceSample> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..count)
            .map(|_| {
                let p = Vec3::new(rng.gen_range(0.0..10.0), rng.gen_range(0.0..10.0), 0.0);
                SurfaceSample::new(p, Vec3::Z)
            })
            .collect()
    }

    #[test]
    fn test_center_count() {
        assert_eq!(center_count(1000, 0.8), 200);
        assert_eq!(center_count(1000, 0.0), 0);
        assert_eq!(center_count(1, 0.5), 0);
        assert_eq!(center_count(10, 1.0), 1);
        assert_eq!(center_count(3, 0.5), 2);
    }

    #[test]
    fn test_assignments_match_brute_force() {
        let samples = random_samples(1000, 21);
        let recipe = ClumpRecipe {
            factor: 0.8,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(22);
        let map = assign_clumps(&samples, &recipe, 0.15, 0.3, &mut rng).unwrap();

        assert_eq!(map.centers.len(), 200);
        assert_eq!(map.assignments.len(), 1000);

        let mut chosen: Vec<usize> = map.centers.iter().map(|c| c.sample_index).collect();
        chosen.sort_unstable();
        chosen.dedup();
        assert_eq!(chosen.len(), 200);

        for (sample, assignment) in samples.iter().zip(&map.assignments) {
            let mut best = (usize::MAX, f32::INFINITY);
            for (i, center) in map.centers.iter().enumerate() {
                let d = center.sample.position.distance(sample.position);
                if d < best.1 {
                    best = (i, d);
                }
            }
            assert_eq!(assignment.center, best.0);
            assert!((assignment.distance - best.1).abs() < 1e-5);
        }
    }

    #[test]
    fn test_centers_carry_parent_length() {
        let samples = random_samples(50, 1);
        let recipe = ClumpRecipe {
            factor: 0.5,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(2);
        let map = assign_clumps(&samples, &recipe, 0.2, 0.25, &mut rng).unwrap();

        for center in &map.centers {
            let length = center.parent_length();
            assert!((0.15 - 1e-6..=0.25 + 1e-6).contains(&length));
            assert_eq!(center.sample.position, samples[center.sample_index].position);
            // a center is its own nearest center
            assert_eq!(map.assignments[center.sample_index].distance, 0.0);
        }
    }

    #[test]
    fn test_inactive_clumping() {
        let samples = random_samples(10, 3);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(assign_clumps(&samples, &ClumpRecipe::default(), 0.1, 0.0, &mut rng).is_none());
    }

    #[test]
    fn test_adjust_and_blend() {
        let recipe = ClumpRecipe {
            factor: 1.0,
            random: 0.0,
            length_influence: 0.5,
        };
        let mut rng = StdRng::seed_from_u64(0);
        let moved = adjust_position(Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0), &recipe, &mut rng);
        assert_eq!(moved, Vec3::new(2.0, 0.0, 0.0));

        assert_eq!(blend_length(1.0, 3.0, 0.5), 2.0);
        assert_eq!(blend_length(1.0, 3.0, 0.0), 1.0);
    }
}
