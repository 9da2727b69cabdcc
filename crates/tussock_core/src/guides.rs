//! Guide curves that bend strand growth towards a drawn direction.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Distance at which a guide stops having any pull
pub const GUIDE_FALLOFF: f32 = 1.0;

/// Anything that can steer a strand's growth direction
pub trait DirectionField {
    fn direction_at(&self, position: Vec3, fallback: Vec3) -> Vec3;
}

/// World-space polyline with a pull strength in [0, 1]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuideCurve {
    pub points: Vec<Vec3>,
    #[serde(default = "default_influence")]
    pub influence: f32,
}

fn default_influence() -> f32 {
    1.0
}

impl GuideCurve {
    pub fn new(points: Vec<Vec3>, influence: f32) -> Self {
        Self { points, influence }
    }

    pub fn length(&self) -> f32 {
        self.points.windows(2).map(|w| w[0].distance(w[1])).sum()
    }

    /// Closest segment index and the distance to it
    fn closest_segment(&self, point: Vec3) -> Option<(usize, f32)> {
        self.points
            .windows(2)
            .enumerate()
            .map(|(i, w)| (i, distance_to_segment(point, w[0], w[1])))
            .fold(None, |best, (i, d)| match best {
                Some((_, best_d)) if best_d <= d => best,
                _ => Some((i, d)),
            })
    }
}

pub fn distance_to_segment(point: Vec3, start: Vec3, end: Vec3) -> f32 {
    let segment = end - start;
    let length_sq = segment.length_squared();
    if length_sq == 0.0 {
        return point.distance(start);
    }
    let t = ((point - start).dot(segment) / length_sq).clamp(0.0, 1.0);
    point.distance(start + segment * t)
}

/// The usable guide curves of a run
#[derive(Debug, Clone, Default)]
pub struct GuideSet {
    curves: Vec<GuideCurve>,
}

impl GuideSet {
    /// Keeps only curves with at least two points
    pub fn new(curves: impl IntoIterator<Item = GuideCurve>) -> Self {
        Self {
            curves: curves.into_iter().filter(|c| c.points.len() >= 2).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }
}

impl DirectionField for GuideSet {
    fn direction_at(&self, position: Vec3, fallback: Vec3) -> Vec3 {
        let closest = self
            .curves
            .iter()
            .filter_map(|curve| curve.closest_segment(position).map(|(i, d)| (curve, i, d)))
            .fold(None, |best: Option<(&GuideCurve, usize, f32)>, candidate| match best {
                Some(b) if b.2 <= candidate.2 => Some(b),
                _ => Some(candidate),
            });

        let Some((curve, segment, distance)) = closest else {
            return fallback;
        };

        let direction = (curve.points[segment + 1] - curve.points[segment]).normalize_or_zero();
        let falloff = (distance / GUIDE_FALLOFF).min(1.0);
        let influence = curve.influence * (1.0 - falloff);

        fallback.lerp(direction, influence).normalize_or_zero()
    }
}
