use glam::Vec3;
use noise::{NoiseFn, Perlin};

/// Perlin noise at `point`, roughly in [-1, 1]
pub fn noise_at(perlin: &Perlin, point: Vec3) -> f32 {
    perlin.get([point.x as f64, point.y as f64, point.z as f64]) as f32
}

/// Maps [-1, 1] onto [0, 1], clamping overshoot
pub fn remap01(value: f32) -> f32 {
    ((value + 1.0) * 0.5).clamp(0.0, 1.0)
}

/// Distribution mask value at a world position
pub fn mask_value(perlin: &Perlin, position: Vec3, scale: f32) -> f32 {
    remap01(noise_at(perlin, position * scale))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remap() {
        assert_eq!(remap01(-1.0), 0.0);
        assert_eq!(remap01(1.0), 1.0);
        assert_eq!(remap01(0.0), 0.5);
        assert_eq!(remap01(3.0), 1.0);
    }

    #[test]
    fn test_mask_in_unit_range() {
        let perlin = Perlin::new(42);
        for i in 0..100 {
            let p = Vec3::new(i as f32 * 0.37, i as f32 * 0.11, 0.5);
            let value = mask_value(&perlin, p, 5.0);
            assert!((0.0..=1.0).contains(&value));
        }
    }
}
