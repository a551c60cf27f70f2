//! Random sampling helpers used during field generation.
//!
//! All randomness in a field flows through one [`ShapeSampler`], so a seeded
//! sampler makes the whole field reproducible.

use crate::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;

/// Seeded source of positions, scales and phases.
///
/// ```ignore
/// let mut s = ShapeSampler::new(Some(7));
/// let p = s.random_in_shell(10.0, 15.0);
/// ```
pub struct ShapeSampler {
    rng: SmallRng,
}

impl ShapeSampler {
    /// Create a sampler. `None` draws a fresh seed from the OS.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Self { rng }
    }

    /// Random f32 between 0.0 and 1.0.
    #[inline]
    pub fn random(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Random f32 in `[min, max)`. Returns `min` for an empty range.
    #[inline]
    pub fn random_range(&mut self, min: f32, max: f32) -> f32 {
        if max > min {
            self.rng.gen_range(min..max)
        } else {
            min
        }
    }

    /// Random point inside a cone whose radius shrinks with height.
    ///
    /// Height is uniform in `[base_y, base_y + height)`; the radius at
    /// normalized height `h` is `base_radius * (1 - h^taper_exponent)`, and
    /// points are uniform over each horizontal disk.
    pub fn random_in_cone(
        &mut self,
        base_y: f32,
        height: f32,
        base_radius: f32,
        taper_exponent: f32,
    ) -> Vec3 {
        let h: f32 = self.rng.gen();
        let y = base_y + h * height;
        let radius_at_height = base_radius * (1.0 - h.powf(taper_exponent));
        let theta = self.rng.gen_range(0.0..TAU);
        // sqrt for uniform disk
        let r = radius_at_height * self.rng.gen::<f32>().sqrt();

        Vec3::new(r * theta.cos(), y, r * theta.sin())
    }

    /// Random point in a spherical shell between two radii.
    ///
    /// Directions are uniform on the sphere (`phi = acos(2u - 1)`); the radius
    /// is uniform in `[inner, outer)`.
    pub fn random_in_shell(&mut self, inner: f32, outer: f32) -> Vec3 {
        let r = self.random_range(inner, outer);
        let theta = self.rng.gen_range(0.0..TAU);
        let phi = (2.0 * self.rng.gen::<f32>() - 1.0).clamp(-1.0, 1.0).acos();

        Vec3::new(
            r * phi.sin() * theta.cos(),
            r * phi.sin() * theta.sin(),
            r * phi.cos(),
        )
    }

    /// Symmetric jitter factor `1 + amount * u`, `u` uniform in `[-1, 1)`.
    pub fn jitter(&mut self, amount: f32) -> f32 {
        if amount <= 0.0 {
            return 1.0;
        }
        1.0 + amount * self.rng.gen_range(-1.0..1.0)
    }
}

/// Point on a tapering spiral at progress `t` in `[0, 1]`.
///
/// `hnorm` is the normalized height of the point (0 at the bottom, 1 at the top);
/// the radius loses `taper` of `base_radius` from bottom to top.
pub fn spiral_point(t: f32, y: f32, hnorm: f32, base_radius: f32, taper: f32, turns: f32, jitter: f32) -> Vec3 {
    let angle = t * TAU * turns;
    let radius = base_radius * (1.0 - (taper * hnorm).max(0.0)) * jitter;
    Vec3::new(angle.cos() * radius, y, angle.sin() * radius)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_samplers_agree() {
        let mut a = ShapeSampler::new(Some(42));
        let mut b = ShapeSampler::new(Some(42));
        for _ in 0..10 {
            assert_eq!(a.random_in_shell(8.0, 16.0), b.random_in_shell(8.0, 16.0));
        }
    }

    #[test]
    fn test_shell_radius_bounds() {
        let mut s = ShapeSampler::new(Some(1));
        for _ in 0..500 {
            let r = s.random_in_shell(10.0, 15.0).length();
            assert!(r >= 10.0 - 1e-3 && r <= 15.0 + 1e-3, "radius {}", r);
        }
    }

    #[test]
    fn test_cone_stays_inside() {
        let mut s = ShapeSampler::new(Some(2));
        for _ in 0..500 {
            let p = s.random_in_cone(-2.0, 6.0, 3.0, 0.7);
            assert!(p.y >= -2.0 && p.y <= 4.0);
            let h = (p.y + 2.0) / 6.0;
            let max_r = 3.0 * (1.0 - h.powf(0.7));
            let r = (p.x * p.x + p.z * p.z).sqrt();
            assert!(r <= max_r + 1e-3);
        }
    }

    #[test]
    fn test_empty_range_returns_min() {
        let mut s = ShapeSampler::new(Some(3));
        assert_eq!(s.random_range(1.0, 1.0), 1.0);
        assert_eq!(s.jitter(0.0), 1.0);
    }

    #[test]
    fn test_spiral_point_radius() {
        let p = spiral_point(0.0, 4.0, 1.0, 2.8, 0.9, 12.0, 1.0);
        assert!((p.x - 2.8 * 0.1).abs() < 1e-5);
        assert_eq!(p.y, 4.0);
    }
}
