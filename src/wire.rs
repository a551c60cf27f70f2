//! Connecting wire that fades with the mode signal.
//!
//! The wire is built once from a frozen copy of a field's structured positions.
//! It never follows the elements while they move; instead it fades out when the
//! field disperses and back in when it reassembles.

use glam::Vec3;

use crate::config::WireConfig;
use crate::curve::{CatmullRomCurve, TubeMesh};
use crate::error::FieldError;
use crate::interpolator::BlendLaw;

/// Opacity below which the wire is not drawn at all.
pub const VISIBILITY_THRESHOLD: f32 = 0.01;

/// Static tube geometry plus an animated opacity.
#[derive(Debug, Clone)]
pub struct WirePath {
    curve: CatmullRomCurve,
    mesh: TubeMesh,
    color: Vec3,
    max_opacity: f32,
    fade: BlendLaw,
    opacity: f32,
}

impl WirePath {
    /// Build an open wire through `anchors`, in order.
    pub fn new(anchors: &[Vec3], config: &WireConfig) -> Result<Self, FieldError> {
        config.validate()?;
        let curve = CatmullRomCurve::new(anchors, config.tension, false)?;
        let mesh = TubeMesh::build(
            &curve,
            config.tubular_segments,
            config.radius,
            config.radial_segments,
        );

        log::debug!(
            "Built wire through {} anchors ({} vertices, length {:.2})",
            curve.anchors().len(),
            mesh.vertex_count(),
            curve.length()
        );

        Ok(Self {
            curve,
            mesh,
            color: config.color,
            max_opacity: config.max_opacity,
            fade: BlendLaw::FixedFraction {
                rate: config.fade_rate,
            },
            opacity: config.max_opacity,
        })
    }

    /// Fade toward full opacity when assembled, toward zero otherwise.
    pub fn update(&mut self, assembled: bool, dt: f32) {
        let target = if assembled { self.max_opacity } else { 0.0 };
        self.opacity = self.fade.step_scalar(self.opacity, target, dt);
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Whether the renderer should draw the wire this frame.
    pub fn is_visible(&self) -> bool {
        self.opacity > VISIBILITY_THRESHOLD
    }

    pub fn color(&self) -> Vec3 {
        self.color
    }

    pub fn curve(&self) -> &CatmullRomCurve {
        &self.curve
    }

    pub fn mesh(&self) -> &TubeMesh {
        &self.mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire() -> WirePath {
        let anchors = [Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0), Vec3::new(0.0, 2.0, 1.0)];
        let config = WireConfig {
            tension: 0.2,
            tubular_segments: 32,
            radius: 0.03,
            radial_segments: 8,
            color: Vec3::splat(0.07),
            max_opacity: 0.6,
            fade_rate: 2.0,
        };
        WirePath::new(&anchors, &config).unwrap()
    }

    #[test]
    fn test_starts_fully_visible() {
        let w = wire();
        assert!((w.opacity() - 0.6).abs() < 1e-6);
        assert!(w.is_visible());
    }

    #[test]
    fn test_fades_out_and_back() {
        let mut w = wire();
        for _ in 0..300 {
            w.update(false, 1.0 / 60.0);
        }
        assert!(!w.is_visible());

        for _ in 0..300 {
            w.update(true, 1.0 / 60.0);
        }
        assert!(w.is_visible());
        assert!((w.opacity() - 0.6).abs() < 1e-3);
    }

    #[test]
    fn test_first_fade_step() {
        let mut w = wire();
        w.update(false, 0.1);
        // 0.6 * (1 - 2.0 * 0.1)
        assert!((w.opacity() - 0.48).abs() < 1e-5);
    }

    #[test]
    fn test_degenerate_anchors_rejected() {
        let config = WireConfig::default();
        assert!(WirePath::new(&[Vec3::ONE, Vec3::ONE], &config).is_err());
    }
}
