//! Per-frame blending of element transforms.
//!
//! Every frame, each element's current position moves toward the target
//! selected by the mode signal:
//!
//! ```text
//! target = assembled ? structured_position : dispersed_position
//! ```
//!
//! Two blend laws are available. [`BlendLaw::Damped`] is exponential decay and
//! gives the same motion at any frame rate. [`BlendLaw::FixedFraction`] moves a
//! constant fraction per second of the remaining distance; it is cheaper and
//! frame-rate dependent, so its rates are tuned for a steady update cadence.
//!
//! Orientation and scale are recomputed from the *current* position and the
//! elapsed time, so they animate along with the transition.

use std::f32::consts::TAU;

use glam::{EulerRot, Mat3, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{check_at_least, FieldError};
use crate::generator::Field;
use crate::mode::FrameContext;
use crate::time::sanitize_delta;

/// How an element's current position approaches its target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "law", rename_all = "snake_case")]
pub enum BlendLaw {
    /// `current += (target - current) * (1 - e^(-rate * dt))`.
    ///
    /// Frame-rate independent and never overshoots.
    Damped { rate: f32 },
    /// `current += (target - current) * clamp(rate * dt, 0, 1)`.
    ///
    /// Frame-rate dependent.
    FixedFraction { rate: f32 },
}

impl BlendLaw {
    /// The law's rate constant (per second).
    pub fn rate(&self) -> f32 {
        match *self {
            BlendLaw::Damped { rate } | BlendLaw::FixedFraction { rate } => rate,
        }
    }

    /// Rates must be finite and non-negative.
    pub fn validate(&self) -> Result<(), FieldError> {
        check_at_least("blend.rate", self.rate(), 0.0).map(|_| ())
    }

    /// Fraction of the remaining distance covered in a frame of length `dt`.
    ///
    /// Always in `[0, 1]`. Exactly `1.0` means the step lands on the target.
    pub fn factor(&self, dt: f32) -> f32 {
        let dt = sanitize_delta(dt);
        match *self {
            BlendLaw::Damped { rate } => {
                let decay = (-rate * dt).exp();
                // Underflow after a long pause: treat as converged.
                if !decay.is_finite() || decay <= 0.0 {
                    1.0
                } else {
                    (1.0 - decay).clamp(0.0, 1.0)
                }
            }
            BlendLaw::FixedFraction { rate } => {
                let k = rate * dt;
                if k.is_nan() {
                    0.0
                } else {
                    k.clamp(0.0, 1.0)
                }
            }
        }
    }

    /// Step a scalar toward `target`.
    #[inline]
    pub fn step_scalar(&self, current: f32, target: f32, dt: f32) -> f32 {
        let k = self.factor(dt);
        if k >= 1.0 {
            target
        } else {
            current + (target - current) * k
        }
    }

    /// Step a point toward `target`, independently per axis.
    #[inline]
    pub fn step(&self, current: Vec3, target: Vec3, dt: f32) -> Vec3 {
        let k = self.factor(dt);
        if k >= 1.0 {
            target
        } else {
            current + (target - current) * k
        }
    }
}

/// How elements are rotated each frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OrientationRule {
    /// No rotation (spherical bulbs, points).
    #[default]
    Static,
    /// Face the formation's vertical axis when assembled; tumble when dispersed.
    FaceAxis {
        /// A point on the vertical axis elements face.
        center: Vec3,
        /// Per-element Euler offset amplitude in radians, derived from phase.
        wobble: f32,
        /// Tumble angular speeds around X, Y and Z (radians per second).
        tumble: Vec3,
    },
}

/// Time-varying scale applied on top of each element's base scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScaleRule {
    /// `scale * multiplier`.
    #[default]
    Constant,
    /// `scale * multiplier * (1 + amplitude * sin(t * frequency + 2*pi*phase))`.
    Pulse { amplitude: f32, frequency: f32 },
}

impl ScaleRule {
    /// Scale for one element at `elapsed` seconds.
    pub fn evaluate(&self, base: f32, multiplier: f32, phase: f32, elapsed: f32) -> f32 {
        match *self {
            ScaleRule::Constant => base * multiplier,
            ScaleRule::Pulse {
                amplitude,
                frequency,
            } => {
                let wave = (elapsed * frequency + TAU * phase).sin();
                (base * multiplier * (1.0 + amplitude * wave)).max(0.0)
            }
        }
    }
}

/// Rotation facing the vertical axis through `center`, plus a phase-derived offset.
///
/// The element's +Z axis points at `(center.x, position.y, center.z)`, then a
/// local X/Z tilt of up to `wobble` radians is applied. Elements sitting on the
/// axis keep the unrotated facing.
pub fn face_axis(position: Vec3, center: Vec3, wobble: f32, phase: f32) -> Quat {
    let look_target = Vec3::new(center.x, position.y, center.z);
    let to_axis = look_target - position;

    let base = if to_axis.length_squared() < 1e-12 {
        Quat::IDENTITY
    } else {
        // to_axis is horizontal, so Y x z never degenerates.
        let z = to_axis.normalize();
        let x = Vec3::Y.cross(z).normalize();
        let y = z.cross(x);
        Quat::from_mat3(&Mat3::from_cols(x, y, z))
    };

    let angle = TAU * phase;
    let offset = Quat::from_euler(
        EulerRot::XYZ,
        wobble * angle.sin(),
        0.0,
        wobble * angle.cos(),
    );
    base * offset
}

/// Free tumble: a pure function of elapsed time and phase.
pub fn tumble(elapsed: f32, phase: f32, rates: Vec3) -> Quat {
    let offset = TAU * phase;
    Quat::from_euler(
        EulerRot::XYZ,
        elapsed * rates.x + offset,
        elapsed * rates.y + offset,
        elapsed * rates.z,
    )
}

/// Owns the mutable per-element transform state of one field.
///
/// Positions start at each element's dispersed position so the first frame
/// after creation does not snap.
#[derive(Debug, Clone)]
pub struct TransformInterpolator {
    law: BlendLaw,
    orientation: OrientationRule,
    scale_rule: ScaleRule,
    scale_multiplier: f32,
    current: Vec<Vec3>,
    rotations: Vec<Quat>,
    scales: Vec<f32>,
}

impl TransformInterpolator {
    /// Create interpolator state for `field`.
    pub fn new(field: &Field, law: BlendLaw) -> Self {
        Self {
            law,
            orientation: OrientationRule::Static,
            scale_rule: ScaleRule::Constant,
            scale_multiplier: 1.0,
            current: field.dispersed_positions().to_vec(),
            rotations: vec![Quat::IDENTITY; field.len()],
            scales: field.scales().to_vec(),
        }
    }

    /// Set the orientation rule.
    pub fn with_orientation(mut self, orientation: OrientationRule) -> Self {
        self.orientation = orientation;
        self
    }

    /// Set the scale rule and multiplier.
    pub fn with_scale(mut self, rule: ScaleRule, multiplier: f32) -> Self {
        self.scale_rule = rule;
        self.scale_multiplier = multiplier;
        self
    }

    /// Advance every element by one frame.
    ///
    /// `assembled` is read by the caller once per frame and applies to every
    /// element of this advance.
    pub fn advance(&mut self, field: &Field, assembled: bool, frame: &FrameContext) {
        let targets = if assembled {
            field.structured_positions()
        } else {
            field.dispersed_positions()
        };
        let k = self.law.factor(frame.delta);
        let elapsed = frame.elapsed;

        let state = self
            .current
            .iter_mut()
            .zip(self.rotations.iter_mut())
            .zip(self.scales.iter_mut());
        let data = targets
            .iter()
            .zip(field.phases())
            .zip(field.scales());

        for (((current, rotation), scale), ((&target, &phase), &base)) in state.zip(data) {
            *current = if k >= 1.0 {
                target
            } else {
                *current + (target - *current) * k
            };

            *rotation = match self.orientation {
                OrientationRule::Static => Quat::IDENTITY,
                OrientationRule::FaceAxis {
                    center,
                    wobble,
                    tumble: rates,
                } => {
                    if assembled {
                        face_axis(*current, center, wobble, phase)
                    } else {
                        tumble(elapsed, phase, rates)
                    }
                }
            };

            *scale = self
                .scale_rule
                .evaluate(base, self.scale_multiplier, phase, elapsed);
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.current.len()
    }

    /// True when the field has no elements.
    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    /// The blend law in use.
    pub fn law(&self) -> BlendLaw {
        self.law
    }

    /// Current positions, indexed by element id.
    pub fn positions(&self) -> &[Vec3] {
        &self.current
    }

    /// Current rotations, indexed by element id.
    pub fn rotations(&self) -> &[Quat] {
        &self.rotations
    }

    /// Current scales, indexed by element id.
    pub fn scales(&self) -> &[f32] {
        &self.scales
    }

    /// Translation * rotation * scale for element `id`.
    pub fn transform(&self, id: usize) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::splat(self.scales[id]),
            self.rotations[id],
            self.current[id],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damped_factor_matches_formula() {
        let law = BlendLaw::Damped { rate: 2.0 };
        let expected = 1.0 - (-2.0f32 / 60.0).exp();
        assert!((law.factor(1.0 / 60.0) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_zero_delta_is_no_change() {
        for law in [BlendLaw::Damped { rate: 3.0 }, BlendLaw::FixedFraction { rate: 3.0 }] {
            let p = Vec3::new(1.0, 2.0, 3.0);
            assert_eq!(law.step(p, Vec3::ZERO, 0.0), p);
            assert_eq!(law.step(p, Vec3::ZERO, -1.0), p);
            assert_eq!(law.step(p, Vec3::ZERO, f32::NAN), p);
        }
    }

    #[test]
    fn test_large_delta_lands_on_target() {
        let target = Vec3::new(5.0, -1.0, 2.0);
        let start = Vec3::new(-10.0, 3.0, 0.5);

        let damped = BlendLaw::Damped { rate: 1.5 };
        assert_eq!(damped.step(start, target, 1.0e6), target);
        assert_eq!(damped.step(start, target, f32::INFINITY), target);

        let fixed = BlendLaw::FixedFraction { rate: 2.0 };
        assert_eq!(fixed.step(start, target, 10.0), target);
    }

    #[test]
    fn test_fixed_fraction_clamps() {
        let law = BlendLaw::FixedFraction { rate: 2.0 };
        assert!((law.factor(0.1) - 0.2).abs() < 1e-6);
        assert_eq!(law.factor(5.0), 1.0);
    }

    #[test]
    fn test_damped_is_frame_rate_independent() {
        let law = BlendLaw::Damped { rate: 1.5 };
        let target = Vec3::new(0.0, 4.0, 0.0);

        let mut at_30 = Vec3::new(12.0, 0.0, -3.0);
        for _ in 0..30 {
            at_30 = law.step(at_30, target, 1.0 / 30.0);
        }
        let mut at_144 = Vec3::new(12.0, 0.0, -3.0);
        for _ in 0..144 {
            at_144 = law.step(at_144, target, 1.0 / 144.0);
        }
        assert!(at_30.distance(at_144) < 1e-3);
    }

    #[test]
    fn test_damped_never_overshoots() {
        let law = BlendLaw::Damped { rate: 50.0 };
        let mut x = 10.0f32;
        for _ in 0..100 {
            x = law.step_scalar(x, 0.0, 0.1);
            assert!(x >= 0.0);
        }
    }

    #[test]
    fn test_negative_rate_rejected() {
        assert!(BlendLaw::Damped { rate: -1.0 }.validate().is_err());
        assert!(BlendLaw::FixedFraction { rate: f32::NAN }.validate().is_err());
        assert!(BlendLaw::FixedFraction { rate: 2.0 }.validate().is_ok());
    }

    #[test]
    fn test_face_axis_points_at_axis() {
        let position = Vec3::new(2.0, 1.0, 0.0);
        let q = face_axis(position, Vec3::ZERO, 0.0, 0.0);
        let forward = q * Vec3::Z;
        assert!(forward.distance(Vec3::new(-1.0, 0.0, 0.0)) < 1e-4);
    }

    #[test]
    fn test_face_axis_on_axis_is_finite() {
        let q = face_axis(Vec3::new(0.0, 3.0, 0.0), Vec3::ZERO, 1.0, 0.3);
        assert!(q.is_finite());
        assert!((q.length() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_wobble_differs_by_phase() {
        let p = Vec3::new(1.0, 0.0, 1.0);
        let a = face_axis(p, Vec3::ZERO, 1.0, 0.1);
        let b = face_axis(p, Vec3::ZERO, 1.0, 0.6);
        assert!(a.angle_between(b) > 0.1);
    }

    #[test]
    fn test_tumble_is_pure() {
        let rates = Vec3::new(0.5, 0.3, 0.7);
        assert_eq!(tumble(2.5, 0.4, rates), tumble(2.5, 0.4, rates));
        assert!(tumble(2.5, 0.4, rates).angle_between(tumble(3.5, 0.4, rates)) > 0.01);
    }

    #[test]
    fn test_pulse_scale() {
        let rule = ScaleRule::Pulse {
            amplitude: 0.5,
            frequency: 1.0,
        };
        let s = rule.evaluate(2.0, 0.5, 0.0, std::f32::consts::FRAC_PI_2);
        assert!((s - 1.5).abs() < 1e-5);
        assert_eq!(ScaleRule::Constant.evaluate(2.0, 0.5, 0.3, 9.0), 1.0);
    }
}
