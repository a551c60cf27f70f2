//! Per-field configuration.
//!
//! A field's tunables are fixed at construction: element count, shapes for the
//! two arrangements, palette, scale distribution, blend law, orientation, and
//! an optional connecting wire. Configs are built with `with_*` methods or
//! loaded from JSON.
//!
//! ```ignore
//! let config = FieldConfig::new("lights", 75)
//!     .with_structured(StructuredShape::Spiral { .. })
//!     .with_dispersed(DispersedShape::SphericalShell { inner_radius: 8.0, outer_radius: 16.0 })
//!     .with_blend(BlendLaw::FixedFraction { rate: 2.0 });
//! ```

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::curve::MIN_TENSION;
use crate::error::{check_at_least, FieldError};
use crate::interpolator::{BlendLaw, OrientationRule, ScaleRule};
use crate::palette::Palette;

/// Closed-form rule for the assembled arrangement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StructuredShape {
    /// Random points filling a cone that narrows toward the top.
    ConeVolume {
        base_y: f32,
        height: f32,
        base_radius: f32,
        taper_exponent: f32,
    },
    /// Elements placed in order along a tapering spiral.
    ///
    /// Consecutive ids are neighbours on the spiral, which makes the structured
    /// positions usable as wire anchors.
    Spiral {
        bottom_y: f32,
        height: f32,
        base_radius: f32,
        /// Fraction of the radius lost between bottom and top.
        taper: f32,
        turns: f32,
        /// Relative random radius variation, e.g. 0.05 for +-5%.
        radius_jitter: f32,
        /// Start at the top and wind downwards.
        descending: bool,
        /// Progress runs `i / (count - 1)` so the last element lands on the end.
        inclusive_end: bool,
    },
    /// Explicit positions, one per element.
    Points { points: Vec<Vec3> },
}

/// Closed-form rule for the scattered arrangement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DispersedShape {
    /// Uniform directions, radius uniform between the two bounds.
    SphericalShell { inner_radius: f32, outer_radius: f32 },
    /// Explicit positions, one per element.
    Points { points: Vec<Vec3> },
}

/// Bounds for the per-element base scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleRange {
    pub min: f32,
    pub max: f32,
}

impl ScaleRange {
    /// Range `[min, max)`.
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Every element gets exactly `value`.
    pub fn fixed(value: f32) -> Self {
        Self {
            min: value,
            max: value,
        }
    }
}

impl Default for ScaleRange {
    fn default() -> Self {
        Self::fixed(1.0)
    }
}

/// Connecting wire built through the structured positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WireConfig {
    /// Catmull-Rom tension in `[MIN_TENSION, 1]`.
    pub tension: f32,
    /// Segments along the tube.
    pub tubular_segments: u32,
    /// Tube radius.
    pub radius: f32,
    /// Segments around the tube.
    pub radial_segments: u32,
    /// Wire color.
    pub color: Vec3,
    /// Opacity when assembled.
    pub max_opacity: f32,
    /// Fixed-fraction fade rate per second.
    pub fade_rate: f32,
}

impl Default for WireConfig {
    fn default() -> Self {
        Self {
            tension: 0.5,
            tubular_segments: 300,
            radius: 0.02,
            radial_segments: 8,
            color: Vec3::splat(0.066),
            max_opacity: 0.6,
            fade_rate: 2.0,
        }
    }
}

impl WireConfig {
    pub(crate) fn validate(&self) -> Result<(), FieldError> {
        check_at_least("wire.tension", self.tension, MIN_TENSION)?;
        check_at_least("wire.radius", self.radius, 0.0)?;
        check_at_least("wire.max_opacity", self.max_opacity, 0.0)?;
        check_at_least("wire.fade_rate", self.fade_rate, 0.0)?;
        if self.tubular_segments == 0 {
            return Err(FieldError::InvalidParameter {
                name: "wire.tubular_segments",
                value: 0.0,
            });
        }
        if self.radial_segments < 3 {
            return Err(FieldError::InvalidParameter {
                name: "wire.radial_segments",
                value: self.radial_segments as f32,
            });
        }
        Ok(())
    }
}

/// Everything needed to build one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldConfig {
    /// Name used in logs and GPU labels.
    pub name: String,
    /// Number of elements. Must be positive.
    pub count: usize,
    pub structured: StructuredShape,
    pub dispersed: DispersedShape,
    pub palette: Palette,
    #[serde(default)]
    pub scale: ScaleRange,
    #[serde(default = "default_multiplier")]
    pub scale_multiplier: f32,
    #[serde(default)]
    pub scale_rule: ScaleRule,
    pub blend: BlendLaw,
    #[serde(default)]
    pub orientation: OrientationRule,
    #[serde(default)]
    pub wire: Option<WireConfig>,
}

fn default_multiplier() -> f32 {
    1.0
}

impl FieldConfig {
    /// A config with `count` elements, a cone/shell layout and a white palette.
    pub fn new(name: impl Into<String>, count: usize) -> Self {
        Self {
            name: name.into(),
            count,
            structured: StructuredShape::ConeVolume {
                base_y: -2.0,
                height: 6.0,
                base_radius: 3.0,
                taper_exponent: 1.0,
            },
            dispersed: DispersedShape::SphericalShell {
                inner_radius: 8.0,
                outer_radius: 16.0,
            },
            palette: Palette::white(),
            scale: ScaleRange::default(),
            scale_multiplier: 1.0,
            scale_rule: ScaleRule::Constant,
            blend: BlendLaw::Damped { rate: 1.5 },
            orientation: OrientationRule::Static,
            wire: None,
        }
    }

    /// Parse a config from JSON and validate it.
    pub fn from_json(json: &str) -> Result<Self, FieldError> {
        let config: FieldConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_structured(mut self, shape: StructuredShape) -> Self {
        self.structured = shape;
        self
    }

    pub fn with_dispersed(mut self, shape: DispersedShape) -> Self {
        self.dispersed = shape;
        self
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    pub fn with_scale(mut self, range: ScaleRange, multiplier: f32) -> Self {
        self.scale = range;
        self.scale_multiplier = multiplier;
        self
    }

    pub fn with_scale_rule(mut self, rule: ScaleRule) -> Self {
        self.scale_rule = rule;
        self
    }

    pub fn with_blend(mut self, blend: BlendLaw) -> Self {
        self.blend = blend;
        self
    }

    pub fn with_orientation(mut self, orientation: OrientationRule) -> Self {
        self.orientation = orientation;
        self
    }

    /// Build a wire through the structured positions, in id order.
    pub fn with_wire(mut self, wire: WireConfig) -> Self {
        self.wire = Some(wire);
        self
    }

    /// Check every tunable. Called by the generator before any sampling.
    pub fn validate(&self) -> Result<(), FieldError> {
        if self.count == 0 {
            return Err(FieldError::InvalidCount(self.count));
        }
        if self.palette.is_empty() {
            return Err(FieldError::EmptyPalette);
        }

        match &self.structured {
            StructuredShape::ConeVolume {
                base_y,
                height,
                base_radius,
                taper_exponent,
            } => {
                check_finite("structured.base_y", *base_y)?;
                check_finite("structured.height", *height)?;
                check_at_least("structured.base_radius", *base_radius, 0.0)?;
                check_at_least("structured.taper_exponent", *taper_exponent, 0.0)?;
            }
            StructuredShape::Spiral {
                bottom_y,
                height,
                base_radius,
                taper,
                turns,
                radius_jitter,
                ..
            } => {
                check_finite("structured.bottom_y", *bottom_y)?;
                check_at_least("structured.height", *height, f32::MIN_POSITIVE)?;
                check_at_least("structured.base_radius", *base_radius, 0.0)?;
                check_finite("structured.taper", *taper)?;
                check_finite("structured.turns", *turns)?;
                check_at_least("structured.radius_jitter", *radius_jitter, 0.0)?;
            }
            StructuredShape::Points { points } => check_points(points, self.count)?,
        }

        match &self.dispersed {
            DispersedShape::SphericalShell {
                inner_radius,
                outer_radius,
            } => {
                check_at_least("dispersed.inner_radius", *inner_radius, 0.0)?;
                check_at_least("dispersed.outer_radius", *outer_radius, *inner_radius)?;
            }
            DispersedShape::Points { points } => check_points(points, self.count)?,
        }

        check_at_least("scale.min", self.scale.min, 0.0)?;
        check_at_least("scale.max", self.scale.max, self.scale.min)?;
        check_at_least("scale_multiplier", self.scale_multiplier, 0.0)?;
        self.blend.validate()?;

        if let Some(wire) = &self.wire {
            wire.validate()?;
        }
        Ok(())
    }
}

/// Settings for a GPU-blended point field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MorphConfig {
    /// Element generation settings. The blend law must be damped.
    pub field: FieldConfig,
    /// Speed of the positional wave.
    #[serde(default = "default_wave_speed")]
    pub wave_speed: f32,
    /// Amplitude of the positional wave in world units.
    #[serde(default = "default_wave_amplitude")]
    pub wave_amplitude: f32,
    /// Screen-space point size numerator (`size * point_scale / depth`).
    #[serde(default = "default_point_scale")]
    pub point_scale: f32,
}

fn default_wave_speed() -> f32 {
    0.5
}

fn default_wave_amplitude() -> f32 {
    0.1
}

fn default_point_scale() -> f32 {
    150.0
}

impl MorphConfig {
    pub fn new(field: FieldConfig) -> Self {
        Self {
            field,
            wave_speed: default_wave_speed(),
            wave_amplitude: default_wave_amplitude(),
            point_scale: default_point_scale(),
        }
    }

    pub fn with_wave(mut self, speed: f32, amplitude: f32) -> Self {
        self.wave_speed = speed;
        self.wave_amplitude = amplitude;
        self
    }

    pub fn validate(&self) -> Result<(), FieldError> {
        self.field.validate()?;
        if let BlendLaw::FixedFraction { rate } = self.field.blend {
            return Err(FieldError::InvalidParameter {
                name: "morph.blend",
                value: rate,
            });
        }
        check_finite("wave_speed", self.wave_speed)?;
        check_at_least("wave_amplitude", self.wave_amplitude, 0.0)?;
        check_at_least("point_scale", self.point_scale, 0.0)?;
        Ok(())
    }
}

fn check_finite(name: &'static str, value: f32) -> Result<f32, FieldError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(FieldError::InvalidParameter { name, value })
    }
}

fn check_points(points: &[Vec3], count: usize) -> Result<(), FieldError> {
    if points.len() != count {
        return Err(FieldError::PointCountMismatch {
            expected: count,
            actual: points.len(),
        });
    }
    if let Some(bad) = points.iter().find(|p| !p.is_finite()) {
        return Err(FieldError::InvalidParameter {
            name: "points",
            value: bad.x + bad.y + bad.z,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(FieldConfig::new("f", 10).validate().is_ok());
    }

    #[test]
    fn test_zero_count_rejected() {
        assert!(matches!(
            FieldConfig::new("f", 0).validate(),
            Err(FieldError::InvalidCount(0))
        ));
    }

    #[test]
    fn test_inverted_shell_rejected() {
        let config = FieldConfig::new("f", 4).with_dispersed(DispersedShape::SphericalShell {
            inner_radius: 10.0,
            outer_radius: 5.0,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_point_list_length_checked() {
        let config = FieldConfig::new("f", 3)
            .with_structured(StructuredShape::Points {
                points: vec![Vec3::ZERO, Vec3::Y],
            });
        assert!(matches!(
            config.validate(),
            Err(FieldError::PointCountMismatch { expected: 3, actual: 2 })
        ));
    }

    #[test]
    fn test_wire_segments_checked() {
        let wire = WireConfig {
            radial_segments: 2,
            ..WireConfig::default()
        };
        assert!(FieldConfig::new("f", 3).with_wire(wire).validate().is_err());
    }

    #[test]
    fn test_wire_tension_floor() {
        for tension in [0.0, -0.5, f32::NAN] {
            let wire = WireConfig {
                tension,
                ..WireConfig::default()
            };
            assert!(FieldConfig::new("f", 3).with_wire(wire).validate().is_err());
        }
        let wire = WireConfig {
            tension: MIN_TENSION,
            ..WireConfig::default()
        };
        assert!(FieldConfig::new("f", 3).with_wire(wire).validate().is_ok());
    }

    #[test]
    fn test_morph_requires_damped_law() {
        let config = MorphConfig::new(
            FieldConfig::new("f", 3).with_blend(BlendLaw::FixedFraction { rate: 2.0 }),
        );
        assert!(matches!(
            config.validate(),
            Err(FieldError::InvalidParameter { name: "morph.blend", .. })
        ));
        assert!(MorphConfig::new(FieldConfig::new("f", 3)).validate().is_ok());
    }

    #[test]
    fn test_from_json() {
        let json = r##"{
            "name": "bulbs",
            "count": 12,
            "structured": {
                "kind": "spiral",
                "bottom_y": -2.0, "height": 6.0, "base_radius": 2.8, "taper": 0.85,
                "turns": 15.0, "radius_jitter": 0.0, "descending": false, "inclusive_end": false
            },
            "dispersed": { "kind": "spherical_shell", "inner_radius": 6.0, "outer_radius": 14.0 },
            "palette": { "colors": ["#ff0033", "#0088ff"] },
            "blend": { "law": "damped", "rate": 1.5 },
            "orientation": { "kind": "face_axis", "center": [0.0, 0.0, 0.0], "wobble": 1.0, "tumble": [0.5, 0.3, 0.7] }
        }"##;
        let config = FieldConfig::from_json(json).unwrap();
        assert_eq!(config.count, 12);
        assert_eq!(config.blend, BlendLaw::Damped { rate: 1.5 });
        assert_eq!(config.scale_multiplier, 1.0);
        assert!(config.wire.is_none());
    }

    #[test]
    fn test_from_json_negative_count() {
        let json = r##"{
            "name": "bad", "count": -5,
            "structured": { "kind": "cone_volume", "base_y": 0.0, "height": 1.0, "base_radius": 1.0, "taper_exponent": 1.0 },
            "dispersed": { "kind": "spherical_shell", "inner_radius": 1.0, "outer_radius": 2.0 },
            "palette": { "colors": ["#ffffff"] },
            "blend": { "law": "fixed_fraction", "rate": 2.0 }
        }"##;
        assert!(matches!(FieldConfig::from_json(json), Err(FieldError::Config(_))));
    }
}
