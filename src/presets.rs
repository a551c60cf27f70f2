//! Ready-made field configurations for a decorated tree scene.
//!
//! Three fields share one mode signal: a dense shadow-foliage point cloud,
//! a strand of micro-lights wound down from the top, and a strand of C9
//! ornament bulbs wound up from the bottom. Both strands carry a wire through
//! their structured positions.
//!
//! ```ignore
//! let mut scene = TreeScene::build(None)?;
//! scene.scheduler_mut().mode_mut().set(false); // scatter
//! scene.scheduler_mut().advance(1.0 / 60.0);
//! ```

use glam::Vec3;

use crate::config::{
    DispersedShape, FieldConfig, MorphConfig, ScaleRange, StructuredShape, WireConfig,
};
use crate::error::FieldError;
use crate::field::InstancedField;
use crate::interpolator::{BlendLaw, OrientationRule};
use crate::morph::ShaderMorphField;
use crate::palette::Palette;
use crate::scheduler::FieldScheduler;

pub const FOLIAGE: &str = "foliage";
pub const LIGHTS: &str = "lights";
pub const ORNAMENTS: &str = "ornaments";

/// 5000 dark points filling a cone, blended on the GPU.
pub fn foliage() -> MorphConfig {
    let palette = Palette::from_static(&["#1a1a2e"]);
    let field = FieldConfig::new(FOLIAGE, 5000)
        .with_structured(StructuredShape::ConeVolume {
            base_y: -2.0,
            height: 6.0,
            base_radius: 3.0,
            taper_exponent: 0.7,
        })
        .with_dispersed(DispersedShape::SphericalShell {
            inner_radius: 10.0,
            outer_radius: 15.0,
        })
        .with_palette(palette)
        .with_scale(ScaleRange::new(0.2, 0.7), 1.0)
        .with_blend(BlendLaw::Damped { rate: 1.5 });
    MorphConfig::new(field).with_wave(0.5, 0.1)
}

/// 75 glowing micro-lights on a descending spiral, joined by a thin black wire.
pub fn lights() -> FieldConfig {
    FieldConfig::new(LIGHTS, 75)
        .with_structured(StructuredShape::Spiral {
            bottom_y: -2.0,
            height: 6.0,
            base_radius: 2.8,
            taper: 0.9,
            turns: 12.0,
            radius_jitter: 0.05,
            descending: true,
            inclusive_end: true,
        })
        .with_dispersed(DispersedShape::SphericalShell {
            inner_radius: 8.0,
            outer_radius: 16.0,
        })
        .with_palette(Palette::rainbow_bulbs().with_intensity(3.0))
        .with_scale(ScaleRange::new(0.5, 1.0), 0.03)
        .with_blend(BlendLaw::FixedFraction { rate: 2.0 })
        .with_wire(WireConfig {
            tension: 0.1,
            tubular_segments: 300,
            radius: 0.008,
            radial_segments: 5,
            color: Vec3::ZERO,
            max_opacity: 0.4,
            fade_rate: 3.0,
        })
}

/// 150 C9 bulbs on an ascending spiral that face the trunk and tumble when scattered.
pub fn ornaments() -> FieldConfig {
    FieldConfig::new(ORNAMENTS, 150)
        .with_structured(StructuredShape::Spiral {
            bottom_y: -2.0,
            height: 6.0,
            base_radius: 2.8,
            taper: 0.85,
            turns: 15.0,
            radius_jitter: 0.0,
            descending: false,
            inclusive_end: false,
        })
        .with_dispersed(DispersedShape::SphericalShell {
            inner_radius: 6.0,
            outer_radius: 14.0,
        })
        .with_palette(Palette::c9_bulbs())
        .with_scale(ScaleRange::fixed(1.0), 0.3)
        .with_blend(BlendLaw::Damped { rate: 1.5 })
        .with_orientation(OrientationRule::FaceAxis {
            center: Vec3::ZERO,
            wobble: 1.0,
            tumble: Vec3::new(0.5, 0.3, 0.7),
        })
        .with_wire(WireConfig {
            tension: 0.2,
            tubular_segments: 300,
            radius: 0.03,
            radial_segments: 8,
            color: Vec3::splat(0x11 as f32 / 255.0),
            max_opacity: 0.6,
            fade_rate: 2.0,
        })
}

/// The full scene: foliage, then lights, then ornaments.
#[derive(Debug)]
pub struct TreeScene {
    scheduler: FieldScheduler,
}

impl TreeScene {
    /// Generate every field. A seed makes the layout reproducible; each field
    /// derives its own seed from it.
    pub fn build(seed: Option<u64>) -> Result<Self, FieldError> {
        let derive = |offset: u64| seed.map(|s| s.wrapping_add(offset));

        let scheduler = FieldScheduler::new();
        let signal = scheduler.signal();

        let foliage = ShaderMorphField::new(&foliage(), derive(0), signal.clone())?;
        let lights = InstancedField::new(&lights(), derive(1), signal.clone())?;
        let ornaments = InstancedField::new(&ornaments(), derive(2), signal)?;

        Ok(Self {
            scheduler: scheduler
                .with_field(foliage)
                .with_field(lights)
                .with_field(ornaments),
        })
    }

    pub fn scheduler(&self) -> &FieldScheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut FieldScheduler {
        &mut self.scheduler
    }

    pub fn foliage(&self) -> Option<&ShaderMorphField> {
        self.scheduler.field(FOLIAGE)?.as_morph()
    }

    pub fn lights(&self) -> Option<&InstancedField> {
        self.scheduler.field(LIGHTS)?.as_instanced()
    }

    pub fn ornaments(&self) -> Option<&InstancedField> {
        self.scheduler.field(ORNAMENTS)?.as_instanced()
    }
}
