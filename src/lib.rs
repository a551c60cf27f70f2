//! # Morphfield - dual-state particle fields
//!
//! Large populations of instanced elements that morph between a dispersed
//! cloud and a structured formation under a single mode signal.
//!
//! Morphfield generates every element's data once, blends positions smoothly
//! each frame, and hands the renderer GPU-ready buffers. It never opens a
//! window; a host render loop owns the surface and pipelines.
//!
//! ## Quick Start
//!
//! ```ignore
//! use morphfield::prelude::*;
//!
//! let mut scene = FieldScheduler::new();
//! let config = FieldConfig::new("bulbs", 150)
//!     .with_structured(StructuredShape::Spiral {
//!         bottom_y: -2.0,
//!         height: 6.0,
//!         base_radius: 2.8,
//!         taper: 0.85,
//!         turns: 15.0,
//!         radius_jitter: 0.0,
//!         descending: false,
//!         inclusive_end: false,
//!     })
//!     .with_palette(Palette::c9_bulbs())
//!     .with_blend(BlendLaw::Damped { rate: 1.5 })
//!     .with_wire(WireConfig::default());
//!
//! let bulbs = InstancedField::new(&config, None, scene.signal())?;
//! scene.push(bulbs);
//!
//! // every frame
//! scene.advance(frame_delta);
//!
//! // on click
//! scene.mode_mut().toggle();
//! ```
//!
//! ## Core Concepts
//!
//! ### Fields
//!
//! A [`Field`] holds two target positions per element, plus color, scale and
//! phase. Targets never change after generation, so toggling the mode back
//! and forth always converges on the same two shapes.
//!
//! ### The mode signal
//!
//! One [`ModeController`] per scene. Fields get a read-only [`ModeSignal`] and
//! read it once at the start of each update.
//!
//! ### Two rendering strategies
//!
//! | Strategy | Type | Blend runs on | Orientation |
//! |----------|------|---------------|-------------|
//! | Instanced meshes | [`InstancedField`] | CPU, per element | yes |
//! | Point sprites | [`ShaderMorphField`] | GPU, one scalar uniform | no |
//!
//! ### Blend laws
//!
//! [`BlendLaw::Damped`] is exponential and frame-rate independent.
//! [`BlendLaw::FixedFraction`] is frame-rate dependent.

pub mod config;
pub mod curve;
pub mod error;
pub mod field;
pub mod generator;
pub mod gpu;
pub mod instance;
pub mod interpolator;
pub mod mode;
pub mod morph;
pub mod palette;
pub mod presets;
pub mod scheduler;
pub mod shaders;
mod spawn;
pub mod time;
pub mod wire;

pub use bytemuck;
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

pub use config::{
    DispersedShape, FieldConfig, MorphConfig, ScaleRange, StructuredShape, WireConfig,
};
pub use curve::{CatmullRomCurve, TubeMesh};
pub use error::FieldError;
pub use field::{FieldUpdate, InstancedField};
pub use generator::{Element, Field, FieldGenerator};
pub use instance::{InstanceBufferWriter, InstanceColor, InstanceTransform};
pub use interpolator::{BlendLaw, OrientationRule, ScaleRule, TransformInterpolator};
pub use mode::{FrameContext, ModeController, ModeSignal};
pub use morph::{MorphUniforms, MorphVertex, ShaderMorphField};
pub use palette::Palette;
pub use scheduler::{FieldScheduler, SceneField};
pub use time::Time;
pub use wire::WirePath;

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use morphfield::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{
        DispersedShape, FieldConfig, MorphConfig, ScaleRange, StructuredShape, WireConfig,
    };
    pub use crate::error::FieldError;
    pub use crate::field::{FieldUpdate, InstancedField};
    pub use crate::interpolator::{BlendLaw, OrientationRule, ScaleRule};
    pub use crate::mode::{FrameContext, ModeController, ModeSignal};
    pub use crate::morph::ShaderMorphField;
    pub use crate::palette::Palette;
    pub use crate::presets::TreeScene;
    pub use crate::scheduler::{FieldScheduler, SceneField};
    pub use crate::time::Time;
    pub use crate::wire::WirePath;
    pub use crate::{Vec2, Vec3, Vec4};
}
