//! Frame scheduling for a scene of fields.
//!
//! The scheduler owns the [`ModeController`] and every field. One call to
//! [`FieldScheduler::advance`] advances the clock and updates each field exactly
//! once, in registration order, before returning. Renderers upload afterwards.
//!
//! ```ignore
//! let mut scene = FieldScheduler::new();
//! let signal = scene.mode().signal();
//! scene = scene
//!     .with_field(InstancedField::new(&lights, None, signal.clone())?)
//!     .with_field(ShaderMorphField::new(&foliage, None, signal)?);
//!
//! loop {
//!     scene.tick();
//!     // upload dirty buffers, draw
//! }
//! ```

use crate::field::{FieldUpdate, InstancedField};
use crate::mode::{FrameContext, ModeController, ModeSignal};
use crate::morph::ShaderMorphField;

/// Any field a scene can hold.
#[derive(Debug)]
pub enum SceneField {
    Instanced(InstancedField),
    Morph(ShaderMorphField),
}

impl SceneField {
    pub fn as_instanced(&self) -> Option<&InstancedField> {
        match self {
            SceneField::Instanced(f) => Some(f),
            SceneField::Morph(_) => None,
        }
    }

    pub fn as_morph(&self) -> Option<&ShaderMorphField> {
        match self {
            SceneField::Morph(f) => Some(f),
            SceneField::Instanced(_) => None,
        }
    }
}

impl FieldUpdate for SceneField {
    fn update(&mut self, frame: &FrameContext) {
        match self {
            SceneField::Instanced(f) => f.update(frame),
            SceneField::Morph(f) => f.update(frame),
        }
    }

    fn name(&self) -> &str {
        match self {
            SceneField::Instanced(f) => f.name(),
            SceneField::Morph(f) => f.name(),
        }
    }
}

impl From<InstancedField> for SceneField {
    fn from(field: InstancedField) -> Self {
        SceneField::Instanced(field)
    }
}

impl From<ShaderMorphField> for SceneField {
    fn from(field: ShaderMorphField) -> Self {
        SceneField::Morph(field)
    }
}

/// Owns the mode controller and updates fields in a fixed order.
#[derive(Debug, Default)]
pub struct FieldScheduler {
    mode: ModeController,
    fields: Vec<SceneField>,
}

impl FieldScheduler {
    /// An empty scene in the assembled mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty scene driven by an existing controller.
    pub fn with_mode(mode: ModeController) -> Self {
        Self {
            mode,
            fields: Vec::new(),
        }
    }

    /// Register a field. Fields update in the order they were added.
    pub fn with_field(mut self, field: impl Into<SceneField>) -> Self {
        self.push(field);
        self
    }

    /// Register a field on an existing scheduler.
    pub fn push(&mut self, field: impl Into<SceneField>) {
        let field = field.into();
        log::info!(
            "Registered field '{}' at position {}",
            field.name(),
            self.fields.len()
        );
        self.fields.push(field);
    }

    /// Advance by a host-supplied delta and update every field.
    pub fn advance(&mut self, dt: f32) -> FrameContext {
        let frame = self.mode.advance(dt);
        self.update_fields(&frame);
        frame
    }

    /// Advance from the wall clock and update every field.
    pub fn tick(&mut self) -> FrameContext {
        let frame = self.mode.tick();
        self.update_fields(&frame);
        frame
    }

    fn update_fields(&mut self, frame: &FrameContext) {
        log::trace!(
            "Frame {} (dt {:.4}s) updating {} fields",
            frame.frame,
            frame.delta,
            self.fields.len()
        );
        for field in &mut self.fields {
            field.update(frame);
        }
    }

    pub fn mode(&self) -> &ModeController {
        &self.mode
    }

    /// The only way to change the mode of a scheduled scene.
    pub fn mode_mut(&mut self) -> &mut ModeController {
        &mut self.mode
    }

    /// Shortcut for `mode().signal()`.
    pub fn signal(&self) -> ModeSignal {
        self.mode.signal()
    }

    pub fn fields(&self) -> &[SceneField] {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut [SceneField] {
        &mut self.fields
    }

    /// Look a field up by name.
    pub fn field(&self, name: &str) -> Option<&SceneField> {
        self.fields.iter().find(|f| f.name() == name)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut SceneField> {
        self.fields.iter_mut().find(|f| f.name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FieldConfig, MorphConfig};

    #[test]
    fn test_fields_update_in_order() {
        let mut scene = FieldScheduler::new();
        let signal = scene.signal();
        let a = InstancedField::new(&FieldConfig::new("a", 4), Some(1), signal.clone()).unwrap();
        let b = ShaderMorphField::new(&MorphConfig::new(FieldConfig::new("b", 4)), Some(2), signal)
            .unwrap();
        scene = scene.with_field(a).with_field(b);

        let names: Vec<&str> = scene.fields().iter().map(|f| f.name()).collect();
        assert_eq!(names, ["a", "b"]);

        let frame = scene.advance(0.5);
        assert_eq!(frame.frame, 1);
        let morph = scene.field("b").and_then(SceneField::as_morph).unwrap();
        assert!(morph.morph_factor() > 0.0);
    }

    #[test]
    fn test_mode_mut_redirects_fields() {
        let mut scene = FieldScheduler::new();
        let field =
            InstancedField::new(&FieldConfig::new("a", 6), Some(3), scene.signal()).unwrap();
        scene.push(field);

        scene.mode_mut().set(false);
        scene.advance(1.0e6);
        let a = scene.field("a").and_then(SceneField::as_instanced).unwrap();
        assert_eq!(a.interpolator().positions(), a.field().dispersed_positions());
        assert!(scene.field("missing").is_none());
    }
}
