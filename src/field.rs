//! Instanced fields: the per-frame unit for elements drawn as mesh instances.
//!
//! An [`InstancedField`] owns one generated [`Field`], the interpolator that
//! moves its elements, the instance buffers the renderer reads, and an
//! optional [`WirePath`]. Everything that can fail happens in
//! [`InstancedField::new`]; [`FieldUpdate::update`] is infallible.

use crate::config::FieldConfig;
use crate::error::FieldError;
use crate::generator::{Field, FieldGenerator};
use crate::instance::InstanceBufferWriter;
use crate::interpolator::TransformInterpolator;
use crate::mode::{FrameContext, ModeSignal};
use crate::wire::WirePath;

/// Anything the scheduler can advance once per frame.
pub trait FieldUpdate {
    /// Advance by one frame. Reads the mode signal once, at the start.
    fn update(&mut self, frame: &FrameContext);

    /// Name used in logs.
    fn name(&self) -> &str;
}

/// A field of mesh instances morphing between two arrangements.
#[derive(Debug)]
pub struct InstancedField {
    field: Field,
    interpolator: TransformInterpolator,
    writer: InstanceBufferWriter,
    wire: Option<WirePath>,
    signal: ModeSignal,
}

impl InstancedField {
    /// Generate the field and mount it.
    ///
    /// Colors are written once here. Transforms are evaluated for a zero-length
    /// frame so the buffers are valid before the first update.
    pub fn new(
        config: &FieldConfig,
        seed: Option<u64>,
        signal: ModeSignal,
    ) -> Result<Self, FieldError> {
        let field = FieldGenerator::new(config)
            .with_optional_seed(seed)
            .generate()?;

        let wire = config
            .wire
            .as_ref()
            .map(|wire| WirePath::new(field.structured_positions(), wire))
            .transpose()?;

        let mut interpolator = TransformInterpolator::new(&field, config.blend)
            .with_orientation(config.orientation)
            .with_scale(config.scale_rule, config.scale_multiplier);

        let mut writer = InstanceBufferWriter::new(field.len());
        writer.write_colors(field.colors())?;

        interpolator.advance(&field, signal.get(), &FrameContext::default());
        writer.write_transforms(
            interpolator.positions(),
            interpolator.rotations(),
            interpolator.scales(),
        )?;

        log::info!(
            "Mounted field '{}' with {} instances{}",
            field.name(),
            field.len(),
            if wire.is_some() { " and a wire" } else { "" }
        );

        Ok(Self {
            field,
            interpolator,
            writer,
            wire,
            signal,
        })
    }

    /// The immutable element data.
    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn interpolator(&self) -> &TransformInterpolator {
        &self.interpolator
    }

    pub fn instances(&self) -> &InstanceBufferWriter {
        &self.writer
    }

    /// Mutable access for the uploader to clear dirty flags.
    pub fn instances_mut(&mut self) -> &mut InstanceBufferWriter {
        &mut self.writer
    }

    pub fn wire(&self) -> Option<&WirePath> {
        self.wire.as_ref()
    }

    pub fn len(&self) -> usize {
        self.field.len()
    }

    pub fn is_empty(&self) -> bool {
        self.field.is_empty()
    }
}

impl FieldUpdate for InstancedField {
    fn update(&mut self, frame: &FrameContext) {
        let assembled = self.signal.get();

        self.interpolator.advance(&self.field, assembled, frame);
        self.writer.write_from(&self.interpolator);

        if let Some(wire) = &mut self.wire {
            wire.update(assembled, frame.delta);
        }
    }

    fn name(&self) -> &str {
        self.field.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WireConfig;
    use crate::interpolator::OrientationRule;
    use crate::mode::ModeController;
    use glam::Vec3;

    fn frame(delta: f32) -> FrameContext {
        FrameContext {
            elapsed: 0.0,
            delta,
            frame: 1,
        }
    }

    #[test]
    fn test_mount_writes_buffers() {
        let mode = ModeController::new();
        let config = FieldConfig::new("bulbs", 10);
        let mut field = InstancedField::new(&config, Some(4), mode.signal()).unwrap();

        assert_eq!(field.instances().capacity(), 10);
        assert!(field.instances_mut().take_colors_dirty());

        // A zero-length frame leaves the elements at their dispersed positions.
        let m = field.instances().matrix(0).unwrap();
        let expected = field.field().dispersed_positions()[0];
        assert!(m.w_axis.truncate().distance(expected) < 1e-5);

        // Colors are written once at mount; frames only touch transforms.
        for _ in 0..30 {
            field.update(&frame(1.0 / 60.0));
        }
        assert!(field.instances_mut().take_dirty());
        assert!(!field.instances_mut().take_colors_dirty());
    }

    #[test]
    fn test_huge_frames_keep_matrices_finite() {
        let mut mode = ModeController::with_initial(false);
        mode.time_mut().set_time_scale(2.0);
        let config = FieldConfig::new("ornaments", 16).with_orientation(OrientationRule::FaceAxis {
            center: Vec3::ZERO,
            wobble: 1.0,
            tumble: Vec3::new(0.5, 0.3, 0.7),
        });
        let mut field = InstancedField::new(&config, Some(6), mode.signal()).unwrap();

        for _ in 0..2 {
            let frame = mode.advance(f32::INFINITY);
            assert!(frame.delta.is_finite() && frame.elapsed.is_finite());
            field.update(&frame);
        }

        for rotation in field.interpolator().rotations() {
            assert!(rotation.is_finite());
        }
        for id in 0..field.len() {
            assert!(field.instances().matrix(id).unwrap().is_finite());
        }
    }

    #[test]
    fn test_update_reads_mode() {
        let mut mode = ModeController::new();
        let config = FieldConfig::new("bulbs", 5);
        let mut field = InstancedField::new(&config, Some(4), mode.signal()).unwrap();

        field.update(&frame(1.0e6));
        assert_eq!(
            field.interpolator().positions(),
            field.field().structured_positions()
        );

        mode.set(false);
        field.update(&frame(1.0e6));
        assert_eq!(
            field.interpolator().positions(),
            field.field().dispersed_positions()
        );
    }

    #[test]
    fn test_wire_fades_with_mode() {
        let mut mode = ModeController::new();
        let config = FieldConfig::new("lights", 20).with_wire(WireConfig::default());
        let mut field = InstancedField::new(&config, Some(9), mode.signal()).unwrap();
        assert!(field.wire().unwrap().is_visible());

        mode.set(false);
        for _ in 0..200 {
            field.update(&frame(1.0 / 60.0));
        }
        assert!(!field.wire().unwrap().is_visible());
    }

    #[test]
    fn test_wire_uses_structured_positions() {
        let mode = ModeController::new();
        let config = FieldConfig::new("lights", 12).with_wire(WireConfig::default());
        let field = InstancedField::new(&config, Some(1), mode.signal()).unwrap();
        let wire = field.wire().unwrap();
        let first: Vec3 = field.field().structured_positions()[0];
        assert!(wire.curve().point(0.0).distance(first) < 1e-4);
    }
}
