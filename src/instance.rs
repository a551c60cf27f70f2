//! Fixed-capacity instance buffers.
//!
//! Slot `i` always belongs to element `i`. Matrices are rewritten every frame;
//! colors are written once when the field is mounted.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3};

use crate::error::FieldError;
use crate::interpolator::TransformInterpolator;

/// Per-instance model matrix, column-major.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct InstanceTransform {
    pub model: [[f32; 4]; 4],
}

impl InstanceTransform {
    const ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        5 => Float32x4,
        6 => Float32x4,
        7 => Float32x4,
        8 => Float32x4
    ];

    /// Vertex layout: four `vec4` columns at locations 5..=8, stepped per instance.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceTransform>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Per-instance color. Alpha is always 1.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct InstanceColor {
    pub color: [f32; 4],
}

impl InstanceColor {
    const ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![9 => Float32x4];

    /// Vertex layout: one `vec4` at location 9, stepped per instance.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceColor>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// CPU-side instance buffers for one field.
#[derive(Debug, Clone)]
pub struct InstanceBufferWriter {
    transforms: Vec<InstanceTransform>,
    colors: Vec<InstanceColor>,
    dirty: bool,
    colors_dirty: bool,
}

impl InstanceBufferWriter {
    /// Allocate `capacity` slots with identity matrices and black colors.
    pub fn new(capacity: usize) -> Self {
        Self {
            transforms: vec![
                InstanceTransform {
                    model: Mat4::IDENTITY.to_cols_array_2d(),
                };
                capacity
            ],
            colors: vec![InstanceColor::zeroed(); capacity],
            dirty: true,
            colors_dirty: false,
        }
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.transforms.len()
    }

    /// Write one color per slot. Done once at mount.
    pub fn write_colors(&mut self, colors: &[Vec3]) -> Result<(), FieldError> {
        self.check_len(colors.len())?;
        for (slot, c) in self.colors.iter_mut().zip(colors) {
            slot.color = [c.x, c.y, c.z, 1.0];
        }
        self.colors_dirty = true;
        Ok(())
    }

    /// Compose translation * rotation * scale into every slot.
    pub fn write_transforms(
        &mut self,
        positions: &[Vec3],
        rotations: &[Quat],
        scales: &[f32],
    ) -> Result<(), FieldError> {
        self.check_len(positions.len())?;
        self.check_len(rotations.len())?;
        self.check_len(scales.len())?;
        self.write_slots(positions, rotations, scales);
        Ok(())
    }

    /// Per-frame path. The interpolator's length was checked when the field was mounted.
    pub(crate) fn write_from(&mut self, interpolator: &TransformInterpolator) {
        self.write_slots(
            interpolator.positions(),
            interpolator.rotations(),
            interpolator.scales(),
        );
    }

    fn write_slots(&mut self, positions: &[Vec3], rotations: &[Quat], scales: &[f32]) {
        let mut changed = false;
        let sources = positions.iter().zip(rotations).zip(scales);
        for (slot, ((&p, &r), &s)) in self.transforms.iter_mut().zip(sources) {
            let model = Mat4::from_scale_rotation_translation(Vec3::splat(s), r, p)
                .to_cols_array_2d();
            if slot.model != model {
                slot.model = model;
                changed = true;
            }
        }
        self.dirty |= changed;
    }

    fn check_len(&self, actual: usize) -> Result<(), FieldError> {
        if actual != self.capacity() {
            return Err(FieldError::CapacityMismatch {
                capacity: self.capacity(),
                actual,
            });
        }
        Ok(())
    }

    /// Whether any matrix changed since the last [`take_dirty`](Self::take_dirty).
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Read and clear the transform dirty flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Read and clear the color dirty flag.
    pub fn take_colors_dirty(&mut self) -> bool {
        std::mem::take(&mut self.colors_dirty)
    }

    pub fn transforms(&self) -> &[InstanceTransform] {
        &self.transforms
    }

    pub fn colors(&self) -> &[InstanceColor] {
        &self.colors
    }

    /// Model matrix in slot `id`.
    pub fn matrix(&self, id: usize) -> Option<Mat4> {
        self.transforms
            .get(id)
            .map(|t| Mat4::from_cols_array_2d(&t.model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_sizes() {
        assert_eq!(std::mem::size_of::<InstanceTransform>(), 64);
        assert_eq!(std::mem::size_of::<InstanceColor>(), 16);
        assert_eq!(InstanceTransform::layout().attributes.len(), 4);
        assert_eq!(InstanceColor::layout().attributes[0].shader_location, 9);
    }

    #[test]
    fn test_capacity_mismatch() {
        let mut writer = InstanceBufferWriter::new(3);
        assert!(matches!(
            writer.write_colors(&[Vec3::ONE; 2]),
            Err(FieldError::CapacityMismatch { capacity: 3, actual: 2 })
        ));
        assert!(writer
            .write_transforms(&[Vec3::ZERO; 3], &[Quat::IDENTITY; 3], &[1.0; 4])
            .is_err());
    }

    #[test]
    fn test_trs_composition() {
        let mut writer = InstanceBufferWriter::new(1);
        let rotation = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        writer
            .write_transforms(&[Vec3::new(1.0, 2.0, 3.0)], &[rotation], &[2.0])
            .unwrap();

        let m = writer.matrix(0).unwrap();
        // +X scaled by 2, rotated a quarter turn about Y to -Z, then translated.
        let p = m.transform_point3(Vec3::X);
        assert!(p.distance(Vec3::new(1.0, 2.0, 1.0)) < 1e-5);
    }

    #[test]
    fn test_dirty_only_on_change() {
        let mut writer = InstanceBufferWriter::new(2);
        writer.take_dirty();

        let positions = [Vec3::ZERO, Vec3::X];
        let rotations = [Quat::IDENTITY; 2];
        let scales = [1.0; 2];

        writer.write_transforms(&positions, &rotations, &scales).unwrap();
        assert!(writer.take_dirty());

        writer.write_transforms(&positions, &rotations, &scales).unwrap();
        assert!(!writer.is_dirty());
    }

    #[test]
    fn test_colors_written_with_alpha() {
        let mut writer = InstanceBufferWriter::new(1);
        writer.write_colors(&[Vec3::new(0.5, 0.25, 1.0)]).unwrap();
        assert_eq!(writer.colors()[0].color, [0.5, 0.25, 1.0, 1.0]);
        assert!(writer.take_colors_dirty());
        assert!(!writer.take_colors_dirty());
    }
}
