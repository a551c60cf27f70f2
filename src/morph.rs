//! GPU-blended point fields.
//!
//! For dense fields (thousands of points with no orientation) the per-element
//! work moves to the vertex shader. The CPU keeps a single scalar morph factor,
//! damped toward 1 when assembled and 0 when dispersed, and uploads it with the
//! elapsed time. Each vertex then computes
//!
//! ```text
//! p = mix(dispersed, structured, morph)
//! s = time * wave_speed
//! p += wave_amplitude * (sin(s + p.y), cos(s + 0.5 * p.x), sin(s + 0.5 * p.z))
//! ```
//!
//! [`ShaderMorphField::displaced_position`] evaluates the same expression on
//! the CPU.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::config::MorphConfig;
use crate::error::FieldError;
use crate::field::FieldUpdate;
use crate::generator::FieldGenerator;
use crate::interpolator::BlendLaw;
use crate::mode::{FrameContext, ModeSignal};

/// Static per-point data, uploaded once.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct MorphVertex {
    pub structured: [f32; 3],
    /// Point size before perspective division.
    pub size: f32,
    pub dispersed: [f32; 3],
    /// Per-point random value in `[0, 1)`, used for shading.
    pub random: f32,
}

impl MorphVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32,
        2 => Float32x3,
        3 => Float32
    ];

    /// Stepped per instance; the shader expands each point into a quad.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MorphVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Per-frame uniforms for the morph shader.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct MorphUniforms {
    pub time: f32,
    pub morph: f32,
    pub wave_speed: f32,
    pub wave_amplitude: f32,
    /// Base color; alpha is the maximum point opacity.
    pub color: [f32; 4],
    pub point_scale: f32,
    pub _pad: [f32; 3],
}

/// A point field whose blend runs in the vertex shader.
#[derive(Debug, Clone)]
pub struct ShaderMorphField {
    name: String,
    vertices: Vec<MorphVertex>,
    signal: ModeSignal,
    law: BlendLaw,
    morph: f32,
    time: f32,
    wave_speed: f32,
    wave_amplitude: f32,
    point_scale: f32,
    color: Vec3,
    uniforms_dirty: bool,
}

impl ShaderMorphField {
    /// Generate the point data and start fully dispersed (`morph = 0`).
    pub fn new(
        config: &MorphConfig,
        seed: Option<u64>,
        signal: ModeSignal,
    ) -> Result<Self, FieldError> {
        config.validate()?;
        let field = FieldGenerator::new(&config.field)
            .with_optional_seed(seed)
            .generate()?;

        let vertices = field
            .elements()
            .map(|e| MorphVertex {
                structured: e.structured_position.to_array(),
                size: e.scale,
                dispersed: e.dispersed_position.to_array(),
                random: e.phase,
            })
            .collect::<Vec<_>>();

        log::info!(
            "Mounted morph field '{}' with {} points",
            field.name(),
            vertices.len()
        );

        Ok(Self {
            name: field.name().to_string(),
            vertices,
            signal,
            law: config.field.blend,
            morph: 0.0,
            time: 0.0,
            wave_speed: config.wave_speed,
            wave_amplitude: config.wave_amplitude,
            point_scale: config.point_scale,
            color: config.field.palette.color(0),
            uniforms_dirty: true,
        })
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Current blend factor in `[0, 1]`; 1 means fully structured.
    pub fn morph_factor(&self) -> f32 {
        self.morph
    }

    /// Static vertex data for upload.
    pub fn vertices(&self) -> &[MorphVertex] {
        &self.vertices
    }

    /// Uniform block for the current frame.
    pub fn uniforms(&self) -> MorphUniforms {
        MorphUniforms {
            time: self.time,
            morph: self.morph,
            wave_speed: self.wave_speed,
            wave_amplitude: self.wave_amplitude,
            color: [self.color.x, self.color.y, self.color.z, 0.8],
            point_scale: self.point_scale,
            _pad: [0.0; 3],
        }
    }

    /// Read and clear the uniform dirty flag.
    pub fn take_uniforms_dirty(&mut self) -> bool {
        std::mem::take(&mut self.uniforms_dirty)
    }

    /// CPU evaluation of the vertex shader's position for point `index`.
    pub fn displaced_position(&self, index: usize, time: f32) -> Option<Vec3> {
        let v = self.vertices.get(index)?;
        let dispersed = Vec3::from_array(v.dispersed);
        let structured = Vec3::from_array(v.structured);
        let p = dispersed.lerp(structured, self.morph);

        let s = time * self.wave_speed;
        let wave = Vec3::new(
            (s + p.y).sin(),
            (s + 0.5 * p.x).cos(),
            (s + 0.5 * p.z).sin(),
        );
        Some(p + wave * self.wave_amplitude)
    }
}

impl FieldUpdate for ShaderMorphField {
    fn update(&mut self, frame: &FrameContext) {
        let target = if self.signal.get() { 1.0 } else { 0.0 };
        self.morph = self
            .law
            .step_scalar(self.morph, target, frame.delta)
            .clamp(0.0, 1.0);
        self.time = frame.elapsed;
        self.uniforms_dirty = true;
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldConfig;
    use crate::mode::ModeController;

    fn frame(elapsed: f32, delta: f32) -> FrameContext {
        FrameContext {
            elapsed,
            delta,
            frame: 0,
        }
    }

    fn morph_field(mode: &ModeController) -> ShaderMorphField {
        let config = MorphConfig::new(FieldConfig::new("points", 64));
        ShaderMorphField::new(&config, Some(11), mode.signal()).unwrap()
    }

    #[test]
    fn test_layout_sizes() {
        assert_eq!(std::mem::size_of::<MorphVertex>(), 32);
        assert_eq!(std::mem::size_of::<MorphUniforms>(), 48);
    }

    #[test]
    fn test_starts_dispersed() {
        let mode = ModeController::new();
        let field = morph_field(&mode);
        assert_eq!(field.morph_factor(), 0.0);
        assert_eq!(field.len(), 64);
    }

    #[test]
    fn test_morph_follows_damped_law() {
        let mode = ModeController::new();
        let mut field = morph_field(&mode);

        field.update(&frame(1.0, 1.0));
        let expected = 1.0 - (-1.5f32).exp();
        assert!((field.morph_factor() - expected).abs() < 1e-5);
    }

    #[test]
    fn test_fixed_fraction_law_rejected() {
        let mode = ModeController::new();
        let config = MorphConfig::new(
            FieldConfig::new("points", 8).with_blend(BlendLaw::FixedFraction { rate: 2.0 }),
        );
        assert!(ShaderMorphField::new(&config, Some(1), mode.signal()).is_err());
    }

    #[test]
    fn test_displaced_position_without_wave() {
        let mode = ModeController::new();
        let config = MorphConfig::new(FieldConfig::new("points", 8)).with_wave(0.5, 0.0);
        let mut field = ShaderMorphField::new(&config, Some(2), mode.signal()).unwrap();

        let v = field.vertices()[3];
        assert_eq!(
            field.displaced_position(3, 4.0).unwrap(),
            Vec3::from_array(v.dispersed)
        );

        field.update(&frame(1.0e6, 1.0e6));
        assert_eq!(field.morph_factor(), 1.0);
        let p = field.displaced_position(3, 4.0).unwrap();
        assert!(p.distance(Vec3::from_array(v.structured)) < 1e-5);
        assert!(field.displaced_position(8, 0.0).is_none());
    }

    #[test]
    fn test_uniforms_carry_time() {
        let mut mode = ModeController::new();
        let mut field = morph_field(&mode);
        mode.set(false);
        field.update(&frame(2.5, 0.016));
        let u = field.uniforms();
        assert_eq!(u.time, 2.5);
        assert_eq!(u.morph, 0.0);
        assert!(field.take_uniforms_dirty());
    }
}
