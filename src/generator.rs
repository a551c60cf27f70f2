//! Field generation.
//!
//! A [`Field`] is the immutable per-element dataset: both target positions, a
//! color, a base scale and a phase for every element. It is generated once by
//! [`FieldGenerator`] and never mutated afterwards, so toggling the mode always
//! reconverges on the same two endpoints.

use glam::Vec3;

use crate::config::{DispersedShape, FieldConfig, StructuredShape};
use crate::error::FieldError;
use crate::spawn::{spiral_point, ShapeSampler};

/// One element's immutable data, as a by-value view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Element {
    /// Index into the field's arrays.
    pub id: usize,
    pub structured_position: Vec3,
    pub dispersed_position: Vec3,
    pub color: Vec3,
    pub scale: f32,
    /// Random value in `[0, 1)` used for wobble, tumble and pulse offsets.
    pub phase: f32,
}

/// Parallel, index-aligned arrays describing every element of a field.
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    structured: Vec<Vec3>,
    dispersed: Vec<Vec3>,
    colors: Vec<Vec3>,
    scales: Vec<f32>,
    phases: Vec<f32>,
}

impl Field {
    /// Field name from its config.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of elements. Fixed for the field's lifetime.
    pub fn len(&self) -> usize {
        self.structured.len()
    }

    /// Never true for a generated field.
    pub fn is_empty(&self) -> bool {
        self.structured.is_empty()
    }

    pub fn structured_positions(&self) -> &[Vec3] {
        &self.structured
    }

    pub fn dispersed_positions(&self) -> &[Vec3] {
        &self.dispersed
    }

    pub fn colors(&self) -> &[Vec3] {
        &self.colors
    }

    pub fn scales(&self) -> &[f32] {
        &self.scales
    }

    pub fn phases(&self) -> &[f32] {
        &self.phases
    }

    /// Target positions for a mode.
    pub fn targets(&self, assembled: bool) -> &[Vec3] {
        if assembled {
            &self.structured
        } else {
            &self.dispersed
        }
    }

    /// Element `id`, if in range.
    pub fn element(&self, id: usize) -> Option<Element> {
        if id >= self.len() {
            return None;
        }
        Some(Element {
            id,
            structured_position: self.structured[id],
            dispersed_position: self.dispersed[id],
            color: self.colors[id],
            scale: self.scales[id],
            phase: self.phases[id],
        })
    }

    /// Iterate over all elements in id order.
    pub fn elements(&self) -> impl Iterator<Item = Element> + '_ {
        (0..self.len()).filter_map(move |id| self.element(id))
    }
}

/// Builds a [`Field`] from a [`FieldConfig`].
///
/// ```ignore
/// let field = FieldGenerator::new(&config).with_seed(7).generate()?;
/// ```
pub struct FieldGenerator<'a> {
    config: &'a FieldConfig,
    seed: Option<u64>,
}

impl<'a> FieldGenerator<'a> {
    pub fn new(config: &'a FieldConfig) -> Self {
        Self { config, seed: None }
    }

    /// Make generation reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Optional seed; `None` keeps generation non-deterministic.
    pub fn with_optional_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Validate the config and sample every element.
    pub fn generate(&self) -> Result<Field, FieldError> {
        let config = self.config;
        config.validate()?;

        let count = config.count;
        let mut sampler = ShapeSampler::new(self.seed);

        let mut structured = Vec::with_capacity(count);
        let mut dispersed = Vec::with_capacity(count);
        let mut colors = Vec::with_capacity(count);
        let mut scales = Vec::with_capacity(count);
        let mut phases = Vec::with_capacity(count);

        for i in 0..count {
            structured.push(structured_position(&config.structured, i, count, &mut sampler));
            dispersed.push(dispersed_position(&config.dispersed, i, &mut sampler));
            colors.push(config.palette.pick(sampler.random()));
            scales.push(sampler.random_range(config.scale.min, config.scale.max));
            phases.push(sampler.random());
        }

        log::debug!(
            "Generated field '{}' with {} elements (seed: {:?})",
            config.name,
            count,
            self.seed
        );

        Ok(Field {
            name: config.name.clone(),
            structured,
            dispersed,
            colors,
            scales,
            phases,
        })
    }
}

fn structured_position(
    shape: &StructuredShape,
    index: usize,
    count: usize,
    sampler: &mut ShapeSampler,
) -> Vec3 {
    match shape {
        StructuredShape::ConeVolume {
            base_y,
            height,
            base_radius,
            taper_exponent,
        } => sampler.random_in_cone(*base_y, *height, *base_radius, *taper_exponent),
        StructuredShape::Spiral {
            bottom_y,
            height,
            base_radius,
            taper,
            turns,
            radius_jitter,
            descending,
            inclusive_end,
        } => {
            let t = spiral_progress(index, count, *inclusive_end);
            let y = if *descending {
                bottom_y + height - t * height
            } else {
                bottom_y + t * height
            };
            let hnorm = (y - bottom_y) / height;
            let jitter = sampler.jitter(*radius_jitter);
            spiral_point(t, y, hnorm, *base_radius, *taper, *turns, jitter)
        }
        StructuredShape::Points { points } => points[index],
    }
}

fn dispersed_position(shape: &DispersedShape, index: usize, sampler: &mut ShapeSampler) -> Vec3 {
    match shape {
        DispersedShape::SphericalShell {
            inner_radius,
            outer_radius,
        } => sampler.random_in_shell(*inner_radius, *outer_radius),
        DispersedShape::Points { points } => points[index],
    }
}

/// Progress of element `index` along a spiral, in `[0, 1]`.
fn spiral_progress(index: usize, count: usize, inclusive_end: bool) -> f32 {
    if inclusive_end {
        if count <= 1 {
            0.0
        } else {
            index as f32 / (count - 1) as f32
        }
    } else {
        index as f32 / count as f32
    }
}
