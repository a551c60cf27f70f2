//! GPU buffers for fields.
//!
//! These wrappers own the `wgpu` buffers a renderer binds and copy CPU state
//! into them. Uploads only happen when the CPU side reports a change, so a
//! settled field costs nothing per frame.
//!
//! Pipelines, passes and the surface belong to the host renderer. Bind group
//! layouts here match the WGSL in [`crate::shaders`].

use wgpu::util::DeviceExt;

use crate::field::InstancedField;
use crate::morph::ShaderMorphField;
use crate::shaders::{CameraUniforms, TubeVertex, WireUniforms};
use crate::wire::WirePath;

/// Layout for a single uniform buffer at binding 0, visible to both stages.
pub fn uniform_layout(device: &wgpu::Device, label: &str) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

fn uniform_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    buffer: &wgpu::Buffer,
    label: &str,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
    })
}

/// Camera uniform at group 0.
pub struct CameraBuffer {
    pub buffer: wgpu::Buffer,
    pub layout: wgpu::BindGroupLayout,
    pub bind_group: wgpu::BindGroup,
}

impl CameraBuffer {
    pub fn new(device: &wgpu::Device, camera: &CameraUniforms) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Uniform Buffer"),
            contents: bytemuck::bytes_of(camera),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let layout = uniform_layout(device, "Camera Bind Group Layout");
        let bind_group = uniform_bind_group(device, &layout, &buffer, "Camera Bind Group");
        Self {
            buffer,
            layout,
            bind_group,
        }
    }

    pub fn write(&self, queue: &wgpu::Queue, camera: &CameraUniforms) {
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(camera));
    }
}

/// Instance matrices and colors for one [`InstancedField`].
pub struct InstanceBuffers {
    pub transforms: wgpu::Buffer,
    pub colors: wgpu::Buffer,
    pub count: u32,
}

impl InstanceBuffers {
    /// Create both buffers from the field's current contents.
    pub fn new(device: &wgpu::Device, field: &mut InstancedField) -> Self {
        let name = crate::field::FieldUpdate::name(field).to_string();
        let instances = field.instances_mut();

        let transforms = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Instance Transforms", name)),
            contents: bytemuck::cast_slice(instances.transforms()),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        let colors = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Instance Colors", name)),
            contents: bytemuck::cast_slice(instances.colors()),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        // Contents are on the GPU now.
        instances.take_dirty();
        instances.take_colors_dirty();

        Self {
            transforms,
            colors,
            count: instances.capacity() as u32,
        }
    }

    /// Upload whatever changed since the last sync. Returns true if anything was written.
    pub fn sync(&self, queue: &wgpu::Queue, field: &mut InstancedField) -> bool {
        let instances = field.instances_mut();
        let mut wrote = false;

        if instances.take_colors_dirty() {
            queue.write_buffer(&self.colors, 0, bytemuck::cast_slice(instances.colors()));
            wrote = true;
        }
        if instances.take_dirty() {
            queue.write_buffer(
                &self.transforms,
                0,
                bytemuck::cast_slice(instances.transforms()),
            );
            wrote = true;
        }
        wrote
    }
}

/// Static point data plus the per-frame uniform block for a [`ShaderMorphField`].
pub struct MorphBuffers {
    pub vertices: wgpu::Buffer,
    pub uniforms: wgpu::Buffer,
    pub layout: wgpu::BindGroupLayout,
    pub bind_group: wgpu::BindGroup,
    pub count: u32,
}

impl MorphBuffers {
    pub fn new(device: &wgpu::Device, field: &mut ShaderMorphField) -> Self {
        let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Morph Vertex Buffer"),
            contents: bytemuck::cast_slice(field.vertices()),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let uniforms = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Morph Uniform Buffer"),
            contents: bytemuck::bytes_of(&field.uniforms()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        field.take_uniforms_dirty();

        let layout = uniform_layout(device, "Morph Bind Group Layout");
        let bind_group = uniform_bind_group(device, &layout, &uniforms, "Morph Bind Group");

        Self {
            vertices,
            uniforms,
            layout,
            bind_group,
            count: field.len() as u32,
        }
    }

    pub fn sync(&self, queue: &wgpu::Queue, field: &mut ShaderMorphField) -> bool {
        if !field.take_uniforms_dirty() {
            return false;
        }
        queue.write_buffer(&self.uniforms, 0, bytemuck::bytes_of(&field.uniforms()));
        true
    }

    /// Vertices per draw call: one quad (two triangles) per point.
    pub fn vertex_count(&self) -> u32 {
        6
    }
}

/// Tube geometry and color/opacity uniform for a [`WirePath`].
pub struct WireBuffers {
    pub vertices: wgpu::Buffer,
    pub indices: wgpu::Buffer,
    pub index_count: u32,
    pub uniforms: wgpu::Buffer,
    pub layout: wgpu::BindGroupLayout,
    pub bind_group: wgpu::BindGroup,
    uploaded_opacity: f32,
}

impl WireBuffers {
    pub fn new(device: &wgpu::Device, wire: &WirePath) -> Self {
        let mesh = wire.mesh();
        let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Wire Vertex Buffer"),
            contents: bytemuck::cast_slice(&TubeVertex::from_mesh(mesh)),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Wire Index Buffer"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let uniforms = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Wire Uniform Buffer"),
            contents: bytemuck::bytes_of(&WireUniforms::new(wire.color(), wire.opacity())),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let layout = uniform_layout(device, "Wire Bind Group Layout");
        let bind_group = uniform_bind_group(device, &layout, &uniforms, "Wire Bind Group");

        Self {
            vertices,
            indices,
            index_count: mesh.indices.len() as u32,
            uniforms,
            layout,
            bind_group,
            uploaded_opacity: wire.opacity(),
        }
    }

    /// Upload the opacity if it changed. Geometry never changes.
    pub fn sync(&mut self, queue: &wgpu::Queue, wire: &WirePath) -> bool {
        if wire.opacity() == self.uploaded_opacity {
            return false;
        }
        self.uploaded_opacity = wire.opacity();
        queue.write_buffer(
            &self.uniforms,
            0,
            bytemuck::bytes_of(&WireUniforms::new(wire.color(), wire.opacity())),
        );
        true
    }

    /// Skip the draw entirely when the wire has faded out.
    pub fn should_draw(&self, wire: &WirePath) -> bool {
        wire.is_visible()
    }
}
