//! WGSL sources and the uniform records they read.
//!
//! Every shader reads the camera from `@group(0) @binding(0)`. Per-draw data
//! lives in `@group(1) @binding(0)`:
//!
//! | Shader               | Group 1            | Vertex buffers                          |
//! |----------------------|--------------------|-----------------------------------------|
//! | [`INSTANCED_MESH`]   | none               | [`MeshVertex`], `InstanceTransform`, `InstanceColor` |
//! | [`MORPH_POINTS`]     | `MorphUniforms`    | `MorphVertex` (per instance, 6 vertices each) |
//! | [`WIRE_TUBE`]        | [`WireUniforms`]   | [`TubeVertex`]                          |

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3};

use crate::curve::TubeMesh;

/// Camera block shared by all shaders.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct CameraUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    /// Render target size in pixels, for point sprites.
    pub viewport: [f32; 2],
    pub _pad: [f32; 2],
}

impl CameraUniforms {
    pub fn new(view: Mat4, proj: Mat4, viewport: Vec2) -> Self {
        Self {
            view_proj: (proj * view).to_cols_array_2d(),
            view: view.to_cols_array_2d(),
            viewport: viewport.max(Vec2::ONE).to_array(),
            _pad: [0.0; 2],
        }
    }
}

/// Wire color and current opacity.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct WireUniforms {
    pub color: [f32; 4],
}

impl WireUniforms {
    pub fn new(color: Vec3, opacity: f32) -> Self {
        Self {
            color: [color.x, color.y, color.z, opacity],
        }
    }
}

/// Vertex of an element mesh (bulb, sphere, ...).
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl MeshVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Vertex of a wire tube.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct TubeVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl TubeVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<TubeVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }

    /// Interleave a tube mesh's attribute arrays.
    pub fn from_mesh(mesh: &TubeMesh) -> Vec<TubeVertex> {
        mesh.positions
            .iter()
            .zip(&mesh.normals)
            .zip(&mesh.uvs)
            .map(|((&position, &normal), &uv)| TubeVertex {
                position,
                normal,
                uv,
            })
            .collect()
    }
}

const CAMERA_WGSL: &str = r#"
struct Camera {
    view_proj: mat4x4<f32>,
    view: mat4x4<f32>,
    viewport: vec2<f32>,
    _pad: vec2<f32>,
};

@group(0) @binding(0)
var<uniform> camera: Camera;
"#;

/// Instanced element meshes with per-instance matrix and color.
pub const INSTANCED_MESH: &str = r#"
struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct InstanceInput {
    @location(5) model_0: vec4<f32>,
    @location(6) model_1: vec4<f32>,
    @location(7) model_2: vec4<f32>,
    @location(8) model_3: vec4<f32>,
    @location(9) color: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) normal: vec3<f32>,
    @location(1) color: vec4<f32>,
};

@vertex
fn vs_main(mesh: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    let world = model * vec4<f32>(mesh.position, 1.0);

    var output: VertexOutput;
    output.clip_position = camera.view_proj * world;
    output.normal = (model * vec4<f32>(mesh.normal, 0.0)).xyz;
    output.color = instance.color;
    return output;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let light_dir = normalize(vec3<f32>(0.3, 1.0, 0.5));
    let n = normalize(input.normal);
    let diffuse = max(dot(n, light_dir), 0.0);
    // Colors may exceed 1.0 for bloom; keep most of the emission unlit.
    return vec4<f32>(input.color.rgb * (0.6 + 0.4 * diffuse), input.color.a);
}
"#;

/// Point sprites blended between two arrangements in the vertex stage.
///
/// Draw with 6 vertices per instance; each instance is one `MorphVertex`.
pub const MORPH_POINTS: &str = r#"
struct Morph {
    time: f32,
    morph: f32,
    wave_speed: f32,
    wave_amplitude: f32,
    color: vec4<f32>,
    point_scale: f32,
    _pad0: f32,
    _pad1: f32,
    _pad2: f32,
};

@group(1) @binding(0)
var<uniform> morph: Morph;

struct PointInput {
    @location(0) structured: vec3<f32>,
    @location(1) size: f32,
    @location(2) dispersed: vec3<f32>,
    @location(3) random: f32,
};

struct PointOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) corner: vec2<f32>,
    @location(1) random: f32,
};

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32, input: PointInput) -> PointOutput {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, 1.0),
    );
    let corner = corners[vertex_index % 6u];

    let p = mix(input.dispersed, input.structured, morph.morph);
    let s = morph.time * morph.wave_speed;
    let wave = vec3<f32>(
        sin(s + p.y),
        cos(s + p.x * 0.5),
        sin(s + p.z * 0.5),
    );
    let world = vec4<f32>(p + wave * morph.wave_amplitude, 1.0);

    let view_position = camera.view * world;
    let depth = max(-view_position.z, 0.001);
    let size_px = input.size * morph.point_scale / depth;

    let clip = camera.view_proj * world;
    let offset = corner * size_px / camera.viewport * clip.w;

    var output: PointOutput;
    output.clip_position = vec4<f32>(clip.xy + offset, clip.zw);
    output.corner = corner;
    output.random = input.random;
    return output;
}

@fragment
fn fs_main(input: PointOutput) -> @location(0) vec4<f32> {
    let dist = length(input.corner) * 0.5;
    if (dist > 0.5) {
        discard;
    }
    let alpha = 1.0 - smoothstep(0.0, 0.5, dist);
    let color = morph.color.rgb * (0.2 + 0.8 * input.random);
    return vec4<f32>(color, alpha * morph.color.a);
}
"#;

/// Flat-colored, alpha-blended wire tube.
pub const WIRE_TUBE: &str = r#"
struct Wire {
    color: vec4<f32>,
};

@group(1) @binding(0)
var<uniform> wire: Wire;

struct TubeInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

@vertex
fn vs_main(input: TubeInput) -> @builtin(position) vec4<f32> {
    return camera.view_proj * vec4<f32>(input.position, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return wire.color;
}
"#;

/// Full WGSL source for one of the shader bodies above, with the camera block prepended.
pub fn with_camera(body: &str) -> String {
    format!("{CAMERA_WGSL}\n{body}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::morph::MorphUniforms;

    fn validate_wgsl(code: &str) -> Result<(), String> {
        let module = naga::front::wgsl::parse_str(code)
            .map_err(|e| format!("WGSL parse error: {:?}", e))?;

        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        validator
            .validate(&module)
            .map_err(|e| format!("WGSL validation error: {:?}", e))?;

        Ok(())
    }

    #[test]
    fn test_instanced_mesh_validates() {
        validate_wgsl(&with_camera(INSTANCED_MESH)).unwrap();
    }

    #[test]
    fn test_morph_points_validates() {
        validate_wgsl(&with_camera(MORPH_POINTS)).unwrap();
    }

    #[test]
    fn test_wire_tube_validates() {
        validate_wgsl(&with_camera(WIRE_TUBE)).unwrap();
    }

    #[test]
    fn test_uniform_sizes_match_wgsl() {
        // WGSL: two mat4x4 + two vec2
        assert_eq!(std::mem::size_of::<CameraUniforms>(), 144);
        // WGSL: four f32, vec4, four f32
        assert_eq!(std::mem::size_of::<MorphUniforms>(), 48);
        assert_eq!(std::mem::size_of::<WireUniforms>(), 16);
    }

    #[test]
    fn test_tube_vertices_interleave() {
        let curve =
            crate::curve::CatmullRomCurve::new(&[Vec3::ZERO, Vec3::Y], 0.5, false).unwrap();
        let mesh = TubeMesh::build(&curve, 4, 0.1, 3);
        let vertices = TubeVertex::from_mesh(&mesh);
        assert_eq!(vertices.len(), mesh.vertex_count());
        assert_eq!(vertices[0].uv, mesh.uvs[0]);
    }
}
