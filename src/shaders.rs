//! WGSL sources for the simulation and render kernels.
//!
//! Uniform structs are emitted from the same field tables the host writes
//! through, so a layout change cannot leave the shaders behind.

use crate::kernel::WORKGROUP_SIZE;
use crate::layout::UniformLayout;
use crate::uniforms::{CAMERA_FIELDS, COLOR_FIELDS, QUAD_FIELDS, SIMULATION_FIELDS};

const PARTICLE_STRUCT: &str = r#"struct Particle {
    position: vec3<f32>,
    lifetime: f32,
    velocity: vec3<f32>,
    _pad: f32,
};
"#;

/// Generate the compute shader.
pub fn compute_shader() -> String {
    let sim_struct = UniformLayout::new(SIMULATION_FIELDS).to_wgsl_struct("SimParams");

    format!(
        r#"{PARTICLE_STRUCT}
{sim_struct}
@group(0) @binding(0)
var<storage, read_write> particles: array<Particle>;

@group(0) @binding(1)
var<uniform> sim: SimParams;

@group(0) @binding(2)
var<storage, read_write> spawn_counter: atomic<u32>;

const TAU: f32 = 6.283185307179586;

fn pcg_hash(input: u32) -> u32 {{
    let state = input * 747796405u + 2891336453u;
    let word = ((state >> ((state >> 28u) + 4u)) ^ state) * 277803737u;
    return (word >> 22u) ^ word;
}}

fn unit_float(h: u32) -> f32 {{
    return f32(h >> 8u) / 16777216.0;
}}

@compute @workgroup_size({WORKGROUP_SIZE})
fn main(@builtin(global_invocation_id) global_id: vec3<u32>) {{
    let index = global_id.x;
    if index >= arrayLength(&particles) {{
        return;
    }}

    var p = particles[index];

    if p.lifetime <= 0.0 {{
        if atomicAdd(&spawn_counter, 1u) >= sim.spawn_budget {{
            return;
        }}
        let h0 = pcg_hash(index ^ pcg_hash(bitcast<u32>(sim.rand_seed)));
        let h1 = pcg_hash(h0);
        let h2 = pcg_hash(h1);

        p.position = sim.origin;
        p.lifetime = sim.min_lifetime + unit_float(h0) * (sim.max_lifetime - sim.min_lifetime);

        let z = unit_float(h1) * 2.0 - 1.0;
        let phi = unit_float(h2) * TAU;
        let r = sqrt(max(1.0 - z * z, 0.0));
        p.velocity = vec3<f32>(r * cos(phi), r * sin(phi), z) * sim.initial_velocity;
    }} else {{
        p.velocity = p.velocity + sim.gravity * sim.delta_time;
        p.position = p.position + p.velocity * sim.delta_time;
        p.lifetime = p.lifetime - sim.delta_time;
    }}

    particles[index] = p;
}}
"#
    )
}

/// Generate the render shader (vertex + fragment).
pub fn render_shader() -> String {
    let quad_struct = UniformLayout::new(QUAD_FIELDS).to_wgsl_struct("QuadParams");
    let camera_struct = UniformLayout::new(CAMERA_FIELDS).to_wgsl_struct("CameraParams");
    let color_struct = UniformLayout::new(COLOR_FIELDS).to_wgsl_struct("ColorParams");

    format!(
        r#"{quad_struct}
{camera_struct}
{color_struct}
@group(0) @binding(0)
var<uniform> quad: QuadParams;

@group(0) @binding(1)
var<uniform> camera: CameraParams;

@group(0) @binding(2)
var particle_texture: texture_2d<f32>;

@group(0) @binding(3)
var particle_sampler: sampler;

@group(0) @binding(4)
var<uniform> colors: ColorParams;

struct VertexOutput {{
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) lifetime: f32,
}};

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @location(0) particle_pos: vec3<f32>,
    @location(1) lifetime: f32,
) -> VertexOutput {{
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>( 1.0,  1.0),
    );
    let corner = corners[vertex_index];

    var out: VertexOutput;
    out.uv = corner * vec2<f32>(0.5, -0.5) + vec2<f32>(0.5, 0.5);
    out.lifetime = lifetime;

    // Expired particles collapse to a point beyond the far plane.
    if lifetime <= 0.0 {{
        out.clip_position = vec4<f32>(0.0, 0.0, 2.0, 1.0);
        return out;
    }}

    var clip = camera.view_proj * vec4<f32>(particle_pos, 1.0);
    clip.x += corner.x * quad.half_width;
    clip.y += corner.y * quad.half_height;
    out.clip_position = clip;
    return out;
}}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {{
    let base = textureSample(particle_texture, particle_sampler, in.uv);
    let t = clamp(in.lifetime / colors.max_lifetime, 0.0, 1.0);
    return base * (colors.color * t + colors.color2 * (1.0 - t));
}}
"#
    )
}
