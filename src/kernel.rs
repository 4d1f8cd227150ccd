//! The particle record and the simulation kernel contract.
//!
//! [`Particle`] is the exact per-instance layout the compute and vertex
//! shaders read. The functions here mirror what the WGSL kernel does to
//! each record in one step, using the same integer hash, so the GPU
//! output can be checked against a host-side oracle.

use bytemuck::{Pod, Zeroable};

/// Byte stride of one particle in the GPU buffer.
pub const INSTANCE_SIZE: u64 = std::mem::size_of::<Particle>() as u64;

/// Threads per compute workgroup; must match `@workgroup_size` in the kernel.
pub const WORKGROUP_SIZE: u32 = 256;

/// Byte offset of `lifetime` inside a particle, read as vertex attribute 1.
pub const LIFETIME_OFFSET: u64 = 12;

/// Spawn budget meaning "respawn every expired particle".
pub const UNLIMITED_SPAWN: u32 = u32::MAX;

/// GPU-resident particle state.
///
/// A `lifetime` of zero or less marks the record as expired; the kernel
/// reseeds it on its next step. Fresh buffers rely on exactly this rule,
/// never on any other implicit initial value.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Particle {
    pub position: [f32; 3],
    pub lifetime: f32,
    pub velocity: [f32; 3],
    pub _pad: f32,
}

/// Number of workgroups needed to cover `num_particles` indices.
pub fn workgroup_count(num_particles: u32) -> u32 {
    num_particles.div_ceil(WORKGROUP_SIZE)
}

/// Per-step simulation parameters, as written to the simulation uniforms.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimParams {
    pub delta_time: f32,
    pub gravity: [f32; 3],
    pub origin: [f32; 3],
    pub min_lifetime: f32,
    pub max_lifetime: f32,
    pub initial_velocity: f32,
    /// Fresh every frame, in `[-1, 1)`.
    pub rand_seed: f32,
    pub spawn_budget: u32,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            delta_time: 0.0,
            gravity: [0.0; 3],
            origin: [0.0; 3],
            min_lifetime: 1.0,
            max_lifetime: 1.0,
            initial_velocity: 0.0,
            rand_seed: 0.0,
            spawn_budget: UNLIMITED_SPAWN,
        }
    }
}

/// PCG-style integer hash, identical to `pcg_hash` in the compute shader.
pub fn pcg_hash(input: u32) -> u32 {
    let state = input.wrapping_mul(747_796_405).wrapping_add(2_891_336_453);
    let word = ((state >> ((state >> 28) + 4)) ^ state).wrapping_mul(277_803_737);
    (word >> 22) ^ word
}

/// Map a hash to `[0, 1)` using its top 24 bits.
pub fn unit_float(hash: u32) -> f32 {
    (hash >> 8) as f32 / 16_777_216.0
}

/// Advance `particles` by one step.
///
/// Expired records respawn at `origin` with a sampled lifetime and launch
/// velocity and are not integrated in the same step; live records take one
/// explicit Euler step (velocity first, then position).
pub fn step(particles: &mut [Particle], params: &SimParams) {
    let mut spawned = 0u32;
    for (index, p) in particles.iter_mut().enumerate() {
        if p.lifetime <= 0.0 {
            if spawned >= params.spawn_budget {
                continue;
            }
            spawned += 1;
            respawn(p, index as u32, params);
        } else {
            integrate(p, params);
        }
    }
}

fn respawn(p: &mut Particle, index: u32, params: &SimParams) {
    let h0 = pcg_hash(index ^ pcg_hash(params.rand_seed.to_bits()));
    let h1 = pcg_hash(h0);
    let h2 = pcg_hash(h1);

    p.position = params.origin;
    p.lifetime =
        params.min_lifetime + unit_float(h0) * (params.max_lifetime - params.min_lifetime);

    let z = unit_float(h1) * 2.0 - 1.0;
    let phi = unit_float(h2) * std::f32::consts::TAU;
    let r = (1.0 - z * z).max(0.0).sqrt();
    let dir = [r * phi.cos(), r * phi.sin(), z];
    p.velocity = dir.map(|c| c * params.initial_velocity);
}

fn integrate(p: &mut Particle, params: &SimParams) {
    let dt = params.delta_time;
    for axis in 0..3 {
        p.velocity[axis] += params.gravity[axis] * dt;
        p.position[axis] += p.velocity[axis] * dt;
    }
    p.lifetime -= dt;
}

/// Fragment colour tint for a particle with `lifetime` remaining.
///
/// Blends from `color2` (about to expire) to `color` (just spawned). The
/// ratio is clamped to `[0, 1]`, so a particle that outlives a lowered
/// `max_lifetime` shows `color` rather than an extrapolated value.
pub fn lifetime_blend(lifetime: f32, max_lifetime: f32, color: [f32; 4], color2: [f32; 4]) -> [f32; 4] {
    let t = (lifetime / max_lifetime).clamp(0.0, 1.0);
    std::array::from_fn(|i| color[i] * t + color2[i] * (1.0 - t))
}
