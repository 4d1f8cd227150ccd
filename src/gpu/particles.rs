//! The simulation engine: compute pipeline, bind group and per-frame
//! dispatch over the particle buffer.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::warn;

use crate::error::{Error, GpuError, LifecycleError};
use crate::gpu::ParticleBuffer;
use crate::kernel::{workgroup_count, Particle, SimParams};
use crate::limits::{ParticleCount, ParticleLimits};
use crate::settings::{Settings, SimulationMode};
use crate::shaders;
use crate::uniforms::SimulationUniforms;

/// Where the engine is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    Ready,
    Disposed,
}

/// A compute bind group plus the buffer generation it was built against.
struct SimulationBindGroup {
    group: wgpu::BindGroup,
    generation: u64,
}

/// GPU particle simulation.
///
/// Owns the particle buffer exclusively. The renderer borrows it for one
/// draw at a time through [`Particles::vertex_buffer`].
pub struct Particles {
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: SimulationBindGroup,
    buffer: ParticleBuffer,
    uniforms: SimulationUniforms,
    /// Respawns claimed in the current step; reset before every dispatch.
    spawn_counter: wgpu::Buffer,
    settings: Settings,
    limits: ParticleLimits,
    rng: StdRng,
    state: EngineState,
}

impl Particles {
    /// Build the pipeline and allocate the buffer for `settings`.
    ///
    /// An oversized particle count is clamped (see [`Particles::count`]).
    pub fn new(
        device: &wgpu::Device,
        settings: &Settings,
        limits: ParticleLimits,
    ) -> Result<Self, Error> {
        Self::with_rng(device, settings, limits, StdRng::from_entropy())
    }

    /// Like [`Particles::new`] with a fixed seed for the per-frame random
    /// values, so runs are reproducible.
    pub fn with_seed(
        device: &wgpu::Device,
        settings: &Settings,
        limits: ParticleLimits,
        seed: u64,
    ) -> Result<Self, Error> {
        Self::with_rng(device, settings, limits, StdRng::seed_from_u64(seed))
    }

    fn with_rng(
        device: &wgpu::Device,
        settings: &Settings,
        limits: ParticleLimits,
        rng: StdRng,
    ) -> Result<Self, Error> {
        settings.validate()?;

        let count = limits.clamp(settings.number_of_particles).count();
        let buffer = ParticleBuffer::allocate(device, count);
        let uniforms = SimulationUniforms::new(device);

        let spawn_counter = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Spawn Counter"),
            size: std::mem::size_of::<u32>() as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Compute Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Simulation Shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::compute_shader().into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Compute Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Compute Pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        let bind_group = create_bind_group(
            device,
            &bind_group_layout,
            &buffer,
            &uniforms,
            &spawn_counter,
        )?;

        let mut settings = settings.clone();
        settings.number_of_particles = count;

        Ok(Self {
            pipeline,
            bind_group_layout,
            bind_group,
            buffer,
            uniforms,
            spawn_counter,
            settings,
            limits,
            rng,
            state: EngineState::Ready,
        })
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Current particle count.
    pub fn count(&self) -> u32 {
        self.buffer.count()
    }

    pub fn limits(&self) -> ParticleLimits {
        self.limits
    }

    /// The particle buffer, for binding as per-instance vertex input.
    pub fn vertex_buffer(&self) -> Result<&wgpu::Buffer, LifecycleError> {
        self.ensure_ready()?;
        self.buffer.buffer()
    }

    /// Pull this frame's parameters from a settings snapshot.
    ///
    /// Lifetimes and forces are always taken; the buffer is resized only
    /// when the (clamped) particle count differs from the current one.
    pub fn update_data(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        settings: &Settings,
    ) -> Result<ParticleCount, LifecycleError> {
        self.ensure_ready()?;

        if settings.mode == SimulationMode::Cpu && self.settings.mode != SimulationMode::Cpu {
            warn!("CPU simulation is not available; continuing on the GPU");
        }

        let requested = self.limits.clamp(settings.number_of_particles);
        self.settings = settings.clone();
        self.settings.number_of_particles = requested.count();

        if requested.count() != self.buffer.count() {
            self.resize(device, queue, requested.count())?;
        }
        Ok(requested)
    }

    /// Reallocate the particle buffer, preserving the common prefix, then
    /// rebuild the compute bind group against the new buffer.
    pub fn resize(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        new_count: u32,
    ) -> Result<(), LifecycleError> {
        self.ensure_ready()?;
        let new_count = self.limits.clamp(new_count).count();
        if self.buffer.resize(device, queue, new_count)? {
            self.bind_group = create_bind_group(
                device,
                &self.bind_group_layout,
                &self.buffer,
                &self.uniforms,
                &self.spawn_counter,
            )?;
        }
        self.settings.number_of_particles = new_count;
        Ok(())
    }

    /// Parameters for a step of `delta_time` seconds with a fresh seed.
    pub fn next_params(&mut self, delta_time: f32) -> SimParams {
        let s = &self.settings;
        SimParams {
            delta_time,
            gravity: s.gravity.to_array(),
            origin: s.origin.to_array(),
            min_lifetime: s.min_particle_lifetime,
            max_lifetime: s.max_particle_lifetime,
            initial_velocity: s.initial_velocity,
            rand_seed: self.rng.gen_range(-1.0..1.0),
            spawn_budget: s.spawn_budget(delta_time),
        }
    }

    /// Advance the simulation by `delta_time` seconds.
    ///
    /// Writes the step uniforms and submits one compute dispatch covering
    /// every particle. Returns without waiting for the GPU.
    pub fn update(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        delta_time: f32,
    ) -> Result<(), LifecycleError> {
        let params = self.next_params(delta_time);
        self.dispatch(device, queue, &params)
    }

    /// Submit one step with explicit parameters.
    pub fn dispatch(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        params: &SimParams,
    ) -> Result<(), LifecycleError> {
        self.ensure_ready()?;
        if self.bind_group.generation != self.buffer.generation() {
            return Err(LifecycleError::StaleBindGroup {
                bound: self.bind_group.generation,
                current: self.buffer.generation(),
            });
        }

        self.uniforms.write(queue, params);
        queue.write_buffer(&self.spawn_counter, 0, bytemuck::bytes_of(&0u32));

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Simulation Encoder"),
        });
        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Simulation Pass"),
                timestamp_writes: None,
            });
            compute_pass.set_pipeline(&self.pipeline);
            compute_pass.set_bind_group(0, &self.bind_group.group, &[]);
            compute_pass.dispatch_workgroups(workgroup_count(self.buffer.count()), 1, 1);
        }
        queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    /// Copy the particle state back to the host (blocking).
    pub fn read_particles(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> Result<Vec<Particle>, GpuError> {
        self.buffer.read_back(device, queue)
    }

    /// Release the particle buffer. Every later operation fails with
    /// [`LifecycleError::Disposed`].
    pub fn dispose(&mut self) {
        self.buffer.destroy();
        self.state = EngineState::Disposed;
    }

    fn ensure_ready(&self) -> Result<(), LifecycleError> {
        match self.state {
            EngineState::Ready => Ok(()),
            EngineState::Disposed => Err(LifecycleError::Disposed),
        }
    }
}

fn create_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    buffer: &ParticleBuffer,
    uniforms: &SimulationUniforms,
    spawn_counter: &wgpu::Buffer,
) -> Result<SimulationBindGroup, LifecycleError> {
    let group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Compute Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.buffer()?.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: uniforms.block().buffer().as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: spawn_counter.as_entire_binding(),
            },
        ],
    });
    Ok(SimulationBindGroup {
        group,
        generation: buffer.generation(),
    })
}
