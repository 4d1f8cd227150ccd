//! Instanced quad renderer for the particle buffer.

use crate::camera::ViewProjection;
use crate::error::LifecycleError;
use crate::gpu::{ParticleTexture, Particles};
use crate::kernel::{INSTANCE_SIZE, LIFETIME_OFFSET};
use crate::settings::Settings;
use crate::shaders;
use crate::uniforms::{CameraUniforms, ColorUniforms, QuadUniforms};

/// Vertices per particle: two triangles.
const QUAD_VERTICES: u32 = 6;

const BACKGROUND: wgpu::Color = wgpu::Color {
    r: 0.02,
    g: 0.02,
    b: 0.05,
    a: 1.0,
};

const INSTANCE_ATTRIBUTES: [wgpu::VertexAttribute; 2] = [
    wgpu::VertexAttribute {
        offset: 0,
        shader_location: 0,
        format: wgpu::VertexFormat::Float32x3,
    },
    wgpu::VertexAttribute {
        offset: LIFETIME_OFFSET,
        shader_location: 1,
        format: wgpu::VertexFormat::Float32,
    },
];

/// Per-instance vertex input: one particle record per instance.
pub(crate) fn instance_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: INSTANCE_SIZE,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &INSTANCE_ATTRIBUTES,
    }
}

/// Turns the particle buffer into pixels.
///
/// Owns the render pipeline and the uniforms it reads. It never owns the
/// particle buffer; each frame borrows it from [`Particles`] for one draw.
pub struct Renderer {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    quad: QuadUniforms,
    camera: CameraUniforms,
    colors: ColorUniforms,
    /// Sprite read through `bind_group`.
    _texture: ParticleTexture,
}

impl Renderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
        texture: ParticleTexture,
        settings: &Settings,
    ) -> Self {
        let quad = QuadUniforms::new(device);
        let camera = CameraUniforms::new(device);
        let colors = ColorUniforms::new(device);

        let uniform_entry = |binding, visibility| wgpu::BindGroupLayoutEntry {
            binding,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Render Bind Group Layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::VERTEX),
                uniform_entry(1, wgpu::ShaderStages::VERTEX),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                uniform_entry(4, wgpu::ShaderStages::FRAGMENT),
            ],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Particle Render Shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::render_shader().into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Render Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[instance_layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            // Sprites are translucent and blended in draw order.
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let bind_group = create_bind_group(device, &bind_group_layout, &quad, &camera, &colors, &texture);

        let renderer = Self {
            pipeline,
            bind_group,
            quad,
            camera,
            colors,
            _texture: texture,
        };
        renderer.update_data(queue, settings);
        renderer
    }

    /// Write the colour blend and quad size uniforms from a settings
    /// snapshot.
    pub fn update_data(&self, queue: &wgpu::Queue, settings: &Settings) {
        self.colors.write(queue, settings);
        self.quad.write(queue, settings.half_width, settings.half_height);
    }

    /// Step the simulation, then draw every particle into `target`.
    ///
    /// The compute dispatch is submitted before the render pass, so the
    /// draw sees this frame's particle state.
    #[allow(clippy::too_many_arguments)]
    pub fn render_particles(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        particles: &mut Particles,
        camera: &impl ViewProjection,
        aspect: f32,
        target: &wgpu::TextureView,
        delta_time: f32,
    ) -> Result<(), LifecycleError> {
        particles.update(device, queue, delta_time)?;

        // Camera input can change between frames.
        self.camera.write(queue, camera.view_projection(aspect));

        let vertex_buffer = particles.vertex_buffer()?;
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(BACKGROUND),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.bind_group, &[]);
            render_pass.set_vertex_buffer(0, vertex_buffer.slice(..));
            render_pass.draw(0..QUAD_VERTICES, 0..particles.count());
        }
        queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }
}

fn create_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    quad: &QuadUniforms,
    camera: &CameraUniforms,
    colors: &ColorUniforms,
    texture: &ParticleTexture,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Render Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: quad.block().buffer().as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: camera.block().buffer().as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: wgpu::BindingResource::Sampler(&texture.sampler),
            },
            wgpu::BindGroupEntry {
                binding: 4,
                resource: colors.block().buffer().as_entire_binding(),
            },
        ],
    })
}
