//! Uniform blocks backed by GPU buffers.
//!
//! Each block pairs a [`UniformLayout`] with a `UNIFORM | COPY_DST` buffer
//! of exactly the layout's size. Writes go straight to the queue at the
//! field's offset; nothing is ever read back, and the last write before a
//! submit wins.

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::kernel::SimParams;
use crate::layout::{FieldKind, UniformLayout};
use crate::settings::Settings;

/// Simulation parameters, compute binding 1.
pub const SIMULATION_FIELDS: &[(&str, FieldKind)] = &[
    ("delta_time", FieldKind::F32),
    ("gravity", FieldKind::Vec3),
    ("origin", FieldKind::Vec3),
    ("min_lifetime", FieldKind::F32),
    ("max_lifetime", FieldKind::F32),
    ("initial_velocity", FieldKind::F32),
    ("rand_seed", FieldKind::F32),
    ("spawn_budget", FieldKind::U32),
];

/// Quad half extents, render binding 0.
pub const QUAD_FIELDS: &[(&str, FieldKind)] = &[
    ("half_width", FieldKind::F32),
    ("half_height", FieldKind::F32),
];

/// Camera matrix, render binding 1.
pub const CAMERA_FIELDS: &[(&str, FieldKind)] = &[("view_proj", FieldKind::Mat4)];

/// Lifetime colour blend, render binding 4.
pub const COLOR_FIELDS: &[(&str, FieldKind)] = &[
    ("color", FieldKind::Vec4),
    ("color2", FieldKind::Vec4),
    ("max_lifetime", FieldKind::F32),
];

/// Supported uniform value types.
#[derive(Clone, Copy, Debug)]
pub enum UniformValue {
    F32(f32),
    U32(u32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
}

impl UniformValue {
    /// The field kind this value encodes as.
    pub fn kind(&self) -> FieldKind {
        match self {
            UniformValue::F32(_) => FieldKind::F32,
            UniformValue::U32(_) => FieldKind::U32,
            UniformValue::Vec2(_) => FieldKind::Vec2,
            UniformValue::Vec3(_) => FieldKind::Vec3,
            UniformValue::Vec4(_) => FieldKind::Vec4,
            UniformValue::Mat4(_) => FieldKind::Mat4,
        }
    }

    /// Little-endian encoding; vectors are tightly packed `f32`s and
    /// matrices are column-major.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            UniformValue::F32(v) => v.to_le_bytes().to_vec(),
            UniformValue::U32(v) => v.to_le_bytes().to_vec(),
            UniformValue::Vec2(v) => floats_to_bytes(&v.to_array()),
            UniformValue::Vec3(v) => floats_to_bytes(&v.to_array()),
            UniformValue::Vec4(v) => floats_to_bytes(&v.to_array()),
            UniformValue::Mat4(m) => floats_to_bytes(&m.to_cols_array()),
        }
    }
}

fn floats_to_bytes(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

// Conversion traits for ergonomic API
impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::F32(v)
    }
}

impl From<u32> for UniformValue {
    fn from(v: u32) -> Self {
        UniformValue::U32(v)
    }
}

impl From<Vec2> for UniformValue {
    fn from(v: Vec2) -> Self {
        UniformValue::Vec2(v)
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        UniformValue::Vec3(v)
    }
}

impl From<[f32; 3]> for UniformValue {
    fn from(v: [f32; 3]) -> Self {
        UniformValue::Vec3(Vec3::from_array(v))
    }
}

impl From<Vec4> for UniformValue {
    fn from(v: Vec4) -> Self {
        UniformValue::Vec4(v)
    }
}

impl From<[f32; 4]> for UniformValue {
    fn from(v: [f32; 4]) -> Self {
        UniformValue::Vec4(Vec4::from_array(v))
    }
}

impl From<Mat4> for UniformValue {
    fn from(v: Mat4) -> Self {
        UniformValue::Mat4(v)
    }
}

/// A fixed-size parameter block living in a GPU uniform buffer.
pub struct UniformBlock {
    label: &'static str,
    layout: UniformLayout,
    buffer: wgpu::Buffer,
}

impl UniformBlock {
    pub fn new(device: &wgpu::Device, label: &'static str, fields: &[(&'static str, FieldKind)]) -> Self {
        let layout = UniformLayout::new(fields);
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: layout.size(),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self {
            label,
            layout,
            buffer,
        }
    }

    pub fn layout(&self) -> &UniformLayout {
        &self.layout
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    /// Encode `value` at the named field's offset.
    ///
    /// # Panics
    ///
    /// Panics if the block has no such field or the value's kind differs
    /// from the declared one. Both are layout bugs, not runtime input.
    pub fn set<V: Into<UniformValue>>(&self, queue: &wgpu::Queue, name: &str, value: V) {
        let value = value.into();
        let field = self
            .layout
            .field(name)
            .unwrap_or_else(|| panic!("uniform block `{}` has no field `{}`", self.label, name));
        assert_eq!(
            field.kind,
            value.kind(),
            "uniform `{}.{}` written with the wrong type",
            self.label,
            name
        );
        queue.write_buffer(&self.buffer, field.offset, &value.to_bytes());
    }
}

/// Step parameters for the compute kernel.
pub struct SimulationUniforms(UniformBlock);

impl SimulationUniforms {
    pub fn new(device: &wgpu::Device) -> Self {
        Self(UniformBlock::new(device, "Simulation Uniforms", SIMULATION_FIELDS))
    }

    pub fn block(&self) -> &UniformBlock {
        &self.0
    }

    pub fn write(&self, queue: &wgpu::Queue, params: &SimParams) {
        let block = &self.0;
        block.set(queue, "delta_time", params.delta_time);
        block.set(queue, "gravity", params.gravity);
        block.set(queue, "origin", params.origin);
        block.set(queue, "min_lifetime", params.min_lifetime);
        block.set(queue, "max_lifetime", params.max_lifetime);
        block.set(queue, "initial_velocity", params.initial_velocity);
        block.set(queue, "rand_seed", params.rand_seed);
        block.set(queue, "spawn_budget", params.spawn_budget);
    }
}

/// Quad size read by the vertex kernel.
pub struct QuadUniforms(UniformBlock);

impl QuadUniforms {
    pub fn new(device: &wgpu::Device) -> Self {
        Self(UniformBlock::new(device, "Quad Uniforms", QUAD_FIELDS))
    }

    pub fn block(&self) -> &UniformBlock {
        &self.0
    }

    pub fn write(&self, queue: &wgpu::Queue, half_width: f32, half_height: f32) {
        self.0.set(queue, "half_width", half_width);
        self.0.set(queue, "half_height", half_height);
    }
}

/// View-projection matrix read by the vertex kernel.
pub struct CameraUniforms(UniformBlock);

impl CameraUniforms {
    pub fn new(device: &wgpu::Device) -> Self {
        Self(UniformBlock::new(device, "Camera Uniforms", CAMERA_FIELDS))
    }

    pub fn block(&self) -> &UniformBlock {
        &self.0
    }

    pub fn write(&self, queue: &wgpu::Queue, view_proj: Mat4) {
        self.0.set(queue, "view_proj", view_proj);
    }
}

/// Colour blend parameters read by the fragment kernel.
pub struct ColorUniforms(UniformBlock);

impl ColorUniforms {
    pub fn new(device: &wgpu::Device) -> Self {
        Self(UniformBlock::new(device, "Color Uniforms", COLOR_FIELDS))
    }

    pub fn block(&self) -> &UniformBlock {
        &self.0
    }

    pub fn write(&self, queue: &wgpu::Queue, settings: &Settings) {
        self.0.set(queue, "color", settings.color);
        self.0.set(queue, "color2", settings.color2);
        self.0.set(queue, "max_lifetime", settings.max_particle_lifetime);
    }
}
