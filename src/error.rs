//! Error types for sparkfield.
//!
//! Failures fall into a few buckets: the platform cannot give us a GPU
//! ([`GpuError`]), the configuration is unusable ([`ConfigError`]), an
//! engine operation was attempted out of order ([`LifecycleError`]), or a
//! texture could not be loaded ([`TextureError`]). [`Error`] collects them
//! for callers that only need to report and stop. All of them are fatal
//! for the frame loop; an oversized particle count is not an error at all
//! and is reported as [`crate::ParticleCount::Clamped`] instead.

use thiserror::Error;

/// Errors that can occur during GPU initialization or readback.
#[derive(Debug, Error)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    #[error("failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    #[error("no compatible GPU adapter found; compute and render support (WebGPU/Vulkan/Metal/DX12) is required")]
    NoAdapter,
    /// The adapter can drive the window but offers no surface format.
    #[error("the window surface reports no supported texture formats for this adapter")]
    UnsupportedSurface,
    /// Failed to create GPU device.
    #[error("failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
    /// Failed to map buffer for reading.
    #[error("failed to map GPU buffer: {0}")]
    BufferMapping(String),
}

/// Configuration values rejected at construction time.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The render target has no area.
    #[error("invalid canvas size {width}x{height}; both dimensions must be positive")]
    InvalidCanvasSize { width: u32, height: u32 },
    /// Lifetime bounds are non-positive or inverted.
    #[error("invalid particle lifetime range [{min}, {max}]; need 0 < min <= max")]
    InvalidLifetime { min: f32, max: f32 },
    /// A preset file could not be read or written.
    #[error("preset file error: {0}")]
    PresetIo(#[from] std::io::Error),
    /// A preset file is not valid JSON for [`crate::Settings`].
    #[error("malformed preset: {0}")]
    PresetFormat(#[from] serde_json::Error),
}

/// An engine operation was attempted in a state that does not allow it.
///
/// These indicate a missed initialization step or use after teardown and
/// are never retried.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LifecycleError {
    /// The engine or its particle buffer has already been disposed.
    #[error("particle buffer used after it was destroyed")]
    Disposed,
    /// The compute bind group references a particle buffer that has since
    /// been reallocated.
    #[error("compute bind group is stale (bound to buffer generation {bound}, current is {current})")]
    StaleBindGroup { bound: u64, current: u64 },
}

/// Errors that can occur during texture loading.
#[derive(Debug, Error)]
pub enum TextureError {
    /// Failed to decode the image file.
    #[error("failed to load image: {0}")]
    ImageLoad(#[from] image::ImageError),
    /// Raw pixel data does not match the stated dimensions.
    #[error("RGBA data is {actual} bytes, expected {expected} for {width}x{height}")]
    SizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// Any failure surfaced by the engine or the application shell.
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to create event loop.
    #[error("failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    /// Failed to create window.
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    /// GPU initialization failed.
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
    /// Startup configuration was rejected.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    /// The particle texture could not be created.
    #[error("texture error: {0}")]
    Texture(#[from] TextureError),
    /// An engine operation ran out of order.
    #[error("lifecycle violation: {0}")]
    Lifecycle(#[from] LifecycleError),
    /// The surface could not provide a frame and cannot be recovered by
    /// reconfiguring.
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}
