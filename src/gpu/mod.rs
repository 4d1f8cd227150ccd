//! GPU resources: device setup, the particle buffer, the simulation engine
//! and the renderer.

mod particle_buffer;
mod particles;
mod renderer;
mod texture;

#[cfg(feature = "egui")]
pub(crate) mod egui_integration;

use std::sync::Arc;

use tracing::info;
use winit::window::Window;

pub use particle_buffer::ParticleBuffer;
pub use particles::{EngineState, Particles};
pub use renderer::Renderer;
pub use texture::ParticleTexture;

use crate::error::{ConfigError, Error, GpuError};
use crate::limits::ParticleLimits;

/// Device, queue and the window surface they present to.
pub struct GpuContext {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub limits: ParticleLimits,
}

impl GpuContext {
    /// Create a device able to render to `window`.
    ///
    /// Fails with [`ConfigError::InvalidCanvasSize`] when the window has no
    /// area, and with [`GpuError`] when the platform offers no usable
    /// adapter.
    pub async fn new(window: Arc<Window>) -> Result<Self, Error> {
        let size = window.inner_size();
        if size.width == 0 || size.height == 0 {
            return Err(ConfigError::InvalidCanvasSize {
                width: size.width,
                height: size.height,
            }
            .into());
        }

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window).map_err(GpuError::from)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let (device, queue, limits) = request_device(&adapter).await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_format(&surface_caps.formats)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            limits,
        })
    }

    /// Reconfigure the surface for a new window size; zero-area sizes are
    /// ignored (minimized window).
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    pub fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height as f32
    }
}

/// Prefer an sRGB format so blended colours come out gamma-correct.
fn surface_format(formats: &[wgpu::TextureFormat]) -> Result<wgpu::TextureFormat, GpuError> {
    formats
        .iter()
        .find(|f| f.is_srgb())
        .or_else(|| formats.first())
        .copied()
        .ok_or(GpuError::UnsupportedSurface)
}

/// Create a device without a surface, for compute work and tests.
pub async fn headless() -> Result<(wgpu::Device, wgpu::Queue, ParticleLimits), GpuError> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions::default())
        .await
        .ok_or(GpuError::NoAdapter)?;
    request_device(&adapter).await
}

async fn request_device(
    adapter: &wgpu::Adapter,
) -> Result<(wgpu::Device, wgpu::Queue, ParticleLimits), GpuError> {
    // Ask for the adapter's real limits so the particle ceiling reflects
    // the hardware rather than the portable defaults.
    let required_limits = adapter.limits();

    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Sparkfield Device"),
                required_features: wgpu::Features::empty(),
                required_limits,
                memory_hints: Default::default(),
            },
            None,
        )
        .await?;

    let limits = ParticleLimits::from_device_limits(&device.limits());
    let info = adapter.get_info();
    info!(
        adapter = %info.name,
        backend = ?info.backend,
        max_particles = limits.max_particles(),
        "GPU device ready"
    );

    Ok((device, queue, limits))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_format_prefers_srgb() {
        let formats = [wgpu::TextureFormat::Bgra8Unorm, wgpu::TextureFormat::Bgra8UnormSrgb];
        assert_eq!(surface_format(&formats).unwrap(), wgpu::TextureFormat::Bgra8UnormSrgb);
    }

    #[test]
    fn test_surface_format_falls_back_to_first() {
        let formats = [wgpu::TextureFormat::Rgba16Float, wgpu::TextureFormat::Bgra8Unorm];
        assert_eq!(surface_format(&formats).unwrap(), wgpu::TextureFormat::Rgba16Float);
    }

    #[test]
    fn test_surface_without_formats_is_unsupported() {
        let err = surface_format(&[]).unwrap_err();
        assert!(matches!(err, GpuError::UnsupportedSurface));
        assert!(!err.to_string().contains("adapter found"));
    }
}
