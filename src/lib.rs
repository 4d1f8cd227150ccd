//! # Sparkfield
//!
//! A GPU particle fountain. Particles are simulated by a compute kernel
//! (gravity, lifetime, respawn) and drawn as instanced camera-facing quads
//! whose colour fades between two tints over their lifetime.
//!
//! ## Quick Start
//!
//! ```ignore
//! use sparkfield::prelude::*;
//!
//! fn main() -> Result<(), sparkfield::Error> {
//!     let settings = Settings {
//!         number_of_particles: 50_000,
//!         ..Default::default()
//!     };
//!     sparkfield::run(settings, TextureConfig::default())
//! }
//! ```
//!
//! ## Frame Flow
//!
//! Every frame the application hands a [`Settings`] snapshot to
//! [`gpu::Particles::update_data`] (which resizes the particle buffer only
//! when the count changed), then [`gpu::Renderer::render_particles`]
//! submits the compute step followed by one instanced draw of six vertices
//! per particle.
//!
//! ## Byte Layouts
//!
//! Host and kernels share every uniform layout through
//! [`layout::UniformLayout`]: offsets follow the WGSL alignment rules and
//! the WGSL structs in [`shaders`] are generated from the same tables. The
//! particle record is [`Particle`], 32 bytes.
//!
//! ## Limits
//!
//! A requested particle count that would not fit in one device buffer is
//! clamped, logged and reported as [`ParticleCount::Clamped`]; it never
//! reaches the allocator.

mod app;
pub mod camera;
pub mod error;
pub mod gpu;
pub mod kernel;
pub mod layout;
pub mod limits;
pub mod settings;
pub mod shaders;
pub mod textures;
pub mod time;
pub mod uniforms;
#[cfg(feature = "egui")]
pub mod ui;

pub use app::run;
pub use camera::{OrbitCamera, ViewProjection};
pub use error::{ConfigError, Error, GpuError, LifecycleError, TextureError};
pub use glam::{Mat4, Vec3, Vec4};
pub use kernel::{Particle, SimParams};
pub use layout::{FieldKind, UniformLayout};
pub use limits::{ParticleCount, ParticleLimits};
pub use settings::{Settings, SimulationMode};
pub use textures::{AddressMode, FilterMode, TextureConfig};
pub use time::FrameClock;

/// Prelude for convenient imports.
///
/// ```ignore
/// use sparkfield::prelude::*;
/// ```
pub mod prelude {
    pub use crate::camera::{OrbitCamera, ViewProjection};
    pub use crate::gpu::{Particles, Renderer};
    pub use crate::limits::{ParticleCount, ParticleLimits};
    pub use crate::settings::{Settings, SimulationMode};
    pub use crate::textures::{AddressMode, FilterMode, TextureConfig};
    pub use crate::time::FrameClock;
    pub use crate::{Vec3, Vec4};
    #[cfg(feature = "egui")]
    pub use egui;
}
