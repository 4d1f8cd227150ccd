//! Device-derived ceiling on the particle count.

use tracing::warn;

use crate::kernel::INSTANCE_SIZE;

/// Largest particle count the device can hold in one buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParticleLimits {
    max_particles: u32,
}

/// Outcome of fitting a requested particle count to the device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParticleCount {
    /// The request fits as-is.
    Exact(u32),
    /// The request was outside `[1, max]` and was replaced by `count`.
    Clamped { requested: u32, count: u32 },
}

impl ParticleCount {
    /// The count to actually allocate.
    pub fn count(self) -> u32 {
        match self {
            ParticleCount::Exact(n) => n,
            ParticleCount::Clamped { count, .. } => count,
        }
    }

    pub fn is_clamped(self) -> bool {
        matches!(self, ParticleCount::Clamped { .. })
    }

    /// User-facing explanation when the request was adjusted.
    pub fn warning(self) -> Option<String> {
        match self {
            ParticleCount::Exact(_) => None,
            ParticleCount::Clamped { requested, count } => Some(format!(
                "{requested} particles do not fit on this device; using {count}"
            )),
        }
    }
}

impl ParticleLimits {
    pub fn new(max_particles: u32) -> Self {
        Self {
            max_particles: max_particles.max(1),
        }
    }

    /// Derive the ceiling from device limits.
    ///
    /// The whole buffer is bound as one storage binding, so both the buffer
    /// size limit and the storage binding limit apply.
    pub fn from_device_limits(limits: &wgpu::Limits) -> Self {
        let max_bytes = limits
            .max_buffer_size
            .min(limits.max_storage_buffer_binding_size as u64);
        let max_particles = (max_bytes / INSTANCE_SIZE).min(u32::MAX as u64) as u32;
        Self::new(max_particles)
    }

    pub fn max_particles(&self) -> u32 {
        self.max_particles
    }

    /// Fit `requested` into `[1, max_particles]`, warning when it had to move.
    pub fn clamp(&self, requested: u32) -> ParticleCount {
        let count = requested.clamp(1, self.max_particles);
        if count == requested {
            return ParticleCount::Exact(count);
        }
        warn!(requested, count, "particle count clamped to device limit");
        ParticleCount::Clamped { requested, count }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_within_limit_is_exact() {
        let limits = ParticleLimits::new(1000);
        assert_eq!(limits.clamp(1000), ParticleCount::Exact(1000));
    }

    #[test]
    fn test_over_limit_clamps_to_max() {
        let limits = ParticleLimits::new(1000);
        let result = limits.clamp(1001);
        assert_eq!(result.count(), 1000);
        assert!(result.is_clamped());
        assert!(result.warning().is_some());
    }

    #[test]
    fn test_zero_clamps_to_one() {
        let limits = ParticleLimits::new(1000);
        assert_eq!(
            limits.clamp(0),
            ParticleCount::Clamped { requested: 0, count: 1 }
        );
    }

    #[test]
    fn test_from_default_device_limits() {
        let limits = wgpu::Limits::default();
        let derived = ParticleLimits::from_device_limits(&limits);
        let expected = limits
            .max_buffer_size
            .min(limits.max_storage_buffer_binding_size as u64)
            / 32;
        assert_eq!(derived.max_particles() as u64, expected);
    }
}
