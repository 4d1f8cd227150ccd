//! The single GPU buffer holding every particle.

use std::sync::mpsc;

use tracing::debug;

use crate::error::{GpuError, LifecycleError};
use crate::kernel::{Particle, INSTANCE_SIZE};

/// Owned particle storage.
///
/// Usable at once as compute storage, per-instance vertex input and a copy
/// source/destination. Every reallocation bumps `generation`, which bind
/// groups record so a stale binding is detectable.
pub struct ParticleBuffer {
    raw: Option<wgpu::Buffer>,
    count: u32,
    generation: u64,
}

impl ParticleBuffer {
    const USAGE: wgpu::BufferUsages = wgpu::BufferUsages::VERTEX
        .union(wgpu::BufferUsages::STORAGE)
        .union(wgpu::BufferUsages::COPY_SRC)
        .union(wgpu::BufferUsages::COPY_DST);

    /// Allocate room for `count` particles.
    ///
    /// Contents are only assumed to satisfy the kernel's expiry rule; the
    /// first step seeds every record whose lifetime is not positive.
    pub fn allocate(device: &wgpu::Device, count: u32) -> Self {
        Self {
            raw: Some(create_raw(device, count)),
            count,
            generation: 0,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn byte_size(&self) -> u64 {
        self.count as u64 * INSTANCE_SIZE
    }

    /// The live buffer, or [`LifecycleError::Disposed`] once destroyed.
    pub fn buffer(&self) -> Result<&wgpu::Buffer, LifecycleError> {
        self.raw.as_ref().ok_or(LifecycleError::Disposed)
    }

    pub fn is_destroyed(&self) -> bool {
        self.raw.is_none()
    }

    /// Reallocate for `new_count` particles, keeping the common prefix.
    ///
    /// The copy is submitted before the old buffer is destroyed, so queue
    /// order guarantees it reads valid data. Returns `false` when the count
    /// is unchanged and nothing was done. Callers must rebuild any bind
    /// group that referenced the old buffer.
    pub fn resize(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        new_count: u32,
    ) -> Result<bool, LifecycleError> {
        let old = self.raw.take().ok_or(LifecycleError::Disposed)?;
        if new_count == self.count {
            self.raw = Some(old);
            return Ok(false);
        }

        let new = create_raw(device, new_count);
        let copy_bytes = self.count.min(new_count) as u64 * INSTANCE_SIZE;

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Particle Resize Encoder"),
        });
        encoder.copy_buffer_to_buffer(&old, 0, &new, 0, copy_bytes);
        queue.submit(std::iter::once(encoder.finish()));
        old.destroy();

        debug!(
            old_count = self.count,
            new_count,
            copy_bytes,
            "particle buffer resized"
        );

        self.raw = Some(new);
        self.count = new_count;
        self.generation += 1;
        Ok(true)
    }

    /// Destroy the buffer. Further use returns [`LifecycleError::Disposed`].
    pub fn destroy(&mut self) {
        if let Some(raw) = self.raw.take() {
            raw.destroy();
        }
    }

    /// Copy the buffer back to the host, blocking until the GPU is done.
    ///
    /// Meant for inspection and tests, never the frame loop.
    pub fn read_back(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> Result<Vec<Particle>, GpuError> {
        let raw = self
            .buffer()
            .map_err(|e| GpuError::BufferMapping(e.to_string()))?;
        let size = self.byte_size();

        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Particle Readback Buffer"),
            size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Particle Readback Encoder"),
        });
        encoder.copy_buffer_to_buffer(raw, 0, &staging, 0, size);
        queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        device.poll(wgpu::Maintain::Wait);

        rx.recv()
            .map_err(|e| GpuError::BufferMapping(e.to_string()))?
            .map_err(|e| GpuError::BufferMapping(e.to_string()))?;

        let particles = {
            let view = slice.get_mapped_range();
            bytemuck::cast_slice::<u8, Particle>(&view).to_vec()
        };
        staging.unmap();
        Ok(particles)
    }
}

impl Drop for ParticleBuffer {
    fn drop(&mut self) {
        self.destroy();
    }
}

fn create_raw(device: &wgpu::Device, count: u32) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Particle Buffer"),
        size: count as u64 * INSTANCE_SIZE,
        usage: ParticleBuffer::USAGE,
        mapped_at_creation: false,
    })
}
