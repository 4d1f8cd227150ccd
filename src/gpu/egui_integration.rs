//! Egui overlay for the parameter panel.
//!
//! Only built with the `egui` feature.

use std::sync::Arc;
use winit::window::Window;

/// Egui context, winit input state and wgpu renderer.
pub struct EguiIntegration {
    pub ctx: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
    pending: PendingTextures,
}

/// Output from egui frame processing.
pub struct EguiFrameOutput {
    pub paint_jobs: Vec<egui::ClippedPrimitive>,
    pub textures_delta: egui::TexturesDelta,
    pub pixels_per_point: f32,
}

impl EguiIntegration {
    pub fn new(device: &wgpu::Device, output_format: wgpu::TextureFormat, window: &Arc<Window>) -> Self {
        let ctx = egui::Context::default();

        let mut style = egui::Style::default();
        style.visuals = egui::Visuals::dark();
        style.visuals.window_shadow = egui::Shadow::NONE;
        style.visuals.popup_shadow = egui::Shadow::NONE;
        ctx.set_style(style);

        let state = egui_winit::State::new(
            ctx.clone(),
            egui::ViewportId::ROOT,
            window.as_ref(),
            Some(window.scale_factor() as f32),
            None,
            None,
        );

        let renderer = egui_wgpu::Renderer::new(
            device,
            output_format,
            None,  // depth format
            1,     // msaa samples
            false, // dithering
        );

        Self {
            ctx,
            state,
            renderer,
            pending: PendingTextures::default(),
        }
    }

    /// Feed a window event to egui.
    ///
    /// Returns true if egui consumed it, in which case the camera must not
    /// react to it.
    pub fn on_window_event(&mut self, window: &Window, event: &winit::event::WindowEvent) -> bool {
        self.state.on_window_event(window, event).consumed
    }

    /// Run one UI pass and tessellate its output.
    pub fn run(&mut self, window: &Window, ui: impl FnMut(&egui::Context)) -> EguiFrameOutput {
        let raw_input = self.state.take_egui_input(window);
        let full_output = self.ctx.run(raw_input, ui);

        self.state.handle_platform_output(window, full_output.platform_output);

        let paint_jobs = self.ctx.tessellate(full_output.shapes, full_output.pixels_per_point);

        EguiFrameOutput {
            paint_jobs,
            textures_delta: self.pending.merge(full_output.textures_delta),
            pixels_per_point: full_output.pixels_per_point,
        }
    }

    /// Hold on to the texture updates of a frame that will not be painted,
    /// so the next [`EguiIntegration::run`] applies them.
    pub fn defer(&mut self, output: EguiFrameOutput) {
        self.pending.defer(output.textures_delta);
    }

    /// Paint `output` over whatever `target` already holds.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: &wgpu::TextureView,
        size_in_pixels: [u32; 2],
        output: EguiFrameOutput,
    ) {
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels,
            pixels_per_point: output.pixels_per_point,
        };

        for (id, image_delta) in &output.textures_delta.set {
            self.renderer.update_texture(device, queue, *id, image_delta);
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Egui Encoder"),
        });
        let user_buffers = self.renderer.update_buffers(
            device,
            queue,
            &mut encoder,
            &output.paint_jobs,
            &screen_descriptor,
        );

        {
            let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Egui Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            let mut render_pass = render_pass.forget_lifetime();
            self.renderer
                .render(&mut render_pass, &output.paint_jobs, &screen_descriptor);
        }

        queue.submit(user_buffers.into_iter().chain(std::iter::once(encoder.finish())));

        for id in &output.textures_delta.free {
            self.renderer.free_texture(id);
        }
    }
}

/// Texture uploads and frees produced by frames that never reached the
/// screen. Egui sends each texture delta once, so dropping one loses the
/// font atlas for good.
#[derive(Default)]
struct PendingTextures {
    delta: egui::TexturesDelta,
}

impl PendingTextures {
    fn defer(&mut self, delta: egui::TexturesDelta) {
        self.delta.append(delta);
    }

    /// Everything deferred so far followed by `newer`, in order.
    fn merge(&mut self, newer: egui::TexturesDelta) -> egui::TexturesDelta {
        let mut delta = std::mem::take(&mut self.delta);
        delta.append(newer);
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(id: u64) -> egui::TexturesDelta {
        let image = egui::ColorImage::new([2, 2], egui::Color32::WHITE);
        egui::TexturesDelta {
            set: vec![(
                egui::TextureId::Managed(id),
                egui::epaint::ImageDelta::full(image, egui::TextureOptions::LINEAR),
            )],
            free: vec![],
        }
    }

    #[test]
    fn test_deferred_upload_reaches_next_frame() {
        let mut pending = PendingTextures::default();
        pending.defer(upload(0));

        let delta = pending.merge(egui::TexturesDelta::default());
        assert_eq!(delta.set.len(), 1);
        assert_eq!(delta.set[0].0, egui::TextureId::Managed(0));

        // Applied once, then gone.
        assert!(pending.merge(egui::TexturesDelta::default()).is_empty());
    }

    #[test]
    fn test_deferred_frames_keep_order() {
        let mut pending = PendingTextures::default();
        pending.defer(upload(0));
        pending.defer(egui::TexturesDelta {
            set: vec![],
            free: vec![egui::TextureId::Managed(3)],
        });

        let delta = pending.merge(upload(1));
        let ids: Vec<_> = delta.set.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, [egui::TextureId::Managed(0), egui::TextureId::Managed(1)]);
        assert_eq!(delta.free, [egui::TextureId::Managed(3)]);
    }

    #[test]
    fn test_nothing_deferred_passes_through() {
        let mut pending = PendingTextures::default();
        let delta = pending.merge(upload(7));
        assert_eq!(delta.set.len(), 1);
        assert!(delta.free.is_empty());
    }
}
