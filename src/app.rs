//! Windowed application: owns the GPU context and drives one frame per
//! redraw.

use std::sync::Arc;

use tracing::{error, info, warn};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::camera::OrbitCamera;
use crate::error::Error;
use crate::gpu::{GpuContext, ParticleTexture, Particles, Renderer};
use crate::limits::ParticleCount;
use crate::settings::Settings;
use crate::textures::TextureConfig;
use crate::time::FrameClock;

#[cfg(feature = "egui")]
use crate::gpu::egui_integration::EguiIntegration;
#[cfg(feature = "egui")]
use crate::ui::{PanelStats, SettingsPanel};

/// Open a window and run the particle system until it is closed.
///
/// Returns the first error that stopped the frame loop, if any.
pub fn run(settings: Settings, sprite: TextureConfig) -> Result<(), Error> {
    settings.validate()?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(settings, sprite);
    event_loop.run_app(&mut app)?;

    match app.failure.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Everything that exists once the window and device are up.
struct FrameState {
    window: Arc<Window>,
    gpu: GpuContext,
    particles: Particles,
    renderer: Renderer,
    camera: OrbitCamera,
    clock: FrameClock,
    last_count: ParticleCount,
    #[cfg(feature = "egui")]
    egui: EguiIntegration,
    #[cfg(feature = "egui")]
    panel: SettingsPanel,
}

impl FrameState {
    async fn new(window: Arc<Window>, settings: &Settings, sprite: &TextureConfig) -> Result<Self, Error> {
        let gpu = GpuContext::new(window.clone()).await?;
        let particles = Particles::new(&gpu.device, settings, gpu.limits)?;
        let texture = ParticleTexture::upload(&gpu.device, &gpu.queue, sprite);
        let renderer = Renderer::new(&gpu.device, &gpu.queue, gpu.config.format, texture, settings);
        let last_count = gpu.limits.clamp(settings.number_of_particles);

        #[cfg(feature = "egui")]
        let egui = EguiIntegration::new(&gpu.device, gpu.config.format, &window);

        info!(particles = particles.count(), "particle system ready");

        Ok(Self {
            window,
            gpu,
            particles,
            renderer,
            camera: OrbitCamera::new(),
            clock: FrameClock::new(),
            last_count,
            #[cfg(feature = "egui")]
            egui,
            #[cfg(feature = "egui")]
            panel: SettingsPanel::new(),
        })
    }

    /// Run one frame: GUI, settings hand-off, simulate, draw, present.
    fn frame(&mut self, settings: &mut Settings) -> Result<(), Error> {
        let delta_time = self.clock.tick();

        #[cfg(feature = "egui")]
        let ui_output = {
            let stats = PanelStats {
                fps: self.clock.fps(),
                particles: self.particles.count(),
                max_particles: self.particles.limits().max_particles(),
                clamp_warning: self.last_count.warning(),
                paused: self.clock.is_paused(),
            };
            let panel = &mut self.panel;
            self.egui
                .run(&self.window, |ctx| panel.show(ctx, settings, &stats))
        };

        let count = self.particles.update_data(&self.gpu.device, &self.gpu.queue, settings)?;
        settings.number_of_particles = count.count();
        // Keep a clamp notice visible until the user picks another count.
        if count.is_clamped() || count.count() != self.last_count.count() {
            self.last_count = count;
        }
        self.renderer.update_data(&self.gpu.queue, settings);

        let Some(output) = self.acquire_frame()? else {
            #[cfg(feature = "egui")]
            self.egui.defer(ui_output);
            return Ok(());
        };
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        self.renderer.render_particles(
            &self.gpu.device,
            &self.gpu.queue,
            &mut self.particles,
            &self.camera,
            self.gpu.aspect(),
            &view,
            delta_time,
        )?;

        #[cfg(feature = "egui")]
        self.egui.render(
            &self.gpu.device,
            &self.gpu.queue,
            &view,
            [self.gpu.config.width, self.gpu.config.height],
            ui_output,
        );

        output.present();
        Ok(())
    }

    /// Next surface texture, or `None` when this frame has to be skipped.
    fn acquire_frame(&mut self) -> Result<Option<wgpu::SurfaceTexture>, Error> {
        match self.gpu.surface.get_current_texture() {
            Ok(output) => Ok(Some(output)),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let (width, height) = (self.gpu.config.width, self.gpu.config.height);
                self.gpu.resize(width, height);
                Ok(None)
            }
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("surface timed out; skipping frame");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Whether the GUI claimed this event.
    #[cfg(feature = "egui")]
    fn gui_consumed(&mut self, event: &WindowEvent) -> bool {
        self.egui.on_window_event(&self.window, event)
    }

    #[cfg(not(feature = "egui"))]
    fn gui_consumed(&mut self, _event: &WindowEvent) -> bool {
        false
    }
}

struct App {
    settings: Settings,
    sprite: TextureConfig,
    state: Option<FrameState>,
    failure: Option<Error>,
    mouse_pressed: bool,
    last_mouse_pos: Option<(f64, f64)>,
}

impl App {
    fn new(settings: Settings, sprite: TextureConfig) -> Self {
        Self {
            settings,
            sprite,
            state: None,
            failure: None,
            mouse_pressed: false,
            last_mouse_pos: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, e: Error) {
        error!("stopping: {e}");
        if let Some(state) = &mut self.state {
            state.particles.dispose();
        }
        self.failure = Some(e);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title("Sparkfield")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, e.into()),
        };

        match pollster::block_on(FrameState::new(window.clone(), &self.settings, &self.sprite)) {
            Ok(state) => {
                self.settings.number_of_particles = state.particles.count();
                self.state = Some(state);
                window.request_redraw();
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(state) = &mut self.state else {
            return;
        };
        if state.gui_consumed(&event) {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                state.particles.dispose();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                state.gpu.resize(size.width, size.height);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => match code {
                KeyCode::Space => state.clock.toggle_pause(),
                KeyCode::Escape => {
                    state.particles.dispose();
                    event_loop.exit();
                }
                _ => {}
            },
            WindowEvent::MouseInput { state: button_state, button, .. } => {
                if button == MouseButton::Left {
                    self.mouse_pressed = button_state == ElementState::Pressed;
                    if !self.mouse_pressed {
                        self.last_mouse_pos = None;
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if self.mouse_pressed {
                    if let Some((last_x, last_y)) = self.last_mouse_pos {
                        state
                            .camera
                            .orbit((position.x - last_x) as f32, (position.y - last_y) as f32);
                    }
                    self.last_mouse_pos = Some((position.x, position.y));
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
                };
                state.camera.zoom(scroll);
            }
            WindowEvent::RedrawRequested => {
                if state.window.inner_size().width == 0 || state.window.inner_size().height == 0 {
                    state.window.request_redraw();
                    return;
                }
                match state.frame(&mut self.settings) {
                    Ok(()) => state.window.request_redraw(),
                    Err(e) => self.fail(event_loop, e),
                }
            }
            _ => {}
        }
    }
}
