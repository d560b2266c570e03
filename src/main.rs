// Interactive surface plot viewer
// Orbit or fly around y = 2·sin(2x)·cos(z); C switches camera, G wireframe, L lighting,
// P screenshot, F3 stats, Esc quits.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use winit::{
    event::{Event as WinitEvent, WindowEvent},
    event_loop::EventLoop,
    window::{CursorGrabMode, Window},
};

use surface_plot::engine::debug_overlay::{DebugOverlay, DebugStats, FrameTimer};
use surface_plot::engine::renderer::{preferred_surface_format, Renderer};
use surface_plot::engine::{
    linspace, Action, CameraRig, GridData, InputState, Result, Scene, Settings,
};

// ============================================================================
// DEMO DATA
// ============================================================================

fn build_demo_scene(settings: &Settings) -> Result<Scene> {
    let mut scene = Scene::new(&settings.mesh);
    let data = GridData::from_fn(
        linspace(-6.0, 6.0, 100),
        linspace(-10.0, 10.0, 100),
        |x, z| 2.0 * (2.0 * x).sin() * z.cos(),
    );
    let mesh = scene.add_mesh(data, None)?;
    scene.add_axes(&mesh, Some("axes"))?;
    Ok(scene)
}

fn screenshot_path() -> PathBuf {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    PathBuf::from(format!("screenshot-{millis}.png"))
}

// ============================================================================
// APPLICATION STATE
// ============================================================================

struct State {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: winit::dpi::PhysicalSize<u32>,
    renderer: Renderer,
    overlay: DebugOverlay,

    scene: Scene,
    cameras: CameraRig,
    input: InputState,
    last_update: Instant,
    screenshot_requested: bool,

    // Stats
    timer: FrameTimer,
    frame_stats: (u32, f32, f32, f32),
    draw_calls: u32,
}

impl State {
    async fn new(window: Arc<Window>, settings: &Settings, scene: Scene, cameras: CameraRig) -> Self {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone()).expect("failed to create surface");

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("no suitable GPU adapter");

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await
            .expect("failed to create device");

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = preferred_surface_format(&surface_caps.formats)
            .expect("surface reports no supported formats");

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &config);

        let mut renderer = Renderer::new(&device, surface_format, config.width, config.height, settings.window.background);
        renderer.upload(&device, &scene);

        let overlay = DebugOverlay::new(&window, &device, surface_format);

        Self {
            window,
            surface,
            device,
            queue,
            config,
            size,
            renderer,
            overlay,
            scene,
            cameras,
            input: InputState::new(),
            last_update: Instant::now(),
            screenshot_requested: false,
            timer: FrameTimer::default(),
            frame_stats: (0, 0.0, 0.0, 0.0),
            draw_calls: 0,
        }
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.renderer.resize(&self.device, new_size.width, new_size.height);
            self.cameras.set_aspect(new_size.width as f32 / new_size.height as f32);
        }
    }

    /// Apply this frame's actions and move the active camera.
    /// Returns false when the user asked to quit.
    fn update(&mut self) -> bool {
        let now = Instant::now();
        let dt = (now - self.last_update).as_secs_f32();
        self.last_update = now;
        self.timer.record(dt * 1000.0);

        let actions: Vec<Action> = self.input.actions().collect();
        for action in actions {
            match action {
                Action::Quit => return false,
                Action::ToggleWireframe => {
                    let on = self.scene.toggle_wireframe();
                    log::info!("wireframe {}", if on { "on" } else { "off" });
                }
                Action::ToggleLighting => {
                    let on = self.scene.toggle_lighting();
                    log::info!("lighting {}", if on { "on" } else { "off" });
                }
                Action::SwitchCamera => self.cameras.switch(),
                Action::Screenshot => self.screenshot_requested = true,
                Action::ToggleOverlay => self.overlay.toggle(),
            }
        }

        self.cameras.update(&self.input, dt);
        true
    }

    fn render(&mut self) -> std::result::Result<(), wgpu::SurfaceError> {
        let pass = match self.scene.render(self.cameras.active()) {
            Ok(pass) => pass,
            Err(e) => {
                log::error!("{e}");
                return Ok(());
            }
        };

        if std::mem::take(&mut self.screenshot_requested) {
            let path = screenshot_path();
            if let Err(e) = self.renderer.screenshot(&self.device, &self.queue, &pass, self.config.width, self.config.height, &path) {
                log::warn!("{e}");
            }
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        self.draw_calls = self.renderer.draw(&self.queue, &mut encoder, &view, &pass);

        let stats = self.overlay.visible.then(|| {
            let (fps, avg, min, max) = self.frame_stats;
            DebugStats {
                fps,
                frame_time_avg_ms: avg,
                frame_time_min_ms: min,
                frame_time_max_ms: max,
                draw_calls: self.draw_calls,
                vertex_count: pass.vertex_count(),
                resolution: (self.size.width, self.size.height),
                camera: self.cameras.active().state(),
                wireframe: pass.commands.iter().any(|c| c.uniforms.wireframe != 0),
                lighting: pass.commands.iter().any(|c| c.uniforms.lighting != 0),
            }
        });

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: self.window.scale_factor() as f32,
        };
        self.overlay.render(
            &self.device,
            &self.queue,
            &mut encoder,
            &self.window,
            &view,
            &screen_descriptor,
            stats.as_ref(),
        );

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    /// Called once per second.
    fn refresh_stats(&mut self) {
        self.frame_stats = self.timer.flush();
        let state = self.cameras.active().state();
        log::info!(
            "FPS: {} | Draw calls: {} | Camera: {:?} at ({:.2}, {:.2}, {:.2})",
            self.frame_stats.0, self.draw_calls, state.mode,
            state.position.x, state.position.y, state.position.z
        );
    }
}

fn grab_cursor(window: &Window) {
    let grabbed = window
        .set_cursor_grab(CursorGrabMode::Locked)
        .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
    if let Err(e) = grabbed {
        log::warn!("cursor grab unavailable: {e}");
    }
    window.set_cursor_visible(false);
}

// ============================================================================
// MAIN
// ============================================================================

fn main() {
    env_logger::init();

    let settings = Settings::default();

    // Reject bad data before any window or GPU resource exists
    let cameras = CameraRig::new(&settings.camera, settings.window.aspect_ratio());
    let scene = match build_demo_scene(&settings) {
        Ok(scene) => scene,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = scene.render(cameras.active()) {
        log::error!("{e}");
        std::process::exit(1);
    }

    let event_loop = EventLoop::new().expect("failed to create event loop");

    let window_attributes = Window::default_attributes()
        .with_title("Surface Plot")
        .with_inner_size(winit::dpi::PhysicalSize::new(settings.window.width, settings.window.height));

    let window = Arc::new(event_loop.create_window(window_attributes).expect("failed to create window"));
    grab_cursor(&window);

    let mut state = pollster::block_on(State::new(window.clone(), &settings, scene, cameras));
    // the window may open at a different size than requested
    state.resize(window.inner_size());
    let mut last_fps_update = Instant::now();

    event_loop.run(move |event, control_flow| {
        match event {
            WinitEvent::DeviceEvent { ref event, .. } => {
                state.input.process_device_event(event);
            }
            WinitEvent::WindowEvent {
                ref event,
                window_id,
            } if window_id == window.id() => {
                let _ = state.overlay.handle_window_event(&window, event);
                state.input.process_event(event);

                match event {
                    WindowEvent::CloseRequested => control_flow.exit(),
                    WindowEvent::Focused(true) => grab_cursor(&window),
                    WindowEvent::Resized(physical_size) => {
                        state.resize(*physical_size);
                    }
                    WindowEvent::RedrawRequested => {
                        if !state.update() {
                            control_flow.exit();
                            return;
                        }
                        match state.render() {
                            Ok(_) => {}
                            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                                log::warn!("surface lost, reconfiguring");
                                state.resize(state.size);
                            }
                            Err(wgpu::SurfaceError::OutOfMemory) => control_flow.exit(),
                            Err(e) => log::warn!("{e:?}"),
                        }
                        state.input.end_frame();

                        let now = Instant::now();
                        if (now - last_fps_update).as_secs_f32() >= 1.0 {
                            state.refresh_stats();
                            last_fps_update = now;
                        }
                    }
                    _ => {}
                }
            }
            WinitEvent::AboutToWait => {
                window.request_redraw();
            }
            _ => {}
        }
    }).expect("event loop error");
}
