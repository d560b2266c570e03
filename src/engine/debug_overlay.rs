use egui::epaint::Shadow;
use super::camera::{CameraMode, CameraState};

pub struct DebugStats {
    pub fps: u32,
    pub frame_time_avg_ms: f32,
    pub frame_time_min_ms: f32,
    pub frame_time_max_ms: f32,
    pub draw_calls: u32,
    pub vertex_count: usize,
    pub resolution: (u32, u32),
    pub camera: CameraState,
    pub wireframe: bool,
    pub lighting: bool,
}

impl DebugStats {
    fn camera_lines(&self) -> [String; 3] {
        let c = &self.camera;
        let (mode, angles) = match c.mode {
            CameraMode::FirstPerson => ("first-person", format!("yaw {:.1}°  pitch {:.1}°", c.x_angle, c.y_angle)),
            CameraMode::Orbit => ("orbit", format!("azimuth {:.1}°  polar {:.1}°", c.x_angle, c.y_angle)),
        };
        let header = match c.radius {
            Some(radius) => format!("Camera: {mode}  radius {radius:.2}"),
            None => format!("Camera: {mode}"),
        };
        [
            header,
            format!(
                "  pos ({:.2}, {:.2}, {:.2})  fwd ({:.2}, {:.2}, {:.2})",
                c.position.x, c.position.y, c.position.z,
                c.forward.x, c.forward.y, c.forward.z
            ),
            format!("  {angles}"),
        ]
    }
}

/// Accumulates frame times between once-per-second stat refreshes.
pub struct FrameTimer {
    frames: u32,
    total_ms: f32,
    min_ms: f32,
    max_ms: f32,
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self { frames: 0, total_ms: 0.0, min_ms: f32::MAX, max_ms: 0.0 }
    }
}

impl FrameTimer {
    pub fn record(&mut self, dt_ms: f32) {
        self.frames += 1;
        self.total_ms += dt_ms;
        self.min_ms = self.min_ms.min(dt_ms);
        self.max_ms = self.max_ms.max(dt_ms);
    }

    /// Returns (fps, avg, min, max) and starts a new window.
    pub fn flush(&mut self) -> (u32, f32, f32, f32) {
        let stats = if self.frames == 0 {
            (0, 0.0, 0.0, 0.0)
        } else {
            (self.frames, self.total_ms / self.frames as f32, self.min_ms, self.max_ms)
        };
        *self = Self::default();
        stats
    }
}

pub struct DebugOverlay {
    pub visible: bool,
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl DebugOverlay {
    pub fn new(
        window: &winit::window::Window,
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let egui_ctx = egui::Context::default();

        // Style: dark, semi-transparent, small monospace white font
        let mut visuals = egui::Visuals::dark();
        visuals.window_fill = egui::Color32::from_rgba_premultiplied(0, 0, 0, 180);
        visuals.window_stroke = egui::Stroke::NONE;
        visuals.window_shadow = Shadow::NONE;
        visuals.override_text_color = Some(egui::Color32::WHITE);
        egui_ctx.set_visuals(visuals);

        let mut style = (*egui_ctx.style()).clone();
        style.override_font_id = Some(egui::FontId::monospace(13.0));
        egui_ctx.set_style(style);

        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );

        let egui_renderer = egui_wgpu::Renderer::new(
            device,
            surface_format,
            None,  // drawn after the depth-tested plot pass
            1,
            false,
        );

        Self {
            visible: false,
            egui_ctx,
            egui_state,
            egui_renderer,
        }
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    pub fn handle_window_event(
        &mut self,
        window: &winit::window::Window,
        event: &winit::event::WindowEvent,
    ) -> egui_winit::EventResponse {
        self.egui_state.on_window_event(window, event)
    }

    /// Draw the stats panel on top of `view`. Still runs an (empty) egui frame when
    /// `stats` is `None` so texture frees are processed.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        window: &winit::window::Window,
        view: &wgpu::TextureView,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
        stats: Option<&DebugStats>,
    ) {
        let raw_input = self.egui_state.take_egui_input(window);

        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            let Some(stats) = stats else { return };
            egui::Area::new(egui::Id::new("debug_overlay"))
                .fixed_pos(egui::pos2(10.0, 10.0))
                .show(ctx, |ui| {
                    egui::Frame::none()
                        .fill(egui::Color32::from_rgba_premultiplied(0, 0, 0, 180))
                        .inner_margin(egui::Margin::same(8.0))
                        .rounding(4.0)
                        .show(ui, |ui: &mut egui::Ui| {
                            ui.label(format!("FPS: {}", stats.fps));
                            ui.label(format!(
                                "Frame: {:.2} ms (min: {:.1} | max: {:.1})",
                                stats.frame_time_avg_ms,
                                stats.frame_time_min_ms,
                                stats.frame_time_max_ms
                            ));
                            ui.label(format!("Draw calls: {}", stats.draw_calls));
                            ui.label(format!("Vertices: {}", stats.vertex_count));
                            ui.label(format!(
                                "Resolution: {} x {}",
                                stats.resolution.0, stats.resolution.1
                            ));
                            for line in stats.camera_lines() {
                                ui.label(line);
                            }
                            ui.label(format!(
                                "Wireframe: {}  Lighting: {}",
                                on_off(stats.wireframe),
                                on_off(stats.lighting)
                            ));
                        });
                });
        });

        self.egui_state
            .handle_platform_output(window, full_output.platform_output);

        let tris = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.egui_renderer
            .update_buffers(device, queue, encoder, &tris, screen_descriptor);

        {
            let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            self.egui_renderer
                .render(&mut render_pass.forget_lifetime(), &tris, screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn frame_timer_reports_and_resets() {
        let mut timer = FrameTimer::default();
        for ms in [10.0, 20.0, 30.0] {
            timer.record(ms);
        }
        assert_eq!(timer.flush(), (3, 20.0, 10.0, 30.0));
        assert_eq!(timer.flush(), (0, 0.0, 0.0, 0.0));
    }

    #[test]
    fn camera_lines_name_the_active_parameterization() {
        let mut stats = DebugStats {
            fps: 60,
            frame_time_avg_ms: 16.6,
            frame_time_min_ms: 16.0,
            frame_time_max_ms: 17.0,
            draw_calls: 2,
            vertex_count: 58812,
            resolution: (1440, 900),
            camera: CameraState {
                mode: CameraMode::Orbit,
                position: Vec3::new(0.0, 0.0, 10.0),
                forward: Vec3::NEG_Z,
                x_angle: 90.0,
                y_angle: 90.0,
                radius: Some(10.0),
            },
            wireframe: false,
            lighting: true,
        };
        let lines = stats.camera_lines();
        assert_eq!(lines[0], "Camera: orbit  radius 10.00");
        assert!(lines[2].contains("azimuth 90.0°"));

        stats.camera.mode = CameraMode::FirstPerson;
        stats.camera.radius = None;
        let lines = stats.camera_lines();
        assert_eq!(lines[0], "Camera: first-person");
        assert!(lines[2].contains("pitch 90.0°"));
    }
}
