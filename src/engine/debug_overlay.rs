use egui::epaint::Shadow;

use super::config::FlockingConfig;
use super::showcase::DemoKind;

pub struct DebugStats {
    pub fps: u32,
    pub frame_time_avg_ms: f32,
    pub frame_time_min_ms: f32,
    pub frame_time_max_ms: f32,
    pub demo: DemoKind,
    pub paused: bool,
    pub object_count: usize,
    /// Demo-specific status line (seed, cut count, attractor, ...).
    pub detail: String,
    pub draw_calls: u32,
    pub resolution: (u32, u32),
    pub camera_distance: f32,
}

/// What the user clicked this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlayActions {
    pub switch_to: Option<DemoKind>,
    pub toggle_pause: bool,
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
            None,  // drawn after the scene, no depth test
            1,
            false,
        );

        Self {
            visible: true,
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

    /// Render one egui frame:
    ///
    /// - `cut_path`: the stroke being drawn, in egui screen points. Always shown.
    /// - the stats panel with demo buttons, and flock sliders when `flocking`
    ///   is given. Shown while `visible`.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        window: &winit::window::Window,
        view: &wgpu::TextureView,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
        stats: &DebugStats,
        flocking: Option<&mut FlockingConfig>,
        cut_path: Option<&[egui::Pos2]>,
    ) -> OverlayActions {
        let raw_input = self.egui_state.take_egui_input(window);
        let visible = self.visible;
        let mut actions = OverlayActions::default();
        let mut flocking = flocking;

        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            if let Some(points) = cut_path {
                if points.len() >= 2 {
                    let painter = ctx.layer_painter(egui::LayerId::new(
                        egui::Order::Background,
                        egui::Id::new("cut_path"),
                    ));
                    painter.add(egui::Shape::line(
                        points.to_vec(),
                        egui::Stroke::new(3.0, egui::Color32::from_rgba_unmultiplied(255, 60, 60, 220)),
                    ));
                }
            }

            if !visible {
                return;
            }

            egui::Area::new(egui::Id::new("debug_overlay"))
                .fixed_pos(egui::pos2(10.0, 10.0))
                .show(ctx, |ui| {
                    egui::Frame::none()
                        .fill(egui::Color32::from_rgba_premultiplied(0, 0, 0, 180))
                        .inner_margin(egui::Margin::same(8.0))
                        .rounding(4.0)
                        .show(ui, |ui: &mut egui::Ui| {
                            ui.horizontal(|ui| {
                                for kind in DemoKind::ALL {
                                    if ui.selectable_label(stats.demo == kind, kind.label()).clicked() {
                                        actions.switch_to = Some(kind);
                                    }
                                }
                                let label = if stats.paused { "Resume" } else { "Pause" };
                                if ui.button(label).clicked() {
                                    actions.toggle_pause = true;
                                }
                            });
                            ui.label(format!("FPS: {}", stats.fps));
                            ui.label(format!(
                                "Frame: {:.2} ms (min: {:.1} | max: {:.1})",
                                stats.frame_time_avg_ms,
                                stats.frame_time_min_ms,
                                stats.frame_time_max_ms
                            ));
                            ui.label(format!("Objects: {}", stats.object_count));
                            ui.label(&stats.detail);
                            ui.label(format!("Draw calls: {}", stats.draw_calls));
                            ui.label(format!(
                                "Resolution: {} x {}  Camera dist {:.1}",
                                stats.resolution.0, stats.resolution.1, stats.camera_distance
                            ));

                            if let Some(cfg) = flocking.as_deref_mut() {
                                ui.separator();
                                ui.add(egui::Slider::new(&mut cfg.separation_weight, 0.0..=5.0).text("separation"));
                                ui.add(egui::Slider::new(&mut cfg.alignment_weight, 0.0..=5.0).text("alignment"));
                                ui.add(egui::Slider::new(&mut cfg.cohesion_weight, 0.0..=5.0).text("cohesion"));
                                ui.add(egui::Slider::new(&mut cfg.attraction_weight, 0.0..=2.0).text("attraction"));
                            }
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

        actions
    }
}
