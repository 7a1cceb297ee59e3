//! In-window script editor (optional, behind the `egui` feature).
//!
//! Provides the egui/winit/wgpu glue plus a side panel with two code editors,
//! one per script. Every keystroke is reported as a raw edit event; the
//! debounce in [`crate::live_edit::LiveEdit`] decides when a recompile
//! actually happens, exactly as with file-based editing.

use std::sync::Arc;
use winit::window::Window;

/// Egui integration state.
///
/// Wraps egui context, winit state, and wgpu renderer.
pub struct EguiIntegration {
    pub ctx: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
}

/// Output from egui frame processing.
pub struct EguiFrameOutput {
    pub paint_jobs: Vec<egui::ClippedPrimitive>,
    pub textures_delta: egui::TexturesDelta,
    pub pixels_per_point: f32,
}

impl EguiIntegration {
    pub fn new(
        device: &wgpu::Device,
        output_format: wgpu::TextureFormat,
        window: &Arc<Window>,
    ) -> Self {
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

        Self { ctx, state, renderer }
    }

    /// Process a winit event.
    ///
    /// Returns true if egui consumed the event (don't pass to camera
    /// controls).
    pub fn on_window_event(
        &mut self,
        window: &Window,
        event: &winit::event::WindowEvent,
    ) -> bool {
        let response = self.state.on_window_event(window, event);
        response.consumed
    }

    /// Begin a new frame. Call before the UI code.
    pub fn begin_frame(&mut self, window: &Window) {
        let raw_input = self.state.take_egui_input(window);
        self.ctx.begin_pass(raw_input);
    }

    /// End the frame and get the output for rendering.
    pub fn end_frame(&mut self, window: &Window) -> EguiFrameOutput {
        let full_output = self.ctx.end_pass();

        self.state
            .handle_platform_output(window, full_output.platform_output);

        let paint_jobs = self
            .ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        EguiFrameOutput {
            paint_jobs,
            textures_delta: full_output.textures_delta,
            pixels_per_point: full_output.pixels_per_point,
        }
    }

    /// Prepare textures and buffers for rendering. Call before creating the
    /// egui render pass.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        output: &EguiFrameOutput,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        for (id, image_delta) in &output.textures_delta.set {
            self.renderer.update_texture(device, queue, *id, image_delta);
        }
        self.renderer
            .update_buffers(device, queue, encoder, &output.paint_jobs, screen_descriptor);
    }

    /// Get a reference to the renderer for direct rendering.
    pub fn renderer(&self) -> &egui_wgpu::Renderer {
        &self.renderer
    }

    /// Free textures after the frame is done.
    pub fn cleanup(&mut self, output: &EguiFrameOutput) {
        for id in &output.textures_delta.free {
            self.renderer.free_texture(id);
        }
    }
}

/// Raw edit events produced by one panel pass.
#[derive(Debug, Default)]
pub struct PanelEvents {
    pub init_edited: bool,
    pub update_edited: bool,
}

/// The two-textarea editor panel.
pub struct EditorPanel {
    pub init_text: String,
    pub update_text: String,
    /// Last compile/runtime diagnostic, shown under the editors.
    pub status: Option<String>,
}

impl EditorPanel {
    pub fn new(init_text: String, update_text: String) -> Self {
        Self {
            init_text,
            update_text,
            status: None,
        }
    }

    /// Draw the panel. Returns which sources were edited this pass; the
    /// caller feeds those into the debounce controller.
    pub fn show(&mut self, ctx: &egui::Context) -> PanelEvents {
        let mut events = PanelEvents::default();

        egui::SidePanel::left("script_editor")
            .default_width(360.0)
            .show(ctx, |ui| {
                ui.heading("init");
                ui.label("runs once per particle: i -> #{ pos, col, siz[, vel] }");
                let init = ui.add(
                    egui::TextEdit::multiline(&mut self.init_text)
                        .code_editor()
                        .desired_rows(8)
                        .desired_width(f32::INFINITY),
                );
                events.init_edited = init.changed();

                ui.separator();
                ui.heading("update");
                ui.label("runs every tick: i, t, pos, col, siz[, vel] -> same shape");
                let update = ui.add(
                    egui::TextEdit::multiline(&mut self.update_text)
                        .code_editor()
                        .desired_rows(12)
                        .desired_width(f32::INFINITY),
                );
                events.update_edited = update.changed();

                ui.separator();
                match &self.status {
                    Some(msg) => {
                        ui.colored_label(egui::Color32::LIGHT_RED, msg);
                    }
                    None => {
                        ui.weak("scripts ok - edits apply after a 3s pause");
                    }
                }
            });

        events
    }
}
