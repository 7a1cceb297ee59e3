//! Session builder and the windowed simulation loop.
//!
//! The loop is event-driven and single-threaded: winit delivers display
//! callbacks and input on one thread, the [`TickClock`] gates which callbacks
//! become simulation steps, and committed script edits apply between ticks,
//! never mid-tick. A disposed flag guards against callbacks that land after
//! teardown.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::error::{ConfigError, SimulationError};
use crate::gpu::GpuState;
use crate::live_edit::{LiveEdit, ScriptFiles, DEFAULT_DEBOUNCE};
use crate::particles::ParticleBuffer;
use crate::script::{ScriptHost, DEFAULT_INIT, DEFAULT_UPDATE, DEFAULT_UPDATE_VELOCITY};
use crate::tick;
use crate::time::TickClock;

/// A live-scripted visualizer session builder.
///
/// Use method chaining to configure, then call `.run()` to start.
///
/// ```ignore
/// use scriptdust::Simulation;
///
/// Simulation::new()
///     .with_particle_count(1000)
///     .with_framerate(60.0)
///     .with_update_source("#{ pos: [pos[0], (t * 2.0).sin() * 0.5, 0.0], col: col, siz: siz }")
///     .run()
///     .unwrap();
/// ```
pub struct Simulation {
    particle_count: usize,
    framerate: f32,
    track_velocity: bool,
    init_source: Option<String>,
    update_source: Option<String>,
    init_file: Option<PathBuf>,
    update_file: Option<PathBuf>,
    debounce: Duration,
}

impl Simulation {
    /// Create a session with default settings: 1000 particles at 60 logical
    /// steps per second, no velocity tracking, echo scripts.
    pub fn new() -> Self {
        Self {
            particle_count: 1000,
            framerate: 60.0,
            track_velocity: false,
            init_source: None,
            update_source: None,
            init_file: None,
            update_file: None,
            debounce: DEFAULT_DEBOUNCE,
        }
    }

    /// Set the number of particles. Fixed for the session.
    pub fn with_particle_count(mut self, count: usize) -> Self {
        self.particle_count = count;
        self
    }

    /// Set the logical simulation rate in steps per second. The display may
    /// refresh faster; extra callbacks only render.
    pub fn with_framerate(mut self, framerate: f32) -> Self {
        self.framerate = framerate;
        self
    }

    /// Track a per-particle velocity and integrate it: each tick stores the
    /// script's returned `pos + vel` and carries `vel` to the next tick.
    pub fn with_velocity(mut self, track: bool) -> Self {
        self.track_velocity = track;
        self
    }

    /// Set the starting init script source.
    pub fn with_init_source(mut self, source: impl Into<String>) -> Self {
        self.init_source = Some(source.into());
        self
    }

    /// Set the starting update script source.
    pub fn with_update_source(mut self, source: impl Into<String>) -> Self {
        self.update_source = Some(source.into());
        self
    }

    /// Load the scripts from files and hot-reload them on change. Saved
    /// edits flow through the same debounce as in-window editing.
    pub fn with_script_files(
        mut self,
        init: impl Into<PathBuf>,
        update: impl Into<PathBuf>,
    ) -> Self {
        self.init_file = Some(init.into());
        self.update_file = Some(update.into());
        self
    }

    /// Set the quiet period before an edit commits (default 3 s).
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.particle_count == 0 {
            return Err(ConfigError::InvalidCount(self.particle_count));
        }
        if !(self.framerate > 0.0) || !self.framerate.is_finite() {
            return Err(ConfigError::InvalidFramerate(self.framerate));
        }
        Ok(())
    }

    /// Run the session. Blocks until the window is closed.
    pub fn run(self) -> Result<(), SimulationError> {
        self.validate()?;

        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = App::new(self)?;
        event_loop.run_app(&mut app)?;
        Ok(())
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}

fn default_update_for(track_velocity: bool) -> &'static str {
    if track_velocity {
        DEFAULT_UPDATE_VELOCITY
    } else {
        DEFAULT_UPDATE
    }
}

struct App {
    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    host: ScriptHost,
    buffer: ParticleBuffer,
    clock: TickClock,
    live_edit: LiveEdit,
    script_files: ScriptFiles,
    disposed: bool,
    last_frame: Instant,
    mouse_pressed: bool,
    last_mouse_pos: Option<(f64, f64)>,
    #[cfg(feature = "egui")]
    panel: crate::editor::EditorPanel,
}

impl App {
    fn new(config: Simulation) -> Result<Self, SimulationError> {
        let script_files = ScriptFiles::new(config.init_file.clone(), config.update_file.clone());
        let (file_init, file_update) = script_files.baseline();

        let init_source = config
            .init_source
            .clone()
            .or_else(|| file_init.map(str::to_string))
            .unwrap_or_else(|| DEFAULT_INIT.to_string());
        let update_source = config
            .update_source
            .clone()
            .or_else(|| file_update.map(str::to_string))
            .unwrap_or_else(|| default_update_for(config.track_velocity).to_string());

        let mut host = ScriptHost::new(config.track_velocity);
        if let Err(e) = host.set_init_source(&init_source) {
            eprintln!("{}", e);
        }
        if let Err(e) = host.set_update_source(&update_source) {
            eprintln!("{}", e);
        }

        let mut buffer = ParticleBuffer::new(config.particle_count, config.track_velocity);
        let report = tick::seed(&host, &mut buffer);
        if let Some(err) = report.first_error {
            eprintln!(
                "init script failed for {} of {} particles: {}",
                report.failed,
                buffer.count(),
                err
            );
        }

        Ok(Self {
            window: None,
            gpu: None,
            host,
            buffer,
            clock: TickClock::new(config.framerate)?,
            live_edit: LiveEdit::new(config.debounce),
            script_files,
            disposed: false,
            last_frame: Instant::now(),
            mouse_pressed: false,
            last_mouse_pos: None,
            #[cfg(feature = "egui")]
            panel: crate::editor::EditorPanel::new(init_source, update_source),
        })
    }

    fn dispose(&mut self) {
        self.disposed = true;
        self.live_edit.cancel();
    }

    fn set_status(&mut self, msg: Option<String>) {
        #[cfg(feature = "egui")]
        {
            self.panel.status = msg;
        }
        #[cfg(not(feature = "egui"))]
        let _ = msg;
    }

    /// Re-run the init script over a cleared buffer and refresh the GPU copy.
    fn reseed(&mut self) {
        self.buffer.clear();
        let report = tick::seed(&self.host, &mut self.buffer);
        match report.first_error {
            Some(err) => {
                eprintln!(
                    "init script failed for {} of {} particles: {}",
                    report.failed,
                    self.buffer.count(),
                    err
                );
                self.set_status(Some(err));
            }
            None => self.set_status(None),
        }
        if let Some(gpu) = &self.gpu {
            gpu.upload_particles(self.buffer.as_bytes());
        }
    }

    /// Apply sources whose quiet period elapsed. Runs between ticks only.
    fn apply_committed_edits(&mut self, now: Instant) {
        let committed = self.live_edit.poll(now);
        if committed.is_empty() {
            return;
        }

        if let Some(source) = committed.update {
            match self.host.set_update_source(&source) {
                Ok(()) => {
                    // t is measured from the update script's last compile.
                    self.clock.reset_time();
                    self.set_status(None);
                }
                Err(e) => {
                    eprintln!("{}", e);
                    self.set_status(Some(e.to_string()));
                }
            }
        }

        if let Some(source) = committed.init {
            match self.host.set_init_source(&source) {
                Ok(()) => self.reseed(),
                Err(e) => {
                    eprintln!("{}", e);
                    self.set_status(Some(e.to_string()));
                }
            }
        }
    }

    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        if self.disposed {
            return;
        }
        let now = Instant::now();

        // Raw edit events from watched script files.
        if self.script_files.watches_anything() {
            let edits = self.script_files.poll(now);
            if let Some(text) = edits.init {
                self.live_edit.edit_init(text, now);
            }
            if let Some(text) = edits.update {
                self.live_edit.edit_update(text, now);
            }
        }

        // Raw edit events from the in-window editor.
        #[cfg(feature = "egui")]
        let ui_frame = {
            let window = self.window.clone();
            match (window, self.gpu.as_mut()) {
                (Some(window), Some(gpu)) => match gpu.egui.as_mut() {
                    Some(egui) => {
                        egui.begin_frame(&window);
                        let events = self.panel.show(&egui.ctx);
                        let frame = egui.end_frame(&window);
                        if events.init_edited {
                            self.live_edit.edit_init(self.panel.init_text.clone(), now);
                        }
                        if events.update_edited {
                            self.live_edit.edit_update(self.panel.update_text.clone(), now);
                        }
                        Some(frame)
                    }
                    None => None,
                },
                _ => None,
            }
        };

        // Recompiles take effect atomically between ticks.
        self.apply_committed_edits(now);

        // Gated simulation step.
        if let Some(t) = self.clock.try_tick_at(now) {
            let report = tick::step(&self.host, &mut self.buffer, t);
            if let Some(err) = report.first_error {
                // One line per tick, however many particles failed.
                eprintln!(
                    "update script failed for {} of {} particles: {}",
                    report.failed,
                    self.buffer.count(),
                    err
                );
                self.set_status(Some(err));
            }
            if report.updated > 0 {
                if let Some(gpu) = &self.gpu {
                    gpu.upload_particles(self.buffer.as_bytes());
                }
            }
        }

        // Render every display callback, accepted tick or not.
        let delta = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        if let Some(gpu) = self.gpu.as_mut() {
            let time = self.clock.elapsed() as f32;
            #[cfg(feature = "egui")]
            let result = gpu.render(time, delta, ui_frame);
            #[cfg(not(feature = "egui"))]
            let result = gpu.render(time, delta);
            match result {
                Ok(_) => {}
                Err(wgpu::SurfaceError::Lost) => gpu.resize(winit::dpi::PhysicalSize {
                    width: gpu.config.width,
                    height: gpu.config.height,
                }),
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    self.dispose();
                    event_loop.exit();
                }
                Err(e) => eprintln!("Render error: {:?}", e),
            }
        }
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let window_attrs = Window::default_attributes()
            .with_title("scriptdust")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                eprintln!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };
        self.window = Some(window.clone());

        match pollster::block_on(GpuState::new(
            window.clone(),
            self.buffer.as_bytes(),
            self.buffer.count() as u32,
        )) {
            Ok(gpu) => {
                #[cfg(feature = "egui")]
                let mut gpu = gpu;
                #[cfg(feature = "egui")]
                gpu.attach_egui(&window);
                self.gpu = Some(gpu);
            }
            Err(e) => {
                eprintln!("{}", e);
                event_loop.exit();
                return;
            }
        }
        window.request_redraw();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if self.disposed {
            return;
        }

        #[cfg(feature = "egui")]
        let egui_consumed = match (self.window.as_ref(), self.gpu.as_mut()) {
            (Some(window), Some(gpu)) => gpu
                .egui
                .as_mut()
                .map(|egui| egui.on_window_event(window, &event))
                .unwrap_or(false),
            _ => false,
        };
        #[cfg(not(feature = "egui"))]
        let egui_consumed = false;

        match event {
            WindowEvent::CloseRequested => {
                self.dispose();
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(physical_size);
                }
                // Viewport change is a reconfiguration: prior particle state
                // is discarded, not migrated.
                self.reseed();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Space),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } if !egui_consumed => {
                self.clock.toggle_pause_at(Instant::now());
            }
            WindowEvent::MouseInput { state, button, .. } if !egui_consumed => {
                if button == MouseButton::Left {
                    self.mouse_pressed = state == ElementState::Pressed;
                    if !self.mouse_pressed {
                        self.last_mouse_pos = None;
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } if !egui_consumed => {
                if self.mouse_pressed {
                    if let Some((last_x, last_y)) = self.last_mouse_pos {
                        let dx = position.x - last_x;
                        let dy = position.y - last_y;
                        if let Some(gpu) = &mut self.gpu {
                            gpu.camera.yaw -= dx as f32 * 0.005;
                            gpu.camera.pitch += dy as f32 * 0.005;
                            gpu.camera.pitch = gpu.camera.pitch.clamp(-1.5, 1.5);
                        }
                    }
                    self.last_mouse_pos = Some((position.x, position.y));
                }
            }
            WindowEvent::MouseWheel { delta, .. } if !egui_consumed => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
                };
                if let Some(gpu) = &mut self.gpu {
                    gpu.camera.distance -= scroll * 0.1;
                    gpu.camera.distance = gpu.camera.distance.clamp(0.2, 20.0);
                }
            }
            WindowEvent::RedrawRequested => {
                self.frame(event_loop);
            }
            _ => {}
        }
    }
}
