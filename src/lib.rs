//! # scriptdust - live-scripted particle visualizer
//!
//! Edit two short scripts while the window is running and watch a field of
//! GPU point sprites react. The `init` script runs once per particle to seed
//! its state; the `update` script runs once per particle per tick to produce
//! the next position, color, and size.
//!
//! ## Quick Start
//!
//! ```ignore
//! use scriptdust::Simulation;
//!
//! Simulation::new()
//!     .with_particle_count(2000)
//!     .with_framerate(60.0)
//!     .with_init_source(
//!         "#{ pos: [0.0, 0.0, 0.0], col: [1.0, 1.0, 1.0], siz: 4.0 }",
//!     )
//!     .with_update_source(
//!         "let a = i.to_float() * 0.618 + t;
//!          #{ pos: [a.cos() * 0.5, a.sin() * 0.5, 0.0], col: col, siz: siz }",
//!     )
//!     .run()
//!     .unwrap();
//! ```
//!
//! ## Scripts
//!
//! Scripts are rhai expression bodies that evaluate to a map. The calling
//! convention is fixed:
//!
//! | phase  | scope                                   | must return                          |
//! |--------|-----------------------------------------|--------------------------------------|
//! | init   | `i`                                     | `#{ pos, col, siz }` (+ `vel`)       |
//! | update | `i`, `t`, `pos`, `col`, `siz` (+ `vel`) | same shape                           |
//!
//! `i` is the 0-based particle index, `t` the seconds since the update
//! script's last successful compile, `pos`/`col`/`vel` 3-element arrays and
//! `siz` a number. The `vel` column applies when the session is built
//! `.with_velocity(true)`: each tick then stores `pos + vel` and carries the
//! returned `vel` forward.
//!
//! ## Live editing
//!
//! Edits never apply mid-tick. Raw edit events (keystrokes in the `egui`
//! feature's in-window editor, or saves to files watched via
//! [`Simulation::with_script_files`]) are debounced: only after a quiet
//! period does the last text commit and recompile. A broken script disables
//! just its phase - a bad update freezes particles, a bad init keeps the
//! previous seed - and the window stays live for the next edit.
//!
//! ## Timing
//!
//! The display callback fires at refresh rate; a simulation step is accepted
//! only when the wall-clock delta since the last accepted step exceeds the
//! configured frame interval. Simulation time advances by the actual delta,
//! so logical timing stays drift-correct however fast the display runs.

pub mod error;
pub mod gpu;
pub mod live_edit;
pub mod particles;
pub mod script;
pub mod shader;
mod simulation;
pub mod tick;
pub mod time;

#[cfg(feature = "egui")]
pub mod editor;

pub use error::{ConfigError, GpuError, ScriptError, SimulationError};
pub use glam::Vec3;
pub use live_edit::{LiveEdit, ScriptFiles, DEFAULT_DEBOUNCE};
pub use particles::{ParticleBuffer, ParticleState, STRIDE};
pub use script::{ScriptHost, DEFAULT_INIT, DEFAULT_UPDATE, DEFAULT_UPDATE_VELOCITY};
pub use simulation::Simulation;
pub use time::TickClock;

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use scriptdust::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{ConfigError, ScriptError, SimulationError};
    pub use crate::live_edit::LiveEdit;
    pub use crate::particles::{ParticleBuffer, ParticleState};
    pub use crate::script::ScriptHost;
    pub use crate::simulation::Simulation;
    pub use crate::tick::{seed, step};
    pub use crate::time::TickClock;
    pub use crate::Vec3;
}
