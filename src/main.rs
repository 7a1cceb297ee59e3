use scriptdust::{Simulation, SimulationError};

const INIT: &str = r#"
let a = i.to_float() * 0.618;
#{
    pos: [0.0, 0.0, 0.0],
    col: [0.5 + 0.5 * a.sin(), 0.5 + 0.5 * a.cos(), 1.0],
    siz: 4.0,
}
"#;

const UPDATE: &str = r#"
let a = i.to_float() * 0.618 + t;
let r = 0.6 * i.to_float() / 1000.0;
#{
    pos: [r * a.cos(), r * a.sin(), 0.0],
    col: col,
    siz: siz,
}
"#;

/// Run `scriptdust <init.rhai> <update.rhai>` to live-edit the scripts from
/// disk (saves hot-reload after a short pause), or no arguments for the
/// built-in swirl.
fn main() -> Result<(), SimulationError> {
    let mut args = std::env::args().skip(1);
    let sim = match (args.next(), args.next()) {
        (Some(init), Some(update)) => Simulation::new().with_script_files(init, update),
        _ => Simulation::new()
            .with_init_source(INIT)
            .with_update_source(UPDATE),
    };
    sim.with_particle_count(1000).with_framerate(60.0).run()
}
