//! In-window live editing (requires `--features egui`).
//!
//! Type into the side panel; the scripts recompile after a 3 second pause.

use scriptdust::Simulation;

fn main() {
    Simulation::new()
        .with_particle_count(1500)
        .with_framerate(60.0)
        .with_velocity(true)
        .with_init_source(
            r#"
            let a = i.to_float() * 2.399;
            #{
                pos: [0.5 * a.cos(), 0.5 * a.sin(), 0.0],
                col: [1.0, 1.0, 1.0],
                siz: 3.0,
                vel: [0.0, 0.0, 0.0],
            }
            "#,
        )
        .with_update_source(
            r#"
            let pull = 0.0005;
            #{
                pos: pos,
                col: col,
                siz: siz,
                vel: [vel[0] - pos[0] * pull, vel[1] - pos[1] * pull, 0.0],
            }
            "#,
        )
        .run()
        .unwrap();
}
