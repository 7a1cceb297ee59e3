//! A rotating spiral driven entirely by the update script.

use scriptdust::Simulation;

fn main() {
    Simulation::new()
        .with_particle_count(4000)
        .with_framerate(60.0)
        .with_init_source(
            r#"
            #{
                pos: [0.0, 0.0, 0.0],
                col: [1.0, 1.0, 1.0],
                siz: 2.5,
            }
            "#,
        )
        .with_update_source(
            r#"
            let f = i.to_float() / 4000.0;
            let a = f * 50.0 + t * 0.4;
            let r = 0.8 * f;
            #{
                pos: [r * a.cos(), r * a.sin(), 0.3 * (f * 12.0 + t).sin()],
                col: [f, 0.4, 1.0 - f],
                siz: siz,
            }
            "#,
        )
        .run()
        .unwrap();
}
