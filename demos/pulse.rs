//! Sprite-size modulation: a ring of dots breathing with `t`.

use scriptdust::Simulation;

fn main() {
    Simulation::new()
        .with_particle_count(360)
        .with_framerate(30.0)
        .with_init_source(
            r#"
            let a = i.to_float() * 0.01745;
            #{
                pos: [0.6 * a.cos(), 0.6 * a.sin(), 0.0],
                col: [1.0, 0.7, 0.2],
                siz: 3.0,
            }
            "#,
        )
        .with_update_source(
            r#"
            #{
                pos: pos,
                col: col,
                siz: 3.0 + 2.0 * (t * 4.0 + i.to_float() * 0.1).sin(),
            }
            "#,
        )
        .run()
        .unwrap();
}
