//! Falling particles using the velocity variant: the update script only
//! steers `vel`, and the loop integrates `pos + vel` each tick.

use scriptdust::Simulation;

fn main() {
    Simulation::new()
        .with_particle_count(2000)
        .with_framerate(60.0)
        .with_velocity(true)
        .with_init_source(
            r#"
            let x = (i * 7919 % 2000).to_float() / 1000.0 - 1.0;
            let y = (i * 104729 % 2000).to_float() / 1000.0 - 1.0;
            #{
                pos: [x, y, 0.0],
                col: [0.6, 0.8, 1.0],
                siz: 2.0,
                vel: [0.0, -0.002 - (i % 7).to_float() * 0.001, 0.0],
            }
            "#,
        )
        .with_update_source(
            r#"
            let p = if pos[1] < -1.0 { [pos[0], 1.0, 0.0] } else { pos };
            #{ pos: p, col: col, siz: siz, vel: vel }
            "#,
        )
        .run()
        .unwrap();
}
