//! One simulation step, GPU-free.
//!
//! The simulation loop calls [`seed`] after every successful init compile and
//! [`step`] once per accepted tick. Both walk the particles in index order,
//! pass each script a copy of that particle's pre-tick state, and write the
//! result back in place. A failing invocation never aborts the rest of the
//! pass: the particle keeps its prior state and the failure is counted so the
//! caller can log a single diagnostic per tick.

use crate::particles::ParticleBuffer;
use crate::script::ScriptHost;

/// Outcome of a seeding or stepping pass.
#[derive(Debug, Default, Clone)]
pub struct PassReport {
    /// Particles whose script invocation succeeded.
    pub updated: usize,
    /// Particles whose script invocation failed (prior state retained).
    pub failed: usize,
    /// Diagnostic from the first failure, for once-per-tick logging.
    pub first_error: Option<String>,
}

impl PassReport {
    fn record_failure(&mut self, err: impl ToString) {
        self.failed += 1;
        if self.first_error.is_none() {
            self.first_error = Some(err.to_string());
        }
    }
}

/// Run the init script once per particle, in index order.
///
/// Failing particles stay zeroed (or keep whatever the previous seed left).
/// With no compiled init script this is a no-op and the buffer keeps its
/// current state.
pub fn seed(host: &ScriptHost, buf: &mut ParticleBuffer) -> PassReport {
    let mut report = PassReport::default();
    if !host.has_init() {
        return report;
    }
    for i in 0..buf.count() {
        match host.init_particle(i) {
            Ok(state) => {
                buf.write(i, &state);
                report.updated += 1;
            }
            Err(e) => report.record_failure(e),
        }
    }
    report
}

/// Run the update script once per particle at simulation time `t` and apply
/// the velocity-integration convention.
///
/// Each particle's snapshot is taken before its own update runs, and updates
/// are applied one particle at a time, so no script observes a neighbor's
/// post-tick state. When the buffer tracks velocity the stored position is
/// the returned `pos + vel` (component-wise) and the returned `vel` becomes
/// the velocity for the next tick; otherwise the returned `pos` is stored
/// directly. With no compiled update script this is a no-op.
pub fn step(host: &ScriptHost, buf: &mut ParticleBuffer, t: f64) -> PassReport {
    let mut report = PassReport::default();
    if !host.has_update() {
        return report;
    }
    for i in 0..buf.count() {
        let before = buf.read(i);
        match host.update_particle(i, t, &before) {
            Ok(mut state) => {
                if let Some(vel) = state.velocity {
                    state.position += vel;
                }
                buf.write(i, &state);
                report.updated += 1;
            }
            Err(e) => report.record_failure(e),
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::{DEFAULT_INIT, DEFAULT_UPDATE, DEFAULT_UPDATE_VELOCITY};
    use glam::Vec3;

    fn host_with(init: &str, update: &str, velocity: bool) -> ScriptHost {
        let mut host = ScriptHost::new(velocity);
        host.set_init_source(init).unwrap();
        host.set_update_source(update).unwrap();
        host
    }

    #[test]
    fn test_seed_matches_init_script_per_index() {
        let host = host_with(
            "#{ pos: [i.to_float(), 0.0, 0.0], col: [1, 1, 1], siz: 1 }",
            DEFAULT_UPDATE,
            false,
        );
        let mut buf = ParticleBuffer::new(5, false);
        let report = seed(&host, &mut buf);
        assert_eq!(report.updated, 5);
        assert_eq!(report.failed, 0);
        for i in 0..5 {
            assert_eq!(buf.read(i), host.init_particle(i).unwrap());
        }
    }

    #[test]
    fn test_step_invokes_once_per_index_with_pre_tick_state() {
        // Each particle doubles its own x; if any particle saw another's
        // post-tick state the sequence would break.
        let host = host_with(
            "#{ pos: [i.to_float() + 1.0, 0.0, 0.0], col: [1, 1, 1], siz: 1 }",
            "#{ pos: [pos[0] * 2.0, 0.0, 0.0], col: col, siz: siz }",
            false,
        );
        let mut buf = ParticleBuffer::new(4, false);
        seed(&host, &mut buf);
        let report = step(&host, &mut buf, 0.0);
        assert_eq!(report.updated, 4);
        for i in 0..4 {
            assert_eq!(buf.read(i).position.x, (i as f32 + 1.0) * 2.0);
        }
    }

    #[test]
    fn test_velocity_integration_law() {
        let host = host_with(
            "#{ pos: [0.0, 0.0, 0.0], col: [1, 1, 1], siz: 5, vel: [1.0, 0.0, 0.0] }",
            DEFAULT_UPDATE_VELOCITY,
            true,
        );
        let mut buf = ParticleBuffer::new(2, true);
        seed(&host, &mut buf);
        step(&host, &mut buf, 0.0);
        for i in 0..2 {
            let p = buf.read(i);
            assert_eq!(p.position, Vec3::new(1.0, 0.0, 0.0));
            assert_eq!(p.velocity, Some(Vec3::new(1.0, 0.0, 0.0)));
            assert_eq!(p.size, 5.0);
        }
        // Another tick advances by v again.
        step(&host, &mut buf, 0.1);
        assert_eq!(buf.read(0).position, Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn test_noop_update_is_idempotent() {
        let host = host_with(DEFAULT_INIT, DEFAULT_UPDATE_VELOCITY, true);
        let mut buf = ParticleBuffer::new(8, true);
        seed(&host, &mut buf);
        let snapshot = buf.as_floats().to_vec();
        for tick in 0..10 {
            step(&host, &mut buf, tick as f64 * 0.016);
        }
        assert_eq!(buf.as_floats(), snapshot.as_slice());
    }

    #[test]
    fn test_no_update_script_is_noop() {
        let mut host = ScriptHost::new(false);
        host.set_init_source("#{ pos: [1.0, 2.0, 3.0], col: [1, 1, 1], siz: 2 }")
            .unwrap();
        // Malformed update source: phase disabled.
        assert!(host.set_update_source("#{ pos: [ }").is_err());

        let mut buf = ParticleBuffer::new(3, false);
        seed(&host, &mut buf);
        let snapshot = buf.as_floats().to_vec();
        for _ in 0..5 {
            let report = step(&host, &mut buf, 0.0);
            assert_eq!(report.updated, 0);
        }
        assert_eq!(buf.as_floats(), snapshot.as_slice());
    }

    #[test]
    fn test_runtime_failure_retains_prior_state() {
        // Odd indices throw; even indices keep moving.
        let host = host_with(
            "#{ pos: [0.0, 0.0, 0.0], col: [1, 1, 1], siz: 1 }",
            r#"if i % 2 == 1 { throw "odd" } #{ pos: [pos[0] + 1.0, 0.0, 0.0], col: col, siz: siz }"#,
            false,
        );
        let mut buf = ParticleBuffer::new(4, false);
        seed(&host, &mut buf);
        let report = step(&host, &mut buf, 0.0);
        assert_eq!(report.updated, 2);
        assert_eq!(report.failed, 2);
        assert!(report.first_error.is_some());
        assert_eq!(buf.read(0).position.x, 1.0);
        assert_eq!(buf.read(1).position.x, 0.0);
        assert_eq!(buf.read(2).position.x, 1.0);
        assert_eq!(buf.read(3).position.x, 0.0);
    }

    #[test]
    fn test_seed_failure_leaves_particle_zeroed() {
        let host = host_with(
            r#"if i == 1 { throw "bad seed" } #{ pos: [5.0, 0.0, 0.0], col: [1, 1, 1], siz: 1 }"#,
            DEFAULT_UPDATE,
            false,
        );
        let mut buf = ParticleBuffer::new(3, false);
        let report = seed(&host, &mut buf);
        assert_eq!(report.updated, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(buf.read(0).position.x, 5.0);
        assert_eq!(buf.read(1).position.x, 0.0);
        assert_eq!(buf.read(2).position.x, 5.0);
    }
}
