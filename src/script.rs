//! User-code host: compiles the init/update scripts and invokes them with a
//! fixed calling convention.
//!
//! Scripts are rhai expression bodies. The init script sees the particle
//! index `i` and must evaluate to a map:
//!
//! ```rhai
//! #{ pos: [0.0, 0.0, 0.0], col: [1.0, 1.0, 1.0], siz: 5.0 }
//! ```
//!
//! The update script additionally sees `t` (seconds since the update script
//! last compiled), `pos`, `col` (3-element array copies of the particle's
//! pre-tick state) and `siz`, and must evaluate to the same map shape. When
//! velocity tracking is on, both scripts also deal in a `vel` key and the
//! update scope carries the current `vel`. A trailing `return #{...}` works
//! too.
//!
//! Compilation is parse-only and never executes the body. A failed compile
//! leaves the phase disabled (the simulation skips it) until the next good
//! compile. Invocation failures are reported per call and never escape as
//! panics.

use crate::error::ScriptError;
use crate::particles::ParticleState;
use glam::Vec3;
use rhai::{Array, Dynamic, Engine, Map, Scope, AST, INT};

/// Default init script: white dots of size 5 at the origin, at rest.
pub const DEFAULT_INIT: &str =
    "#{ pos: [0.0, 0.0, 0.0], col: [1.0, 1.0, 1.0], siz: 5.0, vel: [0.0, 0.0, 0.0] }";

/// Default update script for the plain (no velocity) variant: echo state.
pub const DEFAULT_UPDATE: &str = "#{ pos: pos, col: col, siz: siz }";

/// Default update script when velocity tracking is on.
pub const DEFAULT_UPDATE_VELOCITY: &str = "#{ pos: pos, col: col, siz: siz, vel: vel }";

/// Compiles and invokes the two user scripts.
///
/// Owns the rhai engine and one compiled-AST slot per phase. A slot is `None`
/// until a compile succeeds and becomes `None` again when a recompile fails.
pub struct ScriptHost {
    engine: Engine,
    init: Option<AST>,
    update: Option<AST>,
    track_velocity: bool,
}

impl ScriptHost {
    pub fn new(track_velocity: bool) -> Self {
        Self {
            engine: Engine::new(),
            init: None,
            update: None,
            track_velocity,
        }
    }

    /// Whether the `vel` key is part of the calling convention.
    #[inline]
    pub fn tracks_velocity(&self) -> bool {
        self.track_velocity
    }

    /// Whether an init script is currently compiled.
    #[inline]
    pub fn has_init(&self) -> bool {
        self.init.is_some()
    }

    /// Whether an update script is currently compiled.
    #[inline]
    pub fn has_update(&self) -> bool {
        self.update.is_some()
    }

    /// Replace the init script. On a parse error the init phase is disabled
    /// and the diagnostic is returned.
    pub fn set_init_source(&mut self, source: &str) -> Result<(), ScriptError> {
        match self.engine.compile(source) {
            Ok(ast) => {
                self.init = Some(ast);
                Ok(())
            }
            Err(e) => {
                self.init = None;
                Err(ScriptError::Compile(e.to_string()))
            }
        }
    }

    /// Replace the update script. On a parse error the update phase is
    /// disabled and the diagnostic is returned.
    pub fn set_update_source(&mut self, source: &str) -> Result<(), ScriptError> {
        match self.engine.compile(source) {
            Ok(ast) => {
                self.update = Some(ast);
                Ok(())
            }
            Err(e) => {
                self.update = None;
                Err(ScriptError::Compile(e.to_string()))
            }
        }
    }

    /// Invoke the init script for particle `i`.
    pub fn init_particle(&self, i: usize) -> Result<ParticleState, ScriptError> {
        let ast = self
            .init
            .as_ref()
            .ok_or_else(|| ScriptError::Runtime("no compiled init script".to_string()))?;
        let mut scope = Scope::new();
        scope.push("i", i as INT);
        let map = self.eval_to_map(ast, &mut scope)?;
        self.state_from_map(&map)
    }

    /// Invoke the update script for particle `i` at simulation time `t`,
    /// passing a copy of its pre-tick state.
    pub fn update_particle(
        &self,
        i: usize,
        t: f64,
        state: &ParticleState,
    ) -> Result<ParticleState, ScriptError> {
        let ast = self
            .update
            .as_ref()
            .ok_or_else(|| ScriptError::Runtime("no compiled update script".to_string()))?;
        let mut scope = Scope::new();
        scope.push("i", i as INT);
        scope.push("t", t);
        scope.push("pos", to_array(state.position));
        scope.push("col", to_array(state.color));
        scope.push("siz", state.size as f64);
        if self.track_velocity {
            scope.push("vel", to_array(state.velocity.unwrap_or(Vec3::ZERO)));
        }
        let map = self.eval_to_map(ast, &mut scope)?;
        self.state_from_map(&map)
    }

    fn eval_to_map(&self, ast: &AST, scope: &mut Scope) -> Result<Map, ScriptError> {
        let value = self
            .engine
            .eval_ast_with_scope::<Dynamic>(scope, ast)
            .map_err(|e| ScriptError::Runtime(e.to_string()))?;
        value.try_cast::<Map>().ok_or_else(|| {
            ScriptError::Shape(
                "expected a map like #{ pos: [..], col: [..], siz: .. }".to_string(),
            )
        })
    }

    fn state_from_map(&self, map: &Map) -> Result<ParticleState, ScriptError> {
        Ok(ParticleState {
            position: vec3_field(map, "pos")?,
            color: vec3_field(map, "col")?,
            size: scalar_field(map, "siz")?,
            velocity: if self.track_velocity {
                Some(vec3_field(map, "vel")?)
            } else {
                None
            },
        })
    }
}

fn to_array(v: Vec3) -> Array {
    vec![
        Dynamic::from_float(v.x as f64),
        Dynamic::from_float(v.y as f64),
        Dynamic::from_float(v.z as f64),
    ]
}

fn vec3_field(map: &Map, key: &str) -> Result<Vec3, ScriptError> {
    let value = map
        .get(key)
        .ok_or_else(|| ScriptError::Shape(format!("missing `{}`", key)))?;
    let arr = value
        .clone()
        .try_cast::<Array>()
        .ok_or_else(|| ScriptError::Shape(format!("`{}` must be a 3-element array", key)))?;
    if arr.len() != 3 {
        return Err(ScriptError::Shape(format!(
            "`{}` must have 3 elements, got {}",
            key,
            arr.len()
        )));
    }
    Ok(Vec3::new(
        number(&arr[0], key)?,
        number(&arr[1], key)?,
        number(&arr[2], key)?,
    ))
}

fn scalar_field(map: &Map, key: &str) -> Result<f32, ScriptError> {
    let value = map
        .get(key)
        .ok_or_else(|| ScriptError::Shape(format!("missing `{}`", key)))?;
    number(value, key)
}

/// Accept both rhai floats and ints wherever a number is expected.
fn number(value: &Dynamic, key: &str) -> Result<f32, ScriptError> {
    if let Some(f) = value.clone().try_cast::<f64>() {
        Ok(f as f32)
    } else if let Some(i) = value.clone().try_cast::<i64>() {
        Ok(i as f32)
    } else {
        Err(ScriptError::Shape(format!("`{}` must be numeric", key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_error_disables_phase() {
        let mut host = ScriptHost::new(false);
        host.set_update_source(DEFAULT_UPDATE).unwrap();
        assert!(host.has_update());

        let err = host.set_update_source("#{ pos: [,,, }").unwrap_err();
        assert!(matches!(err, ScriptError::Compile(_)));
        assert!(!host.has_update());
    }

    #[test]
    fn test_compile_does_not_execute() {
        let mut host = ScriptHost::new(false);
        // A body that would fail at runtime still compiles cleanly.
        host.set_init_source(r#"throw "boom""#).unwrap();
        assert!(host.has_init());

        let err = host.init_particle(0).unwrap_err();
        assert!(matches!(err, ScriptError::Runtime(_)));
    }

    #[test]
    fn test_init_receives_index() {
        let mut host = ScriptHost::new(false);
        host.set_init_source("#{ pos: [i.to_float(), 0.0, 0.0], col: [0, 0, 1], siz: 2 }")
            .unwrap();
        let state = host.init_particle(7).unwrap();
        assert_eq!(state.position, Vec3::new(7.0, 0.0, 0.0));
        // Integer literals are accepted where floats are expected.
        assert_eq!(state.color, Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(state.size, 2.0);
        assert_eq!(state.velocity, None);
    }

    #[test]
    fn test_update_receives_time_and_snapshot() {
        let mut host = ScriptHost::new(false);
        host.set_update_source("#{ pos: [t, pos[0] + 1.0, pos[2]], col: col, siz: siz * 2.0 }")
            .unwrap();
        let before = ParticleState {
            position: Vec3::new(10.0, 0.0, 3.0),
            color: Vec3::new(0.5, 0.5, 0.5),
            size: 4.0,
            velocity: None,
        };
        let after = host.update_particle(0, 1.5, &before).unwrap();
        assert_eq!(after.position, Vec3::new(1.5, 11.0, 3.0));
        assert_eq!(after.color, before.color);
        assert_eq!(after.size, 8.0);
    }

    #[test]
    fn test_explicit_return_works() {
        let mut host = ScriptHost::new(false);
        host.set_init_source("return #{ pos: [0.0, 1.0, 0.0], col: [1, 1, 1], siz: 3 };")
            .unwrap();
        let state = host.init_particle(0).unwrap();
        assert_eq!(state.position, Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_wrong_arity_is_shape_error() {
        let mut host = ScriptHost::new(false);
        host.set_init_source("#{ pos: [1.0, 2.0], col: [0, 0, 0], siz: 1 }")
            .unwrap();
        let err = host.init_particle(0).unwrap_err();
        assert!(matches!(err, ScriptError::Shape(_)));
    }

    #[test]
    fn test_missing_key_is_shape_error() {
        let mut host = ScriptHost::new(false);
        host.set_init_source("#{ pos: [0.0, 0.0, 0.0], col: [0, 0, 0] }")
            .unwrap();
        let err = host.init_particle(0).unwrap_err();
        assert!(matches!(err, ScriptError::Shape(_)));
    }

    #[test]
    fn test_non_map_return_is_shape_error() {
        let mut host = ScriptHost::new(false);
        host.set_init_source("42").unwrap();
        let err = host.init_particle(0).unwrap_err();
        assert!(matches!(err, ScriptError::Shape(_)));
    }

    #[test]
    fn test_velocity_required_when_tracked() {
        let mut host = ScriptHost::new(true);
        host.set_init_source("#{ pos: [0.0, 0.0, 0.0], col: [1, 1, 1], siz: 5 }")
            .unwrap();
        let err = host.init_particle(0).unwrap_err();
        assert!(matches!(err, ScriptError::Shape(_)));

        host.set_init_source(DEFAULT_INIT).unwrap();
        let state = host.init_particle(0).unwrap();
        assert_eq!(state.velocity, Some(Vec3::ZERO));
    }

    #[test]
    fn test_velocity_key_ignored_when_untracked() {
        let mut host = ScriptHost::new(false);
        host.set_init_source(DEFAULT_INIT).unwrap();
        let state = host.init_particle(0).unwrap();
        assert_eq!(state.velocity, None);
    }

    #[test]
    fn test_update_scope_carries_velocity() {
        let mut host = ScriptHost::new(true);
        host.set_update_source("#{ pos: pos, col: col, siz: siz, vel: [vel[0] * 2.0, 0.0, 0.0] }")
            .unwrap();
        let before = ParticleState {
            position: Vec3::ZERO,
            color: Vec3::ONE,
            size: 1.0,
            velocity: Some(Vec3::new(3.0, 0.0, 0.0)),
        };
        let after = host.update_particle(0, 0.0, &before).unwrap();
        assert_eq!(after.velocity, Some(Vec3::new(6.0, 0.0, 0.0)));
    }
}
