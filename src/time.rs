//! Tick timing for the simulation loop.
//!
//! The render callback fires at display rate; [`TickClock`] decides which of
//! those callbacks become simulation steps. A step is accepted only when the
//! wall-clock delta since the last accepted step exceeds the configured frame
//! interval, which caps the logical rate at the target framerate no matter
//! how fast the display runs. Simulation time advances by the *actual* delta
//! rather than the nominal interval, so timing stays drift-correct under
//! variable refresh rates.

use crate::error::ConfigError;
use std::time::{Duration, Instant};

/// Fixed-logical-framerate gate and simulation time accumulator.
#[derive(Debug)]
pub struct TickClock {
    frame_interval: Duration,
    last_tick: Instant,
    sim_time: f64,
    tick_count: u64,
    paused: bool,
}

impl TickClock {
    /// Create a clock targeting `framerate` logical steps per second.
    pub fn new(framerate: f32) -> Result<Self, ConfigError> {
        Self::new_at(framerate, Instant::now())
    }

    /// Create a clock with an explicit start instant (deterministic tests).
    pub fn new_at(framerate: f32, now: Instant) -> Result<Self, ConfigError> {
        if !(framerate > 0.0) || !framerate.is_finite() {
            return Err(ConfigError::InvalidFramerate(framerate));
        }
        Ok(Self {
            frame_interval: Duration::from_secs_f64(1.0 / framerate as f64),
            last_tick: now,
            sim_time: 0.0,
            tick_count: 0,
            paused: false,
        })
    }

    /// Gate one display callback. Returns the new simulation time `t` when a
    /// step is accepted, `None` when the callback should only render.
    pub fn try_tick(&mut self) -> Option<f64> {
        self.try_tick_at(Instant::now())
    }

    /// [`TickClock::try_tick`] with an explicit now (deterministic tests).
    pub fn try_tick_at(&mut self, now: Instant) -> Option<f64> {
        if self.paused {
            return None;
        }
        let delta = now.saturating_duration_since(self.last_tick);
        if delta <= self.frame_interval {
            return None;
        }
        self.sim_time += delta.as_secs_f64();
        self.last_tick = now;
        self.tick_count += 1;
        Some(self.sim_time)
    }

    /// Restart simulation time at zero.
    ///
    /// Called when the update script recompiles: `t` is defined as seconds
    /// since the update function's last successful (re)compile.
    pub fn reset_time(&mut self) {
        self.sim_time = 0.0;
    }

    /// Accumulated simulation time in seconds.
    #[inline]
    pub fn elapsed(&self) -> f64 {
        self.sim_time
    }

    /// Accepted simulation steps so far.
    #[inline]
    pub fn ticks(&self) -> u64 {
        self.tick_count
    }

    /// The configured minimum interval between accepted steps.
    #[inline]
    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Stop accepting steps. Simulation time freezes.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume stepping. The pause gap is not added to simulation time.
    pub fn resume_at(&mut self, now: Instant) {
        if self.paused {
            self.paused = false;
            self.last_tick = now;
        }
    }

    pub fn toggle_pause_at(&mut self, now: Instant) {
        if self.paused {
            self.resume_at(now);
        } else {
            self.pause();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_rejects_bad_framerate() {
        assert!(TickClock::new(0.0).is_err());
        assert!(TickClock::new(-30.0).is_err());
        assert!(TickClock::new(f32::NAN).is_err());
        assert!(TickClock::new(60.0).is_ok());
    }

    #[test]
    fn test_subinterval_callbacks_are_rejected() {
        let start = Instant::now();
        let mut clock = TickClock::new_at(10.0, start).unwrap(); // 100ms interval
        assert_eq!(clock.try_tick_at(start + ms(50)), None);
        assert_eq!(clock.try_tick_at(start + ms(100)), None); // strictly greater required
        assert!(clock.try_tick_at(start + ms(101)).is_some());
    }

    #[test]
    fn test_time_advances_by_actual_delta() {
        let start = Instant::now();
        let mut clock = TickClock::new_at(10.0, start).unwrap();
        let t = clock.try_tick_at(start + ms(130)).unwrap();
        assert!((t - 0.130).abs() < 1e-9);
        // Next accepted tick measures from the last accepted one.
        let t = clock.try_tick_at(start + ms(260)).unwrap();
        assert!((t - 0.260).abs() < 1e-9);
    }

    #[test]
    fn test_tick_rate_ceiling() {
        // Display at 100 Hz, target 10 Hz: at most 10 steps in one second.
        let start = Instant::now();
        let mut clock = TickClock::new_at(10.0, start).unwrap();
        let mut accepted = 0;
        for i in 1..=100 {
            if clock.try_tick_at(start + ms(10 * i)).is_some() {
                accepted += 1;
            }
        }
        assert!(accepted <= 10, "accepted {} steps", accepted);
        assert!(accepted >= 9);
        assert_eq!(clock.ticks(), accepted);
    }

    #[test]
    fn test_reset_time() {
        let start = Instant::now();
        let mut clock = TickClock::new_at(10.0, start).unwrap();
        clock.try_tick_at(start + ms(150));
        assert!(clock.elapsed() > 0.0);
        clock.reset_time();
        assert_eq!(clock.elapsed(), 0.0);
        // Gating state survives the reset.
        assert_eq!(clock.ticks(), 1);
    }

    #[test]
    fn test_pause_freezes_time() {
        let start = Instant::now();
        let mut clock = TickClock::new_at(10.0, start).unwrap();
        clock.try_tick_at(start + ms(150));
        let frozen = clock.elapsed();

        clock.pause();
        assert_eq!(clock.try_tick_at(start + ms(500)), None);
        assert_eq!(clock.elapsed(), frozen);

        // The pause gap does not leak into simulation time.
        clock.resume_at(start + ms(1000));
        let t = clock.try_tick_at(start + ms(1150)).unwrap();
        assert!((t - (frozen + 0.150)).abs() < 1e-9);
    }
}
