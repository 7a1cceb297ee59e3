//! CPU-side particle storage.
//!
//! Particles live in one flat `Vec<f32>` with a fixed 7-float stride per
//! particle: `[0, 3)` position, `[3, 6)` color, `[6]` size. The layout is the
//! vertex-buffer layout; after a tick the whole vec is byte-cast and written
//! into the GPU buffer in one call. Velocity, when tracked, lives in a
//! parallel stride-3 vec that never reaches the GPU.

use glam::Vec3;

/// Floats per particle in the interleaved buffer.
pub const STRIDE: usize = 7;
/// Bytes per particle in the interleaved buffer.
pub const STRIDE_BYTES: usize = STRIDE * std::mem::size_of::<f32>();
/// Byte offset of the color attribute within a particle.
pub const COLOR_OFFSET_BYTES: usize = 3 * std::mem::size_of::<f32>();
/// Byte offset of the size attribute within a particle.
pub const SIZE_OFFSET_BYTES: usize = 6 * std::mem::size_of::<f32>();

/// One particle's state, copied out of or written into a [`ParticleBuffer`].
///
/// `velocity` is `Some` only for buffers that track velocity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleState {
    pub position: Vec3,
    pub color: Vec3,
    pub size: f32,
    pub velocity: Option<Vec3>,
}

impl ParticleState {
    /// The all-zero state every particle starts in before seeding.
    pub fn zeroed(track_velocity: bool) -> Self {
        Self {
            position: Vec3::ZERO,
            color: Vec3::ZERO,
            size: 0.0,
            velocity: track_velocity.then_some(Vec3::ZERO),
        }
    }
}

/// The interleaved particle buffer plus the optional velocity sidecar.
#[derive(Debug, Clone)]
pub struct ParticleBuffer {
    data: Vec<f32>,
    velocities: Option<Vec<f32>>,
    count: usize,
}

impl ParticleBuffer {
    /// Allocate a zeroed buffer for `count` particles.
    pub fn new(count: usize, track_velocity: bool) -> Self {
        Self {
            data: vec![0.0; count * STRIDE],
            velocities: track_velocity.then(|| vec![0.0; count * 3]),
            count,
        }
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn tracks_velocity(&self) -> bool {
        self.velocities.is_some()
    }

    /// Copy particle `i` out of the buffer.
    pub fn read(&self, i: usize) -> ParticleState {
        let base = i * STRIDE;
        ParticleState {
            position: Vec3::new(self.data[base], self.data[base + 1], self.data[base + 2]),
            color: Vec3::new(self.data[base + 3], self.data[base + 4], self.data[base + 5]),
            size: self.data[base + 6],
            velocity: self.velocities.as_ref().map(|v| {
                let vb = i * 3;
                Vec3::new(v[vb], v[vb + 1], v[vb + 2])
            }),
        }
    }

    /// Write particle `i` in place.
    ///
    /// On a velocity-tracking buffer a `None` velocity leaves the stored
    /// velocity untouched; on a non-tracking buffer any velocity is ignored.
    pub fn write(&mut self, i: usize, state: &ParticleState) {
        let base = i * STRIDE;
        self.data[base] = state.position.x;
        self.data[base + 1] = state.position.y;
        self.data[base + 2] = state.position.z;
        self.data[base + 3] = state.color.x;
        self.data[base + 4] = state.color.y;
        self.data[base + 5] = state.color.z;
        self.data[base + 6] = state.size;
        if let (Some(v), Some(vel)) = (self.velocities.as_mut(), state.velocity) {
            let vb = i * 3;
            v[vb] = vel.x;
            v[vb + 1] = vel.y;
            v[vb + 2] = vel.z;
        }
    }

    /// Zero every particle (and velocity) before a re-seed.
    pub fn clear(&mut self) {
        self.data.fill(0.0);
        if let Some(v) = &mut self.velocities {
            v.fill(0.0);
        }
    }

    /// The interleaved floats as bytes, ready for `Queue::write_buffer`.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    /// The raw interleaved floats (velocity excluded).
    pub fn as_floats(&self) -> &[f32] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_buffer_is_zeroed() {
        let buf = ParticleBuffer::new(4, true);
        for i in 0..4 {
            assert_eq!(buf.read(i), ParticleState::zeroed(true));
        }
        assert_eq!(buf.as_floats().len(), 4 * STRIDE);
    }

    #[test]
    fn test_write_read_roundtrip() {
        let mut buf = ParticleBuffer::new(3, true);
        let state = ParticleState {
            position: Vec3::new(1.0, 2.0, 3.0),
            color: Vec3::new(0.1, 0.2, 0.3),
            size: 7.5,
            velocity: Some(Vec3::new(-1.0, 0.5, 0.0)),
        };
        buf.write(1, &state);
        assert_eq!(buf.read(1), state);
        // Neighbors untouched.
        assert_eq!(buf.read(0), ParticleState::zeroed(true));
        assert_eq!(buf.read(2), ParticleState::zeroed(true));
    }

    #[test]
    fn test_layout_offsets() {
        let mut buf = ParticleBuffer::new(2, false);
        buf.write(
            1,
            &ParticleState {
                position: Vec3::new(10.0, 11.0, 12.0),
                color: Vec3::new(20.0, 21.0, 22.0),
                size: 30.0,
                velocity: None,
            },
        );
        let floats = buf.as_floats();
        assert_eq!(&floats[STRIDE..STRIDE + 3], &[10.0, 11.0, 12.0]);
        assert_eq!(
            &floats[STRIDE + COLOR_OFFSET_BYTES / 4..STRIDE + COLOR_OFFSET_BYTES / 4 + 3],
            &[20.0, 21.0, 22.0]
        );
        assert_eq!(floats[STRIDE + SIZE_OFFSET_BYTES / 4], 30.0);
    }

    #[test]
    fn test_bytes_reflect_latest_write() {
        let mut buf = ParticleBuffer::new(1, false);
        buf.write(
            0,
            &ParticleState {
                position: Vec3::new(1.0, 0.0, 0.0),
                color: Vec3::ONE,
                size: 2.0,
                velocity: None,
            },
        );
        assert_eq!(buf.as_bytes().len(), STRIDE_BYTES);
        let floats: &[f32] = bytemuck::cast_slice(buf.as_bytes());
        assert_eq!(floats[0], 1.0);
        assert_eq!(floats[6], 2.0);
    }

    #[test]
    fn test_velocity_not_interleaved() {
        let mut buf = ParticleBuffer::new(1, true);
        buf.write(
            0,
            &ParticleState {
                position: Vec3::ZERO,
                color: Vec3::ZERO,
                size: 0.0,
                velocity: Some(Vec3::new(9.0, 9.0, 9.0)),
            },
        );
        // Velocity is visible through read() but absent from the GPU floats.
        assert_eq!(buf.read(0).velocity, Some(Vec3::splat(9.0)));
        assert!(buf.as_floats().iter().all(|&f| f == 0.0));
    }

    #[test]
    fn test_none_velocity_keeps_stored_velocity() {
        let mut buf = ParticleBuffer::new(1, true);
        let mut state = ParticleState::zeroed(true);
        state.velocity = Some(Vec3::new(1.0, 2.0, 3.0));
        buf.write(0, &state);

        state.velocity = None;
        state.position = Vec3::new(5.0, 0.0, 0.0);
        buf.write(0, &state);
        assert_eq!(buf.read(0).velocity, Some(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(buf.read(0).position.x, 5.0);
    }

    #[test]
    fn test_clear() {
        let mut buf = ParticleBuffer::new(2, true);
        let mut state = ParticleState::zeroed(true);
        state.size = 4.0;
        state.velocity = Some(Vec3::ONE);
        buf.write(0, &state);
        buf.clear();
        assert_eq!(buf.read(0), ParticleState::zeroed(true));
    }
}
