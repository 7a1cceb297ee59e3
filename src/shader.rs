//! WGSL render shader for the point sprites.
//!
//! Each particle is drawn as a 6-vertex quad expanded in the vertex stage.
//! The corner offset is applied in clip space using the particle's size
//! *without* re-multiplying by `w`, so after the perspective divide the
//! sprite shrinks with depth. The fragment stage discards everything outside
//! the unit circle of the quad, producing a soft-edged circular dot.

/// Render shader: vertex quad expansion + circular fragment mask.
///
/// Vertex inputs match [`crate::particles`]'s interleaved layout: position at
/// location 0, color at 1, size at 2, instance-stepped.
pub const RENDER_SHADER: &str = r#"struct Uniforms {
    view_proj: mat4x4<f32>,
    time: f32,
    delta_time: f32,
    _pad: vec2<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec3<f32>,
    @location(1) uv: vec2<f32>,
};

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @location(0) particle_pos: vec3<f32>,
    @location(1) particle_color: vec3<f32>,
    @location(2) particle_size: f32,
) -> VertexOutput {
    var quad_vertices = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>( 1.0,  1.0),
    );

    let quad_pos = quad_vertices[vertex_index];

    let world_pos = vec4<f32>(particle_pos, 1.0);
    var clip_pos = uniforms.view_proj * world_pos;

    // Clip-space extent is not scaled by w: distant sprites come out smaller
    // after the perspective divide.
    let extent = particle_size * 0.01;
    clip_pos.x += quad_pos.x * extent;
    clip_pos.y += quad_pos.y * extent;

    var out: VertexOutput;
    out.clip_position = clip_pos;
    out.color = particle_color;
    out.uv = quad_pos;

    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let dist = length(in.uv);
    if dist > 1.0 {
        discard;
    }
    let alpha = 1.0 - smoothstep(0.5, 1.0, dist);
    return vec4<f32>(in.color, alpha);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use naga::front::wgsl;
    use naga::valid::{Capabilities, ValidationFlags, Validator};

    #[test]
    fn test_render_shader_validates() {
        let module = wgsl::parse_str(RENDER_SHADER)
            .unwrap_or_else(|e| panic!("WGSL parse error: {}", e.emit_to_string(RENDER_SHADER)));
        let mut validator = Validator::new(ValidationFlags::all(), Capabilities::all());
        validator
            .validate(&module)
            .unwrap_or_else(|e| panic!("WGSL validation error: {}", e));
    }
}
