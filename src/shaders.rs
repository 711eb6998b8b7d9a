//! GLSL sources for the SDF raymarch pipeline.
//!
//! All shaders target GLSL 1.40 (OpenGL 3.1), which is widely supported on
//! desktop platforms and maps directly onto WebGL2-class hosts.
//!
//! The geometry is a single fullscreen triangle; all scene work happens in
//! the fragment stage, which marches a ray through the volume bounded by
//! `u_bounds_min`/`u_bounds_max`. The distance field itself is evaluated
//! in-shader; voxel streaming from an external SDF evaluator plugs in at
//! the `scene_distance` function.

/// Vertex shader for the fullscreen raymarch triangle.
///
/// Passes the clip-space position through and hands the fragment stage a
/// normalized-device-coordinate position for ray reconstruction.
///
/// # Attributes
///
/// | Name         | Type   | Description                          |
/// |--------------|--------|--------------------------------------|
/// | `a_position` | `vec2` | Clip-space corner of the triangle    |
pub const SDF_VERTEX_SRC: &str = r"#version 140

in vec2 a_position;

out vec2 v_ndc;

void main() {
    v_ndc = a_position;
    gl_Position = vec4(a_position, 0.0, 1.0);
}
";

/// Fragment shader that raymarches the signed distance field.
///
/// Rays are reconstructed by unprojecting the fragment's NDC position
/// through the inverse view-projection matrix. Marching is clipped to the
/// volume bounds with a slab test; fragments whose rays miss the volume
/// are discarded so the clear color shows through.
///
/// # Uniforms
///
/// | Name              | Type    | Description                                |
/// |-------------------|---------|--------------------------------------------|
/// | `u_view_proj_inv` | `mat4`  | Inverse of the camera view-projection      |
/// | `u_camera_pos`    | `vec3`  | Camera position in world space             |
/// | `u_resolution`    | `vec2`  | Viewport size in backing-store pixels      |
/// | `u_bounds_min`    | `vec3`  | Minimum corner of the SDF bounding volume  |
/// | `u_bounds_max`    | `vec3`  | Maximum corner of the SDF bounding volume  |
/// | `u_threshold`     | `float` | Isosurface threshold within the field      |
/// | `u_tint`          | `vec4`  | Base surface color tint (linear space)     |
/// | `u_time`          | `float` | Milliseconds since start, for animation    |
pub const SDF_FRAGMENT_SRC: &str = r"#version 140

in vec2 v_ndc;

uniform mat4 u_view_proj_inv;
uniform vec3 u_camera_pos;
uniform vec2 u_resolution;
uniform vec3 u_bounds_min;
uniform vec3 u_bounds_max;
uniform float u_threshold;
uniform vec4 u_tint;
uniform float u_time;

out vec4 frag_color;

const int MAX_STEPS = 128;
const float HIT_EPSILON = 1e-3;

// Placeholder analytic field: a sphere smoothly blended with a box,
// slowly orbiting. An external evaluator replaces this distance function.
float scene_distance(vec3 p) {
    float angle = u_time * 2e-4;
    float c = cos(angle);
    float s = sin(angle);
    p.xz = mat2(c, -s, s, c) * p.xz;

    float sphere = length(p - vec3(0.6, 0.0, 0.0)) - 0.7;
    vec3 q = abs(p + vec3(0.5, 0.0, 0.0)) - vec3(0.5);
    float box = length(max(q, 0.0)) + min(max(q.x, max(q.y, q.z)), 0.0);

    // Polynomial smooth minimum.
    float k = 0.25;
    float h = clamp(0.5 + 0.5 * (box - sphere) / k, 0.0, 1.0);
    return mix(box, sphere, h) - k * h * (1.0 - h) - u_threshold;
}

vec3 scene_normal(vec3 p) {
    const vec2 e = vec2(1e-3, 0.0);
    return normalize(vec3(
        scene_distance(p + e.xyy) - scene_distance(p - e.xyy),
        scene_distance(p + e.yxy) - scene_distance(p - e.yxy),
        scene_distance(p + e.yyx) - scene_distance(p - e.yyx)));
}

// Slab test against the volume bounds. Returns (t_near, t_far); the ray
// misses when t_near > t_far.
vec2 intersect_bounds(vec3 origin, vec3 dir) {
    vec3 inv = 1.0 / dir;
    vec3 t0 = (u_bounds_min - origin) * inv;
    vec3 t1 = (u_bounds_max - origin) * inv;
    vec3 t_min = min(t0, t1);
    vec3 t_max = max(t0, t1);
    float near = max(max(t_min.x, t_min.y), t_min.z);
    float far = min(min(t_max.x, t_max.y), t_max.z);
    return vec2(near, far);
}

void main() {
    vec4 far_point = u_view_proj_inv * vec4(v_ndc, 1.0, 1.0);
    vec3 ray_dir = normalize(far_point.xyz / far_point.w - u_camera_pos);

    vec2 slab = intersect_bounds(u_camera_pos, ray_dir);
    if (slab.x > slab.y || slab.y < 0.0) {
        discard;
    }

    float t = max(slab.x, 0.0);
    for (int i = 0; i < MAX_STEPS; i++) {
        vec3 p = u_camera_pos + ray_dir * t;
        float d = scene_distance(p);
        if (d < HIT_EPSILON) {
            vec3 n = scene_normal(p);
            vec3 light_dir = normalize(vec3(-1.0, -1.0, -1.0));
            float diffuse = max(dot(n, -light_dir), 0.0);
            vec3 color = u_tint.rgb * (0.4 + 2.0 * diffuse / (1.0 + 2.0 * diffuse));
            frag_color = vec4(color, u_tint.a);
            return;
        }
        t += d;
        if (t > slab.y) {
            break;
        }
    }
    discard;
}
";
