/// WGSL for every rig draw: ground grid lines and instanced cubes.
///
/// Both use the same vertex and instance layout. The grid is one instance
/// placed at the ground pose; its vertices carry a zero normal and stay unlit.
pub const RIG_SHADER: &str = r#"
struct Frame {
    view_proj: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> frame: Frame;

struct MeshVertex {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct Placement {
    @location(2) model_0: vec4<f32>,
    @location(3) model_1: vec4<f32>,
    @location(4) model_2: vec4<f32>,
    @location(5) model_3: vec4<f32>,
    @location(6) color: vec4<f32>,
};

struct Shaded {
    @builtin(position) clip: vec4<f32>,
    @location(0) color: vec4<f32>,
};

fn shade(normal: vec3<f32>) -> f32 {
    let sun = normalize(vec3<f32>(0.3, 1.0, 0.5));
    return 0.35 + 0.65 * max(dot(normal, sun), 0.0);
}

@vertex
fn vs_main(mesh: MeshVertex, at: Placement) -> Shaded {
    let model = mat4x4<f32>(at.model_0, at.model_1, at.model_2, at.model_3);
    var light = 1.0;
    if (dot(mesh.normal, mesh.normal) > 0.0) {
        light = shade(normalize((model * vec4<f32>(mesh.normal, 0.0)).xyz));
    }
    var out: Shaded;
    out.clip = frame.view_proj * model * vec4<f32>(mesh.position, 1.0);
    out.color = vec4<f32>(at.color.rgb * light, at.color.a);
    return out;
}

@fragment
fn fs_main(in: Shaded) -> @location(0) vec4<f32> {
    return in.color;
}
"#;
