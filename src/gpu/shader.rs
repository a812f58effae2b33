/// WGSL source of the terrain pipeline.
///
/// Entry points: `vs_main`/`fs_main` for the lit pass and `vs_shadow` for the
/// depth-only sun pass. The math matches the CPU stages in this crate with
/// the default [`crate::ShadingConfig`] baked in.
pub const SHADER: &str = r#"
struct GlobalUniform {
    view_proj: mat4x4<f32>,
    light_view_proj: mat4x4<f32>,
    cam_pos: vec4<f32>,
    sun_dir: vec4<f32>,
}

struct LocalUniform {
    model: mat4x4<f32>,
    params: vec4<f32>,
}

@group(0) @binding(0) var<uniform> globals: GlobalUniform;
@group(0) @binding(1) var shadow_map: texture_depth_2d;
@group(0) @binding(2) var shadow_sampler: sampler_comparison;

@group(1) @binding(0) var<uniform> local: LocalUniform;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) color: vec3<f32>,
    @location(2) normal: vec3<f32>,
}

struct VertexOutput {
    @builtin(position) clip_pos: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) color: vec3<f32>,
    @location(3) shadow_pos: vec3<f32>,
}

const SUN_COLOR: vec3<f32> = vec3<f32>(1.6, 1.5, 1.3);
const SKY_COLOR: vec3<f32> = vec3<f32>(0.35, 0.5, 0.75);
const GROUND_COLOR: vec3<f32> = vec3<f32>(0.15, 0.12, 0.1);
const SHADOW_STRENGTH: f32 = 0.85;
const NORMAL_OFFSET: f32 = 0.05;
const FOG_DENSITY: f32 = 0.0015;
const GAMMA: f32 = 2.2;

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let world = local.model * vec4<f32>(input.position, 1.0);
    let model3 = mat3x3<f32>(local.model[0].xyz, local.model[1].xyz, local.model[2].xyz);
    let normal = normalize(model3 * input.normal);

    out.clip_pos = globals.view_proj * world;
    out.world_pos = world.xyz;
    out.world_normal = normal;
    out.color = input.color;

    let light_clip = globals.light_view_proj * vec4<f32>(world.xyz + normal * NORMAL_OFFSET, 1.0);
    out.shadow_pos = vec3<f32>(
        light_clip.x * 0.5 + 0.5,
        -light_clip.y * 0.5 + 0.5,
        light_clip.z,
    );
    return out;
}

@vertex
fn vs_shadow(input: VertexInput) -> @builtin(position) vec4<f32> {
    return globals.view_proj * local.model * vec4<f32>(input.position, 1.0);
}

fn fetch_shadow(shadow_pos: vec3<f32>, n_dot_l: f32) -> f32 {
    if (shadow_pos.z > 1.0 || shadow_pos.x < 0.0 || shadow_pos.x > 1.0
        || shadow_pos.y < 0.0 || shadow_pos.y > 1.0) {
        return 1.0;
    }
    let bias = max(0.0005 * (1.0 - n_dot_l), 0.0001);
    let compared = shadow_pos.z - bias;
    let texel = 1.0 / vec2<f32>(textureDimensions(shadow_map));

    var visibility = 0.0;
    var total = 0.0;
    for (var y = -1; y <= 1; y++) {
        for (var x = -1; x <= 1; x++) {
            let offset = vec2<f32>(f32(x), f32(y));
            let weight = exp(-dot(offset, offset) * 1.5);
            visibility += weight * textureSampleCompareLevel(
                shadow_map, shadow_sampler, shadow_pos.xy + offset * texel, compared);
            total += weight;
        }
    }
    return visibility / total;
}

fn hash2(p: vec2<f32>) -> f32 {
    return fract(sin(dot(p, vec2<f32>(12.9898, 78.233))) * 43758.5453);
}

fn detail_noise(p: vec3<f32>, n: vec3<f32>) -> f32 {
    var w = pow(abs(n), vec3<f32>(16.0));
    w = w / (w.x + w.y + w.z);
    let v = hash2(p.yz) * w.x + hash2(p.xz) * w.y + hash2(p.xy) * w.z;
    return v * 2.0 - 1.0;
}

fn tonemap(v: vec3<f32>) -> vec3<f32> {
    return clamp((v * (2.51 * v + 0.03)) / (v * (2.43 * v + 0.59) + 0.14), vec3<f32>(0.0), vec3<f32>(1.0));
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let opacity = local.params.x;
    if (opacity < 1.0) {
        let threshold = fract(dot(vec2<f32>(171.0, 231.0), input.clip_pos.xy) / 71.0);
        if (threshold > opacity) {
            discard;
        }
    }

    let n = normalize(input.world_normal);
    let l = globals.sun_dir.xyz;
    let v = normalize(globals.cam_pos.xyz - input.world_pos);

    let linear_color = pow(input.color, vec3<f32>(GAMMA));
    let albedo = linear_color * (1.0 + 0.03 * detail_noise(input.world_pos, n));

    let n_dot_l = max(dot(n, l), 0.0);
    let shadow = mix(1.0 - SHADOW_STRENGTH, 1.0, fetch_shadow(input.shadow_pos, n_dot_l));
    let direct = SUN_COLOR * n_dot_l * shadow;

    let hemi = dot(n, normalize(input.world_pos)) * 0.5 + 0.5;
    let ambient = mix(GROUND_COLOR, SKY_COLOR, hemi);

    let fresnel = pow(1.0 - max(dot(n, v), 0.0), 3.0);
    let rim = SKY_COLOR * fresnel * 0.2 * shadow;

    let lit = albedo * (direct + ambient + rim);

    let dist = length(globals.cam_pos.xyz - input.world_pos);
    let d = dist * FOG_DENSITY;
    let fog_factor = clamp(1.0 - exp(-d * d * 0.5), 0.0, 1.0);
    let fog_color = mix(SKY_COLOR * 0.8, vec3<f32>(0.7, 0.8, 0.9), 0.2);
    let fogged = mix(lit, fog_color, fog_factor);

    let display = pow(tonemap(fogged), vec3<f32>(1.0 / GAMMA));
    return vec4<f32>(display, 1.0);
}
"#;
