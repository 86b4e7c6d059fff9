//! Compile-time constants shared by the host code and the WGSL sources.
//!
//! [`wgsl_prelude`] renders them as WGSL `const` declarations that are prepended to every
//! shader, so array sizes and loop bounds on both sides always agree.

use std::fmt::Write;

pub const DIR_LIGHT_COUNT: usize = 1;
pub const POINT_LIGHT_COUNT: usize = 10;

const _: () = assert!(DIR_LIGHT_COUNT >= 1, "at least one directional light is required");
const _: () = assert!(POINT_LIGHT_COUNT >= 1, "at least one point light is required");

pub const SHADOW_MAP_SIZE: u32 = 2048;
pub const SHADOW_BIAS: f32 = -0.005;
/// Shadow frustum half-extent as a multiple of the arena radius.
pub const SHADOW_FRUSTUM_MARGIN: f32 = 1.2;

pub const SSAO_SAMPLE_COUNT: usize = 14;
pub const SSAO_OCCLUSION_RADIUS: f32 = 0.5;
pub const SSAO_EPSILON: f32 = 0.01;
pub const SSAO_MIN_DISTANCE: f32 = 0.05;
pub const SSAO_MAX_DISTANCE: f32 = 1.4;
pub const SSAO_RANDOM_TEXTURE_SIZE: u32 = 1024;
pub const SSAO_RANDOM_TILING: f32 = 2.0;
pub const SSAO_RANDOM_SEED: u64 = 0x5_5a0;

pub const BLUR_KERNEL_RADIUS: usize = 5;
pub const BLUR_SIGMA: f32 = 1.0;
pub const BLUR_WEIGHT_COUNT: usize = BLUR_KERNEL_RADIUS * 2 + 1;
/// Blur weights travel as `vec4`s in the constant uniform block.
pub const BLUR_PACKED_WEIGHT_COUNT: usize = BLUR_WEIGHT_COUNT.div_ceil(4);
/// Sharpness of the normal-similarity term of the edge-preserving blur.
pub const BLUR_NORMAL_POWER: f32 = 8.0;
/// Weight falloff per view-space unit of depth difference between blur taps.
pub const BLUR_DEPTH_FALLOFF: f32 = 4.0;

const _: () = assert!(
    SSAO_SAMPLE_COUNT == 14,
    "sample offsets are the 8 cube corners and 6 face centres"
);

/// WGSL `const` header for every shader source.
pub fn wgsl_prelude() -> String {
    let mut out = String::new();
    let ints = [
        ("DIR_LIGHT_COUNT", DIR_LIGHT_COUNT),
        ("POINT_LIGHT_COUNT", POINT_LIGHT_COUNT),
        ("SSAO_SAMPLE_COUNT", SSAO_SAMPLE_COUNT),
        ("BLUR_KERNEL_RADIUS", BLUR_KERNEL_RADIUS),
        ("BLUR_WEIGHT_COUNT", BLUR_WEIGHT_COUNT),
        ("BLUR_PACKED_WEIGHT_COUNT", BLUR_PACKED_WEIGHT_COUNT),
    ];
    let floats = [
        ("SSAO_OCCLUSION_RADIUS", SSAO_OCCLUSION_RADIUS),
        ("SSAO_EPSILON", SSAO_EPSILON),
        ("SSAO_MIN_DISTANCE", SSAO_MIN_DISTANCE),
        ("SSAO_MAX_DISTANCE", SSAO_MAX_DISTANCE),
        ("BLUR_NORMAL_POWER", BLUR_NORMAL_POWER),
        ("BLUR_DEPTH_FALLOFF", BLUR_DEPTH_FALLOFF),
    ];

    for (name, value) in ints {
        let _ = writeln!(out, "const {name}: u32 = {value}u;");
    }
    for (name, value) in floats {
        let _ = writeln!(out, "const {name}: f32 = {value:?};");
    }
    out
}
