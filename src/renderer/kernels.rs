//! CPU-side math feeding the shaders: blur weights, SSAO sample kernel, light transforms.

use glam::{Mat4, Vec3, Vec4};
use rand::Rng;

use crate::renderer::constants::{
    BLUR_DEPTH_FALLOFF, BLUR_NORMAL_POWER, BLUR_PACKED_WEIGHT_COUNT, BLUR_WEIGHT_COUNT,
    SHADOW_FRUSTUM_MARGIN, SSAO_SAMPLE_COUNT,
};

/// Normalized Gaussian weights for offsets `-radius..=radius`.
pub fn gaussian_weights(radius: usize, sigma: f32) -> Vec<f32> {
    let two_sigma_sq = 2.0 * sigma * sigma;
    let r = radius as i32;
    let mut weights: Vec<f32> = (-r..=r)
        .map(|x| (-((x * x) as f32) / two_sigma_sq).exp())
        .collect();
    let sum: f32 = weights.iter().sum();
    for w in &mut weights {
        *w /= sum;
    }
    weights
}

/// Packs the blur kernel into `vec4`s, zero-padding the tail.
pub fn pack_weights(weights: &[f32]) -> [[f32; 4]; BLUR_PACKED_WEIGHT_COUNT] {
    assert_eq!(weights.len(), BLUR_WEIGHT_COUNT);
    let mut packed = [[0.0; 4]; BLUR_PACKED_WEIGHT_COUNT];
    for (i, w) in weights.iter().enumerate() {
        packed[i / 4][i % 4] = *w;
    }
    packed
}

/// Geometric similarity of a blur tap to the centre pixel, in [0, 1]. Mirrors `edge_weight` in
/// the blur shader; depths are view-space z.
pub fn edge_weight(center_depth: f32, center_normal: Vec3, tap_depth: f32, tap_normal: Vec3) -> f32 {
    let normal_term = center_normal.dot(tap_normal).max(0.0).powf(BLUR_NORMAL_POWER);
    let depth_term = (-(tap_depth - center_depth).abs() * BLUR_DEPTH_FALLOFF).exp();
    normal_term * depth_term
}

/// The 8 corners and 6 face centres of the [-1, 1] cube, normalized and scaled by a random
/// length in [0.25, 1].
pub fn ssao_sample_offsets(rng: &mut impl Rng) -> [Vec4; SSAO_SAMPLE_COUNT] {
    let directions = [
        Vec3::new(1.0, 1.0, 1.0),
        Vec3::new(-1.0, -1.0, -1.0),
        Vec3::new(-1.0, 1.0, 1.0),
        Vec3::new(1.0, -1.0, -1.0),
        Vec3::new(1.0, 1.0, -1.0),
        Vec3::new(-1.0, -1.0, 1.0),
        Vec3::new(-1.0, 1.0, -1.0),
        Vec3::new(1.0, -1.0, 1.0),
        Vec3::new(-1.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(0.0, -1.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(0.0, 0.0, -1.0),
        Vec3::new(0.0, 0.0, 1.0),
    ];

    directions.map(|dir| {
        let length: f32 = rng.gen_range(0.25..=1.0);
        (dir.normalize() * length).extend(0.0)
    })
}

/// Orthographic projection-view for a directional light covering an arena of `arena_radius`
/// centred on the origin. Depth lands in [0, 1].
pub fn directional_shadow_projection_view(direction: Vec3, arena_radius: f32) -> Mat4 {
    let direction = direction.normalize();
    let extent = arena_radius * SHADOW_FRUSTUM_MARGIN;
    let projection = Mat4::orthographic_rh(-extent, extent, -extent, extent, 0.01, 2.0 * arena_radius);

    let up = if direction.dot(Vec3::Y).abs() > 0.99 {
        Vec3::Z
    } else {
        Vec3::Y
    };
    let eye = -direction * arena_radius;
    let view = Mat4::look_at_rh(eye, Vec3::ZERO, up);

    projection * view
}

/// World transform of the unit sphere drawn as a point light's volume.
pub fn point_light_volume_transform(position: Vec3, radius: f32) -> Mat4 {
    Mat4::from_translation(position) * Mat4::from_scale(Vec3::splat(radius))
}
