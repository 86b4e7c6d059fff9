//! CPU mirror of the screen-space position math and the AO estimate.
//!
//! Conventions used in this codebase:
//! - Right-handed view space (camera looks down -Z).
//! - Clip/NDC depth range is [0, 1]. Near -> 0, Far -> 1.
//! - Fullscreen UVs have origin at top-left (v = 0 at top, v = 1 at bottom).
//!
use glam::{Mat4, Vec2, Vec3, Vec4};
use kamikaze_render::renderer::constants::{
    SSAO_EPSILON, SSAO_MAX_DISTANCE, SSAO_MIN_DISTANCE, SSAO_OCCLUSION_RADIUS, SSAO_RANDOM_SEED,
    SSAO_SAMPLE_COUNT,
};
use kamikaze_render::renderer::kernels::ssao_sample_offsets;
use kamikaze_render::scene::Camera;
use rand::SeedableRng;

fn uv_to_ndc_xy(uv: Vec2) -> Vec2 {
    Vec2::new(uv.x * 2.0 - 1.0, 1.0 - uv.y * 2.0)
}

fn ndc_xy_to_uv(ndc_xy: Vec2) -> Vec2 {
    Vec2::new(ndc_xy.x * 0.5 + 0.5, 0.5 - ndc_xy.y * 0.5)
}

fn view_to_uv(projection: Mat4, view_pos: Vec3) -> (Vec2, f32) {
    let clip: Vec4 = projection * view_pos.extend(1.0);
    let ndc = clip.truncate() / clip.w;
    (ndc_xy_to_uv(ndc.truncate()), ndc.z)
}

fn view_position(uv: Vec2, depth: f32, inv_projection: Mat4) -> Vec3 {
    let ndc = uv_to_ndc_xy(uv).extend(depth).extend(1.0);
    let view = inv_projection * ndc;
    view.truncate() / view.w
}

fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Analytic depth buffer: the scene is whatever `surface` returns for a view ray through `uv`.
fn estimate_ao(
    camera: &Camera,
    position: Vec3,
    normal: Vec3,
    rotation: Vec3,
    offsets: &[Vec4],
    scene_depth: impl Fn(Vec2) -> f32,
) -> f32 {
    let mut occluded = 0.0;
    for offset in offsets {
        let mut offset = reflect(offset.truncate(), rotation) * SSAO_OCCLUSION_RADIUS;
        if offset.dot(normal) < 0.0 {
            offset = -offset;
        }
        let sample = position + offset;
        let (uv, _) = view_to_uv(camera.projection(), sample);
        if uv.min_element() < 0.0 || uv.max_element() > 1.0 {
            continue;
        }
        let scene = view_position(uv, scene_depth(uv), camera.inv_projection());
        let distance = (scene - position).length();
        if scene.z > sample.z + SSAO_EPSILON
            && distance > SSAO_MIN_DISTANCE
            && distance < SSAO_MAX_DISTANCE
        {
            occluded += 1.0;
        }
    }
    1.0 - occluded / SSAO_SAMPLE_COUNT as f32
}

fn approx_eq3(a: Vec3, b: Vec3, eps: f32) -> bool {
    (a - b).abs().max_element() <= eps
}

#[test]
fn uv_ndc_y_flip_roundtrip_is_consistent() {
    let samples = [
        Vec2::new(0.0, 0.0),
        Vec2::new(0.25, 0.25),
        Vec2::new(0.5, 0.5),
        Vec2::new(0.75, 0.75),
        Vec2::new(1.0, 1.0),
    ];
    for &uv in &samples {
        let ndc_xy = uv_to_ndc_xy(uv);
        let uv_rt = ndc_xy_to_uv(ndc_xy);
        assert!((uv - uv_rt).abs().max_element() < 1e-6, "uv {:?} -> {:?} -> {:?}", uv, ndc_xy, uv_rt);
    }
}

#[test]
fn camera_projection_maps_near_far_to_depth_range() {
    let camera = Camera::new(0.45 * std::f32::consts::PI, 4.0 / 3.0, 1.0, 100.0);

    let (_, depth_near) = view_to_uv(camera.projection(), Vec3::new(0.0, 0.0, -1.0));
    let (_, depth_far) = view_to_uv(camera.projection(), Vec3::new(0.0, 0.0, -100.0));

    assert!(depth_near.abs() < 1e-5, "near -> depth {}, expected 0.0", depth_near);
    assert!((depth_far - 1.0).abs() < 1e-5, "far -> depth {}, expected 1.0", depth_far);
}

#[test]
fn reconstruct_view_position_roundtrips_through_projection() {
    let camera = Camera::new(60f32.to_radians(), 16.0 / 9.0, 0.1, 50.0);

    let points = [
        Vec3::new(0.0, 0.0, -1.0),
        Vec3::new(0.2, -0.1, -2.5),
        Vec3::new(1.0, 0.5, -3.0),
        Vec3::new(-0.75, 0.25, -5.0),
    ];

    for &p_view in &points {
        let (uv, depth) = view_to_uv(camera.projection(), p_view);
        assert!(depth > 0.0 && depth < 1.0, "depth out of range: {} for {:?}", depth, p_view);

        let recon = view_position(uv, depth, camera.inv_projection());
        assert!(
            approx_eq3(recon, p_view, 1e-4),
            "reconstruct mismatch: orig={:?}, recon={:?}, uv={:?}, depth={}",
            p_view,
            recon,
            uv,
            depth
        );
    }
}

#[test]
fn open_plane_facing_the_camera_is_unoccluded() {
    let camera = Camera::new(60f32.to_radians(), 1.0, 0.5, 50.0);
    let mut rng = rand::rngs::SmallRng::seed_from_u64(SSAO_RANDOM_SEED);
    let offsets = ssao_sample_offsets(&mut rng);

    // wall at z = -5 covering the whole view
    let plane_depth = view_to_uv(camera.projection(), Vec3::new(0.0, 0.0, -5.0)).1;
    for rotation in [Vec3::X, Vec3::new(0.3, 0.8, 0.5).normalize(), Vec3::Z] {
        let ao = estimate_ao(
            &camera,
            Vec3::new(0.0, 0.0, -5.0),
            Vec3::Z,
            rotation,
            &offsets,
            |_| plane_depth,
        );
        assert_eq!(ao, 1.0, "flat wall should not occlude itself (rotation {rotation:?})");
    }
}

#[test]
fn inner_corner_is_darker_than_open_plane() {
    let camera = Camera::new(60f32.to_radians(), 1.0, 0.5, 50.0);
    let mut rng = rand::rngs::SmallRng::seed_from_u64(SSAO_RANDOM_SEED);
    let offsets = ssao_sample_offsets(&mut rng);

    // floor-like wall at z = -5, with a box occupying the right half one unit closer
    let far_depth = view_to_uv(camera.projection(), Vec3::new(0.0, 0.0, -5.0)).1;
    let near_depth = view_to_uv(camera.projection(), Vec3::new(0.0, 0.0, -4.0)).1;
    let edge_uv = view_to_uv(camera.projection(), Vec3::new(0.1, 0.0, -5.0)).0.x;

    let ao = estimate_ao(
        &camera,
        Vec3::new(0.0, 0.0, -5.0),
        Vec3::Z,
        Vec3::new(0.3, 0.8, 0.5).normalize(),
        &offsets,
        |uv| if uv.x > edge_uv { near_depth } else { far_depth },
    );
    assert!(ao < 1.0, "corner ao {ao}");
    assert!(ao >= 0.0);
}

#[test]
fn sample_kernel_covers_both_hemispheres() {
    let mut rng = rand::rngs::SmallRng::seed_from_u64(SSAO_RANDOM_SEED);
    let offsets = ssao_sample_offsets(&mut rng);
    let up = offsets.iter().filter(|o| o.z > 0.0).count();
    let down = offsets.iter().filter(|o| o.z < 0.0).count();
    assert_eq!(up, down);
    assert_eq!(offsets.len(), SSAO_SAMPLE_COUNT);
}
