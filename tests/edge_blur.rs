//! CPU mirror of the two-pass edge-preserving AO blur.

use glam::Vec3;
use kamikaze_render::renderer::constants::{BLUR_KERNEL_RADIUS, BLUR_SIGMA, BLUR_WEIGHT_COUNT};
use kamikaze_render::renderer::kernels::{edge_weight, gaussian_weights};

const W: usize = 24;
const H: usize = 17;

struct Image {
    ao: Vec<f32>,
    depth: Vec<f32>,
    normal: Vec<Vec3>,
}

impl Image {
    fn flat(ao: impl Fn(usize, usize) -> f32) -> Self {
        let mut values = Vec::with_capacity(W * H);
        for y in 0..H {
            for x in 0..W {
                values.push(ao(x, y));
            }
        }
        Self {
            ao: values,
            depth: vec![-5.0; W * H],
            normal: vec![Vec3::Z; W * H],
        }
    }

    fn at(&self, x: i32, y: i32) -> usize {
        let x = x.clamp(0, W as i32 - 1) as usize;
        let y = y.clamp(0, H as i32 - 1) as usize;
        y * W + x
    }
}

fn blur_pass(image: &Image, source: &[f32], weights: &[f32], dx: i32, dy: i32) -> Vec<f32> {
    let mut out = vec![0.0; W * H];
    for y in 0..H as i32 {
        for x in 0..W as i32 {
            let c = image.at(x, y);
            let mut sum = 0.0;
            let mut total = 0.0;
            for (i, w) in weights.iter().enumerate() {
                let offset = i as i32 - BLUR_KERNEL_RADIUS as i32;
                let t = image.at(x + dx * offset, y + dy * offset);
                let w = w * edge_weight(image.depth[c], image.normal[c], image.depth[t], image.normal[t]);
                sum += w * source[t];
                total += w;
            }
            out[c] = if total > 0.0 { sum / total } else { source[c] };
        }
    }
    out
}

fn separable(image: &Image) -> Vec<f32> {
    let weights = gaussian_weights(BLUR_KERNEL_RADIUS, BLUR_SIGMA);
    let horizontal = blur_pass(image, &image.ao, &weights, 1, 0);
    blur_pass(image, &horizontal, &weights, 0, 1)
}

fn full_2d(image: &Image) -> Vec<f32> {
    let weights = gaussian_weights(BLUR_KERNEL_RADIUS, BLUR_SIGMA);
    let r = BLUR_KERNEL_RADIUS as i32;
    let mut out = vec![0.0; W * H];
    for y in 0..H as i32 {
        for x in 0..W as i32 {
            let mut sum = 0.0;
            for j in -r..=r {
                for i in -r..=r {
                    let w = weights[(i + r) as usize] * weights[(j + r) as usize];
                    sum += w * image.ao[image.at(x + i, y + j)];
                }
            }
            out[image.at(x, y)] = sum;
        }
    }
    out
}

#[test]
fn separable_passes_match_the_2d_kernel_without_edges() {
    let image = Image::flat(|x, y| {
        let fx = x as f32 / W as f32;
        let fy = y as f32 / H as f32;
        0.5 + 0.4 * (fx * 9.0).sin() * (fy * 7.0).cos() + if (x + y) % 3 == 0 { 0.05 } else { 0.0 }
    });

    let a = separable(&image);
    let b = full_2d(&image);
    for (i, (a, b)) in a.iter().zip(&b).enumerate() {
        assert!((a - b).abs() < 1e-5, "pixel {i}: separable {a} vs 2d {b}");
    }
}

#[test]
fn kernel_preserves_constant_images() {
    let image = Image::flat(|_, _| 0.7);
    for value in separable(&image) {
        assert!((value - 0.7).abs() < 1e-6);
    }
}

#[test]
fn depth_edges_do_not_bleed() {
    // left half dark and near, right half bright and far
    let mut image = Image::flat(|x, _| if x < W / 2 { 0.0 } else { 1.0 });
    for y in 0..H {
        for x in W / 2..W {
            image.depth[y * W + x] = -20.0;
        }
    }

    let blurred = separable(&image);
    let left = blurred[5 * W + W / 2 - 1];
    let right = blurred[5 * W + W / 2];
    assert!(left < 1e-3, "dark side picked up {left}");
    assert!(right > 1.0 - 1e-3, "bright side lost {}", 1.0 - right);
}

#[test]
fn weight_count_matches_radius() {
    assert_eq!(gaussian_weights(BLUR_KERNEL_RADIUS, BLUR_SIGMA).len(), BLUR_WEIGHT_COUNT);
}
