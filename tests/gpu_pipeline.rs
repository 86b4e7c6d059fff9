//! Pipeline tests on a real device. Run with `cargo test -- --ignored` on a machine with a GPU.

mod common;

use std::rc::Rc;

use glam::{Quat, Vec3};
use kamikaze_render::renderer::assets::Assets;
use kamikaze_render::renderer::context::GpuContext;
use kamikaze_render::renderer::gpu::{GpuMesh, GpuProgram, ShaderSource};
use kamikaze_render::renderer::lights::{DirectionalLight, PointLight, SceneLighting};
use kamikaze_render::renderer::material::{MaterialResourceCache, SurfaceMaterial};
use kamikaze_render::renderer::passes::{DeferredRenderer, ShadingPath, ShadowMapRenderer};
use kamikaze_render::renderer::primitives;
use kamikaze_render::renderer::targets::GBuffer;
use kamikaze_render::renderer::RenderError;
use kamikaze_render::scene::{Camera, RenderContext, RenderObject, Renderable, Scene, Transform};
use kamikaze_render::settings::{RenderSettings, ShadingMode};

const WIDTH: u32 = 320;
const HEIGHT: u32 = 240;

fn top_down_camera(width: u32, height: u32) -> Camera {
    let mut camera = Camera::new(60f32.to_radians(), width as f32 / height as f32, 1.0, 100.0);
    camera.set_transform(Transform::look_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y));
    camera
}

fn floor(mesh: GpuMesh) -> RenderObject {
    let material = SurfaceMaterial::new(Vec3::ZERO, 32.0);
    RenderObject::new(mesh, Rc::new(material)).with_transform(Transform::from_trs(
        Vec3::ZERO,
        Quat::IDENTITY,
        Vec3::new(40.0, 40.0, 1.0),
    ))
}

fn settings(shading: ShadingMode) -> RenderSettings {
    RenderSettings {
        shading,
        shadow_map_size: 512,
        skybox: false,
        ..RenderSettings::default()
    }
}

/// Renders the floor seen from above with `lighting` and returns the output pixels.
fn render_floor(gpu: &GpuContext, shading: ShadingMode, lighting: &SceneLighting) -> Vec<[f32; 4]> {
    let mut scene = Scene::new(gpu, &settings(shading), WIDTH, HEIGHT).expect("scene");
    scene.set_arena_radius(20.0);
    *scene.lighting_mut() = lighting.clone();
    *scene.camera_mut() = top_down_camera(WIDTH, HEIGHT);

    let mesh = scene.assets.meshes.get_or_add(gpu, "Plane", primitives::plane);
    let floor = floor(mesh);
    let objects: [&dyn Renderable; 1] = [&floor];

    let output = common::output_texture(gpu, WIDTH, HEIGHT);
    let view = output.create_view(&wgpu::TextureViewDescriptor::default());
    scene.render(gpu, &objects, &view);
    let pixels = common::rgba16f(&common::read_texture(gpu, &output));
    scene.release();
    pixels
}

fn sunlit() -> SceneLighting {
    let mut lighting = SceneLighting {
        ambient: Vec3::splat(0.1),
        ..SceneLighting::default()
    };
    lighting.directional[0] = DirectionalLight {
        color: Vec3::splat(0.5),
        direction: Vec3::NEG_Z,
    };
    lighting
}

#[test]
#[ignore]
fn resize_to_the_same_size_keeps_every_attachment() {
    let gpu = common::gpu();
    let mut gbuffer = GBuffer::init(&gpu.device, 800, 600);
    let extent = gbuffer.extent();
    let normal = gbuffer.normal().view().clone();

    assert!(!gbuffer.resize(&gpu.device, 800, 600));
    assert_eq!(gbuffer.extent(), extent);
    assert!(normal == *gbuffer.normal().view());

    assert!(gbuffer.resize(&gpu.device, 1920, 1080));
    assert_eq!(gbuffer.extent().generation, extent.generation + 1);
    assert!(normal != *gbuffer.normal().view());
}

#[test]
#[ignore]
fn lit_floor_is_brighter_than_ambient_and_bounded_by_diffuse() {
    let gpu = common::gpu();
    for shading in [ShadingMode::Forward, ShadingMode::Deferred] {
        let pixels = render_floor(&gpu, shading, &sunlit());
        let [r, g, b, _] = common::pixel(&pixels, WIDTH, WIDTH / 2, HEIGHT / 2);
        for c in [r, g, b] {
            assert!(c > 0.1 + 0.05, "{shading:?}: {c} not above ambient");
            assert!(c <= 0.6 + 0.01, "{shading:?}: {c} above ambient + diffuse");
        }
    }
}

#[test]
#[ignore]
fn point_lights_accumulate_additively() {
    let gpu = common::gpu();
    let light = |x: f32| PointLight {
        position: Vec3::new(x, 0.0, 1.0),
        radius: 3.0,
        color: Vec3::new(0.8, 0.6, 0.4),
        attenuation: Vec3::new(0.0, 1.0, 0.0),
    };

    let mut left = SceneLighting::default();
    left.point[0] = light(-4.0);
    let mut right = SceneLighting::default();
    right.point[1] = light(4.0);
    let mut both = SceneLighting::default();
    both.point[0] = light(-4.0);
    both.point[1] = light(4.0);

    let a = render_floor(&gpu, ShadingMode::Deferred, &left);
    let b = render_floor(&gpu, ShadingMode::Deferred, &right);
    let ab = render_floor(&gpu, ShadingMode::Deferred, &both);

    let mut lit = 0;
    for ((a, b), ab) in a.iter().zip(&b).zip(&ab) {
        for c in 0..3 {
            assert!((a[c] + b[c] - ab[c]).abs() < 2e-3, "{a:?} + {b:?} != {ab:?}");
        }
        if ab[0] > 0.0 {
            lit += 1;
        }
    }
    assert!(lit > 0, "no pixel received point light");
}

/// Renders a box on the floor with a fresh deferred path, resizing through `sizes` first, and
/// returns the final AO map bytes.
fn ssao_after_resizes(gpu: &GpuContext, sizes: &[(u32, u32)]) -> Vec<u8> {
    let mut assets = Assets::default();
    let mut cache = MaterialResourceCache::new();
    let shadow_renderer = ShadowMapRenderer::new(gpu, &mut cache, &mut assets, 512);
    let mut shadows = shadow_renderer.outputs();
    let lighting = sunlit();
    shadows.update(&lighting, 20.0);

    let plane = assets.meshes.get_or_add(gpu, "Plane", primitives::plane);
    let cube = assets.meshes.get_or_add(gpu, "Cube", primitives::cube);
    let floor = floor(plane);
    let block = RenderObject::new(cube, Rc::new(SurfaceMaterial::default())).with_transform(
        Transform::from_trs(Vec3::new(1.0, 0.5, 1.0), Quat::from_rotation_z(0.4), Vec3::splat(2.0)),
    );
    let objects: [&dyn Renderable; 2] = [&floor, &block];

    let (width, height) = sizes[0];
    let mut path = DeferredRenderer::new(gpu, &mut cache, &mut assets, width, height);
    for &(width, height) in sizes {
        path.resize(gpu, width, height);
        let mut camera = Camera::new(60f32.to_radians(), width as f32 / height as f32, 1.0, 100.0);
        camera.set_transform(Transform::look_at(Vec3::new(6.0, -8.0, 7.0), Vec3::ZERO, Vec3::Z));
        let ctx = RenderContext {
            camera: &camera,
            lighting: &lighting,
            objects: &objects,
            shadows: &shadows,
            arena_radius: 20.0,
        };
        let output = common::output_texture(gpu, width, height);
        let view = output.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
        path.render(gpu, &mut encoder, &ctx, &view);
        gpu.queue.submit(std::iter::once(encoder.finish()));
    }

    let occlusion = path
        .ssao()
        .output()
        .occlusion()
        .texture()
        .expect("live AO map")
        .clone();
    let bytes = common::read_texture(gpu, &occlusion);
    Box::new(path).release(&mut cache);
    shadow_renderer.release(&mut cache);
    bytes
}

#[test]
#[ignore]
fn ssao_is_identical_after_a_resize_round_trip() {
    let gpu = common::gpu();
    let direct = ssao_after_resizes(&gpu, &[(800, 600)]);
    let round_trip = ssao_after_resizes(&gpu, &[(800, 600), (1920, 1080), (800, 600)]);
    assert_eq!(direct.len(), (800 * 600 * 2) as usize);
    assert!(direct == round_trip, "AO map changed after resizing");

    let values: Vec<f32> = direct
        .chunks_exact(2)
        .map(|b| half::f16::from_le_bytes([b[0], b[1]]).to_f32())
        .collect();
    assert!(values.iter().any(|&ao| ao < 1.0), "box casts no occlusion");
    assert!(values.iter().all(|&ao| (0.0..=1.0).contains(&ao)));
}

#[test]
#[ignore]
fn broken_shader_leaves_an_invalid_program() {
    let gpu = common::gpu();
    let mut assets = Assets::default();
    let shader = assets
        .shaders
        .add(&gpu, "Broken", &ShaderSource::new("fn broken( {"));
    assert!(!shader.is_valid());

    let program = GpuProgram::link(&gpu.device, "BrokenProgram", &shader, |_| {
        unreachable!("an invalid shader is never linked")
    });
    assert!(!program.is_valid());
    assert_eq!(program.label(), "BrokenProgram");
}

#[test]
#[ignore]
#[should_panic(expected = "binding invalid program")]
fn binding_an_invalid_program_panics() {
    let gpu = common::gpu();
    let output = common::output_texture(&gpu, 4, 4);
    let view = output.create_view(&wgpu::TextureViewDescriptor::default());
    let mut encoder = gpu
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: None,
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: &view,
            depth_slice: None,
            resolve_target: None,
            ops: wgpu::Operations::default(),
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    });
    GpuProgram::invalid("Broken").bind(&mut pass);
}

#[test]
#[ignore]
fn every_scene_program_links() {
    let gpu = common::gpu();
    for shading in [ShadingMode::Forward, ShadingMode::Deferred] {
        match Scene::new(&gpu, &settings(shading), WIDTH, HEIGHT) {
            Ok(scene) => scene.release(),
            Err(RenderError::InvalidProgram(label)) => panic!("{shading:?}: {label} did not link"),
            Err(err) => panic!("{shading:?}: {err}"),
        }
    }
}

#[test]
#[ignore]
fn shadow_outputs_keep_the_renderer_maps_across_resizes() {
    let gpu = common::gpu();
    let mut scene = Scene::new(&gpu, &settings(ShadingMode::Deferred), WIDTH, HEIGHT)
        .expect("scene builds");
    let before: Vec<_> = scene.shadows().lights().iter().map(|l| l.view.clone()).collect();

    scene.resize(&gpu, WIDTH * 2, HEIGHT * 2);
    scene.resize(&gpu, WIDTH, HEIGHT);

    let after: Vec<_> = scene.shadows().lights().iter().map(|l| l.view.clone()).collect();
    assert_eq!(before, after);
    scene.release();

    let mut assets = Assets::default();
    let mut cache = MaterialResourceCache::new();
    let shadow_renderer = ShadowMapRenderer::new(&gpu, &mut cache, &mut assets, 256);
    let outputs = shadow_renderer.outputs();
    for (light, map) in outputs.lights().iter().zip(shadow_renderer.maps()) {
        assert_eq!(&light.view, map.depth().view());
        assert_eq!(light.size_bias[0], 256.0);
    }
    shadow_renderer.release(&mut cache);
}
