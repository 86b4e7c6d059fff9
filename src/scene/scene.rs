use glam::Vec3;

use super::{Camera, RenderContext, Renderable};
use crate::renderer::assets::Assets;
use crate::renderer::context::GpuContext;
use crate::renderer::error::RenderError;
use crate::renderer::gpu::{GpuProgram, GpuTextureCube};
use crate::renderer::lights::SceneLighting;
use crate::renderer::material::{MaterialResourceCache, SkyBoxVariant};
use crate::renderer::passes::{
    DeferredRenderer, ForwardRenderer, ShadingPath, ShadowMapRenderer, ShadowOutputs,
    SkyBoxRenderer,
};
use crate::settings::{RenderSettings, ShadingMode};

/// Per-frame orchestration: camera, lighting and the pass renderers, in frame order.
///
/// The simulation writes [`Scene::camera_mut`] and [`Scene::lighting_mut`] between frames and
/// hands the objects to draw to [`Scene::render`].
pub struct Scene {
    pub assets: Assets,
    cache: MaterialResourceCache,
    shading: ShadingMode,
    shadow_renderer: ShadowMapRenderer,
    shadows: ShadowOutputs,
    path: Box<dyn ShadingPath>,
    sky: Option<SkyBoxRenderer>,
    camera: Camera,
    lighting: SceneLighting,
    arena_radius: f32,
    width: u32,
    height: u32,
}

impl Scene {
    pub fn new(
        gpu: &GpuContext,
        settings: &RenderSettings,
        width: u32,
        height: u32,
    ) -> Result<Self, RenderError> {
        let width = width.max(1);
        let height = height.max(1);
        let mut assets = Assets::default();
        let mut cache = MaterialResourceCache::new();

        let shadow_renderer =
            ShadowMapRenderer::new(gpu, &mut cache, &mut assets, settings.shadow_map_size);
        let shadows = shadow_renderer.outputs();
        let path: Box<dyn ShadingPath> = match settings.shading {
            ShadingMode::Forward => Box::new(ForwardRenderer::new(
                gpu, &mut cache, &mut assets, width, height,
            )),
            ShadingMode::Deferred => Box::new(DeferredRenderer::new(
                gpu, &mut cache, &mut assets, width, height,
            )),
        };

        check_programs(
            path.programs()
                .into_iter()
                .chain(std::iter::once(shadow_renderer.program())),
        )?;

        let mut camera = Camera::default();
        camera.set_aspect(width as f32 / height as f32);

        Ok(Self {
            assets,
            cache,
            shading: settings.shading,
            shadow_renderer,
            shadows,
            path,
            sky: None,
            camera,
            lighting: SceneLighting::default(),
            arena_radius: 1.0,
            width,
            height,
        })
    }

    /// Enables the sky pass with `cube`, drawn the way the active shading path needs.
    pub fn set_sky_box(&mut self, gpu: &GpuContext, cube: GpuTextureCube) -> Result<(), RenderError> {
        let variant = match self.shading {
            ShadingMode::Forward => SkyBoxVariant::Forward,
            ShadingMode::Deferred => SkyBoxVariant::Deferred,
        };
        let sky = SkyBoxRenderer::new(gpu, &mut self.cache, &mut self.assets, variant, cube);
        if let Err(err) = check_programs(std::iter::once(sky.program())) {
            sky.release(&mut self.cache);
            return Err(err);
        }
        if let Some(previous) = self.sky.replace(sky) {
            previous.release(&mut self.cache);
        }
        Ok(())
    }

    pub fn shading(&self) -> ShadingMode {
        self.shading
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn lighting(&self) -> &SceneLighting {
        &self.lighting
    }

    pub fn lighting_mut(&mut self) -> &mut SceneLighting {
        &mut self.lighting
    }

    pub fn set_ambient(&mut self, ambient: Vec3) {
        self.lighting.ambient = ambient;
    }

    /// Radius of the play area, which sizes the shadow frustum.
    pub fn set_arena_radius(&mut self, radius: f32) {
        self.arena_radius = radius.max(f32::EPSILON);
    }

    pub fn arena_radius(&self) -> f32 {
        self.arena_radius
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn shadows(&self) -> &ShadowOutputs {
        &self.shadows
    }

    pub fn resize(&mut self, gpu: &GpuContext, width: u32, height: u32) {
        if width == 0 || height == 0 || (width, height) == (self.width, self.height) {
            return;
        }
        log::debug!("Resizing scene targets to {width}x{height}");
        self.width = width;
        self.height = height;
        self.camera.set_aspect(width as f32 / height as f32);
        self.path.resize(gpu, width, height);
    }

    /// Objects that should be drawn this frame, in their original order.
    pub fn visible_objects<'a>(&self, objects: &[&'a dyn Renderable]) -> Vec<&'a dyn Renderable> {
        objects
            .iter()
            .copied()
            .filter(|object| object.visible())
            .filter(|object| match object.bounding_sphere() {
                Some((center, radius)) => self.camera.sphere_in_frustum(center, radius),
                None => true,
            })
            .collect()
    }

    /// Records shadow maps, the shading path and the sky into one encoder and submits it.
    pub fn render(
        &mut self,
        gpu: &GpuContext,
        objects: &[&dyn Renderable],
        target: &wgpu::TextureView,
    ) {
        self.shadows.update(&self.lighting, self.arena_radius);
        let visible = self.visible_objects(objects);

        let ctx = RenderContext {
            camera: &self.camera,
            lighting: &self.lighting,
            objects: &visible,
            shadows: &self.shadows,
            arena_radius: self.arena_radius,
        };

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        self.shadow_renderer.render(gpu, &mut encoder, &ctx);
        self.path.render(gpu, &mut encoder, &ctx, target);
        if let Some(sky) = &mut self.sky {
            sky.render(gpu, &mut encoder, &ctx, target, self.path.sky_depth());
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
    }

    /// Releases every pass and the asset libraries. Shared material state is gone afterwards.
    pub fn release(self) {
        let Self {
            mut assets,
            mut cache,
            shadow_renderer,
            path,
            sky,
            ..
        } = self;
        if let Some(sky) = sky {
            sky.release(&mut cache);
        }
        path.release(&mut cache);
        shadow_renderer.release(&mut cache);
        assets.release();
        if !cache.is_empty() {
            log::warn!("Material resources still referenced after scene release");
        }
    }
}

fn check_programs<'a>(programs: impl IntoIterator<Item = &'a GpuProgram>) -> Result<(), RenderError> {
    match programs.into_iter().find(|program| !program.is_valid()) {
        Some(program) => Err(RenderError::InvalidProgram(program.label().to_owned())),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_program_list_passes_the_check() {
        assert!(check_programs(std::iter::empty()).is_ok());
    }

    #[test]
    fn first_invalid_program_is_reported_by_label() {
        let programs = [GpuProgram::invalid("Broken")];
        match check_programs(programs.iter()) {
            Err(RenderError::InvalidProgram(label)) => assert_eq!(label, "Broken"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
