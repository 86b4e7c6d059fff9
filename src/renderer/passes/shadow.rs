use glam::Mat4;

use crate::renderer::assets::Assets;
use crate::renderer::constants::{DIR_LIGHT_COUNT, SHADOW_BIAS};
use crate::renderer::context::GpuContext;
use crate::renderer::gpu::GpuProgram;
use crate::renderer::kernels::directional_shadow_projection_view;
use crate::renderer::lights::SceneLighting;
use crate::renderer::material::{shadow_sampler, MaterialResourceCache, ShadowMaterial};
use crate::renderer::targets::ShadowMap;
use crate::scene::RenderContext;

/// What the lighting passes need to know about one directional light's shadow map.
#[derive(Clone, Debug)]
pub struct ShadowLight {
    pub view: wgpu::TextureView,
    pub proj_view: Mat4,
    /// (width, height, bias, 0)
    pub size_bias: [f32; 4],
}

/// Per-light shadow data for the frame. The views are clones of the renderer's maps, so they
/// stay valid for the renderer's lifetime.
#[derive(Clone, Debug)]
pub struct ShadowOutputs {
    lights: Vec<ShadowLight>,
    sampler: wgpu::Sampler,
}

impl ShadowOutputs {
    pub fn lights(&self) -> &[ShadowLight] {
        &self.lights
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    /// Recomputes every light's projection-view for the current light directions.
    pub fn update(&mut self, lighting: &SceneLighting, arena_radius: f32) {
        for (shadow, light) in self.lights.iter_mut().zip(&lighting.directional) {
            shadow.proj_view = directional_shadow_projection_view(light.direction, arena_radius);
        }
    }
}

/// Depth-only rendering of the visible objects from every directional light.
pub struct ShadowMapRenderer {
    maps: Vec<ShadowMap>,
    material: ShadowMaterial,
    sampler: wgpu::Sampler,
}

impl ShadowMapRenderer {
    pub fn new(
        gpu: &GpuContext,
        cache: &mut MaterialResourceCache,
        assets: &mut Assets,
        size: u32,
    ) -> Self {
        let maps = (0..DIR_LIGHT_COUNT)
            .map(|_| ShadowMap::init(&gpu.device, size, size))
            .collect();
        Self {
            maps,
            material: ShadowMaterial::new(gpu, cache, assets),
            sampler: shadow_sampler(&gpu.device),
        }
    }

    /// Fresh outputs bound to this renderer's maps, with identity transforms until the first
    /// [`ShadowOutputs::update`].
    pub fn outputs(&self) -> ShadowOutputs {
        let lights = self
            .maps
            .iter()
            .map(|map| {
                let extent = map.extent();
                ShadowLight {
                    view: map.depth().view().clone(),
                    proj_view: Mat4::IDENTITY,
                    size_bias: [extent.width as f32, extent.height as f32, SHADOW_BIAS, 0.0],
                }
            })
            .collect();
        ShadowOutputs {
            lights,
            sampler: self.sampler.clone(),
        }
    }

    pub fn program(&self) -> &GpuProgram {
        self.material.program()
    }

    pub fn maps(&self) -> &[ShadowMap] {
        &self.maps
    }

    pub fn render(&mut self, gpu: &GpuContext, encoder: &mut wgpu::CommandEncoder, ctx: &RenderContext<'_>) {
        self.material.begin_frame();
        let offsets: Vec<Vec<u32>> = ctx
            .shadows
            .lights()
            .iter()
            .map(|light| {
                ctx.objects
                    .iter()
                    .map(|object| self.material.push(light.proj_view, object.world_transform()))
                    .collect()
            })
            .collect();
        self.material.flush(gpu);

        for (map, offsets) in self.maps.iter().zip(&offsets) {
            let mut pass = map.bind(encoder);
            self.material.bind(&mut pass);
            for (object, offset) in ctx.objects.iter().zip(offsets) {
                self.material.bind_instance(&mut pass, *offset);
                object.mesh().bind(&mut pass);
                object.mesh().render(&mut pass);
            }
            map.unbind(pass);
        }
    }

    pub fn release(mut self, cache: &mut MaterialResourceCache) {
        for map in &mut self.maps {
            map.release();
        }
        self.material.release(cache);
    }
}
