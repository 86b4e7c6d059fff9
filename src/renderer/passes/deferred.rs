use super::{full_screen_quad, output_attachment, point_light_mesh, ShadingPath, SkyDepth, SsaoRenderer};
use crate::renderer::assets::Assets;
use crate::renderer::context::GpuContext;
use crate::renderer::gpu::{GpuMesh, GpuProgram};
use crate::renderer::lights::DirectionalLightRaw;
use crate::renderer::material::{
    DirLightMaterial, DirLightSceneUniform, GBufferMaterial, GBufferSceneUniform,
    MaterialResourceCache, ObjectUniform, PointLightInstanceUniform, PointLightMaterial,
    PointLightSceneUniform,
};
use crate::renderer::targets::GBuffer;
use crate::scene::RenderContext;

/// G-buffer build, SSAO, one full-screen directional pass and additive point-light volumes.
pub struct DeferredRenderer {
    gbuffer: GBuffer,
    ssao: SsaoRenderer,
    geometry: GBufferMaterial,
    dir_light: DirLightMaterial,
    point_light: PointLightMaterial,
    quad: GpuMesh,
    sphere: GpuMesh,
}

impl DeferredRenderer {
    pub fn new(
        gpu: &GpuContext,
        cache: &mut MaterialResourceCache,
        assets: &mut Assets,
        width: u32,
        height: u32,
    ) -> Self {
        log::info!("Using deferred shading");
        Self {
            gbuffer: GBuffer::init(&gpu.device, width, height),
            ssao: SsaoRenderer::new(gpu, cache, assets, width, height),
            geometry: GBufferMaterial::new(gpu, cache, assets),
            dir_light: DirLightMaterial::new(gpu, cache, assets),
            point_light: PointLightMaterial::new(gpu, cache, assets),
            quad: full_screen_quad(gpu, assets),
            sphere: point_light_mesh(gpu, assets),
        }
    }

    pub fn gbuffer(&self) -> &GBuffer {
        &self.gbuffer
    }

    pub fn ssao(&self) -> &SsaoRenderer {
        &self.ssao
    }

    fn render_geometry(
        &mut self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        ctx: &RenderContext<'_>,
    ) {
        let view = ctx.camera.view();
        self.geometry.update_scene(
            gpu,
            &GBufferSceneUniform {
                projection: ctx.camera.projection().to_cols_array_2d(),
            },
        );
        let offsets: Vec<u32> = ctx
            .objects
            .iter()
            .map(|object| {
                let uniform = ObjectUniform::new(object.world_transform(), view, object.material());
                self.geometry.push_object(gpu, &uniform, object.material())
            })
            .collect();
        self.geometry.flush(gpu);

        let mut pass = self.gbuffer.bind(encoder);
        self.geometry.bind(&mut pass);
        for (object, offset) in ctx.objects.iter().zip(offsets) {
            self.geometry
                .bind_instance(&mut pass, offset, object.material().id());
            object.mesh().bind(&mut pass);
            object.mesh().render(&mut pass);
        }
        self.gbuffer.unbind(pass);
    }

    fn render_lighting(
        &mut self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        ctx: &RenderContext<'_>,
        target: &wgpu::TextureView,
    ) {
        let camera = ctx.camera;
        let view = camera.view();
        let shadows = ctx.shadows.lights();

        self.dir_light.update_scene(
            gpu,
            &DirLightSceneUniform {
                inv_projection: camera.inv_projection().to_cols_array_2d(),
                shadow_transforms: std::array::from_fn(|i| {
                    (shadows[i].proj_view * camera.inv_view()).to_cols_array_2d()
                }),
                ambient: ctx.lighting.ambient.extend(1.0).to_array(),
                dir_lights: ctx
                    .lighting
                    .directional
                    .map(|light| DirectionalLightRaw::from_light(&light, view)),
                shadow_size_bias: std::array::from_fn(|i| shadows[i].size_bias),
            },
        );
        self.dir_light
            .update_inputs(gpu, &self.gbuffer, self.ssao.output(), ctx.shadows);

        self.point_light.update_scene(
            gpu,
            &PointLightSceneUniform {
                projection: camera.projection().to_cols_array_2d(),
                inv_projection: camera.inv_projection().to_cols_array_2d(),
            },
        );
        self.point_light.update_inputs(gpu, &self.gbuffer);
        let offsets: Vec<u32> = ctx
            .lighting
            .point
            .iter()
            .filter(|light| light.radius > 0.0)
            .map(|light| {
                self.point_light
                    .push_light(&PointLightInstanceUniform::new(light, view))
            })
            .collect();
        self.point_light.flush(gpu);

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("DeferredLighting"),
            color_attachments: &[output_attachment(target, true)],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        self.dir_light.bind(&mut pass);
        self.quad.bind(&mut pass);
        self.quad.render(&mut pass);

        self.point_light.bind(&mut pass);
        self.sphere.bind(&mut pass);
        for offset in offsets {
            self.point_light.bind_instance(&mut pass, offset);
            self.sphere.render(&mut pass);
        }
    }
}

impl ShadingPath for DeferredRenderer {
    fn render(
        &mut self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        ctx: &RenderContext<'_>,
        target: &wgpu::TextureView,
    ) {
        self.render_geometry(gpu, encoder, ctx);
        self.ssao
            .render(gpu, encoder, &self.gbuffer, ctx.camera, &self.quad);
        self.render_lighting(gpu, encoder, ctx, target);
    }

    fn resize(&mut self, gpu: &GpuContext, width: u32, height: u32) {
        if self.gbuffer.resize(&gpu.device, width, height) {
            self.ssao.resize(gpu, width, height);
        }
    }

    fn sky_depth(&self) -> SkyDepth<'_> {
        SkyDepth::GBuffer(&self.gbuffer)
    }

    fn programs(&self) -> Vec<&GpuProgram> {
        let mut programs = vec![
            self.geometry.program(),
            self.dir_light.program(),
            self.point_light.program(),
        ];
        programs.extend(self.ssao.programs());
        programs
    }

    fn release(self: Box<Self>, cache: &mut MaterialResourceCache) {
        let Self {
            mut gbuffer,
            ssao,
            geometry,
            dir_light,
            point_light,
            mut quad,
            mut sphere,
        } = *self;
        gbuffer.release();
        ssao.release(cache);
        geometry.release(cache);
        dir_light.release(cache);
        point_light.release(cache);
        quad.release();
        sphere.release();
    }
}
