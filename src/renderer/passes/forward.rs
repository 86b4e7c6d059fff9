use glam::Mat4;

use super::{output_attachment, ShadingPath, SkyDepth};
use crate::renderer::assets::Assets;
use crate::renderer::context::GpuContext;
use crate::renderer::gpu::GpuProgram;
use crate::renderer::lights::{DirectionalLightRaw, PointLightRaw};
use crate::renderer::material::{
    ForwardMaterial, ForwardSceneUniform, MaterialResourceCache, ObjectUniform,
};
use crate::renderer::targets::DepthBuffer;
use crate::scene::RenderContext;

/// Single pass: every light and shadow map in one uniform block, drawn straight to the output.
pub struct ForwardRenderer {
    material: ForwardMaterial,
    depth: DepthBuffer,
}

impl ForwardRenderer {
    pub fn new(
        gpu: &GpuContext,
        cache: &mut MaterialResourceCache,
        assets: &mut Assets,
        width: u32,
        height: u32,
    ) -> Self {
        log::info!("Using forward shading");
        Self {
            material: ForwardMaterial::new(gpu, cache, assets),
            depth: DepthBuffer::init(&gpu.device, width, height),
        }
    }

    pub fn depth(&self) -> &DepthBuffer {
        &self.depth
    }
}

/// World-space lighting block for the forward shader.
pub(crate) fn forward_scene_uniform(ctx: &RenderContext<'_>) -> ForwardSceneUniform {
    let lighting = ctx.lighting;
    let shadows = ctx.shadows.lights();
    ForwardSceneUniform {
        proj_view: ctx.camera.view_projection().to_cols_array_2d(),
        dir_shadow_transforms: std::array::from_fn(|i| shadows[i].proj_view.to_cols_array_2d()),
        ambient: lighting.ambient.extend(1.0).to_array(),
        eye: ctx.camera.position().extend(1.0).to_array(),
        dir_lights: lighting
            .directional
            .map(|light| DirectionalLightRaw::from_light(&light, Mat4::IDENTITY)),
        point_lights: lighting
            .point
            .map(|light| PointLightRaw::from_light(&light, Mat4::IDENTITY)),
        shadow_size_bias: std::array::from_fn(|i| shadows[i].size_bias),
    }
}

impl ShadingPath for ForwardRenderer {
    fn render(
        &mut self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        ctx: &RenderContext<'_>,
        target: &wgpu::TextureView,
    ) {
        let view = ctx.camera.view();
        self.material
            .update_scene(gpu, &forward_scene_uniform(ctx), ctx.shadows);
        let offsets: Vec<u32> = ctx
            .objects
            .iter()
            .map(|object| {
                let uniform = ObjectUniform::new(object.world_transform(), view, object.material());
                self.material.push_object(gpu, &uniform, object.material())
            })
            .collect();
        self.material.flush(gpu);

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("ForwardPass"),
            color_attachments: &[output_attachment(target, true)],
            depth_stencil_attachment: Some(self.depth.attachment(true)),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        self.material.bind(&mut pass);
        for (object, offset) in ctx.objects.iter().zip(offsets) {
            self.material
                .bind_instance(&mut pass, offset, object.material().id());
            object.mesh().bind(&mut pass);
            object.mesh().render(&mut pass);
        }
    }

    fn resize(&mut self, gpu: &GpuContext, width: u32, height: u32) {
        self.depth.resize(&gpu.device, width, height);
    }

    fn sky_depth(&self) -> SkyDepth<'_> {
        SkyDepth::Attachment(&self.depth)
    }

    fn programs(&self) -> Vec<&GpuProgram> {
        vec![self.material.program()]
    }

    fn release(self: Box<Self>, cache: &mut MaterialResourceCache) {
        let Self { material, mut depth } = *self;
        depth.release();
        material.release(cache);
    }
}
