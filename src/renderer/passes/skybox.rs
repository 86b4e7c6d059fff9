use super::{full_screen_quad, output_attachment, SkyDepth};
use crate::renderer::assets::Assets;
use crate::renderer::context::GpuContext;
use crate::renderer::gpu::{GpuMesh, GpuProgram, GpuTextureCube};
use crate::renderer::material::{
    MaterialResourceCache, SkyBoxMaterial, SkyBoxSceneUniform, SkyBoxVariant,
};
use crate::scene::RenderContext;

/// Fills the pixels no geometry covered with the sky cube, after the shading path ran.
pub struct SkyBoxRenderer {
    material: SkyBoxMaterial,
    quad: GpuMesh,
}

impl SkyBoxRenderer {
    pub fn new(
        gpu: &GpuContext,
        cache: &mut MaterialResourceCache,
        assets: &mut Assets,
        variant: SkyBoxVariant,
        cube: GpuTextureCube,
    ) -> Self {
        Self {
            material: SkyBoxMaterial::new(gpu, cache, assets, variant, cube),
            quad: full_screen_quad(gpu, assets),
        }
    }

    pub fn program(&self) -> &GpuProgram {
        self.material.program()
    }

    pub fn render(
        &mut self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        ctx: &RenderContext<'_>,
        target: &wgpu::TextureView,
        depth: SkyDepth<'_>,
    ) {
        self.material.update_scene(
            gpu,
            &SkyBoxSceneUniform {
                inv_sky_view_projection: ctx.camera.inv_sky_view_projection().to_cols_array_2d(),
            },
        );

        let depth_attachment = match (self.material.variant(), depth) {
            (SkyBoxVariant::Forward, SkyDepth::Attachment(depth)) => {
                self.material.update_inputs(gpu, None);
                Some(depth.attachment(false))
            }
            (SkyBoxVariant::Deferred, SkyDepth::GBuffer(gbuffer)) => {
                self.material.update_inputs(gpu, Some(gbuffer));
                None
            }
            (variant, _) => {
                log::warn!("Skipping {variant:?} skybox: the shading path provides the other depth source");
                return;
            }
        };

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("SkyBox"),
            color_attachments: &[output_attachment(target, false)],
            depth_stencil_attachment: depth_attachment,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        self.material.bind(&mut pass);
        self.quad.bind(&mut pass);
        self.quad.render(&mut pass);
    }

    pub fn release(self, cache: &mut MaterialResourceCache) {
        let Self { material, mut quad } = self;
        material.release(cache);
        quad.release();
    }
}
