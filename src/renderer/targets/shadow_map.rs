use super::{create_attachment, depth_attachment, set_full_viewport, TargetExtent};
use crate::renderer::gpu::GpuTexture;

/// Single square depth attachment rendered from one directional light. Sized once: the lighting
/// passes keep clones of its view for the renderer's lifetime.
pub struct ShadowMap {
    extent: TargetExtent,
    depth: GpuTexture,
}

impl ShadowMap {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    pub fn init(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let extent = TargetExtent::new(width, height);
        log::info!("Creating {}x{} shadow map", extent.width, extent.height);
        Self {
            depth: create_attachment(device, "ShadowMap", &extent, Self::FORMAT, true),
            extent,
        }
    }

    pub fn bind<'e>(&self, encoder: &'e mut wgpu::CommandEncoder) -> wgpu::RenderPass<'e> {
        assert!(self.is_valid(), "binding a released ShadowMap");
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("ShadowMap"),
            color_attachments: &[],
            depth_stencil_attachment: Some(depth_attachment(self.depth.view())),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        set_full_viewport(&mut pass, &self.extent);
        pass
    }

    pub fn unbind(&self, pass: wgpu::RenderPass<'_>) {
        drop(pass);
    }

    pub fn release(&mut self) {
        if let Some(texture) = self.depth.texture() {
            texture.destroy();
        }
        self.depth.release();
    }

    pub fn is_valid(&self) -> bool {
        self.depth.is_valid()
    }

    pub fn extent(&self) -> TargetExtent {
        self.extent
    }

    pub fn depth(&self) -> &GpuTexture {
        &self.depth
    }
}
