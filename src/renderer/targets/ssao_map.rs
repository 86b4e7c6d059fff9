use super::{create_attachment, depth_attachment, set_full_viewport, TargetExtent};
use crate::renderer::gpu::GpuTexture;

/// Single-channel occlusion target with its own depth attachment. Clears to 1 (unoccluded).
pub struct SsaoMap {
    label: &'static str,
    extent: TargetExtent,
    occlusion: GpuTexture,
    depth: GpuTexture,
}

impl SsaoMap {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R16Float;
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

    pub fn init(device: &wgpu::Device, label: &'static str, width: u32, height: u32) -> Self {
        let mut map = Self {
            label,
            extent: TargetExtent::new(width, height),
            occlusion: GpuTexture::invalid(),
            depth: GpuTexture::invalid(),
        };
        map.allocate(device);
        map
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) -> bool {
        if !self.extent.update(width, height) {
            return false;
        }
        log::debug!("Resizing {} to {}x{}", self.label, self.extent.width, self.extent.height);
        self.allocate(device);
        true
    }

    fn allocate(&mut self, device: &wgpu::Device) {
        self.occlusion = create_attachment(device, self.label, &self.extent, Self::FORMAT, true);
        self.depth = create_attachment(
            device,
            &format!("{}.Depth", self.label),
            &self.extent,
            Self::DEPTH_FORMAT,
            false,
        );
    }

    pub fn bind<'e>(&self, encoder: &'e mut wgpu::CommandEncoder) -> wgpu::RenderPass<'e> {
        assert!(self.is_valid(), "binding a released {}", self.label);
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(self.label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: self.occlusion.view(),
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::WHITE),
                    store: wgpu::StoreOp::Store,
                },
            })],
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
        for attachment in [&mut self.occlusion, &mut self.depth] {
            if let Some(texture) = attachment.texture() {
                texture.destroy();
            }
            attachment.release();
        }
    }

    pub fn is_valid(&self) -> bool {
        self.occlusion.is_valid() && self.depth.is_valid()
    }

    pub fn extent(&self) -> TargetExtent {
        self.extent
    }

    pub fn occlusion(&self) -> &GpuTexture {
        &self.occlusion
    }
}
