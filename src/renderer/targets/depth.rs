use super::{create_attachment, TargetExtent};
use crate::renderer::gpu::GpuTexture;

/// Depth attachment of the forward path, shared with the skybox pass that follows it.
pub struct DepthBuffer {
    extent: TargetExtent,
    depth: GpuTexture,
}

impl DepthBuffer {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    pub fn init(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let extent = TargetExtent::new(width, height);
        Self {
            depth: create_attachment(device, "ForwardDepth", &extent, Self::FORMAT, false),
            extent,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) -> bool {
        if !self.extent.update(width, height) {
            return false;
        }
        self.depth = create_attachment(device, "ForwardDepth", &self.extent, Self::FORMAT, false);
        true
    }

    /// Depth attachment for a pass over the output target. `clear` starts from 1.0, otherwise
    /// the previous contents are kept.
    pub fn attachment(&self, clear: bool) -> wgpu::RenderPassDepthStencilAttachment<'_> {
        let load = if clear {
            wgpu::LoadOp::Clear(1.0)
        } else {
            wgpu::LoadOp::Load
        };
        wgpu::RenderPassDepthStencilAttachment {
            view: self.depth.view(),
            depth_ops: Some(wgpu::Operations {
                load,
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }
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
}
