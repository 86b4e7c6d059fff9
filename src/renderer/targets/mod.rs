//! Offscreen render targets.
//!
//! A target's `bind` begins a render pass on the encoder with the target's clear values and
//! viewport. The returned pass borrows the encoder mutably, so a second target cannot be bound
//! until `unbind` ends the first.

mod depth;
mod gbuffer;
mod shadow_map;
mod ssao_map;

pub use depth::DepthBuffer;
pub use gbuffer::GBuffer;
pub use shadow_map::ShadowMap;
pub use ssao_map::SsaoMap;

use crate::renderer::gpu::GpuTexture;

/// Size of a target plus a counter bumped on every real reallocation. Bind groups built from a
/// target's views stay valid as long as the generation they were built at is current.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TargetExtent {
    pub width: u32,
    pub height: u32,
    pub generation: u64,
}

impl TargetExtent {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            generation: 0,
        }
    }

    /// Returns `true` when the size changed and storage must be reallocated.
    pub fn update(&mut self, width: u32, height: u32) -> bool {
        let (width, height) = (width.max(1), height.max(1));
        if width == self.width && height == self.height {
            return false;
        }
        self.width = width;
        self.height = height;
        self.generation += 1;
        true
    }

    pub fn size(&self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: 1,
        }
    }
}

pub(crate) fn create_attachment(
    device: &wgpu::Device,
    label: &str,
    extent: &TargetExtent,
    format: wgpu::TextureFormat,
    sampled: bool,
) -> GpuTexture {
    let mut usage = wgpu::TextureUsages::RENDER_ATTACHMENT;
    if !format.is_depth_stencil_format() {
        // readback of color attachments
        usage |= wgpu::TextureUsages::COPY_SRC;
    }
    if sampled {
        usage |= wgpu::TextureUsages::TEXTURE_BINDING;
    }
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: extent.size(),
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor {
        label: Some(label),
        ..Default::default()
    });
    GpuTexture::from_parts(texture, view)
}

pub(crate) fn set_full_viewport(pass: &mut wgpu::RenderPass<'_>, extent: &TargetExtent) {
    pass.set_viewport(
        0.0,
        0.0,
        extent.width as f32,
        extent.height as f32,
        0.0,
        1.0,
    );
}

pub(crate) fn depth_attachment(
    view: &wgpu::TextureView,
) -> wgpu::RenderPassDepthStencilAttachment<'_> {
    wgpu::RenderPassDepthStencilAttachment {
        view,
        depth_ops: Some(wgpu::Operations {
            load: wgpu::LoadOp::Clear(1.0),
            store: wgpu::StoreOp::Store,
        }),
        stencil_ops: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_size_update_keeps_generation() {
        let mut extent = TargetExtent::new(800, 600);
        assert!(!extent.update(800, 600));
        assert_eq!(extent.generation, 0);
    }

    #[test]
    fn real_resize_bumps_generation_once() {
        let mut extent = TargetExtent::new(800, 600);
        assert!(extent.update(1920, 1080));
        assert!(!extent.update(1920, 1080));
        assert!(extent.update(800, 600));
        assert_eq!(extent.generation, 2);
        assert_eq!((extent.width, extent.height), (800, 600));
    }

    #[test]
    fn zero_sizes_are_clamped() {
        let mut extent = TargetExtent::new(0, 0);
        assert_eq!((extent.width, extent.height), (1, 1));
        assert!(!extent.update(0, 1));
    }
}
