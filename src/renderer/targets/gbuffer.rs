use super::{create_attachment, depth_attachment, set_full_viewport, TargetExtent};
use crate::renderer::gpu::GpuTexture;

/// Depth plus three view-space attachments: normal, diffuse albedo, and specular color with the
/// exponent in alpha.
pub struct GBuffer {
    extent: TargetExtent,
    depth: GpuTexture,
    normal: GpuTexture,
    diffuse: GpuTexture,
    specular: GpuTexture,
}

impl GBuffer {
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
    pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
    pub const COLOR_ATTACHMENTS: usize = 3;

    pub fn init(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let mut gbuffer = Self {
            extent: TargetExtent::new(width, height),
            depth: GpuTexture::invalid(),
            normal: GpuTexture::invalid(),
            diffuse: GpuTexture::invalid(),
            specular: GpuTexture::invalid(),
        };
        gbuffer.allocate(device);
        gbuffer
    }

    /// No-op for unchanged dimensions; otherwise reallocates every attachment together.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) -> bool {
        if !self.extent.update(width, height) {
            return false;
        }
        log::debug!("Resizing GBuffer to {}x{}", self.extent.width, self.extent.height);
        self.allocate(device);
        true
    }

    fn allocate(&mut self, device: &wgpu::Device) {
        let extent = self.extent;
        self.depth = create_attachment(device, "GBuffer.Depth", &extent, Self::DEPTH_FORMAT, true);
        self.normal = create_attachment(device, "GBuffer.Normal", &extent, Self::COLOR_FORMAT, true);
        self.diffuse =
            create_attachment(device, "GBuffer.Diffuse", &extent, Self::COLOR_FORMAT, true);
        self.specular =
            create_attachment(device, "GBuffer.Specular", &extent, Self::COLOR_FORMAT, true);
    }

    pub fn bind<'e>(&self, encoder: &'e mut wgpu::CommandEncoder) -> wgpu::RenderPass<'e> {
        assert!(self.is_valid(), "binding a released GBuffer");
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("GBuffer"),
            color_attachments: &[
                color(self.normal.view()),
                color(self.diffuse.view()),
                color(self.specular.view()),
            ],
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
        for attachment in [
            &mut self.depth,
            &mut self.normal,
            &mut self.diffuse,
            &mut self.specular,
        ] {
            if let Some(texture) = attachment.texture() {
                texture.destroy();
            }
            attachment.release();
        }
    }

    pub fn is_valid(&self) -> bool {
        self.depth.is_valid()
            && self.normal.is_valid()
            && self.diffuse.is_valid()
            && self.specular.is_valid()
    }

    pub fn extent(&self) -> TargetExtent {
        self.extent
    }

    pub fn depth(&self) -> &GpuTexture {
        &self.depth
    }

    pub fn normal(&self) -> &GpuTexture {
        &self.normal
    }

    pub fn diffuse(&self) -> &GpuTexture {
        &self.diffuse
    }

    pub fn specular(&self) -> &GpuTexture {
        &self.specular
    }

    pub fn color_targets() -> [wgpu::TextureFormat; Self::COLOR_ATTACHMENTS] {
        [Self::COLOR_FORMAT; Self::COLOR_ATTACHMENTS]
    }
}

fn color(view: &wgpu::TextureView) -> Option<wgpu::RenderPassColorAttachment<'_>> {
    Some(wgpu::RenderPassColorAttachment {
        view,
        depth_slice: None,
        resolve_target: None,
        ops: wgpu::Operations {
            load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
            store: wgpu::StoreOp::Store,
        },
    })
}
