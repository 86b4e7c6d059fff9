//! The passes of a frame, in recording order: shadow maps, then one [`ShadingPath`], then the
//! sky. Everything is recorded into the caller's encoder; nothing here submits.

mod deferred;
mod forward;
mod shadow;
mod skybox;
mod ssao;

pub use deferred::DeferredRenderer;
pub use forward::ForwardRenderer;
pub use shadow::{ShadowLight, ShadowMapRenderer, ShadowOutputs};
pub use skybox::SkyBoxRenderer;
pub use ssao::SsaoRenderer;

use crate::renderer::assets::Assets;
use crate::renderer::context::GpuContext;
use crate::renderer::gpu::{GpuMesh, GpuProgram};
use crate::renderer::material::MaterialResourceCache;
use crate::renderer::primitives;
use crate::renderer::targets::{DepthBuffer, GBuffer};
use crate::scene::RenderContext;

pub const FULL_SCREEN_QUAD_MESH: &str = "FullScreenQuad";
pub const POINT_LIGHT_MESH: &str = "PointLightMesh";

/// Where the sky pass finds out which pixels geometry already covered.
pub enum SkyDepth<'a> {
    Attachment(&'a DepthBuffer),
    GBuffer(&'a GBuffer),
}

/// One way of turning the visible objects into a lit image: forward or deferred.
pub trait ShadingPath {
    fn render(
        &mut self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        ctx: &RenderContext<'_>,
        target: &wgpu::TextureView,
    );

    fn resize(&mut self, gpu: &GpuContext, width: u32, height: u32);

    fn sky_depth(&self) -> SkyDepth<'_>;

    /// Every program the path draws with, for the startup validity check.
    fn programs(&self) -> Vec<&GpuProgram>;

    fn release(self: Box<Self>, cache: &mut MaterialResourceCache);
}

pub(crate) fn full_screen_quad(gpu: &GpuContext, assets: &mut Assets) -> GpuMesh {
    assets
        .meshes
        .get_or_add(gpu, FULL_SCREEN_QUAD_MESH, primitives::full_screen_quad)
}

pub(crate) fn point_light_mesh(gpu: &GpuContext, assets: &mut Assets) -> GpuMesh {
    assets
        .meshes
        .get_or_add(gpu, POINT_LIGHT_MESH, || primitives::sphere(1.0, 20, 20))
}

/// Color attachment over the output target. `clear` starts from black.
pub(crate) fn output_attachment(
    target: &wgpu::TextureView,
    clear: bool,
) -> Option<wgpu::RenderPassColorAttachment<'_>> {
    let load = if clear {
        wgpu::LoadOp::Clear(wgpu::Color::BLACK)
    } else {
        wgpu::LoadOp::Load
    };
    Some(wgpu::RenderPassColorAttachment {
        view: target,
        depth_slice: None,
        resolve_target: None,
        ops: wgpu::Operations {
            load,
            store: wgpu::StoreOp::Store,
        },
    })
}
