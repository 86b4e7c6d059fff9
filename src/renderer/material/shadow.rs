use std::rc::Rc;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use super::{
    bind_group_layout, load_shader, pipeline_layout, MaterialKind, MaterialResourceCache,
    MaterialType,
};
use crate::renderer::assets::Assets;
use crate::renderer::context::GpuContext;
use crate::renderer::gpu::{DynamicUniformBuffer, GpuProgram};
use crate::renderer::pipeline_builder::PipelineBuilder;
use crate::renderer::targets::ShadowMap;

/// The depth pass has no scene block, so its per-draw block sits at group 0.
const SHADOW_INSTANCE_GROUP: u32 = 0;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug)]
struct ShadowInstanceUniform {
    light_proj_view_world: [[f32; 4]; 4],
}

pub struct ShadowShared {
    program: GpuProgram,
    instance_layout: wgpu::BindGroupLayout,
}

/// Position-only depth material for the shadow maps.
pub struct ShadowMaterial {
    shared: Rc<ShadowShared>,
    instances: DynamicUniformBuffer<ShadowInstanceUniform>,
}

impl MaterialType for ShadowMaterial {
    const KIND: MaterialKind = MaterialKind::ShadowDepth;
    type Shared = ShadowShared;

    fn create_shared(gpu: &GpuContext, assets: &mut Assets) -> ShadowShared {
        let device = &gpu.device;
        let shader = load_shader(
            gpu,
            assets,
            "ShadowShader",
            &[],
            include_str!("../../shader/shadow.wgsl"),
        );
        let instance_layout = bind_group_layout(
            device,
            "ShadowInstanceLayout",
            &[DynamicUniformBuffer::<ShadowInstanceUniform>::layout_entry(
                0,
                wgpu::ShaderStages::VERTEX,
            )],
        );
        let layout = pipeline_layout(device, "ShadowPipelineLayout", &[&instance_layout]);
        let program = GpuProgram::link(device, "ShadowProgram", &shader, |module| {
            PipelineBuilder::new(device, &layout, module)
                .with_label("ShadowProgram")
                .depth_only()
                .with_no_culling()
                .with_depth_stencil(ShadowMap::FORMAT, true, wgpu::CompareFunction::Less)
                .build()
        });
        ShadowShared {
            program,
            instance_layout,
        }
    }
}

impl ShadowMaterial {
    pub fn new(gpu: &GpuContext, cache: &mut MaterialResourceCache, assets: &mut Assets) -> Self {
        let shared = cache.acquire::<Self>(gpu, assets);
        let instances = DynamicUniformBuffer::new(&gpu.device, "ShadowInstances", &shared.instance_layout, 64);
        Self { shared, instances }
    }

    pub fn program(&self) -> &GpuProgram {
        &self.shared.program
    }

    pub fn begin_frame(&mut self) {
        self.instances.begin_frame();
    }

    /// Queues one draw as seen from a light; slots are shared by every light of the frame.
    pub fn push(&mut self, light_proj_view: Mat4, world: Mat4) -> u32 {
        self.instances.push(&ShadowInstanceUniform {
            light_proj_view_world: (light_proj_view * world).to_cols_array_2d(),
        })
    }

    pub fn flush(&mut self, gpu: &GpuContext) {
        self.instances.flush(&gpu.device, &gpu.queue);
    }

    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>) {
        self.shared.program.bind(pass);
    }

    pub fn bind_instance(&self, pass: &mut wgpu::RenderPass<'_>, offset: u32) {
        pass.set_bind_group(SHADOW_INSTANCE_GROUP, self.instances.bind_group(), &[offset]);
    }

    pub fn release(mut self, cache: &mut MaterialResourceCache) {
        self.instances.release();
        drop(self.shared);
        cache.release(Self::KIND);
    }
}
