use std::rc::Rc;

use bytemuck::{Pod, Zeroable};

use super::surface::{surface_texture_layout, SurfaceDefaults, SurfaceTextureGroups};
use super::{
    bind_group_layout, load_shader, pipeline_layout, repeat_sampler, MaterialKind,
    MaterialResourceCache, MaterialType, ObjectUniform, SurfaceMaterial, INSTANCE_GROUP,
    SCENE_GROUP, TEXTURE_GROUP,
};
use crate::renderer::assets::Assets;
use crate::renderer::context::GpuContext;
use crate::renderer::gpu::{DynamicUniformBuffer, GpuProgram, UniformBuffer};
use crate::renderer::pipeline_builder::PipelineBuilder;
use crate::renderer::targets::GBuffer;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug)]
pub struct GBufferSceneUniform {
    pub projection: [[f32; 4]; 4],
}

pub struct GBufferShared {
    program: GpuProgram,
    scene: UniformBuffer<GBufferSceneUniform>,
    scene_group: wgpu::BindGroup,
    instance_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    defaults: SurfaceDefaults,
}

/// Fills the G-buffer with view-space normals, albedo and specular parameters.
pub struct GBufferMaterial {
    shared: Rc<GBufferShared>,
    objects: DynamicUniformBuffer<ObjectUniform>,
    textures: SurfaceTextureGroups,
}

impl MaterialType for GBufferMaterial {
    const KIND: MaterialKind = MaterialKind::GBufferBuild;
    type Shared = GBufferShared;

    fn create_shared(gpu: &GpuContext, assets: &mut Assets) -> GBufferShared {
        let device = &gpu.device;
        let shader = load_shader(
            gpu,
            assets,
            "GBufferShader",
            &[],
            include_str!("../../shader/gbuffer.wgsl"),
        );

        let scene_layout = bind_group_layout(
            device,
            "GBufferSceneLayout",
            &[UniformBuffer::<GBufferSceneUniform>::layout_entry(0, wgpu::ShaderStages::VERTEX)],
        );
        let instance_layout = bind_group_layout(
            device,
            "GBufferObjectLayout",
            &[DynamicUniformBuffer::<ObjectUniform>::layout_entry(
                0,
                wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            )],
        );
        let texture_layout = surface_texture_layout(device, "GBufferTextureLayout");
        let layout = pipeline_layout(
            device,
            "GBufferPipelineLayout",
            &[&scene_layout, &instance_layout, &texture_layout],
        );

        let program = GpuProgram::link(device, "GBufferProgram", &shader, |module| {
            let mut builder = PipelineBuilder::new(device, &layout, module).with_label("GBufferProgram");
            for format in GBuffer::color_targets() {
                builder = builder.with_color_target(format, None);
            }
            builder
                .with_depth_stencil(GBuffer::DEPTH_FORMAT, true, wgpu::CompareFunction::Less)
                .build()
        });

        let scene = UniformBuffer::new(device, "GBufferScene", &GBufferSceneUniform::zeroed());
        let scene_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("GBufferScene"),
            layout: &scene_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: scene.binding(),
            }],
        });

        GBufferShared {
            program,
            scene,
            scene_group,
            instance_layout,
            texture_layout,
            sampler: repeat_sampler(device, "GBufferSurfaceSampler"),
            defaults: SurfaceDefaults::load(gpu, assets),
        }
    }
}

impl GBufferMaterial {
    pub fn new(gpu: &GpuContext, cache: &mut MaterialResourceCache, assets: &mut Assets) -> Self {
        let shared = cache.acquire::<Self>(gpu, assets);
        let objects = DynamicUniformBuffer::new(&gpu.device, "GBufferObjects", &shared.instance_layout, 64);
        Self {
            shared,
            objects,
            textures: SurfaceTextureGroups::default(),
        }
    }

    pub fn program(&self) -> &GpuProgram {
        &self.shared.program
    }

    pub fn update_scene(&mut self, gpu: &GpuContext, scene: &GBufferSceneUniform) {
        self.shared.scene.write(&gpu.queue, scene);
        self.objects.begin_frame();
        self.textures.begin_frame();
    }

    pub fn push_object(
        &mut self,
        gpu: &GpuContext,
        object: &ObjectUniform,
        material: &SurfaceMaterial,
    ) -> u32 {
        self.textures.prepare(
            gpu,
            &self.shared.texture_layout,
            &self.shared.sampler,
            &self.shared.defaults,
            material,
        );
        self.objects.push(object)
    }

    pub fn flush(&mut self, gpu: &GpuContext) {
        self.objects.flush(&gpu.device, &gpu.queue);
        self.textures.evict_undrawn();
    }

    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>) {
        self.shared.program.bind(pass);
        pass.set_bind_group(SCENE_GROUP, &self.shared.scene_group, &[]);
    }

    pub fn bind_instance(&self, pass: &mut wgpu::RenderPass<'_>, offset: u32, material_id: u64) {
        pass.set_bind_group(INSTANCE_GROUP, self.objects.bind_group(), &[offset]);
        pass.set_bind_group(TEXTURE_GROUP, self.textures.get(material_id), &[]);
    }

    pub fn release(mut self, cache: &mut MaterialResourceCache) {
        self.objects.release();
        self.textures.clear();
        drop(self.shared);
        cache.release(Self::KIND);
    }
}
