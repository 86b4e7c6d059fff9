use std::rc::Rc;

use bytemuck::{Pod, Zeroable};

use super::surface::{surface_texture_layout, SurfaceDefaults, SurfaceTextureGroups};
use super::{
    bind_group_layout, load_shader, pipeline_layout, repeat_sampler, shadow_bind_entries,
    shadow_layout_entries, shadow_sampling_wgsl, MaterialKind, MaterialResourceCache,
    MaterialType, ObjectUniform, SurfaceMaterial, INPUT_GROUP, INSTANCE_GROUP, SCENE_GROUP,
    TEXTURE_GROUP,
};
use crate::renderer::assets::Assets;
use crate::renderer::constants::{DIR_LIGHT_COUNT, POINT_LIGHT_COUNT};
use crate::renderer::context::GpuContext;
use crate::renderer::gpu::{DynamicUniformBuffer, GpuProgram, UniformBuffer};
use crate::renderer::lights::{DirectionalLightRaw, PointLightRaw};
use crate::renderer::passes::ShadowOutputs;
use crate::renderer::pipeline_builder::PipelineBuilder;
use crate::renderer::targets::DepthBuffer;

/// Everything the single forward pass needs, in world space.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug)]
pub struct ForwardSceneUniform {
    pub proj_view: [[f32; 4]; 4],
    pub dir_shadow_transforms: [[[f32; 4]; 4]; DIR_LIGHT_COUNT],
    pub ambient: [f32; 4],
    pub eye: [f32; 4],
    pub dir_lights: [DirectionalLightRaw; DIR_LIGHT_COUNT],
    pub point_lights: [PointLightRaw; POINT_LIGHT_COUNT],
    pub shadow_size_bias: [[f32; 4]; DIR_LIGHT_COUNT],
}

pub struct ForwardShared {
    program: GpuProgram,
    scene: UniformBuffer<ForwardSceneUniform>,
    scene_group: wgpu::BindGroup,
    instance_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    input_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    defaults: SurfaceDefaults,
}

pub struct ForwardMaterial {
    shared: Rc<ForwardShared>,
    objects: DynamicUniformBuffer<ObjectUniform>,
    textures: SurfaceTextureGroups,
    inputs: Option<wgpu::BindGroup>,
}

impl MaterialType for ForwardMaterial {
    const KIND: MaterialKind = MaterialKind::Forward;
    type Shared = ForwardShared;

    fn create_shared(gpu: &GpuContext, assets: &mut Assets) -> ForwardShared {
        let device = &gpu.device;
        let shadow_snippet = shadow_sampling_wgsl(INPUT_GROUP, 0);
        let shader = load_shader(
            gpu,
            assets,
            "ForwardShader",
            &[&shadow_snippet],
            include_str!("../../shader/forward.wgsl"),
        );

        let scene_layout = bind_group_layout(
            device,
            "ForwardSceneLayout",
            &[UniformBuffer::<ForwardSceneUniform>::layout_entry(
                0,
                wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            )],
        );
        let instance_layout = bind_group_layout(
            device,
            "ForwardObjectLayout",
            &[DynamicUniformBuffer::<ObjectUniform>::layout_entry(
                0,
                wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            )],
        );
        let texture_layout = surface_texture_layout(device, "ForwardTextureLayout");
        let input_layout = bind_group_layout(device, "ForwardShadowLayout", &shadow_layout_entries(0));

        let layout = pipeline_layout(
            device,
            "ForwardPipelineLayout",
            &[&scene_layout, &instance_layout, &texture_layout, &input_layout],
        );
        let program = GpuProgram::link(device, "ForwardProgram", &shader, |module| {
            PipelineBuilder::new(device, &layout, module)
                .with_label("ForwardProgram")
                .with_color_target(gpu.color_format, None)
                .with_depth_stencil(DepthBuffer::FORMAT, true, wgpu::CompareFunction::LessEqual)
                .build()
        });

        let scene = UniformBuffer::new(device, "ForwardScene", &ForwardSceneUniform::zeroed());
        let scene_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("ForwardScene"),
            layout: &scene_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: scene.binding(),
            }],
        });

        ForwardShared {
            program,
            scene,
            scene_group,
            instance_layout,
            texture_layout,
            input_layout,
            sampler: repeat_sampler(device, "ForwardSurfaceSampler"),
            defaults: SurfaceDefaults::load(gpu, assets),
        }
    }
}

impl ForwardMaterial {
    pub fn new(gpu: &GpuContext, cache: &mut MaterialResourceCache, assets: &mut Assets) -> Self {
        let shared = cache.acquire::<Self>(gpu, assets);
        let objects = DynamicUniformBuffer::new(&gpu.device, "ForwardObjects", &shared.instance_layout, 64);
        Self {
            shared,
            objects,
            textures: SurfaceTextureGroups::default(),
            inputs: None,
        }
    }

    pub fn program(&self) -> &GpuProgram {
        &self.shared.program
    }

    pub fn update_scene(&mut self, gpu: &GpuContext, scene: &ForwardSceneUniform, shadows: &ShadowOutputs) {
        self.shared.scene.write(&gpu.queue, scene);
        if self.inputs.is_none() {
            self.inputs = Some(gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("ForwardShadows"),
                layout: &self.shared.input_layout,
                entries: &shadow_bind_entries(0, shadows),
            }));
        }
        self.objects.begin_frame();
        self.textures.begin_frame();
    }

    /// Queues one draw's block and makes sure the material's textures are bound-ready.
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
        let inputs = self.inputs.as_ref().expect("forward material bound before update_scene");
        pass.set_bind_group(INPUT_GROUP, inputs, &[]);
    }

    pub fn bind_instance(&self, pass: &mut wgpu::RenderPass<'_>, offset: u32, material_id: u64) {
        pass.set_bind_group(INSTANCE_GROUP, self.objects.bind_group(), &[offset]);
        pass.set_bind_group(TEXTURE_GROUP, self.textures.get(material_id), &[]);
    }

    /// Drops the cached shadow bind group, e.g. after the shadow maps were recreated.
    pub fn invalidate_inputs(&mut self) {
        self.inputs = None;
    }

    pub fn release(mut self, cache: &mut MaterialResourceCache) {
        self.objects.release();
        self.textures.clear();
        drop(self.shared);
        cache.release(Self::KIND);
    }
}
