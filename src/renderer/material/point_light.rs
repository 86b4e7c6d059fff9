use std::rc::Rc;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use super::{
    bind_group_layout, depth_entry, load_shader, pipeline_layout, unfiltered_entry, view_entry,
    MaterialKind, MaterialResourceCache, MaterialType, INSTANCE_GROUP, SCENE_GROUP,
};
use crate::renderer::assets::Assets;
use crate::renderer::context::GpuContext;
use crate::renderer::gpu::{DynamicUniformBuffer, GpuProgram, UniformBuffer};
use crate::renderer::kernels::point_light_volume_transform;
use crate::renderer::lights::{PointLight, PointLightRaw};
use crate::renderer::pipeline_builder::PipelineBuilder;
use crate::renderer::targets::GBuffer;

const INPUT_GROUP: u32 = 2;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug)]
pub struct PointLightSceneUniform {
    pub projection: [[f32; 4]; 4],
    pub inv_projection: [[f32; 4]; 4],
}

/// One light volume: its view-space transform and the light in view space.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug)]
pub struct PointLightInstanceUniform {
    pub view_world: [[f32; 4]; 4],
    pub light: PointLightRaw,
}

impl PointLightInstanceUniform {
    pub fn new(light: &PointLight, view: Mat4) -> Self {
        let volume = point_light_volume_transform(light.position, light.radius);
        Self {
            view_world: (view * volume).to_cols_array_2d(),
            light: PointLightRaw::from_light(light, view),
        }
    }
}

pub struct PointLightShared {
    program: GpuProgram,
    scene: UniformBuffer<PointLightSceneUniform>,
    scene_group: wgpu::BindGroup,
    instance_layout: wgpu::BindGroupLayout,
    input_layout: wgpu::BindGroupLayout,
}

/// Additive shading of one point light per draw of its bounding sphere.
///
/// This is the only program with a blend state; every other pass overwrites its target.
pub struct PointLightMaterial {
    shared: Rc<PointLightShared>,
    lights: DynamicUniformBuffer<PointLightInstanceUniform>,
    inputs: Option<(u64, wgpu::BindGroup)>,
}

impl MaterialType for PointLightMaterial {
    const KIND: MaterialKind = MaterialKind::PointLightShading;
    type Shared = PointLightShared;

    fn create_shared(gpu: &GpuContext, assets: &mut Assets) -> PointLightShared {
        let device = &gpu.device;
        let shader = load_shader(
            gpu,
            assets,
            "PointLightShader",
            &[],
            include_str!("../../shader/point_light.wgsl"),
        );

        let scene_layout = bind_group_layout(
            device,
            "PointLightSceneLayout",
            &[UniformBuffer::<PointLightSceneUniform>::layout_entry(
                0,
                wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            )],
        );
        let instance_layout = bind_group_layout(
            device,
            "PointLightInstanceLayout",
            &[DynamicUniformBuffer::<PointLightInstanceUniform>::layout_entry(
                0,
                wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            )],
        );
        let input_layout = bind_group_layout(
            device,
            "PointLightInputLayout",
            &[
                depth_entry(0),
                unfiltered_entry(1),
                unfiltered_entry(2),
                unfiltered_entry(3),
            ],
        );

        let layout = pipeline_layout(
            device,
            "PointLightPipelineLayout",
            &[&scene_layout, &instance_layout, &input_layout],
        );
        // Front-face culling without depth test: every covered pixel is shaded once, also
        // with the camera inside the volume.
        let program = GpuProgram::link(device, "PointLightProgram", &shader, |module| {
            PipelineBuilder::new(device, &layout, module)
                .with_label("PointLightProgram")
                .with_additive_color_target(gpu.color_format)
                .with_cull_mode(Some(wgpu::Face::Front))
                .build()
        });

        let scene = UniformBuffer::new(device, "PointLightScene", &PointLightSceneUniform::zeroed());
        let scene_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("PointLightScene"),
            layout: &scene_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: scene.binding(),
            }],
        });

        PointLightShared {
            program,
            scene,
            scene_group,
            instance_layout,
            input_layout,
        }
    }
}

impl PointLightMaterial {
    pub fn new(gpu: &GpuContext, cache: &mut MaterialResourceCache, assets: &mut Assets) -> Self {
        let shared = cache.acquire::<Self>(gpu, assets);
        let lights = DynamicUniformBuffer::new(
            &gpu.device,
            "PointLightInstances",
            &shared.instance_layout,
            crate::renderer::constants::POINT_LIGHT_COUNT as u32,
        );
        Self {
            shared,
            lights,
            inputs: None,
        }
    }

    pub fn program(&self) -> &GpuProgram {
        &self.shared.program
    }

    pub fn update_scene(&mut self, gpu: &GpuContext, scene: &PointLightSceneUniform) {
        self.shared.scene.write(&gpu.queue, scene);
        self.lights.begin_frame();
    }

    pub fn update_inputs(&mut self, gpu: &GpuContext, gbuffer: &GBuffer) {
        let generation = gbuffer.extent().generation;
        if matches!(&self.inputs, Some((current, _)) if *current == generation) {
            return;
        }
        let group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("PointLightInputs"),
            layout: &self.shared.input_layout,
            entries: &[
                view_entry(0, gbuffer.depth().view()),
                view_entry(1, gbuffer.normal().view()),
                view_entry(2, gbuffer.diffuse().view()),
                view_entry(3, gbuffer.specular().view()),
            ],
        });
        self.inputs = Some((generation, group));
    }

    pub fn push_light(&mut self, light: &PointLightInstanceUniform) -> u32 {
        self.lights.push(light)
    }

    pub fn flush(&mut self, gpu: &GpuContext) {
        self.lights.flush(&gpu.device, &gpu.queue);
    }

    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>) {
        self.shared.program.bind(pass);
        pass.set_bind_group(SCENE_GROUP, &self.shared.scene_group, &[]);
        let (_, inputs) = self
            .inputs
            .as_ref()
            .expect("point light material bound before update_inputs");
        pass.set_bind_group(INPUT_GROUP, inputs, &[]);
    }

    pub fn bind_instance(&self, pass: &mut wgpu::RenderPass<'_>, offset: u32) {
        pass.set_bind_group(INSTANCE_GROUP, self.lights.bind_group(), &[offset]);
    }

    pub fn release(mut self, cache: &mut MaterialResourceCache) {
        self.lights.release();
        drop(self.shared);
        cache.release(Self::KIND);
    }
}
