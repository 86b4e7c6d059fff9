use std::rc::Rc;

use bytemuck::{Pod, Zeroable};

use super::{
    bind_group_layout, depth_entry, load_shader, pipeline_layout, shadow_bind_entries,
    shadow_layout_entries, shadow_sampling_wgsl, unfiltered_entry, view_entry, MaterialKind,
    MaterialResourceCache, MaterialType, SCENE_GROUP, SCREEN_INPUT_GROUP,
};
use crate::renderer::assets::Assets;
use crate::renderer::constants::DIR_LIGHT_COUNT;
use crate::renderer::context::GpuContext;
use crate::renderer::gpu::{GpuProgram, UniformBuffer};
use crate::renderer::lights::DirectionalLightRaw;
use crate::renderer::passes::ShadowOutputs;
use crate::renderer::pipeline_builder::PipelineBuilder;
use crate::renderer::targets::{GBuffer, SsaoMap};

/// Binding of the first shadow entry in the input group, after the G-buffer and AO inputs.
pub(super) const SHADOW_BINDING: u32 = 5;

/// View-space lighting block. `shadow_transforms` map view-space positions straight into each
/// light's shadow clip space.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug)]
pub struct DirLightSceneUniform {
    pub inv_projection: [[f32; 4]; 4],
    pub shadow_transforms: [[[f32; 4]; 4]; DIR_LIGHT_COUNT],
    pub ambient: [f32; 4],
    pub dir_lights: [DirectionalLightRaw; DIR_LIGHT_COUNT],
    pub shadow_size_bias: [[f32; 4]; DIR_LIGHT_COUNT],
}

pub struct DirLightShared {
    program: GpuProgram,
    scene: UniformBuffer<DirLightSceneUniform>,
    scene_group: wgpu::BindGroup,
    input_layout: wgpu::BindGroupLayout,
}

/// Identity of the textures an input bind group was built from.
type InputKey = (u64, u64);

/// Ambient and every directional light in one full-screen draw over the G-buffer.
pub struct DirLightMaterial {
    shared: Rc<DirLightShared>,
    inputs: Option<(InputKey, wgpu::BindGroup)>,
}

impl MaterialType for DirLightMaterial {
    const KIND: MaterialKind = MaterialKind::DirLightShading;
    type Shared = DirLightShared;

    fn create_shared(gpu: &GpuContext, assets: &mut Assets) -> DirLightShared {
        let device = &gpu.device;
        let shadow_snippet = shadow_sampling_wgsl(SCREEN_INPUT_GROUP, SHADOW_BINDING);
        let shader = load_shader(
            gpu,
            assets,
            "DirLightShader",
            &[&shadow_snippet],
            include_str!("../../shader/dir_light.wgsl"),
        );

        let scene_layout = bind_group_layout(
            device,
            "DirLightSceneLayout",
            &[UniformBuffer::<DirLightSceneUniform>::layout_entry(0, wgpu::ShaderStages::FRAGMENT)],
        );
        let mut input_entries = vec![
            depth_entry(0),
            unfiltered_entry(1),
            unfiltered_entry(2),
            unfiltered_entry(3),
            unfiltered_entry(4),
        ];
        input_entries.extend(shadow_layout_entries(SHADOW_BINDING));
        let input_layout = bind_group_layout(device, "DirLightInputLayout", &input_entries);

        let layout = pipeline_layout(device, "DirLightPipelineLayout", &[&scene_layout, &input_layout]);
        let program = GpuProgram::link(device, "DirLightProgram", &shader, |module| {
            PipelineBuilder::new(device, &layout, module)
                .with_label("DirLightProgram")
                .with_color_target(gpu.color_format, None)
                .with_no_culling()
                .build()
        });

        let scene = UniformBuffer::new(device, "DirLightScene", &DirLightSceneUniform::zeroed());
        let scene_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("DirLightScene"),
            layout: &scene_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: scene.binding(),
            }],
        });

        DirLightShared {
            program,
            scene,
            scene_group,
            input_layout,
        }
    }
}

impl DirLightMaterial {
    pub fn new(gpu: &GpuContext, cache: &mut MaterialResourceCache, assets: &mut Assets) -> Self {
        Self {
            shared: cache.acquire::<Self>(gpu, assets),
            inputs: None,
        }
    }

    pub fn program(&self) -> &GpuProgram {
        &self.shared.program
    }

    pub fn update_scene(&self, gpu: &GpuContext, scene: &DirLightSceneUniform) {
        self.shared.scene.write(&gpu.queue, scene);
    }

    /// Rebuilds the input bind group when the G-buffer or the AO map was reallocated.
    pub fn update_inputs(
        &mut self,
        gpu: &GpuContext,
        gbuffer: &GBuffer,
        ao: &SsaoMap,
        shadows: &ShadowOutputs,
    ) {
        let key = (gbuffer.extent().generation, ao.extent().generation);
        if matches!(&self.inputs, Some((current, _)) if *current == key) {
            return;
        }
        let mut entries = vec![
            view_entry(0, gbuffer.depth().view()),
            view_entry(1, gbuffer.normal().view()),
            view_entry(2, gbuffer.diffuse().view()),
            view_entry(3, gbuffer.specular().view()),
            view_entry(4, ao.occlusion().view()),
        ];
        entries.extend(shadow_bind_entries(SHADOW_BINDING, shadows));
        let group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("DirLightInputs"),
            layout: &self.shared.input_layout,
            entries: &entries,
        });
        self.inputs = Some((key, group));
    }

    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>) {
        self.shared.program.bind(pass);
        pass.set_bind_group(SCENE_GROUP, &self.shared.scene_group, &[]);
        let (_, inputs) = self
            .inputs
            .as_ref()
            .expect("directional light material bound before update_inputs");
        pass.set_bind_group(SCREEN_INPUT_GROUP, inputs, &[]);
    }

    pub fn release(self, cache: &mut MaterialResourceCache) {
        drop(self.shared);
        cache.release(Self::KIND);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shadow_inputs_follow_gbuffer_and_ao() {
        assert_eq!(SHADOW_BINDING, GBuffer::COLOR_ATTACHMENTS as u32 + 2);
    }

    #[test]
    fn scene_uniform_is_vec4_aligned() {
        assert_eq!(std::mem::size_of::<DirLightSceneUniform>() % 16, 0);
    }
}
