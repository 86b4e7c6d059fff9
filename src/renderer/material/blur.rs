use std::rc::Rc;

use bytemuck::{Pod, Zeroable};

use super::{
    bind_group_layout, depth_entry, load_shader, pipeline_layout, unfiltered_entry, view_entry,
    MaterialKind, MaterialResourceCache, MaterialType, SCENE_GROUP, SCREEN_INPUT_GROUP,
};
use crate::renderer::assets::Assets;
use crate::renderer::constants::{BLUR_KERNEL_RADIUS, BLUR_PACKED_WEIGHT_COUNT, BLUR_SIGMA};
use crate::renderer::context::GpuContext;
use crate::renderer::gpu::{GpuProgram, UniformBuffer};
use crate::renderer::kernels::{gaussian_weights, pack_weights};
use crate::renderer::pipeline_builder::PipelineBuilder;
use crate::renderer::targets::{GBuffer, SsaoMap};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlurDirection {
    Horizontal,
    Vertical,
}

impl BlurDirection {
    fn index(self) -> usize {
        match self {
            Self::Horizontal => 0,
            Self::Vertical => 1,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug)]
pub struct EdgeBlurSceneUniform {
    pub inv_projection: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug)]
struct BlurWeightsUniform {
    weights: [[f32; 4]; BLUR_PACKED_WEIGHT_COUNT],
}

pub struct EdgeBlurShared {
    horizontal: GpuProgram,
    vertical: GpuProgram,
    scene: UniformBuffer<EdgeBlurSceneUniform>,
    _weights: UniformBuffer<BlurWeightsUniform>,
    scene_group: wgpu::BindGroup,
    input_layout: wgpu::BindGroupLayout,
}

type InputKey = (u64, u64);

/// Separable Gaussian over an AO map, damped across depth and normal discontinuities.
///
/// Keeps one input bind group per direction since the two passes read different maps.
pub struct EdgeBlurMaterial {
    shared: Rc<EdgeBlurShared>,
    inputs: [Option<(InputKey, wgpu::BindGroup)>; 2],
}

impl MaterialType for EdgeBlurMaterial {
    const KIND: MaterialKind = MaterialKind::EdgeBlur;
    type Shared = EdgeBlurShared;

    fn create_shared(gpu: &GpuContext, assets: &mut Assets) -> EdgeBlurShared {
        let device = &gpu.device;
        let shader = load_shader(gpu, assets, "EdgeBlurShader", &[], include_str!("../../shader/blur.wgsl"));

        let scene_layout = bind_group_layout(
            device,
            "EdgeBlurSceneLayout",
            &[
                UniformBuffer::<EdgeBlurSceneUniform>::layout_entry(0, wgpu::ShaderStages::FRAGMENT),
                UniformBuffer::<BlurWeightsUniform>::layout_entry(1, wgpu::ShaderStages::FRAGMENT),
            ],
        );
        let input_layout = bind_group_layout(
            device,
            "EdgeBlurInputLayout",
            &[unfiltered_entry(0), depth_entry(1), unfiltered_entry(2)],
        );
        let layout = pipeline_layout(device, "EdgeBlurPipelineLayout", &[&scene_layout, &input_layout]);

        let link = |label: &str, entry: &str| {
            GpuProgram::link(device, label, &shader, |module| {
                PipelineBuilder::new(device, &layout, module)
                    .with_label(label)
                    .with_fragment_entry(entry)
                    .with_color_target(SsaoMap::FORMAT, None)
                    .with_ignored_depth(SsaoMap::DEPTH_FORMAT)
                    .with_no_culling()
                    .build()
            })
        };
        let horizontal = link("EdgeBlurHorizontalProgram", "fs_horizontal");
        let vertical = link("EdgeBlurVerticalProgram", "fs_vertical");

        let scene = UniformBuffer::new(device, "EdgeBlurScene", &EdgeBlurSceneUniform::zeroed());
        let weights = UniformBuffer::new(
            device,
            "EdgeBlurWeights",
            &BlurWeightsUniform {
                weights: pack_weights(&gaussian_weights(BLUR_KERNEL_RADIUS, BLUR_SIGMA)),
            },
        );
        let scene_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("EdgeBlurScene"),
            layout: &scene_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: scene.binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: weights.binding(),
                },
            ],
        });

        EdgeBlurShared {
            horizontal,
            vertical,
            scene,
            _weights: weights,
            scene_group,
            input_layout,
        }
    }
}

impl EdgeBlurMaterial {
    pub fn new(gpu: &GpuContext, cache: &mut MaterialResourceCache, assets: &mut Assets) -> Self {
        Self {
            shared: cache.acquire::<Self>(gpu, assets),
            inputs: [None, None],
        }
    }

    pub fn program(&self, direction: BlurDirection) -> &GpuProgram {
        match direction {
            BlurDirection::Horizontal => &self.shared.horizontal,
            BlurDirection::Vertical => &self.shared.vertical,
        }
    }

    pub fn update_scene(&self, gpu: &GpuContext, scene: &EdgeBlurSceneUniform) {
        self.shared.scene.write(&gpu.queue, scene);
    }

    /// `source` is the map this direction reads from; the pass writes the other one.
    pub fn update_inputs(
        &mut self,
        gpu: &GpuContext,
        direction: BlurDirection,
        source: &SsaoMap,
        gbuffer: &GBuffer,
    ) {
        let key = (source.extent().generation, gbuffer.extent().generation);
        let slot = &mut self.inputs[direction.index()];
        if matches!(slot, Some((current, _)) if *current == key) {
            return;
        }
        let group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("EdgeBlurInputs"),
            layout: &self.shared.input_layout,
            entries: &[
                view_entry(0, source.occlusion().view()),
                view_entry(1, gbuffer.depth().view()),
                view_entry(2, gbuffer.normal().view()),
            ],
        });
        *slot = Some((key, group));
    }

    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>, direction: BlurDirection) {
        self.program(direction).bind(pass);
        pass.set_bind_group(SCENE_GROUP, &self.shared.scene_group, &[]);
        let (_, inputs) = self.inputs[direction.index()]
            .as_ref()
            .expect("edge blur material bound before update_inputs");
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
    fn weights_block_is_packed_vec4s() {
        assert_eq!(
            std::mem::size_of::<BlurWeightsUniform>(),
            16 * BLUR_PACKED_WEIGHT_COUNT
        );
    }

    #[test]
    fn directions_use_distinct_slots() {
        assert_ne!(
            BlurDirection::Horizontal.index(),
            BlurDirection::Vertical.index()
        );
    }
}
