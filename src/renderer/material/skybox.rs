use std::rc::Rc;

use bytemuck::{Pod, Zeroable};

use super::{
    bind_group_layout, depth_entry, load_shader, pipeline_layout, sampler_entry, texture_entry,
    view_entry, MaterialKind, MaterialResourceCache, MaterialType, SCENE_GROUP,
    SCREEN_INPUT_GROUP,
};
use crate::renderer::assets::Assets;
use crate::renderer::context::GpuContext;
use crate::renderer::gpu::{GpuProgram, GpuTextureCube, UniformBuffer};
use crate::renderer::pipeline_builder::PipelineBuilder;
use crate::renderer::targets::{DepthBuffer, GBuffer};

/// How the sky finds the pixels no geometry covered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkyBoxVariant {
    /// Hardware depth test against the forward depth buffer.
    Forward,
    /// No depth attachment; the shader reads the G-buffer depth and discards covered pixels.
    Deferred,
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug)]
pub struct SkyBoxSceneUniform {
    pub inv_sky_view_projection: [[f32; 4]; 4],
}

pub struct SkyBoxShared {
    forward: GpuProgram,
    deferred: GpuProgram,
    scene: UniformBuffer<SkyBoxSceneUniform>,
    scene_group: wgpu::BindGroup,
    forward_layout: wgpu::BindGroupLayout,
    deferred_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
}

pub struct SkyBoxMaterial {
    shared: Rc<SkyBoxShared>,
    variant: SkyBoxVariant,
    cube: GpuTextureCube,
    inputs: Option<(u64, wgpu::BindGroup)>,
}

impl MaterialType for SkyBoxMaterial {
    const KIND: MaterialKind = MaterialKind::SkyBox;
    type Shared = SkyBoxShared;

    fn create_shared(gpu: &GpuContext, assets: &mut Assets) -> SkyBoxShared {
        let device = &gpu.device;
        let shader = load_shader(gpu, assets, "SkyBoxShader", &[], include_str!("../../shader/skybox.wgsl"));

        let scene_layout = bind_group_layout(
            device,
            "SkyBoxSceneLayout",
            &[UniformBuffer::<SkyBoxSceneUniform>::layout_entry(0, wgpu::ShaderStages::VERTEX)],
        );
        let cube = texture_entry(
            0,
            wgpu::TextureSampleType::Float { filterable: true },
            wgpu::TextureViewDimension::Cube,
        );
        let sampler = sampler_entry(1, wgpu::SamplerBindingType::Filtering);
        let forward_layout = bind_group_layout(device, "SkyBoxForwardLayout", &[cube, sampler]);
        let deferred_layout =
            bind_group_layout(device, "SkyBoxDeferredLayout", &[cube, sampler, depth_entry(2)]);

        let forward_pipeline_layout =
            pipeline_layout(device, "SkyBoxForwardPipelineLayout", &[&scene_layout, &forward_layout]);
        let deferred_pipeline_layout =
            pipeline_layout(device, "SkyBoxDeferredPipelineLayout", &[&scene_layout, &deferred_layout]);

        // the quad sits on the far plane, so it only survives where the depth is still cleared
        let forward = GpuProgram::link(device, "SkyBoxForwardProgram", &shader, |module| {
            PipelineBuilder::new(device, &forward_pipeline_layout, module)
                .with_label("SkyBoxForwardProgram")
                .with_fragment_entry("fs_forward")
                .with_color_target(gpu.color_format, None)
                .with_depth_stencil(DepthBuffer::FORMAT, false, wgpu::CompareFunction::LessEqual)
                .with_no_culling()
                .build()
        });
        let deferred = GpuProgram::link(device, "SkyBoxDeferredProgram", &shader, |module| {
            PipelineBuilder::new(device, &deferred_pipeline_layout, module)
                .with_label("SkyBoxDeferredProgram")
                .with_fragment_entry("fs_deferred")
                .with_color_target(gpu.color_format, None)
                .with_no_culling()
                .build()
        });

        let scene = UniformBuffer::new(device, "SkyBoxScene", &SkyBoxSceneUniform::zeroed());
        let scene_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("SkyBoxScene"),
            layout: &scene_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: scene.binding(),
            }],
        });

        SkyBoxShared {
            forward,
            deferred,
            scene,
            scene_group,
            forward_layout,
            deferred_layout,
            sampler: device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some("SkyBoxSampler"),
                mag_filter: wgpu::FilterMode::Linear,
                min_filter: wgpu::FilterMode::Linear,
                ..Default::default()
            }),
        }
    }
}

impl SkyBoxMaterial {
    pub fn new(
        gpu: &GpuContext,
        cache: &mut MaterialResourceCache,
        assets: &mut Assets,
        variant: SkyBoxVariant,
        cube: GpuTextureCube,
    ) -> Self {
        Self {
            shared: cache.acquire::<Self>(gpu, assets),
            variant,
            cube,
            inputs: None,
        }
    }

    pub fn variant(&self) -> SkyBoxVariant {
        self.variant
    }

    pub fn program(&self) -> &GpuProgram {
        match self.variant {
            SkyBoxVariant::Forward => &self.shared.forward,
            SkyBoxVariant::Deferred => &self.shared.deferred,
        }
    }

    pub fn update_scene(&self, gpu: &GpuContext, scene: &SkyBoxSceneUniform) {
        self.shared.scene.write(&gpu.queue, scene);
    }

    /// `gbuffer` is required by the deferred variant and ignored by the forward one.
    pub fn update_inputs(&mut self, gpu: &GpuContext, gbuffer: Option<&GBuffer>) {
        let generation = gbuffer.map_or(0, |gbuffer| gbuffer.extent().generation);
        if matches!(&self.inputs, Some((current, _)) if *current == generation) {
            return;
        }
        let mut entries = vec![
            view_entry(0, self.cube.view()),
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&self.shared.sampler),
            },
        ];
        let layout = match (self.variant, gbuffer) {
            (SkyBoxVariant::Forward, _) => &self.shared.forward_layout,
            (SkyBoxVariant::Deferred, Some(gbuffer)) => {
                entries.push(view_entry(2, gbuffer.depth().view()));
                &self.shared.deferred_layout
            }
            (SkyBoxVariant::Deferred, None) => {
                panic!("deferred skybox needs the G-buffer depth")
            }
        };
        let group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("SkyBoxInputs"),
            layout,
            entries: &entries,
        });
        self.inputs = Some((generation, group));
    }

    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>) {
        self.program().bind(pass);
        pass.set_bind_group(SCENE_GROUP, &self.shared.scene_group, &[]);
        let (_, inputs) = self
            .inputs
            .as_ref()
            .expect("skybox material bound before update_inputs");
        pass.set_bind_group(SCREEN_INPUT_GROUP, inputs, &[]);
    }

    pub fn release(self, cache: &mut MaterialResourceCache) {
        drop(self.shared);
        cache.release(Self::KIND);
    }
}
