use std::rc::Rc;

use bytemuck::{Pod, Zeroable};
use rand::SeedableRng;

use super::{
    bind_group_layout, depth_entry, load_shader, pipeline_layout, repeat_sampler, sampler_entry,
    texture_entry, unfiltered_entry, view_entry, MaterialKind, MaterialResourceCache,
    MaterialType, SCENE_GROUP, SCREEN_INPUT_GROUP,
};
use crate::renderer::assets::Assets;
use crate::renderer::constants::{
    SSAO_RANDOM_SEED, SSAO_RANDOM_TEXTURE_SIZE, SSAO_RANDOM_TILING, SSAO_SAMPLE_COUNT,
};
use crate::renderer::context::GpuContext;
use crate::renderer::gpu::{CpuTexture, GpuProgram, GpuTexture, UniformBuffer};
use crate::renderer::kernels::ssao_sample_offsets;
use crate::renderer::pipeline_builder::PipelineBuilder;
use crate::renderer::targets::{GBuffer, SsaoMap};

/// Texture library id of the tiled random rotation texture.
pub const RANDOM_DIRECTIONS_TEXTURE: &str = "RandomDirectionsTexture";

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug)]
pub struct SsaoSceneUniform {
    pub projection: [[f32; 4]; 4],
    pub inv_projection: [[f32; 4]; 4],
    /// xy tiling of the random texture over the screen
    pub tiling: [f32; 4],
}

impl SsaoSceneUniform {
    pub fn new(projection: glam::Mat4) -> Self {
        Self {
            projection: projection.to_cols_array_2d(),
            inv_projection: projection.inverse().to_cols_array_2d(),
            tiling: [SSAO_RANDOM_TILING, SSAO_RANDOM_TILING, 0.0, 0.0],
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug)]
struct SsaoKernelUniform {
    offsets: [[f32; 4]; SSAO_SAMPLE_COUNT],
}

impl SsaoKernelUniform {
    fn seeded() -> Self {
        let mut rng = rand::rngs::SmallRng::seed_from_u64(SSAO_RANDOM_SEED);
        Self {
            offsets: ssao_sample_offsets(&mut rng).map(|offset| offset.to_array()),
        }
    }
}

pub struct SsaoShared {
    program: GpuProgram,
    scene: UniformBuffer<SsaoSceneUniform>,
    // constant for the program's lifetime, only kept alive by this handle
    _kernel: UniformBuffer<SsaoKernelUniform>,
    scene_group: wgpu::BindGroup,
    input_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    random: GpuTexture,
}

/// Occlusion estimate from G-buffer depth and normals into an [`SsaoMap`].
pub struct SsaoMaterial {
    shared: Rc<SsaoShared>,
    inputs: Option<(u64, wgpu::BindGroup)>,
}

impl MaterialType for SsaoMaterial {
    const KIND: MaterialKind = MaterialKind::Ssao;
    type Shared = SsaoShared;

    fn create_shared(gpu: &GpuContext, assets: &mut Assets) -> SsaoShared {
        let device = &gpu.device;
        let shader = load_shader(gpu, assets, "SsaoShader", &[], include_str!("../../shader/ssao.wgsl"));

        let scene_layout = bind_group_layout(
            device,
            "SsaoSceneLayout",
            &[
                UniformBuffer::<SsaoSceneUniform>::layout_entry(0, wgpu::ShaderStages::FRAGMENT),
                UniformBuffer::<SsaoKernelUniform>::layout_entry(1, wgpu::ShaderStages::FRAGMENT),
            ],
        );
        let input_layout = bind_group_layout(
            device,
            "SsaoInputLayout",
            &[
                depth_entry(0),
                unfiltered_entry(1),
                texture_entry(
                    2,
                    wgpu::TextureSampleType::Float { filterable: true },
                    wgpu::TextureViewDimension::D2,
                ),
                sampler_entry(3, wgpu::SamplerBindingType::Filtering),
            ],
        );
        let layout = pipeline_layout(device, "SsaoPipelineLayout", &[&scene_layout, &input_layout]);
        let program = GpuProgram::link(device, "SsaoProgram", &shader, |module| {
            PipelineBuilder::new(device, &layout, module)
                .with_label("SsaoProgram")
                .with_color_target(SsaoMap::FORMAT, None)
                .with_ignored_depth(SsaoMap::DEPTH_FORMAT)
                .with_no_culling()
                .build()
        });

        let scene = UniformBuffer::new(device, "SsaoScene", &SsaoSceneUniform::zeroed());
        let kernel = UniformBuffer::new(device, "SsaoKernel", &SsaoKernelUniform::seeded());
        let scene_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("SsaoScene"),
            layout: &scene_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: scene.binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: kernel.binding(),
                },
            ],
        });

        let random = assets.textures.get_or_add(gpu, RANDOM_DIRECTIONS_TEXTURE, || {
            CpuTexture::random(SSAO_RANDOM_TEXTURE_SIZE, SSAO_RANDOM_SEED)
        });

        SsaoShared {
            program,
            scene,
            _kernel: kernel,
            scene_group,
            input_layout,
            sampler: repeat_sampler(device, "SsaoRandomSampler"),
            random,
        }
    }
}

impl SsaoMaterial {
    pub fn new(gpu: &GpuContext, cache: &mut MaterialResourceCache, assets: &mut Assets) -> Self {
        Self {
            shared: cache.acquire::<Self>(gpu, assets),
            inputs: None,
        }
    }

    pub fn program(&self) -> &GpuProgram {
        &self.shared.program
    }

    pub fn update_scene(&self, gpu: &GpuContext, scene: &SsaoSceneUniform) {
        self.shared.scene.write(&gpu.queue, scene);
    }

    pub fn update_inputs(&mut self, gpu: &GpuContext, gbuffer: &GBuffer) {
        let generation = gbuffer.extent().generation;
        if matches!(&self.inputs, Some((current, _)) if *current == generation) {
            return;
        }
        let group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("SsaoInputs"),
            layout: &self.shared.input_layout,
            entries: &[
                view_entry(0, gbuffer.depth().view()),
                view_entry(1, gbuffer.normal().view()),
                view_entry(2, self.shared.random.view()),
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&self.shared.sampler),
                },
            ],
        });
        self.inputs = Some((generation, group));
    }

    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>) {
        self.shared.program.bind(pass);
        pass.set_bind_group(SCENE_GROUP, &self.shared.scene_group, &[]);
        let (_, inputs) = self
            .inputs
            .as_ref()
            .expect("ssao material bound before update_inputs");
        pass.set_bind_group(SCREEN_INPUT_GROUP, inputs, &[]);
    }

    pub fn release(self, cache: &mut MaterialResourceCache) {
        drop(self.shared);
        cache.release(Self::KIND);
    }
}
