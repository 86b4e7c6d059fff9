use crate::renderer::assets::Assets;
use crate::renderer::context::GpuContext;
use crate::renderer::gpu::{GpuMesh, GpuProgram};
use crate::renderer::material::{
    BlurDirection, EdgeBlurMaterial, EdgeBlurSceneUniform, MaterialResourceCache, SsaoMaterial,
    SsaoSceneUniform,
};
use crate::renderer::targets::{GBuffer, SsaoMap};
use crate::scene::Camera;

/// AO estimate plus the two blur passes, ping-ponging between two equally sized maps.
///
/// Estimate writes map 0, the horizontal blur reads 0 into 1, the vertical blur reads 1 back
/// into 0, which is the [`output`](Self::output).
pub struct SsaoRenderer {
    maps: [SsaoMap; 2],
    estimate: SsaoMaterial,
    blur: EdgeBlurMaterial,
}

impl SsaoRenderer {
    pub fn new(
        gpu: &GpuContext,
        cache: &mut MaterialResourceCache,
        assets: &mut Assets,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            maps: [
                SsaoMap::init(&gpu.device, "SsaoMap.A", width, height),
                SsaoMap::init(&gpu.device, "SsaoMap.B", width, height),
            ],
            estimate: SsaoMaterial::new(gpu, cache, assets),
            blur: EdgeBlurMaterial::new(gpu, cache, assets),
        }
    }

    pub fn resize(&mut self, gpu: &GpuContext, width: u32, height: u32) {
        for map in &mut self.maps {
            map.resize(&gpu.device, width, height);
        }
    }

    pub fn programs(&self) -> [&GpuProgram; 3] {
        [
            self.estimate.program(),
            self.blur.program(BlurDirection::Horizontal),
            self.blur.program(BlurDirection::Vertical),
        ]
    }

    pub fn output(&self) -> &SsaoMap {
        &self.maps[0]
    }

    pub fn render(
        &mut self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        gbuffer: &GBuffer,
        camera: &Camera,
        quad: &GpuMesh,
    ) {
        let [first, second] = &self.maps;

        self.estimate
            .update_scene(gpu, &SsaoSceneUniform::new(camera.projection()));
        self.estimate.update_inputs(gpu, gbuffer);
        {
            let mut pass = first.bind(encoder);
            self.estimate.bind(&mut pass);
            quad.bind(&mut pass);
            quad.render(&mut pass);
            first.unbind(pass);
        }

        self.blur.update_scene(
            gpu,
            &EdgeBlurSceneUniform {
                inv_projection: camera.inv_projection().to_cols_array_2d(),
            },
        );
        for (direction, source, destination) in [
            (BlurDirection::Horizontal, first, second),
            (BlurDirection::Vertical, second, first),
        ] {
            self.blur.update_inputs(gpu, direction, source, gbuffer);
            let mut pass = destination.bind(encoder);
            self.blur.bind(&mut pass, direction);
            quad.bind(&mut pass);
            quad.render(&mut pass);
            destination.unbind(pass);
        }
    }

    pub fn release(mut self, cache: &mut MaterialResourceCache) {
        for map in &mut self.maps {
            map.release();
        }
        self.estimate.release(cache);
        self.blur.release(cache);
    }
}
