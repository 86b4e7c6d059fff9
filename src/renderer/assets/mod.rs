mod library;

pub use library::{AssetLibrary, GpuAsset, UploadToGpu};

use crate::renderer::gpu::{CpuMesh, CpuTexture, CpuTextureCube, ShaderSource};

/// Libraries shared by every material and renderer.
#[derive(Default)]
pub struct Assets {
    pub meshes: AssetLibrary<CpuMesh>,
    pub textures: AssetLibrary<CpuTexture>,
    pub cubes: AssetLibrary<CpuTextureCube>,
    pub shaders: AssetLibrary<ShaderSource>,
}

impl Assets {
    pub fn release(&mut self) {
        self.meshes.clear();
        self.textures.clear();
        self.cubes.clear();
        self.shaders.clear();
    }
}
