//! GPU resource handles. Each one owns its wgpu objects, can be released explicitly and has an
//! invalid state that is reported by `is_valid`.

mod mesh;
mod program;
mod texture;
mod uniform;

pub use mesh::{CpuMesh, GpuMesh};
pub use program::{GpuProgram, GpuShader, ShaderSource};
pub use texture::{CpuTexture, CpuTextureCube, GpuTexture, GpuTextureCube};
pub use uniform::{DynamicUniformBuffer, UniformBuffer};
