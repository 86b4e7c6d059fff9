pub mod assets;
pub mod constants;
pub mod context;
pub mod error;
pub mod gpu;
pub mod kernels;
pub mod lights;
pub mod material;
pub mod passes;
pub mod pipeline_builder;
pub mod primitives;
pub mod targets;
pub mod vertex;

pub use context::{GpuContext, SurfaceContext};
pub use error::RenderError;
pub use vertex::Vertex;
