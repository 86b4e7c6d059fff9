pub mod camera;
pub mod context;
pub mod renderable;
pub mod scene;
pub mod transform;

pub use camera::Camera;
pub use context::RenderContext;
pub use renderable::{RenderObject, Renderable};
pub use scene::Scene;
pub use transform::Transform;
