use crate::renderer::lights::SceneLighting;
use crate::renderer::passes::ShadowOutputs;
use crate::scene::{Camera, Renderable};

/// Everything a pass may read for one frame, assembled by the scene before any pass runs.
pub struct RenderContext<'a> {
    pub camera: &'a Camera,
    pub lighting: &'a SceneLighting,
    /// Visible objects in draw order.
    pub objects: &'a [&'a dyn Renderable],
    pub shadows: &'a ShadowOutputs,
    pub arena_radius: f32,
}
