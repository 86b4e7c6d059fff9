use std::rc::Rc;

use glam::{Mat4, Vec3};

use crate::renderer::gpu::GpuMesh;
use crate::renderer::material::SurfaceMaterial;
use crate::scene::Transform;

/// What the renderers need from anything they draw.
pub trait Renderable {
    fn world_transform(&self) -> Mat4;
    fn mesh(&self) -> &GpuMesh;
    fn material(&self) -> &SurfaceMaterial;

    fn visible(&self) -> bool {
        true
    }

    /// World-space centre and radius for frustum culling; `None` is never culled.
    fn bounding_sphere(&self) -> Option<(Vec3, f32)> {
        None
    }
}

/// Stock [`Renderable`]: a transform, a mesh and a shared surface material.
#[derive(Clone)]
pub struct RenderObject {
    pub transform: Transform,
    pub mesh: GpuMesh,
    pub material: Rc<SurfaceMaterial>,
    pub visible: bool,
    /// Radius of the mesh's bounding sphere in local space.
    pub local_radius: Option<f32>,
}

impl RenderObject {
    pub fn new(mesh: GpuMesh, material: Rc<SurfaceMaterial>) -> Self {
        Self {
            transform: Transform::default(),
            mesh,
            material,
            visible: true,
            local_radius: None,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_local_radius(mut self, radius: f32) -> Self {
        self.local_radius = Some(radius);
        self
    }
}

impl Renderable for RenderObject {
    fn world_transform(&self) -> Mat4 {
        self.transform.matrix()
    }

    fn mesh(&self) -> &GpuMesh {
        &self.mesh
    }

    fn material(&self) -> &SurfaceMaterial {
        &self.material
    }

    fn visible(&self) -> bool {
        self.visible
    }

    fn bounding_sphere(&self) -> Option<(Vec3, f32)> {
        let radius = self.local_radius?;
        let scale = self.transform.scale.abs().max_element();
        Some((self.transform.translation, radius * scale))
    }
}
