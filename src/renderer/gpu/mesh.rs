use crate::renderer::assets::{GpuAsset, UploadToGpu};
use crate::renderer::context::GpuContext;
use crate::renderer::Vertex;
use wgpu::util::DeviceExt;

/// CPU-side geometry, uploaded once through the mesh library.
#[derive(Clone, Debug, Default)]
pub struct CpuMesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl CpuMesh {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        debug_assert!(indices.len() % 3 == 0, "index count must describe triangles");
        Self { vertices, indices }
    }
}

impl UploadToGpu for CpuMesh {
    type Gpu = GpuMesh;

    fn upload_to_gpu(&self, gpu: &GpuContext, label: &str) -> GpuMesh {
        assert!(
            !self.vertices.is_empty() && !self.indices.is_empty(),
            "mesh {label} has no geometry"
        );

        let vertex_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label}.VertexBuffer")),
                contents: bytemuck::cast_slice(&self.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label}.IndexBuffer")),
                contents: bytemuck::cast_slice(&self.indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        GpuMesh {
            buffers: Some(MeshBuffers {
                vertex_buffer,
                index_buffer,
            }),
            index_count: self.indices.len() as u32,
        }
    }
}

#[derive(Clone, Debug)]
struct MeshBuffers {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
}

/// Uploaded geometry. Cloning is cheap; all clones share the same buffers.
#[derive(Clone, Debug)]
pub struct GpuMesh {
    buffers: Option<MeshBuffers>,
    index_count: u32,
}

impl GpuMesh {
    pub fn invalid() -> Self {
        Self {
            buffers: None,
            index_count: 0,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.buffers.is_some()
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>) {
        let buffers = self
            .buffers
            .as_ref()
            .expect("binding a released or invalid mesh");
        pass.set_vertex_buffer(0, buffers.vertex_buffer.slice(..));
        pass.set_index_buffer(buffers.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
    }

    /// Draws the mesh bound by the last `bind` call.
    pub fn render(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }

    /// Drops this handle's reference; the buffers are freed once the last clone is released.
    pub fn release(&mut self) {
        self.buffers = None;
        self.index_count = 0;
    }
}

impl GpuAsset for GpuMesh {
    fn is_valid(&self) -> bool {
        GpuMesh::is_valid(self)
    }

    fn release(&mut self) {
        GpuMesh::release(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_mesh_has_no_indices() {
        let mesh = GpuMesh::invalid();
        assert!(!mesh.is_valid());
        assert_eq!(mesh.index_count(), 0);
    }

    #[test]
    #[should_panic]
    fn cpu_mesh_rejects_partial_triangles_in_debug() {
        if cfg!(debug_assertions) {
            let _ = CpuMesh::new(Vec::new(), vec![0, 1]);
        } else {
            panic!("debug assertions disabled");
        }
    }
}
