use super::gpu::CpuMesh;
use super::vertex::{v, Vertex};
use std::f32::consts::PI;

/// UV sphere centred on the origin. The point-light volumes use `sphere(1.0, 20, 20)`.
pub fn sphere(radius: f32, segments: u32, rings: u32) -> CpuMesh {
    let segments = segments.max(3);
    let rings = rings.max(2);
    let mut vertices = Vec::with_capacity(((rings + 1) * (segments + 1)) as usize);
    let mut indices = Vec::with_capacity((rings * segments * 6) as usize);

    for ring in 0..=rings {
        let phi = PI * ring as f32 / rings as f32;
        let z = phi.cos();
        let ring_radius = phi.sin();

        for segment in 0..=segments {
            let theta = 2.0 * PI * segment as f32 / segments as f32;
            let x = ring_radius * theta.cos();
            let y = ring_radius * theta.sin();

            let normal = [x, y, z];
            let pos = [x * radius, y * radius, z * radius];
            let uv = [segment as f32 / segments as f32, ring as f32 / rings as f32];
            // Direction of increasing theta.
            let tangent = [-theta.sin(), theta.cos(), 0.0, 1.0];

            vertices.push(v(pos, normal, uv, tangent));
        }
    }

    for ring in 0..rings {
        for segment in 0..segments {
            let current = ring * (segments + 1) + segment;
            let next = current + segments + 1;

            indices.extend_from_slice(&[current, next, current + 1]);
            indices.extend_from_slice(&[current + 1, next, next + 1]);
        }
    }

    CpuMesh::new(vertices, indices)
}

/// Two triangles covering clip space, uv origin at the top-left corner.
pub fn full_screen_quad() -> CpuMesh {
    let normal = [0.0, 0.0, 1.0];
    let tangent = [1.0, 0.0, 0.0, 1.0];
    let vertices = vec![
        v([-1.0, -1.0, 0.0], normal, [0.0, 1.0], tangent),
        v([1.0, -1.0, 0.0], normal, [1.0, 1.0], tangent),
        v([1.0, 1.0, 0.0], normal, [1.0, 0.0], tangent),
        v([-1.0, 1.0, 0.0], normal, [0.0, 0.0], tangent),
    ];
    CpuMesh::new(vertices, vec![0, 1, 2, 0, 2, 3])
}

/// Unit square on the XY plane facing +Z, the arena floor once scaled.
pub fn plane() -> CpuMesh {
    let normal = [0.0, 0.0, 1.0];
    let tangent = [1.0, 0.0, 0.0, 1.0];
    let vertices = vec![
        v([-0.5, -0.5, 0.0], normal, [0.0, 1.0], tangent),
        v([0.5, -0.5, 0.0], normal, [1.0, 1.0], tangent),
        v([0.5, 0.5, 0.0], normal, [1.0, 0.0], tangent),
        v([-0.5, 0.5, 0.0], normal, [0.0, 0.0], tangent),
    ];
    CpuMesh::new(vertices, vec![0, 1, 2, 0, 2, 3])
}

pub fn cube() -> CpuMesh {
    // (normal, tangent) per face; positions are derived from the face basis.
    let faces: [([f32; 3], [f32; 3]); 6] = [
        ([1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, -1.0, 0.0]),
        ([0.0, 1.0, 0.0], [-1.0, 0.0, 0.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0]),
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0]),
    ];

    let mut vertices: Vec<Vertex> = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);

    for (normal, tangent) in faces {
        let n = glam::Vec3::from(normal);
        let t = glam::Vec3::from(tangent);
        let b = n.cross(t);
        let base = vertices.len() as u32;

        for (du, dv, uv) in [
            (-0.5, -0.5, [0.0, 1.0]),
            (0.5, -0.5, [1.0, 1.0]),
            (0.5, 0.5, [1.0, 0.0]),
            (-0.5, 0.5, [0.0, 0.0]),
        ] {
            let pos = n * 0.5 + t * du + b * dv;
            vertices.push(v(
                pos.to_array(),
                normal,
                uv,
                [tangent[0], tangent[1], tangent[2], 1.0],
            ));
        }

        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    CpuMesh::new(vertices, indices)
}
