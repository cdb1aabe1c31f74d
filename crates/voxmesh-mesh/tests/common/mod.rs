#![allow(dead_code)]

use std::collections::HashSet;

use glam::{dvec3, DVec3};
use voxmesh_buffer::{FaceBuffer, VectorBuffer, VertexBuffer};
use voxmesh_mesh::Mesh;

// outward direction, then in-plane axes (u, v) with u x v pointing outward
const SIDES: [([i32; 3], DVec3, DVec3); 6] = [
    ([1, 0, 0], DVec3::Y, DVec3::Z),
    ([-1, 0, 0], DVec3::Z, DVec3::Y),
    ([0, 1, 0], DVec3::Z, DVec3::X),
    ([0, -1, 0], DVec3::X, DVec3::Z),
    ([0, 0, 1], DVec3::X, DVec3::Y),
    ([0, 0, -1], DVec3::Y, DVec3::X),
];

/// Exposed unit squares of a set of voxels, each as its four corners counter-clockwise seen
/// from outside, together with the outward normal.
pub fn exposed_quads(voxels: &[[i32; 3]]) -> Vec<([DVec3; 4], DVec3)> {
    let filled: HashSet<[i32; 3]> = voxels.iter().copied().collect();
    let mut quads = Vec::new();
    for &[x, y, z] in voxels {
        for (d, u, v) in SIDES {
            if filled.contains(&[x + d[0], y + d[1], z + d[2]]) {
                continue;
            }
            let n = dvec3(d[0] as f64, d[1] as f64, d[2] as f64);
            let c0 = dvec3(x as f64, y as f64, z as f64) + n.max(DVec3::ZERO);
            quads.push(([c0, c0 + u, c0 + u + v, c0 + v], n));
        }
    }
    quads
}

/// Triangle soup of the quads, four fresh vertices each, split along `c0`-`c2`.
pub fn soup(quads: &[([DVec3; 4], DVec3)], with_normals: bool) -> Mesh {
    let mut vertices = VertexBuffer::new();
    let mut normals = VectorBuffer::new();
    let mut faces = FaceBuffer::new();
    for (corners, n) in quads {
        let ids = vertices.append_points(corners.iter().copied());
        if with_normals {
            normals.append_vectors([*n; 4]);
        }
        faces.append([[ids[0], ids[1], ids[2]], [ids[0], ids[2], ids[3]]]);
    }
    Mesh::from_buffers(vertices, normals, faces)
}

/// Closed surface of the voxels with duplicate corners merged.
pub fn voxel_mesh(voxels: &[[i32; 3]]) -> Mesh {
    let mut mesh = soup(&exposed_quads(voxels), false);
    mesh.unify_duplicate_vertices();
    mesh
}

pub fn voxel_mesh_with_normals(voxels: &[[i32; 3]]) -> Mesh {
    let mut mesh = soup(&exposed_quads(voxels), true);
    mesh.unify_duplicate_vertices();
    mesh
}

/// Unit cube without its top square.
pub fn open_box() -> Mesh {
    let quads: Vec<_> = exposed_quads(&[[0, 0, 0]])
        .into_iter()
        .filter(|(_, n)| n.z <= 0.0)
        .collect();
    let mut mesh = soup(&quads, false);
    mesh.unify_duplicate_vertices();
    mesh
}

/// Index of the vertex at `p`, if any.
pub fn vertex_at(mesh: &Mesh, p: DVec3) -> Option<usize> {
    mesh.vertices
        .iter_indexed()
        .find(|(_, t)| DVec3::from_array(*t) == p)
        .map(|(i, _)| i)
}
