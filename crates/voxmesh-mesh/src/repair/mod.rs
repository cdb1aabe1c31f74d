//! Non-manifold edge repair for voxel surfaces.
//!
//! Where two voxels touch along an edge only, that edge carries four faces. Each vertex on
//! such a seam is split into coincident copies, one per locally flat sheet, the copies are
//! pushed a small distance apart along their sheet's normal, and squares that end up with
//! more than four corners are retriangulated.

mod classify;
mod square;

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use voxmesh_core::{Result, VoxError};
use voxmesh_math::{Point3, Vector3};

pub use classify::SeamVertexKind;
use classify::plan;
use square::{Corner, Square, SquareId, SquareSet};

use crate::mesh::Mesh;

/// Summary of one [`Mesh::repair_non_manifold_edges`] run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepairReport {
    pub non_manifold_edges: usize,
    pub seams: usize,
    /// Every seam vertex with its classification, in processing order
    pub classified: Vec<(usize, SeamVertexKind)>,
    /// Vertex copies plus inserted square centres
    pub vertices_added: usize,
    pub squares_retriangulated: usize,
}

impl Mesh {
    /// Split every vertex on an edge shared by four faces so that no edge keeps more than two.
    ///
    /// The whole pass fails on the first seam vertex whose local topology is not one of the
    /// known [`SeamVertexKind`]s, or on a face next to a seam that is not half of a unit
    /// square. Buffers may be partly modified when an error is returned.
    pub fn repair_non_manifold_edges(&mut self) -> Result<RepairReport> {
        let nm_edges = self.edges_with_valence(4);
        let mut report = RepairReport {
            non_manifold_edges: nm_edges.len(),
            ..RepairReport::default()
        };
        if nm_edges.is_empty() {
            debug!("no non-manifold edges");
            return Ok(report);
        }

        let seams = seams_of(&nm_edges);
        let mut incident: BTreeMap<usize, usize> = BTreeMap::new();
        for v in nm_edges.iter().flatten() {
            *incident.entry(*v).or_insert(0) += 1;
        }
        report.seams = seams.len();
        debug!(edges = nm_edges.len(), seams = seams.len(), "non-manifold edges found");

        let tolerance = self.config.tolerance;
        let with_normals = self.has_vertex_normals();
        let mut squares = SquareSet::default();
        let mut nudges: BTreeMap<usize, Vector3> = BTreeMap::new();
        let mut fill_faces = Vec::new();

        for seam in &seams {
            for &v in seam {
                let ids = squares.around(self, v, tolerance)?;
                let groups = group_by_half_normal_point(&ids, &squares.squares);
                let sizes: Vec<usize> = groups.iter().map(Vec::len).collect();
                let edges = incident.get(&v).copied().unwrap_or(0);
                let kind = SeamVertexKind::classify(edges, ids.len(), &sizes).ok_or(
                    VoxError::UnclassifiableVertex {
                        vertex: v,
                        edges,
                        squares: ids.len(),
                        groups: groups.len(),
                    },
                )?;
                debug!(vertex = v, ?kind, squares = ids.len(), ?sizes, "seam vertex classified");
                report.classified.push((v, kind));

                let split = plan(kind, groups, &squares.squares, tolerance);
                let new_vs = self.split_vertex(v, kind.copies(), with_normals)?;
                if split.groups.len() != new_vs.len() {
                    return Err(VoxError::SplitMismatch {
                        vertex: v,
                        copies: new_vs.len(),
                        groups: split.groups.len(),
                    });
                }
                report.vertices_added += new_vs.len() - 1;

                if split.fill_split_edge {
                    let neighbor = split_neighbor(&squares.squares, &split.groups, v)?;
                    fill_faces.push([new_vs[0], new_vs[1], neighbor]);
                }
                for &id in &split.retriangulate {
                    squares.squares[id].replace_corner(v, Corner::Split(new_vs.clone()));
                }
                for (group, &copy) in split.groups.iter().zip(&new_vs) {
                    let sum: Vector3 =
                        group.iter().map(|&id| squares.squares[id].half_normal).sum();
                    nudges.insert(copy, sum.normalize_or_zero() * self.config.nudge_distance);
                    for &id in group {
                        squares.squares[id].replace_corner(v, Corner::Single(copy));
                    }
                }
            }
        }

        // classification is done; moving vertices can no longer affect it
        for (&v, &offset) in &nudges {
            self.vertices.translate(v, offset);
        }

        let mut doomed = Vec::new();
        let mut new_faces = Vec::new();
        for square in squares.squares.values() {
            let corners = square.vertices();
            if corners.len() > 4 {
                doomed.extend(square.faces);
                new_faces.extend(self.retriangulate(square, &corners, with_normals)?);
                report.squares_retriangulated += 1;
                if corners.len() > 5 {
                    report.vertices_added += 1;
                }
            } else {
                for f in square.faces {
                    let face = self.faces.triple(f)?;
                    self.faces.set(f, face.map(|v| square.mapped(v)))?;
                }
            }
        }

        self.faces.remove(&doomed);
        let directed: HashSet<[usize; 2]> = self
            .faces
            .iter()
            .chain(new_faces.iter().copied())
            .flat_map(|[a, b, c]| [[a, b], [b, c], [c, a]])
            .collect();
        let fill_faces = fill_faces.into_iter().map(|face| wound_against(face, &directed));
        self.faces.append(new_faces.into_iter().chain(fill_faces));
        self.faces.optimize();
        self.rebuild_indexes();
        self.boundaries = None;

        info!(
            seams = report.seams,
            vertices_added = report.vertices_added,
            retriangulated = report.squares_retriangulated,
            "non-manifold edges repaired"
        );
        Ok(report)
    }

    /// Append `copies` duplicates of vertex `v` (and of its normal). Returns `v` followed by
    /// the copies.
    fn split_vertex(&mut self, v: usize, copies: usize, with_normals: bool) -> Result<Vec<usize>> {
        let position = self.vertices.triple(v)?;
        let mut ids = vec![v];
        ids.extend(self.vertices.append(std::iter::repeat(position).take(copies)));
        if with_normals {
            let normal = self.normals.triple(v)?;
            self.normals.append(std::iter::repeat(normal).take(copies));
        }
        Ok(ids)
    }

    /// Triangles covering a square whose corners now span five or more vertices.
    ///
    /// Corners are ordered by angle in the plane across the dominant axis of the half-normal
    /// and the order is flipped when it would wind against it. Five corners fan out from the
    /// corner opposite the split pair; more get a new centre vertex to fan around.
    fn retriangulate(
        &mut self,
        square: &Square,
        corners: &[usize],
        with_normals: bool,
    ) -> Result<Vec<[usize; 3]>> {
        let hn = square.half_normal;
        let a = hn.abs();
        let drop = if a.x >= a.y && a.x >= a.z {
            0
        } else if a.y >= a.z {
            1
        } else {
            2
        };
        let (u, w) = match drop {
            0 => (1, 2),
            1 => (0, 2),
            _ => (0, 1),
        };
        // counter-clockwise in (u, w) winds around +x, -y or +z respectively
        let sign = if drop == 1 { -1.0 } else { 1.0 };

        let points = corners
            .iter()
            .map(|&v| self.vertices.triple(v).map(Point3::from_array))
            .collect::<Result<Vec<_>>>()?;
        let centre = points.iter().copied().sum::<Point3>() / points.len() as f64;

        let mut order: Vec<(f64, usize)> = corners
            .iter()
            .zip(&points)
            .map(|(&v, p)| ((p[w] - centre[w]).atan2(p[u] - centre[u]), v))
            .collect();
        order.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        let mut ring: Vec<usize> = order.into_iter().map(|(_, v)| v).collect();
        if sign * hn[drop] < 0.0 {
            ring.reverse();
        }
        let n = ring.len();

        if n == 5 {
            let pair = square.split_corner().unwrap_or_default();
            let start = (0..n)
                .find(|&i| pair.contains(&ring[i]) && pair.contains(&ring[(i + 1) % n]))
                .ok_or_else(|| {
                    VoxError::Geometry(format!(
                        "split corners of square {:?} are not adjacent after reordering",
                        square.faces
                    ))
                })?;
            ring.rotate_left(start);
            return Ok(vec![
                [ring[3], ring[4], ring[0]],
                [ring[3], ring[0], ring[1]],
                [ring[3], ring[1], ring[2]],
            ]);
        }

        let mid = self.vertices.append([centre.to_array()])[0];
        if with_normals {
            self.normals.append([hn.normalize().to_array()]);
        }
        Ok((0..n).map(|i| [ring[(i + n - 1) % n], ring[i], mid]).collect())
    }
}

/// Connected components of the non-manifold edge graph, each in breadth-first order from
/// its lowest edge.
fn seams_of(edges: &BTreeSet<[usize; 2]>) -> Vec<Vec<usize>> {
    let mut adjacency: BTreeMap<usize, BTreeSet<usize>> = BTreeMap::new();
    for &[a, b] in edges {
        adjacency.entry(a).or_default().insert(b);
        adjacency.entry(b).or_default().insert(a);
    }

    let mut seen = BTreeSet::new();
    let mut seams = Vec::new();
    for &[a, b] in edges {
        if seen.contains(&a) {
            continue;
        }
        let mut seam = vec![a, b];
        seen.insert(a);
        seen.insert(b);
        let mut queue = VecDeque::from([a, b]);
        while let Some(v) = queue.pop_front() {
            for &n in adjacency.get(&v).into_iter().flatten() {
                if seen.insert(n) {
                    seam.push(n);
                    queue.push_back(n);
                }
            }
        }
        seams.push(seam);
    }
    seams
}

/// Group squares by exact half-normal point, then order groups by size. Equal sizes keep
/// the order in which their first square was met.
fn group_by_half_normal_point(
    ids: &[SquareId],
    squares: &slotmap::SlotMap<SquareId, Square>,
) -> Vec<Vec<SquareId>> {
    let mut slot_of: HashMap<[u64; 3], usize> = HashMap::new();
    let mut groups: Vec<Vec<SquareId>> = Vec::new();
    for &id in ids {
        let key = squares[id].half_normal_point_key();
        let slot = *slot_of.entry(key).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(id);
    }
    groups.sort_by_key(Vec::len);
    groups
}

/// Flip `face` if it runs along any directed edge already used by a neighbour, so its
/// winding matches the surface around it.
fn wound_against(face: [usize; 3], directed: &HashSet<[usize; 2]>) -> [usize; 3] {
    let [a, b, c] = face;
    if [[a, b], [b, c], [c, a]].iter().any(|e| directed.contains(e)) {
        [b, a, c]
    } else {
        face
    }
}

/// The vertex other than `v` shared by the last square of each of the two groups.
fn split_neighbor(
    squares: &slotmap::SlotMap<SquareId, Square>,
    groups: &[Vec<SquareId>],
    v: usize,
) -> Result<usize> {
    let last = |g: &Vec<SquareId>| g.last().map(|&id| squares[id].vertices());
    let (Some(a), Some(b)) = (groups.first().and_then(last), groups.get(1).and_then(last)) else {
        return Err(VoxError::Topology(format!("vertex {v} has fewer than two square groups")));
    };
    a.into_iter()
        .find(|x| *x != v && b.contains(x))
        .ok_or_else(|| {
            VoxError::Topology(format!("no vertex next to {v} is shared across the split"))
        })
}
