use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use voxmesh_core::Tolerance;

use super::square::{Square, SquareId};

/// Local topology of a vertex on a non-manifold seam.
///
/// Named after how the voxels meet around the vertex; each kind fixes how many copies the
/// vertex is split into and which square groups go to which copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SeamVertexKind {
    Top,
    Bottom,
    HalfBottom,
    HalfTop,
    Middle,
    Corner,
    ClosedY,
    OpenY,
    Star,
}

impl SeamVertexKind {
    /// Look up `(non-manifold edges, squares, groups)`. `group_sizes` must be sorted
    /// ascending; it only matters for `(2, 8, 4)`.
    pub fn classify(edges: usize, squares: usize, group_sizes: &[usize]) -> Option<Self> {
        use SeamVertexKind::*;
        let kind = match (edges, squares, group_sizes.len()) {
            (1, 6, 4) => Top,
            (1, 6, 2) => Bottom,
            (1, 7, 3) => HalfBottom,
            (1, 7, 5) => HalfTop,
            (2, 8, 4) => match group_sizes {
                [2, 2, 2, 2] => Middle,
                [1, 2, 2, 3] => Corner,
                _ => return None,
            },
            (3, 9, 3) => ClosedY,
            (3, 9, 4) => OpenY,
            (6, 12, 4) => Star,
            _ => return None,
        };
        Some(kind)
    }

    /// Number of new coincident copies of the vertex.
    pub fn copies(self) -> usize {
        match self {
            SeamVertexKind::ClosedY => 2,
            SeamVertexKind::Star => 3,
            _ => 1,
        }
    }
}

/// How one seam vertex is split.
#[derive(Debug, Default)]
pub(crate) struct SplitPlan {
    /// `groups[0]` keeps the vertex, `groups[i]` moves to copy `i`
    pub groups: Vec<Vec<SquareId>>,
    /// Squares that take every copy and get retriangulated
    pub retriangulate: Vec<SquareId>,
    /// Whether a triangle must close the gap opened between the two copies
    pub fill_split_edge: bool,
}

/// Partition size-sorted square groups across the copies of a vertex of the given kind.
pub(crate) fn plan(
    kind: SeamVertexKind,
    mut groups: Vec<Vec<SquareId>>,
    squares: &SlotMap<SquareId, Square>,
    tolerance: Tolerance,
) -> SplitPlan {
    use SeamVertexKind::*;
    match kind {
        Top => {
            let kept = groups.split_off(2);
            SplitPlan {
                groups: kept,
                retriangulate: groups.concat(),
                ..SplitPlan::default()
            }
        }
        Bottom | ClosedY | Star => SplitPlan {
            groups,
            ..SplitPlan::default()
        },
        HalfBottom => {
            let last = groups.split_off(2);
            SplitPlan {
                groups: vec![groups.concat(), last.concat()],
                ..SplitPlan::default()
            }
        }
        Corner | OpenY => {
            let last = groups.split_off(3);
            SplitPlan {
                groups: vec![groups.concat(), last.concat()],
                ..SplitPlan::default()
            }
        }
        HalfTop => {
            let mut kept = groups.split_off(3);
            let mut retriangulate = Vec::new();
            for id in groups.concat() {
                let hn = squares[id].half_normal;
                match kept
                    .iter()
                    .position(|g| g.iter().any(|&k| squares[k].half_normal == hn))
                {
                    Some(i) => kept[i].push(id),
                    None => retriangulate.push(id),
                }
            }
            SplitPlan {
                groups: kept,
                retriangulate,
                fill_split_edge: true,
            }
        }
        Middle => {
            let mut rest = groups.split_off(1);
            let mut first = groups.concat();
            let anchor = squares[first[0]].half_normal_point;
            let mut second = Vec::new();
            for g in rest.drain(..) {
                let offset = (squares[g[0]].half_normal_point - anchor).abs();
                let unit_steps = offset
                    .to_array()
                    .iter()
                    .filter(|&&d| tolerance.linear_eq(d, 1.0))
                    .count();
                if unit_steps == 1 {
                    first.extend(g);
                } else {
                    second.extend(g);
                }
            }
            SplitPlan {
                groups: vec![first, second],
                ..SplitPlan::default()
            }
        }
    }
}
