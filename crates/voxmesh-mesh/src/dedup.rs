use tracing::{debug, info};

use crate::mesh::Mesh;

impl Mesh {
    /// Merge vertices with bit-identical positions into their lowest-indexed copy.
    ///
    /// Faces are rewritten to the surviving vertices and, when the mesh has one normal per
    /// vertex, each survivor takes the normalized mean of the normals of its copies. All buffer
    /// indexes are rebuilt afterwards. Returns the number of vertices removed.
    pub fn unify_duplicate_vertices(&mut self) -> usize {
        let n = self.vertices.len();
        let mut order: Vec<([f64; 3], usize)> = self
            .vertices
            .iter_indexed()
            .map(|(i, t)| (t.map(|x| x + 0.0), i))
            .collect();
        order.sort_by(|(a, i), (b, j)| {
            a[0].total_cmp(&b[0])
                .then(a[1].total_cmp(&b[1]))
                .then(a[2].total_cmp(&b[2]))
                .then(i.cmp(j))
        });

        let mut primary_of: Vec<usize> = (0..n).collect();
        let mut runs: Vec<Vec<usize>> = Vec::new();
        let mut start = 0;
        while start < order.len() {
            let (position, primary) = order[start];
            let end = start + order[start..].iter().take_while(|(p, _)| *p == position).count();
            if end - start > 1 {
                for &(_, secondary) in &order[start + 1..end] {
                    primary_of[secondary] = primary;
                }
                runs.push(order[start..end].iter().map(|&(_, i)| i).collect());
            }
            start = end;
        }
        if runs.is_empty() {
            debug!(vertices = n, "no duplicate vertices");
            self.rebuild_indexes();
            return 0;
        }

        if self.has_vertex_normals() {
            for run in &runs {
                if let Some(avg) = self.normals.average_normal(run) {
                    self.normals.update(run[0], avg.to_array());
                }
            }
        }

        let mut secondaries = Vec::new();
        let mut map = vec![0; n];
        for i in 0..n {
            if primary_of[i] == i {
                map[i] = i - secondaries.len();
            } else {
                secondaries.push(i);
            }
        }
        // primaries always precede their secondaries, so their slots are already filled
        for &s in &secondaries {
            map[s] = map[primary_of[s]];
        }

        let per_vertex_normals = self.has_vertex_normals();
        self.vertices.remove_and_compact(&secondaries);
        if per_vertex_normals {
            self.normals.remove_and_compact(&secondaries);
        }
        self.faces.remap(&map);
        self.rebuild_indexes();
        self.boundaries = None;

        info!(
            merged = secondaries.len(),
            remaining = self.vertices.len(),
            "unified duplicate vertices"
        );
        secondaries.len()
    }

    pub(crate) fn rebuild_indexes(&mut self) {
        self.vertices.build_index();
        self.normals.build_index();
        self.faces.build_index();
    }
}
