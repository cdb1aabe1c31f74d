use std::io::Write;
use std::path::Path;

use tracing::warn;
use voxmesh_buffer::{FaceBuffer, VectorBuffer, VertexBuffer};
use voxmesh_core::{Result, VoxError};
use voxmesh_math::{Point3, Vector3};

use super::parse_floats;
use crate::mesh::Mesh;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitingSolid,
    InSolid,
    InFacet,
    InLoop,
}

#[derive(Default)]
struct Collected {
    name: Option<String>,
    vertices: Vec<[f64; 3]>,
    normals: Vec<[f64; 3]>,
    faces: Vec<[usize; 3]>,
}

/// Parse ASCII STL text.
///
/// Every facet contributes three fresh vertices sharing the facet normal, so the result
/// usually needs [`Mesh::unify_duplicate_vertices`]. A malformed or unexpected line ends the
/// current solid; parsing resumes at the next `solid` line.
pub fn parse(text: &str, compute_missing_normals: bool) -> Result<Mesh> {
    let mut out = Collected::default();
    let mut state = State::AwaitingSolid;
    let mut normal = Vector3::ZERO;
    let mut facet: Vec<Point3> = Vec::with_capacity(3);
    let mut saw_solid = false;

    for (n, line) in text.lines().enumerate() {
        let lineno = n + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut tokens = line.split_whitespace();
        let keyword = tokens.next().unwrap_or_default();

        let next = match (state, keyword) {
            (State::AwaitingSolid, "solid") => {
                saw_solid = true;
                let name = line["solid".len()..].trim();
                if !name.is_empty() {
                    out.name = Some(name.to_string());
                }
                Some(State::InSolid)
            }
            // stray lines between solids are skipped
            (State::AwaitingSolid, _) => Some(State::AwaitingSolid),
            (State::InSolid, "endsolid") => Some(State::AwaitingSolid),
            (State::InSolid, "facet") => match tokens.next() {
                Some("normal") => parse_floats::<3>(tokens).map(|n| {
                    normal = Vector3::from_array(n);
                    State::InFacet
                }),
                _ => None,
            },
            (State::InFacet, "outer") => (tokens.next() == Some("loop")).then_some(State::InLoop),
            (State::InFacet, "endfacet") => Some(State::InSolid),
            (State::InLoop, "vertex") => parse_floats::<3>(tokens).map(|v| {
                facet.push(Point3::from_array(v));
                State::InLoop
            }),
            (State::InLoop, "endloop") => {
                if facet.len() < 3 {
                    warn!(
                        line = lineno,
                        vertices = facet.len(),
                        "facet has fewer than three vertices"
                    );
                    None
                } else {
                    if facet.len() > 3 {
                        warn!(
                            line = lineno,
                            vertices = facet.len(),
                            "facet has more than three vertices; extras ignored"
                        );
                    }
                    let [p0, p1, p2] = [facet[0], facet[1], facet[2]];
                    if compute_missing_normals && normal == Vector3::ZERO {
                        normal = (p1 - p0).cross(p2 - p0).normalize();
                    }
                    let base = out.vertices.len();
                    out.vertices.extend([p0, p1, p2].map(|p| p.to_array()));
                    out.normals.extend([normal.to_array(); 3]);
                    out.faces.push([base, base + 1, base + 2]);
                    Some(State::InFacet)
                }
            }
            _ => None,
        };

        match next {
            Some(s) => {
                if s != State::InLoop {
                    facet.clear();
                }
                state = s;
            }
            None => {
                warn!(line = lineno, content = line, "unexpected line; solid aborted");
                state = State::AwaitingSolid;
                normal = Vector3::ZERO;
                facet.clear();
            }
        }
    }

    if !saw_solid {
        return Err(VoxError::Parse("no STL solid found".into()));
    }

    let mut mesh = Mesh::from_buffers(
        VertexBuffer::from_triples(out.vertices),
        VectorBuffer::from_triples(out.normals),
        FaceBuffer::from_triples(out.faces),
    );
    mesh.name = out.name;
    Ok(mesh)
}

fn round_to(x: f64, places: u32) -> f64 {
    let scale = 10f64.powi(places as i32);
    let r = (x * scale).round() / scale;
    // keep "-0" out of the output
    r + 0.0
}

impl Mesh {
    /// Write ASCII STL. The facet normal is the normalized mean of the three vertex normals
    /// when there is one normal per vertex, the right-hand-rule normal otherwise.
    pub fn write_stl_to<W: Write>(&self, out: &mut W) -> Result<()> {
        let name = self.name.as_deref().unwrap_or("ascii");
        let places = self.config.stl_precision;
        let with_normals = self.has_vertex_normals();

        writeln!(out, "solid {name}")?;
        for (f, face) in self.faces.iter_indexed() {
            let normal = if with_normals {
                self.normals.average_normal(&face)
            } else {
                self.faces.normal_of(f, &self.vertices)
            };
            let normal = normal.ok_or(VoxError::OutOfRange {
                index: f,
                len: self.faces.len(),
            })?;
            let [nx, ny, nz] = normal.to_array().map(|x| round_to(x, places));
            writeln!(out, "facet normal {nx} {ny} {nz}")?;
            writeln!(out, "outer loop")?;
            for v in face {
                let [x, y, z] = self.vertices.triple(v)?.map(|x| round_to(x, places));
                writeln!(out, "vertex {x} {y} {z}")?;
            }
            writeln!(out, "endloop")?;
            writeln!(out, "endfacet")?;
        }
        writeln!(out, "endsolid {name}")?;
        Ok(())
    }

    pub fn to_stl(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.write_stl_to(&mut buf)?;
        String::from_utf8(buf).map_err(|e| VoxError::InvalidOperation(e.to_string()))
    }

    pub fn write_stl<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
        self.write_stl_to(&mut file)?;
        file.flush()?;
        Ok(())
    }
}
