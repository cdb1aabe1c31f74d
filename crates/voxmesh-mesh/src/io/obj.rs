use std::io::Write;
use std::path::Path;

use tracing::warn;
use voxmesh_buffer::{FaceBuffer, VectorBuffer, VertexBuffer};
use voxmesh_core::{Result, VoxError};

use super::parse_floats;
use crate::mesh::Mesh;

/// Parse Wavefront OBJ text. Only `v`, `vn` and `f` records are read.
pub fn parse(text: &str) -> Result<Mesh> {
    let mut vertices = Vec::new();
    let mut normals = Vec::new();
    let mut faces = Vec::new();

    for (n, line) in text.lines().enumerate() {
        let lineno = n + 1;
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("v") => vertices.push(
                parse_floats::<3>(tokens)
                    .ok_or_else(|| VoxError::Parse(format!("line {lineno}: malformed vertex")))?,
            ),
            Some("vn") => normals.push(
                parse_floats::<3>(tokens)
                    .ok_or_else(|| VoxError::Parse(format!("line {lineno}: malformed normal")))?,
            ),
            Some("f") => faces.push((lineno, parse_face(tokens, lineno)?)),
            _ => {}
        }
    }

    for &(lineno, face) in &faces {
        if let Some(&v) = face.iter().find(|&&v| v >= vertices.len()) {
            return Err(VoxError::Parse(format!(
                "line {lineno}: face references vertex {} but only {} are defined",
                v + 1,
                vertices.len()
            )));
        }
    }

    Ok(Mesh::from_buffers(
        VertexBuffer::from_triples(vertices),
        VectorBuffer::from_triples(normals),
        FaceBuffer::from_triples(faces.into_iter().map(|(_, f)| f).collect()),
    ))
}

/// Read the position index of each `a`, `a/b`, `a//c` or `a/b/c` token, converted to 0-based.
fn parse_face<'a>(tokens: impl Iterator<Item = &'a str>, lineno: usize) -> Result<[usize; 3]> {
    let mut ids = Vec::with_capacity(3);
    for token in tokens {
        let position = token.split('/').next().unwrap_or(token);
        let id: usize = position.parse().map_err(|_| {
            VoxError::Parse(format!("line {lineno}: bad face vertex '{token}'"))
        })?;
        if id == 0 {
            return Err(VoxError::Parse(format!(
                "line {lineno}: face vertex indices are 1-based"
            )));
        }
        ids.push(id - 1);
    }
    match ids.len() {
        0..=2 => Err(VoxError::Parse(format!(
            "line {lineno}: face has {} vertices",
            ids.len()
        ))),
        3 => Ok([ids[0], ids[1], ids[2]]),
        n => {
            warn!(line = lineno, vertices = n, "polygon truncated to its first three vertices");
            Ok([ids[0], ids[1], ids[2]])
        }
    }
}

impl Mesh {
    /// Write OBJ text. Faces carry `a//a` normal references when there is one normal per vertex.
    pub fn write_obj_to<W: Write>(&self, out: &mut W) -> Result<()> {
        for [x, y, z] in self.vertices.iter() {
            writeln!(out, "v {x} {y} {z}")?;
        }
        for [x, y, z] in self.normals.iter() {
            writeln!(out, "vn {x} {y} {z}")?;
        }
        let with_normals = self.has_vertex_normals();
        for face in self.faces.iter() {
            let [a, b, c] = face.map(|v| v + 1);
            if with_normals {
                writeln!(out, "f {a}//{a} {b}//{b} {c}//{c}")?;
            } else {
                writeln!(out, "f {a} {b} {c}")?;
            }
        }
        Ok(())
    }

    pub fn to_obj(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.write_obj_to(&mut buf)?;
        String::from_utf8(buf).map_err(|e| VoxError::InvalidOperation(e.to_string()))
    }

    pub fn write_obj<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
        self.write_obj_to(&mut file)?;
        file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: &str = "\
# a unit quad
o quad
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 1.0 1.0 0.0
v 0.0 1.0 0.0
vt 0.5 0.5
vn 0.0 0.0 1.0
f 1/1/1 2/1/1 3/1/1
f 1//1 3//1 4//1
";

    #[test]
    fn test_parse() {
        let mesh = parse(QUAD).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.normals.len(), 1);
        assert_eq!(mesh.faces.to_vec(), vec![[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn test_polygon_truncated() {
        let mesh = parse("v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n").unwrap();
        assert_eq!(mesh.faces.to_vec(), vec![[0, 1, 2]]);
    }

    #[test]
    fn test_bad_faces() {
        assert!(matches!(parse("v 0 0 0\nf 0 1 1\n"), Err(VoxError::Parse(_))));
        assert!(matches!(parse("v 0 0 0\nf -1 1 1\n"), Err(VoxError::Parse(_))));
        assert!(matches!(parse("v 0 0 0\nf 1 1\n"), Err(VoxError::Parse(_))));
        assert!(matches!(parse("v 0 0 0\nf 1 1 2\n"), Err(VoxError::Parse(_))));
        assert!(matches!(parse("v 0 zero 0\n"), Err(VoxError::Parse(_))));
    }

    #[test]
    fn test_write_without_vertex_normals() {
        let mesh = parse(QUAD).unwrap();
        let text = mesh.to_obj().unwrap();
        assert!(text.contains("v 1 1 0\n"));
        assert!(text.contains("vn 0 0 1\n"));
        assert!(text.contains("f 1 3 4\n"));
    }

    #[test]
    fn test_write_with_vertex_normals() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nvn 0 0 1\nvn 0 0 1\nf 1 2 3\n";
        let out = parse(text).unwrap().to_obj().unwrap();
        assert!(out.ends_with("f 1//1 2//2 3//3\n"));
    }
}
