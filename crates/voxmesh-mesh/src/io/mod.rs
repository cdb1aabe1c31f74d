//! Text mesh formats: Wavefront OBJ and ASCII STL.
//!
//! [`Mesh::load`] accepts either a path or the file contents. Input without a newline is
//! taken as a path and its format comes from the extension; anything else is sniffed from
//! its first meaningful line.

pub mod obj;
pub mod stl;

use std::path::Path;

use voxmesh_core::{Result, VoxError};

use crate::config::MeshConfig;
use crate::mesh::Mesh;

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFormat {
    Obj,
    Stl,
}

impl MeshFormat {
    pub fn from_extension(ext: &str) -> Option<MeshFormat> {
        match ext.to_ascii_lowercase().as_str() {
            "obj" => Some(MeshFormat::Obj),
            "stl" => Some(MeshFormat::Stl),
            _ => None,
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<MeshFormat> {
        let path = path.as_ref();
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(MeshFormat::from_extension)
            .ok_or_else(|| {
                VoxError::UnrecognizedFormat(format!(
                    "cannot identify mesh file by extension: {}",
                    path.display()
                ))
            })
    }

    /// Sniff the format from the first line that is neither blank nor a `#` comment.
    pub fn detect(text: &str) -> Result<MeshFormat> {
        let line = text
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty() && !l.starts_with('#'))
            .ok_or_else(|| VoxError::UnrecognizedFormat("input has no content".into()))?;

        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("solid") => Ok(MeshFormat::Stl),
            Some("v") if parse_floats::<3>(tokens).is_some() => Ok(MeshFormat::Obj),
            _ => Err(VoxError::UnrecognizedFormat(format!(
                "cannot guess mesh format from line: {line}"
            ))),
        }
    }
}

/// Parse exactly `N` floats from the front of a token stream; trailing tokens are ignored.
pub(crate) fn parse_floats<'a, const N: usize>(
    mut tokens: impl Iterator<Item = &'a str>,
) -> Option<[f64; N]> {
    let mut out = [0.0; N];
    for slot in &mut out {
        *slot = tokens.next()?.parse().ok()?;
    }
    Some(out)
}

impl Mesh {
    /// Load from a path or from file contents with the default [`MeshConfig`].
    ///
    /// `format` of `None` means detect it.
    pub fn load(input: &str, format: Option<MeshFormat>) -> Result<Mesh> {
        Self::load_with(input, format, MeshConfig::default())
    }

    pub fn load_with(input: &str, format: Option<MeshFormat>, config: MeshConfig) -> Result<Mesh> {
        if input.contains('\n') {
            let format = match format {
                Some(f) => f,
                None => MeshFormat::detect(input)?,
            };
            Self::parse(input, format, config)
        } else {
            let format = match format {
                Some(f) => f,
                None => MeshFormat::from_path(input)?,
            };
            let text = std::fs::read_to_string(input)?;
            Self::parse(&text, format, config)
        }
    }

    /// Parse file contents in a known format.
    pub fn parse(text: &str, format: MeshFormat, config: MeshConfig) -> Result<Mesh> {
        let mesh = match format {
            MeshFormat::Obj => obj::parse(text)?.with_config(config),
            MeshFormat::Stl => {
                let mut mesh =
                    stl::parse(text, config.compute_missing_normals)?.with_config(config);
                if config.unify_on_load {
                    mesh.unify_duplicate_vertices();
                }
                mesh
            }
        };
        Ok(mesh)
    }

    /// Write to `path`, choosing the format from its extension.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        match MeshFormat::from_path(path)? {
            MeshFormat::Obj => self.write_obj(path),
            MeshFormat::Stl => self.write_stl(path),
        }
    }
}
