//! Static mesh loading from Wavefront OBJ text.
//!
//! Only the subset the boat model needs is understood: `v`, `vn` and
//! triangular `f` records. Each face corner assigns its normal to the vertex
//! it references, so the result has exactly one normal per vertex.

use std::path::Path;

use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};
use thiserror::Error;

/// Mesh loading errors
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read mesh file: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("line {line}: index {index} is out of range")]
    IndexOutOfRange { line: usize, index: i64 },
}

/// Per-vertex data uploaded for the mesh pipeline
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 4],
    pub normal: [f32; 3],
}

/// Triangle mesh with one normal per vertex
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vec4>,
    pub normals: Vec<Vec3>,
    pub faces: Vec<[u32; 3]>,
}

impl Mesh {
    /// Interleaved position/normal data
    pub fn vertex_data(&self) -> Vec<MeshVertex> {
        self.vertices
            .iter()
            .zip(&self.normals)
            .map(|(p, n)| MeshVertex {
                position: p.to_array(),
                normal: n.to_array(),
            })
            .collect()
    }

    /// Flattened triangle indices
    pub fn index_data(&self) -> Vec<u32> {
        self.faces.iter().flatten().copied().collect()
    }
}

/// Read and parse an OBJ file
pub fn load_obj(path: impl AsRef<Path>) -> Result<Mesh, AssetError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let mesh = parse_obj(&text)?;
    log::info!(
        "Loaded {}: {} vertices, {} faces",
        path.display(),
        mesh.vertices.len(),
        mesh.faces.len()
    );
    Ok(mesh)
}

/// Parse OBJ text
pub fn parse_obj(text: &str) -> Result<Mesh, AssetError> {
    let mut mesh = Mesh::default();
    let mut normals: Vec<Vec3> = Vec::new();

    for (i, raw) in text.lines().enumerate() {
        let line = i + 1;
        let mut fields = raw.split_whitespace();
        let Some(record) = fields.next() else {
            continue;
        };

        match record {
            "v" => {
                let [x, y, z] = parse_floats(fields, line)?;
                mesh.vertices.push(Vec4::new(x, y, z, 1.0));
            }
            "vn" => {
                let [x, y, z] = parse_floats(fields, line)?;
                normals.push(Vec3::new(x, y, z));
            }
            "f" => {
                mesh.normals.resize(mesh.vertices.len(), Vec3::ZERO);
                let mut face = [0u32; 3];
                for corner in &mut face {
                    let token = fields.next().ok_or_else(|| AssetError::Parse {
                        line,
                        message: "face needs three corners".to_string(),
                    })?;
                    let (vertex, normal) = parse_corner(token, line)?;
                    let vertex = resolve(vertex, mesh.vertices.len(), line)?;
                    if let Some(normal) = normal {
                        let normal = resolve(normal, normals.len(), line)?;
                        mesh.normals[vertex] = normals[normal];
                    }
                    *corner = vertex as u32;
                }
                if fields.next().is_some() {
                    return Err(AssetError::Parse {
                        line,
                        message: "only triangular faces are supported".to_string(),
                    });
                }
                mesh.faces.push(face);
            }
            r if r.starts_with('#') => {}
            other => log::debug!("Skipping OBJ record '{}' on line {}", other, line),
        }
    }

    mesh.normals.resize(mesh.vertices.len(), Vec3::ZERO);
    Ok(mesh)
}

fn parse_floats<'a>(
    mut fields: impl Iterator<Item = &'a str>,
    line: usize,
) -> Result<[f32; 3], AssetError> {
    let mut out = [0.0; 3];
    for value in &mut out {
        let field = fields.next().ok_or_else(|| AssetError::Parse {
            line,
            message: "expected three coordinates".to_string(),
        })?;
        *value = field.parse().map_err(|_| AssetError::Parse {
            line,
            message: format!("invalid number '{field}'"),
        })?;
    }
    Ok(out)
}

/// Split a `v`, `v/vt`, `v//vn` or `v/vt/vn` corner into its 1-based indices
fn parse_corner(token: &str, line: usize) -> Result<(i64, Option<i64>), AssetError> {
    let parse = |s: &str| {
        s.parse::<i64>().map_err(|_| AssetError::Parse {
            line,
            message: format!("invalid face index '{s}'"),
        })
    };

    let mut parts = token.split('/');
    let vertex = parse(parts.next().unwrap_or_default())?;
    let normal = match parts.nth(1) {
        Some(s) if !s.is_empty() => Some(parse(s)?),
        _ => None,
    };
    Ok((vertex, normal))
}

/// Convert a 1-based (or negative, relative) OBJ index into a 0-based one
fn resolve(index: i64, len: usize, line: usize) -> Result<usize, AssetError> {
    let resolved = if index > 0 {
        index - 1
    } else {
        len as i64 + index
    };
    if index == 0 || resolved < 0 || resolved >= len as i64 {
        return Err(AssetError::IndexOutOfRange { line, index });
    }
    Ok(resolved as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = "\
# one triangle
v 0 0 0
v 1 0 0
v 0 0 1
vn 0 1 0
vn 0 -1 0
vt 0 0
f 1/1/1 2/1/1 3/1/2
";

    #[test]
    fn test_parse_triangle() {
        let mesh = parse_obj(TRIANGLE).unwrap();
        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.vertices[1], Vec4::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(mesh.faces, vec![[0, 1, 2]]);
        assert_eq!(mesh.normals, vec![Vec3::Y, Vec3::Y, Vec3::NEG_Y]);
        assert_eq!(mesh.index_data(), vec![0, 1, 2]);
        assert_eq!(mesh.vertex_data()[2].normal, [0.0, -1.0, 0.0]);
    }

    #[test]
    fn test_later_corner_overwrites_normal() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nv 1 1 0\nvn 0 0 1\nvn 1 0 0\n\
                    f 1//1 2//1 3//1\nf 2//2 4//2 3//2\n";
        let mesh = parse_obj(text).unwrap();
        assert_eq!(mesh.normals[0], Vec3::Z);
        assert_eq!(mesh.normals[1], Vec3::X);
        assert_eq!(mesh.normals[3], Vec3::X);
    }

    #[test]
    fn test_position_only_faces_and_negative_indices() {
        let mesh = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n").unwrap();
        assert_eq!(mesh.faces, vec![[0, 1, 2]]);
        assert_eq!(mesh.normals, vec![Vec3::ZERO; 3]);
    }

    #[test]
    fn test_face_index_out_of_range() {
        let err = parse_obj("v 0 0 0\nf 1 2 3\n").unwrap_err();
        assert!(matches!(err, AssetError::IndexOutOfRange { line: 2, index: 2 }));

        let err = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1//4 2 3\n").unwrap_err();
        assert!(matches!(err, AssetError::IndexOutOfRange { line: 4, index: 4 }));
    }

    #[test]
    fn test_malformed_records() {
        let err = parse_obj("v 0 zero 0\n").unwrap_err();
        assert!(matches!(err, AssetError::Parse { line: 1, .. }));

        let err = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nv 1 1 0\nf 1 2 3 4\n").unwrap_err();
        assert!(matches!(err, AssetError::Parse { line: 5, .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = load_obj("/nonexistent/boat.obj").unwrap_err();
        assert!(matches!(err, AssetError::Io(_)));
    }
}
