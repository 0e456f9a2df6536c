//! Binary PLY serialization.
//!
//! Writes meshes in the binary little-endian PLY format that slicers and
//! mesh viewers ingest: a text header, then packed vertex records
//! (position, normal, uchar color) and uchar-counted triangle faces.

use std::path::Path;

use thiserror::Error;
use tokio::fs;
use tracing::debug;

use crate::mesh::geometry::TriMesh;

#[derive(Error, Debug)]
pub enum PlyError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("vertex attributes disagree: {positions} positions, {normals} normals, {colors} colors")]
    AttributeMismatch {
        positions: usize,
        normals: usize,
        colors: usize,
    },

    #[error("face references vertex {index} but the mesh has {vertices} vertices")]
    IndexOutOfRange { index: u32, vertices: usize },
}

/// Bytes per serialized vertex record: 6 floats plus 3 color bytes.
pub const VERTEX_RECORD_BYTES: usize = 27;

/// Bytes per serialized face record: uchar count plus 3 uint indices.
pub const FACE_RECORD_BYTES: usize = 13;

/// Serialize a mesh into an in-memory binary PLY document.
pub fn encode(mesh: &TriMesh) -> Result<Vec<u8>, PlyError> {
    let vertices = mesh.vertex_count();
    if mesh.normals.len() != vertices || mesh.colors.len() != vertices {
        return Err(PlyError::AttributeMismatch {
            positions: vertices,
            normals: mesh.normals.len(),
            colors: mesh.colors.len(),
        });
    }
    for tri in &mesh.indices {
        if let Some(&index) = tri.iter().find(|&&i| i as usize >= vertices) {
            return Err(PlyError::IndexOutOfRange { index, vertices });
        }
    }

    let faces = mesh.triangle_count();
    let header = format!(
        "ply\n\
         format binary_little_endian 1.0\n\
         comment fast3d-print export\n\
         element vertex {vertices}\n\
         property float x\n\
         property float y\n\
         property float z\n\
         property float nx\n\
         property float ny\n\
         property float nz\n\
         property uchar red\n\
         property uchar green\n\
         property uchar blue\n\
         element face {faces}\n\
         property list uchar uint vertex_indices\n\
         end_header\n"
    );

    let mut out =
        Vec::with_capacity(header.len() + vertices * VERTEX_RECORD_BYTES + faces * FACE_RECORD_BYTES);
    out.extend_from_slice(header.as_bytes());

    for ((position, normal), color) in mesh.positions.iter().zip(&mesh.normals).zip(&mesh.colors) {
        for value in [
            position.x, position.y, position.z, normal.x, normal.y, normal.z,
        ] {
            out.extend_from_slice(&value.to_le_bytes());
        }
        out.extend_from_slice(color);
    }

    for tri in &mesh.indices {
        out.push(3);
        for &index in tri {
            out.extend_from_slice(&index.to_le_bytes());
        }
    }

    Ok(out)
}

/// Write a mesh to disk as binary PLY, creating parent directories as needed.
pub async fn write_mesh(path: &Path, mesh: &TriMesh) -> Result<u64, PlyError> {
    let data = encode(mesh)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    fs::write(path, &data).await?;

    debug!(
        path = %path.display(),
        bytes = data.len(),
        vertices = mesh.vertex_count(),
        faces = mesh.triangle_count(),
        "Wrote PLY file"
    );

    Ok(data.len() as u64)
}
