//! Indexed triangle mesh container.
//!
//! The decoded output of the pipeline: positions, normals and vertex colors
//! plus triangle indices, ready for PLY export.

use glam::Vec3;

/// An indexed triangle mesh with per-vertex normals and colors.
#[derive(Debug, Clone, Default)]
pub struct TriMesh {
    /// Vertex positions.
    pub positions: Vec<Vec3>,

    /// Per-vertex unit normals.
    pub normals: Vec<Vec3>,

    /// Per-vertex RGB colors.
    pub colors: Vec<[u8; 3]>,

    /// Triangle vertex indices, counter-clockwise winding.
    pub indices: Vec<[u32; 3]>,
}

impl TriMesh {
    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    /// Whether the mesh has no geometry at all.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() || self.indices.is_empty()
    }

    /// Axis-aligned bounding box, or `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.positions.first()?;
        let mut min = first;
        let mut max = first;
        for p in &self.positions[1..] {
            min = min.min(*p);
            max = max.max(*p);
        }
        Some((min, max))
    }

    /// Recompute per-vertex normals from face geometry.
    ///
    /// Face normals are accumulated area-weighted onto their vertices, so
    /// large triangles dominate the shared normal.
    pub fn recompute_normals(&mut self) {
        let mut normals = vec![Vec3::ZERO; self.positions.len()];

        for tri in &self.indices {
            let [a, b, c] = tri.map(|i| i as usize);
            let e1 = self.positions[b] - self.positions[a];
            let e2 = self.positions[c] - self.positions[a];
            let face_normal = e1.cross(e2);
            normals[a] += face_normal;
            normals[b] += face_normal;
            normals[c] += face_normal;
        }

        self.normals = normals
            .into_iter()
            .map(|n| n.normalize_or_zero())
            .collect();
    }
}
