use glam::{Vec2, Vec3};

use crate::error::{DaeError, Result};

/// An indexed triangle mesh with optional per-vertex normals and texture coordinates.
///
/// `normals` and `texcoords` are either empty or the same length as `positions`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub indices: Vec<u32>,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub texcoords: Vec<Vec2>,
    pub comment: String,
}

impl Mesh {
    pub fn clear(&mut self) {
        self.indices.clear();
        self.positions.clear();
        self.normals.clear();
        self.texcoords.clear();
        self.comment.clear();
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn has_normals(&self) -> bool {
        !self.positions.is_empty() && self.normals.len() == self.positions.len()
    }

    pub fn has_texcoords(&self) -> bool {
        !self.positions.is_empty() && self.texcoords.len() == self.positions.len()
    }

    /// Append another mesh, rebasing its indices by the current vertex count.
    ///
    /// When only one side carries normals or texture coordinates, the other side is
    /// padded with zeros so the attribute arrays stay aligned with `positions`.
    pub fn append(&mut self, mut part: Mesh) -> Result<()> {
        let overflow = || DaeError::InvalidMesh("vertex count exceeds u32 range".to_string());
        let base = u32::try_from(self.positions.len()).map_err(|_| overflow())?;
        let part_vertices = part.positions.len();
        u32::try_from(part_vertices)
            .ok()
            .and_then(|n| base.checked_add(n))
            .ok_or_else(overflow)?;
        let indices = part
            .indices
            .iter()
            .map(|i| i.checked_add(base))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(overflow)?;

        if !part.normals.is_empty() && self.normals.is_empty() && !self.positions.is_empty() {
            log::warn!(
                "Padding {} earlier vertices with zero normals",
                self.positions.len()
            );
            self.normals.resize(self.positions.len(), Vec3::ZERO);
        }
        if part.normals.is_empty() && !self.normals.is_empty() && part_vertices > 0 {
            log::warn!("Padding {} vertices without normals with zero normals", part_vertices);
            part.normals.resize(part_vertices, Vec3::ZERO);
        }

        if !part.texcoords.is_empty() && self.texcoords.is_empty() && !self.positions.is_empty() {
            log::warn!(
                "Padding {} earlier vertices with zero texture coordinates",
                self.positions.len()
            );
            self.texcoords.resize(self.positions.len(), Vec2::ZERO);
        }
        if part.texcoords.is_empty() && !self.texcoords.is_empty() && part_vertices > 0 {
            log::warn!(
                "Padding {} vertices without texture coordinates with zeros",
                part_vertices
            );
            part.texcoords.resize(part_vertices, Vec2::ZERO);
        }

        self.indices.extend(indices);
        self.positions.append(&mut part.positions);
        self.normals.append(&mut part.normals);
        self.texcoords.append(&mut part.texcoords);
        Ok(())
    }

    /// Check that the mesh is a well formed triangle list.
    pub fn validate(&self) -> Result<()> {
        if self.indices.len() % 3 != 0 {
            return Err(DaeError::InvalidMesh(format!(
                "index count {} is not divisible by 3",
                self.indices.len()
            )));
        }

        let vertex_count = self.positions.len();
        if let Some((position, index)) = self
            .indices
            .iter()
            .enumerate()
            .find(|&(_, &i)| i as usize >= vertex_count)
        {
            return Err(DaeError::InvalidMesh(format!(
                "index {} at position {} is out of bounds for {} vertices",
                index, position, vertex_count
            )));
        }

        Ok(())
    }
}
