use std::collections::HashMap;

use glam::{Vec2, Vec3};

use super::input::{Input, InputSet, Semantic};
use super::source::{resolve_source, Source, SourceTable, VerticesAlias};
use crate::error::{DaeError, Result};
use crate::mesh::Mesh;

/// The resolved sources feeding one primitive set.
#[derive(Debug, Clone, Copy)]
pub struct AttributeSources<'a> {
    pub position: &'a Source,
    pub normal: Option<&'a Source>,
    pub texcoord: Option<&'a Source>,
}

impl<'a> AttributeSources<'a> {
    pub fn resolve(
        element: &str,
        set: &InputSet,
        sources: &'a SourceTable,
        vertices: &VerticesAlias,
    ) -> Result<Self> {
        let vertex_source = set
            .vertex_source
            .as_deref()
            .ok_or_else(|| DaeError::malformed_primitives(element, "no VERTEX input"))?;

        Ok(Self {
            position: resolve_source(vertex_source, sources, vertices)?,
            normal: set
                .normal_source
                .as_deref()
                .map(|name| resolve_source(name, sources, vertices))
                .transpose()?,
            texcoord: set
                .texcoord_source
                .as_deref()
                .map(|name| resolve_source(name, sources, vertices))
                .transpose()?,
        })
    }
}

/// Per-attribute source indices of one polygon corner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Corner {
    pub vertex: usize,
    pub normal: usize,
    pub texcoord: usize,
}

impl Corner {
    /// Pick the indices of one `<p>` tuple by input offset.
    pub fn from_tuple(inputs: &[Input], tuple: &[usize]) -> Self {
        let mut corner = Corner::default();
        for input in inputs {
            let index = tuple[input.offset];
            match input.semantic {
                Semantic::Vertex => corner.vertex = index,
                Semantic::Normal => corner.normal = index,
                Semantic::Texcoord => corner.texcoord = index,
                Semantic::Positions | Semantic::Unknown => (),
            }
        }
        corner
    }
}

/// Interns corners into a single index buffer.
///
/// The first occurrence of a corner assigns the next unified index and appends its
/// attributes. Later occurrences reuse that index.
pub struct Welder<'a> {
    sources: AttributeSources<'a>,
    cache: HashMap<Corner, u32>,
    mesh: Mesh,
}

impl<'a> Welder<'a> {
    pub fn new(sources: AttributeSources<'a>) -> Self {
        Self {
            sources,
            cache: HashMap::new(),
            mesh: Mesh::default(),
        }
    }

    pub fn weld(&mut self, corner: Corner) -> Result<u32> {
        if let Some(&index) = self.cache.get(&corner) {
            self.mesh.indices.push(index);
            return Ok(index);
        }

        let index = u32::try_from(self.mesh.positions.len())
            .map_err(|_| DaeError::InvalidMesh("vertex count exceeds u32 range".to_string()))?;

        let position = Vec3::from_array(self.sources.position.read(corner.vertex)?);
        let normal = self
            .sources
            .normal
            .map(|source| source.read(corner.normal).map(Vec3::from_array))
            .transpose()?;
        let texcoord = self
            .sources
            .texcoord
            .map(|source| source.read(corner.texcoord).map(Vec2::from_array))
            .transpose()?;

        self.mesh.positions.push(position);
        self.mesh.normals.extend(normal);
        self.mesh.texcoords.extend(texcoord);
        self.mesh.indices.push(index);
        self.cache.insert(corner, index);
        Ok(index)
    }

    pub fn finish(self) -> Mesh {
        self.mesh
    }
}

fn check_tuple_layout(element: &str, set: &InputSet, index_count: usize) -> Result<usize> {
    let stride = set.stride();
    if stride == 0 {
        return Err(DaeError::malformed_primitives(element, "no <input> elements"));
    }
    if set.max_offset() >= stride {
        return Err(DaeError::malformed_primitives(
            element,
            format!("input offset {} exceeds the {} inputs per corner", set.max_offset(), stride),
        ));
    }
    if index_count % stride != 0 {
        return Err(DaeError::malformed_primitives(
            element,
            format!("<p> has {} indices, not a multiple of {}", index_count, stride),
        ));
    }
    Ok(stride)
}

/// Weld the `<p>` stream of a `<triangles>` element.
pub fn weld_triangles(set: &InputSet, p: &[usize], sources: AttributeSources) -> Result<Mesh> {
    let stride = check_tuple_layout("triangles", set, p.len())?;
    let corner_count = p.len() / stride;
    if corner_count % 3 != 0 {
        return Err(DaeError::malformed_primitives(
            "triangles",
            format!("{} corners do not form whole triangles", corner_count),
        ));
    }

    let mut welder = Welder::new(sources);
    for tuple in p.chunks_exact(stride) {
        welder.weld(Corner::from_tuple(&set.inputs, tuple))?;
    }
    Ok(welder.finish())
}

/// Split the `<p>` stream of a `<polylist>` into one corner list per polygon.
pub fn polylist_polygons(set: &InputSet, vcount: &[usize], p: &[usize]) -> Result<Vec<Vec<Corner>>> {
    let stride = check_tuple_layout("polylist", set, p.len())?;
    let overflow = || DaeError::malformed_primitives("polylist", "<vcount> total overflows");
    let corner_count = vcount
        .iter()
        .try_fold(0usize, |total, &n| total.checked_add(n))
        .ok_or_else(overflow)?;
    if corner_count.checked_mul(stride).ok_or_else(overflow)? != p.len() {
        return Err(DaeError::malformed_primitives(
            "polylist",
            format!(
                "<vcount> describes {} corners but <p> holds {}",
                corner_count,
                p.len() / stride
            ),
        ));
    }

    let mut tuples = p.chunks_exact(stride);
    Ok(vcount
        .iter()
        .map(|&n| {
            tuples
                .by_ref()
                .take(n)
                .map(|tuple| Corner::from_tuple(&set.inputs, tuple))
                .collect()
        })
        .collect())
}

/// Fan triangulate polygons, welding every emitted corner.
pub fn weld_polygons(polygons: &[Vec<Corner>], sources: AttributeSources) -> Result<Mesh> {
    let mut welder = Welder::new(sources);
    for polygon in polygons {
        if polygon.len() < 3 {
            log::warn!("Skipping degenerate polygon with {} corners", polygon.len());
            continue;
        }
        for i in 1..polygon.len() - 1 {
            welder.weld(polygon[0])?;
            welder.weld(polygon[i])?;
            welder.weld(polygon[i + 1])?;
        }
    }
    Ok(welder.finish())
}
