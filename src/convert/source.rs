use std::collections::HashMap;

use xmltree::Element;

use super::input::{Input, Semantic};
use crate::error::{DaeError, Result};
use crate::xml::{attribute, find_all_children, find_child, get_list_text, parse_list, strip_fragment};

/// A strided float array from a `<source>` element together with its accessor.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub id: String,
    pub values: Vec<f32>,
    pub stride: usize,
    pub count: usize,
    pub offset: usize,
    pub params: Vec<String>,
}

impl Source {
    /// Component `component` of element `index`.
    /// Components past the accessor stride read as zero.
    pub fn component(&self, index: usize, component: usize) -> Result<f32> {
        if index >= self.count {
            return Err(DaeError::IndexOutOfRange {
                source_id: self.id.clone(),
                index,
                count: self.count,
            });
        }
        if component >= self.stride {
            return Ok(0.0);
        }
        // The accessor bounds were checked against the array when parsing.
        Ok(self.values[self.offset + index * self.stride + component])
    }

    pub fn read<const N: usize>(&self, index: usize) -> Result<[f32; N]> {
        let mut out = [0.0; N];
        for (component, value) in out.iter_mut().enumerate() {
            *value = self.component(index, component)?;
        }
        Ok(out)
    }
}

pub type SourceTable = HashMap<String, Source>;

/// `<vertices>` ids mapped to the inputs they alias.
pub type VerticesAlias = HashMap<String, Vec<Input>>;

pub fn parse_sources(mesh_elem: &Element) -> Result<SourceTable> {
    let mut sources = SourceTable::new();
    for source_elem in find_all_children(mesh_elem, "source") {
        let source = parse_source(source_elem)?;
        if sources.contains_key(&source.id) {
            log::warn!("Duplicate source id '{}', keeping the last definition", source.id);
        }
        sources.insert(source.id.clone(), source);
    }
    Ok(sources)
}

fn parse_source(source_elem: &Element) -> Result<Source> {
    let id = attribute(source_elem, "id")
        .ok_or_else(|| DaeError::malformed_source("", "missing id attribute"))?
        .to_string();

    let float_array = find_child(source_elem, "float_array")
        .ok_or_else(|| DaeError::malformed_source(&id, "missing <float_array>"))?;
    let values: Vec<f32> = parse_list(&get_list_text(float_array))
        .map_err(|e| DaeError::malformed_source(&id, e))?;

    let accessor = find_child(source_elem, "technique_common")
        .and_then(|technique| find_child(technique, "accessor"))
        .ok_or_else(|| DaeError::malformed_source(&id, "missing <technique_common>/<accessor>"))?;

    let stride = match attribute(accessor, "stride").map(str::parse::<usize>) {
        Some(Ok(stride)) if stride > 0 => stride,
        Some(_) => return Err(DaeError::malformed_source(&id, "stride must be a positive integer")),
        None => return Err(DaeError::malformed_source(&id, "missing accessor stride")),
    };
    let count = attribute(accessor, "count")
        .ok_or_else(|| DaeError::malformed_source(&id, "missing accessor count"))?
        .parse::<usize>()
        .map_err(|_| DaeError::malformed_source(&id, "invalid accessor count"))?;
    let offset = match attribute(accessor, "offset") {
        Some(offset) => offset
            .parse::<usize>()
            .map_err(|_| DaeError::malformed_source(&id, "invalid accessor offset"))?,
        None => 0,
    };

    let required = count
        .checked_mul(stride)
        .and_then(|n| n.checked_add(offset))
        .ok_or_else(|| DaeError::malformed_source(&id, "accessor size overflows"))?;
    if required > values.len() {
        return Err(DaeError::malformed_source(
            &id,
            format!(
                "accessor needs {} values but <float_array> has {}",
                required,
                values.len()
            ),
        ));
    }

    let params = find_all_children(accessor, "param")
        .into_iter()
        .filter_map(|param| attribute(param, "name").map(str::to_string))
        .collect();

    Ok(Source {
        id,
        values,
        stride,
        count,
        offset,
        params,
    })
}

/// Parse the optional `<vertices>` element of a `<mesh>`.
pub fn parse_vertices(mesh_elem: &Element) -> Result<VerticesAlias> {
    let mut vertices = VerticesAlias::new();
    if let Some(vertices_elem) = find_child(mesh_elem, "vertices") {
        let id = attribute(vertices_elem, "id").ok_or_else(|| {
            DaeError::malformed_primitives("vertices", "missing id attribute")
        })?;

        let inputs = find_all_children(vertices_elem, "input")
            .into_iter()
            .map(|input_elem| -> Result<Input> {
                let source = attribute(input_elem, "source").ok_or_else(|| {
                    DaeError::malformed_primitives("vertices", "input without source attribute")
                })?;
                Ok(Input {
                    semantic: attribute(input_elem, "semantic")
                        .map(Semantic::from_name)
                        .unwrap_or(Semantic::Unknown),
                    source: strip_fragment(source).to_string(),
                    offset: 0,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        vertices.insert(id.to_string(), inputs);
    }
    Ok(vertices)
}

/// Find the source backing `name`, following at most one `<vertices>` alias.
pub fn resolve_source<'a>(
    name: &str,
    sources: &'a SourceTable,
    vertices: &VerticesAlias,
) -> Result<&'a Source> {
    if let Some(source) = sources.get(name) {
        return Ok(source);
    }
    vertices
        .get(name)
        .and_then(|inputs| inputs.iter().find_map(|input| sources.get(&input.source)))
        .ok_or_else(|| DaeError::UnresolvedSource(name.to_string()))
}
