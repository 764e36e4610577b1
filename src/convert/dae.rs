use std::io::Read;
use std::path::Path;

use xmltree::Element;

use super::input::parse_inputs;
use super::source::{parse_sources, parse_vertices, SourceTable, VerticesAlias};
use super::weld::{polylist_polygons, weld_polygons, weld_triangles, AttributeSources};
use crate::error::{DaeError, Result};
use crate::mesh::Mesh;
use crate::xml::{attribute, find_all_children, find_child, get_element_text, get_list_text, parse_list};

/// Configuration for DAE import
#[derive(Debug, Clone, Default)]
pub struct DaeImportConfig {
    /// Fan triangulate `<polylist>` primitives instead of discarding them.
    pub triangulate_polylists: bool,
}

/// Parse a DAE file into a single mesh
pub fn parse_dae_file(file_path: &Path, config: &DaeImportConfig) -> Result<Mesh> {
    let file = std::fs::File::open(file_path)?;
    let mesh = parse_dae(std::io::BufReader::new(file), config)?;

    log::info!(
        "Imported '{}': {} vertices, {} triangles",
        file_path.display(),
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    Ok(mesh)
}

/// Parse a DAE document, concatenating every `<mesh>` under `<library_geometries>`
pub fn parse_dae<R: Read>(reader: R, config: &DaeImportConfig) -> Result<Mesh> {
    let root = Element::parse(reader).map_err(|e| DaeError::MalformedXml(e.to_string()))?;

    let mut mesh = Mesh::default();

    if let Some(comments) = find_child(&root, "asset")
        .and_then(|asset| find_child(asset, "contributor"))
        .and_then(|contributor| find_child(contributor, "comments"))
    {
        mesh.comment = get_element_text(comments);
    }

    if let Some(lib_geometries) = find_child(&root, "library_geometries") {
        for geometry_elem in find_all_children(lib_geometries, "geometry") {
            if let Some(mesh_elem) = find_child(geometry_elem, "mesh") {
                let name = attribute(geometry_elem, "id").unwrap_or("<unnamed>");
                parse_mesh(mesh_elem, name, config, &mut mesh)?;
            }
        }
    }

    Ok(mesh)
}

fn parse_mesh(
    mesh_elem: &Element,
    name: &str,
    config: &DaeImportConfig,
    output: &mut Mesh,
) -> Result<()> {
    let sources = parse_sources(mesh_elem)?;
    let vertices = parse_vertices(mesh_elem)?;

    let triangles = find_all_children(mesh_elem, "triangles");
    if triangles.len() > 1 {
        log::warn!(
            "Geometry '{}': ignoring {} additional <triangles> elements",
            name,
            triangles.len() - 1
        );
    }
    if let Some(triangles_elem) = triangles.first() {
        let part = parse_triangles(triangles_elem, &sources, &vertices)?;
        log::debug!(
            "Geometry '{}': {} welded vertices, {} triangles, {} normals, {} texcoords",
            name,
            part.positions.len(),
            part.triangle_count(),
            part.normals.len(),
            part.texcoords.len()
        );
        output.append(part)?;
    }

    let polylists = find_all_children(mesh_elem, "polylist");
    if polylists.len() > 1 {
        log::warn!(
            "Geometry '{}': ignoring {} additional <polylist> elements",
            name,
            polylists.len() - 1
        );
    }
    if let Some(polylist_elem) = polylists.first() {
        let polygons = parse_polylist(polylist_elem, &sources, &vertices, config)?;
        match polygons {
            Some(part) => {
                log::debug!(
                    "Geometry '{}': triangulated <polylist> into {} triangles",
                    name,
                    part.triangle_count()
                );
                output.append(part)?;
            }
            None => log::warn!("Geometry '{}': <polylist> geometry is not imported", name),
        }
    }

    Ok(())
}

fn parse_index_array(element_name: &str, parent: &Element, child: &str) -> Result<Vec<usize>> {
    match find_child(parent, child) {
        Some(elem) => parse_list(&get_list_text(elem))
            .map_err(|e| DaeError::malformed_primitives(element_name, format!("<{}>: {}", child, e))),
        None => Ok(Vec::new()),
    }
}

fn parse_triangles(
    triangles_elem: &Element,
    sources: &SourceTable,
    vertices: &VerticesAlias,
) -> Result<Mesh> {
    let set = parse_inputs(triangles_elem)?;
    let attribute_sources = AttributeSources::resolve("triangles", &set, sources, vertices)?;
    let p = parse_index_array("triangles", triangles_elem, "p")?;
    weld_triangles(&set, &p, attribute_sources)
}

/// Returns `None` when the polylist was only checked for well-formedness.
fn parse_polylist(
    polylist_elem: &Element,
    sources: &SourceTable,
    vertices: &VerticesAlias,
    config: &DaeImportConfig,
) -> Result<Option<Mesh>> {
    let set = parse_inputs(polylist_elem)?;
    let attribute_sources = AttributeSources::resolve("polylist", &set, sources, vertices)?;
    let vcount = parse_index_array("polylist", polylist_elem, "vcount")?;
    let p = parse_index_array("polylist", polylist_elem, "p")?;
    let polygons = polylist_polygons(&set, &vcount, &p)?;

    if config.triangulate_polylists {
        weld_polygons(&polygons, attribute_sources).map(Some)
    } else {
        Ok(None)
    }
}
