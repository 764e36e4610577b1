use std::io::Write;
use std::path::Path;

use xmltree::Element;

use crate::error::{DaeError, Result};
use crate::mesh::Mesh;
use crate::xml::{element_with_attributes, push_child, text_element};

const COLLADA_NAMESPACE: &str = "http://www.collada.org/2005/11/COLLADASchema";
const COLLADA_VERSION: &str = "1.4.1";

/// Configuration for DAE export
#[derive(Debug, Clone)]
pub struct DaeExportConfig {
    /// Written to `<asset>/<contributor>/<authoring_tool>`.
    pub authoring_tool: String,
    /// Id of the single `<geometry>`; every other id is derived from it.
    pub geometry_id: String,
}

impl Default for DaeExportConfig {
    fn default() -> Self {
        Self {
            authoring_tool: "dae_mesh".to_string(),
            geometry_id: "Mesh-1".to_string(),
        }
    }
}

/// Export a mesh to a COLLADA (.dae) file
pub fn export_mesh_to_dae(mesh: &Mesh, output_path: &Path, config: &DaeExportConfig) -> Result<()> {
    let collada = build_document(mesh, config)?;

    let file = std::fs::File::create(output_path)?;
    let mut writer = std::io::BufWriter::new(file);
    write_document(&collada, &mut writer)?;
    writer.flush()?;

    log::info!(
        "Exported '{}': {} vertices, {} triangles",
        output_path.display(),
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    Ok(())
}

/// Write a mesh as a COLLADA document
pub fn write_dae<W: Write>(mesh: &Mesh, writer: W, config: &DaeExportConfig) -> Result<()> {
    let collada = build_document(mesh, config)?;
    write_document(&collada, writer)
}

fn write_document<W: Write>(collada: &Element, writer: W) -> Result<()> {
    collada
        .write(writer)
        .map_err(|e| DaeError::SerializeFailed(e.to_string()))
}

/// Build the `<COLLADA>` element tree for a mesh.
pub fn build_document(mesh: &Mesh, config: &DaeExportConfig) -> Result<Element> {
    mesh.validate()?;

    let mut collada = element_with_attributes(
        "COLLADA",
        &[
            ("xmlns", COLLADA_NAMESPACE.to_string()),
            ("version", COLLADA_VERSION.to_string()),
        ],
    );
    push_child(&mut collada, build_asset(mesh, config));

    let mut library_geometries = Element::new("library_geometries");
    push_child(&mut library_geometries, build_geometry(mesh, &config.geometry_id));
    push_child(&mut collada, library_geometries);

    Ok(collada)
}

fn build_asset(mesh: &Mesh, config: &DaeExportConfig) -> Element {
    let mut contributor = Element::new("contributor");
    push_child(
        &mut contributor,
        text_element("authoring_tool", config.authoring_tool.as_str()),
    );
    push_child(&mut contributor, text_element("comments", mesh.comment.as_str()));

    let mut asset = Element::new("asset");
    push_child(&mut asset, contributor);
    push_child(&mut asset, text_element("up_axis", "Z_UP"));
    asset
}

fn build_geometry(mesh: &Mesh, geom_id: &str) -> Element {
    let vertex_count = mesh.vertex_count();
    let has_normals = mesh.has_normals();
    let has_texcoords = mesh.has_texcoords();
    if !has_normals && !mesh.normals.is_empty() {
        log::warn!(
            "Skipping {} normals that do not match {} vertices",
            mesh.normals.len(),
            vertex_count
        );
    }
    if !has_texcoords && !mesh.texcoords.is_empty() {
        log::warn!(
            "Skipping {} texture coordinates that do not match {} vertices",
            mesh.texcoords.len(),
            vertex_count
        );
    }

    let mut geometry = element_with_attributes(
        "geometry",
        &[("id", geom_id.to_string()), ("name", geom_id.to_string())],
    );
    let mut mesh_elem = Element::new("mesh");

    let pos_source_id = format!("{}-positions", geom_id);
    let flat: Vec<f32> = mesh.positions.iter().flat_map(|v| v.to_array()).collect();
    push_child(
        &mut mesh_elem,
        build_source_float_array(&pos_source_id, "position", &flat, &["X", "Y", "Z"]),
    );

    let normal_source_id = format!("{}-normals", geom_id);
    if has_normals {
        let flat: Vec<f32> = mesh.normals.iter().flat_map(|v| v.to_array()).collect();
        push_child(
            &mut mesh_elem,
            build_source_float_array(&normal_source_id, "normal", &flat, &["X", "Y", "Z"]),
        );
    }

    let texcoord_source_id = format!("{}-map1", geom_id);
    if has_texcoords {
        let flat: Vec<f32> = mesh.texcoords.iter().flat_map(|v| v.to_array()).collect();
        push_child(
            &mut mesh_elem,
            build_source_float_array(&texcoord_source_id, "map1", &flat, &["S", "T"]),
        );
    }

    // <vertices>
    let vertices_id = format!("{}-vertices", geom_id);
    let mut vertices = element_with_attributes("vertices", &[("id", vertices_id.clone())]);
    push_child(
        &mut vertices,
        element_with_attributes(
            "input",
            &[
                ("semantic", "POSITION".to_string()),
                ("source", format!("#{}", pos_source_id)),
            ],
        ),
    );
    push_child(&mut mesh_elem, vertices);

    // <triangles>
    let mut triangles = element_with_attributes(
        "triangles",
        &[("count", (mesh.indices.len() / 3).to_string())],
    );

    let mut inputs = vec![("VERTEX", vertices_id)];
    if has_normals {
        inputs.push(("NORMAL", normal_source_id));
    }
    if has_texcoords {
        inputs.push(("TEXCOORD", texcoord_source_id));
    }
    let input_count = inputs.len();
    for (offset, (semantic, source)) in inputs.into_iter().enumerate() {
        let mut attributes = vec![
            ("offset", offset.to_string()),
            ("semantic", semantic.to_string()),
            ("source", format!("#{}", source)),
        ];
        if semantic == "TEXCOORD" {
            attributes.push(("set", "0".to_string()));
        }
        push_child(&mut triangles, element_with_attributes("input", &attributes));
    }

    // Attributes share the welded order, so one index addresses every input.
    let mut values: Vec<String> = Vec::with_capacity(mesh.indices.len() * input_count);
    for idx in &mesh.indices {
        for _ in 0..input_count {
            values.push(idx.to_string());
        }
    }
    push_child(&mut triangles, text_element("p", values.join(" ")));

    push_child(&mut mesh_elem, triangles);
    push_child(&mut geometry, mesh_elem);
    geometry
}

fn build_source_float_array(id: &str, name: &str, flat_data: &[f32], params: &[&str]) -> Element {
    let stride = params.len();

    let mut source = element_with_attributes(
        "source",
        &[("id", id.to_string()), ("name", name.to_string())],
    );

    let mut float_array = element_with_attributes(
        "float_array",
        &[
            ("id", format!("{}-array", id)),
            ("count", flat_data.len().to_string()),
        ],
    );
    float_array.children.push(xmltree::XMLNode::Text(
        flat_data
            .iter()
            .map(|v| format_float(*v))
            .collect::<Vec<_>>()
            .join(" "),
    ));
    push_child(&mut source, float_array);

    let mut accessor = element_with_attributes(
        "accessor",
        &[
            ("count", (flat_data.len() / stride).to_string()),
            ("offset", "0".to_string()),
            ("source", format!("#{}-array", id)),
            ("stride", stride.to_string()),
        ],
    );
    for param in params {
        push_child(
            &mut accessor,
            element_with_attributes(
                "param",
                &[("name", param.to_string()), ("type", "float".to_string())],
            ),
        );
    }

    let mut tech = Element::new("technique_common");
    push_child(&mut tech, accessor);
    push_child(&mut source, tech);
    source
}

fn format_float(v: f32) -> String {
    // Shortest representation that parses back to the same value
    v.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::{attribute, find_all_children, find_child, get_element_text};
    use glam::{Vec2, Vec3};

    fn triangle() -> Mesh {
        Mesh {
            indices: vec![0, 1, 2],
            positions: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            normals: vec![Vec3::Z; 3],
            texcoords: vec![Vec2::ZERO, Vec2::X, Vec2::Y],
            comment: "one triangle".to_string(),
        }
    }

    fn mesh_element(collada: &Element) -> &Element {
        let geometry = find_child(collada, "library_geometries")
            .and_then(|l| find_child(l, "geometry"))
            .unwrap();
        assert_eq!(Some("Mesh-1"), attribute(geometry, "id"));
        find_child(geometry, "mesh").unwrap()
    }

    #[test]
    fn document_header_and_asset() {
        let collada = build_document(&triangle(), &DaeExportConfig::default()).unwrap();

        assert_eq!("COLLADA", collada.name);
        assert_eq!(Some(COLLADA_NAMESPACE), attribute(&collada, "xmlns"));
        assert_eq!(Some("1.4.1"), attribute(&collada, "version"));

        let asset = find_child(&collada, "asset").unwrap();
        let contributor = find_child(asset, "contributor").unwrap();
        assert_eq!("dae_mesh", get_element_text(find_child(contributor, "authoring_tool").unwrap()));
        assert_eq!("one triangle", get_element_text(find_child(contributor, "comments").unwrap()));
        assert_eq!("Z_UP", get_element_text(find_child(asset, "up_axis").unwrap()));
    }

    #[test]
    fn sources_and_triangles() {
        let collada = build_document(&triangle(), &DaeExportConfig::default()).unwrap();
        let mesh = mesh_element(&collada);

        let sources = find_all_children(mesh, "source");
        let ids: Vec<_> = sources.iter().map(|s| attribute(s, "id").unwrap()).collect();
        assert_eq!(vec!["Mesh-1-positions", "Mesh-1-normals", "Mesh-1-map1"], ids);

        let map1 = sources[2];
        let float_array = find_child(map1, "float_array").unwrap();
        assert_eq!(Some("6"), attribute(float_array, "count"));
        assert_eq!("0 0 1 0 0 1", get_element_text(float_array));
        let accessor = find_child(find_child(map1, "technique_common").unwrap(), "accessor").unwrap();
        assert_eq!(Some("2"), attribute(accessor, "stride"));
        assert_eq!(Some("3"), attribute(accessor, "count"));

        let vertices = find_child(mesh, "vertices").unwrap();
        assert_eq!(Some("Mesh-1-vertices"), attribute(vertices, "id"));

        let triangles = find_child(mesh, "triangles").unwrap();
        assert_eq!(Some("1"), attribute(triangles, "count"));
        let inputs = find_all_children(triangles, "input");
        let semantics: Vec<_> = inputs
            .iter()
            .map(|i| (attribute(i, "semantic").unwrap(), attribute(i, "offset").unwrap()))
            .collect();
        assert_eq!(vec![("VERTEX", "0"), ("NORMAL", "1"), ("TEXCOORD", "2")], semantics);
        assert_eq!(Some("0"), attribute(inputs[2], "set"));
        assert_eq!(
            "0 0 0 1 1 1 2 2 2",
            get_element_text(find_child(triangles, "p").unwrap())
        );
    }

    #[test]
    fn positions_only() {
        let mut mesh = triangle();
        mesh.normals.clear();
        mesh.texcoords.truncate(2);

        let collada = build_document(&mesh, &DaeExportConfig::default()).unwrap();
        let mesh_elem = mesh_element(&collada);
        assert_eq!(1, find_all_children(mesh_elem, "source").len());

        let triangles = find_child(mesh_elem, "triangles").unwrap();
        assert_eq!(1, find_all_children(triangles, "input").len());
        assert_eq!("0 1 2", get_element_text(find_child(triangles, "p").unwrap()));
    }

    #[test]
    fn custom_ids() {
        let config = DaeExportConfig {
            authoring_tool: "ctmconv".to_string(),
            geometry_id: "Statue".to_string(),
        };
        let collada = build_document(&triangle(), &config).unwrap();
        let geometry = find_child(find_child(&collada, "library_geometries").unwrap(), "geometry").unwrap();
        assert_eq!(Some("Statue"), attribute(geometry, "id"));
        let vertices = find_child(find_child(geometry, "mesh").unwrap(), "vertices").unwrap();
        let input = find_child(vertices, "input").unwrap();
        assert_eq!(Some("#Statue-positions"), attribute(input, "source"));
    }

    #[test]
    fn rejects_invalid_mesh() {
        let mut mesh = triangle();
        mesh.indices = vec![0, 1, 5];
        assert!(matches!(
            build_document(&mesh, &DaeExportConfig::default()),
            Err(DaeError::InvalidMesh(_))
        ));
    }

    #[test]
    fn writes_declaration() {
        let mut bytes = Vec::new();
        write_dae(&triangle(), &mut bytes, &DaeExportConfig::default()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("<?xml version=\"1.0\""));
        assert!(text.contains("<up_axis>Z_UP</up_axis>"));
    }

    #[test]
    fn float_formatting_is_exact() {
        assert_eq!("0", format_float(0.0));
        assert_eq!("0.1", format_float(0.1));
        assert_eq!(0.1f32, format_float(0.1).parse::<f32>().unwrap());
        assert_eq!("-2.5", format_float(-2.5));
    }
}
