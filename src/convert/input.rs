use xmltree::{Element, XMLNode};

use crate::error::{DaeError, Result};
use crate::xml::{attribute, strip_fragment};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Semantic {
    Vertex,
    Normal,
    Texcoord,
    Positions,
    Unknown,
}

impl Semantic {
    pub fn from_name(name: &str) -> Self {
        match name {
            "VERTEX" => Semantic::Vertex,
            "NORMAL" => Semantic::Normal,
            "TEXCOORD" => Semantic::Texcoord,
            "POSITIONS" => Semantic::Positions,
            _ => Semantic::Unknown,
        }
    }
}

/// An `<input>` binding: which source feeds which semantic, and where in each `<p>` tuple.
#[derive(Debug, Clone, PartialEq)]
pub struct Input {
    pub semantic: Semantic,
    /// Referenced id without the leading `#`.
    pub source: String,
    pub offset: usize,
}

/// The `<input>` children of a primitives element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSet {
    pub inputs: Vec<Input>,
    pub vertex_source: Option<String>,
    pub normal_source: Option<String>,
    pub texcoord_source: Option<String>,
}

impl InputSet {
    /// Number of indices per corner in the `<p>` stream.
    pub fn stride(&self) -> usize {
        self.inputs.len()
    }

    /// Largest `offset` any input reads from a tuple.
    pub fn max_offset(&self) -> usize {
        self.inputs.iter().map(|i| i.offset).max().unwrap_or(0)
    }
}

/// Parse the direct `<input>` children of a `<triangles>` or `<polylist>` element.
///
/// Inputs with unrecognized semantics are kept so the tuple stride stays correct.
/// When a semantic appears more than once, the last one decides its source.
pub fn parse_inputs(primitives_elem: &Element) -> Result<InputSet> {
    let element = primitives_elem.name.as_str();
    let mut set = InputSet::default();

    for input_elem in primitives_elem.children.iter().filter_map(|node| match node {
        XMLNode::Element(child) if child.name == "input" => Some(child),
        _ => None,
    }) {
        let source = attribute(input_elem, "source")
            .ok_or_else(|| DaeError::malformed_primitives(element, "input without source attribute"))?;
        let offset = attribute(input_elem, "offset")
            .ok_or_else(|| DaeError::malformed_primitives(element, "input without offset attribute"))?
            .parse::<usize>()
            .map_err(|_| DaeError::malformed_primitives(element, "invalid input offset"))?;
        let semantic = attribute(input_elem, "semantic")
            .map(Semantic::from_name)
            .ok_or_else(|| DaeError::malformed_primitives(element, "input without semantic attribute"))?;

        let input = Input {
            semantic,
            source: strip_fragment(source).to_string(),
            offset,
        };
        match input.semantic {
            Semantic::Vertex => set.vertex_source = Some(input.source.clone()),
            Semantic::Normal => set.normal_source = Some(input.source.clone()),
            Semantic::Texcoord => set.texcoord_source = Some(input.source.clone()),
            Semantic::Positions | Semantic::Unknown => (),
        }
        set.inputs.push(input);
    }

    Ok(set)
}
