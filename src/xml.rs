// Helper functions for walking and building xmltree documents
use std::str::FromStr;

use xmltree::{Element, XMLNode};

pub(crate) fn find_child<'a>(element: &'a Element, name: &str) -> Option<&'a Element> {
    element.children.iter().find_map(|node| match node {
        XMLNode::Element(child) if child.name == name => Some(child),
        _ => None,
    })
}

pub(crate) fn find_all_children<'a>(element: &'a Element, name: &str) -> Vec<&'a Element> {
    element
        .children
        .iter()
        .filter_map(|node| match node {
            XMLNode::Element(child) if child.name == name => Some(child),
            _ => None,
        })
        .collect()
}

/// Concatenated text and CDATA content of an element, or an empty string.
pub(crate) fn get_element_text(element: &Element) -> String {
    element
        .children
        .iter()
        .filter_map(|node| match node {
            XMLNode::Text(text) | XMLNode::CData(text) => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

/// Text and CDATA content joined with spaces, so tokens split by comments or
/// processing instructions stay separate.
pub(crate) fn get_list_text(element: &Element) -> String {
    element
        .children
        .iter()
        .filter_map(|node| match node {
            XMLNode::Text(text) | XMLNode::CData(text) => Some(text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn attribute<'a>(element: &'a Element, name: &str) -> Option<&'a str> {
    element.attributes.get(name).map(String::as_str)
}

/// Parse whitespace separated values such as the body of `<float_array>` or `<p>`.
pub(crate) fn parse_list<T: FromStr>(text: &str) -> Result<Vec<T>, String> {
    text.split_whitespace()
        .map(|s| s.parse().map_err(|_| format!("invalid value '{}'", s)))
        .collect()
}

/// Strip the leading `#` from a URI fragment reference.
pub(crate) fn strip_fragment(reference: &str) -> &str {
    reference.strip_prefix('#').unwrap_or(reference)
}

pub(crate) fn element_with_attributes(name: &str, attributes: &[(&str, String)]) -> Element {
    let mut element = Element::new(name);
    for (key, value) in attributes {
        element.attributes.insert(key.to_string(), value.clone());
    }
    element
}

pub(crate) fn text_element(name: &str, text: impl Into<String>) -> Element {
    let mut element = Element::new(name);
    element.children.push(XMLNode::Text(text.into()));
    element
}

pub(crate) fn push_child(parent: &mut Element, child: Element) {
    parent.children.push(XMLNode::Element(child));
}
