//! Minimal owned XML element tree
//!
//! Both XML formats only need to walk a document top-down, so the
//! `xml-rs` event stream is folded into a tree of [`Element`]s first.

use std::io::Read;
use ulevel_core::{LevelError, Result};
use xml::reader::{ParserConfig, XmlEvent};

/// One XML element with its attributes, children and text
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
    /// Concatenated character data directly inside this element
    pub text: String,
}

impl Element {
    /// Get an attribute value by local name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// First child with the given name
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All children with the given name, in document order
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }
}

/// Parse a whole document and return its root element
pub(crate) fn parse<R: Read>(reader: R) -> Result<Element> {
    let parser = ParserConfig::new()
        .cdata_to_characters(true)
        .whitespace_to_characters(true)
        .create_reader(reader);

    let mut stack: Vec<Element> = Vec::new();
    let mut root = None;

    for event in parser {
        let event = event.map_err(|e| LevelError::MalformedDocument(e.to_string()))?;
        match event {
            XmlEvent::StartElement {
                name, attributes, ..
            } => {
                stack.push(Element {
                    name: name.local_name,
                    attributes: attributes
                        .into_iter()
                        .map(|a| (a.name.local_name, a.value))
                        .collect(),
                    ..Element::default()
                });
            }
            XmlEvent::EndElement { .. } => {
                if let Some(element) = stack.pop() {
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(element),
                        None => root = Some(element),
                    }
                }
            }
            XmlEvent::Characters(text) | XmlEvent::CData(text) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text);
                }
            }
            _ => {}
        }
    }

    root.ok_or_else(|| LevelError::MalformedDocument("document has no root element".into()))
}
