//! Typed element tree for one RDF/XML catalog document
//!
//! Element and attribute names are kept as written (`dcterms:title`,
//! `rdf:about`); the Gutenberg feed always uses the same prefixes.

use crate::ingest::{IngestError, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};

/// One XML element with its attributes, direct text and child elements
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    /// Character data directly inside this element; empty when it was
    /// whitespace only
    pub text: String,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// First direct child with the given name
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All direct children with the given name, in document order
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Follow a chain of first-children, e.g. `["rdf:Description", "rdf:value"]`
    pub fn descend(&self, path: &[&str]) -> Option<&XmlElement> {
        path.iter().try_fold(self, |node, name| node.child(name))
    }

    /// Depth-first search for the first element named `name`, self included
    pub fn find_first(&self, name: &str) -> Option<&XmlElement> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_first(name))
    }

    /// Non-empty text content
    pub fn text(&self) -> Option<&str> {
        (!self.text.is_empty()).then_some(self.text.as_str())
    }

    /// Structural JSON form of this node
    ///
    /// A bare leaf becomes its text. Anything with attributes or children
    /// becomes an object: attributes under `"$"`, text under `"_"`, and one
    /// array per child element name in document order.
    pub fn to_json(&self) -> Value {
        if self.attributes.is_empty() && self.children.is_empty() {
            return Value::String(self.text.clone());
        }

        let mut object = Map::new();

        if !self.attributes.is_empty() {
            let attrs = self
                .attributes
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            object.insert("$".to_string(), Value::Object(attrs));
        }

        if !self.text.is_empty() {
            object.insert("_".to_string(), Value::String(self.text.clone()));
        }

        for child in &self.children {
            let slot = object
                .entry(child.name.clone())
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(items) = slot {
                items.push(child.to_json());
            }
        }

        Value::Object(object)
    }
}

/// A parsed catalog document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RdfDocument {
    root: XmlElement,
}

impl RdfDocument {
    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    /// Parse an RDF/XML string into an element tree
    pub fn parse_str(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            let event = reader.read_event().map_err(|e| {
                IngestError::Parse(format!("at byte {}: {}", reader.error_position(), e))
            })?;

            match event {
                Event::Start(start) => stack.push(element_from(&start)?),
                Event::Empty(start) => {
                    let element = element_from(&start)?;
                    attach(&mut stack, &mut root, element)?;
                },
                Event::End(_) => {
                    let mut element = stack.pop().ok_or_else(|| {
                        IngestError::Parse("closing tag without an open element".to_string())
                    })?;
                    if element.text.trim().is_empty() {
                        element.text.clear();
                    }
                    attach(&mut stack, &mut root, element)?;
                },
                Event::Text(text) => {
                    if let Some(open) = stack.last_mut() {
                        let unescaped = text
                            .unescape()
                            .map_err(|e| IngestError::Parse(e.to_string()))?;
                        open.text.push_str(&unescaped);
                    }
                },
                Event::CData(data) => {
                    if let Some(open) = stack.last_mut() {
                        open.text.push_str(&String::from_utf8_lossy(&data));
                    }
                },
                Event::Eof => break,
                _ => {},
            }
        }

        if let Some(open) = stack.last() {
            return Err(IngestError::Parse(format!(
                "unexpected end of document inside <{}>",
                open.name
            )));
        }

        root.map(|root| RdfDocument { root })
            .ok_or_else(|| IngestError::Parse("document has no root element".to_string()))
    }
}

fn element_from(start: &BytesStart<'_>) -> Result<XmlElement> {
    let mut element = XmlElement::new(String::from_utf8_lossy(start.name().as_ref()));

    for attr in start.attributes() {
        let attr = attr.map_err(|e| IngestError::Parse(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| IngestError::Parse(e.to_string()))?
            .into_owned();
        element.attributes.push((key, value));
    }

    Ok(element)
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => {
            return Err(IngestError::Parse(format!(
                "multiple root elements (second is <{}>)",
                element.name
            )))
        },
    }
    Ok(())
}
