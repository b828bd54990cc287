//! Descriptor tree nodes
//!
//! A [`Node`] is one element of a parsed launch descriptor. Trees are handed
//! over by the descriptor parser, validated once on construction and never
//! mutated afterwards.

use crate::error::LaunchError;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// One element of a launch descriptor tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawNode")]
pub struct Node {
    name: String,
    value: String,
    attributes: BTreeMap<String, String>,
    children: Vec<Node>,
}

/// Unvalidated wire shape of a node, as produced by the parser collaborator
#[derive(Debug, Deserialize)]
struct RawNode {
    name: String,
    #[serde(default)]
    value: String,
    #[serde(default)]
    attributes: BTreeMap<String, String>,
    #[serde(default)]
    children: Vec<RawNode>,
}

impl RawNode {
    fn into_node(self, location: &str) -> Result<Node, LaunchError> {
        let here = format!("{location}/{}", self.name);
        let children = self
            .children
            .into_iter()
            .enumerate()
            .map(|(index, child)| child.into_node(&format!("{here}[{index}]")))
            .collect::<Result<Vec<_>, _>>()?;

        if self.name.is_empty() {
            return Err(LaunchError::MalformedDescriptor {
                reason: format!("element at {} has an empty name", location_or_root(location)),
            });
        }

        Ok(Node {
            name: self.name,
            value: self.value,
            attributes: self.attributes,
            children,
        })
    }
}

impl TryFrom<RawNode> for Node {
    type Error = LaunchError;

    fn try_from(raw: RawNode) -> Result<Self, Self::Error> {
        raw.into_node("")
    }
}

fn location_or_root(location: &str) -> &str {
    if location.is_empty() {
        "the root"
    } else {
        location
    }
}

impl Node {
    /// Create a node, rejecting an empty element name
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        attributes: BTreeMap<String, String>,
        children: Vec<Node>,
    ) -> Result<Self, LaunchError> {
        let name = name.into();
        if name.is_empty() {
            return Err(LaunchError::MalformedDescriptor {
                reason: "element name must not be empty".to_string(),
            });
        }

        Ok(Node {
            name,
            value: value.into(),
            attributes,
            children,
        })
    }

    /// Start building a node with the given element name
    pub fn builder(name: impl Into<String>) -> NodeBuilder {
        NodeBuilder {
            name: name.into(),
            value: String::new(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Parse a descriptor tree from its JSON hand-off form
    pub fn from_json(input: &str) -> Result<Self, LaunchError> {
        let raw: RawNode = serde_json::from_str(input)
            .context("descriptor is not valid JSON")
            .map_err(|source| LaunchError::DescriptorParse {
                source: source.into(),
            })?;
        Node::try_from(raw)
    }

    /// Parse a descriptor tree from its YAML hand-off form
    pub fn from_yaml(input: &str) -> Result<Self, LaunchError> {
        let raw: RawNode = serde_yaml_ng::from_str(input)
            .context("descriptor is not valid YAML")
            .map_err(|source| LaunchError::DescriptorParse {
                source: source.into(),
            })?;
        Node::try_from(raw)
    }

    /// Load a descriptor tree from disk, choosing the format by extension
    pub fn load(path: &Path) -> Result<Self, LaunchError> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read descriptor: {}", path.display()))
            .map_err(|source| LaunchError::DescriptorParse {
                source: source.into(),
            })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yml") | Some("yaml") => Self::from_yaml(&content),
            _ => Self::from_json(&content),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Text content of the element, empty when absent
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Attribute names in sorted order
    pub fn attribute_names(&self) -> Vec<&str> {
        self.attributes.keys().map(String::as_str).collect()
    }

    /// Look up an attribute value; absent attributes yield `None`
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn child(&self, index: usize) -> Option<&Node> {
        self.children.get(index)
    }
}

/// Builder for [`Node`], validated on [`NodeBuilder::build`]
#[derive(Debug, Clone)]
pub struct NodeBuilder {
    name: String,
    value: String,
    attributes: BTreeMap<String, String>,
    children: Vec<Node>,
}

impl NodeBuilder {
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn build(self) -> Result<Node, LaunchError> {
        Node::new(self.name, self.value, self.attributes, self.children)
    }
}

/// Compact XML-like rendering, used in logs and diagnostics
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.name)?;
        for (name, value) in &self.attributes {
            write!(f, " {name}=\"{value}\"")?;
        }
        if self.value.is_empty() && self.children.is_empty() {
            return write!(f, "/>");
        }
        write!(f, ">{}", self.value)?;
        for child in &self.children {
            write!(f, "{child}")?;
        }
        write!(f, "</{}>", self.name)
    }
}
