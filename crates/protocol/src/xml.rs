//! Tag formatter — declarative node descriptions serialized to tagged text.
//!
//! The wire format is pseudo-XML: `<tag attr="value">content</tag>`, with a
//! self-closing `<tag attr="value" />` when content is absent, and sibling
//! child blocks joined by newlines. Content is inserted **verbatim** — no
//! entity escaping is performed. This layer trusts its callers (and the
//! model) not to embed literal markers for recognized tags inside content;
//! it is a prompt format, not a general markup language.
//!
//! Formatting is a pure function of the node: same node, same string,
//! with attribute insertion order preserved.

use std::fmt;

/// An attribute value. Absent attributes are simply not added to the node;
/// they never render as empty strings.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for AttrValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<u32> for AttrValue {
    fn from(i: u32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for AttrValue {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// What sits between a node's markers.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// Nothing — the node renders self-closing.
    Empty,
    /// Verbatim text.
    Text(String),
    /// Nested child nodes, newline-joined.
    Children(Vec<Node>),
}

/// A declarative description of one tagged text fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub tag: String,
    pub attrs: Vec<(String, AttrValue)>,
    pub content: Content,
}

impl Node {
    /// A node with no content; renders as `<tag />`.
    pub fn empty(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            content: Content::Empty,
        }
    }

    /// A node with text content.
    pub fn text(tag: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            content: Content::Text(text.into()),
        }
    }

    /// A node with child nodes. Absent (`None`) children are dropped here,
    /// before serialization, so they never produce separators.
    pub fn parent(tag: impl Into<String>, children: impl IntoIterator<Item = Option<Node>>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            content: Content::Children(children.into_iter().flatten().collect()),
        }
    }

    /// Append an attribute. Insertion order is preserved in the output.
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attrs.push((key.into(), value.into()));
        self
    }

    /// Append an attribute only when a value is present.
    pub fn attr_opt(self, key: impl Into<String>, value: Option<impl Into<AttrValue>>) -> Self {
        match value {
            Some(v) => self.attr(key, v),
            None => self,
        }
    }
}

/// Serialize a node description to tagged text.
pub fn format_node(node: &Node) -> String {
    let mut out = String::new();
    write_node(node, &mut out);
    out
}

fn write_node(node: &Node, out: &mut String) {
    out.push('<');
    out.push_str(&node.tag);
    for (key, value) in &node.attrs {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&value.to_string());
        out.push('"');
    }
    match &node.content {
        Content::Empty => {
            out.push_str(" />");
        }
        Content::Text(text) => {
            out.push('>');
            out.push_str(text);
            out.push_str("</");
            out.push_str(&node.tag);
            out.push('>');
        }
        Content::Children(children) => {
            out.push('>');
            if !children.is_empty() {
                for child in children {
                    out.push('\n');
                    write_node(child, out);
                }
                out.push('\n');
            }
            out.push_str("</");
            out.push_str(&node.tag);
            out.push('>');
        }
    }
}
