//! XML document handling
//!
//! Response bodies are decoded to UTF-8 text and parsed with `roxmltree`.
//! [`XmlNode`] is the node type selectors and the mapper work with: either an
//! element (or the document node) or one attribute of an element.

use crate::error::{Error, Result};
use crate::xpath::Selector;
use once_cell::sync::Lazy;
use regex::Regex;

static XML_DECL_ENCODING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*<\?xml[^>]*?\bencoding\s*=\s*["']([A-Za-z][A-Za-z0-9._-]*)["']"#).unwrap()
});

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Decode a response body into document text
///
/// Only UTF-8 (and its ASCII subset) is accepted. A body whose XML
/// declaration names another encoding is rejected rather than misread.
pub fn decode_body(body: &[u8]) -> Result<&str> {
    let body = body.strip_prefix(UTF8_BOM).unwrap_or(body);
    let text = std::str::from_utf8(body)
        .map_err(|e| Error::MalformedDocument(format!("Body is not valid UTF-8: {}", e)))?;

    if let Some(caps) = XML_DECL_ENCODING.captures(text) {
        let encoding = caps[1].to_ascii_lowercase();
        if !matches!(encoding.as_str(), "utf-8" | "utf8" | "us-ascii" | "ascii") {
            return Err(Error::MalformedDocument(format!(
                "Unsupported document encoding: {}",
                &caps[1]
            )));
        }
    }

    Ok(text)
}

/// A parsed XML document
#[derive(Debug)]
pub struct XmlDocument<'input> {
    tree: roxmltree::Document<'input>,
}

impl<'input> XmlDocument<'input> {
    /// Parse document text
    pub fn parse(text: &'input str) -> Result<Self> {
        let options = roxmltree::ParsingOptions {
            allow_dtd: true,
            ..Default::default()
        };
        let tree = roxmltree::Document::parse_with_options(text, options)?;
        Ok(Self { tree })
    }

    /// Decode and parse a response body
    pub fn from_bytes(body: &'input [u8]) -> Result<Self> {
        Self::parse(decode_body(body)?)
    }

    /// The root element
    pub fn root(&self) -> XmlNode<'_, 'input> {
        XmlNode::Element(self.tree.root_element())
    }

    /// Local name of the root element
    pub fn root_name(&self) -> &str {
        self.tree.root_element().tag_name().name()
    }
}

/// A node reached by a selector
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum XmlNode<'a, 'input> {
    /// An element or the document node
    Element(roxmltree::Node<'a, 'input>),
    /// An attribute, identified by its owner element and position
    Attribute {
        /// Element carrying the attribute
        owner: roxmltree::Node<'a, 'input>,
        /// Position among the owner's attributes
        index: usize,
        /// Attribute value
        value: &'a str,
    },
}

impl<'a, 'input> XmlNode<'a, 'input> {
    /// Whether this is an attribute node
    pub fn is_attribute(&self) -> bool {
        matches!(self, XmlNode::Attribute { .. })
    }

    /// The element itself, or the owner of an attribute
    pub fn owner(&self) -> roxmltree::Node<'a, 'input> {
        match *self {
            XmlNode::Element(node) => node,
            XmlNode::Attribute { owner, .. } => owner,
        }
    }

    /// Text content: an attribute's value, or the concatenated descendant text of an element
    pub fn text(&self) -> String {
        match *self {
            XmlNode::Attribute { value, .. } => value.to_string(),
            XmlNode::Element(node) => node
                .descendants()
                .filter(|n| n.is_text())
                .filter_map(|n| n.text())
                .collect(),
        }
    }

    /// Value of an unqualified attribute on this element
    pub fn attribute(&self, name: &str) -> Option<&'a str> {
        match *self {
            XmlNode::Element(node) => node.attribute(name),
            XmlNode::Attribute { .. } => None,
        }
    }

    /// All nodes matched by a selector, in document order
    pub fn find(&self, selector: &Selector) -> Vec<XmlNode<'a, 'input>> {
        selector.select(*self)
    }

    /// First node matched by a selector
    pub fn get(&self, selector: &Selector) -> Option<XmlNode<'a, 'input>> {
        selector.select_first(*self)
    }

    /// Sort key: node ids are allocated in document order, attributes follow their owner
    pub(crate) fn document_order(&self) -> (u32, usize) {
        match *self {
            XmlNode::Element(node) => (node.id().get(), 0),
            XmlNode::Attribute { owner, index, .. } => (owner.id().get(), index + 1),
        }
    }
}
