//! Declarative document mapper
//!
//! Turns document nodes into [`MappedValue`] trees by following the field
//! rules of a [`SchemaDefinition`]. The mapper is pure: the same node and type
//! always produce the same value, and nothing is mutated.
//!
//! Absence is contagious. Empty text, an empty node-set, a list whose members
//! are all absent and an object with no populated keys all come back as
//! `None`, so callers never see an empty container standing in for
//! "not present in the document".

use indexmap::IndexMap;
use serde::Serialize;

use crate::documents::XmlNode;
use crate::schema::{Multiplicity, SchemaDefinition, SchemaType};

/// Decoded object, keys in rule order
pub type MappedObject = IndexMap<String, MappedValue>;

/// A decoded value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MappedValue {
    /// Scalar text
    Text(String),
    /// Values of a multi-valued rule, in document order
    List(Vec<MappedValue>),
    /// A nested object
    Object(MappedObject),
}

impl MappedValue {
    /// Text content, if this is a scalar
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MappedValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Fields, if this is an object
    pub fn as_object(&self) -> Option<&MappedObject> {
        match self {
            MappedValue::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Mutable fields, if this is an object
    pub fn as_object_mut(&mut self) -> Option<&mut MappedObject> {
        match self {
            MappedValue::Object(obj) => Some(obj),
            _ => None,
        }
    }
}

/// Schema-driven mapper over one [`SchemaDefinition`]
#[derive(Debug, Clone, Copy)]
pub struct DocumentMapper<'s, T> {
    schema: &'s SchemaDefinition<T>,
}

impl<'s, T: SchemaType> DocumentMapper<'s, T> {
    /// Create a mapper for a schema
    pub fn new(schema: &'s SchemaDefinition<T>) -> Self {
        Self { schema }
    }

    /// Text of a node; attribute values or element text, empty becomes absent
    ///
    /// Leading and trailing whitespace is trimmed, so pretty-printed
    /// documents decode to the bare value; inner whitespace is kept as is.
    pub fn build_text_value(&self, node: Option<XmlNode<'_, '_>>) -> Option<String> {
        let text = node?.text();
        let text = text.trim();
        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }

    /// Map every node as `nested` objects or as text, dropping absent results
    pub fn build_array(&self, nodes: &[XmlNode<'_, '_>], nested: Option<T>) -> Option<Vec<MappedValue>> {
        if nodes.is_empty() {
            return None;
        }

        let values: Vec<MappedValue> = nodes
            .iter()
            .filter_map(|node| match nested {
                Some(tag) => self.build_object(Some(*node), tag).map(MappedValue::Object),
                None => self.build_text_value(Some(*node)).map(MappedValue::Text),
            })
            .collect();

        if values.is_empty() {
            None
        } else {
            Some(values)
        }
    }

    /// Apply every rule of `tag` to the node; absent when no key is populated
    pub fn build_object(&self, node: Option<XmlNode<'_, '_>>, tag: T) -> Option<MappedObject> {
        let node = node?;
        let mut result = MappedObject::new();

        for compiled in self.schema.rules(tag) {
            let rule = &compiled.rule;
            let value = match (rule.multiplicity, rule.nested) {
                (Multiplicity::Many, nested) => self
                    .build_array(&node.find(&compiled.selector), nested)
                    .map(MappedValue::List),
                (Multiplicity::Single, Some(nested)) => self
                    .build_object(node.get(&compiled.selector), nested)
                    .map(MappedValue::Object),
                (Multiplicity::Single, None) => self
                    .build_text_value(node.get(&compiled.selector))
                    .map(MappedValue::Text),
            };

            if let Some(value) = value {
                result.insert(rule.dest.clone(), value);
            }
        }

        if result.is_empty() {
            None
        } else {
            Some(result)
        }
    }
}
