//! Declarative field-rule tables
//!
//! A [`SchemaDefinition`] maps type tags to ordered lists of [`FieldRule`]s.
//! Tags are plain enums: each protocol version registers its table once at
//! load time and the mapper dispatches on the tag, never on strings.
//!
//! ```rust
//! use wfs_capabilities::namespaces::NamespaceBindings;
//! use wfs_capabilities::schema::{FieldRule, SchemaDefinition};
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! enum Tag { Main, Item }
//!
//! let schema = SchemaDefinition::builder(NamespaceBindings::new().with("a", "urn:a"))
//!     .rules(Tag::Main, vec![FieldRule::objects("./a:Items/a:Item", "items", Tag::Item)])
//!     .rules(Tag::Item, vec![FieldRule::text("./a:Name", "name")])
//!     .build()
//!     .unwrap();
//! assert_eq!(schema.rules(Tag::Main).len(), 1);
//! ```

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use crate::error::{Error, Result};
use crate::namespaces::NamespaceBindings;
use crate::xpath::Selector;

/// Tag naming one object type in a schema
pub trait SchemaType: Copy + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> SchemaType for T where T: Copy + Eq + Hash + Debug + Send + Sync + 'static {}

/// How many nodes a rule's path selects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Multiplicity {
    /// First match only
    Single,
    /// Every match, in document order
    Many,
}

/// One declarative instruction: path, destination key, multiplicity, nested type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRule<T> {
    /// Selector expression, relative to the object's node
    pub path: String,
    /// Key the decoded value is stored under
    pub dest: String,
    /// Single or many
    pub multiplicity: Multiplicity,
    /// Decode matches as objects of this type instead of text
    pub nested: Option<T>,
}

impl<T: SchemaType> FieldRule<T> {
    /// Scalar text of the first match
    pub fn text(path: impl Into<String>, dest: impl Into<String>) -> Self {
        Self::new(path, dest, Multiplicity::Single, None)
    }

    /// Scalar text of every match
    pub fn texts(path: impl Into<String>, dest: impl Into<String>) -> Self {
        Self::new(path, dest, Multiplicity::Many, None)
    }

    /// Nested object from the first match
    pub fn object(path: impl Into<String>, dest: impl Into<String>, nested: T) -> Self {
        Self::new(path, dest, Multiplicity::Single, Some(nested))
    }

    /// Nested object from every match
    pub fn objects(path: impl Into<String>, dest: impl Into<String>, nested: T) -> Self {
        Self::new(path, dest, Multiplicity::Many, Some(nested))
    }

    fn new(
        path: impl Into<String>,
        dest: impl Into<String>,
        multiplicity: Multiplicity,
        nested: Option<T>,
    ) -> Self {
        Self {
            path: path.into(),
            dest: dest.into(),
            multiplicity,
            nested,
        }
    }
}

/// A field rule with its selector compiled
#[derive(Debug, Clone)]
pub struct CompiledRule<T> {
    /// The declared rule
    pub rule: FieldRule<T>,
    /// Selector compiled against the schema's namespace bindings
    pub selector: Selector,
}

/// Immutable type table for one document dialect
#[derive(Debug, Clone)]
pub struct SchemaDefinition<T> {
    namespaces: NamespaceBindings,
    types: HashMap<T, Vec<CompiledRule<T>>>,
}

impl<T: SchemaType> SchemaDefinition<T> {
    /// Start a schema over the given namespace bindings
    pub fn builder(namespaces: NamespaceBindings) -> SchemaBuilder<T> {
        SchemaBuilder {
            namespaces,
            types: Vec::new(),
        }
    }

    /// Namespace bindings used by every selector of this schema
    pub fn namespaces(&self) -> &NamespaceBindings {
        &self.namespaces
    }

    /// Rules of a type, empty for unknown tags
    pub fn rules(&self, tag: T) -> &[CompiledRule<T>] {
        self.types.get(&tag).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether the type is defined
    pub fn contains(&self, tag: T) -> bool {
        self.types.contains_key(&tag)
    }
}

/// Builder validating a schema before it can be used
#[derive(Debug)]
pub struct SchemaBuilder<T> {
    namespaces: NamespaceBindings,
    types: Vec<(T, Vec<FieldRule<T>>)>,
}

impl<T: SchemaType> SchemaBuilder<T> {
    /// Define the rules of a type
    pub fn rules(mut self, tag: T, rules: Vec<FieldRule<T>>) -> Self {
        self.types.push((tag, rules));
        self
    }

    /// Compile selectors and check that every nested type exists
    pub fn build(self) -> Result<SchemaDefinition<T>> {
        let mut types: HashMap<T, Vec<CompiledRule<T>>> = HashMap::new();

        for (tag, rules) in &self.types {
            if types.contains_key(tag) {
                return Err(Error::Config(format!("Type {:?} is defined twice", tag)));
            }
            let compiled = rules
                .iter()
                .map(|rule| -> Result<CompiledRule<T>> {
                    Ok(CompiledRule {
                        selector: Selector::compile(&rule.path, &self.namespaces)?,
                        rule: rule.clone(),
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            types.insert(*tag, compiled);
        }

        for (tag, rules) in &types {
            for compiled in rules {
                if let Some(nested) = compiled.rule.nested {
                    if !types.contains_key(&nested) {
                        return Err(Error::Config(format!(
                            "Rule '{}' of type {:?} references undefined type {:?}",
                            compiled.selector.path(), tag, nested
                        )));
                    }
                }
            }
        }

        Ok(SchemaDefinition {
            namespaces: self.namespaces,
            types,
        })
    }
}
