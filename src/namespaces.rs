//! XML namespace handling
//!
//! This module provides qualified names and the fixed prefix bindings each
//! protocol version uses to evaluate its selectors.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fmt;

/// XML Namespace URI
pub type NamespaceUri = String;

/// Namespace prefix
pub type Prefix = String;

/// Qualified name (QName) - combination of namespace and local name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    /// Namespace URI (None for no namespace)
    pub namespace: Option<NamespaceUri>,
    /// Local name
    pub local_name: String,
}

impl QName {
    /// Create a QName without a namespace
    pub fn local(local_name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local_name: local_name.into(),
        }
    }

    /// Create a QName with a namespace
    pub fn namespaced(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            local_name: local_name.into(),
        }
    }

    /// Check whether a parsed node name matches this QName
    pub fn matches(&self, name: roxmltree::ExpandedName<'_, '_>) -> bool {
        name.name() == self.local_name && name.namespace() == self.namespace.as_deref()
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local_name),
            None => write!(f, "{}", self.local_name),
        }
    }
}

/// Prefix to namespace URI bindings used when evaluating selectors
///
/// Unprefixed names in a selector resolve to no namespace, as in XPath 1.0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceBindings {
    prefixes: BTreeMap<Prefix, NamespaceUri>,
}

impl NamespaceBindings {
    /// Create empty bindings
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a binding, builder style
    pub fn with(mut self, prefix: impl Into<String>, namespace: impl Into<String>) -> Self {
        self.add_prefix(prefix, namespace);
        self
    }

    /// Add a namespace prefix mapping
    pub fn add_prefix(&mut self, prefix: impl Into<String>, namespace: impl Into<String>) {
        self.prefixes.insert(prefix.into(), namespace.into());
    }

    /// Get the namespace for a prefix
    pub fn get_namespace(&self, prefix: &str) -> Option<&str> {
        self.prefixes.get(prefix).map(|s| s.as_str())
    }

    /// Iterate bindings in prefix order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefixes.iter().map(|(p, u)| (p.as_str(), u.as_str()))
    }

    /// Resolve a prefixed name to a QName
    pub fn resolve(&self, prefixed_name: &str) -> Result<QName> {
        if let Some((prefix, local)) = prefixed_name.split_once(':') {
            let namespace = self
                .get_namespace(prefix)
                .ok_or_else(|| Error::Config(format!("Unknown prefix: {}", prefix)))?;
            Ok(QName::namespaced(namespace, local))
        } else {
            Ok(QName::local(prefixed_name))
        }
    }
}
