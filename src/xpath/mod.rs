//! Namespace-qualified path selectors
//!
//! Field rules address document content with a small XPath 1.0 subset:
//! child steps (`wfs:Name`, `*`), attributes (`@version`), `.`, `..`,
//! a leading `/` and `//`. Predicates are not supported.
//!
//! Selectors are compiled once against a set of [`NamespaceBindings`], so a
//! prefix that is not bound is reported when a schema is built, not while a
//! document is being decoded.

mod selectors;

pub use selectors::{is_ncname, is_ncname_char, split_path, PathStep, PathStepKind};

use crate::documents::XmlNode;
use crate::error::{Error, Result};
use crate::namespaces::{NamespaceBindings, QName};

/// Name test of a compiled step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameTest {
    /// `*`
    Any,
    /// A resolved qualified name
    Name(QName),
}

impl NameTest {
    fn matches(&self, name: roxmltree::ExpandedName<'_, '_>) -> bool {
        match self {
            NameTest::Any => true,
            NameTest::Name(qname) => qname.matches(name),
        }
    }
}

/// A compiled step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Move to the document node
    Root,
    /// Stay on the context node
    SelfNode,
    /// Move to the parent element (or the owner element of an attribute)
    Parent,
    /// The context node and all of its descendants
    DescendantOrSelf,
    /// Child elements matching the test
    Child(NameTest),
    /// Attributes matching the test
    Attribute(NameTest),
}

/// A compiled selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    path: String,
    steps: Vec<Step>,
}

impl Selector {
    /// Compile a path against namespace bindings
    pub fn compile(path: &str, namespaces: &NamespaceBindings) -> Result<Self> {
        let parts = split_path(path);
        if parts.is_empty() {
            return Err(Error::Config("Empty selector".to_string()));
        }

        let steps = parts
            .into_iter()
            .map(|part| Self::compile_step(path, &PathStep::parse(part), namespaces))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            path: path.to_string(),
            steps,
        })
    }

    fn compile_step(path: &str, step: &PathStep, namespaces: &NamespaceBindings) -> Result<Step> {
        if step.predicate.is_some() {
            return Err(Error::Config(format!(
                "Predicates are not supported in selector '{}'",
                path
            )));
        }

        let test = || -> Result<NameTest> {
            if step.is_wildcard() && step.prefix.is_none() {
                return Ok(NameTest::Any);
            }
            if !is_ncname(&step.name) {
                return Err(Error::Config(format!(
                    "Invalid name '{}' in selector '{}'",
                    step.qname(),
                    path
                )));
            }
            namespaces.resolve(&step.qname()).map(NameTest::Name)
        };

        Ok(match step.kind {
            PathStepKind::Root => Step::Root,
            PathStepKind::Self_ => Step::SelfNode,
            PathStepKind::Parent => Step::Parent,
            PathStepKind::DescendantOrSelf => Step::DescendantOrSelf,
            PathStepKind::Child => Step::Child(test()?),
            PathStepKind::Attribute => Step::Attribute(test()?),
        })
    }

    /// The source expression
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Evaluate against a context node, returning matches in document order
    pub fn select<'a, 'input>(&self, context: XmlNode<'a, 'input>) -> Vec<XmlNode<'a, 'input>> {
        let mut current = vec![context];

        for step in &self.steps {
            let mut next = Vec::new();
            for node in &current {
                Self::apply(step, *node, &mut next);
            }
            next.sort_by_key(XmlNode::document_order);
            next.dedup_by_key(|n| n.document_order());
            current = next;
            if current.is_empty() {
                break;
            }
        }

        current
    }

    /// Evaluate and keep the first match
    pub fn select_first<'a, 'input>(
        &self,
        context: XmlNode<'a, 'input>,
    ) -> Option<XmlNode<'a, 'input>> {
        self.select(context).into_iter().next()
    }

    fn apply<'a, 'input>(step: &Step, node: XmlNode<'a, 'input>, out: &mut Vec<XmlNode<'a, 'input>>) {
        match step {
            Step::Root => out.push(XmlNode::Element(node.owner().document().root())),
            Step::SelfNode => out.push(node),
            Step::Parent => match node {
                XmlNode::Attribute { owner, .. } => out.push(XmlNode::Element(owner)),
                XmlNode::Element(element) => {
                    if let Some(parent) = element.parent() {
                        out.push(XmlNode::Element(parent));
                    }
                }
            },
            Step::DescendantOrSelf => {
                if let XmlNode::Element(element) = node {
                    out.extend(
                        element
                            .descendants()
                            .filter(|n| n.is_element() || n.is_root())
                            .map(XmlNode::Element),
                    );
                }
            }
            Step::Child(test) => {
                if let XmlNode::Element(element) = node {
                    out.extend(
                        element
                            .children()
                            .filter(|c| c.is_element() && test.matches(c.tag_name()))
                            .map(XmlNode::Element),
                    );
                }
            }
            Step::Attribute(test) => {
                if let XmlNode::Element(element) = node {
                    for (index, attr) in element.attributes().enumerate() {
                        let matched = match test {
                            NameTest::Any => true,
                            NameTest::Name(qname) => {
                                attr.name() == qname.local_name
                                    && attr.namespace() == qname.namespace.as_deref()
                            }
                        };
                        if matched {
                            out.push(XmlNode::Attribute {
                                owner: element,
                                index,
                                value: attr.value(),
                            });
                        }
                    }
                }
            }
        }
    }
}
