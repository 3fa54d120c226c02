//! XPath step syntax
//!
//! This module splits selector expressions into steps and parses each step
//! into its axis and (possibly prefixed) name test.

/// A single step in a path expression
#[derive(Debug, Clone, PartialEq)]
pub struct PathStep {
    /// The kind of step
    pub kind: PathStepKind,
    /// The local name, `*` for any
    pub name: String,
    /// Optional namespace prefix
    pub prefix: Option<String>,
    /// Optional predicate
    pub predicate: Option<String>,
}

impl PathStep {
    /// Parse a step from a string
    pub fn parse(step: &str) -> Self {
        let step = step.trim();

        match step {
            "/" => return Self::axis(PathStepKind::Root),
            ".//" => return Self::axis(PathStepKind::DescendantOrSelf),
            "." | "self::node()" => return Self::axis(PathStepKind::Self_),
            ".." | "parent::node()" => return Self::axis(PathStepKind::Parent),
            _ => {}
        }

        let (kind, rest) = if let Some(rest) = step.strip_prefix('@') {
            (PathStepKind::Attribute, rest)
        } else if let Some(rest) = step.strip_prefix("attribute::") {
            (PathStepKind::Attribute, rest)
        } else if let Some(rest) = step.strip_prefix("child::") {
            (PathStepKind::Child, rest)
        } else {
            (PathStepKind::Child, step)
        };

        let (name_part, predicate) = if let Some(bracket_pos) = rest.find('[') {
            let name = &rest[..bracket_pos];
            let pred_end = rest.rfind(']').unwrap_or(rest.len());
            let pred = &rest[bracket_pos + 1..pred_end.max(bracket_pos + 1)];
            (name, Some(pred.to_string()))
        } else {
            (rest, None)
        };

        let (prefix, name) = match name_part.split_once(':') {
            Some((prefix, local)) => (Some(prefix.to_string()), local.to_string()),
            None => (None, name_part.to_string()),
        };

        Self {
            kind,
            name,
            prefix,
            predicate,
        }
    }

    fn axis(kind: PathStepKind) -> Self {
        Self {
            kind,
            name: String::new(),
            prefix: None,
            predicate: None,
        }
    }

    /// Get the qualified name (prefix:local)
    pub fn qname(&self) -> String {
        if let Some(prefix) = &self.prefix {
            format!("{}:{}", prefix, self.name)
        } else {
            self.name.clone()
        }
    }

    /// Check if this step matches any name (*)
    pub fn is_wildcard(&self) -> bool {
        self.name == "*"
    }
}

/// Kind of path step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStepKind {
    /// Document node (leading `/`)
    Root,
    /// Child axis (default)
    Child,
    /// Attribute axis (@)
    Attribute,
    /// Descendant-or-self axis (//)
    DescendantOrSelf,
    /// Self axis (.)
    Self_,
    /// Parent axis (..)
    Parent,
}

/// Split a path expression into steps
///
/// A leading `/` becomes a `"/"` step and every `//` becomes a `".//"` step.
pub fn split_path(path: &str) -> Vec<&str> {
    let path = path.trim();

    if path.is_empty() {
        return Vec::new();
    }
    if path == "." {
        return vec!["."];
    }

    let mut steps = Vec::new();
    let mut current_start = 0;

    if path.starts_with(".//") {
        steps.push(".");
        steps.push(".//");
        current_start = 3;
    } else if path.starts_with("./") {
        steps.push(".");
        current_start = 2;
    } else if path.starts_with("//") {
        steps.push("/");
        steps.push(".//");
        current_start = 2;
    } else if path.starts_with('/') {
        steps.push("/");
        current_start = 1;
    }

    let mut in_predicate = 0usize;
    let bytes = path.as_bytes();
    let len = bytes.len();
    let mut i = current_start;

    while i < len {
        match bytes[i] {
            b'[' => {
                in_predicate += 1;
                i += 1;
            }
            b']' => {
                in_predicate = in_predicate.saturating_sub(1);
                i += 1;
            }
            b'/' if in_predicate == 0 => {
                let is_double = i + 1 < len && bytes[i + 1] == b'/';

                if i > current_start {
                    steps.push(&path[current_start..i]);
                }

                if is_double {
                    steps.push(".//");
                    current_start = i + 2;
                    i += 2;
                } else {
                    current_start = i + 1;
                    i += 1;
                }
            }
            _ => {
                i += 1;
            }
        }
    }

    if current_start < len {
        steps.push(&path[current_start..]);
    }

    steps
}

/// Check if a string is a valid NCName (non-colonized name)
pub fn is_ncname(s: &str) -> bool {
    let mut chars = s.chars();

    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }

    chars.all(is_ncname_char)
}

/// Check if a character is valid in an NCName (not at start)
pub fn is_ncname_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '.'
}
