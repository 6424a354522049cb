//! # Field Paths
//!
//! A `FieldPath` locates a value inside a record graph as a sequence of
//! field names and array indices, rendered dotted (`items.1.name`).
//!
//! Errors and violations are created with paths relative to the record
//! being processed. Every layer that recurses prepends its own segment on
//! the way out, so the error surfaced to the caller always names the full
//! path from the root record to the failing leaf.

use std::fmt;

/// One step in a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// A named field.
    Field(String),
    /// A position inside a list.
    Index(usize),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => f.write_str(name),
            Self::Index(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for Segment {
    fn from(name: &str) -> Self {
        Self::Field(name.to_string())
    }
}

impl From<String> for Segment {
    fn from(name: String) -> Self {
        Self::Field(name)
    }
}

impl From<&String> for Segment {
    fn from(name: &String) -> Self {
        Self::Field(name.clone())
    }
}

impl From<usize> for Segment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Dotted location of a value relative to some record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<Segment>);

impl FieldPath {
    /// The empty path, i.e. the record itself.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// A single-segment path naming a field.
    pub fn field(name: impl Into<String>) -> Self {
        Self(vec![Segment::Field(name.into())])
    }

    /// Returns true for the empty path.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The segments from the outermost to the innermost.
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    /// Append a segment at the innermost end.
    pub fn push(&mut self, segment: impl Into<Segment>) {
        self.0.push(segment.into());
    }

    /// Prepend a segment at the outermost end.
    pub fn prepend(&mut self, segment: impl Into<Segment>) {
        self.0.insert(0, segment.into());
    }

    /// Consuming form of [`FieldPath::prepend`].
    pub fn prefixed(mut self, segment: impl Into<Segment>) -> Self {
        self.prepend(segment);
        self
    }

    /// Consuming form of [`FieldPath::push`].
    pub fn child(mut self, segment: impl Into<Segment>) -> Self {
        self.push(segment);
        self
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("(root)");
        }
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}
