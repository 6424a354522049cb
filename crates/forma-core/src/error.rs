//! # Error Hierarchy
//!
//! Structured error types for forma, built with `thiserror`.
//!
//! | Kind | Meaning |
//! |------|---------|
//! | [`MetadataError`] | A record's declared shape cannot be resolved into metadata. |
//! | [`MappingError`] | A source key cannot be resolved while mapping input. |
//! | [`CastError`] | No caster accepts a value, or the accepting caster rejects it. |
//! | [`ValidationError`] | One or more rule violations, always aggregated per call. |
//! | [`HydrationError`] | Input shape detection, missing fields, mutation guards, encoding. |
//!
//! Every kind that refers to a location carries a [`FieldPath`]. The path
//! is relative when the error is created and grows at the front while the
//! error bubbles out of nested hydration or normalization (see
//! [`Error::at`]).

use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::path::{FieldPath, Segment};

/// Result alias used throughout forma.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Top-level error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Unsupported declared shape.
    #[error("metadata error: {0}")]
    Metadata(#[from] MetadataError),

    /// Source key resolution failure.
    #[error("mapping error: {0}")]
    Mapping(#[from] MappingError),

    /// Type conversion failure.
    #[error("cast error: {0}")]
    Cast(#[from] CastError),

    /// Rule violations.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Everything else on the hydration/normalization boundary.
    #[error("hydration error: {0}")]
    Hydration(#[from] HydrationError),
}

impl Error {
    /// Prepend a path segment to whatever location this error carries.
    ///
    /// Metadata errors describe a type, not a value, and are returned as-is.
    pub fn at(mut self, segment: impl Into<Segment>) -> Self {
        let segment = segment.into();
        match &mut self {
            Self::Metadata(_) => {}
            Self::Mapping(e) => e.path.prepend(segment),
            Self::Cast(e) => e.path_mut().prepend(segment),
            Self::Validation(e) => e.violations.prepend(segment),
            Self::Hydration(e) => e.prepend(segment),
        }
        self
    }

    /// The violations carried by a validation or missing-field error.
    pub fn violations(&self) -> Option<&Violations> {
        match self {
            Self::Validation(e) => Some(&e.violations),
            Self::Hydration(HydrationError::MissingRequired { violations }) => Some(violations),
            _ => None,
        }
    }
}

/// A record's declared shape cannot be turned into metadata.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetadataError {
    /// A union with more than one non-null member.
    #[error("{record}.{field}: unsupported union type {types}")]
    UnsupportedUnion {
        record: String,
        field: String,
        types: String,
    },

    /// `null` used as a field type on its own.
    #[error("{record}.{field}: null is not a field type on its own")]
    NullType { record: String, field: String },

    /// Two fields share a name.
    #[error("{record}: field '{field}' is declared more than once")]
    DuplicateField { record: String, field: String },

    /// Constructor parameter that names no declared field.
    #[error("{record}: constructor parameter '{param}' is not a declared field")]
    UnknownConstructorParam { record: String, param: String },

    /// Declared field absent from the constructor parameters.
    #[error("{record}: field '{field}' is not a constructor parameter")]
    MissingConstructorParam { record: String, field: String },

    /// A validation rule whose parameters cannot work.
    #[error("{record}.{field}: invalid '{rule}' rule: {reason}")]
    InvalidRule {
        record: String,
        field: String,
        rule: String,
        reason: String,
    },
}

/// A source key could not be resolved.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{path}: source key '{key}' cannot be resolved, '{segment}' is not an object")]
pub struct MappingError {
    /// Location of the field being mapped.
    pub path: FieldPath,
    /// The full source key (possibly dotted).
    pub key: String,
    /// The segment whose value could not be traversed.
    pub segment: String,
}

/// A raw value could not be converted to the declared type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CastError {
    /// No registered caster claims the (property, value) pair.
    #[error("{path}: no caster accepts {actual} value {value} for type {expected}")]
    Unsupported {
        path: FieldPath,
        value: String,
        actual: &'static str,
        expected: String,
    },

    /// A caster claimed the value but could not convert it.
    #[error("{path}: cannot cast {actual} value {value} to {expected}: {reason}")]
    Invalid {
        path: FieldPath,
        value: String,
        actual: &'static str,
        expected: String,
        reason: String,
    },
}

impl CastError {
    /// No caster supports `value` for `expected`.
    pub fn unsupported(value: &Value, expected: impl fmt::Display) -> Self {
        Self::Unsupported {
            path: FieldPath::root(),
            value: preview(value),
            actual: json_kind(value),
            expected: expected.to_string(),
        }
    }

    /// `value` was claimed but rejected.
    pub fn invalid(value: &Value, expected: impl fmt::Display, reason: impl Into<String>) -> Self {
        Self::Invalid {
            path: FieldPath::root(),
            value: preview(value),
            actual: json_kind(value),
            expected: expected.to_string(),
            reason: reason.into(),
        }
    }

    /// Location of the failing value.
    pub fn path(&self) -> &FieldPath {
        match self {
            Self::Unsupported { path, .. } | Self::Invalid { path, .. } => path,
        }
    }

    fn path_mut(&mut self) -> &mut FieldPath {
        match self {
            Self::Unsupported { path, .. } | Self::Invalid { path, .. } => path,
        }
    }
}

/// A single rule failure.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// Location of the violating field.
    pub path: FieldPath,
    /// Rule identifier (`required`, `length`, ...).
    pub rule: String,
    /// Human-readable message.
    pub message: String,
}

impl Violation {
    pub fn new(path: FieldPath, rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path,
            rule: rule.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  {}: {} [{}]", self.path, self.message, self.rule)
    }
}

/// Ordered collection of violations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Violations {
    violations: Vec<Violation>,
}

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Returns true if there are no violations.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    /// Move every violation of `other` to the end of this collection.
    pub fn extend(&mut self, other: Violations) {
        self.violations.extend(other.violations);
    }

    /// Returns a slice of all violations.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.violations.iter()
    }

    /// Dotted paths of every violation, in order.
    pub fn paths(&self) -> Vec<String> {
        self.violations.iter().map(|v| v.path.to_string()).collect()
    }

    /// Prepend `segment` to every violation path.
    pub fn prepend(&mut self, segment: impl Into<Segment>) {
        let segment = segment.into();
        for violation in &mut self.violations {
            violation.path.prepend(segment.clone());
        }
    }

    /// Consuming form of [`Violations::prepend`].
    pub fn prefixed(mut self, segment: impl Into<Segment>) -> Self {
        self.prepend(segment);
        self
    }

    /// Consumes self and returns the inner Vec.
    pub fn into_inner(self) -> Vec<Violation> {
        self.violations
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Violations {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.iter()
    }
}

/// One or more rule violations collected over a whole record graph.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{} rule violation(s):\n{violations}", .violations.len())]
pub struct ValidationError {
    pub violations: Violations,
}

/// Catch-all for the hydration/normalization boundary.
#[derive(Error, Debug)]
pub enum HydrationError {
    /// Fields without a value and without a default.
    #[error("missing required field(s): {}", .violations.paths().join(", "))]
    MissingRequired { violations: Violations },

    /// No input normalizer recognises the source.
    #[error("no input normalizer accepts {shape} input")]
    UnsupportedInput { shape: String },

    /// Text input could not be decoded.
    #[error("cannot decode input: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
    },

    /// Output could not be encoded.
    #[error("cannot encode {path}: {reason}")]
    Encode {
        path: FieldPath,
        reason: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// Mutation of a field the record does not declare.
    #[error("{record} has no field '{field}'")]
    UnknownField { record: String, field: String },

    /// Mutation of a read-only field or record.
    #[error("{record}.{field} is read-only")]
    ReadonlyField { record: String, field: String },

    /// The record rejected its arguments.
    #[error("{path}: cannot construct {record}: {reason}")]
    Construction {
        path: FieldPath,
        record: String,
        reason: String,
    },

    /// Record graph nested deeper than the configured limit.
    #[error("{path}: nesting deeper than {limit} levels")]
    DepthExceeded { path: FieldPath, limit: usize },
}

impl HydrationError {
    /// Consuming prefix, see [`Error::at`].
    pub fn at(mut self, segment: impl Into<Segment>) -> Self {
        self.prepend(segment.into());
        self
    }

    fn prepend(&mut self, segment: Segment) {
        match self {
            Self::MissingRequired { violations } => violations.prepend(segment),
            Self::Encode { path, .. }
            | Self::Construction { path, .. }
            | Self::DepthExceeded { path, .. } => path.prepend(segment),
            Self::UnsupportedInput { .. }
            | Self::Decode { .. }
            | Self::UnknownField { .. }
            | Self::ReadonlyField { .. } => {}
        }
    }
}

/// Runtime type tag of a raw JSON value.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Short rendering of a raw value for error messages.
fn preview(value: &Value) -> String {
    const LIMIT: usize = 64;
    let rendered = value.to_string();
    if rendered.chars().count() <= LIMIT {
        return rendered;
    }
    let cut: String = rendered.chars().take(LIMIT).collect();
    format!("{cut}…")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cast_error_gains_prefix_while_bubbling() {
        let err = Error::from(CastError::invalid(&json!("x"), "int", "not a number"))
            .at("age")
            .at(1usize)
            .at("people");
        match &err {
            Error::Cast(cast) => assert_eq!(cast.path().to_string(), "people.1.age"),
            other => panic!("expected cast error, got {other}"),
        }
        assert!(err.to_string().contains("people.1.age"));
    }

    #[test]
    fn validation_prefix_applies_to_all_violations() {
        let mut violations = Violations::new();
        violations.push(Violation::new(FieldPath::field("a"), "required", "a is required"));
        violations.push(Violation::new(FieldPath::field("b"), "required", "b is required"));
        let err = Error::from(ValidationError { violations }).at("inner");
        assert_eq!(
            err.violations().map(|v| v.paths()),
            Some(vec!["inner.a".to_string(), "inner.b".to_string()])
        );
    }

    #[test]
    fn missing_required_names_every_field() {
        let mut violations = Violations::new();
        violations.push(Violation::new(FieldPath::field("age"), "required", "missing"));
        let err = HydrationError::MissingRequired { violations };
        assert_eq!(err.to_string(), "missing required field(s): age");
    }

    #[test]
    fn metadata_error_ignores_prefix() {
        let err = Error::from(MetadataError::NullType {
            record: "User".into(),
            field: "x".into(),
        })
        .at("outer");
        assert!(matches!(err, Error::Metadata(_)));
    }

    #[test]
    fn violation_display_root() {
        let v = Violation::new(FieldPath::root(), "custom", "whole record rejected");
        assert!(v.to_string().contains("(root)"));
    }

    #[test]
    fn json_kind_tags() {
        assert_eq!(json_kind(&json!(1)), "int");
        assert_eq!(json_kind(&json!(1.5)), "float");
        assert_eq!(json_kind(&json!({})), "object");
    }

    #[test]
    fn long_values_are_truncated_in_messages() {
        let long = "x".repeat(200);
        let err = CastError::invalid(&json!(long), "int", "nope");
        assert!(err.to_string().contains('…'));
    }
}
