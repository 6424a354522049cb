//! # Conversion Extension Points
//!
//! Casters turn raw input values into typed [`FieldValue`]s during
//! hydration. Transformers turn typed values back into plain ones during
//! normalization. Both are selected per property: an explicit
//! caster/transformer declared on the field wins, otherwise the engine's
//! registry asks each registered implementation in priority order and the
//! first one whose `supports` returns true handles the value.

use std::fmt;

use serde_json::Value;

use crate::context::Context;
use crate::error::{CastError, Result};
use crate::meta::PropertyMeta;
use crate::value::FieldValue;

/// Raw input to typed value.
pub trait Caster: Send + Sync + fmt::Debug {
    /// Name used in logs and metadata equality.
    fn name(&self) -> &str;

    /// Whether this caster handles `value` for `property`.
    fn supports(&self, property: &PropertyMeta, value: &Value) -> bool;

    /// # Errors
    ///
    /// Returns [`CastError`] when the value was claimed but cannot be
    /// converted. The error path is relative to the property.
    fn cast(
        &self,
        property: &PropertyMeta,
        value: &Value,
        context: &Context,
    ) -> std::result::Result<FieldValue, CastError>;
}

/// Typed value to plain value.
pub trait Transformer: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn supports(&self, property: &PropertyMeta, value: &FieldValue) -> bool;

    /// # Errors
    ///
    /// Any [`crate::Error`]; the normalizer prefixes it with the field name.
    fn transform(
        &self,
        property: &PropertyMeta,
        value: &FieldValue,
        context: &Context,
    ) -> Result<FieldValue>;
}
