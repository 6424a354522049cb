//! # Transformers
//!
//! Output-side mirror of the caster registry: the first transformer, by
//! descending priority, that supports a (property, value) pair turns the
//! typed value into plain data. Values no transformer claims pass through
//! unchanged.
//!
//! | Transformer | Priority | Output |
//! |-------------|----------|--------|
//! | [`DateTimeTransformer`] | 20 | date/time as a formatted string |
//! | [`EnumTransformer`] | 10 | enum case as its backing value |

use std::fmt::Write;

use forma_core::{Context, FieldPath, FieldValue, HydrationError, PropertyMeta, Result, Transformer};

use crate::priority::PriorityList;

pub const DATETIME_PRIORITY: i32 = 20;
pub const ENUM_PRIORITY: i32 = 10;

/// Priority-ordered transformers.
#[derive(Debug, Default)]
pub struct TransformerRegistry {
    transformers: PriorityList<dyn Transformer>,
}

impl TransformerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, transformer: impl Transformer + 'static, priority: i32) {
        self.register_boxed(Box::new(transformer), priority);
    }

    pub fn register_boxed(&mut self, transformer: Box<dyn Transformer>, priority: i32) {
        tracing::debug!(transformer = transformer.name(), priority, "registered transformer");
        self.transformers.insert(transformer, priority);
    }

    pub fn get(&self, property: &PropertyMeta, value: &FieldValue) -> Option<&dyn Transformer> {
        self.transformers.iter().find(|t| t.supports(property, value))
    }

    /// Transform with the first supporting transformer, if any.
    ///
    /// # Errors
    ///
    /// Whatever the selected transformer returns.
    pub fn transform(
        &self,
        property: &PropertyMeta,
        value: &FieldValue,
        context: &Context,
    ) -> Option<Result<FieldValue>> {
        self.get(property, value)
            .map(|t| t.transform(property, value, context))
    }

    pub fn len(&self) -> usize {
        self.transformers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transformers.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.transformers.iter().map(|t| t.name().to_string()).collect()
    }
}

/// Date/time to string with a strftime format.
#[derive(Debug, Clone)]
pub struct DateTimeTransformer {
    format: String,
}

impl DateTimeTransformer {
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
        }
    }
}

impl Default for DateTimeTransformer {
    fn default() -> Self {
        Self::new(crate::EngineConfig::default().date_format)
    }
}

impl Transformer for DateTimeTransformer {
    fn name(&self) -> &str {
        "datetime"
    }

    fn supports(&self, _property: &PropertyMeta, value: &FieldValue) -> bool {
        matches!(value, FieldValue::DateTime(_))
    }

    fn transform(&self, _property: &PropertyMeta, value: &FieldValue, _context: &Context) -> Result<FieldValue> {
        match value {
            FieldValue::DateTime(dt) => {
                let mut out = String::new();
                write!(out, "{}", dt.format(&self.format)).map_err(|_| HydrationError::Encode {
                    path: FieldPath::root(),
                    reason: format!("'{}' is not a usable date format", self.format),
                    source: None,
                })?;
                Ok(FieldValue::String(out))
            }
            other => Ok(other.clone()),
        }
    }
}

/// Enum case to its backing value.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnumTransformer;

impl Transformer for EnumTransformer {
    fn name(&self) -> &str {
        "enum"
    }

    fn supports(&self, _property: &PropertyMeta, value: &FieldValue) -> bool {
        matches!(value, FieldValue::Enum(_))
    }

    fn transform(&self, _property: &PropertyMeta, value: &FieldValue, _context: &Context) -> Result<FieldValue> {
        match value {
            FieldValue::Enum(e) => Ok(FieldValue::from_json(e.value.clone())),
            other => Ok(other.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use forma_core::meta::{TypeDescriptor, TypeTag};
    use forma_core::EnumValue;
    use serde_json::json;

    fn property() -> PropertyMeta {
        PropertyMeta::new("f", TypeDescriptor::scalar(TypeTag::Any))
    }

    #[test]
    fn datetime_uses_configured_format() {
        let dt = DateTime::parse_from_rfc3339("2024-05-01T10:00:00+02:00").unwrap();
        let value = FieldValue::DateTime(dt);
        let iso = DateTimeTransformer::default()
            .transform(&property(), &value, &Context::new())
            .unwrap();
        assert_eq!(iso, FieldValue::String("2024-05-01T10:00:00+02:00".into()));
        let day = DateTimeTransformer::new("%d.%m.%Y")
            .transform(&property(), &value, &Context::new())
            .unwrap();
        assert_eq!(day, FieldValue::String("01.05.2024".into()));
    }

    #[test]
    fn unusable_format_is_an_error_not_a_panic() {
        let dt = DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z").unwrap();
        let result = DateTimeTransformer::new("%Q").transform(&property(), &FieldValue::DateTime(dt), &Context::new());
        assert!(result.is_err());
    }

    #[test]
    fn enum_becomes_backing_value() {
        let value = FieldValue::Enum(EnumValue {
            enum_name: "Level",
            case: "High",
            value: json!(2),
        });
        let out = EnumTransformer.transform(&property(), &value, &Context::new()).unwrap();
        assert_eq!(out, FieldValue::Int(2));
    }

    #[test]
    fn unclaimed_values_return_none() {
        let mut registry = TransformerRegistry::new();
        registry.register(EnumTransformer, ENUM_PRIORITY);
        registry.register(DateTimeTransformer::default(), DATETIME_PRIORITY);
        assert_eq!(registry.names(), vec!["datetime", "enum"]);
        assert!(registry
            .transform(&property(), &FieldValue::Int(1), &Context::new())
            .is_none());
    }
}
