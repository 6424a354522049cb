//! # Casters
//!
//! The [`CasterRegistry`] holds casters in descending priority order and
//! hands each (property, value) pair to the first one that supports it.
//! Built-ins:
//!
//! | Caster | Priority | Handles |
//! |--------|----------|---------|
//! | [`ScalarCaster`] | 30 | string, int, float, bool |
//! | [`EnumCaster`] | 20 | backed enums, by backing value |
//! | [`DateTimeCaster`] | 10 | RFC 3339, configured formats, Unix seconds |
//!
//! Records, lists and untyped values are not casters: the hydrator
//! handles them structurally when no registered caster claims the value.

mod datetime;
mod enumeration;
mod scalar;

pub use datetime::{DateTimeCaster, PRIORITY as DATETIME_PRIORITY};
pub use enumeration::{EnumCaster, PRIORITY as ENUM_PRIORITY};
pub use scalar::{ScalarCaster, PRIORITY as SCALAR_PRIORITY};

use serde_json::Value;

use forma_core::{CastError, Caster, Context, FieldValue, PropertyMeta};

use crate::priority::PriorityList;

/// Priority-ordered casters.
#[derive(Debug, Default)]
pub struct CasterRegistry {
    casters: PriorityList<dyn Caster>,
}

impl CasterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, caster: impl Caster + 'static, priority: i32) {
        self.register_boxed(Box::new(caster), priority);
    }

    pub fn register_boxed(&mut self, caster: Box<dyn Caster>, priority: i32) {
        tracing::debug!(caster = caster.name(), priority, "registered caster");
        self.casters.insert(caster, priority);
    }

    /// First caster, by priority, that supports the pair.
    pub fn get(&self, property: &PropertyMeta, value: &Value) -> Option<&dyn Caster> {
        self.casters.iter().find(|c| c.supports(property, value))
    }

    /// # Errors
    ///
    /// [`CastError::Unsupported`] when no caster claims the pair, otherwise
    /// whatever the selected caster returns.
    pub fn cast(
        &self,
        property: &PropertyMeta,
        value: &Value,
        context: &Context,
    ) -> Result<FieldValue, CastError> {
        match self.get(property, value) {
            Some(caster) => caster.cast(property, value, context),
            None => Err(CastError::unsupported(value, &property.ty)),
        }
    }

    pub fn len(&self) -> usize {
        self.casters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.casters.is_empty()
    }

    /// Caster names in lookup order.
    pub fn names(&self) -> Vec<String> {
        self.casters.iter().map(|c| c.name().to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forma_core::meta::{TypeDescriptor, TypeTag};
    use serde_json::json;

    #[derive(Debug)]
    struct Upper;

    impl Caster for Upper {
        fn name(&self) -> &str {
            "upper"
        }
        fn supports(&self, property: &PropertyMeta, value: &Value) -> bool {
            property.ty.tag() == TypeTag::String && value.is_string()
        }
        fn cast(&self, _: &PropertyMeta, value: &Value, _: &Context) -> Result<FieldValue, CastError> {
            Ok(FieldValue::String(value.as_str().unwrap_or_default().to_uppercase()))
        }
    }

    #[test]
    fn higher_priority_wins_even_when_both_support() {
        let mut registry = CasterRegistry::new();
        registry.register(ScalarCaster::new(false), 10);
        registry.register(Upper, 100);
        let property = PropertyMeta::new("name", TypeDescriptor::scalar(TypeTag::String));
        let cast = registry.cast(&property, &json!("ann"), &Context::new()).unwrap();
        assert_eq!(cast, FieldValue::String("ANN".into()));
        assert_eq!(registry.names(), vec!["upper", "scalar"]);
    }

    #[test]
    fn unclaimed_value_is_unsupported() {
        let registry = CasterRegistry::new();
        let property = PropertyMeta::new("age", TypeDescriptor::scalar(TypeTag::Int));
        let err = registry.cast(&property, &json!("x"), &Context::new()).unwrap_err();
        assert!(matches!(err, CastError::Unsupported { .. }));
        assert!(err.to_string().contains("int"));
    }
}
