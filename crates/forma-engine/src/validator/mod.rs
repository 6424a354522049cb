//! # Validators
//!
//! Validation runs after every property of a record has been cast, so
//! validators see typed values. Unlike casting, every validator that
//! applies to a rule runs; nothing short-circuits. Violations from all
//! properties are collected and the hydrator raises one
//! [`ValidationError`](forma_core::ValidationError) per call.
//!
//! | Validator | Priority | Rules |
//! |-----------|----------|-------|
//! | [`RequiredValidator`] | 100 | `required` |
//! | [`RequiredIfValidator`] | 90 | `required_if` |
//! | [`BoundsValidator`] | 50 | `min`, `max`, `between` |
//! | [`LengthValidator`] | 50 | `length` |
//! | [`PatternValidator`] | 40 | `pattern` |
//! | [`FormatValidator`] | 40 | `url`, `email` |
//! | [`NestedValidator`] | 10 | `valid` |
//!
//! Only the presence validators look at absent or null values; every
//! other built-in skips them.

mod nested;
mod presence;
mod range;
mod text;

pub use nested::{NestedValidator, PRIORITY as NESTED_PRIORITY};
pub use presence::{
    RequiredIfValidator, RequiredValidator, REQUIRED_IF_PRIORITY, REQUIRED_PRIORITY,
};
pub use range::{BoundsValidator, LengthValidator, PRIORITY as RANGE_PRIORITY};
pub use text::{FormatValidator, PatternValidator, PRIORITY as TEXT_PRIORITY};

use std::collections::HashMap;
use std::fmt;

use serde_json::{Map, Value};

use forma_core::{
    Context, FieldPath, FieldValue, PropertyMeta, ValidationRule, Violation, Violations,
};

use crate::priority::PriorityList;

/// Checks one kind of rule.
pub trait Validator: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Whether this validator handles `rule`.
    fn applies(&self, rule: &ValidationRule) -> bool;

    /// Append any violations of `check.rule` to `violations`.
    fn validate(&self, check: &Check<'_>, violations: &mut Violations);
}

/// Record-wide state shared by every check.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    /// Mapped input of the record, keyed by field name.
    pub input: &'a Map<String, Value>,
    /// Violations of nested records, keyed by field name, relative to the
    /// field.
    pub nested: &'a HashMap<String, Violations>,
    pub context: &'a Context,
    pub empty_string_is_missing: bool,
}

/// One rule applied to one property's value.
#[derive(Debug, Clone, Copy)]
pub struct Check<'a> {
    pub rule: &'a ValidationRule,
    pub property: &'a PropertyMeta,
    /// `None` when the field was absent from the input.
    pub value: Option<&'a FieldValue>,
    pub context: &'a ValidationContext<'a>,
}

impl Check<'_> {
    /// The value, unless absent or null.
    pub fn present_value(&self) -> Option<&FieldValue> {
        self.value.filter(|v| !v.is_null())
    }

    /// Whether the value counts as missing for presence rules.
    pub fn is_missing(&self) -> bool {
        match self.present_value() {
            None => true,
            Some(FieldValue::String(s)) => self.context.empty_string_is_missing && s.is_empty(),
            Some(FieldValue::List(items)) => items.is_empty(),
            Some(_) => false,
        }
    }

    /// Build a violation for this property, rendering the rule's message
    /// template (or `default` when the rule has none).
    pub fn violation(&self, default: &str, params: &[(&str, String)]) -> Violation {
        let template = self.rule.message.as_deref().unwrap_or(default);
        let mut message = template.replace("{field}", &self.property.name);
        for (key, value) in params {
            message = message.replace(&format!("{{{key}}}"), value);
        }
        Violation::new(FieldPath::field(&self.property.name), self.rule.id(), message)
    }
}

/// Priority-ordered validators.
#[derive(Debug, Default)]
pub struct ValidatorRegistry {
    validators: PriorityList<dyn Validator>,
}

impl ValidatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, validator: impl Validator + 'static, priority: i32) {
        self.register_boxed(Box::new(validator), priority);
    }

    pub fn register_boxed(&mut self, validator: Box<dyn Validator>, priority: i32) {
        tracing::debug!(validator = validator.name(), priority, "registered validator");
        self.validators.insert(validator, priority);
    }

    /// Run every applicable validator over one property.
    pub fn validate(
        &self,
        property: &PropertyMeta,
        value: Option<&FieldValue>,
        context: &ValidationContext<'_>,
        violations: &mut Violations,
    ) {
        for rule in &property.rules {
            if !self.validators.iter().any(|v| v.applies(rule)) {
                tracing::warn!(
                    field = %property.name,
                    rule = rule.id(),
                    "no registered validator handles rule, skipping"
                );
            }
        }
        for validator in self.validators.iter() {
            for rule in property.rules.iter().filter(|r| validator.applies(r)) {
                let check = Check {
                    rule,
                    property,
                    value,
                    context,
                };
                validator.validate(&check, violations);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Validator names in run order.
    pub fn names(&self) -> Vec<String> {
        self.validators.iter().map(|v| v.name().to_string()).collect()
    }
}
