//! `required` and `required_if`.

use forma_core::{RuleKind, ValidationRule, Violations};

use super::{Check, Validator};

pub const REQUIRED_PRIORITY: i32 = 100;
pub const REQUIRED_IF_PRIORITY: i32 = 90;

/// Value must be present and non-null. Empty lists are missing, and so are
/// empty strings unless `empty_string_is_missing` is off.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequiredValidator;

impl Validator for RequiredValidator {
    fn name(&self) -> &str {
        "required"
    }

    fn applies(&self, rule: &ValidationRule) -> bool {
        matches!(rule.kind, RuleKind::Required)
    }

    fn validate(&self, check: &Check<'_>, violations: &mut Violations) {
        if check.is_missing() {
            violations.push(check.violation("{field} is required", &[]));
        }
    }
}

/// Required only when a sibling's mapped input equals a given value.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequiredIfValidator;

impl Validator for RequiredIfValidator {
    fn name(&self) -> &str {
        "required_if"
    }

    fn applies(&self, rule: &ValidationRule) -> bool {
        matches!(rule.kind, RuleKind::RequiredIf { .. })
    }

    fn validate(&self, check: &Check<'_>, violations: &mut Violations) {
        let RuleKind::RequiredIf { field, equals } = &check.rule.kind else {
            return;
        };
        if check.context.input.get(field) != Some(equals) || !check.is_missing() {
            return;
        }
        violations.push(check.violation(
            "{field} is required when {other} is {value}",
            &[("other", field.clone()), ("value", equals.to_string())],
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::run;
    use super::*;
    use forma_core::meta::TypeTag;
    use forma_core::FieldValue;
    use serde_json::{json, Map, Value};

    fn input(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn required_rejects_absent_null_and_empty() {
        for value in [None, Some(FieldValue::Null), Some(FieldValue::String(String::new()))] {
            let violations = run(
                &RequiredValidator,
                ValidationRule::required(),
                TypeTag::String,
                value,
                Map::new(),
            );
            assert_eq!(violations.len(), 1);
        }
        let ok = run(
            &RequiredValidator,
            ValidationRule::required(),
            TypeTag::String,
            Some(FieldValue::String("x".into())),
            Map::new(),
        );
        assert!(ok.is_empty());
    }

    #[test]
    fn required_if_only_fires_on_match() {
        let rule = ValidationRule::required_if("country", "DE");
        let fired = run(
            &RequiredIfValidator,
            rule.clone(),
            TypeTag::String,
            None,
            input(json!({"country": "DE"})),
        );
        assert_eq!(fired.len(), 1);
        assert_eq!(
            fired.violations()[0].message,
            "field is required when country is \"DE\""
        );

        let quiet = run(
            &RequiredIfValidator,
            rule,
            TypeTag::String,
            None,
            input(json!({"country": "FR"})),
        );
        assert!(quiet.is_empty());
    }
}
