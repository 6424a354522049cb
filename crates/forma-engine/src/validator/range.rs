//! Numeric bounds and length limits. Bounds are inclusive.

use forma_core::{FieldValue, RuleKind, ValidationRule, Violations};
use serde_json::Value;

use super::{Check, Validator};

pub const PRIORITY: i32 = 50;

/// `min`, `max` and `between` on numeric values.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoundsValidator;

impl Validator for BoundsValidator {
    fn name(&self) -> &str {
        "bounds"
    }

    fn applies(&self, rule: &ValidationRule) -> bool {
        matches!(
            rule.kind,
            RuleKind::Min(_) | RuleKind::Max(_) | RuleKind::Between { .. }
        )
    }

    fn validate(&self, check: &Check<'_>, violations: &mut Violations) {
        let Some(n) = check.present_value().and_then(FieldValue::as_f64) else {
            return;
        };
        let (min, max) = match check.rule.kind {
            RuleKind::Min(min) => (Some(min), None),
            RuleKind::Max(max) => (None, Some(max)),
            RuleKind::Between { min, max } => (Some(min), Some(max)),
            _ => return,
        };
        let params = [
            ("min", min.map(|m| m.to_string()).unwrap_or_default()),
            ("max", max.map(|m| m.to_string()).unwrap_or_default()),
            ("value", n.to_string()),
        ];
        let message = match (min, max) {
            (Some(min), Some(max)) if n < min || n > max => "{field} must be between {min} and {max}",
            (Some(min), None) if n < min => "{field} must be at least {min}",
            (None, Some(max)) if n > max => "{field} must be at most {max}",
            _ => return,
        };
        violations.push(check.violation(message, &params));
    }
}

/// Character count of strings, item count of lists.
#[derive(Debug, Clone, Copy, Default)]
pub struct LengthValidator;

impl Validator for LengthValidator {
    fn name(&self) -> &str {
        "length"
    }

    fn applies(&self, rule: &ValidationRule) -> bool {
        matches!(rule.kind, RuleKind::Length { .. })
    }

    fn validate(&self, check: &Check<'_>, violations: &mut Violations) {
        let RuleKind::Length { min, max } = check.rule.kind else {
            return;
        };
        let len = match check.present_value() {
            Some(FieldValue::String(s)) | Some(FieldValue::Json(Value::String(s))) => {
                s.chars().count()
            }
            Some(FieldValue::List(items)) => items.len(),
            Some(FieldValue::Json(Value::Array(items))) => items.len(),
            _ => return,
        };
        let params = [
            ("min", min.map(|m| m.to_string()).unwrap_or_default()),
            ("max", max.map(|m| m.to_string()).unwrap_or_default()),
            ("value", len.to_string()),
        ];
        if min.is_some_and(|min| len < min) {
            violations.push(check.violation("{field} must have at least {min} characters or items", &params));
        }
        if max.is_some_and(|max| len > max) {
            violations.push(check.violation("{field} must have at most {max} characters or items", &params));
        }
    }
}
