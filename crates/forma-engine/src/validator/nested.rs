//! `valid`: surface the violations of nested records.

use forma_core::{RuleKind, ValidationRule, Violations};

use super::{Check, Validator};

pub const PRIORITY: i32 = 10;

/// Re-reports violations collected while hydrating a nested record (or,
/// with `each`, every record of a list) under the parent field's path.
///
/// The hydrator validates nested records as it builds them; this validator
/// only decides whether those violations count for the parent.
#[derive(Debug, Clone, Copy, Default)]
pub struct NestedValidator;

impl Validator for NestedValidator {
    fn name(&self) -> &str {
        "nested"
    }

    fn applies(&self, rule: &ValidationRule) -> bool {
        matches!(rule.kind, RuleKind::Valid { .. })
    }

    fn validate(&self, check: &Check<'_>, violations: &mut Violations) {
        let RuleKind::Valid { each } = check.rule.kind else {
            return;
        };
        if each != check.property.ty.is_array() {
            return;
        }
        if let Some(nested) = check.context.nested.get(&check.property.name) {
            violations.extend(nested.clone().prefixed(check.property.name.as_str()));
        }
    }
}
