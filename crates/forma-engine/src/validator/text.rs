//! Regular-expression and format checks on strings.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use regex::Regex;
use url::Url;

use forma_core::{FieldValue, RuleKind, ValidationRule, Violations};

use super::{Check, Validator};

pub const PRIORITY: i32 = 40;

const EMAIL_PATTERN: &str = r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$";

/// Compiled patterns, shared across calls.
#[derive(Debug, Default)]
struct RegexCache {
    compiled: RwLock<HashMap<String, Arc<Regex>>>,
}

impl RegexCache {
    /// `None` when the pattern does not compile.
    fn get(&self, pattern: &str) -> Option<Arc<Regex>> {
        if let Some(regex) = self.compiled.read().get(pattern) {
            return Some(Arc::clone(regex));
        }
        let regex = Arc::new(Regex::new(pattern).ok()?);
        self.compiled
            .write()
            .insert(pattern.to_string(), Arc::clone(&regex));
        Some(regex)
    }
}

/// `pattern`: the string must contain a match. Anchor the pattern to
/// require a full match.
#[derive(Debug, Default)]
pub struct PatternValidator {
    cache: RegexCache,
}

impl PatternValidator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Validator for PatternValidator {
    fn name(&self) -> &str {
        "pattern"
    }

    fn applies(&self, rule: &ValidationRule) -> bool {
        matches!(rule.kind, RuleKind::Pattern(_))
    }

    fn validate(&self, check: &Check<'_>, violations: &mut Violations) {
        let RuleKind::Pattern(pattern) = &check.rule.kind else {
            return;
        };
        let Some(text) = check.present_value().and_then(FieldValue::as_str) else {
            return;
        };
        let matched = match self.cache.get(pattern) {
            Some(regex) => regex.is_match(text),
            None => {
                tracing::warn!(field = %check.property.name, pattern = %pattern, "pattern does not compile");
                false
            }
        };
        if !matched {
            violations.push(check.violation(
                "{field} does not match {pattern}",
                &[("pattern", pattern.clone())],
            ));
        }
    }
}

/// `email` and `url`.
///
/// A URL must parse and carry a host, so `mailto:` and bare paths fail.
#[derive(Debug, Default)]
pub struct FormatValidator {
    cache: RegexCache,
}

impl FormatValidator {
    pub fn new() -> Self {
        Self::default()
    }

    fn is_email(&self, text: &str) -> bool {
        self.cache
            .get(EMAIL_PATTERN)
            .is_some_and(|regex| regex.is_match(text))
    }
}

fn is_url(text: &str) -> bool {
    Url::parse(text).is_ok_and(|url| url.has_host())
}

impl Validator for FormatValidator {
    fn name(&self) -> &str {
        "format"
    }

    fn applies(&self, rule: &ValidationRule) -> bool {
        matches!(rule.kind, RuleKind::Url | RuleKind::Email)
    }

    fn validate(&self, check: &Check<'_>, violations: &mut Violations) {
        let Some(text) = check.present_value().and_then(FieldValue::as_str) else {
            return;
        };
        let (ok, message) = match check.rule.kind {
            RuleKind::Email => (self.is_email(text), "{field} must be a valid email address"),
            RuleKind::Url => (is_url(text), "{field} must be a valid URL"),
            _ => return,
        };
        if !ok {
            violations.push(check.violation(message, &[("value", text.to_string())]));
        }
    }
}
