//! Rule validation: aggregation, built-in rules, nested recursion and
//! custom validators.

mod common;

use common::{Order, Plain, User};
use forma_core::{
    Arguments, ClassDecl, Error, FieldDecl, FieldMap, Record, Result, RuleKind, TypeDecl,
    ValidationRule, Violations,
};
use forma_engine::{Check, Engine, Validator};
use serde_json::json;

#[derive(Debug, Clone, PartialEq)]
struct Signup {
    code: String,
    country: String,
    vat: Option<String>,
    website: Option<String>,
    age: i64,
    nickname: String,
    score: Option<i64>,
}

impl Record for Signup {
    fn declare() -> ClassDecl {
        ClassDecl::new("Signup")
            .field(FieldDecl::new("code", TypeDecl::String).rule(ValidationRule::pattern("^[A-Z]{3}$")))
            .field(FieldDecl::new("country", TypeDecl::String))
            .field(
                FieldDecl::new("vat", TypeDecl::optional(TypeDecl::String))
                    .rule(ValidationRule::required_if("country", "DE")),
            )
            .field(FieldDecl::new("website", TypeDecl::optional(TypeDecl::String)).rule(ValidationRule::url()))
            .field(
                FieldDecl::new("age", TypeDecl::Int)
                    .rule(ValidationRule::between(18.0, 99.0).with_message("{field} must be {min} to {max}")),
            )
            .field(
                FieldDecl::new("nickname", TypeDecl::String)
                    .default("")
                    .rule(ValidationRule::required()),
            )
            .field(
                FieldDecl::new("score", TypeDecl::optional(TypeDecl::Int))
                    .rule(ValidationRule::custom("even", json!(null))),
            )
    }

    fn construct(args: &mut Arguments) -> Result<Self> {
        Ok(Self {
            code: args.take("code")?,
            country: args.take("country")?,
            vat: args.take("vat")?,
            website: args.take("website")?,
            age: args.take("age")?,
            nickname: args.take("nickname")?,
            score: args.take("score")?,
        })
    }

    fn to_fields(&self) -> FieldMap {
        FieldMap::new()
            .with("code", &self.code)
            .with("country", &self.country)
            .with("vat", self.vat.clone())
            .with("website", self.website.clone())
            .with("age", self.age)
            .with("nickname", &self.nickname)
            .with("score", self.score)
    }
}

fn valid_signup() -> serde_json::Value {
    json!({
        "code": "ABC",
        "country": "PT",
        "website": "https://example.com/about",
        "age": 30,
        "nickname": "ace"
    })
}

fn violation_rules(err: &Error) -> Vec<(String, String)> {
    let violations = err.violations().expect("error carries violations");
    violations
        .iter()
        .map(|v| (v.path.to_string(), v.rule.clone()))
        .collect()
}

#[derive(Debug)]
struct EvenValidator;

impl Validator for EvenValidator {
    fn name(&self) -> &str {
        "even"
    }

    fn applies(&self, rule: &ValidationRule) -> bool {
        matches!(&rule.kind, RuleKind::Custom { name, .. } if name == "even")
    }

    fn validate(&self, check: &Check<'_>, violations: &mut Violations) {
        if let Some(n) = check.present_value().and_then(|v| v.as_i64()) {
            if n % 2 != 0 {
                violations.push(check.violation("{field} must be even", &[]));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Built-in rules
// ---------------------------------------------------------------------------

#[test]
fn valid_input_passes_every_rule() {
    let engine = Engine::new();
    let signup: Signup = engine.hydrate(valid_signup()).unwrap();
    assert_eq!(signup.code, "ABC");
}

#[test]
fn violations_are_aggregated_into_one_error() {
    let engine = Engine::new();
    let err = engine
        .hydrate::<Signup>(json!({
            "code": "abc",
            "country": "DE",
            "website": "not a url",
            "age": 12,
            "nickname": ""
        }))
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(
        violation_rules(&err),
        vec![
            ("code".to_string(), "pattern".to_string()),
            ("vat".to_string(), "required_if".to_string()),
            ("website".to_string(), "url".to_string()),
            ("age".to_string(), "between".to_string()),
            ("nickname".to_string(), "required".to_string()),
        ]
    );
}

#[test]
fn custom_message_templates_are_rendered() {
    let engine = Engine::new();
    let mut input = valid_signup();
    input["age"] = json!(120);
    let err = engine.hydrate::<Signup>(input).unwrap_err();
    let violations = err.violations().unwrap();
    let message = &violations.iter().next().unwrap().message;
    assert_eq!(message, "age must be 18 to 99");
}

#[test]
fn required_if_is_silent_when_condition_does_not_hold() {
    let engine = Engine::new();
    let signup: Signup = engine.hydrate(valid_signup()).unwrap();
    assert_eq!(signup.vat, None);
}

#[test]
fn required_if_accepts_a_present_value() {
    let engine = Engine::new();
    let mut input = valid_signup();
    input["country"] = json!("DE");
    input["vat"] = json!("DE123");
    let signup: Signup = engine.hydrate(input).unwrap();
    assert_eq!(signup.vat.as_deref(), Some("DE123"));
}

#[test]
fn unhandled_custom_rule_is_skipped() {
    let engine = Engine::new();
    let mut input = valid_signup();
    input["score"] = json!(3);
    let signup: Signup = engine.hydrate(input).unwrap();
    assert_eq!(signup.score, Some(3));
}

#[test]
fn custom_validator_handles_its_rule() {
    let engine = Engine::builder().validator(EvenValidator, 20).build();
    let mut input = valid_signup();
    input["score"] = json!(3);
    let err = engine.hydrate::<Signup>(input).unwrap_err();
    assert_eq!(
        violation_rules(&err),
        vec![("score".to_string(), "even".to_string())]
    );
}

// ---------------------------------------------------------------------------
// Nested recursion
// ---------------------------------------------------------------------------

#[test]
fn list_item_violation_is_prefixed_with_index() {
    let engine = Engine::new();
    let err = engine
        .hydrate::<Order>(json!({
            "number": "o-1",
            "items": [
                {"sku": "ABC", "quantity": 1},
                {"sku": "AB", "quantity": 1}
            ]
        }))
        .unwrap_err();
    assert_eq!(
        violation_rules(&err),
        vec![("items.1.sku".to_string(), "length".to_string())]
    );
}

#[test]
fn every_failing_item_is_reported() {
    let engine = Engine::new();
    let err = engine
        .hydrate::<Order>(json!({
            "number": "o-1",
            "items": [
                {"sku": "A", "quantity": 1},
                {"sku": "ABC", "quantity": 0}
            ]
        }))
        .unwrap_err();
    assert_eq!(
        err.violations().unwrap().paths(),
        vec!["items.0.sku".to_string(), "items.1.quantity".to_string()]
    );
}

#[test]
fn nested_record_with_valid_rule_is_checked() {
    let engine = Engine::new();
    let mut input = common::user_json();
    input["address"]["street"] = json!("St");
    let err = engine.hydrate::<User>(input).unwrap_err();
    assert_eq!(err.violations().unwrap().paths(), vec!["address.street".to_string()]);
}

#[test]
fn nested_record_without_valid_rule_is_not_checked() {
    let engine = Engine::new();
    let plain: Plain = engine
        .hydrate(json!({
            "label": "x",
            "count": 1,
            "ratio": 0.5,
            "enabled": true,
            "tags": [],
            "home": {"street": "St", "city": "Porto"}
        }))
        .unwrap();
    assert_eq!(plain.home.street, "St");
}

#[test]
fn parent_and_nested_violations_are_reported_together() {
    let engine = Engine::new();
    let mut input = common::user_json();
    input["address"]["street"] = json!("St");
    input["first_name"] = json!("A");
    let err = engine.hydrate::<User>(input).unwrap_err();
    assert_eq!(
        err.violations().unwrap().paths(),
        vec!["first_name".to_string(), "address.street".to_string()]
    );
}

#[test]
fn email_rule_rejects_malformed_addresses() {
    let engine = Engine::new();
    let mut input = common::user_json();
    input["email"] = json!("ann.example.com");
    let err = engine.hydrate::<User>(input).unwrap_err();
    assert_eq!(
        violation_rules(&err),
        vec![("email".to_string(), "email".to_string())]
    );
}
