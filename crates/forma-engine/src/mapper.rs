//! # Source-Key Mapping
//!
//! Picks, for every property, the input value that feeds it.
//!
//! Candidate keys are looked up in this order, stopping at the first
//! non-null value:
//!
//! 1. the literal field name;
//! 2. the primary key: `map_from` if declared, otherwise the naming
//!    strategy's `ToSource` conversion, otherwise the field name;
//! 3. the naming strategy's conversion, when a strategy is set.
//!
//! A property appears in the result when some candidate has a non-null
//! value, or when a candidate key is present with an explicit `null`.
//! Properties with no candidate key present are left out so the hydrator
//! can tell "absent" (defaults apply) from "set to null".
//!
//! Dotted keys (`profile.email`) are first tried literally, then walked
//! through nested objects. A missing or null intermediate is absent; any
//! other non-object intermediate is a [`MappingError`].

use serde_json::{Map, Value};

use forma_core::{ClassMeta, Context, Direction, FieldPath, MappingError, PropertyMeta};

/// Resolves input keys to properties.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mapper;

impl Mapper {
    /// Map `source` onto the properties of `meta`, keyed by field name in
    /// declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError`] when a dotted key runs into a scalar.
    pub fn map(
        &self,
        source: &Map<String, Value>,
        meta: &ClassMeta,
        context: &Context,
    ) -> Result<Map<String, Value>, MappingError> {
        let mut mapped = Map::new();
        for property in meta.properties() {
            if let Some(value) = self.extract(source, property, context)? {
                mapped.insert(property.name.clone(), value);
            }
        }
        Ok(mapped)
    }

    /// Candidate source keys for one property, in lookup order.
    pub fn candidate_keys(&self, property: &PropertyMeta, context: &Context) -> Vec<String> {
        let converted = context
            .naming()
            .map(|naming| naming.convert(&property.name, Direction::ToSource));
        let primary = property
            .map_from
            .clone()
            .or_else(|| converted.clone())
            .unwrap_or_else(|| property.name.clone());

        let mut keys = vec![property.name.clone()];
        for key in std::iter::once(primary).chain(converted) {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }

    fn extract(
        &self,
        source: &Map<String, Value>,
        property: &PropertyMeta,
        context: &Context,
    ) -> Result<Option<Value>, MappingError> {
        let mut present = false;
        for key in self.candidate_keys(property, context) {
            match lookup(source, &key, &property.name)? {
                Some(Value::Null) => present = true,
                Some(value) => return Ok(Some(value.clone())),
                None => {}
            }
        }
        Ok(present.then_some(Value::Null))
    }
}

fn lookup<'a>(
    source: &'a Map<String, Value>,
    key: &str,
    field: &str,
) -> Result<Option<&'a Value>, MappingError> {
    if let Some(value) = source.get(key) {
        return Ok(Some(value));
    }
    if !key.contains('.') {
        return Ok(None);
    }

    let mut current = source;
    let mut segments = key.split('.').peekable();
    while let Some(segment) = segments.next() {
        let value = match current.get(segment) {
            Some(value) => value,
            None => return Ok(None),
        };
        if segments.peek().is_none() {
            return Ok(Some(value));
        }
        match value {
            Value::Object(inner) => current = inner,
            Value::Null => return Ok(None),
            _ => {
                return Err(MappingError {
                    path: FieldPath::field(field),
                    key: key.to_string(),
                    segment: segment.to_string(),
                })
            }
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use forma_core::meta::{TypeDescriptor, TypeTag};
    use forma_core::{KebabCase, RecordRef, SnakeCase};
    use serde_json::json;

    #[derive(Clone)]
    struct Dummy;

    impl forma_core::Record for Dummy {
        fn declare() -> forma_core::ClassDecl {
            forma_core::ClassDecl::new("Dummy")
        }
        fn construct(_: &mut forma_core::Arguments) -> forma_core::Result<Self> {
            Ok(Dummy)
        }
        fn to_fields(&self) -> forma_core::FieldMap {
            forma_core::FieldMap::new()
        }
    }

    fn meta(properties: Vec<PropertyMeta>) -> ClassMeta {
        ClassMeta {
            type_name: "Dummy".into(),
            record: RecordRef::of::<Dummy>(),
            readonly: false,
            properties,
            constructor_params: Vec::new(),
            attributes: Default::default(),
        }
    }

    fn string(name: &str) -> PropertyMeta {
        PropertyMeta::new(name, TypeDescriptor::scalar(TypeTag::String).nullable())
    }

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn absent_is_omitted_and_null_is_kept() {
        let m = meta(vec![string("nick")]);
        let mapped = Mapper.map(&Map::new(), &m, &Context::new()).unwrap();
        assert!(!mapped.contains_key("nick"));
        let mapped = Mapper.map(&object(json!({"nick": null})), &m, &Context::new()).unwrap();
        assert_eq!(mapped.get("nick"), Some(&Value::Null));
    }

    #[test]
    fn map_from_beats_naming_strategy() {
        let mut email = string("email");
        email.map_from = Some("user_email".into());
        let m = meta(vec![email]);
        let source = object(json!({"user_email": "a@x.com", "email": null}));
        let ctx = Context::new().with_naming(SnakeCase);
        let mapped = Mapper.map(&source, &m, &ctx).unwrap();
        assert_eq!(mapped.get("email"), Some(&json!("a@x.com")));
    }

    #[test]
    fn literal_name_is_tried_first() {
        let m = meta(vec![string("firstName")]);
        let source = object(json!({"firstName": "lit", "first_name": "conv"}));
        let mapped = Mapper.map(&source, &m, &Context::new().with_naming(SnakeCase)).unwrap();
        assert_eq!(mapped.get("firstName"), Some(&json!("lit")));
    }

    #[test]
    fn strategy_key_is_the_fallback() {
        let m = meta(vec![string("firstName")]);
        let source = object(json!({"first-name": "Ann"}));
        let mapped = Mapper.map(&source, &m, &Context::new().with_naming(KebabCase)).unwrap();
        assert_eq!(mapped.get("firstName"), Some(&json!("Ann")));
    }

    #[test]
    fn dotted_map_from_walks_objects() {
        let mut email = string("email");
        email.map_from = Some("profile.contact.email".into());
        let m = meta(vec![email]);
        let source = object(json!({"profile": {"contact": {"email": "a@x.com"}}}));
        let mapped = Mapper.map(&source, &m, &Context::new()).unwrap();
        assert_eq!(mapped.get("email"), Some(&json!("a@x.com")));
    }

    #[test]
    fn dotted_map_from_through_scalar_fails() {
        let mut email = string("email");
        email.map_from = Some("profile.email".into());
        let m = meta(vec![email]);
        let source = object(json!({"profile": "none"}));
        let err = Mapper.map(&source, &m, &Context::new()).unwrap_err();
        assert_eq!(err.segment, "profile");
        assert_eq!(err.path.to_string(), "email");
    }

    #[test]
    fn candidate_keys_are_deduplicated() {
        let keys = Mapper.candidate_keys(&string("name"), &Context::new().with_naming(SnakeCase));
        assert_eq!(keys, vec!["name".to_string()]);
    }
}
