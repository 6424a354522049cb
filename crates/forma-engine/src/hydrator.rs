//! # Hydrator
//!
//! Turns mapped input into typed field values and constructs the record.
//!
//! ## Per property, in declaration order
//!
//! | Mapped value | Outcome |
//! |--------------|---------|
//! | non-null | cast (explicit caster, registry, nested record, list, untyped) |
//! | `null`, nullable type | `Null` |
//! | `null` or absent, has default | the default, cast like input |
//! | absent, nullable type | `Null` |
//! | otherwise | missing |
//!
//! Every missing field is collected first and reported in one
//! [`HydrationError::MissingRequired`]. Then validation runs over all
//! properties and every violation is reported in one [`ValidationError`].
//! Cast errors stop hydration immediately.
//!
//! Nested records are hydrated recursively. Their own missing fields and
//! cast errors fail the parent; their rule violations only count when the
//! parent field carries a `valid` rule. Errors gain the field name (and
//! list index) as they bubble up, so `items.1.sku` names the exact leaf.

use std::collections::HashMap;

use serde_json::{Map, Value};

use forma_core::meta::TypeTag;
use forma_core::{
    Arguments, CastError, ClassMeta, Context, Error, FieldMap, FieldPath, FieldValue,
    HydrationError, PropertyMeta, Record, RecordRef, RecordValue, Result, RuleKind,
    ValidationError, ValidationRule, Violation, Violations,
};

use crate::caster::CasterRegistry;
use crate::config::EngineConfig;
use crate::factory::MetaFactory;
use crate::mapper::Mapper;
use crate::validator::{ValidationContext, ValidatorRegistry};

/// Cast values of one record plus the violations found in it.
#[derive(Debug, Clone, Default)]
pub struct Hydrated {
    /// Values in constructor-parameter order.
    pub values: FieldMap,
    /// Violations relative to this record.
    pub violations: Violations,
}

enum Resolved {
    Value(FieldValue, Violations),
    Missing,
}

/// Casts, validates and constructs records.
#[derive(Debug, Clone, Copy)]
pub struct Hydrator<'e> {
    factory: &'e MetaFactory,
    casters: &'e CasterRegistry,
    validators: &'e ValidatorRegistry,
    config: &'e EngineConfig,
}

impl<'e> Hydrator<'e> {
    pub fn new(
        factory: &'e MetaFactory,
        casters: &'e CasterRegistry,
        validators: &'e ValidatorRegistry,
        config: &'e EngineConfig,
    ) -> Self {
        Self {
            factory,
            casters,
            validators,
            config,
        }
    }

    /// Hydrate and construct a `T` from its mapped input.
    ///
    /// # Errors
    ///
    /// - [`HydrationError::MissingRequired`] naming every missing field;
    /// - [`Error::Cast`] for the first value no caster can convert;
    /// - [`ValidationError`] carrying every rule violation;
    /// - whatever `T::construct` returns.
    pub fn hydrate<T: Record>(
        &self,
        meta: &ClassMeta,
        mapped: &Map<String, Value>,
        context: &Context,
    ) -> Result<T> {
        let hydrated = self.hydrate_fields(meta, mapped, context, 0)?;
        if !hydrated.violations.is_empty() {
            return Err(ValidationError {
                violations: hydrated.violations,
            }
            .into());
        }
        T::construct(&mut Arguments::new(meta.type_name.clone(), hydrated.values))
    }

    /// Cast every property of `meta` and collect violations without
    /// constructing anything.
    ///
    /// # Errors
    ///
    /// As [`Hydrator::hydrate`], except that violations are returned in
    /// [`Hydrated`] instead of raised.
    pub fn hydrate_fields(
        &self,
        meta: &ClassMeta,
        mapped: &Map<String, Value>,
        context: &Context,
        depth: usize,
    ) -> Result<Hydrated> {
        if depth > self.config.max_depth {
            return Err(HydrationError::DepthExceeded {
                path: FieldPath::root(),
                limit: self.config.max_depth,
            }
            .into());
        }

        let mut cast = FieldMap::new();
        let mut nested = HashMap::new();
        let mut missing = Violations::new();
        for property in meta.properties() {
            match self.resolve(property, mapped.get(&property.name), context, depth)? {
                Resolved::Value(value, inner) => {
                    if !inner.is_empty() {
                        nested.insert(property.name.clone(), inner);
                    }
                    cast.insert(property.name.clone(), value);
                }
                Resolved::Missing => missing.push(missing_violation(property)),
            }
        }
        if !missing.is_empty() {
            return Err(HydrationError::MissingRequired { violations: missing }.into());
        }

        let violations = self.validate(meta.properties(), &cast, mapped, &nested, context);
        let mut values = FieldMap::new();
        for param in &meta.constructor_params {
            if let Some(value) = cast.take(param) {
                values.insert(param.clone(), value);
            }
        }
        Ok(Hydrated { values, violations })
    }

    /// Cast and validate only the fields named in `updates`.
    ///
    /// Keys must be declared field names. `current` holds the record's
    /// existing plain values keyed by field name; the updates are laid
    /// over it so sibling conditions see the state the write would leave.
    /// Untouched properties whose `required_if` reads an updated field are
    /// re-checked against their current value. Only updated fields are
    /// returned.
    ///
    /// # Errors
    ///
    /// [`HydrationError::UnknownField`] for undeclared keys, otherwise as
    /// [`Hydrator::hydrate`].
    pub fn hydrate_partial(
        &self,
        meta: &ClassMeta,
        updates: &Map<String, Value>,
        current: &Map<String, Value>,
        context: &Context,
    ) -> Result<FieldMap> {
        let mut cast = FieldMap::new();
        let mut nested = HashMap::new();
        let mut missing = Violations::new();
        let mut touched = Vec::new();
        for (name, raw) in updates {
            let property = meta.property(name).ok_or_else(|| HydrationError::UnknownField {
                record: meta.type_name.clone(),
                field: name.clone(),
            })?;
            touched.push(property);
            match self.resolve(property, Some(raw), context, 0)? {
                Resolved::Value(value, inner) => {
                    if !inner.is_empty() {
                        nested.insert(name.clone(), inner);
                    }
                    cast.insert(name.clone(), value);
                }
                Resolved::Missing => missing.push(missing_violation(property)),
            }
        }
        if !missing.is_empty() {
            return Err(HydrationError::MissingRequired { violations: missing }.into());
        }

        let mut input = current.clone();
        input.extend(updates.iter().map(|(k, v)| (k.clone(), v.clone())));

        let dependents = conditional_dependents(meta, updates);
        let mut checked = cast.clone();
        for property in &dependents {
            let value = current.get(&property.name).cloned().unwrap_or(Value::Null);
            checked.insert(property.name.clone(), FieldValue::from_json(value));
        }

        let violations = self.validate(
            touched.into_iter().chain(dependents.iter()),
            &checked,
            &input,
            &nested,
            context,
        );
        if !violations.is_empty() {
            return Err(ValidationError { violations }.into());
        }
        Ok(cast)
    }

    fn validate<'p>(
        &self,
        properties: impl Iterator<Item = &'p PropertyMeta>,
        cast: &FieldMap,
        input: &Map<String, Value>,
        nested: &HashMap<String, Violations>,
        context: &Context,
    ) -> Violations {
        let vctx = ValidationContext {
            input,
            nested,
            context,
            empty_string_is_missing: self.config.empty_string_is_missing,
        };
        let mut violations = Violations::new();
        for property in properties {
            self.validators
                .validate(property, cast.get(&property.name), &vctx, &mut violations);
        }
        violations
    }

    fn resolve(
        &self,
        property: &PropertyMeta,
        raw: Option<&Value>,
        context: &Context,
        depth: usize,
    ) -> Result<Resolved> {
        let with_field = |e: Error| e.at(property.name.as_str());
        match raw {
            Some(value) if !value.is_null() => {
                let (value, inner) = self
                    .cast_value(property, value, context, depth)
                    .map_err(with_field)?;
                Ok(Resolved::Value(value, inner))
            }
            Some(_) if property.ty.is_nullable() => Ok(Resolved::Value(FieldValue::Null, Violations::new())),
            _ => match &property.default {
                Some(default) if default.is_null() => Ok(Resolved::Value(FieldValue::Null, Violations::new())),
                Some(default) => {
                    let (value, inner) = self
                        .cast_value(property, default, context, depth)
                        .map_err(with_field)?;
                    Ok(Resolved::Value(value, inner))
                }
                None if property.ty.is_nullable() => {
                    Ok(Resolved::Value(FieldValue::Null, Violations::new()))
                }
                None => Ok(Resolved::Missing),
            },
        }
    }

    /// Cast one non-null raw value. Errors and violations are relative to
    /// the property.
    fn cast_value(
        &self,
        property: &PropertyMeta,
        raw: &Value,
        context: &Context,
        depth: usize,
    ) -> Result<(FieldValue, Violations)> {
        if let Some(caster) = &property.caster {
            return Ok((caster.0.cast(property, raw, context)?, Violations::new()));
        }
        if let Some(caster) = self.casters.get(property, raw) {
            return Ok((caster.cast(property, raw, context)?, Violations::new()));
        }

        let ty = &property.ty;
        if let Some(record) = ty.record_ref() {
            let Value::Object(source) = raw else {
                return Err(CastError::invalid(raw, ty, "expected an object").into());
            };
            return self.hydrate_record(record, source, context, depth + 1);
        }
        if ty.is_array() {
            let Value::Array(items) = raw else {
                return Err(CastError::invalid(raw, ty, "expected an array").into());
            };
            return self.cast_items(property, items, context, depth);
        }
        match ty.tag() {
            TypeTag::Any => Ok((FieldValue::Json(raw.clone()), Violations::new())),
            TypeTag::Object if raw.is_object() => Ok((FieldValue::Json(raw.clone()), Violations::new())),
            _ => Err(CastError::unsupported(raw, ty).into()),
        }
    }

    fn cast_items(
        &self,
        property: &PropertyMeta,
        items: &[Value],
        context: &Context,
        depth: usize,
    ) -> Result<(FieldValue, Violations)> {
        let Some(element) = property.element() else {
            return Ok((FieldValue::from_json(Value::Array(items.to_vec())), Violations::new()));
        };
        let mut out = Vec::with_capacity(items.len());
        let mut violations = Violations::new();
        for (index, item) in items.iter().enumerate() {
            if item.is_null() {
                if element.ty.is_nullable() {
                    out.push(FieldValue::Null);
                    continue;
                }
                return Err(Error::from(CastError::invalid(item, &element.ty, "list item is null")).at(index));
            }
            let (value, inner) = self
                .cast_value(&element, item, context, depth)
                .map_err(|e| e.at(index))?;
            violations.extend(inner.prefixed(index));
            out.push(value);
        }
        Ok((FieldValue::List(out), violations))
    }

    fn hydrate_record(
        &self,
        record: &RecordRef,
        source: &Map<String, Value>,
        context: &Context,
        depth: usize,
    ) -> Result<(FieldValue, Violations)> {
        let meta = self.factory.create(record)?;
        let mapped = Mapper.map(source, &meta, context)?;
        let hydrated = self.hydrate_fields(&meta, &mapped, context, depth)?;
        Ok((
            FieldValue::Record(RecordValue {
                record: *record,
                fields: hydrated.values,
            }),
            hydrated.violations,
        ))
    }
}

/// Untouched properties with a `required_if` on an updated field, reduced
/// to those rules.
fn conditional_dependents(meta: &ClassMeta, updates: &Map<String, Value>) -> Vec<PropertyMeta> {
    let reads_update = |rule: &ValidationRule| {
        matches!(&rule.kind, RuleKind::RequiredIf { field, .. } if updates.contains_key(field))
    };
    meta.properties()
        .filter(|p| !updates.contains_key(&p.name) && p.rules.iter().any(reads_update))
        .map(|p| {
            let mut property = p.clone();
            property.rules.retain(reads_update);
            property
        })
        .collect()
}

fn missing_violation(property: &PropertyMeta) -> Violation {
    Violation::new(
        FieldPath::field(&property.name),
        "required",
        format!("{} is required", property.name),
    )
}
