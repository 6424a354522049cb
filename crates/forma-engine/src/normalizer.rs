//! # Normalizer
//!
//! Turns a record's typed field values back into plain values, property by
//! property in declaration order:
//!
//! 1. hidden properties are skipped;
//! 2. an explicit transformer on the property handles any non-null value;
//! 3. otherwise the first supporting registry transformer does;
//! 4. otherwise nested records are normalized recursively into maps, lists
//!    element by element, and everything else passes through.
//!
//! Output keys are `map_to` if declared, else the naming strategy's
//! `ToSource` conversion, else the field name.

use serde_json::{Map, Value};

use forma_core::{
    ClassMeta, Context, Direction, Error, FieldMap, FieldPath, FieldValue, HydrationError,
    PropertyMeta, Result,
};

use crate::config::EngineConfig;
use crate::factory::MetaFactory;
use crate::transformer::TransformerRegistry;

/// Output key of a property.
pub fn output_key(property: &PropertyMeta, context: &Context) -> String {
    if let Some(key) = &property.map_to {
        return key.clone();
    }
    match context.naming() {
        Some(naming) => naming.convert(&property.name, Direction::ToSource),
        None => property.name.clone(),
    }
}

/// Typed values to plain values.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer<'e> {
    factory: &'e MetaFactory,
    transformers: &'e TransformerRegistry,
    config: &'e EngineConfig,
}

impl<'e> Normalizer<'e> {
    pub fn new(
        factory: &'e MetaFactory,
        transformers: &'e TransformerRegistry,
        config: &'e EngineConfig,
    ) -> Self {
        Self {
            factory,
            transformers,
            config,
        }
    }

    /// Normalize the fields of a record described by `meta`.
    ///
    /// Fields missing from `fields` are written as null.
    ///
    /// # Errors
    ///
    /// Transformer failures, metadata errors of nested records, and
    /// [`HydrationError::DepthExceeded`], each prefixed with the path of
    /// the failing field.
    pub fn normalize(&self, meta: &ClassMeta, fields: &FieldMap, context: &Context) -> Result<FieldMap> {
        self.normalize_fields(meta, fields, context, 0)
    }

    /// Plain values of every property, hidden ones included, keyed by field
    /// name. This is the shape the hydrator validates after mapping.
    ///
    /// # Errors
    ///
    /// As [`Normalizer::normalize`], plus [`HydrationError::Encode`] for
    /// values with no JSON form.
    pub fn plain_by_name(
        &self,
        meta: &ClassMeta,
        fields: &FieldMap,
        context: &Context,
    ) -> Result<Map<String, Value>> {
        let null = FieldValue::Null;
        let mut out = Map::new();
        for property in meta.properties() {
            let value = fields.get(&property.name).unwrap_or(&null);
            let plain = self
                .normalize_value(property, value, context, 0)
                .and_then(|v| v.to_json().map_err(Error::from))
                .map_err(|e| e.at(property.name.as_str()))?;
            out.insert(property.name.clone(), plain);
        }
        Ok(out)
    }

    fn normalize_fields(
        &self,
        meta: &ClassMeta,
        fields: &FieldMap,
        context: &Context,
        depth: usize,
    ) -> Result<FieldMap> {
        if depth > self.config.max_depth {
            return Err(HydrationError::DepthExceeded {
                path: FieldPath::root(),
                limit: self.config.max_depth,
            }
            .into());
        }
        let null = FieldValue::Null;
        let mut out = FieldMap::new();
        for property in meta.properties().filter(|p| !p.hidden) {
            let value = fields.get(&property.name).unwrap_or(&null);
            let normalized = self
                .normalize_value(property, value, context, depth)
                .map_err(|e| e.at(property.name.as_str()))?;
            out.insert(output_key(property, context), normalized);
        }
        Ok(out)
    }

    fn normalize_value(
        &self,
        property: &PropertyMeta,
        value: &FieldValue,
        context: &Context,
        depth: usize,
    ) -> Result<FieldValue> {
        if value.is_null() {
            return Ok(FieldValue::Null);
        }
        if let Some(transformer) = &property.transformer {
            return transformer.0.transform(property, value, context);
        }
        if let Some(result) = self.transformers.transform(property, value, context) {
            return result;
        }
        match value {
            FieldValue::Record(record) => {
                let meta = self.factory.create(&record.record)?;
                self.normalize_fields(&meta, &record.fields, context, depth + 1)
                    .map(FieldValue::Map)
            }
            FieldValue::List(items) => {
                let element = property.element().unwrap_or_else(|| property.clone());
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        self.normalize_value(&element, item, context, depth)
                            .map_err(|e| e.at(i))
                    })
                    .collect::<Result<Vec<_>>>()
                    .map(FieldValue::List)
            }
            other => Ok(other.clone()),
        }
    }
}
