//! # Schema Export
//!
//! Derives a structural schema from record metadata. The schema describes
//! the engine's normalized output, which is also valid hydration input
//! when no naming strategy or `map_from` rename is in play:
//!
//! - one property per visible (non-hidden) field, under its output key;
//! - `required` lists fields that are neither nullable nor defaulted, plus
//!   fields carrying a `required` rule;
//! - nullable types accept `null`;
//! - enums list their backing values;
//! - date/time fields are strings with `format: date-time`;
//! - nested records become references into `$defs` (JSON Schema) or
//!   `components/schemas` (OpenAPI 3.1);
//! - `min`/`max`/`between`, `length`, `pattern`, `email` and `url` rules
//!   become the matching keywords;
//! - fields with a custom transformer are left unconstrained, since their
//!   output shape is not described by metadata.
//!
//! Every object schema sets `additionalProperties: false`.

use std::collections::HashSet;

use serde_json::{json, Map, Number, Value};

use forma_core::{
    ClassMeta, Context, PropertyMeta, Record, RecordRef, Result, RuleKind, TypeDescriptor, TypeTag,
};
use forma_engine::{output_key, Engine};

/// `$schema` of exported JSON Schema documents.
pub const JSON_SCHEMA_DIALECT: &str = "https://json-schema.org/draft/2020-12/schema";

/// Target document flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    JsonSchema,
    OpenApi,
}

impl Dialect {
    fn ref_prefix(self) -> &'static str {
        match self {
            Self::JsonSchema => "#/$defs/",
            Self::OpenApi => "#/components/schemas/",
        }
    }
}

/// Walks record metadata and collects one definition per record type.
#[derive(Debug)]
pub struct SchemaExporter<'e> {
    engine: &'e Engine,
    context: &'e Context,
    dialect: Dialect,
    root: Option<RecordRef>,
    visited: HashSet<RecordRef>,
    definitions: Map<String, Value>,
}

impl<'e> SchemaExporter<'e> {
    pub fn new(engine: &'e Engine, context: &'e Context, dialect: Dialect) -> Self {
        Self {
            engine,
            context,
            dialect,
            root: None,
            visited: HashSet::new(),
            definitions: Map::new(),
        }
    }

    /// Definitions collected so far, keyed by record name.
    pub fn definitions(&self) -> &Map<String, Value> {
        &self.definitions
    }

    pub fn into_definitions(self) -> Map<String, Value> {
        self.definitions
    }

    /// Add the definition of `record` and of every record it nests.
    ///
    /// # Errors
    ///
    /// Metadata errors of any visited record.
    pub fn define(&mut self, record: &RecordRef) -> Result<()> {
        if !self.visited.insert(*record) {
            return Ok(());
        }
        let meta = self.engine.metadata_for(record)?;
        let schema = self.object_schema(&meta)?;
        self.definitions.insert(record.name().to_string(), schema);
        Ok(())
    }

    /// Build `record` as the document root. References back to it use `#`.
    ///
    /// # Errors
    ///
    /// Metadata errors of any visited record.
    pub fn root_schema(&mut self, record: &RecordRef) -> Result<Value> {
        self.root = Some(*record);
        self.visited.insert(*record);
        let meta = self.engine.metadata_for(record)?;
        self.object_schema(&meta)
    }

    fn object_schema(&mut self, meta: &ClassMeta) -> Result<Value> {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for property in meta.properties().filter(|p| !p.hidden) {
            let key = output_key(property, self.context);
            if property.is_required() || property.has_rule("required") {
                required.push(Value::String(key.clone()));
            }
            properties.insert(key, self.property_schema(property)?);
        }

        let mut schema = Map::new();
        schema.insert("type".to_string(), json!("object"));
        schema.insert("title".to_string(), json!(meta.type_name));
        schema.insert("properties".to_string(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".to_string(), Value::Array(required));
        }
        schema.insert("additionalProperties".to_string(), Value::Bool(false));
        Ok(Value::Object(schema))
    }

    fn property_schema(&mut self, property: &PropertyMeta) -> Result<Value> {
        let mut schema = if property.transformer.is_some() {
            Map::new()
        } else {
            let mut schema = self.type_schema(&property.ty)?;
            apply_rules(&mut schema, property);
            schema
        };
        if let Some(default) = &property.default {
            schema.insert("default".to_string(), default.clone());
        }
        if let Some(Value::String(description)) = property.attributes.get("description") {
            schema.insert("description".to_string(), json!(description));
        }
        if property.readonly {
            schema.insert("readOnly".to_string(), Value::Bool(true));
        }
        Ok(Value::Object(schema))
    }

    fn type_schema(&mut self, ty: &TypeDescriptor) -> Result<Map<String, Value>> {
        let mut schema = Map::new();
        let json_type = match ty.tag() {
            TypeTag::Any => return Ok(schema),
            TypeTag::Record => {
                let Some(record) = ty.record_ref() else {
                    return Ok(schema);
                };
                let reference = json!({ "$ref": self.reference(record)? });
                if ty.is_nullable() {
                    schema.insert("anyOf".to_string(), json!([reference, { "type": "null" }]));
                } else if let Value::Object(reference) = reference {
                    schema = reference;
                }
                return Ok(schema);
            }
            TypeTag::Enum => {
                let mut values: Vec<Value> = ty
                    .enum_ref()
                    .map(|e| e.cases().into_iter().map(|case| case.value).collect())
                    .unwrap_or_default();
                if ty.is_nullable() {
                    values.push(Value::Null);
                }
                schema.insert("enum".to_string(), Value::Array(values));
                return Ok(schema);
            }
            TypeTag::Array => {
                if let Some(item) = ty.array_item_type() {
                    schema.insert("items".to_string(), Value::Object(self.type_schema(item)?));
                }
                "array"
            }
            TypeTag::DateTime => {
                schema.insert("format".to_string(), json!("date-time"));
                "string"
            }
            TypeTag::String => "string",
            TypeTag::Int => "integer",
            TypeTag::Float => "number",
            TypeTag::Bool => "boolean",
            TypeTag::Object => "object",
        };
        let type_value = if ty.is_nullable() {
            json!([json_type, "null"])
        } else {
            json!(json_type)
        };
        schema.insert("type".to_string(), type_value);
        Ok(schema)
    }

    fn reference(&mut self, record: &RecordRef) -> Result<String> {
        if self.dialect == Dialect::JsonSchema && self.root == Some(*record) {
            return Ok("#".to_string());
        }
        self.define(record)?;
        Ok(format!("{}{}", self.dialect.ref_prefix(), record.name()))
    }
}

fn apply_rules(schema: &mut Map<String, Value>, property: &PropertyMeta) {
    let ty = &property.ty;
    for rule in &property.rules {
        match &rule.kind {
            RuleKind::Min(min) => insert_number(schema, "minimum", *min),
            RuleKind::Max(max) => insert_number(schema, "maximum", *max),
            RuleKind::Between { min, max } => {
                insert_number(schema, "minimum", *min);
                insert_number(schema, "maximum", *max);
            }
            RuleKind::Length { min, max } => {
                let (lower, upper) = if ty.is_array() {
                    ("minItems", "maxItems")
                } else if ty.tag() == TypeTag::String {
                    ("minLength", "maxLength")
                } else {
                    continue;
                };
                if let Some(min) = min {
                    schema.insert(lower.to_string(), json!(min));
                }
                if let Some(max) = max {
                    schema.insert(upper.to_string(), json!(max));
                }
            }
            RuleKind::Pattern(pattern) => {
                schema.insert("pattern".to_string(), json!(pattern));
            }
            RuleKind::Email => {
                schema.insert("format".to_string(), json!("email"));
            }
            RuleKind::Url => {
                schema.insert("format".to_string(), json!("uri"));
            }
            _ => {}
        }
    }
}

/// Whole bounds are written as integers.
fn insert_number(schema: &mut Map<String, Value>, key: &str, n: f64) {
    let value = if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        match Number::from_f64(n) {
            Some(n) => Value::Number(n),
            None => return,
        }
    };
    schema.insert(key.to_string(), value);
}

/// JSON Schema 2020-12 document for `T`.
///
/// # Errors
///
/// Metadata errors of `T` or any record it nests.
pub fn json_schema<T: Record>(engine: &Engine, context: &Context) -> Result<Value> {
    json_schema_for(engine, &RecordRef::of::<T>(), context)
}

/// JSON Schema 2020-12 document for a record reference.
///
/// # Errors
///
/// As [`json_schema`].
pub fn json_schema_for(engine: &Engine, record: &RecordRef, context: &Context) -> Result<Value> {
    let mut exporter = SchemaExporter::new(engine, context, Dialect::JsonSchema);
    let root = exporter.root_schema(record)?;

    let mut document = Map::new();
    document.insert("$schema".to_string(), json!(JSON_SCHEMA_DIALECT));
    if let Value::Object(root) = root {
        document.extend(root);
    }
    let definitions = exporter.into_definitions();
    tracing::debug!(
        record = record.name(),
        definitions = definitions.len(),
        "exported JSON schema"
    );
    if !definitions.is_empty() {
        document.insert("$defs".to_string(), Value::Object(definitions));
    }
    Ok(Value::Object(document))
}

/// OpenAPI 3.1 `components` object with one schema per record, nested
/// records included.
///
/// # Errors
///
/// Metadata errors of any listed or nested record.
pub fn openapi_components(engine: &Engine, records: &[RecordRef], context: &Context) -> Result<Value> {
    let mut exporter = SchemaExporter::new(engine, context, Dialect::OpenApi);
    for record in records {
        exporter.define(record)?;
    }
    let schemas = exporter.into_definitions();
    tracing::debug!(schemas = schemas.len(), "exported OpenAPI components");
    Ok(json!({ "components": { "schemas": schemas } }))
}
