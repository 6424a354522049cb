//! # Schema Check
//!
//! Compiles an exported schema with `jsonschema` (Draft 2020-12) and checks
//! documents against it. Failures are reported as forma [`Violations`], so
//! a schema mismatch reads the same as a hydration validation failure.

use serde_json::Value;

use forma_core::{Context, FieldPath, Record, RecordRef, Violation, Violations};
use forma_engine::Engine;

use crate::export::json_schema_for;

/// Errors from exporting, compiling or checking a schema.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("schema export failed: {0}")]
    Export(#[from] forma_core::Error),

    #[error("schema for {record} does not compile: {reason}")]
    Build { record: String, reason: String },

    #[error("document does not match the {record} schema:\n{violations}")]
    Mismatch { record: String, violations: Violations },
}

/// A compiled record schema.
pub struct SchemaCheck {
    record: String,
    schema: Value,
    validator: jsonschema::Validator,
}

impl std::fmt::Debug for SchemaCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaCheck")
            .field("record", &self.record)
            .finish_non_exhaustive()
    }
}

impl SchemaCheck {
    /// Export and compile the schema of `T`.
    ///
    /// # Errors
    ///
    /// [`SchemaError::Export`] for metadata errors,
    /// [`SchemaError::Build`] if the exported schema does not compile.
    pub fn for_record<T: Record>(engine: &Engine, context: &Context) -> Result<Self, SchemaError> {
        let record = RecordRef::of::<T>();
        let schema = json_schema_for(engine, &record, context)?;
        Self::new(record.name(), schema)
    }

    /// Compile an already exported schema.
    ///
    /// # Errors
    ///
    /// [`SchemaError::Build`] if the schema does not compile.
    pub fn new(record: impl Into<String>, schema: Value) -> Result<Self, SchemaError> {
        let record = record.into();
        let mut opts = jsonschema::options();
        opts.with_draft(jsonschema::Draft::Draft202012);
        let validator = opts.build(&schema).map_err(|e| SchemaError::Build {
            record: record.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            record,
            schema,
            validator,
        })
    }

    pub fn record(&self) -> &str {
        &self.record
    }

    pub fn schema(&self) -> &Value {
        &self.schema
    }

    pub fn is_valid(&self, document: &Value) -> bool {
        self.validator.is_valid(document)
    }

    /// # Errors
    ///
    /// [`SchemaError::Mismatch`] with one violation per schema error.
    pub fn check(&self, document: &Value) -> Result<(), SchemaError> {
        let mut violations = Violations::new();
        for error in self.validator.iter_errors(document) {
            violations.push(Violation::new(
                path_from_pointer(&error.instance_path.to_string()),
                "schema",
                error.to_string(),
            ));
        }
        if violations.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::Mismatch {
                record: self.record.clone(),
                violations,
            })
        }
    }
}

/// `/items/1/sku` to `items.1.sku`.
fn path_from_pointer(pointer: &str) -> FieldPath {
    let mut path = FieldPath::root();
    for token in pointer.split('/').skip(1) {
        let token = token.replace("~1", "/").replace("~0", "~");
        match token.parse::<usize>() {
            Ok(index) => path.push(index),
            Err(_) => path.push(token),
        }
    }
    path
}
