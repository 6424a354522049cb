//! # forma-schema: Schema Export
//!
//! Pure consumer of record metadata: nothing here feeds back into
//! hydration or normalization.
//!
//! ## Export (`export`)
//!
//! - [`json_schema`]: a JSON Schema 2020-12 document for one record, with
//!   nested records under `$defs`.
//! - [`openapi_components`]: OpenAPI 3.1 `components.schemas` for a set of
//!   records.
//!
//! ## Checking (`check`)
//!
//! [`SchemaCheck`] compiles an exported schema with `jsonschema` and reports
//! mismatches as structured violations.
//!
//! ## Crate Policy
//!
//! - Depends on `forma-core` and `forma-engine` only.
//! - Output keys follow the engine's normalizer, including the naming
//!   strategy of the context passed in.

pub mod check;
pub mod export;

pub use check::{SchemaCheck, SchemaError};
pub use export::{
    json_schema, json_schema_for, openapi_components, Dialect, SchemaExporter, JSON_SCHEMA_DIALECT,
};
