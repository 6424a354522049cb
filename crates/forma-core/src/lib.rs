//! # forma-core: Metadata Model and Shared Types
//!
//! The leaf crate of the forma workspace. It defines everything the engine
//! and its extensions agree on, and nothing that runs the pipeline:
//!
//! - the metadata model (`TypeDescriptor`, `PropertyMeta`, `ClassMeta`);
//! - the declaration model records use to describe themselves;
//! - the `FieldValue` tree that sits between raw input and typed records;
//! - the `Record` / `BackedEnum` traits and lifecycle capabilities;
//! - the `Caster` / `Transformer` extension traits;
//! - naming strategies, per-call `Context`, field paths and errors;
//! - text encoding and date/time parsing helpers.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `forma-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - Metadata is immutable once built; every type that ends up inside a
//!   `ClassMeta` is `Clone + PartialEq`.

pub mod context;
pub mod convert;
pub mod decl;
pub mod encode;
pub mod error;
pub mod meta;
pub mod naming;
pub mod path;
pub mod record;
pub mod temporal;
pub mod value;

pub use context::Context;
pub use convert::{Caster, Transformer};
pub use decl::{ClassDecl, FieldDecl, TypeDecl};
pub use encode::{encode_text, TextOptions};
pub use error::{
    CastError, Error, HydrationError, MappingError, MetadataError, Result, ValidationError,
    Violation, Violations,
};
pub use meta::{
    Attributes, CasterRef, ClassMeta, PropertyMeta, RuleKind, TransformerRef, TypeDescriptor,
    TypeTag, ValidationRule,
};
pub use naming::{CamelCase, Direction, Identity, KebabCase, NamingStrategy, SnakeCase};
pub use path::{FieldPath, Segment};
pub use record::{
    Arguments, BackedEnum, EnumCase, EnumRef, Hooks, PostHydrate, PreHydrate, PreSerialize,
    Record, RecordRef,
};
pub use value::{
    CustomValue, EnumValue, FieldMap, FieldValue, FromFieldValue, IntoFieldValue, RecordValue,
};
