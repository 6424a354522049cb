//! # forma-engine: Hydration and Normalization
//!
//! Runs the pipeline over records described by `forma-core` metadata:
//!
//! ```text
//! source ──► input normalizer ──► pre-hydrate ──► mapper ──► casters
//!        ──► validators ──► construct ──► post-hydrate ──► record
//!
//! record ──► pre-serialize (copy) ──► transformers ──► output keys ──► map / JSON
//! ```
//!
//! ## Components
//!
//! - [`MetaFactory`] / [`MetaCache`]: build `ClassMeta` once per type,
//!   including nested record types, and share it.
//! - [`Mapper`]: resolve each property's source key (explicit `map_from`,
//!   naming strategy, dotted paths).
//! - [`CasterRegistry`], [`ValidatorRegistry`], [`TransformerRegistry`]:
//!   priority-ordered plug-in points with built-ins registered by default.
//! - [`Hydrator`] and [`Normalizer`]: the two directions of the pipeline.
//! - [`Engine`]: the façade, plus guarded mutation and collections.
//! - [`EngineConfig`]: YAML, JSON or environment configuration.
//!
//! ## Concurrency
//!
//! The engine is `Send + Sync`. The only shared mutable state is the
//! metadata cache, guarded by a read-write lock; concurrent first builds of
//! the same type resolve to one cached entry.

pub mod caster;
pub mod collection;
pub mod config;
pub mod engine;
pub mod factory;
pub mod hydrator;
pub mod input;
pub mod mapper;
pub mod mutation;
pub mod normalizer;
pub mod priority;
pub mod transformer;
pub mod validator;

pub use caster::{CasterRegistry, DateTimeCaster, EnumCaster, ScalarCaster};
pub use collection::{Collection, JsonPage, Pagination, Paginator};
pub use config::{ConfigError, EngineConfig};
pub use engine::{Engine, EngineBuilder};
pub use factory::{MetaCache, MetaFactory};
pub use hydrator::{Hydrated, Hydrator};
pub use input::{FieldMapInput, InputNormalizer, JsonTextInput, MapInput, ObjectInput, Source};
pub use mapper::Mapper;
pub use mutation::MutableRecord;
pub use normalizer::{output_key, Normalizer};
pub use priority::PriorityList;
pub use transformer::{DateTimeTransformer, EnumTransformer, TransformerRegistry};
pub use validator::{Check, ValidationContext, Validator, ValidatorRegistry};
