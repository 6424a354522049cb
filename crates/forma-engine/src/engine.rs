//! # Engine
//!
//! The façade callers use. An [`Engine`] owns its configuration, the
//! metadata factory and every registry; it holds no per-call state, so one
//! instance can serve any number of threads.
//!
//! ## Hydration
//!
//! 1. Read the source into a plain map (first supporting input normalizer).
//! 2. Run the record's `PreHydrate` transform, if registered.
//! 3. Fetch metadata, map source keys, cast, validate, construct.
//! 4. Run `PostHydrate` on the new instance, if registered.
//!
//! ## Normalization
//!
//! 1. Run `PreSerialize` on a clone of the instance, if registered. The
//!    caller's instance is never touched.
//! 2. Fetch metadata and normalize the record's fields.
//! 3. Optionally encode as JSON text.

use std::sync::Arc;

use serde_json::{Map, Value};

use forma_core::{
    encode_text, Caster, ClassMeta, Context, FieldMap, Record, RecordRef, Result, TextOptions,
    Transformer,
};

use crate::caster::{
    CasterRegistry, DateTimeCaster, EnumCaster, ScalarCaster, DATETIME_PRIORITY, ENUM_PRIORITY,
    SCALAR_PRIORITY,
};
use crate::config::{ConfigError, EngineConfig};
use crate::factory::{MetaCache, MetaFactory};
use crate::hydrator::Hydrator;
use crate::input::{
    unsupported, FieldMapInput, InputNormalizer, JsonTextInput, MapInput, ObjectInput, Source,
    BUILTIN_PRIORITY,
};
use crate::mapper::Mapper;
use crate::normalizer::Normalizer;
use crate::priority::PriorityList;
use crate::transformer::{
    DateTimeTransformer, EnumTransformer, TransformerRegistry, DATETIME_PRIORITY as DATETIME_OUT,
    ENUM_PRIORITY as ENUM_OUT,
};
use crate::validator::{
    BoundsValidator, FormatValidator, LengthValidator, NestedValidator, PatternValidator,
    RequiredIfValidator, RequiredValidator, Validator, ValidatorRegistry, NESTED_PRIORITY,
    RANGE_PRIORITY, REQUIRED_IF_PRIORITY, REQUIRED_PRIORITY, TEXT_PRIORITY,
};

/// Hydrates and normalizes records.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    factory: MetaFactory,
    casters: CasterRegistry,
    validators: ValidatorRegistry,
    transformers: TransformerRegistry,
    inputs: PriorityList<dyn InputNormalizer>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Default configuration and built-ins only.
    pub fn new() -> Self {
        EngineBuilder::new().build()
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn factory(&self) -> &MetaFactory {
        &self.factory
    }

    pub fn casters(&self) -> &CasterRegistry {
        &self.casters
    }

    pub fn validators(&self) -> &ValidatorRegistry {
        &self.validators
    }

    pub fn transformers(&self) -> &TransformerRegistry {
        &self.transformers
    }

    pub fn hydrator(&self) -> Hydrator<'_> {
        Hydrator::new(&self.factory, &self.casters, &self.validators, &self.config)
    }

    pub fn normalizer(&self) -> Normalizer<'_> {
        Normalizer::new(&self.factory, &self.transformers, &self.config)
    }

    /// Metadata for `T`, built on first use.
    ///
    /// # Errors
    ///
    /// [`forma_core::MetadataError`] for unsupported declarations.
    pub fn metadata<T: Record>(&self) -> Result<Arc<ClassMeta>> {
        Ok(self.factory.metadata::<T>()?)
    }

    /// Metadata for a record reference.
    ///
    /// # Errors
    ///
    /// As [`Engine::metadata`].
    pub fn metadata_for(&self, record: &RecordRef) -> Result<Arc<ClassMeta>> {
        Ok(self.factory.create(record)?)
    }

    /// Forget all cached metadata.
    pub fn reset_metadata(&self) {
        self.factory.cache().reset();
    }

    /// Read a source into a plain map with the first supporting input
    /// normalizer.
    ///
    /// # Errors
    ///
    /// [`forma_core::HydrationError::UnsupportedInput`] when no normalizer
    /// supports the source, or the normalizer's decode error.
    pub fn read_source(&self, source: Source) -> Result<Map<String, Value>> {
        match self.inputs.iter().find(|input| input.supports(&source)) {
            Some(input) => {
                tracing::trace!(input = input.name(), shape = %source.shape(), "reading source");
                input.read(source)
            }
            None => Err(unsupported(&source)),
        }
    }

    /// Hydrate a `T` with a default context.
    ///
    /// # Errors
    ///
    /// See [`Engine::hydrate_with`].
    pub fn hydrate<T: Record>(&self, source: impl Into<Source>) -> Result<T> {
        self.hydrate_with(source, &Context::default())
    }

    /// Hydrate a `T`.
    ///
    /// # Errors
    ///
    /// - [`forma_core::HydrationError`] for unreadable input, missing
    ///   required fields, or excessive nesting;
    /// - [`forma_core::MetadataError`] for unsupported declarations;
    /// - [`forma_core::MappingError`] for untraversable source keys;
    /// - [`forma_core::CastError`] for values no caster can convert;
    /// - [`forma_core::ValidationError`] carrying every rule violation.
    pub fn hydrate_with<T: Record>(&self, source: impl Into<Source>, context: &Context) -> Result<T> {
        let record = RecordRef::of::<T>();
        let span = tracing::debug_span!("hydrate", record = record.name());
        let _guard = span.enter();

        let hooks = T::hooks();
        let mut raw = self.read_source(source.into())?;
        if let Some(pre_hydrate) = hooks.pre_hydrate() {
            raw = pre_hydrate(raw);
        }
        let meta = self.metadata::<T>()?;
        let mapped = Mapper.map(&raw, &meta, context)?;
        let mut instance: T = self.hydrator().hydrate(&meta, &mapped, context)?;
        if let Some(post_hydrate) = hooks.post_hydrate() {
            post_hydrate(&mut instance);
        }
        Ok(instance)
    }

    /// Normalize with a default context.
    ///
    /// # Errors
    ///
    /// See [`Engine::normalize_with`].
    pub fn normalize<T: Record>(&self, record: &T) -> Result<FieldMap> {
        self.normalize_with(record, &Context::default())
    }

    /// Normalize a record into plain field values under output keys.
    ///
    /// # Errors
    ///
    /// Transformer failures and nested metadata errors, prefixed with the
    /// failing field's path.
    pub fn normalize_with<T: Record>(&self, record: &T, context: &Context) -> Result<FieldMap> {
        let span = tracing::debug_span!("normalize", record = RecordRef::of::<T>().name());
        let _guard = span.enter();

        let fields = match T::hooks().pre_serialize() {
            Some(pre_serialize) => {
                let mut copy = record.clone();
                pre_serialize(&mut copy);
                copy.to_fields()
            }
            None => record.to_fields(),
        };
        let meta = self.metadata::<T>()?;
        self.normalizer().normalize(&meta, &fields, context)
    }

    /// Normalize into a JSON object.
    ///
    /// # Errors
    ///
    /// As [`Engine::normalize_with`], plus
    /// [`forma_core::HydrationError::Encode`] for values with no JSON form.
    pub fn normalize_to_value<T: Record>(&self, record: &T, context: &Context) -> Result<Value> {
        Ok(Value::Object(self.normalize_with(record, context)?.to_json()?))
    }

    /// Normalize and encode as JSON text.
    ///
    /// # Errors
    ///
    /// As [`Engine::normalize_to_value`].
    pub fn normalize_to_text<T: Record>(
        &self,
        record: &T,
        context: &Context,
        options: TextOptions,
    ) -> Result<String> {
        let map = self.normalize_with(record, context)?.to_json()?;
        Ok(encode_text(&map, options)?)
    }
}

/// Configures an [`Engine`].
///
/// Built-ins are registered first (unless disabled), then the caller's
/// registrations in call order, so at equal priority a built-in wins.
pub struct EngineBuilder {
    config: EngineConfig,
    cache: Option<Arc<MetaCache>>,
    builtins: bool,
    casters: Vec<(Box<dyn Caster>, i32)>,
    validators: Vec<(Box<dyn Validator>, i32)>,
    transformers: Vec<(Box<dyn Transformer>, i32)>,
    inputs: Vec<(Box<dyn InputNormalizer>, i32)>,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            cache: None,
            builtins: true,
            casters: Vec::new(),
            validators: Vec::new(),
            transformers: Vec::new(),
            inputs: Vec::new(),
        }
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Share a metadata cache with other engines.
    pub fn meta_cache(mut self, cache: Arc<MetaCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Skip built-in casters, validators, transformers and input normalizers.
    pub fn without_builtins(mut self) -> Self {
        self.builtins = false;
        self
    }

    pub fn caster(mut self, caster: impl Caster + 'static, priority: i32) -> Self {
        self.casters.push((Box::new(caster), priority));
        self
    }

    pub fn validator(mut self, validator: impl Validator + 'static, priority: i32) -> Self {
        self.validators.push((Box::new(validator), priority));
        self
    }

    pub fn transformer(mut self, transformer: impl Transformer + 'static, priority: i32) -> Self {
        self.transformers.push((Box::new(transformer), priority));
        self
    }

    /// Built-in input normalizers sit at priority 0.
    pub fn input(mut self, input: impl InputNormalizer + 'static, priority: i32) -> Self {
        self.inputs.push((Box::new(input), priority));
        self
    }

    /// Validate the configuration, then build.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] when [`EngineConfig::validate`] rejects the
    /// configuration.
    pub fn try_build(self) -> std::result::Result<Engine, ConfigError> {
        self.config.validate()?;
        Ok(self.build())
    }

    /// Build without checking the configuration. The loaders on
    /// [`EngineConfig`] already validate; use [`EngineBuilder::try_build`]
    /// for a configuration assembled in code.
    pub fn build(self) -> Engine {
        let config = self.config;
        let mut casters = CasterRegistry::new();
        let mut validators = ValidatorRegistry::new();
        let mut transformers = TransformerRegistry::new();
        let mut inputs: PriorityList<dyn InputNormalizer> = PriorityList::new();

        if self.builtins {
            casters.register(ScalarCaster::new(config.strict_scalars), SCALAR_PRIORITY);
            casters.register(EnumCaster, ENUM_PRIORITY);
            casters.register(DateTimeCaster::new(config.date_input_formats.clone()), DATETIME_PRIORITY);

            validators.register(RequiredValidator, REQUIRED_PRIORITY);
            validators.register(RequiredIfValidator, REQUIRED_IF_PRIORITY);
            validators.register(BoundsValidator, RANGE_PRIORITY);
            validators.register(LengthValidator, RANGE_PRIORITY);
            validators.register(PatternValidator::new(), TEXT_PRIORITY);
            validators.register(FormatValidator::new(), TEXT_PRIORITY);
            validators.register(NestedValidator, NESTED_PRIORITY);

            transformers.register(DateTimeTransformer::new(config.date_format.clone()), DATETIME_OUT);
            transformers.register(EnumTransformer, ENUM_OUT);

            inputs.insert(Box::new(MapInput), BUILTIN_PRIORITY);
            inputs.insert(Box::new(JsonTextInput), BUILTIN_PRIORITY);
            inputs.insert(Box::new(FieldMapInput), BUILTIN_PRIORITY);
            inputs.insert(Box::new(ObjectInput), BUILTIN_PRIORITY);
        }

        for (caster, priority) in self.casters {
            casters.register_boxed(caster, priority);
        }
        for (validator, priority) in self.validators {
            validators.register_boxed(validator, priority);
        }
        for (transformer, priority) in self.transformers {
            transformers.register_boxed(transformer, priority);
        }
        for (input, priority) in self.inputs {
            inputs.insert(input, priority);
        }

        let factory = match self.cache {
            Some(cache) => MetaFactory::with_cache(cache),
            None => MetaFactory::new(),
        };

        Engine {
            config,
            factory,
            casters,
            validators,
            transformers,
            inputs,
        }
    }
}
