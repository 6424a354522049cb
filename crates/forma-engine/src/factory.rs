//! # Metadata Factory and Cache
//!
//! [`MetaFactory::create`] turns a record's [`ClassDecl`] into a
//! [`ClassMeta`] and memoizes it in a [`MetaCache`] keyed by `TypeId`.
//!
//! ## Resolution
//!
//! - Unions: `null` members make the type nullable. Exactly one non-null
//!   member must remain, otherwise the union is unsupported. `null` on its
//!   own is not a field type.
//! - Rules are checked against the field type once, here, so the
//!   validators never see a rule that cannot work (bad regex, inverted
//!   bounds, `requiredIf` on an undeclared field, `valid` on a scalar).
//! - Constructor parameters must name exactly the declared fields.
//! - Nested record metadata is built eagerly. A set of in-progress types
//!   stops recursion through self-referencing records.
//!
//! ## Concurrency
//!
//! The cache is read-mostly behind a `parking_lot::RwLock`. Two threads
//! racing on the first build of the same type both build; the first insert
//! wins and both get the stored `Arc`, so callers always share one value.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use regex::Regex;

use forma_core::decl::{ClassDecl, FieldDecl, TypeDecl};
use forma_core::meta::{CasterRef, ClassMeta, PropertyMeta, TransformerRef, TypeTag};
use forma_core::{MetadataError, Record, RecordRef, RuleKind, TypeDescriptor, ValidationRule};

/// Process-lifetime store of built metadata.
#[derive(Debug, Default)]
pub struct MetaCache {
    entries: RwLock<HashMap<TypeId, Arc<ClassMeta>>>,
}

impl MetaCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: TypeId) -> Option<Arc<ClassMeta>> {
        self.entries.read().get(&id).cloned()
    }

    /// Store `meta` unless an entry exists; returns the stored value.
    pub fn insert(&self, meta: ClassMeta) -> Arc<ClassMeta> {
        let id = meta.record.id();
        self.entries
            .write()
            .entry(id)
            .or_insert_with(|| Arc::new(meta))
            .clone()
    }

    pub fn contains(&self, id: TypeId) -> bool {
        self.entries.read().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drop every entry. The next `create` rebuilds from declarations.
    pub fn reset(&self) {
        let mut entries = self.entries.write();
        let dropped = entries.len();
        entries.clear();
        tracing::info!(dropped, "record metadata cache reset");
    }
}

/// Builds and memoizes [`ClassMeta`].
#[derive(Debug, Clone, Default)]
pub struct MetaFactory {
    cache: Arc<MetaCache>,
}

impl MetaFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a cache shared with other factories.
    pub fn with_cache(cache: Arc<MetaCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<MetaCache> {
        &self.cache
    }

    /// Metadata for `T`.
    ///
    /// # Errors
    ///
    /// See [`MetaFactory::create`].
    pub fn metadata<T: Record>(&self) -> Result<Arc<ClassMeta>, MetadataError> {
        self.create(&RecordRef::of::<T>())
    }

    /// Metadata for the referenced record type, built on first use.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError`] if this type or any record type it nests
    /// declares an unsupported shape.
    pub fn create(&self, record: &RecordRef) -> Result<Arc<ClassMeta>, MetadataError> {
        if let Some(meta) = self.cache.get(record.id()) {
            tracing::trace!(record = record.name(), "record metadata cache hit");
            return Ok(meta);
        }
        let mut in_progress = HashSet::new();
        self.build(record, &mut in_progress)
    }

    fn build(
        &self,
        record: &RecordRef,
        in_progress: &mut HashSet<TypeId>,
    ) -> Result<Arc<ClassMeta>, MetadataError> {
        if let Some(meta) = self.cache.get(record.id()) {
            return Ok(meta);
        }
        in_progress.insert(record.id());

        let meta = build_class_meta(*record, record.declare())?;
        for nested in meta.nested_records() {
            if !in_progress.contains(&nested.id()) {
                self.build(&nested, in_progress)?;
            }
        }

        tracing::debug!(
            record = %meta.type_name,
            properties = meta.properties.len(),
            "built record metadata"
        );
        Ok(self.cache.insert(meta))
    }
}

fn build_class_meta(record: RecordRef, decl: ClassDecl) -> Result<ClassMeta, MetadataError> {
    let type_name = decl.name.clone();
    let mut names: Vec<&str> = Vec::with_capacity(decl.fields.len());
    for field in &decl.fields {
        if names.contains(&field.name.as_str()) {
            return Err(MetadataError::DuplicateField {
                record: type_name,
                field: field.name.clone(),
            });
        }
        names.push(&field.name);
    }

    let constructor_params = match &decl.constructor {
        Some(params) => {
            for param in params {
                if !names.contains(&param.as_str()) {
                    return Err(MetadataError::UnknownConstructorParam {
                        record: type_name,
                        param: param.clone(),
                    });
                }
            }
            if let Some(missing) = names.iter().find(|n| !params.iter().any(|p| p == *n)) {
                return Err(MetadataError::MissingConstructorParam {
                    record: type_name,
                    field: missing.to_string(),
                });
            }
            params.clone()
        }
        None => names.iter().map(|n| n.to_string()).collect(),
    };

    let properties = decl
        .fields
        .iter()
        .map(|field| build_property(&type_name, decl.readonly, field, &names))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ClassMeta {
        type_name,
        record,
        readonly: decl.readonly,
        properties,
        constructor_params,
        attributes: decl.attributes,
    })
}

fn build_property(
    record: &str,
    class_readonly: bool,
    field: &FieldDecl,
    siblings: &[&str],
) -> Result<PropertyMeta, MetadataError> {
    let ty = resolve_type(record, &field.name, &field.ty)?;
    for rule in &field.rules {
        check_rule(record, &field.name, rule, &ty, siblings)?;
    }
    Ok(PropertyMeta {
        name: field.name.clone(),
        ty,
        readonly: class_readonly || field.readonly,
        default: field.default.clone(),
        map_from: field.map_from.clone(),
        map_to: field.map_to.clone(),
        caster: field.caster.clone().map(CasterRef),
        transformer: field.transformer.clone().map(TransformerRef),
        hidden: field.hidden,
        rules: field.rules.clone(),
        attributes: field.attributes.clone(),
    })
}

fn resolve_type(record: &str, field: &str, decl: &TypeDecl) -> Result<TypeDescriptor, MetadataError> {
    let ty = match decl {
        TypeDecl::String => TypeDescriptor::scalar(TypeTag::String),
        TypeDecl::Int => TypeDescriptor::scalar(TypeTag::Int),
        TypeDecl::Float => TypeDescriptor::scalar(TypeTag::Float),
        TypeDecl::Bool => TypeDescriptor::scalar(TypeTag::Bool),
        TypeDecl::Object => TypeDescriptor::scalar(TypeTag::Object),
        TypeDecl::Any => TypeDescriptor::scalar(TypeTag::Any),
        TypeDecl::DateTime => TypeDescriptor::scalar(TypeTag::DateTime),
        TypeDecl::List(item) => TypeDescriptor::array(Some(resolve_type(record, field, item)?)),
        TypeDecl::UntypedList => TypeDescriptor::array(None),
        TypeDecl::Enum(e) => TypeDescriptor::enumeration(*e),
        TypeDecl::Record(r) => TypeDescriptor::record(*r),
        TypeDecl::Optional(inner) => resolve_type(record, field, inner)?.nullable(),
        TypeDecl::Null => {
            return Err(MetadataError::NullType {
                record: record.to_string(),
                field: field.to_string(),
            })
        }
        TypeDecl::Union(members) => {
            let nullable = members.iter().any(|m| matches!(m, TypeDecl::Null));
            let rest: Vec<&TypeDecl> = members
                .iter()
                .filter(|m| !matches!(m, TypeDecl::Null))
                .collect();
            match rest.as_slice() {
                [] => {
                    return Err(MetadataError::NullType {
                        record: record.to_string(),
                        field: field.to_string(),
                    })
                }
                [only] => {
                    let ty = resolve_type(record, field, only)?;
                    if nullable {
                        ty.nullable()
                    } else {
                        ty
                    }
                }
                _ => {
                    return Err(MetadataError::UnsupportedUnion {
                        record: record.to_string(),
                        field: field.to_string(),
                        types: decl.describe(),
                    })
                }
            }
        }
    };
    Ok(ty)
}

fn check_rule(
    record: &str,
    field: &str,
    rule: &ValidationRule,
    ty: &TypeDescriptor,
    siblings: &[&str],
) -> Result<(), MetadataError> {
    let invalid = |reason: String| MetadataError::InvalidRule {
        record: record.to_string(),
        field: field.to_string(),
        rule: rule.id().to_string(),
        reason,
    };
    let tag = ty.tag();
    let numeric = matches!(tag, TypeTag::Int | TypeTag::Float | TypeTag::Any);
    let textual = matches!(tag, TypeTag::String | TypeTag::Any);

    match &rule.kind {
        RuleKind::Required | RuleKind::Custom { .. } => Ok(()),
        RuleKind::RequiredIf { field: other, .. } => {
            if siblings.contains(&other.as_str()) {
                Ok(())
            } else {
                Err(invalid(format!("'{other}' is not a declared field")))
            }
        }
        RuleKind::Min(_) | RuleKind::Max(_) if !numeric => {
            Err(invalid(format!("bounds need a numeric field, found {ty}")))
        }
        RuleKind::Min(_) | RuleKind::Max(_) => Ok(()),
        RuleKind::Between { min, max } => {
            if !numeric {
                Err(invalid(format!("bounds need a numeric field, found {ty}")))
            } else if min > max {
                Err(invalid(format!("min {min} is greater than max {max}")))
            } else {
                Ok(())
            }
        }
        RuleKind::Length { min, max } => {
            if !(textual || ty.is_array()) {
                return Err(invalid(format!("length needs a string or list field, found {ty}")));
            }
            match (min, max) {
                (Some(min), Some(max)) if min > max => {
                    Err(invalid(format!("min {min} is greater than max {max}")))
                }
                _ => Ok(()),
            }
        }
        RuleKind::Pattern(pattern) => {
            if !textual {
                return Err(invalid(format!("pattern needs a string field, found {ty}")));
            }
            Regex::new(pattern)
                .map(|_| ())
                .map_err(|e| invalid(format!("cannot compile '{pattern}': {e}")))
        }
        RuleKind::Url | RuleKind::Email if !textual => {
            Err(invalid(format!("format needs a string field, found {ty}")))
        }
        RuleKind::Url | RuleKind::Email => Ok(()),
        RuleKind::Valid { each: false } if !ty.is_record() => {
            Err(invalid(format!("needs a record field, found {ty}")))
        }
        RuleKind::Valid { each: true } if !ty.is_record_list() => {
            Err(invalid(format!("needs a list of records, found {ty}")))
        }
        RuleKind::Valid { .. } => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forma_core::{Arguments, FieldMap, Result as FormaResult};

    #[derive(Clone)]
    struct Node;

    impl Record for Node {
        fn declare() -> ClassDecl {
            ClassDecl::new("Node")
                .field(FieldDecl::new("name", TypeDecl::String))
                .field(FieldDecl::new("children", TypeDecl::list(TypeDecl::record::<Node>())))
        }
        fn construct(_: &mut Arguments) -> FormaResult<Self> {
            Ok(Node)
        }
        fn to_fields(&self) -> FieldMap {
            FieldMap::new()
        }
    }

    macro_rules! decl_record {
        ($name:ident, $decl:expr) => {
            #[derive(Clone)]
            struct $name;
            impl Record for $name {
                fn declare() -> ClassDecl {
                    $decl
                }
                fn construct(_: &mut Arguments) -> FormaResult<Self> {
                    Ok($name)
                }
                fn to_fields(&self) -> FieldMap {
                    FieldMap::new()
                }
            }
        };
    }

    decl_record!(
        Ambiguous,
        ClassDecl::new("Ambiguous").field(FieldDecl::new(
            "value",
            TypeDecl::union([TypeDecl::Int, TypeDecl::String])
        ))
    );

    decl_record!(
        MaybeInt,
        ClassDecl::new("MaybeInt").field(FieldDecl::new(
            "value",
            TypeDecl::union([TypeDecl::Int, TypeDecl::Null])
        ))
    );

    decl_record!(
        BadRegex,
        ClassDecl::new("BadRegex")
            .field(FieldDecl::new("code", TypeDecl::String).rule(ValidationRule::pattern("([a-z")))
    );

    decl_record!(
        Inverted,
        ClassDecl::new("Inverted")
            .field(FieldDecl::new("n", TypeDecl::Int).rule(ValidationRule::between(5.0, 1.0)))
    );

    decl_record!(
        InvertedLength,
        ClassDecl::new("InvertedLength")
            .field(FieldDecl::new("s", TypeDecl::String).rule(ValidationRule::length(Some(4), Some(2))))
    );

    decl_record!(
        Dangling,
        ClassDecl::new("Dangling").field(
            FieldDecl::new("vat", TypeDecl::optional(TypeDecl::String))
                .rule(ValidationRule::required_if("country", "DE"))
        )
    );

    decl_record!(
        ScalarValid,
        ClassDecl::new("ScalarValid")
            .field(FieldDecl::new("n", TypeDecl::Int).rule(ValidationRule::valid()))
    );

    decl_record!(
        Twice,
        ClassDecl::new("Twice")
            .field(FieldDecl::new("a", TypeDecl::Int))
            .field(FieldDecl::new("a", TypeDecl::String))
    );

    decl_record!(
        Ctor,
        ClassDecl::new("Ctor")
            .field(FieldDecl::new("a", TypeDecl::Int))
            .field(FieldDecl::new("b", TypeDecl::Int))
            .constructor(["b"])
    );

    decl_record!(
        NullOnly,
        ClassDecl::new("NullOnly").field(FieldDecl::new("x", TypeDecl::Null))
    );

    #[test]
    fn cache_returns_the_same_arc() {
        let factory = MetaFactory::new();
        let first = factory.metadata::<MaybeInt>().unwrap();
        let second = factory.metadata::<MaybeInt>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(factory.cache().len(), 1);
    }

    #[test]
    fn nullable_union_resolves() {
        let meta = MetaFactory::new().metadata::<MaybeInt>().unwrap();
        let ty = &meta.property("value").unwrap().ty;
        assert_eq!(ty.tag(), TypeTag::Int);
        assert!(ty.is_nullable());
    }

    #[test]
    fn self_referencing_record_builds_once() {
        let factory = MetaFactory::new();
        let meta = factory.metadata::<Node>().unwrap();
        assert_eq!(meta.nested_records(), vec![RecordRef::of::<Node>()]);
        assert_eq!(factory.cache().len(), 1);
    }

    #[test]
    fn unsupported_shapes_are_metadata_errors() {
        let factory = MetaFactory::new();
        assert!(matches!(
            factory.metadata::<Ambiguous>(),
            Err(MetadataError::UnsupportedUnion { .. })
        ));
        assert!(matches!(factory.metadata::<NullOnly>(), Err(MetadataError::NullType { .. })));
        assert!(matches!(factory.metadata::<Twice>(), Err(MetadataError::DuplicateField { .. })));
        assert!(matches!(
            factory.metadata::<Ctor>(),
            Err(MetadataError::MissingConstructorParam { .. })
        ));
        assert!(factory.cache().is_empty());
    }

    #[test]
    fn broken_rules_are_rejected_at_build_time() {
        let factory = MetaFactory::new();
        for err in [
            factory.metadata::<BadRegex>().unwrap_err(),
            factory.metadata::<Inverted>().unwrap_err(),
            factory.metadata::<InvertedLength>().unwrap_err(),
            factory.metadata::<Dangling>().unwrap_err(),
            factory.metadata::<ScalarValid>().unwrap_err(),
        ] {
            assert!(matches!(err, MetadataError::InvalidRule { .. }), "{err}");
        }
    }

    #[test]
    fn reset_empties_the_cache() {
        let factory = MetaFactory::new();
        factory.metadata::<Node>().unwrap();
        factory.cache().reset();
        assert!(factory.cache().is_empty());
    }
}
