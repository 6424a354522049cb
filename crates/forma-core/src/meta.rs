//! # Metadata Model
//!
//! The resolved, immutable description of a record type:
//!
//! - [`TypeDescriptor`]: one field's type: a tag plus nullability, list
//!   item type, and enum/record references.
//! - [`PropertyMeta`]: one field: type, defaults, renames, explicit
//!   caster/transformer, hidden flag, validation rules, raw attributes.
//! - [`ClassMeta`]: one record type: its properties in declaration order
//!   and its constructor parameters.
//!
//! Metadata is produced once per type by the metadata factory and shared
//! behind an `Arc`. Nothing in the pipeline mutates it afterwards.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::convert::{Caster, Transformer};
use crate::record::{EnumRef, RecordRef};

/// Opaque declarative metadata, available to custom extensions.
pub type Attributes = Map<String, Value>;

/// Canonical type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    String,
    Int,
    Float,
    Bool,
    Array,
    Object,
    Enum,
    Record,
    DateTime,
    /// Untyped; accepts anything, including null.
    Any,
}

impl TypeTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Array => "array",
            Self::Object => "object",
            Self::Enum => "enum",
            Self::Record => "record",
            Self::DateTime => "datetime",
            Self::Any => "any",
        }
    }

    /// Scalars and untyped containers.
    pub fn is_builtin(&self) -> bool {
        !matches!(self, Self::Enum | Self::Record | Self::DateTime)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved type of a field.
///
/// Two descriptors with identical fields are interchangeable.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    tag: TypeTag,
    nullable: bool,
    item: Option<Box<TypeDescriptor>>,
    enum_ref: Option<EnumRef>,
    record_ref: Option<RecordRef>,
}

impl TypeDescriptor {
    pub fn scalar(tag: TypeTag) -> Self {
        Self {
            tag,
            nullable: tag == TypeTag::Any,
            item: None,
            enum_ref: None,
            record_ref: None,
        }
    }

    /// A list; an untyped list gets `any` items.
    pub fn array(item: Option<TypeDescriptor>) -> Self {
        Self {
            item: Some(Box::new(item.unwrap_or_else(|| Self::scalar(TypeTag::Any)))),
            ..Self::scalar(TypeTag::Array)
        }
    }

    pub fn enumeration(enum_ref: EnumRef) -> Self {
        Self {
            enum_ref: Some(enum_ref),
            ..Self::scalar(TypeTag::Enum)
        }
    }

    pub fn record(record_ref: RecordRef) -> Self {
        Self {
            record_ref: Some(record_ref),
            ..Self::scalar(TypeTag::Record)
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn tag(&self) -> TypeTag {
        self.tag
    }

    pub fn name(&self) -> &'static str {
        self.tag.as_str()
    }

    pub fn is_builtin(&self) -> bool {
        self.tag.is_builtin()
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_array(&self) -> bool {
        self.tag == TypeTag::Array
    }

    pub fn array_item_type(&self) -> Option<&TypeDescriptor> {
        self.item.as_deref()
    }

    pub fn is_enum(&self) -> bool {
        self.tag == TypeTag::Enum
    }

    pub fn enum_ref(&self) -> Option<&EnumRef> {
        self.enum_ref.as_ref()
    }

    pub fn is_record(&self) -> bool {
        self.tag == TypeTag::Record
    }

    pub fn record_ref(&self) -> Option<&RecordRef> {
        self.record_ref.as_ref()
    }

    pub fn is_date_time(&self) -> bool {
        self.tag == TypeTag::DateTime
    }

    /// Whether this is a list of nested records.
    pub fn is_record_list(&self) -> bool {
        self.array_item_type().is_some_and(TypeDescriptor::is_record)
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tag {
            TypeTag::Array => match self.array_item_type() {
                Some(item) => write!(f, "array<{item}>")?,
                None => f.write_str("array")?,
            },
            TypeTag::Enum => match &self.enum_ref {
                Some(e) => write!(f, "enum {}", e.name())?,
                None => f.write_str("enum")?,
            },
            TypeTag::Record => match &self.record_ref {
                Some(r) => f.write_str(r.name())?,
                None => f.write_str("record")?,
            },
            tag => f.write_str(tag.as_str())?,
        }
        if self.nullable && self.tag != TypeTag::Any {
            f.write_str("|null")?;
        }
        Ok(())
    }
}

/// The constraint a rule expresses.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleKind {
    /// Value must be present, non-null and (by policy) non-empty.
    Required,
    /// Required only when sibling `field` equals `equals` in the raw input.
    RequiredIf { field: String, equals: Value },
    /// Inclusive numeric lower bound.
    Min(f64),
    /// Inclusive numeric upper bound.
    Max(f64),
    Between { min: f64, max: f64 },
    /// Character count of strings, item count of lists.
    Length {
        min: Option<usize>,
        max: Option<usize>,
    },
    /// Regular expression the whole string must match somewhere.
    Pattern(String),
    Url,
    Email,
    /// Validate the nested record, or every list element with `each`.
    Valid { each: bool },
    /// Handled by a user-registered validator.
    Custom { name: String, params: Value },
}

/// A rule attached to a property, with an optional message template.
///
/// Templates may use `{field}` and the rule's own parameters
/// (`{min}`, `{max}`, `{pattern}`, `{other}`, `{value}`).
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationRule {
    pub kind: RuleKind,
    pub message: Option<String>,
}

impl ValidationRule {
    pub fn new(kind: RuleKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }

    pub fn required() -> Self {
        Self::new(RuleKind::Required)
    }

    pub fn required_if(field: impl Into<String>, equals: impl Into<Value>) -> Self {
        Self::new(RuleKind::RequiredIf {
            field: field.into(),
            equals: equals.into(),
        })
    }

    pub fn min(min: f64) -> Self {
        Self::new(RuleKind::Min(min))
    }

    pub fn max(max: f64) -> Self {
        Self::new(RuleKind::Max(max))
    }

    pub fn between(min: f64, max: f64) -> Self {
        Self::new(RuleKind::Between { min, max })
    }

    pub fn length(min: Option<usize>, max: Option<usize>) -> Self {
        Self::new(RuleKind::Length { min, max })
    }

    pub fn min_length(min: usize) -> Self {
        Self::length(Some(min), None)
    }

    pub fn max_length(max: usize) -> Self {
        Self::length(None, Some(max))
    }

    pub fn pattern(pattern: impl Into<String>) -> Self {
        Self::new(RuleKind::Pattern(pattern.into()))
    }

    pub fn url() -> Self {
        Self::new(RuleKind::Url)
    }

    pub fn email() -> Self {
        Self::new(RuleKind::Email)
    }

    pub fn valid() -> Self {
        Self::new(RuleKind::Valid { each: false })
    }

    pub fn valid_each() -> Self {
        Self::new(RuleKind::Valid { each: true })
    }

    pub fn custom(name: impl Into<String>, params: impl Into<Value>) -> Self {
        Self::new(RuleKind::Custom {
            name: name.into(),
            params: params.into(),
        })
    }

    /// Replace the default message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Rule identifier reported in violations.
    pub fn id(&self) -> &str {
        match &self.kind {
            RuleKind::Required => "required",
            RuleKind::RequiredIf { .. } => "required_if",
            RuleKind::Min(_) => "min",
            RuleKind::Max(_) => "max",
            RuleKind::Between { .. } => "between",
            RuleKind::Length { .. } => "length",
            RuleKind::Pattern(_) => "pattern",
            RuleKind::Url => "url",
            RuleKind::Email => "email",
            RuleKind::Valid { .. } => "valid",
            RuleKind::Custom { name, .. } => name,
        }
    }
}

/// Shared handle to an explicit caster. Equal when names are equal.
#[derive(Clone)]
pub struct CasterRef(pub Arc<dyn Caster>);

impl PartialEq for CasterRef {
    fn eq(&self, other: &Self) -> bool {
        self.0.name() == other.0.name()
    }
}

impl fmt::Debug for CasterRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CasterRef({})", self.0.name())
    }
}

/// Shared handle to an explicit transformer. Equal when names are equal.
#[derive(Clone)]
pub struct TransformerRef(pub Arc<dyn Transformer>);

impl PartialEq for TransformerRef {
    fn eq(&self, other: &Self) -> bool {
        self.0.name() == other.0.name()
    }
}

impl fmt::Debug for TransformerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransformerRef({})", self.0.name())
    }
}

/// Resolved metadata of one field.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyMeta {
    pub name: String,
    pub ty: TypeDescriptor,
    pub readonly: bool,
    pub default: Option<Value>,
    /// Source key override; may be dotted.
    pub map_from: Option<String>,
    /// Output key override.
    pub map_to: Option<String>,
    pub caster: Option<CasterRef>,
    pub transformer: Option<TransformerRef>,
    pub hidden: bool,
    pub rules: Vec<ValidationRule>,
    pub attributes: Attributes,
}

impl PropertyMeta {
    /// A plain property of the given type, with nothing else declared.
    pub fn new(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            ty,
            readonly: false,
            default: None,
            map_from: None,
            map_to: None,
            caster: None,
            transformer: None,
            hidden: false,
            rules: Vec::new(),
            attributes: Attributes::new(),
        }
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Not nullable and no default.
    pub fn is_required(&self) -> bool {
        !self.ty.is_nullable() && !self.has_default()
    }

    /// The property as seen by one list element: item type, same name and
    /// attributes, nothing that applies to the list as a whole.
    pub fn element(&self) -> Option<PropertyMeta> {
        let item = self.ty.array_item_type()?.clone();
        Some(Self {
            name: self.name.clone(),
            ty: item,
            attributes: self.attributes.clone(),
            ..Self::new(self.name.clone(), TypeDescriptor::scalar(TypeTag::Any))
        })
    }

    pub fn has_rule(&self, id: &str) -> bool {
        self.rules.iter().any(|r| r.id() == id)
    }
}

/// Resolved metadata of one record type.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMeta {
    pub type_name: String,
    pub record: RecordRef,
    pub readonly: bool,
    /// Declaration order.
    pub properties: Vec<PropertyMeta>,
    pub constructor_params: Vec<String>,
    pub attributes: Attributes,
}

impl ClassMeta {
    pub fn property(&self, name: &str) -> Option<&PropertyMeta> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn properties(&self) -> impl Iterator<Item = &PropertyMeta> {
        self.properties.iter()
    }

    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(|p| p.name.as_str())
    }

    /// Nested record types referenced directly or through lists.
    pub fn nested_records(&self) -> Vec<RecordRef> {
        let mut out: Vec<RecordRef> = Vec::new();
        for property in &self.properties {
            let record = property
                .ty
                .record_ref()
                .or_else(|| property.ty.array_item_type().and_then(TypeDescriptor::record_ref));
            if let Some(record) = record {
                if !out.contains(record) {
                    out.push(*record);
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn untyped_array_defaults_to_any() {
        let ty = TypeDescriptor::array(None);
        assert_eq!(ty.array_item_type().map(TypeDescriptor::tag), Some(TypeTag::Any));
    }

    #[test]
    fn required_is_derived() {
        let mut p = PropertyMeta::new("age", TypeDescriptor::scalar(TypeTag::Int));
        assert!(p.is_required());
        p.default = Some(json!(18));
        assert!(!p.is_required());
        let n = PropertyMeta::new("nick", TypeDescriptor::scalar(TypeTag::String).nullable());
        assert!(!n.is_required());
    }

    #[test]
    fn element_drops_list_level_declarations() {
        let mut p = PropertyMeta::new(
            "tags",
            TypeDescriptor::array(Some(TypeDescriptor::scalar(TypeTag::String))),
        );
        p.rules.push(ValidationRule::max_length(3));
        p.default = Some(json!([]));
        let element = p.element().unwrap();
        assert_eq!(element.ty.tag(), TypeTag::String);
        assert!(element.rules.is_empty());
        assert!(element.default.is_none());
    }

    #[test]
    fn descriptor_display() {
        let ty = TypeDescriptor::array(Some(TypeDescriptor::scalar(TypeTag::Int))).nullable();
        assert_eq!(ty.to_string(), "array<int>|null");
    }

    #[test]
    fn rule_ids() {
        assert_eq!(ValidationRule::between(1.0, 2.0).id(), "between");
        assert_eq!(ValidationRule::custom("slug", json!({})).id(), "slug");
    }
}
