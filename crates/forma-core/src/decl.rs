//! # Declarations
//!
//! Data-only description of a record type, returned by
//! [`Record::declare`](crate::Record::declare). A declaration is what the
//! author writes; the metadata factory resolves it into [`ClassMeta`]
//! (checking unions, rules and constructor parameters on the way).
//!
//! ```ignore
//! ClassDecl::new("User")
//!     .field(FieldDecl::new("name", TypeDecl::String).rule(ValidationRule::min_length(1)))
//!     .field(FieldDecl::new("email", TypeDecl::String).map_from("user_email"))
//!     .field(FieldDecl::new("tags", TypeDecl::list(TypeDecl::String)).default(json!([])))
//! ```
//!
//! [`ClassMeta`]: crate::meta::ClassMeta

use std::sync::Arc;

use serde_json::Value;

use crate::convert::{Caster, Transformer};
use crate::meta::{Attributes, ValidationRule};
use crate::record::{BackedEnum, EnumRef, Record, RecordRef};

/// Declared type of a field, before resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDecl {
    String,
    Int,
    Float,
    Bool,
    /// JSON object.
    Object,
    /// Anything, including null.
    Any,
    DateTime,
    List(Box<TypeDecl>),
    /// List of anything.
    UntypedList,
    Enum(EnumRef),
    Record(RecordRef),
    Optional(Box<TypeDecl>),
    Union(Vec<TypeDecl>),
    Null,
}

impl TypeDecl {
    pub fn list(item: TypeDecl) -> Self {
        Self::List(Box::new(item))
    }

    pub fn optional(inner: TypeDecl) -> Self {
        Self::Optional(Box::new(inner))
    }

    pub fn record<T: Record>() -> Self {
        Self::Record(RecordRef::of::<T>())
    }

    pub fn enumeration<E: BackedEnum>() -> Self {
        Self::Enum(EnumRef::of::<E>())
    }

    pub fn union(members: impl IntoIterator<Item = TypeDecl>) -> Self {
        Self::Union(members.into_iter().collect())
    }

    /// Human-readable rendering for error messages.
    pub fn describe(&self) -> String {
        match self {
            Self::String => "string".into(),
            Self::Int => "int".into(),
            Self::Float => "float".into(),
            Self::Bool => "bool".into(),
            Self::Object => "object".into(),
            Self::Any => "any".into(),
            Self::DateTime => "datetime".into(),
            Self::List(item) => format!("list<{}>", item.describe()),
            Self::UntypedList => "list".into(),
            Self::Enum(e) => e.name().into(),
            Self::Record(r) => r.name().into(),
            Self::Optional(inner) => format!("?{}", inner.describe()),
            Self::Union(members) => members
                .iter()
                .map(TypeDecl::describe)
                .collect::<Vec<_>>()
                .join("|"),
            Self::Null => "null".into(),
        }
    }
}

/// Declaration of one field.
#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeDecl,
    pub readonly: bool,
    pub default: Option<Value>,
    pub map_from: Option<String>,
    pub map_to: Option<String>,
    pub caster: Option<Arc<dyn Caster>>,
    pub transformer: Option<Arc<dyn Transformer>>,
    pub hidden: bool,
    pub rules: Vec<ValidationRule>,
    pub attributes: Attributes,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, ty: TypeDecl) -> Self {
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

    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    /// Raw default, cast like any input value when used.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Explicit source key. Dotted keys walk nested objects.
    pub fn map_from(mut self, key: impl Into<String>) -> Self {
        self.map_from = Some(key.into());
        self
    }

    /// Explicit output key.
    pub fn map_to(mut self, key: impl Into<String>) -> Self {
        self.map_to = Some(key.into());
        self
    }

    pub fn cast_with(mut self, caster: impl Caster + 'static) -> Self {
        self.caster = Some(Arc::new(caster));
        self
    }

    pub fn transform_with(mut self, transformer: impl Transformer + 'static) -> Self {
        self.transformer = Some(Arc::new(transformer));
        self
    }

    /// Exclude from normalized output.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn rule(mut self, rule: ValidationRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Declaration of a record type.
#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub name: String,
    pub readonly: bool,
    pub fields: Vec<FieldDecl>,
    /// Constructor parameter order; defaults to field order.
    pub constructor: Option<Vec<String>>,
    pub attributes: Attributes,
}

impl ClassDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            readonly: false,
            fields: Vec::new(),
            constructor: None,
            attributes: Attributes::new(),
        }
    }

    /// Every field is read-only.
    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    pub fn field(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }

    pub fn constructor<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.constructor = Some(params.into_iter().map(Into::into).collect());
        self
    }

    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}
