//! # Records, Enums and Lifecycle Capabilities
//!
//! A record is any Rust type the engine can hydrate from plain data and
//! normalize back. It declares its shape once, as data ([`ClassDecl`]),
//! and converts itself to and from typed field values. The engine never
//! looks at the declaration again after the first metadata build.
//!
//! Lifecycle hooks are opt-in capabilities. A record that wants one
//! implements the capability trait and registers it in [`Record::hooks`]:
//!
//! ```ignore
//! impl PostHydrate for Order {
//!     fn post_hydrate(&mut self) { self.total = self.lines.iter().map(|l| l.amount).sum(); }
//! }
//!
//! impl Record for Order {
//!     fn hooks() -> Hooks<Self> {
//!         Hooks::none().with_post_hydrate()
//!     }
//!     // ...
//! }
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

use serde_json::{Map, Value};

use crate::decl::ClassDecl;
use crate::error::{Error, HydrationError, Result};
use crate::path::FieldPath;
use crate::value::{EnumValue, FieldMap, FieldValue, FromFieldValue};

/// A type the engine can hydrate and normalize.
pub trait Record: Clone + Send + Sync + 'static {
    /// The declared shape, read once per process by the metadata factory.
    fn declare() -> ClassDecl;

    /// Build an instance from cast, validated values.
    ///
    /// `args` holds one entry per constructor parameter, in order.
    fn construct(args: &mut Arguments) -> Result<Self>;

    /// Typed values of every declared field.
    fn to_fields(&self) -> FieldMap;

    /// Lifecycle capabilities this record opts into.
    fn hooks() -> Hooks<Self> {
        Hooks::none()
    }
}

/// Static transform applied to the raw input map before hydration.
pub trait PreHydrate {
    fn pre_hydrate(raw: Map<String, Value>) -> Map<String, Value>;
}

/// Called on the instance right after hydration.
pub trait PostHydrate {
    fn post_hydrate(&mut self);
}

/// Called on a copy of the instance right before normalization.
pub trait PreSerialize {
    fn pre_serialize(&mut self);
}

/// Registered lifecycle capabilities of a record type.
pub struct Hooks<T> {
    pre_hydrate: Option<fn(Map<String, Value>) -> Map<String, Value>>,
    post_hydrate: Option<fn(&mut T)>,
    pre_serialize: Option<fn(&mut T)>,
}

impl<T> Hooks<T> {
    /// No capabilities.
    pub fn none() -> Self {
        Self {
            pre_hydrate: None,
            post_hydrate: None,
            pre_serialize: None,
        }
    }

    pub fn with_pre_hydrate(mut self) -> Self
    where
        T: PreHydrate,
    {
        self.pre_hydrate = Some(<T as PreHydrate>::pre_hydrate);
        self
    }

    pub fn with_post_hydrate(mut self) -> Self
    where
        T: PostHydrate,
    {
        self.post_hydrate = Some(<T as PostHydrate>::post_hydrate);
        self
    }

    pub fn with_pre_serialize(mut self) -> Self
    where
        T: PreSerialize,
    {
        self.pre_serialize = Some(<T as PreSerialize>::pre_serialize);
        self
    }

    pub fn pre_hydrate(&self) -> Option<fn(Map<String, Value>) -> Map<String, Value>> {
        self.pre_hydrate
    }

    pub fn post_hydrate(&self) -> Option<fn(&mut T)> {
        self.post_hydrate
    }

    pub fn pre_serialize(&self) -> Option<fn(&mut T)> {
        self.pre_serialize
    }
}

impl<T> Default for Hooks<T> {
    fn default() -> Self {
        Self::none()
    }
}

/// Identity-based reference to a record type.
///
/// Two references are equal when they point at the same Rust type.
#[derive(Clone, Copy)]
pub struct RecordRef {
    id: TypeId,
    name: &'static str,
    declare: fn() -> ClassDecl,
}

impl RecordRef {
    pub fn of<T: Record>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: short_type_name(std::any::type_name::<T>()),
            declare: T::declare,
        }
    }

    /// Type identity, the metadata cache key.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Unqualified Rust type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Read the declaration.
    pub fn declare(&self) -> ClassDecl {
        (self.declare)()
    }
}

impl PartialEq for RecordRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for RecordRef {}

impl Hash for RecordRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordRef({})", self.name)
    }
}

/// One case of a backed enum: its name and the plain value it stands for.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumCase {
    pub name: &'static str,
    pub value: Value,
}

impl EnumCase {
    pub fn new(name: &'static str, value: impl Into<Value>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }
}

/// An enum whose cases are backed by plain string or integer values.
pub trait BackedEnum: Sized + Send + Sync + 'static {
    /// Name used in metadata and error messages.
    const NAME: &'static str;

    /// Every case, in declaration order.
    fn cases() -> Vec<EnumCase>;

    fn case_name(&self) -> &'static str;

    fn from_case_name(name: &str) -> Option<Self>;
}

/// Identity-based reference to a backed enum type.
#[derive(Clone, Copy)]
pub struct EnumRef {
    id: TypeId,
    name: &'static str,
    cases: fn() -> Vec<EnumCase>,
}

impl EnumRef {
    pub fn of<E: BackedEnum>() -> Self {
        Self {
            id: TypeId::of::<E>(),
            name: E::NAME,
            cases: E::cases,
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn cases(&self) -> Vec<EnumCase> {
        (self.cases)()
    }

    /// The case backed by `value`, compared as plain JSON.
    pub fn case_for(&self, value: &Value) -> Option<EnumCase> {
        self.cases().into_iter().find(|case| &case.value == value)
    }
}

impl PartialEq for EnumRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EnumRef {}

impl fmt::Debug for EnumRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EnumRef({})", self.name)
    }
}

/// Cast, validated values handed to [`Record::construct`].
#[derive(Debug)]
pub struct Arguments {
    record: String,
    fields: FieldMap,
}

impl Arguments {
    pub fn new(record: impl Into<String>, fields: FieldMap) -> Self {
        Self {
            record: record.into(),
            fields,
        }
    }

    /// Name of the record being constructed.
    pub fn record(&self) -> &str {
        &self.record
    }

    /// Take a value and convert it with [`FromFieldValue`].
    pub fn take<T: FromFieldValue>(&mut self, name: &str) -> Result<T> {
        let value = self.take_raw(name)?;
        T::from_field_value(value).map_err(|reason| self.mismatch(name, reason))
    }

    /// Take the untouched [`FieldValue`].
    pub fn take_raw(&mut self, name: &str) -> Result<FieldValue> {
        self.fields.take(name).ok_or_else(|| {
            self.mismatch(name, format!("no argument named '{name}'"))
        })
    }

    /// Take a nested record.
    pub fn record_value<R: Record>(&mut self, name: &str) -> Result<R> {
        let value = self.take_raw(name)?;
        construct_from(value).map_err(|e| e.at(name))
    }

    /// Take a nullable nested record.
    pub fn optional_record<R: Record>(&mut self, name: &str) -> Result<Option<R>> {
        match self.take_raw(name)? {
            FieldValue::Null => Ok(None),
            value => construct_from(value).map(Some).map_err(|e| e.at(name)),
        }
    }

    /// Take a list of nested records.
    pub fn records<R: Record>(&mut self, name: &str) -> Result<Vec<R>> {
        match self.take_raw(name)? {
            FieldValue::List(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| construct_from(item).map_err(|e| e.at(i).at(name)))
                .collect(),
            other => Err(self.mismatch(name, format!("expected list, found {}", other.kind()))),
        }
    }

    /// Take a backed enum case.
    pub fn enumeration<E: BackedEnum>(&mut self, name: &str) -> Result<E> {
        let value = self.take_raw(name)?;
        enum_from(value).map_err(|reason| self.mismatch(name, reason))
    }

    /// Take a nullable backed enum case.
    pub fn optional_enumeration<E: BackedEnum>(&mut self, name: &str) -> Result<Option<E>> {
        match self.take_raw(name)? {
            FieldValue::Null => Ok(None),
            value => enum_from(value)
                .map(Some)
                .map_err(|reason| self.mismatch(name, reason)),
        }
    }

    /// Take a value produced by a custom caster.
    pub fn custom<T: Any + Clone>(&mut self, name: &str) -> Result<T> {
        match self.take_raw(name)? {
            FieldValue::Custom(custom) => custom.downcast_ref::<T>().cloned().ok_or_else(|| {
                self.mismatch(
                    name,
                    format!("custom value is a {}, not the requested type", custom.type_name()),
                )
            }),
            other => Err(self.mismatch(name, format!("expected custom value, found {}", other.kind()))),
        }
    }

    fn mismatch(&self, name: &str, reason: String) -> Error {
        HydrationError::Construction {
            path: FieldPath::field(name),
            record: self.record.clone(),
            reason,
        }
        .into()
    }
}

fn construct_from<R: Record>(value: FieldValue) -> Result<R> {
    match value {
        FieldValue::Record(record) if record.record == RecordRef::of::<R>() => {
            R::construct(&mut Arguments::new(record.record.name(), record.fields))
        }
        other => Err(HydrationError::Construction {
            path: FieldPath::root(),
            record: RecordRef::of::<R>().name().to_string(),
            reason: format!("expected {} record, found {}", RecordRef::of::<R>().name(), other.kind()),
        }
        .into()),
    }
}

fn enum_from<E: BackedEnum>(value: FieldValue) -> std::result::Result<E, String> {
    match value {
        FieldValue::Enum(EnumValue { enum_name, case, .. }) if enum_name == E::NAME => {
            E::from_case_name(case).ok_or_else(|| format!("{} has no case '{case}'", E::NAME))
        }
        other => Err(format!("expected {} case, found {}", E::NAME, other.kind())),
    }
}

/// Strip the module path from `std::any::type_name` output.
fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    match base.rfind("::") {
        Some(i) => &full[i + 2..],
        None => full,
    }
}
