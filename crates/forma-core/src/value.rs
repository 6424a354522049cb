//! # Typed Field Values
//!
//! [`FieldValue`] is the in-between representation the engine works with:
//! richer than JSON (it knows dates, enum cases and nested records) but
//! free of any concrete Rust record type. Casting produces field values
//! from raw input, records are constructed from them, and normalization
//! turns records back into them before encoding.
//!
//! [`FieldMap`] keeps insertion order so normalized output follows the
//! declared property order.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use serde_json::{Map, Number, Value};

use crate::error::HydrationError;
use crate::path::FieldPath;
use crate::record::{BackedEnum, Record, RecordRef};

/// A typed value held by a record field.
#[derive(Debug, Clone)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    DateTime(DateTime<FixedOffset>),
    Enum(EnumValue),
    List(Vec<FieldValue>),
    Map(FieldMap),
    Record(RecordValue),
    /// Untyped data for `Any`/`Object` fields.
    Json(Value),
    /// Output of a user-supplied caster.
    Custom(CustomValue),
}

impl FieldValue {
    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::DateTime(_) => "datetime",
            Self::Enum(_) => "enum",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Record(_) => "record",
            Self::Json(_) => "json",
            Self::Custom(_) => "custom",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null | Self::Json(Value::Null))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::Json(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Json(v) => v.as_i64(),
            _ => None,
        }
    }

    /// Numeric view of ints and floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Json(v) => v.as_f64(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Json(Value::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<&DateTime<FixedOffset>> {
        match self {
            Self::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    /// Wrap a record instance for normalization.
    pub fn record<T: Record>(value: &T) -> Self {
        Self::Record(RecordValue {
            record: RecordRef::of::<T>(),
            fields: value.to_fields(),
        })
    }

    /// Wrap a list of record instances.
    pub fn records<T: Record>(values: &[T]) -> Self {
        Self::List(values.iter().map(Self::record).collect())
    }

    pub fn optional_record<T: Record>(value: Option<&T>) -> Self {
        value.map(Self::record).unwrap_or(Self::Null)
    }

    /// Wrap a backed enum case.
    ///
    /// A case missing from [`BackedEnum::cases`] is backed by its own name.
    pub fn enumeration<E: BackedEnum>(value: &E) -> Self {
        let case = value.case_name();
        let backing = E::cases()
            .into_iter()
            .find(|c| c.name == case)
            .map(|c| c.value)
            .unwrap_or_else(|| Value::String(case.to_string()));
        Self::Enum(EnumValue {
            enum_name: E::NAME,
            case,
            value: backing,
        })
    }

    pub fn optional_enumeration<E: BackedEnum>(value: Option<&E>) -> Self {
        value.map(Self::enumeration).unwrap_or(Self::Null)
    }

    /// Wrap a value for a custom transformer to pick up.
    pub fn custom<T: Any + Send + Sync>(value: T) -> Self {
        Self::Custom(CustomValue::new(value))
    }

    /// Lift plain JSON into typed values, recursively.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from_json).collect()),
            Value::Object(map) => Self::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Encode as plain JSON.
    ///
    /// # Errors
    ///
    /// Fails for values that have no plain representation: dates, enum
    /// cases, records and custom values that were not transformed, and
    /// non-finite floats.
    pub fn to_json(&self) -> Result<Value, HydrationError> {
        match self {
            Self::Null => Ok(Value::Null),
            Self::Bool(b) => Ok(Value::Bool(*b)),
            Self::Int(i) => Ok(Value::from(*i)),
            Self::Float(f) => Number::from_f64(*f).map(Value::Number).ok_or_else(|| {
                unencodable(format!("float {f} has no JSON representation"))
            }),
            Self::String(s) => Ok(Value::String(s.clone())),
            Self::Json(v) => Ok(v.clone()),
            Self::List(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| item.to_json().map_err(|e| e.at(i)))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Self::Map(map) => map.to_json().map(Value::Object),
            Self::DateTime(_) | Self::Enum(_) | Self::Record(_) | Self::Custom(_) => Err(
                unencodable(format!("{} value was not transformed to plain data", self.kind())),
            ),
        }
    }
}

fn unencodable(reason: String) -> HydrationError {
    HydrationError::Encode {
        path: FieldPath::root(),
        reason,
        source: None,
    }
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::DateTime(a), Self::DateTime(b)) => a == b,
            (Self::Enum(a), Self::Enum(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Record(a), Self::Record(b)) => a == b,
            (Self::Json(a), Self::Json(b)) => a == b,
            (Self::Custom(a), Self::Custom(b)) => a.same(b),
            _ => false,
        }
    }
}

/// A backed enum case.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumValue {
    pub enum_name: &'static str,
    pub case: &'static str,
    /// The plain backing value.
    pub value: Value,
}

/// Field values of a nested record.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordValue {
    pub record: RecordRef,
    pub fields: FieldMap,
}

/// Opaque value produced by a user caster.
#[derive(Clone)]
pub struct CustomValue {
    type_name: &'static str,
    inner: Arc<dyn Any + Send + Sync>,
}

impl CustomValue {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            inner: Arc::new(value),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    fn same(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for CustomValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CustomValue({})", self.type_name)
    }
}

/// Ordered name-to-value map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap(Vec<(String, FieldValue)>);

impl FieldMap {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Builder form of [`FieldMap::insert`].
    pub fn with(mut self, name: impl Into<String>, value: impl IntoFieldValue) -> Self {
        self.insert(name, value.into_field_value());
        self
    }

    /// Insert or replace, keeping the original position on replace.
    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        let name = name.into();
        match self.0.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Remove and return a value.
    pub fn take(&mut self, name: &str) -> Option<FieldValue> {
        let index = self.0.iter().position(|(k, _)| k == name)?;
        Some(self.0.remove(index).1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|(k, _)| k == name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Encode as a plain JSON object, keeping order.
    ///
    /// # Errors
    ///
    /// See [`FieldValue::to_json`]; the error path names the failing key.
    pub fn to_json(&self) -> Result<Map<String, Value>, HydrationError> {
        let mut out = Map::new();
        for (name, value) in &self.0 {
            out.insert(name.clone(), value.to_json().map_err(|e| e.at(name))?);
        }
        Ok(out)
    }
}

impl FromIterator<(String, FieldValue)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl IntoIterator for FieldMap {
    type Item = (String, FieldValue);
    type IntoIter = std::vec::IntoIter<(String, FieldValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Conversion into a [`FieldValue`], used by `Record::to_fields`.
pub trait IntoFieldValue {
    fn into_field_value(self) -> FieldValue;
}

impl IntoFieldValue for FieldValue {
    fn into_field_value(self) -> FieldValue {
        self
    }
}

impl IntoFieldValue for String {
    fn into_field_value(self) -> FieldValue {
        FieldValue::String(self)
    }
}

impl IntoFieldValue for &str {
    fn into_field_value(self) -> FieldValue {
        FieldValue::String(self.to_string())
    }
}

impl IntoFieldValue for &String {
    fn into_field_value(self) -> FieldValue {
        FieldValue::String(self.clone())
    }
}

impl IntoFieldValue for i64 {
    fn into_field_value(self) -> FieldValue {
        FieldValue::Int(self)
    }
}

impl IntoFieldValue for i32 {
    fn into_field_value(self) -> FieldValue {
        FieldValue::Int(i64::from(self))
    }
}

impl IntoFieldValue for u32 {
    fn into_field_value(self) -> FieldValue {
        FieldValue::Int(i64::from(self))
    }
}

impl IntoFieldValue for f64 {
    fn into_field_value(self) -> FieldValue {
        FieldValue::Float(self)
    }
}

impl IntoFieldValue for bool {
    fn into_field_value(self) -> FieldValue {
        FieldValue::Bool(self)
    }
}

impl IntoFieldValue for DateTime<FixedOffset> {
    fn into_field_value(self) -> FieldValue {
        FieldValue::DateTime(self)
    }
}

impl IntoFieldValue for DateTime<Utc> {
    fn into_field_value(self) -> FieldValue {
        FieldValue::DateTime(self.fixed_offset())
    }
}

impl IntoFieldValue for Value {
    fn into_field_value(self) -> FieldValue {
        FieldValue::Json(self)
    }
}

impl<T: IntoFieldValue> IntoFieldValue for Option<T> {
    fn into_field_value(self) -> FieldValue {
        match self {
            Some(v) => v.into_field_value(),
            None => FieldValue::Null,
        }
    }
}

impl<T: IntoFieldValue> IntoFieldValue for Vec<T> {
    fn into_field_value(self) -> FieldValue {
        FieldValue::List(self.into_iter().map(IntoFieldValue::into_field_value).collect())
    }
}

/// Conversion out of a [`FieldValue`], used by `Arguments::take`.
pub trait FromFieldValue: Sized {
    /// # Errors
    ///
    /// Returns a short reason when the value has the wrong shape.
    fn from_field_value(value: FieldValue) -> Result<Self, String>;
}

fn expected(what: &str, found: &FieldValue) -> String {
    format!("expected {what}, found {}", found.kind())
}

impl FromFieldValue for FieldValue {
    fn from_field_value(value: FieldValue) -> Result<Self, String> {
        Ok(value)
    }
}

impl FromFieldValue for String {
    fn from_field_value(value: FieldValue) -> Result<Self, String> {
        match value {
            FieldValue::String(s) | FieldValue::Json(Value::String(s)) => Ok(s),
            other => Err(expected("string", &other)),
        }
    }
}

impl FromFieldValue for i64 {
    fn from_field_value(value: FieldValue) -> Result<Self, String> {
        value.as_i64().ok_or_else(|| expected("int", &value))
    }
}

impl FromFieldValue for i32 {
    fn from_field_value(value: FieldValue) -> Result<Self, String> {
        let i = i64::from_field_value(value)?;
        i32::try_from(i).map_err(|_| format!("{i} is out of range for i32"))
    }
}

impl FromFieldValue for u32 {
    fn from_field_value(value: FieldValue) -> Result<Self, String> {
        let i = i64::from_field_value(value)?;
        u32::try_from(i).map_err(|_| format!("{i} is out of range for u32"))
    }
}

impl FromFieldValue for u64 {
    fn from_field_value(value: FieldValue) -> Result<Self, String> {
        let i = i64::from_field_value(value)?;
        u64::try_from(i).map_err(|_| format!("{i} is out of range for u64"))
    }
}

impl FromFieldValue for f64 {
    fn from_field_value(value: FieldValue) -> Result<Self, String> {
        value.as_f64().ok_or_else(|| expected("float", &value))
    }
}

impl FromFieldValue for bool {
    fn from_field_value(value: FieldValue) -> Result<Self, String> {
        value.as_bool().ok_or_else(|| expected("bool", &value))
    }
}

impl FromFieldValue for DateTime<FixedOffset> {
    fn from_field_value(value: FieldValue) -> Result<Self, String> {
        match value {
            FieldValue::DateTime(dt) => Ok(dt),
            other => Err(expected("datetime", &other)),
        }
    }
}

impl FromFieldValue for DateTime<Utc> {
    fn from_field_value(value: FieldValue) -> Result<Self, String> {
        DateTime::<FixedOffset>::from_field_value(value).map(|dt| dt.with_timezone(&Utc))
    }
}

impl FromFieldValue for Value {
    fn from_field_value(value: FieldValue) -> Result<Self, String> {
        match value {
            FieldValue::Json(v) => Ok(v),
            other => other.to_json().map_err(|e| e.to_string()),
        }
    }
}

impl<T: FromFieldValue> FromFieldValue for Option<T> {
    fn from_field_value(value: FieldValue) -> Result<Self, String> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_field_value(value).map(Some)
        }
    }
}

impl<T: FromFieldValue> FromFieldValue for Vec<T> {
    fn from_field_value(value: FieldValue) -> Result<Self, String> {
        match value {
            FieldValue::List(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| T::from_field_value(item).map_err(|e| format!("item {i}: {e}")))
                .collect(),
            FieldValue::Json(Value::Array(items)) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| {
                    T::from_field_value(FieldValue::from_json(item))
                        .map_err(|e| format!("item {i}: {e}"))
                })
                .collect(),
            other => Err(expected("list", &other)),
        }
    }
}
