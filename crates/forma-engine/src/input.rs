//! # Input Normalizers
//!
//! Hydration starts from a plain JSON object. Callers may hand the engine
//! a map, a JSON value, JSON text, a previously normalized [`FieldMap`], or
//! any `Serialize` value; the registered input normalizers are scanned in
//! priority order and the first one that supports the [`Source`] reads it.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use forma_core::{FieldMap, HydrationError, Result};

pub const BUILTIN_PRIORITY: i32 = 0;

/// Raw input handed to `Engine::hydrate`.
#[derive(Debug)]
pub enum Source {
    Map(Map<String, Value>),
    Value(Value),
    Text(String),
    Fields(FieldMap),
    /// A `Serialize` value, already converted.
    Object(serde_json::Result<Value>),
}

impl Source {
    /// Capture any `Serialize` value.
    pub fn object<T: Serialize + ?Sized>(value: &T) -> Self {
        Self::Object(serde_json::to_value(value))
    }

    /// Short description for error messages.
    pub fn shape(&self) -> String {
        match self {
            Self::Map(_) => "map".to_string(),
            Self::Value(v) => format!("JSON {}", forma_core::error::json_kind(v)),
            Self::Text(_) => "text".to_string(),
            Self::Fields(_) => "field map".to_string(),
            Self::Object(Ok(v)) => format!("object serialized as {}", forma_core::error::json_kind(v)),
            Self::Object(Err(_)) => "unserializable object".to_string(),
        }
    }
}

impl From<Map<String, Value>> for Source {
    fn from(map: Map<String, Value>) -> Self {
        Self::Map(map)
    }
}

impl From<Value> for Source {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for Source {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Source {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<FieldMap> for Source {
    fn from(fields: FieldMap) -> Self {
        Self::Fields(fields)
    }
}

/// Turns one kind of [`Source`] into a plain map.
pub trait InputNormalizer: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn supports(&self, source: &Source) -> bool;

    /// # Errors
    ///
    /// Decode failures of a supported source.
    fn read(&self, source: Source) -> Result<Map<String, Value>>;
}

/// Maps and JSON object values, passed through.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapInput;

impl InputNormalizer for MapInput {
    fn name(&self) -> &str {
        "map"
    }

    fn supports(&self, source: &Source) -> bool {
        matches!(source, Source::Map(_) | Source::Value(Value::Object(_)))
    }

    fn read(&self, source: Source) -> Result<Map<String, Value>> {
        match source {
            Source::Map(map) | Source::Value(Value::Object(map)) => Ok(map),
            other => Err(unsupported(&other)),
        }
    }
}

/// JSON text whose top level is an object.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonTextInput;

impl InputNormalizer for JsonTextInput {
    fn name(&self) -> &str {
        "json_text"
    }

    fn supports(&self, source: &Source) -> bool {
        matches!(source, Source::Text(text) if text.trim_start().starts_with('{'))
    }

    fn read(&self, source: Source) -> Result<Map<String, Value>> {
        match source {
            Source::Text(text) => serde_json::from_str(&text)
                .map_err(|source| HydrationError::Decode { source }.into()),
            other => Err(unsupported(&other)),
        }
    }
}

/// Normalized output fed back in.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldMapInput;

impl InputNormalizer for FieldMapInput {
    fn name(&self) -> &str {
        "field_map"
    }

    fn supports(&self, source: &Source) -> bool {
        matches!(source, Source::Fields(_))
    }

    fn read(&self, source: Source) -> Result<Map<String, Value>> {
        match source {
            Source::Fields(fields) => Ok(fields.to_json()?),
            other => Err(unsupported(&other)),
        }
    }
}

/// Any `Serialize` value that serializes to an object.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectInput;

impl InputNormalizer for ObjectInput {
    fn name(&self) -> &str {
        "object"
    }

    fn supports(&self, source: &Source) -> bool {
        matches!(source, Source::Object(Ok(Value::Object(_))) | Source::Object(Err(_)))
    }

    fn read(&self, source: Source) -> Result<Map<String, Value>> {
        match source {
            Source::Object(Ok(Value::Object(map))) => Ok(map),
            Source::Object(Err(source)) => Err(HydrationError::Decode { source }.into()),
            other => Err(unsupported(&other)),
        }
    }
}

pub(crate) fn unsupported(source: &Source) -> forma_core::Error {
    HydrationError::UnsupportedInput {
        shape: source.shape(),
    }
    .into()
}
