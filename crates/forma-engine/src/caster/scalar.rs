//! String, int, float and bool coercion.

use serde_json::{Number, Value};

use forma_core::meta::TypeTag;
use forma_core::{CastError, Caster, Context, FieldValue, PropertyMeta};

pub const PRIORITY: i32 = 30;

/// Coerces JSON scalars to the declared scalar type.
///
/// Lenient mode (the default) converts between representations when the
/// conversion is lossless: `"42"` → 42, `3.0` → 3, `1` → true, `42` → `"42"`.
/// Strict mode accepts only the exact JSON type, except that integers are
/// always accepted for float fields. Arrays and objects are always rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalarCaster {
    strict: bool,
}

impl ScalarCaster {
    pub fn new(strict: bool) -> Self {
        Self { strict }
    }

    fn cast_string(&self, value: &Value) -> Result<FieldValue, CastError> {
        match value {
            Value::String(s) => Ok(FieldValue::String(s.clone())),
            Value::Number(n) if !self.strict => Ok(FieldValue::String(n.to_string())),
            Value::Bool(b) if !self.strict => Ok(FieldValue::String(b.to_string())),
            _ => Err(self.reject(value, "string")),
        }
    }

    fn cast_int(&self, value: &Value) -> Result<FieldValue, CastError> {
        match value {
            Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(FieldValue::Int(i)),
                None if !self.strict => integral(n)
                    .map(FieldValue::Int)
                    .ok_or_else(|| CastError::invalid(value, "int", "not a whole number in range")),
                None => Err(self.reject(value, "int")),
            },
            Value::String(s) if !self.strict => {
                let trimmed = s.trim();
                if let Ok(i) = trimmed.parse::<i64>() {
                    return Ok(FieldValue::Int(i));
                }
                trimmed
                    .parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .as_ref()
                    .and_then(integral)
                    .map(FieldValue::Int)
                    .ok_or_else(|| CastError::invalid(value, "int", "not an integer"))
            }
            _ => Err(self.reject(value, "int")),
        }
    }

    fn cast_float(&self, value: &Value) -> Result<FieldValue, CastError> {
        match value {
            Value::Number(n) => n
                .as_f64()
                .map(FieldValue::Float)
                .ok_or_else(|| CastError::invalid(value, "float", "not representable as f64")),
            Value::String(s) if !self.strict => match s.trim().parse::<f64>() {
                Ok(f) if f.is_finite() => Ok(FieldValue::Float(f)),
                _ => Err(CastError::invalid(value, "float", "not a finite number")),
            },
            _ => Err(self.reject(value, "float")),
        }
    }

    fn cast_bool(&self, value: &Value) -> Result<FieldValue, CastError> {
        match value {
            Value::Bool(b) => Ok(FieldValue::Bool(*b)),
            Value::Number(n) if !self.strict => match n.as_i64() {
                Some(0) => Ok(FieldValue::Bool(false)),
                Some(1) => Ok(FieldValue::Bool(true)),
                _ => Err(CastError::invalid(value, "bool", "only 0 and 1 are booleans")),
            },
            Value::String(s) if !self.strict => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(FieldValue::Bool(true)),
                "false" | "0" | "no" | "off" => Ok(FieldValue::Bool(false)),
                _ => Err(CastError::invalid(value, "bool", "not a boolean word")),
            },
            _ => Err(self.reject(value, "bool")),
        }
    }

    fn reject(&self, value: &Value, expected: &str) -> CastError {
        let reason = if self.strict {
            "strict scalars require the exact JSON type"
        } else {
            "no lossless conversion"
        };
        CastError::invalid(value, expected, reason)
    }
}

/// Whole-number floats that fit in i64.
fn integral(n: &Number) -> Option<i64> {
    let f = n.as_f64()?;
    (f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64).then_some(f as i64)
}

impl Caster for ScalarCaster {
    fn name(&self) -> &str {
        "scalar"
    }

    fn supports(&self, property: &PropertyMeta, value: &Value) -> bool {
        !value.is_null()
            && matches!(
                property.ty.tag(),
                TypeTag::String | TypeTag::Int | TypeTag::Float | TypeTag::Bool
            )
    }

    fn cast(&self, property: &PropertyMeta, value: &Value, _context: &Context) -> Result<FieldValue, CastError> {
        match property.ty.tag() {
            TypeTag::String => self.cast_string(value),
            TypeTag::Int => self.cast_int(value),
            TypeTag::Float => self.cast_float(value),
            TypeTag::Bool => self.cast_bool(value),
            _ => Err(CastError::unsupported(value, &property.ty)),
        }
    }
}
