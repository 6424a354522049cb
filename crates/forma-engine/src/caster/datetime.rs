//! Date/time parsing.

use serde_json::Value;

use forma_core::temporal::{from_unix_float, from_unix_seconds, parse_datetime};
use forma_core::{CastError, Caster, Context, FieldValue, PropertyMeta};

pub const PRIORITY: i32 = 10;

/// Parses strings and Unix timestamps into `DateTime<FixedOffset>`.
#[derive(Debug, Clone)]
pub struct DateTimeCaster {
    input_formats: Vec<String>,
}

impl DateTimeCaster {
    /// `input_formats` are tried after RFC 3339.
    pub fn new(input_formats: Vec<String>) -> Self {
        Self { input_formats }
    }
}

impl Default for DateTimeCaster {
    fn default() -> Self {
        Self::new(crate::EngineConfig::default().date_input_formats)
    }
}

impl Caster for DateTimeCaster {
    fn name(&self) -> &str {
        "datetime"
    }

    fn supports(&self, property: &PropertyMeta, value: &Value) -> bool {
        property.ty.is_date_time() && (value.is_string() || value.is_number())
    }

    fn cast(&self, property: &PropertyMeta, value: &Value, _context: &Context) -> Result<FieldValue, CastError> {
        let parsed = match value {
            Value::String(s) => parse_datetime(s, &self.input_formats),
            Value::Number(n) => match n.as_i64() {
                Some(seconds) => from_unix_seconds(seconds),
                None => from_unix_float(n.as_f64().unwrap_or(f64::NAN)),
            },
            _ => return Err(CastError::unsupported(value, &property.ty)),
        };
        parsed
            .map(FieldValue::DateTime)
            .map_err(|reason| CastError::invalid(value, &property.ty, reason))
    }
}
