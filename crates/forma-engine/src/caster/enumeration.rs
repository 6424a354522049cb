//! Backed-enum lookup.

use serde_json::Value;

use forma_core::{CastError, Caster, Context, EnumValue, FieldValue, PropertyMeta};

pub const PRIORITY: i32 = 20;

/// Finds the enum case whose backing value equals the input.
///
/// Integer-backed cases also match their decimal string form (`"2"`), since
/// query strings and form posts carry everything as text.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnumCaster;

impl Caster for EnumCaster {
    fn name(&self) -> &str {
        "enum"
    }

    fn supports(&self, property: &PropertyMeta, value: &Value) -> bool {
        property.ty.is_enum() && !value.is_null()
    }

    fn cast(&self, property: &PropertyMeta, value: &Value, _context: &Context) -> Result<FieldValue, CastError> {
        let Some(enum_ref) = property.ty.enum_ref() else {
            return Err(CastError::unsupported(value, &property.ty));
        };
        let cases = enum_ref.cases();
        let numeric = value
            .as_str()
            .and_then(|s| s.trim().parse::<i64>().ok())
            .map(Value::from);

        let found = cases
            .iter()
            .find(|case| &case.value == value)
            .or_else(|| numeric.and_then(|n| cases.iter().find(|case| case.value == n)));

        match found {
            Some(case) => Ok(FieldValue::Enum(EnumValue {
                enum_name: enum_ref.name(),
                case: case.name,
                value: case.value.clone(),
            })),
            None => {
                let allowed: Vec<String> = cases.iter().map(|c| c.value.to_string()).collect();
                Err(CastError::invalid(
                    value,
                    &property.ty,
                    format!("expected one of [{}]", allowed.join(", ")),
                ))
            }
        }
    }
}
