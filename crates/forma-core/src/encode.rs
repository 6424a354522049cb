//! # Text Encoding
//!
//! Encodes normalized output as JSON text in one of three layouts:
//!
//! - compact (default): declared key order, no whitespace;
//! - pretty: declared key order, indented;
//! - canonical: RFC 8785 (JCS) via `serde_jcs`, keys sorted, compact.
//!
//! Canonical output is byte-for-byte stable for equal data, which makes
//! it the layout to hash or compare. `canonical` takes precedence over
//! `pretty` when both are set.

use serde_json::{Map, Value};

use crate::error::HydrationError;
use crate::path::FieldPath;

/// Text layout options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextOptions {
    pub pretty: bool,
    pub canonical: bool,
}

impl TextOptions {
    pub fn compact() -> Self {
        Self::default()
    }

    pub fn pretty() -> Self {
        Self {
            pretty: true,
            canonical: false,
        }
    }

    pub fn canonical() -> Self {
        Self {
            pretty: false,
            canonical: true,
        }
    }
}

/// Encode a normalized map as text.
///
/// # Errors
///
/// Returns [`HydrationError::Encode`] wrapping the serializer error.
pub fn encode_text(map: &Map<String, Value>, options: TextOptions) -> Result<String, HydrationError> {
    let result = if options.canonical {
        serde_jcs::to_string(map)
    } else if options.pretty {
        serde_json::to_string_pretty(map)
    } else {
        serde_json::to_string(map)
    };
    result.map_err(|source| HydrationError::Encode {
        path: FieldPath::root(),
        reason: source.to_string(),
        source: Some(source),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Map<String, Value> {
        match json!({"b": 2, "a": {"d": true, "c": null}}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn compact_keeps_declared_order() {
        let text = encode_text(&sample(), TextOptions::compact()).unwrap();
        assert_eq!(text, r#"{"b":2,"a":{"d":true,"c":null}}"#);
    }

    #[test]
    fn canonical_sorts_keys() {
        let text = encode_text(&sample(), TextOptions::canonical()).unwrap();
        assert_eq!(text, r#"{"a":{"c":null,"d":true},"b":2}"#);
    }

    #[test]
    fn pretty_is_indented() {
        let text = encode_text(&sample(), TextOptions::pretty()).unwrap();
        assert!(text.contains("\n  \"b\": 2"));
    }
}
