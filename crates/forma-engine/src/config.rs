//! Engine configuration.
//!
//! Every key has a default, so an empty document (or an empty environment)
//! yields the default configuration. Load from YAML, JSON, or environment
//! variables, then pass to [`EngineBuilder::config`](crate::EngineBuilder::config).

use serde::{Deserialize, Serialize};

use forma_core::temporal::check_format;

/// Behaviour switches for the built-in casters, validators and transformers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Scalar caster accepts only exact JSON types (int to float widening
    /// is still allowed).
    pub strict_scalars: bool,
    /// `required` treats the empty string as missing.
    pub empty_string_is_missing: bool,
    /// strftime format written by the date/time transformer.
    pub date_format: String,
    /// strftime formats accepted by the date/time caster after RFC 3339.
    pub date_input_formats: Vec<String>,
    /// Maximum nesting of records inside records.
    pub max_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strict_scalars: false,
            empty_string_is_missing: true,
            date_format: "%Y-%m-%dT%H:%M:%S%:z".to_string(),
            date_input_formats: vec!["%Y-%m-%d %H:%M:%S".to_string(), "%Y-%m-%d".to_string()],
            max_depth: 64,
        }
    }
}

impl EngineConfig {
    /// Parse a YAML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] on malformed input or unknown keys, and
    /// [`ConfigError::Invalid`] when a value fails [`EngineConfig::validate`].
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON document.
    ///
    /// # Errors
    ///
    /// As [`EngineConfig::from_yaml_str`], with [`ConfigError::Json`].
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `FORMA_STRICT_SCALARS` (default: `false`)
    /// - `FORMA_EMPTY_STRING_IS_MISSING` (default: `true`)
    /// - `FORMA_DATE_FORMAT` (default: `%Y-%m-%dT%H:%M:%S%:z`)
    /// - `FORMA_MAX_DEPTH` (default: 64)
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for unparseable values.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`EngineConfig::from_env`], reading variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for unparseable values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(raw) = lookup("FORMA_STRICT_SCALARS") {
            config.strict_scalars = parse_flag("FORMA_STRICT_SCALARS", &raw)?;
        }
        if let Some(raw) = lookup("FORMA_EMPTY_STRING_IS_MISSING") {
            config.empty_string_is_missing = parse_flag("FORMA_EMPTY_STRING_IS_MISSING", &raw)?;
        }
        if let Some(raw) = lookup("FORMA_DATE_FORMAT") {
            config.date_format = raw;
        }
        if let Some(raw) = lookup("FORMA_MAX_DEPTH") {
            config.max_depth = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "FORMA_MAX_DEPTH".to_string(),
                reason: format!("'{raw}' is not a non-negative integer"),
            })?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::Invalid {
                key: "max_depth".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        check_format(&self.date_format).map_err(|reason| ConfigError::Invalid {
            key: "date_format".to_string(),
            reason,
        })?;
        for format in &self.date_input_formats {
            check_format(format).map_err(|reason| ConfigError::Invalid {
                key: "date_input_formats".to_string(),
                reason,
            })?;
        }
        Ok(())
    }
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key: key.to_string(),
            reason: format!("'{raw}' is not a boolean"),
        }),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn empty_yaml_is_default() {
        let config = EngineConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn yaml_overrides() {
        let config = EngineConfig::from_yaml_str("strict_scalars: true\nmax_depth: 8\n").unwrap();
        assert!(config.strict_scalars);
        assert_eq!(config.max_depth, 8);
        assert!(config.empty_string_is_missing);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            EngineConfig::from_yaml_str("strict: true"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn zero_depth_is_invalid() {
        let err = EngineConfig::from_json_str(r#"{"max_depth": 0}"#).unwrap_err();
        assert!(err.to_string().contains("max_depth"));
    }

    #[test]
    fn lookup_reads_variables() {
        let vars: HashMap<&str, &str> = [
            ("FORMA_STRICT_SCALARS", "yes"),
            ("FORMA_MAX_DEPTH", "3"),
            ("FORMA_DATE_FORMAT", "%Y-%m-%d"),
        ]
        .into_iter()
        .collect();
        let config = EngineConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert!(config.strict_scalars);
        assert_eq!(config.max_depth, 3);
        assert_eq!(config.date_format, "%Y-%m-%d");
    }

    #[test]
    fn lookup_rejects_bad_flag() {
        let err = EngineConfig::from_lookup(|k| {
            (k == "FORMA_EMPTY_STRING_IS_MISSING").then(|| "maybe".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn malformed_date_format_is_invalid() {
        let err = EngineConfig::from_lookup(|k| (k == "FORMA_DATE_FORMAT").then(|| "%Q".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("date_format"));
    }
}
