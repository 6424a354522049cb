//! Per-call options passed through mapping, casting, validation and
//! normalization.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::naming::NamingStrategy;

/// Options for a single hydrate or normalize call.
///
/// Cheap to clone; the naming strategy is shared.
#[derive(Debug, Clone, Default)]
pub struct Context {
    naming: Option<Arc<dyn NamingStrategy>>,
    options: Map<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_naming(mut self, naming: impl NamingStrategy + 'static) -> Self {
        self.naming = Some(Arc::new(naming));
        self
    }

    pub fn with_shared_naming(mut self, naming: Arc<dyn NamingStrategy>) -> Self {
        self.naming = Some(naming);
        self
    }

    /// Free-form option read by custom casters, validators and transformers.
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn naming(&self) -> Option<&dyn NamingStrategy> {
        self.naming.as_deref()
    }

    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    pub fn options(&self) -> &Map<String, Value> {
        &self.options
    }
}
