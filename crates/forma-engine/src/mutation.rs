//! # Guarded Mutation
//!
//! Records are plain Rust values, so nothing stops a caller from assigning
//! a field directly. Writes that go through [`Engine::set`] or
//! [`Engine::update`] are checked against the record's metadata first:
//!
//! - undeclared fields fail with [`HydrationError::UnknownField`];
//! - read-only fields, or any field of a read-only record, fail with
//!   [`HydrationError::ReadonlyField`];
//! - values are cast and validated exactly like hydration input, with the
//!   record's current values filling in the fields not being written, so a
//!   `required_if` sees the state the write would leave behind.
//!
//! An update is all-or-nothing: the changes are applied to a copy, and the
//! caller's instance is replaced only when every field was written.

use serde_json::{Map, Value};

use forma_core::{Arguments, Context, HydrationError, Record, RecordRef, Result};

use crate::engine::Engine;

/// A record whose fields can be written one at a time.
pub trait MutableRecord: Record {
    /// Store the cast value of `name`, taken from `args` the same way
    /// [`Record::construct`] takes it.
    ///
    /// Only declared, writable fields are ever passed.
    fn set_field(&mut self, name: &str, args: &mut Arguments) -> Result<()>;
}

impl Engine {
    /// Write one field.
    ///
    /// # Errors
    ///
    /// See [`Engine::update_with`].
    pub fn set<T: MutableRecord>(&self, record: &mut T, field: &str, value: impl Into<Value>) -> Result<()> {
        let mut changes = Map::new();
        changes.insert(field.to_string(), value.into());
        self.update_with(record, changes, &Context::default())
    }

    /// Write several fields with a default context.
    ///
    /// # Errors
    ///
    /// See [`Engine::update_with`].
    pub fn update<T: MutableRecord>(
        &self,
        record: &mut T,
        changes: impl IntoIterator<Item = (String, Value)>,
    ) -> Result<()> {
        self.update_with(record, changes, &Context::default())
    }

    /// Write several fields keyed by field name. A repeated key keeps its
    /// last value.
    ///
    /// # Errors
    ///
    /// - [`HydrationError::UnknownField`] or
    ///   [`HydrationError::ReadonlyField`] for the first guarded key;
    /// - cast and validation errors of the new values, including
    ///   `required_if` rules broken by the combined state;
    /// - whatever [`MutableRecord::set_field`] returns.
    ///
    /// On error `record` is unchanged.
    pub fn update_with<T: MutableRecord>(
        &self,
        record: &mut T,
        changes: impl IntoIterator<Item = (String, Value)>,
        context: &Context,
    ) -> Result<()> {
        let changes: Map<String, Value> = changes.into_iter().collect();
        let meta = self.metadata::<T>()?;
        for name in changes.keys() {
            let property = meta.property(name).ok_or_else(|| HydrationError::UnknownField {
                record: meta.type_name.clone(),
                field: name.clone(),
            })?;
            if meta.readonly || property.readonly {
                tracing::debug!(
                    record = RecordRef::of::<T>().name(),
                    field = %name,
                    "rejected write to read-only field"
                );
                return Err(HydrationError::ReadonlyField {
                    record: meta.type_name.clone(),
                    field: name.clone(),
                }
                .into());
            }
        }

        let current = self
            .normalizer()
            .plain_by_name(&meta, &record.to_fields(), context)?;
        let cast = self
            .hydrator()
            .hydrate_partial(&meta, &changes, &current, context)?;
        let names: Vec<String> = cast.keys().map(str::to_string).collect();
        let mut args = Arguments::new(meta.type_name.clone(), cast);
        let mut staged = record.clone();
        for name in &names {
            staged.set_field(name, &mut args)?;
        }
        *record = staged;
        Ok(())
    }
}
