//! # Collections
//!
//! Lists of records, optionally carrying pagination. A plain JSON array
//! hydrates into an unpaginated [`Collection`]; a page object such as
//!
//! ```json
//! { "data": [ ... ], "total": 42, "per_page": 10, "current_page": 2 }
//! ```
//!
//! hydrates into a paginated one. Item errors are prefixed with the item's
//! index.

use serde_json::{json, Map, Value};

use forma_core::{Context, HydrationError, Record, Result};

use crate::engine::Engine;
use crate::input::Source;

/// Position of a page within a larger result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub per_page: u64,
    pub total: u64,
    pub current_page: u64,
}

impl Pagination {
    /// At least 1, even for an empty result set.
    pub fn last_page(&self) -> u64 {
        if self.per_page == 0 {
            return 1;
        }
        self.total.div_ceil(self.per_page).max(1)
    }

    pub fn to_json(&self) -> Value {
        json!({
            "per_page": self.per_page,
            "total": self.total,
            "current_page": self.current_page,
            "last_page": self.last_page(),
        })
    }
}

/// Hydrated records in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<T> {
    items: Vec<T>,
    pagination: Option<Pagination>,
}

impl<T> Collection<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            pagination: None,
        }
    }

    pub fn paginated(items: Vec<T>, pagination: Pagination) -> Self {
        Self {
            items,
            pagination: Some(pagination),
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn pagination(&self) -> Option<&Pagination> {
        self.pagination.as_ref()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T> IntoIterator for Collection<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Collection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// A source of one page of raw items.
pub trait Paginator {
    fn items(&self) -> Vec<Value>;
    fn total(&self) -> u64;
    fn per_page(&self) -> u64;
    fn current_page(&self) -> u64;

    fn pagination(&self) -> Pagination {
        Pagination {
            per_page: self.per_page(),
            total: self.total(),
            current_page: self.current_page(),
        }
    }
}

const ITEM_KEYS: [&str; 2] = ["data", "items"];
const PER_PAGE_KEYS: [&str; 3] = ["per_page", "perPage", "page_size"];
const PAGE_KEYS: [&str; 3] = ["current_page", "currentPage", "page"];

/// A page object decoded from JSON.
///
/// Items come from `data` or `items`. `total` is required; page size and
/// page number default to the item count and 1. Counters may sit at the top
/// level or under `meta`.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonPage {
    items: Vec<Value>,
    total: u64,
    per_page: u64,
    current_page: u64,
}

impl JsonPage {
    /// `None` unless `value` looks like a page object.
    pub fn detect(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let items = ITEM_KEYS
            .iter()
            .find_map(|key| object.get(*key).and_then(Value::as_array))?
            .clone();
        let meta = object.get("meta").and_then(Value::as_object);
        let counter = |keys: &[&str]| -> Option<u64> {
            keys.iter().find_map(|key| {
                object
                    .get(*key)
                    .or_else(|| meta.and_then(|m| m.get(*key)))
                    .and_then(Value::as_u64)
            })
        };
        let total = counter(&["total"])?;
        let per_page = counter(&PER_PAGE_KEYS).unwrap_or(items.len() as u64);
        let current_page = counter(&PAGE_KEYS).unwrap_or(1);
        Some(Self {
            items,
            total,
            per_page,
            current_page,
        })
    }
}

impl Paginator for JsonPage {
    fn items(&self) -> Vec<Value> {
        self.items.clone()
    }

    fn total(&self) -> u64 {
        self.total
    }

    fn per_page(&self) -> u64 {
        self.per_page
    }

    fn current_page(&self) -> u64 {
        self.current_page
    }
}

impl Engine {
    /// Hydrate every item into a `T`.
    ///
    /// # Errors
    ///
    /// The first item error, prefixed with the item's index.
    pub fn hydrate_collection<T, S>(
        &self,
        items: impl IntoIterator<Item = S>,
        context: &Context,
    ) -> Result<Collection<T>>
    where
        T: Record,
        S: Into<Source>,
    {
        items
            .into_iter()
            .enumerate()
            .map(|(index, item)| self.hydrate_with(item, context).map_err(|e| e.at(index)))
            .collect::<Result<Vec<T>>>()
            .map(Collection::new)
    }

    /// Hydrate one page.
    ///
    /// # Errors
    ///
    /// As [`Engine::hydrate_collection`].
    pub fn hydrate_page<T: Record>(&self, page: &impl Paginator, context: &Context) -> Result<Collection<T>> {
        let items: Collection<T> = self.hydrate_collection(page.items(), context)?;
        Ok(Collection::paginated(items.into_items(), page.pagination()))
    }

    /// Hydrate a JSON array or page object.
    ///
    /// # Errors
    ///
    /// [`HydrationError::UnsupportedInput`] for anything else, otherwise as
    /// [`Engine::hydrate_collection`].
    pub fn hydrate_list<T: Record>(&self, value: Value, context: &Context) -> Result<Collection<T>> {
        if let Some(page) = JsonPage::detect(&value) {
            return self.hydrate_page(&page, context);
        }
        match value {
            Value::Array(items) => self.hydrate_collection(items, context),
            other => Err(HydrationError::UnsupportedInput {
                shape: format!("JSON {} as a collection", forma_core::error::json_kind(&other)),
            }
            .into()),
        }
    }

    /// Normalize every item. Paginated collections become
    /// `{"data": [...], "meta": {...}}`, others a plain array.
    ///
    /// # Errors
    ///
    /// The first item error, prefixed with the item's index.
    pub fn normalize_collection<T: Record>(&self, collection: &Collection<T>, context: &Context) -> Result<Value> {
        let items = collection
            .iter()
            .enumerate()
            .map(|(index, item)| self.normalize_to_value(item, context).map_err(|e| e.at(index)))
            .collect::<Result<Vec<Value>>>()?;
        match collection.pagination() {
            Some(pagination) => {
                let mut page = Map::new();
                page.insert("data".to_string(), Value::Array(items));
                page.insert("meta".to_string(), pagination.to_json());
                Ok(Value::Object(page))
            }
            None => Ok(Value::Array(items)),
        }
    }
}
