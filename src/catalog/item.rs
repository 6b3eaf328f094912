//! Catalog records as plain key/value maps

use crate::io::configuration::OTHER_CATEGORY;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Anything that can be grouped by a display category
pub trait Categorized {
    /// Raw category, `None` when the record carries none
    fn category(&self) -> Option<&str>;
}

/// Category used for grouping, with missing or blank values mapped to "Other"
pub fn category_of<T: Categorized + ?Sized>(item: &T) -> &str {
    item.category()
        .map(str::trim)
        .filter(|category| !category.is_empty())
        .unwrap_or(OTHER_CATEGORY)
}

/// One sellable part as delivered by the catalog service
///
/// Only `id` and `category` have fixed meaning. Image reference fields are
/// looked up by name through a [`FieldPriorityTable`](crate::imagery::candidates::FieldPriorityTable).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogItem {
    fields: Map<String, Value>,
}

impl CatalogItem {
    /// Wrap an existing field map
    pub const fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Build an item from a JSON value, `None` unless it is an object
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self::new(fields)),
            _ => None,
        }
    }

    /// Builder-style field insertion
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Identifier rendered as text; numeric ids are accepted as well
    pub fn id(&self) -> Option<String> {
        match self.fields.get("id")? {
            Value::String(id) => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }

    /// Raw value of a named field
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// All fields of the record
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

impl Categorized for CatalogItem {
    fn category(&self) -> Option<&str> {
        self.fields.get("category").and_then(Value::as_str)
    }
}

impl<T: Categorized + ?Sized> Categorized for &T {
    fn category(&self) -> Option<&str> {
        (**self).category()
    }
}
