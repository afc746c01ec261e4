//! Wire property sets and multi-status responses.

use std::collections::HashMap;

use crate::fields::Namespace;

/// Properties of a single resource as returned in a 200 propstat block.
///
/// PROPFIND responses key properties by (namespace, local name). DASL
/// search responses return aliased columns with no namespace, so those
/// are keyed by bare alias. Values are the raw string forms the server
/// sent; properties returned with a non-200 propstat never land here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertySet {
    values: HashMap<(Option<Namespace>, String), String>,
}

impl PropertySet {
    /// Creates an empty property set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a namespaced property value.
    pub fn insert(
        &mut self,
        namespace: Namespace,
        name: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.values
            .insert((Some(namespace), name.into()), value.into());
    }

    /// Inserts an aliased search-result column.
    pub fn insert_alias(&mut self, alias: impl Into<String>, value: impl Into<String>) {
        self.values.insert((None, alias.into()), value.into());
    }

    /// Returns the raw value of a namespaced property, if present.
    #[must_use]
    pub fn get(&self, namespace: Namespace, name: &str) -> Option<&str> {
        self.values
            .get(&(Some(namespace), name.to_string()))
            .map(String::as_str)
    }

    /// Returns the raw value of an aliased column, if present.
    #[must_use]
    pub fn get_alias(&self, alias: &str) -> Option<&str> {
        self.values
            .get(&(None, alias.to_string()))
            .map(String::as_str)
    }

    /// Returns an owned copy of a namespaced property value.
    #[must_use]
    pub fn get_string(&self, namespace: Namespace, name: &str) -> Option<String> {
        self.get(namespace, name).map(ToOwned::to_owned)
    }

    /// Returns an aliased integer column, defaulting to zero when the
    /// column is absent or malformed.
    #[must_use]
    pub fn get_alias_int(&self, alias: &str) -> i32 {
        self.get_alias(alias)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }

    /// Returns an aliased long column, defaulting to zero when the
    /// column is absent or malformed.
    #[must_use]
    pub fn get_alias_long(&self, alias: &str) -> i64 {
        self.get_alias(alias)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }

    /// Returns a namespaced integer property, defaulting to zero when
    /// the property is absent or malformed.
    #[must_use]
    pub fn get_int(&self, namespace: Namespace, name: &str) -> i32 {
        self.get(namespace, name)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }

    /// Returns true when no properties are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One entry of a multi-status response: a resource href plus its
/// properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiStatusEntry {
    /// Resource href exactly as the server sent it (still URL-encoded).
    pub href: String,
    /// Properties returned with status 200.
    pub props: PropertySet,
}

impl MultiStatusEntry {
    /// Creates an entry for the given href.
    #[must_use]
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            props: PropertySet::new(),
        }
    }
}

/// A parsed 207 multi-status response body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiStatus {
    /// Response entries in server order.
    pub responses: Vec<MultiStatusEntry>,
}

impl MultiStatus {
    /// Returns the first entry, if any.
    #[must_use]
    pub fn first(&self) -> Option<&MultiStatusEntry> {
        self.responses.first()
    }

    /// Returns true when the response carried no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }
}
