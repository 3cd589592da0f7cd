use crate::{CollectionRef, PropertyValue, RemoteDocument, RemoteRef, SortDirection, StoreError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod memory;

/// Largest page the remote store will hand out.
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckboxFilter {
    pub property: String,
    pub equals: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SortDirective {
    pub property: String,
    pub direction: SortDirection,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageQuery {
    pub filter: Option<CheckboxFilter>,
    pub sort: Option<SortDirective>,
    pub start_cursor: Option<String>,
    pub page_size: u32,
}

impl PageQuery {
    pub fn new(page_size: u32) -> Self {
        Self {
            filter: None,
            sort: None,
            start_cursor: None,
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }
}

impl Default for PageQuery {
    fn default() -> Self {
        Self::new(MAX_PAGE_SIZE)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Page {
    pub documents: Vec<RemoteDocument>,
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

/// Partial property update for a single document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropertyPatch {
    pub changes: BTreeMap<String, PropertyValue>,
}

impl PropertyPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn checkbox(property: impl Into<String>, value: bool) -> Self {
        Self::new().set(property, PropertyValue::checkbox(value))
    }

    pub fn set(mut self, property: impl Into<String>, value: PropertyValue) -> Self {
        self.changes.insert(property.into(), value);
        self
    }
}

/// Transport to the external document store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// One page of a collection. Filter and sort properties missing from the
    /// collection schema are reported as [`StoreError::PropertyNotFound`].
    async fn query(&self, collection: &CollectionRef, query: &PageQuery) -> Result<Page, StoreError>;

    async fn update(&self, document: &RemoteRef, patch: &PropertyPatch) -> Result<(), StoreError>;
}
