//! Full-collection reads with schema degradation.
//!
//! A filter or sort naming a property the collection does not have is dropped
//! and the read restarts from the first page. Each directive is dropped at most
//! once, so a read makes at most three attempts.

use crate::store::{CheckboxFilter, DocumentStore, PageQuery, SortDirective, MAX_PAGE_SIZE};
use crate::{CollectionRef, RemoteDocument, StoreError};
use std::collections::HashSet;
use tracing::{debug, info, warn};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchOptions {
    pub filter: Option<CheckboxFilter>,
    pub sort: Option<SortDirective>,
    pub page_size: u32,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            filter: None,
            sort: None,
            page_size: MAX_PAGE_SIZE,
        }
    }
}

impl FetchOptions {
    pub fn unfiltered(page_size: u32) -> Self {
        Self {
            page_size,
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Fetched {
    pub documents: Vec<RemoteDocument>,
    /// False when a requested filter was dropped because the schema lacks it.
    pub filter_applied: bool,
    /// False when a requested sort was dropped; documents are in store order.
    pub sort_applied: bool,
}

pub async fn fetch_all<S: DocumentStore + ?Sized>(
    store: &S,
    collection: &CollectionRef,
    options: &FetchOptions,
) -> Result<Fetched, StoreError> {
    let mut filter = options.filter.clone();
    let mut sort = options.sort.clone();

    loop {
        let err = match fetch_pages(store, collection, filter.as_ref(), sort.as_ref(), options.page_size).await {
            Ok(documents) => {
                info!(
                    %collection,
                    count = documents.len(),
                    filtered = filter.is_some(),
                    sorted = sort.is_some(),
                    "fetched collection"
                );
                return Ok(Fetched {
                    documents,
                    filter_applied: filter.is_some(),
                    sort_applied: sort.is_some(),
                });
            }
            Err(err) => err,
        };

        let StoreError::PropertyNotFound { property } = &err else {
            return Err(err);
        };
        // An unnamed mismatch is blamed on the filter first, then the sort.
        let names = |p: &str| property.as_deref().map_or(true, |missing| missing == p);
        if filter.as_ref().is_some_and(|f| names(&f.property)) {
            warn!(%collection, property = ?property, "filter property missing from schema, retrying unfiltered");
            filter = None;
        } else if sort.as_ref().is_some_and(|s| names(&s.property)) {
            warn!(%collection, property = ?property, "sort property missing from schema, retrying in store order");
            sort = None;
        } else {
            return Err(err);
        }
    }
}

async fn fetch_pages<S: DocumentStore + ?Sized>(
    store: &S,
    collection: &CollectionRef,
    filter: Option<&CheckboxFilter>,
    sort: Option<&SortDirective>,
    page_size: u32,
) -> Result<Vec<RemoteDocument>, StoreError> {
    let mut query = PageQuery::new(page_size);
    query.filter = filter.cloned();
    query.sort = sort.cloned();

    let mut out = Vec::new();
    let mut seen = HashSet::new();
    let mut pages = 0usize;
    loop {
        let page = store.query(collection, &query).await?;
        pages += 1;
        debug!(%collection, page = pages, count = page.documents.len(), has_more = page.has_more, "fetched page");
        out.extend(page.documents);

        if !page.has_more {
            return Ok(out);
        }
        let Some(cursor) = page.next_cursor else {
            return Err(StoreError::Transport(format!(
                "{collection}: store reported more pages without a cursor"
            )));
        };
        if !seen.insert(cursor.clone()) {
            return Err(StoreError::Transport(format!(
                "{collection}: store repeated cursor {cursor}"
            )));
        }
        query.start_cursor = Some(cursor);
    }
}
