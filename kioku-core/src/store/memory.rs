use crate::store::{CheckboxFilter, DocumentStore, Page, PageQuery, PropertyPatch, SortDirective};
use crate::{CollectionRef, PropertyValue, RemoteDocument, RemoteRef, SortDirection, StoreError};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, VecDeque};
use uuid::Uuid;

#[derive(Default)]
struct Collection {
    schema: BTreeSet<String>,
    documents: Vec<RemoteDocument>,
}

/// Document store held in process memory.
///
/// Each collection has a schema: the declared property names plus every
/// property name ever inserted. Filters and sorts on names outside the schema
/// fail the way the remote store does.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<CollectionRef, Collection>>,
    failures: RwLock<VecDeque<StoreError>>,
    queries: RwLock<Vec<(CollectionRef, PageQuery)>>,
    updates: RwLock<Vec<(RemoteRef, PropertyPatch)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_collection<I, S>(&self, collection: &CollectionRef, schema: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut m = self.collections.write();
        let c = m.entry(collection.clone()).or_default();
        c.schema.extend(schema.into_iter().map(Into::into));
    }

    pub fn insert(&self, collection: &CollectionRef, document: RemoteDocument) -> RemoteRef {
        let mut m = self.collections.write();
        let c = m.entry(collection.clone()).or_default();
        c.schema.extend(document.properties.keys().cloned());
        let id = document.id.clone();
        c.documents.push(document);
        id
    }

    /// Inserts a document under a fresh dashed id.
    pub fn insert_new<I, S>(&self, collection: &CollectionRef, properties: I) -> RemoteRef
    where
        I: IntoIterator<Item = (S, PropertyValue)>,
        S: Into<String>,
    {
        let mut doc = RemoteDocument::new(Uuid::new_v4().to_string());
        for (name, value) in properties {
            doc = doc.with(name, value);
        }
        self.insert(collection, doc)
    }

    pub fn document(&self, id: &RemoteRef) -> Option<RemoteDocument> {
        self.collections
            .read()
            .values()
            .flat_map(|c| c.documents.iter())
            .find(|d| &d.id == id)
            .cloned()
    }

    pub fn documents(&self, collection: &CollectionRef) -> Vec<RemoteDocument> {
        self.collections
            .read()
            .get(collection)
            .map(|c| c.documents.clone())
            .unwrap_or_default()
    }

    /// Changes the natural order of a collection.
    pub fn rearrange(&self, collection: &CollectionRef, f: impl FnOnce(&mut Vec<RemoteDocument>)) {
        if let Some(c) = self.collections.write().get_mut(collection) {
            f(&mut c.documents);
        }
    }

    /// Queues an error to be returned by the next `query` or `update`.
    pub fn fail_next(&self, error: StoreError) {
        self.failures.write().push_back(error);
    }

    pub fn queries(&self) -> Vec<(CollectionRef, PageQuery)> {
        self.queries.read().clone()
    }

    pub fn updates(&self) -> Vec<(RemoteRef, PropertyPatch)> {
        self.updates.read().clone()
    }

    fn take_failure(&self) -> Option<StoreError> {
        self.failures.write().pop_front()
    }
}

fn missing(property: &str) -> StoreError {
    StoreError::PropertyNotFound {
        property: Some(property.to_string()),
    }
}

fn matches(doc: &RemoteDocument, filter: &CheckboxFilter) -> bool {
    doc.flag(&filter.property) == filter.equals
}

fn compare(a: &RemoteDocument, b: &RemoteDocument, sort: &SortDirective) -> Ordering {
    let pa = a.property(&sort.property);
    let pb = b.property(&sort.property);
    let ord = match (pa.and_then(PropertyValue::as_number), pb.and_then(PropertyValue::as_number)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => return Ordering::Less,
        (None, Some(_)) => return Ordering::Greater,
        (None, None) => {
            let ta = pa.and_then(PropertyValue::plain_text).unwrap_or_default();
            let tb = pb.and_then(PropertyValue::plain_text).unwrap_or_default();
            ta.cmp(&tb)
        }
    };
    match sort.direction {
        SortDirection::Ascending => ord,
        SortDirection::Descending => ord.reverse(),
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn query(&self, collection: &CollectionRef, query: &PageQuery) -> Result<Page, StoreError> {
        self.queries.write().push((collection.clone(), query.clone()));
        if let Some(err) = self.take_failure() {
            return Err(err);
        }

        let m = self.collections.read();
        let Some(c) = m.get(collection) else {
            return Err(StoreError::Remote {
                status: 404,
                code: "object_not_found".into(),
                message: format!("Could not find database with ID: {collection}"),
            });
        };
        if let Some(f) = &query.filter {
            if !c.schema.contains(&f.property) {
                return Err(missing(&f.property));
            }
        }
        if let Some(s) = &query.sort {
            if !c.schema.contains(&s.property) {
                return Err(missing(&s.property));
            }
        }

        let mut v: Vec<&RemoteDocument> = c
            .documents
            .iter()
            .filter(|d| query.filter.as_ref().map(|f| matches(d, f)).unwrap_or(true))
            .collect();
        if let Some(s) = &query.sort {
            v.sort_by(|a, b| compare(a, b, s));
        }

        let start = match &query.start_cursor {
            None => 0,
            Some(cursor) => cursor.parse::<usize>().map_err(|_| StoreError::Remote {
                status: 400,
                code: "validation_error".into(),
                message: format!("start_cursor is invalid: {cursor}"),
            })?,
        };
        let size = query.page_size.clamp(1, super::MAX_PAGE_SIZE) as usize;
        let end = (start + size).min(v.len());
        let documents = v
            .get(start..end)
            .unwrap_or_default()
            .iter()
            .map(|d| (*d).clone())
            .collect();
        let has_more = end < v.len();
        Ok(Page {
            documents,
            next_cursor: has_more.then(|| end.to_string()),
            has_more,
        })
    }

    async fn update(&self, document: &RemoteRef, patch: &PropertyPatch) -> Result<(), StoreError> {
        if let Some(err) = self.take_failure() {
            return Err(err);
        }
        {
            let mut m = self.collections.write();
            let Some(c) = m
                .values_mut()
                .find(|c| c.documents.iter().any(|d| &d.id == document))
            else {
                return Err(StoreError::DocumentNotFound(document.clone()));
            };
            if let Some(name) = patch.changes.keys().find(|k| !c.schema.contains(*k)) {
                return Err(missing(name));
            }
            let Some(doc) = c.documents.iter_mut().find(|d| &d.id == document) else {
                return Err(StoreError::DocumentNotFound(document.clone()));
            };
            for (name, value) in &patch.changes {
                doc.properties.insert(name.clone(), value.clone());
            }
        }
        self.updates.write().push((document.clone(), patch.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> (MemoryStore, CollectionRef) {
        let store = MemoryStore::new();
        let col = CollectionRef::new("db");
        for (i, known) in [(3.0, false), (1.0, true), (2.0, false)] {
            store.insert_new(
                &col,
                [
                    ("Random", PropertyValue::formula_number(i)),
                    ("암기", PropertyValue::checkbox(known)),
                ],
            );
        }
        (store, col)
    }

    #[tokio::test]
    async fn pages_through_collection() {
        let (store, col) = seeded();
        let first = store.query(&col, &PageQuery::new(2)).await.unwrap();
        assert_eq!(first.documents.len(), 2);
        assert!(first.has_more);
        let mut q = PageQuery::new(2);
        q.start_cursor = first.next_cursor.clone();
        let second = store.query(&col, &q).await.unwrap();
        assert_eq!(second.documents.len(), 1);
        assert!(!second.has_more);
        assert_eq!(second.next_cursor, None);
    }

    #[tokio::test]
    async fn filters_and_sorts() {
        let (store, col) = seeded();
        let mut q = PageQuery::default();
        q.filter = Some(CheckboxFilter { property: "암기".into(), equals: false });
        q.sort = Some(SortDirective { property: "Random".into(), direction: SortDirection::Descending });
        let page = store.query(&col, &q).await.unwrap();
        let keys: Vec<f64> = page
            .documents
            .iter()
            .filter_map(|d| d.property("Random").and_then(PropertyValue::as_number))
            .collect();
        assert_eq!(keys, vec![3.0, 2.0]);
    }

    #[tokio::test]
    async fn unknown_properties_are_schema_errors() {
        let (store, col) = seeded();
        let mut q = PageQuery::default();
        q.sort = Some(SortDirective { property: "Order".into(), direction: SortDirection::Ascending });
        let err = store.query(&col, &q).await.unwrap_err();
        assert!(err.is_schema_mismatch());

        let id = store.documents(&col)[0].id.clone();
        let err = store.update(&id, &PropertyPatch::checkbox("Done", true)).await.unwrap_err();
        assert!(err.is_schema_mismatch());
        let err = store
            .update(&RemoteRef::new("nope"), &PropertyPatch::checkbox("암기", true))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::DocumentNotFound(RemoteRef::new("nope")));
    }
}
