use std::cmp::Ordering;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use serde_json::Value;

use crate::error::StoreError;
use crate::query::{Direction, Document, Filter, FilterOp, Query};
use crate::traits::DocumentStore;

/// In-memory document store for tests and local development.
///
/// Mirrors the semantics of the hosted store: last-write-wins per document,
/// no cross-document transactions, conjunctive predicate queries. Fault
/// hooks let tests simulate a missing index, a failing document write, or a
/// full outage.
#[derive(Default)]
pub struct MemoryStore {
    collections: DashMap<String, DashMap<String, Value>>,
    /// (collection, id) pairs whose updates fail with `Unavailable`.
    update_faults: DashSet<(String, String)>,
    /// Collections whose ordered queries fail with `IndexRequired`.
    unindexed: DashSet<String>,
    /// When set, every operation fails with `Unavailable`.
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail, as if the store were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable
            .store(unavailable, AtomicOrdering::SeqCst);
    }

    /// Make updates to one document fail with `Unavailable`.
    pub fn inject_update_fault(&self, collection: &str, id: &str) {
        self.update_faults
            .insert((collection.to_string(), id.to_string()));
    }

    /// Remove a previously injected update fault.
    pub fn clear_update_fault(&self, collection: &str, id: &str) {
        self.update_faults
            .remove(&(collection.to_string(), id.to_string()));
    }

    /// Mark a collection as having no ordering index, so ordered queries
    /// fail with `IndexRequired` and callers exercise their fallback path.
    pub fn mark_unindexed(&self, collection: &str) {
        self.unindexed.insert(collection.to_string());
    }

    /// Number of documents in a collection.
    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .get(collection)
            .map(|c| c.len())
            .unwrap_or(0)
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(AtomicOrdering::SeqCst) {
            return Err(StoreError::Unavailable("store is offline".into()));
        }
        Ok(())
    }
}

/// Look up a (possibly dotted) field path inside a document.
fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = doc;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

/// Compare two JSON scalars of the same kind.
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

fn matches_filter(doc: &Value, filter: &Filter) -> bool {
    let field = lookup(doc, &filter.field);
    match filter.op {
        FilterOp::Eq => field == Some(&filter.value),
        FilterOp::Ne => field != Some(&filter.value),
        FilterOp::Gt => field
            .and_then(|v| compare_values(v, &filter.value))
            .is_some_and(|ord| ord == Ordering::Greater),
        FilterOp::Gte => field
            .and_then(|v| compare_values(v, &filter.value))
            .is_some_and(|ord| ord != Ordering::Less),
        FilterOp::Lt => field
            .and_then(|v| compare_values(v, &filter.value))
            .is_some_and(|ord| ord == Ordering::Less),
        FilterOp::Lte => field
            .and_then(|v| compare_values(v, &filter.value))
            .is_some_and(|ord| ord != Ordering::Greater),
        FilterOp::ArrayContains => field
            .and_then(Value::as_array)
            .is_some_and(|arr| arr.contains(&filter.value)),
        FilterOp::ArrayContainsAny => {
            let (Some(arr), Some(candidates)) =
                (field.and_then(Value::as_array), filter.value.as_array())
            else {
                return false;
            };
            candidates.iter().any(|c| arr.contains(c))
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, collection: &str, id: &str, data: Value) -> Result<(), StoreError> {
        self.check_available()?;

        let coll = self
            .collections
            .entry(collection.to_string())
            .or_default();

        match coll.entry(id.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(StoreError::AlreadyExists {
                collection: collection.to_string(),
                id: id.to_string(),
            }),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(data);
                Ok(())
            }
        }
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        self.check_available()?;

        Ok(self
            .collections
            .get(collection)
            .and_then(|coll| coll.get(id).map(|doc| doc.clone())))
    }

    async fn update(&self, collection: &str, id: &str, patch: Value) -> Result<(), StoreError> {
        self.check_available()?;

        if self
            .update_faults
            .contains(&(collection.to_string(), id.to_string()))
        {
            return Err(StoreError::Unavailable(format!(
                "injected write fault on {collection}/{id}"
            )));
        }

        let coll = self
            .collections
            .get(collection)
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;

        let mut doc = coll.get_mut(id).ok_or_else(|| StoreError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        })?;

        let (Value::Object(target), Value::Object(fields)) = (&mut *doc, patch) else {
            return Err(StoreError::Serialization(
                "documents and patches must be JSON objects".into(),
            ));
        };

        for (key, value) in fields {
            target.insert(key, value);
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        self.check_available()?;

        Ok(self
            .collections
            .get(collection)
            .is_some_and(|coll| coll.remove(id).is_some()))
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        self.check_available()?;

        if let Some(order) = &query.order_by
            && self.unindexed.contains(collection)
        {
            return Err(StoreError::IndexRequired {
                collection: collection.to_string(),
                field: order.field.clone(),
            });
        }

        let mut docs: Vec<Document> = match self.collections.get(collection) {
            Some(coll) => coll
                .iter()
                .filter(|entry| query.filters.iter().all(|f| matches_filter(entry.value(), f)))
                .map(|entry| Document {
                    id: entry.key().clone(),
                    data: entry.value().clone(),
                })
                .collect(),
            None => Vec::new(),
        };

        if let Some(order) = &query.order_by {
            docs.sort_by(|a, b| {
                let lhs = lookup(&a.data, &order.field).unwrap_or(&Value::Null);
                let rhs = lookup(&b.data, &order.field).unwrap_or(&Value::Null);
                let ord = compare_values(lhs, rhs).unwrap_or(Ordering::Equal);
                match order.direction {
                    Direction::Asc => ord,
                    Direction::Desc => ord.reverse(),
                }
            });
        }

        if let Some(limit) = query.limit {
            docs.truncate(limit);
        }

        Ok(docs)
    }

    async fn increment(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: i64,
    ) -> Result<(), StoreError> {
        self.check_available()?;

        if self
            .update_faults
            .contains(&(collection.to_string(), id.to_string()))
        {
            return Err(StoreError::Unavailable(format!(
                "injected write fault on {collection}/{id}"
            )));
        }

        let coll = self
            .collections
            .get(collection)
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;

        let mut doc = coll.get_mut(id).ok_or_else(|| StoreError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        })?;

        let Value::Object(target) = &mut *doc else {
            return Err(StoreError::Serialization(
                "documents must be JSON objects".into(),
            ));
        };

        let current = target.get(field).and_then(Value::as_i64).unwrap_or(0);
        target.insert(field.to_string(), Value::from(current + delta));
        Ok(())
    }
}
