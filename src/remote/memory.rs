use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{DocumentStore, FieldDelta, FieldDeltas};
use crate::error::RemoteError;

/// In-memory `DocumentStore`, used by tests and backend-less hosts.
#[derive(Default)]
pub struct MemoryStore {
    docs: Mutex<BTreeMap<String, BTreeMap<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of one document, for assertions.
    pub async fn document(&self, collection: &str, id: &str) -> Option<Value> {
        self.docs
            .lock()
            .await
            .get(collection)
            .and_then(|coll| coll.get(id))
            .cloned()
    }

    /// All documents in a collection, ordered by id.
    pub async fn collection(&self, collection: &str) -> Vec<Value> {
        self.docs
            .lock()
            .await
            .get(collection)
            .map(|coll| coll.values().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Value>, RemoteError> {
        Ok(self
            .docs
            .lock()
            .await
            .get(collection)
            .and_then(|coll| coll.get(id))
            .cloned())
    }

    async fn set_document(
        &self,
        collection: &str,
        id: &str,
        fields: Value,
        merge: bool,
    ) -> Result<(), RemoteError> {
        let mut docs = self.docs.lock().await;
        let coll = docs.entry(collection.to_string()).or_default();
        match coll.get_mut(id) {
            Some(existing) if merge => merge_into(existing, fields),
            _ => {
                coll.insert(id.to_string(), fields);
            }
        }
        Ok(())
    }

    async fn update_fields(
        &self,
        collection: &str,
        id: &str,
        deltas: FieldDeltas,
    ) -> Result<(), RemoteError> {
        let mut docs = self.docs.lock().await;
        let doc = docs
            .get_mut(collection)
            .and_then(|coll| coll.get_mut(id))
            .ok_or_else(|| RemoteError::NotFound(format!("{collection}/{id}")))?;
        apply_deltas(doc, deltas);
        Ok(())
    }

    async fn compare_and_update(
        &self,
        collection: &str,
        id: &str,
        expected: &[(String, Value)],
        deltas: FieldDeltas,
    ) -> Result<bool, RemoteError> {
        let mut docs = self.docs.lock().await;
        let doc = docs
            .get_mut(collection)
            .and_then(|coll| coll.get_mut(id))
            .ok_or_else(|| RemoteError::NotFound(format!("{collection}/{id}")))?;
        for (field, value) in expected {
            let current = doc.get(field).cloned().unwrap_or(Value::Null);
            if current != *value {
                return Ok(false);
            }
        }
        apply_deltas(doc, deltas);
        Ok(true)
    }

    async fn add_document(&self, collection: &str, fields: Value) -> Result<String, RemoteError> {
        let id = Uuid::now_v7().to_string();
        self.docs
            .lock()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), fields);
        Ok(id)
    }
}

fn apply_deltas(doc: &mut Value, deltas: FieldDeltas) {
    let Some(obj) = doc.as_object_mut() else {
        return;
    };
    for (field, delta) in deltas {
        match delta {
            FieldDelta::Set(value) => {
                obj.insert(field, value);
            }
            FieldDelta::Increment(n) => {
                let current = obj.get(&field).and_then(Value::as_i64).unwrap_or(0);
                obj.insert(field, Value::from(current + n));
            }
        }
    }
}

fn merge_into(existing: &mut Value, fields: Value) {
    match fields {
        Value::Object(new) => {
            if let Value::Object(obj) = existing {
                for (key, value) in new {
                    obj.insert(key, value);
                }
            } else {
                *existing = Value::Object(new);
            }
        }
        other => *existing = other,
    }
}
