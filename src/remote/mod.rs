pub mod memory;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::RemoteError;

/// One mutation applied to a document field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldDelta {
    /// Replace the field with a new value.
    Set(Value),
    /// Atomically add to a numeric counter field (missing counts as 0).
    Increment(i64),
}

/// Field updates keyed by field name, applied together.
pub type FieldDeltas = Vec<(String, FieldDelta)>;

/// The authoritative remote document store, as the replay engine consumes
/// it.
///
/// Modeled on a document database: collections of JSON documents addressed
/// by id, with merge writes and atomic counter increments. Implementations
/// are last-write-wins under concurrent writers; the engine does not paper
/// over that (see `ConsistencyMode` for the opt-in guard).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get_document(&self, collection: &str, id: &str)
    -> Result<Option<Value>, RemoteError>;

    /// Writes a document. With `merge`, existing fields not named in
    /// `fields` survive; without it the document is replaced.
    async fn set_document(
        &self,
        collection: &str,
        id: &str,
        fields: Value,
        merge: bool,
    ) -> Result<(), RemoteError>;

    /// Applies field updates to an existing document; `NotFound` if the
    /// document is missing.
    async fn update_fields(
        &self,
        collection: &str,
        id: &str,
        deltas: FieldDeltas,
    ) -> Result<(), RemoteError>;

    /// Applies `deltas` only if every `expected` field still holds the
    /// given value (a missing field compares as JSON null). Returns `false`
    /// and writes nothing when the check fails.
    async fn compare_and_update(
        &self,
        collection: &str,
        id: &str,
        expected: &[(String, Value)],
        deltas: FieldDeltas,
    ) -> Result<bool, RemoteError>;

    /// Adds a document with a store-generated id.
    async fn add_document(&self, collection: &str, fields: Value) -> Result<String, RemoteError>;
}
