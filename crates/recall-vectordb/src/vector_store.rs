use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use crate::collection::CollectionSchema;

#[derive(Debug, thiserror::Error)]
pub enum VectorStoreError {
    #[error("connection error: {0}")]
    Connection(String),
    #[error("collection error: {0}")]
    Collection(String),
    #[error("upsert error: {0}")]
    Upsert(String),
    #[error("search error: {0}")]
    Search(String),
    #[error("delete error: {0}")]
    Delete(String),
    #[error("scroll error: {0}")]
    Scroll(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

#[derive(Debug, Clone)]
pub struct VectorPoint {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: HashMap<String, serde_json::Value>,
}

/// Payload-level query filter.
///
/// `must` conditions all have to hold; `should` conditions form a
/// disjunction. Either list may be empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PayloadFilter {
    pub must: Vec<Condition>,
    pub should: Vec<Condition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub value: FieldValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Text(String),
    /// Matches when the payload value equals any of the keywords.
    Keywords(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct ScoredPoint {
    pub id: String,
    pub score: f32,
    pub payload: HashMap<String, serde_json::Value>,
}

/// A point read back without its vector, as from a metadata-only scroll.
#[derive(Debug, Clone)]
pub struct PayloadPoint {
    pub id: String,
    pub payload: HashMap<String, serde_json::Value>,
}

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait VectorStore: Send + Sync {
    fn ensure_collection(
        &self,
        collection: &str,
        schema: &CollectionSchema,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>>;

    fn collection_exists(&self, collection: &str) -> BoxFuture<'_, Result<bool, VectorStoreError>>;

    fn list_collections(&self) -> BoxFuture<'_, Result<Vec<String>, VectorStoreError>>;

    fn delete_collection(&self, collection: &str) -> BoxFuture<'_, Result<(), VectorStoreError>>;

    fn upsert(
        &self,
        collection: &str,
        points: Vec<VectorPoint>,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>>;

    fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
        filter: Option<PayloadFilter>,
    ) -> BoxFuture<'_, Result<Vec<ScoredPoint>, VectorStoreError>>;

    /// Read points matching `filter` without a query vector.
    fn scroll(
        &self,
        collection: &str,
        filter: Option<PayloadFilter>,
        limit: u32,
    ) -> BoxFuture<'_, Result<Vec<PayloadPoint>, VectorStoreError>>;
}

impl PayloadFilter {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.must.is_empty() && self.should.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_is_empty() {
        assert!(PayloadFilter::default().is_empty());
    }

    #[test]
    fn filter_with_condition_is_not_empty() {
        let f = PayloadFilter {
            must: vec![Condition {
                field: "source".into(),
                value: FieldValue::Text("files__default: 1".into()),
            }],
            should: vec![],
        };
        assert!(!f.is_empty());
    }
}
