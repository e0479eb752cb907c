//! In-memory [`VectorStore`] used by tests.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::collection::CollectionSchema;
use crate::vector_store::{
    BoxFuture, FieldValue, PayloadFilter, PayloadPoint, ScoredPoint, VectorPoint, VectorStore,
    VectorStoreError,
};

struct StoredPoint {
    vector: Vec<f32>,
    payload: HashMap<String, serde_json::Value>,
}

struct InMemoryCollection {
    points: HashMap<String, StoredPoint>,
}

pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, InMemoryCollection>>,
}

impl InMemoryVectorStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryVectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryVectorStore")
            .finish_non_exhaustive()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn matches_filter(payload: &HashMap<String, serde_json::Value>, filter: &PayloadFilter) -> bool {
    for cond in &filter.must {
        let Some(val) = payload.get(&cond.field) else {
            return false;
        };
        if !field_matches(val, &cond.value) {
            return false;
        }
    }
    if filter.should.is_empty() {
        return true;
    }
    filter.should.iter().any(|cond| {
        payload
            .get(&cond.field)
            .is_some_and(|val| field_matches(val, &cond.value))
    })
}

fn field_matches(val: &serde_json::Value, expected: &FieldValue) -> bool {
    match expected {
        FieldValue::Integer(i) => val.as_i64() == Some(*i),
        FieldValue::Text(s) => val.as_str() == Some(s.as_str()),
        FieldValue::Keywords(keywords) => val
            .as_str()
            .is_some_and(|s| keywords.iter().any(|k| k == s)),
    }
}

impl VectorStore for InMemoryVectorStore {
    fn ensure_collection(
        &self,
        collection: &str,
        _schema: &CollectionSchema,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let mut cols = self
                .collections
                .write()
                .map_err(|e| VectorStoreError::Collection(e.to_string()))?;
            cols.entry(collection)
                .or_insert_with(|| InMemoryCollection {
                    points: HashMap::new(),
                });
            Ok(())
        })
    }

    fn collection_exists(&self, collection: &str) -> BoxFuture<'_, Result<bool, VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let cols = self
                .collections
                .read()
                .map_err(|e| VectorStoreError::Collection(e.to_string()))?;
            Ok(cols.contains_key(&collection))
        })
    }

    fn list_collections(&self) -> BoxFuture<'_, Result<Vec<String>, VectorStoreError>> {
        Box::pin(async move {
            let cols = self
                .collections
                .read()
                .map_err(|e| VectorStoreError::Collection(e.to_string()))?;
            let mut names: Vec<String> = cols.keys().cloned().collect();
            names.sort();
            Ok(names)
        })
    }

    fn delete_collection(&self, collection: &str) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let mut cols = self
                .collections
                .write()
                .map_err(|e| VectorStoreError::Delete(e.to_string()))?;
            cols.remove(&collection);
            Ok(())
        })
    }

    fn upsert(
        &self,
        collection: &str,
        points: Vec<VectorPoint>,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let mut cols = self
                .collections
                .write()
                .map_err(|e| VectorStoreError::Upsert(e.to_string()))?;
            let col = cols.get_mut(&collection).ok_or_else(|| {
                VectorStoreError::Upsert(format!("collection {collection} not found"))
            })?;
            for p in points {
                col.points.insert(
                    p.id,
                    StoredPoint {
                        vector: p.vector,
                        payload: p.payload,
                    },
                );
            }
            Ok(())
        })
    }

    fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
        filter: Option<PayloadFilter>,
    ) -> BoxFuture<'_, Result<Vec<ScoredPoint>, VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let cols = self
                .collections
                .read()
                .map_err(|e| VectorStoreError::Search(e.to_string()))?;
            let col = cols.get(&collection).ok_or_else(|| {
                VectorStoreError::Search(format!("collection {collection} not found"))
            })?;

            let empty_filter = PayloadFilter::default();
            let f = filter.as_ref().unwrap_or(&empty_filter);

            let mut scored: Vec<ScoredPoint> = col
                .points
                .iter()
                .filter(|(_, sp)| matches_filter(&sp.payload, f))
                .map(|(id, sp)| ScoredPoint {
                    id: id.clone(),
                    score: cosine_similarity(&vector, &sp.vector),
                    payload: sp.payload.clone(),
                })
                .collect();

            scored.sort_by(|a, b| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            #[expect(clippy::cast_possible_truncation)]
            scored.truncate(limit as usize);
            Ok(scored)
        })
    }

    fn scroll(
        &self,
        collection: &str,
        filter: Option<PayloadFilter>,
        limit: u32,
    ) -> BoxFuture<'_, Result<Vec<PayloadPoint>, VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let cols = self
                .collections
                .read()
                .map_err(|e| VectorStoreError::Scroll(e.to_string()))?;
            let col = cols.get(&collection).ok_or_else(|| {
                VectorStoreError::Scroll(format!("collection {collection} not found"))
            })?;

            let empty_filter = PayloadFilter::default();
            let f = filter.as_ref().unwrap_or(&empty_filter);

            let mut points: Vec<PayloadPoint> = col
                .points
                .iter()
                .filter(|(_, sp)| matches_filter(&sp.payload, f))
                .map(|(id, sp)| PayloadPoint {
                    id: id.clone(),
                    payload: sp.payload.clone(),
                })
                .collect();
            points.sort_by(|a, b| a.id.cmp(&b.id));
            points.truncate(limit as usize);
            Ok(points)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::CollectionSchema;
    use crate::vector_store::Condition;

    fn schema() -> CollectionSchema {
        CollectionSchema::for_user_collections(3)
    }

    #[tokio::test]
    async fn ensure_collection_and_exists() {
        let store = InMemoryVectorStore::new();
        assert!(!store.collection_exists("test").await.unwrap());
        store.ensure_collection("test", &schema()).await.unwrap();
        assert!(store.collection_exists("test").await.unwrap());
    }

    #[tokio::test]
    async fn ensure_collection_idempotent() {
        let store = InMemoryVectorStore::new();
        store.ensure_collection("test", &schema()).await.unwrap();
        store.ensure_collection("test", &schema()).await.unwrap();
        assert!(store.collection_exists("test").await.unwrap());
    }

    #[tokio::test]
    async fn list_collections_sorted() {
        let store = InMemoryVectorStore::new();
        store.ensure_collection("b", &schema()).await.unwrap();
        store.ensure_collection("a", &schema()).await.unwrap();
        assert_eq!(store.list_collections().await.unwrap(), ["a", "b"]);
    }

    #[tokio::test]
    async fn delete_collection_removes() {
        let store = InMemoryVectorStore::new();
        store.ensure_collection("test", &schema()).await.unwrap();
        store.delete_collection("test").await.unwrap();
        assert!(!store.collection_exists("test").await.unwrap());
    }

    #[tokio::test]
    async fn upsert_and_search() {
        let store = InMemoryVectorStore::new();
        store.ensure_collection("test", &schema()).await.unwrap();

        let points = vec![
            VectorPoint {
                id: "a".into(),
                vector: vec![1.0, 0.0, 0.0],
                payload: HashMap::from([("title".into(), serde_json::json!("alpha"))]),
            },
            VectorPoint {
                id: "b".into(),
                vector: vec![0.0, 1.0, 0.0],
                payload: HashMap::from([("title".into(), serde_json::json!("beta"))]),
            },
        ];
        store.upsert("test", points).await.unwrap();

        let results = store
            .search("test", vec![1.0, 0.0, 0.0], 2, None)
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "a");
        assert!((results[0].score - 1.0).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn search_with_should_filter_is_disjunctive() {
        let store = InMemoryVectorStore::new();
        store.ensure_collection("test", &schema()).await.unwrap();

        let points = vec![
            VectorPoint {
                id: "a".into(),
                vector: vec![1.0, 0.0, 0.0],
                payload: HashMap::from([("provider".into(), serde_json::json!("files"))]),
            },
            VectorPoint {
                id: "b".into(),
                vector: vec![0.9, 0.1, 0.0],
                payload: HashMap::from([("provider".into(), serde_json::json!("mail"))]),
            },
            VectorPoint {
                id: "c".into(),
                vector: vec![0.8, 0.2, 0.0],
                payload: HashMap::from([("provider".into(), serde_json::json!("calendar"))]),
            },
        ];
        store.upsert("test", points).await.unwrap();

        let filter = PayloadFilter {
            must: vec![],
            should: vec![
                Condition {
                    field: "provider".into(),
                    value: FieldValue::Text("files".into()),
                },
                Condition {
                    field: "provider".into(),
                    value: FieldValue::Text("mail".into()),
                },
            ],
        };
        let results = store
            .search("test", vec![1.0, 0.0, 0.0], 10, Some(filter))
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn scroll_applies_keywords_filter_and_limit() {
        let store = InMemoryVectorStore::new();
        store.ensure_collection("test", &schema()).await.unwrap();

        let points = (0..5)
            .map(|i| VectorPoint {
                id: format!("p{i}"),
                vector: vec![1.0, 0.0, 0.0],
                payload: HashMap::from([(
                    "source".into(),
                    serde_json::json!(format!("files__default: {i}")),
                )]),
            })
            .collect();
        store.upsert("test", points).await.unwrap();

        let filter = PayloadFilter {
            must: vec![Condition {
                field: "source".into(),
                value: FieldValue::Keywords(vec![
                    "files__default: 1".into(),
                    "files__default: 3".into(),
                    "files__default: 4".into(),
                ]),
            }],
            should: vec![],
        };
        let results = store.scroll("test", Some(filter), 2).await.unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn scroll_missing_collection_errors() {
        let store = InMemoryVectorStore::new();
        let result = store.scroll("nope", None, 10).await;
        assert!(matches!(result, Err(VectorStoreError::Scroll(_))));
    }

    #[test]
    fn cosine_similarity_orthogonal() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &b)).abs() < f32::EPSILON);
    }

    #[test]
    fn debug_format() {
        let store = InMemoryVectorStore::new();
        assert!(format!("{store:?}").contains("InMemoryVectorStore"));
    }
}
