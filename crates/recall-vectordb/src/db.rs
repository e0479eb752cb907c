//! The per-user vector-database adapter.

use std::collections::HashMap;
use std::sync::Arc;

use recall_embed::Embedder;
use serde::{Deserialize, Serialize};

use crate::collection::{self, CollectionSchema, METADATA_SCROLL_LIMIT, collection_name};
use crate::config::VectorDbConfig;
use crate::error::VectorDbError;
use crate::filter::{self, MetadataFilter};
use crate::qdrant::QdrantStore;
use crate::vector_store::{PayloadFilter, VectorPoint, VectorStore};

/// A stored chunk with the fixed payload schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    pub text: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_index: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ScoredDocument {
    pub id: String,
    pub score: f32,
    pub document: Document,
}

/// What a metadata lookup yields per matched value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMeta {
    pub id: String,
    pub modified: Option<String>,
}

/// Adapter binding the vector store and an embedding provider to per-user
/// collections.
pub struct VectorDb {
    store: Arc<dyn VectorStore>,
    embedder: Option<Arc<dyn Embedder>>,
    vector_size: u64,
}

impl std::fmt::Debug for VectorDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorDb")
            .field("vector_size", &self.vector_size)
            .finish_non_exhaustive()
    }
}

impl VectorDb {
    /// Connect to Qdrant using the given config.
    ///
    /// # Errors
    ///
    /// Returns [`VectorDbError::Connection`] if the client cannot be created.
    pub fn new(
        config: &VectorDbConfig,
        embedder: Option<Arc<dyn Embedder>>,
    ) -> Result<Self, VectorDbError> {
        let store = QdrantStore::new(&config.url, config.api_key.as_deref()).map_err(|e| match e {
            crate::vector_store::VectorStoreError::Connection(msg) => VectorDbError::Connection(msg),
            other => VectorDbError::Store(other),
        })?;
        Ok(Self {
            store: Arc::new(store),
            embedder,
            vector_size: config.vector_size,
        })
    }

    /// Build an adapter over any [`VectorStore`] backend.
    #[must_use]
    pub fn with_store(
        store: Arc<dyn VectorStore>,
        embedder: Option<Arc<dyn Embedder>>,
        vector_size: u64,
    ) -> Self {
        Self {
            store,
            embedder,
            vector_size,
        }
    }

    fn schema(&self) -> CollectionSchema {
        CollectionSchema::for_user_collections(self.vector_size)
    }

    /// List all users with a provisioned collection.
    ///
    /// Collections not created by this adapter are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection listing fails.
    pub async fn user_ids(&self) -> Result<Vec<String>, VectorDbError> {
        let collections = self.store.list_collections().await?;
        Ok(collections
            .iter()
            .filter_map(|name| collection::user_id_from_collection(name))
            .map(str::to_owned)
            .collect())
    }

    /// Idempotently provision the user's collection with the fixed schema.
    ///
    /// # Errors
    ///
    /// Returns an error if collection creation fails.
    pub async fn setup_schema(&self, user_id: &str) -> Result<(), VectorDbError> {
        self.store
            .ensure_collection(&collection_name(user_id), &self.schema())
            .await?;
        Ok(())
    }

    /// Return a handle bound to the user's collection and an embedder.
    ///
    /// A request-level `embedder` override takes precedence over the
    /// instance default. The schema is provisioned first.
    ///
    /// # Errors
    ///
    /// Returns [`VectorDbError::NoEmbedder`] when neither an override nor a
    /// default embedder is available, or a store error from provisioning.
    pub async fn user_client(
        &self,
        user_id: &str,
        embedder: Option<Arc<dyn Embedder>>,
    ) -> Result<UserClient, VectorDbError> {
        self.setup_schema(user_id).await?;

        let embedder = embedder
            .or_else(|| self.embedder.clone())
            .ok_or(VectorDbError::NoEmbedder)?;

        Ok(UserClient {
            store: Arc::clone(&self.store),
            collection: collection_name(user_id),
            embedder,
        })
    }

    /// Translate metadata filters into a payload filter.
    ///
    /// Returns `None` on malformed input instead of an error; see
    /// [`filter::to_payload_filter`].
    #[must_use]
    pub fn metadata_filter(filters: &[MetadataFilter]) -> Option<PayloadFilter> {
        filter::to_payload_filter(filters)
    }

    /// Look up stored objects by a metadata field.
    ///
    /// Issues a vector-less query for points whose `metadata_key` payload
    /// equals any of `values` (capped at 100 points), then dedupes
    /// client-side by the matched value.
    ///
    /// # Errors
    ///
    /// Returns [`VectorDbError::Filter`] when the filter input is malformed,
    /// or a store error from provisioning or the query.
    pub async fn objects_from_metadata(
        &self,
        user_id: &str,
        metadata_key: &str,
        values: &[String],
    ) -> Result<HashMap<String, ObjectMeta>, VectorDbError> {
        self.setup_schema(user_id).await?;

        let filters = [MetadataFilter::new(metadata_key, values.to_vec())];
        let query_filter = filter::to_payload_filter(&filters).ok_or(VectorDbError::Filter)?;

        let points = self
            .store
            .scroll(
                &collection_name(user_id),
                Some(query_filter),
                METADATA_SCROLL_LIMIT,
            )
            .await?;

        let mut output = HashMap::new();
        for point in points {
            let Some(value) = point.payload.get(metadata_key).and_then(|v| v.as_str()) else {
                continue;
            };
            if values.iter().any(|v| v == value) {
                let modified = point
                    .payload
                    .get("modified")
                    .and_then(|m| m.as_str())
                    .map(str::to_owned);
                output.insert(
                    value.to_owned(),
                    ObjectMeta {
                        id: point.id,
                        modified,
                    },
                );
            }
        }

        tracing::debug!(
            user_id,
            metadata_key,
            matched = output.len(),
            "metadata lookup"
        );
        Ok(output)
    }

    /// Delete the user's collection. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if the deletion fails.
    pub async fn drop_user(&self, user_id: &str) -> Result<(), VectorDbError> {
        self.store
            .delete_collection(&collection_name(user_id))
            .await?;
        Ok(())
    }
}

/// Handle bound to one user's collection and a chosen embedder.
pub struct UserClient {
    store: Arc<dyn VectorStore>,
    collection: String,
    embedder: Arc<dyn Embedder>,
}

impl std::fmt::Debug for UserClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserClient")
            .field("collection", &self.collection)
            .field("embedder", &self.embedder.name())
            .finish_non_exhaustive()
    }
}

impl UserClient {
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    #[must_use]
    pub fn embedder_name(&self) -> &'static str {
        self.embedder.name()
    }

    /// Embed and store documents, returning the new point ids.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding, serialization, or the upsert fails.
    pub async fn add_documents(&self, docs: Vec<Document>) -> Result<Vec<String>, VectorDbError> {
        let mut points = Vec::with_capacity(docs.len());
        let mut ids = Vec::with_capacity(docs.len());

        for doc in docs {
            let vector = self.embedder.embed(&doc.text).await?;
            let payload: HashMap<String, serde_json::Value> =
                serde_json::from_value(serde_json::to_value(&doc)?)?;
            let id = uuid::Uuid::new_v4().to_string();
            ids.push(id.clone());
            points.push(VectorPoint {
                id,
                vector,
                payload,
            });
        }

        self.store.upsert(&self.collection, points).await?;
        Ok(ids)
    }

    /// Embed the query and search the user's collection.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding or the search fails.
    pub async fn similarity_search(
        &self,
        query: &str,
        limit: u64,
        filter: Option<PayloadFilter>,
    ) -> Result<Vec<ScoredDocument>, VectorDbError> {
        let vector = self.embedder.embed(query).await?;
        let results = self
            .store
            .search(&self.collection, vector, limit, filter)
            .await?;

        results
            .into_iter()
            .map(|p| {
                let document =
                    serde_json::from_value(serde_json::Value::Object(p.payload.into_iter().collect()))?;
                Ok(ScoredDocument {
                    id: p.id,
                    score: p.score,
                    document,
                })
            })
            .collect()
    }
}
