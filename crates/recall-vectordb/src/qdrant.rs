//! Qdrant backend for [`VectorStore`].

use std::collections::HashMap;

use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    Condition as QdrantCondition, CreateCollectionBuilder, CreateFieldIndexCollectionBuilder,
    Distance, FieldType, Filter, PointId, PointStruct, ScrollPointsBuilder, SearchPointsBuilder,
    UpsertPointsBuilder, VectorParamsBuilder, point_id::PointIdOptions, value::Kind,
};

use crate::collection::{CollectionSchema, PayloadFieldKind};
use crate::vector_store::{
    BoxFuture, Condition, FieldValue, PayloadFilter, PayloadPoint, ScoredPoint, VectorPoint,
    VectorStore, VectorStoreError,
};

/// Thin wrapper over the [`Qdrant`] client.
pub struct QdrantStore {
    client: Qdrant,
}

impl std::fmt::Debug for QdrantStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QdrantStore").finish_non_exhaustive()
    }
}

impl QdrantStore {
    /// Connect to Qdrant at `url`, authenticating when `api_key` is set.
    ///
    /// # Errors
    ///
    /// Returns [`VectorStoreError::Connection`] if the client cannot be
    /// created.
    pub fn new(url: &str, api_key: Option<&str>) -> Result<Self, VectorStoreError> {
        let mut builder = Qdrant::from_url(url);
        if let Some(key) = api_key {
            builder = builder.api_key(key);
        }
        let client = builder
            .build()
            .map_err(|e| VectorStoreError::Connection(e.to_string()))?;
        Ok(Self { client })
    }
}

impl VectorStore for QdrantStore {
    fn ensure_collection(
        &self,
        collection: &str,
        schema: &CollectionSchema,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        let schema = schema.clone();
        Box::pin(async move {
            let exists = self
                .client
                .collection_exists(&collection)
                .await
                .map_err(|e| VectorStoreError::Collection(e.to_string()))?;
            if exists {
                return Ok(());
            }

            self.client
                .create_collection(
                    CreateCollectionBuilder::new(&collection).vectors_config(
                        VectorParamsBuilder::new(schema.vector_size, Distance::Cosine),
                    ),
                )
                .await
                .map_err(|e| VectorStoreError::Collection(e.to_string()))?;

            for field in &schema.payload_fields {
                let field_type = match field.kind {
                    PayloadFieldKind::Keyword => FieldType::Keyword,
                    PayloadFieldKind::Integer => FieldType::Integer,
                };
                self.client
                    .create_field_index(CreateFieldIndexCollectionBuilder::new(
                        &collection,
                        field.name,
                        field_type,
                    ))
                    .await
                    .map_err(|e| VectorStoreError::Collection(e.to_string()))?;
            }

            tracing::debug!(collection, "created collection");
            Ok(())
        })
    }

    fn collection_exists(&self, collection: &str) -> BoxFuture<'_, Result<bool, VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            self.client
                .collection_exists(&collection)
                .await
                .map_err(|e| VectorStoreError::Collection(e.to_string()))
        })
    }

    fn list_collections(&self) -> BoxFuture<'_, Result<Vec<String>, VectorStoreError>> {
        Box::pin(async move {
            let response = self
                .client
                .list_collections()
                .await
                .map_err(|e| VectorStoreError::Collection(e.to_string()))?;
            Ok(response.collections.into_iter().map(|c| c.name).collect())
        })
    }

    fn delete_collection(&self, collection: &str) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            self.client
                .delete_collection(&collection)
                .await
                .map_err(|e| VectorStoreError::Delete(e.to_string()))?;
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
            let qdrant_points = points
                .into_iter()
                .map(|p| {
                    let payload = json_to_payload(p.payload)?;
                    Ok(PointStruct::new(p.id, p.vector, payload))
                })
                .collect::<Result<Vec<_>, VectorStoreError>>()?;

            self.client
                .upsert_points(UpsertPointsBuilder::new(&collection, qdrant_points).wait(true))
                .await
                .map_err(|e| VectorStoreError::Upsert(e.to_string()))?;
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
            let mut builder =
                SearchPointsBuilder::new(&collection, vector, limit).with_payload(true);
            if let Some(f) = filter {
                builder = builder.filter(payload_filter_to_qdrant(f));
            }

            let results = self
                .client
                .search_points(builder)
                .await
                .map_err(|e| VectorStoreError::Search(e.to_string()))?;

            Ok(results
                .result
                .into_iter()
                .map(|p| ScoredPoint {
                    id: point_id_to_string(p.id),
                    score: p.score,
                    payload: payload_to_json(p.payload),
                })
                .collect())
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
            let mut builder = ScrollPointsBuilder::new(&collection)
                .with_payload(true)
                .with_vectors(false)
                .limit(limit);
            if let Some(f) = filter {
                builder = builder.filter(payload_filter_to_qdrant(f));
            }

            let response = self
                .client
                .scroll(builder)
                .await
                .map_err(|e| VectorStoreError::Scroll(e.to_string()))?;

            Ok(response
                .result
                .into_iter()
                .map(|p| PayloadPoint {
                    id: point_id_to_string(p.id),
                    payload: payload_to_json(p.payload),
                })
                .collect())
        })
    }
}

fn payload_filter_to_qdrant(filter: PayloadFilter) -> Filter {
    let must: Vec<_> = filter.must.into_iter().map(condition_to_qdrant).collect();
    let should: Vec<_> = filter.should.into_iter().map(condition_to_qdrant).collect();

    let mut f = Filter::default();
    if !must.is_empty() {
        f.must = must;
    }
    if !should.is_empty() {
        f.should = should;
    }
    f
}

fn condition_to_qdrant(cond: Condition) -> QdrantCondition {
    match cond.value {
        FieldValue::Integer(v) => QdrantCondition::matches(cond.field, v),
        FieldValue::Text(v) => QdrantCondition::matches(cond.field, v),
        FieldValue::Keywords(v) => QdrantCondition::matches(cond.field, v),
    }
}

fn json_to_payload(
    payload: HashMap<String, serde_json::Value>,
) -> Result<HashMap<String, qdrant_client::qdrant::Value>, VectorStoreError> {
    serde_json::from_value(serde_json::Value::Object(payload.into_iter().collect()))
        .map_err(|e| VectorStoreError::Serialization(e.to_string()))
}

fn payload_to_json(
    payload: HashMap<String, qdrant_client::qdrant::Value>,
) -> HashMap<String, serde_json::Value> {
    payload
        .into_iter()
        .filter_map(|(k, v)| {
            let json_val = match v.kind? {
                Kind::StringValue(s) => serde_json::Value::String(s),
                Kind::IntegerValue(i) => serde_json::Value::Number(i.into()),
                Kind::DoubleValue(d) => {
                    serde_json::Number::from_f64(d).map(serde_json::Value::Number)?
                }
                Kind::BoolValue(b) => serde_json::Value::Bool(b),
                _ => return None,
            };
            Some((k, json_val))
        })
        .collect()
}

fn point_id_to_string(id: Option<PointId>) -> String {
    match id.and_then(|pid| pid.point_id_options) {
        Some(PointIdOptions::Uuid(u)) => u,
        Some(PointIdOptions::Num(n)) => n.to_string(),
        None => String::new(),
    }
}
