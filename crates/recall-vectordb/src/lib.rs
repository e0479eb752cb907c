//! Per-user Qdrant collections behind a generic vector-store interface.

pub mod collection;
pub mod config;
pub mod db;
pub mod error;
pub mod filter;
pub mod in_memory;
pub mod qdrant;
pub mod vector_store;

pub use collection::CollectionSchema;
pub use config::VectorDbConfig;
pub use db::{Document, ObjectMeta, ScoredDocument, UserClient, VectorDb};
pub use error::VectorDbError;
pub use filter::MetadataFilter;
pub use vector_store::{
    Condition, FieldValue, PayloadFilter, PayloadPoint, ScoredPoint, VectorPoint, VectorStore,
    VectorStoreError,
};
