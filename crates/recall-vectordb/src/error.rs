#[derive(Debug, thiserror::Error)]
pub enum VectorDbError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("vector store error: {0}")]
    Store(#[from] crate::vector_store::VectorStoreError),

    #[error("metadata filter error")]
    Filter,

    #[error("no embedding provider configured")]
    NoEmbedder,

    #[error("embedding error: {0}")]
    Embed(#[from] recall_embed::EmbedError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
