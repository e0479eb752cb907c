//! Per-user collection naming and the fixed payload schema.

/// Every user gets exactly one collection, named with this prefix.
const COLLECTION_PREFIX: &str = "Vector_";

/// Default embedding dimensionality when the config does not override it.
pub const DEFAULT_VECTOR_SIZE: u64 = 768;

/// Cap on vector-less metadata queries.
pub const METADATA_SCROLL_LIMIT: u32 = 100;

#[must_use]
pub fn collection_name(user_id: &str) -> String {
    format!("{COLLECTION_PREFIX}{user_id}")
}

/// Reverse of [`collection_name`]. Returns `None` for collections that do
/// not belong to this adapter.
#[must_use]
pub fn user_id_from_collection(collection: &str) -> Option<&str> {
    collection.strip_prefix(COLLECTION_PREFIX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFieldKind {
    Keyword,
    Integer,
}

#[derive(Debug, Clone)]
pub struct PayloadField {
    pub name: &'static str,
    pub kind: PayloadFieldKind,
}

/// Vector parameters plus the payload fields to index at provisioning time.
#[derive(Debug, Clone)]
pub struct CollectionSchema {
    pub vector_size: u64,
    pub payload_fields: Vec<PayloadField>,
}

impl CollectionSchema {
    /// The schema every user collection is provisioned with: chunk text and
    /// its source metadata, cosine-distance vectors of `vector_size` floats.
    #[must_use]
    pub fn for_user_collections(vector_size: u64) -> Self {
        use PayloadFieldKind::{Integer, Keyword};
        Self {
            vector_size,
            payload_fields: vec![
                PayloadField { name: "text", kind: Keyword },
                PayloadField { name: "type", kind: Keyword },
                PayloadField { name: "title", kind: Keyword },
                PayloadField { name: "source", kind: Keyword },
                PayloadField { name: "start_index", kind: Integer },
                PayloadField { name: "modified", kind: Keyword },
                PayloadField { name: "provider", kind: Keyword },
            ],
        }
    }
}
