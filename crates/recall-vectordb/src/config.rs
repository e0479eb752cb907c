use serde::{Deserialize, Serialize};

use crate::collection::DEFAULT_VECTOR_SIZE;

/// Connection settings for the vector database.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorDbConfig {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub vector_size: u64,
}

impl Default for VectorDbConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6334".into(),
            api_key: None,
            vector_size: DEFAULT_VECTOR_SIZE,
        }
    }
}

impl VectorDbConfig {
    /// Defaults overridden by `RECALL_QDRANT_URL` / `RECALL_QDRANT_APIKEY`.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("RECALL_QDRANT_URL") {
            self.url = v;
        }
        if let Ok(v) = std::env::var("RECALL_QDRANT_APIKEY") {
            self.api_key = Some(v);
        }
        if let Ok(v) = std::env::var("RECALL_VECTOR_SIZE") {
            if let Ok(size) = v.parse::<u64>() {
                self.vector_size = size;
            } else {
                tracing::warn!("ignoring invalid RECALL_VECTOR_SIZE value: {v}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn defaults() {
        let config = VectorDbConfig::default();
        assert_eq!(config.url, "http://localhost:6334");
        assert!(config.api_key.is_none());
        assert_eq!(config.vector_size, 768);
    }

    #[test]
    fn deserializes_from_toml_with_defaults() {
        let config: VectorDbConfig = toml::from_str("url = \"http://qdrant:6334\"").unwrap();
        assert_eq!(config.url, "http://qdrant:6334");
        assert_eq!(config.vector_size, 768);
    }

    #[test]
    fn api_key_not_serialized_when_absent() {
        let toml = toml::to_string(&VectorDbConfig::default()).unwrap();
        assert!(!toml.contains("api_key"));
    }

    #[test]
    #[serial]
    fn env_overrides_url_and_key() {
        unsafe { std::env::set_var("RECALL_QDRANT_URL", "http://remote:6334") };
        unsafe { std::env::set_var("RECALL_QDRANT_APIKEY", "secret") };
        let config = VectorDbConfig::from_env();
        unsafe { std::env::remove_var("RECALL_QDRANT_URL") };
        unsafe { std::env::remove_var("RECALL_QDRANT_APIKEY") };

        assert_eq!(config.url, "http://remote:6334");
        assert_eq!(config.api_key.as_deref(), Some("secret"));
    }

    #[test]
    #[serial]
    fn invalid_vector_size_is_ignored() {
        unsafe { std::env::set_var("RECALL_VECTOR_SIZE", "not-a-number") };
        let config = VectorDbConfig::from_env();
        unsafe { std::env::remove_var("RECALL_VECTOR_SIZE") };

        assert_eq!(config.vector_size, 768);
    }
}
