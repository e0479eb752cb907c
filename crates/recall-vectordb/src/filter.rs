//! Translation of metadata filters into payload query filters.

use crate::vector_store::{Condition, FieldValue, PayloadFilter};

/// One metadata constraint: the payload field `key` must equal any of
/// `values`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataFilter {
    pub key: String,
    pub values: Vec<String>,
}

impl MetadataFilter {
    #[must_use]
    pub fn new(key: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            key: key.into(),
            values,
        }
    }

    fn is_malformed(&self) -> bool {
        self.key.is_empty() || self.values.is_empty()
    }

    fn to_condition(&self) -> Condition {
        Condition {
            field: self.key.clone(),
            value: FieldValue::Keywords(self.values.clone()),
        }
    }
}

/// Translate metadata filters into a payload filter.
///
/// A single filter becomes one exact-match condition; several become a
/// `should` disjunction. Malformed input (no filters, an empty key, or an
/// empty values list) yields `None` rather than an error.
#[must_use]
pub fn to_payload_filter(filters: &[MetadataFilter]) -> Option<PayloadFilter> {
    if filters.is_empty() || filters.iter().any(MetadataFilter::is_malformed) {
        return None;
    }

    if let [only] = filters {
        return Some(PayloadFilter {
            must: vec![only.to_condition()],
            should: vec![],
        });
    }

    Some(PayloadFilter {
        must: vec![],
        should: filters.iter().map(MetadataFilter::to_condition).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_none() {
        assert_eq!(to_payload_filter(&[]), None);
    }

    #[test]
    fn single_filter_becomes_must_condition() {
        let filters = [MetadataFilter::new("source", vec!["files__default: 1".into()])];
        let f = to_payload_filter(&filters).unwrap();
        assert_eq!(f.must.len(), 1);
        assert!(f.should.is_empty());
        assert_eq!(f.must[0].field, "source");
        assert_eq!(
            f.must[0].value,
            FieldValue::Keywords(vec!["files__default: 1".into()])
        );
    }

    #[test]
    fn multiple_filters_become_should_disjunction() {
        let filters = [
            MetadataFilter::new("source", vec!["a".into()]),
            MetadataFilter::new("provider", vec!["files".into(), "mail".into()]),
        ];
        let f = to_payload_filter(&filters).unwrap();
        assert!(f.must.is_empty());
        assert_eq!(f.should.len(), 2);
        assert_eq!(f.should[1].field, "provider");
    }

    #[test]
    fn empty_values_is_swallowed_as_none() {
        let filters = [MetadataFilter::new("source", vec![])];
        assert_eq!(to_payload_filter(&filters), None);
    }

    #[test]
    fn empty_key_is_swallowed_as_none() {
        let filters = [
            MetadataFilter::new("source", vec!["a".into()]),
            MetadataFilter::new("", vec!["b".into()]),
        ];
        assert_eq!(to_payload_filter(&filters), None);
    }
}
