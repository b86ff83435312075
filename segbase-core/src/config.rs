// segbase-core/src/config.rs
// Store construction options: capacity limits and caller hooks

use std::fmt;
use std::sync::Arc;

use crate::document::Document;
use crate::query::Filter;

/// Pluggable token generator for document ids. Returns the opaque part of
/// an id; the segment prefix and separator are added by the allocator.
pub type TokenGenerator = Arc<dyn Fn() -> String + Send + Sync>;

/// Pure document transform applied before filter matching, e.g. to compute
/// derived fields. Stored documents are never modified by it.
pub type Normalizer = Arc<dyn Fn(&Document) -> Document + Send + Sync>;

/// Replacement for the built-in matching algorithm. When set, the built-in
/// rules are skipped entirely.
pub type FilterOverride = Arc<dyn Fn(&Document, &Filter) -> bool + Send + Sync>;

/// Options fixed at store construction time.
///
/// Either, both, or neither segment limit may be active; if both are set,
/// whichever is hit first rolls the collection over to a new segment.
#[derive(Clone, Default)]
pub struct StoreOptions {
    /// Maximum serialized byte size of the writable segment
    pub max_segment_bytes: Option<u64>,

    /// Maximum document count of the writable segment
    pub max_items_per_segment: Option<usize>,

    /// Length of generated id tokens (default applies when unset)
    pub id_token_length: Option<usize>,

    /// Custom id token generator
    pub token_generator: Option<TokenGenerator>,

    /// Document normalizer applied before matching
    pub normalizer: Option<Normalizer>,

    /// Full replacement of the filter-matching algorithm
    pub filter_override: Option<FilterOverride>,
}

impl StoreOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_segment_bytes(mut self, bytes: u64) -> Self {
        self.max_segment_bytes = Some(bytes);
        self
    }

    pub fn with_max_items_per_segment(mut self, items: usize) -> Self {
        self.max_items_per_segment = Some(items);
        self
    }

    pub fn with_id_token_length(mut self, length: usize) -> Self {
        self.id_token_length = Some(length);
        self
    }

    pub fn with_token_generator<F>(mut self, generator: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.token_generator = Some(Arc::new(generator));
        self
    }

    pub fn with_normalizer<F>(mut self, normalizer: F) -> Self
    where
        F: Fn(&Document) -> Document + Send + Sync + 'static,
    {
        self.normalizer = Some(Arc::new(normalizer));
        self
    }

    pub fn with_filter_override<F>(mut self, matcher: F) -> Self
    where
        F: Fn(&Document, &Filter) -> bool + Send + Sync + 'static,
    {
        self.filter_override = Some(Arc::new(matcher));
        self
    }
}

impl fmt::Debug for StoreOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreOptions")
            .field("max_segment_bytes", &self.max_segment_bytes)
            .field("max_items_per_segment", &self.max_items_per_segment)
            .field("id_token_length", &self.id_token_length)
            .field("token_generator", &self.token_generator.is_some())
            .field("normalizer", &self.normalizer.is_some())
            .field("filter_override", &self.filter_override.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_unlimited() {
        let options = StoreOptions::new();
        assert_eq!(options.max_segment_bytes, None);
        assert_eq!(options.max_items_per_segment, None);
        assert_eq!(options.id_token_length, None);
        assert!(options.token_generator.is_none());
        assert!(options.normalizer.is_none());
        assert!(options.filter_override.is_none());
    }

    #[test]
    fn test_builder_chain() {
        let options = StoreOptions::new()
            .with_max_segment_bytes(4096)
            .with_max_items_per_segment(100)
            .with_id_token_length(8)
            .with_token_generator(|| "token".to_string());

        assert_eq!(options.max_segment_bytes, Some(4096));
        assert_eq!(options.max_items_per_segment, Some(100));
        assert_eq!(options.id_token_length, Some(8));
        let generate = options.token_generator.unwrap();
        assert_eq!(generate.as_ref()(), "token");
    }
}
