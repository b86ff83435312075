// segbase-core/src/identifier.rs
// Segment-scoped document ids: "{segmentIndex}_{token}"
//
// The prefix before the first separator is the index of the segment that
// owns the document, which is what makes point lookup O(1) in segment
// count. Tokens only need a low collision probability at the configured
// length; unpredictability is not a requirement.

use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::config::TokenGenerator;
use crate::document::RecordMap;

/// Separator between the segment prefix and the token.
pub const ID_SEPARATOR: char = '_';

/// Token length used when none is configured.
pub const DEFAULT_TOKEN_LENGTH: usize = 12;

/// Total attempts before id allocation gives up.
pub const MAX_ID_ATTEMPTS: u32 = 3;

/// Produces collision-checked, segment-scoped ids.
pub struct IdAllocator {
    token_length: usize,
    generator: Option<TokenGenerator>,
}

impl IdAllocator {
    pub fn new(token_length: usize, generator: Option<TokenGenerator>) -> Self {
        IdAllocator {
            token_length,
            generator,
        }
    }

    fn token(&self) -> String {
        match self.generator.as_deref() {
            Some(generate) => generate(),
            None => random_token(self.token_length),
        }
    }

    /// Generate an id for a document entering the given segment.
    ///
    /// Candidates colliding with a key of `existing` are retried with a
    /// fresh token, [`MAX_ID_ATTEMPTS`] attempts total; `None` means the
    /// budget is spent and the caller should fail the operation.
    pub fn generate(&self, segment_index: u64, existing: &RecordMap) -> Option<String> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = format!("{}{}{}", segment_index, ID_SEPARATOR, self.token());
            if !existing.contains_key(&id) {
                return Some(id);
            }
        }
        None
    }
}

/// Fixed-length random token over `[A-Za-z0-9]`.
pub fn random_token(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Parse the owning segment index out of an id. The first separator wins,
/// so tokens containing `_` still resolve correctly. `None` for ids not
/// minted by this scheme.
pub fn segment_index_of(id: &str) -> Option<u64> {
    let (prefix, _) = id.split_once(ID_SEPARATOR)?;
    prefix.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_random_token_length_and_charset() {
        let token = random_token(DEFAULT_TOKEN_LENGTH);
        assert_eq!(token.len(), DEFAULT_TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_generated_id_carries_segment_prefix() {
        let allocator = IdAllocator::new(8, None);
        let id = allocator.generate(7, &RecordMap::new()).unwrap();
        assert!(id.starts_with("7_"));
        assert_eq!(segment_index_of(&id), Some(7));
        assert_eq!(id.len(), "7_".len() + 8);
    }

    #[test]
    fn test_collision_retries_with_fresh_token() {
        let mut existing = RecordMap::new();
        existing.insert("0_aaaa".to_string(), json!({}));

        // First candidate collides, the retry does not
        let tokens = Arc::new(parking_lot::Mutex::new(vec!["bbbb", "aaaa"]));
        let allocator = IdAllocator::new(4, Some(Arc::new(move || {
            tokens.lock().pop().unwrap().to_string()
        })));

        let id = allocator.generate(0, &existing).unwrap();
        assert_eq!(id, "0_bbbb");
    }

    #[test]
    fn test_exhaustion_after_three_attempts() {
        let mut existing = RecordMap::new();
        existing.insert("0_fixed".to_string(), json!({}));

        let calls = Arc::new(std::sync::atomic::AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let allocator = IdAllocator::new(5, Some(Arc::new(move || {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            "fixed".to_string()
        })));

        assert!(allocator.generate(0, &existing).is_none());
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), MAX_ID_ATTEMPTS);
    }

    #[test]
    fn test_segment_index_of_rejects_malformed_ids() {
        assert_eq!(segment_index_of("no-separator"), None);
        assert_eq!(segment_index_of("abc_def"), None);
        assert_eq!(segment_index_of("-1_tok"), None);
        assert_eq!(segment_index_of(""), None);
    }

    #[test]
    fn test_segment_index_of_underscored_token() {
        // Only the first separator delimits the prefix
        assert_eq!(segment_index_of("12_a_b_c"), Some(12));
        assert_eq!(segment_index_of("3__"), Some(3));
    }

    proptest! {
        #[test]
        fn prop_prefix_parse_roundtrip(index in any::<u64>(), token in "[A-Za-z0-9_]{1,32}") {
            let id = format!("{}{}{}", index, ID_SEPARATOR, token);
            prop_assert_eq!(segment_index_of(&id), Some(index));
        }
    }
}
