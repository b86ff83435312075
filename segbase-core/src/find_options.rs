// segbase-core/src/find_options.rs
// Find query options: limit, skip

use crate::document::Document;

/// Options for find queries
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    /// Limit: maximum number of documents to return
    pub limit: Option<usize>,

    /// Skip: number of documents to skip (for pagination)
    pub skip: Option<usize>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_skip(mut self, skip: usize) -> Self {
        self.skip = Some(skip);
        self
    }
}

/// Apply limit and skip to documents
pub fn apply_limit_skip(
    docs: Vec<Document>,
    limit: Option<usize>,
    skip: Option<usize>,
) -> Vec<Document> {
    let skip_count = skip.unwrap_or(0);

    if skip_count >= docs.len() {
        return Vec::new();
    }

    let start = skip_count;
    let end = if let Some(limit_count) = limit {
        (start + limit_count).min(docs.len())
    } else {
        docs.len()
    };

    docs[start..end].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn docs(values: &[i64]) -> Vec<Document> {
        values
            .iter()
            .map(|n| json!({"n": n}).as_object().unwrap().clone())
            .collect()
    }

    fn ns(docs: &[Document]) -> Vec<Value> {
        docs.iter().map(|d| d.get("n").unwrap().clone()).collect()
    }

    #[test]
    fn test_limit() {
        let result = apply_limit_skip(docs(&[1, 2, 3, 4, 5]), Some(3), None);
        assert_eq!(ns(&result), vec![json!(1), json!(2), json!(3)]);
    }

    #[test]
    fn test_skip() {
        let result = apply_limit_skip(docs(&[1, 2, 3, 4, 5]), None, Some(2));
        assert_eq!(ns(&result), vec![json!(3), json!(4), json!(5)]);
    }

    #[test]
    fn test_limit_skip() {
        let result = apply_limit_skip(docs(&[1, 2, 3, 4, 5]), Some(2), Some(1));
        assert_eq!(ns(&result), vec![json!(2), json!(3)]);
    }

    #[test]
    fn test_skip_beyond_length() {
        let result = apply_limit_skip(docs(&[1, 2]), None, Some(10));
        assert!(result.is_empty());
    }

    #[test]
    fn test_no_options_is_identity() {
        let result = apply_limit_skip(docs(&[1, 2, 3]), None, None);
        assert_eq!(result.len(), 3);
    }
}
