// segbase-core/src/lib.rs
// Pure Rust API - no binding or CLI dependencies

pub mod config;
pub mod document;
pub mod error;
pub mod find_options;
pub mod gate;
pub mod identifier;
pub mod logging;
pub mod merge;
pub mod query;
pub mod segment;
pub mod store;

// Public exports
pub use config::{FilterOverride, Normalizer, StoreOptions, TokenGenerator};
pub use document::{document_id, from_document, to_document, Document, RecordMap, ID_FIELD};
pub use error::{Result, SegBaseError};
pub use find_options::FindOptions;
pub use gate::CollectionGate;
pub use identifier::{segment_index_of, IdAllocator, DEFAULT_TOKEN_LENGTH, MAX_ID_ATTEMPTS};
pub use logging::{get_log_level, set_log_level, LogLevel};
pub use merge::merge_into;
pub use query::{filter_from_json, matches_filter, Filter, FilterValue, Predicate};
pub use segment::SegmentStore;
pub use store::{Collection, DocumentStore};
