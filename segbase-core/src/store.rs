// segbase-core/src/store.rs
// The CRUD/bulk facade composing segments, ids, gate, query and merge
//
// Mutation protocol, per operation: acquire the collection gate -> resolve
// the target segment -> load its record map -> mutate -> persist -> release
// (RAII). Reads never take the gate: point reads compute the one segment
// implied by the id prefix, scans enumerate all segments.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;

use crate::config::{FilterOverride, Normalizer, StoreOptions};
use crate::document::{Document, ID_FIELD};
use crate::error::{Result, SegBaseError};
use crate::find_options::{apply_limit_skip, FindOptions};
use crate::gate::CollectionGate;
use crate::identifier::{segment_index_of, IdAllocator, DEFAULT_TOKEN_LENGTH, MAX_ID_ATTEMPTS};
use crate::merge::merge_into;
use crate::query::{matches_filter, Filter};
use crate::segment::SegmentStore;
use crate::{log_debug, log_trace};

struct StoreInner {
    segments: SegmentStore,
    gate: CollectionGate,
    ids: IdAllocator,
    normalizer: Option<Normalizer>,
    filter_override: Option<FilterOverride>,
}

/// An embedded document store rooted at one base directory.
///
/// Cheap to clone; clones share state. Collections spring into existence
/// on first access, one directory of segment files each.
#[derive(Clone)]
pub struct DocumentStore {
    inner: Arc<StoreInner>,
    base_path: PathBuf,
}

impl DocumentStore {
    /// Open a store rooted at `base_path`, creating the directory if
    /// missing. All options are fixed for the lifetime of the store.
    pub fn open<P: AsRef<Path>>(base_path: P, options: StoreOptions) -> Result<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;

        let token_length = options.id_token_length.unwrap_or(DEFAULT_TOKEN_LENGTH);
        let inner = StoreInner {
            segments: SegmentStore::new(
                base_path.clone(),
                options.max_segment_bytes,
                options.max_items_per_segment,
            ),
            gate: CollectionGate::new(),
            ids: IdAllocator::new(token_length, options.token_generator),
            normalizer: options.normalizer,
            filter_override: options.filter_override,
        };
        log_debug!("opened store at {}", base_path.display());

        Ok(DocumentStore {
            inner: Arc::new(inner),
            base_path,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Handle to a named collection. No I/O happens until an operation
    /// runs; the directory appears on first access.
    pub fn collection(&self, name: &str) -> Collection {
        Collection {
            inner: Arc::clone(&self.inner),
            name: name.to_string(),
        }
    }
}

/// Handle to one collection of a [`DocumentStore`].
#[derive(Clone)]
pub struct Collection {
    inner: Arc<StoreInner>,
    name: String,
}

impl Collection {
    pub fn name(&self) -> &str {
        &self.name
    }

    // ========== WRITES (gated) ==========

    /// Insert one document. The store assigns its id and returns the
    /// stored form.
    pub fn insert_one(&self, doc: Document) -> Result<Document> {
        let gate = self.inner.gate.acquire(&self.name);
        let _guard = gate.lock();
        self.insert_locked(doc)
    }

    /// Insert many documents under a single gate hold. Returns the created
    /// documents in input order. Capacity rollover mid-batch behaves
    /// exactly like a sequence of single inserts.
    pub fn insert_many(&self, docs: Vec<Document>) -> Result<Vec<Document>> {
        let gate = self.inner.gate.acquire(&self.name);
        let _guard = gate.lock();

        let mut created = Vec::with_capacity(docs.len());
        for doc in docs {
            created.push(self.insert_locked(doc)?);
        }
        log_debug!("inserted {} documents into '{}'", created.len(), self.name);
        Ok(created)
    }

    fn insert_locked(&self, mut doc: Document) -> Result<Document> {
        let (index, file_name) = self.inner.segments.writable_segment(&self.name)?;
        let mut records = self.inner.segments.read_segment(&self.name, &file_name)?;

        let id = self
            .inner
            .ids
            .generate(index, &records)
            .ok_or_else(|| SegBaseError::IdExhausted {
                collection: self.name.clone(),
                attempts: MAX_ID_ATTEMPTS,
            })?;

        doc.insert(ID_FIELD.to_string(), Value::String(id.clone()));
        records.insert(id, Value::Object(doc.clone()));
        self.inner
            .segments
            .write_segment(&self.name, &file_name, &records)?;
        log_trace!("insert into '{}' -> {}", self.name, file_name);
        Ok(doc)
    }

    /// Merge a partial update into the document with the given id. `None`
    /// when the id is absent. The document stays in its segment; its `id`
    /// field survives any patch.
    pub fn update_one(&self, id: &str, patch: &Document) -> Result<Option<Document>> {
        let gate = self.inner.gate.acquire(&self.name);
        let _guard = gate.lock();

        let Some(index) = segment_index_of(id) else {
            return Ok(None);
        };
        let file_name = SegmentStore::segment_file_name(index);
        let mut records = self.inner.segments.read_segment(&self.name, &file_name)?;

        let Some(Value::Object(doc)) = records.get_mut(id) else {
            return Ok(None);
        };
        merge_into(doc, patch);
        doc.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
        let merged = doc.clone();

        self.inner
            .segments
            .write_segment(&self.name, &file_name, &records)?;
        Ok(Some(merged))
    }

    /// Apply many partial updates under a single gate hold, grouped by
    /// owning segment so each touched segment is rewritten once. Entries
    /// whose id is absent are silently skipped; the result keeps input
    /// order of the entries that were found.
    pub fn update_many(&self, updates: &[(String, Document)]) -> Result<Vec<Document>> {
        let gate = self.inner.gate.acquire(&self.name);
        let _guard = gate.lock();

        let mut by_segment: BTreeMap<u64, Vec<usize>> = BTreeMap::new();
        for (pos, (id, _)) in updates.iter().enumerate() {
            if let Some(index) = segment_index_of(id) {
                by_segment.entry(index).or_default().push(pos);
            }
        }

        let mut updated: Vec<(usize, Document)> = Vec::new();
        for (index, positions) in by_segment {
            let file_name = SegmentStore::segment_file_name(index);
            let mut records = self.inner.segments.read_segment(&self.name, &file_name)?;
            let mut touched = false;

            for pos in positions {
                let (id, patch) = &updates[pos];
                let Some(Value::Object(doc)) = records.get_mut(id.as_str()) else {
                    continue;
                };
                merge_into(doc, patch);
                doc.insert(ID_FIELD.to_string(), Value::String(id.clone()));
                updated.push((pos, doc.clone()));
                touched = true;
            }

            if touched {
                self.inner
                    .segments
                    .write_segment(&self.name, &file_name, &records)?;
            }
        }

        updated.sort_by_key(|(pos, _)| *pos);
        Ok(updated.into_iter().map(|(_, doc)| doc).collect())
    }

    /// Remove the document with the given id. `false` when it was already
    /// absent; deleting an absent id never fails. The segment file is not
    /// rewritten in that case.
    pub fn delete_one(&self, id: &str) -> Result<bool> {
        let gate = self.inner.gate.acquire(&self.name);
        let _guard = gate.lock();

        let Some(index) = segment_index_of(id) else {
            return Ok(false);
        };
        let file_name = SegmentStore::segment_file_name(index);
        let mut records = self.inner.segments.read_segment(&self.name, &file_name)?;

        if records.remove(id).is_none() {
            return Ok(false);
        }
        self.inner
            .segments
            .write_segment(&self.name, &file_name, &records)?;
        Ok(true)
    }

    /// Remove many documents, grouped by owning segment. Returns the count
    /// actually removed. An emptied record map is persisted as `{}`; the
    /// segment file itself is never deleted.
    pub fn delete_many(&self, ids: &[&str]) -> Result<usize> {
        let gate = self.inner.gate.acquire(&self.name);
        let _guard = gate.lock();

        let mut by_segment: BTreeMap<u64, Vec<&str>> = BTreeMap::new();
        for id in ids {
            if let Some(index) = segment_index_of(id) {
                by_segment.entry(index).or_default().push(id);
            }
        }

        let mut removed = 0;
        for (index, segment_ids) in by_segment {
            let file_name = SegmentStore::segment_file_name(index);
            let mut records = self.inner.segments.read_segment(&self.name, &file_name)?;
            let mut touched = false;

            for id in segment_ids {
                if records.remove(id).is_some() {
                    removed += 1;
                    touched = true;
                }
            }

            if touched {
                self.inner
                    .segments
                    .write_segment(&self.name, &file_name, &records)?;
            }
        }

        log_debug!("deleted {} documents from '{}'", removed, self.name);
        Ok(removed)
    }

    // ========== READS (ungated) ==========

    /// Scan every segment in index order and return the documents matching
    /// the filter, in segment-then-insertion order, then paginated.
    pub fn find(&self, filter: &Filter, options: &FindOptions) -> Result<Vec<Document>> {
        let mut matched = Vec::new();
        for file_name in self.inner.segments.list_segments(&self.name)? {
            let records = self.inner.segments.read_segment(&self.name, &file_name)?;
            for (_, stored) in records {
                let Value::Object(doc) = stored else { continue };
                if self.matches(&doc, filter) {
                    matched.push(doc);
                }
            }
        }
        Ok(apply_limit_skip(matched, options.limit, options.skip))
    }

    /// Point lookup: the owning segment is parsed from the id, so this
    /// reads exactly one file regardless of collection size. An id not
    /// minted by this store reads as not-found.
    pub fn find_by_id(&self, id: &str) -> Result<Option<Document>> {
        let Some(index) = segment_index_of(id) else {
            return Ok(None);
        };
        let file_name = SegmentStore::segment_file_name(index);
        let records = self.inner.segments.read_segment(&self.name, &file_name)?;
        Ok(records.get(id).and_then(Value::as_object).cloned())
    }

    /// Point lookups batched by owning segment: each segment is read once.
    /// Returns found documents only, grouped by segment in ascending index
    /// order - input order is not preserved.
    pub fn find_by_ids(&self, ids: &[&str]) -> Result<Vec<Document>> {
        let mut by_segment: BTreeMap<u64, Vec<&str>> = BTreeMap::new();
        for id in ids {
            if let Some(index) = segment_index_of(id) {
                by_segment.entry(index).or_default().push(id);
            }
        }

        let mut found = Vec::new();
        for (index, segment_ids) in by_segment {
            let file_name = SegmentStore::segment_file_name(index);
            let records = self.inner.segments.read_segment(&self.name, &file_name)?;
            for id in segment_ids {
                if let Some(doc) = records.get(id).and_then(Value::as_object) {
                    found.push(doc.clone());
                }
            }
        }
        Ok(found)
    }

    /// Run the matching pipeline for one document: normalize (when
    /// configured), then either the override or the built-in rules. The
    /// stored document is what callers get back, never the normalized one.
    fn matches(&self, doc: &Document, filter: &Filter) -> bool {
        let candidate: Cow<'_, Document> = match self.inner.normalizer.as_deref() {
            Some(normalize) => Cow::Owned(normalize(doc)),
            None => Cow::Borrowed(doc),
        };
        match self.inner.filter_override.as_deref() {
            Some(matcher) => matcher(&candidate, filter),
            None => matches_filter(&candidate, filter),
        }
    }
}
