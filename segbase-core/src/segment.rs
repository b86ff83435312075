// segbase-core/src/segment.rs
// Segment file lifecycle: discovery, rollover, read/write
//
// Layout on disk:
//
// ```text
// <base>/<collection>/segment_0.json
// <base>/<collection>/segment_1.json
// ...
// ```
//
// Each file is a JSON object mapping id -> document. A segment is created
// lazily by the first write targeting it and never deleted, even when its
// record map becomes empty.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::document::RecordMap;
use crate::error::Result;

pub const SEGMENT_PREFIX: &str = "segment_";
pub const SEGMENT_EXTENSION: &str = ".json";

/// Manages the segment files of every collection under one base directory.
pub struct SegmentStore {
    base_path: PathBuf,
    max_segment_bytes: Option<u64>,
    max_items_per_segment: Option<usize>,
}

impl SegmentStore {
    pub fn new(
        base_path: PathBuf,
        max_segment_bytes: Option<u64>,
        max_items_per_segment: Option<usize>,
    ) -> Self {
        SegmentStore {
            base_path,
            max_segment_bytes,
            max_items_per_segment,
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// File name of the segment with the given index.
    pub fn segment_file_name(index: u64) -> String {
        format!("{SEGMENT_PREFIX}{index}{SEGMENT_EXTENSION}")
    }

    /// Parse a segment index out of a file name; `None` for files that are
    /// not segment files.
    pub fn segment_index(file_name: &str) -> Option<u64> {
        file_name
            .strip_prefix(SEGMENT_PREFIX)?
            .strip_suffix(SEGMENT_EXTENSION)?
            .parse()
            .ok()
    }

    fn collection_dir(&self, collection: &str) -> PathBuf {
        self.base_path.join(collection)
    }

    /// Create the collection directory if missing. Folder creation on
    /// access is an accepted side effect, not an error.
    fn ensure_collection_dir(&self, collection: &str) -> Result<PathBuf> {
        let dir = self.collection_dir(collection);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    fn indexed_segments(&self, collection: &str) -> Result<Vec<(u64, String)>> {
        let dir = self.ensure_collection_dir(collection)?;
        let mut segments = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let name = entry?.file_name().to_string_lossy().into_owned();
            if let Some(index) = Self::segment_index(&name) {
                segments.push((index, name));
            }
        }
        segments.sort_by_key(|(index, _)| *index);
        Ok(segments)
    }

    /// Segment file names of a collection, ascending by numeric index.
    /// Files not matching the segment naming scheme are ignored.
    pub fn list_segments(&self, collection: &str) -> Result<Vec<String>> {
        Ok(self
            .indexed_segments(collection)?
            .into_iter()
            .map(|(_, name)| name)
            .collect())
    }

    /// Resolve the segment the next write should target.
    ///
    /// Only the tail segment is ever considered; earlier segments are never
    /// backfilled, even when under capacity. The tail rolls over to index
    /// tail+1 once its serialized byte size meets the size limit or its
    /// record count meets the count limit.
    pub fn writable_segment(&self, collection: &str) -> Result<(u64, String)> {
        let segments = self.indexed_segments(collection)?;
        let Some((last_index, last_name)) = segments.last() else {
            return Ok((0, Self::segment_file_name(0)));
        };

        let byte_len = match fs::metadata(self.collection_dir(collection).join(last_name)) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => 0,
            Err(e) => return Err(e.into()),
        };

        let mut roll = self
            .max_segment_bytes
            .map_or(false, |limit| byte_len >= limit);
        if !roll {
            if let Some(limit) = self.max_items_per_segment {
                roll = self.read_segment(collection, last_name)?.len() >= limit;
            }
        }

        if roll {
            let next = last_index + 1;
            Ok((next, Self::segment_file_name(next)))
        } else {
            Ok((*last_index, last_name.clone()))
        }
    }

    /// Load a segment's record map. An absent file is an empty segment;
    /// any other I/O failure propagates.
    pub fn read_segment(&self, collection: &str, file_name: &str) -> Result<RecordMap> {
        let path = self.collection_dir(collection).join(file_name);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(RecordMap::new()),
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Persist a segment's full record map, overwriting the file in one
    /// shot. There is no temp-file-then-rename step, so a reader racing
    /// this write may observe a truncated segment.
    pub fn write_segment(
        &self,
        collection: &str,
        file_name: &str,
        records: &RecordMap,
    ) -> Result<()> {
        let dir = self.ensure_collection_dir(collection)?;
        let bytes = serde_json::to_vec(records)?;
        fs::write(dir.join(file_name), bytes)?;
        Ok(())
    }
}
