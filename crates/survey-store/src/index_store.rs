//! Response index: survey id to the ids of its responses.
//!
//! The index is a cache stored in `.survey/indexes/`. It can be rebuilt
//! from the records directory at any time via `rebuild_all()`.

use crate::error::StoreError;
use crate::lockfile::{Lockfile, DEFAULT_ATTEMPTS};
use crate::records::RecordDatabase;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use survey_core::id::RecordId;
use survey_core::model::Response;

const INDEX_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexFile {
    version: u32,
    entries: BTreeMap<String, Vec<String>>,
}

impl Default for IndexFile {
    fn default() -> Self {
        Self {
            version: INDEX_VERSION,
            entries: BTreeMap::new(),
        }
    }
}

pub struct IndexStore {
    indexes_dir: PathBuf,
}

impl IndexStore {
    pub fn new(indexes_dir: impl Into<PathBuf>) -> Self {
        Self {
            indexes_dir: indexes_dir.into(),
        }
    }

    pub fn ensure_dir(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.indexes_dir)?;
        Ok(())
    }

    fn responses_path(&self) -> PathBuf {
        self.indexes_dir.join("responses.json")
    }

    /// Read the index. A missing file is an empty index; a malformed one is
    /// an error, so edits never overwrite entries they could not read.
    fn load(path: &Path) -> Result<IndexFile, StoreError> {
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(IndexFile::default()),
            Err(e) => return Err(StoreError::Io(e)),
        };
        serde_json::from_str(&data).map_err(|e| StoreError::CorruptIndex {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Load, change and save the index under its lock.
    fn edit(&self, apply: impl FnOnce(&mut IndexFile)) -> Result<(), StoreError> {
        self.ensure_dir()?;
        let path = self.responses_path();
        let mut lock = Lockfile::acquire_with_retry(&path, DEFAULT_ATTEMPTS)?;
        let mut index = Self::load(&path)?;
        apply(&mut index);
        lock.write_all(serde_json::to_string_pretty(&index)?.as_bytes())?;
        lock.commit()
    }

    pub fn add_response(&self, survey_id: &RecordId, response_id: &RecordId) -> Result<(), StoreError> {
        self.edit(|index| {
            let ids = index.entries.entry(survey_id.hex().to_string()).or_default();
            if !ids.iter().any(|id| id == response_id.hex()) {
                ids.push(response_id.hex().to_string());
            }
        })
    }

    pub fn remove_response(&self, survey_id: &RecordId, response_id: &RecordId) -> Result<(), StoreError> {
        self.edit(|index| {
            if let Some(ids) = index.entries.get_mut(survey_id.hex()) {
                ids.retain(|id| id != response_id.hex());
                if ids.is_empty() {
                    index.entries.remove(survey_id.hex());
                }
            }
        })
    }

    /// Drop a survey's entry. Missing entries are fine.
    pub fn remove_survey(&self, survey_id: &RecordId) -> Result<(), StoreError> {
        self.edit(|index| {
            index.entries.remove(survey_id.hex());
        })
    }

    /// Response ids recorded for a survey, in insertion order.
    pub fn responses_for(&self, survey_id: &RecordId) -> Result<Vec<RecordId>, StoreError> {
        let index = Self::load(&self.responses_path())?;
        let Some(ids) = index.entries.get(survey_id.hex()) else {
            return Ok(Vec::new());
        };
        ids.iter().map(|id| RecordId::parse(id).map_err(StoreError::from)).collect()
    }

    /// Rebuild the index from every stored response. Returns the number of
    /// responses indexed.
    pub fn rebuild_all(&self, records: &RecordDatabase) -> Result<usize, StoreError> {
        let mut responses: Vec<Response> = records.iter_all()?;
        responses.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at));
        let count = responses.len();
        let mut index = IndexFile::default();
        for response in &responses {
            index
                .entries
                .entry(response.survey_id.hex().to_string())
                .or_default()
                .push(response.id.hex().to_string());
        }

        self.ensure_dir()?;
        let mut lock = Lockfile::acquire_with_retry(self.responses_path(), DEFAULT_ATTEMPTS)?;
        lock.write_all(serde_json::to_string_pretty(&index)?.as_bytes())?;
        lock.commit()?;
        log::info!("rebuilt response index: {} responses", count);
        Ok(count)
    }
}
