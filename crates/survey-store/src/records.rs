use crate::error::StoreError;
use crate::lockfile::{Lockfile, DEFAULT_ATTEMPTS};
use std::fs;
use std::path::{Path, PathBuf};
use survey_core::id::RecordId;
use survey_core::model::{Record, RecordKind};

/// Shortest hex prefix accepted by [`RecordDatabase::resolve_prefix`].
pub const MIN_PREFIX_LEN: usize = 4;

/// Record database keyed by [`RecordId`].
///
/// Records are stored as `records/<kind>/<2-char fan-out>/<remaining 62 chars>.json`.
/// Every write goes through a [`Lockfile`] on the record's path.
pub struct RecordDatabase {
    records_dir: PathBuf,
}

impl RecordDatabase {
    pub fn new(records_dir: impl Into<PathBuf>) -> Self {
        Self {
            records_dir: records_dir.into(),
        }
    }

    pub fn ensure_dirs(&self) -> Result<(), StoreError> {
        for kind in RecordKind::ALL {
            fs::create_dir_all(self.records_dir.join(kind.as_str()))?;
        }
        Ok(())
    }

    fn kind_dir(&self, kind: RecordKind) -> PathBuf {
        self.records_dir.join(kind.as_str())
    }

    fn record_path(&self, kind: RecordKind, id: &RecordId) -> PathBuf {
        let (dir, file) = id.fan_out();
        self.kind_dir(kind).join(dir).join(format!("{}.json", file))
    }

    pub fn exists<R: Record>(&self, id: &RecordId) -> bool {
        self.record_path(R::KIND, id).exists()
    }

    /// Store a new record. Fails if a record with the same id exists.
    pub fn insert<R: Record>(&self, record: &R) -> Result<(), StoreError> {
        let path = self.record_path(R::KIND, record.id());
        let mut lock = Lockfile::acquire_with_retry(&path, DEFAULT_ATTEMPTS)?;
        if path.exists() {
            return Err(StoreError::AlreadyExists {
                entity: R::KIND.as_str(),
                id: record.id().hex().to_string(),
            });
        }
        lock.write_all(&serde_json::to_vec_pretty(record)?)?;
        lock.commit()
    }

    pub fn read<R: Record>(&self, id: &RecordId) -> Result<R, StoreError> {
        read_at(&self.record_path(R::KIND, id), id)
    }

    /// Read-modify-write a record while holding its lock.
    ///
    /// Concurrent callers on the same record are serialized; `apply` sees the
    /// latest committed state.
    pub fn modify<R, T, F>(&self, id: &RecordId, apply: F) -> Result<(R, T), StoreError>
    where
        R: Record,
        F: FnOnce(&mut R) -> Result<T, StoreError>,
    {
        let path = self.record_path(R::KIND, id);
        let mut lock = Lockfile::acquire_with_retry(&path, DEFAULT_ATTEMPTS)?;
        let mut record: R = read_at(&path, id)?;
        let out = apply(&mut record)?;
        lock.write_all(&serde_json::to_vec_pretty(&record)?)?;
        lock.commit()?;
        Ok((record, out))
    }

    pub fn remove<R: Record>(&self, id: &RecordId) -> Result<(), StoreError> {
        let path = self.record_path(R::KIND, id);
        if !path.exists() {
            return Err(StoreError::not_found(R::KIND.as_str(), id.hex()));
        }
        Lockfile::acquire_with_retry(&path, DEFAULT_ATTEMPTS)?.remove_target()
    }

    /// Every stored record of kind `R`. Unreadable files are skipped with a warning.
    pub fn iter_all<R: Record>(&self) -> Result<Vec<R>, StoreError> {
        let mut results = Vec::new();
        let entries = match fs::read_dir(self.kind_dir(R::KIND)) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(results),
            Err(e) => return Err(StoreError::Io(e)),
        };
        for fan_entry in entries {
            let fan_entry = fan_entry?;
            let fan_name = fan_entry.file_name().to_string_lossy().to_string();
            if fan_name.len() != 2 || !fan_entry.path().is_dir() {
                continue;
            }
            for entry in fs::read_dir(fan_entry.path())? {
                let entry = entry?;
                let name = entry.file_name().to_string_lossy().to_string();
                let Some(rest) = name.strip_suffix(".json") else {
                    continue;
                };
                let Ok(id) = RecordId::parse(&format!("{}{}", fan_name, rest)) else {
                    continue;
                };
                match read_at::<R>(&entry.path(), &id) {
                    Ok(record) => results.push(record),
                    Err(e) => log::warn!("skipping {} {}: {}", R::KIND, id.short(), e),
                }
            }
        }
        Ok(results)
    }

    /// Resolve a full id or a hex prefix of at least [`MIN_PREFIX_LEN`] chars.
    pub fn resolve_prefix(&self, kind: RecordKind, prefix: &str) -> Result<RecordId, StoreError> {
        let prefix = prefix.trim().to_lowercase();
        if let Ok(id) = RecordId::parse(&prefix) {
            return Ok(id);
        }
        if prefix.len() < MIN_PREFIX_LEN || !prefix.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(StoreError::AmbiguousPrefix { prefix, count: 0 });
        }

        let (fan_out, rest_prefix) = prefix.split_at(2);
        let fan_dir = self.kind_dir(kind).join(fan_out);
        if !fan_dir.exists() {
            return Err(StoreError::not_found(kind.as_str(), prefix));
        }

        let mut matches = Vec::new();
        for entry in fs::read_dir(&fan_dir)? {
            let name = entry?.file_name().to_string_lossy().to_string();
            if let Some(rest) = name.strip_suffix(".json") {
                if rest.starts_with(rest_prefix) {
                    matches.push(format!("{}{}", fan_out, rest));
                }
            }
        }

        match matches.len() {
            0 => Err(StoreError::not_found(kind.as_str(), prefix)),
            1 => Ok(RecordId::parse(&matches[0])?),
            n => Err(StoreError::AmbiguousPrefix { prefix, count: n }),
        }
    }
}

fn read_at<R: Record>(path: &Path, id: &RecordId) -> Result<R, StoreError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StoreError::not_found(R::KIND.as_str(), id.hex()));
        }
        Err(e) => return Err(StoreError::Io(e)),
    };
    let record: R = serde_json::from_slice(&bytes)?;
    if record.id() != id {
        return Err(StoreError::IntegrityError {
            expected: id.hex().to_string(),
            actual: record.id().hex().to_string(),
        });
    }
    Ok(record)
}
