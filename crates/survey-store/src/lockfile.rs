use crate::error::StoreError;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

/// Attempts made by [`Lockfile::acquire_with_retry`] before giving up.
pub const DEFAULT_ATTEMPTS: u32 = 50;
const BACKOFF_STEP: Duration = Duration::from_millis(5);

/// A lock file guarding writes to a target path.
///
/// Creates `<target>.lock` exclusively, writes data to it, then renames it
/// over `<target>` on commit. An uncommitted lock is removed on drop.
pub struct Lockfile {
    target: PathBuf,
    lock_path: PathBuf,
    file: Option<fs::File>,
}

impl Lockfile {
    /// Acquire the lock for `target`, failing at once if someone holds it.
    pub fn acquire(target: impl AsRef<Path>) -> Result<Self, StoreError> {
        let target = target.as_ref().to_path_buf();
        let lock_path = target.with_extension(
            target
                .extension()
                .map(|e| format!("{}.lock", e.to_string_lossy()))
                .unwrap_or_else(|| "lock".to_string()),
        );

        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent)?;
        }

        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
        {
            Ok(file) => Ok(Self {
                target,
                lock_path,
                file: Some(file),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(StoreError::LockConflict(lock_path.display().to_string()))
            }
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    /// Acquire the lock, waiting with linear backoff while it is held.
    pub fn acquire_with_retry(target: impl AsRef<Path>, attempts: u32) -> Result<Self, StoreError> {
        let target = target.as_ref();
        let mut attempt = 0;
        loop {
            match Self::acquire(target) {
                Err(StoreError::LockConflict(path)) => {
                    attempt += 1;
                    if attempt >= attempts {
                        return Err(StoreError::LockConflict(path));
                    }
                    thread::sleep(BACKOFF_STEP * attempt);
                }
                other => return other,
            }
        }
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn write_all(&mut self, data: &[u8]) -> Result<(), StoreError> {
        if let Some(ref mut file) = self.file {
            file.write_all(data)?;
            file.flush()?;
            Ok(())
        } else {
            Err(StoreError::LockConflict(
                "lock file already committed or dropped".into(),
            ))
        }
    }

    /// Atomically replace the target with the written data.
    pub fn commit(mut self) -> Result<(), StoreError> {
        self.file.take();
        fs::rename(&self.lock_path, &self.target)?;
        Ok(())
    }

    /// Release the lock and delete the target.
    pub fn remove_target(mut self) -> Result<(), StoreError> {
        self.file.take();
        let removed = fs::remove_file(&self.target);
        let _ = fs::remove_file(&self.lock_path);
        removed?;
        Ok(())
    }
}

impl Drop for Lockfile {
    fn drop(&mut self) {
        if self.file.is_some() {
            let _ = fs::remove_file(&self.lock_path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn lock_write_commit() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("survey.json");

        let mut lock = Lockfile::acquire(&target).unwrap();
        lock.write_all(b"{}").unwrap();
        lock.commit().unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "{}");
        assert!(!target.with_extension("json.lock").exists());
    }

    #[test]
    fn lock_dropped_without_commit() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("survey.json");
        {
            let mut lock = Lockfile::acquire(&target).unwrap();
            lock.write_all(b"{}").unwrap();
        }
        assert!(!target.exists());
        assert!(Lockfile::acquire(&target).is_ok());
    }

    #[test]
    fn double_lock_fails() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("survey.json");
        let _held = Lockfile::acquire(&target).unwrap();
        assert!(matches!(
            Lockfile::acquire(&target),
            Err(StoreError::LockConflict(_))
        ));
        assert!(Lockfile::acquire_with_retry(&target, 3).is_err());
    }

    #[test]
    fn retry_waits_for_release() {
        let dir = Arc::new(tempfile::tempdir().unwrap());
        let target = dir.path().join("counter.json");
        let held = Lockfile::acquire(&target).unwrap();
        let releaser = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            drop(held);
        });
        let lock = Lockfile::acquire_with_retry(&target, DEFAULT_ATTEMPTS);
        releaser.join().unwrap();
        assert!(lock.is_ok());
    }

    #[test]
    fn remove_target_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("gone.json");
        fs::write(&target, "{}").unwrap();
        let lock = Lockfile::acquire(&target).unwrap();
        lock.remove_target().unwrap();
        assert!(!target.exists());
        assert!(!target.with_extension("json.lock").exists());
    }
}
