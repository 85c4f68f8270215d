use crate::port::{Notifier, NotifyError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

/// One queued email, stored as a JSON line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutboxEntry {
    pub queued_at: DateTime<Utc>,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// A [`Notifier`] that appends emails to `.survey/outbox.jsonl`.
pub struct OutboxNotifier {
    path: PathBuf,
}

impl OutboxNotifier {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Everything queued so far, oldest first. Malformed lines are skipped.
    pub fn entries(&self) -> Result<Vec<OutboxEntry>, NotifyError> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(NotifyError::Io(e)),
        };
        Ok(data
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect())
    }
}

impl Notifier for OutboxNotifier {
    fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        if !to.contains('@') {
            return Err(NotifyError::InvalidAddress(to.to_string()));
        }
        let entry = OutboxEntry {
            queued_at: Utc::now(),
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        };
        let line = serde_json::to_string(&entry).map_err(|e| NotifyError::Delivery(e.to_string()))?;
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }
}
