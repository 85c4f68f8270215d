pub mod analytics;
pub mod init;
pub mod reindex;
pub mod requirement;
pub mod respond;
pub mod response;
pub mod suggestion;
pub mod survey;

use anyhow::{Context, Result};
use serde::Serialize;
use std::env;
use survey_core::id::RecordId;
use survey_core::model::{Contact, RecordKind};
use survey_store::port::SurveyStore;
use survey_store::repository::Repository;

/// Display name on outgoing admin mail.
pub const ENV_ADMIN_NAME: &str = "SURVEY_ADMIN_NAME";

pub fn open_repo() -> Result<Repository> {
    let cwd = env::current_dir().context("failed to get current directory")?;
    Repository::discover(&cwd).context("not a survey repository (run `survey init`)")
}

/// Resolve a full id or prefix, naming the kind in the error.
pub fn resolve(repo: &Repository, kind: RecordKind, id: &str) -> Result<RecordId> {
    repo.resolve_id(kind, id)
        .with_context(|| format!("{} '{}' not found", kind, id))
}

pub fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Customer identity from flags only. Replies go to this address, so the
/// admin's own identity is never substituted. `None` means anonymous.
pub fn submitter(name: Option<String>, email: Option<String>, anonymous: bool) -> Option<Contact> {
    if anonymous {
        return None;
    }
    match (name, email) {
        (None, None) => None,
        (name, email) => Some(Contact {
            name: name.unwrap_or_else(|| "Unknown".into()),
            email,
        }),
    }
}

pub fn percent(value: f64) -> String {
    format!("{:.1}%", value)
}
