use survey_core::validate::ValidationReport;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("core error: {0}")]
    Core(#[from] survey_core::error::CoreError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("submission rejected: {0}")]
    Validation(ValidationReport),

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: &'static str, id: String },

    #[error("ambiguous id prefix '{prefix}': matches {count} records")]
    AmbiguousPrefix { prefix: String, count: usize },

    #[error("integrity check failed: file {expected} holds record {actual}")]
    IntegrityError { expected: String, actual: String },

    #[error("repository not found (searched upward from {0})")]
    RepositoryNotFound(String),

    #[error("repository already exists at {0}")]
    RepositoryExists(String),

    #[error("index {path} is unreadable ({reason}); run `survey reindex` to rebuild it")]
    CorruptIndex { path: String, reason: String },

    #[error("lock file conflict: {0}")]
    LockConflict(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }
}
