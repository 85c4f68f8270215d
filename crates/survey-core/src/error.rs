use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid record id: {0}")]
    InvalidRecordId(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("unknown record kind: {0}")]
    UnknownKind(String),

    #[error("invalid {entity} status '{value}'")]
    InvalidStatus { entity: &'static str, value: String },

    #[error("unknown question type '{0}'")]
    UnknownQuestionType(String),

    #[error("invalid question '{question_id}': {reason}")]
    InvalidQuestion { question_id: String, reason: String },

    #[error("invalid survey: {0}")]
    InvalidSurvey(String),

    #[error("completion percentage {0} is outside 0-100")]
    InvalidCompletion(u8),
}
