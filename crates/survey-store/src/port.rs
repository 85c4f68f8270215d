//! Ports the services depend on: persistence and outbound email.

use crate::error::StoreError;
use survey_core::id::RecordId;
use survey_core::model::{RecordKind, Requirement, Response, Suggestion, Survey};
use thiserror::Error;

/// Persistence port.
///
/// Reads are consistent and uncached. `response_count` and
/// `completion_rate` on a survey belong to the store: `update_survey`
/// keeps the stored values, and only `increment_response_count` and
/// `set_completion_rate` change them.
pub trait SurveyStore {
    fn create_survey(&self, survey: &Survey) -> Result<(), StoreError>;
    fn get_survey(&self, id: &RecordId) -> Result<Survey, StoreError>;
    /// All surveys, newest first.
    fn list_surveys(&self) -> Result<Vec<Survey>, StoreError>;
    /// Replace a survey's authored fields. Returns the stored survey.
    fn update_survey(&self, survey: &Survey) -> Result<Survey, StoreError>;
    /// Delete a survey and every response to it. Returns the number of
    /// responses removed.
    fn delete_survey(&self, id: &RecordId) -> Result<usize, StoreError>;
    /// Atomically add one to the survey's response count. Returns the new count.
    fn increment_response_count(&self, id: &RecordId) -> Result<u64, StoreError>;
    fn set_completion_rate(&self, id: &RecordId, rate: f64) -> Result<(), StoreError>;

    fn create_response(&self, response: &Response) -> Result<(), StoreError>;
    fn get_response(&self, id: &RecordId) -> Result<Response, StoreError>;
    /// Remove a single response and its index entry. The survey's counters
    /// are left alone.
    fn delete_response(&self, id: &RecordId) -> Result<(), StoreError>;
    /// Responses to one survey, oldest first.
    fn responses_for_survey(&self, survey_id: &RecordId) -> Result<Vec<Response>, StoreError>;
    /// The `count` most recent responses across all surveys, newest first.
    fn recent_responses(&self, count: usize) -> Result<Vec<Response>, StoreError>;

    fn create_suggestion(&self, suggestion: &Suggestion) -> Result<(), StoreError>;
    fn get_suggestion(&self, id: &RecordId) -> Result<Suggestion, StoreError>;
    fn update_suggestion(&self, suggestion: &Suggestion) -> Result<(), StoreError>;
    fn list_suggestions(&self) -> Result<Vec<Suggestion>, StoreError>;

    fn create_requirement(&self, requirement: &Requirement) -> Result<(), StoreError>;
    fn get_requirement(&self, id: &RecordId) -> Result<Requirement, StoreError>;
    fn update_requirement(&self, requirement: &Requirement) -> Result<(), StoreError>;
    fn list_requirements(&self) -> Result<Vec<Requirement>, StoreError>;

    /// Resolve a full id or unique prefix to a stored record's id.
    fn resolve_id(&self, kind: RecordKind, prefix: &str) -> Result<RecordId, StoreError>;
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid address '{0}'")]
    InvalidAddress(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Notification port.
pub trait Notifier {
    fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError>;
}

/// Send and forget: failures are logged, never returned.
pub fn notify(notifier: &dyn Notifier, to: &str, subject: &str, body: &str) {
    match notifier.send_email(to, subject, body) {
        Ok(()) => log::info!("sent '{}' to {}", subject, to),
        Err(e) => log::error!("failed to send '{}' to {}: {}", subject, to, e),
    }
}
