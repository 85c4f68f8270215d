//! In-memory implementations of the ports, for tests and embedding.

use crate::error::StoreError;
use crate::port::{Notifier, NotifyError, SurveyStore};
use crate::query;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use survey_core::id::RecordId;
use survey_core::model::{Record, RecordKind, Requirement, Response, Suggestion, Survey};

#[derive(Default)]
struct Tables {
    surveys: HashMap<RecordId, Survey>,
    responses: HashMap<RecordId, Response>,
    suggestions: HashMap<RecordId, Suggestion>,
    requirements: HashMap<RecordId, Requirement>,
}

impl Tables {
    fn ids(&self, kind: RecordKind) -> Vec<&RecordId> {
        match kind {
            RecordKind::Survey => self.surveys.keys().collect(),
            RecordKind::Response => self.responses.keys().collect(),
            RecordKind::Suggestion => self.suggestions.keys().collect(),
            RecordKind::Requirement => self.requirements.keys().collect(),
        }
    }
}

/// A [`SurveyStore`] holding everything in one mutex-guarded set of maps.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn insert_new<R: Record>(map: &mut HashMap<RecordId, R>, record: &R) -> Result<(), StoreError> {
    if map.contains_key(record.id()) {
        return Err(StoreError::AlreadyExists {
            entity: R::KIND.as_str(),
            id: record.id().hex().to_string(),
        });
    }
    map.insert(record.id().clone(), record.clone());
    Ok(())
}

fn fetch<R: Record>(map: &HashMap<RecordId, R>, id: &RecordId) -> Result<R, StoreError> {
    map.get(id)
        .cloned()
        .ok_or_else(|| StoreError::not_found(R::KIND.as_str(), id.hex()))
}

fn fetch_mut<'a, R: Record>(
    map: &'a mut HashMap<RecordId, R>,
    id: &RecordId,
) -> Result<&'a mut R, StoreError> {
    map.get_mut(id)
        .ok_or_else(|| StoreError::not_found(R::KIND.as_str(), id.hex()))
}

fn replace<R: Record>(map: &mut HashMap<RecordId, R>, record: &R) -> Result<(), StoreError> {
    *fetch_mut(map, record.id())? = record.clone();
    Ok(())
}

impl SurveyStore for MemoryStore {
    fn create_survey(&self, survey: &Survey) -> Result<(), StoreError> {
        insert_new(&mut self.tables().surveys, survey)
    }

    fn get_survey(&self, id: &RecordId) -> Result<Survey, StoreError> {
        fetch(&self.tables().surveys, id)
    }

    fn list_surveys(&self) -> Result<Vec<Survey>, StoreError> {
        Ok(query::sort_surveys(self.tables().surveys.values().cloned().collect()))
    }

    fn update_survey(&self, survey: &Survey) -> Result<Survey, StoreError> {
        let mut tables = self.tables();
        let stored = fetch_mut(&mut tables.surveys, &survey.id)?;
        let mut next = survey.clone();
        next.response_count = stored.response_count;
        next.completion_rate = stored.completion_rate;
        *stored = next.clone();
        Ok(next)
    }

    fn delete_survey(&self, id: &RecordId) -> Result<usize, StoreError> {
        let mut tables = self.tables();
        if tables.surveys.remove(id).is_none() {
            return Err(StoreError::not_found("survey", id.hex()));
        }
        let before = tables.responses.len();
        tables.responses.retain(|_, r| &r.survey_id != id);
        Ok(before - tables.responses.len())
    }

    fn increment_response_count(&self, id: &RecordId) -> Result<u64, StoreError> {
        let mut tables = self.tables();
        let survey = fetch_mut(&mut tables.surveys, id)?;
        survey.response_count += 1;
        Ok(survey.response_count)
    }

    fn set_completion_rate(&self, id: &RecordId, rate: f64) -> Result<(), StoreError> {
        let mut tables = self.tables();
        fetch_mut(&mut tables.surveys, id)?.completion_rate = rate;
        Ok(())
    }

    fn create_response(&self, response: &Response) -> Result<(), StoreError> {
        insert_new(&mut self.tables().responses, response)
    }

    fn get_response(&self, id: &RecordId) -> Result<Response, StoreError> {
        fetch(&self.tables().responses, id)
    }

    fn delete_response(&self, id: &RecordId) -> Result<(), StoreError> {
        match self.tables().responses.remove(id) {
            Some(_) => Ok(()),
            None => Err(StoreError::not_found("response", id.hex())),
        }
    }

    fn responses_for_survey(&self, survey_id: &RecordId) -> Result<Vec<Response>, StoreError> {
        let responses = self
            .tables()
            .responses
            .values()
            .filter(|r| &r.survey_id == survey_id)
            .cloned()
            .collect();
        Ok(query::sort_responses(responses))
    }

    fn recent_responses(&self, count: usize) -> Result<Vec<Response>, StoreError> {
        let all = self.tables().responses.values().cloned().collect();
        Ok(query::most_recent(all, count))
    }

    fn create_suggestion(&self, suggestion: &Suggestion) -> Result<(), StoreError> {
        insert_new(&mut self.tables().suggestions, suggestion)
    }

    fn get_suggestion(&self, id: &RecordId) -> Result<Suggestion, StoreError> {
        fetch(&self.tables().suggestions, id)
    }

    fn update_suggestion(&self, suggestion: &Suggestion) -> Result<(), StoreError> {
        replace(&mut self.tables().suggestions, suggestion)
    }

    fn list_suggestions(&self) -> Result<Vec<Suggestion>, StoreError> {
        let all = self.tables().suggestions.values().cloned().collect();
        Ok(query::query_suggestions(all, None, None))
    }

    fn create_requirement(&self, requirement: &Requirement) -> Result<(), StoreError> {
        insert_new(&mut self.tables().requirements, requirement)
    }

    fn get_requirement(&self, id: &RecordId) -> Result<Requirement, StoreError> {
        fetch(&self.tables().requirements, id)
    }

    fn update_requirement(&self, requirement: &Requirement) -> Result<(), StoreError> {
        replace(&mut self.tables().requirements, requirement)
    }

    fn list_requirements(&self) -> Result<Vec<Requirement>, StoreError> {
        let all = self.tables().requirements.values().cloned().collect();
        Ok(query::query_requirements(all, None, None))
    }

    fn resolve_id(&self, kind: RecordKind, prefix: &str) -> Result<RecordId, StoreError> {
        let tables = self.tables();
        let matches: Vec<&RecordId> = tables
            .ids(kind)
            .into_iter()
            .filter(|id| id.starts_with(prefix.trim()))
            .collect();
        match matches.as_slice() {
            [] => Err(StoreError::not_found(kind.as_str(), prefix)),
            [id] => Ok((*id).clone()),
            many => Err(StoreError::AmbiguousPrefix {
                prefix: prefix.to_string(),
                count: many.len(),
            }),
        }
    }
}

/// An email captured by [`MemoryNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// A [`Notifier`] that records every email instead of sending it.
#[derive(Default)]
pub struct MemoryNotifier {
    sent: Mutex<Vec<SentEmail>>,
    failing: bool,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose every send fails.
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: true,
        }
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Notifier for MemoryNotifier {
    fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        if self.failing {
            return Err(NotifyError::Delivery("memory notifier set to fail".into()));
        }
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(SentEmail {
                to: to.to_string(),
                subject: subject.to_string(),
                body: body.to_string(),
            });
        Ok(())
    }
}
