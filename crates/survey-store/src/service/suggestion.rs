use super::{log_transition, non_empty, parse_status};
use crate::error::StoreError;
use crate::port::{notify, Notifier, SurveyStore};
use crate::query::query_suggestions;
use chrono::Utc;
use serde::Serialize;
use survey_core::id::RecordId;
use survey_core::lifecycle::Transition;
use survey_core::model::{Contact, RecordKind, Suggestion, SuggestionStatus};
use survey_core::serialize::mint_id;

pub struct SuggestionService<'a> {
    store: &'a dyn SurveyStore,
    notifier: &'a dyn Notifier,
}

#[derive(Serialize)]
struct SuggestionSeed<'s> {
    content: &'s str,
    customer: Option<&'s Contact>,
    category: Option<&'s str>,
}

impl<'a> SuggestionService<'a> {
    pub fn new(store: &'a dyn SurveyStore, notifier: &'a dyn Notifier) -> Self {
        Self { store, notifier }
    }

    /// Record a new suggestion. `customer` is `None` for anonymous submissions.
    pub fn submit(
        &self,
        content: &str,
        customer: Option<Contact>,
        category: Option<&str>,
    ) -> Result<Suggestion, StoreError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(StoreError::InvalidOperation("suggestion content cannot be empty".into()));
        }
        let category = non_empty(category);
        let created_at = Utc::now();
        let seed = SuggestionSeed {
            content,
            customer: customer.as_ref(),
            category: category.as_deref(),
        };
        let suggestion = Suggestion {
            id: mint_id(RecordKind::Suggestion.as_str(), created_at, &seed)?,
            content: content.to_string(),
            customer,
            created_at,
            status: SuggestionStatus::New,
            category,
            response: None,
            responded_at: None,
            status_changed_at: None,
        };
        self.store.create_suggestion(&suggestion)?;
        log::info!("recorded suggestion {}", suggestion.id.short());
        Ok(suggestion)
    }

    pub fn get(&self, id: &RecordId) -> Result<Suggestion, StoreError> {
        self.store.get_suggestion(id)
    }

    /// Set a suggestion's status and optionally answer it. A non-empty answer
    /// is emailed to the submitter unless they stayed anonymous.
    pub fn respond(
        &self,
        id: &RecordId,
        status: &str,
        response_text: Option<&str>,
    ) -> Result<Suggestion, StoreError> {
        let status: SuggestionStatus = parse_status(status)?;
        let mut suggestion = self.store.get_suggestion(id)?;
        let now = Utc::now();
        if log_transition(id.short(), suggestion.status, status) != Transition::Unchanged {
            suggestion.status = status;
            suggestion.status_changed_at = Some(now);
        }

        let text = non_empty(response_text);
        if let Some(text) = &text {
            suggestion.response = Some(text.clone());
            suggestion.responded_at = Some(now);
        }
        self.store.update_suggestion(&suggestion)?;

        if let (Some(text), Some(email)) = (
            &text,
            suggestion.customer.as_ref().and_then(|c| c.email.as_deref()),
        ) {
            let subject = format!("Your suggestion is now {}", suggestion.status);
            let body = format!(
                "Thank you for your suggestion:\n\n  {}\n\nStatus: {} ({}% complete)\n\n{}\n",
                suggestion.content,
                suggestion.status,
                suggestion.completion_percentage(),
                text
            );
            notify(self.notifier, email, &subject, &body);
        }
        Ok(suggestion)
    }

    /// Suggestions matching the filters, most recent first.
    pub fn list(&self, status: Option<&str>, category: Option<&str>) -> Result<Vec<Suggestion>, StoreError> {
        let status = status.map(parse_status::<SuggestionStatus>).transpose()?;
        Ok(query_suggestions(self.store.list_suggestions()?, status, category))
    }
}
