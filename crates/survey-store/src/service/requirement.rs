use super::{log_transition, non_empty, parse_status};
use crate::error::StoreError;
use crate::port::{notify, Notifier, SurveyStore};
use crate::query::query_requirements;
use chrono::Utc;
use serde::Serialize;
use survey_core::id::RecordId;
use survey_core::lifecycle::Transition;
use survey_core::model::{Contact, RecordKind, Requirement, RequirementStatus};
use survey_core::serialize::mint_id;

/// Input for a new requirement.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RequirementProposal {
    pub title: String,
    pub description: String,
    pub customer: Option<Contact>,
    pub category: Option<String>,
}

/// An admin change to a requirement. Unset fields are left alone.
#[derive(Debug, Clone, Default)]
pub struct RequirementUpdate {
    pub status: Option<String>,
    pub completion: Option<u8>,
    pub response: Option<String>,
}

pub struct RequirementService<'a> {
    store: &'a dyn SurveyStore,
    notifier: &'a dyn Notifier,
}

impl<'a> RequirementService<'a> {
    pub fn new(store: &'a dyn SurveyStore, notifier: &'a dyn Notifier) -> Self {
        Self { store, notifier }
    }

    pub fn propose(&self, proposal: RequirementProposal) -> Result<Requirement, StoreError> {
        if proposal.title.trim().is_empty() {
            return Err(StoreError::InvalidOperation("requirement title cannot be empty".into()));
        }
        let created_at = Utc::now();
        let id = mint_id(RecordKind::Requirement.as_str(), created_at, &proposal)?;
        let requirement = Requirement {
            id,
            title: proposal.title.trim().to_string(),
            description: proposal.description,
            customer: proposal.customer,
            created_at,
            status: RequirementStatus::Proposed,
            category: non_empty(proposal.category.as_deref()),
            completion: 0,
            response: None,
            responded_at: None,
            status_changed_at: None,
        };
        self.store.create_requirement(&requirement)?;
        log::info!("recorded requirement {} '{}'", requirement.id.short(), requirement.title);
        Ok(requirement)
    }

    pub fn get(&self, id: &RecordId) -> Result<Requirement, StoreError> {
        self.store.get_requirement(id)
    }

    /// Apply an admin update. Status and completion are independent; a
    /// non-empty response is emailed to the submitter unless anonymous.
    pub fn update(&self, id: &RecordId, update: RequirementUpdate) -> Result<Requirement, StoreError> {
        let status = update
            .status
            .as_deref()
            .map(parse_status::<RequirementStatus>)
            .transpose()?;
        let mut requirement = self.store.get_requirement(id)?;
        let now = Utc::now();

        if let Some(status) = status {
            if log_transition(id.short(), requirement.status, status) != Transition::Unchanged {
                requirement.status = status;
                requirement.status_changed_at = Some(now);
            }
        }
        if let Some(completion) = update.completion {
            requirement.set_completion(completion)?;
        }
        let text = non_empty(update.response.as_deref());
        if let Some(text) = &text {
            requirement.response = Some(text.clone());
            requirement.responded_at = Some(now);
        }
        self.store.update_requirement(&requirement)?;

        if let (Some(text), Some(email)) = (
            &text,
            requirement.customer.as_ref().and_then(|c| c.email.as_deref()),
        ) {
            let subject = format!("Update on your request: {}", requirement.title);
            let body = format!(
                "Status: {}\nProgress: {}%\n\n{}\n",
                requirement.status, requirement.completion, text
            );
            notify(self.notifier, email, &subject, &body);
        }
        Ok(requirement)
    }

    pub fn list(&self, status: Option<&str>, category: Option<&str>) -> Result<Vec<Requirement>, StoreError> {
        let status = status.map(parse_status::<RequirementStatus>).transpose()?;
        Ok(query_requirements(self.store.list_requirements()?, status, category))
    }
}
