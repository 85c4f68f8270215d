use super::parse_status;
use crate::error::StoreError;
use crate::port::{notify, Notifier, SurveyStore};
use chrono::{DateTime, Utc};
use survey_core::analytics;
use survey_core::id::RecordId;
use survey_core::model::{RecordKind, Response, Submission, Survey, SurveyDraft, SurveyStatus};
use survey_core::normalize::{assess, normalize};
use survey_core::serialize::mint_id;
use survey_core::validate::validate;

pub struct SurveyService<'a> {
    store: &'a dyn SurveyStore,
    notifier: &'a dyn Notifier,
}

impl<'a> SurveyService<'a> {
    pub fn new(store: &'a dyn SurveyStore, notifier: &'a dyn Notifier) -> Self {
        Self { store, notifier }
    }

    /// Create a survey from a draft. Question ids are assigned where empty
    /// and scaled questions get their default bounds.
    pub fn create_survey(&self, draft: SurveyDraft) -> Result<Survey, StoreError> {
        let created_at = Utc::now();
        let id = mint_id(RecordKind::Survey.as_str(), created_at, &draft)?;
        let survey = Survey::from_draft(id, draft, created_at);
        survey.check()?;
        self.store.create_survey(&survey)?;
        log::info!(
            "created survey {} '{}' with {} questions",
            survey.id.short(),
            survey.title,
            survey.questions.len()
        );
        Ok(survey)
    }

    /// Replace the authored parts of a survey. Stored responses keep the
    /// question titles and types they were submitted against.
    pub fn update_survey(&self, id: &RecordId, draft: SurveyDraft) -> Result<Survey, StoreError> {
        let current = self.store.get_survey(id)?;
        let mut next = Survey::from_draft(current.id.clone(), draft, current.created_at);
        next.status = current.status;
        next.updated_at = Some(Utc::now());
        next.check()?;
        let stored = self.store.update_survey(&next)?;
        log::info!("updated survey {}", id.short());
        Ok(stored)
    }

    pub fn set_status(&self, id: &RecordId, status: &str) -> Result<Survey, StoreError> {
        let status: SurveyStatus = parse_status(status)?;
        let mut survey = self.store.get_survey(id)?;
        if survey.status == status {
            return Ok(survey);
        }
        log::info!("survey {}: {} -> {}", id.short(), survey.status, status);
        survey.status = status;
        survey.updated_at = Some(Utc::now());
        self.store.update_survey(&survey)
    }

    /// Delete a survey and its responses. Returns how many responses went with it.
    pub fn delete_survey(&self, id: &RecordId) -> Result<usize, StoreError> {
        self.store.delete_survey(id)
    }

    pub fn submit_response(&self, survey_id: &RecordId, submission: Submission) -> Result<Response, StoreError> {
        self.submit_response_at(survey_id, submission, Utc::now())
    }

    /// Validate, normalize and store a submission, then bump the survey's
    /// response count and completion rate.
    pub fn submit_response_at(
        &self,
        survey_id: &RecordId,
        submission: Submission,
        submitted_at: DateTime<Utc>,
    ) -> Result<Response, StoreError> {
        let survey = self.store.get_survey(survey_id)?;
        if !survey.status.accepts_responses() {
            return Err(StoreError::InvalidOperation(format!(
                "survey {} is {} and not accepting responses",
                survey_id.short(),
                survey.status
            )));
        }
        validate(&survey, &submission.answers).map_err(StoreError::Validation)?;

        for key in submission.answers.keys() {
            if survey.question(key).is_none() {
                log::warn!("survey {}: ignoring answer to unknown question '{}'", survey_id.short(), key);
            }
        }

        let answers = survey
            .questions
            .iter()
            .filter_map(|question| {
                let mut answer = normalize(question, submission.answers.get(&question.id));
                if !question.required && answer.is_skipped() {
                    return None;
                }
                let assessment = assess(question, &answer);
                answer.is_valid = assessment.is_valid;
                answer.score_value = assessment.score;
                answer.completion_time_seconds = submission.timings.get(&question.id).copied();
                Some(answer)
            })
            .collect();

        let id = mint_id(
            RecordKind::Response.as_str(),
            submitted_at,
            &(survey_id, &submission),
        )?;
        let response = Response {
            id,
            survey_id: survey_id.clone(),
            respondent: submission.respondent,
            submitted_at,
            answers,
            completion_time_seconds: submission.completion_time_seconds,
            metadata: submission.metadata,
        };

        self.store.create_response(&response)?;
        let count = match self.store.increment_response_count(survey_id) {
            Ok(count) => count,
            Err(e) => {
                if let Err(undo) = self.store.delete_response(&response.id) {
                    log::error!(
                        "response {} stored but not counted and could not be removed: {}",
                        response.id.short(),
                        undo
                    );
                }
                return Err(e);
            }
        };
        let rate = self
            .store
            .responses_for_survey(survey_id)
            .map(|responses| analytics::completion_rate(&survey, &responses))
            .and_then(|rate| self.store.set_completion_rate(survey_id, rate));
        if let Err(e) = rate {
            log::warn!("survey {}: completion rate not updated: {}", survey_id.short(), e);
        }
        log::info!(
            "stored response {} to survey {} ({} answers, {} total responses)",
            response.id.short(),
            survey_id.short(),
            response.answers.len(),
            count
        );
        Ok(response)
    }

    /// Email the survey invitation to every configured recipient.
    /// Returns the number of recipients addressed.
    pub fn distribute(&self, id: &RecordId) -> Result<usize, StoreError> {
        let survey = self.store.get_survey(id)?;
        if survey.delivery.recipients.is_empty() {
            return Err(StoreError::InvalidOperation(format!(
                "survey {} has no recipients configured",
                id.short()
            )));
        }
        if !survey.status.accepts_responses() {
            return Err(StoreError::InvalidOperation(format!(
                "survey {} is {}; activate it before sending",
                id.short(),
                survey.status
            )));
        }
        let subject = format!("We'd like your feedback: {}", survey.title);
        let mut body = String::new();
        if let Some(description) = &survey.description {
            body.push_str(description);
            body.push_str("\n\n");
        }
        body.push_str(&format!(
            "Please take a moment to answer our survey.\nSurvey id: {}\n",
            survey.id.hex()
        ));
        for recipient in &survey.delivery.recipients {
            notify(self.notifier, recipient, &subject, &body);
        }
        Ok(survey.delivery.recipients.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryNotifier, MemoryStore};
    use survey_core::model::{Question, QuestionType, ResponseMetadata};
    use survey_core::validate::{RawAnswers, RawValue};

    fn draft() -> SurveyDraft {
        SurveyDraft {
            title: "Feedback".into(),
            description: Some("Tell us how we did".into()),
            questions: vec![
                Question::new("q1", "Your thoughts", QuestionType::Text).required(),
                Question::new("q2", "Pick some", QuestionType::MultipleChoice)
                    .with_options(["A", "B", "C"]),
            ],
            delivery: Default::default(),
        }
    }

    fn submission(pairs: &[(&str, &str)]) -> Submission {
        Submission {
            answers: RawAnswers::from_form_pairs(pairs.iter().copied()),
            ..Default::default()
        }
    }

    #[test]
    fn create_assigns_ids_and_defaults() {
        let store = MemoryStore::new();
        let notifier = MemoryNotifier::new();
        let service = SurveyService::new(&store, &notifier);
        let mut d = draft();
        d.questions.push(Question::new("", "How likely to recommend?", QuestionType::Nps));
        let survey = service.create_survey(d).unwrap();
        assert_eq!(survey.questions[2].id, "q3");
        assert_eq!(survey.questions[2].effective_settings().unwrap().max, 10);
        assert_eq!(store.get_survey(&survey.id).unwrap(), survey);
    }

    #[test]
    fn create_rejects_choice_without_options() {
        let store = MemoryStore::new();
        let notifier = MemoryNotifier::new();
        let service = SurveyService::new(&store, &notifier);
        let mut d = draft();
        d.questions.push(Question::new("q9", "Pick", QuestionType::Dropdown));
        assert!(matches!(service.create_survey(d), Err(StoreError::Core(_))));
        assert!(store.list_surveys().unwrap().is_empty());
    }

    #[test]
    fn rejected_submission_names_empty_required_question() {
        let store = MemoryStore::new();
        let notifier = MemoryNotifier::new();
        let service = SurveyService::new(&store, &notifier);
        let survey = service.create_survey(draft()).unwrap();

        let err = service
            .submit_response(&survey.id, submission(&[("q1", ""), ("q2", "A")]))
            .unwrap_err();
        match err {
            StoreError::Validation(report) => assert!(report.names("q1")),
            other => panic!("expected validation failure, got {other:?}"),
        }
        assert_eq!(store.get_survey(&survey.id).unwrap().response_count, 0);
    }

    #[test]
    fn accepted_submission_is_normalized_and_counted() {
        let store = MemoryStore::new();
        let notifier = MemoryNotifier::new();
        let service = SurveyService::new(&store, &notifier);
        let survey = service.create_survey(draft()).unwrap();

        let response = service
            .submit_response(
                &survey.id,
                submission(&[("Answers[q1]", "hello"), ("Answers[q2]", "A"), ("Answers[q2]", "C")]),
            )
            .unwrap();
        let q1 = response.answer_for("q1").unwrap();
        assert_eq!(q1.answer.as_deref(), Some("hello"));
        let q2 = response.answer_for("q2").unwrap();
        assert_eq!(q2.multiple_answers, Some(vec!["A".to_string(), "C".to_string()]));
        assert_eq!(q2.answer, None);

        let stored = store.get_survey(&survey.id).unwrap();
        assert_eq!(stored.response_count, 1);
        assert_eq!(stored.completion_rate, 100.0);
        assert_eq!(store.get_response(&response.id).unwrap(), response);
    }

    #[test]
    fn unanswered_optional_questions_lower_completion_rate() {
        let store = MemoryStore::new();
        let notifier = MemoryNotifier::new();
        let service = SurveyService::new(&store, &notifier);
        let survey = service.create_survey(draft()).unwrap();

        service
            .submit_response(&survey.id, submission(&[("q1", "one"), ("q2", "B")]))
            .unwrap();
        let partial = service
            .submit_response(&survey.id, submission(&[("q1", "two")]))
            .unwrap();
        assert!(partial.answer_for("q2").is_none());
        assert_eq!(partial.answers.len(), 1);

        let stored = store.get_survey(&survey.id).unwrap();
        assert_eq!(stored.response_count, 2);
        assert_eq!(stored.completion_rate, 50.0);
    }

    #[test]
    fn answers_are_assessed_against_questions() {
        let store = MemoryStore::new();
        let notifier = MemoryNotifier::new();
        let service = SurveyService::new(&store, &notifier);
        let mut d = draft();
        d.questions.push(Question::new("q3", "Rate us", QuestionType::Rating).with_category("service"));
        let survey = service.create_survey(d).unwrap();

        let mut sub = submission(&[("q1", "ok"), ("q2", "Z"), ("q3", "4")]);
        sub.timings.insert("q1".into(), 12);
        sub.metadata = ResponseMetadata {
            device: Some("mobile".into()),
            ..Default::default()
        };
        let response = service.submit_response(&survey.id, sub).unwrap();

        assert!(!response.answer_for("q2").unwrap().is_valid);
        let q3 = response.answer_for("q3").unwrap();
        assert!(q3.is_valid);
        assert_eq!(q3.score_value, Some(4.0));
        assert_eq!(q3.category.as_deref(), Some("service"));
        assert_eq!(response.answer_for("q1").unwrap().completion_time_seconds, Some(12));
        assert_eq!(response.metadata.device.as_deref(), Some("mobile"));
    }

    #[test]
    fn unknown_question_ids_are_ignored() {
        let store = MemoryStore::new();
        let notifier = MemoryNotifier::new();
        let service = SurveyService::new(&store, &notifier);
        let survey = service.create_survey(draft()).unwrap();
        let mut sub = submission(&[("q1", "hi")]);
        sub.answers.insert("q99", RawValue::Single("stray".into()));
        let response = service.submit_response(&survey.id, sub).unwrap();
        assert_eq!(response.answers.len(), 1);
        assert!(response.answer_for("q99").is_none());
    }

    #[test]
    fn inactive_survey_refuses_responses() {
        let store = MemoryStore::new();
        let notifier = MemoryNotifier::new();
        let service = SurveyService::new(&store, &notifier);
        let survey = service.create_survey(draft()).unwrap();
        service.set_status(&survey.id, "inactive").unwrap();
        assert!(matches!(
            service.submit_response(&survey.id, submission(&[("q1", "hi")])),
            Err(StoreError::InvalidOperation(_))
        ));
    }

    #[test]
    fn set_status_rejects_unknown_values() {
        let store = MemoryStore::new();
        let notifier = MemoryNotifier::new();
        let service = SurveyService::new(&store, &notifier);
        let survey = service.create_survey(draft()).unwrap();
        assert!(service.set_status(&survey.id, "paused").is_err());
        let archived = service.set_status(&survey.id, "Archived").unwrap();
        assert_eq!(archived.status, SurveyStatus::Archived);
        assert!(archived.updated_at.is_some());
    }

    #[test]
    fn update_keeps_history_and_counts() {
        let store = MemoryStore::new();
        let notifier = MemoryNotifier::new();
        let service = SurveyService::new(&store, &notifier);
        let survey = service.create_survey(draft()).unwrap();
        let response = service
            .submit_response(&survey.id, submission(&[("q1", "hi")]))
            .unwrap();

        let mut d = draft();
        d.questions[0].title = "Anything else?".into();
        let updated = service.update_survey(&survey.id, d).unwrap();
        assert_eq!(updated.questions[0].title, "Anything else?");
        assert_eq!(updated.response_count, 1);
        assert_eq!(updated.created_at, survey.created_at);

        let stored = store.get_response(&response.id).unwrap();
        assert_eq!(stored.answer_for("q1").unwrap().question_title, "Your thoughts");
    }

    #[test]
    fn distribute_requires_recipients() {
        let store = MemoryStore::new();
        let notifier = MemoryNotifier::new();
        let service = SurveyService::new(&store, &notifier);
        let survey = service.create_survey(draft()).unwrap();
        assert!(matches!(
            service.distribute(&survey.id),
            Err(StoreError::InvalidOperation(_))
        ));
        assert!(notifier.sent().is_empty());
    }

    #[test]
    fn distribute_mails_every_recipient() {
        let store = MemoryStore::new();
        let notifier = MemoryNotifier::new();
        let service = SurveyService::new(&store, &notifier);
        let mut d = draft();
        d.delivery.recipients = vec!["a@example.com".into(), "b@example.com".into()];
        let survey = service.create_survey(d).unwrap();

        assert_eq!(service.distribute(&survey.id).unwrap(), 2);
        let sent = notifier.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent[0].subject.contains("Feedback"));
        assert!(sent[1].body.contains(survey.id.hex()));
    }

    #[test]
    fn notifier_failures_do_not_abort_distribution() {
        let store = MemoryStore::new();
        let notifier = MemoryNotifier::failing();
        let service = SurveyService::new(&store, &notifier);
        let mut d = draft();
        d.delivery.recipients = vec!["a@example.com".into()];
        let survey = service.create_survey(d).unwrap();
        assert_eq!(service.distribute(&survey.id).unwrap(), 1);
    }

    #[test]
    fn delete_removes_responses() {
        let store = MemoryStore::new();
        let notifier = MemoryNotifier::new();
        let service = SurveyService::new(&store, &notifier);
        let survey = service.create_survey(draft()).unwrap();
        service
            .submit_response(&survey.id, submission(&[("q1", "hi")]))
            .unwrap();
        assert_eq!(service.delete_survey(&survey.id).unwrap(), 1);
        assert!(store.recent_responses(10).unwrap().is_empty());
    }
}
