use crate::error::StoreError;
use crate::port::SurveyStore;
use chrono::{DateTime, Utc};
use survey_core::analytics::{compute_response_metrics, compute_survey_dashboard, ResponseMetrics, SurveyDashboard};
use survey_core::id::RecordId;
use survey_core::model::Response;

pub struct AnalyticsService<'a> {
    store: &'a dyn SurveyStore,
}

impl<'a> AnalyticsService<'a> {
    pub fn new(store: &'a dyn SurveyStore) -> Self {
        Self { store }
    }

    pub fn response_metrics(&self, response_id: &RecordId) -> Result<ResponseMetrics, StoreError> {
        let response = self.store.get_response(response_id)?;
        Ok(compute_response_metrics(&response))
    }

    pub fn survey_dashboard(&self, survey_id: &RecordId) -> Result<SurveyDashboard, StoreError> {
        self.survey_dashboard_at(survey_id, Utc::now())
    }

    pub fn survey_dashboard_at(
        &self,
        survey_id: &RecordId,
        now: DateTime<Utc>,
    ) -> Result<SurveyDashboard, StoreError> {
        let survey = self.store.get_survey(survey_id)?;
        let responses = self.store.responses_for_survey(survey_id)?;
        Ok(compute_survey_dashboard(&survey, &responses, now))
    }

    /// The `count` most recent responses across all surveys, newest first.
    pub fn recent_responses(&self, count: usize) -> Result<Vec<Response>, StoreError> {
        self.store.recent_responses(count)
    }
}
