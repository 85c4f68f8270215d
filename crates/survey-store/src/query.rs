//! Query functions for filtering and ordering stored records.

use survey_core::model::{Requirement, RequirementStatus, Response, Suggestion, SuggestionStatus, Survey};

/// Surveys sorted newest first.
pub fn sort_surveys(mut surveys: Vec<Survey>) -> Vec<Survey> {
    surveys.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    surveys
}

/// Responses sorted oldest first.
pub fn sort_responses(mut responses: Vec<Response>) -> Vec<Response> {
    responses.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at));
    responses
}

/// The `count` most recently submitted responses, newest first.
pub fn most_recent(mut responses: Vec<Response>, count: usize) -> Vec<Response> {
    responses.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
    responses.truncate(count);
    responses
}

fn category_matches(category: Option<&str>, filter: Option<&str>) -> bool {
    match filter {
        None => true,
        Some(wanted) => category.is_some_and(|c| c.eq_ignore_ascii_case(wanted)),
    }
}

/// Query suggestions with optional filters, most recent first.
pub fn query_suggestions(
    suggestions: Vec<Suggestion>,
    status: Option<SuggestionStatus>,
    category: Option<&str>,
) -> Vec<Suggestion> {
    let mut results: Vec<Suggestion> = suggestions
        .into_iter()
        .filter(|s| status.map_or(true, |wanted| s.status == wanted))
        .filter(|s| category_matches(s.category.as_deref(), category))
        .collect();
    results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    results
}

/// Query requirements with optional filters, most recent first.
pub fn query_requirements(
    requirements: Vec<Requirement>,
    status: Option<RequirementStatus>,
    category: Option<&str>,
) -> Vec<Requirement> {
    let mut results: Vec<Requirement> = requirements
        .into_iter()
        .filter(|r| status.map_or(true, |wanted| r.status == wanted))
        .filter(|r| category_matches(r.category.as_deref(), category))
        .collect();
    results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use survey_core::id::RecordId;
    use survey_core::model::{Respondent, ResponseMetadata};

    fn suggestion(seed: &str, status: SuggestionStatus, category: Option<&str>, day: u32) -> Suggestion {
        Suggestion {
            id: RecordId::hash(seed.as_bytes()),
            content: seed.into(),
            customer: None,
            created_at: Utc.with_ymd_and_hms(2024, 3, day, 9, 0, 0).unwrap(),
            status,
            category: category.map(String::from),
            response: None,
            responded_at: None,
            status_changed_at: None,
        }
    }

    #[test]
    fn suggestions_filter_by_status_and_category() {
        let all = vec![
            suggestion("a", SuggestionStatus::New, Some("UX"), 1),
            suggestion("b", SuggestionStatus::Reviewed, Some("ux"), 2),
            suggestion("c", SuggestionStatus::New, None, 3),
        ];
        let new = query_suggestions(all.clone(), Some(SuggestionStatus::New), None);
        assert_eq!(new.iter().map(|s| s.content.as_str()).collect::<Vec<_>>(), ["c", "a"]);

        let ux = query_suggestions(all, None, Some("ux"));
        assert_eq!(ux.len(), 2);
        assert_eq!(ux[0].content, "b");
    }

    #[test]
    fn most_recent_takes_newest() {
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let responses: Vec<Response> = (0..5)
            .map(|i| Response {
                id: RecordId::hash(format!("r{}", i).as_bytes()),
                survey_id: RecordId::hash(b"s"),
                respondent: Respondent::default(),
                submitted_at: base + Duration::hours(i),
                answers: vec![],
                completion_time_seconds: None,
                metadata: ResponseMetadata::default(),
            })
            .collect();
        let recent = most_recent(responses, 2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].submitted_at, base + Duration::hours(4));
        assert_eq!(recent[1].submitted_at, base + Duration::hours(3));
    }
}
