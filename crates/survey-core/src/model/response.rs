use crate::id::RecordId;
use crate::model::question::QuestionType;
use crate::validate::RawAnswers;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Respondent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default)]
    pub existing_client: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

/// Where a response came from. Only read by analytics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ResponseMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// One question's normalized answer.
///
/// `question_title` and `question_type` are copies taken at submission time,
/// so later edits to the survey do not rewrite history. `multiple_answers`
/// is set exactly when the question is multiple-choice; `answer` otherwise.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Answer {
    pub question_id: String,
    pub question_title: String,
    pub question_type: QuestionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiple_answers: Option<Vec<String>>,
    #[serde(default = "default_true")]
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_time_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Answer {
    pub fn is_skipped(&self) -> bool {
        let scalar_empty = self.answer.as_deref().map_or(true, str::is_empty);
        let list_empty = self.multiple_answers.as_ref().map_or(true, Vec::is_empty);
        scalar_empty && list_empty
    }

    pub fn character_count(&self) -> usize {
        self.answer.as_deref().map_or(0, |s| s.chars().count())
    }

    /// All submitted values, whichever representation holds them.
    pub fn values(&self) -> Vec<&str> {
        match (&self.multiple_answers, &self.answer) {
            (Some(list), _) => list.iter().map(String::as_str).collect(),
            (None, Some(s)) if !s.is_empty() => vec![s.as_str()],
            _ => Vec::new(),
        }
    }
}

/// A respondent's submission before it is validated and stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Submission {
    #[serde(default)]
    pub respondent: Respondent,
    pub answers: RawAnswers,
    /// Seconds spent per question id.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub timings: BTreeMap<String, u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_time_seconds: Option<u64>,
    #[serde(default)]
    pub metadata: ResponseMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Response {
    pub id: RecordId,
    pub survey_id: RecordId,
    #[serde(default)]
    pub respondent: Respondent,
    pub submitted_at: DateTime<Utc>,
    pub answers: Vec<Answer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_time_seconds: Option<u64>,
    #[serde(default)]
    pub metadata: ResponseMetadata,
}

impl Response {
    pub fn answer_for(&self, question_id: &str) -> Option<&Answer> {
        self.answers.iter().find(|a| a.question_id == question_id)
    }

    /// Reported completion time, or the sum of per-answer times when absent.
    pub fn total_completion_time(&self) -> u64 {
        self.completion_time_seconds.unwrap_or_else(|| {
            self.answers
                .iter()
                .filter_map(|a| a.completion_time_seconds)
                .sum()
        })
    }
}
