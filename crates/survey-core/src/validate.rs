//! Submission checks: required-question coverage over raw form values.

use crate::model::question::QuestionType;
use crate::model::survey::Survey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

const FORM_PREFIX: &str = "Answers[";

/// A value as submitted, before it is matched against its question.
///
/// Whether a value is single or multiple comes from the form encoding
/// (a repeated key), not from the question's type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Single(String),
    Multiple(Vec<String>),
}

impl RawValue {
    /// Reshape the value for a question type: multiple-choice always gets a
    /// list, everything else a scalar (several values are comma-joined).
    pub fn coerce_for(&self, question_type: QuestionType) -> RawValue {
        match (question_type, self) {
            (QuestionType::MultipleChoice, RawValue::Single(s)) => {
                let values = if s.is_empty() { vec![] } else { vec![s.clone()] };
                RawValue::Multiple(values)
            }
            (QuestionType::MultipleChoice, RawValue::Multiple(values)) => RawValue::Multiple(
                values.iter().filter(|v| !v.is_empty()).cloned().collect(),
            ),
            (_, RawValue::Single(s)) => RawValue::Single(s.clone()),
            (_, RawValue::Multiple(values)) => RawValue::Single(values.join(",")),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            RawValue::Single(s) => s.is_empty(),
            RawValue::Multiple(values) => values.iter().all(String::is_empty),
        }
    }
}

/// Raw submitted values keyed by question id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawAnswers(BTreeMap<String, RawValue>);

impl RawAnswers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, question_id: impl Into<String>, value: RawValue) {
        self.0.insert(question_id.into(), value);
    }

    /// Add one submitted value. A second value under the same key turns the
    /// entry into a list.
    pub fn push(&mut self, question_id: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        let key: String = question_id.into();
        match self.0.remove(&key) {
            None => {
                self.0.insert(key, RawValue::Single(value));
            }
            Some(RawValue::Single(first)) => {
                self.0.insert(key, RawValue::Multiple(vec![first, value]));
            }
            Some(RawValue::Multiple(mut values)) => {
                values.push(value);
                self.0.insert(key, RawValue::Multiple(values));
            }
        }
    }

    /// Collect form pairs. Keys of the form `Answers[<id>]` are unwrapped;
    /// any other key is taken as the question id itself.
    pub fn from_form_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut answers = Self::new();
        for (key, value) in pairs {
            answers.push(form_question_id(key.as_ref()), value);
        }
        answers
    }

    pub fn get(&self, question_id: &str) -> Option<&RawValue> {
        self.0.get(question_id)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn form_question_id(key: &str) -> &str {
    key.strip_prefix(FORM_PREFIX)
        .and_then(|rest| rest.strip_suffix(']'))
        .unwrap_or(key)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingRequiredAnswer {
    pub question_id: String,
    pub question_title: String,
}

/// Every required question a submission left unanswered.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub missing: Vec<MissingRequiredAnswer>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn names(&self, question_id: &str) -> bool {
        self.missing.iter().any(|m| m.question_id == question_id)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let titles: Vec<String> = self
            .missing
            .iter()
            .map(|m| format!("'{}' ({})", m.question_title, m.question_id))
            .collect();
        write!(f, "required questions unanswered: {}", titles.join(", "))
    }
}

/// Check that every required question of `survey` has a non-empty value.
pub fn validate(survey: &Survey, answers: &RawAnswers) -> Result<(), ValidationReport> {
    let missing: Vec<MissingRequiredAnswer> = survey
        .required_questions()
        .filter(|q| {
            answers
                .get(&q.id)
                .map_or(true, |raw| raw.coerce_for(q.question_type).is_empty())
        })
        .map(|q| MissingRequiredAnswer {
            question_id: q.id.clone(),
            question_title: q.title.clone(),
        })
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationReport { missing })
    }
}
