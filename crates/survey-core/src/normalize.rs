//! Turns raw submitted values into stored answers.

use crate::model::question::{Question, QuestionType};
use crate::model::response::Answer;
use crate::validate::RawValue;
use chrono::NaiveDate;

/// Build the stored answer for `question` from its raw value.
///
/// Validity starts out true; [`assess`] decides it against the question.
pub fn normalize(question: &Question, raw: Option<&RawValue>) -> Answer {
    let coerced = raw.map(|r| r.coerce_for(question.question_type));
    let (answer, multiple_answers) = match (question.question_type, coerced) {
        (QuestionType::MultipleChoice, Some(RawValue::Multiple(values))) => (None, Some(values)),
        (QuestionType::MultipleChoice, _) => (None, Some(Vec::new())),
        (_, Some(RawValue::Single(s))) => (Some(s), None),
        (_, Some(RawValue::Multiple(values))) => (Some(values.join(",")), None),
        (_, None) => (Some(String::new()), None),
    };
    Answer {
        question_id: question.id.clone(),
        question_title: question.title.clone(),
        question_type: question.question_type,
        answer,
        multiple_answers,
        is_valid: true,
        score_value: None,
        completion_time_seconds: None,
        category: question.category.clone(),
    }
}

/// Validity and score of an answer, judged against its question.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assessment {
    pub is_valid: bool,
    pub score: Option<f64>,
}

pub fn assess(question: &Question, answer: &Answer) -> Assessment {
    let values = answer.values();
    if values.is_empty() {
        return Assessment {
            is_valid: !question.required,
            score: None,
        };
    }
    match question.question_type {
        t if t.is_choice_like() => Assessment {
            is_valid: values
                .iter()
                .flat_map(|v| split_ranked(t, v))
                .all(|v| question.options.iter().any(|o| o == v)),
            score: None,
        },
        QuestionType::Rating | QuestionType::Nps => {
            let parsed = values[0].trim().parse::<i64>().ok();
            let in_range = match (parsed, question.effective_settings()) {
                (Some(n), Some(settings)) => settings.contains(n),
                (Some(_), None) => true,
                (None, _) => false,
            };
            Assessment {
                is_valid: in_range,
                score: parsed.filter(|_| in_range).map(|n| n as f64),
            }
        }
        QuestionType::Date => Assessment {
            is_valid: NaiveDate::parse_from_str(values[0].trim(), "%Y-%m-%d").is_ok(),
            score: None,
        },
        _ => Assessment {
            is_valid: true,
            score: None,
        },
    }
}

/// Ranking answers arrive comma-joined; every other value is atomic.
fn split_ranked(question_type: QuestionType, value: &str) -> Vec<&str> {
    if question_type == QuestionType::Ranking {
        value.split(',').map(str::trim).collect()
    } else {
        vec![value]
    }
}
