//! Summary statistics over stored responses.
//!
//! Everything here is a pure function of the survey and its responses; the
//! caller fetches them and supplies `now` where a time window matters.

use crate::id::RecordId;
use crate::model::question::{Question, QuestionType};
use crate::model::response::{Answer, Response};
use crate::model::survey::{Survey, SurveyStatus};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A response counts as validated when strictly more than this share of its
/// answers are valid.
pub const VALIDATED_THRESHOLD: f64 = 95.0;

/// Length of each window compared by the growth rate.
pub const GROWTH_WINDOW_DAYS: i64 = 30;

/// Render seconds as `45s`, `2m 5s` or `1h 1m`.
pub fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    }
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerMetrics {
    pub question_id: String,
    pub question_title: String,
    pub question_type: QuestionType,
    pub is_valid: bool,
    pub is_skipped: bool,
    pub character_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_time_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_completion_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl AnswerMetrics {
    fn from_answer(answer: &Answer) -> Self {
        Self {
            question_id: answer.question_id.clone(),
            question_title: answer.question_title.clone(),
            question_type: answer.question_type,
            is_valid: answer.is_valid,
            is_skipped: answer.is_skipped(),
            character_count: answer.character_count(),
            completion_time_seconds: answer.completion_time_seconds,
            formatted_completion_time: answer.completion_time_seconds.map(format_duration),
            score_value: answer.score_value,
            category: answer.category.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMetrics {
    pub response_id: RecordId,
    pub survey_id: RecordId,
    pub submitted_at: DateTime<Utc>,
    pub question_count: usize,
    pub valid_answers_count: usize,
    pub validation_rate: f64,
    pub is_validated: bool,
    pub completion_time_seconds: u64,
    pub formatted_completion_time: String,
    pub average_time_per_question: f64,
    pub question_type_distribution: BTreeMap<QuestionType, usize>,
    pub question_type_completion: BTreeMap<QuestionType, f64>,
    pub category_scores: BTreeMap<String, f64>,
    pub answers: Vec<AnswerMetrics>,
}

pub fn compute_response_metrics(response: &Response) -> ResponseMetrics {
    let question_count = response.answers.len();
    let valid_answers_count = response.answers.iter().filter(|a| a.is_valid).count();
    let validation_rate = percentage(valid_answers_count, question_count);
    let completion_time = response.total_completion_time();
    let average_time_per_question = if question_count > 0 {
        completion_time as f64 / question_count as f64
    } else {
        0.0
    };

    ResponseMetrics {
        response_id: response.id.clone(),
        survey_id: response.survey_id.clone(),
        submitted_at: response.submitted_at,
        question_count,
        valid_answers_count,
        validation_rate,
        is_validated: validation_rate > VALIDATED_THRESHOLD,
        completion_time_seconds: completion_time,
        formatted_completion_time: format_duration(completion_time),
        average_time_per_question,
        question_type_distribution: type_distribution(&response.answers),
        question_type_completion: type_completion(&response.answers),
        category_scores: category_scores(response.answers.iter()),
        answers: response.answers.iter().map(AnswerMetrics::from_answer).collect(),
    }
}

fn type_distribution<'a>(answers: impl IntoIterator<Item = &'a Answer>) -> BTreeMap<QuestionType, usize> {
    let mut counts = BTreeMap::new();
    for answer in answers {
        *counts.entry(answer.question_type).or_insert(0) += 1;
    }
    counts
}

fn type_completion(answers: &[Answer]) -> BTreeMap<QuestionType, f64> {
    let mut groups: BTreeMap<QuestionType, (usize, usize)> = BTreeMap::new();
    for answer in answers {
        let (answered, total) = groups.entry(answer.question_type).or_insert((0, 0));
        if !answer.is_skipped() {
            *answered += 1;
        }
        *total += 1;
    }
    groups
        .into_iter()
        .map(|(t, (answered, total))| (t, percentage(answered, total)))
        .collect()
}

/// Average positive score per non-empty category. Categories without a
/// qualifying answer are left out rather than reported as zero.
pub fn category_scores<'a>(answers: impl IntoIterator<Item = &'a Answer>) -> BTreeMap<String, f64> {
    let mut sums: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for answer in answers {
        let (Some(category), Some(score)) = (answer.category.as_deref(), answer.score_value) else {
            continue;
        };
        if category.is_empty() || score <= 0.0 {
            continue;
        }
        let (sum, n) = sums.entry(category.to_string()).or_insert((0.0, 0));
        *sum += score;
        *n += 1;
    }
    sums.into_iter()
        .map(|(category, (sum, n))| (category, sum / n as f64))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub count: usize,
}

/// Responses per submission day, oldest first.
pub fn response_trend(responses: &[Response]) -> Vec<TrendPoint> {
    let mut per_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for response in responses {
        *per_day.entry(response.submitted_at.date_naive()).or_insert(0) += 1;
    }
    per_day
        .into_iter()
        .map(|(date, count)| TrendPoint { date, count })
        .collect()
}

/// Percentage change of the last window's response count over the window
/// before it. `None` when the earlier window is empty.
pub fn growth_rate(responses: &[Response], now: DateTime<Utc>) -> Option<f64> {
    let window = Duration::days(GROWTH_WINDOW_DAYS);
    let recent_start = now - window;
    let prior_start = recent_start - window;
    let recent = responses
        .iter()
        .filter(|r| r.submitted_at > recent_start && r.submitted_at <= now)
        .count();
    let prior = responses
        .iter()
        .filter(|r| r.submitted_at > prior_start && r.submitted_at <= recent_start)
        .count();
    if prior == 0 {
        None
    } else {
        Some((recent as f64 - prior as f64) / prior as f64 * 100.0)
    }
}

/// Net Promoter Score: % promoters (9-10) minus % detractors (0-6).
pub fn net_promoter_score(scores: &[f64]) -> Option<f64> {
    if scores.is_empty() {
        return None;
    }
    let promoters = scores.iter().filter(|s| **s >= 9.0).count();
    let detractors = scores.iter().filter(|s| **s <= 6.0).count();
    Some(percentage(promoters, scores.len()) - percentage(detractors, scores.len()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionCount {
    pub option: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSummary {
    pub question_id: String,
    pub title: String,
    pub question_type: QuestionType,
    pub answered: usize,
    pub skipped: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub option_counts: Vec<OptionCount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_promoter_score: Option<f64>,
}

fn summarize_question(question: &Question, responses: &[Response]) -> QuestionSummary {
    let answers: Vec<&Answer> = responses
        .iter()
        .filter_map(|r| r.answer_for(&question.id))
        .filter(|a| !a.is_skipped())
        .collect();

    let option_counts = if question.question_type.is_choice_like() {
        question
            .options
            .iter()
            .map(|option| OptionCount {
                option: option.clone(),
                count: answers
                    .iter()
                    .filter(|a| selects(question.question_type, a, option))
                    .count(),
            })
            .collect()
    } else {
        Vec::new()
    };

    let scores: Vec<f64> = answers.iter().filter_map(|a| a.score_value).collect();
    let average_score = if scores.is_empty() {
        None
    } else {
        Some(scores.iter().sum::<f64>() / scores.len() as f64)
    };
    let net_promoter_score = if question.question_type == QuestionType::Nps {
        net_promoter_score(&scores)
    } else {
        None
    };

    QuestionSummary {
        question_id: question.id.clone(),
        title: question.title.clone(),
        question_type: question.question_type,
        answered: answers.len(),
        skipped: responses.len() - answers.len(),
        option_counts,
        average_score,
        net_promoter_score,
    }
}

fn selects(question_type: QuestionType, answer: &Answer, option: &str) -> bool {
    answer.values().into_iter().any(|value| {
        if question_type == QuestionType::Ranking {
            value.split(',').any(|v| v.trim() == option)
        } else {
            value == option
        }
    })
}

fn breakdown<'a>(values: impl Iterator<Item = Option<&'a str>>) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for value in values {
        let key = match value {
            Some(v) if !v.trim().is_empty() => v.trim().to_string(),
            _ => "unknown".to_string(),
        };
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyDashboard {
    pub survey_id: RecordId,
    pub title: String,
    pub status: SurveyStatus,
    pub total_responses: usize,
    pub completion_rate: f64,
    pub average_completion_time: f64,
    pub formatted_average_completion_time: String,
    pub total_answers: usize,
    pub valid_answers: usize,
    pub validation_rate: f64,
    pub question_type_distribution: BTreeMap<QuestionType, usize>,
    pub category_scores: BTreeMap<String, f64>,
    pub questions: Vec<QuestionSummary>,
    pub trend: Vec<TrendPoint>,
    pub devices: BTreeMap<String, usize>,
    pub browsers: BTreeMap<String, usize>,
    pub sources: BTreeMap<String, usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub growth_rate: Option<f64>,
}

pub fn compute_survey_dashboard(
    survey: &Survey,
    responses: &[Response],
    now: DateTime<Utc>,
) -> SurveyDashboard {
    let average_completion_time = if responses.is_empty() {
        0.0
    } else {
        responses
            .iter()
            .map(|r| r.total_completion_time() as f64)
            .sum::<f64>()
            / responses.len() as f64
    };
    let all_answers = || responses.iter().flat_map(|r| r.answers.iter());
    let total_answers = all_answers().count();
    let valid_answers = all_answers().filter(|a| a.is_valid).count();

    SurveyDashboard {
        survey_id: survey.id.clone(),
        title: survey.title.clone(),
        status: survey.status,
        total_responses: responses.len(),
        completion_rate: completion_rate(survey, responses),
        average_completion_time,
        formatted_average_completion_time: format_duration(average_completion_time.round() as u64),
        total_answers,
        valid_answers,
        validation_rate: percentage(valid_answers, total_answers),
        question_type_distribution: type_distribution(all_answers()),
        category_scores: category_scores(all_answers()),
        questions: survey
            .questions
            .iter()
            .map(|q| summarize_question(q, responses))
            .collect(),
        trend: response_trend(responses),
        devices: breakdown(responses.iter().map(|r| r.metadata.device.as_deref())),
        browsers: breakdown(responses.iter().map(|r| r.metadata.browser.as_deref())),
        sources: breakdown(responses.iter().map(|r| r.metadata.source.as_deref())),
        growth_rate: growth_rate(responses, now),
    }
}

/// Share of responses that answer every question currently on the survey.
///
/// Responses only carry answers for required questions and for questions
/// the respondent filled in, so completeness is judged against the survey.
pub fn completion_rate(survey: &Survey, responses: &[Response]) -> f64 {
    let complete = responses
        .iter()
        .filter(|r| {
            survey
                .questions
                .iter()
                .all(|q| r.answer_for(&q.id).is_some_and(|a| !a.is_skipped()))
        })
        .count();
    percentage(complete, responses.len())
}
