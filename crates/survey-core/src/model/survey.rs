use crate::error::CoreError;
use crate::id::RecordId;
use crate::model::question::Question;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurveyStatus {
    Draft,
    #[default]
    Active,
    Inactive,
    Archived,
}

impl SurveyStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Archived => "archived",
        }
    }

    pub fn accepts_responses(self) -> bool {
        self == Self::Active
    }
}

impl fmt::Display for SurveyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for SurveyStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "archived" => Ok(Self::Archived),
            _ => Err(CoreError::InvalidStatus {
                entity: "survey",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionType {
    #[default]
    Manual,
    Scheduled,
    Triggered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Once,
    Daily,
    Weekly,
    Monthly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub frequency: Frequency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_month: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<Weekday>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_of_day: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
}

/// Event-driven distribution, e.g. send two hours after a ticket closes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    pub event: String,
    #[serde(default)]
    pub delay_hours: u32,
    #[serde(default)]
    pub send_automatically: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DeliveryConfig {
    #[serde(default)]
    pub distribution: DistributionType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recipients: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Schedule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<Trigger>,
}

impl DeliveryConfig {
    pub fn check(&self) -> Result<(), CoreError> {
        match self.distribution {
            DistributionType::Scheduled if self.schedule.is_none() => {
                return Err(CoreError::InvalidSurvey(
                    "scheduled distribution requires a schedule".into(),
                ));
            }
            DistributionType::Triggered if self.trigger.is_none() => {
                return Err(CoreError::InvalidSurvey(
                    "triggered distribution requires a trigger".into(),
                ));
            }
            _ => {}
        }
        if let Some(day) = self.schedule.as_ref().and_then(|s| s.day_of_month) {
            if !(1..=31).contains(&day) {
                return Err(CoreError::InvalidSurvey(format!(
                    "day of month {} is outside 1-31",
                    day
                )));
            }
        }
        if let Some(trigger) = &self.trigger {
            if trigger.event.trim().is_empty() {
                return Err(CoreError::InvalidSurvey("trigger event cannot be empty".into()));
            }
        }
        for address in &self.recipients {
            if !looks_like_email(address) {
                return Err(CoreError::InvalidSurvey(format!(
                    "invalid recipient address '{}'",
                    address
                )));
            }
        }
        Ok(())
    }
}

fn looks_like_email(address: &str) -> bool {
    match address.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !address.contains(' '),
        None => false,
    }
}

/// Authoring input for a new survey.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SurveyDraft {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub delivery: DeliveryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Survey {
    pub id: RecordId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: SurveyStatus,
    pub questions: Vec<Question>,
    /// Owned by the store; only ever incremented.
    #[serde(default)]
    pub response_count: u64,
    /// Percentage of stored responses with no skipped answers.
    #[serde(default)]
    pub completion_rate: f64,
    #[serde(default)]
    pub delivery: DeliveryConfig,
}

impl Survey {
    pub fn from_draft(id: RecordId, mut draft: SurveyDraft, created_at: DateTime<Utc>) -> Self {
        for (position, question) in draft.questions.iter_mut().enumerate() {
            question.finalize(position);
        }
        Self {
            id,
            title: draft.title,
            description: draft.description,
            created_at,
            updated_at: None,
            status: SurveyStatus::default(),
            questions: draft.questions,
            response_count: 0,
            completion_rate: 0.0,
            delivery: draft.delivery,
        }
    }

    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }

    pub fn required_questions(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter().filter(|q| q.required)
    }

    pub fn check(&self) -> Result<(), CoreError> {
        if self.title.trim().is_empty() {
            return Err(CoreError::InvalidSurvey("title cannot be empty".into()));
        }
        let mut seen = HashSet::new();
        for question in &self.questions {
            if !seen.insert(question.id.as_str()) {
                return Err(CoreError::InvalidQuestion {
                    question_id: question.id.clone(),
                    reason: "duplicate question id".into(),
                });
            }
            question.check()?;
        }
        self.delivery.check()
    }
}
