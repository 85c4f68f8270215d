use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    Text,
    SingleChoice,
    MultipleChoice,
    Dropdown,
    Rating,
    Nps,
    Matrix,
    Ranking,
    Date,
    FileUpload,
}

impl QuestionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::SingleChoice => "single-choice",
            Self::MultipleChoice => "multiple-choice",
            Self::Dropdown => "dropdown",
            Self::Rating => "rating",
            Self::Nps => "nps",
            Self::Matrix => "matrix",
            Self::Ranking => "ranking",
            Self::Date => "date",
            Self::FileUpload => "file-upload",
        }
    }

    /// Types whose answers must come from the question's option list.
    pub fn is_choice_like(self) -> bool {
        matches!(
            self,
            Self::SingleChoice | Self::MultipleChoice | Self::Dropdown | Self::Ranking
        )
    }

    /// Types whose answers are integers within a min/max range.
    pub fn is_scaled(self) -> bool {
        matches!(self, Self::Rating | Self::Nps)
    }

    fn default_settings(self) -> Option<QuestionSettings> {
        match self {
            Self::Rating => Some(QuestionSettings { min: 1, max: 5 }),
            Self::Nps => Some(QuestionSettings { min: 0, max: 10 }),
            _ => None,
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        match normalized.as_str() {
            "text" => Ok(Self::Text),
            "single-choice" => Ok(Self::SingleChoice),
            "multiple-choice" => Ok(Self::MultipleChoice),
            "dropdown" => Ok(Self::Dropdown),
            "rating" => Ok(Self::Rating),
            "nps" => Ok(Self::Nps),
            "matrix" => Ok(Self::Matrix),
            "ranking" => Ok(Self::Ranking),
            "date" => Ok(Self::Date),
            "file-upload" => Ok(Self::FileUpload),
            _ => Err(CoreError::UnknownQuestionType(s.to_string())),
        }
    }
}

/// Inclusive bounds for rating and nps questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSettings {
    pub min: i64,
    pub max: i64,
}

impl QuestionSettings {
    pub fn contains(&self, value: i64) -> bool {
        value >= self.min && value <= self.max
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Question {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<QuestionSettings>,
    /// Label used to group scores in analytics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Question {
    pub fn new(id: impl Into<String>, title: impl Into<String>, question_type: QuestionType) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            question_type,
            required: false,
            options: Vec::new(),
            settings: None,
            category: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Explicit settings, or the type's defaults (rating 1..5, nps 0..10).
    pub fn effective_settings(&self) -> Option<QuestionSettings> {
        self.settings.or_else(|| self.question_type.default_settings())
    }

    /// Fill in defaults that authoring may leave out.
    pub fn finalize(&mut self, position: usize) {
        if self.id.trim().is_empty() {
            self.id = format!("q{}", position + 1);
        }
        if self.settings.is_none() {
            self.settings = self.question_type.default_settings();
        }
    }

    /// Check the invariants a question must satisfy before it can take answers.
    pub fn check(&self) -> Result<(), CoreError> {
        let invalid = |reason: &str| CoreError::InvalidQuestion {
            question_id: self.id.clone(),
            reason: reason.to_string(),
        };
        if self.title.trim().is_empty() {
            return Err(invalid("title cannot be empty"));
        }
        if self.question_type.is_choice_like() && self.options.len() < 2 {
            return Err(invalid("choice questions need at least 2 options"));
        }
        // Ranking answers are stored comma-joined.
        if self.question_type == QuestionType::Ranking && self.options.iter().any(|o| o.contains(',')) {
            return Err(invalid("ranking options cannot contain commas"));
        }
        if let Some(settings) = self.effective_settings() {
            if settings.min >= settings.max {
                return Err(invalid("settings min must be below max"));
            }
        }
        Ok(())
    }
}
