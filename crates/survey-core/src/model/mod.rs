pub mod question;
pub mod requirement;
pub mod response;
pub mod suggestion;
pub mod survey;

use crate::error::CoreError;
use crate::id::RecordId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use question::{Question, QuestionSettings, QuestionType};
pub use requirement::{Requirement, RequirementStatus};
pub use response::{Answer, Respondent, Response, ResponseMetadata, Submission};
pub use suggestion::{Suggestion, SuggestionStatus};
pub use survey::{
    DeliveryConfig, DistributionType, Frequency, Schedule, Survey, SurveyDraft, SurveyStatus, Trigger,
};

const KIND_SURVEY: &str = "survey";
const KIND_RESPONSE: &str = "response";
const KIND_SUGGESTION: &str = "suggestion";
const KIND_REQUIREMENT: &str = "requirement";

/// The storable record families. Each kind lives in its own directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Survey,
    Response,
    Suggestion,
    Requirement,
}

impl RecordKind {
    pub const ALL: [RecordKind; 4] = [
        RecordKind::Survey,
        RecordKind::Response,
        RecordKind::Suggestion,
        RecordKind::Requirement,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Survey => KIND_SURVEY,
            Self::Response => KIND_RESPONSE,
            Self::Suggestion => KIND_SUGGESTION,
            Self::Requirement => KIND_REQUIREMENT,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            KIND_SURVEY => Ok(Self::Survey),
            KIND_RESPONSE => Ok(Self::Response),
            KIND_SUGGESTION => Ok(Self::Suggestion),
            KIND_REQUIREMENT => Ok(Self::Requirement),
            other => Err(CoreError::UnknownKind(other.to_string())),
        }
    }
}

/// A persisted entity with a stable id.
pub trait Record: Serialize + DeserializeOwned + Clone {
    const KIND: RecordKind;

    fn id(&self) -> &RecordId;
}

impl Record for Survey {
    const KIND: RecordKind = RecordKind::Survey;

    fn id(&self) -> &RecordId {
        &self.id
    }
}

impl Record for Response {
    const KIND: RecordKind = RecordKind::Response;

    fn id(&self) -> &RecordId {
        &self.id
    }
}

impl Record for Suggestion {
    const KIND: RecordKind = RecordKind::Suggestion;

    fn id(&self) -> &RecordId {
        &self.id
    }
}

impl Record for Requirement {
    const KIND: RecordKind = RecordKind::Requirement;

    fn id(&self) -> &RecordId {
        &self.id
    }
}

/// Identity of whoever submitted a suggestion or requirement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contact {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}
