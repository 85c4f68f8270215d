use crate::error::CoreError;
use crate::id::RecordId;
use crate::lifecycle::Lifecycle;
use crate::model::Contact;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionStatus {
    #[default]
    New,
    Reviewed,
    Implemented,
    Rejected,
}

impl SuggestionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Reviewed => "reviewed",
            Self::Implemented => "implemented",
            Self::Rejected => "rejected",
        }
    }

    /// Display progress derived from the status; never stored.
    pub fn completion_percentage(self) -> u8 {
        match self {
            Self::New => 0,
            Self::Reviewed => 50,
            Self::Implemented | Self::Rejected => 100,
        }
    }
}

impl Lifecycle for SuggestionStatus {
    const ENTITY: &'static str = "suggestion";

    fn successors(self) -> &'static [Self] {
        match self {
            Self::New => &[Self::Reviewed, Self::Rejected],
            Self::Reviewed => &[Self::Implemented, Self::Rejected],
            Self::Implemented | Self::Rejected => &[],
        }
    }
}

impl fmt::Display for SuggestionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for SuggestionStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "new" => Ok(Self::New),
            "reviewed" => Ok(Self::Reviewed),
            "implemented" => Ok(Self::Implemented),
            "rejected" => Ok(Self::Rejected),
            _ => Err(CoreError::InvalidStatus {
                entity: Self::ENTITY,
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Suggestion {
    pub id: RecordId,
    pub content: String,
    /// `None` when the submission was anonymous.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<Contact>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub status: SuggestionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responded_at: Option<DateTime<Utc>>,
    /// Last time `status` changed. `None` until the first change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_changed_at: Option<DateTime<Utc>>,
}

impl Suggestion {
    pub fn is_anonymous(&self) -> bool {
        self.customer.is_none()
    }

    pub fn completion_percentage(&self) -> u8 {
        self.status.completion_percentage()
    }
}
