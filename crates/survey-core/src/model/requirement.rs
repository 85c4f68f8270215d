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
pub enum RequirementStatus {
    #[default]
    Proposed,
    InProgress,
    Implemented,
    Rejected,
}

impl RequirementStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Proposed => "proposed",
            Self::InProgress => "in_progress",
            Self::Implemented => "implemented",
            Self::Rejected => "rejected",
        }
    }
}

impl Lifecycle for RequirementStatus {
    const ENTITY: &'static str = "requirement";

    fn successors(self) -> &'static [Self] {
        match self {
            Self::Proposed => &[Self::InProgress, Self::Implemented, Self::Rejected],
            Self::InProgress => &[Self::Implemented, Self::Rejected],
            Self::Implemented | Self::Rejected => &[],
        }
    }
}

impl fmt::Display for RequirementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for RequirementStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect();
        match normalized.as_str() {
            "proposed" => Ok(Self::Proposed),
            "inprogress" => Ok(Self::InProgress),
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
pub struct Requirement {
    pub id: RecordId,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<Contact>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub status: RequirementStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Stored independently of `status`; 0-100.
    #[serde(default)]
    pub completion: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responded_at: Option<DateTime<Utc>>,
    /// Last time `status` changed. `None` until the first change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_changed_at: Option<DateTime<Utc>>,
}

impl Requirement {
    pub fn is_anonymous(&self) -> bool {
        self.customer.is_none()
    }

    pub fn set_completion(&mut self, completion: u8) -> Result<(), CoreError> {
        if completion > 100 {
            return Err(CoreError::InvalidCompletion(completion));
        }
        self.completion = completion;
        Ok(())
    }
}
