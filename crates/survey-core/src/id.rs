use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

const ID_LEN: usize = 64;
const SHORT_LEN: usize = 8;
const FAN_OUT_LEN: usize = 2;

/// Identifier of a stored survey, response, suggestion or requirement.
///
/// A lowercase SHA-256 hex digest minted once from the record's creation
/// input (see [`crate::serialize::mint_id`]). Records are edited in place,
/// so the id does not track their current content. Deserialization goes
/// through [`RecordId::parse`], so a stored record can never carry a
/// malformed id.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(String);

impl RecordId {
    pub fn hash(data: &[u8]) -> Self {
        Self(hex::encode(Sha256::digest(data)))
    }

    pub fn parse(text: &str) -> Result<Self, CoreError> {
        let text = text.trim();
        let well_formed = text.len() == ID_LEN && text.bytes().all(|b| b.is_ascii_hexdigit());
        if !well_formed {
            return Err(CoreError::InvalidRecordId(text.to_string()));
        }
        Ok(Self(text.to_ascii_lowercase()))
    }

    pub fn hex(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for listings and log lines.
    pub fn short(&self) -> &str {
        &self.0[..SHORT_LEN]
    }

    /// Directory and file stem of the record's on-disk location.
    pub fn fan_out(&self) -> (&str, &str) {
        self.0.split_at(FAN_OUT_LEN)
    }

    /// Case-insensitive prefix match, as typed by a user.
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(&prefix.to_ascii_lowercase())
    }
}

impl FromStr for RecordId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RecordId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RecordId").field(&self.short()).finish()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.short())
    }
}
