use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::CoreError;
use crate::id::RecordId;

/// Produce a canonical byte representation: `kind\0sorted_json`.
///
/// The JSON keys are sorted so the output does not depend on field
/// declaration or map insertion order.
pub fn canonical_serialize(kind: &str, value: &impl Serialize) -> Result<Vec<u8>, CoreError> {
    let json_value = serde_json::to_value(value)?;
    let sorted_json = serde_json::to_string(&sort_value(json_value))?;
    let mut buf = Vec::with_capacity(kind.len() + 1 + sorted_json.len());
    buf.extend_from_slice(kind.as_bytes());
    buf.push(0);
    buf.extend_from_slice(sorted_json.as_bytes());
    Ok(buf)
}

#[derive(Serialize)]
struct Seed<'a, T: Serialize> {
    created_at: DateTime<Utc>,
    content: &'a T,
}

/// Mint the id of a new record from its creation input and timestamp.
pub fn mint_id(
    kind: &str,
    created_at: DateTime<Utc>,
    content: &impl Serialize,
) -> Result<RecordId, CoreError> {
    let bytes = canonical_serialize(kind, &Seed { created_at, content })?;
    Ok(RecordId::hash(&bytes))
}

fn sort_value(v: serde_json::Value) -> serde_json::Value {
    match v {
        serde_json::Value::Object(map) => {
            let sorted: serde_json::Map<String, serde_json::Value> = map
                .into_iter()
                .map(|(k, v)| (k, sort_value(v)))
                .collect::<std::collections::BTreeMap<_, _>>()
                .into_iter()
                .collect();
            serde_json::Value::Object(sorted)
        }
        serde_json::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(sort_value).collect())
        }
        other => other,
    }
}
