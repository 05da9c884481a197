//! JSON wire format of the `announcements` storage value.
//!
//! The value is a UTF-8 JSON array of announcement objects, newest first.
//! There is no envelope or version field.

use crate::model::announcement::Announcement;
use serde_json::Value;

/// Serializes the full list for the durable mirror.
pub fn encode_announcements(announcements: &[Announcement]) -> serde_json::Result<String> {
    serde_json::to_string(announcements)
}

/// Parses a mirror value. Every record is validated while decoding.
pub fn decode_announcements(raw: &str) -> serde_json::Result<Vec<Announcement>> {
    serde_json::from_str(raw)
}

/// Parses a mirror value record by record.
///
/// Only a value that is not a JSON array fails. Records that do not validate
/// are left out and described in the second list.
pub fn decode_announcements_lenient(
    raw: &str,
) -> serde_json::Result<(Vec<Announcement>, Vec<String>)> {
    let values: Vec<Value> = serde_json::from_str(raw)?;
    let mut kept = Vec::with_capacity(values.len());
    let mut skipped = Vec::new();
    for (index, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<Announcement>(value) {
            Ok(announcement) => kept.push(announcement),
            Err(err) => skipped.push(format!("record {index}: {err}")),
        }
    }
    Ok((kept, skipped))
}
