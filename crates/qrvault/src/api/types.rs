//! Request and response bodies for the HTTP API.

use serde::{Deserialize, Serialize};

use crate::record::{format_timestamp, Record};

/// Body of `POST /save`.
///
/// Both fields are optional at the wire level so that a missing field is
/// reported as invalid input rather than a deserialization failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveRequest {
    /// Content to save.
    pub content: Option<String>,
    /// The caller's opaque identifier.
    pub user_id: Option<String>,
}

/// Caller identity from the query string of `GET /history` and
/// `DELETE /history/{record_id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserQuery {
    /// The caller's opaque identifier.
    pub user_id: Option<String>,
}

impl UserQuery {
    /// Build from decoded query pairs. A repeated `user_id` keeps the first value.
    #[must_use]
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let user_id = pairs
            .into_iter()
            .find_map(|(key, value)| (key == "user_id").then_some(value));
        Self { user_id }
    }
}

/// A saved record as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordResponse {
    /// Record id, used for deletion.
    pub id: i64,
    /// Saved content.
    pub content: String,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

impl From<&Record> for RecordResponse {
    fn from(record: &Record) -> Self {
        Self {
            id: record.id,
            content: record.content.clone(),
            created_at: format_timestamp(record.created_at),
        }
    }
}

/// A confirmation message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Human-readable confirmation.
    pub message: String,
}

impl MessageResponse {
    /// Confirmation returned after a successful delete.
    #[must_use]
    pub fn deleted() -> Self {
        Self {
            message: "Deleted".to_string(),
        }
    }
}

/// Error response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Description of the failure.
    pub error: String,
}
