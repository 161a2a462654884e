//! Core vault types for qrvault.
//!
//! This module defines the two persisted entities: the anonymous [`Client`]
//! and the saved QR payload [`Record`] it owns.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// An anonymous caller, known only by the identifier it supplies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    /// Storage-assigned key.
    pub id: i64,

    /// Caller-supplied opaque identifier (`user_id` on the wire).
    pub external_id: String,

    /// When the client was first seen.
    pub created_at: DateTime<Utc>,
}

/// A single saved QR payload owned by exactly one [`Client`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Storage-assigned key.
    pub id: i64,

    /// The saved content, already trimmed.
    pub content: String,

    /// When the record was saved.
    pub created_at: DateTime<Utc>,

    /// Key of the owning client.
    pub owner_id: i64,
}

/// Format a timestamp the way it is stored.
///
/// Fixed microsecond precision keeps lexical order equal to chronological
/// order, which the history query relies on.
#[must_use]
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp, falling back to the epoch on malformed input.
#[must_use]
pub fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map_or(DateTime::<Utc>::UNIX_EPOCH, |dt| dt.with_timezone(&Utc))
}
