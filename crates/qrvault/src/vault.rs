//! Vault operations.
//!
//! Each function here is one request's worth of work against an explicit
//! [`Session`]: input validation, client resolution and the storage call.
//! Transport concerns live in [`crate::api`].

use tracing::debug;

use crate::error::{Error, Result};
use crate::record::Record;
use crate::storage::{PurgeSummary, Session};

/// Message reported when a save is missing its content or identifier.
pub const MISSING_FIELDS_MESSAGE: &str = "Missing content or user identification";

/// A validated save request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    content: String,
    external_id: String,
}

impl NewRecord {
    /// Validate raw save input.
    ///
    /// Content is trimmed; it must be non-empty afterwards. The identifier
    /// must be present and non-empty but is otherwise opaque.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if either field is missing or blank.
    pub fn parse(content: Option<&str>, external_id: Option<&str>) -> Result<Self> {
        let content = content.map(str::trim).unwrap_or_default();
        let external_id = external_id.unwrap_or_default();

        if content.is_empty() || external_id.is_empty() {
            return Err(Error::invalid_input(MISSING_FIELDS_MESSAGE));
        }

        Ok(Self {
            content: content.to_string(),
            external_id: external_id.to_string(),
        })
    }

    /// The trimmed content.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// The caller's identifier.
    #[must_use]
    pub fn external_id(&self) -> &str {
        &self.external_id
    }
}

/// Save a record, creating the owning client on first use.
///
/// The client is committed before the record is inserted, so a failed
/// insert still leaves the client behind.
///
/// # Errors
///
/// Returns a storage error if either write fails.
pub fn save_record(session: &mut Session<'_>, new: &NewRecord) -> Result<Record> {
    let client = session.get_or_create_client(new.external_id())?;
    session.insert_record(&client, new.content())
}

/// List a client's records, most recent first.
///
/// A missing, blank, or unknown identifier yields an empty history.
///
/// # Errors
///
/// Returns a storage error if the query fails.
pub fn list_history(session: &Session<'_>, external_id: Option<&str>) -> Result<Vec<Record>> {
    let Some(external_id) = external_id.filter(|id| !id.is_empty()) else {
        return Ok(Vec::new());
    };

    match session.find_client(external_id)? {
        Some(client) => session.list_records(&client),
        None => {
            debug!("No client for {}, returning empty history", external_id);
            Ok(Vec::new())
        }
    }
}

/// Delete one of the caller's records.
///
/// # Errors
///
/// Returns [`Error::Unauthorized`] if the identifier is missing or unknown,
/// [`Error::NotFound`] if the caller owns no record with `record_id`, or a
/// storage error if the delete fails.
pub fn delete_record(
    session: &mut Session<'_>,
    record_id: i64,
    external_id: Option<&str>,
) -> Result<()> {
    let external_id = external_id
        .filter(|id| !id.is_empty())
        .ok_or(Error::Unauthorized)?;
    let client = session
        .find_client(external_id)?
        .ok_or(Error::Unauthorized)?;

    if session.delete_record(&client, record_id)? {
        Ok(())
    } else {
        Err(Error::NotFound { id: record_id })
    }
}

/// Remove a client and every record it owns.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for a blank identifier, or a storage
/// error if the transaction fails.
pub fn purge_client(session: &mut Session<'_>, external_id: &str) -> Result<Option<PurgeSummary>> {
    if external_id.is_empty() {
        return Err(Error::invalid_input("user identification is required"));
    }
    session.purge_client(external_id)
}
